//! Delimited-text metadata patches.
//!
//! A header row names the recognized columns; each data row patches an
//! existing asset matched by exact filename. Rows referencing unknown
//! files are ignored without error. The whole file is parsed before any
//! patch is applied, so a malformed file leaves the asset list untouched.

use crate::IngestError;
use project::MediaAsset;
use timecode::timecode_to_seconds;

const COL_SOURCE_FILE: &str = "Source File";
const COL_SCENE: &str = "Scene";
const COL_TAKE: &str = "Take";
const COL_START_TC: &str = "Start TC";
const COL_END_TC: &str = "End TC";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CsvOutcome {
    pub rows_applied: usize,
    pub rows_ignored: usize,
}

struct RowPatch {
    asset_index: usize,
    scene: Option<String>,
    take: Option<String>,
    start_tc: Option<String>,
    end_tc: Option<String>,
}

/// Apply one CSV file's rows to the asset list in place. A file without a
/// `Source File` column is a no-op.
pub fn apply_csv(content: &str, assets: &mut [MediaAsset]) -> Result<CsvOutcome, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.trim() == name);

    let Some(file_col) = col(COL_SOURCE_FILE) else {
        return Ok(CsvOutcome::default());
    };
    let scene_col = col(COL_SCENE);
    let take_col = col(COL_TAKE);
    let start_col = col(COL_START_TC);
    let end_col = col(COL_END_TC);

    let mut patches = Vec::new();
    let mut outcome = CsvOutcome::default();

    for record in reader.records() {
        let record = record?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let Some(file_name) = cell(Some(file_col)) else {
            outcome.rows_ignored += 1;
            continue;
        };
        let Some(asset_index) = assets.iter().position(|a| a.file_name == file_name) else {
            tracing::debug!(file = %file_name, "csv row for unknown asset ignored");
            outcome.rows_ignored += 1;
            continue;
        };
        patches.push(RowPatch {
            asset_index,
            scene: cell(scene_col),
            take: cell(take_col),
            start_tc: cell(start_col),
            end_tc: cell(end_col),
        });
    }

    for patch in patches {
        let asset = &mut assets[patch.asset_index];
        if let Some(scene) = patch.scene {
            asset.scene = Some(scene);
        }
        if let Some(take) = patch.take {
            asset.take = Some(take);
        }
        if let Some(start_tc) = patch.start_tc {
            asset.start_tc = start_tc;
        }
        if let Some(end_tc) = patch.end_tc {
            asset.end_tc = end_tc;
        }
        if !asset.start_tc.is_empty() && !asset.end_tc.is_empty() {
            let start = timecode_to_seconds(&asset.start_tc, asset.fps);
            let end = timecode_to_seconds(&asset.end_tc, asset.fps);
            asset.duration = format!("{:.2}", end.seconds - start.seconds);
        }
        outcome.rows_applied += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use project::MediaType;

    fn asset(file_name: &str, fps: f64) -> MediaAsset {
        MediaAsset {
            file_name: file_name.to_string(),
            project_id: "p1".into(),
            clip_directory: "/media".into(),
            file_path: format!("/media/{file_name}"),
            media_type: MediaType::Video,
            start_tc: String::new(),
            end_tc: String::new(),
            duration: "10".into(),
            fps,
            resolution: "3840x2160".into(),
            scene: None,
            take: None,
            transcript: None,
        }
    }

    #[test]
    fn patches_timecodes_and_recomputes_duration() {
        let mut assets = vec![asset("a.mov", 24.0)];
        let csv = "Source File,Start TC,End TC\na.mov,00:00:01:00,00:00:03:00\n";
        let outcome = apply_csv(csv, &mut assets).unwrap();
        assert_eq!(outcome.rows_applied, 1);
        assert_eq!(assets[0].start_tc, "00:00:01:00");
        assert_eq!(assets[0].end_tc, "00:00:03:00");
        assert_eq!(assets[0].duration, "2.00");
    }

    #[test]
    fn patches_scene_and_take() {
        let mut assets = vec![asset("a.mov", 24.0)];
        let csv = "Source File,Scene,Take\na.mov,12,3\n";
        apply_csv(csv, &mut assets).unwrap();
        assert_eq!(assets[0].scene.as_deref(), Some("12"));
        assert_eq!(assets[0].take.as_deref(), Some("3"));
        // No end TC yet, so duration stays untouched.
        assert_eq!(assets[0].duration, "10");
    }

    #[test]
    fn unknown_filenames_are_ignored_without_error() {
        let mut assets = vec![asset("a.mov", 24.0)];
        let csv = "Source File,Scene\nmissing.mov,12\na.mov,4\n";
        let outcome = apply_csv(csv, &mut assets).unwrap();
        assert_eq!(outcome.rows_applied, 1);
        assert_eq!(outcome.rows_ignored, 1);
        assert_eq!(assets[0].scene.as_deref(), Some("4"));
    }

    #[test]
    fn missing_source_file_column_is_a_no_op() {
        let mut assets = vec![asset("a.mov", 24.0)];
        let csv = "Clip,Scene\na.mov,12\n";
        let outcome = apply_csv(csv, &mut assets).unwrap();
        assert_eq!(outcome, CsvOutcome::default());
        assert!(assets[0].scene.is_none());
    }

    #[test]
    fn malformed_timecode_patches_to_zero_duration() {
        // Matches the original behavior: bad timecodes read as zero seconds.
        let mut assets = vec![asset("a.mov", 24.0)];
        let csv = "Source File,Start TC,End TC\na.mov,garbage,00:00:02:00\n";
        apply_csv(csv, &mut assets).unwrap();
        assert_eq!(assets[0].duration, "2.00");
    }
}
