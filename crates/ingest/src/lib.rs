//! Heterogeneous metadata ingestion: sequence XML, subtitle transcripts,
//! and CSV field patches, normalized into the canonical asset/container
//! model, plus the directory media scan that seeds assets.

use project::{MediaAsset, MediaType, MultiCamContainer};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use walkdir::WalkDir;

mod csv_patch;
mod sequence_xml;
mod srt;

pub use csv_patch::{apply_csv, CsvOutcome};
pub use sequence_xml::parse_sequence_xml;
pub use srt::parse_srt;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

fn video_ext_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(mp4|mov|mxf)$").expect("video ext regex"))
}

fn audio_ext_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(wav|mp3|aif)$").expect("audio ext regex"))
}

pub(crate) fn media_type_for(file_name: &str) -> MediaType {
    if audio_ext_re().is_match(file_name) {
        MediaType::Audio
    } else {
        MediaType::Video
    }
}

/// One raw metadata file handed to the batch normalizer. Reading bytes off
/// disk is the caller's concern.
#[derive(Debug, Clone)]
pub struct MetadataFile {
    pub name: String,
    pub content: String,
}

/// Aggregate result of one metadata batch. The batch is best-effort: a file
/// that fails to parse is counted in `files_skipped` and never aborts the
/// rest.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub new_containers: Vec<MultiCamContainer>,
    pub assets_patched: usize,
    pub transcripts_attached: usize,
    pub files_skipped: usize,
}

impl BatchOutcome {
    pub fn is_noop(&self) -> bool {
        self.new_containers.is_empty()
            && self.assets_patched == 0
            && self.transcripts_attached == 0
    }
}

fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}

fn file_ext(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Dispatch each file to its parser by extension and fold the results into
/// the accumulating asset list.
///
/// CSV patches land in `assets` immediately, so later files in the same
/// batch observe earlier patches. Transcripts attach to the asset whose base
/// filename matches the transcript's (case-insensitive, trimmed, first
/// match wins); unmatched transcripts are dropped with a diagnostic.
pub fn ingest_metadata_batch(
    files: &[MetadataFile],
    assets: &mut [MediaAsset],
    project_id: &str,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for file in files {
        match file_ext(&file.name).as_str() {
            "xml" => match parse_sequence_xml(&file.content, project_id, file_stem(&file.name)) {
                Ok(containers) => outcome.new_containers.extend(containers),
                Err(err) => {
                    tracing::warn!(file = %file.name, %err, "sequence xml skipped");
                    outcome.files_skipped += 1;
                }
            },
            "srt" | "srtx" | "txt" => {
                let words = parse_srt(&file.content);
                if words.is_empty() {
                    tracing::warn!(file = %file.name, "no valid subtitle blocks; skipped");
                    outcome.files_skipped += 1;
                    continue;
                }
                let wanted = file_stem(&file.name).trim().to_ascii_lowercase();
                let matched = assets.iter_mut().find(|a| {
                    file_stem(&a.file_name).trim().to_ascii_lowercase() == wanted
                });
                match matched {
                    Some(asset) => {
                        asset.transcript = Some(words);
                        outcome.transcripts_attached += 1;
                    }
                    None => {
                        tracing::warn!(file = %file.name, "transcript matches no asset; dropped");
                        outcome.files_skipped += 1;
                    }
                }
            }
            "csv" => match apply_csv(&file.content, assets) {
                Ok(csv_outcome) => outcome.assets_patched += csv_outcome.rows_applied,
                Err(err) => {
                    tracing::warn!(file = %file.name, %err, "csv skipped");
                    outcome.files_skipped += 1;
                }
            },
            other => {
                tracing::debug!(file = %file.name, ext = other, "unsupported metadata file");
                outcome.files_skipped += 1;
            }
        }
    }
    outcome
}

/// Scan one directory (non-recursive) for compatible media files and seed
/// asset records with default metadata. An empty result is a user-visible
/// "nothing to do", not an error.
pub fn scan_media_dir(dir: &Path, project_id: &str) -> Result<Vec<MediaAsset>, IngestError> {
    let mut names: Vec<String> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    let dir_str = dir.to_string_lossy();
    let mut assets = Vec::new();
    for name in names {
        let asset = if video_ext_re().is_match(&name) {
            MediaAsset {
                file_path: format!("{dir_str}/{name}"),
                file_name: name,
                project_id: project_id.to_string(),
                clip_directory: dir_str.to_string(),
                media_type: MediaType::Video,
                start_tc: "00:00:00:00".into(),
                end_tc: "00:00:10:00".into(),
                duration: "10".into(),
                fps: 23.976,
                resolution: "3840x2160".into(),
                scene: None,
                take: None,
                transcript: None,
            }
        } else if audio_ext_re().is_match(&name) {
            MediaAsset {
                file_path: format!("{dir_str}/{name}"),
                file_name: name,
                project_id: project_id.to_string(),
                clip_directory: dir_str.to_string(),
                media_type: MediaType::Audio,
                start_tc: "00:00:00:00".into(),
                end_tc: "00:01:00:00".into(),
                duration: "60".into(),
                fps: 48000.0,
                resolution: "Audio".into(),
                scene: None,
                take: None,
                transcript: None,
            }
        } else {
            continue;
        };
        assets.push(asset);
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seeded_asset(file_name: &str) -> MediaAsset {
        MediaAsset {
            file_name: file_name.to_string(),
            project_id: "p1".into(),
            clip_directory: "/media".into(),
            file_path: format!("/media/{file_name}"),
            media_type: media_type_for(file_name),
            start_tc: "00:00:00:00".into(),
            end_tc: "00:00:10:00".into(),
            duration: "10".into(),
            fps: 24.0,
            resolution: "3840x2160".into(),
            scene: None,
            take: None,
            transcript: None,
        }
    }

    #[test]
    fn batch_dispatches_by_extension() {
        let mut assets = vec![seeded_asset("a.mov")];
        let files = vec![
            MetadataFile {
                name: "sync.xml".into(),
                content: "<multiclip><rate><timebase>24</timebase></rate><duration>24</duration></multiclip>".into(),
            },
            MetadataFile {
                name: "A.srt".into(),
                content: "1\n00:00:01,000 --> 00:00:03,000\nhello world".into(),
            },
            MetadataFile {
                name: "meta.csv".into(),
                content: "Source File,Scene\na.mov,7\n".into(),
            },
        ];
        let outcome = ingest_metadata_batch(&files, &mut assets, "p1");
        assert_eq!(outcome.new_containers.len(), 1);
        assert_eq!(outcome.transcripts_attached, 1);
        assert_eq!(outcome.assets_patched, 1);
        assert_eq!(outcome.files_skipped, 0);
        assert!(!outcome.is_noop());

        // Transcript matched case-insensitively on the base name.
        let transcript = assets[0].transcript.as_ref().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(assets[0].scene.as_deref(), Some("7"));
    }

    #[test]
    fn unmatched_transcript_is_dropped_not_fatal() {
        let mut assets = vec![seeded_asset("a.mov")];
        let files = vec![MetadataFile {
            name: "other.srt".into(),
            content: "1\n00:00:01,000 --> 00:00:02,000\nwords".into(),
        }];
        let outcome = ingest_metadata_batch(&files, &mut assets, "p1");
        assert_eq!(outcome.files_skipped, 1);
        assert!(assets[0].transcript.is_none());
        assert!(outcome.is_noop());
    }

    #[test]
    fn broken_file_does_not_abort_the_batch() {
        let mut assets = vec![seeded_asset("a.mov")];
        let files = vec![
            MetadataFile { name: "bad.xml".into(), content: "<sequence><a>1</b></sequence>".into() },
            MetadataFile { name: "meta.csv".into(), content: "Source File,Take\na.mov,2\n".into() },
        ];
        let outcome = ingest_metadata_batch(&files, &mut assets, "p1");
        assert_eq!(outcome.files_skipped, 1);
        assert_eq!(outcome.assets_patched, 1);
        assert_eq!(assets[0].take.as_deref(), Some("2"));
    }

    #[test]
    fn later_files_see_earlier_csv_patches() {
        let mut assets = vec![seeded_asset("a.mov")];
        let files = vec![
            MetadataFile {
                name: "one.csv".into(),
                content: "Source File,Start TC\na.mov,00:00:01:00\n".into(),
            },
            MetadataFile {
                name: "two.csv".into(),
                content: "Source File,End TC\na.mov,00:00:03:00\n".into(),
            },
        ];
        ingest_metadata_batch(&files, &mut assets, "p1");
        assert_eq!(assets[0].start_tc, "00:00:01:00");
        assert_eq!(assets[0].end_tc, "00:00:03:00");
        assert_eq!(assets[0].duration, "2.00");
    }

    #[test]
    fn scan_seeds_video_and_audio_defaults() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["clip.MOV", "vo.wav", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let assets = scan_media_dir(dir.path(), "p1").unwrap();
        assert_eq!(assets.len(), 2);

        let video = assets.iter().find(|a| a.file_name == "clip.MOV").unwrap();
        assert_eq!(video.media_type, MediaType::Video);
        assert_eq!(video.fps, 23.976);
        assert_eq!(video.end_tc, "00:00:10:00");

        let audio = assets.iter().find(|a| a.file_name == "vo.wav").unwrap();
        assert_eq!(audio.media_type, MediaType::Audio);
        assert_eq!(audio.resolution, "Audio");
        assert_eq!(audio.duration, "60");
    }

    #[test]
    fn scan_of_empty_dir_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_media_dir(dir.path(), "p1").unwrap().is_empty());
    }
}
