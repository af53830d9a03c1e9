//! Decoder for NLE sequence XML (multicam sync imports).
//!
//! Locates every `multiclip`/`sequence` element and emits one container per
//! match, with one track per `clipitem` child.

use crate::{media_type_for, IngestError};
use project::{ContainerTrack, MultiCamContainer};
use quick_xml::events::Event;
use quick_xml::Reader;
use uuid::Uuid;

const DEFAULT_TIMEBASE: f64 = 24.0;

#[derive(Default)]
struct ContainerBuild {
    name: Option<String>,
    fps: Option<f64>,
    duration_frames: Option<f64>,
    tracks: Vec<TrackBuild>,
}

#[derive(Default)]
struct TrackBuild {
    file_name: Option<String>,
    in_frame: Option<i64>,
    out_frame: Option<i64>,
    start_frame: Option<i64>,
    end_frame: Option<i64>,
}

fn is_container_tag(name: &str) -> bool {
    name == "multiclip" || name == "sequence"
}

/// Parse sequence XML into containers. `fallback_name` (typically the file
/// stem) is used for elements without a `name` child; `rate/timebase`
/// defaults to 24 when absent.
pub fn parse_sequence_xml(
    content: &str,
    project_id: &str,
    fallback_name: &str,
) -> Result<Vec<MultiCamContainer>, IngestError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut containers = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut container: Option<ContainerBuild> = None;
    let mut track: Option<TrackBuild> = None;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if is_container_tag(&name) && container.is_none() {
                    container = Some(ContainerBuild::default());
                } else if name == "clipitem" && container.is_some() && track.is_none() {
                    track = Some(TrackBuild::default());
                }
                path.push(name);
            }
            Event::End(_) => {
                let Some(name) = path.pop() else { continue };
                if name == "clipitem" {
                    if let (Some(c), Some(t)) = (container.as_mut(), track.take()) {
                        c.tracks.push(t);
                    }
                } else if is_container_tag(&name) {
                    if let Some(build) = container.take() {
                        containers.push(finish_container(build, project_id, fallback_name));
                    }
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape()?.trim().to_string();
                if text.is_empty() {
                    continue;
                }
                let leaf = path.last().map(String::as_str).unwrap_or("");
                let parent = path
                    .len()
                    .checked_sub(2)
                    .and_then(|i| path.get(i))
                    .map(String::as_str)
                    .unwrap_or("");

                if let Some(t) = track.as_mut() {
                    match (parent, leaf) {
                        ("file", "name") => t.file_name = Some(text),
                        ("clipitem", "in") => t.in_frame = text.parse().ok(),
                        ("clipitem", "out") => t.out_frame = text.parse().ok(),
                        ("clipitem", "start") => t.start_frame = text.parse().ok(),
                        ("clipitem", "end") => t.end_frame = text.parse().ok(),
                        _ => {}
                    }
                } else if let Some(c) = container.as_mut() {
                    match (parent, leaf) {
                        (p, "name") if is_container_tag(p) => c.name = Some(text),
                        ("rate", "timebase") => c.fps = text.parse().ok(),
                        (p, "duration") if is_container_tag(p) => {
                            c.duration_frames = text.parse().ok()
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    Ok(containers)
}

fn finish_container(
    build: ContainerBuild,
    project_id: &str,
    fallback_name: &str,
) -> MultiCamContainer {
    let fps = build.fps.filter(|f| *f > 0.0).unwrap_or(DEFAULT_TIMEBASE);
    let tracks = build
        .tracks
        .into_iter()
        .enumerate()
        .map(|(index, t)| {
            let file_name = t.file_name.unwrap_or_default();
            let in_frame = t.in_frame.unwrap_or(0);
            let out_frame = t.out_frame.unwrap_or(0);
            let start_frame = t.start_frame.unwrap_or(0);
            ContainerTrack {
                media_type: media_type_for(&file_name),
                file_name,
                track_index: index,
                offset_frames: start_frame,
                start_frame,
                end_frame: t.end_frame.unwrap_or(0),
                duration: (out_frame - in_frame) as f64 / fps,
                in_point: in_frame,
                out_point: out_frame,
            }
        })
        .collect();

    MultiCamContainer {
        id: Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        name: build
            .name
            .unwrap_or_else(|| fallback_name.to_string()),
        tracks,
        transcript: None,
        duration: build.duration_frames.unwrap_or(0.0) / fps,
        fps,
        start_tc: "00:00:00:00".to_string(),
    }
}
