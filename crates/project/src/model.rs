use serde::{Deserialize, Serialize};

/// One authored project; everything else in the registry is keyed under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }

    pub fn from_str_or_video(s: &str) -> Self {
        if s == "audio" {
            MediaType::Audio
        } else {
            MediaType::Video
        }
    }
}

/// One token of an attached transcript.
///
/// `start <= end`; within one transcript words are produced in
/// non-decreasing start order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub id: String,
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_tc: Option<String>,
}

/// One physical media file in the canonical registry.
///
/// `file_name` is the stable identifier within a project. `duration` is kept
/// as a string (two-decimal once recomputed from timecodes) to match the
/// interchange records it round-trips through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub file_name: String,
    pub project_id: String,
    pub clip_directory: String,
    pub file_path: String,
    pub media_type: MediaType,
    pub start_tc: String,
    pub end_tc: String,
    pub duration: String,
    pub fps: f64,
    pub resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptWord>>,
}

/// One source track inside a decoded multi-track sequence import.
///
/// `in_point`/`out_point` are native frame units; `duration` is seconds,
/// `(out - in) / fps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerTrack {
    pub file_name: String,
    pub track_index: usize,
    pub offset_frames: i64,
    pub start_frame: i64,
    pub end_frame: i64,
    pub duration: f64,
    pub media_type: MediaType,
    pub in_point: i64,
    pub out_point: i64,
}

/// A decoded multi-track sequence import (e.g. a multicam sync). Created
/// wholesale by the sequence-XML parser and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiCamContainer {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub tracks: Vec<ContainerTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptWord>>,
    pub duration: f64,
    pub fps: f64,
    pub start_tc: String,
}
