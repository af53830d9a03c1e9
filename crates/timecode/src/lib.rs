//! Frame-rate aware time conversions: seconds, frame counts, and
//! `HH:MM:SS:FF` timecode strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimecodeError {
    #[error("invalid frame rate: {0}/{1}")]
    InvalidRate(u32, u32),
}

/// Rational frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn try_new(num: u32, den: u32) -> Result<Self, TimecodeError> {
        if num == 0 || den == 0 {
            return Err(TimecodeError::InvalidRate(num, den));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Nominal integer frames per second used as the timecode frame-field
    /// wraparound (24 for 23.976, 30 for 29.97).
    pub fn nominal(&self) -> u32 {
        self.as_f64().round() as u32
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 24, den: 1 }
    }
}

/// Result of parsing a timecode string.
///
/// A malformed string parses to zero seconds, which is indistinguishable from
/// a genuine midnight timecode by value alone; `valid` carries the
/// distinction so callers can decide whether zero was parsed or defaulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TcSeconds {
    pub seconds: f64,
    pub valid: bool,
}

impl TcSeconds {
    fn invalid() -> Self {
        Self { seconds: 0.0, valid: false }
    }
}

/// Parse a 4-field colon-delimited `H:M:S:F` timecode into seconds at the
/// given frame rate.
///
/// Anything that is not exactly four numeric colon-separated fields yields
/// `{ seconds: 0.0, valid: false }` rather than an error.
pub fn timecode_to_seconds(tc: &str, fps: f64) -> TcSeconds {
    if fps <= 0.0 {
        return TcSeconds::invalid();
    }
    let parts: Vec<&str> = tc.trim().split(':').collect();
    if parts.len() != 4 {
        return TcSeconds::invalid();
    }
    let mut fields = [0u64; 4];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        match part.trim().parse::<u64>() {
            Ok(v) => *slot = v,
            Err(_) => return TcSeconds::invalid(),
        }
    }
    let [h, m, s, f] = fields;
    TcSeconds {
        seconds: h as f64 * 3600.0 + m as f64 * 60.0 + s as f64 + f as f64 / fps,
        valid: true,
    }
}

/// Format seconds as `HH:MM:SS:FF` at the given frame rate.
///
/// Seconds are quantized to the nearest frame, then decomposed with
/// `floor(fps)` as the frame-field wraparound boundary.
pub fn seconds_to_timecode(total_seconds: f64, fps: f64) -> String {
    let fps_int = (fps.floor() as u64).max(1);
    let total_frames = (total_seconds * fps).round().max(0.0) as u64;

    let frames = total_frames % fps_int;
    let whole_seconds = total_frames / fps_int;
    let hours = whole_seconds / 3600;
    let minutes = (whole_seconds % 3600) / 60;
    let seconds = whole_seconds % 60;

    format!("{:02}:{:02}:{:02}:{:02}", hours, minutes, seconds, frames)
}
