//! Subtitle-block transcript decoder.
//!
//! Word timings are a linear approximation: each block's time span is
//! subdivided evenly across its whitespace-separated tokens. This is not
//! true word-level alignment and is preserved as-is from the source format.

use project::TranscriptWord;
use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

fn time_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{1,3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{1,3})",
        )
        .expect("subtitle time regex")
    })
}

fn capture_seconds(caps: &regex::Captures<'_>, base: usize) -> f64 {
    let field = |i: usize| caps[base + i].parse::<f64>().unwrap_or(0.0);
    // Fractional field is millis whether comma- or dot-separated.
    field(0) * 3600.0 + field(1) * 60.0 + field(2) + field(3) / 1000.0
}

/// Parse blank-line-delimited subtitle blocks into time-stamped words.
///
/// A block needs at least three lines with a `start --> end` pair on the
/// second; anything else is skipped silently.
pub fn parse_srt(content: &str) -> Vec<TranscriptWord> {
    let normalized = content.replace("\r\n", "\n");
    let mut words = Vec::new();

    for block in normalized.split("\n\n") {
        let lines: Vec<&str> = block.trim().lines().collect();
        if lines.len() < 3 {
            continue;
        }
        let Some(caps) = time_pair_re().captures(lines[1]) else {
            tracing::debug!(line = lines[1], "subtitle block without time pair skipped");
            continue;
        };
        let start = capture_seconds(&caps, 1);
        let end = capture_seconds(&caps, 5);

        let text = lines[2..].join(" ");
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let slice = (end - start) / tokens.len() as f64;
        for (i, token) in tokens.iter().enumerate() {
            words.push(TranscriptWord {
                id: Uuid::new_v4().to_string(),
                word: (*token).to_string(),
                start: start + i as f64 * slice,
                end: start + (i + 1) as f64 * slice,
                speaker: None,
                start_tc: None,
            });
        }
    }
    words
}
