//! XMEML v5 timeline serializer.
//!
//! Field order and element nesting match what consuming NLE tools expect
//! and must not be reordered.

use crate::sequencer::Timeline;
use chrono::{SecondsFormat, Utc};
use std::fmt::Write;

const MARKER_COMMENT: &str = "Imported from Story Graph";

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn format_timebase(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{}", fps as i64)
    } else {
        format!("{fps}")
    }
}

impl Timeline {
    /// Serialize to XMEML with an explicit sequence name.
    pub fn to_xmeml(&self, sequence_name: &str) -> String {
        let timebase = format_timebase(self.fps);
        let mut xml = String::new();

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<xmeml version=\"5\">\n");
        xml.push_str("  <sequence>\n");
        let _ = writeln!(xml, "    <name>{}</name>", escape_xml(sequence_name));
        let _ = writeln!(xml, "    <rate><timebase>{timebase}</timebase></rate>");
        xml.push_str("    <media>\n");
        xml.push_str("      <video>\n");
        xml.push_str("        <track>\n");

        for clip in &self.clips {
            let _ = writeln!(xml, "          <clipitem id=\"{}\">", escape_xml(&clip.id));
            let _ = writeln!(xml, "            <name>{}</name>", escape_xml(&clip.name));
            let _ = writeln!(xml, "            <start>{}</start>", clip.timeline_start);
            let _ = writeln!(xml, "            <end>{}</end>", clip.timeline_end);
            let _ = writeln!(xml, "            <in>{}</in>", clip.source_in);
            let _ = writeln!(xml, "            <out>{}</out>", clip.source_out);
            let _ = writeln!(xml, "            <rate><timebase>{timebase}</timebase></rate>");
            xml.push_str("          </clipitem>\n");
        }

        xml.push_str("        </track>\n");
        xml.push_str("      </video>\n");
        xml.push_str("    </media>\n");
        xml.push_str("    <markerlist>\n");

        for marker in &self.markers {
            xml.push_str("      <marker>\n");
            let _ = writeln!(xml, "        <name>{}</name>", escape_xml(&marker.name));
            let _ = writeln!(xml, "        <in>{}</in>", marker.start);
            let _ = writeln!(xml, "        <out>{}</out>", marker.start + marker.duration);
            let _ = writeln!(xml, "        <comment>{MARKER_COMMENT}</comment>");
            xml.push_str("      </marker>\n");
        }

        xml.push_str("    </markerlist>\n");
        xml.push_str("  </sequence>\n");
        xml.push_str("</xmeml>\n");
        xml
    }

    /// Serialize with the generated `Story Graph - <timestamp>` name used by
    /// the interactive export.
    pub fn to_xmeml_stamped(&self) -> String {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.to_xmeml(&format!("Story Graph - {timestamp}"))
    }
}
