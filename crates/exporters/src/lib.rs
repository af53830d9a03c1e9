//! Compilation of a canvas snapshot into interchange XML: the graph
//! flattener plus the XMEML serializer.

use canvas::{AnchorEdge, CanvasError, StoryNode};
use thiserror::Error;

mod sequencer;
mod xmeml;

pub use sequencer::{
    flatten_canvas, FlattenedClip, Timeline, TimelineMarker, DEFAULT_FPS, PIXELS_PER_SECOND,
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Compile a canvas snapshot straight to XMEML with a timestamped sequence
/// name. `Ok(None)` means there was nothing playable to export.
pub fn flatten_canvas_to_timeline(
    nodes: &[StoryNode],
    edges: &[AnchorEdge],
    fps: f64,
) -> Result<Option<String>, ExportError> {
    Ok(flatten_canvas(nodes, edges, fps)?.map(|timeline| timeline.to_xmeml_stamped()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas::{NodeData, NodeKind, Position};

    fn spine(id: &str, x: f64) -> StoryNode {
        StoryNode {
            id: id.to_string(),
            kind: NodeKind::SpineNode,
            position: Position { x, y: 200.0 },
            parent_id: None,
            data: NodeData {
                label: id.to_string(),
                duration: 5.0,
                end_time: 5.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn empty_canvas_exports_nothing() {
        assert!(flatten_canvas_to_timeline(&[], &[], DEFAULT_FPS)
            .unwrap()
            .is_none());
    }

    #[test]
    fn stamped_export_names_the_sequence() {
        let xml = flatten_canvas_to_timeline(&[spine("a", 0.0)], &[], DEFAULT_FPS)
            .unwrap()
            .unwrap();
        assert!(xml.contains("<name>Story Graph - "));
        assert!(xml.contains("<clipitem id=\"a\">"));
    }
}
