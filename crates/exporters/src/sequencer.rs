//! Narrative-graph compiler: flattens the hierarchical canvas into an
//! ordered, frame-accurate clip and marker list.

use crate::ExportError;
use canvas::{absolute_x, AnchorEdge, NodeKind, StoryNode};
use serde::Serialize;

/// Canvas-space to time mapping.
pub const PIXELS_PER_SECOND: f64 = 100.0;
pub const DEFAULT_FPS: f64 = 24.0;

/// Nominal marker lengths in frames. Cosmetic, not derived from content.
const ACT_MARKER_FRAMES: i64 = 2400;
const SCENE_MARKER_FRAMES: i64 = 240;

/// One playable node resolved to timeline and source frame ranges.
#[derive(Debug, Clone, Serialize)]
pub struct FlattenedClip {
    pub id: String,
    pub name: String,
    pub timeline_start: i64,
    pub timeline_end: i64,
    pub source_in: i64,
    pub source_out: i64,
    /// 1 = spine (audio), 2 = satellite (video).
    pub track: u32,
}

/// A structural node (act/scene) rendered as a sequence marker.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineMarker {
    pub name: String,
    pub start: i64,
    pub duration: i64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub clips: Vec<FlattenedClip>,
    pub markers: Vec<TimelineMarker>,
    pub fps: f64,
}

/// Flatten one canvas snapshot. Returns `None` when there is nothing
/// playable to export. Edges are visual anchors only and carry no timeline
/// semantics.
///
/// Overlapping clips on a track are passed through unchanged; there is no
/// collision handling.
pub fn flatten_canvas(
    nodes: &[StoryNode],
    _edges: &[AnchorEdge],
    fps: f64,
) -> Result<Option<Timeline>, ExportError> {
    let playable: Vec<&StoryNode> = nodes.iter().filter(|n| n.kind.is_playable()).collect();
    let structural: Vec<&StoryNode> = nodes.iter().filter(|n| !n.kind.is_playable()).collect();

    if playable.is_empty() {
        return Ok(None);
    }

    let mut positioned: Vec<(&StoryNode, f64)> = Vec::with_capacity(playable.len());
    for node in playable {
        positioned.push((node, absolute_x(&node.id, nodes)?));
    }
    positioned.sort_by(|a, b| a.1.total_cmp(&b.1));

    // The leftmost playable node becomes the session's time origin.
    let start_offset = positioned[0].1;

    let clips = positioned
        .iter()
        .map(|(node, abs_x)| {
            let timeline_start_sec = (abs_x - start_offset) / PIXELS_PER_SECOND;
            let duration = effective_duration(node);
            let end_time = if node.data.end_time > 0.0 {
                node.data.end_time
            } else {
                duration
            };
            FlattenedClip {
                id: node.id.clone(),
                name: effective_label(node, "Untitled Clip"),
                timeline_start: (timeline_start_sec * fps).round() as i64,
                timeline_end: ((timeline_start_sec + duration) * fps).round() as i64,
                source_in: (node.data.start_time * fps).round() as i64,
                source_out: (end_time * fps).round() as i64,
                track: if node.kind == NodeKind::SpineNode { 1 } else { 2 },
            }
        })
        .collect();

    let mut markers = Vec::with_capacity(structural.len());
    for node in structural {
        let abs_x = absolute_x(&node.id, nodes)?;
        let start = ((abs_x - start_offset) / PIXELS_PER_SECOND * fps).round() as i64;
        let (duration, color) = if node.kind == NodeKind::ActNode {
            (ACT_MARKER_FRAMES, "blue")
        } else {
            (SCENE_MARKER_FRAMES, "green")
        };
        markers.push(TimelineMarker {
            name: effective_label(node, "Marker"),
            start,
            duration,
            color: color.to_string(),
        });
    }

    Ok(Some(Timeline { clips, markers, fps }))
}

fn effective_duration(node: &StoryNode) -> f64 {
    if node.data.duration > 0.0 {
        node.data.duration
    } else {
        5.0
    }
}

fn effective_label(node: &StoryNode, fallback: &str) -> String {
    if node.data.label.is_empty() {
        fallback.to_string()
    } else {
        node.data.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas::{NodeData, Position};

    pub(crate) fn node(
        id: &str,
        kind: NodeKind,
        x: f64,
        parent: Option<&str>,
        duration: f64,
    ) -> StoryNode {
        StoryNode {
            id: id.to_string(),
            kind,
            position: Position { x, y: 0.0 },
            parent_id: parent.map(str::to_string),
            data: NodeData {
                label: format!("clip {id}"),
                asset_id: None,
                duration,
                start_time: 0.0,
                end_time: duration,
                transcript: None,
            },
        }
    }

    #[test]
    fn no_playable_nodes_means_no_output() {
        let nodes = vec![node("act", NodeKind::ActNode, 0.0, None, 0.0)];
        assert!(flatten_canvas(&nodes, &[], DEFAULT_FPS).unwrap().is_none());
    }

    #[test]
    fn leftmost_playable_node_starts_at_frame_zero() {
        let nodes = vec![
            node("a", NodeKind::SpineNode, 730.0, None, 5.0),
            node("b", NodeKind::SatelliteNode, 930.0, None, 5.0),
        ];
        let timeline = flatten_canvas(&nodes, &[], 24.0).unwrap().unwrap();
        assert_eq!(timeline.clips[0].id, "a");
        assert_eq!(timeline.clips[0].timeline_start, 0);
        // 200 px right = 2 s = 48 frames at 24 fps.
        assert_eq!(timeline.clips[1].timeline_start, 48);
    }

    #[test]
    fn nested_nodes_order_by_summed_offsets() {
        let nodes = vec![
            node("scene", NodeKind::SceneNode, 500.0, None, 0.0),
            node("inner", NodeKind::SpineNode, 50.0, Some("scene"), 5.0),
            node("outer", NodeKind::SatelliteNode, 100.0, None, 5.0),
        ];
        let timeline = flatten_canvas(&nodes, &[], 24.0).unwrap().unwrap();
        // outer at absolute 100, inner at 550.
        assert_eq!(timeline.clips[0].id, "outer");
        assert_eq!(timeline.clips[1].id, "inner");
        assert_eq!(timeline.clips[1].timeline_start, (4.5 * 24.0_f64).round() as i64);
    }

    #[test]
    fn clip_frames_come_from_duration_and_source_window() {
        let mut n = node("a", NodeKind::SpineNode, 0.0, None, 10.0);
        n.data.start_time = 2.0;
        n.data.end_time = 12.0;
        let timeline = flatten_canvas(&[n], &[], 24.0).unwrap().unwrap();
        let clip = &timeline.clips[0];
        assert_eq!(clip.timeline_start, 0);
        assert_eq!(clip.timeline_end, 240);
        assert_eq!(clip.source_in, 48);
        assert_eq!(clip.source_out, 288);
        assert_eq!(clip.track, 1);
    }

    #[test]
    fn zero_duration_defaults_to_five_seconds() {
        let nodes = vec![node("a", NodeKind::SatelliteNode, 0.0, None, 0.0)];
        let timeline = flatten_canvas(&nodes, &[], 24.0).unwrap().unwrap();
        assert_eq!(timeline.clips[0].timeline_end, 120);
        assert_eq!(timeline.clips[0].source_out, 120);
        assert_eq!(timeline.clips[0].track, 2);
    }

    #[test]
    fn overlapping_clips_on_a_track_pass_through() {
        let nodes = vec![
            node("a", NodeKind::SpineNode, 0.0, None, 10.0),
            node("b", NodeKind::SpineNode, 100.0, None, 10.0),
        ];
        let timeline = flatten_canvas(&nodes, &[], 24.0).unwrap().unwrap();
        assert_eq!(timeline.clips[0].timeline_end, 240);
        assert_eq!(timeline.clips[1].timeline_start, 24);
        assert!(timeline.clips[1].timeline_start < timeline.clips[0].timeline_end);
    }

    #[test]
    fn structural_nodes_become_markers_with_kind_lengths() {
        let nodes = vec![
            node("act", NodeKind::ActNode, 100.0, None, 0.0),
            node("scene", NodeKind::SceneNode, 200.0, None, 0.0),
            node("a", NodeKind::SpineNode, 100.0, None, 5.0),
        ];
        let timeline = flatten_canvas(&nodes, &[], 24.0).unwrap().unwrap();
        assert_eq!(timeline.markers.len(), 2);
        assert_eq!(timeline.markers[0].start, 0);
        assert_eq!(timeline.markers[0].duration, 2400);
        assert_eq!(timeline.markers[0].color, "blue");
        assert_eq!(timeline.markers[1].start, 24);
        assert_eq!(timeline.markers[1].duration, 240);
        assert_eq!(timeline.markers[1].color, "green");
    }

    #[test]
    fn cyclic_parents_surface_as_error() {
        let nodes = vec![
            node("a", NodeKind::SpineNode, 0.0, Some("b"), 5.0),
            node("b", NodeKind::SceneNode, 0.0, Some("a"), 0.0),
        ];
        assert!(flatten_canvas(&nodes, &[], 24.0).is_err());
    }
}
