use crate::CanvasError;
use project::TranscriptWord;
use serde::{Deserialize, Serialize};

/// Vertical lane spine nodes are pinned to, enforced on every mutation.
pub const SPINE_Y: f64 = 200.0;

/// Parent chains deeper than this are treated as cyclic.
pub const MAX_PARENT_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    ActNode,
    SceneNode,
    SpineNode,
    SatelliteNode,
}

impl NodeKind {
    /// Playable nodes carry timeline content; the rest are structural and
    /// only ever become markers.
    pub fn is_playable(&self) -> bool {
        matches!(self, NodeKind::SpineNode | NodeKind::SatelliteNode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Per-node payload: label plus the source in/out window used at flatten
/// time. Times are seconds relative to the referenced asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    pub duration: f64,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptWord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryNode {
    pub id: String,
    pub kind: NodeKind,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub data: NodeData,
}

/// A directed visual anchor between two nodes. Carries no timeline
/// semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Resolve a node's absolute X by walking its parent chain and summing
/// offsets. Nested placement models a tree; only X matters for temporal
/// ordering. A missing node contributes 0. The walk is iterative and capped
/// at [`MAX_PARENT_DEPTH`], failing closed on cyclic parent chains.
pub fn absolute_x(node_id: &str, nodes: &[StoryNode]) -> Result<f64, CanvasError> {
    let mut total = 0.0;
    let mut current = Some(node_id);
    let mut depth = 0;

    while let Some(id) = current {
        let Some(node) = nodes.iter().find(|n| n.id == id) else {
            break;
        };
        total += node.position.x;
        current = node.parent_id.as_deref();
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            return Err(CanvasError::ParentCycle {
                node_id: node_id.to_string(),
            });
        }
    }
    Ok(total)
}

/// Display-time projection for the "drill into one scene" view.
///
/// When isolated, keeps only nodes parented to `active_parent_id` (plus the
/// parent itself) and edges with both endpoints in that set. Never mutates
/// the underlying graph; compilation always runs on the full graph.
pub fn isolated_view<'a>(
    nodes: &'a [StoryNode],
    edges: &'a [AnchorEdge],
    is_isolated: bool,
    active_parent_id: Option<&str>,
) -> (Vec<&'a StoryNode>, Vec<&'a AnchorEdge>) {
    let (Some(parent), true) = (active_parent_id, is_isolated) else {
        return (nodes.iter().collect(), edges.iter().collect());
    };

    let visible_nodes: Vec<&StoryNode> = nodes
        .iter()
        .filter(|n| n.parent_id.as_deref() == Some(parent) || n.id == parent)
        .collect();
    let ids: std::collections::HashSet<&str> =
        visible_nodes.iter().map(|n| n.id.as_str()).collect();
    let visible_edges = edges
        .iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
        .collect();
    (visible_nodes, visible_edges)
}
