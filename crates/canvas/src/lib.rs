//! Canvas graph model and interactive session state: hierarchical story
//! nodes on a 2-D canvas, anchor edges, the scene-isolation view, and
//! debounced snapshot persistence.

use thiserror::Error;

mod autosave;
mod graph;
mod session;

pub use autosave::{AutosaveHandle, SavePayload};
pub use graph::{
    absolute_x, isolated_view, AnchorEdge, NodeData, NodeKind, Position, StoryNode,
    MAX_PARENT_DEPTH, SPINE_Y,
};
pub use session::{CanvasSession, EdgeChange, NodeChange, NodeSeed};

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("parent chain of node {node_id} exceeds max depth; cycle suspected")]
    ParentCycle { node_id: String },
}
