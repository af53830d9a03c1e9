use crate::autosave::{AutosaveHandle, SavePayload};
use crate::graph::{AnchorEdge, NodeData, NodeKind, Position, StoryNode, SPINE_Y};
use anyhow::Result;
use project::{MediaAsset, RegistryDb, TranscriptWord};
use uuid::Uuid;

/// Seed values for a node dropped onto the canvas, typically derived from a
/// registry asset.
#[derive(Debug, Clone, Default)]
pub struct NodeSeed {
    pub label: String,
    pub asset_id: Option<String>,
    pub duration: Option<f64>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub transcript: Option<Vec<TranscriptWord>>,
}

impl NodeSeed {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Default::default() }
    }

    pub fn from_asset(asset: &MediaAsset) -> Self {
        Self {
            label: asset.file_name.clone(),
            asset_id: Some(asset.file_name.clone()),
            duration: asset.duration.trim().parse::<f64>().ok(),
            start_time: None,
            end_time: None,
            transcript: asset.transcript.clone(),
        }
    }
}

/// A single mutation to the node set, mirroring what the interactive canvas
/// produces during drags and deletions.
#[derive(Debug, Clone)]
pub enum NodeChange {
    Move { id: String, position: Position },
    Remove { id: String },
}

#[derive(Debug, Clone)]
pub enum EdgeChange {
    Remove { id: String },
}

/// One project's interactive canvas state. All mutation goes through the
/// session; every mutating call re-applies the spine pinning rule and
/// schedules a debounced save when an autosave handle is attached.
pub struct CanvasSession {
    project_id: String,
    pub nodes: Vec<StoryNode>,
    pub edges: Vec<AnchorEdge>,
    active_parent_id: Option<String>,
    is_isolated: bool,
    autosave: Option<AutosaveHandle>,
}

impl CanvasSession {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            active_parent_id: None,
            is_isolated: false,
            autosave: None,
        }
    }

    pub fn with_autosave(mut self, handle: AutosaveHandle) -> Self {
        self.autosave = Some(handle);
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn is_isolated(&self) -> bool {
        self.is_isolated
    }

    pub fn active_parent_id(&self) -> Option<&str> {
        self.active_parent_id.as_deref()
    }

    /// Load the persisted snapshot for this session's project, replacing the
    /// in-memory graph. A missing snapshot leaves the session empty.
    pub fn load(&mut self, db: &RegistryDb) -> Result<()> {
        if let Some((nodes, edges)) = db.get_graph(&self.project_id)? {
            self.nodes = serde_json::from_value(nodes)?;
            self.edges = serde_json::from_value(edges)?;
        }
        self.is_isolated = false;
        self.active_parent_id = None;
        Ok(())
    }

    /// Persist the current graph immediately, bypassing the debounce.
    pub fn save_now(&self, db: &RegistryDb) -> Result<()> {
        db.put_graph(
            &self.project_id,
            &serde_json::to_value(&self.nodes)?,
            &serde_json::to_value(&self.edges)?,
        )
    }

    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        for change in changes {
            match change {
                NodeChange::Move { id, position } => {
                    if let Some(node) = self.nodes.iter_mut().find(|n| n.id == *id) {
                        node.position = *position;
                    }
                }
                NodeChange::Remove { id } => {
                    self.nodes.retain(|n| n.id != *id);
                    self.edges.retain(|e| e.source != *id && e.target != *id);
                }
            }
        }
        self.enforce_spine_physics();
        self.schedule_save();
    }

    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        for change in changes {
            match change {
                EdgeChange::Remove { id } => self.edges.retain(|e| e.id != *id),
            }
        }
        self.schedule_save();
    }

    /// Add an anchor edge between two nodes.
    pub fn connect(&mut self, source: &str, target: &str) -> &AnchorEdge {
        self.edges.push(AnchorEdge {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            target: target.to_string(),
        });
        self.schedule_save();
        self.edges.last().unwrap()
    }

    /// Place a new node. Inside isolation the active parent becomes the
    /// node's parent, so the new node lives in the drilled-into scene.
    pub fn add_node_at_position(
        &mut self,
        kind: NodeKind,
        position: Position,
        seed: NodeSeed,
    ) -> &StoryNode {
        let position = if kind == NodeKind::SpineNode {
            Position { x: position.x, y: SPINE_Y }
        } else {
            position
        };
        let duration = seed.duration.unwrap_or(5.0);
        let node = StoryNode {
            id: Uuid::new_v4().to_string(),
            kind,
            position,
            parent_id: self.active_parent_id.clone(),
            data: NodeData {
                label: seed.label,
                asset_id: seed.asset_id,
                duration,
                start_time: seed.start_time.unwrap_or(0.0),
                end_time: seed.end_time.unwrap_or(duration),
                transcript: seed.transcript,
            },
        };
        self.nodes.push(node);
        self.schedule_save();
        self.nodes.last().unwrap()
    }

    pub fn enter_isolation(&mut self, scene_id: &str) {
        self.active_parent_id = Some(scene_id.to_string());
        self.is_isolated = true;
    }

    pub fn exit_isolation(&mut self) {
        self.active_parent_id = None;
        self.is_isolated = false;
    }

    /// The currently visible subgraph (isolation applied).
    pub fn visible(&self) -> (Vec<&StoryNode>, Vec<&AnchorEdge>) {
        crate::graph::isolated_view(
            &self.nodes,
            &self.edges,
            self.is_isolated,
            self.active_parent_id.as_deref(),
        )
    }

    fn enforce_spine_physics(&mut self) {
        for node in &mut self.nodes {
            if node.kind == NodeKind::SpineNode {
                node.position.y = SPINE_Y;
            }
        }
    }

    fn schedule_save(&self) {
        let Some(autosave) = &self.autosave else {
            return;
        };
        match (
            serde_json::to_value(&self.nodes),
            serde_json::to_value(&self.edges),
        ) {
            (Ok(nodes), Ok(edges)) => autosave.submit(SavePayload {
                project_id: self.project_id.clone(),
                nodes,
                edges,
            }),
            _ => tracing::warn!(project = %self.project_id, "graph snapshot not serializable; save skipped"),
        }
    }
}
