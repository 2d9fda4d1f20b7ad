//! Attachment graph
//!
//! Records which vertex every frame is rigidly fixed to. Resolution follows
//! those edges until it reaches a link, the world root or a model placeholder.
//! A placeholder whose model has a canonical link hands resolution on to that
//! link, so a frame attached to a nested model ends on the body that carries
//! the model frame.

use crate::error::{Error, ErrorCode};
use crate::graph::{EdgeTable, FrameArena, VertexId, VertexKind, Walk, WalkEnd};
use std::collections::HashSet;
use tracing::trace;

/// Edges `from -> to` meaning "from is rigidly attached to to"
#[derive(Debug, Clone, Default)]
pub struct AttachmentGraph {
    edges: EdgeTable<()>,
}

impl AttachmentGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connect(&mut self, from: VertexId, to: VertexId) {
        self.edges.connect(from, to, ());
    }

    /// Vertex `from` is attached to, if it has an edge
    pub fn target(&self, from: VertexId) -> Option<VertexId> {
        self.edges.target(from)
    }

    /// Number of attachment edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn edges(&self) -> &EdgeTable<()> {
        &self.edges
    }

    /// Walk from `start` to the first canonical terminal
    pub fn walk(&self, arena: &FrameArena, start: VertexId) -> Walk {
        self.edges.walk(start, arena.len(), |v| {
            arena.vertex(v).kind.is_canonical_terminal()
        })
    }

    /// Body `start` is ultimately attached to
    pub fn resolve(&self, arena: &FrameArena, start: VertexId) -> Result<VertexId, Error> {
        let mut current = start;
        let mut entered = HashSet::new();

        loop {
            let walk = self.walk(arena, current);
            match walk.end {
                WalkEnd::Terminal => {}
                WalkEnd::Cycle(repeated) => {
                    return Err(Error::new(
                        ErrorCode::FrameAttachedToCycle,
                        format!(
                            "attached_to cycle detected, already visited frame [{}] while resolving [{}]",
                            arena.vertex(repeated).scoped_name,
                            arena.vertex(start).scoped_name
                        ),
                    ));
                }
                WalkEnd::Open => {
                    let last = arena.vertex(walk.last());
                    return Err(Error::new(
                        ErrorCode::FrameAttachedToInvalid,
                        format!(
                            "{} [{}] is not attached to any link while resolving [{}]",
                            last.kind,
                            last.scoped_name,
                            arena.vertex(start).scoped_name
                        ),
                    ));
                }
            }

            let end = walk.last();
            if arena.vertex(end).kind != VertexKind::ModelPlaceholder {
                return Ok(end);
            }

            // placeholders defer to their model's canonical link when there is one
            match arena.model_scope(end).and_then(|s| s.canonical_link) {
                None => return Ok(end),
                Some(_) if !entered.insert(end) => {
                    return Err(Error::new(
                        ErrorCode::FrameAttachedToCycle,
                        format!(
                            "canonical link of model [{}] leads back to itself",
                            arena.vertex(end).scoped_name
                        ),
                    ));
                }
                Some(canonical) => {
                    trace!(
                        model = %arena.vertex(end).scoped_name,
                        link = %arena.vertex(canonical).scoped_name,
                        "continuing into canonical link"
                    );
                    current = canonical;
                }
            }
        }
    }
}
