//! Cross-scope stitching of nested models
//!
//! A nested model gets its own scope whose root is a placeholder vertex. The
//! same vertex is registered by name in the parent namespace, and linking
//! gives it ordinary attachment and pose edges into the parent scope. Those
//! are the only edges that cross a scope boundary, so a query from inside a
//! model to a frame outside it crosses exactly one of them per nesting level.

use crate::attachment::AttachmentGraph;
use crate::graph::{Declared, FrameArena, ScopeId, VertexId};
use crate::pose_graph::PoseGraph;
use crate::transform::Pose;
use tracing::trace;

/// Outcome of linking one nested model into its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linked {
    pub placeholder: VertexId,
    /// Parent-scope vertex the model is attached to, if its name resolved
    pub attached_to: Option<VertexId>,
    /// Parent-scope vertex the placement pose is expressed in, if resolved
    pub relative_to: Option<VertexId>,
}

impl Linked {
    /// Both the attachment and the placement edge were added
    pub fn is_complete(&self) -> bool {
        self.attached_to.is_some() && self.relative_to.is_some()
    }
}

pub struct ScopeLinker;

impl ScopeLinker {
    /// Open a model scope nested in `parent` and register its placeholder
    pub(crate) fn nest(
        arena: &mut FrameArena,
        parent: ScopeId,
        name: &str,
        declared: Declared,
    ) -> ScopeId {
        arena.add_nested_scope(parent, name, declared)
    }

    /// Give the placeholder of `nested` its edges in the parent scope
    ///
    /// The placement is expressed in the declared `relative_to` frame and the
    /// model is attached to its declared `attached_to` frame, both looked up
    /// in the parent namespace and both defaulting to the parent scope root.
    /// Names that do not resolve leave the edge out; the validator reports
    /// them.
    pub(crate) fn link(
        arena: &FrameArena,
        attachment: &mut AttachmentGraph,
        poses: &mut PoseGraph,
        nested: ScopeId,
        placement: Pose,
    ) -> Option<Linked> {
        let scope = arena.scope(nested);
        let parent = scope.parent?;
        let placeholder = scope.root;
        let declared = &arena.vertex(placeholder).declared;
        let parent_root = arena.scope(parent).root;

        let resolve = |reference: &Option<String>| match reference {
            Some(name) => arena.lookup(parent, name),
            None => Some(parent_root),
        };

        let attached_to = resolve(&declared.attached_to);
        if let Some(target) = attached_to {
            attachment.connect(placeholder, target);
        }

        let relative_to = resolve(&declared.relative_to);
        if let Some(target) = relative_to {
            poses.connect(placeholder, target, placement);
        }

        trace!(
            model = %arena.vertex(placeholder).scoped_name,
            attached = attached_to.is_some(),
            placed = relative_to.is_some(),
            "linked nested model"
        );

        Some(Linked {
            placeholder,
            attached_to,
            relative_to,
        })
    }
}
