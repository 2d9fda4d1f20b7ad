//! Raw pose plus the frame it is expressed in
//!
//! Wrapper types (links, joints, frames) hand out a [`SemanticPose`] for the
//! pose they declare. It holds only a [`GraphHandle`], never the graphs, and
//! resolves against whatever graphs the registry has for that handle at call
//! time.

use crate::error::{Error, ErrorCode};
use crate::registry::{GraphHandle, GraphRegistry};
use crate::transform::Pose;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SemanticPose {
    raw_pose: Pose,
    relative_to: String,
    default_resolve_to: String,
    registry: Arc<GraphRegistry>,
    handle: GraphHandle,
}

impl SemanticPose {
    /// `relative_to` may be empty, meaning `default_resolve_to`
    pub fn new(
        raw_pose: Pose,
        relative_to: impl Into<String>,
        default_resolve_to: impl Into<String>,
        registry: Arc<GraphRegistry>,
        handle: GraphHandle,
    ) -> Self {
        Self {
            raw_pose,
            relative_to: relative_to.into(),
            default_resolve_to: default_resolve_to.into(),
            registry,
            handle,
        }
    }

    pub fn raw_pose(&self) -> &Pose {
        &self.raw_pose
    }

    /// Frame the raw pose is expressed in, empty if implicit
    pub fn relative_to(&self) -> &str {
        &self.relative_to
    }

    pub fn default_resolve_to(&self) -> &str {
        &self.default_resolve_to
    }

    /// The pose expressed in `target`
    ///
    /// An empty `target` means the default resolve-to frame, or the scope
    /// root when that is empty too.
    pub fn resolve(&self, target: &str) -> Result<Pose, Error> {
        let graphs = self.registry.get(self.handle)?;
        let root = graphs
            .arena()
            .root()
            .map(|id| graphs.arena().vertex(id).scoped_name.clone())
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::PoseRelativeToInvalid,
                    "pose graph has no root frame",
                )
            })?;

        let pick = |preferred: &str| -> String {
            if !preferred.is_empty() {
                preferred.to_string()
            } else if !self.default_resolve_to.is_empty() {
                self.default_resolve_to.clone()
            } else {
                root.clone()
            }
        };

        let relative_to = pick(&self.relative_to);
        let target = pick(target);
        let frame_in_target = graphs.resolve_pose(&relative_to, &target)?;
        Ok(frame_in_target * self.raw_pose)
    }
}
