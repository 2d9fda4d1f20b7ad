//! Pose graph
//!
//! Every vertex with a declared pose has one edge to the frame its pose is
//! expressed in, carrying `X_to_from`. Resolving `source` relative to `target`
//! walks both vertices towards the root, finds their lowest common ancestor
//! and composes `inv(X_lca_target) * X_lca_source`.

use crate::error::{Error, ErrorCode};
use crate::graph::{EdgeTable, FrameArena, VertexId, Walk, WalkEnd};
use crate::transform::Pose;
use tracing::trace;

/// Edges `from -> to` carrying the pose of `from` expressed in `to`
#[derive(Debug, Clone, Default)]
pub struct PoseGraph {
    edges: EdgeTable<Pose>,
}

impl PoseGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connect(&mut self, from: VertexId, to: VertexId, pose: Pose) {
        self.edges.connect(from, to, pose);
    }

    /// Parent vertex and stored pose of `from`
    pub fn edge(&self, from: VertexId) -> Option<(VertexId, &Pose)> {
        self.edges.edge(from).map(|e| (e.to, &e.data))
    }

    /// Number of pose edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn edges(&self) -> &EdgeTable<Pose> {
        &self.edges
    }

    /// Walk from `start` to the vertex without an outgoing edge
    pub fn walk_to_root(&self, arena: &FrameArena, start: VertexId) -> Result<Walk, Error> {
        let walk = self.edges.walk(start, arena.len(), |_| false);
        if let WalkEnd::Cycle(repeated) = walk.end {
            return Err(Error::new(
                ErrorCode::PoseRelativeToCycle,
                format!(
                    "relative_to cycle detected, already visited frame [{}] while resolving [{}]",
                    arena.vertex(repeated).scoped_name,
                    arena.vertex(start).scoped_name
                ),
            ));
        }
        Ok(walk)
    }

    /// Pose of `source` expressed in `target`
    pub fn resolve(
        &self,
        arena: &FrameArena,
        source: VertexId,
        target: VertexId,
    ) -> Result<Pose, Error> {
        if source == target {
            return Ok(Pose::identity());
        }

        let source_path = self.walk_to_root(arena, source)?.path;
        let target_path = self.walk_to_root(arena, target)?.path;

        // target is an ancestor of source, or the other way round
        if let Some(i) = source_path.iter().position(|v| *v == target) {
            return Ok(self.compose(arena, &source_path, i));
        }
        if let Some(j) = target_path.iter().position(|v| *v == source) {
            return Ok(self.compose(arena, &target_path, j).inverse());
        }

        let (mut i, mut j) = (source_path.len(), target_path.len());
        while i > 0 && j > 0 && source_path[i - 1] == target_path[j - 1] {
            i -= 1;
            j -= 1;
        }
        if i == source_path.len() {
            return Err(Error::new(
                ErrorCode::PoseRelativeToInvalid,
                format!(
                    "frames [{}] and [{}] share no common ancestor",
                    arena.vertex(source).scoped_name,
                    arena.vertex(target).scoped_name
                ),
            ));
        }

        let source_to_lca = self.compose(arena, &source_path, i);
        let target_to_lca = self.compose(arena, &target_path, j);
        Ok(target_to_lca.inverse() * source_to_lca)
    }

    /// Frames crossed going from `source` to `target`, both included
    pub fn frame_chain(
        &self,
        arena: &FrameArena,
        source: VertexId,
        target: VertexId,
    ) -> Result<Vec<VertexId>, Error> {
        if source == target {
            return Ok(vec![source]);
        }
        let mut source_path = self.walk_to_root(arena, source)?.path;
        let target_path = self.walk_to_root(arena, target)?.path;

        let lca = source_path
            .iter()
            .position(|v| target_path.contains(v))
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::PoseRelativeToInvalid,
                    format!(
                        "frames [{}] and [{}] share no common ancestor",
                        arena.vertex(source).scoped_name,
                        arena.vertex(target).scoped_name
                    ),
                )
            })?;
        let common = source_path[lca];
        source_path.truncate(lca + 1);
        let down = target_path
            .iter()
            .position(|v| *v == common)
            .unwrap_or(target_path.len());
        source_path.extend(target_path[..down].iter().rev());
        Ok(source_path)
    }

    /// `X_{path[upto]}_{path[0]}`, pre-multiplying each edge going up
    fn compose(&self, arena: &FrameArena, path: &[VertexId], upto: usize) -> Pose {
        let mut pose = Pose::identity();
        for from in &path[..upto] {
            if let Some((to, edge)) = self.edge(*from) {
                trace!(
                    from = %arena.vertex(*from).scoped_name,
                    to = %arena.vertex(to).scoped_name,
                    "compose pose edge"
                );
                pose = edge * pose;
            }
        }
        pose
    }
}
