//! Query surface over built graphs
//!
//! [`FrameGraphs`] bundles the vertex arena with both graphs of one world or
//! model and answers name-based queries on it. [`Resolver`] is the entry point
//! used by model and world wrappers: it builds graphs into a shared
//! [`GraphRegistry`] and answers queries through [`GraphHandle`]s, returning
//! a value together with the errors met on the way.
//!
//! Names are resolved from the outermost scope, so vertices of nested models
//! are addressed as `M::L`, and visuals or collisions through their link.

use crate::attachment::AttachmentGraph;
use crate::builder::GraphBuilder;
use crate::config::ParserConfig;
use crate::element::ElementView;
use crate::error::{Error, ErrorCode, Errors};
use crate::graph::{FrameArena, JointInfo, VertexId, VertexKind, WORLD_FRAME};
use crate::pose_graph::PoseGraph;
use crate::registry::{GraphHandle, GraphOwner, GraphRegistry};
use crate::transform::Pose;
use crate::validator::Validator;
use std::sync::Arc;

/// Attachment and pose graphs of one world or model
#[derive(Debug, Clone)]
pub struct FrameGraphs {
    arena: FrameArena,
    attachment: AttachmentGraph,
    pose: PoseGraph,
}

impl FrameGraphs {
    pub(crate) fn new(arena: FrameArena, attachment: AttachmentGraph, pose: PoseGraph) -> Self {
        Self {
            arena,
            attachment,
            pose,
        }
    }

    /// Graphs with no vertices; every query on them fails
    pub fn empty() -> Self {
        Self::new(
            FrameArena::new(false),
            AttachmentGraph::new(),
            PoseGraph::new(),
        )
    }

    pub fn arena(&self) -> &FrameArena {
        &self.arena
    }

    pub fn attachment(&self) -> &AttachmentGraph {
        &self.attachment
    }

    pub fn pose(&self) -> &PoseGraph {
        &self.pose
    }

    /// Vertex registered under `name` in the outermost scope
    pub fn find(&self, name: &str) -> Option<VertexId> {
        self.arena
            .root_scope()
            .and_then(|scope| self.arena.lookup(scope, name))
    }

    /// Scoped names of every frame reachable by name, in build order
    pub fn frame_names(&self) -> Vec<&str> {
        self.arena
            .ids()
            .filter(|id| self.find(&self.arena.vertex(*id).scoped_name) == Some(*id))
            .map(|id| self.arena.vertex(id).scoped_name.as_str())
            .collect()
    }

    fn require(&self, name: &str, code: ErrorCode) -> Result<VertexId, Error> {
        self.find(name).ok_or_else(|| {
            Error::new(code, format!("frame [{}] does not exist", name))
        })
    }

    fn scoped_name(&self, id: VertexId) -> String {
        self.arena.vertex(id).scoped_name.clone()
    }

    /// Name of the link (or world, or linkless model) `name` is attached to
    pub fn resolve_attached_to(&self, name: &str) -> Result<String, Error> {
        let vertex = self.require(name, ErrorCode::FrameAttachedToInvalid)?;
        let body = self.attachment.resolve(&self.arena, vertex)?;
        Ok(self.scoped_name(body))
    }

    /// Pose of frame `source` expressed in frame `target`
    pub fn resolve_pose(&self, source: &str, target: &str) -> Result<Pose, Error> {
        let source = self.require(source, ErrorCode::PoseRelativeToInvalid)?;
        let target = self.require(target, ErrorCode::PoseRelativeToInvalid)?;
        self.pose.resolve(&self.arena, source, target)
    }

    /// Pose of a visual or collision of `link` expressed in `target`
    ///
    /// Visuals are searched before collisions.
    pub fn resolve_child_pose(&self, link: &str, child: &str, target: &str) -> Result<Pose, Error> {
        let link_id = self.require(link, ErrorCode::PoseRelativeToInvalid)?;
        let child_id = [VertexKind::Visual, VertexKind::Collision]
            .into_iter()
            .find_map(|kind| self.arena.link_child(link_id, kind, child))
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::PoseRelativeToInvalid,
                    format!("link [{}] has no visual or collision [{}]", link, child),
                )
            })?;
        let target = self.require(target, ErrorCode::PoseRelativeToInvalid)?;
        self.pose.resolve(&self.arena, child_id, target)
    }

    /// Link the parent of `joint` is attached to; `world` stays `world`
    pub fn resolve_parent_link(&self, joint: &str) -> Result<String, Error> {
        let (id, parent) = self.joint_end(joint, ErrorCode::JointParentLinkInvalid, |info| {
            info.parent.as_str()
        })?;
        if parent == WORLD_FRAME {
            return Ok(WORLD_FRAME.to_string());
        }
        self.resolve_joint_end(id, parent, ErrorCode::JointParentLinkInvalid)
    }

    /// Link the child of `joint` is attached to
    pub fn resolve_child_link(&self, joint: &str) -> Result<String, Error> {
        let (id, child) = self.joint_end(joint, ErrorCode::JointChildLinkInvalid, |info| {
            info.child.as_str()
        })?;
        self.resolve_joint_end(id, child, ErrorCode::JointChildLinkInvalid)
    }

    fn joint_end<'g>(
        &'g self,
        joint: &str,
        code: ErrorCode,
        end: impl Fn(&'g JointInfo) -> &'g str,
    ) -> Result<(VertexId, &'g str), Error> {
        let id = self.require(joint, code)?;
        let info = self
            .arena
            .joint(id)
            .ok_or_else(|| Error::new(code, format!("frame [{}] is not a joint", joint)))?;
        Ok((id, end(info)))
    }

    fn resolve_joint_end(&self, joint: VertexId, name: &str, code: ErrorCode) -> Result<String, Error> {
        let scope = self.arena.vertex(joint).scope;
        let vertex = self.arena.lookup(scope, name).ok_or_else(|| {
            Error::new(
                code,
                format!(
                    "frame [{}] named by joint [{}] does not exist",
                    name,
                    self.arena.vertex(joint).scoped_name
                ),
            )
        })?;
        let body = self.attachment.resolve(&self.arena, vertex)?;
        Ok(self.scoped_name(body))
    }

    /// Frames crossed between `source` and `target`
    pub fn frame_chain(&self, source: &str, target: &str) -> Result<Vec<String>, Error> {
        let source = self.require(source, ErrorCode::PoseRelativeToInvalid)?;
        let target = self.require(target, ErrorCode::PoseRelativeToInvalid)?;
        Ok(self
            .pose
            .frame_chain(&self.arena, source, target)?
            .into_iter()
            .map(|id| self.scoped_name(id))
            .collect())
    }

    /// Rerun the structural checks
    pub fn validate(&self) -> Errors {
        Validator::new(self).validate()
    }
}

/// Builds graphs into a registry and answers queries by handle
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<GraphRegistry>,
    config: ParserConfig,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl Resolver {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_registry(Arc::new(GraphRegistry::new()), config)
    }

    /// Share an existing registry, e.g. one per loaded document set
    pub fn with_registry(registry: Arc<GraphRegistry>, config: ParserConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<GraphRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Build and register the graphs of a world or model
    ///
    /// The graphs are registered even when errors were found, so the
    /// well-formed part stays queryable.
    pub fn build_graphs<E: ElementView>(&self, scope: &E) -> (GraphOwner, Errors) {
        let (graphs, errors) = GraphBuilder::new(&self.config).build(scope);
        let handle = self.registry.insert(graphs);
        (GraphOwner::new(self.registry.clone(), handle), errors)
    }

    /// Rebuild after a structural edit; readers switch to the new graphs
    /// atomically and existing handles stay valid
    pub fn rebuild<E: ElementView>(&self, handle: GraphHandle, scope: &E) -> Errors {
        let (graphs, mut errors) = GraphBuilder::new(&self.config).build(scope);
        if let Err(e) = self.registry.replace(handle, graphs) {
            errors.push(e);
        }
        errors
    }

    fn query<T>(
        &self,
        handle: GraphHandle,
        fallback: T,
        run: impl FnOnce(&FrameGraphs) -> Result<T, Error>,
    ) -> (T, Errors) {
        match self.registry.get(handle).and_then(|graphs| run(&graphs)) {
            Ok(value) => (value, Errors::new()),
            Err(e) => (fallback, vec![e]),
        }
    }

    /// Link `name` is attached to; empty on error
    pub fn resolve_attached_to(&self, handle: GraphHandle, name: &str) -> (String, Errors) {
        self.query(handle, String::new(), |g| g.resolve_attached_to(name))
    }

    /// Pose of `source` in `target`; identity on error
    pub fn resolve_pose(&self, handle: GraphHandle, source: &str, target: &str) -> (Pose, Errors) {
        self.query(handle, Pose::identity(), |g| g.resolve_pose(source, target))
    }

    /// Pose of a visual or collision of `link` in `target`; identity on error
    pub fn resolve_child_pose(
        &self,
        handle: GraphHandle,
        link: &str,
        child: &str,
        target: &str,
    ) -> (Pose, Errors) {
        self.query(handle, Pose::identity(), |g| {
            g.resolve_child_pose(link, child, target)
        })
    }

    pub fn resolve_parent_link(&self, handle: GraphHandle, joint: &str) -> (String, Errors) {
        self.query(handle, String::new(), |g| g.resolve_parent_link(joint))
    }

    pub fn resolve_child_link(&self, handle: GraphHandle, joint: &str) -> (String, Errors) {
        self.query(handle, String::new(), |g| g.resolve_child_link(joint))
    }

    pub fn frame_chain(
        &self,
        handle: GraphHandle,
        source: &str,
        target: &str,
    ) -> (Vec<String>, Errors) {
        self.query(handle, Vec::new(), |g| g.frame_chain(source, target))
    }

    /// Structural checks on the current graphs behind `handle`
    pub fn validate(&self, handle: GraphHandle) -> Errors {
        match self.registry.get(handle) {
            Ok(graphs) => graphs.validate(),
            Err(e) => vec![e],
        }
    }
}
