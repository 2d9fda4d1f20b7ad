//! Graph construction from a world or model element
//!
//! The builder makes one pass over each scope. It first registers every
//! named entity (links with their visuals and collisions, frames, joints,
//! nested models) so that references can point forwards, then adds the
//! attachment and pose edges. Defects are collected rather than returned
//! early: a bad reference leaves its edge out and the validator reports it.

use crate::attachment::AttachmentGraph;
use crate::config::{FramePoseDefault, JointPoseDefault, ParserConfig};
use crate::element::ElementView;
use crate::error::{Error, ErrorCode, Errors};
use crate::graph::{
    is_reserved_name, Declared, FrameArena, JointInfo, RejectReason, Rejected, ScopeId, ScopeKind,
    VertexId, VertexKind, WORLD_FRAME,
};
use crate::linker::ScopeLinker;
use crate::pose_graph::PoseGraph;
use crate::resolver::FrameGraphs;
use crate::transform::Pose;
use crate::validator::Validator;
use tracing::{debug, warn};

/// Entity registered during the first phase, waiting for its edges
struct Pending {
    vertex: VertexId,
    pose: Pose,
    role: Role,
}

enum Role {
    Link,
    LinkChild { link: VertexId },
    Joint,
    Frame,
    Model { scope: ScopeId },
}

/// Graphs under construction
struct BuildState {
    arena: FrameArena,
    attachment: AttachmentGraph,
    poses: PoseGraph,
    errors: Errors,
    /// Nested models missing an attachment or placement edge
    unlinked: usize,
}

/// Builds the attachment and pose graphs of a world or model
pub struct GraphBuilder<'a> {
    config: &'a ParserConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a ParserConfig) -> Self {
        Self { config }
    }

    /// Build both graphs for `element` and validate them
    ///
    /// `element` is a `<world>` or `<model>`, or an `<sdf>` root holding one.
    /// Anything else yields empty graphs and `ELEMENT_INCORRECT_TYPE`.
    pub fn build<E: ElementView>(&self, element: &E) -> (FrameGraphs, Errors) {
        let mut errors = Errors::new();

        let Some(scope_element) = Self::scope_element(element) else {
            errors.push(Error::new(
                ErrorCode::ElementIncorrectType,
                format!(
                    "Graphs can only be built from a <world> or <model>, got <{}>",
                    element.kind()
                ),
            ));
            self.log_defects(&errors);
            return (FrameGraphs::empty(), errors);
        };

        let kind = if scope_element.kind() == "world" {
            ScopeKind::World
        } else {
            ScopeKind::Model
        };
        let name = match scope_element.name() {
            Some(name) => name,
            None => {
                errors.push(Error::new(
                    ErrorCode::AttributeMissing,
                    format!("<{}> is missing its name", scope_element.kind()),
                ));
                ""
            }
        };

        let mut state = BuildState {
            arena: FrameArena::new(self.config.allow_scoped_references),
            attachment: AttachmentGraph::new(),
            poses: PoseGraph::new(),
            errors,
            unlinked: 0,
        };
        let root = state.arena.add_root_scope(kind, name);
        self.populate(&mut state, root, scope_element);

        let BuildState {
            arena,
            attachment,
            poses,
            mut errors,
            unlinked,
        } = state;
        let graphs = FrameGraphs::new(arena, attachment, poses);
        errors.extend(Validator::new(&graphs).validate());

        debug!(
            scope = name,
            vertices = graphs.arena().len(),
            scopes = graphs.arena().scopes().len(),
            attachment_edges = graphs.attachment().edge_count(),
            pose_edges = graphs.pose().edge_count(),
            unlinked_models = unlinked,
            errors = errors.len(),
            "built frame graphs"
        );
        self.log_defects(&errors);

        (graphs, errors)
    }

    fn scope_element<E: ElementView>(element: &E) -> Option<&E> {
        match element.kind() {
            "world" | "model" => Some(element),
            "sdf" => element
                .children_of_kind("world")
                .next()
                .or_else(|| element.children_of_kind("model").next()),
            _ => None,
        }
    }

    fn log_defects(&self, errors: &Errors) {
        if self.config.log_defects {
            for error in errors {
                warn!(code = %error.code, "{}", error.message);
            }
        }
    }

    /// Register the members of one scope, recurse into nested models, then
    /// add the edges of this scope
    fn populate<E: ElementView>(&self, state: &mut BuildState, scope: ScopeId, element: &E) {
        let mut pending = Vec::new();

        for link in element.children_of_kind("link") {
            let Some(vertex) = self.insert(state, scope, link, VertexKind::Link) else {
                continue;
            };
            pending.push(Pending {
                vertex,
                pose: Self::read_pose(state, link),
                role: Role::Link,
            });

            for (tag, kind) in [("visual", VertexKind::Visual), ("collision", VertexKind::Collision)] {
                for child in link.children_of_kind(tag) {
                    if let Some(id) = self.insert_link_child(state, vertex, child, kind) {
                        pending.push(Pending {
                            vertex: id,
                            pose: Self::read_pose(state, child),
                            role: Role::LinkChild { link: vertex },
                        });
                    }
                }
            }
        }

        for frame in element.children_of_kind("frame") {
            if let Some(vertex) = self.insert(state, scope, frame, VertexKind::ExplicitFrame) {
                pending.push(Pending {
                    vertex,
                    pose: Self::read_pose(state, frame),
                    role: Role::Frame,
                });
            }
        }

        for joint in element.children_of_kind("joint") {
            if let Some(vertex) = self.insert(state, scope, joint, VertexKind::Joint) {
                let info = JointInfo {
                    parent: joint.get("parent", String::new()).0,
                    child: joint.get("child", String::new()).0,
                };
                state.arena.set_joint(vertex, info);
                pending.push(Pending {
                    vertex,
                    pose: Self::read_pose(state, joint),
                    role: Role::Joint,
                });
            }
        }

        for model in element.children_of_kind("model") {
            let Some(name) = self.admit(state, scope, model, VertexKind::ModelPlaceholder) else {
                continue;
            };
            let nested = ScopeLinker::nest(&mut state.arena, scope, &name, Self::declared(model));
            self.populate(state, nested, model);
            pending.push(Pending {
                vertex: state.arena.scope(nested).root,
                pose: Self::read_pose(state, model),
                role: Role::Model { scope: nested },
            });
        }

        if state.arena.scope(scope).kind == ScopeKind::Model {
            self.choose_canonical_link(state, scope, element);
        }

        for entry in pending {
            self.connect(state, scope, entry);
        }
    }

    /// Check the name of an entity about to enter `scope`
    fn admit<E: ElementView>(
        &self,
        state: &mut BuildState,
        scope: ScopeId,
        element: &E,
        kind: VertexKind,
    ) -> Option<String> {
        let Some(name) = element.name() else {
            state.errors.push(Error::new(
                ErrorCode::AttributeMissing,
                format!("<{}> is missing its name", element.kind()),
            ));
            return None;
        };

        let reason = if is_reserved_name(name) {
            Some(RejectReason::Reserved)
        } else if state.arena.contains_name(scope, name) {
            Some(RejectReason::Duplicate)
        } else {
            None
        };
        match reason {
            Some(reason) => {
                state.arena.reject(Rejected {
                    kind,
                    name: name.to_string(),
                    scope,
                    owner: None,
                    reason,
                });
                None
            }
            None => Some(name.to_string()),
        }
    }

    fn insert<E: ElementView>(
        &self,
        state: &mut BuildState,
        scope: ScopeId,
        element: &E,
        kind: VertexKind,
    ) -> Option<VertexId> {
        let name = self.admit(state, scope, element, kind)?;
        Some(
            state
                .arena
                .add_vertex(scope, &name, kind, Self::declared(element)),
        )
    }

    /// Visuals and collisions are named per link and per kind
    fn insert_link_child<E: ElementView>(
        &self,
        state: &mut BuildState,
        link: VertexId,
        element: &E,
        kind: VertexKind,
    ) -> Option<VertexId> {
        let Some(name) = element.name() else {
            state.errors.push(Error::new(
                ErrorCode::AttributeMissing,
                format!(
                    "<{}> of link [{}] is missing its name",
                    element.kind(),
                    state.arena.vertex(link).scoped_name
                ),
            ));
            return None;
        };

        let reason = if is_reserved_name(name) {
            Some(RejectReason::Reserved)
        } else if state.arena.link_child(link, kind, name).is_some() {
            Some(RejectReason::Duplicate)
        } else {
            None
        };
        if let Some(reason) = reason {
            let scope = state.arena.vertex(link).scope;
            state.arena.reject(Rejected {
                kind,
                name: name.to_string(),
                scope,
                owner: Some(link),
                reason,
            });
            return None;
        }

        Some(
            state
                .arena
                .add_link_child(link, name, kind, Self::declared(element)),
        )
    }

    fn declared<E: ElementView>(element: &E) -> Declared {
        Declared {
            relative_to: element.relative_to_attribute().map(str::to_string),
            attached_to: element.attached_to_attribute().map(str::to_string),
        }
    }

    fn read_pose<E: ElementView>(state: &mut BuildState, element: &E) -> Pose {
        match element.raw_pose() {
            Ok(pose) => pose,
            Err(e) => {
                state.errors.push(e);
                Pose::identity()
            }
        }
    }

    /// Record the declared canonical link, or pick the first link (then the
    /// first nested model) when implicit canonical links are enabled
    fn choose_canonical_link<E: ElementView>(
        &self,
        state: &mut BuildState,
        scope: ScopeId,
        element: &E,
    ) {
        let declared = match element.try_get::<String>("canonical_link") {
            Ok(value) => value.filter(|s| !s.is_empty()),
            Err(e) => {
                state.errors.push(e);
                None
            }
        };

        let arena = &state.arena;
        let resolved = match &declared {
            Some(name) => arena.lookup(scope, name).filter(|id| {
                matches!(
                    arena.vertex(*id).kind,
                    VertexKind::Link | VertexKind::ModelPlaceholder
                ) && *id != arena.scope(scope).root
            }),
            None if self.config.implicit_canonical_link => {
                let s = arena.scope(scope);
                s.links()
                    .first()
                    .copied()
                    .or_else(|| s.nested_models().first().map(|m| arena.scope(*m).root))
            }
            None => None,
        };

        state.arena.set_canonical(scope, declared, resolved);
    }

    /// Add the attachment and pose edges of one registered entity
    fn connect(&self, state: &mut BuildState, scope: ScopeId, entry: Pending) {
        let arena = &state.arena;
        let root = arena.scope(scope).root;
        let vertex = arena.vertex(entry.vertex);
        let lookup = |name: &Option<String>, default: Option<VertexId>| match name {
            Some(name) => arena.lookup(scope, name),
            None => default,
        };

        let (attached, relative) = match entry.role {
            Role::Link => (Some(root), lookup(&vertex.declared.relative_to, Some(root))),
            Role::LinkChild { link } => (
                Some(link),
                lookup(&vertex.declared.relative_to, Some(link)),
            ),
            Role::Joint => {
                let child = arena
                    .joint(entry.vertex)
                    .filter(|info| info.child != WORLD_FRAME)
                    .and_then(|info| arena.lookup(scope, &info.child))
                    .filter(|id| *id != root);
                let default = match self.config.joint_pose_default {
                    JointPoseDefault::ScopeRoot => Some(root),
                    JointPoseDefault::ChildFrame => child,
                };
                (child, lookup(&vertex.declared.relative_to, default))
            }
            Role::Frame => {
                let attached = lookup(&vertex.declared.attached_to, Some(root));
                let default = match self.config.frame_pose_default {
                    FramePoseDefault::AttachedTo => attached,
                    FramePoseDefault::ScopeRoot => Some(root),
                };
                (attached, lookup(&vertex.declared.relative_to, default))
            }
            Role::Model { scope: nested } => {
                let linked = ScopeLinker::link(
                    &state.arena,
                    &mut state.attachment,
                    &mut state.poses,
                    nested,
                    entry.pose,
                );
                if !linked.is_some_and(|l| l.is_complete()) {
                    state.unlinked += 1;
                }
                return;
            }
        };

        if let Some(target) = attached {
            state.attachment.connect(entry.vertex, target);
        }
        if let Some(target) = relative {
            state.poses.connect(entry.vertex, target, entry.pose);
        }
    }
}
