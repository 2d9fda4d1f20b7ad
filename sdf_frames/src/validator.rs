//! Structural checks over built graphs
//!
//! Runs after every build and on demand. All findings are accumulated; a
//! defect in one entity never hides the defects of another, and well-formed
//! siblings of a bad entity produce no errors of their own.

use crate::error::{Error, ErrorCode, Errors};
use crate::graph::{EdgeTable, FrameArena, RejectReason, ScopeKind, VertexId, WORLD_FRAME};
use crate::resolver::FrameGraphs;
use std::collections::HashSet;

pub struct Validator<'a> {
    graphs: &'a FrameGraphs,
}

impl<'a> Validator<'a> {
    pub fn new(graphs: &'a FrameGraphs) -> Self {
        Self { graphs }
    }

    /// Run every check and return the combined defect list
    pub fn validate(&self) -> Errors {
        let mut errors = Errors::new();
        self.check_names(&mut errors);
        self.check_references(&mut errors);
        self.check_joints(&mut errors);
        self.check_canonical_links(&mut errors);
        self.check_cycles(
            self.graphs.attachment().edges(),
            ErrorCode::FrameAttachedToCycle,
            "attached_to",
            &mut errors,
        );
        self.check_cycles(
            self.graphs.pose().edges(),
            ErrorCode::PoseRelativeToCycle,
            "relative_to",
            &mut errors,
        );
        errors
    }

    fn arena(&self) -> &FrameArena {
        self.graphs.arena()
    }

    fn check_names(&self, errors: &mut Errors) {
        let arena = self.arena();
        for rejected in arena.rejected() {
            let place = match rejected.owner {
                Some(link) => format!("link [{}]", arena.vertex(link).scoped_name),
                None => {
                    let scope = arena.scope(rejected.scope);
                    let kind = match scope.kind {
                        ScopeKind::World => "world",
                        ScopeKind::Model => "model",
                    };
                    format!("{} [{}]", kind, scope.name)
                }
            };
            let error = match rejected.reason {
                RejectReason::Duplicate => Error::new(
                    ErrorCode::DuplicateName,
                    format!(
                        "{} name [{}] is not unique in {}",
                        rejected.kind, rejected.name, place
                    ),
                ),
                RejectReason::Reserved => Error::new(
                    ErrorCode::ReservedName,
                    format!(
                        "{} name [{}] in {} is reserved",
                        rejected.kind, rejected.name, place
                    ),
                ),
            };
            errors.push(error);
        }
    }

    /// Every declared `relative_to` and `attached_to` must name a vertex
    ///
    /// Inside a nested model an unresolved `attached_to` is also a pose
    /// defect: the name may only exist in an ancestor scope, and ancestors
    /// are never searched.
    fn check_references(&self, errors: &mut Errors) {
        let arena = self.arena();
        for id in arena.ids() {
            let vertex = arena.vertex(id);
            // a nested model's placement is read in the parent namespace,
            // which is the scope its placeholder is registered in
            let lookup_scope = vertex.scope;
            let nested = arena.scope(lookup_scope).parent.is_some();

            let mut pose_reported = false;
            if let Some(name) = &vertex.declared.relative_to {
                if arena.lookup(lookup_scope, name).is_none() {
                    errors.push(Error::new(
                        ErrorCode::PoseRelativeToInvalid,
                        format!(
                            "relative_to name [{}] specified by {} [{}] does not match a frame in its scope",
                            name, vertex.kind, vertex.scoped_name
                        ),
                    ));
                    pose_reported = true;
                }
            }
            if let Some(name) = &vertex.declared.attached_to {
                if arena.lookup(lookup_scope, name).is_none() {
                    errors.push(Error::new(
                        ErrorCode::FrameAttachedToInvalid,
                        format!(
                            "attached_to name [{}] specified by {} [{}] does not match a frame in its scope",
                            name, vertex.kind, vertex.scoped_name
                        ),
                    ));
                    if nested && !pose_reported {
                        errors.push(Error::new(
                            ErrorCode::PoseRelativeToInvalid,
                            format!(
                                "attached_to name [{}] specified by {} [{}] does not resolve from nested scope [{}]",
                                name,
                                vertex.kind,
                                vertex.scoped_name,
                                arena.vertex(arena.scope(lookup_scope).root).scoped_name
                            ),
                        ));
                    }
                }
            }
        }
    }

    fn check_joints(&self, errors: &mut Errors) {
        let arena = self.arena();
        for id in arena.ids() {
            let Some(info) = arena.joint(id) else {
                continue;
            };
            let joint = arena.vertex(id);
            let root = arena.scope(joint.scope).root;

            let child = if info.child.is_empty() {
                errors.push(Error::new(
                    ErrorCode::JointChildLinkInvalid,
                    format!("joint [{}] has no child", joint.scoped_name),
                ));
                None
            } else if info.child == WORLD_FRAME {
                errors.push(Error::new(
                    ErrorCode::JointChildLinkInvalid,
                    format!("child of joint [{}] cannot be world", joint.scoped_name),
                ));
                None
            } else {
                match arena.lookup(joint.scope, &info.child).filter(|c| *c != root) {
                    Some(child) => Some(child),
                    None => {
                        errors.push(Error::new(
                            ErrorCode::JointChildLinkInvalid,
                            format!(
                                "child frame [{}] of joint [{}] not found",
                                info.child, joint.scoped_name
                            ),
                        ));
                        None
                    }
                }
            };

            let parent = if info.parent.is_empty() {
                errors.push(Error::new(
                    ErrorCode::JointParentLinkInvalid,
                    format!("joint [{}] has no parent", joint.scoped_name),
                ));
                None
            } else if info.parent == WORLD_FRAME {
                None
            } else {
                match arena.lookup(joint.scope, &info.parent) {
                    Some(parent) => Some(parent),
                    None => {
                        errors.push(Error::new(
                            ErrorCode::JointParentLinkInvalid,
                            format!(
                                "parent frame [{}] of joint [{}] not found",
                                info.parent, joint.scoped_name
                            ),
                        ));
                        None
                    }
                }
            };

            if let (Some(parent), Some(child)) = (parent, child) {
                let attachment = self.graphs.attachment();
                // cycles are reported separately
                if let (Ok(p), Ok(c)) = (
                    attachment.resolve(arena, parent),
                    attachment.resolve(arena, child),
                ) {
                    if p == c {
                        errors.push(Error::new(
                            ErrorCode::JointParentSameAsChild,
                            format!(
                                "parent [{}] and child [{}] of joint [{}] resolve to the same link [{}]",
                                info.parent,
                                info.child,
                                joint.scoped_name,
                                arena.vertex(p).scoped_name
                            ),
                        ));
                    }
                }
            }
        }
    }

    fn check_canonical_links(&self, errors: &mut Errors) {
        for scope in self.arena().scopes() {
            if let (Some(declared), None) = (&scope.canonical, scope.canonical_link) {
                errors.push(Error::new(
                    ErrorCode::ModelCanonicalLinkInvalid,
                    format!(
                        "canonical_link [{}] of model [{}] does not match a link",
                        declared, scope.name
                    ),
                ));
            }
        }
    }

    /// Report each cycle once, listing its vertices in edge order
    fn check_cycles<E>(
        &self,
        edges: &EdgeTable<E>,
        code: ErrorCode,
        attribute: &str,
        errors: &mut Errors,
    ) {
        let arena = self.arena();
        let mut reported: HashSet<VertexId> = HashSet::new();

        for id in arena.ids() {
            let cycle = edges.cycle_from(id, arena.len());
            let Some(first) = cycle.iter().min().copied() else {
                continue;
            };
            if !reported.insert(first) {
                continue;
            }

            let mut names: Vec<&str> = cycle
                .iter()
                .map(|v| arena.vertex(*v).scoped_name.as_str())
                .collect();
            names.push(arena.vertex(cycle[0]).scoped_name.as_str());
            errors.push(Error::new(
                code,
                format!("{} cycle detected: {}", attribute, names.join(" -> ")),
            ));
        }
    }
}
