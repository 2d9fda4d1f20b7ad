//! Vertex arena and single-out-edge graphs
//!
//! Every frame-bearing entity of a document becomes one [`Vertex`] in a
//! [`FrameArena`], addressed by a [`VertexId`]. The attachment graph and the
//! pose graph each store at most one outgoing edge per vertex in an
//! [`EdgeTable`], so walking a graph is an index walk bounded by the vertex
//! count and there are no pointer cycles to manage.
//!
//! Each world or model is a [`Scope`]: a namespace of names plus a root
//! vertex. A nested model's root is its placeholder vertex, which is also
//! registered by name in the parent scope.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Scope separator in frame references such as `arm::gripper`
pub const SCOPE_SEPARATOR: &str = "::";

/// Name of the implicit frame of the enclosing model
pub const MODEL_FRAME: &str = "__model__";

/// Name of the world root frame
pub const WORLD_FRAME: &str = "world";

/// Index of a vertex in its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(u32);

impl VertexId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Index of a scope in its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// What a vertex stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Link,
    Joint,
    Visual,
    Collision,
    ExplicitFrame,
    ModelPlaceholder,
    WorldRoot,
}

impl VertexKind {
    /// Link, world root and model placeholders end attachment resolution
    pub fn is_canonical_terminal(&self) -> bool {
        matches!(
            self,
            VertexKind::Link | VertexKind::WorldRoot | VertexKind::ModelPlaceholder
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VertexKind::Link => "link",
            VertexKind::Joint => "joint",
            VertexKind::Visual => "visual",
            VertexKind::Collision => "collision",
            VertexKind::ExplicitFrame => "frame",
            VertexKind::ModelPlaceholder => "model",
            VertexKind::WorldRoot => "world",
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame references exactly as the document declared them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declared {
    pub relative_to: Option<String>,
    pub attached_to: Option<String>,
}

/// A named frame-bearing entity
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Name inside its namespace
    pub name: String,
    /// Name qualified from the outermost scope, e.g. `arm::gripper`
    pub scoped_name: String,
    pub kind: VertexKind,
    /// Scope whose namespace holds this vertex and resolves its references
    pub scope: ScopeId,
    /// Owning link of a visual or collision
    pub owner: Option<VertexId>,
    /// Scope this vertex is the root of (model placeholders and world root)
    pub model: Option<ScopeId>,
    pub declared: Declared,
}

/// World or model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    World,
    Model,
}

/// One namespace with its root vertex
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    pub kind: ScopeKind,
    /// Prefix prepended to member names to form scoped names
    pub prefix: String,
    pub root: VertexId,
    pub parent: Option<ScopeId>,
    /// Declared `canonical_link`
    pub canonical: Option<String>,
    /// Link the model frame is attached to, once resolved
    pub canonical_link: Option<VertexId>,
    names: HashMap<String, VertexId>,
    nested: HashMap<String, ScopeId>,
    links: Vec<VertexId>,
    models: Vec<ScopeId>,
}

impl Scope {
    /// Links declared directly in this scope, in document order
    pub fn links(&self) -> &[VertexId] {
        &self.links
    }

    /// Models nested directly in this scope, in document order
    pub fn nested_models(&self) -> &[ScopeId] {
        &self.models
    }
}

/// Parent and child names declared by a joint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JointInfo {
    pub parent: String,
    pub child: String,
}

/// Why an entity was left out of the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Duplicate,
    Reserved,
}

/// An entity the builder refused to insert
#[derive(Debug, Clone)]
pub struct Rejected {
    pub kind: VertexKind,
    pub name: String,
    pub scope: ScopeId,
    /// Owning link, for visuals and collisions
    pub owner: Option<VertexId>,
    pub reason: RejectReason,
}

/// True for `world`, names wrapped in double underscores, and names that
/// contain the scope separator
pub fn is_reserved_name(name: &str) -> bool {
    name == WORLD_FRAME
        || (name.len() >= 4 && name.starts_with("__") && name.ends_with("__"))
        || name.contains(SCOPE_SEPARATOR)
}

/// Vertices, scopes and the name tables that map onto them
#[derive(Debug, Clone)]
pub struct FrameArena {
    vertices: Vec<Vertex>,
    scopes: Vec<Scope>,
    joints: HashMap<VertexId, JointInfo>,
    link_children: HashMap<VertexId, Vec<VertexId>>,
    rejected: Vec<Rejected>,
    allow_scoped: bool,
}

impl FrameArena {
    pub(crate) fn new(allow_scoped: bool) -> Self {
        Self {
            vertices: Vec::new(),
            scopes: Vec::new(),
            joints: HashMap::new(),
            link_children: HashMap::new(),
            rejected: Vec::new(),
            allow_scoped,
        }
    }

    /// Create the outermost scope and its root vertex
    pub(crate) fn add_root_scope(&mut self, kind: ScopeKind, name: &str) -> ScopeId {
        let scope = ScopeId(self.scopes.len() as u32);
        let (vertex_name, vertex_kind) = match kind {
            ScopeKind::World => (WORLD_FRAME, VertexKind::WorldRoot),
            ScopeKind::Model => (MODEL_FRAME, VertexKind::ModelPlaceholder),
        };
        let root = self.push_vertex(Vertex {
            name: vertex_name.to_string(),
            scoped_name: vertex_name.to_string(),
            kind: vertex_kind,
            scope,
            owner: None,
            model: Some(scope),
            declared: Declared::default(),
        });
        self.scopes.push(Scope::new(scope, name, kind, String::new(), root, None));
        scope
    }

    /// Create a model scope nested in `parent`; its placeholder vertex is
    /// registered under `name` in the parent namespace
    pub(crate) fn add_nested_scope(
        &mut self,
        parent: ScopeId,
        name: &str,
        declared: Declared,
    ) -> ScopeId {
        let scope = ScopeId(self.scopes.len() as u32);
        let parent_prefix = self.scopes[parent.index()].prefix.clone();
        let root = self.push_vertex(Vertex {
            name: name.to_string(),
            scoped_name: format!("{}{}", parent_prefix, name),
            kind: VertexKind::ModelPlaceholder,
            scope: parent,
            owner: None,
            model: Some(scope),
            declared,
        });
        let prefix = format!("{}{}{}", parent_prefix, name, SCOPE_SEPARATOR);
        self.scopes
            .push(Scope::new(scope, name, ScopeKind::Model, prefix, root, Some(parent)));

        let parent_scope = &mut self.scopes[parent.index()];
        parent_scope.names.insert(name.to_string(), root);
        parent_scope.nested.insert(name.to_string(), scope);
        parent_scope.models.push(scope);
        scope
    }

    /// Add a link, joint or explicit frame to a scope namespace
    pub(crate) fn add_vertex(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: VertexKind,
        declared: Declared,
    ) -> VertexId {
        let scoped_name = format!("{}{}", self.scopes[scope.index()].prefix, name);
        let id = self.push_vertex(Vertex {
            name: name.to_string(),
            scoped_name,
            kind,
            scope,
            owner: None,
            model: None,
            declared,
        });
        let s = &mut self.scopes[scope.index()];
        s.names.insert(name.to_string(), id);
        if kind == VertexKind::Link {
            s.links.push(id);
        }
        id
    }

    /// Add a visual or collision in its link's namespace
    pub(crate) fn add_link_child(
        &mut self,
        link: VertexId,
        name: &str,
        kind: VertexKind,
        declared: Declared,
    ) -> VertexId {
        let owner = &self.vertices[link.index()];
        let scope = owner.scope;
        let scoped_name = format!("{}/{}", owner.scoped_name, name);
        let id = self.push_vertex(Vertex {
            name: name.to_string(),
            scoped_name,
            kind,
            scope,
            owner: Some(link),
            model: None,
            declared,
        });
        self.link_children.entry(link).or_default().push(id);
        id
    }

    pub(crate) fn set_joint(&mut self, joint: VertexId, info: JointInfo) {
        self.joints.insert(joint, info);
    }

    pub(crate) fn set_canonical(
        &mut self,
        scope: ScopeId,
        declared: Option<String>,
        resolved: Option<VertexId>,
    ) {
        let s = &mut self.scopes[scope.index()];
        s.canonical = declared;
        s.canonical_link = resolved;
    }

    pub(crate) fn reject(&mut self, rejected: Rejected) {
        self.rejected.push(rejected);
    }

    fn push_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(vertex);
        id
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// All vertex ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len() as u32).map(VertexId)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// The outermost scope; `None` only for an empty arena
    pub fn root_scope(&self) -> Option<ScopeId> {
        self.scopes.first().map(|s| s.id)
    }

    /// Root vertex of the outermost scope
    pub fn root(&self) -> Option<VertexId> {
        self.scopes.first().map(|s| s.root)
    }

    /// Scope a placeholder or world root vertex is the root of
    pub fn model_scope(&self, vertex: VertexId) -> Option<&Scope> {
        self.vertex(vertex).model.map(|s| self.scope(s))
    }

    pub fn joint(&self, vertex: VertexId) -> Option<&JointInfo> {
        self.joints.get(&vertex)
    }

    /// Visuals and collisions of a link
    pub fn link_children(&self, link: VertexId) -> &[VertexId] {
        self.link_children
            .get(&link)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Visual or collision of `link` with the given kind and name
    pub fn link_child(&self, link: VertexId, kind: VertexKind, name: &str) -> Option<VertexId> {
        self.link_children(link)
            .iter()
            .copied()
            .find(|c| self.vertex(*c).kind == kind && self.vertex(*c).name == name)
    }

    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    /// True if `name` is already taken in the scope namespace
    pub fn contains_name(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.index()].names.contains_key(name)
    }

    /// Resolve a frame reference inside `scope`
    ///
    /// `__model__` names a model scope's own frame and `world` the world
    /// root. Names with `::` descend into nested models; ancestor scopes are
    /// never searched.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<VertexId> {
        let s = &self.scopes[scope.index()];
        match (name, s.kind) {
            (MODEL_FRAME, ScopeKind::Model) | (WORLD_FRAME, ScopeKind::World) => {
                return Some(s.root)
            }
            _ => {}
        }
        if let Some(id) = s.names.get(name) {
            return Some(*id);
        }
        if !self.allow_scoped {
            return None;
        }
        let (head, rest) = name.split_once(SCOPE_SEPARATOR)?;
        let nested = s.nested.get(head)?;
        self.lookup(*nested, rest)
    }
}

impl Scope {
    fn new(
        id: ScopeId,
        name: &str,
        kind: ScopeKind,
        prefix: String,
        root: VertexId,
        parent: Option<ScopeId>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            prefix,
            root,
            parent,
            canonical: None,
            canonical_link: None,
            names: HashMap::new(),
            nested: HashMap::new(),
            links: Vec::new(),
            models: Vec::new(),
        }
    }
}

/// Outgoing edge of a vertex
#[derive(Debug, Clone)]
pub struct Edge<E> {
    pub to: VertexId,
    pub data: E,
}

/// How a walk stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// The last vertex satisfied the terminal predicate
    Terminal,
    /// The last vertex has no outgoing edge
    Open,
    /// The walk came back to the given vertex
    Cycle(VertexId),
}

/// Vertices visited by a walk, starting vertex first
#[derive(Debug, Clone)]
pub struct Walk {
    pub path: Vec<VertexId>,
    pub end: WalkEnd,
}

impl Walk {
    pub fn last(&self) -> VertexId {
        // path always holds the starting vertex
        self.path[self.path.len() - 1]
    }
}

/// At most one outgoing edge per vertex
#[derive(Debug, Clone)]
pub struct EdgeTable<E> {
    edges: Vec<Option<Edge<E>>>,
}

impl<E> Default for EdgeTable<E> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<E> EdgeTable<E> {
    /// Set the outgoing edge of `from`, replacing any previous one
    pub fn connect(&mut self, from: VertexId, to: VertexId, data: E) {
        let index = from.index();
        if self.edges.len() <= index {
            self.edges.resize_with(index + 1, || None);
        }
        self.edges[index] = Some(Edge { to, data });
    }

    pub fn edge(&self, from: VertexId) -> Option<&Edge<E>> {
        self.edges.get(from.index()).and_then(|e| e.as_ref())
    }

    pub fn target(&self, from: VertexId) -> Option<VertexId> {
        self.edge(from).map(|e| e.to)
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Follow outgoing edges from `start` until `is_terminal` holds, a vertex
    /// without an edge is reached, or a vertex repeats. `limit` caps the hop
    /// count; exceeding it is reported as a cycle.
    pub fn walk(
        &self,
        start: VertexId,
        limit: usize,
        mut is_terminal: impl FnMut(VertexId) -> bool,
    ) -> Walk {
        let mut path = vec![start];
        let mut visited = HashSet::from([start]);
        let mut current = start;

        loop {
            if is_terminal(current) {
                return Walk {
                    path,
                    end: WalkEnd::Terminal,
                };
            }
            let Some(next) = self.target(current) else {
                return Walk {
                    path,
                    end: WalkEnd::Open,
                };
            };
            if !visited.insert(next) || path.len() > limit {
                return Walk {
                    path,
                    end: WalkEnd::Cycle(next),
                };
            }
            path.push(next);
            current = next;
        }
    }

    /// Vertices on the cycle that `start` belongs to or leads into
    pub fn cycle_from(&self, start: VertexId, limit: usize) -> Vec<VertexId> {
        let walk = self.walk(start, limit, |_| false);
        match walk.end {
            WalkEnd::Cycle(repeated) => {
                let from = walk.path.iter().position(|v| *v == repeated).unwrap_or(0);
                walk.path[from..].to_vec()
            }
            _ => Vec::new(),
        }
    }
}
