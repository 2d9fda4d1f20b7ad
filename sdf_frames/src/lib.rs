//! # SDF Frames
//!
//! Frame semantics for SDF-style robot and world descriptions.
//!
//! Every link, joint, visual, collision and explicit frame may declare its
//! pose relative to any other named frame in its scope, and be attached to
//! any other frame. Models nest, each opening a new naming scope. This crate
//! turns such a document into two graphs and answers questions about them:
//!
//! - the **attachment graph**: which link is frame X ultimately fixed to?
//! - the **pose graph**: what is the pose of frame X in frame Y?
//!
//! ## Structure
//!
//! ```text
//! sdf_frames/
//! ── element        # ElementView interface + XML-backed Element
//! ── graph          # vertex arena, scopes, single-out-edge tables
//! ── attachment     # attachment graph resolution
//! ── pose_graph     # LCA pose composition
//! ── builder        # one pass per scope, collects every defect
//! ── linker         # nested model stitching
//! ── validator      # names, references, joints, cycles
//! ── registry       # generation-tagged graph handles
//! ── resolver       # name-based queries
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sdf_frames::{Element, Resolver};
//!
//! let world = Element::load_file("tests/test_worlds/nested_models.sdf")?;
//! let resolver = Resolver::default();
//! let (owner, errors) = resolver.build_graphs(&world);
//! for error in &errors {
//!     eprintln!("{}", error);
//! }
//!
//! let (pose, errors) = resolver.resolve_pose(owner.handle(), "M::L", "world");
//! let (link, errors) = resolver.resolve_attached_to(owner.handle(), "M::sensor");
//! ```

pub mod attachment;
pub mod builder;
pub mod config;
pub mod element;
pub mod error;
pub mod graph;
pub mod linker;
pub mod param;
pub mod pose_graph;
pub mod registry;
pub mod resolver;
pub mod semantic_pose;
pub mod transform;
pub mod validator;

pub use attachment::AttachmentGraph;
pub use builder::GraphBuilder;
pub use config::{ConfigError, FramePoseDefault, JointPoseDefault, ParserConfig};
pub use element::{Element, ElementView};
pub use error::{Error, ErrorCode, Errors, ErrorsExt};
pub use graph::{FrameArena, ScopeId, VertexId, VertexKind};
pub use linker::ScopeLinker;
pub use param::{ParamKind, ParamType, ParamValue};
pub use pose_graph::PoseGraph;
pub use registry::{GraphHandle, GraphOwner, GraphRegistry};
pub use resolver::{FrameGraphs, Resolver};
pub use semantic_pose::SemanticPose;
pub use transform::{parse_pose, pose_from_translation, pose_from_xyz_rpy, poses_equal, Pose};
pub use validator::Validator;
