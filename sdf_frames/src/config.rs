//! Configuration for graph building
//!
//! Chooses between the defaults the format has used over time for implicit
//! frames, and toggles a few permissive behaviours.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Where a joint's pose is expressed when it declares no `relative_to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointPoseDefault {
    /// Relative to the enclosing model or world frame
    #[default]
    ScopeRoot,
    /// Relative to the joint's child frame
    ChildFrame,
}

/// Where an explicit frame's pose is expressed when it declares no `relative_to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePoseDefault {
    /// Always relative to the scope root
    #[default]
    ScopeRoot,
    /// Relative to the frame's `attached_to` target, or the scope root if none
    AttachedTo,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parser configuration for graph building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Implicit `relative_to` of joints
    ///
    /// Default: `ScopeRoot`
    pub joint_pose_default: JointPoseDefault,

    /// Implicit `relative_to` of explicit frames
    ///
    /// Default: `ScopeRoot`
    pub frame_pose_default: FramePoseDefault,

    /// Use the first link as canonical when a model declares no `canonical_link`
    ///
    /// Default: true
    pub implicit_canonical_link: bool,

    /// Accept `M::L` style names in `relative_to`/`attached_to` values
    ///
    /// Only descendant scopes are searched, never ancestors.
    ///
    /// Default: true
    pub allow_scoped_references: bool,

    /// Emit a `tracing` warning for every defect collected during a build
    ///
    /// Default: false
    pub log_defects: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            joint_pose_default: JointPoseDefault::ScopeRoot,
            frame_pose_default: FramePoseDefault::ScopeRoot,
            implicit_canonical_link: true,
            allow_scoped_references: true,
            log_defects: false,
        }
    }
}

impl ParserConfig {
    /// Implicit poses follow the child frame (joints) or the `attached_to`
    /// target (frames), as in current SDF revisions
    pub fn strict() -> Self {
        Self {
            joint_pose_default: JointPoseDefault::ChildFrame,
            frame_pose_default: FramePoseDefault::AttachedTo,
            ..Self::default()
        }
    }

    /// Same as default, but every defect is also logged
    pub fn verbose() -> Self {
        Self {
            log_defects: true,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }
}
