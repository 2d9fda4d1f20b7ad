//! Frame-semantics errors
//!
//! Nothing in this crate aborts on the first defect. Every operation hands
//! back an [`Errors`] list next to its value so a document author sees all
//! problems of one load at once.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Kind of defect found while building or querying frame graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// An `attached_to` chain loops back on itself
    FrameAttachedToCycle,
    /// An `attached_to` name does not match any frame in scope
    FrameAttachedToInvalid,
    /// A `relative_to` chain loops back on itself
    PoseRelativeToCycle,
    /// A `relative_to` name (or a query target) cannot be resolved
    PoseRelativeToInvalid,
    /// Two entities share one name inside a namespace
    DuplicateName,
    /// An entity uses a name reserved by the format
    ReservedName,
    /// A graph handle no longer refers to live graphs
    InvalidGraphReference,
    /// The element handed to the builder is not a `<world>` or `<model>`
    ElementIncorrectType,
    /// A required attribute such as `name` is absent
    AttributeMissing,
    /// A joint child is missing, unknown, or `world`
    JointChildLinkInvalid,
    /// A joint parent is missing or unknown
    JointParentLinkInvalid,
    /// A joint's parent and child resolve to the same body
    JointParentSameAsChild,
    /// A declared `canonical_link` is not a link of the model
    ModelCanonicalLinkInvalid,
    /// Attribute text does not decode as the requested type
    ParamParse,
}

impl ErrorCode {
    /// Stable upper-case name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FrameAttachedToCycle => "FRAME_ATTACHED_TO_CYCLE",
            ErrorCode::FrameAttachedToInvalid => "FRAME_ATTACHED_TO_INVALID",
            ErrorCode::PoseRelativeToCycle => "POSE_RELATIVE_TO_CYCLE",
            ErrorCode::PoseRelativeToInvalid => "POSE_RELATIVE_TO_INVALID",
            ErrorCode::DuplicateName => "DUPLICATE_NAME",
            ErrorCode::ReservedName => "RESERVED_NAME",
            ErrorCode::InvalidGraphReference => "INVALID_GRAPH_REFERENCE",
            ErrorCode::ElementIncorrectType => "ELEMENT_INCORRECT_TYPE",
            ErrorCode::AttributeMissing => "ATTRIBUTE_MISSING",
            ErrorCode::JointChildLinkInvalid => "JOINT_CHILD_LINK_INVALID",
            ErrorCode::JointParentLinkInvalid => "JOINT_PARENT_LINK_INVALID",
            ErrorCode::JointParentSameAsChild => "JOINT_PARENT_SAME_AS_CHILD",
            ErrorCode::ModelCanonicalLinkInvalid => "MODEL_CANONICAL_LINK_INVALID",
            ErrorCode::ParamParse => "PARAM_PARSE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single defect with its code and a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("[{code}] {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Accumulated defects of one build or one query
pub type Errors = Vec<Error>;

/// Convenience queries over an error list
pub trait ErrorsExt {
    /// True if any error carries `code`
    fn has_code(&self, code: ErrorCode) -> bool;

    /// Number of errors carrying `code`
    fn count_code(&self, code: ErrorCode) -> usize;
}

impl ErrorsExt for [Error] {
    fn has_code(&self, code: ErrorCode) -> bool {
        self.iter().any(|e| e.code == code)
    }

    fn count_code(&self, code: ErrorCode) -> usize {
        self.iter().filter(|e| e.code == code).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorCode::DuplicateName, "link [base] already exists");
        assert_eq!(err.to_string(), "[DUPLICATE_NAME] link [base] already exists");
    }

    #[test]
    fn test_has_code() {
        let errors: Errors = vec![
            Error::new(ErrorCode::ReservedName, "a"),
            Error::new(ErrorCode::ReservedName, "b"),
            Error::new(ErrorCode::PoseRelativeToCycle, "c"),
        ];
        assert!(errors.has_code(ErrorCode::PoseRelativeToCycle));
        assert!(!errors.has_code(ErrorCode::DuplicateName));
        assert_eq!(errors.count_code(ErrorCode::ReservedName), 2);
    }

    #[test]
    fn test_code_serializes_upper_case() {
        let json = serde_json::to_string(&ErrorCode::FrameAttachedToCycle).unwrap();
        assert_eq!(json, "\"FRAME_ATTACHED_TO_CYCLE\"");
    }
}
