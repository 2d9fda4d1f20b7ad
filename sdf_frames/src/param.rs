//! Typed attribute values
//!
//! Every attribute or element value is one [`ParamValue`]. Each variant has a
//! registered text codec in [`CODECS`]; decoding a value of a known kind is a
//! table lookup.

use crate::error::{Error, ErrorCode};
use crate::transform::{format_pose, parse_pose, parse_vector3, Pose};
use nalgebra::Vector3;
use std::fmt;

/// Closed set of value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Bool,
    Int,
    UInt,
    Double,
    String,
    Vector3,
    Pose,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Bool => "bool",
            ParamKind::Int => "int",
            ParamKind::UInt => "unsigned int",
            ParamKind::Double => "double",
            ParamKind::String => "string",
            ParamKind::Vector3 => "vector3",
            ParamKind::Pose => "pose",
        }
    }
}

/// A typed attribute or element value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    String(String),
    Vector3(Vector3<f64>),
    Pose(Pose),
}

/// Text codec registered for one kind
pub struct Codec {
    pub kind: ParamKind,
    pub decode: fn(&str) -> Option<ParamValue>,
}

/// One codec per [`ParamKind`]
pub static CODECS: &[Codec] = &[
    Codec {
        kind: ParamKind::Bool,
        decode: decode_bool,
    },
    Codec {
        kind: ParamKind::Int,
        decode: |s| s.trim().parse().ok().map(ParamValue::Int),
    },
    Codec {
        kind: ParamKind::UInt,
        decode: |s| s.trim().parse().ok().map(ParamValue::UInt),
    },
    Codec {
        kind: ParamKind::Double,
        decode: |s| s.trim().parse().ok().map(ParamValue::Double),
    },
    Codec {
        kind: ParamKind::String,
        decode: |s| Some(ParamValue::String(s.trim().to_string())),
    },
    Codec {
        kind: ParamKind::Vector3,
        decode: |s| parse_vector3(s).map(ParamValue::Vector3),
    },
    Codec {
        kind: ParamKind::Pose,
        decode: |s| parse_pose(s).map(ParamValue::Pose),
    },
];

fn decode_bool(text: &str) -> Option<ParamValue> {
    match text.trim() {
        "true" | "1" => Some(ParamValue::Bool(true)),
        "false" | "0" => Some(ParamValue::Bool(false)),
        _ => None,
    }
}

/// Codec registered for `kind`
pub fn codec(kind: ParamKind) -> Option<&'static Codec> {
    CODECS.iter().find(|c| c.kind == kind)
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Int(_) => ParamKind::Int,
            ParamValue::UInt(_) => ParamKind::UInt,
            ParamValue::Double(_) => ParamKind::Double,
            ParamValue::String(_) => ParamKind::String,
            ParamValue::Vector3(_) => ParamKind::Vector3,
            ParamValue::Pose(_) => ParamKind::Pose,
        }
    }

    /// Decode `text` as a value of `kind`
    pub fn parse(kind: ParamKind, text: &str) -> Result<Self, Error> {
        codec(kind)
            .and_then(|c| (c.decode)(text))
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::ParamParse,
                    format!("Unable to read [{}] as a {}", text.trim(), kind.as_str()),
                )
            })
    }

    /// Convert to `kind`, re-decoding through the text form when the stored
    /// kind differs (values loaded from XML are stored as strings)
    pub fn convert(&self, kind: ParamKind) -> Result<Self, Error> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        Self::parse(kind, &self.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::UInt(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::String(v) => f.write_str(v),
            ParamValue::Vector3(v) => write!(f, "{} {} {}", v.x, v.y, v.z),
            ParamValue::Pose(p) => f.write_str(&format_pose(p)),
        }
    }
}

/// Rust types that map onto one [`ParamKind`]
pub trait ParamType: Sized {
    const KIND: ParamKind;

    fn from_param(value: &ParamValue) -> Option<Self>;

    fn into_param(self) -> ParamValue;
}

macro_rules! impl_param_type {
    ($ty:ty, $kind:ident) => {
        impl ParamType for $ty {
            const KIND: ParamKind = ParamKind::$kind;

            fn from_param(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$kind(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn into_param(self) -> ParamValue {
                ParamValue::$kind(self)
            }
        }
    };
}

impl_param_type!(bool, Bool);
impl_param_type!(i64, Int);
impl_param_type!(u64, UInt);
impl_param_type!(f64, Double);
impl_param_type!(String, String);
impl_param_type!(Vector3<f64>, Vector3);
impl_param_type!(Pose, Pose);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pose_from_translation;

    #[test]
    fn test_every_kind_has_a_codec() {
        for kind in [
            ParamKind::Bool,
            ParamKind::Int,
            ParamKind::UInt,
            ParamKind::Double,
            ParamKind::String,
            ParamKind::Vector3,
            ParamKind::Pose,
        ] {
            assert!(codec(kind).is_some(), "missing codec for {:?}", kind);
        }
    }

    #[test]
    fn test_parse_bool_forms() {
        assert_eq!(ParamValue::parse(ParamKind::Bool, "1").unwrap(), ParamValue::Bool(true));
        assert_eq!(ParamValue::parse(ParamKind::Bool, " false ").unwrap(), ParamValue::Bool(false));
        assert!(ParamValue::parse(ParamKind::Bool, "yes").is_err());
    }

    #[test]
    fn test_parse_failure_code() {
        let err = ParamValue::parse(ParamKind::UInt, "-3").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParamParse);
        assert!(err.message.contains("unsigned int"));
    }

    #[test]
    fn test_convert_from_string() {
        let stored = ParamValue::String("1 0 0 0 0 0".to_string());
        let converted = stored.convert(ParamKind::Pose).unwrap();
        assert_eq!(converted, ParamValue::Pose(pose_from_translation(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_typed_access() {
        assert_eq!(f64::from_param(&ParamValue::Double(2.5)), Some(2.5));
        assert_eq!(f64::from_param(&ParamValue::Int(2)), None);
        assert_eq!(true.into_param(), ParamValue::Bool(true));
    }
}
