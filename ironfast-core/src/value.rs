/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Closed value model for FAST fields.
//!
//! Every field value in flight is a [`Value`]: one variant per wire type plus
//! an explicit [`Value::Absent`] for null. Operators pattern-match on it
//! instead of inspecting types at runtime.

use crate::decimal::Decimal;
use crate::types::InstructionType;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumeration of possible FAST field values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Value {
    /// No value (null on the wire, or never assigned).
    #[default]
    Absent,
    /// Unsigned 32-bit integer value.
    UInt32(u32),
    /// Unsigned 64-bit integer value.
    UInt64(u64),
    /// Signed 32-bit integer value.
    Int32(i32),
    /// Signed 64-bit integer value.
    Int64(i64),
    /// ASCII string value.
    Ascii(String),
    /// Unicode string value.
    Unicode(String),
    /// Raw byte vector value.
    Bytes(Bytes),
    /// Scaled decimal value.
    Decimal(Decimal),
}

impl Value {
    /// Returns true if this is the absent (null) value.
    #[inline]
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the variant name, used in type-mismatch errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::UInt32(_) => "uInt32",
            Self::UInt64(_) => "uInt64",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Ascii(_) => "string",
            Self::Unicode(_) => "unicode",
            Self::Bytes(_) => "byteVector",
            Self::Decimal(_) => "decimal",
        }
    }

    /// Returns true if the value may be carried by a field of the given type.
    ///
    /// `Absent` matches every type; presence rules are enforced by the codec.
    #[must_use]
    pub const fn matches(&self, field_type: InstructionType) -> bool {
        matches!(
            (self, field_type),
            (Self::Absent, _)
                | (Self::UInt32(_), InstructionType::UInt32 | InstructionType::Length)
                | (Self::UInt64(_), InstructionType::UInt64)
                | (Self::Int32(_), InstructionType::Int32 | InstructionType::Exponent)
                | (Self::Int64(_), InstructionType::Int64 | InstructionType::Mantissa)
                | (Self::Ascii(_), InstructionType::AsciiString)
                | (Self::Unicode(_), InstructionType::UnicodeString)
                | (Self::Bytes(_), InstructionType::ByteVector)
                | (Self::Decimal(_), InstructionType::Decimal)
        )
    }

    /// Returns the integer payload widened to `i128`, if this is an integer variant.
    #[must_use]
    pub const fn as_i128(&self) -> Option<i128> {
        match self {
            Self::UInt32(v) => Some(*v as i128),
            Self::UInt64(v) => Some(*v as i128),
            Self::Int32(v) => Some(*v as i128),
            Self::Int64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Returns the value as a u32, if it is a UInt32 variant.
    #[must_use]
    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a u64, if it is a UInt64 variant.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i32, if it is an Int32 variant.
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is an Int64 variant.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice, for either string variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) | Self::Unicode(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the raw bytes of a string or byte-vector value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Ascii(s) | Self::Unicode(s) => Some(s.as_bytes()),
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as a Decimal, if it is a Decimal variant.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("<absent>"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Ascii(s) | Self::Unicode(s) => f.write_str(s),
            Self::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Decimal(v) => write!(f, "{v}"),
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Ascii(v.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Absent, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_matches() {
        assert!(Value::UInt32(1).matches(InstructionType::UInt32));
        assert!(Value::UInt32(1).matches(InstructionType::Length));
        assert!(Value::Int32(-2).matches(InstructionType::Exponent));
        assert!(Value::Int64(5).matches(InstructionType::Mantissa));
        assert!(Value::Absent.matches(InstructionType::Decimal));
        assert!(!Value::UInt64(1).matches(InstructionType::UInt32));
        assert!(!Value::Ascii("a".into()).matches(InstructionType::UnicodeString));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::from(7u32).as_u32(), Some(7));
        assert_eq!(Value::from(-7i64).as_i128(), Some(-7));
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(Value::from(None::<u32>), Value::Absent);
        assert_eq!(Value::from(Some(3i32)), Value::Int32(3));
        assert!(Value::default().is_absent());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Ascii("test".to_string()).to_string(), "test");
        assert_eq!(Value::Int64(-42).to_string(), "-42");
        assert_eq!(Value::from(vec![0xc1u8, 0x02]).to_string(), "0xc102");
        assert_eq!(Value::Decimal(Decimal::new(515, -2)).to_string(), "5.15");
        assert_eq!(Value::Absent.to_string(), "<absent>");
    }
}
