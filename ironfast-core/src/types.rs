/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Schema vocabulary shared by templates and the codec.
//!
//! This module provides:
//! - [`InstructionType`]: Wire type of a template instruction
//! - [`Operator`]: Field operator exploiting redundancy between messages
//! - [`Presence`]: Mandatory / optional presence of a field
//! - [`DictionaryScope`]: Which dictionary keeps an operator's previous value

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire type of a template instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionType {
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// 7-bit ASCII string.
    AsciiString,
    /// UTF-8 string, carried as a length-prefixed byte vector.
    UnicodeString,
    /// Length-prefixed raw bytes.
    ByteVector,
    /// Scaled decimal (exponent + mantissa).
    Decimal,
    /// Exponent component of a decimal with individual operators.
    Exponent,
    /// Mantissa component of a decimal with individual operators.
    Mantissa,
    /// Repeated group preceded by a length instruction.
    Sequence,
    /// Nested set of fields sharing one presence-map scope.
    Group,
    /// Length of a sequence.
    Length,
}

impl InstructionType {
    /// Returns true for the integer kinds, including decimal components and length.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::UInt32
                | Self::UInt64
                | Self::Int32
                | Self::Int64
                | Self::Exponent
                | Self::Mantissa
                | Self::Length
        )
    }

    /// Returns true for every type the delta operator accepts.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Self::Decimal)
    }

    /// Returns true for the string and byte-vector kinds.
    #[must_use]
    pub const fn is_text_or_bytes(&self) -> bool {
        matches!(
            self,
            Self::AsciiString | Self::UnicodeString | Self::ByteVector
        )
    }

    /// Returns true for group and sequence.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Sequence | Self::Group)
    }
}

impl fmt::Display for InstructionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UInt32 => "uInt32",
            Self::UInt64 => "uInt64",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::AsciiString => "string",
            Self::UnicodeString => "unicode",
            Self::ByteVector => "byteVector",
            Self::Decimal => "decimal",
            Self::Exponent => "exponent",
            Self::Mantissa => "mantissa",
            Self::Sequence => "sequence",
            Self::Group => "group",
            Self::Length => "length",
        };
        f.write_str(name)
    }
}

/// FAST field operator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Operator {
    /// No operator - value is always present in stream.
    #[default]
    None,
    /// Constant - value is never in stream, always uses initial value.
    Constant,
    /// Default - if absent, use initial value.
    Default,
    /// Copy - if absent, use previous value from dictionary.
    Copy,
    /// Increment - if absent, increment previous value by 1.
    Increment,
    /// Delta - value in stream is delta from previous value.
    Delta,
    /// Tail - value in stream replaces tail of previous value.
    Tail,
}

impl Operator {
    /// Returns true if this operator reads or writes the dictionary to decide a value.
    #[must_use]
    pub const fn uses_dictionary(&self) -> bool {
        matches!(
            self,
            Self::Copy | Self::Increment | Self::Delta | Self::Tail
        )
    }

    /// Returns true if a field with this operator consumes one presence-map bit.
    ///
    /// # Arguments
    /// * `presence` - Presence of the field carrying the operator
    #[must_use]
    pub const fn consumes_pmap_bit(&self, presence: Presence) -> bool {
        match self {
            Self::Default | Self::Copy | Self::Increment | Self::Tail => true,
            Self::Constant => matches!(presence, Presence::Optional),
            Self::None | Self::Delta => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Constant => "constant",
            Self::Default => "default",
            Self::Copy => "copy",
            Self::Increment => "increment",
            Self::Delta => "delta",
            Self::Tail => "tail",
        };
        f.write_str(name)
    }
}

/// Presence of a field in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Presence {
    /// Field always carries a value.
    #[default]
    Mandatory,
    /// Field may be absent (null).
    Optional,
}

/// Dictionary scope for operator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DictionaryScope {
    /// Global dictionary shared across all templates of a session.
    #[default]
    Global,
    /// Template-specific dictionary.
    Template,
}
