/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Error types for the IronFast FAST codec.
//!
//! This module provides a closed error taxonomy using `thiserror`:
//! - [`SchemaError`]: static template problems, detected before any message is processed
//! - [`FastError`]: per-message failures while encoding or decoding

use crate::types::{InstructionType, Operator};
use thiserror::Error;

/// Result type alias using [`FastError`] as the error type.
pub type Result<T> = std::result::Result<T, FastError>;

/// Errors detected while building or registering a template.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Operator cannot be applied to the instruction type.
    #[error("operator {operator} not applicable to {field_type} field {name}")]
    OperatorNotApplicable {
        /// Field name.
        name: String,
        /// Offending operator.
        operator: Operator,
        /// Declared field type.
        field_type: InstructionType,
    },

    /// Initial value does not match the declared type.
    #[error("initial value of field {name} does not match type {field_type}")]
    InitialValueMismatch {
        /// Field name.
        name: String,
        /// Declared field type.
        field_type: InstructionType,
    },

    /// Constant operator declared without a value.
    #[error("constant field {name} has no initial value")]
    MissingConstantValue {
        /// Field name.
        name: String,
    },

    /// Default operator on a mandatory field declared without a value.
    #[error("mandatory default field {name} has no initial value")]
    MissingDefaultValue {
        /// Field name.
        name: String,
    },

    /// Sequence without a leading length instruction.
    #[error("sequence {name} must start with a length instruction")]
    MissingLength {
        /// Sequence name.
        name: String,
    },

    /// Decimal sub-instructions are not exactly exponent then mantissa.
    #[error("decimal {name} must carry an exponent followed by a mantissa")]
    InvalidDecimalComponents {
        /// Decimal field name.
        name: String,
    },

    /// Template id already registered.
    #[error("duplicate template id: {0}")]
    DuplicateTemplate(u32),
}

/// Errors that can occur during FAST encoding/decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FastError {
    /// Template could not be used.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Underlying read or write failed.
    #[error("io error: {0}")]
    Io(String),

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Unknown template ID.
    #[error("unknown template id: {0}")]
    UnknownTemplate(u32),

    /// Template id bit cleared on the first message of a stream.
    #[error("template id omitted with no previous template")]
    MissingTemplateId,

    /// Stop-bit integer does not fit in 64 bits.
    #[error("integer overflow")]
    IntegerOverflow,

    /// Integer does not fit the declared field width.
    #[error("value {value} out of range for {field_type} field {name}")]
    IntegerOutOfRange {
        /// Field name.
        name: String,
        /// Declared field type.
        field_type: InstructionType,
        /// Offending value.
        value: i128,
    },

    /// Value type does not match the instruction type.
    #[error("type mismatch on field {name}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Field name.
        name: String,
        /// Declared field type.
        expected: InstructionType,
        /// Type name of the supplied value.
        actual: &'static str,
    },

    /// Invalid decimal encoding.
    #[error("invalid decimal: exponent={exponent}, mantissa={mantissa}")]
    InvalidDecimal {
        /// Decimal exponent.
        exponent: i64,
        /// Decimal mantissa.
        mantissa: i64,
    },

    /// Floating value cannot be represented as a decimal.
    #[error("unrepresentable float: {0}")]
    UnrepresentableFloat(String),

    /// Decimal with fractional digits converted to an integer.
    #[error("decimal {0} is not an integer")]
    DecimalNotInteger(String),

    /// Unicode string is not valid UTF-8.
    #[error("invalid utf-8 in field {name}")]
    InvalidUtf8 {
        /// Field name.
        name: String,
    },

    /// ASCII string contains a byte above 0x7f.
    #[error("non-ascii byte in field {name}")]
    NonAsciiString {
        /// Field name.
        name: String,
    },

    /// Stop-bit integer carries redundant leading groups.
    #[error("overlong integer encoding")]
    OverlongInteger,

    /// Presence map carries trailing all-zero groups.
    #[error("overlong presence map")]
    OverlongPresenceMap,

    /// Presence map carries set bits beyond those consumed by the scope.
    #[error("presence map has unconsumed set bits")]
    ExcessPresenceBits,

    /// ASCII string begins with a redundant NUL byte.
    #[error("overlong string encoding")]
    OverlongString,

    /// Invalid string encoding.
    #[error("invalid string encoding")]
    InvalidString,

    /// Missing mandatory field.
    #[error("missing mandatory field: {name}")]
    MissingMandatoryField {
        /// Field name.
        name: String,
    },

    /// Dictionary entry not found.
    #[error("dictionary entry not found: {key}")]
    DictionaryEntryNotFound {
        /// Dictionary key.
        key: String,
    },

    /// Previous value is explicitly empty for a mandatory field.
    #[error("empty previous value: {key}")]
    EmptyPreviousValue {
        /// Dictionary key.
        key: String,
    },

    /// Value supplied for a constant field differs from the constant.
    #[error("constant mismatch on field {name}")]
    ConstantMismatch {
        /// Field name.
        name: String,
    },

    /// Value cannot be expressed as a tail of the previous value.
    #[error("invalid tail on field {name}")]
    InvalidTail {
        /// Field name.
        name: String,
    },

    /// Invalid presence map.
    #[error("invalid presence map")]
    InvalidPresenceMap,

    /// Group or sequence nesting exceeds the configured depth.
    #[error("nesting too deep: {depth} exceeds {max}")]
    NestingTooDeep {
        /// Depth reached.
        depth: usize,
        /// Configured limit.
        max: usize,
    },

    /// String or byte vector exceeds the configured length.
    #[error("field too long: {len} exceeds {max}")]
    FieldTooLong {
        /// Declared length.
        len: u64,
        /// Configured limit.
        max: usize,
    },

    /// Sequence length exceeds the configured bound.
    #[error("sequence too long: {len} exceeds {max}")]
    SequenceTooLong {
        /// Declared length.
        len: u64,
        /// Configured limit.
        max: usize,
    },
}

impl From<std::io::Error> for FastError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof
        } else {
            Self::Io(err.to_string())
        }
    }
}

impl FastError {
    /// Returns true if the error leaves the stream positioned at a message boundary.
    ///
    /// Only an unknown template id qualifies: the template id is the last thing
    /// consumed before the lookup fails, so nothing of the message body is read.
    #[must_use]
    pub const fn is_message_discard(&self) -> bool {
        matches!(self, Self::UnknownTemplate(_))
    }
}
