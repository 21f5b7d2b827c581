/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Template and instruction definitions.
//!
//! Instructions are assembled with builder methods and validated when the
//! enclosing [`Template`] is built. Building also performs the schema
//! analysis the codec relies on:
//! - dictionary keys of the form `"{id}:{name}:{type}"`
//! - decimal components inherit the decimal's id and name
//! - an optional decimal makes its exponent optional
//! - an optional sequence makes its length optional
//! - per-scope presence-map bit counts

use ironfast_core::{
    DictionaryScope, InstructionType, Operator, Presence, SchemaError, Value,
};
use serde::{Deserialize, Serialize};

/// One field or structural node of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    id: u32,
    name: String,
    field_type: InstructionType,
    presence: Presence,
    operator: Operator,
    initial: Value,
    scope: DictionaryScope,
    instructions: Vec<Instruction>,
    #[serde(skip)]
    key: String,
    #[serde(skip)]
    pmap_size: usize,
}

impl Instruction {
    /// Creates a mandatory instruction with no operator.
    ///
    /// # Arguments
    /// * `id` - Field id
    /// * `name` - Field name
    /// * `field_type` - Wire type
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, field_type: InstructionType) -> Self {
        Self {
            id,
            name: name.into(),
            field_type,
            presence: Presence::Mandatory,
            operator: Operator::None,
            initial: Value::Absent,
            scope: DictionaryScope::Global,
            instructions: Vec::new(),
            key: String::new(),
            pmap_size: 0,
        }
    }

    /// Creates a `uInt32` field.
    #[must_use]
    pub fn uint32(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::UInt32)
    }

    /// Creates a `uInt64` field.
    #[must_use]
    pub fn uint64(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::UInt64)
    }

    /// Creates an `int32` field.
    #[must_use]
    pub fn int32(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::Int32)
    }

    /// Creates an `int64` field.
    #[must_use]
    pub fn int64(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::Int64)
    }

    /// Creates an ASCII string field.
    #[must_use]
    pub fn ascii(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::AsciiString)
    }

    /// Creates a Unicode string field.
    #[must_use]
    pub fn unicode(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::UnicodeString)
    }

    /// Creates a byte-vector field.
    #[must_use]
    pub fn byte_vector(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::ByteVector)
    }

    /// Creates a decimal field encoded as one unit with a single operator.
    #[must_use]
    pub fn decimal(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::Decimal)
    }

    /// Creates a decimal field whose exponent and mantissa carry their own operators.
    ///
    /// # Arguments
    /// * `exponent` - Exponent component, usually from [`Instruction::component`]
    /// * `mantissa` - Mantissa component
    #[must_use]
    pub fn decimal_split(
        id: u32,
        name: impl Into<String>,
        exponent: Instruction,
        mantissa: Instruction,
    ) -> Self {
        let mut decimal = Self::decimal(id, name);
        decimal.instructions = vec![exponent, mantissa];
        decimal
    }

    /// Creates a decimal component (exponent or mantissa) that inherits id and name.
    #[must_use]
    pub fn component(field_type: InstructionType) -> Self {
        Self::new(0, "", field_type)
    }

    /// Creates a sequence length instruction.
    #[must_use]
    pub fn length(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, InstructionType::Length)
    }

    /// Creates a group.
    #[must_use]
    pub fn group(id: u32, name: impl Into<String>, members: Vec<Instruction>) -> Self {
        let mut group = Self::new(id, name, InstructionType::Group);
        group.instructions = members;
        group
    }

    /// Creates a sequence from its length instruction and element members.
    #[must_use]
    pub fn sequence(
        id: u32,
        name: impl Into<String>,
        length: Instruction,
        members: Vec<Instruction>,
    ) -> Self {
        let mut sequence = Self::new(id, name, InstructionType::Sequence);
        sequence.instructions = Vec::with_capacity(members.len() + 1);
        sequence.instructions.push(length);
        sequence.instructions.extend(members);
        sequence
    }

    /// Marks the instruction optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    /// Sets the presence.
    #[must_use]
    pub const fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Sets the operator.
    #[must_use]
    pub const fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// Sets the initial value used by constant, default, copy, increment, delta and tail.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.initial = value.into();
        self
    }

    /// Sets the dictionary scope of the operator state.
    #[must_use]
    pub const fn with_dictionary(mut self, scope: DictionaryScope) -> Self {
        self.scope = scope;
        self
    }

    /// Returns the field id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the field name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wire type.
    #[inline]
    #[must_use]
    pub const fn field_type(&self) -> InstructionType {
        self.field_type
    }

    /// Returns the presence.
    #[inline]
    #[must_use]
    pub const fn presence(&self) -> Presence {
        self.presence
    }

    /// Returns true if the field is optional.
    #[inline]
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self.presence, Presence::Optional)
    }

    /// Returns true if the field uses the nullable integer/string representation.
    ///
    /// Optional constants are signalled by the presence map instead.
    #[inline]
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.is_optional() && !matches!(self.operator, Operator::Constant)
    }

    /// Returns the operator.
    #[inline]
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the initial value.
    #[inline]
    #[must_use]
    pub const fn initial(&self) -> &Value {
        &self.initial
    }

    /// Returns the dictionary scope.
    #[inline]
    #[must_use]
    pub const fn scope(&self) -> DictionaryScope {
        self.scope
    }

    /// Returns the dictionary key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the nested instructions.
    #[inline]
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the number of presence-map bits of this scope (groups and sequence elements).
    #[inline]
    #[must_use]
    pub const fn pmap_size(&self) -> usize {
        self.pmap_size
    }

    /// Returns true if this scope reads or writes a presence map of its own.
    #[inline]
    #[must_use]
    pub const fn has_own_pmap(&self) -> bool {
        self.pmap_size > 0
    }

    /// Returns the exponent and mantissa of a decimal with individual operators.
    #[must_use]
    pub fn split_components(&self) -> Option<(&Instruction, &Instruction)> {
        match (self.field_type, self.instructions.as_slice()) {
            (InstructionType::Decimal, [exponent, mantissa]) => Some((exponent, mantissa)),
            _ => None,
        }
    }

    /// Returns the length instruction of a sequence.
    #[must_use]
    pub fn sequence_length(&self) -> Option<&Instruction> {
        match self.field_type {
            InstructionType::Sequence => self.instructions.first(),
            _ => None,
        }
    }

    /// Returns the members of a group or the element members of a sequence.
    #[must_use]
    pub fn members(&self) -> &[Instruction] {
        match self.field_type {
            InstructionType::Sequence => self.instructions.get(1..).unwrap_or(&[]),
            InstructionType::Group => &self.instructions,
            _ => &[],
        }
    }

    /// Number of bits this instruction consumes in the enclosing scope's count.
    ///
    /// Optional groups take their bit from the active map at runtime but are not
    /// counted here, so a group does not force a presence map onto its parent.
    fn enclosing_bits(&self) -> usize {
        match self.field_type {
            InstructionType::Group => 0,
            InstructionType::Sequence => self
                .sequence_length()
                .map_or(0, Instruction::enclosing_bits),
            InstructionType::Decimal if !self.instructions.is_empty() => self
                .instructions
                .iter()
                .map(Instruction::enclosing_bits)
                .sum(),
            _ => usize::from(self.operator.consumes_pmap_bit(self.presence)),
        }
    }

    /// Validates the instruction and fills in the derived schema data.
    pub(crate) fn prepare(&mut self) -> Result<(), SchemaError> {
        self.validate()?;
        self.key = format!("{}:{}:{}", self.id, self.name, self.field_type);

        match self.field_type {
            InstructionType::Decimal if !self.instructions.is_empty() => {
                let optional = self.is_optional();
                for component in &mut self.instructions {
                    component.id = self.id;
                    component.name.clone_from(&self.name);
                    component.presence = match component.field_type {
                        InstructionType::Exponent if optional => Presence::Optional,
                        _ => Presence::Mandatory,
                    };
                    component.prepare()?;
                }
            }
            InstructionType::Sequence => {
                let optional = self.is_optional();
                let (id, name) = (self.id, self.name.clone());
                if let Some(length) = self.instructions.first_mut() {
                    if length.name.is_empty() {
                        length.id = id;
                        length.name = name;
                    }
                    if optional {
                        length.presence = Presence::Optional;
                    }
                }
                for instruction in &mut self.instructions {
                    instruction.prepare()?;
                }
                self.pmap_size = self.members().iter().map(Instruction::enclosing_bits).sum();
            }
            InstructionType::Group => {
                for instruction in &mut self.instructions {
                    instruction.prepare()?;
                }
                self.pmap_size = self.members().iter().map(Instruction::enclosing_bits).sum();
            }
            _ => {}
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let not_applicable = || SchemaError::OperatorNotApplicable {
            name: self.name.clone(),
            operator: self.operator,
            field_type: self.field_type,
        };

        let structural = self.field_type.is_structural()
            || (self.field_type == InstructionType::Decimal && !self.instructions.is_empty());
        let applicable = match self.operator {
            Operator::None => true,
            _ if structural => false,
            Operator::Constant | Operator::Default | Operator::Copy => true,
            Operator::Increment => self.field_type.is_integer(),
            Operator::Delta => self.field_type.is_numeric(),
            Operator::Tail => self.field_type.is_text_or_bytes(),
        };
        if !applicable {
            return Err(not_applicable());
        }

        if !self.initial.matches(self.field_type) || (structural && !self.initial.is_absent()) {
            return Err(SchemaError::InitialValueMismatch {
                name: self.name.clone(),
                field_type: self.field_type,
            });
        }

        match self.operator {
            Operator::Constant if self.initial.is_absent() => {
                return Err(SchemaError::MissingConstantValue {
                    name: self.name.clone(),
                });
            }
            Operator::Default if self.initial.is_absent() && !self.is_optional() => {
                return Err(SchemaError::MissingDefaultValue {
                    name: self.name.clone(),
                });
            }
            _ => {}
        }

        match self.field_type {
            InstructionType::Sequence => {
                let leading = self.instructions.first().map(Instruction::field_type);
                let extra = self.instructions.iter().skip(1).any(|i| {
                    i.field_type == InstructionType::Length
                });
                if leading != Some(InstructionType::Length) || extra {
                    return Err(SchemaError::MissingLength {
                        name: self.name.clone(),
                    });
                }
            }
            InstructionType::Decimal if !self.instructions.is_empty() => {
                let kinds: Vec<_> = self.instructions.iter().map(|i| i.field_type).collect();
                if kinds != [InstructionType::Exponent, InstructionType::Mantissa] {
                    return Err(SchemaError::InvalidDecimalComponents {
                        name: self.name.clone(),
                    });
                }
            }
            InstructionType::Group => {}
            _ if !self.instructions.is_empty() => {
                return Err(SchemaError::InvalidDecimalComponents {
                    name: self.name.clone(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

/// Message type description: id, name, and ordered instructions.
///
/// Immutable once built; share it behind an `Arc` via the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    id: u32,
    name: String,
    instructions: Vec<Instruction>,
    pmap_size: usize,
}

impl Template {
    /// Builds and validates a template.
    ///
    /// # Arguments
    /// * `id` - Template id carried on the wire
    /// * `name` - Template name
    /// * `instructions` - Top-level instructions in wire order
    ///
    /// # Errors
    /// Returns `SchemaError` if any instruction is invalid.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        mut instructions: Vec<Instruction>,
    ) -> Result<Self, SchemaError> {
        for instruction in &mut instructions {
            instruction.prepare()?;
        }
        // bit 0 of the message map is the template id
        let pmap_size = 1 + instructions
            .iter()
            .map(Instruction::enclosing_bits)
            .sum::<usize>();
        Ok(Self {
            id,
            name: name.into(),
            instructions,
            pmap_size,
        })
    }

    /// Returns the template id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the template name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the top-level instructions.
    #[inline]
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the number of message-level presence-map bits, template id included.
    #[inline]
    #[must_use]
    pub const fn pmap_size(&self) -> usize {
        self.pmap_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironfast_core::Decimal;

    #[test]
    fn test_template_keys_and_bits() {
        let template = Template::new(
            1,
            "Prices",
            vec![
                Instruction::decimal(1, "CopyDecimal").with_operator(Operator::Copy),
                Instruction::decimal(2, "MandatoryDecimal"),
                Instruction::decimal_split(
                    3,
                    "IndividualDecimal",
                    Instruction::component(InstructionType::Exponent)
                        .with_operator(Operator::Copy),
                    Instruction::component(InstructionType::Mantissa)
                        .with_operator(Operator::Copy),
                ),
            ],
        )
        .unwrap();

        assert_eq!(template.pmap_size(), 4);
        let split = &template.instructions()[2];
        let (exponent, mantissa) = split.split_components().unwrap();
        assert_eq!(exponent.key(), "3:IndividualDecimal:exponent");
        assert_eq!(mantissa.key(), "3:IndividualDecimal:mantissa");
        assert_eq!(template.instructions()[0].key(), "1:CopyDecimal:decimal");
    }

    #[test]
    fn test_optional_decimal_propagates_to_exponent() {
        let template = Template::new(
            1,
            "T",
            vec![
                Instruction::decimal_split(
                    4,
                    "Opt",
                    Instruction::component(InstructionType::Exponent),
                    Instruction::component(InstructionType::Mantissa)
                        .with_operator(Operator::Delta),
                )
                .optional(),
            ],
        )
        .unwrap();
        let (exponent, mantissa) = template.instructions()[0].split_components().unwrap();
        assert!(exponent.is_optional());
        assert!(!mantissa.is_optional());
        assert_eq!(template.pmap_size(), 1);
    }

    #[test]
    fn test_sequence_analysis() {
        let template = Template::new(
            2,
            "Seq",
            vec![
                Instruction::sequence(
                    3,
                    "Entries",
                    Instruction::length(4, "NoEntries"),
                    vec![
                        Instruction::uint32(5, "Price").with_operator(Operator::Copy),
                        Instruction::ascii(6, "Side").with_operator(Operator::Default).optional(),
                        Instruction::uint32(7, "Size"),
                    ],
                )
                .optional(),
            ],
        )
        .unwrap();
        let sequence = &template.instructions()[0];
        assert_eq!(sequence.pmap_size(), 2);
        assert!(sequence.sequence_length().unwrap().is_optional());
        assert_eq!(sequence.members().len(), 3);
        assert_eq!(template.pmap_size(), 1);
    }

    #[test]
    fn test_length_inherits_sequence_name() {
        let template = Template::new(
            2,
            "Seq",
            vec![Instruction::sequence(
                3,
                "Entries",
                Instruction::length(0, ""),
                vec![Instruction::uint32(5, "Price")],
            )],
        )
        .unwrap();
        let length = template.instructions()[0].sequence_length().unwrap();
        assert_eq!(length.name(), "Entries");
        assert_eq!(length.key(), "3:Entries:length");
    }

    #[test]
    fn test_optional_group_not_counted() {
        let template = Template::new(
            6,
            "Groups",
            vec![Instruction::group(
                2,
                "OuterGroup",
                vec![
                    Instruction::uint32(3, "OuterTestData"),
                    Instruction::group(4, "InnerGroup", vec![Instruction::uint32(5, "Inner")])
                        .optional(),
                ],
            )],
        )
        .unwrap();
        assert_eq!(template.instructions()[0].pmap_size(), 0);
        assert!(!template.instructions()[0].has_own_pmap());
        assert_eq!(template.pmap_size(), 1);
    }

    #[test]
    fn test_delta_on_string_rejected() {
        let err = Template::new(
            1,
            "T",
            vec![Instruction::ascii(1, "Symbol").with_operator(Operator::Delta)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::OperatorNotApplicable {
                name: "Symbol".to_string(),
                operator: Operator::Delta,
                field_type: InstructionType::AsciiString,
            }
        );
    }

    #[test]
    fn test_tail_and_increment_applicability() {
        assert!(
            Template::new(1, "T", vec![Instruction::uint32(1, "A").with_operator(Operator::Tail)])
                .is_err()
        );
        assert!(
            Template::new(1, "T", vec![Instruction::ascii(1, "A").with_operator(Operator::Increment)])
                .is_err()
        );
        assert!(
            Template::new(1, "T", vec![Instruction::byte_vector(1, "A").with_operator(Operator::Tail)])
                .is_ok()
        );
        assert!(
            Template::new(1, "T", vec![Instruction::decimal(1, "A").with_operator(Operator::Delta)])
                .is_ok()
        );
    }

    #[test]
    fn test_missing_initial_values() {
        assert_eq!(
            Template::new(1, "T", vec![Instruction::ascii(1, "Type").with_operator(Operator::Constant)]),
            Err(SchemaError::MissingConstantValue {
                name: "Type".to_string()
            })
        );
        assert_eq!(
            Template::new(1, "T", vec![Instruction::uint32(1, "Qty").with_operator(Operator::Default)]),
            Err(SchemaError::MissingDefaultValue {
                name: "Qty".to_string()
            })
        );
        assert!(
            Template::new(
                1,
                "T",
                vec![Instruction::uint32(1, "Qty").with_operator(Operator::Default).optional()]
            )
            .is_ok()
        );
    }

    #[test]
    fn test_initial_value_type_checked() {
        assert_eq!(
            Template::new(
                1,
                "T",
                vec![Instruction::uint32(1, "Qty").with_operator(Operator::Copy).with_value(5i64)]
            ),
            Err(SchemaError::InitialValueMismatch {
                name: "Qty".to_string(),
                field_type: InstructionType::UInt32,
            })
        );
        assert!(
            Template::new(
                1,
                "T",
                vec![
                    Instruction::decimal(1, "Px")
                        .with_operator(Operator::Default)
                        .with_value(Decimal::new(100, -2))
                ]
            )
            .is_ok()
        );
    }

    #[test]
    fn test_structural_validation() {
        assert_eq!(
            Template::new(
                1,
                "T",
                vec![Instruction::group(1, "G", vec![]).with_operator(Operator::Copy)]
            ),
            Err(SchemaError::OperatorNotApplicable {
                name: "G".to_string(),
                operator: Operator::Copy,
                field_type: InstructionType::Group,
            })
        );

        let bad_sequence =
            Instruction::sequence(1, "S", Instruction::uint32(2, "NotLength"), vec![]).optional();
        assert_eq!(
            Template::new(1, "T", vec![bad_sequence]),
            Err(SchemaError::MissingLength {
                name: "S".to_string()
            })
        );

        assert_eq!(
            Template::new(
                1,
                "T",
                vec![Instruction::decimal_split(
                    1,
                    "D",
                    Instruction::component(InstructionType::Mantissa),
                    Instruction::component(InstructionType::Exponent),
                )]
            ),
            Err(SchemaError::InvalidDecimalComponents {
                name: "D".to_string()
            })
        );
    }
}
