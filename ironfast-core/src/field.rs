/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Transient field record exchanged with message binders.

use crate::value::Value;
use std::fmt;

/// One value in flight between the codec and a message binder.
///
/// Created per visited instruction and discarded afterwards; it borrows the
/// names from the template and carries no identity across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    /// Instruction id.
    pub id: u32,
    /// Instruction name.
    pub name: &'a str,
    /// Id of the template being encoded or decoded.
    pub template_id: u32,
    /// Decoded value, or the value being encoded.
    pub value: Value,
    /// Element index, for sequence elements.
    pub index: Option<usize>,
    /// Name of the enclosing group or sequence, if any.
    pub parent: Option<&'a str>,
}

impl<'a> Field<'a> {
    /// Creates a field record with an absent value.
    ///
    /// # Arguments
    /// * `id` - Instruction id
    /// * `name` - Instruction name
    /// * `template_id` - Owning template id
    #[inline]
    #[must_use]
    pub const fn new(id: u32, name: &'a str, template_id: u32) -> Self {
        Self {
            id,
            name,
            template_id,
            value: Value::Absent,
            index: None,
            parent: None,
        }
    }

    /// Sets the value.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// Sets the sequence element index.
    #[must_use]
    pub const fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Sets the enclosing group or sequence name.
    #[must_use]
    pub const fn with_parent(mut self, parent: Option<&'a str>) -> Self {
        self.parent = parent;
        self
    }
}

impl fmt::Display for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent {
            write!(f, "{parent}.")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        write!(f, " ({}) = {}", self.id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = Field::new(38, "SomeField", 1)
            .with_value(Value::UInt64(2))
            .with_index(0)
            .with_parent(Some("Sequence"));
        assert_eq!(field.id, 38);
        assert_eq!(field.template_id, 1);
        assert_eq!(field.index, Some(0));
        assert_eq!(field.value, Value::UInt64(2));
    }

    #[test]
    fn test_field_display() {
        let field = Field::new(38, "SomeField", 1)
            .with_value(Value::UInt64(2))
            .with_index(0)
            .with_parent(Some("Sequence"));
        assert_eq!(field.to_string(), "Sequence.SomeField[0] (38) = 2");
        assert_eq!(Field::new(1, "Price", 1).to_string(), "Price (1) = <absent>");
    }
}
