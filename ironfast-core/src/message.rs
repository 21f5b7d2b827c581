/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Generic owned message.
//!
//! [`Message`] is a name-keyed tree of values, groups, and sequences that
//! implements both binder traits. It lets applications encode and decode
//! without writing a binder of their own, and it is what the tests compare
//! decoded output against.

use crate::binder::{MessageReceiver, MessageSender};
use crate::error::Result;
use crate::field::Field;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// One named entry of a [`Segment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    /// Scalar value.
    Value(Value),
    /// Nested group.
    Group(Segment),
    /// Sequence elements.
    Sequence(Vec<Segment>),
}

/// Ordered set of named entries: a message body, a group, or a sequence element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    entries: Vec<(String, Entry)>,
}

impl Segment {
    /// Creates an empty segment.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a scalar value; an absent value removes the entry.
    #[must_use]
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_value(name, value);
        self
    }

    /// Adds a nested group.
    #[must_use]
    pub fn with_group(mut self, name: &str, group: Segment) -> Self {
        self.insert(name, Entry::Group(group));
        self
    }

    /// Adds a sequence.
    #[must_use]
    pub fn with_sequence(mut self, name: &str, elements: Vec<Segment>) -> Self {
        self.insert(name, Entry::Sequence(elements));
        self
    }

    /// Sets a scalar value; an absent value removes the entry.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if value.is_absent() {
            self.entries.retain(|(n, _)| n != name);
        } else {
            self.insert(name, Entry::Value(value));
        }
    }

    /// Inserts or replaces an entry, keeping first-insertion order.
    pub fn insert(&mut self, name: &str, entry: Entry) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((name.to_string(), entry)),
        }
    }

    /// Returns the entry with the given name.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// Returns the scalar value with the given name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.entry(name)? {
            Entry::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the group with the given name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Segment> {
        match self.entry(name)? {
            Entry::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the sequence elements with the given name.
    #[must_use]
    pub fn sequence(&self, name: &str) -> Option<&[Segment]> {
        match self.entry(name)? {
            Entry::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Returns an iterator over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the segment has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Step {
    name: String,
    index: Option<usize>,
}

/// Owned FAST message usable as both encode source and decode target.
#[derive(Debug, Clone, Default)]
pub struct Message {
    template_id: u32,
    root: Segment,
    cursor: Vec<Step>,
}

impl Message {
    /// Creates an empty message for the given template.
    ///
    /// # Arguments
    /// * `template_id` - Template the message conforms to
    #[must_use]
    pub const fn new(template_id: u32) -> Self {
        Self {
            template_id,
            root: Segment::new(),
            cursor: Vec::new(),
        }
    }

    /// Returns the template id.
    #[inline]
    #[must_use]
    pub const fn template_id(&self) -> u32 {
        self.template_id
    }

    /// Returns the top-level segment.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> &Segment {
        &self.root
    }

    /// Adds a top-level scalar value.
    #[must_use]
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.root.set_value(name, value);
        self
    }

    /// Adds a top-level group.
    #[must_use]
    pub fn with_group(mut self, name: &str, group: Segment) -> Self {
        self.root.insert(name, Entry::Group(group));
        self
    }

    /// Adds a top-level sequence.
    #[must_use]
    pub fn with_sequence(mut self, name: &str, elements: Vec<Segment>) -> Self {
        self.root.insert(name, Entry::Sequence(elements));
        self
    }

    /// Returns a top-level scalar value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.root.value(name)
    }

    /// Returns a top-level group.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Segment> {
        self.root.group(name)
    }

    /// Returns a top-level sequence.
    #[must_use]
    pub fn sequence(&self, name: &str) -> Option<&[Segment]> {
        self.root.sequence(name)
    }

    /// Resets the binder cursor to the top level.
    pub fn rewind(&mut self) {
        self.cursor.clear();
    }

    fn current(&self) -> Option<&Segment> {
        let mut segment = &self.root;
        for step in &self.cursor {
            segment = match (segment.entry(&step.name)?, step.index) {
                (Entry::Group(g), None) => g,
                (Entry::Sequence(s), Some(i)) => s.get(i)?,
                _ => return None,
            };
        }
        Some(segment)
    }

    fn current_mut(&mut self) -> Option<&mut Segment> {
        let mut segment = &mut self.root;
        for step in &self.cursor {
            segment = match (segment.entry_mut(&step.name)?, step.index) {
                (Entry::Group(g), None) => g,
                (Entry::Sequence(s), Some(i)) => s.get_mut(i)?,
                _ => return None,
            };
        }
        Some(segment)
    }

    fn push(&mut self, field: &Field<'_>) {
        self.cursor.push(Step {
            name: field.name.to_string(),
            index: field.index,
        });
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.template_id == other.template_id && self.root == other.root
    }
}

impl Eq for Message {}

impl MessageReceiver for Message {
    fn set_template_id(&mut self, template_id: u32) {
        self.template_id = template_id;
    }

    fn set_value(&mut self, field: &Field<'_>) -> Result<()> {
        if let Some(segment) = self.current_mut() {
            segment.set_value(field.name, field.value.clone());
        }
        Ok(())
    }

    fn set_length(&mut self, field: &Field<'_>, length: usize) {
        if let Some(segment) = self.current_mut() {
            segment.insert(field.name, Entry::Sequence(vec![Segment::new(); length]));
        }
    }

    fn lock(&mut self, field: &Field<'_>) -> bool {
        let Some(segment) = self.current_mut() else {
            return false;
        };
        let known = match field.index {
            None => {
                if !matches!(segment.entry(field.name), Some(Entry::Group(_))) {
                    segment.insert(field.name, Entry::Group(Segment::new()));
                }
                true
            }
            Some(i) => matches!(segment.entry(field.name), Some(Entry::Sequence(s)) if i < s.len()),
        };
        if known {
            self.push(field);
        }
        known
    }

    fn unlock(&mut self) {
        self.cursor.pop();
    }
}

impl MessageSender for Message {
    fn template_id(&self) -> u32 {
        self.template_id
    }

    fn value(&mut self, field: &Field<'_>) -> Result<Value> {
        Ok(self
            .current()
            .and_then(|segment| segment.value(field.name))
            .cloned()
            .unwrap_or_default())
    }

    fn length(&mut self, field: &Field<'_>) -> Option<usize> {
        self.current()
            .and_then(|segment| segment.sequence(field.name))
            .map(<[Segment]>::len)
    }

    fn lock(&mut self, field: &Field<'_>) -> bool {
        let known = match (self.current().and_then(|s| s.entry(field.name)), field.index) {
            (Some(Entry::Group(_)), None) => true,
            (Some(Entry::Sequence(s)), Some(i)) => i < s.len(),
            _ => false,
        };
        if known {
            self.push(field);
        }
        known
    }

    fn unlock(&mut self) {
        self.cursor.pop();
    }
}
