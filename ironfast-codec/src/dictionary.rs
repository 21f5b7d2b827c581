/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Operator dictionary.
//!
//! Holds the previous value of every field with a stateful operator. A key
//! that was never written is *undefined* (`load` returns `None`); a key
//! holding [`Value::Absent`] is *empty*, which operators treat differently.
//!
//! Writes made between [`Dictionary::begin`] and [`Dictionary::commit`] are
//! journaled so a message that fails part way can be undone with
//! [`Dictionary::rollback`].

use ironfast_core::{DictionaryScope, Value};
use std::collections::HashMap;

/// Previous-value store for one decoder or encoder session.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    /// Global dictionary shared across all templates.
    global: HashMap<String, Value>,
    /// Template-specific dictionaries.
    templates: HashMap<u32, HashMap<String, Value>>,
    /// Prior contents of the slots written by the open message.
    journal: Vec<Undo>,
    recording: bool,
}

#[derive(Debug, Clone)]
struct Undo {
    scope: DictionaryScope,
    template_id: u32,
    key: String,
    previous: Option<Value>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the previous value of a field.
    ///
    /// # Arguments
    /// * `scope` - Dictionary scope declared by the instruction
    /// * `template_id` - Template being processed
    /// * `key` - Instruction dictionary key
    ///
    /// # Returns
    /// `None` if the entry is undefined.
    #[must_use]
    pub fn load(&self, scope: DictionaryScope, template_id: u32, key: &str) -> Option<&Value> {
        match scope {
            DictionaryScope::Global => self.global.get(key),
            DictionaryScope::Template => self
                .templates
                .get(&template_id)
                .and_then(|dict| dict.get(key)),
        }
    }

    /// Stores the value of a field.
    pub fn save(&mut self, scope: DictionaryScope, template_id: u32, key: &str, value: Value) {
        let dict = self.scope_mut(scope, template_id);
        let previous = match dict.get_mut(key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                dict.insert(key.to_owned(), value);
                None
            }
        };
        if self.recording {
            self.journal.push(Undo {
                scope,
                template_id,
                key: key.to_owned(),
                previous,
            });
        }
    }

    fn scope_mut(
        &mut self,
        scope: DictionaryScope,
        template_id: u32,
    ) -> &mut HashMap<String, Value> {
        match scope {
            DictionaryScope::Global => &mut self.global,
            DictionaryScope::Template => self.templates.entry(template_id).or_default(),
        }
    }

    /// Starts journaling writes for one message.
    pub fn begin(&mut self) {
        self.journal.clear();
        self.recording = true;
    }

    /// Keeps the writes made since [`Dictionary::begin`].
    pub fn commit(&mut self) {
        self.journal.clear();
        self.recording = false;
    }

    /// Undoes the writes made since [`Dictionary::begin`], newest first.
    pub fn rollback(&mut self) {
        self.recording = false;
        while let Some(undo) = self.journal.pop() {
            let dict = self.scope_mut(undo.scope, undo.template_id);
            match undo.previous {
                Some(value) => {
                    dict.insert(undo.key, value);
                }
                None => {
                    dict.remove(&undo.key);
                }
            }
        }
    }

    /// Clears every entry, as on a fresh session.
    pub fn reset(&mut self) {
        self.global.clear();
        self.templates.clear();
        self.journal.clear();
        self.recording = false;
    }

    /// Returns the number of defined entries across all scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.global.len() + self.templates.values().map(HashMap::len).sum::<usize>()
    }

    /// Returns true if no entry is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
