/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Template registry keyed by template id.

use crate::schema::Template;
use ironfast_core::SchemaError;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only set of templates shared by decoders and encoders.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<u32, Arc<Template>>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a list of templates.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateTemplate` if two templates share an id.
    pub fn from_templates(
        templates: impl IntoIterator<Item = Template>,
    ) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for template in templates {
            registry.register(template)?;
        }
        Ok(registry)
    }

    /// Adds a template.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateTemplate` if the id is already registered.
    pub fn register(&mut self, template: Template) -> Result<(), SchemaError> {
        let id = template.id();
        if self.templates.contains_key(&id) {
            return Err(SchemaError::DuplicateTemplate(id));
        }
        self.templates.insert(id, Arc::new(template));
        Ok(())
    }

    /// Gets a template by id.
    #[inline]
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Arc<Template>> {
        self.templates.get(&id)
    }

    /// Returns true if a template with the given id is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.templates.contains_key(&id)
    }

    /// Returns an iterator over all templates.
    pub fn templates(&self) -> impl Iterator<Item = &Arc<Template>> {
        self.templates.values()
    }

    /// Returns the number of templates.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no template is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Instruction;

    fn template(id: u32) -> Template {
        Template::new(id, format!("T{id}"), vec![Instruction::uint32(1, "A")]).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TemplateRegistry::from_templates([template(1), template(2)]).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(2));
        assert_eq!(registry.get(1).unwrap().name(), "T1");
        assert!(registry.get(999).is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = TemplateRegistry::new();
        registry.register(template(7)).unwrap();
        assert_eq!(
            registry.register(template(7)),
            Err(SchemaError::DuplicateTemplate(7))
        );
        assert_eq!(registry.len(), 1);
    }
}
