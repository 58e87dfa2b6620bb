//! Template lookup contract and an in-memory implementation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub trigger: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
}

impl Template {
    /// A new template with a fresh id and no category.
    pub fn new(name: impl Into<String>, trigger: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            trigger: trigger.into(),
            content: content.into(),
            category_id: None,
        }
    }
}

/// Where the pipeline finds templates.
pub trait TemplateStore {
    fn find_by_trigger(&self, trigger: &str, case_sensitive: bool) -> Option<Template>;

    fn find_by_id(&self, id: Uuid) -> Option<Template>;

    /// Inserts or replaces by id. Triggers must be non-empty and unique
    /// (case-insensitively) across the store.
    fn save(&mut self, template: Template) -> Result<(), StoreError>;

    /// True if another template, not `exclude`, uses `trigger` in any case.
    fn exists_by_trigger(&self, trigger: &str, exclude: Option<Uuid>) -> bool;

    /// Templates whose trigger equals `trigger` case-insensitively or is a
    /// prefix of it (or it of them), ignoring `exclude`.
    fn find_trigger_conflicts(&self, trigger: &str, exclude: Option<Uuid>) -> Vec<Template>;

    /// Every known trigger, as needed by immediate detection.
    fn triggers(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateStore {
    templates: Vec<Template>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store, rejecting the first template that would not save.
    pub fn from_templates(templates: impl IntoIterator<Item = Template>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for template in templates {
            store.save(template)?;
        }
        Ok(store)
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Template> {
        let index = self.templates.iter().position(|t| t.id == id)?;
        Some(self.templates.remove(index))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn others(&self, exclude: Option<Uuid>) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter(move |t| Some(t.id) != exclude)
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn find_by_trigger(&self, trigger: &str, case_sensitive: bool) -> Option<Template> {
        self.templates
            .iter()
            .find(|t| {
                if case_sensitive {
                    t.trigger == trigger
                } else {
                    t.trigger.to_lowercase() == trigger.to_lowercase()
                }
            })
            .cloned()
    }

    fn find_by_id(&self, id: Uuid) -> Option<Template> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    fn save(&mut self, template: Template) -> Result<(), StoreError> {
        if template.trigger.trim().is_empty() {
            return Err(StoreError::EmptyTrigger(template.id));
        }
        let wanted = template.trigger.to_lowercase();
        if let Some(existing) = self
            .others(Some(template.id))
            .find(|t| t.trigger.to_lowercase() == wanted)
        {
            return Err(StoreError::DuplicateTrigger {
                trigger: template.trigger,
                existing: existing.id,
            });
        }
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(slot) => *slot = template,
            None => self.templates.push(template),
        }
        Ok(())
    }

    fn exists_by_trigger(&self, trigger: &str, exclude: Option<Uuid>) -> bool {
        let wanted = trigger.to_lowercase();
        self.others(exclude).any(|t| t.trigger.to_lowercase() == wanted)
    }

    fn find_trigger_conflicts(&self, trigger: &str, exclude: Option<Uuid>) -> Vec<Template> {
        let wanted = trigger.to_lowercase();
        self.others(exclude)
            .filter(|t| {
                let theirs = t.trigger.to_lowercase();
                theirs.starts_with(&wanted) || wanted.starts_with(&theirs)
            })
            .cloned()
            .collect()
    }

    fn triggers(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.trigger.clone()).collect()
    }
}
