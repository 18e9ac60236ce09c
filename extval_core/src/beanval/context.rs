//! Per-request group and model-validation bookkeeping

use super::model_validation::ModelValidationEntry;
use crate::models::DEFAULT_GROUP;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default, Clone)]
struct GroupSets {
    active: Vec<String>,
    restricted: Vec<String>,
}

/// Groups per (view, component) and queued model validations per view.
///
/// Lives inside one request context and is dropped with it.
#[derive(Debug, Default)]
pub struct BeanValidationContext {
    groups: HashMap<(String, String), GroupSets>,
    model_entries: HashMap<String, Vec<ModelValidationEntry>>,
}

impl BeanValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, group: &str, view_id: &str, client_id: &str) {
        let sets = self.sets_mut(view_id, client_id);
        push_unique(&mut sets.active, group);
    }

    pub fn restrict_group(&mut self, group: &str, view_id: &str, client_id: &str) {
        let sets = self.sets_mut(view_id, client_id);
        push_unique(&mut sets.restricted, group);
    }

    /// Active groups minus restricted ones. Without explicitly added groups
    /// the default group is active. An empty result means nothing to validate.
    pub fn groups(&self, view_id: &str, client_id: &str) -> Vec<String> {
        let sets = self
            .groups
            .get(&(view_id.to_string(), client_id.to_string()))
            .cloned()
            .unwrap_or_default();

        let active = if sets.active.is_empty() {
            vec![DEFAULT_GROUP.to_string()]
        } else {
            sets.active
        };

        active
            .into_iter()
            .filter(|group| !sets.restricted.contains(group))
            .collect()
    }

    /// Queues a model validation. Entries with the same source object, groups
    /// and controller are queued once.
    pub fn add_model_validation_entry(&mut self, entry: ModelValidationEntry, view_id: &str) {
        let queued = self.model_entries.entry(view_id.to_string()).or_default();
        let duplicate = queued.iter().any(|existing| {
            Arc::ptr_eq(&existing.source, &entry.source)
                && existing.groups == entry.groups
                && existing.meta_data == entry.meta_data
        });

        if duplicate {
            trace!(view_id, source = %entry.source.type_name, "Model validation already queued");
            return;
        }
        queued.push(entry);
    }

    pub fn has_model_validation_entries(&self, view_id: &str) -> bool {
        self.model_entries.get(view_id).is_some_and(|entries| !entries.is_empty())
    }

    /// Removes and returns the entries queued for a view.
    pub fn take_model_validation_entries(&mut self, view_id: &str) -> Vec<ModelValidationEntry> {
        self.model_entries.remove(view_id).unwrap_or_default()
    }

    fn sets_mut(&mut self, view_id: &str, client_id: &str) -> &mut GroupSets {
        self.groups
            .entry((view_id.to_string(), client_id.to_string()))
            .or_default()
    }
}

fn push_unique(groups: &mut Vec<String>, group: &str) {
    if !groups.iter().any(|existing| existing == group) {
        groups.push(group.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::BeanValidation;
    use crate::models::{Bean, InputComponent};

    fn model_entry(source: &Arc<Bean>, groups: &[&str]) -> ModelValidationEntry {
        ModelValidationEntry {
            groups: groups.iter().map(|group| group.to_string()).collect(),
            meta_data: BeanValidation::default(),
            source: Arc::clone(source),
            default_target: Arc::clone(source),
            identity: InputComponent::new("form:name").identity(),
        }
    }

    #[test]
    fn test_groups_default_and_restriction() {
        let mut context = BeanValidationContext::new();
        assert_eq!(context.groups("/a.xhtml", "form:name"), vec![DEFAULT_GROUP]);

        context.add_group("Address", "/a.xhtml", "form:name");
        context.add_group("Address", "/a.xhtml", "form:name");
        context.add_group("Billing", "/a.xhtml", "form:name");
        context.restrict_group("Billing", "/a.xhtml", "form:name");
        assert_eq!(context.groups("/a.xhtml", "form:name"), vec!["Address"]);
        assert_eq!(context.groups("/b.xhtml", "form:name"), vec![DEFAULT_GROUP]);

        context.restrict_group(DEFAULT_GROUP, "/b.xhtml", "form:name");
        assert!(context.groups("/b.xhtml", "form:name").is_empty());
    }

    #[test]
    fn test_model_entries_are_deduplicated() {
        let mut context = BeanValidationContext::new();
        let source = Arc::new(Bean::new("Registration"));

        context.add_model_validation_entry(model_entry(&source, &["Default", "Complete"]), "/a.xhtml");
        context.add_model_validation_entry(model_entry(&source, &["Default", "Complete"]), "/a.xhtml");
        context.add_model_validation_entry(model_entry(&source, &["Complete"]), "/a.xhtml");

        assert!(context.has_model_validation_entries("/a.xhtml"));
        assert!(!context.has_model_validation_entries("/b.xhtml"));
        let entries = context.take_model_validation_entries("/a.xhtml");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].groups, vec!["Default", "Complete"]);

        assert!(context.take_model_validation_entries("/a.xhtml").is_empty());
    }
}
