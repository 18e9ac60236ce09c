use super::entry::MetaDataEntry;
use crate::error::{ExtValError, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Side-table key for the resolved [`super::PropertyDetails`].
pub const PROPERTY_DETAILS: &str = "property_details";

/// Side-table key for the violations of the last validation run.
pub const CONSTRAINT_VIOLATIONS: &str = "constraint_violations";

/// Everything known about one property: its metadata entries in discovery
/// order and a side-table of typed attributes.
#[derive(Default)]
pub struct PropertyInformation {
    entries: Vec<MetaDataEntry>,
    information: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl PropertyInformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: MetaDataEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MetaDataEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut Vec<MetaDataEntry> {
        &mut self.entries
    }

    pub fn into_entries(self) -> Vec<MetaDataEntry> {
        self.entries
    }

    pub fn retain_entries(&mut self, keep: impl FnMut(&MetaDataEntry) -> bool) {
        self.entries.retain(keep);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_information<T: Any + Send + Sync>(&mut self, key: &'static str, value: T) {
        self.information.insert(key, Box::new(value));
    }

    pub fn contains_information(&self, key: &str) -> bool {
        self.information.contains_key(key)
    }

    /// `None` when absent or stored with a different type.
    pub fn information<T: Any>(&self, key: &str) -> Option<&T> {
        self.information.get(key).and_then(|value| (**value).downcast_ref::<T>())
    }

    pub fn require_information<T: Any>(&self, key: &'static str) -> Result<&T> {
        self.information::<T>(key).ok_or(ExtValError::UnexpectedMetaDataType {
            expected: key,
            found: if self.contains_information(key) {
                "value of another type".to_string()
            } else {
                "nothing".to_string()
            },
        })
    }
}

impl fmt::Debug for PropertyInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.information.keys().collect();
        keys.sort();
        f.debug_struct("PropertyInformation")
            .field("entries", &self.entries)
            .field("information", &keys)
            .finish()
    }
}
