//! Credential map submitted for validation

use common::Secret;
use std::collections::{BTreeMap, HashMap};

/// Field id -> credential value. Values stay wrapped in [`Secret`] so the map
/// can be logged or debugged without leaking keys.
#[derive(Debug, Clone, Default)]
pub struct Credentials(BTreeMap<String, Secret<String>>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), Secret::new(value.into()));
    }

    /// Raw value for a field, if supplied.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|secret| secret.expose().as_str())
    }

    /// True when the field is supplied with a non-empty value.
    pub fn is_present(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|secret| !secret.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut credentials = Credentials::new();
        for (field, value) in iter {
            credentials.insert(field, value);
        }
        credentials
    }
}

impl From<HashMap<String, String>> for Credentials {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}
