use std::collections::BTreeMap;

use serde_json::Value;

/// Identifiers created per fixture name, in creation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: BTreeMap<String, Vec<Value>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `ids` under `name`.
    pub fn record(&mut self, name: &str, ids: impl IntoIterator<Item = Value>) {
        let mut ids = ids.into_iter().peekable();
        if ids.peek().is_none() {
            return;
        }
        self.entries.entry(name.to_string()).or_default().extend(ids);
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop ids that were cleared from the store.
    ///
    /// `cleared` must be a prefix of the current entry; ids appended after the
    /// snapshot was taken stay recorded.
    pub fn release(&mut self, name: &str, cleared: &[Value]) {
        let Some(ids) = self.entries.get_mut(name) else {
            return;
        };
        if !ids.starts_with(cleared) {
            return;
        }
        ids.drain(..cleared.len());
        if ids.is_empty() {
            self.entries.remove(name);
        }
    }
}
