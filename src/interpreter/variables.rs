//! Variable store
//!
//! Case-insensitive name → value map. Every mutation goes through
//! [`VariableStore::set`], which publishes exactly one `VariableChanged` event.

use super::events::{Event, EventBus};
use super::types::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    vars: BTreeMap<String, Value>,
}

/// Canonical form of a variable name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(&normalize_name(name))
    }

    /// Assign a variable and publish the change
    pub fn set(&mut self, name: &str, value: Value, bus: &mut EventBus) {
        let name = normalize_name(name);
        self.vars.insert(name.clone(), value.clone());
        bus.emit(Event::VariableChanged { name, value });
    }

    /// Variable names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.vars.clone()
    }

    pub(crate) fn clear(&mut self) {
        self.vars.clear();
    }

    /// Replace every `*NAME*` whose NAME is a known variable with its value
    ///
    /// Tokens are matched whole, so `*AB*` never resolves through a shorter
    /// `A`. Asterisks that do not delimit a known name are kept verbatim.
    pub fn interpolate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('*') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let resolved = after.find('*').and_then(|close| {
                let name = &after[..close];
                let value = (!name.trim().is_empty() && name.trim() == name)
                    .then(|| self.get(name))
                    .flatten()?;
                Some((value.to_string(), close))
            });
            match resolved {
                Some((value, close)) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('*');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
