use std::collections::{BTreeMap, HashMap};

use crate::process::Interrupt;

/// Anything that build properties can be written into.
pub trait PropertyStore {
    fn set_property(&mut self, key: &str, value: &str);
}

impl PropertyStore for HashMap<String, String> {
    fn set_property(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

impl PropertyStore for BTreeMap<String, String> {
    fn set_property(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// String-keyed properties, kept sorted so listings are stable.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl PropertyStore for Properties {
    fn set_property(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// One build session as seen by lifecycle participants.
#[derive(Debug, Default)]
pub struct Session {
    system_properties: Properties,
    interrupt: Interrupt,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session whose waits can be cancelled through `interrupt`.
    pub fn with_interrupt(interrupt: Interrupt) -> Self {
        Self {
            system_properties: Properties::new(),
            interrupt,
        }
    }

    pub fn system_properties(&self) -> &Properties {
        &self.system_properties
    }

    pub fn system_properties_mut(&mut self) -> &mut Properties {
        &mut self.system_properties
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }
}
