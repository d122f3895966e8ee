use crate::kind::ClientlibType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Property normalized on insert (link relation)
pub const REL_PROPERTY: &str = "rel";

/// Insertion-ordered property bag.
///
/// Equality and hashing ignore insertion order; `Display` keeps it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an existing value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut value = value.into();
        if name == REL_PROPERTY {
            value = normalize_rel(&value);
        }
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn sorted(&self) -> Vec<&(String, String)> {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort();
        entries
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.sorted() == other.sorted()
    }
}

impl Eq for Properties {}

impl Hash for Properties {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted().hash(state);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (name, value) in iter {
            props.insert(name, value);
        }
        props
    }
}

fn normalize_rel(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical identity of a referenceable clientlib element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    kind: ClientlibType,
    path: String,
    properties: Properties,
}

impl Key {
    pub fn new(kind: ClientlibType, path: impl Into<String>, properties: Properties) -> Self {
        Self {
            kind,
            path: path.into(),
            properties,
        }
    }

    pub fn bare(kind: ClientlibType, path: impl Into<String>) -> Self {
        Self::new(kind, path, Properties::new())
    }

    #[must_use]
    pub fn kind(&self) -> ClientlibType {
        self.kind
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.path)?;
        for (name, value) in self.properties.iter() {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}
