//! Resource tree collaborator.
//!
//! The engine never owns asset storage. It reads a tree of resources
//! (folders with properties, files with bytes) through [`ResourceTree`];
//! [`FsTree`] maps a directory onto it and [`MemoryTree`] builds one in
//! memory.

mod fs;
mod memory;

pub use fs::{FsTree, PROPERTIES_FILE};
pub use memory::MemoryTree;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of `kind` marking a folder as a clientlib root
pub const CLIENTLIB_KIND: &str = "clientlib";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Folder,
    File,
}

/// One node of the resource tree
#[derive(Debug, Clone)]
pub struct Resource {
    pub path: String,
    pub kind: ResourceKind,
    pub properties: ResourceProperties,
}

impl Resource {
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == ResourceKind::File
    }

    #[must_use]
    pub fn is_clientlib(&self) -> bool {
        self.kind == ResourceKind::Folder
            && self.properties.kind.as_deref() == Some(CLIENTLIB_KIND)
    }
}

/// Properties of a folder resource (`.content.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceProperties {
    /// `clientlib` for bundle roots
    pub kind: Option<String>,

    /// Categories a clientlib contributes to
    pub category: Vec<String>,

    /// Rank inside a category
    pub order: i64,

    /// References inlined into this folder's output
    pub embed: Vec<Declaration>,

    /// References delivered separately before this folder's output
    pub depends: Vec<Declaration>,

    /// Default `optional` flag of the references above
    pub optional: bool,

    /// Deliver unminified and uncombined
    pub expanded: bool,

    /// Explicit child order; unlisted children follow by name
    pub child_order: Vec<String>,
}

/// A reference as declared in `embed` / `depends`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Declaration {
    Rule(String),
    Detailed {
        rule: String,
        #[serde(default)]
        optional: Option<bool>,
        #[serde(default)]
        properties: BTreeMap<String, String>,
    },
}

impl Declaration {
    #[must_use]
    pub fn rule(&self) -> &str {
        match self {
            Self::Rule(rule) | Self::Detailed { rule, .. } => rule,
        }
    }

    #[must_use]
    pub fn optional(&self) -> Option<bool> {
        match self {
            Self::Rule(_) => None,
            Self::Detailed { optional, .. } => *optional,
        }
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        let props = match self {
            Self::Rule(_) => None,
            Self::Detailed { properties, .. } => Some(properties),
        };
        props
            .into_iter()
            .flat_map(|p| p.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Read access to the asset tree. Paths are absolute, `/`-separated.
pub trait ResourceTree: Send + Sync {
    fn resource(&self, path: &str) -> Result<Option<Resource>>;

    /// Children in delivery order.
    fn children(&self, path: &str) -> Result<Vec<Resource>>;

    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Every clientlib root in the tree.
    fn clientlibs(&self) -> Result<Vec<Resource>>;

    fn is_file(&self, path: &str) -> bool {
        matches!(self.resource(path), Ok(Some(r)) if r.is_file())
    }
}

/// Sort children by `child_order`, then by name.
pub(crate) fn order_children(children: &mut [Resource], child_order: &[String]) {
    children.sort_by(|a, b| {
        let rank = |r: &Resource| {
            child_order
                .iter()
                .position(|n| n == r.name())
                .unwrap_or(usize::MAX)
        };
        rank(a).cmp(&rank(b)).then_with(|| a.name().cmp(b.name()))
    });
}

/// Normalize a request path; `None` for paths escaping the root.
pub(crate) fn normalize_path(path: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            other => parts.push(other),
        }
    }
    Some(format!("/{}", parts.join("/")))
}
