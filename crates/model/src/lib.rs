//! # Clientlib Model
//!
//! Identity model shared by the resolution engine and the delivery gate.
//!
//! ## Architecture
//!
//! ```text
//! Key  (type + path + properties)     canonical identity, dedup
//!  ├── Ref   declared reference        rule | category | external URI
//!  │    └── ResolvedRef                ref + reused alternative (if any)
//!  └── Link  rendered artifact         identity + minified/hash variant
//! ```
//!
//! `minified` and the content hash are rendering variants: they shape the
//! public URL of a [`Link`] but never its identity.

mod error;
mod key;
mod kind;
mod link;
mod reference;
mod rule;

pub use error::{ModelError, Result};
pub use key::{Key, Properties, REL_PROPERTY};
pub use kind::ClientlibType;
pub use link::{minified_path, rendered_path, Link, LinkTarget};
pub use reference::{DependsMode, Ref, RefTarget, ResolvedRef, CATEGORY_PREFIX};
pub use rule::Rule;

/// True for references that point outside the resource tree.
#[must_use]
pub fn is_external_uri(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with("//")
}
