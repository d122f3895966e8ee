//! # Clientlib Protocol
//!
//! The public URL scheme used to deliver clientlib bundles.
//!
//! ```text
//! direct asset:  {resource}[.min].{ext}[/{hash}/{filename}]
//! category:      {category_path}[.min].{ext}[/{hash}]/{category}.{ext}
//! ```
//!
//! Everything here is pure string work: no resource tree, no I/O. The
//! delivery gate decodes request paths with [`RequestPathInfo`] and the
//! suffix helpers, and the engine encodes bundle URLs with the inverse
//! functions.

mod error;
mod path_info;
mod suffix;

pub use error::{AddressError, Result};
pub use path_info::{is_minified, RequestPathInfo, MIN_SELECTOR};
pub use suffix::{
    append_hash_suffix, category_suffix, parse_category_and_hash_from_suffix,
    parse_hash_from_suffix, sanitize_category, CategoryAddress,
};

/// Default servlet path for category bundles.
pub const DEFAULT_CATEGORY_PATH: &str = "/bin/public/clientlibs";

/// Extension used by browsers probing for source maps.
pub const SOURCE_MAP_EXTENSION: &str = "map";
