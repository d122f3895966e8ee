use crate::key::{Key, Properties};
use crate::kind::ClientlibType;
use clientlib_protocol::{append_hash_suffix, category_suffix};
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// How a link is addressed publicly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum LinkTarget {
    /// A clientlib, folder or file inside the resource tree
    Resource,
    /// A category bundle served under `servlet_path`
    Category { servlet_path: String, name: String },
    /// A URL outside the tree
    External,
}

/// Resolved, concrete identity of a rendered output.
///
/// Identity is the [`Key`] alone: `minified` and `hash` only shape
/// [`Link::url`].
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    key: Key,
    target: LinkTarget,
    minified: bool,
    hash: Option<String>,
}

impl Link {
    /// Link to a resource path. The type's extension is appended unless the
    /// type has none or the path already carries it; `minified` is dropped
    /// when the path already names a minified artifact.
    pub fn resource(
        kind: ClientlibType,
        path: &str,
        properties: Properties,
        minified: bool,
    ) -> Self {
        let rendered = rendered_path(kind, path);
        let minified = minified && minified_path(kind, &rendered) != rendered;
        Self {
            key: Key::new(kind, rendered, properties),
            target: LinkTarget::Resource,
            minified,
            hash: None,
        }
    }

    pub fn category(
        kind: ClientlibType,
        servlet_path: &str,
        name: &str,
        properties: Properties,
        minified: bool,
    ) -> Self {
        Self {
            key: Key::new(kind, format!("category:{name}"), properties),
            target: LinkTarget::Category {
                servlet_path: servlet_path.to_string(),
                name: name.to_string(),
            },
            minified: minified && kind.is_bundled(),
            hash: None,
        }
    }

    pub fn external(kind: ClientlibType, uri: &str, properties: Properties) -> Self {
        Self {
            key: Key::new(kind, uri, properties),
            target: LinkTarget::External,
            minified: false,
            hash: None,
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        self.hash = (!hash.is_empty()).then_some(hash);
        self
    }

    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> ClientlibType {
        self.key.kind()
    }

    /// Repository path (or URI) without rendering variants.
    #[must_use]
    pub fn path(&self) -> &str {
        self.key.path()
    }

    #[must_use]
    pub fn properties(&self) -> &Properties {
        self.key.properties()
    }

    #[must_use]
    pub fn target(&self) -> &LinkTarget {
        &self.target
    }

    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        match &self.target {
            LinkTarget::Category { name, .. } => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_minified(&self) -> bool {
        self.minified
    }

    /// Unmapped public URL including the minified selector and hash suffix.
    #[must_use]
    pub fn url(&self) -> String {
        let kind = self.kind();
        match &self.target {
            LinkTarget::External => self.path().to_string(),
            LinkTarget::Resource => {
                let base = if self.minified {
                    minified_path(kind, self.path())
                } else {
                    self.path().to_string()
                };
                match (&self.hash, kind.is_bundled()) {
                    (Some(hash), true) => append_hash_suffix(&base, hash),
                    _ => base,
                }
            }
            LinkTarget::Category { servlet_path, name } => {
                let ext = kind.extension().unwrap_or(kind.as_str());
                let selector = if self.minified { ".min" } else { "" };
                let base = format!("{servlet_path}{selector}.{ext}");
                match category_suffix(name, ext, self.hash.as_deref()) {
                    Some(suffix) => format!("{base}{suffix}"),
                    None => base,
                }
            }
        }
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Resource path with the type extension appended where it applies.
#[must_use]
pub fn rendered_path(kind: ClientlibType, path: &str) -> String {
    match kind.extension() {
        Some(ext) if !path.ends_with(&format!(".{ext}")) => format!("{path}.{ext}"),
        _ => path.to_string(),
    }
}

/// `name.ext` → `name.min.ext`; already minified paths are returned as is.
#[must_use]
pub fn minified_path(kind: ClientlibType, path: &str) -> String {
    let Some(ext) = kind.extension() else {
        return path.to_string();
    };
    let dotted = format!(".{ext}");
    if path.ends_with(&format!(".min{dotted}")) {
        return path.to_string();
    }
    match path.strip_suffix(&dotted) {
        Some(stem) => format!("{stem}.min{dotted}"),
        None => format!("{path}.min{dotted}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minified_is_not_part_of_identity() {
        let plain = Link::resource(ClientlibType::Js, "/libs/app/main", Properties::new(), false);
        let min = Link::resource(ClientlibType::Js, "/libs/app/main", Properties::new(), true);
        assert_eq!(plain, min);
        assert_eq!(plain.key(), min.key());
        assert_eq!(plain.url(), "/libs/app/main.js");
        assert_eq!(min.url(), "/libs/app/main.min.js");
    }

    #[test]
    fn extension_is_not_duplicated() {
        let link = Link::resource(ClientlibType::Css, "/libs/x/site.css", Properties::new(), false);
        assert_eq!(link.path(), "/libs/x/site.css");
        let img = Link::resource(ClientlibType::Img, "/libs/x/logo.png", Properties::new(), true);
        assert_eq!(img.path(), "/libs/x/logo.png");
        assert!(!img.is_minified());
    }

    #[test]
    fn premininified_path_is_not_minified_again() {
        let link = Link::resource(ClientlibType::Js, "/libs/x/lib.min.js", Properties::new(), true);
        assert!(!link.is_minified());
        assert_eq!(link.url(), "/libs/x/lib.min.js");
    }

    #[test]
    fn hash_suffix_on_resource_links() {
        let link = Link::resource(ClientlibType::Css, "/libs/lib", Properties::new(), true)
            .with_hash("deadbeef");
        assert_eq!(link.url(), "/libs/lib.min.css/deadbeef/lib.min.css");
    }

    #[test]
    fn category_links_append_extension_and_suffix() {
        let link = Link::category(
            ClientlibType::Js,
            "/bin/public/clientlibs",
            "mybundle",
            Properties::new(),
            false,
        )
        .with_hash("a1b2c3");
        assert_eq!(link.url(), "/bin/public/clientlibs.js/a1b2c3/mybundle.js");
        assert_eq!(link.category_name(), Some("mybundle"));

        let min = Link::category(
            ClientlibType::Js,
            "/bin/public/clientlibs",
            "mybundle",
            Properties::new(),
            true,
        );
        assert_eq!(min, link);
        assert_eq!(min.url(), "/bin/public/clientlibs.min.js/mybundle.js");
    }

    #[test]
    fn external_links_are_verbatim() {
        let link = Link::external(ClientlibType::Js, "https://cdn.example.com/x.js", Properties::new());
        assert_eq!(link.url(), "https://cdn.example.com/x.js");
    }
}
