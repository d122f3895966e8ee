use crate::error::{ModelError, Result};
use crate::is_external_uri;
use crate::key::{Key, Properties};
use crate::kind::ClientlibType;
use crate::link::Link;
use crate::rule::Rule;
use clientlib_protocol::sanitize_category;
use serde::{Deserialize, Serialize};

/// Declaration prefix of category references (`category:jquery`)
pub const CATEGORY_PREFIX: &str = "category:";

/// How a reference wants its target delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependsMode {
    /// Inlined into the requesting bundle
    Embedded,
    /// Delivered as a separate artifact loaded before the requester
    Depends,
    /// Whatever the enclosing traversal is doing
    #[default]
    Inherit,
}

/// What a reference points at
#[derive(Debug, Clone)]
pub enum RefTarget {
    Rule(Rule),
    Category(String),
    External(String),
}

/// Reference to a wanted element: a rule, a category or an external URI
#[derive(Debug, Clone)]
pub struct Ref {
    key: Key,
    target: RefTarget,
    depends: DependsMode,
    optional: bool,
}

impl Ref {
    /// Parse a declaration (`category:name`, `https://...` or a rule).
    pub fn parse(
        kind: ClientlibType,
        declaration: &str,
        depends: DependsMode,
        optional: bool,
        properties: Properties,
    ) -> Result<Self> {
        let declaration = declaration.trim();
        if let Some(name) = declaration.strip_prefix(CATEGORY_PREFIX) {
            let name = sanitize_category(name)
                .ok_or_else(|| ModelError::InvalidCategory(declaration.to_string()))?;
            return Ok(Self {
                key: Key::new(kind, format!("{CATEGORY_PREFIX}{name}"), properties),
                target: RefTarget::Category(name),
                depends,
                optional,
            });
        }
        if is_external_uri(declaration) {
            return Ok(Self {
                key: Key::new(kind, declaration, properties),
                target: RefTarget::External(declaration.to_string()),
                depends,
                optional,
            });
        }
        let rule = Rule::compile(declaration)?;
        Ok(Self {
            key: Key::new(kind, rule.source(), properties),
            target: RefTarget::Rule(rule),
            depends,
            optional,
        })
    }

    /// Reference to a category requested directly.
    pub fn category(kind: ClientlibType, name: &str) -> Result<Self> {
        Self::parse(
            kind,
            &format!("{CATEGORY_PREFIX}{name}"),
            DependsMode::Inherit,
            false,
            Properties::new(),
        )
    }

    /// Reference to a resource path requested directly.
    pub fn path(kind: ClientlibType, path: &str) -> Result<Self> {
        Self::parse(kind, path, DependsMode::Inherit, false, Properties::new())
    }

    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> ClientlibType {
        self.key.kind()
    }

    #[must_use]
    pub fn target(&self) -> &RefTarget {
        &self.target
    }

    #[must_use]
    pub fn depends(&self) -> DependsMode {
        self.depends
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[must_use]
    pub fn properties(&self) -> &Properties {
        self.key.properties()
    }

    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Category(name) => Some(name),
            _ => None,
        }
    }

    /// Path to render when nothing already rendered satisfies the rule.
    #[must_use]
    pub fn preferred_path(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Rule(rule) => Some(rule.preferred()),
            RefTarget::External(uri) => Some(uri),
            RefTarget::Category(_) => None,
        }
    }

    /// True when `link` satisfies this reference.
    #[must_use]
    pub fn matches(&self, link: &Link) -> bool {
        if link.kind() != self.kind() {
            return false;
        }
        match &self.target {
            RefTarget::Rule(rule) => rule.matches(link.path()),
            RefTarget::Category(name) => link.category_name() == Some(name.as_str()),
            RefTarget::External(uri) => link.path() == uri,
        }
    }

    /// Offer every candidate in order; the first match becomes the used
    /// alternative.
    pub fn resolve<'a>(&self, candidates: impl IntoIterator<Item = &'a Link>) -> ResolvedRef {
        candidates
            .into_iter()
            .fold(ResolvedRef::unresolved(self.clone()), ResolvedRef::offer)
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.depends == other.depends && self.optional == other.optional
    }
}

impl Eq for Ref {}

/// A reference together with the already-rendered link it reuses, if any
#[derive(Debug, Clone)]
pub struct ResolvedRef {
    reference: Ref,
    used_alternative: Option<Link>,
}

impl ResolvedRef {
    #[must_use]
    pub fn unresolved(reference: Ref) -> Self {
        Self {
            reference,
            used_alternative: None,
        }
    }

    /// Record `candidate` if it matches and nothing was recorded before.
    #[must_use]
    pub fn offer(self, candidate: &Link) -> Self {
        if self.used_alternative.is_some() || !self.reference.matches(candidate) {
            return self;
        }
        Self {
            used_alternative: Some(candidate.clone()),
            ..self
        }
    }

    #[must_use]
    pub fn reference(&self) -> &Ref {
        &self.reference
    }

    #[must_use]
    pub fn is_alternative_used(&self) -> bool {
        self.used_alternative.is_some()
    }

    #[must_use]
    pub fn used_alternative(&self) -> Option<&Link> {
        self.used_alternative.as_ref()
    }
}
