use crate::error::Result;
use crate::visitor::{VisitMode, Visitor};
use clientlib_model::{ClientlibType, Key, Link, Properties, Ref, CATEGORY_PREFIX};

/// Bundle root: one folder per rendered type
#[derive(Debug, Clone)]
pub struct Clientlib {
    pub kind: ClientlibType,
    pub path: String,
    pub categories: Vec<String>,
    pub order: i64,
    pub folder: Option<ResourceFolder>,
}

impl Clientlib {
    #[must_use]
    pub fn key(&self) -> Key {
        Key::bare(self.kind, self.path.clone())
    }

    /// Tie-break label inside a category.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn link(&self, minified: bool) -> Link {
        Link::resource(self.kind, &self.path, Properties::new(), minified)
    }
}

/// Directory-like container of files, nested folders and references
#[derive(Debug, Clone)]
pub struct ResourceFolder {
    pub kind: ClientlibType,
    pub path: String,
    pub children: Vec<Element>,
    pub embedded: Vec<Ref>,
    pub dependencies: Vec<Ref>,
    pub expanded: bool,
    pub optional: bool,
}

impl ResourceFolder {
    #[must_use]
    pub fn key(&self) -> Key {
        Key::bare(self.kind, self.path.clone())
    }
}

/// Leaf asset
#[derive(Debug, Clone)]
pub struct ClientlibFile {
    pub kind: ClientlibType,
    pub path: String,
    pub properties: Properties,
}

impl ClientlibFile {
    #[must_use]
    pub fn key(&self) -> Key {
        Key::new(self.kind, self.path.clone(), self.properties.clone())
    }

    #[must_use]
    pub fn link(&self, minified: bool) -> Link {
        Link::resource(self.kind, &self.path, self.properties.clone(), minified)
    }
}

/// URL outside the tree; never inlined
#[derive(Debug, Clone)]
pub struct ExternalUri {
    pub kind: ClientlibType,
    pub uri: String,
    pub properties: Properties,
}

impl ExternalUri {
    #[must_use]
    pub fn key(&self) -> Key {
        Key::new(self.kind, self.uri.clone(), self.properties.clone())
    }

    #[must_use]
    pub fn link(&self) -> Link {
        Link::external(self.kind, &self.uri, self.properties.clone())
    }
}

/// All clientlibs of one type contributing to a category, in
/// `(order, label)` order
#[derive(Debug, Clone)]
pub struct Category {
    pub kind: ClientlibType,
    pub name: String,
    pub clientlibs: Vec<Clientlib>,
}

impl Category {
    #[must_use]
    pub fn key(&self) -> Key {
        Key::bare(self.kind, format!("{CATEGORY_PREFIX}{}", self.name))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clientlibs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum Element {
    Clientlib(Clientlib),
    Category(Category),
    Folder(ResourceFolder),
    File(ClientlibFile),
    External(ExternalUri),
}

impl Element {
    #[must_use]
    pub fn key(&self) -> Key {
        match self {
            Self::Clientlib(lib) => lib.key(),
            Self::Category(category) => category.key(),
            Self::Folder(folder) => folder.key(),
            Self::File(file) => file.key(),
            Self::External(external) => external.key(),
        }
    }

    /// Dispatch to the visitor method of this variant. External URIs are
    /// always visited as dependencies.
    pub fn accept<V: Visitor + ?Sized>(
        &self,
        visitor: &mut V,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()> {
        match self {
            Self::Clientlib(lib) => visitor.visit_clientlib(lib, mode, parent),
            Self::Category(category) => visitor.visit_category(category, mode, parent),
            Self::Folder(folder) => visitor.visit_folder(folder, mode, parent),
            Self::File(file) => visitor.visit_file(file, mode, parent),
            Self::External(external) => visitor.visit_external(external, VisitMode::Depends, parent),
        }
    }
}
