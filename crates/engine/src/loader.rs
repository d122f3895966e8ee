use crate::config::EngineConfig;
use crate::element::{Category, Clientlib, ClientlibFile, Element, ExternalUri, ResourceFolder};
use crate::error::{Result, UnresolvedReason};
use crate::tree::{Declaration, Resource, ResourceTree};
use clientlib_model::{ClientlibType, DependsMode, Properties, Ref, RefTarget};
use clientlib_protocol::sanitize_category;

/// Outcome of resolving a reference against the tree
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Element),
    Unresolved(UnresolvedReason),
}

/// Builds read-only element views from the resource tree.
pub struct Loader<'a> {
    tree: &'a dyn ResourceTree,
    config: &'a EngineConfig,
}

impl<'a> Loader<'a> {
    pub fn new(tree: &'a dyn ResourceTree, config: &'a EngineConfig) -> Self {
        Self { tree, config }
    }

    pub fn clientlib(&self, path: &str, kind: ClientlibType) -> Result<Option<Clientlib>> {
        match self.tree.resource(path)? {
            Some(resource) if resource.is_clientlib() => {
                self.clientlib_from(resource, kind).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn clientlib_from(&self, resource: Resource, kind: ClientlibType) -> Result<Clientlib> {
        let folder_path = format!("{}/{}", resource.path, kind.as_str());
        let folder = match self.tree.resource(&folder_path)? {
            Some(folder) if !folder.is_file() => Some(self.folder_from(folder, kind)?),
            _ => None,
        };
        let categories = resource
            .properties
            .category
            .iter()
            .filter_map(|c| sanitize_category(c))
            .collect();
        Ok(Clientlib {
            kind,
            path: resource.path,
            categories,
            order: resource.properties.order,
            folder,
        })
    }

    fn folder_from(&self, resource: Resource, kind: ClientlibType) -> Result<ResourceFolder> {
        let props = &resource.properties;
        let embedded = self.references(kind, &props.embed, DependsMode::Embedded, props.optional)?;
        let dependencies =
            self.references(kind, &props.depends, DependsMode::Depends, props.optional)?;

        let listing = self.tree.children(&resource.path)?;
        let mut children = Vec::with_capacity(listing.len());
        for child in &listing {
            if child.is_file() {
                if accepts_file(kind, &child.path, &listing) {
                    children.push(Element::File(ClientlibFile {
                        kind,
                        path: child.path.clone(),
                        properties: Properties::new(),
                    }));
                }
            } else if child.is_clientlib() {
                log::debug!("Skipping nested clientlib {} in {}", child.path, resource.path);
            } else {
                children.push(Element::Folder(self.folder_from(child.clone(), kind)?));
            }
        }

        Ok(ResourceFolder {
            kind,
            path: resource.path.clone(),
            children,
            embedded,
            dependencies,
            expanded: props.expanded,
            optional: props.optional,
        })
    }

    fn references(
        &self,
        kind: ClientlibType,
        declarations: &[Declaration],
        mode: DependsMode,
        optional: bool,
    ) -> Result<Vec<Ref>> {
        declarations
            .iter()
            .map(|decl| {
                Ref::parse(
                    kind,
                    decl.rule(),
                    mode,
                    decl.optional().unwrap_or(optional),
                    decl.properties().collect(),
                )
                .map_err(Into::into)
            })
            .collect()
    }

    /// Clientlibs of `kind` contributing to `name`, sorted by `(order, label)`.
    /// Declared and requested names are compared in sanitized form.
    pub fn category(&self, kind: ClientlibType, name: &str) -> Result<Category> {
        let mut clientlibs = Vec::new();
        let Some(wanted) = sanitize_category(name) else {
            return Ok(Category {
                kind,
                name: name.to_string(),
                clientlibs,
            });
        };
        for resource in self.tree.clientlibs()? {
            let declared = &resource.properties.category;
            if !declared
                .iter()
                .any(|c| sanitize_category(c).as_deref() == Some(wanted.as_str()))
            {
                continue;
            }
            let lib = self.clientlib_from(resource, kind)?;
            if lib.folder.is_some() {
                clientlibs.push(lib);
            }
        }
        clientlibs.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.label().cmp(b.label())));
        Ok(Category {
            kind,
            name: wanted,
            clientlibs,
        })
    }

    /// Element at an absolute path: a clientlib, a folder, a file, or the
    /// file `{path}.{ext}`.
    pub fn element_at(&self, path: &str, kind: ClientlibType) -> Result<Option<Element>> {
        if let Some(resource) = self.tree.resource(path)? {
            let element = if resource.is_clientlib() {
                Element::Clientlib(self.clientlib_from(resource, kind)?)
            } else if resource.is_file() {
                Element::File(ClientlibFile {
                    kind,
                    path: resource.path,
                    properties: Properties::new(),
                })
            } else {
                Element::Folder(self.folder_from(resource, kind)?)
            };
            return Ok(Some(element));
        }
        if let Some(ext) = kind.extension() {
            let with_ext = format!("{path}.{ext}");
            if self.tree.is_file(&with_ext) {
                return Ok(Some(Element::File(ClientlibFile {
                    kind,
                    path: with_ext,
                    properties: Properties::new(),
                })));
            }
        }
        Ok(None)
    }

    pub fn resolve(&self, reference: &Ref) -> Result<Resolution> {
        let kind = reference.kind();
        match reference.target() {
            RefTarget::External(uri) => Ok(Resolution::Found(Element::External(ExternalUri {
                kind,
                uri: uri.clone(),
                properties: reference.properties().clone(),
            }))),
            RefTarget::Category(name) => {
                let category = self.category(kind, name)?;
                if category.is_empty() {
                    Ok(Resolution::Unresolved(UnresolvedReason::EmptyCategory))
                } else {
                    Ok(Resolution::Found(Element::Category(category)))
                }
            }
            RefTarget::Rule(rule) => {
                for candidate in self.config.candidate_paths(rule.preferred()) {
                    if let Some(element) = self.element_at(&candidate, kind)? {
                        return Ok(Resolution::Found(with_properties(element, reference)));
                    }
                }
                Ok(Resolution::Unresolved(UnresolvedReason::NotFound))
            }
        }
    }
}

fn with_properties(element: Element, reference: &Ref) -> Element {
    match element {
        Element::File(file) if !reference.properties().is_empty() => Element::File(ClientlibFile {
            properties: reference.properties().clone(),
            ..file
        }),
        other => other,
    }
}

/// Files of the folder's type; a `.min` file whose plain sibling exists is
/// the sibling's pre-minified variant and not a separate asset.
fn accepts_file(kind: ClientlibType, path: &str, siblings: &[Resource]) -> bool {
    let Some(ext) = kind.extension() else {
        return true;
    };
    let dotted = format!(".{ext}");
    if !path.ends_with(&dotted) {
        return false;
    }
    match path.strip_suffix(&format!(".min{dotted}")) {
        Some(stem) => {
            let plain = format!("{stem}{dotted}");
            !siblings.iter().any(|s| s.is_file() && s.path == plain)
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{MemoryTree, ResourceProperties};
    use pretty_assertions::assert_eq;

    fn clientlib_props(categories: &[&str], order: i64) -> ResourceProperties {
        ResourceProperties {
            kind: Some("clientlib".to_string()),
            category: categories.iter().map(|c| c.to_string()).collect(),
            order,
            ..Default::default()
        }
    }

    #[test]
    fn category_members_sorted_by_order_then_label() {
        let tree = MemoryTree::new()
            .folder("/libs/b", clientlib_props(&["site"], 0))
            .file("/libs/b/js/b.js", "b")
            .folder("/libs/a", clientlib_props(&["site"], 0))
            .file("/libs/a/js/a.js", "a")
            .folder("/apps/first", clientlib_props(&["site"], -1))
            .file("/apps/first/js/f.js", "f")
            .folder("/libs/css-only", clientlib_props(&["site"], -5))
            .file("/libs/css-only/css/c.css", "c");
        let config = EngineConfig::default();
        let loader = Loader::new(&tree, &config);

        let category = loader.category(ClientlibType::Js, "site").unwrap();
        let paths: Vec<&str> = category.clientlibs.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["/apps/first", "/libs/a", "/libs/b"]);
    }

    #[test]
    fn declared_categories_match_in_sanitized_form() {
        let tree = MemoryTree::new()
            .folder("/libs/spaced", clientlib_props(&[" my bundle "], 0))
            .file("/libs/spaced/js/s.js", "s");
        let config = EngineConfig::default();
        let loader = Loader::new(&tree, &config);

        let category = loader.category(ClientlibType::Js, "mybundle").unwrap();
        assert_eq!(category.name, "mybundle");
        assert_eq!(category.clientlibs.len(), 1);
        assert_eq!(category.clientlibs[0].categories, vec!["mybundle".to_string()]);
        let spaced = loader.category(ClientlibType::Js, "my bundle").unwrap();
        assert_eq!(spaced.clientlibs.len(), 1);
        assert!(loader.category(ClientlibType::Js, "%%").unwrap().is_empty());
    }

    #[test]
    fn min_siblings_are_not_separate_children() {
        let tree = MemoryTree::new()
            .folder("/libs/app", clientlib_props(&[], 0))
            .file("/libs/app/js/lib.js", "plain")
            .file("/libs/app/js/lib.min.js", "min")
            .file("/libs/app/js/only.min.js", "only")
            .file("/libs/app/js/readme.txt", "txt");
        let config = EngineConfig::default();
        let loader = Loader::new(&tree, &config);
        let lib = loader.clientlib("/libs/app", ClientlibType::Js).unwrap().unwrap();
        let folder = lib.folder.unwrap();
        let files: Vec<String> = folder
            .children
            .iter()
            .map(|c| c.key().path().to_string())
            .collect();
        assert_eq!(
            files,
            vec!["/libs/app/js/lib.js".to_string(), "/libs/app/js/only.min.js".to_string()]
        );
    }

    #[test]
    fn rules_resolve_over_search_paths() {
        let tree = MemoryTree::new().file("/libs/jslibs/jquery/3.1.1/jquery.js", "jq");
        let config = EngineConfig::default();
        let loader = Loader::new(&tree, &config);
        let reference =
            Ref::path(ClientlibType::Js, "jslibs/jquery/([1-3]*:3.1.1)/jquery.js").unwrap();
        match loader.resolve(&reference).unwrap() {
            Resolution::Found(Element::File(file)) => {
                assert_eq!(file.path, "/libs/jslibs/jquery/3.1.1/jquery.js");
            }
            other => panic!("unexpected resolution: {other:?}"),
        }

        let missing = Ref::path(ClientlibType::Js, "jslibs/none.js").unwrap();
        assert!(matches!(
            loader.resolve(&missing).unwrap(),
            Resolution::Unresolved(UnresolvedReason::NotFound)
        ));
        let empty = Ref::category(ClientlibType::Js, "nobody").unwrap();
        assert!(matches!(
            loader.resolve(&empty).unwrap(),
            Resolution::Unresolved(UnresolvedReason::EmptyCategory)
        ));
    }

    #[test]
    fn malformed_declaration_fails_the_load() {
        let tree = MemoryTree::new().folder(
            "/libs/app/js",
            ResourceProperties {
                embed: vec![Declaration::Rule("x/(1*:2/y.js".to_string())],
                ..Default::default()
            },
        );
        let tree = tree.folder("/libs/app", clientlib_props(&[], 0));
        let config = EngineConfig::default();
        let loader = Loader::new(&tree, &config);
        let err = loader.clientlib("/libs/app", ClientlibType::Js).unwrap_err();
        assert!(err.is_declaration_error());
    }
}
