use crate::element::{Category, Clientlib, ClientlibFile, Element, ExternalUri, ResourceFolder};
use crate::error::{EngineError, Result, UnresolvedReason};
use crate::loader::{Loader, Resolution};
use crate::visitor::{VisitMode, Visitor};
use clientlib_model::{ClientlibType, DependsMode, Key, Link, Ref};
use serde::Serialize;
use std::collections::HashSet;

/// A file inlined into the requested bundle
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedFile {
    pub path: String,
    pub kind: ClientlibType,
    /// Delivered unminified regardless of the request
    pub expanded: bool,
    pub link: Link,
}

/// A reference satisfied during traversal
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEntry {
    pub reference: String,
    /// Already-rendered link reused instead of the preferred path
    pub alternative: Option<String>,
}

/// A reference that produced no element
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedEntry {
    pub reference: String,
    pub reason: UnresolvedReason,
    pub optional: bool,
}

/// Ordered result of one traversal
#[derive(Debug, Clone, Serialize)]
pub struct RenderPlan {
    pub kind: ClientlibType,
    pub root: String,
    /// Separately delivered predecessors, in load order
    pub links: Vec<Link>,
    /// Files of the requested bundle, in output order
    pub embedded: Vec<EmbeddedFile>,
    pub resolved: Vec<ResolvedEntry>,
    pub unresolved: Vec<UnresolvedEntry>,
}

#[derive(Debug, Clone, Copy)]
pub struct PlanOptions {
    pub minified: bool,
    pub strict: bool,
    pub expand_all: bool,
}

/// Traversal engine: expands embedded and dependency elements into a
/// deduplicated [`RenderPlan`].
pub struct PlanBuilder<'a> {
    loader: &'a Loader<'a>,
    options: PlanOptions,
    seen: HashSet<Key>,
    in_progress: Vec<Key>,
    /// > 0 while inside a clientlib delivered as a dependency
    covering: usize,
    /// > 0 while inside an expanded folder
    expanded: usize,
    links: Vec<Link>,
    embedded: Vec<EmbeddedFile>,
    resolved: Vec<ResolvedEntry>,
    unresolved: Vec<UnresolvedEntry>,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(loader: &'a Loader<'a>, options: PlanOptions) -> Self {
        Self {
            loader,
            options,
            seen: HashSet::new(),
            in_progress: Vec::new(),
            covering: 0,
            expanded: 0,
            links: Vec::new(),
            embedded: Vec::new(),
            resolved: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Traverse `root` as the requested bundle.
    pub fn build(mut self, root: &Element) -> Result<RenderPlan> {
        let root_key = root.key();
        root.accept(&mut self, VisitMode::Embedded, None)?;
        Ok(RenderPlan {
            kind: root_key.kind(),
            root: root_key.to_string(),
            links: self.links,
            embedded: self.embedded,
            resolved: self.resolved,
            unresolved: self.unresolved,
        })
    }

    fn enter(&mut self, key: Key) -> bool {
        if self.seen.contains(&key) {
            if self.in_progress.contains(&key) {
                log::warn!("Reference cycle at {key}; skipping re-entry");
            }
            return false;
        }
        self.seen.insert(key.clone());
        self.in_progress.push(key);
        true
    }

    fn leave(&mut self) {
        self.in_progress.pop();
    }

    fn visit_ref(
        &mut self,
        reference: &Ref,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()> {
        let mode = match reference.depends() {
            DependsMode::Depends => VisitMode::Depends,
            DependsMode::Embedded | DependsMode::Inherit => mode,
        };

        let rendered = self
            .links
            .iter()
            .chain(self.embedded.iter().map(|file| &file.link));
        let resolved = reference.resolve(rendered);
        if let Some(alternative) = resolved.used_alternative() {
            log::debug!("{} satisfied by {}", reference.key(), alternative.key());
            self.resolved.push(ResolvedEntry {
                reference: reference.key().to_string(),
                alternative: Some(alternative.key().to_string()),
            });
            return Ok(());
        }

        match self.loader.resolve(reference)? {
            Resolution::Found(element) => {
                self.resolved.push(ResolvedEntry {
                    reference: reference.key().to_string(),
                    alternative: None,
                });
                element.accept(self, mode, parent)
            }
            Resolution::Unresolved(reason) => self.unresolved(reference, reason),
        }
    }

    fn unresolved(&mut self, reference: &Ref, reason: UnresolvedReason) -> Result<()> {
        let key = reference.key().to_string();
        if reference.is_optional() {
            log::debug!("Optional reference {key} skipped: {reason}");
        } else if self.options.strict {
            return Err(EngineError::MissingReference {
                reference: key,
                reason,
            });
        } else {
            log::warn!("Mandatory reference {key} omitted: {reason}");
        }
        self.unresolved.push(UnresolvedEntry {
            reference: key,
            reason,
            optional: reference.is_optional(),
        });
        Ok(())
    }
}

impl Visitor for PlanBuilder<'_> {
    fn visit_clientlib(
        &mut self,
        lib: &Clientlib,
        mode: VisitMode,
        _parent: Option<&ResourceFolder>,
    ) -> Result<()> {
        if !self.enter(lib.key()) {
            return Ok(());
        }
        match (&lib.folder, mode) {
            (None, _) => log::debug!("Clientlib {} has no {} folder", lib.path, lib.kind),
            (Some(folder), VisitMode::Embedded) => {
                self.visit_folder(folder, VisitMode::Embedded, None)?;
            }
            (Some(folder), VisitMode::Depends) => {
                self.covering += 1;
                self.visit_folder(folder, VisitMode::Depends, None)?;
                self.covering -= 1;
                if self.covering == 0 {
                    self.links.push(lib.link(self.options.minified));
                }
            }
        }
        self.leave();
        Ok(())
    }

    fn visit_category(
        &mut self,
        category: &Category,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()> {
        if !self.enter(category.key()) {
            return Ok(());
        }
        for lib in &category.clientlibs {
            self.visit_clientlib(lib, mode, parent)?;
        }
        self.leave();
        Ok(())
    }

    fn visit_folder(
        &mut self,
        folder: &ResourceFolder,
        mode: VisitMode,
        _parent: Option<&ResourceFolder>,
    ) -> Result<()> {
        if !self.enter(folder.key()) {
            return Ok(());
        }
        if folder.expanded {
            self.expanded += 1;
        }

        for reference in &folder.dependencies {
            let covering = std::mem::take(&mut self.covering);
            let outcome = self.visit_ref(reference, VisitMode::Depends, Some(folder));
            self.covering = covering;
            outcome?;
        }
        for reference in &folder.embedded {
            self.visit_ref(reference, mode, Some(folder))?;
        }
        for child in &folder.children {
            child.accept(self, mode, Some(folder))?;
        }

        if folder.expanded {
            self.expanded -= 1;
        }
        self.leave();
        Ok(())
    }

    fn visit_file(
        &mut self,
        file: &ClientlibFile,
        mode: VisitMode,
        _parent: Option<&ResourceFolder>,
    ) -> Result<()> {
        if !self.enter(file.key()) {
            return Ok(());
        }
        if self.covering == 0 {
            let expanded = self.options.expand_all || self.expanded > 0;
            let link = file.link(self.options.minified && !expanded);
            match mode {
                VisitMode::Embedded => self.embedded.push(EmbeddedFile {
                    path: file.path.clone(),
                    kind: file.kind,
                    expanded,
                    link,
                }),
                VisitMode::Depends => self.links.push(link),
            }
        }
        self.leave();
        Ok(())
    }

    fn visit_external(
        &mut self,
        external: &ExternalUri,
        _mode: VisitMode,
        _parent: Option<&ResourceFolder>,
    ) -> Result<()> {
        if self.enter(external.key()) {
            self.links.push(external.link());
            self.leave();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::tree::{Declaration, MemoryTree, ResourceProperties};
    use pretty_assertions::assert_eq;

    fn lib_props(categories: &[&str]) -> ResourceProperties {
        ResourceProperties {
            kind: Some("clientlib".to_string()),
            category: categories.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    fn folder_props(depends: &[&str], embed: &[&str]) -> ResourceProperties {
        ResourceProperties {
            depends: depends.iter().map(|d| Declaration::Rule(d.to_string())).collect(),
            embed: embed.iter().map(|e| Declaration::Rule(e.to_string())).collect(),
            ..Default::default()
        }
    }

    fn options(strict: bool) -> PlanOptions {
        PlanOptions {
            minified: false,
            strict,
            expand_all: false,
        }
    }

    fn plan_for(tree: &MemoryTree, path: &str, strict: bool) -> Result<RenderPlan> {
        let config = EngineConfig::default();
        let loader = Loader::new(tree, &config);
        let root = loader
            .element_at(path, ClientlibType::Js)?
            .expect("root element");
        PlanBuilder::new(&loader, options(strict)).build(&root)
    }

    fn link_paths(plan: &RenderPlan) -> Vec<&str> {
        plan.links.iter().map(Link::path).collect()
    }

    fn embedded_paths(plan: &RenderPlan) -> Vec<&str> {
        plan.embedded.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn dependencies_precede_embeds_in_declared_order() {
        let tree = MemoryTree::new()
            .folder("/libs/app", lib_props(&[]))
            .folder(
                "/libs/app/js",
                folder_props(&["/libs/dep/a.js", "/libs/dep/b.js"], &["/libs/emb/c.js", "/libs/emb/d.js"]),
            )
            .file("/libs/app/js/main.js", "main")
            .file("/libs/dep/a.js", "a")
            .file("/libs/dep/b.js", "b")
            .file("/libs/emb/c.js", "c")
            .file("/libs/emb/d.js", "d");

        let plan = plan_for(&tree, "/libs/app", true).unwrap();
        assert_eq!(link_paths(&plan), vec!["/libs/dep/a.js", "/libs/dep/b.js"]);
        assert_eq!(
            embedded_paths(&plan),
            vec!["/libs/emb/c.js", "/libs/emb/d.js", "/libs/app/js/main.js"]
        );
        let order: Vec<&str> = plan.resolved.iter().map(|r| r.reference.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "js:/libs/dep/a.js",
                "js:/libs/dep/b.js",
                "js:/libs/emb/c.js",
                "js:/libs/emb/d.js"
            ]
        );
    }

    #[test]
    fn depended_clientlib_brings_its_dependencies_first_and_is_not_inlined() {
        let tree = MemoryTree::new()
            .folder("/libs/base", lib_props(&[]))
            .folder("/libs/base/js", folder_props(&["/libs/vendor/v.js"], &[]))
            .file("/libs/base/js/base.js", "base")
            .file("/libs/vendor/v.js", "v")
            .folder("/libs/app", lib_props(&[]))
            .folder("/libs/app/js", folder_props(&["/libs/base"], &["/libs/base/js/base.js"]))
            .file("/libs/app/js/app.js", "app");

        let plan = plan_for(&tree, "/libs/app", true).unwrap();
        assert_eq!(link_paths(&plan), vec!["/libs/vendor/v.js", "/libs/base.js"]);
        // base.js is delivered by /libs/base and must not be inlined again
        assert_eq!(embedded_paths(&plan), vec!["/libs/app/js/app.js"]);
    }

    #[test]
    fn version_rule_reuses_already_rendered_alternative() {
        let tree = MemoryTree::new()
            .folder("/libs/app", lib_props(&[]))
            .folder(
                "/libs/app/js",
                folder_props(
                    &[],
                    &["jslibs/jquery/2.2.4/jquery.js", "jslibs/jquery/([1-3]*:3.1.1)/jquery.js"],
                ),
            )
            .file("/libs/jslibs/jquery/2.2.4/jquery.js", "old")
            .file("/libs/jslibs/jquery/3.1.1/jquery.js", "new");

        let plan = plan_for(&tree, "/libs/app", true).unwrap();
        assert_eq!(embedded_paths(&plan), vec!["/libs/jslibs/jquery/2.2.4/jquery.js"]);
        let reused = &plan.resolved[1];
        assert_eq!(
            reused.alternative.as_deref(),
            Some("js:/libs/jslibs/jquery/2.2.4/jquery.js")
        );
    }

    #[test]
    fn category_embed_inlines_every_member_and_depends_links_each() {
        let tree = MemoryTree::new()
            .folder("/libs/one", lib_props(&["shared"]))
            .file("/libs/one/js/one.js", "1")
            .folder("/libs/two", lib_props(&["shared"]))
            .file("/libs/two/js/two.js", "2")
            .folder("/libs/embedder", lib_props(&[]))
            .folder("/libs/embedder/js", folder_props(&[], &["category:shared"]))
            .folder("/libs/depender", lib_props(&[]))
            .folder("/libs/depender/js", folder_props(&["category:shared"], &[]));

        let embedded = plan_for(&tree, "/libs/embedder", true).unwrap();
        assert_eq!(
            embedded_paths(&embedded),
            vec!["/libs/one/js/one.js", "/libs/two/js/two.js"]
        );
        assert!(embedded.links.is_empty());

        let depended = plan_for(&tree, "/libs/depender", true).unwrap();
        assert_eq!(link_paths(&depended), vec!["/libs/one.js", "/libs/two.js"]);
        assert!(depended.embedded.is_empty());
    }

    #[test]
    fn external_uris_become_links_even_when_embedded() {
        let tree = MemoryTree::new()
            .folder("/libs/app", lib_props(&[]))
            .folder(
                "/libs/app/js",
                folder_props(&[], &["https://cdn.example.com/x.js"]),
            )
            .file("/libs/app/js/app.js", "app");
        let plan = plan_for(&tree, "/libs/app", true).unwrap();
        assert_eq!(link_paths(&plan), vec!["https://cdn.example.com/x.js"]);
        assert_eq!(embedded_paths(&plan), vec!["/libs/app/js/app.js"]);
    }

    #[test]
    fn missing_mandatory_reference_follows_policy() {
        let tree = MemoryTree::new()
            .folder("/libs/app", lib_props(&[]))
            .folder(
                "/libs/app/js",
                ResourceProperties {
                    embed: vec![
                        Declaration::Rule("/libs/missing.js".to_string()),
                        Declaration::Detailed {
                            rule: "category:nobody".to_string(),
                            optional: Some(true),
                            properties: Default::default(),
                        },
                    ],
                    ..Default::default()
                },
            )
            .file("/libs/app/js/app.js", "app");

        let err = plan_for(&tree, "/libs/app", true).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingReference {
                reason: UnresolvedReason::NotFound,
                ..
            }
        ));

        let lenient = plan_for(&tree, "/libs/app", false).unwrap();
        assert_eq!(embedded_paths(&lenient), vec!["/libs/app/js/app.js"]);
        assert_eq!(lenient.unresolved.len(), 2);
        assert_eq!(lenient.unresolved[1].reason, UnresolvedReason::EmptyCategory);
        assert!(lenient.unresolved[1].optional);
    }

    #[test]
    fn self_referencing_declarations_terminate() {
        let tree = MemoryTree::new()
            .folder("/libs/a", lib_props(&["loop"]))
            .folder("/libs/a/js", folder_props(&[], &["category:loop", "/libs/b"]))
            .file("/libs/a/js/a.js", "a")
            .folder("/libs/b", lib_props(&[]))
            .folder("/libs/b/js", folder_props(&[], &["/libs/a"]))
            .file("/libs/b/js/b.js", "b");
        let plan = plan_for(&tree, "/libs/a", true).unwrap();
        assert_eq!(embedded_paths(&plan), vec!["/libs/b/js/b.js", "/libs/a/js/a.js"]);
    }
}
