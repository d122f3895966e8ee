use crate::config::EngineConfig;
use crate::element::Element;
use crate::error::Result;
use crate::loader::Loader;
use crate::minify::{Minifier, WhitespaceMinifier};
use crate::plan::{PlanBuilder, PlanOptions, RenderPlan};
use crate::render::{content_hash, Bundle, Renderer};
use crate::tree::ResourceTree;
use crate::urls::{LinkRenderer, PrefixMapper, UrlMapper};
use clientlib_model::{ClientlibType, Link, LinkTarget, Properties};
use globset::GlobSet;
use std::fmt;
use std::sync::Arc;

/// What a request asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Category(String),
    /// Absolute resource path (clientlib, folder or file)
    Path(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(name) => write!(f, "category:{name}"),
            Self::Path(path) => f.write_str(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRequest {
    pub kind: ClientlibType,
    pub target: Target,
    pub minified: bool,
}

impl BundleRequest {
    pub fn category(kind: ClientlibType, name: impl Into<String>, minified: bool) -> Self {
        Self {
            kind,
            target: Target::Category(name.into()),
            minified,
        }
    }

    pub fn path(kind: ClientlibType, path: impl Into<String>, minified: bool) -> Self {
        Self {
            kind,
            target: Target::Path(path.into()),
            minified,
        }
    }
}

/// Rendered bundle together with its public link
#[derive(Debug, Clone)]
pub struct Delivery {
    pub bundle: Bundle,
    pub link: Link,
}

/// Configuration, resource tree and collaborators for one deployment.
///
/// Holds no per-request state: every call loads fresh elements from the
/// tree, so concurrent callers only share immutable data.
pub struct Engine {
    config: EngineConfig,
    public: GlobSet,
    tree: Arc<dyn ResourceTree>,
    minifier: Arc<dyn Minifier>,
    mapper: Arc<dyn UrlMapper>,
}

impl Engine {
    pub fn new(config: EngineConfig, tree: Arc<dyn ResourceTree>) -> Result<Self> {
        config.validate()?;
        let public = config.public_matcher()?;
        let mapper = Arc::new(PrefixMapper::new(config.url_prefix.clone()));
        Ok(Self {
            config,
            public,
            tree,
            minifier: Arc::new(WhitespaceMinifier),
            mapper,
        })
    }

    #[must_use]
    pub fn with_minifier(mut self, minifier: Arc<dyn Minifier>) -> Self {
        self.minifier = minifier;
        self
    }

    #[must_use]
    pub fn with_mapper(mut self, mapper: Arc<dyn UrlMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True when `path` may be delivered directly.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public.is_match(path)
    }

    #[must_use]
    pub fn is_category_path(&self, path: &str) -> bool {
        path == self.config.category_path
    }

    /// Answers the request path parser: is there a resource at `path`, or a
    /// file `path.ext`?
    #[must_use]
    pub fn resource_exists(&self, path: &str, extension: &str) -> bool {
        matches!(self.tree.resource(path), Ok(Some(_)))
            || self.tree.is_file(&format!("{path}.{extension}"))
    }

    /// Minification actually applied to a request.
    #[must_use]
    pub fn effective_minified(&self, requested: bool) -> bool {
        requested && self.config.minify && !self.config.debug
    }

    fn loader(&self) -> Loader<'_> {
        Loader::new(self.tree.as_ref(), &self.config)
    }

    fn options(&self, minified: bool) -> PlanOptions {
        PlanOptions {
            minified: self.effective_minified(minified),
            strict: self.config.strict_dependencies,
            expand_all: self.config.debug,
        }
    }

    /// Root element of a request; `None` for unknown paths and empty
    /// categories.
    pub fn root_element(&self, request: &BundleRequest) -> Result<Option<Element>> {
        let loader = self.loader();
        match &request.target {
            Target::Category(name) => {
                let category = loader.category(request.kind, name)?;
                Ok((!category.is_empty()).then_some(Element::Category(category)))
            }
            Target::Path(path) => loader.element_at(path, request.kind),
        }
    }

    pub fn plan(&self, request: &BundleRequest) -> Result<Option<RenderPlan>> {
        let Some(root) = self.root_element(request)? else {
            return Ok(None);
        };
        let loader = self.loader();
        PlanBuilder::new(&loader, self.options(request.minified))
            .build(&root)
            .map(Some)
    }

    /// Render the requested bundle; `None` when there is nothing to serve.
    pub fn bundle(&self, request: &BundleRequest) -> Result<Option<Delivery>> {
        let Some(plan) = self.plan(request)? else {
            return Ok(None);
        };
        let minified = self.effective_minified(request.minified);
        let bundle = Renderer::new(self.tree.as_ref(), self.minifier.as_ref())
            .render(&plan, minified)?;
        log::debug!(
            "Rendered {} ({}, {} files, hash {})",
            request.target,
            request.kind,
            plan.embedded.len(),
            bundle.hash
        );
        let link = self.root_link(request, minified).with_hash(bundle.hash.clone());
        Ok(Some(Delivery { bundle, link }))
    }

    fn root_link(&self, request: &BundleRequest, minified: bool) -> Link {
        match &request.target {
            Target::Category(name) => Link::category(
                request.kind,
                &self.config.category_path,
                name,
                Properties::new(),
                minified,
            ),
            Target::Path(path) => Link::resource(request.kind, path, Properties::new(), minified),
        }
    }

    /// Links to load for a request, dependencies first and the requested
    /// bundle last. A bundle that contains expanded files (every file in
    /// debug mode) is not combined: each embedded file gets its own link, in
    /// output order, and expanded files stay unminified.
    pub fn links(&self, request: &BundleRequest) -> Result<Vec<Link>> {
        let Some(plan) = self.plan(request)? else {
            return Ok(Vec::new());
        };
        let mut links = Vec::with_capacity(plan.links.len() + 1);
        for link in &plan.links {
            links.push(self.with_current_hash(link.clone())?);
        }
        if plan.embedded.iter().any(|file| file.expanded) {
            links.extend(plan.embedded.iter().map(|file| file.link.clone()));
        } else if !plan.embedded.is_empty() {
            let hash = content_hash(self.tree.as_ref(), &plan)?;
            let minified = self.effective_minified(request.minified);
            links.push(self.root_link(request, minified).with_hash(hash));
        }
        Ok(links)
    }

    /// HTML tags for [`Engine::links`].
    pub fn render_links(&self, request: &BundleRequest) -> Result<Vec<String>> {
        let mapper = self.config.map_urls.then_some(self.mapper.as_ref());
        let renderer = LinkRenderer::new(mapper);
        Ok(self
            .links(request)?
            .iter()
            .filter_map(|link| renderer.tag(link))
            .collect())
    }

    fn with_current_hash(&self, link: Link) -> Result<Link> {
        if self.config.debug || !matches!(link.target(), LinkTarget::Resource) {
            return Ok(link);
        }
        let kind = link.kind();
        let Some(ext) = kind.extension() else {
            return Ok(link);
        };
        let loader = self.loader();
        let mut root = loader.element_at(link.path(), kind)?;
        if root.is_none() {
            if let Some(stem) = link.path().strip_suffix(&format!(".{ext}")) {
                root = loader.element_at(stem, kind)?;
            }
        }
        let Some(root) = root else {
            log::warn!("No element behind link {}", link.path());
            return Ok(link);
        };
        let plan = PlanBuilder::new(&loader, self.options(false)).build(&root)?;
        let hash = content_hash(self.tree.as_ref(), &plan)?;
        Ok(link.with_hash(hash))
    }
}
