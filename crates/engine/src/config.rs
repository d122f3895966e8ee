use crate::error::{EngineError, Result};
use clientlib_protocol::DEFAULT_CATEGORY_PATH;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Engine configuration; the top-level keys of `clientlibs.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Servlet path of category bundles
    pub category_path: String,

    /// Roots tried, in order, for rules that are not absolute
    pub search_paths: Vec<String>,

    /// Glob patterns of resource paths that may be delivered directly
    pub public_paths: Vec<String>,

    /// Global switch for the `min` selector
    pub minify: bool,

    /// Pass public URLs through the URL mapper
    pub map_urls: bool,

    /// Prefix applied by the default URL mapper (context path)
    pub url_prefix: String,

    /// Fail a render when a mandatory reference is missing
    pub strict_dependencies: bool,

    /// Treat every folder as expanded: no minification, one link per file
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            category_path: DEFAULT_CATEGORY_PATH.to_string(),
            search_paths: vec!["/apps".to_string(), "/libs".to_string()],
            public_paths: vec!["/apps/**".to_string(), "/libs/**".to_string()],
            minify: true,
            map_urls: false,
            url_prefix: String::new(),
            strict_dependencies: true,
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Configuration for local development
    pub fn for_debug() -> Self {
        Self {
            debug: true,
            minify: false,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.category_path.starts_with('/') || self.category_path.ends_with('/') {
            return Err(EngineError::config(format!(
                "category_path must be absolute without trailing slash: {}",
                self.category_path
            )));
        }
        if self.category_path.contains('.') {
            return Err(EngineError::config(format!(
                "category_path must not contain dots: {}",
                self.category_path
            )));
        }
        if let Some(bad) = self.search_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(EngineError::config(format!(
                "search path must be absolute: {bad}"
            )));
        }
        if !self.url_prefix.is_empty()
            && (!self.url_prefix.starts_with('/') || self.url_prefix.ends_with('/'))
        {
            return Err(EngineError::config(format!(
                "url_prefix must start with '/' and not end with '/': {}",
                self.url_prefix
            )));
        }
        self.public_matcher()?;
        Ok(())
    }

    /// Compiled `public_paths`
    pub fn public_matcher(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.public_paths {
            let glob = Glob::new(pattern).map_err(|err| {
                EngineError::config(format!("invalid public path pattern '{pattern}': {err}"))
            })?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|err| EngineError::config(format!("invalid public paths: {err}")))
    }

    /// Candidate absolute paths for a (possibly relative) reference path.
    #[must_use]
    pub fn candidate_paths(&self, path: &str) -> Vec<String> {
        if path.starts_with('/') {
            return vec![path.to_string()];
        }
        self.search_paths
            .iter()
            .map(|root| format!("{}/{}", root.trim_end_matches('/'), path))
            .collect()
    }
}
