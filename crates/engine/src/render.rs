use crate::error::Result;
use crate::minify::Minifier;
use crate::plan::{EmbeddedFile, RenderPlan};
use crate::tree::ResourceTree;
use clientlib_model::{minified_path, ClientlibType};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Length of the public content hash in hex characters
pub const HASH_LEN: usize = 16;

/// Concatenated content of one plan
#[derive(Debug, Clone, Serialize)]
pub struct Bundle {
    pub kind: ClientlibType,
    #[serde(skip)]
    pub content: String,
    /// Digest of the embedded sources, independent of minification
    pub hash: String,
    pub minified: bool,
}

impl Bundle {
    #[must_use]
    pub fn etag(&self) -> String {
        if self.minified {
            format!("\"{}-min\"", self.hash)
        } else {
            format!("\"{}\"", self.hash)
        }
    }
}

/// Reads the embedded files of a plan and joins them into a [`Bundle`].
pub struct Renderer<'a> {
    tree: &'a dyn ResourceTree,
    minifier: &'a dyn Minifier,
}

impl<'a> Renderer<'a> {
    pub fn new(tree: &'a dyn ResourceTree, minifier: &'a dyn Minifier) -> Self {
        Self { tree, minifier }
    }

    pub fn render(&self, plan: &RenderPlan, minified: bool) -> Result<Bundle> {
        let mut hasher = Sha256::new();
        let mut parts = Vec::with_capacity(plan.embedded.len());
        for file in &plan.embedded {
            let source = self.tree.read(&file.path)?;
            hasher.update(file.path.as_bytes());
            hasher.update([0u8]);
            hasher.update(&source);
            parts.push(self.output_of(file, source)?);
        }
        let digest = format!("{:x}", hasher.finalize());
        Ok(Bundle {
            kind: plan.kind,
            content: parts.join("\n"),
            hash: digest[..HASH_LEN].to_string(),
            minified,
        })
    }

    fn output_of(&self, file: &EmbeddedFile, source: Vec<u8>) -> Result<String> {
        if !file.link.is_minified() {
            return Ok(String::from_utf8_lossy(&source).into_owned());
        }
        let sibling = minified_path(file.kind, &file.path);
        if self.tree.is_file(&sibling) {
            log::debug!("Using pre-minified {sibling}");
            let bytes = self.tree.read(&sibling)?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
        let text = String::from_utf8_lossy(&source);
        self.minifier.minify(file.kind, &file.path, &text)
    }
}

/// Hash of a plan's sources without rendering them.
pub fn content_hash(tree: &dyn ResourceTree, plan: &RenderPlan) -> Result<String> {
    let mut hasher = Sha256::new();
    for file in &plan.embedded {
        hasher.update(file.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(tree.read(&file.path)?);
    }
    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..HASH_LEN].to_string())
}
