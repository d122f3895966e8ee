use super::{
    normalize_path, order_children, Resource, ResourceKind, ResourceProperties, ResourceTree,
};
use crate::error::Result;
use std::collections::BTreeMap;
use std::io;

#[derive(Debug, Clone)]
enum Node {
    Folder(ResourceProperties),
    File(Vec<u8>),
}

/// In-memory resource tree; missing parent folders are created on insert.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    nodes: BTreeMap<String, Node>,
}

impl MemoryTree {
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self::default();
        tree.nodes
            .insert("/".to_string(), Node::Folder(ResourceProperties::default()));
        tree
    }

    /// Add (or replace the properties of) a folder.
    #[must_use]
    pub fn folder(mut self, path: &str, properties: ResourceProperties) -> Self {
        if let Some(path) = normalize_path(path) {
            self.ensure_parents(&path);
            self.nodes.insert(path, Node::Folder(properties));
        }
        self
    }

    #[must_use]
    pub fn file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        if let Some(path) = normalize_path(path) {
            self.ensure_parents(&path);
            self.nodes.insert(path, Node::File(content.into()));
        }
        self
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut current = String::new();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        for segment in segments.iter().take(segments.len().saturating_sub(1)) {
            current.push('/');
            current.push_str(segment);
            self.nodes
                .entry(current.clone())
                .or_insert_with(|| Node::Folder(ResourceProperties::default()));
        }
    }

    fn to_resource(path: &str, node: &Node) -> Resource {
        match node {
            Node::Folder(props) => Resource {
                path: path.to_string(),
                kind: ResourceKind::Folder,
                properties: props.clone(),
            },
            Node::File(_) => Resource {
                path: path.to_string(),
                kind: ResourceKind::File,
                properties: ResourceProperties::default(),
            },
        }
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "/",
    }
}

impl ResourceTree for MemoryTree {
    fn resource(&self, path: &str) -> Result<Option<Resource>> {
        let Some(path) = normalize_path(path) else {
            return Ok(None);
        };
        Ok(self.nodes.get(&path).map(|node| Self::to_resource(&path, node)))
    }

    fn children(&self, path: &str) -> Result<Vec<Resource>> {
        let Some(path) = normalize_path(path) else {
            return Ok(Vec::new());
        };
        let Some(Node::Folder(props)) = self.nodes.get(&path) else {
            return Ok(Vec::new());
        };
        let mut children: Vec<Resource> = self
            .nodes
            .iter()
            .filter(|(p, _)| p.as_str() != "/" && parent_of(p) == path)
            .map(|(p, node)| Self::to_resource(p, node))
            .collect();
        order_children(&mut children, &props.child_order);
        Ok(children)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let normalized = normalize_path(path);
        match normalized.as_ref().and_then(|p| self.nodes.get(p)) {
            Some(Node::File(content)) => Ok(content.clone()),
            _ => Err(io::Error::new(io::ErrorKind::NotFound, format!("no file at {path}")).into()),
        }
    }

    fn clientlibs(&self) -> Result<Vec<Resource>> {
        Ok(self
            .nodes
            .iter()
            .map(|(p, node)| Self::to_resource(p, node))
            .filter(Resource::is_clientlib)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_are_created_and_children_listed() {
        let tree = MemoryTree::new()
            .file("/libs/app/js/b.js", "b")
            .file("/libs/app/js/a.js", "a");
        let names: Vec<String> = tree
            .children("/libs/app/js")
            .unwrap()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["a.js".to_string(), "b.js".to_string()]);
        assert!(tree.resource("/libs/app").unwrap().is_some());
        assert_eq!(tree.read("/libs/app/js/a.js").unwrap(), b"a");
        assert!(tree.read("/libs/app/js").is_err());
    }
}
