use super::{
    normalize_path, order_children, Resource, ResourceKind, ResourceProperties, ResourceTree,
};
use crate::error::{EngineError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Per-directory properties file
pub const PROPERTIES_FILE: &str = ".content.toml";

/// Resource tree backed by a directory. Every directory is a folder
/// resource, every regular file a file resource; hidden entries are skipped.
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn fs_path(&self, path: &str) -> Option<(String, PathBuf)> {
        let normalized = normalize_path(path)?;
        let relative = normalized.trim_start_matches('/');
        let fs_path = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        };
        Some((normalized, fs_path))
    }

    fn load(&self, path: String, fs_path: &Path) -> Result<Option<Resource>> {
        let meta = match fs::metadata(fs_path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if meta.is_file() {
            return Ok(Some(Resource {
                path,
                kind: ResourceKind::File,
                properties: ResourceProperties::default(),
            }));
        }
        let properties = read_properties(&path, &fs_path.join(PROPERTIES_FILE))?;
        Ok(Some(Resource {
            path,
            kind: ResourceKind::Folder,
            properties,
        }))
    }

    fn to_resource_path(&self, fs_path: &Path) -> Option<String> {
        let relative = fs_path.strip_prefix(&self.root).ok()?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Some(format!("/{joined}"))
    }
}

fn read_properties(path: &str, file: &Path) -> Result<ResourceProperties> {
    match fs::read_to_string(file) {
        Ok(raw) => toml::from_str(&raw).map_err(|err| EngineError::Properties {
            path: path.to_string(),
            source: err,
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ResourceProperties::default()),
        Err(err) => Err(err.into()),
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl ResourceTree for FsTree {
    fn resource(&self, path: &str) -> Result<Option<Resource>> {
        let Some((normalized, fs_path)) = self.fs_path(path) else {
            return Ok(None);
        };
        if normalized.rsplit('/').next().is_some_and(is_hidden) {
            return Ok(None);
        }
        self.load(normalized, &fs_path)
    }

    fn children(&self, path: &str) -> Result<Vec<Resource>> {
        let Some(parent) = self.resource(path)? else {
            return Ok(Vec::new());
        };
        if parent.is_file() {
            return Ok(Vec::new());
        }
        let Some((normalized, fs_path)) = self.fs_path(path) else {
            return Ok(Vec::new());
        };

        let mut children = Vec::new();
        for entry in fs::read_dir(&fs_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }
            let child_path = if normalized == "/" {
                format!("/{name}")
            } else {
                format!("{normalized}/{name}")
            };
            if let Some(child) = self.load(child_path, &entry.path())? {
                children.push(child);
            }
        }
        order_children(&mut children, &parent.properties.child_order);
        Ok(children)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let (_, fs_path) = self.fs_path(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("invalid path: {path}"))
        })?;
        Ok(fs::read(fs_path)?)
    }

    fn clientlibs(&self) -> Result<Vec<Resource>> {
        let mut found = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
        for entry in walker {
            let entry = entry.map_err(|err| {
                io::Error::new(io::ErrorKind::Other, format!("walk failed: {err}"))
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(path) = self.to_resource_path(entry.path()) else {
                continue;
            };
            let properties = match read_properties(&path, &entry.path().join(PROPERTIES_FILE)) {
                Ok(properties) => properties,
                Err(err) => {
                    log::warn!("Skipping {path} while scanning for clientlibs: {err}");
                    continue;
                }
            };
            let resource = Resource {
                path,
                kind: ResourceKind::Folder,
                properties,
            };
            if resource.is_clientlib() {
                found.push(resource);
            }
        }
        Ok(found)
    }
}
