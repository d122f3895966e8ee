use anyhow::{Context as AnyhowContext, Result};
use clientlib_engine::EngineConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent
pub(crate) const DEFAULT_CONFIG_FILE: &str = "clientlibs.toml";

/// Contents of `clientlibs.toml`: deployment keys plus the engine table
/// flattened to the top level.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Directory mapped onto the resource tree root
    pub root: Option<PathBuf>,

    /// Bind address of `serve-http`
    pub bind: Option<String>,

    #[serde(flatten)]
    pub engine: EngineConfig,
}

impl Settings {
    /// Load `explicit`, else `clientlibs.toml` when present, else defaults.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    log::debug!("No {DEFAULT_CONFIG_FILE}; using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let settings = Self::parse(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw)?;
        settings.engine.validate()?;
        Ok(settings)
    }

    /// Tree root: the CLI flag wins over the file, the working directory is
    /// the last resort.
    pub(crate) fn root(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.root.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
