use clientlib_model::ModelError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a reference produced no element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No resource at the preferred path (or any search path)
    NotFound,
    /// A category no clientlib of the requested type contributes to
    EmptyCategory,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not found",
            Self::EmptyCategory => "empty category",
        })
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Broken declaration (bad rule, bad category name)
    #[error("Invalid declaration: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid properties at {path}: {source}")]
    Properties {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A mandatory reference that could not be resolved
    #[error("Missing mandatory reference {reference}: {reason}")]
    MissingReference {
        reference: String,
        reason: UnresolvedReason,
    },

    #[error("Minification failed for {path}: {message}")]
    Minify { path: String, message: String },
}

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Errors caused by the asset declarations rather than by storage.
    #[must_use]
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::Model(_) | Self::Properties { .. } | Self::MissingReference { .. }
        )
    }
}
