//! # Clientlib Engine
//!
//! Resolves clientlib declarations against a resource tree and renders the
//! resulting bundles.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌─────────────┐   ┌──────────┐
//! │ ResourceTree │──▶│  Loader  │──▶│ PlanBuilder │──▶│ Renderer │──▶ Bundle
//! │ (fs, memory) │   │ elements │   │  (Visitor)  │   │ + hash   │
//! └──────────────┘   └──────────┘   └─────────────┘   └──────────┘
//!                                          │
//!                                          ▼
//!                                   links ──▶ LinkRenderer ──▶ HTML tags
//! ```
//!
//! [`Engine`] ties these together behind one request type,
//! [`BundleRequest`]. Elements are rebuilt from the tree on every call;
//! nothing is cached between requests.

mod config;
mod element;
mod engine;
mod error;
mod loader;
mod minify;
mod plan;
mod render;
pub mod tree;
mod urls;
mod visitor;

pub use config::EngineConfig;
pub use element::{Category, Clientlib, ClientlibFile, Element, ExternalUri, ResourceFolder};
pub use engine::{BundleRequest, Delivery, Engine, Target};
pub use error::{EngineError, Result, UnresolvedReason};
pub use loader::{Loader, Resolution};
pub use minify::{Minifier, WhitespaceMinifier};
pub use plan::{
    EmbeddedFile, PlanBuilder, PlanOptions, RenderPlan, ResolvedEntry, UnresolvedEntry,
};
pub use render::{content_hash, Bundle, Renderer, HASH_LEN};
pub use urls::{LinkRenderer, PrefixMapper, UrlMapper};
pub use visitor::{VisitMode, Visitor};
