use crate::element::{Category, Clientlib, ClientlibFile, ExternalUri, ResourceFolder};
use crate::error::Result;
use serde::Serialize;

/// Traversal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitMode {
    /// Output is inlined into the requesting bundle
    Embedded,
    /// Output is a separate artifact loaded before the requester
    Depends,
}

/// One method per element variant; see [`crate::Element::accept`].
pub trait Visitor {
    fn visit_clientlib(
        &mut self,
        lib: &Clientlib,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()>;

    fn visit_category(
        &mut self,
        category: &Category,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()>;

    fn visit_folder(
        &mut self,
        folder: &ResourceFolder,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()>;

    fn visit_file(
        &mut self,
        file: &ClientlibFile,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()>;

    fn visit_external(
        &mut self,
        external: &ExternalUri,
        mode: VisitMode,
        parent: Option<&ResourceFolder>,
    ) -> Result<()>;
}
