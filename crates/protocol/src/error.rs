use thiserror::Error;

/// Result type for address decoding
pub type Result<T> = std::result::Result<T, AddressError>;

/// Errors raised while decoding public clientlib addresses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A category request whose suffix is not `/[hash]/{category}.{ext}`
    #[error("Malformed category suffix '{suffix}' for extension '{extension}'")]
    MalformedCategorySuffix { suffix: String, extension: String },
}
