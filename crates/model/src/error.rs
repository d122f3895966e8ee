use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// A reference rule that does not compile to a match pattern
    #[error("Invalid reference rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Invalid category reference: {0}")]
    InvalidCategory(String),
}
