//! Error types for color parsing, surfaces and filter dispatch.
//!
//! A buffer with no pixels is not an error: mutating passes report that
//! nothing ran and queries return `None`.

use thiserror::Error;

/// Error type for filter operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A color string or component set could not be turned into a color.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The target cannot hand out or accept pixel data.
    #[error("not a renderable surface: {0}")]
    NotARenderableSurface(String),

    /// A named filter or color method does not exist.
    #[error("unknown filter method: {0}")]
    UnknownFilterMethod(String),

    /// Pixel data does not match the declared dimensions.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;
