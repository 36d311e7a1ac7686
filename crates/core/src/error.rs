//! Error types for deck analysis.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading slides or talking to the reasoning service.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input is not a supported slide folder or presentation.
    #[error("Unsupported or unrecognized input: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A required configuration value is absent.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// The reasoning service did not answer in time.
    #[error("Reasoning service timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Transport or protocol failure talking to the reasoning service.
    #[error("Reasoning service error: {0}")]
    ServiceError(String),

    /// The service answered, but not with the JSON we asked for.
    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
