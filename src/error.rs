//! Error types for quote loading, rendering and export

use thiserror::Error;

/// Result type for devis operations
pub type Result<T> = std::result::Result<T, DevisError>;

/// Errors that can occur while loading, rendering or exporting a quote
#[derive(Error, Debug)]
pub enum DevisError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A TOML record could not be parsed
    #[error("TOML parsing failed: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// A record could not be serialized to TOML
    #[error("TOML serialization failed: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// A JSON payload could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tera template error
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Backend returned {status} for {url}")]
    Backend { status: u16, url: String },

    /// No quote with that number
    #[error("Quote not found: {0}")]
    QuoteNotFound(String),

    /// The typst compiler is not on PATH
    #[error("'{0}' is not installed. Please install typst (https://typst.app).")]
    TypstMissing(String),

    /// Typst ran but did not produce a PDF
    #[error("Typst compilation failed: {0}")]
    TypstFailed(String),

    /// Logo or signature could not be loaded
    #[error("Image error: {0}")]
    Image(String),

    /// Share link could not be composed
    #[error("Cannot share: {0}")]
    Share(String),

    /// Interactive prompt cancelled or failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    /// Archive error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Settings problem
    #[error("Configuration error: {0}")]
    Config(String),
}
