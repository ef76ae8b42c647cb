//! Error types for the engine.

use thiserror::Error;

/// Result type used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by directive loading, function execution, configuration
/// handling or schema generation.
#[derive(Debug, Error)]
pub enum Error {
    /// A directive was constructed or loaded with an invalid shape.
    #[error("{0}")]
    Directive(String),

    /// A function could not be found or executed.
    #[error("{0}")]
    Function(String),

    /// The engine configuration is invalid.
    #[error("{0}")]
    Config(String),

    /// The schema document could not be collected or generated.
    #[error("{0}")]
    Schema(String),

    /// An I/O failure while reading configuration or model documents.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The configuration document is not valid YAML.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// A failure wrapped with higher-level context.
    #[error("{message}")]
    Chained {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps an error with a higher-level message, preserving the cause.
    pub fn chain(message: impl Into<String>, source: Error) -> Self {
        Self::Chained {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
