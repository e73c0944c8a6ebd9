//! Custom error types for Gondola
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

use crate::core::types::Control;

/// Main error type for Gondola operations
#[derive(Error, Debug)]
pub enum GondolaError {
    /// Browser automation errors
    #[error("Browser error: {0}")]
    Browser(String),

    /// A browser command did not finish in time
    #[error("Timed out after {millis}ms while running '{action}'")]
    Timeout { action: String, millis: u64 },

    /// A required page control could not be located by any strategy
    #[error("Could not locate the {0}")]
    ElementNotFound(Control),

    /// CSS selector compilation errors
    #[error("Selector error: {0}")]
    Selector(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Agent-browser not installed
    #[error("agent-browser not found. Install with: npm install -g agent-browser && agent-browser install")]
    AgentBrowserNotFound,

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Gondola operations
pub type Result<T> = std::result::Result<T, GondolaError>;

impl GondolaError {
    /// Create a browser error
    pub fn browser(msg: impl Into<String>) -> Self {
        Self::Browser(msg.into())
    }

    /// Create a selector error
    pub fn selector(msg: impl Into<String>) -> Self {
        Self::Selector(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Whether the error aborts the whole collection run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound(_) | Self::AgentBrowserNotFound | Self::Config(_)
        )
    }
}
