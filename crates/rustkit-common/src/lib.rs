//! # RustKit Common
//!
//! Common error types and logging configuration shared by the RustKit
//! DOM and SVG crates.
//!
//! ## Features
//!
//! - Unified error type with backtrace support for internal failures
//! - Logging configuration and setup
//! - `ResultExt::context` for wrapping foreign errors

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, try_init_logging, LogConfig, LogFormat};

/// Unified error type for RustKit.
#[derive(Error, Debug)]
pub enum RustKitError {
    /// DOM-related errors.
    #[error("DOM error: {message}")]
    Dom {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// SVG-related errors (attribute values, IDL setters, geometry).
    #[error("SVG error: {message}")]
    Svg {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        backtrace: Option<backtrace::Backtrace>,
    },
}

impl RustKitError {
    /// Create a DOM error.
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
            source: None,
        }
    }

    /// Create a DOM error with source.
    pub fn dom_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Dom {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an SVG error.
    pub fn svg(message: impl Into<String>) -> Self {
        Self::Svg {
            message: message.into(),
            source: None,
        }
    }

    /// Create an SVG error with source.
    pub fn svg_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Svg {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source.
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error with backtrace.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            RustKitError::Dom { .. } => "dom",
            RustKitError::Svg { .. } => "svg",
            RustKitError::Config { .. } => "config",
            RustKitError::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for RustKit operations.
pub type Result<T> = std::result::Result<T, RustKitError>;

/// Extension trait for Result.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| RustKitError::Internal {
            message: format!("{}: {}", message.into(), e),
            backtrace: Some(backtrace::Backtrace::new()),
        })
    }
}
