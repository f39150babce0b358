//! Error types for loader operations.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while driving a [`ViewportLoader`](crate::ViewportLoader)
/// or binding it to a host environment.
///
/// None of these are fatal to the loader itself: scheduling failures fall back
/// to an immediate check and fetch failures leave the candidate in `Loading`.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// No global `window` object (e.g. running inside a worker)
    #[error("No window object available")]
    NoWindow,

    /// The window has no document attached
    #[error("No document available")]
    NoDocument,

    /// A JavaScript call threw
    #[error("{context}: {message}")]
    Js {
        /// What the loader was doing when the call failed
        context: &'static str,
        /// Stringified JS exception
        message: String,
    },

    /// The timer or frame primitive refused a callback
    #[error("Timer unavailable: {0}")]
    TimerUnavailable(String),

    /// The high-resolution image failed to load
    #[error("Failed to fetch '{url}': {message}")]
    FetchFailed {
        /// URL that was requested
        url: String,
        /// Description of the failure
        message: String,
    },

    /// In-flight loads cannot be cancelled by this fetcher
    #[error("Cancelling an in-flight image load is not supported")]
    CancellationUnsupported,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LoaderError {
    /// Create a JS error from a context and a stringified exception.
    pub fn js(context: &'static str, message: impl Into<String>) -> Self {
        Self::Js {
            context,
            message: message.into(),
        }
    }

    /// Create a fetch failure error.
    pub fn fetch_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.into(),
            message: message.into(),
        }
    }
}
