//! High-resolution fetch seam.
//!
//! The fetcher is only a completion signal: nothing it loads is displayed
//! directly. The host shows the URL itself once the fetch reports success.

use crate::candidate::CandidateId;
use crate::error::LoaderError;

/// Result delivered to [`ViewportLoader::complete_load`](crate::ViewportLoader::complete_load).
pub type LoadOutcome = Result<(), LoaderError>;

/// Platform image-loading primitive.
pub trait ImageFetcher {
    /// Start loading `url` for `candidate`.
    ///
    /// Completion must be reported asynchronously, exactly once, through
    /// `complete_load(candidate, outcome)`. An `Err` here means the fetch never
    /// started and no completion will follow.
    fn fetch(&mut self, candidate: CandidateId, url: &str) -> Result<(), LoaderError>;

    /// Abort an in-flight load.
    ///
    /// Platform image loads cannot be aborted, so the default reports the gap.
    fn cancel(&mut self, candidate: CandidateId) -> Result<(), LoaderError> {
        let _ = candidate;
        Err(LoaderError::CancellationUnsupported)
    }
}
