//! Fetcher that records requests instead of loading anything.

use crate::candidate::CandidateId;
use crate::error::LoaderError;
use crate::fetch::ImageFetcher;

/// Records every fetch; completion is delivered by whoever drives the loader.
#[derive(Debug, Clone, Default)]
pub struct RecordingFetcher {
    requests: Vec<(CandidateId, String)>,
    refuse: bool,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every fetch at start, as if the image primitive were missing.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// All requests in the order they were made.
    pub fn requests(&self) -> &[(CandidateId, String)] {
        &self.requests
    }

    /// How many times `id` was fetched.
    pub fn count_for(&self, id: CandidateId) -> usize {
        self.requests.iter().filter(|(c, _)| *c == id).count()
    }
}

impl ImageFetcher for RecordingFetcher {
    fn fetch(&mut self, candidate: CandidateId, url: &str) -> Result<(), LoaderError> {
        self.requests.push((candidate, url.to_string()));
        if self.refuse {
            return Err(LoaderError::fetch_failed(url, "image loading unavailable"));
        }
        Ok(())
    }
}
