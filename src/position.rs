//! Cached layout positions.
//!
//! Layout is queried once per candidate at discovery and again only when the
//! host asks for it. Between those points the cached values may be stale if
//! the page reflows; that is the price of keeping layout queries (and the
//! synchronous reflow they force) off the scroll path.

use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, CandidateTable};
use crate::document::Document;

/// Vertical bounds of an element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub bottom: f64,
}

impl Position {
    /// Create a position from a top edge and a height.
    pub fn from_top_and_height(top: f64, height: f64) -> Self {
        Self {
            top,
            bottom: top + height,
        }
    }

    /// Edges as `(low, high)`, tolerating inverted rectangles.
    pub fn ordered(&self) -> (f64, f64) {
        if self.top <= self.bottom {
            (self.top, self.bottom)
        } else {
            (self.bottom, self.top)
        }
    }
}

/// Snapshot the layout rectangle of one candidate, overwriting any previous value.
pub fn capture<D: Document + ?Sized>(document: &D, candidate: &mut Candidate<D::Node>) {
    let position = document.layout_rect(&candidate.node);
    log::trace!("Captured {:?} at {:?}", candidate.id, position);
    candidate.position = Some(position);
}

/// Snapshot every candidate in the table.
pub fn capture_all<D: Document + ?Sized>(document: &D, table: &mut CandidateTable<D::Node>) {
    for candidate in table.iter_mut() {
        capture(document, candidate);
    }
    log::debug!("Captured positions for {} candidates", table.len());
}
