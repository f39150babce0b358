//! Candidate side table.
//!
//! Per-image loader state lives here, keyed by [`CandidateId`], instead of
//! being stamped onto host elements.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::position::Position;

/// Stable identifier of a candidate within one loader.
///
/// Ids are assigned at first discovery and never reused, so a completion for a
/// load started before a re-discovery still finds its record (or nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CandidateId(u64);

impl CandidateId {
    /// Raw serial number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Progress of a candidate's high-resolution load. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// Placeholder shown, no fetch started
    #[default]
    Idle,
    /// Fetch started, waiting for completion
    Loading,
    /// High-resolution image shown; terminal
    Loaded,
}

/// One lazy-loadable image.
#[derive(Debug, Clone)]
pub struct Candidate<N> {
    pub id: CandidateId,
    /// Host handle to the placeholder element
    pub node: N,
    /// High-resolution URL
    pub source_url: String,
    /// Cached layout bounds, `None` until captured
    pub position: Option<Position>,
    state: LoadState,
}

impl<N> Candidate<N> {
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// `Idle -> Loading`. Returns false (and changes nothing) from any other state.
    pub fn begin_loading(&mut self) -> bool {
        if self.state == LoadState::Idle {
            self.state = LoadState::Loading;
            true
        } else {
            false
        }
    }

    /// `Loading -> Loaded`. Returns false (and changes nothing) from any other state.
    pub fn finish_loading(&mut self) -> bool {
        if self.state == LoadState::Loading {
            self.state = LoadState::Loaded;
            true
        } else {
            false
        }
    }
}

/// Counts from one re-discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Nodes already known, record kept
    pub kept: usize,
    /// Nodes seen for the first time
    pub added: usize,
    /// Idle or loaded records whose node is no longer marked
    pub dropped: usize,
    /// In-flight records whose node is no longer marked
    pub detached: usize,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Attached(usize),
    Detached(usize),
}

/// Candidates in discovery order with an id index.
///
/// A `Loading` record whose node disappears from the document is parked as
/// detached: visibility passes no longer see it, but its completion still
/// finds it by id and a returning node picks it up again.
#[derive(Debug, Clone)]
pub struct CandidateTable<N> {
    records: Vec<Candidate<N>>,
    detached: Vec<Candidate<N>>,
    index: HashMap<CandidateId, Slot>,
    next_id: u64,
}

impl<N> Default for CandidateTable<N> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            detached: Vec::new(),
            index: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<N> CandidateTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached candidates.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// In-flight records whose node is currently missing from the document.
    pub fn detached(&self) -> impl Iterator<Item = &Candidate<N>> {
        self.detached.iter()
    }

    /// Iterate attached candidates in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate<N>> {
        self.records.iter()
    }

    /// Iterate attached candidates mutably in discovery order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Candidate<N>> {
        self.records.iter_mut()
    }

    /// Look up a record, attached or detached.
    pub fn get(&self, id: CandidateId) -> Option<&Candidate<N>> {
        match *self.index.get(&id)? {
            Slot::Attached(i) => self.records.get(i),
            Slot::Detached(i) => self.detached.get(i),
        }
    }

    pub fn get_mut(&mut self, id: CandidateId) -> Option<&mut Candidate<N>> {
        match *self.index.get(&id)? {
            Slot::Attached(i) => self.records.get_mut(i),
            Slot::Detached(i) => self.detached.get_mut(i),
        }
    }

    /// Number of records in `state`, detached ones included.
    pub fn count_in(&self, state: LoadState) -> usize {
        self.records
            .iter()
            .chain(&self.detached)
            .filter(|c| c.state == state)
            .count()
    }

    fn rebuild_index(&mut self) {
        let attached = self
            .records
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, Slot::Attached(i)));
        let detached = self
            .detached
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, Slot::Detached(i)));
        self.index = attached.chain(detached).collect();
    }
}

impl<N: PartialEq> CandidateTable<N> {
    /// Replace the candidate list with `found`, in its order.
    ///
    /// Nodes already in the table (detached ones included) keep their id,
    /// state and cached position, so a node is never loaded twice because it
    /// was re-discovered. Missing `Loading` records are detached, other
    /// missing records are dropped.
    pub fn rediscover(&mut self, found: impl IntoIterator<Item = (N, String)>) -> DiscoveryStats {
        let mut previous = std::mem::take(&mut self.records);
        previous.append(&mut self.detached);
        let mut stats = DiscoveryStats::default();

        for (node, source_url) in found {
            if self.records.iter().any(|c| c.node == node) {
                continue;
            }
            if let Some(i) = previous.iter().position(|c| c.node == node) {
                let mut kept = previous.swap_remove(i);
                kept.source_url = source_url;
                self.records.push(kept);
                stats.kept += 1;
            } else {
                let id = CandidateId(self.next_id);
                self.next_id += 1;
                self.records.push(Candidate {
                    id,
                    node,
                    source_url,
                    position: None,
                    state: LoadState::Idle,
                });
                stats.added += 1;
            }
        }

        for record in previous {
            if record.state == LoadState::Loading {
                self.detached.push(record);
            } else {
                stats.dropped += 1;
            }
        }
        stats.detached = self.detached.len();
        self.rebuild_index();
        stats
    }
}
