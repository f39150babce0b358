//! The viewport loader state machine.
//!
//! [`ViewportLoader`] ties the pieces together: it discovers candidates,
//! caches their positions, throttles re-checks requested by scroll events and
//! swaps each visible placeholder for its high-resolution image exactly once.
//!
//! The loader is synchronous and host-agnostic. Hosts drive it by calling
//! [`request_check`](ViewportLoader::request_check) on scroll,
//! [`timer_elapsed`](ViewportLoader::timer_elapsed) /
//! [`frame_ready`](ViewportLoader::frame_ready) from scheduler callbacks and
//! [`complete_load`](ViewportLoader::complete_load) when a fetch finishes.

use serde::Serialize;
use web_time::Instant;

use crate::candidate::{CandidateId, CandidateTable, LoadState};
use crate::config::{Capabilities, LoaderConfig, LoaderSettings};
use crate::document::Document;
use crate::error::LoaderError;
use crate::fetch::{ImageFetcher, LoadOutcome};
use crate::position;
use crate::scheduler::{CheckScheduler, PendingCheck, Throttle, TimerHandle};
use crate::viewport::{ScrollMetrics, ViewportTracker, ViewportWindow};
use crate::visibility::is_visible;

/// Running counters, mostly for logging and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderStats {
    /// Visibility passes run
    pub checks_run: u64,
    /// Scroll requests absorbed by a pending check
    pub coalesced_requests: u64,
    /// Fetches started
    pub loads_started: u64,
    /// Swaps applied
    pub loads_completed: u64,
    /// Fetches that failed to start or reported failure
    pub loads_failed: u64,
    /// Completions received for already loaded candidates
    pub duplicate_completions: u64,
}

/// Progressive image loader bound to one document.
pub struct ViewportLoader<D: Document, S, F> {
    document: D,
    scheduler: S,
    fetcher: F,
    settings: LoaderSettings,
    tracker: ViewportTracker,
    candidates: CandidateTable<D::Node>,
    throttle: Throttle,
    stats: LoaderStats,
}

impl<D, S, F> ViewportLoader<D, S, F>
where
    D: Document + ScrollMetrics,
    S: CheckScheduler,
    F: ImageFetcher,
{
    /// Create a loader. Host capabilities are detected here, once.
    ///
    /// Nothing is discovered until [`init`](Self::init).
    pub fn new(document: D, scheduler: S, fetcher: F, config: &LoaderConfig) -> Self {
        let capabilities = Capabilities {
            pointer_events: document.supports_pointer_events(),
        };
        let settings = LoaderSettings::resolve(config, capabilities);
        log::debug!(
            "Loader settings: delay {:?}, rule {:?}, margin {}, click shim {}",
            settings.throttle_delay,
            settings.visibility,
            settings.preload_margin,
            settings.install_click_shim
        );

        Self {
            document,
            scheduler,
            fetcher,
            tracker: ViewportTracker::new(settings.preload_margin),
            settings,
            candidates: CandidateTable::new(),
            throttle: Throttle::default(),
            stats: LoaderStats::default(),
        }
    }

    /// Discover candidates and run the first check immediately, outside the
    /// throttle window, so images above the fold load without a scroll.
    ///
    /// Returns the number of loads started by that first pass.
    pub fn init(&mut self) -> usize {
        let count = self.rediscover();
        let started = self.run_check();
        log::info!(
            "Lazy loader ready: {} candidates, {} loading in the initial view",
            count,
            started
        );
        started
    }

    /// Rebuild the candidate list from the document and recapture every position.
    ///
    /// Call after mutating the document. Candidates seen before keep their
    /// state, so nothing already loading or loaded is fetched again. A loading
    /// candidate whose element went missing stays reachable by id until its
    /// element returns or its load completes.
    pub fn rediscover(&mut self) -> usize {
        let document = &self.document;
        let found: Vec<_> = document
            .low_res_nodes(&self.settings.low_res_class)
            .into_iter()
            .filter_map(|node| match document.source_url(&node) {
                Some(url) => Some((node, url)),
                None => {
                    log::warn!("Skipping placeholder without a source URL");
                    None
                }
            })
            .collect();

        let stats = self.candidates.rediscover(found);
        position::capture_all(&self.document, &mut self.candidates);
        log::info!(
            "Discovered {} candidates ({} new, {} kept, {} dropped, {} detached in flight)",
            self.candidates.len(),
            stats.added,
            stats.kept,
            stats.dropped,
            stats.detached
        );
        self.candidates.len()
    }

    /// Recapture positions after images moved without the list changing.
    pub fn refresh_positions(&mut self) {
        position::capture_all(&self.document, &mut self.candidates);
    }

    /// Ask for a visibility check. Bound to scroll (and resize) events.
    ///
    /// Coalesces: while a check is pending this does nothing and returns
    /// false. Otherwise the throttle token is taken before returning true.
    pub fn request_check(&mut self) -> bool {
        if self.throttle.is_pending() {
            self.stats.coalesced_requests += 1;
            log::trace!("Check already pending, coalescing");
            return false;
        }

        match self.scheduler.set_timeout(self.settings.throttle_delay) {
            Ok(handle) => {
                self.throttle.set(PendingCheck::Delay(handle));
                log::trace!("Scheduled check on {}", handle);
            }
            Err(e) => {
                log::warn!("Throttle timer unavailable ({}), checking now", e);
                self.run_check();
            }
        }
        true
    }

    /// Scheduler callback: the throttle delay for `handle` elapsed.
    ///
    /// Hands over to a frame callback when the scheduler has one, otherwise
    /// runs the check directly. Stale handles are ignored.
    pub fn timer_elapsed(&mut self, handle: TimerHandle) {
        if !self.throttle.awaits_delay(handle) {
            log::debug!("Ignoring stale {}", handle);
            return;
        }

        if self.scheduler.supports_frames() {
            match self.scheduler.request_frame() {
                Ok(frame) => {
                    self.throttle.set(PendingCheck::Frame(frame));
                    return;
                }
                Err(e) => log::debug!("Frame request failed ({}), checking now", e),
            }
        }
        self.run_check();
    }

    /// Scheduler callback: the frame for `handle` is about to paint.
    pub fn frame_ready(&mut self, handle: TimerHandle) {
        if self.throttle.awaits_frame(handle) {
            self.run_check();
        } else {
            log::debug!("Ignoring stale frame {}", handle);
        }
    }

    /// One visibility pass over every idle candidate.
    ///
    /// The window is read once and shared by the whole pass. Each visible
    /// candidate is marked `Loading` before its fetch starts. The throttle is
    /// released at the end no matter how many loads started.
    pub fn run_check(&mut self) -> usize {
        let started_at = Instant::now();
        let window = self.tracker.refresh(&self.document);
        let rule = self.settings.visibility;
        let mut started = 0;

        for candidate in self.candidates.iter_mut() {
            if candidate.state() != LoadState::Idle {
                continue;
            }
            let Some(position) = candidate.position else {
                continue;
            };
            if !is_visible(position, window, rule) {
                continue;
            }

            candidate.begin_loading();
            started += 1;
            log::debug!(
                "{} in view at {:?}, loading {}",
                candidate.id,
                position,
                candidate.source_url
            );
            if let Err(e) = self.fetcher.fetch(candidate.id, &candidate.source_url) {
                self.stats.loads_failed += 1;
                log::warn!("Could not start load for {}: {}", candidate.id, e);
            }
        }

        self.stats.checks_run += 1;
        self.stats.loads_started += started as u64;
        self.throttle.clear();
        log::debug!(
            "Check over [{}, {}] started {} loads in {:?}",
            window.min,
            window.max,
            started,
            started_at.elapsed()
        );
        started
    }

    /// Deliver the result of a fetch started by [`run_check`](Self::run_check).
    ///
    /// On success the swap is applied and the candidate becomes `Loaded`.
    /// Duplicate completions are no-ops. On failure the candidate stays
    /// `Loading` for good; there is no retry.
    pub fn complete_load(&mut self, id: CandidateId, outcome: LoadOutcome) {
        let Some(candidate) = self.candidates.get_mut(id) else {
            log::debug!("Completion for unknown candidate {}", id);
            return;
        };

        match (candidate.state(), outcome) {
            (LoadState::Loaded, _) => {
                self.stats.duplicate_completions += 1;
                log::debug!("{} already loaded, ignoring completion", id);
            }
            (LoadState::Idle, _) => {
                log::warn!("Completion for {} which never started loading", id);
            }
            (LoadState::Loading, Err(e)) => {
                self.stats.loads_failed += 1;
                log::warn!("High-resolution load for {} failed: {}", id, e);
            }
            (LoadState::Loading, Ok(())) => {
                if let Err(e) = self.document.show_high_res(
                    &candidate.node,
                    &candidate.source_url,
                    &self.settings.hidden_class,
                ) {
                    log::warn!("Could not swap {}: {}", id, e);
                }
                if self.settings.install_click_shim {
                    if let Err(e) = self.document.block_clicks(&candidate.node) {
                        log::warn!("Could not block clicks on {}: {}", id, e);
                    }
                }
                candidate.finish_loading();
                self.stats.loads_completed += 1;
                log::debug!("{} swapped to {}", id, candidate.source_url);
            }
        }
    }

    /// Try to abort the fetch of `id`. Its state is left untouched.
    pub fn cancel_load(&mut self, id: CandidateId) -> Result<(), LoaderError> {
        self.fetcher.cancel(id)
    }
}

impl<D: Document, S, F> ViewportLoader<D, S, F> {
    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    pub fn candidates(&self) -> &CandidateTable<D::Node> {
        &self.candidates
    }

    /// State of `id`, or `None` if it is not (or no longer) a candidate.
    pub fn state_of(&self, id: CandidateId) -> Option<LoadState> {
        self.candidates.get(id).map(|c| c.state())
    }

    /// Window used by the last check.
    pub fn window(&self) -> ViewportWindow {
        self.tracker.window()
    }

    /// Whether the throttle is holding a token.
    pub fn is_check_pending(&self) -> bool {
        self.throttle.is_pending()
    }

    pub fn pending_check(&self) -> Option<PendingCheck> {
        self.throttle.pending()
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }
}
