//! Scripted scroll scenarios replayed on the virtual clock.
//!
//! A scenario describes a page, a list of timed user actions and how the
//! network behaves. [`Simulation::run`] drives a real [`ViewportLoader`]
//! through it and reports what ended up loaded.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateId, LoadState};
use crate::config::{ConfigError, LoaderConfig};
use crate::constants::SIM_DEFAULT_FETCH_LATENCY_MS;
use crate::error::LoaderError;
use crate::loader::{LoaderStats, ViewportLoader};
use crate::position::Position;

use super::clock::{CallbackKind, VirtualScheduler};
use super::fetch::RecordingFetcher;
use super::page::{ClickOutcome, ScrollOffsetSource, SimImage, SimulatedPage};

/// Loader type driven by a simulation.
pub type SimLoader = ViewportLoader<SimulatedPage, VirtualScheduler, RecordingFetcher>;

/// Errors that can occur when loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid loader config in scenario: {0}")]
    Config(#[from] ConfigError),
}

/// A user action at a point in time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScenarioAction {
    /// Scroll to an absolute offset
    Scroll { to: f64 },
    /// Change the viewport height
    Resize { height: f64 },
    /// Reflow an image to a new top edge
    MoveImage { index: usize, top: f64 },
    /// Ask the loader to recapture positions
    RefreshPositions,
    /// Append an image and ask the loader to rediscover
    AddImage { image: SimImage },
    /// Click an image container
    Click { index: usize },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioEvent {
    pub at_ms: u64,
    pub action: ScenarioAction,
}

fn default_true() -> bool {
    true
}

fn default_latency() -> u64 {
    SIM_DEFAULT_FETCH_LATENCY_MS
}

/// Page, environment and script.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub config: LoaderConfig,
    pub viewport_height: f64,
    #[serde(default)]
    pub offset_source: ScrollOffsetSource,
    #[serde(default = "default_true")]
    pub pointer_events: bool,
    #[serde(default = "default_true")]
    pub frames: bool,
    #[serde(default = "default_latency")]
    pub fetch_latency_ms: u64,
    /// URLs whose fetch reports failure
    #[serde(default)]
    pub failing_urls: Vec<String>,
    pub images: Vec<SimImage>,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Final state of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateReport {
    pub id: CandidateId,
    pub url: String,
    pub state: LoadState,
    pub position: Option<Position>,
}

/// A click made during the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickReport {
    pub at_ms: u64,
    pub index: usize,
    #[serde(flatten)]
    pub outcome: ClickOutcome,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub finished_at_ms: u64,
    pub stats: LoaderStats,
    pub candidates: Vec<CandidateReport>,
    pub clicks: Vec<ClickReport>,
    pub images: Vec<SimImage>,
}

impl SimulationReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingCompletion {
    due: Duration,
    id: CandidateId,
    succeeds: bool,
}

enum Step {
    Completion(usize),
    Callback,
    Event,
}

/// Drives a loader through a scenario.
pub struct Simulation {
    loader: SimLoader,
    events: Vec<ScenarioEvent>,
    next_event: usize,
    completions: Vec<PendingCompletion>,
    fetches_seen: usize,
    latency: Duration,
    failing_urls: Vec<String>,
    check_on_resize: bool,
    clicks: Vec<ClickReport>,
}

impl Simulation {
    pub fn new(scenario: Scenario) -> Self {
        let page = SimulatedPage::with_images(scenario.viewport_height, scenario.images)
            .with_pointer_events(scenario.pointer_events)
            .with_offset_source(scenario.offset_source);
        let loader = ViewportLoader::new(
            page,
            VirtualScheduler::new(scenario.frames),
            RecordingFetcher::new(),
            &scenario.config,
        );

        let mut events = scenario.events;
        events.sort_by_key(|e| e.at_ms);

        Self {
            loader,
            events,
            next_event: 0,
            completions: Vec::new(),
            fetches_seen: 0,
            latency: Duration::from_millis(scenario.fetch_latency_ms),
            failing_urls: scenario.failing_urls,
            check_on_resize: scenario.config.check_on_resize,
            clicks: Vec::new(),
        }
    }

    pub fn loader(&self) -> &SimLoader {
        &self.loader
    }

    /// Run until no events, callbacks or completions remain.
    pub fn run(mut self) -> SimulationReport {
        self.loader.init();
        self.collect_fetches();

        while let Some((time, step)) = self.next_step() {
            self.loader.scheduler_mut().advance_to(time);
            match step {
                Step::Completion(index) => {
                    let completion = self.completions.remove(index);
                    let outcome = if completion.succeeds {
                        Ok(())
                    } else {
                        Err(LoaderError::fetch_failed(
                            self.url_of(completion.id),
                            "simulated network error",
                        ))
                    };
                    self.loader.complete_load(completion.id, outcome);
                }
                Step::Callback => {
                    if let Some(entry) = self.loader.scheduler_mut().pop_due(time) {
                        match entry.kind {
                            CallbackKind::Timeout => self.loader.timer_elapsed(entry.handle),
                            CallbackKind::Frame => self.loader.frame_ready(entry.handle),
                        }
                    }
                }
                Step::Event => {
                    let event = self.events[self.next_event].clone();
                    self.next_event += 1;
                    self.apply(event);
                }
            }
            self.collect_fetches();
        }

        self.report()
    }

    /// Earliest thing to happen; completions, then callbacks, then user events on ties.
    fn next_step(&self) -> Option<(Duration, Step)> {
        let completion = self
            .completions
            .iter()
            .enumerate()
            .min_by_key(|(i, c)| (c.due, *i))
            .map(|(i, c)| (c.due, Step::Completion(i)));
        let callback = self
            .loader
            .scheduler()
            .next_due()
            .map(|due| (due, Step::Callback));
        let event = self
            .events
            .get(self.next_event)
            .map(|e| (Duration::from_millis(e.at_ms), Step::Event));

        [completion, callback, event]
            .into_iter()
            .flatten()
            .min_by_key(|(time, step)| {
                let rank = match step {
                    Step::Completion(_) => 0,
                    Step::Callback => 1,
                    Step::Event => 2,
                };
                (*time, rank)
            })
    }

    fn apply(&mut self, event: ScenarioEvent) {
        log::debug!("t={}ms {:?}", event.at_ms, event.action);
        match event.action {
            ScenarioAction::Scroll { to } => {
                self.loader.document_mut().scroll_to(to);
                self.loader.request_check();
            }
            ScenarioAction::Resize { height } => {
                self.loader.document_mut().resize(height);
                if self.check_on_resize {
                    self.loader.request_check();
                }
            }
            ScenarioAction::MoveImage { index, top } => {
                self.loader.document_mut().move_image(index, top);
            }
            ScenarioAction::RefreshPositions => self.loader.refresh_positions(),
            ScenarioAction::AddImage { image } => {
                self.loader.document_mut().push(image);
                self.loader.rediscover();
            }
            ScenarioAction::Click { index } => {
                let outcome = self.loader.document().click(index);
                self.clicks.push(ClickReport {
                    at_ms: event.at_ms,
                    index,
                    outcome,
                });
            }
        }
    }

    /// Turn new fetch requests into completions `latency` from now.
    fn collect_fetches(&mut self) {
        let now = self.loader.scheduler().now();
        let requests = self.loader.fetcher().requests();
        for (id, url) in &requests[self.fetches_seen..] {
            self.completions.push(PendingCompletion {
                due: now + self.latency,
                id: *id,
                succeeds: !self.failing_urls.contains(url),
            });
        }
        self.fetches_seen = requests.len();
    }

    fn url_of(&self, id: CandidateId) -> String {
        self.loader
            .candidates()
            .get(id)
            .map(|c| c.source_url.clone())
            .unwrap_or_default()
    }

    fn report(self) -> SimulationReport {
        let candidates = self
            .loader
            .candidates()
            .iter()
            .map(|c| CandidateReport {
                id: c.id,
                url: c.source_url.clone(),
                state: c.state(),
                position: c.position,
            })
            .collect();

        SimulationReport {
            finished_at_ms: self.loader.scheduler().now().as_millis() as u64,
            stats: self.loader.stats(),
            candidates,
            clicks: self.clicks,
            images: self.loader.document().images().to_vec(),
        }
    }
}
