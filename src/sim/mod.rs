//! Headless host for the loader.
//!
//! An in-memory page, a virtual-clock scheduler and a recording fetcher.
//! Used by the test-suite and by the `lazyload-sim` binary to replay scroll
//! scenarios without a browser.

mod clock;
mod fetch;
mod page;
mod scenario;

pub use clock::{CallbackKind, Scheduled, VirtualScheduler};
pub use fetch::RecordingFetcher;
pub use page::{ClickOutcome, ScrollOffsetSource, SimImage, SimulatedPage};
pub use scenario::{
    CandidateReport, ClickReport, Scenario, ScenarioAction, ScenarioError, ScenarioEvent,
    SimLoader, Simulation, SimulationReport,
};
