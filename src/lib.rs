//! lazyload - viewport-driven progressive image loading
//!
//! Pages ship small low-resolution placeholders (marked with the `lazy--low`
//! class) wrapped in a link to the full image. The loader watches the
//! viewport, and once a placeholder scrolls into view it fetches the full
//! image and swaps it in as the container's background.
//!
//! The state machine in [`ViewportLoader`] is host-agnostic. On `wasm32` the
//! [`LazyLoader`] binding drives it against the live DOM; elsewhere the
//! [`sim`] module provides a headless page and a virtual clock.

mod candidate;
mod config;
mod constants;
mod document;
mod error;
mod fetch;
mod loader;
mod position;
mod scheduler;
pub mod sim;
mod viewport;
mod visibility;

pub use candidate::{Candidate, CandidateId, CandidateTable, DiscoveryStats, LoadState};
pub use config::{Capabilities, ConfigError, LoaderConfig, LoaderSettings, LogLevel};
pub use constants::*;
pub use document::Document;
pub use error::LoaderError;
pub use fetch::{ImageFetcher, LoadOutcome};
pub use loader::{LoaderStats, ViewportLoader};
pub use position::Position;
pub use scheduler::{CheckScheduler, PendingCheck, Throttle, TimerHandle};
pub use viewport::{scroll_offset, ScrollMetrics, ViewportTracker, ViewportWindow};
pub use visibility::{is_visible, VisibilityRule};

// Browser binding
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::*;

#[cfg(test)]
mod tests;
