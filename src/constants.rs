//! Global constants for the lazy loader

/// Minimum spacing between visibility re-checks, in milliseconds
pub const DEFAULT_THROTTLE_DELAY_MS: u64 = 300;

/// Class marking a low-resolution placeholder image
pub const DEFAULT_LOW_RES_CLASS: &str = "lazy--low";

/// Class applied to a placeholder once the high-resolution image is shown
pub const DEFAULT_HIDDEN_CLASS: &str = "lazy--hide";

/// Attribute read from the container when it is not an anchor
pub const SOURCE_URL_ATTRIBUTE: &str = "data-src";

/// Frame interval used by the simulated scheduler (~60 Hz)
pub const SIM_FRAME_INTERVAL_MS: u64 = 16;

/// Default simulated latency of a high-resolution fetch
pub const SIM_DEFAULT_FETCH_LATENCY_MS: u64 = 120;
