//! Deferred check scheduling.
//!
//! A throttled check goes through two callbacks: a fixed-delay timer, then
//! (when the host has one) a frame callback so the pass lines up with paint.
//! The loader tracks which callback it is waiting for in a [`PendingCheck`].

use std::fmt;
use std::time::Duration;

use crate::error::LoaderError;

/// Opaque identifier of a scheduled callback.
///
/// The numeric value carries no meaning; `0` is as valid as any other id.
/// "Nothing scheduled" is expressed as `Option::None` by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u32);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer {}", self.0)
    }
}

/// Host timer primitives.
///
/// Implementations call back into the loader asynchronously:
/// [`ViewportLoader::timer_elapsed`](crate::ViewportLoader::timer_elapsed) for
/// timeouts and [`ViewportLoader::frame_ready`](crate::ViewportLoader::frame_ready)
/// for frames, passing back the handle returned here. They must never call back
/// synchronously from inside `set_timeout` or `request_frame`.
pub trait CheckScheduler {
    /// Whether `request_frame` is available.
    fn supports_frames(&self) -> bool;

    /// Call back once after `delay`.
    fn set_timeout(&mut self, delay: Duration) -> Result<TimerHandle, LoaderError>;

    /// Call back once before the next paint.
    fn request_frame(&mut self) -> Result<TimerHandle, LoaderError>;
}

/// The callback a throttled check is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCheck {
    /// Waiting for the throttle delay to elapse
    Delay(TimerHandle),
    /// Delay elapsed, waiting for the next frame
    Frame(TimerHandle),
}

/// Throttle token holder. `Ready` when empty, `Throttled` otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throttle {
    pending: Option<PendingCheck>,
}

impl Throttle {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<PendingCheck> {
        self.pending
    }

    pub fn set(&mut self, check: PendingCheck) {
        self.pending = Some(check);
    }

    /// Back to `Ready`.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Whether a delay callback for `handle` is the one being waited on.
    pub fn awaits_delay(&self, handle: TimerHandle) -> bool {
        self.pending == Some(PendingCheck::Delay(handle))
    }

    /// Whether a frame callback for `handle` is the one being waited on.
    pub fn awaits_frame(&self, handle: TimerHandle) -> bool {
        self.pending == Some(PendingCheck::Frame(handle))
    }
}
