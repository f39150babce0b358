//! Virtual-time scheduler.

use std::time::Duration;

use crate::constants::SIM_FRAME_INTERVAL_MS;
use crate::error::LoaderError;
use crate::scheduler::{CheckScheduler, TimerHandle};

/// Which loader callback a scheduled entry fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Timeout,
    Frame,
}

/// A callback waiting on the virtual clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub due: Duration,
    pub handle: TimerHandle,
    pub kind: CallbackKind,
}

/// Scheduler whose clock only moves when told to.
///
/// Handles are issued from 0 upwards.
#[derive(Debug, Clone)]
pub struct VirtualScheduler {
    now: Duration,
    next_handle: u32,
    frames: bool,
    frame_interval: Duration,
    queue: Vec<Scheduled>,
    timers_available: bool,
    frames_fail: bool,
}

impl VirtualScheduler {
    pub fn new(frames: bool) -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            frames,
            frame_interval: Duration::from_millis(SIM_FRAME_INTERVAL_MS),
            queue: Vec::new(),
            timers_available: true,
            frames_fail: false,
        }
    }

    /// Make every `set_timeout` fail, as on a host without timers.
    pub fn without_timers(mut self) -> Self {
        self.timers_available = false;
        self
    }

    /// Advertise frame support but refuse every frame request.
    pub fn with_failing_frames(mut self) -> Self {
        self.frames = true;
        self.frames_fail = true;
        self
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward. Never moves backwards.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    /// Earliest due time of anything queued.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.iter().map(|s| s.due).min()
    }

    /// Remove and return the earliest entry due at or before `until`,
    /// advancing the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<Scheduled> {
        let (index, _) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(i, s)| (s.due, *i))?;
        let entry = self.queue.remove(index);
        self.advance_to(entry.due);
        Some(entry)
    }

    /// Number of callbacks still queued.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn enqueue(&mut self, delay: Duration, kind: CallbackKind) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.queue.push(Scheduled {
            due: self.now + delay,
            handle,
            kind,
        });
        handle
    }
}

impl CheckScheduler for VirtualScheduler {
    fn supports_frames(&self) -> bool {
        self.frames
    }

    fn set_timeout(&mut self, delay: Duration) -> Result<TimerHandle, LoaderError> {
        if !self.timers_available {
            return Err(LoaderError::TimerUnavailable("no timer source".to_string()));
        }
        Ok(self.enqueue(delay, CallbackKind::Timeout))
    }

    fn request_frame(&mut self) -> Result<TimerHandle, LoaderError> {
        if !self.frames {
            return Err(LoaderError::TimerUnavailable(
                "no frame callbacks".to_string(),
            ));
        }
        if self.frames_fail {
            return Err(LoaderError::TimerUnavailable(
                "frame request rejected".to_string(),
            ));
        }
        let interval = self.frame_interval;
        Ok(self.enqueue(interval, CallbackKind::Frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_at_zero() {
        let mut scheduler = VirtualScheduler::new(true);
        assert_eq!(
            scheduler.set_timeout(Duration::from_millis(300)).unwrap(),
            TimerHandle(0)
        );
        assert_eq!(scheduler.request_frame().unwrap(), TimerHandle(1));
    }

    #[test]
    fn test_pop_due_orders_by_time() {
        let mut scheduler = VirtualScheduler::new(true);
        scheduler.set_timeout(Duration::from_millis(300)).unwrap();
        scheduler.request_frame().unwrap();

        assert!(scheduler.pop_due(Duration::from_millis(10)).is_none());

        let first = scheduler.pop_due(Duration::from_secs(1)).unwrap();
        assert_eq!(first.kind, CallbackKind::Frame);
        assert_eq!(scheduler.now(), Duration::from_millis(16));

        let second = scheduler.pop_due(Duration::from_secs(1)).unwrap();
        assert_eq!(second.kind, CallbackKind::Timeout);
        assert_eq!(scheduler.now(), Duration::from_millis(300));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_without_timers_fails() {
        let mut scheduler = VirtualScheduler::new(false).without_timers();
        assert!(scheduler.set_timeout(Duration::from_millis(1)).is_err());
        assert!(scheduler.request_frame().is_err());
    }
}
