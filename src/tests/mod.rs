//! Behavioural tests for the loader state machine.
//!
//! These drive a [`ViewportLoader`] through the simulated host directly,
//! firing scheduler callbacks and fetch completions by hand.

mod click_shim;
mod swap;

use std::time::Duration;

use crate::candidate::CandidateId;
use crate::config::LoaderConfig;
use crate::loader::ViewportLoader;
use crate::sim::{
    CallbackKind, RecordingFetcher, SimImage, SimLoader, SimulatedPage, VirtualScheduler,
};

/// Page 400 units tall with images at the given `(top, height)` spots.
fn page(spots: &[(f64, f64)]) -> SimulatedPage {
    let mut page = SimulatedPage::new(400.0);
    for (i, &(top, height)) in spots.iter().enumerate() {
        page.push(SimImage::new(&format!("/hi/{i}.jpg"), top, height));
    }
    page
}

fn loader(page: SimulatedPage) -> SimLoader {
    loader_with(page, VirtualScheduler::new(true), LoaderConfig::default())
}

fn loader_with(
    page: SimulatedPage,
    scheduler: VirtualScheduler,
    config: LoaderConfig,
) -> SimLoader {
    ViewportLoader::new(page, scheduler, RecordingFetcher::new(), &config)
}

/// Fire every scheduler callback due up to `until`, in order.
fn fire_until(loader: &mut SimLoader, until: Duration) -> usize {
    let mut fired = 0;
    while let Some(entry) = loader.scheduler_mut().pop_due(until) {
        match entry.kind {
            CallbackKind::Timeout => loader.timer_elapsed(entry.handle),
            CallbackKind::Frame => loader.frame_ready(entry.handle),
        }
        fired += 1;
    }
    loader.scheduler_mut().advance_to(until);
    fired
}

fn id_at(loader: &SimLoader, index: usize) -> CandidateId {
    loader
        .candidates()
        .iter()
        .find(|c| c.node == index)
        .map(|c| c.id)
        .expect("candidate for image index")
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
