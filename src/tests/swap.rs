use super::*;
use crate::candidate::LoadState;
use crate::error::LoaderError;

#[test]
fn test_success_swaps_once() {
    let mut loader = loader(page(&[(0.0, 100.0)]));
    loader.init();
    let id = id_at(&loader, 0);

    loader.complete_load(id, Ok(()));
    let image = loader.document().image(0).unwrap();
    assert_eq!(image.background.as_deref(), Some("url('/hi/0.jpg')"));
    assert_eq!(image.class, "lazy--hide");
    assert_eq!(loader.state_of(id), Some(LoadState::Loaded));
    assert_eq!(loader.stats().loads_completed, 1);
}

#[test]
fn test_duplicate_completion_is_noop() {
    let mut loader = loader(page(&[(0.0, 100.0)]));
    loader.init();
    let id = id_at(&loader, 0);
    loader.complete_load(id, Ok(()));

    // Tamper with the page so a second swap would be visible
    loader.document_mut().move_image(0, 10.0);
    let before = loader.document().image(0).cloned();

    loader.complete_load(id, Ok(()));
    loader.complete_load(id, Err(LoaderError::fetch_failed("/hi/0.jpg", "late error")));

    assert_eq!(loader.document().image(0).cloned(), before);
    assert_eq!(loader.state_of(id), Some(LoadState::Loaded));
    assert_eq!(loader.stats().loads_completed, 1);
    assert_eq!(loader.stats().duplicate_completions, 2);
    assert_eq!(loader.stats().loads_failed, 0);
}

#[test]
fn test_fetch_started_at_most_once() {
    let mut loader = loader(page(&[(0.0, 100.0), (100.0, 100.0)]));
    loader.init();

    // Many passes while the fetches are still in flight
    for i in 0..10u64 {
        loader.document_mut().scroll_to((i % 3) as f64 * 10.0);
        loader.request_check();
        let until = loader.scheduler().now() + ms(400);
        fire_until(&mut loader, until);
    }
    assert_eq!(loader.stats().checks_run, 11);

    let first = id_at(&loader, 0);
    let second = id_at(&loader, 1);
    assert_eq!(loader.fetcher().count_for(first), 1);
    assert_eq!(loader.fetcher().count_for(second), 1);

    // And after loading as well
    loader.complete_load(first, Ok(()));
    loader.run_check();
    assert_eq!(loader.fetcher().count_for(first), 1);
    assert_eq!(loader.fetcher().requests().len(), 2);
}

#[test]
fn test_failed_load_stays_loading() {
    let mut loader = loader(page(&[(0.0, 100.0)]));
    loader.init();
    let id = id_at(&loader, 0);

    loader.complete_load(id, Err(LoaderError::fetch_failed("/hi/0.jpg", "404")));
    assert_eq!(loader.state_of(id), Some(LoadState::Loading));
    assert_eq!(loader.stats().loads_failed, 1);

    // Never retried
    loader.run_check();
    assert_eq!(loader.fetcher().count_for(id), 1);
    let image = loader.document().image(0).unwrap();
    assert_eq!(image.class, "lazy--low");
    assert!(image.background.is_none());
}

#[test]
fn test_fetch_refused_at_start_stays_loading() {
    let mut loader = ViewportLoader::new(
        page(&[(0.0, 100.0)]),
        VirtualScheduler::new(true),
        RecordingFetcher::refusing(),
        &LoaderConfig::default(),
    );
    loader.init();
    let id = id_at(&loader, 0);
    assert_eq!(loader.state_of(id), Some(LoadState::Loading));
    assert_eq!(loader.stats().loads_failed, 1);

    loader.run_check();
    assert_eq!(loader.fetcher().count_for(id), 1);
}

#[test]
fn test_completion_for_idle_candidate_ignored() {
    let mut loader = loader(page(&[(900.0, 100.0)]));
    loader.init();
    let id = id_at(&loader, 0);

    loader.complete_load(id, Ok(()));
    assert_eq!(loader.state_of(id), Some(LoadState::Idle));
    assert!(loader.document().image(0).unwrap().background.is_none());
}

#[test]
fn test_cancel_is_unsupported() {
    let mut loader = loader(page(&[(0.0, 100.0)]));
    loader.init();
    let id = id_at(&loader, 0);

    assert!(matches!(
        loader.cancel_load(id),
        Err(LoaderError::CancellationUnsupported)
    ));
    assert_eq!(loader.state_of(id), Some(LoadState::Loading));
}

#[test]
fn test_rediscover_keeps_in_flight_state() {
    let mut loader = loader(page(&[(0.0, 100.0), (900.0, 100.0)]));
    loader.init();
    let loading = id_at(&loader, 0);

    loader
        .document_mut()
        .push(SimImage::new("/hi/late.jpg", 50.0, 100.0));
    assert_eq!(loader.rediscover(), 3);

    // The in-flight image keeps its id and is not fetched again
    assert_eq!(id_at(&loader, 0), loading);
    loader.run_check();
    assert_eq!(loader.fetcher().count_for(loading), 1);
    assert_eq!(loader.state_of(id_at(&loader, 2)), Some(LoadState::Loading));

    loader.complete_load(loading, Ok(()));
    assert_eq!(loader.state_of(loading), Some(LoadState::Loaded));
}

#[test]
fn test_loaded_images_drop_out_on_rediscover() {
    let mut loader = loader(page(&[(0.0, 100.0), (900.0, 100.0)]));
    loader.init();
    let loaded = id_at(&loader, 0);
    loader.complete_load(loaded, Ok(()));

    assert_eq!(loader.rediscover(), 1);
    assert_eq!(loader.state_of(loaded), None);

    // A late completion for a dropped id is harmless
    loader.complete_load(loaded, Ok(()));
    assert_eq!(loader.stats().loads_completed, 1);
}

#[test]
fn test_placeholder_without_url_skipped() {
    let mut page = page(&[(0.0, 100.0)]);
    page.push(SimImage::without_url(50.0, 100.0));
    let mut loader = loader(page);

    loader.init();
    assert_eq!(loader.candidates().len(), 1);
    assert_eq!(loader.fetcher().requests().len(), 1);
}

#[test]
fn test_candidates_visited_in_document_order() {
    let mut loader = loader(page(&[(300.0, 50.0), (0.0, 50.0), (150.0, 50.0)]));
    loader.init();

    let urls: Vec<&str> = loader
        .fetcher()
        .requests()
        .iter()
        .map(|(_, url)| url.as_str())
        .collect();
    assert_eq!(urls, vec!["/hi/0.jpg", "/hi/1.jpg", "/hi/2.jpg"]);
}

#[test]
fn test_detached_in_flight_image_loads_once() {
    let mut loader = loader(page(&[(0.0, 100.0)]));
    loader.init();
    let first = id_at(&loader, 0);

    // Element leaves the document while its fetch is in flight
    loader.document_mut().set_class(0, "detached");
    assert_eq!(loader.rediscover(), 0);
    assert_eq!(loader.state_of(first), Some(LoadState::Loading));

    // And comes back before the fetch completes
    loader.document_mut().set_class(0, "lazy--low");
    assert_eq!(loader.rediscover(), 1);
    assert_eq!(id_at(&loader, 0), first);
    loader.run_check();
    assert_eq!(loader.fetcher().requests().len(), 1);

    loader.complete_load(first, Ok(()));
    assert_eq!(loader.state_of(first), Some(LoadState::Loaded));
    let image = loader.document().image(0).unwrap();
    assert_eq!(image.background.as_deref(), Some("url('/hi/0.jpg')"));
}

#[test]
fn test_completion_while_detached_still_swaps() {
    let mut loader = loader(page(&[(0.0, 100.0)]));
    loader.init();
    let first = id_at(&loader, 0);

    loader.document_mut().set_class(0, "detached");
    loader.rediscover();
    loader.complete_load(first, Ok(()));

    assert_eq!(loader.state_of(first), Some(LoadState::Loaded));
    assert_eq!(loader.stats().loads_completed, 1);
    assert_eq!(loader.fetcher().count_for(first), 1);
}
