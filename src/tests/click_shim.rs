use super::*;

fn swapped(page: SimulatedPage, config: LoaderConfig) -> SimLoader {
    let mut loader = loader_with(page, VirtualScheduler::new(true), config);
    loader.init();
    let id = id_at(&loader, 0);
    loader.complete_load(id, Ok(()));
    loader
}

#[test]
fn test_clicks_blocked_without_pointer_events() {
    let loader = swapped(
        page(&[(0.0, 100.0)]).with_pointer_events(false),
        LoaderConfig::default(),
    );
    assert!(loader.settings().install_click_shim);
    assert!(loader.document().click(0).default_prevented);
}

#[test]
fn test_clicks_pass_with_pointer_events() {
    let loader = swapped(page(&[(0.0, 100.0)]), LoaderConfig::default());
    assert!(!loader.settings().install_click_shim);
    assert!(!loader.document().click(0).default_prevented);
}

#[test]
fn test_shim_disabled_by_config() {
    let config = LoaderConfig {
        suppress_clicks_without_pointer_events: false,
        ..LoaderConfig::default()
    };
    let loader = swapped(page(&[(0.0, 100.0)]).with_pointer_events(false), config);
    assert!(!loader.document().click(0).default_prevented);
}

#[test]
fn test_no_interceptor_before_swap() {
    let mut loader = loader(page(&[(0.0, 100.0)]).with_pointer_events(false));
    loader.init();
    assert!(!loader.document().click(0).default_prevented);
}
