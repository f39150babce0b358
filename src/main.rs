/// Replays a scroll scenario against the headless loader and prints the report
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use lazyload::sim::{Scenario, Simulation};

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: lazyload-sim <scenario.json>");
        return ExitCode::from(2);
    };

    let scenario = match Scenario::load(&path) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG overrides the scenario's level
    env_logger::Builder::new()
        .filter_level(scenario.config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let report = Simulation::new(scenario).run();
    match report.to_json() {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            ExitCode::FAILURE
        }
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
