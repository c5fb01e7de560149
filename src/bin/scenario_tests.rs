//! Screencast Scenario Runner
//!
//! Standalone binary that exercises the recording engine end to end on the
//! headless backend, runs scripted scenarios sequentially, and reports
//! results.
//!
//! Usage:
//!   cargo run --features test-harness --bin scenario_tests [-- [OPTIONS]]
//!
//! Options:
//!   --filter <pattern>    Run only scenarios whose name contains <pattern>
//!   --verbose             Extra debug output
//!   --list                List all scenarios without running them

use screencast::test_harness::{runner, scenarios};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let verbose = args.iter().any(|a| a == "--verbose");
    let list_only = args.iter().any(|a| a == "--list");

    let filter = args
        .iter()
        .position(|a| a == "--filter")
        .and_then(|i| args.get(i + 1))
        .cloned();

    // Init logging
    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    println!("\n=== Screencast Scenarios ===\n");

    let mut scenarios = scenarios::all();

    // Apply filter
    if let Some(ref pattern) = filter {
        scenarios.retain(|s| s.name.contains(pattern.as_str()));
        println!("  Filter '{}': {} scenarios match\n", pattern, scenarios.len());
    }

    if scenarios.is_empty() {
        println!("  No scenarios to run.");
        std::process::exit(0);
    }

    // List mode
    if list_only {
        println!("  Scenarios ({}):", scenarios.len());
        for (i, scenario) in scenarios.iter().enumerate() {
            println!("  [{}/{}] {}", i + 1, scenarios.len(), scenario.name);
        }
        std::process::exit(0);
    }

    println!("  Running {} scenarios...\n", scenarios.len());

    let runtime = tokio::runtime::Runtime::new().expect("failed to build tokio runtime");

    let mut results = Vec::new();
    for (i, scenario) in scenarios.iter().enumerate() {
        println!("  [{}/{}] {} ...", i + 1, scenarios.len(), scenario.name);

        let result = runtime.block_on(runner::run_scenario(scenario));

        let status = if result.passed { "PASS" } else { "FAIL" };
        println!(
            "  [{}/{}] {} {} ({:.1}s)",
            i + 1,
            scenarios.len(),
            scenario.name,
            status,
            result.duration_ms as f64 / 1000.0,
        );
        for err in &result.errors {
            println!("         -> {}", err);
        }

        results.push(result);
    }

    runner::print_summary(&results);

    let any_failed = results.iter().any(|r| !r.passed);
    std::process::exit(if any_failed { 1 } else { 0 });
}
