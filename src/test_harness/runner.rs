// Scenario execution and reporting

use std::time::Instant;

use crate::test_harness::scenarios::Scenario;

/// Outcome of one scenario run.
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub errors: Vec<String>,
}

/// Run a single scenario to completion.
pub async fn run_scenario(scenario: &Scenario) -> ScenarioResult {
    let start = Instant::now();
    let errors = (scenario.run)().await;

    ScenarioResult {
        name: scenario.name.to_string(),
        passed: errors.is_empty(),
        duration_ms: start.elapsed().as_millis() as u64,
        errors,
    }
}

/// Print a formatted summary of all scenario results.
pub fn print_summary(results: &[ScenarioResult]) {
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    println!("\n  === Scenario Results ===\n");

    for (i, result) in results.iter().enumerate() {
        let status = if result.passed { "PASS" } else { "FAIL" };
        let duration = format!("{:.1}s", result.duration_ms as f64 / 1000.0);
        println!(
            "  [{}/{}] {} {} {} ({})",
            i + 1,
            results.len(),
            result.name,
            ".".repeat(44_usize.saturating_sub(result.name.len())),
            status,
            duration
        );
        for err in &result.errors {
            println!("         -> {}", err);
        }
    }

    println!();
    if failed == 0 {
        println!("  Results: {} passed, 0 failed", passed);
    } else {
        println!("  Results: {} passed, {} FAILED", passed, failed);
    }
    println!();
}
