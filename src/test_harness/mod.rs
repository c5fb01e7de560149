// Scripted end-to-end scenarios for the scenario_tests binary.
// Enabled with the `test-harness` feature.

pub mod runner;
pub mod scenarios;
