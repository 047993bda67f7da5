//! Report Formatting
//!
//! Human-readable terminal output: one block per workload comparison with a
//! line per strategy (status icon, elapsed time, speedup vs the sequential
//! baseline) and a trailing summary. Plain text, not machine-parsed.

use crate::driver::{Comparison, StrategyKind};
use std::fmt::Write as _;
use std::time::Duration;

const RULE_WIDTH: usize = 60;

/// Format a duration for display, picking a unit that keeps the number
/// readable.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos >= 1_000_000_000 {
        format!("{:.2} s", d.as_secs_f64())
    } else if nanos >= 1_000_000 {
        format!("{:.2} ms", nanos as f64 / 1_000_000.0)
    } else if nanos >= 1_000 {
        format!("{:.2} µs", nanos as f64 / 1_000.0)
    } else {
        format!("{nanos} ns")
    }
}

/// Render all comparisons as one report.
pub fn render(comparisons: &[Comparison]) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Stratbench Results\n");
    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push_str("\n\n");

    for comparison in comparisons {
        render_comparison(&mut output, comparison);
    }

    let total_failures: usize = comparisons.iter().map(Comparison::failures).sum();
    output.push_str("Summary\n");
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');
    let _ = writeln!(
        output,
        "  Comparisons: {}  Failed strategy runs: {}",
        comparisons.len(),
        total_failures
    );

    output
}

fn render_comparison(output: &mut String, comparison: &Comparison) {
    let _ = writeln!(
        output,
        "Workload: {} ({} tasks, {} workers)",
        comparison.workload, comparison.task_count, comparison.workers
    );
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');

    let baseline = comparison
        .runs
        .iter()
        .find(|run| run.strategy == StrategyKind::Sequential && run.succeeded())
        .map(|run| run.elapsed);

    for run in &comparison.runs {
        match &run.outcome {
            Ok(_) => {
                let speedup = if run.strategy == StrategyKind::Sequential {
                    if baseline.is_some() {
                        "1.00x (baseline)".to_string()
                    } else {
                        "-".to_string()
                    }
                } else {
                    match baseline {
                        Some(base) if run.elapsed > Duration::ZERO => {
                            format!("{:.2}x", base.as_secs_f64() / run.elapsed.as_secs_f64())
                        }
                        _ => "-".to_string(),
                    }
                };
                let _ = writeln!(
                    output,
                    "  ✓ {:<12} {:>12}   {}",
                    run.strategy.name(),
                    format_duration(run.elapsed),
                    speedup
                );
            }
            Err(message) => {
                let _ = writeln!(
                    output,
                    "  ✗ {:<12} {:>12}   failed: {}",
                    run.strategy.name(),
                    format_duration(run.elapsed),
                    message
                );
            }
        }
    }

    if !comparison.results_consistent {
        output.push_str("  ! strategies disagreed on result values\n");
    }

    if comparison.workload.starts_with("cpu/") {
        output.push_str(
            "  note: Rust threads are not serialized by an interpreter lock,\n  \
             so CPU-bound work parallelizes in the thread pool too.\n",
        );
    }

    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::StrategyRun;
    use stratbench_core::TaskOutcome;

    fn comparison_with(runs: Vec<StrategyRun>) -> Comparison {
        Comparison {
            workload: "cpu/count-primes".to_string(),
            task_count: 4,
            workers: 4,
            results_consistent: true,
            runs,
        }
    }

    fn ok_run(strategy: StrategyKind, millis: u64) -> StrategyRun {
        StrategyRun {
            strategy,
            elapsed: Duration::from_millis(millis),
            outcome: Ok(vec![TaskOutcome {
                index: 0,
                value: 4,
                duration: Duration::from_millis(millis),
            }]),
        }
    }

    #[test]
    fn duration_formatting_picks_units() {
        assert_eq!(format_duration(Duration::from_nanos(750)), "750 ns");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.50 ms");
        assert_eq!(format_duration(Duration::from_millis(2340)), "2.34 s");
    }

    #[test]
    fn report_shows_speedup_against_sequential() {
        let report = render(&[comparison_with(vec![
            ok_run(StrategyKind::Sequential, 400),
            ok_run(StrategyKind::ThreadPool, 100),
            ok_run(StrategyKind::ProcessPool, 200),
        ])]);

        assert!(report.contains("sequential"));
        assert!(report.contains("1.00x (baseline)"));
        assert!(report.contains("4.00x"));
        assert!(report.contains("2.00x"));
        assert!(report.contains("Failed strategy runs: 0"));
        // The interpreter-lock divergence note rides along on CPU workloads.
        assert!(report.contains("interpreter lock"));
    }

    #[test]
    fn failed_runs_are_reported_and_counted() {
        let mut comparison = comparison_with(vec![
            ok_run(StrategyKind::Sequential, 50),
            StrategyRun {
                strategy: StrategyKind::ThreadPool,
                elapsed: Duration::from_millis(10),
                outcome: Err("task 1 (fail) failed: injected".to_string()),
            },
            ok_run(StrategyKind::ProcessPool, 60),
        ]);
        comparison.workload = "io/sleep".to_string();

        let report = render(&[comparison]);
        assert!(report.contains("✗ threads"));
        assert!(report.contains("failed: task 1"));
        assert!(report.contains("Failed strategy runs: 1"));
        // Only CPU comparisons carry the note.
        assert!(!report.contains("interpreter lock"));
    }

    #[test]
    fn inconsistent_results_are_flagged() {
        let mut comparison = comparison_with(vec![ok_run(StrategyKind::Sequential, 10)]);
        comparison.results_consistent = false;
        let report = render(&[comparison]);
        assert!(report.contains("disagreed"));
    }
}
