//! Output module for reporting on runs and on the database
//!
//! This module handles:
//! - Printing statistics over the ingestion database
//! - Printing run summaries and dry-run plans

pub mod stats;

pub use stats::{load_statistics, print_statistics, IngestStatistics};

use crate::ingest::{RunPlan, RunReport};

/// Prints the summary of a finished run
pub fn print_run_report(report: &RunReport) {
    let duration = report.finished_at - report.started_at;

    println!("=== Run Summary ===\n");
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Duration: {}s", duration.num_seconds());
    println!("  State: {}", report.final_state);
    println!(
        "  Frontier: {} ({} already processed)",
        report.frontier_size, report.already_processed
    );
    println!("  Batches committed: {}", report.batches_committed);
    println!("  Entities processed: {}", report.entities_processed);
    println!("  No data: {}", report.no_data);
    println!("  New references: {}", report.new_references);
    println!("  Links written: {}", report.links_written);
    println!("  Prices written: {}", report.prices_written);
}

/// Prints what a run would do
pub fn print_plan(plan: &RunPlan, batch_size: usize) {
    println!("Frontier:");
    println!("  Entities: {}", plan.frontier_size);
    println!("  Already processed: {}", plan.processed);
    println!("  Pending: {}", plan.pending);
    println!("  Batches of {}: {}", batch_size, plan.batches);
    if let Some(id) = plan.first_pending {
        println!("  Next entity: {}", id);
    }
}
