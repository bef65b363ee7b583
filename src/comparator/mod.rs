//! Structural diff between two execution plans.
//!
//! Walks both trees together, matching children by position, and produces
//! a per-node delta tree plus a whole-plan summary with a verdict. A
//! configurable threshold (percent) separates signal from noise. Pure
//! function of its inputs; cannot fail.

mod delta;
mod diff;

pub use delta::{ChangeType, ComparisonResult, Direction, NodeDelta, Summary};
pub use diff::percent_change;

use crate::plan::ExplainEnvelope;

/// Default significance threshold, in percent.
pub const DEFAULT_THRESHOLD_PCT: f64 = 5.0;

/// Plan comparator. `threshold` is the percent change below which a
/// per-dimension move counts as unchanged; callers validate it to [0, 100].
#[derive(Debug, Clone)]
pub struct Comparator {
    pub threshold: f64,
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator {
            threshold: DEFAULT_THRESHOLD_PCT,
        }
    }
}

impl Comparator {
    pub fn new(threshold: f64) -> Self {
        Comparator { threshold }
    }

    /// Compare two plans, old against new.
    pub fn compare(&self, old: &ExplainEnvelope, new: &ExplainEnvelope) -> ComparisonResult {
        let root = self.diff_nodes(&old.plan, &new.plan);

        let mut summary = Summary {
            old_total_cost: old.plan.total_cost,
            new_total_cost: new.plan.total_cost,
            cost_delta: new.plan.total_cost - old.plan.total_cost,
            cost_pct: percent_change(old.plan.total_cost, new.plan.total_cost),
            cost_dir: self.direction(old.plan.total_cost, new.plan.total_cost),

            old_execution_time: old.execution_time,
            new_execution_time: new.execution_time,
            time_delta: new.execution_time - old.execution_time,
            time_pct: percent_change(old.execution_time, new.execution_time),
            time_dir: self.direction(old.execution_time, new.execution_time),

            old_planning_time: old.planning_time,
            new_planning_time: new.planning_time,
            planning_delta: new.planning_time - old.planning_time,
            planning_pct: percent_change(old.planning_time, new.planning_time),
            planning_dir: self.direction(old.planning_time, new.planning_time),

            old_total_reads: old.plan.shared_read_blocks + old.plan.temp_read_blocks,
            new_total_reads: new.plan.shared_read_blocks + new.plan.temp_read_blocks,
            old_total_hits: old.plan.shared_hit_blocks,
            new_total_hits: new.plan.shared_hit_blocks,

            ..Summary::default()
        };

        count_changes(&root, &mut summary);
        summary.verdict = verdict(&summary).to_string();

        ComparisonResult { root, summary }
    }
}

/// One-line judgement from the time and cost directions.
fn verdict(s: &Summary) -> &'static str {
    use Direction::{Improved, Regressed, Unchanged};

    match (s.time_dir, s.cost_dir) {
        (Improved, Improved) => "faster and cheaper",
        (Improved, Unchanged) => "faster",
        (Improved, Regressed) => "faster but higher estimated cost",
        (Unchanged, Improved) => "cheaper",
        (Unchanged, Regressed) => "more expensive",
        (Regressed, Improved) => "cheaper but slower execution",
        (Regressed, Unchanged) => "slower",
        (Regressed, Regressed) => "slower and more expensive",
        (Unchanged, Unchanged) => "no significant change",
    }
}

fn count_changes(delta: &NodeDelta, summary: &mut Summary) {
    match delta.change_type {
        ChangeType::Added => summary.nodes_added += 1,
        ChangeType::Removed => summary.nodes_removed += 1,
        ChangeType::Modified => summary.nodes_modified += 1,
        ChangeType::TypeChanged => summary.nodes_type_changed += 1,
        ChangeType::NoChange => {}
    }

    for child in &delta.children {
        count_changes(child, summary);
    }
}
