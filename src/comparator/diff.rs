//! Recursive structural diff over two plan trees.

use crate::plan::PlanNode;

use super::delta::{ChangeType, Direction, NodeDelta};
use super::Comparator;

/// Percent change from `old` to `new`. A metric appearing out of nowhere
/// reads as a 100% change, not a division by zero.
pub fn percent_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        if new == 0.0 {
            return 0.0;
        }
        return 100.0;
    }
    ((new - old) / old) * 100.0
}

fn coalesce<'a>(a: &'a str, b: &'a str) -> &'a str {
    if !a.is_empty() {
        a
    } else {
        b
    }
}

impl Comparator {
    pub(crate) fn diff_nodes(&self, old: &PlanNode, new: &PlanNode) -> NodeDelta {
        let mut delta = NodeDelta {
            relation: coalesce(&old.relation_name, &new.relation_name).to_string(),
            ..NodeDelta::default()
        };

        if old.node_type != new.node_type {
            delta.change_type = ChangeType::TypeChanged;
            delta.old_node_type = old.node_type.clone();
            delta.new_node_type = new.node_type.clone();
            delta.node_type = new.node_type.clone();
        } else {
            delta.change_type = ChangeType::Modified;
            delta.node_type = old.node_type.clone();
        }

        delta.old_cost = old.total_cost;
        delta.new_cost = new.total_cost;
        delta.cost_delta = new.total_cost - old.total_cost;
        delta.cost_pct = percent_change(old.total_cost, new.total_cost);
        delta.cost_dir = self.direction(old.total_cost, new.total_cost);

        delta.old_time = old.actual_total_time;
        delta.new_time = new.actual_total_time;
        delta.time_delta = new.actual_total_time - old.actual_total_time;
        delta.time_pct = percent_change(old.actual_total_time, new.actual_total_time);
        delta.time_dir = self.direction(old.actual_total_time, new.actual_total_time);

        delta.old_rows = old.actual_rows;
        delta.new_rows = new.actual_rows;
        delta.rows_delta = new.actual_rows as i64 - old.actual_rows as i64;
        delta.rows_pct = percent_change(old.actual_rows as f64, new.actual_rows as f64);
        // Row-count movement has no inherent polarity; the summary decides.
        delta.rows_dir = Direction::Unchanged;

        delta.old_loops = old.actual_loops;
        delta.new_loops = new.actual_loops;

        delta.old_rows_removed_by_filter = old.rows_removed_by_filter;
        delta.new_rows_removed_by_filter = new.rows_removed_by_filter;

        delta.old_workers_launched = old.workers_launched;
        delta.new_workers_launched = new.workers_launched;
        delta.old_workers_planned = old.workers_planned;
        delta.new_workers_planned = new.workers_planned;

        delta.old_buffer_reads = old.shared_read_blocks + old.temp_read_blocks;
        delta.new_buffer_reads = new.shared_read_blocks + new.temp_read_blocks;
        delta.old_buffer_hits = old.shared_hit_blocks;
        delta.new_buffer_hits = new.shared_hit_blocks;
        delta.buffer_dir = self.buffer_direction(old, new);

        delta.old_sort_spill = old.sort_space_type == "Disk";
        delta.new_sort_spill = new.sort_space_type == "Disk";

        delta.old_hash_batches = old.hash_batches;
        delta.new_hash_batches = new.hash_batches;

        delta.old_filter = old.filter.clone();
        delta.new_filter = new.filter.clone();

        delta.old_index_cond = old.index_cond.clone();
        delta.new_index_cond = new.index_cond.clone();

        delta.old_index_name = old.index_name.clone();
        delta.new_index_name = new.index_name.clone();

        if delta.change_type == ChangeType::Modified && !self.is_significant(&delta) {
            delta.change_type = ChangeType::NoChange;
        }

        delta.children = self.diff_children(&old.plans, &new.plans);

        delta
    }

    /// Children are matched by position. When the structure changes (a Seq
    /// Scan becoming Bitmap Heap Scan + Bitmap Index Scan), position 0
    /// reports the type change and extra nodes report as added; that shows
    /// the transformation more clearly than an edit-distance match would.
    fn diff_children(&self, old_kids: &[PlanNode], new_kids: &[PlanNode]) -> Vec<NodeDelta> {
        let mut deltas = Vec::new();

        for i in 0..old_kids.len().max(new_kids.len()) {
            match (old_kids.get(i), new_kids.get(i)) {
                (Some(old), Some(new)) => deltas.push(self.diff_nodes(old, new)),
                (None, Some(new)) => deltas.push(added_node(new)),
                (Some(old), None) => deltas.push(removed_node(old)),
                (None, None) => unreachable!(),
            }
        }

        deltas
    }

    /// A Modified delta survives only if something the user would act on
    /// actually moved.
    fn is_significant(&self, d: &NodeDelta) -> bool {
        if d.cost_pct.abs() > self.threshold {
            return true;
        }
        if d.time_pct.abs() > self.threshold {
            return true;
        }
        if d.old_loops != d.new_loops && d.old_loops > 0 {
            let loop_ratio = d.new_loops as f64 / d.old_loops as f64;
            if loop_ratio > 2.0 || loop_ratio < 0.5 {
                return true;
            }
        }
        if d.old_rows_removed_by_filter != d.new_rows_removed_by_filter {
            return true;
        }
        if d.old_workers_launched != d.new_workers_launched {
            return true;
        }
        if d.old_sort_spill != d.new_sort_spill {
            return true;
        }
        if d.old_hash_batches != d.new_hash_batches {
            return true;
        }
        if d.old_buffer_reads != d.new_buffer_reads {
            return true;
        }
        if d.old_filter != d.new_filter {
            return true;
        }
        if d.old_index_cond != d.new_index_cond {
            return true;
        }
        if d.old_index_name != d.new_index_name {
            return true;
        }
        false
    }

    /// Direction for a lower-is-better metric, with changes inside the
    /// threshold reported as noise.
    pub(crate) fn direction(&self, old: f64, new: f64) -> Direction {
        if percent_change(old, new).abs() < self.threshold {
            return Direction::Unchanged;
        }
        if new < old {
            Direction::Improved
        } else {
            Direction::Regressed
        }
    }

    fn buffer_direction(&self, old: &PlanNode, new: &PlanNode) -> Direction {
        let old_total =
            (old.shared_read_blocks + old.temp_read_blocks + old.temp_written_blocks) as f64;
        let new_total =
            (new.shared_read_blocks + new.temp_read_blocks + new.temp_written_blocks) as f64;
        self.direction(old_total, new_total)
    }
}

/// A node present only in the new plan; only new-side metrics populate, and
/// the whole subtree beneath it reports as added too.
fn added_node(node: &PlanNode) -> NodeDelta {
    NodeDelta {
        change_type: ChangeType::Added,
        node_type: node.node_type.clone(),
        relation: node.relation_name.clone(),
        new_cost: node.total_cost,
        new_time: node.actual_total_time,
        new_rows: node.actual_rows,
        children: node.plans.iter().map(added_node).collect(),
        ..NodeDelta::default()
    }
}

/// A node present only in the old plan.
fn removed_node(node: &PlanNode) -> NodeDelta {
    NodeDelta {
        change_type: ChangeType::Removed,
        node_type: node.node_type.clone(),
        relation: node.relation_name.clone(),
        old_cost: node.total_cost,
        old_time: node.actual_total_time,
        old_rows: node.actual_rows,
        children: node.plans.iter().map(removed_node).collect(),
        ..NodeDelta::default()
    }
}
