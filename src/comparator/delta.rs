//! Delta and summary types for plan comparison.

use serde::Serialize;

/// Whether a metric moved, and which way. Lower is better for cost, time
/// and reads; rows are neutral and always report `Unchanged` per node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Unchanged,
    Improved,
    Regressed,
}

/// How a node changed between the two plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    #[default]
    NoChange,
    Modified,
    Added,
    Removed,
    TypeChanged,
}

/// Per-node comparison between two positionally matched plan nodes.
///
/// Every paired field carries both sides verbatim; the renderer decides
/// what is worth showing. Filter, index condition and index name are
/// compared textually: PostgreSQL's JSON rendering is canonical, so a
/// textual difference is a real change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeDelta {
    pub node_type: String,
    pub relation: String,
    pub change_type: ChangeType,

    pub old_node_type: String,
    pub new_node_type: String,

    pub old_cost: f64,
    pub new_cost: f64,
    pub cost_delta: f64,
    pub cost_pct: f64,
    pub cost_dir: Direction,

    pub old_time: f64,
    pub new_time: f64,
    pub time_delta: f64,
    pub time_pct: f64,
    pub time_dir: Direction,

    pub old_rows: u64,
    pub new_rows: u64,
    pub rows_delta: i64,
    pub rows_pct: f64,
    pub rows_dir: Direction,

    pub old_loops: u64,
    pub new_loops: u64,

    pub old_rows_removed_by_filter: u64,
    pub new_rows_removed_by_filter: u64,

    pub old_workers_launched: u32,
    pub new_workers_launched: u32,
    pub old_workers_planned: u32,
    pub new_workers_planned: u32,

    // Reads aggregate shared + temp reads; hits are shared hits.
    pub old_buffer_reads: u64,
    pub new_buffer_reads: u64,
    pub old_buffer_hits: u64,
    pub new_buffer_hits: u64,
    pub buffer_dir: Direction,

    pub old_sort_spill: bool,
    pub new_sort_spill: bool,
    pub old_hash_batches: u32,
    pub new_hash_batches: u32,

    pub old_filter: String,
    pub new_filter: String,

    pub old_index_cond: String,
    pub new_index_cond: String,

    pub old_index_name: String,
    pub new_index_name: String,

    pub children: Vec<NodeDelta>,
}

/// Whole-plan roll-up of a comparison.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub old_total_cost: f64,
    pub new_total_cost: f64,
    pub cost_delta: f64,
    pub cost_pct: f64,
    pub cost_dir: Direction,

    pub old_execution_time: f64,
    pub new_execution_time: f64,
    pub time_delta: f64,
    pub time_pct: f64,
    pub time_dir: Direction,

    pub old_planning_time: f64,
    pub new_planning_time: f64,
    pub planning_delta: f64,
    pub planning_pct: f64,
    pub planning_dir: Direction,

    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub nodes_modified: usize,
    pub nodes_type_changed: usize,

    pub old_total_reads: u64,
    pub new_total_reads: u64,
    pub old_total_hits: u64,
    pub new_total_hits: u64,

    pub verdict: String,
}

/// Root delta plus summary.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub root: NodeDelta,
    pub summary: Summary,
}
