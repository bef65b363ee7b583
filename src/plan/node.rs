//! Plan node and envelope types.
//!
//! Field names mirror the canonical key names PostgreSQL emits in
//! `EXPLAIN (ANALYZE, VERBOSE, BUFFERS, FORMAT JSON)`. Every field is
//! container-defaulted so an absent key deserializes to zero/empty, and
//! unknown keys are ignored.

use serde::Deserialize;

/// One operator in a PostgreSQL execution plan.
///
/// `node_type` is an open string (PostgreSQL adds new operators over time),
/// so consumers dispatch by string equality rather than a closed enum.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanNode {
    // Identity
    #[serde(rename = "Node Type")]
    pub node_type: String,
    #[serde(rename = "Parent Relationship")]
    pub parent_relationship: String,
    #[serde(rename = "Subplan Name")]
    pub subplan_name: String,
    #[serde(rename = "CTE Name")]
    pub cte_name: String,

    // Estimates vs actuals
    #[serde(rename = "Startup Cost")]
    pub startup_cost: f64,
    #[serde(rename = "Total Cost")]
    pub total_cost: f64,
    #[serde(rename = "Plan Rows")]
    pub plan_rows: u64,
    #[serde(rename = "Plan Width")]
    pub plan_width: u32,
    #[serde(rename = "Actual Startup Time")]
    pub actual_startup_time: f64,
    #[serde(rename = "Actual Total Time")]
    pub actual_total_time: f64,
    #[serde(rename = "Actual Rows")]
    pub actual_rows: u64,
    #[serde(rename = "Actual Loops")]
    pub actual_loops: u64,

    // Relation/index info
    #[serde(rename = "Schema")]
    pub schema: String,
    #[serde(rename = "Relation Name")]
    pub relation_name: String,
    #[serde(rename = "Alias")]
    pub alias: String,
    #[serde(rename = "Index Name")]
    pub index_name: String,
    #[serde(rename = "Scan Direction")]
    pub scan_direction: String,

    // Predicates
    #[serde(rename = "Index Cond")]
    pub index_cond: String,
    #[serde(rename = "Filter")]
    pub filter: String,
    #[serde(rename = "Rows Removed by Filter")]
    pub rows_removed_by_filter: u64,
    #[serde(rename = "Exact Heap Blocks")]
    pub exact_heap_blocks: u64,
    #[serde(rename = "Lossy Heap Blocks")]
    pub lossy_heap_blocks: u64,

    // Join info
    #[serde(rename = "Join Type")]
    pub join_type: String,
    #[serde(rename = "Join Filter")]
    pub join_filter: String,
    #[serde(rename = "Hash Cond")]
    pub hash_cond: String,
    #[serde(rename = "Merge Cond")]
    pub merge_cond: String,
    #[serde(rename = "Inner Unique")]
    pub inner_unique: bool,
    #[serde(rename = "Rows Removed by Join Filter")]
    pub rows_removed_by_join_filter: u64,

    // Sort
    #[serde(rename = "Sort Key")]
    pub sort_key: Vec<String>,
    #[serde(rename = "Sort Method")]
    pub sort_method: String,
    #[serde(rename = "Sort Space Used")]
    pub sort_space_used: u64,
    #[serde(rename = "Sort Space Type")]
    pub sort_space_type: String,

    // Hash
    #[serde(rename = "Hash Buckets")]
    pub hash_buckets: u64,
    #[serde(rename = "Hash Batches")]
    pub hash_batches: u32,
    #[serde(rename = "Original Hash Batches")]
    pub original_hash_batches: u32,
    #[serde(rename = "Peak Memory Usage")]
    pub peak_memory_usage: u64,

    // Buffers
    #[serde(rename = "Shared Hit Blocks")]
    pub shared_hit_blocks: u64,
    #[serde(rename = "Shared Read Blocks")]
    pub shared_read_blocks: u64,
    #[serde(rename = "Shared Dirtied Blocks")]
    pub shared_dirtied_blocks: u64,
    #[serde(rename = "Shared Written Blocks")]
    pub shared_written_blocks: u64,
    #[serde(rename = "Temp Read Blocks")]
    pub temp_read_blocks: u64,
    #[serde(rename = "Temp Written Blocks")]
    pub temp_written_blocks: u64,

    // Parallel query
    #[serde(rename = "Workers Planned")]
    pub workers_planned: u32,
    #[serde(rename = "Workers Launched")]
    pub workers_launched: u32,

    // Group/Aggregate
    #[serde(rename = "Group Key")]
    pub group_key: Vec<String>,

    // Children, in execution-side order (0 = outer, 1 = inner for joins)
    #[serde(rename = "Plans")]
    pub plans: Vec<PlanNode>,
}

impl PlanNode {
    /// Actual row count when the plan was executed, planner estimate otherwise.
    pub fn effective_rows(&self) -> u64 {
        if self.actual_rows > 0 {
            self.actual_rows
        } else {
            self.plan_rows
        }
    }

    /// Human label for a node: `Seq Scan on events (e)`.
    pub fn label(&self) -> String {
        if self.relation_name.is_empty() {
            return self.node_type.clone();
        }
        if !self.alias.is_empty() && self.alias != self.relation_name {
            format!("{} on {} ({})", self.node_type, self.relation_name, self.alias)
        } else {
            format!("{} on {}", self.node_type, self.relation_name)
        }
    }
}

/// Top-level envelope of one EXPLAIN output.
///
/// PostgreSQL wraps each statement's plan in an object carrying planning and
/// execution times; `Triggers` and any other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplainEnvelope {
    #[serde(rename = "Plan")]
    pub plan: PlanNode,
    #[serde(rename = "Planning Time")]
    pub planning_time: f64,
    #[serde(rename = "Execution Time")]
    pub execution_time: f64,
}
