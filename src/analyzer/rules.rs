//! The heuristic rule battery.
//!
//! Each rule is a pure function of one node plus its parent, its index
//! within the parent, and the plan-wide context. Rules fire independently
//! and in a fixed order; a rule that lacks the data it needs (no actuals,
//! no filter, wrong node type) emits nothing.

use crate::plan::PlanNode;

use super::conditions::{columns_not_in, extract_columns, extract_literal, qualified_refs};
use super::context::PlanContext;
use super::{Finding, Severity};

/// Tunable limits for every rule, defaulting to the values the rules were
/// calibrated against. Kept in one record so rules read cleanly.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Minimum rows examined before a sequential scan is worth flagging.
    pub min_rows_for_seq_scan_warning: u64,
    /// Rows examined above which a filtered scan is critical.
    pub min_rows_for_critical_scan: u64,
    /// Rows above which a sequential scan inside a join is critical.
    pub min_rows_for_critical_seq_scan: u64,
    /// Minimum rows returned before index selectivity is judged.
    pub min_rows_for_low_selectivity: u64,
    /// Filter removal percent that warrants a warning.
    pub filter_removal_warning_pct: f64,
    /// Filter removal percent that warrants a critical finding.
    pub filter_removal_critical_pct: f64,
    /// Display cap for filter removal percentages.
    pub filter_removal_cap_pct: f64,
    /// Lossy-block percent that warrants a warning.
    pub recheck_warning_pct: f64,
    /// Lossy-block percent that warrants a critical finding.
    pub recheck_critical_pct: f64,
    /// Share of reads (vs hits) above which an index scan is I/O-bound.
    pub read_blocks_critical_pct: f64,
    /// Inner-loop count that makes a nested loop or sub-plan a warning.
    pub nested_loop_warning_loops: u64,
    /// Inner-loop count that makes a nested loop or sub-plan critical.
    pub nested_loop_critical_loops: u64,
    /// Loop count that makes a Materialize node a warning.
    pub materialize_warning_loops: u64,
    /// Loop count that makes a Materialize node critical.
    pub materialize_critical_loops: u64,
    /// Minimum read blocks before low selectivity is judged.
    pub min_read_blocks_for_low_select: u64,
    /// Hash batch count above which a hash spill is critical.
    pub hash_batches_critical: u32,
    /// Join-filter removals that warrant a warning.
    pub join_filter_removal_warning: u64,
    /// Join-filter removals that warrant a critical finding.
    pub join_filter_removal_critical: u64,
    /// Estimate/actual ratio above which an estimate is misleading.
    pub estimate_mismatch_ratio: f64,
    /// Minimum actual rows before a CTE estimate mismatch matters.
    pub min_rows_for_estimate_mismatch: u64,
    /// Row width in bytes above which rows count as wide.
    pub wide_row_threshold: u32,
    /// Minimum rows before wide rows are worth mentioning.
    pub wide_row_min_rows: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            min_rows_for_seq_scan_warning: 10_000,
            min_rows_for_critical_scan: 100_000,
            min_rows_for_critical_seq_scan: 1_000_000,
            min_rows_for_low_selectivity: 10_000,
            filter_removal_warning_pct: 50.0,
            filter_removal_critical_pct: 95.0,
            filter_removal_cap_pct: 99.99,
            recheck_warning_pct: 50.0,
            recheck_critical_pct: 90.0,
            read_blocks_critical_pct: 50.0,
            nested_loop_warning_loops: 1_000,
            nested_loop_critical_loops: 10_000,
            materialize_warning_loops: 100,
            materialize_critical_loops: 10_000,
            min_read_blocks_for_low_select: 1_000,
            hash_batches_critical: 8,
            join_filter_removal_warning: 10_000,
            join_filter_removal_critical: 1_000_000,
            estimate_mismatch_ratio: 3.0,
            min_rows_for_estimate_mismatch: 100,
            wide_row_threshold: 2_000,
            wide_row_min_rows: 10_000,
        }
    }
}

/// Everything a rule may look at.
pub(crate) struct RuleInput<'a> {
    pub node: &'a PlanNode,
    pub parent: Option<&'a PlanNode>,
    /// Index of `node` within its parent's child list.
    pub child_index: Option<usize>,
    #[allow(dead_code)]
    pub plan: &'a PlanContext<'a>,
    pub limits: &'a Thresholds,
}

pub(crate) type Rule = fn(&RuleInput<'_>) -> Vec<Finding>;

/// The rule battery, in evaluation order. Order matters: findings within
/// one severity keep discovery order through the final sort.
pub(crate) const RULES: &[Rule] = &[
    check_index_filter_inefficiency,
    check_seq_scan_in_join,
    check_seq_scan_with_filter,
    check_bitmap_recheck,
    check_nested_loop_inner_loops,
    check_correlated_subplan,
    check_sort_spill,
    check_hash_spill,
    check_temp_io,
    check_worker_shortfall,
    check_gather_overhead,
    check_join_filter_removal,
    check_materialize_loops,
    check_low_selectivity_index_scan,
    check_wide_rows,
];

fn is_join(node_type: &str) -> bool {
    matches!(node_type, "Hash Join" | "Merge Join" | "Nested Loop")
}

fn is_index_scan(node_type: &str) -> bool {
    matches!(node_type, "Index Scan" | "Index Only Scan")
}

/// Percent of rows discarded, capped for display. Scans that keep almost
/// nothing round up to 100.00% with two decimals, which overstates what
/// happened; the cap keeps the displayed figure honest when at least one
/// row survived.
fn removal_pct(removed: u64, kept: u64, cap: f64) -> (f64, f64) {
    let total = kept + removed;
    let pct = removed as f64 / total as f64 * 100.0;
    let shown = if pct > cap && kept > 0 { cap } else { pct };
    (pct, shown)
}

/// Index Scan whose filter discards most of what the index returned. The
/// index is matching far more than the query wants; the filter columns
/// belong in the index.
fn check_index_filter_inefficiency(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if !is_index_scan(&n.node_type) {
        return Vec::new();
    }
    if n.filter.is_empty() || n.rows_removed_by_filter == 0 {
        return Vec::new();
    }

    let (pct, shown_pct) = removal_pct(
        n.rows_removed_by_filter,
        n.actual_rows,
        input.limits.filter_removal_cap_pct,
    );
    if pct < input.limits.filter_removal_warning_pct {
        return Vec::new();
    }

    let severity = if pct > input.limits.filter_removal_critical_pct {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let index_cols = extract_columns(&n.index_cond);
    let missing = columns_not_in(&n.filter, &n.index_cond);

    let suggestion = if !missing.is_empty() && !index_cols.is_empty() {
        let mut all_cols = index_cols;
        all_cols.extend(missing.iter().cloned());
        let mut s = format!(
            "Consider a composite index on {} ({})",
            n.relation_name,
            all_cols.join(", ")
        );
        if missing.len() == 1 {
            let literal = extract_literal(&n.filter);
            if !literal.is_empty() {
                s.push_str(&format!(
                    ", or a partial index WHERE {} = '{}'",
                    missing[0], literal
                ));
            }
        }
        s
    } else {
        format!(
            "Consider an index covering the filter condition on {}",
            n.relation_name
        )
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Filter removed {:.2}% of rows returned by index {} ({} of {}) on {}",
            shown_pct,
            n.index_name,
            n.rows_removed_by_filter,
            n.actual_rows + n.rows_removed_by_filter,
            n.label(),
        ),
        suggestion,
    }]
}

/// The join column for the scanned relation, inferred from a join condition
/// by matching `<alias|relation>.<col>` case-insensitively.
fn join_column_for(cond: &str, alias: &str, relation: &str) -> Option<String> {
    for (qualifier, column) in qualified_refs(cond) {
        if (!alias.is_empty() && qualifier.eq_ignore_ascii_case(alias))
            || (!relation.is_empty() && qualifier.eq_ignore_ascii_case(relation))
        {
            return Some(column);
        }
    }
    None
}

/// The first CTE name in a subtree, depth-first. Lets the description name
/// the join partner by its CTE even when the immediate sibling is a Hash or
/// Materialize wrapper.
fn first_cte_name(node: &PlanNode) -> Option<&str> {
    if !node.cte_name.is_empty() {
        return Some(&node.cte_name);
    }
    node.plans.iter().find_map(first_cte_name)
}

/// Large sequential scan feeding a join whose other side is small. The
/// executor scanned everything to join against a handful of rows; an index
/// on the join key would let the small side drive lookups instead.
fn check_seq_scan_in_join(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.node_type != "Seq Scan" {
        return Vec::new();
    }
    let Some(parent) = input.parent else {
        return Vec::new();
    };
    if !is_join(&parent.node_type) {
        return Vec::new();
    }

    let rows = n.effective_rows();
    if rows < input.limits.min_rows_for_seq_scan_warning {
        return Vec::new();
    }

    let Some(child_index) = input.child_index else {
        return Vec::new();
    };
    if parent.plans.len() < 2 || child_index > 1 {
        return Vec::new();
    }
    let sibling = &parent.plans[1 - child_index];
    let sibling_rows = sibling.effective_rows();

    // Only worth flagging when the other side is genuinely small.
    if sibling_rows == 0 || sibling_rows.saturating_mul(10) >= rows {
        return Vec::new();
    }

    let severity = if rows > input.limits.min_rows_for_critical_seq_scan {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let sibling_label = match first_cte_name(sibling) {
        Some(name) => format!("CTE {}", name),
        None => sibling.label(),
    };

    let cond = if !parent.hash_cond.is_empty() {
        &parent.hash_cond
    } else {
        &parent.merge_cond
    };
    let suggestion = match join_column_for(cond, &n.alias, &n.relation_name) {
        Some(col) if cond.contains("lower(") => format!(
            "Consider an expression index on lower({}) on {} to support this join",
            col, n.relation_name
        ),
        Some(col) => format!(
            "Consider an index on {} ({}) to support this join",
            n.relation_name, col
        ),
        None => format!(
            "Consider an index on the join key of {} so the small side can probe it",
            n.relation_name
        ),
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Sequential scan on {} ({} rows) joined to {} ({} rows)",
            n.relation_name, rows, sibling_label, sibling_rows
        ),
        suggestion,
    }]
}

/// Standalone sequential scan whose filter discards most rows.
fn check_seq_scan_with_filter(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.node_type != "Seq Scan" {
        return Vec::new();
    }
    if let Some(parent) = input.parent {
        // Scans under a join are the previous rule's territory.
        if is_join(&parent.node_type) {
            return Vec::new();
        }
    }
    if n.filter.is_empty() || n.rows_removed_by_filter == 0 {
        return Vec::new();
    }

    let scanned = n.effective_rows() + n.rows_removed_by_filter;
    if scanned < input.limits.min_rows_for_seq_scan_warning {
        return Vec::new();
    }

    let (pct, shown_pct) = removal_pct(
        n.rows_removed_by_filter,
        n.actual_rows,
        input.limits.filter_removal_cap_pct,
    );
    if pct < input.limits.filter_removal_warning_pct {
        return Vec::new();
    }

    let severity = if scanned > input.limits.min_rows_for_critical_scan {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let cols = extract_columns(&n.filter);
    let suggestion = if cols.is_empty() {
        format!(
            "Consider an index on {} matching the filter {}",
            n.relation_name, n.filter
        )
    } else {
        let mut s = format!(
            "Consider an index on {} ({})",
            n.relation_name,
            cols.join(", ")
        );
        if cols.len() == 1 {
            let literal = extract_literal(&n.filter);
            if !literal.is_empty() {
                s.push_str(&format!(
                    ", or a partial index WHERE {} = '{}'",
                    cols[0], literal
                ));
            }
        }
        s
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Sequential scan on {} scanned {} rows and filter removed {:.2}% ({} of {})",
            n.relation_name, scanned, shown_pct, n.rows_removed_by_filter, scanned
        ),
        suggestion,
    }]
}

/// Bitmap heap scan forced to recheck lossy pages. The bitmap overflowed
/// work_mem and degraded from exact tuple pointers to whole pages.
fn check_bitmap_recheck(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.node_type != "Bitmap Heap Scan" || n.lossy_heap_blocks == 0 {
        return Vec::new();
    }

    let total = n.lossy_heap_blocks + n.exact_heap_blocks;
    let lossy_pct = n.lossy_heap_blocks as f64 / total as f64 * 100.0;
    if lossy_pct < input.limits.recheck_warning_pct {
        return Vec::new();
    }

    let severity = if lossy_pct > input.limits.recheck_critical_pct {
        Severity::Critical
    } else {
        Severity::Warning
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Bitmap on {} went lossy for {:.1}% of heap blocks ({} of {})",
            n.label(),
            lossy_pct,
            n.lossy_heap_blocks,
            total
        ),
        suggestion: "Increase work_mem so the bitmap keeps exact tuple pointers".to_string(),
    }]
}

/// Nested loop whose inner side executed a large number of times.
fn check_nested_loop_inner_loops(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.node_type != "Nested Loop" || n.plans.len() < 2 {
        return Vec::new();
    }

    let inner = &n.plans[1];
    if inner.actual_loops < input.limits.nested_loop_warning_loops {
        return Vec::new();
    }

    let severity = if inner.actual_loops > input.limits.nested_loop_critical_loops {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let total_inner_ms = inner.actual_total_time * inner.actual_loops as f64;

    let suggestion = if !inner.relation_name.is_empty() {
        let mut s = format!(
            "Ensure the inner lookup on {} is indexed",
            inner.relation_name
        );
        if !inner.filter.is_empty() {
            s.push_str(&format!(" (inner filter: {})", inner.filter));
        }
        s.push_str("; a Hash Join may be cheaper at this loop count");
        s
    } else {
        "Check whether a Hash Join or Merge Join would avoid repeating the inner side".to_string()
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Nested loop ran its inner {} {} times ({:.1} ms total inner time)",
            inner.node_type, inner.actual_loops, total_inner_ms
        ),
        suggestion,
    }]
}

/// Sub-plan re-executed once per outer row. PostgreSQL marks these with
/// parent relationship "SubPlan"; high loop counts mean a correlated
/// subquery that never got flattened into a join.
fn check_correlated_subplan(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.parent_relationship != "SubPlan" {
        return Vec::new();
    }
    if n.actual_loops < input.limits.nested_loop_warning_loops {
        return Vec::new();
    }

    let severity = if n.actual_loops > input.limits.nested_loop_critical_loops {
        Severity::Critical
    } else {
        Severity::Warning
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Correlated sub-plan {} executed {} times",
            n.label(),
            n.actual_loops
        ),
        suggestion: "Rewrite the subquery as a join (or LATERAL join) so it runs once".to_string(),
    }]
}

/// Sort that exceeded work_mem and went to disk. Always critical; disk
/// sorts are orders of magnitude slower than in-memory ones.
fn check_sort_spill(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.sort_space_type != "Disk" {
        return Vec::new();
    }

    vec![Finding {
        severity: Severity::Critical,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Sort spilled to disk ({} kB) on {}",
            n.sort_space_used,
            n.label()
        ),
        suggestion: format!(
            "Increase work_mem above {} kB or reduce the data set before sorting",
            n.sort_space_used
        ),
    }]
}

/// Hash that split into multiple batches; the table did not fit in memory.
fn check_hash_spill(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.hash_batches <= 1 {
        return Vec::new();
    }

    let severity = if n.hash_batches > input.limits.hash_batches_critical {
        Severity::Critical
    } else {
        Severity::Warning
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Hash used {} batches (originally {}) with {} kB peak memory on {}",
            n.hash_batches,
            n.original_hash_batches,
            n.peak_memory_usage,
            n.label()
        ),
        suggestion: "Increase work_mem to fit the hash table in memory".to_string(),
    }]
}

/// Temp-file I/O of any kind. One block is 8 kB.
fn check_temp_io(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    let total = n.temp_read_blocks + n.temp_written_blocks;
    if total == 0 {
        return Vec::new();
    }

    let size_mb = (total * 8) as f64 / 1024.0;

    vec![Finding {
        severity: Severity::Warning,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Temp I/O: {} blocks ({:.1} MB) on {}",
            total,
            size_mb,
            n.label()
        ),
        suggestion: "Increase work_mem or restructure the query to shrink intermediate results"
            .to_string(),
    }]
}

/// Fewer parallel workers launched than planned.
fn check_worker_shortfall(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.workers_planned == 0 || n.workers_launched >= n.workers_planned {
        return Vec::new();
    }

    vec![Finding {
        severity: Severity::Warning,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Only {} of {} planned parallel workers launched on {}",
            n.workers_launched,
            n.workers_planned,
            n.label()
        ),
        suggestion: "Check max_parallel_workers and max_parallel_workers_per_gather".to_string(),
    }]
}

/// Gather that spent longer coordinating than its workers spent working.
/// Child loop count includes the leader, so per-loop time times loops is
/// the total time spent inside workers.
fn check_gather_overhead(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.node_type != "Gather" && n.node_type != "Gather Merge" {
        return Vec::new();
    }
    let Some(child) = n.plans.first() else {
        return Vec::new();
    };
    if child.actual_loops == 0 {
        return Vec::new();
    }

    let worker_time = child.actual_total_time * child.actual_loops as f64;
    let gather_time = n.actual_total_time;
    if gather_time <= worker_time {
        return Vec::new();
    }

    vec![Finding {
        severity: Severity::Info,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "{} spent {:.1} ms against {:.1} ms of worker time; parallelism overhead dominates",
            n.node_type, gather_time, worker_time
        ),
        suggestion: "Fewer workers (or a higher parallel_setup_cost) may be cheaper here"
            .to_string(),
    }]
}

/// Join filter that discarded a large number of rows after the join.
fn check_join_filter_removal(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.rows_removed_by_join_filter < input.limits.join_filter_removal_warning {
        return Vec::new();
    }

    let severity = if n.rows_removed_by_join_filter > input.limits.join_filter_removal_critical {
        Severity::Critical
    } else {
        Severity::Warning
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Join filter removed {} rows on {}",
            n.rows_removed_by_join_filter,
            n.label()
        ),
        suggestion: "Move the condition into the join clause or index it to shrink the join input"
            .to_string(),
    }]
}

/// Materialize re-scanned many times.
fn check_materialize_loops(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.node_type != "Materialize" {
        return Vec::new();
    }
    if n.actual_loops < input.limits.materialize_warning_loops {
        return Vec::new();
    }

    let severity = if n.actual_loops > input.limits.materialize_critical_loops {
        Severity::Critical
    } else {
        Severity::Warning
    };

    vec![Finding {
        severity,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!("Materialize re-scanned {} times", n.actual_loops),
        suggestion: "Check the outer side's row count; an index on the inner relation may avoid \
                     materialization"
            .to_string(),
    }]
}

/// Index scan reading mostly from disk for a large result. Skipped when the
/// node has a filter removing rows: the filter-inefficiency rule owns that
/// node, and two findings on one scan would point at the same fix twice.
fn check_low_selectivity_index_scan(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if !is_index_scan(&n.node_type) {
        return Vec::new();
    }
    if !n.filter.is_empty() && n.rows_removed_by_filter > 0 {
        return Vec::new();
    }
    if n.actual_rows < input.limits.min_rows_for_low_selectivity {
        return Vec::new();
    }
    if n.shared_read_blocks < input.limits.min_read_blocks_for_low_select {
        return Vec::new();
    }

    let total = n.shared_hit_blocks + n.shared_read_blocks;
    let read_pct = n.shared_read_blocks as f64 / total as f64 * 100.0;
    if read_pct < input.limits.read_blocks_critical_pct {
        return Vec::new();
    }

    vec![Finding {
        severity: Severity::Info,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "Index {} on {} read {} rows with {:.1}% of blocks from disk",
            n.index_name, n.relation_name, n.actual_rows, read_pct
        ),
        suggestion: "Low-selectivity index access; a sequential scan or a more selective index \
                     may be cheaper"
            .to_string(),
    }]
}

/// Wide rows flowing in volume.
fn check_wide_rows(input: &RuleInput<'_>) -> Vec<Finding> {
    let n = input.node;
    if n.plan_width < input.limits.wide_row_threshold {
        return Vec::new();
    }
    if n.effective_rows() < input.limits.wide_row_min_rows {
        return Vec::new();
    }

    vec![Finding {
        severity: Severity::Info,
        node_type: n.node_type.clone(),
        relation: n.relation_name.clone(),
        description: format!(
            "{} produces {} rows of {} bytes each",
            n.label(),
            n.effective_rows(),
            n.plan_width
        ),
        suggestion: "Select fewer columns or defer wide columns to a later lookup".to_string(),
    }]
}
