//! Cross-tree consolidation of CTE-driven estimate mismatches.
//!
//! Per-node estimate warnings flood complex plans: one misestimated CTE
//! skews every join above every consumer. This pass blames the CTE at the
//! root of the misestimation instead, and only mentions ancestor nodes of
//! its consumers, so unrelated subtrees are never implicated.

use crate::plan::PlanNode;

use super::context::PlanContext;
use super::rules::Thresholds;
use super::{Finding, Severity};

/// How far apart estimate and actual are, as a ratio >= 1.
fn mismatch_ratio(estimated: u64, actual: u64) -> f64 {
    let e = estimated as f64;
    let a = actual as f64;
    if e > a {
        e / a
    } else {
        a / e
    }
}

/// Distinct relation names reachable beneath a CTE definition; these are
/// the tables whose statistics feed the misestimate.
fn source_relations(node: &PlanNode, out: &mut Vec<String>) {
    if !node.relation_name.is_empty() && !out.contains(&node.relation_name) {
        out.push(node.relation_name.clone());
    }
    for child in &node.plans {
        source_relations(child, out);
    }
}

/// Emit one Info finding per misestimated CTE whose error visibly skews
/// downstream nodes.
pub(crate) fn consolidate_cte_estimates(
    ctx: &PlanContext<'_>,
    limits: &Thresholds,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for cte in ctx.ctes() {
        if cte.actual_rows < limits.min_rows_for_estimate_mismatch {
            continue;
        }
        if cte.estimated_rows == 0 || cte.actual_rows == 0 {
            continue;
        }
        if mismatch_ratio(cte.estimated_rows, cte.actual_rows) < limits.estimate_mismatch_ratio {
            continue;
        }

        // Union of ancestors over every consumer of this CTE.
        let nodes = ctx.all_nodes();
        let mut is_ancestor = vec![false; nodes.len()];
        for (index, node_ref) in nodes.iter().enumerate() {
            if node_ref.node.cte_name != cte.name {
                continue;
            }
            for ancestor in ctx.ancestors(index) {
                is_ancestor[ancestor] = true;
            }
        }

        // Ancestors whose own estimate is off by the same ratio, pre-order,
        // deduplicated by node type.
        let mut affected: Vec<&str> = Vec::new();
        for (index, node_ref) in nodes.iter().enumerate() {
            if !is_ancestor[index] {
                continue;
            }
            let n = node_ref.node;
            if n.plan_rows == 0 || n.actual_rows == 0 || n.actual_loops == 0 {
                continue;
            }
            if mismatch_ratio(n.plan_rows, n.actual_rows) <= limits.estimate_mismatch_ratio {
                continue;
            }
            if !affected.contains(&n.node_type.as_str()) {
                affected.push(&n.node_type);
            }
        }

        if affected.is_empty() {
            continue;
        }

        let direction = if cte.estimated_rows > cte.actual_rows {
            "inflated"
        } else {
            "deflated"
        };

        let mut sources = Vec::new();
        source_relations(cte.node, &mut sources);
        let analyze_target = if sources.is_empty() {
            "the CTE's source tables".to_string()
        } else {
            sources.join(", ")
        };

        findings.push(Finding {
            severity: Severity::Info,
            node_type: cte.node.node_type.clone(),
            relation: String::new(),
            description: format!(
                "CTE {} has an {} row estimate ({} estimated vs {} actual), skewing: {}",
                cte.name,
                direction,
                cte.estimated_rows,
                cte.actual_rows,
                affected.join(", ")
            ),
            suggestion: format!(
                "Run ANALYZE on {} so the planner sees realistic CTE cardinality",
                analyze_target
            ),
        });
    }

    findings
}
