//! Heuristic analysis of a single execution plan.
//!
//! The analyzer walks a plan tree and applies a fixed battery of rules,
//! each encoding one PostgreSQL execution pathology (sequential scans in
//! joins, index filter inefficiency, spills, correlated sub-plans, parallel
//! overhead, CTE estimate skew). Output is a severity-sorted finding list.
//!
//! The whole pipeline is a pure function of its input: no I/O, no shared
//! state, deterministic output for identical plans.

mod conditions;
mod context;
mod cte;
mod rules;

pub use conditions::{columns_not_in, extract_columns, extract_literal};
pub use context::{CteInfo, NodeRef, PlanContext};
pub use rules::Thresholds;

use serde::Serialize;

use crate::plan::{ExplainEnvelope, PlanNode};

use rules::{RuleInput, RULES};

/// How urgent a finding is. Ordered so `Critical` sorts above `Warning`
/// above `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// One detected problem with a remediation suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub node_type: String,
    pub relation: String,
    pub description: String,
    pub suggestion: String,
}

/// The outcome of analyzing one plan.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub total_cost: f64,
    pub execution_time: f64,
    pub planning_time: f64,
}

/// Analyze a plan with the default thresholds.
pub fn analyze(explain: &ExplainEnvelope) -> AnalysisResult {
    analyze_with(explain, &Thresholds::default())
}

/// Analyze a plan with explicit thresholds.
///
/// Rules run in a fixed order during a pre-order traversal, then the CTE
/// consolidation pass runs once, then findings are stable-sorted by
/// severity descending so ties keep discovery order.
pub fn analyze_with(explain: &ExplainEnvelope, limits: &Thresholds) -> AnalysisResult {
    let ctx = PlanContext::build(&explain.plan);

    let mut findings = Vec::new();
    walk(&explain.plan, None, None, &ctx, limits, &mut findings);
    findings.extend(cte::consolidate_cte_estimates(&ctx, limits));

    findings.sort_by(|a, b| b.severity.cmp(&a.severity));

    AnalysisResult {
        findings,
        total_cost: explain.plan.total_cost,
        execution_time: explain.execution_time,
        planning_time: explain.planning_time,
    }
}

fn walk(
    node: &PlanNode,
    parent: Option<&PlanNode>,
    child_index: Option<usize>,
    ctx: &PlanContext<'_>,
    limits: &Thresholds,
    findings: &mut Vec<Finding>,
) {
    let input = RuleInput {
        node,
        parent,
        child_index,
        plan: ctx,
        limits,
    };
    for rule in RULES {
        findings.extend(rule(&input));
    }

    for (index, child) in node.plans.iter().enumerate() {
        walk(child, Some(node), Some(index), ctx, limits, findings);
    }
}
