//! # planlens
//!
//! Analysis and comparison of PostgreSQL execution plans.
//!
//! planlens consumes the JSON produced by
//! `EXPLAIN (ANALYZE, VERBOSE, BUFFERS, FORMAT JSON)` and either diagnoses
//! performance problems in a single plan or computes a structural diff
//! between two plans.
//!
//! ## Quick Start
//!
//! ```rust
//! use planlens::analyzer::analyze;
//! use planlens::plan::parse_first;
//!
//! let explain = parse_first(
//!     r#"[{"Plan": {"Node Type": "Seq Scan", "Relation Name": "events",
//!          "Total Cost": 155.0}, "Planning Time": 0.2}]"#,
//! )
//! .unwrap();
//!
//! let result = analyze(&explain);
//! assert_eq!(result.total_cost, 155.0);
//! for finding in &result.findings {
//!     println!("{}: {}", finding.severity, finding.description);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 plan (model)                 │
//! │   EXPLAIN JSON → ExplainEnvelope / PlanNode  │
//! └──────────────────────────────────────────────┘
//!            │                      │
//!            ▼                      ▼
//!        analyzer               comparator
//!   (context + rules →     (positional diff →
//!    sorted findings)        deltas + verdict)
//!            │                      │
//!            └──────────┬───────────┘
//!                       ▼
//!                    output
//!           (colored text / JSON)
//! ```
//!
//! The analyzer and comparator are pure, single-threaded functions: inputs
//! are borrowed read-only, outputs are owned by the caller, and identical
//! inputs always produce identical output.

pub mod analyzer;
pub mod comparator;
pub mod output;
pub mod plan;

pub use analyzer::{analyze, AnalysisResult, Finding, Severity};
pub use comparator::{Comparator, ComparisonResult};
pub use plan::{ExplainEnvelope, PlanNode};
