//! In-memory representation of PostgreSQL execution plans.
//!
//! The sole accepted input format is the JSON produced by
//! `EXPLAIN (ANALYZE, VERBOSE, BUFFERS, FORMAT JSON)`. Absent keys default
//! to zero/empty so that EXPLAIN output without ANALYZE (no actuals) or
//! without BUFFERS (no block counts) still round-trips into the same type.

mod ingest;
mod node;

pub use ingest::{parse_explain, parse_first, IngestError, IngestResult};
pub use node::{ExplainEnvelope, PlanNode};
