//! Deserialization of EXPLAIN JSON into plan envelopes.

use thiserror::Error;

use super::ExplainEnvelope;

/// Errors raised while ingesting EXPLAIN output.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid EXPLAIN JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("empty EXPLAIN output")]
    Empty,
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Parse the JSON produced by `EXPLAIN (ANALYZE, VERBOSE, BUFFERS, FORMAT JSON)`.
///
/// The top level is an array of one envelope per statement. Rejects input
/// that is not valid JSON or contains zero envelopes.
pub fn parse_explain(data: &str) -> IngestResult<Vec<ExplainEnvelope>> {
    let envelopes: Vec<ExplainEnvelope> = serde_json::from_str(data)?;
    if envelopes.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(envelopes)
}

/// Parse EXPLAIN JSON and return the first envelope.
///
/// Multi-statement EXPLAIN output is legal; analysis and comparison only
/// ever look at the first statement's plan.
pub fn parse_first(data: &str) -> IngestResult<ExplainEnvelope> {
    let mut envelopes = parse_explain(data)?;
    Ok(envelopes.remove(0))
}
