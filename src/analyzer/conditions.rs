//! Lightweight extraction of column names and literals from PostgreSQL
//! condition strings.
//!
//! EXPLAIN renders conditions like `((s.type)::text = '4'::text)` or
//! `(lower((sts.id)::text) = (tu.id)::text)`. The analyzer only needs the
//! referenced columns and, for partial-index suggestions, the literal of a
//! simple equality, so a pair of regexes beats dragging in a SQL parser.

use once_cell::sync::Lazy;
use regex::Regex;

/// Single-quoted string literals, stripped before column matching so that
/// words inside literals are never mistaken for identifiers.
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'[^']*'").unwrap());

/// Qualified reference `alias.column`; the column is the second identifier.
static COLUMN_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+)\.(\w+)\b").unwrap());

/// Cast form `(column)::type` for unqualified columns.
static CAST_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([a-zA-Z_]\w*)\)::").unwrap());

/// Simple equality `= '<value>'`. The character class before `=` rejects
/// `<>`, `>=`, `<=` and `!=` so range predicates never yield a literal.
static EQUALITY_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^<>!])=\s*'((?:[^']|'')*)'").unwrap());

/// Extract the column names referenced by a condition string.
///
/// Returns an order-preserving deduplicated list: qualified references
/// first, then cast-form columns. An empty condition yields an empty list.
pub fn extract_columns(cond: &str) -> Vec<String> {
    if cond.is_empty() {
        return Vec::new();
    }

    let cleaned = STRING_LITERAL.replace_all(cond, "");
    let mut cols: Vec<String> = Vec::new();

    for caps in COLUMN_REF.captures_iter(&cleaned) {
        let col = &caps[2];
        if !cols.iter().any(|c| c == col) {
            cols.push(col.to_string());
        }
    }
    for caps in CAST_COLUMN.captures_iter(&cleaned) {
        let col = &caps[1];
        if !cols.iter().any(|c| c == col) {
            cols.push(col.to_string());
        }
    }

    cols
}

/// Columns referenced by `filter` but not by `index_cond`, in filter order.
///
/// Matching is case-sensitive; EXPLAIN renders identifiers consistently
/// within one plan.
pub fn columns_not_in(filter: &str, index_cond: &str) -> Vec<String> {
    let index_cols = extract_columns(index_cond);
    extract_columns(filter)
        .into_iter()
        .filter(|col| !index_cols.contains(col))
        .collect()
}

/// All `(qualifier, column)` pairs in a condition, literals stripped.
pub(crate) fn qualified_refs(cond: &str) -> Vec<(String, String)> {
    let cleaned = STRING_LITERAL.replace_all(cond, "");
    COLUMN_REF
        .captures_iter(&cleaned)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// The literal of the first simple equality in a condition, or empty.
///
/// `(c = 'v')` yields `v`. Comparisons under `<>`, `>=`, `<=`, `!=`, `>`
/// and `<` yield nothing. Doubled single quotes decode to one quote.
pub fn extract_literal(cond: &str) -> String {
    match EQUALITY_LITERAL.captures(cond) {
        Some(caps) => caps[1].replace("''", "'"),
        None => String::new(),
    }
}
