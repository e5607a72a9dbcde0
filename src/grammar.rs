//! Segment expression grammar helpers
//!
//! A segment expression scopes an analytics query to the records matching a
//! set of conditions:
//!
//! ```text
//! key OP value                 a single condition
//! key OP value;key OP value    conditions combined with AND
//! key OP value,key OP value    conditions combined with OR
//! ```
//!
//! The characters `,`, `;` and `&` are reserved by the grammar (and by the URL
//! the expression travels in), so values have to be escaped before they are
//! placed in a clause.

/// Exact match operator
pub const MATCH_EXACT: &str = "==";
/// Contains operator
pub const MATCH_CONTAINS: &str = "=@";
/// Separator between AND-combined conditions
pub const CONDITION_AND: &str = ";";
/// Separator between OR-combined conditions
pub const CONDITION_OR: &str = ",";

/// Percent-encode the reserved characters `,`, `;` and `&`.
///
/// Every other character is left untouched, including `%`, so escaping an
/// already escaped value is a no-op only as long as it contains no reserved
/// character. Values must be escaped exactly once.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ',' => escaped.push_str("%2C"),
            ';' => escaped.push_str("%3B"),
            '&' => escaped.push_str("%26"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build a single `key OP value` clause. The value is inserted as given.
pub fn build_clause(key: &str, operator: &str, value: &str) -> String {
    format!("{key}{operator}{value}")
}

/// Build a single clause, escaping the raw value first.
pub fn build_escaped_clause(key: &str, operator: &str, raw_value: &str) -> String {
    build_clause(key, operator, &escape(raw_value))
}

/// Join clauses with the AND separator, skipping blank clauses.
pub fn join_and<S: AsRef<str>>(clauses: &[S]) -> String {
    clauses
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| !c.trim().is_empty())
        .collect::<Vec<_>>()
        .join(CONDITION_AND)
}
