//! Turning stored segment expressions back into something readable
//!
//! These helpers only format; they are never used to derive filters again.

use crate::grammar::{CONDITION_AND, CONDITION_OR};
use crate::segment::SegmentRegistry;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<key>[A-Za-z0-9_.\-]+)(?P<op>==|!=|<=|>=|=@|!@|=\^|=\$|<|>)(?P<value>.*)$")
        .expect("valid condition regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenterError {
    #[error("Invalid segment condition: '{0}'")]
    InvalidCondition(String),

    #[error("Empty segment expression")]
    EmptyExpression,
}

/// One `key OP value` condition with its value decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCondition {
    pub key: String,
    pub operator: String,
    pub value: String,
}

/// Split `expr` at the first occurrence of `operator` into key and raw value
pub fn split_expression<'a>(expr: &'a str, operator: &str) -> Option<(&'a str, &'a str)> {
    if operator.is_empty() {
        return None;
    }
    expr.split_once(operator)
}

/// Human name of a segment, or the key itself when it is not registered
pub fn resolve_display_name(key: &str, registry: &SegmentRegistry) -> String {
    registry.display_name(key).unwrap_or(key).to_string()
}

/// Percent-decode a value; malformed input is returned unchanged
pub fn decode(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Parse a full expression into AND groups of OR-combined conditions
pub fn parse_expression(expr: &str) -> Result<Vec<Vec<SegmentCondition>>, PresenterError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(PresenterError::EmptyExpression);
    }

    expr.split(CONDITION_AND)
        .filter(|group| !group.trim().is_empty())
        .map(|group| {
            group
                .split(CONDITION_OR)
                .map(parse_condition)
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

fn parse_condition(text: &str) -> Result<SegmentCondition, PresenterError> {
    let text = text.trim();
    let caps = CONDITION_RE
        .captures(text)
        .ok_or_else(|| PresenterError::InvalidCondition(text.to_string()))?;

    Ok(SegmentCondition {
        key: caps["key"].to_string(),
        operator: caps["op"].to_string(),
        value: decode(&caps["value"]),
    })
}

/// `Device type is "smartphone"` for `deviceType==smartphone`
pub fn describe(expr: &str, operator: &str, registry: &SegmentRegistry) -> Option<String> {
    let (key, raw_value) = split_expression(expr, operator)?;
    Some(format!(
        "{} is \"{}\"",
        resolve_display_name(key, registry),
        decode(raw_value)
    ))
}
