use crate::grammar::{self, MATCH_CONTAINS};
use crate::presenter::{decode, resolve_display_name, split_expression};
use crate::segment::{ReportSource, SegmentRegistry};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowActionError {
    #[error("Invalid popover parameter: '{0}'. Expected 'apiMethod:segment:extraParams'")]
    InvalidPopoverParam(String),
}

/// Request decoded from a popover URL parameter
#[derive(Debug, Clone, PartialEq)]
pub struct PopoverRequest {
    pub api_method: String,
    pub segment: String,
    pub extra_params: Value,
}

/// "Show the visits behind this row" action of a report table.
///
/// The row's label is matched with the contains operator against the first
/// segment of the report's own dimension. Display names only affect the
/// popover title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRowAction {
    segment: Option<String>,
    comparison: &'static str,
}

impl SegmentRowAction {
    pub fn new(segment: Option<String>) -> Self {
        Self {
            segment,
            comparison: MATCH_CONTAINS,
        }
    }

    pub fn for_report(report: &dyn ReportSource) -> Self {
        Self::new(report.first_segment().map(|s| s.key.clone()))
    }

    /// The action needs a segment to filter on
    pub fn is_available(&self) -> bool {
        self.segment.is_some()
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    /// Expression for a clicked row. A leading `@` marks a label that is
    /// already a raw value and is dropped.
    pub fn segment_for_label(&self, label: &str) -> Option<String> {
        let segment = self.segment.as_deref()?;
        let label = label.strip_prefix('@').unwrap_or(label);
        Some(grammar::build_escaped_clause(segment, self.comparison, label))
    }

    /// `Visits log showing visits where Device type is "Desktop"`
    pub fn popover_title(
        &self,
        base_title: &str,
        segment: &str,
        registry: &SegmentRegistry,
    ) -> Option<String> {
        let (key, raw_value) = split_expression(segment, self.comparison)?;
        Some(format!(
            "{} showing visits where {} is \"{}\"",
            base_title,
            resolve_display_name(key, registry),
            decode(raw_value)
        ))
    }
}

/// Encode the popover URL parameter `apiMethod:segment:extraParams`
pub fn popover_param(api_method: &str, segment: &str, extra_params: &Value) -> String {
    format!(
        "{}:{}:{}",
        api_method,
        segment,
        urlencoding::encode(&extra_params.to_string())
    )
}

/// Decode a popover URL parameter.
///
/// The segment may itself contain `:`, so it is everything between the first
/// and the last separator. Extra parameters that are not valid JSON become an
/// empty object.
pub fn parse_popover_param(param: &str) -> Result<PopoverRequest, RowActionError> {
    let invalid = || RowActionError::InvalidPopoverParam(param.to_string());

    let (api_method, rest) = param.split_once(':').ok_or_else(invalid)?;
    let (segment, extra) = rest.rsplit_once(':').ok_or_else(invalid)?;
    if api_method.is_empty() || segment.is_empty() {
        return Err(invalid());
    }

    let extra_params = serde_json::from_str::<Value>(&decode(extra))
        .unwrap_or_else(|_| Value::Object(Map::new()));

    Ok(PopoverRequest {
        api_method: api_method.to_string(),
        segment: segment.to_string(),
        extra_params,
    })
}
