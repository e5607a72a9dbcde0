use thiserror::Error;

/// Caller misconfiguration of a filter pass.
///
/// A pass returning this error has not touched any row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Segment filter is called without having any segments defined")]
    MissingSegments,

    #[error("Multiple segments are given but no delimiter defined. Segments: {}", .segments.join(", "))]
    MissingDelimiter { segments: Vec<String> },
}
