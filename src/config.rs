use crate::segment::{ReportSource, SegmentRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Free-form label for the loaded profile.
    pub profile_name: String,
    pub grammar: GrammarRules,
    pub recompose: RecomposeRules,
    /// Display names of known segments, in preference order
    pub segments: SegmentRegistry,
    /// Passes run over every report table, in order
    pub pipeline: Vec<PassConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile_name: "base".to_string(),
            grammar: GrammarRules::default(),
            recompose: RecomposeRules::default(),
            segments: SegmentRegistry::default(),
            pipeline: vec![PassConfig::SegmentValue, PassConfig::PresentationValue],
        }
    }
}

impl EngineConfig {
    /// Configured display names, completed with the report's own segments
    pub fn registry_for(&self, report: &dyn ReportSource) -> SegmentRegistry {
        let mut registry = self.segments.clone();
        if let Some(dimension) = report.dimension() {
            registry.extend_missing(&SegmentRegistry::from_descriptors(dimension.segments()));
        }
        registry
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarRules {
    /// Escape reserved characters in labels used as filter values
    pub escape_labels: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecomposeRules {
    /// Placed between a parent label and the label of its child
    pub recursive_label_separator: String,
    /// Labels longer than this are shown truncated
    pub max_label_length: Option<usize>,
    pub truncation_marker: String,
    /// Label of the placeholder row shown for an empty sub-table
    pub no_data_label: String,
}

impl Default for RecomposeRules {
    fn default() -> Self {
        Self {
            recursive_label_separator: String::new(),
            max_label_length: None,
            truncation_marker: "...".to_string(),
            no_data_label: "No data".to_string(),
        }
    }
}

/// One pass of the annotation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pass", rename_all = "snake_case")]
pub enum PassConfig {
    /// Label (or delimited label parts) matched against segment keys
    Segment {
        segments: Vec<String>,
        #[serde(default)]
        delimiter: String,
    },
    /// Label looked up in a mapping; defaults to the dimension's own mapping
    LabelMapping {
        #[serde(default)]
        segment: Option<String>,
        #[serde(default)]
        mapping: Option<BTreeMap<String, String>>,
    },
    /// Query-provided `segmentValue` metadata turned into a filter
    SegmentValue,
    /// Raw `segment_value` for client side tables
    PresentationValue,
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<EngineConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static EngineConfig {
    static DEFAULT_CONFIG: LazyLock<EngineConfig> = LazyLock::new(EngineConfig::default);
    &DEFAULT_CONFIG
}
