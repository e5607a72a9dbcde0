use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes how a report dimension maps onto a segment key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentDescriptor {
    /// Stable identifier used in expressions (e.g. "deviceType")
    pub key: String,
    /// Human readable name shown to users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Explicit display label -> underlying value table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_to_value: Option<BTreeMap<String, String>>,
    /// The value can only be resolved through a server side callback
    pub has_custom_resolver: bool,
    /// The segment filters on the label itself (SQL filter equivalent)
    pub custom_value_filter: bool,
    /// A dedicated suggested-values resolver exists for this segment
    pub suggested_values_hook: bool,
}

impl SegmentDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_label_to_value<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.label_to_value = Some(
            mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_custom_resolver(mut self, enabled: bool) -> Self {
        self.has_custom_resolver = enabled;
        self
    }

    pub fn with_custom_value_filter(mut self, enabled: bool) -> Self {
        self.custom_value_filter = enabled;
        self
    }

    pub fn with_suggested_values_hook(mut self, enabled: bool) -> Self {
        self.suggested_values_hook = enabled;
        self
    }

    /// Name to show for this segment, falling back to its key
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

/// The dimension a report is built on, with the segments that can filter it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimension {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub segments: Vec<SegmentDescriptor>,
}

impl Dimension {
    pub fn new(segments: Vec<SegmentDescriptor>) -> Self {
        Self {
            name: None,
            segments,
        }
    }

    pub fn segments(&self) -> &[SegmentDescriptor] {
        &self.segments
    }

    /// Multi-segment dimensions are not disambiguated; the first one wins.
    pub fn first_segment(&self) -> Option<&SegmentDescriptor> {
        self.segments.first()
    }
}

/// Anything that can tell which dimension a report is built on
pub trait ReportSource {
    fn dimension(&self) -> Option<&Dimension>;

    fn first_segment(&self) -> Option<&SegmentDescriptor> {
        self.dimension().and_then(Dimension::first_segment)
    }
}

impl ReportSource for Dimension {
    fn dimension(&self) -> Option<&Dimension> {
        Some(self)
    }
}

/// A known segment with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSegment {
    pub key: String,
    pub name: String,
}

/// Lookup of segment display names. Never used to pick the segment a filter
/// applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentRegistry {
    entries: Vec<RegisteredSegment>,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors(descriptors: &[SegmentDescriptor]) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.insert(&descriptor.key, descriptor.display_name());
        }
        registry
    }

    /// Add a segment, replacing the name of an already registered key
    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>) {
        let key = key.into();
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.name = name,
            None => self.entries.push(RegisteredSegment { key, name }),
        }
    }

    /// Register every entry of `other` that is not known yet
    pub fn extend_missing(&mut self, other: &SegmentRegistry) {
        for entry in &other.entries {
            if self.display_name(&entry.key).is_none() {
                self.entries.push(entry.clone());
            }
        }
    }

    pub fn display_name(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
