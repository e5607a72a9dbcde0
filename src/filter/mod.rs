//! Row filter passes
//!
//! Each pass walks a report table (and its sub-tables) and annotates rows
//! with the segment expression that selects the records behind the row:
//!
//! - [`SegmentFilter`]: the label itself, or its delimited parts, as values
//! - [`LabelMappingFilter`]: the label looked up in a label -> value table
//! - [`SegmentValueFilter`]: the `segmentValue` the query layer attached
//! - [`PresentationValueFilter`]: the raw `segment_value` used by client side
//!   tables (not an expression)
//!
//! Passes are run in order by a [`Pipeline`]. A row's `segmentFilter` is only
//! ever written once: the first pass that derives one wins.
//!
//! # Examples
//!
//! ```text
//! deviceType==Desktop                 single segment
//! dim1==A;dim2==B                     label "A-B", delimiter "-"
//! deviceType==smartphone              label "1" mapped to "smartphone"
//! ref==a%2Cb                          segmentValue "a,b"
//! ```

pub mod by_label;
pub mod by_label_mapping;
pub mod by_segment_value;
pub mod error;
pub mod pipeline;
pub mod presentation;

pub use by_label::SegmentFilter;
pub use by_label_mapping::LabelMappingFilter;
pub use by_segment_value::SegmentValueFilter;
pub use error::ConfigurationError;
pub use pipeline::{PassReport, Pipeline, PipelineReport};
pub use presentation::PresentationValueFilter;

use crate::table::DataTable;

/// A transformation annotating the rows of a table in place
pub trait RowFilterPass {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Annotate `table` and its sub-tables, returning how many rows received
    /// a value. A configuration error means no row was touched.
    fn apply(&self, table: &mut DataTable) -> Result<usize, ConfigurationError>;
}
