use segment_filter::filter::{
    ConfigurationError, LabelMappingFilter, Pipeline, RowFilterPass, SegmentFilter,
    SegmentValueFilter,
};
use segment_filter::segment::{Dimension, SegmentDescriptor};
use segment_filter::table::{DataTable, ReportRow, SEGMENT_FILTER, SEGMENT_VALUE};

fn filters(table: &DataTable) -> Vec<Option<&str>> {
    table.rows.iter().map(|r| r.segment_filter()).collect()
}

#[test]
fn test_single_segment_rows() {
    let mut table = DataTable::from_labels(&["Desktop", "", "Mobile"]);
    SegmentFilter::single("deviceType")
        .apply(&mut table)
        .expect("segment configured");

    assert_eq!(
        filters(&table),
        vec![Some("deviceType==Desktop"), None, Some("deviceType==Mobile")]
    );
}

#[test]
fn test_delimited_segments_require_matching_arity() {
    let mut table = DataTable::from_labels(&["A-B", "A"]);
    SegmentFilter::delimited(["dim1", "dim2"], "-")
        .apply(&mut table)
        .expect("segments configured");

    assert_eq!(filters(&table), vec![Some("dim1==A;dim2==B"), None]);
}

#[test]
fn test_delimited_segments_without_delimiter() {
    let mut table = DataTable::from_labels(&["A-B", "C-D"]);
    let result = SegmentFilter::delimited(["dim1", "dim2"], "").apply(&mut table);

    assert!(matches!(
        result,
        Err(ConfigurationError::MissingDelimiter { .. })
    ));
    assert_eq!(filters(&table), vec![None, None]);
}

#[test]
fn test_label_mapping() {
    let mut table = DataTable::from_labels(&["1", "3"]);
    LabelMappingFilter::new("deviceType", [("1", "smartphone"), ("2", "desktop")])
        .apply(&mut table)
        .expect("mapping configured");

    assert_eq!(table.rows[0].segment_filter(), Some("deviceType==smartphone"));
    assert_eq!(table.rows[1].segment_filter(), None);
    assert_eq!(table.rows[1].label, "3");
    assert!(table.rows[1].metadata.is_empty());
}

#[test]
fn test_segment_value_is_escaped() {
    let dimension = Dimension::new(vec![SegmentDescriptor::new("ref")]);
    let mut table = DataTable::new(vec![
        ReportRow::new("a,b;c&d").with_metadata(SEGMENT_VALUE, "a,b;c&d"),
    ]);
    SegmentValueFilter::for_report(&dimension)
        .apply(&mut table)
        .expect("no configuration needed");

    assert_eq!(table.rows[0].segment_filter(), Some("ref==a%2Cb%3Bc%26d"));
}

#[test]
fn test_segment_value_pass_keeps_earlier_filter() {
    let dimension = Dimension::new(vec![SegmentDescriptor::new("deviceType")]);
    let mut table = DataTable::new(vec![
        ReportRow::new("Desktop").with_metadata(SEGMENT_VALUE, "desktop"),
        ReportRow::new("").with_metadata(SEGMENT_VALUE, "unknown"),
    ]);

    let pipeline = Pipeline::new()
        .with_pass(SegmentFilter::single("deviceType"))
        .with_pass(SegmentValueFilter::for_report(&dimension))
        .with_pass(SegmentValueFilter::for_report(&dimension));
    let report = pipeline.run(&mut table);

    assert_eq!(table.rows[0].segment_filter(), Some("deviceType==Desktop"));
    assert_eq!(table.rows[1].segment_filter(), Some("deviceType==unknown"));
    assert_eq!(
        report.passes.iter().map(|p| p.annotated).collect::<Vec<_>>(),
        vec![1, 1, 0]
    );
}

#[test]
fn test_summary_row_handling_differs_per_pass() {
    let build = || {
        DataTable::from_labels(&["1"])
            .with_summary_row(ReportRow::new("2").with_metadata(SEGMENT_VALUE, "2"))
    };

    let mut table = build();
    SegmentFilter::single("deviceType").apply(&mut table).unwrap();
    assert_eq!(table.summary_row.as_ref().unwrap().segment_filter(), None);

    let mut table = build();
    LabelMappingFilter::new("deviceType", [("2", "desktop")])
        .apply(&mut table)
        .unwrap();
    assert_eq!(
        table.summary_row.as_ref().unwrap().segment_filter(),
        Some("deviceType==desktop")
    );
}

#[test]
fn test_passes_annotate_nested_subtables() {
    let dimension = Dimension::new(vec![SegmentDescriptor::new("pageUrl")]);
    let mut table = DataTable::new(vec![
        ReportRow::new("shop")
            .with_metadata(SEGMENT_VALUE, "shop")
            .with_subtable(DataTable::new(vec![
                ReportRow::new("apple").with_metadata(SEGMENT_VALUE, "shop/apple"),
                ReportRow::new("pear").with_metadata(SEGMENT_FILTER, "pageUrl=@pear"),
            ])),
    ]);

    let annotated = SegmentValueFilter::for_report(&dimension)
        .apply(&mut table)
        .unwrap();

    assert_eq!(annotated, 2);
    let subtable = table.rows[0].subtable.as_ref().unwrap();
    assert_eq!(filters(subtable), vec![Some("pageUrl==shop/apple"), Some("pageUrl=@pear")]);
}

#[test]
fn test_summary_row_subtable_is_not_annotated() {
    let mut table = DataTable::from_labels(&["Desktop"]).with_summary_row(
        ReportRow::new("Others").with_subtable(DataTable::from_labels(&["Tablet"])),
    );

    let annotated = LabelMappingFilter::new("deviceType", [("Tablet", "2"), ("Others", "-1")])
        .apply(&mut table)
        .unwrap();

    assert_eq!(annotated, 1);
    let summary = table.summary_row.as_ref().unwrap();
    assert_eq!(summary.segment_filter(), Some("deviceType==-1"));
    assert_eq!(filters(summary.subtable.as_ref().unwrap()), vec![None]);
}
