mod common;

use std::fs;

use common::{REGISTRY_ROWS, TestWorkspace};
use encoding_rs::WINDOWS_874;
use smart_ingest::{
    IngestError, IngestOptions, SheetSelector,
    config::ScorerKind,
    ingest,
    loader::{self, CSV_SHEET_NAME},
    pipeline, repair,
};

#[test]
fn workbook_header_below_title_rows() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_workbook("registry.xlsx", &[("Projects", REGISTRY_ROWS)]);

    let ingested = ingest(&path, None, &IngestOptions::default()).expect("ingest workbook");

    assert_eq!(ingested.header_row, Some(2));
    assert!(ingested.repaired.is_none());
    assert_eq!(ingested.source, path);
    let table = &ingested.table;
    assert_eq!(table.columns(), ["Project", "Owner", "Budget"]);
    assert_eq!(table.len(), 2, "blank data row is dropped");
    assert_eq!(table.value(0, "Project"), Some("Soil survey"));
    assert_eq!(table.value(0, "Budget"), Some("150000"));
    assert_eq!(table.value(1, "Owner"), Some("Malee"));
    assert_eq!(table.value(1, "Budget"), Some("98000.5"));
}

#[test]
fn fill_count_scorer_prefers_first_full_row() {
    let workspace = TestWorkspace::new();
    let rows: &[&[&str]] = &[
        &["1", "2", "3"],
        &["Project", "Owner", "Budget"],
        &["Soil survey", "Somchai", "150000"],
    ];
    let path = workspace.write_workbook("numbers.xlsx", &[("Sheet1", rows)]);

    let weighted = ingest(&path, None, &IngestOptions::default()).expect("weighted");
    assert_eq!(weighted.header_row, Some(1));

    let mut options = IngestOptions::default();
    options.header.scorer = ScorerKind::FillCount;
    let legacy = ingest(&path, None, &options).expect("fill count");
    assert_eq!(legacy.header_row, Some(0));
    assert_eq!(legacy.table.columns(), ["1", "2", "3"]);
}

#[test]
fn sheet_selector_by_name_and_index() {
    let workspace = TestWorkspace::new();
    let summary: &[&[&str]] = &[&["Total", "2"]];
    let path = workspace.write_workbook(
        "book.xlsx",
        &[("Summary", summary), ("Projects", REGISTRY_ROWS)],
    );

    let by_name = ingest(
        &path,
        Some(&SheetSelector::Name("Projects".into())),
        &IngestOptions::default(),
    )
    .expect("by name");
    assert_eq!(by_name.table.columns(), ["Project", "Owner", "Budget"]);

    let by_index = ingest(&path, Some(&SheetSelector::Index(0)), &IngestOptions::default())
        .expect("by index");
    assert_eq!(by_index.table.columns(), ["Total", "2"]);
    assert!(by_index.table.is_empty());

    let sheets = loader::list_sheets(&path).expect("list sheets");
    assert_eq!(sheets, ["Summary", "Projects"]);
}

#[test]
fn thai_legacy_encoded_csv_is_decoded() {
    let workspace = TestWorkspace::new();
    let (bytes, _, unmappable) = WINDOWS_874.encode("ชื่อ,อีเมล\nสมชาย,a@x.com\n");
    assert!(!unmappable);
    let path = workspace.write_bytes("staff.csv", &bytes);

    let ingested = ingest(&path, None, &IngestOptions::default()).expect("ingest csv");

    assert_eq!(ingested.table.columns(), ["ชื่อ", "อีเมล"]);
    assert_eq!(ingested.table.len(), 1);
    assert_eq!(ingested.table.value(0, "ชื่อ"), Some("สมชาย"));
    assert_eq!(ingested.table.value(0, "อีเมล"), Some("a@x.com"));
}

#[test]
fn csv_with_bom_and_placeholder_headers() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "dup.csv",
        "\u{feff}Date,Date,Unnamed: 2,\n2024-01-01,,x,NA\n",
    );

    let ingested = ingest(&path, None, &IngestOptions::default()).expect("ingest csv");

    assert_eq!(
        ingested.table.columns(),
        ["Date", "Date_2", "Field_3", "Field_4"]
    );
    assert_eq!(ingested.table.value(0, "Date"), Some("2024-01-01"));
    assert_eq!(ingested.table.value(0, "Date_2"), Some(""));
    assert_eq!(ingested.table.value(0, "Field_3"), Some("x"));
    assert_eq!(ingested.table.value(0, "Field_4"), Some(""));
    assert_eq!(
        loader::list_sheets(&path).expect("csv sheets"),
        [CSV_SHEET_NAME]
    );
}

#[test]
fn empty_csv_yields_empty_table() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("empty.csv", "");

    let ingested = ingest(&path, None, &IngestOptions::default()).expect("empty is not an error");

    assert!(ingested.table.is_empty());
    assert!(ingested.table.columns().is_empty());
    assert_eq!(ingested.header_row, None);
}

#[test]
fn mislabelled_workbook_is_repaired_and_reused() {
    let workspace = TestWorkspace::new();
    let built = workspace.write_workbook("built.xlsx", &[("Projects", REGISTRY_ROWS)]);
    let mislabelled = workspace.join("legacy.xls");
    fs::copy(&built, &mislabelled).expect("copy workbook");

    let ingested = ingest(
        &mislabelled,
        Some(&SheetSelector::Name("Projects".into())),
        &IngestOptions::default(),
    )
    .expect("repaired ingest");

    let repaired = ingested.repaired.as_ref().expect("repair happened");
    assert_eq!(repaired.path, workspace.join("legacy_repaired.xlsx"));
    assert!(repaired.path.is_file());
    assert_eq!(ingested.source, repaired.path);
    assert_eq!(repaired.sheet_names(), ["Projects"]);
    assert_eq!(ingested.table.columns(), ["Project", "Owner", "Budget"]);
    assert_eq!(ingested.table.len(), 2);

    let again = ingest(&ingested.source, None, &IngestOptions::default()).expect("reuse copy");
    assert!(again.repaired.is_none());
    assert_eq!(again.table, ingested.table);
}

#[test]
fn sheet_listing_falls_back_to_repair() {
    let workspace = TestWorkspace::new();
    let built = workspace.write_workbook("built.xlsx", &[("A", REGISTRY_ROWS), ("B", REGISTRY_ROWS)]);
    let mislabelled = workspace.join("export.ods");
    fs::copy(&built, &mislabelled).expect("copy workbook");

    let (names, repaired) =
        pipeline::list_sheets(&mislabelled, &IngestOptions::default()).expect("list sheets");

    assert_eq!(names, ["A", "B"]);
    assert!(repaired.is_some());
}

#[test]
fn text_renamed_as_workbook_fails_repair() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("report.xlsx", "Project,Owner\nSoil,Somchai\n");

    let err = ingest(&path, None, &IngestOptions::default()).unwrap_err();

    assert!(matches!(err, IngestError::RepairFailed { .. }), "{err}");
    assert!(!workspace.join("report_repaired.xlsx").exists());
}

#[test]
fn repair_disabled_reports_unreadable() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("report.xlsx", "not a zip");
    let mut options = IngestOptions::default();
    options.repair.enabled = false;

    let err = ingest(&path, None, &options).unwrap_err();

    assert!(err.is_unreadable());
    assert!(err.to_string().contains("report.xlsx"));
}

#[test]
fn repair_rejects_text_sources() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("plain.csv", "a,b\n1,2\n");

    let err = repair::repair(&path).unwrap_err();

    assert!(matches!(err, IngestError::RepairFailed { .. }));
}
