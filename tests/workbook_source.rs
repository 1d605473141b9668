#![cfg(feature = "excel_test_writer")]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use school_finder::ingestion::excel::read_workbook_sheet;
use school_finder::ingestion::{fetch_sheets, DataSource, WorkbookSource, LINKS_SHEET};
use school_finder::processing::{build, filter, project, FilterCriteria};
use school_finder::types::Value;
use school_finder::FinderError;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("school-finder-{name}-{nanos}.xlsx"))
}

fn write_school_workbook(path: &PathBuf, include_links: bool) {
    use rust_xlsxwriter::Workbook;

    let mut wb = Workbook::new();

    let data = wb.add_worksheet();
    data.set_name("Data").unwrap();
    for (col, label) in [
        "DBN",
        "School Name",
        "Borough",
        "% Graduation Rate (2019)",
        "% Freshman 10 credit accumulation",
        "% Sophomore 10 credit accumulation",
        "Enrollment",
    ]
    .iter()
    .enumerate()
    {
        data.write_string(0, col as u16, *label).unwrap();
    }
    data.write_string(1, 0, "01K001").unwrap();
    data.write_string(1, 1, "Fulton Academy").unwrap();
    data.write_string(1, 2, "Brooklyn").unwrap();
    data.write_number(1, 3, 80).unwrap();
    data.write_number(1, 4, 70).unwrap();
    data.write_number(1, 5, 90).unwrap();
    data.write_number(1, 6, 512).unwrap();
    data.write_string(2, 0, "02Q002").unwrap();
    data.write_string(2, 1, "Main Street High").unwrap();
    data.write_string(2, 2, "Queens").unwrap();
    data.write_number(2, 3, 60).unwrap();
    data.write_number(2, 4, 50).unwrap();
    data.write_string(2, 5, "50%").unwrap();

    let bullying = wb.add_worksheet();
    bullying.set_name("Bullying Survey Data").unwrap();
    for col in 0..6u16 {
        bullying.write_string(0, col, format!("col{col}")).unwrap();
    }
    bullying.write_string(1, 0, "02Q002").unwrap();
    bullying.write_number(1, 5, 0.231).unwrap();

    if include_links {
        let links = wb.add_worksheet();
        links.set_name("School Links").unwrap();
        for col in 0..5u16 {
            links.write_string(0, col, format!("col{col}")).unwrap();
        }
        links.write_string(1, 0, "01K001").unwrap();
        links.write_string(1, 4, "https://example.org/fulton").unwrap();
    }

    wb.save(path).unwrap();
}

#[test]
fn reads_named_sheet_with_numeric_cells() {
    let path = tmp_file("data");
    write_school_workbook(&path, true);

    let sheet = read_workbook_sheet(&path, "Data").unwrap();
    assert_eq!(sheet.row_count(), 2);
    assert_eq!(sheet.index_of("Enrollment"), Some(6));
    assert_eq!(sheet.rows[0][3], Value::Float64(80.0));
    assert_eq!(sheet.rows[1][5], Value::Utf8("50%".to_string()));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn workbook_feeds_the_pipeline() {
    let path = tmp_file("pipeline");
    write_school_workbook(&path, true);

    let source = WorkbookSource::new(&path);
    let sheets = fetch_sheets(&source, None).await.unwrap();
    let schools = build(&sheets.data, &sheets.bullying, &sheets.links).unwrap();
    let rows = project(&filter(&schools, &FilterCriteria::default()));

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Rating"), Some("80.0"));
    assert_eq!(rows[0].get("Enrollment"), Some("512.0"));
    assert_eq!(rows[0].get("School Link"), Some("https://example.org/fulton"));
    assert_eq!(rows[1].get("% Sophomore 10 credit accumulation"), Some("50.0"));
    assert_eq!(rows[1].get("% Students Reporting Frequent Bullying"), Some("23.1"));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn missing_sheet_is_a_data_source_error() {
    let path = tmp_file("no-links");
    write_school_workbook(&path, false);

    let source = WorkbookSource::new(&path);
    let err = source.fetch_sheet(LINKS_SHEET).await.unwrap_err();
    assert!(matches!(err, FinderError::DataSource { ref sheet, .. } if sheet == LINKS_SHEET));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn missing_workbook_is_an_io_failure() {
    let source = WorkbookSource::new(tmp_file("does-not-exist"));
    let err = source.fetch_sheet("Data").await.unwrap_err();
    assert!(matches!(err, FinderError::Excel(_) | FinderError::Io(_)));
}
