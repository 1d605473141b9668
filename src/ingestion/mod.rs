//! Data sources for the three named sheets.
//!
//! Every request calls [`fetch_sheets`], which asks a [`DataSource`] for the `Data`,
//! `Bullying Survey Data` and `School Links` sheets concurrently and optionally reports each
//! outcome to a [`SourceObserver`].
//!
//! Implementations:
//! - [`WorkbookSource`]: a local `.xlsx`/`.ods` workbook (feature `excel`)
//! - [`CsvDirSource`]: one CSV export per sheet in a directory
//! - [`SheetsApiSource`]: the live spreadsheet through the Sheets v4 API
//! - [`MemorySource`]: sheets held in memory (tests, embedding)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod observability;
pub mod sheets_api;
pub mod source;

pub use self::csv::CsvDirSource;
#[cfg(feature = "excel")]
pub use excel::WorkbookSource;
pub use observability::{SourceContext, SourceObserver, SourceSeverity, SourceStats, TracingSourceObserver};
pub use sheets_api::{SheetsApiOptions, SheetsApiSource, SHEETS_ENDPOINT};
pub use source::{
    fetch_sheets, DataSource, MemorySource, SourceSheets, BULLYING_SHEET, DATA_SHEET, LINKS_SHEET,
};
