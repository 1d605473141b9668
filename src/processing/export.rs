//! CSV export of projected rows.

use std::io::Write;
use std::path::Path;

use crate::error::FinderResult;

use super::project::{OutputRow, OUTPUT_FIELDS};

/// Default file name for exported results.
pub const DEFAULT_EXPORT_FILE: &str = "nyc_high_schools.csv";

/// Write rows as CSV: one header line of output labels, then one record per row.
///
/// Values containing commas, quotes or newlines are quoted by the `csv` writer.
pub fn write_csv<W: Write>(rows: &[OutputRow], writer: W) -> FinderResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(OUTPUT_FIELDS)?;
    for row in rows {
        wtr.write_record(row.values())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write rows as CSV to `path`, creating or truncating the file.
pub fn write_csv_to_path(rows: &[OutputRow], path: impl AsRef<Path>) -> FinderResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(rows, std::io::BufWriter::new(file))
}
