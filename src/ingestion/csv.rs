//! CSV-backed sheets: one `<sheet name>.csv` per sheet in a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{FinderError, FinderResult};
use crate::types::{Sheet, Value};

use super::source::DataSource;

/// Read a CSV file into a [`Sheet`]. The first record is the header row.
pub fn read_csv_sheet(path: impl AsRef<Path>, name: &str) -> FinderResult<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    read_csv_sheet_from_reader(&mut rdr, name)
}

/// Read CSV data from an existing reader.
///
/// The reader should be built with `has_headers(false)` so the header row comes back as the first
/// record. Rows may have any width; cells are kept as trimmed text, blanks as [`Value::Null`].
pub fn read_csv_sheet_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    name: &str,
) -> FinderResult<Sheet> {
    let mut grid: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        grid.push(record.iter().map(Value::from_text).collect());
    }

    if grid.is_empty() {
        return Err(FinderError::data_source(name, "sheet has no header row"));
    }
    Ok(Sheet::from_grid(name, grid))
}

/// A directory holding one CSV export per sheet (`Data.csv`, `School Links.csv`, ...).
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `sheet`.
    pub fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{sheet}.csv"))
    }
}

#[async_trait]
impl DataSource for CsvDirSource {
    fn source_tag(&self) -> &'static str {
        "csv"
    }

    async fn fetch_sheet(&self, name: &str) -> FinderResult<Sheet> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Err(FinderError::data_source(
                name,
                format!("no sheet file at {}", path.display()),
            ));
        }

        let sheet = name.to_string();
        tokio::task::spawn_blocking(move || read_csv_sheet(&path, &sheet))
            .await
            .map_err(|e| FinderError::data_source(name, format!("csv loader task failed: {e}")))?
    }
}
