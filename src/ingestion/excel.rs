#![cfg(feature = "excel")]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{FinderError, FinderResult};
use crate::types::{Sheet, Value};

use super::source::DataSource;

/// Read one named sheet of an Excel/ODS workbook into a [`Sheet`].
///
/// Behavior:
/// - Fails with [`FinderError::DataSource`] if the workbook has no sheet called `name`
/// - Detects the first non-empty row as the header row
/// - Converts the remaining rows' cells into [`Value`]s, keeping numbers numeric
pub fn read_workbook_sheet(path: impl AsRef<Path>, name: &str) -> FinderResult<Sheet> {
    let mut workbook = open_workbook_auto(path)?;

    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(FinderError::data_source(
            name,
            format!("workbook has no such sheet. sheets={:?}", workbook.sheet_names()),
        ));
    }

    let range = workbook.worksheet_range(name)?;
    sheet_from_range(name, &range)
}

fn sheet_from_range(name: &str, range: &calamine::Range<Data>) -> FinderResult<Sheet> {
    let mut rows = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| FinderError::data_source(name, "sheet has no non-empty rows (no header row found)"))?
        .iter()
        .map(|c| cell_to_header_string(c).trim().to_string())
        .collect();

    let data = rows
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok(Sheet::new(name, headers, data))
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => "".to_string(),
    }
}

fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) => Value::from_text(s),
        Data::Int(i) => Value::Int64(*i),
        Data::Float(f) => Value::Float64(*f),
        Data::Bool(b) => Value::Bool(*b),
        // `#N/A`, `#DIV/0!`, ...: no usable value.
        Data::Error(_) => Value::Null,
        other => Value::from_text(&other.to_string()),
    }
}

/// A local workbook holding the `Data`, `Bullying Survey Data` and `School Links` sheets.
///
/// The file is re-opened on every fetch so edits show up on the next request.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataSource for WorkbookSource {
    fn source_tag(&self) -> &'static str {
        "workbook"
    }

    async fn fetch_sheet(&self, name: &str) -> FinderResult<Sheet> {
        let path = self.path.clone();
        let sheet = name.to_string();
        tokio::task::spawn_blocking(move || read_workbook_sheet(&path, &sheet))
            .await
            .map_err(|e| FinderError::data_source(name, format!("workbook loader task failed: {e}")))?
    }
}
