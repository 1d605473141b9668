//! Google Sheets v4 `values.get` source.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{FinderError, FinderResult};
use crate::types::{Sheet, Value};

use super::source::DataSource;

/// Public Sheets API base (`{base}/{spreadsheet id}/values/{range}`).
pub const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Configuration for [`SheetsApiSource`].
#[derive(Clone)]
pub struct SheetsApiOptions {
    pub endpoint: String,
    pub spreadsheet_id: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl SheetsApiOptions {
    pub fn new(spreadsheet_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: SHEETS_ENDPOINT.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl std::fmt::Debug for SheetsApiOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsApiOptions")
            .field("endpoint", &self.endpoint)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("api_key_set", &!self.api_key.is_empty())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Reads whole sheets of a shared spreadsheet, unformatted.
#[derive(Debug, Clone)]
pub struct SheetsApiSource {
    http: reqwest::Client,
    opts: SheetsApiOptions,
}

impl SheetsApiSource {
    pub fn new(opts: SheetsApiOptions) -> FinderResult<Self> {
        let http = reqwest::Client::builder().timeout(opts.timeout).build()?;
        Ok(Self { http, opts })
    }

    fn values_url(&self, sheet: &str) -> FinderResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.opts.endpoint)
            .map_err(|e| FinderError::data_source(sheet, format!("invalid sheets endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| FinderError::data_source(sheet, "sheets endpoint cannot be a base url"))?
            .pop_if_empty()
            .push(&self.opts.spreadsheet_id)
            .push("values")
            .push(sheet);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[async_trait]
impl DataSource for SheetsApiSource {
    fn source_tag(&self) -> &'static str {
        "sheets-api"
    }

    async fn fetch_sheet(&self, name: &str) -> FinderResult<Sheet> {
        let url = self.values_url(name)?;
        let resp = self
            .http
            .get(url)
            .query(&[
                ("key", self.opts.api_key.as_str()),
                ("valueRenderOption", "UNFORMATTED_VALUE"),
                ("majorDimension", "ROWS"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FinderError::data_source(
                name,
                format!("sheets api returned {status}: {}", body.chars().take(200).collect::<String>()),
            ));
        }

        let range: ValueRange = resp.json().await?;
        sheet_from_values(name, range.values)
    }
}

/// Convert a `values` grid into a [`Sheet`]; the first row is the header row.
pub fn sheet_from_values(name: &str, values: Vec<Vec<serde_json::Value>>) -> FinderResult<Sheet> {
    if values.is_empty() {
        return Err(FinderError::data_source(name, "sheet has no header row"));
    }
    let grid = values
        .into_iter()
        .map(|row| row.iter().map(json_cell).collect())
        .collect();
    Ok(Sheet::from_grid(name, grid))
}

fn json_cell(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::from_text(s),
        other => Value::Utf8(other.to_string()),
    }
}
