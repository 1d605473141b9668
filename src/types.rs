//! Raw tabular types produced by data sources.
//!
//! Every source (workbook, CSV directory, Sheets API, in-memory) yields a [`Sheet`]: a header row
//! plus data rows of loosely typed [`Value`] cells. Interpretation of the cells happens later, in
//! [`crate::processing::build`].

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty cell.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Build a value from raw text. Blank text becomes [`Value::Null`].
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Value::Null
        } else {
            Value::Utf8(trimmed.to_owned())
        }
    }

    /// `true` for [`Value::Null`] and blank strings.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Utf8(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering of the cell; `Null` renders as the empty string.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    (*v as i64).to_string()
                } else {
                    v.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            Value::Utf8(s) => s.clone(),
        }
    }

    /// Numeric reading of the cell, if it has one.
    ///
    /// Strings use leading-number semantics: `"85%"` reads as `85.0`, `"N/A"` as `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) if v.is_finite() => Some(*v),
            Value::Utf8(s) => parse_leading_number(s),
            _ => None,
        }
    }

    /// Numeric reading with missing/unparseable cells treated as `0.0`.
    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }
}

/// One named row set: header labels plus data rows.
///
/// Rows may be shorter than the header (trailing empty cells are commonly trimmed by sheet
/// exports); missing cells read as [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet name as addressed in the source.
    pub name: String,
    /// Header labels (row 0 of the source).
    pub headers: Vec<String>,
    /// Data rows (rows 1.. of the source).
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    /// Create a sheet from headers and rows.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Split a grid whose first row is the header row.
    ///
    /// Returns a sheet with no headers and no rows when `grid` is empty.
    pub fn from_grid(name: impl Into<String>, grid: Vec<Vec<Value>>) -> Self {
        let mut iter = grid.into_iter();
        let headers = iter
            .next()
            .map(|row| row.iter().map(|c| c.as_text().trim().to_string()).collect())
            .unwrap_or_default();
        Self {
            name: name.into(),
            headers,
            rows: iter.collect(),
        }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the sheet has no header row.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Returns the index of a header label, if present.
    pub fn index_of(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Build a `first column -> value column` lookup from the data rows.
    ///
    /// Rows whose key or value cell is missing/blank are skipped.
    pub fn lookup(&self, key_col: usize, value_col: usize) -> std::collections::HashMap<String, Value> {
        self.rows
            .iter()
            .filter_map(|row| {
                let key = row.get(key_col).filter(|v| !v.is_blank())?;
                let value = row.get(value_col).filter(|v| !v.is_blank())?;
                Some((key.as_text(), value.clone()))
            })
            .collect()
    }
}

/// Parse the longest numeric prefix of `raw` (after trimming).
///
/// Accepts an optional sign, digits with an optional fractional part, and an optional exponent.
/// Returns `None` when no digits lead the string.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format with exactly one decimal digit, the way a spreadsheet script's `toFixed(1)` does.
///
/// The exact binary value is rounded, so `80.05` (stored just below the tie) renders `"80.0"`.
/// Exact ties such as `0.25` round away from zero. Non-finite input renders `"0.0"`, as does
/// anything that would otherwise print as `"-0.0"`.
pub fn format1(v: f64) -> String {
    if !v.is_finite() {
        return "0.0".to_string();
    }

    let quarters = v.abs() * 4.0;
    let out = if quarters.fract() == 0.0 && quarters % 2.0 == 1.0 {
        // Exact x.25 / x.75: take the larger tenth.
        let tenths = (v.abs() * 10.0).ceil() as u64;
        let sign = if v < 0.0 { "-" } else { "" };
        format!("{sign}{}.{}", tenths / 10, tenths % 10)
    } else {
        format!("{v:.1}")
    };

    if out == "-0.0" { "0.0".to_string() } else { out }
}
