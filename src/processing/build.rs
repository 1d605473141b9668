//! Dataset builder: joins the primary, bullying and link sheets into [`SchoolRecord`]s.

use std::collections::{HashMap, HashSet};

use crate::error::{FinderError, FinderResult};
use crate::model::{columns, Demographics, SchoolRecord, TransitTime};
use crate::types::{Sheet, Value};

/// Column holding the DBN in both lookup sheets.
pub const LOOKUP_KEY_COLUMN: usize = 0;
/// Column holding the frequent-bullying fraction in the bullying survey sheet.
pub const BULLYING_VALUE_COLUMN: usize = 5;
/// Column holding the canonical URL in the school links sheet.
pub const LINK_VALUE_COLUMN: usize = 4;

/// Composite rating: half graduation rate, half the mean of freshman and sophomore credit
/// accumulation.
///
/// The value is kept unrounded; [`crate::types::format1`] rounds it once, for display.
pub fn rating(grad_rate: f64, freshman_credit: f64, sophomore_credit: f64) -> f64 {
    grad_rate * 0.5 + ((freshman_credit + sophomore_credit) / 2.0) * 0.5
}

/// Join the three sheets into one record per school.
///
/// - `raw` must carry a header row containing `DBN`.
/// - Bullying fractions are converted to percentages; schools without an entry get `0.0`.
/// - Schools without a link entry get an empty link.
/// - Rows with a blank DBN are skipped; a repeated DBN keeps the first row.
pub fn build(raw: &Sheet, bullying: &Sheet, links: &Sheet) -> FinderResult<Vec<SchoolRecord>> {
    if raw.is_empty() {
        return Err(FinderError::data_source(&raw.name, "sheet has no header row"));
    }
    let header = HeaderIndex::new(raw)?;

    let bullying_lookup = bullying.lookup(LOOKUP_KEY_COLUMN, BULLYING_VALUE_COLUMN);
    let link_lookup = links.lookup(LOOKUP_KEY_COLUMN, LINK_VALUE_COLUMN);

    let mut seen = HashSet::with_capacity(raw.row_count());
    let mut schools = Vec::with_capacity(raw.row_count());

    for (idx0, row) in raw.rows.iter().enumerate() {
        let dbn = header.text(row, columns::DBN);
        if dbn.is_empty() {
            continue;
        }
        if !seen.insert(dbn.clone()) {
            // Sheet row numbers are 1-based and the header is row 1.
            tracing::warn!(dbn = %dbn, row = idx0 + 2, "duplicate DBN in primary sheet; keeping first row");
            continue;
        }
        schools.push(build_record(&header, row, dbn, &bullying_lookup, &link_lookup));
    }

    Ok(schools)
}

fn build_record(
    header: &HeaderIndex,
    row: &[Value],
    dbn: String,
    bullying_lookup: &HashMap<String, Value>,
    link_lookup: &HashMap<String, Value>,
) -> SchoolRecord {
    let grad_rate = header.number(row, columns::GRADUATION_RATE);
    let freshman_credit = header.number(row, columns::FRESHMAN_CREDIT);
    let sophomore_credit = header.number(row, columns::SOPHOMORE_CREDIT);

    let bullying_pct = bullying_lookup
        .get(&dbn)
        .and_then(Value::as_number)
        .map(|fraction| fraction * 100.0)
        .unwrap_or(0.0);
    let link = link_lookup
        .get(&dbn)
        .map(|v| v.as_text().trim().to_string())
        .unwrap_or_default();

    SchoolRecord {
        name: header.text(row, columns::SCHOOL_NAME),
        address: header.text(row, columns::SCHOOL_ADDRESS),
        borough: header.text(row, columns::BOROUGH),
        school_type: header.text(row, columns::SCHOOL_TYPE),
        admissions_criteria: header.text(row, columns::ADMISSIONS_CRITERIA),
        link,
        enrollment: header.number(row, columns::ENROLLMENT),
        grad_rate,
        freshman_credit,
        sophomore_credit,
        junior_credit: header.number(row, columns::JUNIOR_CREDIT),
        college_career_readiness: header.number(row, columns::COLLEGE_CAREER_READINESS),
        bullying_pct,
        demographics: Demographics {
            female: header.number(row, columns::FEMALE),
            male: header.number(row, columns::MALE),
            ell: header.number(row, columns::ELL),
            disabilities: header.number(row, columns::DISABILITIES),
            asian: header.number(row, columns::ASIAN),
            black: header.number(row, columns::BLACK),
            hispanic: header.number(row, columns::HISPANIC),
            white: header.number(row, columns::WHITE),
            native_american: header.number(row, columns::NATIVE_AMERICAN),
            multiracial: header.number(row, columns::MULTIRACIAL),
        },
        rating: rating(grad_rate, freshman_credit, sophomore_credit),
        transit_time: TransitTime::NotAvailable,
        dbn,
    }
}

/// Header label -> column position for the primary sheet.
///
/// Only `DBN` is required; any other missing column reads as empty/zero.
struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(sheet: &Sheet) -> FinderResult<Self> {
        let mut positions = HashMap::with_capacity(sheet.headers.len());
        for (idx, label) in sheet.headers.iter().enumerate() {
            // First occurrence wins for repeated labels.
            positions.entry(label.clone()).or_insert(idx);
        }
        if !positions.contains_key(columns::DBN) {
            return Err(FinderError::data_source(
                &sheet.name,
                format!(
                    "missing required column '{}'. headers={:?}",
                    columns::DBN,
                    sheet.headers
                ),
            ));
        }
        Ok(Self { positions })
    }

    fn cell<'a>(&self, row: &'a [Value], label: &str) -> Option<&'a Value> {
        self.positions.get(label).and_then(|&idx| row.get(idx))
    }

    fn text(&self, row: &[Value], label: &str) -> String {
        self.cell(row, label)
            .map(|v| v.as_text().trim().to_string())
            .unwrap_or_default()
    }

    fn number(&self, row: &[Value], label: &str) -> f64 {
        self.cell(row, label).map(Value::number_or_zero).unwrap_or(0.0)
    }
}
