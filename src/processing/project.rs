//! Projection of built records into the fixed, display-ready response rows.

use std::cmp::Ordering;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::SchoolRecord;
use crate::types::format1;

/// Output labels, in response order.
///
/// Three labels differ from the source sheet: `Borough` is emitted as `School Borough`,
/// `Transit Time` as `Transit Time (minutes)` and `% Graduation Rate (2019)` as
/// `% Graduation Rate`.
pub const OUTPUT_FIELDS: [&str; 26] = [
    "Rating",
    "DBN",
    "School Name",
    "School Link",
    "School Address",
    "School Borough",
    "Transit Time (minutes)",
    "Enrollment",
    "% Graduation Rate",
    "% Freshman 10 credit accumulation",
    "School Type",
    "Admissions Criteria",
    "College and Career Readiness",
    "% Students Reporting Frequent Bullying",
    "% Female",
    "% Male",
    "% ELL",
    "% Students with Disabilities",
    "% Sophomore 10 credit accumulation",
    "% Junior 10 credit accumulation",
    "% Asian",
    "% Black",
    "% Hispanic",
    "% White",
    "% Native American",
    "% Multiracial",
];

/// One formatted response row: every value is display text, fields in [`OUTPUT_FIELDS`] order.
///
/// Serializes as a JSON object that preserves field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    values: Vec<String>,
}

impl OutputRow {
    /// Value for an output label, if the label exists.
    pub fn get(&self, label: &str) -> Option<&str> {
        OUTPUT_FIELDS
            .iter()
            .position(|f| *f == label)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    /// `(label, value)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        OUTPUT_FIELDS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    /// Values in output order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Serialize for OutputRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (label, value) in self.iter() {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Project records into output rows, one per record, in input order.
pub fn project(schools: &[SchoolRecord]) -> Vec<OutputRow> {
    schools.iter().map(project_one).collect()
}

fn project_one(s: &SchoolRecord) -> OutputRow {
    let d = &s.demographics;
    let values = vec![
        format1(s.rating),
        s.dbn.clone(),
        s.name.clone(),
        s.link.clone(),
        s.address.clone(),
        s.borough.clone(),
        s.transit_time.to_string(),
        format1(s.enrollment),
        format1(s.grad_rate),
        format1(s.freshman_credit),
        s.school_type.clone(),
        s.admissions_criteria.clone(),
        format1(s.college_career_readiness),
        format1(s.bullying_pct),
        format1(d.female),
        format1(d.male),
        format1(d.ell),
        format1(d.disabilities),
        format1(s.sophomore_credit),
        format1(s.junior_credit),
        format1(d.asian),
        format1(d.black),
        format1(d.hispanic),
        format1(d.white),
        format1(d.native_american),
        format1(d.multiracial),
    ];
    debug_assert_eq!(values.len(), OUTPUT_FIELDS.len());
    OutputRow { values }
}

/// Sort direction for [`sort_rows`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Sort rows by an output column.
///
/// Numeric values compare numerically and sort before non-numeric text (so `"N/A"` transit
/// times trail the minutes when ascending); text compares lexically. Unknown columns leave the
/// order unchanged. The sort is stable.
pub fn sort_rows(rows: &mut [OutputRow], column: &str, direction: SortDirection) {
    let Some(idx) = OUTPUT_FIELDS.iter().position(|f| *f == column) else {
        return;
    };
    rows.sort_by(|a, b| {
        let ord = compare_cells(&a.values[idx], &b.values[idx]);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

fn compare_cells(a: &str, b: &str) -> Ordering {
    match (full_number(a), full_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn full_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
