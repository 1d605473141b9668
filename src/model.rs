//! The joined, per-school record produced by the dataset builder.

use std::fmt;

use serde::{Serialize, Serializer};

/// Source column labels in the primary `"Data"` sheet.
pub mod columns {
    pub const DBN: &str = "DBN";
    pub const SCHOOL_NAME: &str = "School Name";
    pub const SCHOOL_ADDRESS: &str = "School Address";
    pub const BOROUGH: &str = "Borough";
    pub const SCHOOL_TYPE: &str = "School Type";
    pub const ADMISSIONS_CRITERIA: &str = "Admissions Criteria";
    pub const ENROLLMENT: &str = "Enrollment";
    pub const GRADUATION_RATE: &str = "% Graduation Rate (2019)";
    pub const FRESHMAN_CREDIT: &str = "% Freshman 10 credit accumulation";
    pub const SOPHOMORE_CREDIT: &str = "% Sophomore 10 credit accumulation";
    pub const JUNIOR_CREDIT: &str = "% Junior 10 credit accumulation";
    pub const COLLEGE_CAREER_READINESS: &str = "College and Career Readiness";
    pub const FEMALE: &str = "% Female";
    pub const MALE: &str = "% Male";
    pub const ELL: &str = "% ELL";
    pub const DISABILITIES: &str = "% Students with Disabilities";
    pub const ASIAN: &str = "% Asian";
    pub const BLACK: &str = "% Black";
    pub const HISPANIC: &str = "% Hispanic";
    pub const WHITE: &str = "% White";
    pub const NATIVE_AMERICAN: &str = "% Native American";
    pub const MULTIRACIAL: &str = "% Multiracial";
}

/// Demographic percentages for one school.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Demographics {
    pub female: f64,
    pub male: f64,
    pub ell: f64,
    pub disabilities: f64,
    pub asian: f64,
    pub black: f64,
    pub hispanic: f64,
    pub white: f64,
    pub native_american: f64,
    pub multiracial: f64,
}

/// Travel time from the request's origin address to a school.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitTime {
    /// No estimate: no origin supplied, or the lookup failed.
    #[default]
    NotAvailable,
    /// Whole minutes by public transit.
    Minutes(u32),
}

impl TransitTime {
    /// Parse a cached minute string. Anything that is not a whole number is `NotAvailable`.
    pub fn from_cached(raw: &str) -> Self {
        raw.trim()
            .parse::<u32>()
            .map(Self::Minutes)
            .unwrap_or(Self::NotAvailable)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Minutes(_))
    }
}

impl fmt::Display for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAvailable => f.write_str("N/A"),
            Self::Minutes(m) => write!(f, "{m}"),
        }
    }
}

impl Serialize for TransitTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One school, joined across the three source sheets.
///
/// Numeric fields hold the parsed source value, or `0.0` when the cell was missing or not a
/// number. Nothing is rounded here; projection formats every number once.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolRecord {
    pub dbn: String,
    pub name: String,
    pub address: String,
    pub borough: String,
    pub school_type: String,
    pub admissions_criteria: String,
    /// Canonical school page; empty when the links sheet has no entry.
    pub link: String,
    pub enrollment: f64,
    pub grad_rate: f64,
    pub freshman_credit: f64,
    pub sophomore_credit: f64,
    pub junior_credit: f64,
    pub college_career_readiness: f64,
    pub bullying_pct: f64,
    pub demographics: Demographics,
    pub rating: f64,
    /// Set by enrichment; request-local.
    pub transit_time: TransitTime,
}

impl SchoolRecord {
    /// Transit lookup destination: street address followed by borough.
    ///
    /// The borough disambiguates street names shared across boroughs.
    pub fn destination(&self) -> String {
        format!("{} {}", self.address.trim(), self.borough.trim())
            .trim()
            .to_string()
    }
}
