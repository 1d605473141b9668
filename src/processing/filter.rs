//! Filter engine: a conjunction of independently optional predicates over built records.

use serde::{Deserialize, Deserializer};

use crate::model::SchoolRecord;

/// `schoolType` value meaning "no constraint".
pub const NO_PREFERENCE: &str = "No Preference";
/// `admissionsType` value that restricts results to open / Ed. Opt admissions.
pub const OPEN_ADMISSIONS: &str = "Yes";
/// Admissions-criteria substrings accepted by the open-admissions filter (case-sensitive).
pub const OPEN_ADMISSIONS_TOKENS: [&str; 2] = ["Open", "Ed. Opt"];

/// One filter request.
///
/// Every field is optional; an omitted field imposes no constraint. Numeric thresholds decode
/// from JSON numbers or from strings (blank strings mean "unset").
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    #[serde(deserialize_with = "deserialize_boroughs")]
    pub boroughs: Vec<String>,
    #[serde(deserialize_with = "deserialize_opt_text")]
    pub school_type: Option<String>,
    #[serde(deserialize_with = "deserialize_threshold")]
    pub grad_rate: Option<f64>,
    #[serde(deserialize_with = "deserialize_threshold")]
    pub credit_rate: Option<f64>,
    #[serde(deserialize_with = "deserialize_opt_text")]
    pub admissions_type: Option<String>,
    /// Origin address for transit enrichment; consumed by the enrichment stage, not the filter.
    #[serde(deserialize_with = "deserialize_opt_text")]
    pub address: Option<String>,
}

impl FilterCriteria {
    /// `true` if `school` satisfies every configured predicate.
    pub fn matches(&self, school: &SchoolRecord) -> bool {
        self.matches_borough(school)
            && self.matches_school_type(school)
            && self.matches_grad_rate(school)
            && self.matches_credit_rate(school)
            && self.matches_admissions(school)
    }

    fn matches_borough(&self, school: &SchoolRecord) -> bool {
        self.boroughs.is_empty() || self.boroughs.iter().any(|b| *b == school.borough)
    }

    fn matches_school_type(&self, school: &SchoolRecord) -> bool {
        match self.school_type.as_deref() {
            None | Some(NO_PREFERENCE) => true,
            Some(wanted) => school.school_type == wanted,
        }
    }

    fn matches_grad_rate(&self, school: &SchoolRecord) -> bool {
        self.grad_rate.is_none_or(|min| school.grad_rate >= min)
    }

    fn matches_credit_rate(&self, school: &SchoolRecord) -> bool {
        self.credit_rate.is_none_or(|min| school.freshman_credit >= min)
    }

    fn matches_admissions(&self, school: &SchoolRecord) -> bool {
        match self.admissions_type.as_deref() {
            Some(OPEN_ADMISSIONS) => OPEN_ADMISSIONS_TOKENS
                .iter()
                .any(|token| school.admissions_criteria.contains(token)),
            _ => true,
        }
    }

    /// The trimmed origin address, if one was supplied.
    pub fn origin(&self) -> Option<&str> {
        self.address.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }
}

/// Returns the schools matching `criteria`, in input order. The input is not modified.
pub fn filter(schools: &[SchoolRecord], criteria: &FilterCriteria) -> Vec<SchoolRecord> {
    schools
        .iter()
        .filter(|school| criteria.matches(school))
        .cloned()
        .collect()
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

fn deserialize_boroughs<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn deserialize_threshold<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(v)) => Ok(Some(v)),
        Some(NumberOrText::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid numeric threshold '{s}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Demographics, TransitTime};

    fn school(dbn: &str, borough: &str, school_type: &str, grad: f64, fresh: f64, admissions: &str) -> SchoolRecord {
        SchoolRecord {
            dbn: dbn.to_string(),
            name: format!("School {dbn}"),
            address: "1 Main St".to_string(),
            borough: borough.to_string(),
            school_type: school_type.to_string(),
            admissions_criteria: admissions.to_string(),
            link: String::new(),
            enrollment: 500.0,
            grad_rate: grad,
            freshman_credit: fresh,
            sophomore_credit: 0.0,
            junior_credit: 0.0,
            college_career_readiness: 0.0,
            bullying_pct: 0.0,
            demographics: Demographics::default(),
            rating: 0.0,
            transit_time: TransitTime::NotAvailable,
        }
    }

    fn sample() -> Vec<SchoolRecord> {
        vec![
            school("A", "Brooklyn", "CTE", 90.0, 80.0, "Open"),
            school("B", "Queens", "Traditional", 70.0, 95.0, "Screened"),
            school("C", "Bronx", "CTE", 0.0, 0.0, "Ed. Opt"),
            school("D", "Brooklyn", "Traditional", 85.0, 60.0, "open"),
            school("E", "Manhattan", "Specialized", 99.0, 99.0, "Test / Ed. Optional"),
        ]
    }

    fn dbns(schools: &[SchoolRecord]) -> Vec<&str> {
        schools.iter().map(|s| s.dbn.as_str()).collect()
    }

    #[test]
    fn empty_criteria_keeps_everything() {
        let schools = sample();
        assert_eq!(filter(&schools, &FilterCriteria::default()), schools);
    }

    #[test]
    fn borough_set_restricts_membership() {
        let criteria = FilterCriteria {
            boroughs: vec!["Brooklyn".to_string(), "Bronx".to_string()],
            ..Default::default()
        };
        assert_eq!(dbns(&filter(&sample(), &criteria)), vec!["A", "C", "D"]);
    }

    #[test]
    fn school_type_matches_exactly_unless_no_preference() {
        let cte = FilterCriteria {
            school_type: Some("CTE".to_string()),
            ..Default::default()
        };
        assert_eq!(dbns(&filter(&sample(), &cte)), vec!["A", "C"]);

        let any = FilterCriteria {
            school_type: Some(NO_PREFERENCE.to_string()),
            ..Default::default()
        };
        assert_eq!(filter(&sample(), &any).len(), 5);
    }

    #[test]
    fn thresholds_are_inclusive_and_missing_data_reads_as_zero() {
        let grad = FilterCriteria {
            grad_rate: Some(85.0),
            ..Default::default()
        };
        assert_eq!(dbns(&filter(&sample(), &grad)), vec!["A", "D", "E"]);

        let credit = FilterCriteria {
            credit_rate: Some(0.1),
            ..Default::default()
        };
        // C has no credit data and is excluded by any positive threshold.
        assert_eq!(dbns(&filter(&sample(), &credit)), vec!["A", "B", "D", "E"]);
    }

    #[test]
    fn open_admissions_matches_case_sensitive_tokens() {
        let open = FilterCriteria {
            admissions_type: Some(OPEN_ADMISSIONS.to_string()),
            ..Default::default()
        };
        assert_eq!(dbns(&filter(&sample(), &open)), vec!["A", "C", "E"]);

        let other = FilterCriteria {
            admissions_type: Some("No".to_string()),
            ..Default::default()
        };
        assert_eq!(filter(&sample(), &other).len(), 5);
    }

    #[test]
    fn predicate_order_does_not_change_the_result() {
        let schools = sample();
        let borough = FilterCriteria {
            boroughs: vec!["Brooklyn".to_string(), "Manhattan".to_string()],
            ..Default::default()
        };
        let grad = FilterCriteria {
            grad_rate: Some(86.0),
            ..Default::default()
        };
        let open = FilterCriteria {
            admissions_type: Some(OPEN_ADMISSIONS.to_string()),
            ..Default::default()
        };
        let combined = FilterCriteria {
            boroughs: borough.boroughs.clone(),
            grad_rate: grad.grad_rate,
            admissions_type: open.admissions_type.clone(),
            ..Default::default()
        };

        let a = filter(&filter(&filter(&schools, &borough), &grad), &open);
        let b = filter(&filter(&filter(&schools, &open), &borough), &grad);
        let c = filter(&filter(&filter(&schools, &grad), &open), &borough);
        let all = filter(&schools, &combined);

        assert_eq!(dbns(&a), vec!["A", "E"]);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(c, all);
    }

    #[test]
    fn filter_does_not_mutate_input() {
        let schools = sample();
        let before = schools.clone();
        let _ = filter(
            &schools,
            &FilterCriteria {
                grad_rate: Some(100.0),
                ..Default::default()
            },
        );
        assert_eq!(schools, before);
    }

    #[test]
    fn decodes_form_style_request() {
        let criteria: FilterCriteria = serde_json::from_str(
            r#"{"boroughs":["Queens"],"schoolType":"No Preference","gradRate":"70",
                "creditRate":"","admissionsType":"Yes","address":"  "}"#,
        )
        .unwrap();

        assert_eq!(criteria.boroughs, vec!["Queens"]);
        assert_eq!(criteria.school_type.as_deref(), Some(NO_PREFERENCE));
        assert_eq!(criteria.grad_rate, Some(70.0));
        assert_eq!(criteria.credit_rate, None);
        assert_eq!(criteria.admissions_type.as_deref(), Some("Yes"));
        assert_eq!(criteria.address, None);
        assert_eq!(criteria.origin(), None);
    }

    #[test]
    fn decodes_numeric_thresholds_and_missing_fields() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"gradRate":65.5,"boroughs":null,"address":" 10 Main St "}"#).unwrap();
        assert_eq!(criteria.grad_rate, Some(65.5));
        assert!(criteria.boroughs.is_empty());
        assert_eq!(criteria.origin(), Some("10 Main St"));

        let empty: FilterCriteria = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, FilterCriteria::default());
    }

    #[test]
    fn rejects_non_numeric_threshold_text() {
        let err = serde_json::from_str::<FilterCriteria>(r#"{"gradRate":"high"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid numeric threshold"));
    }
}
