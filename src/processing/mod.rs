//! Pure, in-memory pipeline stages.
//!
//! - [`build()`]: join the three source sheets into [`crate::model::SchoolRecord`]s and compute
//!   the rating
//! - [`filter()`]: apply [`FilterCriteria`] as a conjunction of optional predicates
//! - [`project()`]: format records into ordered, display-ready [`OutputRow`]s
//! - [`write_csv`]: export projected rows
//!
//! Transit enrichment sits between filter and projection but performs I/O, so it lives in
//! [`crate::enrichment`].
//!
//! ## Example: build → filter → project
//!
//! ```rust
//! use school_finder::processing::{build, filter, project, FilterCriteria};
//! use school_finder::types::{Sheet, Value};
//!
//! let raw = Sheet::new(
//!     "Data",
//!     vec!["DBN".into(), "Borough".into(), "% Graduation Rate (2019)".into()],
//!     vec![
//!         vec![Value::Utf8("01M001".into()), Value::Utf8("Manhattan".into()), Value::Float64(91.0)],
//!         vec![Value::Utf8("02X002".into()), Value::Utf8("Bronx".into()), Value::Float64(55.0)],
//!     ],
//! );
//! let empty = Sheet::new("lookup", vec!["DBN".into()], vec![]);
//!
//! let schools = build(&raw, &empty, &empty).unwrap();
//! let criteria = FilterCriteria { grad_rate: Some(60.0), ..Default::default() };
//! let rows = project(&filter(&schools, &criteria));
//!
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].get("DBN"), Some("01M001"));
//! assert_eq!(rows[0].get("Rating"), Some("45.5"));
//! ```

pub mod build;
pub mod export;
pub mod filter;
pub mod project;

pub use build::{build, rating};
pub use export::{write_csv, write_csv_to_path, DEFAULT_EXPORT_FILE};
pub use filter::{filter, FilterCriteria, NO_PREFERENCE, OPEN_ADMISSIONS};
pub use project::{project, sort_rows, OutputRow, SortDirection, OUTPUT_FIELDS};
