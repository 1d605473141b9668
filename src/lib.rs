//! `school-finder` filters the NYC public high-school dataset and annotates the matches with
//! public-transit travel times from a user's address.
//!
//! A request runs one pipeline, end to end, over freshly loaded source data:
//!
//! 1. [`ingestion`]: load the `Data`, `Bullying Survey Data` and `School Links` sheets from a
//!    [`ingestion::DataSource`] (workbook, CSV directory, Sheets API, or memory)
//! 2. [`processing::build()`]: join them into [`model::SchoolRecord`]s and compute the rating
//! 3. [`processing::filter()`]: apply the user's [`processing::FilterCriteria`]
//! 4. [`enrichment::TransitEnricher`]: look up transit minutes in paced, cached batches
//! 5. [`processing::project()`]: format display-ready [`processing::OutputRow`]s
//!
//! [`finder::SchoolFinder`] wires these together; [`server`] exposes it over HTTP.
//!
//! ## Rating
//!
//! `rating = grad_rate * 0.5 + mean(freshman, sophomore) * 0.5`, shown with one decimal. Missing
//! or non-numeric inputs count as 0, so a school with none of the three rates 0.
//!
//! ## Quick example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use school_finder::enrichment::{EnrichmentOptions, MemoryCache, TransitEnricher, TransitLookup, TravelMode};
//! use school_finder::error::LookupError;
//! use school_finder::finder::SchoolFinder;
//! use school_finder::ingestion::MemorySource;
//! use school_finder::processing::FilterCriteria;
//! use school_finder::types::{Sheet, Value};
//!
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl TransitLookup for Offline {
//!     async fn duration(&self, _: &str, _: &str, _: TravelMode) -> Result<std::time::Duration, LookupError> {
//!         Err(LookupError::NoRoute)
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), school_finder::FinderError> {
//! let lookup_sheet = |name: &str| Sheet::new(name, vec!["DBN".into()], vec![]);
//! let source = MemorySource::new()
//!     .with_sheet(Sheet::new(
//!         "Data",
//!         vec!["DBN".into(), "School Name".into()],
//!         vec![vec![Value::Utf8("01M001".into()), Value::Utf8("Alpha High".into())]],
//!     ))
//!     .with_sheet(lookup_sheet("Bullying Survey Data"))
//!     .with_sheet(lookup_sheet("School Links"));
//!
//! let enricher = TransitEnricher::new(Arc::new(Offline), Arc::new(MemoryCache::new()), EnrichmentOptions::default());
//! let finder = SchoolFinder::new(Arc::new(source), enricher);
//!
//! let rows = finder.find_schools(&FilterCriteria::default()).await?;
//! assert_eq!(rows[0].get("School Name"), Some("Alpha High"));
//! assert_eq!(rows[0].get("Transit Time (minutes)"), Some("N/A"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: data sources and the three-sheet fetch
//! - [`types`]: raw sheet and cell types
//! - [`model`]: the unified school record
//! - [`processing`]: build, filter, projection, sorting and CSV export
//! - [`enrichment`]: transit lookup, cache and batch pacing
//! - [`finder`]: the request pipeline
//! - [`server`]: `POST /api/filterSchools`
//! - [`error`]: error types

pub mod enrichment;
pub mod error;
pub mod finder;
pub mod ingestion;
pub mod model;
pub mod processing;
pub mod server;
pub mod types;

pub use error::{FinderError, FinderResult, LookupError};
pub use finder::SchoolFinder;
