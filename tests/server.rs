use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as Json};

use school_finder::enrichment::{EnrichmentOptions, MemoryCache, TransitEnricher, TransitLookup, TravelMode};
use school_finder::error::LookupError;
use school_finder::ingestion::{MemorySource, BULLYING_SHEET, DATA_SHEET, LINKS_SHEET};
use school_finder::server::{router, FILTER_ROUTE};
use school_finder::types::{Sheet, Value};
use school_finder::SchoolFinder;

struct FixedLookup;

#[async_trait]
impl TransitLookup for FixedLookup {
    async fn duration(&self, _o: &str, _d: &str, _m: TravelMode) -> Result<Duration, LookupError> {
        Ok(Duration::from_secs(22 * 60))
    }
}

fn headers(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

fn full_source() -> MemorySource {
    let row = |dbn: &str, borough: &str, grad: f64| {
        vec![
            Value::Utf8(dbn.to_string()),
            Value::Utf8(format!("{dbn} Address")),
            Value::Utf8(borough.to_string()),
            Value::Float64(grad),
        ]
    };
    MemorySource::new()
        .with_sheet(Sheet::new(
            DATA_SHEET,
            headers(&["DBN", "School Address", "Borough", "% Graduation Rate (2019)"]),
            vec![row("01K001", "Brooklyn", 80.0), row("02Q002", "Queens", 60.0)],
        ))
        .with_sheet(Sheet::new(BULLYING_SHEET, headers(&["DBN"]), vec![]))
        .with_sheet(Sheet::new(LINKS_SHEET, headers(&["DBN"]), vec![]))
}

async fn spawn(source: MemorySource) -> SocketAddr {
    let enricher = TransitEnricher::new(Arc::new(FixedLookup), Arc::new(MemoryCache::new()), EnrichmentOptions::default());
    let app = router(Arc::new(SchoolFinder::new(Arc::new(source), enricher)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

fn url(addr: SocketAddr) -> String {
    format!("http://{addr}{FILTER_ROUTE}")
}

#[tokio::test]
async fn filter_schools_returns_rows() {
    let addr = spawn(full_source()).await;

    let resp = reqwest::Client::new()
        .post(url(addr))
        .json(&json!({
            "boroughs": ["Brooklyn", "Queens"],
            "schoolType": "No Preference",
            "gradRate": "70",
            "address": "350 5th Ave"
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 200);

    let body: Json = resp.json().await.expect("json body");
    let rows = body.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["DBN"], "01K001");
    assert_eq!(rows[0]["School Borough"], "Brooklyn");
    assert_eq!(rows[0]["Transit Time (minutes)"], "22");
    assert_eq!(rows[0]["Rating"], "40.0");
}

#[tokio::test]
async fn source_failure_is_a_generic_500() {
    let addr = spawn(MemorySource::new()).await;

    let resp = reqwest::Client::new()
        .post(url(addr))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 500);

    let body: Json = resp.json().await.expect("json body");
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn undecodable_body_is_rejected() {
    let addr = spawn(full_source()).await;

    let resp = reqwest::Client::new()
        .post(url(addr))
        .header("content-type", "application/json")
        .body(r#"{"gradRate": "not a number"}"#)
        .send()
        .await
        .expect("request");
    assert!(resp.status().is_client_error());
}
