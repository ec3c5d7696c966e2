//! Data sources for the monthly finance sheet
//!
//! The sheet is a table with a `Month` column followed by the twelve numeric
//! category columns. It can come from a local CSV file, from a spreadsheet's
//! CSV export, or from memory. `CachedSource` sits in front of any of them and
//! keeps the last fetch for a bounded time window.

use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{Category, Dataset, MonthlyRecord, MONTH_COLUMN};

/// Somewhere a dataset can be fetched from
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short description for logs and status output
    fn name(&self) -> String;

    /// Fetch and parse the full dataset
    async fn fetch(&self) -> Result<Dataset>;
}

/// Parse the finance sheet from CSV
///
/// All thirteen columns must be present in the header (matched without regard
/// to case or surrounding whitespace). Unknown columns are ignored. Rows with
/// an empty month are dropped.
pub fn parse_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let month_idx = find_column(&headers, MONTH_COLUMN)?;
    let mut columns = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        columns.push((category, find_column(&headers, category.as_str())?));
    }

    for (idx, header) in headers.iter().enumerate() {
        let known = idx == month_idx || columns.iter().any(|(_, i)| *i == idx);
        if !known && !header.trim().is_empty() {
            warn!(column = header, "Ignoring unknown column");
        }
    }

    let mut records = Vec::new();
    let mut skipped = 0;

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;

        let month = record.get(month_idx).unwrap_or("").trim();
        if month.is_empty() {
            skipped += 1;
            continue;
        }

        let mut monthly = MonthlyRecord::new(month);
        for (category, idx) in &columns {
            let cell = record.get(*idx).unwrap_or("");
            let value = parse_amount(cell).map_err(|reason| {
                Error::InvalidData(format!(
                    "Line {}, column '{}': {}",
                    line, category, reason
                ))
            })?;
            monthly.set(*category, value);
        }
        records.push(monthly);
    }

    debug!(
        "Parsed {} monthly records ({} without month skipped)",
        records.len(),
        skipped
    );
    Dataset::new(records)
}

/// Find a column by name in the header row
fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::InvalidData(format!("Missing column: {}", name)))
}

/// Parse an amount cell, handling currency symbols and commas
///
/// Empty cells yield `None`.
fn parse_amount(s: &str) -> std::result::Result<Option<f64>, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let cleaned: String = trimmed
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| format!("Unable to parse amount: {}", s))
}

// ============================================================================
// Sources
// ============================================================================

/// Reads the sheet from a CSV file on disk
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for CsvFileSource {
    fn name(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    async fn fetch(&self) -> Result<Dataset> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::unavailable(self.name(), e))?;
        parse_dataset(bytes.as_slice())
    }
}

/// Fetches the sheet from a spreadsheet's CSV export over HTTP
#[derive(Debug, Clone)]
pub struct SheetSource {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl SheetSource {
    /// Create a source for a sheet URL
    ///
    /// Google Sheets share/edit links are rewritten to their CSV export URL.
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: export_url(url),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// The URL actually requested
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DataSource for SheetSource {
    fn name(&self) -> String {
        format!("sheet:{}", self.url)
    }

    async fn fetch(&self) -> Result<Dataset> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::unavailable(self.name(), e))?;

        if !response.status().is_success() {
            return Err(Error::unavailable(
                self.name(),
                format!("HTTP error: {}", response.status()),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::unavailable(self.name(), e))?;

        // Private sheets answer 200 with a sign-in page
        if looks_like_html(content_type.as_deref(), &body) {
            warn!(source = %self.name(), content_type = ?content_type, "Sheet returned HTML instead of CSV");
            return Err(Error::unavailable(
                self.name(),
                "sheet is not published as CSV",
            ));
        }

        parse_dataset(body.as_ref())
    }
}

/// Whether a response is an HTML page rather than CSV
fn looks_like_html(content_type: Option<&str>, body: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("html")) {
        return true;
    }
    let head = String::from_utf8_lossy(&body[..body.len().min(512)]);
    let head = head.trim_start_matches('\u{feff}').trim_start().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Turn a Google Sheets link into its CSV export URL
///
/// Links that already point at an export, and non-Google URLs, are returned
/// unchanged.
pub fn export_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("/export") || url.contains("output=csv") {
        return url.to_string();
    }

    let id_re = Regex::new(r"^https://docs\.google\.com/spreadsheets/d/([A-Za-z0-9_-]+)")
        .expect("valid regex");
    let Some(id) = id_re.captures(url).and_then(|c| c.get(1)) else {
        return url.to_string();
    };

    let gid_re = Regex::new(r"[#&?]gid=(\d+)").expect("valid regex");
    let gid = gid_re
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|g| format!("&gid={}", g.as_str()))
        .unwrap_or_default();

    format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv{}",
        id.as_str(),
        gid
    )
}

/// Serves a fixed in-memory dataset
#[derive(Debug, Clone)]
pub struct MemorySource {
    dataset: Dataset,
}

impl MemorySource {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl DataSource for MemorySource {
    fn name(&self) -> String {
        "memory".to_string()
    }

    async fn fetch(&self) -> Result<Dataset> {
        Ok(self.dataset.clone())
    }
}

// ============================================================================
// Cache
// ============================================================================

/// A fetched dataset with its fetch time and content fingerprint
#[derive(Debug, Clone, Serialize)]
pub struct CachedDataset {
    pub dataset: Dataset,
    pub fetched_at: DateTime<Utc>,
    pub fingerprint: String,
}

/// Time-boxed cache in front of a data source
///
/// Failed fetches are never cached; the next call tries again.
pub struct CachedSource {
    inner: Arc<dyn DataSource>,
    ttl: Duration,
    cache: Mutex<Option<(Instant, Arc<CachedDataset>)>>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn DataSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub fn name(&self) -> String {
        self.inner.name()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the dataset, fetching it if the cached copy is missing or stale
    pub async fn dataset(&self) -> Result<Arc<CachedDataset>> {
        if let Some(cached) = self.fresh() {
            return Ok(cached);
        }
        self.refresh().await
    }

    /// Fetch unconditionally and replace the cached copy
    pub async fn refresh(&self) -> Result<Arc<CachedDataset>> {
        let dataset = self.inner.fetch().await?;
        let fingerprint = dataset.fingerprint();
        let entry = Arc::new(CachedDataset {
            dataset,
            fetched_at: Utc::now(),
            fingerprint,
        });

        let mut cache = self.lock();
        match cache.as_ref() {
            Some((_, previous)) if previous.fingerprint != entry.fingerprint => {
                info!(
                    source = %self.inner.name(),
                    rows = entry.dataset.len(),
                    "Dataset changed since last fetch"
                );
            }
            None => {
                info!(
                    source = %self.inner.name(),
                    rows = entry.dataset.len(),
                    "Dataset loaded"
                );
            }
            _ => debug!(source = %self.inner.name(), "Dataset unchanged"),
        }
        *cache = Some((Instant::now(), Arc::clone(&entry)));
        Ok(entry)
    }

    /// The last fetched dataset, however old
    pub fn cached(&self) -> Option<Arc<CachedDataset>> {
        self.lock().as_ref().map(|(_, entry)| Arc::clone(entry))
    }

    /// Drop the cached copy so the next call refetches
    pub fn invalidate(&self) {
        *self.lock() = None;
    }

    fn fresh(&self) -> Option<Arc<CachedDataset>> {
        let cache = self.lock();
        cache
            .as_ref()
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, entry)| Arc::clone(entry))
    }

    fn lock(&self) -> MutexGuard<'_, Option<(Instant, Arc<CachedDataset>)>> {
        // The guarded value is replaced wholesale, so a poisoned lock still holds valid data
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const SHEET: &str = "Month,income,outcome,fixed,shopping,expenses,food,gas,parking,signatures,eva,savings,offer
January,5000,3200,1200,300,50,400,150,20,45,20,30,10
February,\"5,100.50\",3300,1200,250,60,450,140,25,45,15,35,10
,,,,,,,,,,,,
March,5000,,1200,$200,70,(20),130,30,45,25,40,15";

    /// Counts fetches so cache behavior can be observed
    struct CountingSource {
        dataset: Dataset,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for CountingSource {
        fn name(&self) -> String {
            "counting".to_string()
        }

        async fn fetch(&self) -> Result<Dataset> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.dataset.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl DataSource for FailingSource {
        fn name(&self) -> String {
            "failing".to_string()
        }

        async fn fetch(&self) -> Result<Dataset> {
            Err(Error::unavailable(self.name(), "connection refused"))
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), Some(1234.56));
        assert_eq!(parse_amount("-123.45").unwrap(), Some(-123.45));
        assert_eq!(parse_amount("(100.00)").unwrap(), Some(-100.00));
        assert_eq!(parse_amount("   ").unwrap(), None);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("NaN").is_err());
    }

    #[test]
    fn test_parse_dataset() {
        let dataset = parse_dataset(SHEET.as_bytes()).unwrap();
        assert_eq!(dataset.months(), vec!["January", "February", "March"]);

        let february = dataset.get(1).unwrap();
        assert_eq!(february.income, Some(5100.50));
        assert_eq!(february.food, Some(450.0));

        let march = dataset.get(2).unwrap();
        assert_eq!(march.outcome, None);
        assert_eq!(march.shopping, Some(200.0));
        assert_eq!(march.food, Some(-20.0));
    }

    #[test]
    fn test_parse_dataset_header_matching() {
        let csv = "\u{feff} month ,Income,OUTCOME,fixed,shopping,expenses,food,gas,parking,signatures,eva,savings,offer,notes
April,1,2,3,4,5,6,7,8,9,10,11,12,hello";
        let dataset = parse_dataset(csv.as_bytes()).unwrap();
        let april = dataset.get(0).unwrap();
        assert_eq!(april.month, "April");
        assert_eq!(april.income, Some(1.0));
        assert_eq!(april.offer, Some(12.0));
    }

    #[test]
    fn test_parse_dataset_missing_column() {
        let csv = "Month,income,outcome\nJanuary,1,2";
        let err = parse_dataset(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Missing column: fixed"));
    }

    #[test]
    fn test_parse_dataset_bad_cell_names_line_and_column() {
        let csv = "Month,income,outcome,fixed,shopping,expenses,food,gas,parking,signatures,eva,savings,offer
January,1,2,3,4,5,six,7,8,9,10,11,12";
        let err = parse_dataset(csv.as_bytes()).unwrap_err().to_string();
        assert!(err.contains("Line 2"));
        assert!(err.contains("'food'"));
    }

    #[test]
    fn test_parse_dataset_duplicate_month() {
        let csv = "Month,income,outcome,fixed,shopping,expenses,food,gas,parking,signatures,eva,savings,offer
May,1,2,3,4,5,6,7,8,9,10,11,12
May,1,2,3,4,5,6,7,8,9,10,11,12";
        assert!(matches!(
            parse_dataset(csv.as_bytes()),
            Err(Error::DuplicateMonth(_))
        ));
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html(Some("text/html; charset=utf-8"), b"anything"));
        assert!(looks_like_html(
            Some("text/plain"),
            b"\n  <!DOCTYPE html><html><title>Sign in - Google Accounts</title>"
        ));
        assert!(looks_like_html(None, b"<HTML><body>Sign in</body></HTML>"));
        assert!(!looks_like_html(Some("text/csv"), SHEET.as_bytes()));
        assert!(!looks_like_html(None, SHEET.as_bytes()));
    }

    /// Answer a single HTTP request with the given content type and body
    async fn serve_once(content_type: &'static str, body: String) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}/sheet.csv", addr)
    }

    #[tokio::test]
    async fn test_sheet_source_reads_csv() {
        let url = serve_once("text/csv", SHEET.to_string()).await;
        let source = SheetSource::new(&url, Duration::from_secs(5));
        let dataset = source.fetch().await.unwrap();
        assert_eq!(dataset.months(), vec!["January", "February", "March"]);
    }

    #[tokio::test]
    async fn test_sheet_source_private_sheet_is_unavailable() {
        let page = "<!DOCTYPE html><html><head><title>Sign in - Google Accounts</title></head><body></body></html>";
        let url = serve_once("text/html; charset=utf-8", page.to_string()).await;
        let source = SheetSource::new(&url, Duration::from_secs(5));

        let err = source.fetch().await.unwrap_err();
        assert!(
            matches!(err, Error::DataUnavailable { ref reason, .. } if reason.contains("not published as CSV")),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_export_url() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc_123-XY/edit#gid=42"),
            "https://docs.google.com/spreadsheets/d/abc_123-XY/export?format=csv&gid=42"
        );
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc/edit?usp=sharing"),
            "https://docs.google.com/spreadsheets/d/abc/export?format=csv"
        );
        let already = "https://docs.google.com/spreadsheets/d/abc/export?format=csv&gid=1";
        assert_eq!(export_url(already), already);
        assert_eq!(
            export_url("http://localhost:8080/finance.csv"),
            "http://localhost:8080/finance.csv"
        );
    }

    #[tokio::test]
    async fn test_csv_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finance.csv");
        std::fs::write(&path, SHEET).unwrap();

        let source = CsvFileSource::new(&path);
        let dataset = source.fetch().await.unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(source.name().starts_with("csv:"));
    }

    #[tokio::test]
    async fn test_csv_file_source_missing_file() {
        let source = CsvFileSource::new("/nonexistent/finance.csv");
        assert!(matches!(
            source.fetch().await,
            Err(Error::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_cache_serves_within_ttl() {
        let inner = Arc::new(CountingSource {
            dataset: parse_dataset(SHEET.as_bytes()).unwrap(),
            fetches: AtomicUsize::new(0),
        });
        let cache = CachedSource::new(inner.clone(), Duration::from_secs(600));

        let first = cache.dataset().await.unwrap();
        let second = cache.dataset().await.unwrap();
        assert_eq!(inner.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(first.fingerprint, second.fingerprint);

        cache.invalidate();
        cache.dataset().await.unwrap();
        assert_eq!(inner.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_with_zero_ttl_always_fetches() {
        let inner = Arc::new(CountingSource {
            dataset: Dataset::default(),
            fetches: AtomicUsize::new(0),
        });
        let cache = CachedSource::new(inner.clone(), Duration::ZERO);

        cache.dataset().await.unwrap();
        cache.dataset().await.unwrap();
        assert_eq!(inner.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_failures() {
        let cache = CachedSource::new(Arc::new(FailingSource), Duration::from_secs(600));
        assert!(cache.dataset().await.is_err());
        assert!(cache.fresh().is_none());
    }
}
