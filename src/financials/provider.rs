// src/financials/provider.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::counter;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use super::{FinancialStatementTable, GROSS_PROFIT, NET_INCOME, OPERATING_INCOME, TOTAL_REVENUE};
use crate::config::FinancialsConfig;

/// Remote source of per-ticker financial statements.
///
/// An `Err` is a provider lookup failure for that ticker only; callers keep
/// going with the remaining tickers.
#[async_trait]
pub trait FinancialsProvider: Send + Sync {
    async fn fetch_statement(&self, ticker: &str) -> Result<FinancialStatementTable>;
    fn name(&self) -> &'static str;
}

/// Yahoo fundamentals-timeseries series keys, in table row order.
const ANNUAL_SERIES: [(&str, &str); 4] = [
    ("annualTotalRevenue", TOTAL_REVENUE),
    ("annualGrossProfit", GROSS_PROFIT),
    ("annualOperatingIncome", OPERATING_INCOME),
    ("annualNetIncome", NET_INCOME),
];

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: Timeseries,
}

#[derive(Debug, Deserialize)]
struct Timeseries {
    #[serde(default)]
    result: Option<Vec<SeriesResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SeriesResult {
    meta: SeriesMeta,
    #[serde(flatten)]
    rest: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SeriesMeta {
    #[serde(rename = "type", default)]
    kind: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DataPoint {
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "reportedValue")]
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Option<f64>,
}

/// Parse a fundamentals-timeseries payload into a statement table.
/// Columns are ordered most recent first, like the provider's own tables.
pub fn parse_timeseries(ticker: &str, body: &str) -> Result<FinancialStatementTable> {
    let env: TimeseriesEnvelope =
        serde_json::from_str(body).with_context(|| format!("parsing timeseries for {ticker}"))?;

    if let Some(err) = env.timeseries.error.filter(|e| !e.is_null()) {
        return Err(anyhow!("provider error for {ticker}: {err}"));
    }

    let mut series: HashMap<String, Vec<(NaiveDate, Option<f64>)>> = HashMap::new();
    for res in env.timeseries.result.unwrap_or_default() {
        let Some(kind) = res.meta.kind.first() else {
            continue;
        };
        let Some(raw_points) = res.rest.get(kind) else {
            continue;
        };
        let points: Vec<Option<DataPoint>> = serde_json::from_value(raw_points.clone())
            .with_context(|| format!("decoding series {kind} for {ticker}"))?;

        let mut out = Vec::with_capacity(points.len());
        for p in points.into_iter().flatten() {
            let date = NaiveDate::parse_from_str(&p.as_of_date, "%Y-%m-%d")
                .with_context(|| format!("bad asOfDate '{}' for {ticker}", p.as_of_date))?;
            out.push((date, p.reported_value.and_then(|v| v.raw)));
        }
        series.insert(kind.clone(), out);
    }

    let periods: BTreeSet<NaiveDate> = series
        .values()
        .flat_map(|pts| pts.iter().map(|(d, _)| *d))
        .collect();
    if periods.is_empty() {
        return Err(anyhow!("no financial data returned for {ticker}"));
    }
    let periods: Vec<NaiveDate> = periods.into_iter().rev().collect();

    let mut table = FinancialStatementTable::new(periods.clone());
    for (key, label) in ANNUAL_SERIES {
        let Some(points) = series.get(key) else {
            continue;
        };
        let cells = periods
            .iter()
            .map(|d| {
                points
                    .iter()
                    .rev()
                    .find(|(pd, _)| pd == d)
                    .and_then(|(_, v)| *v)
            })
            .collect();
        table.set_row(label, cells);
    }
    Ok(table)
}

/// Annual income-statement items from Yahoo Finance.
pub struct YahooFinancialsProvider {
    client: reqwest::Client,
    base_url: String,
    period_start_unix: i64,
}

impl YahooFinancialsProvider {
    pub fn from_config(cfg: &FinancialsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building financials http client")?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            period_start_unix: cfg.period_start_unix,
        })
    }

    fn request_for(&self, ticker: &str) -> reqwest::Result<reqwest::Request> {
        let kinds: Vec<&str> = ANNUAL_SERIES.iter().map(|(k, _)| *k).collect();
        let now = chrono::Utc::now().timestamp();
        let url = format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{ticker}",
            self.base_url
        );
        self.client
            .get(url)
            .query(&[
                ("symbol", ticker.to_string()),
                ("type", kinds.join(",")),
                ("period1", self.period_start_unix.to_string()),
                ("period2", now.to_string()),
            ])
            .build()
    }
}

#[async_trait]
impl FinancialsProvider for YahooFinancialsProvider {
    async fn fetch_statement(&self, ticker: &str) -> Result<FinancialStatementTable> {
        let valid = |c: char| c.is_ascii_alphanumeric() || ".-^=".contains(c);
        if ticker.is_empty() || !ticker.chars().all(valid) {
            return Err(anyhow!("invalid ticker symbol '{ticker}'"));
        }
        counter!("financials_lookups_total").increment(1);

        let req = self
            .request_for(ticker)
            .with_context(|| format!("building financials request for {ticker}"))?;
        let resp = self
            .client
            .execute(req)
            .await
            .with_context(|| format!("financials http get for {ticker}"))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("financials http .text() for {ticker}"))?;
        if !status.is_success() {
            return Err(anyhow!("financials http status {status} for {ticker}"));
        }
        parse_timeseries(ticker, &body)
    }

    fn name(&self) -> &'static str {
        "Yahoo"
    }
}

/// In-memory provider; unknown tickers fail like an invalid symbol would.
#[derive(Debug, Default, Clone)]
pub struct StaticFinancialsProvider {
    tables: HashMap<String, FinancialStatementTable>,
}

impl StaticFinancialsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, ticker: &str, table: FinancialStatementTable) -> Self {
        self.tables.insert(ticker.to_ascii_uppercase(), table);
        self
    }
}

#[async_trait]
impl FinancialsProvider for StaticFinancialsProvider {
    async fn fetch_statement(&self, ticker: &str) -> Result<FinancialStatementTable> {
        counter!("financials_lookups_total").increment(1);
        self.tables
            .get(ticker)
            .cloned()
            .ok_or_else(|| anyhow!("no financial data found for symbol '{ticker}'"))
    }

    fn name(&self) -> &'static str {
        "Static"
    }
}
