//! # Metric Table Assembler
//! Derives profitability ratios from yearly rows and lays them out as a
//! long-form `(Year, Metric, Ticker, Value)` table.
//!
//! Order: ticker-major, then metric-major, then row order. The ratio formulas
//! are not guarded against a zero revenue; the outcome is tagged in
//! `MetricValue` instead of being hidden.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::financials::provider::FinancialsProvider;
use crate::financials::{build_yearly_rows, present, YearlyRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "Gross Profit Margin")]
    GrossProfitMargin,
    #[serde(rename = "Net Profit Margin")]
    NetProfitMargin,
    #[serde(rename = "Operating Margin")]
    OperatingMargin,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::GrossProfitMargin,
        Metric::NetProfitMargin,
        Metric::OperatingMargin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::GrossProfitMargin => "Gross Profit Margin",
            Metric::NetProfitMargin => "Net Profit Margin",
            Metric::OperatingMargin => "Operating Margin",
        }
    }

    fn numerator(self, row: &YearlyRow) -> Option<f64> {
        match self {
            Metric::GrossProfitMargin => row.gross_profit,
            Metric::NetProfitMargin => row.net_income,
            Metric::OperatingMargin => row.operating_income,
        }
    }

    /// Ratio for one row, or `None` when revenue or the numerator is null.
    pub fn compute(self, row: &YearlyRow) -> Option<MetricValue> {
        let revenue = present(row.total_revenue)?;
        let numerator = present(self.numerator(row))?;
        Some(MetricValue::from_raw(numerator / revenue * 100.0))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    /// Accepts display names and snake/kebab forms, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "grossprofitmargin" | "grossmargin" => Ok(Metric::GrossProfitMargin),
            "netprofitmargin" | "netmargin" => Ok(Metric::NetProfitMargin),
            "operatingmargin" => Ok(Metric::OperatingMargin),
            _ => Err(anyhow::anyhow!("unknown metric '{}'", s.trim())),
        }
    }
}

/// Outcome of an unguarded ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricValue {
    Finite { value: f64 },
    Infinite { negative: bool },
    Undefined,
}

impl MetricValue {
    pub fn from_raw(v: f64) -> Self {
        if v.is_nan() {
            MetricValue::Undefined
        } else if v.is_infinite() {
            MetricValue::Infinite {
                negative: v.is_sign_negative(),
            }
        } else {
            MetricValue::Finite { value: v }
        }
    }

    pub fn finite(self) -> Option<f64> {
        match self {
            MetricValue::Finite { value } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Metric")]
    pub metric: Metric,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Value")]
    pub value: MetricValue,
}

pub type MetricTable = Vec<MetricRecord>;

/// A ticker whose statement could not be retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderLookupFailure {
    pub ticker: String,
    pub message: String,
}

impl fmt::Display for ProviderLookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to retrieve data for ticker {}: {}",
            self.ticker, self.message
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricReport {
    pub table: MetricTable,
    pub failures: Vec<ProviderLookupFailure>,
}

/// Year kept numeric until the final table is produced.
struct PendingRecord<'a> {
    year: i32,
    metric: Metric,
    ticker: &'a str,
    value: MetricValue,
}

/// Pure derivation over already-built rows, one entry per ticker in caller order.
pub fn assemble_from_rows(
    per_ticker: &[(String, Vec<YearlyRow>)],
    metrics: &[Metric],
) -> MetricTable {
    let mut pending = Vec::new();
    for (ticker, rows) in per_ticker {
        if rows.is_empty() {
            continue;
        }
        for &metric in metrics {
            for row in rows {
                if let Some(value) = metric.compute(row) {
                    pending.push(PendingRecord {
                        year: row.year,
                        metric,
                        ticker,
                        value,
                    });
                }
            }
        }
    }

    pending
        .into_iter()
        .map(|p| MetricRecord {
            year: p.year.to_string(),
            metric: p.metric,
            ticker: p.ticker.to_string(),
            value: p.value,
        })
        .collect()
}

/// Fetch every ticker's statement and derive the requested metrics.
///
/// A failed lookup is logged, reported in `failures` and the ticker skipped;
/// it never aborts the batch.
pub async fn assemble_metric_table(
    provider: &dyn FinancialsProvider,
    tickers: &[String],
    metrics: &[Metric],
) -> MetricReport {
    let mut per_ticker = Vec::with_capacity(tickers.len());
    let mut failures = Vec::new();

    for ticker in tickers {
        let statement = match provider.fetch_statement(ticker).await {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    ticker = %ticker,
                    provider = provider.name(),
                    "financials lookup failed"
                );
                counter!("financials_lookup_failures_total").increment(1);
                failures.push(ProviderLookupFailure {
                    ticker: ticker.clone(),
                    message: format!("{e:#}"),
                });
                None
            }
        };
        per_ticker.push((ticker.clone(), build_yearly_rows(statement.as_ref())));
    }

    let table = assemble_from_rows(&per_ticker, metrics);
    counter!("metric_records_emitted_total").increment(table.len() as u64);
    tracing::info!(
        tickers = tickers.len(),
        metrics = metrics.len(),
        records = table.len(),
        failures = failures.len(),
        "metric table assembled"
    );

    MetricReport { table, failures }
}
