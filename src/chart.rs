//! Chart models handed to the page: a faceted grouped bar chart for the metric
//! table and a categorical histogram for sentiment labels. Categories keep
//! first-appearance order, like a categorical plot axis.

use serde::Serialize;

use crate::ratios::{Metric, MetricTable, MetricValue};
use crate::sentiment::SentimentLabel;

/// Qualitative "Vivid" palette.
pub const VIVID: [&str; 11] = [
    "rgb(229, 134, 6)",
    "rgb(93, 105, 177)",
    "rgb(82, 188, 163)",
    "rgb(153, 201, 69)",
    "rgb(204, 97, 176)",
    "rgb(36, 121, 108)",
    "rgb(218, 165, 27)",
    "rgb(47, 138, 196)",
    "rgb(118, 78, 159)",
    "rgb(237, 100, 90)",
    "rgb(165, 170, 153)",
];

pub const METRICS_CHART_TITLE: &str = "Financial Metrics by Year";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub year: String,
    pub value: MetricValue,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub ticker: String,
    pub color: &'static str,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    pub metric: Metric,
    pub y_axis_title: String,
    pub years: Vec<String>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub facets: Vec<Facet>,
}

/// Bar label: percentage with two decimals.
pub fn format_percent(v: MetricValue) -> String {
    if let Some(value) = v.finite() {
        return format!("{value:.2}%");
    }
    match v {
        MetricValue::Infinite { negative: false } => "∞%",
        MetricValue::Infinite { negative: true } => "-∞%",
        _ => "n/a",
    }
    .to_string()
}

fn push_unique(v: &mut Vec<String>, s: &str) {
    if !v.iter().any(|x| x == s) {
        v.push(s.to_string());
    }
}

/// One facet per requested metric (in request order), bars grouped by ticker.
/// Ticker colours are assigned once across facets so a ticker keeps its colour.
pub fn metric_bar_chart(table: &MetricTable, metrics: &[Metric]) -> BarChart {
    let mut tickers: Vec<String> = Vec::new();
    for rec in table {
        push_unique(&mut tickers, &rec.ticker);
    }

    let mut facets = Vec::with_capacity(metrics.len());
    for &metric in metrics {
        let mut years: Vec<String> = Vec::new();
        let mut series: Vec<Series> = Vec::new();
        for rec in table.iter().filter(|r| r.metric == metric) {
            push_unique(&mut years, &rec.year);
            let bar = Bar {
                year: rec.year.clone(),
                value: rec.value,
                label: format_percent(rec.value),
            };
            match series.iter_mut().find(|s| s.ticker == rec.ticker) {
                Some(s) => s.bars.push(bar),
                None => {
                    let idx = tickers.iter().position(|t| *t == rec.ticker).unwrap_or(0);
                    series.push(Series {
                        ticker: rec.ticker.clone(),
                        color: VIVID[idx % VIVID.len()],
                        bars: vec![bar],
                    });
                }
            }
        }
        facets.push(Facet {
            metric,
            y_axis_title: metric.label().to_string(),
            years,
            series,
        });
    }

    BarChart {
        title: METRICS_CHART_TITLE.to_string(),
        facets,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub label: SentimentLabel,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub title: String,
    pub bins: Vec<HistogramBin>,
}

pub fn sentiment_histogram(
    query: &str,
    labels: impl IntoIterator<Item = SentimentLabel>,
) -> Histogram {
    let mut bins: Vec<HistogramBin> = Vec::new();
    for label in labels {
        match bins.iter_mut().find(|b| b.label == label) {
            Some(b) => b.count += 1,
            None => {
                let color = VIVID[bins.len() % VIVID.len()];
                bins.push(HistogramBin {
                    label,
                    count: 1,
                    color,
                });
            }
        }
    }
    Histogram {
        title: format!("Sentiment Analysis for {query} News Articles"),
        bins,
    }
}
