//! # Dashboard shell
//! Parses page inputs and dispatches to one of the two pipelines. Each call
//! is one request-response cycle; nothing is kept between calls except the
//! shared providers and classifier.

use serde::Serialize;
use std::sync::Arc;

use crate::chart::{metric_bar_chart, sentiment_histogram, BarChart, Histogram};
use crate::config::ScoreField;
use crate::financials::provider::FinancialsProvider;
use crate::news::{NewsFeed, NewsRecord};
use crate::ratios::{assemble_metric_table, Metric, MetricTable, ProviderLookupFailure};
use crate::sentiment::{SentimentClassifier, SentimentLabel};

pub const NO_DATA_MESSAGE: &str = "No data available for the given ticker symbols and metrics.";
pub const NO_ARTICLES_MESSAGE: &str = "No news articles found for the given query.";
pub const SENTIMENT_PROMPT: &str =
    "Enter a stock ticker symbol to fetch and analyze news articles.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    FinancialMetrics,
    Sentiment,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::FinancialMetrics => "Financial Metrics Comparison",
            Page::Sentiment => "Stock Sentiment Analysis",
        }
    }
}

/// Inputs collected on one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    FinancialMetrics {
        tickers_input: String,
        metrics: Vec<Metric>,
    },
    Sentiment {
        query: String,
    },
}

impl PageRequest {
    pub fn page(&self) -> Page {
        match self {
            PageRequest::FinancialMetrics { .. } => Page::FinancialMetrics,
            PageRequest::Sentiment { .. } => Page::Sentiment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageOutcome {
    Metrics(MetricsOutcome),
    Sentiment(SentimentOutcome),
}

/// Comma-separated, trimmed, upper-cased. Empty entries and repeats are dropped.
pub fn parse_tickers(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for t in input.split(',') {
        let t = t.trim().to_uppercase();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// Metric names as selected on the page; repeats are dropped.
pub fn parse_metrics<S: AsRef<str>>(names: &[S]) -> anyhow::Result<Vec<Metric>> {
    let mut out = Vec::with_capacity(names.len());
    for n in names {
        let n = n.as_ref();
        if n.trim().is_empty() {
            continue;
        }
        let m: Metric = n.parse()?;
        if !out.contains(&m) {
            out.push(m);
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsView {
    pub tickers: Vec<String>,
    pub metrics: Vec<Metric>,
    pub table: MetricTable,
    pub chart: BarChart,
    pub failures: Vec<ProviderLookupFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricsOutcome {
    /// Tickers or metrics missing; the page just waits.
    Idle,
    NoData {
        message: String,
        failures: Vec<ProviderLookupFailure>,
    },
    Ok(MetricsView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub record: NewsRecord,
    #[serde(rename = "Compound")]
    pub compound: f64,
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentReport {
    pub query: String,
    pub fetched: usize,
    pub message: String,
    pub articles: Vec<ScoredArticle>,
    pub histogram: Histogram,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SentimentOutcome {
    Idle { message: String },
    NoArticles { query: String, message: String },
    Ok(SentimentReport),
}

#[derive(Clone)]
pub struct Dashboard {
    financials: Arc<dyn FinancialsProvider>,
    news: Arc<dyn NewsFeed>,
    classifier: Arc<SentimentClassifier>,
    score_field: ScoreField,
}

impl Dashboard {
    pub fn new(
        financials: Arc<dyn FinancialsProvider>,
        news: Arc<dyn NewsFeed>,
        classifier: Arc<SentimentClassifier>,
    ) -> Self {
        Self {
            financials,
            news,
            classifier,
            score_field: ScoreField::Snippet,
        }
    }

    pub fn with_score_field(mut self, field: ScoreField) -> Self {
        self.score_field = field;
        self
    }

    pub async fn dispatch(&self, req: &PageRequest) -> PageOutcome {
        tracing::debug!(page = req.page().title(), "dispatch");
        match req {
            PageRequest::FinancialMetrics {
                tickers_input,
                metrics,
            } => PageOutcome::Metrics(self.metrics(tickers_input, metrics).await),
            PageRequest::Sentiment { query } => PageOutcome::Sentiment(self.sentiment(query).await),
        }
    }

    /// Financial Metrics Comparison page.
    pub async fn metrics(&self, tickers_input: &str, metrics: &[Metric]) -> MetricsOutcome {
        let tickers = parse_tickers(tickers_input);
        if tickers.is_empty() || metrics.is_empty() {
            return MetricsOutcome::Idle;
        }

        let report = assemble_metric_table(self.financials.as_ref(), &tickers, metrics).await;
        if report.table.is_empty() {
            return MetricsOutcome::NoData {
                message: NO_DATA_MESSAGE.to_string(),
                failures: report.failures,
            };
        }

        let chart = metric_bar_chart(&report.table, metrics);
        MetricsOutcome::Ok(MetricsView {
            tickers,
            metrics: metrics.to_vec(),
            table: report.table,
            chart,
            failures: report.failures,
        })
    }

    /// Stock Sentiment Analysis page.
    pub async fn sentiment(&self, query: &str) -> SentimentOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SentimentOutcome::Idle {
                message: SENTIMENT_PROMPT.to_string(),
            };
        }

        let records = self.news.fetch_news(query).await;
        tracing::info!(query, fetched = records.len(), feed = self.news.name(), "news fetched");
        if records.is_empty() {
            return SentimentOutcome::NoArticles {
                query: query.to_string(),
                message: NO_ARTICLES_MESSAGE.to_string(),
            };
        }

        let fetched = records.len();
        let articles: Vec<ScoredArticle> = records
            .into_iter()
            .map(|record| {
                let text = match self.score_field {
                    ScoreField::Snippet => record.snippet.as_str(),
                    ScoreField::Headline => record.headline.as_str(),
                };
                let scored = self.classifier.score(text);
                ScoredArticle {
                    record,
                    compound: scored.compound,
                    sentiment: scored.label,
                }
            })
            .collect();

        let histogram = sentiment_histogram(query, articles.iter().map(|a| a.sentiment));
        SentimentOutcome::Ok(SentimentReport {
            query: query.to_string(),
            fetched,
            message: format!("Fetched {fetched} news articles"),
            articles,
            histogram,
        })
    }
}
