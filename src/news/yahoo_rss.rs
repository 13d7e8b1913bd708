use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::config::NewsConfig;
use crate::news::{ensure_metrics_described, normalize_text, NewsFeed, NewsRecord};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

/// Yahoo Finance headline feed (`rss/headline?s=<query>`).
pub struct YahooRssFeed {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        feed_url: String,
        query_param: String,
        client: reqwest::Client,
    },
}

impl YahooRssFeed {
    /// Serve every query from the same XML document.
    pub fn from_fixture(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_config(cfg: &NewsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building news http client")?;
        Ok(Self {
            mode: Mode::Http {
                feed_url: cfg.feed_url.trim().to_string(),
                query_param: cfg.query_param.trim().to_string(),
                client,
            },
        })
    }

    fn request_for(
        client: &reqwest::Client,
        feed_url: &str,
        query_param: &str,
        query: &str,
    ) -> reqwest::Result<reqwest::Request> {
        client
            .get(feed_url)
            .query(&[(query_param, query.trim())])
            .build()
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<NewsRecord>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing yahoo rss xml")?;

        let out: Vec<NewsRecord> = rss
            .channel
            .item
            .into_iter()
            .map(|it| NewsRecord {
                headline: normalize_text(it.title.as_deref().unwrap_or_default()),
                link: it.link.unwrap_or_default().trim().to_string(),
                snippet: normalize_text(it.description.as_deref().unwrap_or_default()),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
            })
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_parse_ms").record(ms);
        counter!("news_articles_fetched_total").increment(out.len() as u64);
        Ok(out)
    }

    async fn fetch_raw(&self, query: &str) -> Result<Vec<NewsRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http {
                feed_url,
                query_param,
                client,
            } => {
                let req = Self::request_for(client, feed_url, query_param, query)
                    .context("building yahoo rss request")?;
                let body = client
                    .execute(req)
                    .await
                    .context("yahoo rss http get()")?
                    .text()
                    .await
                    .context("yahoo rss http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }
}

#[async_trait]
impl NewsFeed for YahooRssFeed {
    async fn fetch_news(&self, query: &str) -> Vec<NewsRecord> {
        ensure_metrics_described();
        match self.fetch_raw(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = ?e, provider = self.name(), query, "news feed error");
                counter!("news_feed_errors_total").increment(1);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "Yahoo"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
