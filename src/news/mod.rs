// src/news/mod.rs
pub mod yahoo_rss;

use async_trait::async_trait;
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// One feed entry, in feed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    #[serde(rename = "Headline")]
    pub headline: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Snippet")]
    pub snippet: String,
    #[serde(rename = "Published", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<u64>, // unix seconds
}

/// Headline source for a query. There is no error channel: a failed fetch is
/// logged by the implementation and comes back as an empty vector.
#[async_trait]
pub trait NewsFeed: Send + Sync {
    async fn fetch_news(&self, query: &str) -> Vec<NewsRecord>;
    fn name(&self) -> &'static str;
}

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_articles_fetched_total",
            "Feed entries parsed from news providers."
        );
        describe_counter!("news_feed_errors_total", "News feed fetch/parse errors.");
        describe_counter!("headlines_scored_total", "Texts run through the classifier.");
        describe_histogram!("news_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Clean feed text: decode entities, strip tags, fold whitespace.
/// Punctuation is kept; the scorer reads emphasis from it.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_markup_and_keeps_punct() {
        let s = "  <p>Shares&nbsp;&nbsp;<b>soar</b>!</p>\n ";
        assert_eq!(normalize_text(s), "Shares soar!");
    }

    #[test]
    fn normalize_text_folds_smart_quotes() {
        assert_eq!(normalize_text("\u{201C}ok\u{201D} it\u{2019}s"), r#""ok" it's"#);
    }

    #[test]
    fn published_is_omitted_when_unknown() {
        let r = NewsRecord {
            headline: "h".into(),
            link: "l".into(),
            snippet: "s".into(),
            published_at: None,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["Headline"], "h");
        assert!(v.get("Published").is_none());
    }
}
