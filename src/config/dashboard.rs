// src/config/dashboard.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";
pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_FINANCIALS_BASE_URL: &str = "FINANCIALS_BASE_URL";
pub const ENV_FINANCIALS_CACHE_TTL: &str = "FINANCIALS_CACHE_TTL_SECS";
pub const ENV_NEWS_FEED_URL: &str = "NEWS_FEED_URL";

fn default_base_url() -> String {
    "https://query2.finance.yahoo.com".to_string()
}
const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/124.0 Safari/537.36"
);

fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
fn default_cache_ttl_secs() -> u64 {
    3_600
}
fn default_period_start_unix() -> i64 {
    // 1985-08-23, far enough back for any annual series
    493_590_046
}
fn default_feed_url() -> String {
    "https://finance.yahoo.com/rss/headline".to_string()
}
fn default_query_param() -> String {
    "s".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 0 disables memoization.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_period_start_unix")]
    pub period_start_unix: i64,
}

impl Default for FinancialsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            cache_ttl_secs: default_cache_ttl_secs(),
            period_start_unix: default_period_start_unix(),
        }
    }
}

/// Which feed field the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreField {
    #[default]
    Snippet,
    Headline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Feed endpoint; the query is appended as `?<query_param>=<query>`.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub score_field: ScoreField,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            query_param: default_query_param(),
            user_agent: default_user_agent(),
            score_field: ScoreField::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub expose_metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            expose_metrics: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub financials: FinancialsConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl DashboardConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: DashboardConfig = toml::from_str(s).context("parsing dashboard config")?;
        cfg.validated()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides()?;
        cfg.validated()
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = env::var(ENV_FINANCIALS_BASE_URL) {
            self.financials.base_url = v.trim().to_string();
        }
        if let Ok(v) = env::var(ENV_FINANCIALS_CACHE_TTL) {
            self.financials.cache_ttl_secs = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FINANCIALS_CACHE_TTL} must be an integer"))?;
        }
        if let Ok(v) = env::var(ENV_NEWS_FEED_URL) {
            self.news.feed_url = v.trim().to_string();
        }
        Ok(())
    }

    fn validated(self) -> Result<Self> {
        reqwest::Url::parse(self.news.feed_url.trim())
            .with_context(|| format!("news.feed_url is not a URL: {}", self.news.feed_url))?;
        if self.news.query_param.trim().is_empty() {
            return Err(anyhow!("news.query_param must not be empty"));
        }
        if self.financials.base_url.trim().is_empty() {
            return Err(anyhow!("financials.base_url must not be empty"));
        }
        Ok(self)
    }
}
