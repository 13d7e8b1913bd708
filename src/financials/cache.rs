// src/financials/cache.rs
//! Memoizes successful statement lookups per ticker. Failures are never
//! cached, so a transient provider error is retried on the next request.

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::provider::FinancialsProvider;
use super::FinancialStatementTable;

pub struct CachedFinancials<P> {
    inner: P,
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, FinancialStatementTable)>>,
}

impl<P: FinancialsProvider> CachedFinancials<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn lookup(&self, ticker: &str) -> Option<FinancialStatementTable> {
        let guard = self.entries.read().ok()?;
        let (at, table) = guard.get(ticker)?;
        (at.elapsed() < self.ttl).then(|| table.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<P: FinancialsProvider> FinancialsProvider for CachedFinancials<P> {
    async fn fetch_statement(&self, ticker: &str) -> Result<FinancialStatementTable> {
        if let Some(hit) = self.lookup(ticker) {
            counter!("financials_cache_hits_total").increment(1);
            tracing::debug!(ticker, "financials cache hit");
            return Ok(hit);
        }

        let table = self.inner.fetch_statement(ticker).await?;
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(ticker.to_string(), (Instant::now(), table.clone()));
        }
        Ok(table)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financials::TOTAL_REVENUE;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FinancialsProvider for Counting {
        async fn fetch_statement(&self, ticker: &str) -> Result<FinancialStatementTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker == "BAD" {
                anyhow::bail!("lookup failed");
            }
            let d = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
            Ok(FinancialStatementTable::new(vec![d]).with_row(TOTAL_REVENUE, vec![Some(1.0)]))
        }

        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    fn counting() -> Counting {
        Counting {
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let c = CachedFinancials::new(counting(), Duration::from_secs(60));
        let a = c.fetch_statement("AAPL").await.unwrap();
        let b = c.fetch_statement("AAPL").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.len(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let c = CachedFinancials::new(counting(), Duration::from_secs(60));
        assert!(c.fetch_statement("BAD").await.is_err());
        assert!(c.fetch_statement("BAD").await.is_err());
        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 2);
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_always_refetches() {
        let c = CachedFinancials::new(counting(), Duration::ZERO);
        c.fetch_statement("MSFT").await.unwrap();
        c.fetch_statement("MSFT").await.unwrap();
        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 2);
    }
}
