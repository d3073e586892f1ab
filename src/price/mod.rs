//! Spot gold price oracle.
//!
//! `refresh` walks three states in order: ranked external sources, then the
//! bounded simulation, then a fixed static price. Every refresh appends
//! exactly one sample to a rolling window and moves the current price.

pub mod simulate;
pub mod sources;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::config::Config;
use crate::insights::MarketContext;
use crate::logging::{log_price_sample, log_source_failure};
use crate::stats;

pub use simulate::{PriceSimulator, RandomWalk};
pub use sources::{GoldApi, MetalPriceApi, PriceProvider};

/// Quotes outside this band are treated as source failures
pub const SANE_MIN: f64 = 1500.0;
pub const SANE_MAX: f64 = 3000.0;
pub const STATIC_FALLBACK_PRICE: f64 = 2025.0;
pub const SIMULATION_NOTE: &str = "Real-time APIs unavailable. Using market-pattern simulation.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    External(String),
    Simulated,
    StaticFallback,
}

impl PriceSource {
    pub fn tag(&self) -> &str {
        match self {
            PriceSource::External(name) => name,
            PriceSource::Simulated => "intelligent_simulation",
            PriceSource::StaticFallback => "static_fallback",
        }
    }
}

impl Serialize for PriceSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSample {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub change: f64,
    pub source: PriceSource,
}

/// Result of one refresh
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub sample: PriceSample,
    pub note: Option<&'static str>,
}

pub fn within_sane_range(price: f64) -> bool {
    price.is_finite() && (SANE_MIN..=SANE_MAX).contains(&price)
}

#[derive(Debug)]
struct PriceLedger {
    current: f64,
    samples: VecDeque<PriceSample>,
    window: ChronoDuration,
}

impl PriceLedger {
    fn record(&mut self, price: f64, source: PriceSource, now: DateTime<Utc>) -> PriceSample {
        let change = match source {
            PriceSource::StaticFallback => 0.0,
            _ if self.current > 0.0 => price - self.current,
            _ => 0.0,
        };
        self.current = price;
        let sample = PriceSample { price, timestamp: now, change, source };
        self.samples.push_back(sample.clone());
        self.prune(now);
        sample
    }

    fn mean_price(&self) -> Option<f64> {
        let prices: Vec<f64> = self.samples.iter().map(|s| s.price).collect();
        stats::mean(&prices)
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while let Some(front) = self.samples.front() {
            if front.timestamp > cutoff {
                break;
            }
            self.samples.pop_front();
        }
    }
}

pub struct PriceOracle {
    providers: Vec<Box<dyn PriceProvider>>,
    simulator: Box<dyn PriceSimulator>,
    fetch_timeout: Duration,
    ledger: Mutex<PriceLedger>,
}

impl PriceOracle {
    pub fn new(
        providers: Vec<Box<dyn PriceProvider>>,
        simulator: Box<dyn PriceSimulator>,
        fetch_timeout: Duration,
        initial_price: f64,
        window: ChronoDuration,
    ) -> Self {
        Self {
            providers,
            simulator,
            fetch_timeout,
            ledger: Mutex::new(PriceLedger {
                current: initial_price,
                samples: VecDeque::new(),
                window,
            }),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            sources::default_providers(cfg),
            Box::new(RandomWalk::new()),
            cfg.price_timeout(),
            cfg.initial_gold_price,
            cfg.price_window(),
        )
    }

    // Samples are plain data, so a panic mid-update cannot leave them torn
    fn ledger(&self) -> MutexGuard<'_, PriceLedger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_price(&self) -> f64 {
        self.ledger().current
    }

    /// Retained samples, oldest first
    pub fn history(&self) -> Vec<PriceSample> {
        self.ledger().samples.iter().cloned().collect()
    }

    pub fn history_mean(&self) -> Option<f64> {
        self.ledger().mean_price()
    }

    /// Current price and window mean read under one lock
    pub fn market_context(&self) -> MarketContext {
        let ledger = self.ledger();
        MarketContext {
            current_price: ledger.current,
            history_mean: ledger.mean_price(),
        }
    }

    /// First valid quote from the ranked sources, or None once all failed.
    async fn query_sources(&self) -> Option<(String, f64)> {
        for provider in &self.providers {
            let name = provider.name();
            match tokio::time::timeout(self.fetch_timeout, provider.fetch()).await {
                Ok(Ok(price)) if within_sane_range(price) => return Some((name.to_string(), price)),
                Ok(Ok(price)) => log_source_failure(name, &format!("price {} outside sane range", price)),
                Ok(Err(err)) => log_source_failure(name, &err.to_string()),
                Err(_) => log_source_failure(
                    name,
                    &format!("timed out after {}ms", self.fetch_timeout.as_millis()),
                ),
            }
        }
        None
    }

    pub async fn refresh(&self) -> PriceQuote {
        self.refresh_at_with(Utc::now).await
    }

    /// `refresh` with an injectable clock for window tests.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> PriceQuote {
        self.refresh_at_with(move || now).await
    }

    async fn refresh_at_with(&self, clock: impl Fn() -> DateTime<Utc>) -> PriceQuote {
        let (price, source, note) = match self.query_sources().await {
            Some((name, price)) => (price, PriceSource::External(name), None),
            None => match self.simulator.simulate() {
                Ok(price) => (price, PriceSource::Simulated, Some(SIMULATION_NOTE)),
                Err(err) => {
                    log_source_failure(PriceSource::Simulated.tag(), &err.to_string());
                    (STATIC_FALLBACK_PRICE, PriceSource::StaticFallback, None)
                }
            },
        };

        let (sample, retained) = {
            let mut ledger = self.ledger();
            let sample = ledger.record(price, source, clock());
            (sample, ledger.samples.len())
        };
        log_price_sample(sample.source.tag(), sample.price, sample.change, retained);
        PriceQuote { sample, note }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed(&'static str, f64);

    #[async_trait]
    impl PriceProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        async fn fetch(&self) -> Result<f64> {
            Ok(self.1)
        }
    }

    struct Failing(Arc<AtomicUsize>);

    #[async_trait]
    impl PriceProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        async fn fetch(&self) -> Result<f64> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("connection refused"))
        }
    }

    struct Slow;

    #[async_trait]
    impl PriceProvider for Slow {
        fn name(&self) -> &str {
            "slow"
        }
        async fn fetch(&self) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(2000.0)
        }
    }

    struct BrokenSimulator;

    impl PriceSimulator for BrokenSimulator {
        fn simulate(&self) -> Result<f64> {
            Err(anyhow!("overflow"))
        }
    }

    fn oracle(providers: Vec<Box<dyn PriceProvider>>, simulator: Box<dyn PriceSimulator>) -> PriceOracle {
        PriceOracle::new(
            providers,
            simulator,
            Duration::from_millis(50),
            2000.0,
            ChronoDuration::hours(24),
        )
    }

    #[tokio::test]
    async fn test_first_valid_source_wins() {
        let oracle = oracle(
            vec![Box::new(Fixed("first", 2100.0)), Box::new(Fixed("second", 2200.0))],
            Box::new(RandomWalk::with_seed(1)),
        );
        let quote = oracle.refresh().await;
        assert_eq!(quote.sample.source, PriceSource::External("first".into()));
        assert_eq!(quote.sample.price, 2100.0);
        assert_eq!(quote.sample.change, 100.0);
        assert!(quote.note.is_none());
        assert_eq!(oracle.current_price(), 2100.0);
    }

    #[tokio::test]
    async fn test_out_of_range_quote_falls_through() {
        let oracle = oracle(
            vec![Box::new(Fixed("bogus", 0.0005)), Box::new(Fixed("real", 2050.0))],
            Box::new(RandomWalk::with_seed(1)),
        );
        let quote = oracle.refresh().await;
        assert_eq!(quote.sample.source.tag(), "real");
    }

    #[tokio::test]
    async fn test_all_sources_failing_simulates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let oracle = oracle(
            vec![Box::new(Failing(calls.clone())), Box::new(Slow)],
            Box::new(RandomWalk::with_seed(9)),
        );
        let quote = oracle.refresh().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(quote.sample.source.tag(), "intelligent_simulation");
        assert!((1800.0..=2500.0).contains(&quote.sample.price));
        assert_eq!(quote.note, Some(SIMULATION_NOTE));
        assert_eq!(oracle.history().len(), 1);
    }

    #[tokio::test]
    async fn test_broken_simulation_uses_static_price() {
        let oracle = oracle(vec![], Box::new(BrokenSimulator));
        let quote = oracle.refresh().await;
        assert_eq!(quote.sample.source, PriceSource::StaticFallback);
        assert_eq!(quote.sample.price, STATIC_FALLBACK_PRICE);
        assert_eq!(quote.sample.change, 0.0);
        assert_eq!(oracle.current_price(), STATIC_FALLBACK_PRICE);
    }

    #[tokio::test]
    async fn test_window_drops_old_samples() {
        let oracle = oracle(vec![Box::new(Fixed("f", 2000.0))], Box::new(BrokenSimulator));
        let t0 = Utc::now();
        oracle.refresh_at(t0).await;
        oracle.refresh_at(t0 + ChronoDuration::hours(12)).await;
        assert_eq!(oracle.history().len(), 2);
        oracle.refresh_at(t0 + ChronoDuration::hours(25)).await;
        let history = oracle.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, t0 + ChronoDuration::hours(12));
    }

    #[tokio::test]
    async fn test_history_mean() {
        let oracle = oracle(vec![], Box::new(BrokenSimulator));
        assert_eq!(oracle.history_mean(), None);
        oracle.refresh().await;
        assert_eq!(oracle.history_mean(), Some(STATIC_FALLBACK_PRICE));
    }

    #[tokio::test]
    async fn test_market_context_pairs_price_with_window() {
        let oracle = oracle(vec![Box::new(Fixed("f", 2100.0))], Box::new(BrokenSimulator));
        assert_eq!(
            oracle.market_context(),
            MarketContext { current_price: 2000.0, history_mean: None }
        );
        let t0 = Utc::now();
        oracle.refresh_at(t0).await;
        oracle.refresh_at(t0 + ChronoDuration::hours(1)).await;
        assert_eq!(
            oracle.market_context(),
            MarketContext { current_price: 2100.0, history_mean: Some(2100.0) }
        );
    }

    #[test]
    fn test_source_serializes_as_tag() {
        let sample = PriceSample {
            price: 2000.0,
            timestamp: Utc::now(),
            change: 0.0,
            source: PriceSource::External("GoldAPI".into()),
        };
        let v = serde_json::to_value(&sample).unwrap();
        assert_eq!(v["source"], "GoldAPI");
        assert_eq!(serde_json::to_value(PriceSource::Simulated).unwrap(), "intelligent_simulation");
    }
}
