use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::error::ValidationError;
use crate::history;
use crate::price::PriceOracle;
use crate::record::{ProductionRecord, ShiftReport};
use crate::store::RecordStore;

/// Everything the request handlers share.
///
/// The store sits behind its own lock; readers copy a snapshot out and run
/// analytics without holding it. The oracle guards its ledger internally.
pub struct AppState {
    store: Mutex<RecordStore>,
    pub oracle: PriceOracle,
}

/// Consistent copy of the store taken under one lock acquisition
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub records: Vec<ProductionRecord>,
    pub historical_records: usize,
}

impl StoreSnapshot {
    /// Submitted entries only, in submission order
    pub fn entries(&self) -> &[ProductionRecord] {
        &self.records[self.historical_records.min(self.records.len())..]
    }
}

impl AppState {
    pub fn new(store: RecordStore, oracle: PriceOracle) -> Self {
        Self { store: Mutex::new(store), oracle }
    }

    /// Seed the synthetic history and wire the ranked price sources.
    pub fn from_config(cfg: &Config, seed: u64) -> anyhow::Result<Self> {
        let today = Utc::now().date_naive();
        let records = history::generate(cfg.history_days, today, seed)?;
        Ok(Self::new(RecordStore::new(records), PriceOracle::from_config(cfg)))
    }

    fn store(&self) -> MutexGuard<'_, RecordStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let store = self.store();
        StoreSnapshot {
            records: store.snapshot(),
            historical_records: store.history_len(),
        }
    }

    pub fn submit(&self, report: ShiftReport, now: DateTime<Utc>) -> Result<(ProductionRecord, Vec<ProductionRecord>), ValidationError> {
        let mut store = self.store();
        let record = store.submit(report, now)?.clone();
        Ok((record, store.entries().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::RandomWalk;
    use crate::record::{Shift, Weather};
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use std::time::Duration;

    fn state() -> AppState {
        let oracle = PriceOracle::new(
            vec![],
            Box::new(RandomWalk::with_seed(5)),
            Duration::from_millis(10),
            2000.0,
            ChronoDuration::hours(24),
        );
        let history = history::generate(3, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 1).unwrap();
        AppState::new(RecordStore::new(history), oracle)
    }

    fn report(ore: f64) -> ShiftReport {
        ShiftReport {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            shift: Shift::Day,
            gold_extracted: 40.0,
            ore_processed: ore,
            workers: 22,
            equipment_hours: 170.0,
            weather: Weather::Clear,
            operational_cost: 8000.0,
        }
    }

    #[test]
    fn test_snapshot_covers_history_and_entries() {
        let state = state();
        assert_eq!(state.snapshot().records.len(), 9);
        let (record, entries) = state.submit(report(1000.0), Utc::now()).unwrap();
        assert_eq!(record.id, Some(1));
        assert_eq!(entries.len(), 1);

        let snap = state.snapshot();
        assert_eq!(snap.records.len(), 10);
        assert_eq!(snap.historical_records, 9);
        assert_eq!(snap.entries(), &entries[..]);
    }

    #[test]
    fn test_rejected_submission_leaves_store_untouched() {
        let state = state();
        assert!(state.submit(report(0.0), Utc::now()).is_err());
        assert_eq!(state.snapshot().entries().len(), 0);
    }
}
