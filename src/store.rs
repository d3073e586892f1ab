use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::record::{ProductionRecord, ShiftReport};

/// Append-only record store for the life of the process.
///
/// Holds the synthetic history and the operator's submitted entries as two
/// ordered sequences; analytics read the concatenation, history first.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    history: Vec<ProductionRecord>,
    entries: Vec<ProductionRecord>,
}

impl RecordStore {
    pub fn new(history: Vec<ProductionRecord>) -> Self {
        Self { history, entries: Vec::new() }
    }

    /// Derive and append a submitted record. Nothing is stored on error.
    pub fn submit(&mut self, report: ShiftReport, now: DateTime<Utc>) -> Result<&ProductionRecord, ValidationError> {
        let id = self.entries.len() as u64 + 1;
        let record = ProductionRecord::derive(report)?.with_submission(id, now);
        self.entries.push(record);
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn entries(&self) -> &[ProductionRecord] {
        &self.entries
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn len(&self) -> usize {
        self.history.len() + self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductionRecord> {
        self.history.iter().chain(self.entries.iter())
    }

    /// Owned copy of every record, history first
    pub fn snapshot(&self) -> Vec<ProductionRecord> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Shift, Weather};
    use chrono::NaiveDate;

    fn report(gold: f64, ore: f64) -> ShiftReport {
        ShiftReport {
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            shift: Shift::Night,
            gold_extracted: gold,
            ore_processed: ore,
            workers: 20,
            equipment_hours: 150.0,
            weather: Weather::Windy,
            operational_cost: 9000.0,
        }
    }

    #[test]
    fn test_submit_assigns_sequential_ids() {
        let mut store = RecordStore::default();
        let now = Utc::now();
        assert_eq!(store.submit(report(30.0, 900.0), now).unwrap().id, Some(1));
        assert_eq!(store.submit(report(31.0, 900.0), now).unwrap().id, Some(2));
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.entries()[1].created_at, Some(now));
    }

    #[test]
    fn test_rejected_record_not_stored() {
        let mut store = RecordStore::default();
        assert!(store.submit(report(30.0, 0.0), Utc::now()).is_err());
        assert!(store.is_empty());
        // id sequence is unaffected by the rejection
        assert_eq!(store.submit(report(30.0, 900.0), Utc::now()).unwrap().id, Some(1));
    }

    #[test]
    fn test_snapshot_orders_history_first() {
        let seed = ProductionRecord::derive(report(10.0, 400.0)).unwrap();
        let mut store = RecordStore::new(vec![seed.clone()]);
        store.submit(report(50.0, 1000.0), Utc::now()).unwrap();
        let snap = store.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0], seed);
        assert_eq!(snap[1].gold_extracted, 50.0);
        assert_eq!(store.history_len(), 1);
    }
}
