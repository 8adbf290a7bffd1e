//! Alert list and the batcher that feeds it.
//!
//! Pushed alerts collect in a pending batch and are merged into the list
//! once the stream has been quiet for the batch interval, so a burst costs
//! one list update instead of one per alert.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::debounce::Debounce;
use crate::models::Alert;

/// Default cap on the alert list.
pub const MAX_ALERTS: usize = 100;
/// Quiet period before pending alerts are merged.
pub const BATCH_INTERVAL: Duration = Duration::from_secs(2);

/// Newest-first list of alerts with a fixed capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertList {
    alerts: Vec<Alert>,
    capacity: usize,
}

impl Default for AlertList {
    fn default() -> Self {
        Self::with_capacity(MAX_ALERTS)
    }
}

impl AlertList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            alerts: Vec::new(),
            capacity,
        }
    }

    pub fn as_slice(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|alert| alert.id == id)
    }

    /// Put `newest_first` in front of the current entries and drop the
    /// oldest ones beyond capacity.
    pub fn prepend(&mut self, newest_first: Vec<Alert>) {
        self.alerts.splice(0..0, newest_first);
        self.alerts.truncate(self.capacity);
    }

    /// Swap the whole list for `alerts`, keeping the first `capacity`.
    pub fn replace(&mut self, mut alerts: Vec<Alert>) {
        alerts.truncate(self.capacity);
        self.alerts = alerts;
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}

/// Pending batch plus its flush debounce.
#[derive(Debug, Clone)]
pub struct AlertBatcher {
    pending: Vec<Alert>,
    debounce: Debounce,
    total_flushed: u64,
}

impl Default for AlertBatcher {
    fn default() -> Self {
        Self::new(BATCH_INTERVAL)
    }
}

impl AlertBatcher {
    pub fn new(interval: Duration) -> Self {
        Self {
            pending: Vec::new(),
            debounce: Debounce::new(interval),
            total_flushed: 0,
        }
    }

    /// Queue an alert and push the flush deadline out to `now + interval`.
    pub fn ingest(&mut self, alert: Alert, now: Instant) {
        self.pending.push(alert);
        self.debounce.trigger(now);
    }

    /// Instant at which the pending batch should be flushed.
    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    pub fn pending(&self) -> &[Alert] {
        &self.pending
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Running count of alerts merged by flushes.
    pub fn total_flushed(&self) -> u64 {
        self.total_flushed
    }

    /// Flush if the debounce has elapsed. Returns the number of alerts merged.
    pub fn flush_if_due(&mut self, list: &mut AlertList, now: Instant) -> usize {
        if self.debounce.fire_if_due(now) {
            self.flush(list)
        } else {
            0
        }
    }

    /// Merge the pending batch into `list`, most recent first.
    ///
    /// An empty batch leaves `list` and the counter untouched.
    pub fn flush(&mut self, list: &mut AlertList) -> usize {
        self.debounce.cancel();
        if self.pending.is_empty() {
            return 0;
        }

        let mut batch = std::mem::take(&mut self.pending);
        batch.reverse();
        let merged = batch.len();
        list.prepend(batch);
        self.total_flushed += merged as u64;
        merged
    }

    /// Drop pending alerts and the flush deadline without merging.
    pub fn discard(&mut self) {
        self.pending.clear();
        self.debounce.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertKind;
    use chrono::Utc;

    fn alert(id: &str) -> Alert {
        Alert::new(AlertKind::Person, "m", Utc::now()).with_id(id)
    }

    fn ids(list: &AlertList) -> Vec<&str> {
        list.as_slice().iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn burst_flushes_once_newest_first() {
        let start = Instant::now();
        let mut batcher = AlertBatcher::default();
        let mut list = AlertList::default();
        list.prepend(vec![alert("old")]);

        for (i, id) in ["a1", "a2", "a3"].iter().enumerate() {
            batcher.ingest(alert(id), start + Duration::from_millis(500 * i as u64));
        }

        // Two seconds after the first alert, but not after the last one.
        assert_eq!(batcher.flush_if_due(&mut list, start + Duration::from_secs(2)), 0);
        assert_eq!(batcher.pending_len(), 3);

        let merged = batcher.flush_if_due(&mut list, start + Duration::from_secs(3));
        assert_eq!(merged, 3);
        assert_eq!(ids(&list), vec!["a3", "a2", "a1", "old"]);
        assert_eq!(batcher.pending_len(), 0);
        assert_eq!(batcher.total_flushed(), 3);
        assert!(batcher.deadline().is_none());

        // Nothing left to fire.
        assert_eq!(batcher.flush_if_due(&mut list, start + Duration::from_secs(10)), 0);
    }

    #[test]
    fn empty_flush_is_a_noop() {
        let mut batcher = AlertBatcher::default();
        let mut list = AlertList::default();
        list.prepend(vec![alert("keep")]);

        assert_eq!(batcher.flush(&mut list), 0);
        assert_eq!(ids(&list), vec!["keep"]);
        assert_eq!(batcher.total_flushed(), 0);
    }

    #[test]
    fn list_never_exceeds_capacity() {
        let start = Instant::now();
        let mut list = AlertList::default();
        for batch_size in [1usize, 37, 99, 100, 101, 250] {
            let mut batcher = AlertBatcher::default();
            for i in 0..batch_size {
                batcher.ingest(alert(&format!("b{batch_size}-{i}")), start);
            }
            batcher.flush(&mut list);
            assert!(list.len() <= MAX_ALERTS);
            assert_eq!(
                list.as_slice()[0].id,
                format!("b{batch_size}-{}", batch_size - 1)
            );
        }
        assert_eq!(list.len(), MAX_ALERTS);
    }

    #[test]
    fn replace_truncates_and_discard_drops_pending() {
        let mut list = AlertList::with_capacity(2);
        list.replace(vec![alert("x"), alert("y"), alert("z")]);
        assert_eq!(ids(&list), vec!["x", "y"]);
        assert!(list.get("y").is_some());
        assert!(list.get("z").is_none());

        let mut batcher = AlertBatcher::default();
        batcher.ingest(alert("p"), Instant::now());
        batcher.discard();
        assert_eq!(batcher.flush(&mut list), 0);
        assert!(batcher.deadline().is_none());
    }
}
