//! Latest-sample slots.
//!
//! Each sensor stream owns exactly one slot.  Writing a sample replaces the
//! previous one as a whole; nothing is ever queued.  Readers always see a
//! complete sample (never a half-written one) and can await the next write
//! without polling.
//!
//! Built on [`tokio::sync::watch`]:
//!
//! | Need | `watch` property |
//! |---|---|
//! | overwrite, never queue | single value, `send_replace` |
//! | atomic update | value swapped under the channel lock |
//! | later write supersedes earlier | monotonically increasing version |
//! | non-blocking read | `borrow` |
//! | wake evaluation on arrival | `changed` |

use std::sync::Arc;

use safeguard_types::{BatteryLevel, ProximityScan, SafetyError};
use tokio::sync::watch;

// ────────────────────────────────────────────────────────────────────────────
// LatestSlot
// ────────────────────────────────────────────────────────────────────────────

/// Writer side of a latest-value slot.  Cloning shares the same slot.
#[derive(Debug)]
pub struct LatestSlot<T> {
    sender: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> LatestSlot<T> {
    /// Create an empty slot (no sample has arrived yet).
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the slot's value and wake every reader.
    ///
    /// Succeeds even when no reader exists yet; the value is kept for
    /// readers created later.
    pub fn store(&self, value: T) {
        self.sender.send_replace(Some(value));
    }

    /// Create a new reader.  The current value counts as already seen.
    pub fn reader(&self) -> SlotReader<T> {
        SlotReader {
            receiver: self.sender.subscribe(),
        }
    }
}

impl<T: Clone> LatestSlot<T> {
    /// Copy of the current value, if any.
    pub fn latest(&self) -> Option<T> {
        self.sender.borrow().clone()
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SlotReader
// ────────────────────────────────────────────────────────────────────────────

/// Reader side of a [`LatestSlot`].
#[derive(Debug, Clone)]
pub struct SlotReader<T> {
    receiver: watch::Receiver<Option<T>>,
}

impl<T> SlotReader<T> {
    /// Wait until a value newer than the last one seen by this reader is
    /// stored.
    ///
    /// Returns [`SafetyError::Channel`] once every writer has been dropped;
    /// the last value stays readable through [`SlotReader::latest`].
    pub async fn changed(&mut self) -> Result<(), SafetyError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| SafetyError::Channel("sample slot writer dropped".to_string()))
    }
}

impl<T: Clone> SlotReader<T> {
    /// Copy of the current value without waiting.
    pub fn latest(&self) -> Option<T> {
        self.receiver.borrow().clone()
    }

    /// Copy of the current value, marking it as seen.
    pub fn latest_and_mark_seen(&mut self) -> Option<T> {
        self.receiver.borrow_and_update().clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SampleSlots
// ────────────────────────────────────────────────────────────────────────────

/// The pair of slots shared between the sensor intake and the supervisor.
#[derive(Debug, Clone, Default)]
pub struct SampleSlots {
    pub battery: LatestSlot<BatteryLevel>,
    pub proximity: LatestSlot<ProximityScan>,
}

impl SampleSlots {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_slot_reads_none() {
        let slot: LatestSlot<u32> = LatestSlot::new();
        assert_eq!(slot.latest(), None);
        assert_eq!(slot.reader().latest(), None);
    }

    #[test]
    fn later_value_overwrites_earlier() {
        let slot = LatestSlot::new();
        let reader = slot.reader();
        slot.store(1);
        slot.store(2);
        slot.store(3);
        assert_eq!(reader.latest(), Some(3));
    }

    #[test]
    fn store_without_readers_is_kept() {
        let slot = LatestSlot::new();
        slot.store("first");
        let reader = slot.reader();
        assert_eq!(reader.latest(), Some("first"));
    }

    #[test]
    fn clones_share_the_same_slot() {
        let slot = LatestSlot::new();
        let writer = slot.clone();
        writer.store(7);
        assert_eq!(slot.latest(), Some(7));
    }

    #[test]
    fn scan_is_replaced_whole() {
        let slots = SampleSlots::new();
        let reader = slots.proximity.reader();
        slots.proximity.store(ProximityScan::now(vec![1.0, 2.0, 3.0]));
        slots.proximity.store(ProximityScan::now(vec![0.5]));
        let latest = reader.latest().unwrap();
        assert_eq!(latest.ranges, vec![0.5]);
    }

    #[tokio::test]
    async fn changed_wakes_on_store() {
        let slot = LatestSlot::new();
        let mut reader = slot.reader();
        let writer = slot.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.store(42);
        });

        tokio::time::timeout(Duration::from_secs(1), reader.changed())
            .await
            .expect("changed must fire")
            .expect("writer still alive");
        assert_eq!(reader.latest(), Some(42));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn burst_of_writes_wakes_once_with_newest_value() {
        let slot = LatestSlot::new();
        let mut reader = slot.reader();
        for i in 0..100 {
            slot.store(i);
        }
        reader.changed().await.unwrap();
        assert_eq!(reader.latest(), Some(99));
        // The burst was consumed by the single wake-up above.
        assert!(
            tokio::time::timeout(Duration::from_millis(20), reader.changed())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn changed_errors_when_all_writers_dropped() {
        let slot = LatestSlot::new();
        let mut reader = slot.reader();
        slot.store(5);
        reader.latest_and_mark_seen();
        drop(slot);
        assert!(matches!(reader.changed().await, Err(SafetyError::Channel(_))));
        assert_eq!(reader.latest(), Some(5));
    }

    #[tokio::test]
    async fn mark_seen_suppresses_pending_wake_up() {
        let slot = LatestSlot::new();
        let mut reader = slot.reader();
        slot.store(1);
        assert_eq!(reader.latest_and_mark_seen(), Some(1));
        assert!(
            tokio::time::timeout(Duration::from_millis(20), reader.changed())
                .await
                .is_err()
        );
    }
}
