//! Cross-thread parameter change channel.
//!
//! A single-producer/single-consumer, fixed-capacity, lock-free queue of
//! [`ChangeRecord`]s. Each plugin instance owns two of them: main→audio and
//! audio→main. Neither end allocates, locks or blocks after construction;
//! a push into a full queue drops the record and reports `false`.

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::parameter_info::ParameterId;

/// Default number of records per direction.
pub const DEFAULT_CAPACITY: usize = 256;

/// What a [`ChangeRecord`] asks the other side to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    SetValue,
    StartGesture,
    StopGesture,
    SetModulation,
}

/// One parameter change in flight between the two sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub id: ParameterId,
    pub value: f64,
}

impl ChangeRecord {
    pub const fn set_value(id: ParameterId, value: f64) -> Self {
        Self { kind: ChangeKind::SetValue, id, value }
    }

    pub const fn start_gesture(id: ParameterId) -> Self {
        Self { kind: ChangeKind::StartGesture, id, value: 0.0 }
    }

    pub const fn stop_gesture(id: ParameterId) -> Self {
        Self { kind: ChangeKind::StopGesture, id, value: 0.0 }
    }

    pub const fn set_modulation(id: ParameterId, amount: f64) -> Self {
        Self { kind: ChangeKind::SetModulation, id, value: amount }
    }
}

/// Producer end of a change channel.
pub struct ChangeSender {
    inner: HeapProd<ChangeRecord>,
}

/// Consumer end of a change channel.
pub struct ChangeReceiver {
    inner: HeapCons<ChangeRecord>,
}

/// Create a channel holding up to `capacity` records (at least one).
pub fn channel(capacity: usize) -> (ChangeSender, ChangeReceiver) {
    let (producer, consumer) = HeapRb::<ChangeRecord>::new(capacity.max(1)).split();
    (
        ChangeSender { inner: producer },
        ChangeReceiver { inner: consumer },
    )
}

impl ChangeSender {
    /// Enqueue a record. Returns `false` and drops the record if the
    /// channel is full.
    #[inline]
    pub fn push(&mut self, record: ChangeRecord) -> bool {
        self.inner.try_push(record).is_ok()
    }

    /// Number of records that can be pushed without dropping.
    pub fn vacant(&self) -> usize {
        self.inner.vacant_len()
    }

    /// Total capacity.
    pub fn capacity(&self) -> usize {
        self.inner.capacity().get()
    }
}

impl ChangeReceiver {
    /// Dequeue the oldest record, or `None` if the channel is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<ChangeRecord> {
        self.inner.try_pop()
    }

    /// Number of records waiting.
    pub fn len(&self) -> usize {
        self.inner.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for ChangeSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSender")
            .field("capacity", &self.capacity())
            .field("vacant", &self.vacant())
            .finish()
    }
}

impl std::fmt::Debug for ChangeReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeReceiver")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (mut tx, mut rx) = channel(4);
        assert!(rx.pop().is_none());
        assert!(tx.push(ChangeRecord::start_gesture(1)));
        assert!(tx.push(ChangeRecord::set_value(1, 0.5)));
        assert!(tx.push(ChangeRecord::stop_gesture(1)));
        assert_eq!(rx.len(), 3);
        assert_eq!(rx.pop().unwrap().kind, ChangeKind::StartGesture);
        assert_eq!(rx.pop(), Some(ChangeRecord::set_value(1, 0.5)));
        assert_eq!(rx.pop().unwrap().kind, ChangeKind::StopGesture);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_full_channel_drops() {
        let (mut tx, mut rx) = channel(2);
        assert!(tx.push(ChangeRecord::set_value(0, 0.1)));
        assert!(tx.push(ChangeRecord::set_value(0, 0.2)));
        assert!(!tx.push(ChangeRecord::set_value(0, 0.3)));
        assert_eq!(tx.vacant(), 0);
        assert_eq!(rx.pop().unwrap().value, 0.1);
        assert!(tx.push(ChangeRecord::set_value(0, 0.4)));
        assert_eq!(rx.pop().unwrap().value, 0.2);
        assert_eq!(rx.pop().unwrap().value, 0.4);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (tx, _rx) = channel(0);
        assert_eq!(tx.capacity(), 1);
    }

    #[test]
    fn test_across_threads() {
        let (mut tx, mut rx) = channel(DEFAULT_CAPACITY);
        let producer = std::thread::spawn(move || {
            let mut sent = 0u32;
            while sent < 10_000 {
                if tx.push(ChangeRecord::set_value(sent, f64::from(sent))) {
                    sent += 1;
                } else {
                    std::thread::yield_now();
                }
            }
        });

        let mut expected = 0u32;
        while expected < 10_000 {
            match rx.pop() {
                Some(record) => {
                    assert_eq!(record.id, expected);
                    assert_eq!(record.value, f64::from(expected));
                    expected += 1;
                }
                None => std::thread::yield_now(),
            }
        }
        producer.join().unwrap();
    }
}
