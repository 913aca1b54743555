//! Last-write-wins inputs and loop control.
//!
//! Producers push at any cadence; the engine samples once per tick. A burst
//! of updates collapses to the newest value and nothing ever blocks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};

/// A provider of the most recent value of an external scalar.
pub trait LatestValue {
    /// Newest value, or `None` if nothing has been published yet.
    fn latest(&mut self) -> Option<f64>;
}

/// Single atomic f64 slot shared between one or more writers and the engine.
///
/// Clones share the slot.
#[derive(Clone, Debug)]
pub struct SignalCell {
    bits: Arc<AtomicU64>,
    published: Arc<AtomicBool>,
}

impl SignalCell {
    /// Empty cell: `latest()` yields `None` until the first `set`.
    pub fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(0f64.to_bits())),
            published: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cell that already holds `value`.
    pub fn with_value(value: f64) -> Self {
        let cell = Self::new();
        cell.set(value);
        cell
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
        self.published.store(true, Ordering::Release);
    }

    pub fn get(&self) -> Option<f64> {
        if self.published.load(Ordering::Acquire) {
            Some(f64::from_bits(self.bits.load(Ordering::Acquire)))
        } else {
            None
        }
    }
}

impl Default for SignalCell {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestValue for SignalCell {
    fn latest(&mut self) -> Option<f64> {
        self.get()
    }
}

/// Constant input.
#[derive(Clone, Copy, Debug)]
pub struct Fixed(pub f64);

impl LatestValue for Fixed {
    fn latest(&mut self) -> Option<f64> {
        Some(self.0)
    }
}

/// Drains everything queued and keeps only the newest value.
/// A disconnected sender just stops producing updates.
impl LatestValue for Receiver<f64> {
    fn latest(&mut self) -> Option<f64> {
        let mut newest = None;
        loop {
            match self.try_recv() {
                Ok(v) => newest = Some(v),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return newest,
            }
        }
    }
}

/// Cooperative stop flag, checked between ticks.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Lower the flag again.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Decides when the next tick happens.
///
/// Returns `false` once the source is exhausted.
pub trait TickSource {
    fn next_tick(&mut self) -> bool;
}

/// Exactly `n` ticks, no waiting. Used for deterministic stepping.
#[derive(Clone, Copy, Debug)]
pub struct FixedTicks(pub u64);

impl TickSource for FixedTicks {
    fn next_tick(&mut self) -> bool {
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_cell_empty_until_set() {
        let mut cell = SignalCell::new();
        assert_eq!(cell.latest(), None);
        cell.set(0.25);
        assert_eq!(cell.latest(), Some(0.25));
    }

    #[test]
    fn test_cell_last_write_wins_across_clones() {
        let mut reader = SignalCell::with_value(0.1);
        let writer = reader.clone();
        writer.set(0.2);
        writer.set(0.9);
        assert_eq!(reader.latest(), Some(0.9));
        // Reading does not consume
        assert_eq!(reader.latest(), Some(0.9));
    }

    #[test]
    fn test_cell_written_from_other_thread() {
        let mut reader = SignalCell::new();
        let writer = reader.clone();
        std::thread::spawn(move || {
            for i in 0..100 {
                writer.set(i as f64 / 100.0);
            }
        })
        .join()
        .unwrap();
        assert_eq!(reader.latest(), Some(0.99));
    }

    #[test]
    fn test_receiver_collapses_burst() {
        let (tx, mut rx) = mpsc::channel();
        assert_eq!(rx.latest(), None);
        for v in [0.1, 0.4, 0.7] {
            tx.send(v).unwrap();
        }
        assert_eq!(rx.latest(), Some(0.7));
        assert_eq!(rx.latest(), None);
        drop(tx);
        assert_eq!(rx.latest(), None);
    }

    #[test]
    fn test_stop_handle_shared() {
        let handle = StopHandle::new();
        let remote = handle.clone();
        assert!(!handle.is_stopped());
        remote.stop();
        assert!(handle.is_stopped());
        handle.reset();
        assert!(!remote.is_stopped());
    }

    #[test]
    fn test_fixed_always_yields_its_value() {
        let mut source = Fixed(0.35);
        assert_eq!(source.latest(), Some(0.35));
        assert_eq!(source.latest(), Some(0.35));
    }

    #[test]
    fn test_fixed_ticks_exhausts() {
        let mut ticks = FixedTicks(2);
        assert!(ticks.next_tick());
        assert!(ticks.next_tick());
        assert!(!ticks.next_tick());
    }
}
