use crate::error::{Result, StrokeError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Fixed-capacity circular store of the most recent samples of one channel.
///
/// Readers (`get_all`, `get_recent`, `len`, ...) share the lock and run
/// concurrently; `add` and `clear` take it exclusively. A reader therefore
/// sees the buffer either before or after a write, never an element that is
/// half overwritten.
pub struct RingBuffer<T> {
    inner: RwLock<Slots<T>>,
    capacity: usize,
    stats: RingBufferStats,
}

struct Slots<T> {
    items: Vec<Option<T>>,
    /// Physical index of the oldest element
    head: usize,
    len: usize,
}

/// Statistics for ring buffer monitoring
#[derive(Debug)]
pub struct RingBufferStats {
    /// Total items added
    pub items_pushed: AtomicU64,
    /// Items evicted to make room for newer ones
    pub items_overwritten: AtomicU64,
    /// Number of snapshot reads served
    pub snapshots_served: AtomicU64,
}

impl RingBufferStats {
    fn new() -> Self {
        Self {
            items_pushed: AtomicU64::new(0),
            items_overwritten: AtomicU64::new(0),
            snapshots_served: AtomicU64::new(0),
        }
    }

    /// Get current statistics as a snapshot
    pub fn snapshot(&self, len: usize, capacity: usize) -> RingBufferStatsSnapshot {
        RingBufferStatsSnapshot {
            items_pushed: self.items_pushed.load(Ordering::Relaxed),
            items_overwritten: self.items_overwritten.load(Ordering::Relaxed),
            snapshots_served: self.snapshots_served.load(Ordering::Relaxed),
            utilization_percent: (len * 100 / capacity) as u64,
        }
    }
}

/// Snapshot of ring buffer statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingBufferStatsSnapshot {
    pub items_pushed: u64,
    pub items_overwritten: u64,
    pub snapshots_served: u64,
    pub utilization_percent: u64,
}

impl<T: Clone> RingBuffer<T> {
    /// Create a new ring buffer holding at most `capacity` items
    ///
    /// # Example
    /// ```
    /// use strokesense::ring_buffer::RingBuffer;
    ///
    /// let buffer: RingBuffer<u32> = RingBuffer::new(500).unwrap();
    /// assert!(buffer.is_empty());
    /// ```
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(StrokeError::invalid_config(
                "Ring buffer capacity must be greater than 0",
            ));
        }

        let mut items = Vec::with_capacity(capacity);
        items.resize_with(capacity, || None);

        debug!("Created ring buffer with capacity {}", capacity);

        Ok(Self {
            inner: RwLock::new(Slots {
                items,
                head: 0,
                len: 0,
            }),
            capacity,
            stats: RingBufferStats::new(),
        })
    }

    /// Append an item, evicting the oldest one once the buffer is full
    pub fn add(&self, item: T) {
        let mut slots = self.inner.write();
        let capacity = self.capacity;

        if slots.len == capacity {
            let head = slots.head;
            slots.items[head] = Some(item);
            slots.head = (head + 1) % capacity;
            self.stats.items_overwritten.fetch_add(1, Ordering::Relaxed);
            trace!("Ring buffer full, overwrote slot {}", head);
        } else {
            let index = (slots.head + slots.len) % capacity;
            slots.items[index] = Some(item);
            slots.len += 1;
        }

        self.stats.items_pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy of every buffered item, oldest first
    pub fn get_all(&self) -> Vec<T> {
        let slots = self.inner.read();
        let out = (0..slots.len)
            .filter_map(|i| slots.items[(slots.head + i) % self.capacity].clone())
            .collect();
        self.stats.snapshots_served.fetch_add(1, Ordering::Relaxed);
        out
    }

    /// Copy of the `n` most recently added items, **newest first**.
    ///
    /// Note the order is the reverse of [`get_all`](Self::get_all).
    /// `n <= 0` yields an empty vector; `n` larger than the current length
    /// yields every item.
    pub fn get_recent(&self, n: isize) -> Vec<T> {
        if n <= 0 {
            return Vec::new();
        }

        let slots = self.inner.read();
        let take = (n as usize).min(slots.len);
        // Newest element sits at head + len - 1; walk backwards from there.
        let newest = slots.head + slots.len + self.capacity - 1;
        let out = (0..take)
            .filter_map(|i| slots.items[(newest - i) % self.capacity].clone())
            .collect();
        self.stats.snapshots_served.fetch_add(1, Ordering::Relaxed);
        out
    }

    /// The most recently added item
    pub fn latest(&self) -> Option<T> {
        self.get_recent(1).into_iter().next()
    }
}

impl<T> RingBuffer<T> {
    /// Drop every buffered item; capacity is unchanged
    pub fn clear(&self) {
        let mut slots = self.inner.write();
        slots.items.iter_mut().for_each(|slot| *slot = None);
        slots.head = 0;
        slots.len = 0;
        trace!("Ring buffer cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().len == 0
    }

    pub fn is_full(&self) -> bool {
        self.inner.read().len == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get current buffer statistics
    pub fn stats(&self) -> RingBufferStatsSnapshot {
        self.stats.snapshot(self.len(), self.capacity)
    }
}

/// Builder for ring buffers sized either directly or from a time span at a
/// nominal sampling rate
#[derive(Debug, Default)]
pub struct RingBufferBuilder {
    capacity: Option<usize>,
    duration: Option<Duration>,
    sample_rate_hz: Option<u32>,
}

impl RingBufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity explicitly
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Size the buffer to hold `duration` worth of samples
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn sample_rate_hz(mut self, rate: u32) -> Self {
        self.sample_rate_hz = Some(rate);
        self
    }

    /// Resolve the capacity this builder describes
    pub fn resolved_capacity(&self) -> Result<usize> {
        if let Some(capacity) = self.capacity {
            return Ok(capacity);
        }

        match (self.duration, self.sample_rate_hz) {
            (Some(duration), Some(rate)) => {
                Ok((duration.as_secs_f64() * rate as f64).round() as usize)
            }
            _ => Err(StrokeError::invalid_config(
                "Ring buffer needs a capacity or a duration and sample rate",
            )),
        }
    }

    pub fn build<T: Clone>(self) -> Result<RingBuffer<T>> {
        RingBuffer::new(self.resolved_capacity()?)
    }
}
