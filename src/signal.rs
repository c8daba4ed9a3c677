//! Replay-latest broadcast values.
//!
//! A [`Signal`] holds a single current value. Subscribers receive that value
//! immediately and then each subsequent update; a slow subscriber may skip
//! intermediate values but always converges on the latest one. Nothing is
//! queued, so a late subscriber never sees history.

use crate::error::Result;
use crate::ring_buffer::RingBuffer;
use chrono::Local;
use tokio::sync::watch;
use tracing::debug;

/// Single-slot latest-value store with subscriber notification
#[derive(Debug)]
pub struct Signal<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> Signal<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Replace the current value and notify subscribers
    pub fn set(&self, value: T) {
        // send_replace stores the value even when nobody is subscribed.
        self.sender.send_replace(value);
    }

    /// Update the value in place and notify subscribers
    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        self.sender.send_modify(f);
    }

    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> SignalReceiver<T> {
        SignalReceiver {
            receiver: self.sender.subscribe(),
            primed: false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Subscription to a [`Signal`]
#[derive(Debug)]
pub struct SignalReceiver<T> {
    receiver: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> SignalReceiver<T> {
    /// Next value: the current one on the first call, then each update.
    ///
    /// Returns `None` once the signal has been dropped.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            return Some(self.receiver.borrow_and_update().clone());
        }

        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Current value without waiting
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }
}

/// Bounded, timestamped diagnostic log published as one text value
pub struct Diagnostics {
    lines: RingBuffer<String>,
    text: Signal<String>,
}

impl Diagnostics {
    pub fn new(max_lines: usize) -> Result<Self> {
        Ok(Self {
            lines: RingBuffer::new(max_lines)?,
            text: Signal::new(String::new()),
        })
    }

    /// Append a line, dropping the oldest once the log is full
    pub fn push<S: AsRef<str>>(&self, line: S) {
        let stamped = format!("{} {}", Local::now().format("%H:%M:%S%.3f"), line.as_ref());
        debug!("diagnostic: {}", line.as_ref());
        // Add and republish under the signal's lock so concurrent pushes
        // cannot publish an older snapshot over a newer one.
        self.text.update(|text| {
            self.lines.add(stamped);
            *text = self.lines.get_all().join("\n");
        });
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.get_all()
    }

    pub fn text(&self) -> String {
        self.text.get()
    }

    pub fn subscribe(&self) -> SignalReceiver<String> {
        self.text.subscribe()
    }
}
