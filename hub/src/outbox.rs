//! Bounded, drop-oldest send queue owned by a single connection.
//!
//! The hub coordinator is the only producer and the connection's writer is the
//! only consumer. When the queue is full the oldest undelivered frame is
//! evicted and counted, so a slow client ends up with a stale view of the
//! board instead of stalling the hub or growing without bound. Delivery is
//! lossy under load: clients that need every change must resync from the REST
//! API after reconnecting.

use axum::extract::ws::Utf8Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;

/// Result of handing a frame to an [`Outbox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// The frame was queued after evicting the oldest pending frame.
    EvictedOldest,
    /// The outbox has been closed; the frame was discarded.
    Closed,
}

#[derive(Debug)]
pub struct Outbox {
    queue: Mutex<VecDeque<Utf8Bytes>>,
    capacity: usize,
    ready: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl Outbox {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ready: Notify::new(),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn push(&self, frame: Utf8Bytes) -> Enqueued {
        if self.is_closed() {
            return Enqueued::Closed;
        }

        let evicted = {
            let mut queue = self.queue.lock();
            let evicted = if queue.len() >= self.capacity {
                queue.pop_front().is_some()
            } else {
                false
            };
            queue.push_back(frame);
            evicted
        };

        if evicted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.ready.notify_one();

        if evicted {
            Enqueued::EvictedOldest
        } else {
            Enqueued::Queued
        }
    }

    /// Waits for the next frame in FIFO order. Returns `None` once the outbox
    /// is closed, discarding anything still queued.
    ///
    /// Cancel safe: a frame is only removed from the queue by a call that returns it.
    pub async fn pop(&self) -> Option<Utf8Bytes> {
        loop {
            if self.is_closed() {
                return None;
            }
            let next = self.queue.lock().pop_front();
            if next.is_some() {
                return next;
            }
            self.ready.notified().await;
        }
    }

    pub fn try_pop(&self) -> Option<Utf8Bytes> {
        self.queue.lock().pop_front()
    }

    /// Removes and returns everything still queued, closed or not.
    pub fn drain(&self) -> Vec<Utf8Bytes> {
        self.queue.lock().drain(..).collect()
    }

    /// Stops delivery. Wakes the writer so it can exit.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.ready.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of frames evicted by the overflow policy so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
