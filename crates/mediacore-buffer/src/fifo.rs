//! A bounded, closeable, async FIFO of frames
//!
//! `put` suspends while full, `take` suspends while empty; both are
//! ordinary `.await` points in the sense of §5's suspension-point list, not
//! OS-thread blocking. The core uses one producer and one consumer per
//! buffer, but correctness does not depend on that: every waiter is woken
//! by `notify_waiters`, and a woken task always rechecks the queue before
//! proceeding.

use crate::error::BufferError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

struct State<T> {
    queue: VecDeque<T>,
    closed: bool,
}

/// A FIFO of `T` with a fixed capacity, blocking `put`/`take` and a
/// `clear`/`close` pair for flush and teardown.
pub struct BoundedFrameBuffer<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_empty: Notify,
    not_full: Notify,
}

impl<T> BoundedFrameBuffer<T> {
    /// Creates a new buffer. `capacity` must be at least `1`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "bounded frame buffer capacity must be >= 1");
        Self {
            capacity,
            state: Mutex::new(State {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    /// Inserts `item`, suspending while the buffer is full. Fails if the
    /// buffer has been closed, whether before or while waiting.
    pub async fn put(&self, item: T) -> Result<(), BufferError> {
        let mut pending = Some(item);
        loop {
            // Register as a waiter (`enable`) before checking state, so a
            // `clear`/`close` that fires `notify_waiters` between the check
            // and the `.await` below isn't missed (`Notified` only counts
            // as registered once polled, and `notify_waiters` stores no
            // permit the way `notify_one` does).
            let notified = self.not_full.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(BufferError::Closed);
                }
                if state.queue.len() < self.capacity {
                    state.queue.push_back(pending.take().expect("item consumed once"));
                    drop(state);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    /// Removes and returns the head element, suspending while the buffer is
    /// empty. Fails once the buffer is closed and drained.
    pub async fn take(&self) -> Result<T, BufferError> {
        loop {
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.state.lock();
                if let Some(item) = state.queue.pop_front() {
                    drop(state);
                    self.not_full.notify_one();
                    return Ok(item);
                }
                if state.closed {
                    return Err(BufferError::Closed);
                }
            }
            notified.await;
        }
    }

    /// Atomically discards all buffered contents. Does not close the
    /// buffer; waiting producers are woken to recheck capacity.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.queue.clear();
        drop(state);
        self.not_full.notify_waiters();
    }

    /// Wakes every blocked `put`/`take` with [`BufferError::Closed`].
    /// Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.not_empty.notify_waiters();
        self.not_full.notify_waiters();
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Current number of buffered elements.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether the buffer currently holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The buffer's fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
