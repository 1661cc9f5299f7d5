//! Fixed-capacity pool of reusable raw video-frame storage
//!
//! Avoids a per-frame allocation of a (potentially large) video buffer and
//! bounds the engine's total video memory to `capacity * block_size`.

use crate::error::PoolError;
use mediacore_types::RawVideoData;
use parking_lot::Mutex;
use tokio::sync::Notify;

struct State {
    free: Vec<RawVideoData>,
    outstanding: usize,
    closed: bool,
}

/// A fixed-size pool of `block_size`-byte [`RawVideoData`] blocks.
pub struct Pool {
    capacity: usize,
    block_size: usize,
    state: Mutex<State>,
    not_empty: Notify,
}

impl Pool {
    /// Creates a pool of `capacity` blocks, each `block_size` bytes.
    pub fn new(capacity: usize, block_size: usize) -> Self {
        assert!(capacity >= 1, "pool capacity must be >= 1");
        let free = (0..capacity).map(|_| RawVideoData::new(block_size)).collect();
        Self {
            capacity,
            block_size,
            state: Mutex::new(State {
                free,
                outstanding: 0,
                closed: false,
            }),
            not_empty: Notify::new(),
        }
    }

    /// Acquires a free block, suspending while the pool is exhausted.
    pub async fn acquire(&self) -> Result<RawVideoData, PoolError> {
        loop {
            // Register before checking state (see `BoundedFrameBuffer::put`)
            // so a `reset`/`close` racing the check-unlock window isn't
            // missed by `notify_waiters`.
            let notified = self.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(PoolError::Closed);
                }
                if let Some(block) = state.free.pop() {
                    state.outstanding += 1;
                    return Ok(block);
                }
            }
            notified.await;
        }
    }

    /// Returns a previously acquired block to the free list. Releasing a
    /// block that did not come from this pool (wrong size) is a programming
    /// error and panics, matching the spec's "programming error" framing.
    pub fn release(&self, block: RawVideoData) {
        assert_eq!(
            block.capacity(),
            self.block_size,
            "released a block that was never acquired from this pool"
        );
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.free.push(block);
        state.outstanding = state.outstanding.saturating_sub(1);
        drop(state);
        self.not_empty.notify_one();
    }

    /// Returns all outstanding blocks to the free list, restoring the pool
    /// to full capacity. Callers must guarantee no acquirer holds a block
    /// at reset time (e.g. by having stopped the buffer loop first).
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.free = (0..self.capacity)
            .map(|_| RawVideoData::new(self.block_size))
            .collect();
        state.outstanding = 0;
        drop(state);
        self.not_empty.notify_waiters();
    }

    /// Frees all blocks; subsequent operations fail. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.free.clear();
        drop(state);
        self.not_empty.notify_waiters();
    }

    /// Number of blocks currently outstanding (acquired but not released).
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Number of blocks currently on the free list.
    pub fn available(&self) -> usize {
        self.state.lock().free.len()
    }

    /// The pool's fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The byte size of each block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
