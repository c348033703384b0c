//! Bounded concurrency and rate limiting for directory synchronization
//!
//! This crate provides the two throttling mechanisms used by the sync engines:
//!
//! 1. **Slot pool** - a fixed number of slots that bounds how many units of work (file copies)
//!    may be in flight at once. Each pool is owned by one engine instance.
//! 2. **Operations throttle** - a process-wide token bucket limiting the number of directory
//!    entries processed per second.
//!
//! # Slot Pool
//!
//! A slot is acquired before a unit of work is spawned and travels with the task, the slot
//! is returned to the pool when the task drops it:
//!
//! ```rust,no_run
//! use throttle::SlotPool;
//!
//! # async fn example() {
//! let pool = SlotPool::new(5);
//! let slot = pool.acquire().await;
//! tokio::spawn(async move {
//!     let _slot = slot;
//!     // copy file here - the slot is released when `_slot` goes out of scope
//! });
//! # }
//! ```
//!
//! A pool created with capacity 0 is unbounded and never suspends the caller.
//!
//! # Operations Throttling
//!
//! ```rust,no_run
//! use throttle::{init_ops_tokens, run_ops_replenish_thread, get_ops_token};
//! use std::time::Duration;
//!
//! # async fn example() {
//! // 10 tokens / 100ms = 100 operations per second
//! init_ops_tokens(10);
//! tokio::spawn(run_ops_replenish_thread(10, Duration::from_millis(100)));
//!
//! // Acquire token before each operation
//! get_ops_token().await;
//! # }
//! ```
//!
//! When the throttle was never initialized (or initialized with 0) `get_ops_token` returns
//! immediately.

mod semaphore;

static OPS_THROTTLE: std::sync::LazyLock<semaphore::Semaphore> =
    std::sync::LazyLock::new(semaphore::Semaphore::new);

pub fn init_ops_tokens(ops_tokens: usize) {
    OPS_THROTTLE.setup(ops_tokens);
}

pub async fn get_ops_token() {
    OPS_THROTTLE.consume().await;
}

pub async fn run_ops_replenish_thread(replenish: usize, interval: std::time::Duration) {
    OPS_THROTTLE.run_replenish_thread(replenish, interval).await;
}

/// Occupied slot of a [`SlotPool`], freed on drop.
#[derive(Debug)]
pub struct Slot {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}

/// Fixed-capacity pool of slots bounding the number of concurrently running tasks.
#[derive(Clone)]
pub struct SlotPool {
    capacity: usize,
    sem: std::sync::Arc<semaphore::Semaphore>,
}

impl std::fmt::Debug for SlotPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotPool")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

impl SlotPool {
    /// Creates a pool with `capacity` slots, 0 means no limit.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sem: std::sync::Arc::new(semaphore::Semaphore::with_capacity(capacity)),
        }
    }

    /// Number of free slots, `None` for an unbounded pool.
    #[must_use]
    pub fn available(&self) -> Option<usize> {
        if self.sem.enabled() {
            Some(self.sem.available_permits())
        } else {
            None
        }
    }

    /// Waits until a slot is free and occupies it.
    pub async fn acquire(&self) -> Slot {
        Slot {
            _permit: self.sem.acquire_owned().await,
        }
    }
}
