//! Counting lock serialising access to a shared bus.
//!
//! [`BusLock`] wraps an `embassy-sync` [`FairSemaphore`], so waiters are
//! granted permits in arrival order and at most `WAITERS` tasks can queue.
//! Holding a permit is represented by a [`BusGuard`]; dropping the guard
//! releases the permit on every path, including early returns and
//! cancelled futures.

use core::cell::Cell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::semaphore::{FairSemaphore, Semaphore, SemaphoreReleaser};
use embassy_time::Duration;

use crate::error::{ConfigError, LockError};
use crate::runtime::sleep;

/// Counting lock with `capacity` permits and room for `WAITERS` waiters.
pub struct BusLock<M: RawMutex, const WAITERS: usize> {
    semaphore: FairSemaphore<M, WAITERS>,
    capacity: usize,
    holders: BlockingMutex<M, Cell<usize>>,
}

impl<M: RawMutex, const WAITERS: usize> BusLock<M, WAITERS> {
    /// Create a lock admitting `capacity` concurrent holders.
    ///
    /// `capacity` must lie in `1..=WAITERS`.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroLockCapacity);
        }
        if capacity > WAITERS {
            return Err(ConfigError::LockCapacityTooLarge {
                capacity,
                max: WAITERS,
            });
        }
        Ok(Self {
            semaphore: FairSemaphore::new(capacity),
            capacity,
            holders: BlockingMutex::new(Cell::new(0)),
        })
    }

    /// Wait until a permit is available.
    ///
    /// Fails with [`LockError::WaitQueueFull`] when `WAITERS` tasks are
    /// already queued.
    pub async fn acquire(&self) -> Result<BusGuard<'_, M, WAITERS>, LockError> {
        let permit = self
            .semaphore
            .acquire(1)
            .await
            .map_err(|_| LockError::WaitQueueFull)?;
        Ok(self.grant(permit))
    }

    /// Like [`acquire`](Self::acquire), giving up after `timeout`.
    pub async fn acquire_within(
        &self,
        timeout: Duration,
    ) -> Result<BusGuard<'_, M, WAITERS>, LockError> {
        match select(self.acquire(), sleep(timeout)).await {
            Either::First(result) => result,
            Either::Second(()) => Err(LockError::Timeout),
        }
    }

    /// Take a permit without waiting.
    pub fn try_acquire(&self) -> Option<BusGuard<'_, M, WAITERS>> {
        self.semaphore.try_acquire(1).map(|permit| self.grant(permit))
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.capacity - self.holders()
    }

    /// Guards currently alive.
    pub fn holders(&self) -> usize {
        self.holders.lock(Cell::get)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn grant<'a>(
        &'a self,
        permit: SemaphoreReleaser<'a, FairSemaphore<M, WAITERS>>,
    ) -> BusGuard<'a, M, WAITERS> {
        self.holders.lock(|h| h.set(h.get() + 1));
        BusGuard {
            lock: self,
            _permit: permit,
        }
    }
}

/// Proof of holding one permit of a [`BusLock`].
///
/// The holder count is decremented before the permit itself is returned,
/// so `available() + holders() == capacity()` holds whenever a task
/// observes it.
pub struct BusGuard<'a, M: RawMutex, const WAITERS: usize> {
    lock: &'a BusLock<M, WAITERS>,
    _permit: SemaphoreReleaser<'a, FairSemaphore<M, WAITERS>>,
}

impl<M: RawMutex, const WAITERS: usize> Drop for BusGuard<'_, M, WAITERS> {
    fn drop(&mut self) {
        self.lock.holders.lock(|h| h.set(h.get() - 1));
    }
}
