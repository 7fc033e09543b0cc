//! Error types for the hub core.

use core::fmt;

use crate::message::TaskId;

/// Composition errors. All of them are fatal: bootstrap reports the error
/// and never starts scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Two tasks were given the same priority.
    DuplicatePriority(u8),
    /// A task id was spawned twice.
    DuplicateTask(TaskId),
    /// The task table is full.
    TooManyTasks,
    /// A poll-driven sensor was configured with a zero interval.
    ZeroPollInterval,
    /// A bus lock must admit at least one holder.
    ZeroLockCapacity,
    /// The initial capacity exceeds the lock's waiter bound.
    LockCapacityTooLarge { capacity: usize, max: usize },
    /// The scheduler tick must be non-zero.
    ZeroTick,
    /// A duration in milliseconds does not fit the time base.
    DurationOutOfRange { millis: u64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::DuplicatePriority(p) => write!(f, "priority {} used by more than one task", p),
            ConfigError::DuplicateTask(id) => write!(f, "task {} spawned twice", id.0),
            ConfigError::TooManyTasks => write!(f, "task table is full"),
            ConfigError::ZeroPollInterval => write!(f, "poll interval must be non-zero"),
            ConfigError::ZeroLockCapacity => write!(f, "bus lock capacity must be non-zero"),
            ConfigError::LockCapacityTooLarge { capacity, max } => {
                write!(f, "bus lock capacity {} exceeds maximum {}", capacity, max)
            }
            ConfigError::ZeroTick => write!(f, "tick period must be non-zero"),
            ConfigError::DurationOutOfRange { millis } => {
                write!(f, "duration of {} ms is out of range", millis)
            }
        }
    }
}

impl core::error::Error for ConfigError {}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::DuplicatePriority(p) => defmt::write!(f, "duplicate priority {}", p),
            ConfigError::DuplicateTask(id) => defmt::write!(f, "duplicate task {}", id.0),
            ConfigError::TooManyTasks => defmt::write!(f, "too many tasks"),
            ConfigError::ZeroPollInterval => defmt::write!(f, "zero poll interval"),
            ConfigError::ZeroLockCapacity => defmt::write!(f, "zero lock capacity"),
            ConfigError::LockCapacityTooLarge { capacity, max } => {
                defmt::write!(f, "lock capacity {} > {}", capacity, max)
            }
            ConfigError::ZeroTick => defmt::write!(f, "zero tick"),
            ConfigError::DurationOutOfRange { millis } => {
                defmt::write!(f, "duration {} ms out of range", millis)
            }
        }
    }
}

/// Failure to obtain the bus lock. Transient: the task retries on its next
/// wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockError {
    /// The bounded wait elapsed before a permit was granted.
    Timeout,
    /// Every waiter slot of the lock is taken.
    WaitQueueFull,
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LockError::Timeout => write!(f, "timed out waiting for the bus lock"),
            LockError::WaitQueueFull => write!(f, "bus lock wait queue is full"),
        }
    }
}

impl core::error::Error for LockError {}

/// Failure to post a display message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PostError {
    /// The queue had no free slot and the outbox drops on full.
    Full,
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PostError::Full => write!(f, "display queue is full"),
        }
    }
}

impl core::error::Error for PostError {}
