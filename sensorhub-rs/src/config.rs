//! Compile-time constants and the runtime [`HubConfig`].

use embassy_time::Duration;

use crate::control_task::ChannelPolicy;
use crate::error::ConfigError;
use crate::message::TaskId;

// ---------------------------------------------------------------------------
// Compile-time constants
// ---------------------------------------------------------------------------

/// Slots in the display message queue.
pub const DISPLAY_QUEUE_CAPACITY: usize = 5;

/// Maximum number of tasks that may wait on the bus lock at once.
pub const BUS_LOCK_WAITERS: usize = 10;

/// Concurrent holders of the I2C bus.
pub const BUS_LOCK_CAPACITY: usize = 1;

/// Capacity of the task table used by the default composition.
pub const MAX_TASKS: usize = 8;

pub const TEMP_TASK: TaskId = TaskId(1);
pub const GYRO_TASK: TaskId = TaskId(2);
pub const CONTROL_TASK: TaskId = TaskId(3);
pub const DISPLAY_TASK: TaskId = TaskId(4);

/// Lower number runs first within a scheduler pass.
pub const TEMP_TASK_PRIORITY: u8 = 10;
pub const GYRO_TASK_PRIORITY: u8 = 20;
pub const CONTROL_TASK_PRIORITY: u8 = 30;
pub const DISPLAY_TASK_PRIORITY: u8 = 100;

pub const POLL_INTERVAL_MS: u64 = 500;
pub const TICK_MS: u64 = 10;

const _: () = assert!(DISPLAY_QUEUE_CAPACITY > 0);
const _: () = assert!(BUS_LOCK_CAPACITY > 0 && BUS_LOCK_CAPACITY <= BUS_LOCK_WAITERS);

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// What a producer does when the display queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueFullPolicy {
    /// Suspend until the consumer frees a slot.
    #[default]
    Block,
    /// Discard the message and count the loss.
    Drop,
}

/// Runtime parameters of the composition.
///
/// [`HubConfig::default()`] reproduces the compile-time constants above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    pub temp_priority: u8,
    pub gyro_priority: u8,
    pub control_priority: u8,
    pub display_priority: u8,
    /// Wake period of poll-driven sensors.
    pub poll_interval: Duration,
    /// Simulated time that elapses per scheduler pass.
    pub tick: Duration,
    /// Concurrent holders admitted by the bus lock.
    pub bus_capacity: usize,
    /// Bound on a sensor task's wait for the bus lock. `None` waits forever.
    pub lock_timeout: Option<Duration>,
    pub queue_policy: QueueFullPolicy,
    pub channel_policy: ChannelPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            temp_priority: TEMP_TASK_PRIORITY,
            gyro_priority: GYRO_TASK_PRIORITY,
            control_priority: CONTROL_TASK_PRIORITY,
            display_priority: DISPLAY_TASK_PRIORITY,
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            tick: Duration::from_millis(TICK_MS),
            bus_capacity: BUS_LOCK_CAPACITY,
            lock_timeout: None,
            queue_policy: QueueFullPolicy::default(),
            channel_policy: ChannelPolicy::default(),
        }
    }
}

impl HubConfig {
    /// Check the configuration before any task is created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let priorities = [
            self.temp_priority,
            self.gyro_priority,
            self.control_priority,
            self.display_priority,
        ];
        for (i, p) in priorities.iter().enumerate() {
            if priorities[i + 1..].contains(p) {
                return Err(ConfigError::DuplicatePriority(*p));
            }
        }
        if self.poll_interval.as_ticks() == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.tick.as_ticks() == 0 {
            return Err(ConfigError::ZeroTick);
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::ZeroLockCapacity);
        }
        if self.bus_capacity > BUS_LOCK_WAITERS {
            return Err(ConfigError::LockCapacityTooLarge {
                capacity: self.bus_capacity,
                max: BUS_LOCK_WAITERS,
            });
        }
        Ok(())
    }
}
