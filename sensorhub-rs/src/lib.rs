//! Task/event/message/bus-lock composition for a small sensor hub.
//!
//! Several sensors share one hardware bus. Each sensor is driven by its own
//! task running the same procedure: wait for an interrupt event or a poll
//! interval, take the bus lock, read, release, and post the readings to the
//! display task through a bounded message queue. A control task moves the
//! channel of one sensor in response to up/down events.
//!
//! # Architecture
//!
//! - **[`bus_lock`]**: counting lock serialising access to the shared bus.
//! - **[`sensor_task`]**: the shared sensor task procedure.
//! - **[`control_task`]**: channel selection on up/down events.
//! - **[`display_task`]**: the single consumer of display messages.
//! - **[`layout`]**: frame-buffer rendering with `embedded-graphics`.
//! - **[`message`]**: display messages and the producer side of the queue.
//! - **[`runtime`]**: the cooperative, priority-ordered task table.
//! - **[`config`]**: compile-time constants and the validated [`HubConfig`].
//!
//! Everything is generic over an `embassy-sync` raw mutex: `NoopRawMutex`
//! for single-threaded hosts, `CriticalSectionRawMutex` where events are
//! signalled from interrupt handlers.
//!
//! # Features
//!
//! - **`defmt`**: [`defmt::Format`] implementations and `defmt` logging.
//! - **`tracing`**: logging through `tracing` events.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod bus_lock;
pub mod config;
pub mod control_task;
pub mod display_task;
pub mod error;
pub mod layout;
pub mod message;
pub mod runtime;
pub mod sensor_task;

pub use bus_lock::{BusGuard, BusLock};
pub use config::{HubConfig, QueueFullPolicy};
pub use control_task::{control_task, ChannelControl, ChannelPolicy, Direction};
pub use display_task::{display_task, format_message, DisplaySink, TextSink};
pub use error::{ConfigError, LockError, PostError};
pub use layout::{DisplayConfig, DisplayState, FrameSink};
pub use message::{DisplayMessage, DisplayQueue, Outbox, TaskId};
pub use runtime::{sleep, Event, Runtime, Sleep, TaskSpec};
pub use sensor_task::{sensor_task, CycleOutcome, Notification, SensorContext, SensorSlot};
