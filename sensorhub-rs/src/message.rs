//! Display messages and the producer end of the display queue.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, DynamicSender, TrySendError};
use sensorhub_drivers::{DataKind, Readings};

use crate::config::QueueFullPolicy;
use crate::error::PostError;

/// Identity of a task, assigned by the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(pub u8);

/// One set of readings on its way to the display task.
///
/// Copied into the queue on post and out of it on receive; producer and
/// consumer never share a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayMessage {
    pub kind: DataKind,
    pub readings: Readings,
    pub source: TaskId,
    /// Per-producer counter. Gaps mean messages were dropped.
    pub sequence: u32,
}

impl DisplayMessage {
    pub fn new(source: TaskId, sequence: u32, readings: Readings) -> Self {
        Self {
            kind: readings.kind(),
            readings,
            source,
            sequence,
        }
    }
}

/// Bounded FIFO of display messages.
pub type DisplayQueue<M, const N: usize> = Channel<M, DisplayMessage, N>;

/// A producer's handle on the display queue.
///
/// Applies the configured [`QueueFullPolicy`] and keeps per-producer
/// counters. Each producer task owns one outbox.
pub struct Outbox<'a> {
    sender: DynamicSender<'a, DisplayMessage>,
    policy: QueueFullPolicy,
    posted: Cell<u32>,
    dropped: Cell<u32>,
}

impl<'a> Outbox<'a> {
    pub fn new<M: RawMutex, const N: usize>(
        queue: &'a DisplayQueue<M, N>,
        policy: QueueFullPolicy,
    ) -> Self {
        Self {
            sender: queue.sender().into(),
            policy,
            posted: Cell::new(0),
            dropped: Cell::new(0),
        }
    }

    /// Post `message`.
    ///
    /// Under [`QueueFullPolicy::Block`] this suspends until a slot is
    /// free and always succeeds. Under [`QueueFullPolicy::Drop`] a full
    /// queue discards the message and returns [`PostError::Full`].
    pub async fn post(&self, message: DisplayMessage) -> Result<(), PostError> {
        match self.policy {
            QueueFullPolicy::Block => self.sender.send(message).await,
            QueueFullPolicy::Drop => {
                if let Err(TrySendError::Full(_)) = self.sender.try_send(message) {
                    self.dropped.set(self.dropped.get().wrapping_add(1));
                    return Err(PostError::Full);
                }
            }
        }
        self.posted.set(self.posted.get().wrapping_add(1));
        Ok(())
    }

    pub fn policy(&self) -> QueueFullPolicy {
        self.policy
    }

    /// Messages accepted by the queue.
    pub fn posted(&self) -> u32 {
        self.posted.get()
    }

    /// Messages discarded because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.get()
    }
}
