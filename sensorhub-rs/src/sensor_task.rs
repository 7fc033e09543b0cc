//! The shared sensor task procedure.
//!
//! Every sensor instance runs the same state machine, parameterised by a
//! [`SensorContext`]:
//!
//! ```text
//! wait(binding) -> [poll: has_new_data?] -> acquire bus -> read -> release bus -> post
//! ```
//!
//! Read failures and lock failures skip the cycle; nothing is published and
//! the bus lock is never left held.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Duration;
use sensorhub_drivers::{Binding, DataKind, Readings, Sensor, SensorError, SensorErrorKind};

use crate::bus_lock::BusLock;
use crate::error::{LockError, PostError};
use crate::message::{DisplayMessage, Outbox, TaskId};
use crate::runtime::{sleep, Event};

/// A sensor shared between its sensor task (reads) and the control task
/// (channel changes). Both hold the slot lock while touching the sensor,
/// so a channel change never lands in the middle of a read.
pub type SensorSlot<M, S> = Mutex<M, S>;

/// How a sensor task learns that data may be available.
pub enum Notification<'a, M: RawMutex> {
    /// Edge-driven: an interrupt handler signals the event.
    Event(&'a Event<M>),
    /// Time-driven: wake every interval and ask the sensor.
    Poll(Duration),
}

impl<M: RawMutex> Notification<'_, M> {
    /// The driver-facing view of this binding.
    pub fn binding(&self) -> Binding {
        match self {
            Notification::Event(_) => Binding::Edge,
            Notification::Poll(interval) => Binding::Poll {
                interval_ms: u32::try_from(interval.as_millis()).unwrap_or(u32::MAX),
            },
        }
    }

    pub fn is_poll(&self) -> bool {
        matches!(self, Notification::Poll(_))
    }

    async fn wait(&self) {
        match self {
            Notification::Event(event) => event.wait().await,
            Notification::Poll(interval) => sleep(*interval).await,
        }
    }
}

/// Result of one pass of the sensor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Poll-driven sensor reported no new data. No bus access took place.
    NoData,
    /// Readings were posted to the display queue.
    Published,
    /// Readings were read but the queue was full.
    Dropped,
    /// The read failed; the lock was released and nothing was posted.
    ReadFailed(SensorErrorKind),
    /// The bounded wait for the bus lock elapsed.
    LockTimeout,
    /// The bus lock's wait queue was full.
    LockBusy,
}

/// Per-instance state of a sensor task.
pub struct SensorContext<'a, M: RawMutex, S: Sensor> {
    id: TaskId,
    consumer: TaskId,
    sensor: &'a SensorSlot<M, S>,
    notification: Notification<'a, M>,
    readings: Readings,
    sequence: u32,
    lock_timeout: Option<Duration>,
}

impl<'a, M: RawMutex, S: Sensor> SensorContext<'a, M, S> {
    /// `id` is the task running this context, `consumer` the display task
    /// its readings go to.
    pub fn new(
        id: TaskId,
        consumer: TaskId,
        sensor: &'a SensorSlot<M, S>,
        notification: Notification<'a, M>,
    ) -> Self {
        Self {
            id,
            consumer,
            sensor,
            notification,
            readings: Readings::default(),
            sequence: 0,
            lock_timeout: None,
        }
    }

    /// Bound every wait for the bus lock by `timeout`.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Configure the sensor for `kind` and this context's binding.
    ///
    /// Runs once during bootstrap, before the scheduler starts, so the
    /// identification transfers do not contend for the bus.
    pub async fn init(&self, kind: DataKind) -> Result<(), SensorError<S::BusError>> {
        let binding = self.notification.binding();
        self.sensor.lock().await.init(kind, binding).await?;
        info!("task {}: sensor ready for {}", self.id.0, kind.label());
        Ok(())
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn consumer(&self) -> TaskId {
        self.consumer
    }

    /// The buffer most recently filled by a read.
    pub fn readings(&self) -> &Readings {
        &self.readings
    }

    /// Sequence number the next message will carry.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Run one pass of the state machine.
    pub async fn run_cycle<const W: usize>(
        &mut self,
        bus: &BusLock<M, W>,
        outbox: &Outbox<'_>,
    ) -> CycleOutcome {
        self.notification.wait().await;

        if self.notification.is_poll() && !self.sensor.lock().await.has_new_data() {
            trace!("task {}: no new data", self.id.0);
            return CycleOutcome::NoData;
        }

        let acquired = match self.lock_timeout {
            Some(timeout) => bus.acquire_within(timeout).await,
            None => bus.acquire().await,
        };
        let guard = match acquired {
            Ok(guard) => guard,
            Err(LockError::Timeout) => {
                warn!("task {}: bus lock timed out", self.id.0);
                return CycleOutcome::LockTimeout;
            }
            Err(LockError::WaitQueueFull) => {
                warn!("task {}: bus lock wait queue full", self.id.0);
                return CycleOutcome::LockBusy;
            }
        };

        let result = {
            let mut sensor = self.sensor.lock().await;
            sensor.read(&mut self.readings).await
        };
        drop(guard);

        if let Err(e) = result {
            warn!("task {}: read failed: {:?}", self.id.0, e.kind());
            return CycleOutcome::ReadFailed(e.kind());
        }

        let message = DisplayMessage::new(self.id, self.sequence, self.readings);
        self.sequence = self.sequence.wrapping_add(1);

        match outbox.post(message).await {
            Ok(()) => {
                debug!("task {}: posted #{} to task {}", self.id.0, message.sequence, self.consumer.0);
                CycleOutcome::Published
            }
            Err(PostError::Full) => {
                warn!("task {}: display queue full, dropped #{}", self.id.0, message.sequence);
                CycleOutcome::Dropped
            }
        }
    }
}

/// Task body: run [`SensorContext::run_cycle`] forever.
pub async fn sensor_task<M: RawMutex, S: Sensor, const W: usize>(
    mut ctx: SensorContext<'_, M, S>,
    bus: &BusLock<M, W>,
    outbox: &Outbox<'_>,
) {
    info!("task {}: sensor task started", ctx.id.0);
    loop {
        ctx.run_cycle(bus, outbox).await;
    }
}
