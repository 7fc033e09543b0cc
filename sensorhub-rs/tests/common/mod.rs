//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use embassy_futures::yield_now;
use embassy_time::MockDriver;
use sensorhub::{DisplayMessage, DisplaySink};
use sensorhub_drivers::{Binding, DataKind, Readings, Sensor, SensorError};

static CLOCK: Mutex<()> = Mutex::new(());

/// Exclusive access to the process-wide mock clock, reset to zero.
pub fn clock() -> (MutexGuard<'static, ()>, &'static MockDriver) {
    let guard = CLOCK.lock().unwrap_or_else(|e| e.into_inner());
    let driver = MockDriver::get();
    driver.reset();
    (guard, driver)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trace {
    /// A read started while `holders` bus permits were taken.
    Read { sensor: &'static str, holders: usize },
    ReadEnd(&'static str),
    SetChannel(u8),
}

#[derive(Debug)]
pub struct ScriptError;

/// A sensor whose behaviour is set by the test.
pub struct ScriptedSensor<'a> {
    name: &'static str,
    kind: DataKind,
    trace: &'a RefCell<Vec<Trace>>,
    bus_holders: Option<&'a dyn Fn() -> usize>,
    /// Answers for successive `has_new_data` calls; `true` once exhausted.
    pub ready: VecDeque<bool>,
    pub fail_reads: u32,
    /// Suspension points inside each read.
    pub read_yields: u32,
    pub channels: u8,
    pub channel: u8,
    pub binding: Option<Binding>,
    pub polls: u32,
    pub reads: u32,
}

impl<'a> ScriptedSensor<'a> {
    pub fn new(name: &'static str, kind: DataKind, trace: &'a RefCell<Vec<Trace>>) -> Self {
        Self {
            name,
            kind,
            trace,
            bus_holders: None,
            ready: VecDeque::new(),
            fail_reads: 0,
            read_yields: 0,
            channels: 0,
            channel: 0,
            binding: None,
            polls: 0,
            reads: 0,
        }
    }

    pub fn with_ready(mut self, script: &[bool]) -> Self {
        self.ready = script.iter().copied().collect();
        self
    }

    pub fn with_read_yields(mut self, yields: u32) -> Self {
        self.read_yields = yields;
        self
    }

    pub fn with_channels(mut self, channels: u8) -> Self {
        self.channels = channels;
        self
    }

    /// Record the bus lock's holder count at the start of every read.
    pub fn observe_bus(mut self, holders: &'a dyn Fn() -> usize) -> Self {
        self.bus_holders = Some(holders);
        self
    }
}

impl Sensor for ScriptedSensor<'_> {
    type BusError = ScriptError;

    async fn init(&mut self, kind: DataKind, binding: Binding) -> Result<(), SensorError<ScriptError>> {
        self.kind = kind;
        self.binding = Some(binding);
        Ok(())
    }

    fn has_new_data(&mut self) -> bool {
        self.polls += 1;
        self.ready.pop_front().unwrap_or(true)
    }

    async fn read(&mut self, readings: &mut Readings) -> Result<(), SensorError<ScriptError>> {
        let holders = self.bus_holders.map_or(0, |h| h());
        self.trace.borrow_mut().push(Trace::Read {
            sensor: self.name,
            holders,
        });
        for _ in 0..self.read_yields {
            yield_now().await;
        }
        self.trace.borrow_mut().push(Trace::ReadEnd(self.name));

        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(SensorError::Bus(ScriptError));
        }
        self.reads += 1;
        readings.overwrite(self.kind, self.channel, &[self.reads as f32]);
        Ok(())
    }

    fn channel_count(&self) -> u8 {
        self.channels
    }

    fn channel(&self) -> u8 {
        self.channel
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), SensorError<ScriptError>> {
        self.trace.borrow_mut().push(Trace::SetChannel(channel));
        if self.channels == 0 {
            return Err(SensorError::ChannelsUnsupported);
        }
        if channel >= self.channels {
            return Err(SensorError::InvalidChannel(channel));
        }
        self.channel = channel;
        Ok(())
    }
}

/// A sink keeping every rendered message.
pub struct RecordingSink<'a> {
    pub seen: &'a RefCell<Vec<DisplayMessage>>,
}

impl DisplaySink for RecordingSink<'_> {
    type Error = fmt::Error;

    fn render(&mut self, message: &DisplayMessage) -> Result<(), fmt::Error> {
        self.seen.borrow_mut().push(*message);
        Ok(())
    }
}

/// `fmt::Write` into a shared string, for `TextSink`.
pub struct SharedText<'a>(pub &'a RefCell<String>);

impl fmt::Write for SharedText<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.borrow_mut().push_str(s);
        Ok(())
    }
}
