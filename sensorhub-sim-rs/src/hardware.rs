//! Simulated hardware activity between scheduler passes.
//!
//! Stands in for the interrupt handlers of a real board: latches new
//! samples into the simulated devices, signals the temperature sensor's
//! event and presses the channel buttons on a schedule.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use sensorhub::Event;
use sensorhub_drivers::sim::SimBus;
use sensorhub_drivers::{GYRO_DEFAULT_ADDRESS, TEMP_DEFAULT_ADDRESS};

/// Ticks between environmental conversions.
const ENV_PERIOD_TICKS: u32 = 100;
/// Ticks between gyroscope output updates.
const GYRO_PERIOD_TICKS: u32 = 20;

pub struct Stimulus<'a> {
    bus: &'a SimBus,
    temp_ready: &'a Event<NoopRawMutex>,
    up: &'a Event<NoopRawMutex>,
    down: &'a Event<NoopRawMutex>,
    button_every: u32,
    tick_ms: u64,
    presses: u32,
}

impl<'a> Stimulus<'a> {
    pub fn new(
        bus: &'a SimBus,
        temp_ready: &'a Event<NoopRawMutex>,
        up: &'a Event<NoopRawMutex>,
        down: &'a Event<NoopRawMutex>,
        button_every: u32,
        tick_ms: u64,
    ) -> Self {
        Self {
            bus,
            temp_ready,
            up,
            down,
            button_every,
            tick_ms,
            presses: 0,
        }
    }

    /// Everything the hardware does during tick `tick`.
    pub fn service(&mut self, tick: u32) {
        let seconds = (u64::from(tick) * self.tick_ms) as f32 / 1000.0;

        if tick % ENV_PERIOD_TICKS == 0 {
            let environment = [
                21.0 + 2.0 * (seconds / 10.0).sin(),
                101_325.0 + 50.0 * (seconds / 30.0).sin(),
                45.0 + 5.0 * (seconds / 20.0).cos(),
            ];
            self.bus.push_environment(TEMP_DEFAULT_ADDRESS, environment);
            // Data-ready interrupt of the environmental sensor.
            self.temp_ready.signal(());
            tracing::trace!(tick, "environment sample latched");
        }

        if tick % GYRO_PERIOD_TICKS == 0 {
            let rates = [
                30.0 * (seconds * 2.0).sin(),
                15.0 * (seconds * 1.5).cos(),
                -5.0,
            ];
            self.bus.push_angular_rate(GYRO_DEFAULT_ADDRESS, rates);
        }

        if self.button_every > 0 && tick > 0 && tick % self.button_every == 0 {
            // Two steps up, one step down.
            if self.presses % 3 == 2 {
                self.down.signal(());
                tracing::debug!(tick, "button: down");
            } else {
                self.up.signal(());
                tracing::debug!(tick, "button: up");
            }
            self.presses += 1;
        }
    }

    pub fn presses(&self) -> u32 {
        self.presses
    }
}
