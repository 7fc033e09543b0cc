//! Channel selection driven by up/down events.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use sensorhub_drivers::Sensor;

use crate::runtime::Event;
use crate::sensor_task::SensorSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Down,
}

/// What happens when a step would leave `0..count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelPolicy {
    /// Step past the last channel back to 0, and below 0 to the last.
    #[default]
    Wrap,
    /// Stay on the first or last channel.
    Clamp,
}

impl ChannelPolicy {
    /// The channel one step from `current`. `None` if the sensor has no
    /// channels.
    pub fn step(self, current: u8, direction: Direction, count: u8) -> Option<u8> {
        let requested = match direction {
            Direction::Up => i32::from(current) + 1,
            Direction::Down => i32::from(current) - 1,
        };
        self.resolve(requested, count)
    }

    /// Map an arbitrary requested index into `0..count`.
    pub fn resolve(self, requested: i32, count: u8) -> Option<u8> {
        if count == 0 {
            return None;
        }
        let count = i32::from(count);
        let channel = match self {
            ChannelPolicy::Wrap => requested.rem_euclid(count),
            ChannelPolicy::Clamp => requested.clamp(0, count - 1),
        };
        u8::try_from(channel).ok()
    }
}

/// The control task's state: one sensor, two events, one policy.
pub struct ChannelControl<'a, M: RawMutex, S: Sensor> {
    sensor: &'a SensorSlot<M, S>,
    up: &'a Event<M>,
    down: &'a Event<M>,
    policy: ChannelPolicy,
}

impl<'a, M: RawMutex, S: Sensor> ChannelControl<'a, M, S> {
    pub fn new(
        sensor: &'a SensorSlot<M, S>,
        up: &'a Event<M>,
        down: &'a Event<M>,
        policy: ChannelPolicy,
    ) -> Self {
        Self {
            sensor,
            up,
            down,
            policy,
        }
    }

    pub fn policy(&self) -> ChannelPolicy {
        self.policy
    }

    /// Wait for the next button event. Up wins when both are pending; the
    /// other stays signalled for the next wait.
    pub async fn next_direction(&self) -> Direction {
        match select(self.up.wait(), self.down.wait()).await {
            Either::First(()) => Direction::Up,
            Either::Second(()) => Direction::Down,
        }
    }

    /// Move the sensor's channel one step in `direction`.
    ///
    /// Returns the newly selected channel, or `None` when the sensor has no
    /// channels or rejected the change.
    pub async fn apply(&self, direction: Direction) -> Option<u8> {
        let mut sensor = self.sensor.lock().await;
        let current = sensor.channel();
        let Some(next) = self.policy.step(current, direction, sensor.channel_count()) else {
            warn!("control: sensor has no channels, ignoring {:?}", direction);
            return None;
        };
        match sensor.set_channel(next) {
            Ok(()) => {
                info!("control: channel {} -> {}", current, next);
                Some(next)
            }
            Err(e) => {
                warn!("control: set_channel({}) failed: {:?}", next, e.kind());
                None
            }
        }
    }

    /// Wait for one event and apply it.
    pub async fn handle_next(&self) -> Option<u8> {
        let direction = self.next_direction().await;
        self.apply(direction).await
    }
}

/// Task body: apply button events forever.
pub async fn control_task<M: RawMutex, S: Sensor>(control: ChannelControl<'_, M, S>) {
    info!("control task started ({:?})", control.policy);
    loop {
        control.handle_next().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::mutex::Mutex;
    use sensorhub_drivers::sim::{SimBus, SimDevice};
    use sensorhub_drivers::{Binding, ChipModel, DataKind, GyroSensor, TempSensor};
    use sensorhub_drivers::{GYRO_DEFAULT_ADDRESS, TEMP_DEFAULT_ADDRESS};

    #[test]
    fn wrap_steps() {
        let p = ChannelPolicy::Wrap;
        assert_eq!(p.step(0, Direction::Up, 3), Some(1));
        assert_eq!(p.step(2, Direction::Up, 3), Some(0));
        assert_eq!(p.step(0, Direction::Down, 3), Some(2));
        assert_eq!(p.resolve(-1, 3), Some(2));
        assert_eq!(p.resolve(7, 3), Some(1));
    }

    #[test]
    fn clamp_steps() {
        let p = ChannelPolicy::Clamp;
        assert_eq!(p.step(2, Direction::Up, 3), Some(2));
        assert_eq!(p.step(0, Direction::Down, 3), Some(0));
        assert_eq!(p.resolve(-1, 3), Some(0));
        assert_eq!(p.resolve(3, 3), Some(2));
    }

    #[test]
    fn zero_channels_yield_nothing() {
        for p in [ChannelPolicy::Wrap, ChannelPolicy::Clamp] {
            assert_eq!(p.step(0, Direction::Up, 0), None);
            assert_eq!(p.resolve(0, 0), None);
        }
    }

    #[test]
    fn single_channel_stays_put() {
        for p in [ChannelPolicy::Wrap, ChannelPolicy::Clamp] {
            assert_eq!(p.step(0, Direction::Up, 1), Some(0));
            assert_eq!(p.step(0, Direction::Down, 1), Some(0));
        }
    }

    #[test]
    fn apply_moves_temp_sensor_channel() {
        let bus = SimBus::new();
        bus.attach(SimDevice::temp_sensor(TEMP_DEFAULT_ADDRESS, ChipModel::Bmp280))
            .unwrap();
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);
        block_on(sensor.init(DataKind::Temperature, Binding::Edge)).unwrap();
        let slot: Mutex<NoopRawMutex, _> = Mutex::new(sensor);

        let up = Event::new();
        let down = Event::new();
        let control = ChannelControl::new(&slot, &up, &down, ChannelPolicy::Wrap);

        assert_eq!(block_on(control.apply(Direction::Up)), Some(1));
        assert_eq!(block_on(control.apply(Direction::Up)), Some(0));

        down.signal(());
        assert_eq!(block_on(control.handle_next()), Some(1));
    }

    #[test]
    fn apply_on_channelless_sensor_is_noop() {
        let bus = SimBus::new();
        bus.attach(SimDevice::gyro(GYRO_DEFAULT_ADDRESS)).unwrap();
        let sensor = GyroSensor::new(bus.i2c(), GYRO_DEFAULT_ADDRESS, bus.drdy_pin(GYRO_DEFAULT_ADDRESS));
        let slot: Mutex<NoopRawMutex, _> = Mutex::new(sensor);

        let up = Event::new();
        let down = Event::new();
        let control = ChannelControl::new(&slot, &up, &down, ChannelPolicy::Clamp);

        up.signal(());
        assert_eq!(block_on(control.handle_next()), None);
    }
}
