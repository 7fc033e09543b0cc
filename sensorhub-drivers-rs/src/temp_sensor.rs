//! Environmental sensor driver (BME280 / BMP280 family).
//!
//! [`TempSensor`] reports one quantity at a time. The selected channel
//! decides which: temperature, pressure or (BME280 only) humidity.

use embedded_hal_async::i2c::I2c;

use crate::capability::{Binding, DataKind, Readings, Sensor};
use crate::driver::RegisterDriver;
use crate::error::SensorError;
use crate::registers::{
    CHIP_ID_BME280, CHIP_ID_BMP280, TEMP_CHANNEL_STRIDE, TEMP_FIXED_POINT_SCALE,
    TEMP_INT_DRDY_EN, TEMP_REG_CHIP_ID, TEMP_REG_DATA, TEMP_REG_INT_CTRL,
};

/// Quantity measured on each channel, indexed by channel number.
const CHANNEL_KINDS: [DataKind; 3] = [DataKind::Temperature, DataKind::Pressure, DataKind::Humidity];

/// Chip variant detected at [`Sensor::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipModel {
    /// Temperature, pressure and humidity.
    Bme280,
    /// Temperature and pressure only.
    Bmp280,
}

impl ChipModel {
    /// Map a `CHIP_ID` register value to a model.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            CHIP_ID_BME280 => Some(ChipModel::Bme280),
            CHIP_ID_BMP280 => Some(ChipModel::Bmp280),
            _ => None,
        }
    }

    pub fn chip_id(self) -> u8 {
        match self {
            ChipModel::Bme280 => CHIP_ID_BME280,
            ChipModel::Bmp280 => CHIP_ID_BMP280,
        }
    }

    pub fn channel_count(self) -> u8 {
        match self {
            ChipModel::Bme280 => 3,
            ChipModel::Bmp280 => 2,
        }
    }

    /// Channel producing `kind`, if this model measures it.
    pub fn channel_of(self, kind: DataKind) -> Option<u8> {
        CHANNEL_KINDS
            .iter()
            .take(self.channel_count() as usize)
            .position(|&k| k == kind)
            .map(|ch| ch as u8)
    }
}

/// Environmental sensor over I2C.
///
/// # Example
///
/// ```no_run
/// use sensorhub_drivers::{Binding, DataKind, Readings, Sensor, TempSensor, TEMP_DEFAULT_ADDRESS};
///
/// # async fn example(i2c: impl embedded_hal_async::i2c::I2c) {
/// let mut sensor = TempSensor::new(i2c, TEMP_DEFAULT_ADDRESS);
/// sensor.init(DataKind::Temperature, Binding::Edge).await.unwrap();
///
/// let mut readings = Readings::default();
/// sensor.read(&mut readings).await.unwrap();
/// # }
/// ```
pub struct TempSensor<I2C> {
    driver: RegisterDriver<I2C>,
    model: Option<ChipModel>,
    channel: u8,
}

impl<I2C> TempSensor<I2C>
where
    I2C: I2c,
{
    /// Create an unconfigured sensor. No bus traffic is generated until
    /// [`Sensor::init`] is called.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            driver: RegisterDriver::new(i2c, address),
            model: None,
            channel: 0,
        }
    }

    /// Model detected by `init`, or `None` before a successful `init`.
    pub fn model(&self) -> Option<ChipModel> {
        self.model
    }
}

impl<I2C> Sensor for TempSensor<I2C>
where
    I2C: I2c,
{
    type BusError = I2C::Error;

    async fn init(
        &mut self,
        kind: DataKind,
        binding: Binding,
    ) -> Result<(), SensorError<I2C::Error>> {
        let id = self.driver.read_u8(TEMP_REG_CHIP_ID).await?;
        let model = ChipModel::from_id(id).ok_or(SensorError::UnknownChip(id))?;
        let channel = model
            .channel_of(kind)
            .ok_or(SensorError::UnsupportedKind(kind))?;

        // Only edge-driven instances want the INT pin toggling.
        let int_ctrl = if binding.is_edge() { TEMP_INT_DRDY_EN } else { 0 };
        self.driver.write_u8(TEMP_REG_INT_CTRL, int_ctrl).await?;

        self.model = Some(model);
        self.channel = channel;
        debug!("env sensor: {:?} on channel {}", model, channel);
        Ok(())
    }

    async fn read(&mut self, readings: &mut Readings) -> Result<(), SensorError<I2C::Error>> {
        if self.model.is_none() {
            return Err(SensorError::NotInitialized);
        }

        let register = TEMP_REG_DATA + self.channel * TEMP_CHANNEL_STRIDE;
        let raw = self.driver.read_i32_be(register).await?;

        let kind = CHANNEL_KINDS[self.channel as usize];
        readings.overwrite(kind, self.channel, &[raw as f32 / TEMP_FIXED_POINT_SCALE]);
        Ok(())
    }

    fn channel_count(&self) -> u8 {
        self.model.map_or(0, ChipModel::channel_count)
    }

    fn channel(&self) -> u8 {
        self.channel
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), SensorError<I2C::Error>> {
        let model = self.model.ok_or(SensorError::NotInitialized)?;
        if channel >= model.channel_count() {
            return Err(SensorError::InvalidChannel(channel));
        }
        self.channel = channel;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::registers::TEMP_DEFAULT_ADDRESS;
    use crate::sim::{SimBus, SimDevice};

    fn bus_with(model: ChipModel) -> SimBus {
        let bus = SimBus::new();
        bus.attach(SimDevice::temp_sensor(TEMP_DEFAULT_ADDRESS, model))
            .unwrap();
        bus
    }

    #[test]
    fn init_detects_bme280() {
        let bus = bus_with(ChipModel::Bme280);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);

        block_on(sensor.init(DataKind::Temperature, Binding::Edge)).unwrap();

        assert_eq!(sensor.model(), Some(ChipModel::Bme280));
        assert_eq!(sensor.channel_count(), 3);
        assert_eq!(sensor.channel(), 0);
    }

    #[test]
    fn init_rejects_unknown_chip() {
        let bus = SimBus::new();
        let mut device = SimDevice::temp_sensor(TEMP_DEFAULT_ADDRESS, ChipModel::Bme280);
        device.set_register(TEMP_REG_CHIP_ID, 0x42);
        bus.attach(device).unwrap();
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);

        let result = block_on(sensor.init(DataKind::Temperature, Binding::Edge));

        assert!(matches!(result, Err(SensorError::UnknownChip(0x42))));
        assert_eq!(sensor.model(), None);
    }

    #[test]
    fn init_rejects_humidity_on_bmp280() {
        let bus = bus_with(ChipModel::Bmp280);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);

        let result = block_on(sensor.init(DataKind::Humidity, Binding::Edge));

        assert!(matches!(
            result,
            Err(SensorError::UnsupportedKind(DataKind::Humidity))
        ));
    }

    #[test]
    fn init_configures_interrupt_for_binding() {
        let bus = bus_with(ChipModel::Bme280);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);

        block_on(sensor.init(DataKind::Temperature, Binding::Edge)).unwrap();
        assert_eq!(bus.register(TEMP_DEFAULT_ADDRESS, TEMP_REG_INT_CTRL), Some(TEMP_INT_DRDY_EN));

        block_on(sensor.init(DataKind::Temperature, Binding::Poll { interval_ms: 500 })).unwrap();
        assert_eq!(bus.register(TEMP_DEFAULT_ADDRESS, TEMP_REG_INT_CTRL), Some(0));
    }

    #[test]
    fn read_before_init_fails() {
        let bus = bus_with(ChipModel::Bme280);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);
        let mut readings = Readings::default();

        let result = block_on(sensor.read(&mut readings));

        assert!(matches!(result, Err(SensorError::NotInitialized)));
        assert_eq!(bus.transfers(), 0);
    }

    #[test]
    fn read_follows_selected_channel() {
        let bus = bus_with(ChipModel::Bme280);
        bus.push_environment(TEMP_DEFAULT_ADDRESS, [30.2, 101_325.0, 85.6]);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);
        block_on(sensor.init(DataKind::Temperature, Binding::Edge)).unwrap();
        let mut readings = Readings::default();

        block_on(sensor.read(&mut readings)).unwrap();
        assert_eq!(readings.kind(), DataKind::Temperature);
        assert!((readings.samples()[0] - 30.2).abs() < 0.01);

        sensor.set_channel(2).unwrap();
        block_on(sensor.read(&mut readings)).unwrap();
        assert_eq!(readings.kind(), DataKind::Humidity);
        assert_eq!(readings.channel(), 2);
        assert!((readings.samples()[0] - 85.6).abs() < 0.01);
    }

    #[test]
    fn set_channel_out_of_range_keeps_selection() {
        let bus = bus_with(ChipModel::Bmp280);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);
        block_on(sensor.init(DataKind::Pressure, Binding::Edge)).unwrap();
        assert_eq!(sensor.channel(), 1);

        assert!(matches!(sensor.set_channel(2), Err(SensorError::InvalidChannel(2))));
        assert!(matches!(sensor.set_channel(200), Err(SensorError::InvalidChannel(200))));
        assert_eq!(sensor.channel(), 1);
    }

    #[test]
    fn set_channel_before_init_fails() {
        let bus = bus_with(ChipModel::Bme280);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);
        assert!(matches!(sensor.set_channel(0), Err(SensorError::NotInitialized)));
    }

    #[test]
    fn bus_failure_surfaces_as_bus_error() {
        let bus = bus_with(ChipModel::Bme280);
        let mut sensor = TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS);
        block_on(sensor.init(DataKind::Temperature, Binding::Edge)).unwrap();
        bus.fail_next(TEMP_DEFAULT_ADDRESS);

        let mut readings = Readings::default();
        let result = block_on(sensor.read(&mut readings));

        assert!(matches!(result, Err(SensorError::Bus(_))));
        assert!(readings.is_empty());
    }

    #[test]
    fn model_channel_mapping() {
        assert_eq!(ChipModel::Bme280.channel_of(DataKind::Humidity), Some(2));
        assert_eq!(ChipModel::Bmp280.channel_of(DataKind::Humidity), None);
        assert_eq!(ChipModel::Bmp280.channel_of(DataKind::AngularRate), None);
        assert_eq!(ChipModel::from_id(CHIP_ID_BMP280), Some(ChipModel::Bmp280));
        assert_eq!(ChipModel::from_id(0x00), None);
    }
}
