//! Three-axis gyroscope driver.
//!
//! The gyroscope is normally poll-driven: the task wakes on a timer and
//! samples the DRDY line through [`Sensor::has_new_data`] before touching
//! the bus.

use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::I2c;

use crate::capability::{Binding, DataKind, Readings, Sensor};
use crate::driver::RegisterDriver;
use crate::error::SensorError;
use crate::registers::{
    GYRO_AXES, GYRO_CTRL1_POWER_XYZ, GYRO_CTRL3_DRDY, GYRO_OUT_LEN, GYRO_REG_CTRL1,
    GYRO_REG_CTRL3, GYRO_REG_OUT_X, GYRO_REG_WHO_AM_I, GYRO_SENSITIVITY_DPS, GYRO_WHO_AM_I,
};

/// Three-axis angular-rate sensor over I2C with a data-ready input pin.
pub struct GyroSensor<I2C, P> {
    driver: RegisterDriver<I2C>,
    drdy: P,
    binding: Option<Binding>,
}

impl<I2C, P> GyroSensor<I2C, P>
where
    I2C: I2c,
    P: InputPin,
{
    /// Create an unconfigured sensor. `drdy` is the data-ready input.
    pub fn new(i2c: I2C, address: u8, drdy: P) -> Self {
        Self {
            driver: RegisterDriver::new(i2c, address),
            drdy,
            binding: None,
        }
    }

    /// Binding configured by `init`, if any.
    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }
}

impl<I2C, P> Sensor for GyroSensor<I2C, P>
where
    I2C: I2c,
    P: InputPin,
{
    type BusError = I2C::Error;

    async fn init(
        &mut self,
        kind: DataKind,
        binding: Binding,
    ) -> Result<(), SensorError<I2C::Error>> {
        if kind != DataKind::AngularRate {
            return Err(SensorError::UnsupportedKind(kind));
        }

        let id = self.driver.read_u8(GYRO_REG_WHO_AM_I).await?;
        if id != GYRO_WHO_AM_I {
            return Err(SensorError::UnknownChip(id));
        }

        self.driver
            .write_u8(GYRO_REG_CTRL1, GYRO_CTRL1_POWER_XYZ)
            .await?;
        // DRDY is the polled flag as well as the interrupt source, so it is
        // routed to the pin for both bindings.
        self.driver.write_u8(GYRO_REG_CTRL3, GYRO_CTRL3_DRDY).await?;

        self.binding = Some(binding);
        Ok(())
    }

    fn has_new_data(&mut self) -> bool {
        self.binding.is_some() && matches!(self.drdy.is_high(), Ok(true))
    }

    async fn read(&mut self, readings: &mut Readings) -> Result<(), SensorError<I2C::Error>> {
        if self.binding.is_none() {
            return Err(SensorError::NotInitialized);
        }

        let mut buf = [0u8; GYRO_OUT_LEN];
        self.driver.read_into(GYRO_REG_OUT_X, &mut buf).await?;

        let rates: [f32; GYRO_AXES] = core::array::from_fn(|axis| {
            let raw = i16::from_be_bytes([buf[2 * axis], buf[2 * axis + 1]]);
            raw as f32 * GYRO_SENSITIVITY_DPS
        });
        readings.overwrite(DataKind::AngularRate, 0, &rates);
        Ok(())
    }
}
