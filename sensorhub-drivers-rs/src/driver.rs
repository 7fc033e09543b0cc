//! Low-level register access over I2C.
//!
//! This module is crate-private. The sensor variants in `temp_sensor.rs`
//! and `gyro_sensor.rs` build their register logic on top of it.

use embedded_hal_async::i2c::I2c;

use crate::error::SensorError;

/// Owns an I2C handle and a device address and provides typed register
/// reads and writes.
pub(crate) struct RegisterDriver<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> RegisterDriver<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Write the register pointer, then read `buffer.len()` consecutive
    /// bytes with a repeated start.
    pub async fn read_into(
        &mut self,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), SensorError<I2C::Error>> {
        self.i2c.write_read(self.address, &[register], buffer).await?;
        Ok(())
    }

    pub async fn read_u8(&mut self, register: u8) -> Result<u8, SensorError<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.read_into(register, &mut buf).await?;
        Ok(buf[0])
    }

    /// Read a big-endian 32-bit signed integer.
    pub async fn read_i32_be(&mut self, register: u8) -> Result<i32, SensorError<I2C::Error>> {
        let mut buf = [0u8; 4];
        self.read_into(register, &mut buf).await?;
        Ok(i32::from_be_bytes(buf))
    }

    /// Write a single byte to a register in one transaction.
    pub async fn write_u8(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), SensorError<I2C::Error>> {
        self.i2c.write(self.address, &[register, value]).await?;
        Ok(())
    }
}
