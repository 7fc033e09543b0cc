//! Register maps for the supported sensors.
//!
//! Both devices use single-byte register addressing with auto-increment on
//! multi-byte reads: write the register pointer, then read consecutive
//! bytes from it.

// ---------------------------------------------------------------------------
// Environmental sensor (BME280 / BMP280 family)
// ---------------------------------------------------------------------------

/// Default I2C address of the environmental sensor (SDO tied low).
pub const TEMP_DEFAULT_ADDRESS: u8 = 0x76;

/// Chip identification register (8-bit, read-only).
pub const TEMP_REG_CHIP_ID: u8 = 0xD0;

/// `CHIP_ID` value reported by a BME280 (temperature, pressure, humidity).
pub const CHIP_ID_BME280: u8 = 0x60;

/// `CHIP_ID` value reported by a BMP280 (temperature, pressure).
pub const CHIP_ID_BMP280: u8 = 0x58;

/// Interrupt control register. Bit 0 routes data-ready to the INT pin.
pub const TEMP_REG_INT_CTRL: u8 = 0xF5;

/// Data-ready interrupt enable bit in [`TEMP_REG_INT_CTRL`].
pub const TEMP_INT_DRDY_EN: u8 = 0x01;

/// First measurement register. Each channel occupies four bytes holding a
/// big-endian `i32` in hundredths of the channel's unit.
/// Per-channel address: `TEMP_REG_DATA + channel * TEMP_CHANNEL_STRIDE`.
pub const TEMP_REG_DATA: u8 = 0x80;

/// Byte stride between consecutive measurement channels.
pub const TEMP_CHANNEL_STRIDE: u8 = 4;

/// Fixed-point scale of the measurement registers (centi-units).
pub const TEMP_FIXED_POINT_SCALE: f32 = 100.0;

// ---------------------------------------------------------------------------
// Three-axis gyroscope (L3GD20H-style)
// ---------------------------------------------------------------------------

/// Default I2C address of the gyroscope (SA0 tied high).
pub const GYRO_DEFAULT_ADDRESS: u8 = 0x6B;

/// Identification register (8-bit, read-only).
pub const GYRO_REG_WHO_AM_I: u8 = 0x0F;

/// Expected `WHO_AM_I` value.
pub const GYRO_WHO_AM_I: u8 = 0xD7;

/// Control register 1: power mode and axis enables.
pub const GYRO_REG_CTRL1: u8 = 0x20;

/// Normal mode with X, Y and Z axes enabled.
pub const GYRO_CTRL1_POWER_XYZ: u8 = 0x0F;

/// Control register 3: interrupt pin routing.
pub const GYRO_REG_CTRL3: u8 = 0x22;

/// Route data-ready to the DRDY pin.
pub const GYRO_CTRL3_DRDY: u8 = 0x08;

/// First output register. Three big-endian `i16` values follow (X, Y, Z).
pub const GYRO_REG_OUT_X: u8 = 0x28;

/// Number of output bytes (3 axes × 2 bytes).
pub const GYRO_OUT_LEN: usize = 6;

/// Sensitivity at the ±250 °/s range, in °/s per LSB.
pub const GYRO_SENSITIVITY_DPS: f32 = 0.00875;

/// Number of measured axes.
pub const GYRO_AXES: usize = 3;
