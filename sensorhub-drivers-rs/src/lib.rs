//! Sensor capability contract and async I2C sensor drivers.
//!
//! This crate defines the [`Sensor`] trait that the sensor hub's task
//! procedure is written against, and two implementations over any
//! `embedded-hal-async` I2C bus:
//!
//! - [`TempSensor`]: BME280/BMP280-style environmental sensor with
//!   selectable channels (temperature, pressure, humidity).
//! - [`GyroSensor`]: three-axis gyroscope with a data-ready pin.
//!
//! # Architecture
//!
//! - **`driver`** (crate-private): typed register reads and writes.
//! - **`registers`**: register maps and scale factors.
//! - **[`sim`]** *(feature `sim`)*: an in-memory bus hosting register
//!   models of both devices, for running everything on a host.
//!
//! # Features
//!
//! - **`defmt`**: [`defmt::Format`] implementations and `defmt` logging.
//! - **`tracing`**: logging through `tracing` events.
//! - **`sim`**: the simulated bus.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod capability;
mod driver;
mod error;
mod gyro_sensor;
mod registers;
mod temp_sensor;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use capability::{Binding, DataKind, Readings, Sensor, Unit, MAX_SAMPLES};
pub use error::{SensorError, SensorErrorKind};
pub use gyro_sensor::GyroSensor;
pub use registers::{GYRO_DEFAULT_ADDRESS, TEMP_DEFAULT_ADDRESS};
pub use temp_sensor::{ChipModel, TempSensor};
