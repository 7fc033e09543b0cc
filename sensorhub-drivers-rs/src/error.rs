//! Error types for the sensor drivers.

use core::fmt;

use crate::capability::DataKind;

/// Errors that can occur when configuring or reading a sensor.
#[derive(Debug)]
pub enum SensorError<E> {
    /// Underlying bus error.
    Bus(E),

    /// The device answered with an identification value no driver knows.
    UnknownChip(u8),

    /// The sensor cannot produce the requested kind of data.
    UnsupportedKind(DataKind),

    /// Channel index outside `0..channel_count()`.
    InvalidChannel(u8),

    /// The sensor has no selectable channels.
    ChannelsUnsupported,

    /// An operation was attempted before `init()` succeeded.
    NotInitialized,
}

/// Bus-independent classification of a [`SensorError`], convenient for
/// logging without constraining the bus error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorErrorKind {
    Bus,
    UnknownChip,
    UnsupportedKind,
    InvalidChannel,
    ChannelsUnsupported,
    NotInitialized,
}

impl<E> SensorError<E> {
    /// Returns the bus-independent kind of this error.
    pub fn kind(&self) -> SensorErrorKind {
        match self {
            SensorError::Bus(_) => SensorErrorKind::Bus,
            SensorError::UnknownChip(_) => SensorErrorKind::UnknownChip,
            SensorError::UnsupportedKind(_) => SensorErrorKind::UnsupportedKind,
            SensorError::InvalidChannel(_) => SensorErrorKind::InvalidChannel,
            SensorError::ChannelsUnsupported => SensorErrorKind::ChannelsUnsupported,
            SensorError::NotInitialized => SensorErrorKind::NotInitialized,
        }
    }
}

// Allow ergonomic `?` propagation from raw bus errors.
impl<E> From<E> for SensorError<E> {
    fn from(error: E) -> Self {
        SensorError::Bus(error)
    }
}

impl<E: fmt::Debug> fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SensorError::Bus(e) => write!(f, "bus error: {:?}", e),
            SensorError::UnknownChip(id) => write!(f, "unknown chip id 0x{:02X}", id),
            SensorError::UnsupportedKind(kind) => write!(f, "unsupported data kind {:?}", kind),
            SensorError::InvalidChannel(ch) => write!(f, "invalid channel {}", ch),
            SensorError::ChannelsUnsupported => write!(f, "sensor has no selectable channels"),
            SensorError::NotInitialized => write!(f, "sensor not initialised"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for SensorError<E> {}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for SensorError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SensorError::Bus(e) => defmt::write!(f, "bus error: {}", e),
            SensorError::UnknownChip(id) => defmt::write!(f, "unknown chip id {=u8:#x}", *id),
            SensorError::UnsupportedKind(kind) => defmt::write!(f, "unsupported data kind {}", kind),
            SensorError::InvalidChannel(ch) => defmt::write!(f, "invalid channel {}", ch),
            SensorError::ChannelsUnsupported => defmt::write!(f, "no selectable channels"),
            SensorError::NotInitialized => defmt::write!(f, "not initialised"),
        }
    }
}
