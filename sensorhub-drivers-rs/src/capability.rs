//! The sensor capability contract.
//!
//! Every sensor variant implements [`Sensor`]. The task procedure that
//! drives sensors is written against this trait only, so edge-driven and
//! poll-driven devices share one task body.

use crate::error::SensorError;

/// Maximum number of samples a single read can produce (three gyro axes).
pub const MAX_SAMPLES: usize = 3;

/// The kind of quantity carried by a set of [`Readings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataKind {
    Temperature,
    Pressure,
    Humidity,
    AngularRate,
}

impl DataKind {
    /// The unit every driver reports this kind in.
    pub fn unit(self) -> Unit {
        match self {
            DataKind::Temperature => Unit::Celsius,
            DataKind::Pressure => Unit::Pascal,
            DataKind::Humidity => Unit::PercentRh,
            DataKind::AngularRate => Unit::DegreesPerSecond,
        }
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            DataKind::Temperature => "Temp",
            DataKind::Pressure => "Pres",
            DataKind::Humidity => "Hum",
            DataKind::AngularRate => "Gyro",
        }
    }
}

/// Physical unit of a sample. No conversion between units is ever done
/// outside the drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    Celsius,
    Pascal,
    PercentRh,
    DegreesPerSecond,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Celsius => "C",
            Unit::Pascal => "Pa",
            Unit::PercentRh => "%RH",
            Unit::DegreesPerSecond => "dps",
        }
    }
}

/// How a sensor announces new data.
///
/// Chosen once at [`Sensor::init`] and fixed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Binding {
    /// The device raises an interrupt line that signals an event.
    Edge,
    /// The task wakes every `interval_ms` and checks [`Sensor::has_new_data`].
    Poll { interval_ms: u32 },
}

impl Binding {
    pub fn is_edge(&self) -> bool {
        matches!(self, Binding::Edge)
    }
}

/// Fixed-size buffer holding the most recent sample set of one sensor.
///
/// Overwritten in place by every successful [`Sensor::read`]; never grows.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readings {
    kind: DataKind,
    channel: u8,
    samples: [f32; MAX_SAMPLES],
    len: usize,
}

impl Readings {
    /// An empty buffer tagged with `kind`.
    pub const fn new(kind: DataKind) -> Self {
        Self {
            kind,
            channel: 0,
            samples: [0.0; MAX_SAMPLES],
            len: 0,
        }
    }

    /// Replace the contents with `samples` taken from `channel`.
    ///
    /// Samples beyond [`MAX_SAMPLES`] are ignored.
    pub fn overwrite(&mut self, kind: DataKind, channel: u8, samples: &[f32]) {
        let len = samples.len().min(MAX_SAMPLES);
        self.kind = kind;
        self.channel = channel;
        self.samples = [0.0; MAX_SAMPLES];
        self.samples[..len].copy_from_slice(&samples[..len]);
        self.len = len;
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn unit(&self) -> Unit {
        self.kind.unit()
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// The valid samples, in driver order (e.g. X, Y, Z).
    pub fn samples(&self) -> &[f32] {
        &self.samples[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Readings {
    fn default() -> Self {
        Self::new(DataKind::Temperature)
    }
}

/// Capability set every sensor variant provides.
///
/// # Bus access
///
/// [`read`](Self::read) performs the bus transfer. Callers sharing a bus
/// between several sensors must hold the bus lock for the duration of the
/// call; implementations never take that lock themselves.
///
/// # Channels
///
/// Channel selection is optional. The defaults describe a sensor with no
/// selectable channels.
#[allow(async_fn_in_trait)]
pub trait Sensor {
    /// Error type of the underlying bus.
    type BusError: core::fmt::Debug;

    /// One-time configuration.
    ///
    /// Verifies the device identity, selects the channel producing `kind`
    /// and configures the data-ready output for `binding`.
    async fn init(
        &mut self,
        kind: DataKind,
        binding: Binding,
    ) -> Result<(), SensorError<Self::BusError>>;

    /// Non-blocking check for new data, used by poll-driven sensors.
    ///
    /// Edge-driven sensors carry the notification in their event, so the
    /// default always answers `true`.
    fn has_new_data(&mut self) -> bool {
        true
    }

    /// Transfer the latest sample set into `readings`.
    async fn read(&mut self, readings: &mut Readings) -> Result<(), SensorError<Self::BusError>>;

    /// Number of selectable channels. Zero means channels are unsupported.
    fn channel_count(&self) -> u8 {
        0
    }

    /// Currently selected channel.
    fn channel(&self) -> u8 {
        0
    }

    /// Select the channel the next [`read`](Self::read) uses.
    ///
    /// Must not be called while a read is in progress. Out-of-range
    /// indices are rejected and leave the selection unchanged.
    fn set_channel(&mut self, channel: u8) -> Result<(), SensorError<Self::BusError>> {
        let _ = channel;
        Err(SensorError::ChannelsUnsupported)
    }
}
