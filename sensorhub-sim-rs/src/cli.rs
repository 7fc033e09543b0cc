//! Command-line options.

use clap::{Parser, ValueEnum};
use embassy_time::Duration;
use sensorhub::config::{POLL_INTERVAL_MS, TICK_MS};
use sensorhub::{ChannelPolicy, ConfigError, HubConfig, QueueFullPolicy};

#[derive(Parser, Debug)]
#[command(name = "sensorhub-sim")]
#[command(about = "Run the sensor hub against a simulated I2C bus")]
#[command(version)]
pub struct Cli {
    /// Number of scheduler ticks to simulate
    #[arg(long, default_value = "1000")]
    pub ticks: u32,

    /// Simulated time per tick, in milliseconds
    #[arg(long, default_value_t = TICK_MS)]
    pub tick_ms: u64,

    /// Wake period of the poll-driven gyroscope, in milliseconds
    #[arg(long, default_value_t = POLL_INTERVAL_MS)]
    pub poll_ms: u64,

    /// What a sensor task does when the display queue is full
    #[arg(long, value_enum, default_value = "block")]
    pub queue_policy: QueuePolicyArg,

    /// How channel buttons behave at the first and last channel
    #[arg(long, value_enum, default_value = "wrap")]
    pub channel_policy: ChannelPolicyArg,

    /// Press a channel button every N ticks (0 disables the buttons)
    #[arg(long, default_value = "150")]
    pub button_every: u32,

    /// Give up on the bus lock after this many milliseconds
    #[arg(long)]
    pub lock_timeout_ms: Option<u64>,

    /// Simulate a BMP280 (no humidity channel) instead of a BME280
    #[arg(long)]
    pub bmp280: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QueuePolicyArg {
    Block,
    Drop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChannelPolicyArg {
    Wrap,
    Clamp,
}

impl Cli {
    /// The hub configuration these options describe, validated.
    pub fn hub_config(&self) -> Result<HubConfig, ConfigError> {
        let config = HubConfig {
            poll_interval: millis(self.poll_ms)?,
            tick: millis(self.tick_ms)?,
            lock_timeout: self.lock_timeout_ms.map(millis).transpose()?,
            queue_policy: match self.queue_policy {
                QueuePolicyArg::Block => QueueFullPolicy::Block,
                QueuePolicyArg::Drop => QueueFullPolicy::Drop,
            },
            channel_policy: match self.channel_policy {
                ChannelPolicyArg::Wrap => ChannelPolicy::Wrap,
                ChannelPolicyArg::Clamp => ChannelPolicy::Clamp,
            },
            ..HubConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn millis(millis: u64) -> Result<Duration, ConfigError> {
    Duration::try_from_millis(millis).ok_or(ConfigError::DurationOutOfRange { millis })
}
