//! sensorhub-sim
//!
//! Host build of the sensor hub. Wires the library crates together on a
//! simulated I2C bus and drives them tick by tick:
//!
//! 1. Simulated time advances by one tick.
//! 2. The simulated hardware latches new samples, raises the gyroscope's
//!    data-ready line, signals the environmental sensor's event and presses
//!    the channel buttons on a schedule.
//! 3. The runtime polls every task once, in priority order.
//!
//! Each message the display task receives is printed as one line.

mod cli;
mod hardware;

use std::error::Error;
use std::fmt;
use std::io::Write as _;
use std::pin::pin;
use std::process::ExitCode;

use clap::Parser;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::MockDriver;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt as subscriber, EnvFilter};

use sensorhub::config::{
    BUS_LOCK_WAITERS, CONTROL_TASK, DISPLAY_QUEUE_CAPACITY, DISPLAY_TASK, GYRO_TASK, MAX_TASKS,
    TEMP_TASK,
};
use sensorhub::{
    control_task, display_task, sensor_task, BusLock, ChannelControl, DisplayQueue, Event,
    HubConfig, Notification, Outbox, Runtime, SensorContext, TaskSpec, TextSink,
};
use sensorhub_drivers::sim::{SimBus, SimDevice};
use sensorhub_drivers::{
    ChipModel, DataKind, GyroSensor, TempSensor, GYRO_DEFAULT_ADDRESS, TEMP_DEFAULT_ADDRESS,
};

use cli::Cli;
use hardware::Stimulus;

// ---------------------------------------------------------------------------
// Console sink
// ---------------------------------------------------------------------------

/// `fmt::Write` adapter over standard output.
struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        std::io::stdout().write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    subscriber().with_env_filter(filter).with_target(false).init();

    let config = match cli.hub_config() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Bootstrap and tick loop
// ---------------------------------------------------------------------------

fn run(cli: &Cli, config: &HubConfig) -> Result<(), Box<dyn Error>> {
    let driver = MockDriver::get();

    // ── Simulated hardware ───────────────────────────────────────────
    let model = if cli.bmp280 { ChipModel::Bmp280 } else { ChipModel::Bme280 };
    let bus = SimBus::new();
    bus.attach(SimDevice::temp_sensor(TEMP_DEFAULT_ADDRESS, model))?;
    bus.attach(SimDevice::gyro(GYRO_DEFAULT_ADDRESS))?;
    // Every transfer suspends once, so tasks really contend for the bus.
    bus.set_yield_on_transfer(true);

    // ── Shared resources ─────────────────────────────────────────────
    let temp_ready: Event<NoopRawMutex> = Event::new();
    let up: Event<NoopRawMutex> = Event::new();
    let down: Event<NoopRawMutex> = Event::new();
    let lock: BusLock<NoopRawMutex, BUS_LOCK_WAITERS> = BusLock::new(config.bus_capacity)?;
    let queue: DisplayQueue<NoopRawMutex, DISPLAY_QUEUE_CAPACITY> = Channel::new();
    let temp_outbox = Outbox::new(&queue, config.queue_policy);
    let gyro_outbox = Outbox::new(&queue, config.queue_policy);

    // ── Sensors ──────────────────────────────────────────────────────
    let temp_slot = Mutex::new(TempSensor::new(bus.i2c(), TEMP_DEFAULT_ADDRESS));
    let gyro_slot = Mutex::new(GyroSensor::new(
        bus.i2c(),
        GYRO_DEFAULT_ADDRESS,
        bus.drdy_pin(GYRO_DEFAULT_ADDRESS),
    ));

    let mut temp_ctx = SensorContext::new(
        TEMP_TASK,
        DISPLAY_TASK,
        &temp_slot,
        Notification::Event(&temp_ready),
    );
    let mut gyro_ctx = SensorContext::new(
        GYRO_TASK,
        DISPLAY_TASK,
        &gyro_slot,
        Notification::Poll(config.poll_interval),
    );
    if let Some(timeout) = config.lock_timeout {
        temp_ctx = temp_ctx.with_lock_timeout(timeout);
        gyro_ctx = gyro_ctx.with_lock_timeout(timeout);
    }
    embassy_futures::block_on(temp_ctx.init(DataKind::Temperature))?;
    embassy_futures::block_on(gyro_ctx.init(DataKind::AngularRate))?;
    info!("environmental sensor: {:?}", model);

    // ── Tasks ────────────────────────────────────────────────────────
    let mut temp_task = pin!(sensor_task(temp_ctx, &lock, &temp_outbox));
    let mut gyro_task = pin!(sensor_task(gyro_ctx, &lock, &gyro_outbox));
    let mut control = pin!(control_task(ChannelControl::new(
        &temp_slot,
        &up,
        &down,
        config.channel_policy,
    )));
    let mut display = pin!(display_task(queue.receiver().into(), TextSink::new(Console)));

    let mut rt: Runtime<'_, MAX_TASKS> = Runtime::new();
    rt.spawn(
        TaskSpec {
            id: TEMP_TASK,
            priority: config.temp_priority,
            name: "temp",
        },
        temp_task.as_mut(),
    )?;
    rt.spawn(
        TaskSpec {
            id: GYRO_TASK,
            priority: config.gyro_priority,
            name: "gyro",
        },
        gyro_task.as_mut(),
    )?;
    rt.spawn(
        TaskSpec {
            id: CONTROL_TASK,
            priority: config.control_priority,
            name: "control",
        },
        control.as_mut(),
    )?;
    rt.spawn(
        TaskSpec {
            id: DISPLAY_TASK,
            priority: config.display_priority,
            name: "display",
        },
        display.as_mut(),
    )?;

    // ── Tick loop ────────────────────────────────────────────────────
    let mut stimulus = Stimulus::new(&bus, &temp_ready, &up, &down, cli.button_every, cli.tick_ms);
    info!(
        "running {} ticks of {} ms ({:?} queue, {:?} channels)",
        cli.ticks, cli.tick_ms, config.queue_policy, config.channel_policy
    );
    for tick in 0..cli.ticks {
        driver.advance(config.tick);
        stimulus.service(tick);
        rt.tick();
    }

    info!(
        "done: {} passes, {} bus transfers, {} button presses",
        rt.passes(),
        bus.transfers(),
        stimulus.presses()
    );
    info!(
        "temp: {} posted, {} dropped; gyro: {} posted, {} dropped",
        temp_outbox.posted(),
        temp_outbox.dropped(),
        gyro_outbox.posted(),
        gyro_outbox.dropped()
    );
    if bus.overlapping_transfers() > 0 {
        warn!("{} overlapping bus transfers", bus.overlapping_transfers());
    }
    Ok(())
}
