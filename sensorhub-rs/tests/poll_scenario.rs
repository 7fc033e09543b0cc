//! Poll-driven and edge-driven wake-up behaviour.

mod common;

use std::cell::RefCell;
use std::pin::pin;

use common::{clock, ScriptedSensor, Trace};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::Duration;
use sensorhub::config::{BUS_LOCK_WAITERS, DISPLAY_QUEUE_CAPACITY};
use sensorhub::{
    sensor_task, BusLock, DisplayQueue, Event, Notification, Outbox, QueueFullPolicy, Runtime,
    SensorContext, TaskId, TaskSpec,
};
use sensorhub_drivers::{Binding, DataKind};

const POLL: Duration = Duration::from_millis(50);
const TICK: Duration = Duration::from_millis(10);

#[test]
fn poll_without_new_data_publishes_nothing() {
    let (_clock, driver) = clock();
    const FALSE_WAKES: u32 = 3;

    let trace = RefCell::new(Vec::new());
    let lock: BusLock<NoopRawMutex, BUS_LOCK_WAITERS> = BusLock::new(1).unwrap();
    let queue: DisplayQueue<NoopRawMutex, DISPLAY_QUEUE_CAPACITY> = Channel::new();
    let outbox = Outbox::new(&queue, QueueFullPolicy::Block);
    let slot = Mutex::new(
        ScriptedSensor::new("gyro", DataKind::AngularRate, &trace)
            .with_ready(&[false; FALSE_WAKES as usize]),
    );

    let ctx = SensorContext::new(TaskId(2), TaskId(4), &slot, Notification::Poll(POLL));
    embassy_futures::block_on(ctx.init(DataKind::AngularRate)).unwrap();
    let mut task = pin!(sensor_task(ctx, &lock, &outbox));

    let mut rt: Runtime<'_, 4> = Runtime::new();
    rt.spawn(
        TaskSpec {
            id: TaskId(2),
            priority: 20,
            name: "gyro",
        },
        task.as_mut(),
    )
    .unwrap();

    let polls = || slot.try_lock().map(|s| s.polls).unwrap_or(0);
    let mut elapsed = Duration::from_ticks(0);
    while polls() < FALSE_WAKES {
        driver.advance(TICK);
        elapsed += TICK;
        rt.run_pass();
        assert!(queue.is_empty());
        assert!(trace.borrow().is_empty(), "no bus access without new data");
        assert!(elapsed < Duration::from_secs(5));
    }
    // Each false wake cost one full poll interval.
    assert!(elapsed >= POLL * FALSE_WAKES);

    while polls() == FALSE_WAKES {
        driver.advance(TICK);
        rt.run_pass();
    }
    assert_eq!(queue.len(), 1);
    assert_eq!(outbox.posted(), 1);
    assert_eq!(lock.holders(), 0);

    let msg = queue.try_receive().unwrap();
    assert_eq!(msg.kind, DataKind::AngularRate);
    assert_eq!(msg.sequence, 0);
    assert_eq!(slot.try_lock().unwrap().binding, Some(Binding::Poll { interval_ms: 50 }));
}

#[test]
fn edge_sensor_reads_once_per_signal() {
    let (_clock, _driver) = clock();

    let trace = RefCell::new(Vec::new());
    let event: Event<NoopRawMutex> = Event::new();
    let lock: BusLock<NoopRawMutex, BUS_LOCK_WAITERS> = BusLock::new(1).unwrap();
    let queue: DisplayQueue<NoopRawMutex, DISPLAY_QUEUE_CAPACITY> = Channel::new();
    let outbox = Outbox::new(&queue, QueueFullPolicy::Block);
    let slot = Mutex::new(ScriptedSensor::new("temp", DataKind::Temperature, &trace));

    let ctx = SensorContext::new(TaskId(1), TaskId(4), &slot, Notification::Event(&event));
    embassy_futures::block_on(ctx.init(DataKind::Temperature)).unwrap();
    let mut task = pin!(sensor_task(ctx, &lock, &outbox));

    let mut rt: Runtime<'_, 4> = Runtime::new();
    rt.spawn(
        TaskSpec {
            id: TaskId(1),
            priority: 10,
            name: "temp",
        },
        task.as_mut(),
    )
    .unwrap();

    rt.run(3);
    assert!(queue.is_empty());

    event.signal(());
    rt.run(3);
    assert_eq!(queue.len(), 1);
    assert_eq!(
        *trace.borrow(),
        [
            Trace::Read {
                sensor: "temp",
                holders: 0
            },
            Trace::ReadEnd("temp")
        ]
    );
    // Edge sensors never consult the data-ready check.
    assert_eq!(slot.try_lock().unwrap().polls, 0);
}
