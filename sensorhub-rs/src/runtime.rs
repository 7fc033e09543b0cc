//! Minimal cooperative runtime.
//!
//! A fixed-capacity table of pinned task futures, kept sorted by priority.
//! [`Runtime::run_pass`] polls every live task exactly once, highest
//! precedence (lowest number) first. There are no wakers: a suspended task
//! is simply polled again on the next pass, and [`sleep`] compares against
//! [`Instant::now`] each time it is polled.
//!
//! Task futures borrow their resources (events, lock, queue, sensor slots)
//! from the caller's stack, so those resources must be declared before the
//! runtime.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::error::ConfigError;
use crate::message::TaskId;

/// A binary notification set by an interrupt handler (or the simulator)
/// and consumed by exactly one waiting task.
pub type Event<M> = Signal<M, ()>;

/// A task body as stored in the table.
pub type TaskFuture<'a> = Pin<&'a mut dyn Future<Output = ()>>;

/// Registration data for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskSpec {
    pub id: TaskId,
    /// Lower number runs first. Unique per runtime.
    pub priority: u8,
    pub name: &'static str,
}

struct Task<'a> {
    spec: TaskSpec,
    future: TaskFuture<'a>,
    finished: bool,
}

pub struct Runtime<'a, const N: usize> {
    tasks: Vec<Task<'a>, N>,
    passes: u64,
}

impl<'a, const N: usize> Runtime<'a, N> {
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            passes: 0,
        }
    }

    /// Register a task.
    ///
    /// Ids and priorities must be unique. The table keeps priority order,
    /// so spawn order does not matter.
    pub fn spawn(&mut self, spec: TaskSpec, future: TaskFuture<'a>) -> Result<TaskId, ConfigError> {
        for task in &self.tasks {
            if task.spec.id == spec.id {
                return Err(ConfigError::DuplicateTask(spec.id));
            }
            if task.spec.priority == spec.priority {
                return Err(ConfigError::DuplicatePriority(spec.priority));
            }
        }
        self.tasks
            .push(Task {
                spec,
                future,
                finished: false,
            })
            .map_err(|_| ConfigError::TooManyTasks)?;
        self.tasks.sort_unstable_by_key(|t| t.spec.priority);

        info!("spawned task {} ({}) at priority {}", spec.id.0, spec.name, spec.priority);
        Ok(spec.id)
    }

    /// Poll every live task once in priority order.
    ///
    /// Returns the number of tasks polled.
    pub fn run_pass(&mut self) -> usize {
        let mut cx = Context::from_waker(Waker::noop());
        let mut polled = 0;
        for task in self.tasks.iter_mut().filter(|t| !t.finished) {
            polled += 1;
            if task.future.as_mut().poll(&mut cx).is_ready() {
                task.finished = true;
                warn!("task {} ({}) returned", task.spec.id.0, task.spec.name);
            }
        }
        self.passes += 1;
        polled
    }

    /// One scheduler tick.
    pub fn tick(&mut self) -> usize {
        self.run_pass()
    }

    /// Run `passes` consecutive passes.
    pub fn run(&mut self, passes: usize) {
        for _ in 0..passes {
            self.run_pass();
        }
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task ids in the order a pass visits them.
    pub fn order(&self) -> impl Iterator<Item = TaskId> + use<'_, 'a, N> {
        self.tasks.iter().map(|t| t.spec.id)
    }

    /// Whether the task has returned. `None` for an unknown id.
    pub fn is_finished(&self, id: TaskId) -> Option<bool> {
        self.tasks.iter().find(|t| t.spec.id == id).map(|t| t.finished)
    }
}

impl<const N: usize> Default for Runtime<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Suspend the calling task for at least `duration`.
pub fn sleep(duration: Duration) -> Sleep {
    Sleep {
        deadline: Instant::now() + duration,
    }
}

/// Future returned by [`sleep`].
#[must_use = "futures do nothing unless polled"]
pub struct Sleep {
    deadline: Instant,
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if Instant::now() >= self.deadline {
            Poll::Ready(())
        } else {
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::pin::pin;
    use embassy_futures::yield_now;
    use embassy_time::MockDriver;

    fn spec(id: u8, priority: u8) -> TaskSpec {
        TaskSpec {
            id: TaskId(id),
            priority,
            name: "test",
        }
    }

    async fn record(log: &RefCell<std::vec::Vec<u8>>, id: u8, rounds: usize) {
        for _ in 0..rounds {
            log.borrow_mut().push(id);
            yield_now().await;
        }
    }

    #[test]
    fn passes_follow_priority_order() {
        let log = RefCell::new(std::vec::Vec::new());
        let mut low = pin!(record(&log, 3, 2));
        let mut high = pin!(record(&log, 1, 2));
        let mut mid = pin!(record(&log, 2, 2));

        let mut rt: Runtime<'_, 4> = Runtime::new();
        rt.spawn(spec(3, 100), low.as_mut()).unwrap();
        rt.spawn(spec(1, 10), high.as_mut()).unwrap();
        rt.spawn(spec(2, 20), mid.as_mut()).unwrap();
        assert_eq!(rt.order().collect::<std::vec::Vec<_>>(), [TaskId(1), TaskId(2), TaskId(3)]);

        assert_eq!(rt.run_pass(), 3);
        assert_eq!(*log.borrow(), [1, 2, 3]);
        rt.run(2);
        assert_eq!(*log.borrow(), [1, 2, 3, 1, 2, 3]);
        assert_eq!(rt.is_finished(TaskId(1)), Some(true));
        assert_eq!(rt.tick(), 0);
        assert_eq!(rt.passes(), 4);
    }

    #[test]
    fn spawn_rejects_duplicates_and_overflow() {
        let mut a = pin!(async {});
        let mut b = pin!(async {});
        let mut c = pin!(async {});
        let mut d = pin!(async {});
        let mut e = pin!(async {});

        let mut rt: Runtime<'_, 2> = Runtime::new();
        rt.spawn(spec(1, 10), a.as_mut()).unwrap();
        assert_eq!(
            rt.spawn(spec(1, 11), b.as_mut()),
            Err(ConfigError::DuplicateTask(TaskId(1)))
        );
        assert_eq!(
            rt.spawn(spec(2, 10), c.as_mut()),
            Err(ConfigError::DuplicatePriority(10))
        );
        rt.spawn(spec(2, 20), e.as_mut()).unwrap();
        assert_eq!(rt.spawn(spec(3, 30), d.as_mut()), Err(ConfigError::TooManyTasks));
        assert_eq!(rt.len(), 2);
        assert_eq!(rt.is_finished(TaskId(9)), None);
    }

    #[test]
    fn sleep_completes_after_deadline() {
        let driver = MockDriver::get();
        driver.reset();

        let fired = RefCell::new(false);
        let mut sleeper = pin!(async {
            sleep(Duration::from_millis(30)).await;
            *fired.borrow_mut() = true;
        });
        let mut rt: Runtime<'_, 1> = Runtime::new();
        rt.spawn(spec(1, 1), sleeper.as_mut()).unwrap();

        // The deadline is taken on the first poll.
        rt.run_pass();
        for _ in 0..2 {
            driver.advance(Duration::from_millis(10));
            rt.run_pass();
            assert!(!*fired.borrow());
        }
        driver.advance(Duration::from_millis(10));
        rt.run_pass();
        assert!(*fired.borrow());
    }
}
