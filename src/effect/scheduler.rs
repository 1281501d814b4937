//! Time sources for delayed effects.
//!
//! Reducers never read the clock directly; they get a [`Scheduler`] from
//! their environment so tests can swap real time for a [`TestScheduler`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Yields handed to the runtime after each virtual timer fires, enough for a
/// woken effect to run through to its next suspension point.
const SETTLE_YIELDS: usize = 16;

pub trait Scheduler: Send + Sync {
    /// Time elapsed since the scheduler was created.
    fn now(&self) -> Duration;

    /// A future that resolves once `duration` has passed on this scheduler.
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

pub type SharedScheduler = Arc<dyn Scheduler>;

/// Wall-clock scheduler backed by `tokio::time`.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    origin: tokio::time::Instant,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }

    pub fn shared() -> SharedScheduler {
        Arc::new(Self::new())
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

struct Sleeper {
    deadline: Duration,
    seq: u64,
    wake: oneshot::Sender<()>,
}

#[derive(Default)]
struct VirtualClock {
    now: Duration,
    next_seq: u64,
    sleepers: Vec<Sleeper>,
}

impl VirtualClock {
    /// Forgets sleepers whose future was dropped, e.g. by a cancelled effect.
    fn prune(&mut self) {
        self.sleepers.retain(|sleeper| !sleeper.wake.is_closed());
    }

    /// Removes the earliest sleeper due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<Sleeper> {
        self.prune();
        let index = self
            .sleepers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.deadline <= limit)
            .min_by_key(|(_, s)| (s.deadline, s.seq))
            .map(|(i, _)| i)?;
        Some(self.sleepers.swap_remove(index))
    }
}

/// Manually driven virtual clock.
///
/// Nothing sleeping on a `TestScheduler` wakes until the test calls
/// [`advance`](Self::advance) or [`run`](Self::run). Timers fire in deadline
/// order, ties broken by creation order.
#[derive(Clone, Default)]
pub struct TestScheduler {
    clock: Arc<Mutex<VirtualClock>>,
}

impl TestScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> SharedScheduler {
        Arc::new(self.clone())
    }

    /// Moves virtual time forward by `by`, firing every timer that comes due.
    ///
    /// Effects already started get to register their timers first.
    pub async fn advance(&self, by: Duration) {
        settle().await;
        let target = self.clock.lock().now + by;
        loop {
            let due = {
                let mut clock = self.clock.lock();
                match clock.pop_due(target) {
                    Some(sleeper) => {
                        clock.now = clock.now.max(sleeper.deadline);
                        Some(sleeper)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };
            match due {
                Some(sleeper) => {
                    let _ = sleeper.wake.send(());
                    settle().await;
                }
                None => break,
            }
        }
        settle().await;
    }

    /// Advances until no timers are pending.
    pub async fn run(&self) {
        settle().await;
        loop {
            let next = {
                let mut clock = self.clock.lock();
                clock.prune();
                clock
                    .sleepers
                    .iter()
                    .map(|s| s.deadline)
                    .min()
                    .map(|deadline| deadline.saturating_sub(clock.now))
            };
            match next {
                Some(delta) => self.advance(delta).await,
                None => break,
            }
        }
    }

    /// Number of timers still waiting.
    pub fn pending_timers(&self) -> usize {
        let mut clock = self.clock.lock();
        clock.prune();
        clock.sleepers.len()
    }
}

impl Scheduler for TestScheduler {
    fn now(&self) -> Duration {
        self.clock.lock().now
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        let (wake, waiting) = oneshot::channel();
        {
            let mut clock = self.clock.lock();
            clock.prune();
            let seq = clock.next_seq;
            clock.next_seq += 1;
            let deadline = clock.now + duration;
            clock.sleepers.push(Sleeper {
                deadline,
                seq,
                wake,
            });
        }
        Box::pin(async move {
            if waiting.await.is_err() {
                // Scheduler dropped: virtual time can never reach the deadline.
                std::future::pending::<()>().await;
            }
        })
    }
}

/// Lets spawned tasks run up to their next suspension point.
pub async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}
