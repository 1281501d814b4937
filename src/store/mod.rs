//! The runtime that owns state and drives the send → reduce → effect loop.
//!
//! # State machine
//!
//! ```text
//! idle ──send(action)──→ processing ──queue drained──→ idle
//! ```
//!
//! Exactly one reducer invocation runs at a time. Callers take turns
//! draining the queue: whoever finds a drain in progress waits for it and
//! then reduces what is left, so every `send` has been reduced by the time
//! it returns. Nothing recurses into the reducer.

mod reentrancy;
mod runner;
mod scoped;

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use uuid::Uuid;

use crate::effect::{CancellationRegistry, Effect};
use crate::reducer::Reducer;

use reentrancy::ReducingGuard;
use runner::{ActionSink, EffectRunner, Envelope, Queued, Scope};

pub use scoped::ScopedStore;

/// Default for [`StoreOptions::drain_warning_threshold`].
pub const DEFAULT_DRAIN_WARNING_THRESHOLD: usize = 1000;

/// Errors raised while constructing a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No Tokio runtime available to run effects: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// Tuning knobs for a [`Store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// A single drain reducing more actions than this logs a warning; it
    /// usually means two reducers keep answering each other.
    pub drain_warning_threshold: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            drain_warning_threshold: DEFAULT_DRAIN_WARNING_THRESHOLD,
        }
    }
}

/// Owner of the application state.
///
/// Cloning a `Store` yields another handle to the same state. When the
/// last handle is dropped every cancellable effect it started is cancelled.
pub struct Store<R: Reducer> {
    inner: Arc<StoreInner<R>>,
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<R: Reducer> {
    id: Uuid,
    state: Mutex<R::State>,
    queue: Mutex<VecDeque<Queued<R::Action>>>,
    draining: Mutex<()>,
    reducer: R,
    environment: R::Environment,
    runner: EffectRunner<R::Action>,
    observers: watch::Sender<R::State>,
    options: StoreOptions,
}

impl<R> Store<R>
where
    R: Reducer,
    R::State: Clone + Send + Sync,
    R::Environment: Send + Sync,
{
    /// Creates a store whose effects run on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime; use [`Store::try_new`]
    /// or [`Store::with_runtime`] to avoid that.
    pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
        Self::with_options(initial_state, reducer, environment, StoreOptions::default())
    }

    /// Like [`Store::new`], failing instead of panicking without a runtime.
    pub fn try_new(
        initial_state: R::State,
        reducer: R,
        environment: R::Environment,
    ) -> Result<Self, StoreError> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(
            initial_state,
            reducer,
            environment,
            StoreOptions::default(),
            runtime,
        ))
    }

    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn with_options(
        initial_state: R::State,
        reducer: R,
        environment: R::Environment,
        options: StoreOptions,
    ) -> Self {
        Self::with_runtime(initial_state, reducer, environment, options, Handle::current())
    }

    pub fn with_runtime(
        initial_state: R::State,
        reducer: R,
        environment: R::Environment,
        options: StoreOptions,
        runtime: Handle,
    ) -> Self {
        let (observers, _) = watch::channel(initial_state.clone());
        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner<R>>| {
            let sink: Weak<dyn ActionSink<R::Action>> = weak.clone();
            StoreInner {
                id: Uuid::new_v4(),
                state: Mutex::new(initial_state),
                queue: Mutex::new(VecDeque::new()),
                draining: Mutex::new(()),
                reducer,
                environment,
                runner: EffectRunner::new(CancellationRegistry::new(), runtime, sink),
                observers,
                options,
            }
        });
        tracing::debug!(store = %inner.id, "store created");
        Self { inner }
    }

    /// Dispatches `action`.
    ///
    /// The reducer runs synchronously; actions the resulting effect yields
    /// without suspending are reduced, depth first, before this returns.
    /// When another thread is draining, this blocks until that drain ends
    /// and then reduces `action` itself.
    ///
    /// # Panics
    ///
    /// Panics when called from inside one of this store's own reducer
    /// invocations.
    pub fn send(&self, action: R::Action) {
        self.assert_not_reducing("send");
        self.inner
            .queue
            .lock()
            .push_back(Queued::Action(Envelope::new(action)));
        self.inner.drain();
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> R::State {
        self.with_state(Clone::clone)
    }

    /// Reads the current state without cloning it.
    pub fn with_state<T>(&self, read: impl FnOnce(&R::State) -> T) -> T {
        self.assert_not_reducing("read state");
        read(&self.inner.state.lock())
    }

    /// A receiver that sees the state after every completed drain.
    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.inner.observers.subscribe()
    }

    /// Actions queued but not yet reduced.
    pub fn pending_actions(&self) -> usize {
        self.inner
            .queue
            .lock()
            .iter()
            .filter(|queued| queued.is_action())
            .count()
    }

    /// Asynchronous effect tasks still running.
    pub fn effects_in_flight(&self) -> usize {
        self.inner.runner.in_flight().get()
    }

    /// Resolves once no asynchronous effect task is running.
    pub async fn wait_for_effects(&self) {
        self.inner.runner.in_flight().wait_idle().await;
    }

    /// The registry of this store's cancellable effects.
    pub fn cancellations(&self) -> &CancellationRegistry {
        self.inner.runner.registry()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    /// A view onto part of this store for a child feature.
    pub fn scope<CS, CA, S, F>(&self, to_local: S, from_local: F) -> ScopedStore<CS, CA>
    where
        CS: 'static,
        CA: 'static,
        S: Fn(&R::State) -> CS + Send + Sync + 'static,
        F: Fn(CA) -> R::Action + Send + Sync + 'static,
    {
        let reader = self.clone();
        let sender = self.clone();
        ScopedStore::new(
            move || reader.with_state(&to_local),
            move |action| sender.send(from_local(action)),
        )
    }

    fn assert_not_reducing(&self, operation: &str) {
        if ReducingGuard::is_active(self.inner.id) {
            panic!(
                "cannot {operation} on store {} from inside its own reducer; return an effect instead",
                self.inner.id
            );
        }
    }
}

impl<R> StoreInner<R>
where
    R: Reducer,
    R::State: Clone + Send + Sync,
    R::Environment: Send + Sync,
{
    /// Reduces everything queued, waiting first for any drain already
    /// running on another thread.
    fn drain(&self) {
        let _draining = self.draining.lock();
        if self.process_queue() > 0 {
            self.publish();
        }
    }

    fn process_queue(&self) -> usize {
        let mut processed = 0usize;
        loop {
            let Some(next) = self.queue.lock().pop_front() else {
                return processed;
            };
            let envelope = match next {
                Queued::Action(envelope) => envelope,
                Queued::Resume { effect, scopes } => {
                    if scopes.iter().any(|scope| scope.is_cancelled()) {
                        tracing::trace!(store = %self.id, "dropping rest of cancelled sequence");
                    } else {
                        self.start_effect(effect, &scopes);
                    }
                    continue;
                }
            };
            if envelope.is_stale() {
                tracing::trace!(store = %self.id, "dropping action from cancelled effect");
                continue;
            }

            let effect = {
                let mut state = self.state.lock();
                let _reducing = ReducingGuard::enter(self.id);
                self.reducer
                    .reduce(&mut state, envelope.action, &self.environment)
            };
            processed += 1;
            if processed == self.options.drain_warning_threshold + 1 {
                tracing::warn!(
                    store = %self.id,
                    threshold = self.options.drain_warning_threshold,
                    "drain exceeded action threshold; possible feedback loop"
                );
            }
            self.start_effect(effect, &[]);
        }
    }

    /// Starts `effect`, putting whatever it yields synchronously at the front
    /// of the queue.
    fn start_effect(&self, effect: Effect<R::Action>, scopes: &[Arc<Scope>]) {
        let mut immediate = Vec::new();
        self.runner.start(effect, scopes, &mut immediate);
        if !immediate.is_empty() {
            let mut queue = self.queue.lock();
            for queued in immediate.into_iter().rev() {
                queue.push_front(queued);
            }
        }
    }

    fn publish(&self) {
        let snapshot = self.state.lock().clone();
        self.observers.send_replace(snapshot);
    }
}

impl<R> ActionSink<R::Action> for StoreInner<R>
where
    R: Reducer,
    R::State: Clone + Send + Sync,
    R::Environment: Send + Sync,
{
    fn deliver(&self, envelope: Envelope<R::Action>) {
        self.queue.lock().push_back(Queued::Action(envelope));
        self.drain();
    }
}

impl<R: Reducer> Drop for StoreInner<R> {
    fn drop(&mut self) {
        self.runner.registry().cancel_all();
        tracing::debug!(store = %self.id, "store torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{SharedScheduler, TokioScheduler};
    use crate::reducer::from_fn;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Start,
        Step(u32),
    }

    #[tokio::test]
    async fn synchronous_actions_are_processed_depth_first() {
        let reducer = from_fn(|log: &mut Vec<String>, action: Action, _: &()| match action {
            Action::Start => {
                log.push("start".into());
                Effect::merge([Effect::send(Action::Step(1)), Effect::send(Action::Step(3))])
            }
            Action::Step(n) => {
                log.push(format!("step {n}"));
                if n == 1 {
                    Effect::send(Action::Step(2))
                } else {
                    Effect::none()
                }
            }
        });
        let store = Store::new(Vec::new(), reducer, ());
        store.send(Action::Start);

        assert_eq!(store.state(), vec!["start", "step 1", "step 2", "step 3"]);
        assert_eq!(store.pending_actions(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_state_after_send() {
        let reducer = from_fn(|n: &mut u32, _: Action, _: &()| {
            *n += 1;
            Effect::none()
        });
        let store = Store::new(0u32, reducer, ());
        let receiver = store.subscribe();
        store.send(Action::Start);
        assert_eq!(*receiver.borrow(), 1);
    }

    #[test]
    fn try_new_without_runtime_fails() {
        let reducer = from_fn(|_: &mut (), _: Action, _: &()| Effect::none());
        let result = Store::try_new((), reducer, ());
        assert!(matches!(result, Err(StoreError::NoRuntime(_))));
    }

    #[test]
    fn with_runtime_works_from_outside_the_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let reducer = from_fn(|n: &mut u32, _: Action, _: &()| {
            *n += 1;
            Effect::none()
        });
        let store = Store::with_runtime(
            0,
            reducer,
            (),
            StoreOptions::default(),
            runtime.handle().clone(),
        );
        store.send(Action::Start);
        assert_eq!(store.state(), 1);
    }

    #[derive(Debug, Hash, PartialEq, Eq)]
    struct Settle;

    #[test]
    fn debounced_effect_sent_from_outside_the_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let scheduler = TokioScheduler::shared();
        let reducer = from_fn(|n: &mut u32, action: Action, clock: &SharedScheduler| match action {
            Action::Start => {
                Effect::send(Action::Step(1)).debounce(Settle, Duration::from_millis(10), clock)
            }
            Action::Step(_) => {
                *n += 1;
                Effect::none()
            }
        });
        let store = Store::with_runtime(
            0,
            reducer,
            scheduler,
            StoreOptions::default(),
            runtime.handle().clone(),
        );

        store.send(Action::Start);
        store.send(Action::Start);
        runtime.block_on(store.wait_for_effects());

        assert_eq!(store.state(), 1);
    }
}
