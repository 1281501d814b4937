//! Starting effects and routing their actions back to the store.

use std::iter;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::future::{self, join_all, BoxFuture};
use futures::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::Notify;

use crate::effect::{CancelId, CancelToken, CancellationRegistry, Effect, EffectKind};

/// A live registration of one cancellable effect.
///
/// Every task, queued action and pending continuation started under the
/// registration holds a clone; the registry entry is released when the last
/// one is dropped.
pub(crate) struct Scope {
    id: CancelId,
    token: CancelToken,
    registry: CancellationRegistry,
}

impl Scope {
    fn register(registry: &CancellationRegistry, id: CancelId) -> Arc<Self> {
        let token = registry.register(id.clone());
        Arc::new(Self {
            id,
            token,
            registry: registry.clone(),
        })
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.registry.complete(&self.id, &self.token);
    }
}

/// Resolves once any of `scopes` is cancelled; never when there are none.
async fn any_cancelled(scopes: &[Arc<Scope>]) {
    if scopes.is_empty() {
        return future::pending().await;
    }
    future::select_all(scopes.iter().map(|scope| Box::pin(scope.token.cancelled()))).await;
}

/// An action on its way into the store, with the scopes of every
/// cancellable effect it was produced under.
pub(crate) struct Envelope<A> {
    pub(crate) action: A,
    scopes: Vec<Arc<Scope>>,
}

impl<A> Envelope<A> {
    pub(crate) fn new(action: A) -> Self {
        Self {
            action,
            scopes: Vec::new(),
        }
    }

    fn guarded(action: A, scopes: &[Arc<Scope>]) -> Self {
        Self {
            action,
            scopes: scopes.to_vec(),
        }
    }

    /// True once any effect this action came from has been cancelled.
    pub(crate) fn is_stale(&self) -> bool {
        self.scopes.iter().any(|scope| scope.is_cancelled())
    }
}

/// An entry in the store's queue.
pub(crate) enum Queued<A> {
    Action(Envelope<A>),
    /// The rest of a concatenation, started once everything queued ahead of
    /// it has been reduced.
    Resume {
        effect: Effect<A>,
        scopes: Vec<Arc<Scope>>,
    },
}

impl<A> Queued<A> {
    pub(crate) fn is_action(&self) -> bool {
        matches!(self, Queued::Action(_))
    }
}

/// Receiver of actions produced by running effects.
pub(crate) trait ActionSink<A>: Send + Sync {
    fn deliver(&self, envelope: Envelope<A>);
}

/// Count of spawned effect tasks, with a wake-up when it drops to zero.
#[derive(Default)]
pub(crate) struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn begin(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn end(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub(crate) fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Executes effects for one store.
pub(crate) struct EffectRunner<A> {
    registry: CancellationRegistry,
    runtime: Handle,
    sink: Weak<dyn ActionSink<A>>,
    in_flight: Arc<InFlight>,
}

impl<A> Clone for EffectRunner<A> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            runtime: self.runtime.clone(),
            sink: Weak::clone(&self.sink),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<A: Send + 'static> EffectRunner<A> {
    pub(crate) fn new(
        registry: CancellationRegistry,
        runtime: Handle,
        sink: Weak<dyn ActionSink<A>>,
    ) -> Self {
        Self {
            registry,
            runtime,
            sink,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub(crate) fn registry(&self) -> &CancellationRegistry {
        &self.registry
    }

    pub(crate) fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Starts `effect` from inside the drain loop.
    ///
    /// Everything that can happen without suspending happens now: cancels
    /// are applied and sends are appended to `immediate` in production order.
    /// The asynchronous remainder is spawned as one task.
    pub(crate) fn start(
        &self,
        effect: Effect<A>,
        scopes: &[Arc<Scope>],
        immediate: &mut Vec<Queued<A>>,
    ) {
        let mut deferred = Vec::new();
        self.split(effect, scopes, immediate, &mut deferred);
        if !deferred.is_empty() {
            self.spawn(Effect::merge(deferred), scopes.to_vec());
        }
    }

    fn split(
        &self,
        effect: Effect<A>,
        scopes: &[Arc<Scope>],
        immediate: &mut Vec<Queued<A>>,
        deferred: &mut Vec<Effect<A>>,
    ) {
        match effect.into_kind() {
            EffectKind::None => {}
            EffectKind::Send(action) => {
                immediate.push(Queued::Action(Envelope::guarded(action, scopes)));
            }
            EffectKind::Cancel(ids) => {
                for id in &ids {
                    self.registry.cancel(id);
                }
            }
            EffectKind::Merge(effects) => {
                for effect in effects {
                    self.split(effect, scopes, immediate, deferred);
                }
            }
            EffectKind::Concatenate(effects) => {
                let mut effects = effects.into_iter();
                while let Some(effect) = effects.next() {
                    if !effect.is_synchronous() {
                        deferred.push(Effect::concatenate(iter::once(effect).chain(effects)));
                        return;
                    }
                    let queued = immediate.len();
                    self.split(effect, scopes, immediate, deferred);
                    if immediate.len() > queued {
                        // Later members wait for the actions just queued.
                        let rest = Effect::concatenate(effects);
                        if !rest.is_none() {
                            immediate.push(Queued::Resume {
                                effect: rest,
                                scopes: scopes.to_vec(),
                            });
                        }
                        return;
                    }
                }
            }
            EffectKind::Cancellable { id, effect } => {
                let mut scopes = scopes.to_vec();
                scopes.push(Scope::register(&self.registry, id));
                self.start(*effect, &scopes, immediate);
            }
            kind @ (EffectKind::Run(_) | EffectKind::FireAndForget(_)) => {
                deferred.push(Effect::from_kind(kind));
            }
        }
    }

    fn spawn(&self, effect: Effect<A>, scopes: Vec<Arc<Scope>>) {
        let runner = self.clone();
        self.spawn_task(async move {
            tokio::select! {
                _ = runner.run(effect, scopes.clone()) => {}
                _ = any_cancelled(&scopes) => {
                    tracing::trace!("effect stopped by cancellation");
                }
            }
        });
    }

    fn spawn_task<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.in_flight.begin();
        let in_flight = Arc::clone(&self.in_flight);
        self.runtime.spawn(async move {
            let _finished = scopeguard::guard(in_flight, |in_flight| in_flight.end());
            task.await;
        });
    }

    fn run(&self, effect: Effect<A>, scopes: Vec<Arc<Scope>>) -> BoxFuture<'static, ()> {
        let runner = self.clone();
        Box::pin(async move {
            match effect.into_kind() {
                EffectKind::None => {}
                EffectKind::Send(action) => {
                    runner.deliver(Envelope::guarded(action, &scopes));
                }
                EffectKind::Run(mut stream) => {
                    while let Some(action) = stream.next().await {
                        if !runner.deliver(Envelope::guarded(action, &scopes)) {
                            break;
                        }
                    }
                }
                EffectKind::FireAndForget(future) => future.await,
                EffectKind::Merge(effects) => {
                    join_all(
                        effects
                            .into_iter()
                            .map(|effect| runner.run(effect, scopes.clone())),
                    )
                    .await;
                }
                EffectKind::Concatenate(effects) => {
                    for effect in effects {
                        runner.run(effect, scopes.clone()).await;
                    }
                }
                EffectKind::Cancellable { id, effect } => {
                    let scope = Scope::register(&runner.registry, id.clone());
                    let mut scopes = scopes;
                    scopes.push(Arc::clone(&scope));
                    tokio::select! {
                        _ = runner.run(*effect, scopes) => {}
                        _ = scope.token.cancelled() => {
                            tracing::trace!(?id, "effect stopped by cancellation");
                        }
                    }
                }
                EffectKind::Cancel(ids) => {
                    for id in &ids {
                        runner.registry.cancel(id);
                    }
                }
            }
        })
    }

    /// Hands an action to the store. Returns `false` when it should stop
    /// producing: the store is gone or the effect was cancelled.
    fn deliver(&self, envelope: Envelope<A>) -> bool {
        if envelope.is_stale() {
            return false;
        }
        match self.sink.upgrade() {
            Some(sink) => {
                sink.deliver(envelope);
                true
            }
            None => false,
        }
    }
}
