//! Descriptions of work a reducer asks the store to perform.
//!
//! An [`Effect`] is inert data until a [`Store`](crate::Store) starts it.
//! Effects compose algebraically:
//!
//! ```text
//! none | send(a) | run(stream) | fire_and_forget(fut)
//!      | merge([..]) | concatenate([..])
//!      | cancellable(e, id) | cancel(id)
//! ```
//!
//! Failures are never thrown out of an effect. Fallible work maps its
//! `Result` into an action and the owning reducer handles it like any other.

mod cancellation;
mod scheduler;

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, Stream, StreamExt};

pub use cancellation::{CancelId, CancelToken, CancellationRegistry};
pub use scheduler::{settle, Scheduler, SharedScheduler, TestScheduler, TokioScheduler};

/// Work that eventually yields zero or more actions of type `A`.
#[must_use = "an effect does nothing unless returned to the store"]
pub struct Effect<A> {
    kind: EffectKind<A>,
}

pub(crate) enum EffectKind<A> {
    None,
    Send(A),
    Run(BoxStream<'static, A>),
    FireAndForget(BoxFuture<'static, ()>),
    Merge(Vec<Effect<A>>),
    Concatenate(Vec<Effect<A>>),
    Cancellable { id: CancelId, effect: Box<Effect<A>> },
    Cancel(Vec<CancelId>),
}

impl<A: Send + 'static> Effect<A> {
    pub fn none() -> Self {
        Self {
            kind: EffectKind::None,
        }
    }

    /// Feeds `action` straight back into the store, before `send` returns.
    pub fn send(action: A) -> Self {
        Self {
            kind: EffectKind::Send(action),
        }
    }

    /// Forwards every item of `stream` to the store as it arrives.
    pub fn run<S>(stream: S) -> Self
    where
        S: Stream<Item = A> + Send + 'static,
    {
        Self {
            kind: EffectKind::Run(stream.boxed()),
        }
    }

    /// Awaits `future` and dispatches its output.
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self::run(stream::once(future))
    }

    /// Runs `future` for its side effect only.
    pub fn fire_and_forget<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            kind: EffectKind::FireAndForget(Box::pin(future)),
        }
    }

    /// Runs all effects concurrently, interleaving their actions.
    ///
    /// `none` members are dropped and nested merges are flattened.
    pub fn merge<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut flat = Vec::new();
        for effect in effects {
            match effect.kind {
                EffectKind::None => {}
                EffectKind::Merge(children) => flat.extend(children),
                kind => flat.push(Effect { kind }),
            }
        }
        Self::collapse(flat, EffectKind::Merge)
    }

    /// Runs effects one after another; each starts once the previous completed.
    pub fn concatenate<I>(effects: I) -> Self
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut flat = Vec::new();
        for effect in effects {
            match effect.kind {
                EffectKind::None => {}
                EffectKind::Concatenate(children) => flat.extend(children),
                kind => flat.push(Effect { kind }),
            }
        }
        Self::collapse(flat, EffectKind::Concatenate)
    }

    fn collapse(mut effects: Vec<Effect<A>>, wrap: fn(Vec<Effect<A>>) -> EffectKind<A>) -> Self {
        match effects.len() {
            0 => Self::none(),
            1 => effects.pop().unwrap_or_else(Self::none),
            _ => Self { kind: wrap(effects) },
        }
    }

    /// Cancels whatever is registered under `id`.
    pub fn cancel<K>(id: K) -> Self
    where
        K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            kind: EffectKind::Cancel(vec![CancelId::new(id)]),
        }
    }

    /// Cancels every id in `ids`.
    pub fn cancel_all<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = CancelId>,
    {
        let ids: Vec<_> = ids.into_iter().collect();
        if ids.is_empty() {
            return Self::none();
        }
        Self {
            kind: EffectKind::Cancel(ids),
        }
    }

    /// Registers this effect under `id`, cancelling any effect already
    /// registered there when this one starts.
    pub fn cancellable<K>(self, id: K) -> Self
    where
        K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            kind: EffectKind::Cancellable {
                id: CancelId::new(id),
                effect: Box::new(self),
            },
        }
    }

    /// Delays this effect by `delay`; a newer debounce under the same `id`
    /// replaces it, so only the last one in a burst runs.
    ///
    /// The delay is measured from when the store starts the effect.
    pub fn debounce<K>(self, id: K, delay: Duration, scheduler: &SharedScheduler) -> Self
    where
        K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        let scheduler = Arc::clone(scheduler);
        let wait = Self::fire_and_forget(async move { scheduler.sleep(delay).await });
        Self::concatenate([wait, self]).cancellable(id)
    }

    pub fn merge_with(self, other: Effect<A>) -> Self {
        Self::merge([self, other])
    }

    pub fn concat_with(self, other: Effect<A>) -> Self {
        Self::concatenate([self, other])
    }

    /// Transforms every action this effect produces.
    pub fn map<B, F>(self, f: F) -> Effect<B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(A) -> B + Send + Sync> = Arc::new(f);
        self.map_shared(&f)
    }

    fn map_shared<B>(self, f: &Arc<dyn Fn(A) -> B + Send + Sync>) -> Effect<B>
    where
        B: Send + 'static,
    {
        let kind = match self.kind {
            EffectKind::None => EffectKind::None,
            EffectKind::Send(action) => EffectKind::Send(f(action)),
            EffectKind::Run(stream) => {
                let f = Arc::clone(f);
                EffectKind::Run(stream.map(move |action| f(action)).boxed())
            }
            EffectKind::FireAndForget(future) => EffectKind::FireAndForget(future),
            EffectKind::Merge(effects) => {
                EffectKind::Merge(effects.into_iter().map(|e| e.map_shared(f)).collect())
            }
            EffectKind::Concatenate(effects) => {
                EffectKind::Concatenate(effects.into_iter().map(|e| e.map_shared(f)).collect())
            }
            EffectKind::Cancellable { id, effect } => EffectKind::Cancellable {
                id,
                effect: Box::new(effect.map_shared(f)),
            },
            EffectKind::Cancel(ids) => EffectKind::Cancel(ids),
        };
        Effect { kind }
    }
}

impl<A> Effect<A> {
    pub fn is_none(&self) -> bool {
        matches!(self.kind, EffectKind::None)
    }

    /// True when starting the effect needs no asynchronous task.
    pub fn is_synchronous(&self) -> bool {
        match &self.kind {
            EffectKind::None | EffectKind::Send(_) | EffectKind::Cancel(_) => true,
            EffectKind::Run(_) | EffectKind::FireAndForget(_) => false,
            EffectKind::Merge(effects) | EffectKind::Concatenate(effects) => {
                effects.iter().all(Effect::is_synchronous)
            }
            EffectKind::Cancellable { effect, .. } => effect.is_synchronous(),
        }
    }

    /// An equatable description of the effect tree.
    pub fn shape(&self) -> EffectShape<A>
    where
        A: Clone,
    {
        match &self.kind {
            EffectKind::None => EffectShape::None,
            EffectKind::Send(action) => EffectShape::Send(action.clone()),
            EffectKind::Run(_) => EffectShape::Run,
            EffectKind::FireAndForget(_) => EffectShape::FireAndForget,
            EffectKind::Merge(effects) => {
                EffectShape::Merge(effects.iter().map(Effect::shape).collect())
            }
            EffectKind::Concatenate(effects) => {
                EffectShape::Concatenate(effects.iter().map(Effect::shape).collect())
            }
            EffectKind::Cancellable { id, effect } => EffectShape::Cancellable {
                id: id.clone(),
                effect: Box::new(effect.shape()),
            },
            EffectKind::Cancel(ids) => EffectShape::Cancel(ids.clone()),
        }
    }

    pub(crate) fn from_kind(kind: EffectKind<A>) -> Self {
        Self { kind }
    }

    pub(crate) fn into_kind(self) -> EffectKind<A> {
        self.kind
    }
}

impl<A: fmt::Debug> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EffectKind::None => f.write_str("None"),
            EffectKind::Send(action) => f.debug_tuple("Send").field(action).finish(),
            EffectKind::Run(_) => f.write_str("Run(..)"),
            EffectKind::FireAndForget(_) => f.write_str("FireAndForget(..)"),
            EffectKind::Merge(effects) => f.debug_tuple("Merge").field(effects).finish(),
            EffectKind::Concatenate(effects) => {
                f.debug_tuple("Concatenate").field(effects).finish()
            }
            EffectKind::Cancellable { id, effect } => f
                .debug_struct("Cancellable")
                .field("id", id)
                .field("effect", effect)
                .finish(),
            EffectKind::Cancel(ids) => f.debug_tuple("Cancel").field(ids).finish(),
        }
    }
}

/// Structural description of an [`Effect`].
///
/// Asynchronous work is opaque and described only by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectShape<A> {
    None,
    Send(A),
    Run,
    FireAndForget,
    Merge(Vec<EffectShape<A>>),
    Concatenate(Vec<EffectShape<A>>),
    Cancellable {
        id: CancelId,
        effect: Box<EffectShape<A>>,
    },
    Cancel(Vec<CancelId>),
}
