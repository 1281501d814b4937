//! Reducers and the combinators that assemble feature reducers into one.
//!
//! # Architecture
//!
//! ```text
//! Action ──→ Reducer ──→ State (mutated in place)
//!    ↑          │
//!    │          └──→ Effect ──→ Store runs it
//!    └───────────────────────────────┘
//! ```
//!
//! A feature is written against its own state, action and environment.
//! [`ReducerExt::pullback`], [`ReducerExt::optional_pullback`] and
//! [`ReducerExt::for_each`] mount it inside a parent; [`ReducerExt::combine`]
//! and [`combine!`](crate::combine) run siblings against the same state;
//! [`ReducerExt::on_change`] reacts to a projected slice changing.

mod case_path;
mod combine;
mod on_change;
mod pullback;
mod traced;

use std::marker::PhantomData;
use std::sync::Arc;

use crate::effect::Effect;

pub use case_path::{CasePath, Lens};
pub use combine::{Combine, CombineAll};
pub use on_change::OnChange;
pub use pullback::{ForEach, OptionalPullback, Pullback};
pub use traced::Traced;

/// A reducer is the only place where state transitions happen.
///
/// `reduce` must be deterministic for a given state, action and environment,
/// must not perform I/O itself and must not block. Work that needs the
/// outside world goes into the returned [`Effect`].
pub trait Reducer: Send + Sync + 'static {
    /// The state this reducer operates on.
    type State: 'static;

    /// The actions this reducer handles.
    type Action: Send + 'static;

    /// Dependencies handed to every invocation.
    type Environment: 'static;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effect<Self::Action>;
}

pub type BoxReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E>>;

impl<R: Reducer + ?Sized> Reducer for Box<R> {
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effect<Self::Action> {
        (**self).reduce(state, action, env)
    }
}

impl<R: Reducer + ?Sized> Reducer for Arc<R> {
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effect<Self::Action> {
        (**self).reduce(state, action, env)
    }
}

/// Reducer built from a closure. See [`from_fn`].
pub struct FnReducer<S, A, E, F> {
    f: F,
    _marker: PhantomData<fn(&mut S, A, &E)>,
}

/// Wraps a closure as a [`Reducer`].
///
/// ```
/// use velostore::{reducer, Effect, Reducer};
///
/// let counter = reducer::from_fn(|count: &mut i32, delta: i32, _: &()| {
///     *count += delta;
///     Effect::none()
/// });
///
/// let mut count = 0;
/// let _ = counter.reduce(&mut count, 2, &());
/// assert_eq!(count, 2);
/// ```
pub fn from_fn<S, A, E, F>(f: F) -> FnReducer<S, A, E, F>
where
    F: Fn(&mut S, A, &E) -> Effect<A> + Send + Sync + 'static,
{
    FnReducer {
        f,
        _marker: PhantomData,
    }
}

impl<S, A, E, F> Reducer for FnReducer<S, A, E, F>
where
    S: 'static,
    A: Send + 'static,
    E: 'static,
    F: Fn(&mut S, A, &E) -> Effect<A> + Send + Sync + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(&self, state: &mut S, action: A, env: &E) -> Effect<A> {
        (self.f)(state, action, env)
    }
}

/// Combinator methods available on every [`Reducer`].
pub trait ReducerExt: Reducer + Sized {
    /// Mounts this reducer on a slice of a parent state.
    ///
    /// Parent actions the case path cannot extract leave the state untouched
    /// and produce no effect.
    fn pullback<PS, PA, PE, F>(
        self,
        lens: Lens<PS, Self::State>,
        case: CasePath<PA, Self::Action>,
        to_local_env: F,
    ) -> Pullback<Self, PS, PA, PE>
    where
        F: Fn(&PE) -> Self::Environment + Send + Sync + 'static,
        PE: 'static,
    {
        Pullback::new(self, lens, case, to_local_env)
    }

    /// Mounts this reducer on an optional slice of a parent state.
    ///
    /// When the slice is `None` the child reducer does not run and the
    /// action is dropped.
    fn optional_pullback<PS, PA, PE, F>(
        self,
        lens: Lens<PS, Option<Self::State>>,
        case: CasePath<PA, Self::Action>,
        to_local_env: F,
    ) -> OptionalPullback<Self, PS, PA, PE>
    where
        F: Fn(&PE) -> Self::Environment + Send + Sync + 'static,
        PE: 'static,
    {
        OptionalPullback::new(self, lens, case, to_local_env)
    }

    /// Mounts this reducer on every element of a collection, addressed by id.
    fn for_each<PS, PA, PE, Id, I, F>(
        self,
        lens: Lens<PS, Vec<Self::State>>,
        case: CasePath<PA, (Id, Self::Action)>,
        id_of: I,
        to_local_env: F,
    ) -> ForEach<Self, PS, PA, PE, Id>
    where
        I: Fn(&Self::State) -> Id + Send + Sync + 'static,
        F: Fn(&PE) -> Self::Environment + Send + Sync + 'static,
        PE: 'static,
    {
        ForEach::new(self, lens, case, id_of, to_local_env)
    }

    /// Runs `self` then `other` against the same state, merging their effects.
    fn combine<R>(self, other: R) -> Combine<Self, R>
    where
        R: Reducer<State = Self::State, Action = Self::Action, Environment = Self::Environment>,
    {
        Combine::new(self, other)
    }

    /// Runs `body` after every action that changed `projection(state)`.
    fn on_change<V, P, B>(self, projection: P, body: B) -> OnChange<Self, V, P, B>
    where
        V: PartialEq,
        P: Fn(&Self::State) -> V + Send + Sync + 'static,
        B: Fn(&V, &mut Self::State, &Self::Action, &Self::Environment) -> Effect<Self::Action>
            + Send
            + Sync
            + 'static,
    {
        OnChange::new(self, projection, body)
    }

    /// Logs every action through `tracing` under `label`.
    fn traced(self, label: &'static str) -> Traced<Self> {
        Traced::new(self, label)
    }

    fn boxed(self) -> BoxReducer<Self::State, Self::Action, Self::Environment> {
        Box::new(self)
    }
}

impl<R: Reducer> ReducerExt for R {}
