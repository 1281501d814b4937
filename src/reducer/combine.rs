//! Running several reducers against the same state.

use super::{BoxReducer, Reducer};
use crate::effect::Effect;

/// Result of [`ReducerExt::combine`](super::ReducerExt::combine).
///
/// `second` sees every mutation `first` made. The two effects are merged,
/// so their completion order is unspecified.
pub struct Combine<R1, R2> {
    first: R1,
    second: R2,
}

impl<R1, R2> Combine<R1, R2> {
    pub(crate) fn new(first: R1, second: R2) -> Self {
        Self { first, second }
    }
}

impl<R1, R2> Reducer for Combine<R1, R2>
where
    R1: Reducer,
    R1::Action: Clone,
    R2: Reducer<State = R1::State, Action = R1::Action, Environment = R1::Environment>,
{
    type State = R1::State;
    type Action = R1::Action;
    type Environment = R1::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effect<Self::Action> {
        let first = self.first.reduce(state, action.clone(), env);
        let second = self.second.reduce(state, action, env);
        Effect::merge([first, second])
    }
}

/// A runtime-sized list of reducers, run in order.
pub struct CombineAll<S, A, E> {
    reducers: Vec<BoxReducer<S, A, E>>,
}

impl<S, A, E> CombineAll<S, A, E> {
    pub fn new(reducers: Vec<BoxReducer<S, A, E>>) -> Self {
        Self { reducers }
    }

    pub fn push(&mut self, reducer: BoxReducer<S, A, E>) {
        self.reducers.push(reducer);
    }

    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombineAll<S, A, E>
where
    S: 'static,
    A: Clone + Send + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(&self, state: &mut S, action: A, env: &E) -> Effect<A> {
        let Some((last, rest)) = self.reducers.split_last() else {
            return Effect::none();
        };
        let mut effects = Vec::with_capacity(self.reducers.len());
        for reducer in rest {
            effects.push(reducer.reduce(state, action.clone(), env));
        }
        effects.push(last.reduce(state, action, env));
        Effect::merge(effects)
    }
}

/// Combines any number of reducers, run in the order given.
///
/// ```
/// use velostore::{combine, reducer, Effect, Reducer};
///
/// let double = reducer::from_fn(|n: &mut i32, _: (), _: &()| { *n *= 2; Effect::none() });
/// let add_one = reducer::from_fn(|n: &mut i32, _: (), _: &()| { *n += 1; Effect::none() });
/// let both = combine!(double, add_one);
///
/// let mut n = 3;
/// let _ = both.reduce(&mut n, (), &());
/// assert_eq!(n, 7);
/// ```
#[macro_export]
macro_rules! combine {
    ($only:expr $(,)?) => {
        $only
    };
    ($first:expr, $($rest:expr),+ $(,)?) => {
        $crate::ReducerExt::combine($first, $crate::combine!($($rest),+))
    };
}
