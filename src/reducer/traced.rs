//! Debug logging around a reducer.

use std::fmt::Debug;

use tracing::Level;

use super::Reducer;
use crate::effect::Effect;

/// Result of [`ReducerExt::traced`](super::ReducerExt::traced).
pub struct Traced<R> {
    inner: R,
    label: &'static str,
}

impl<R> Traced<R> {
    pub(crate) fn new(inner: R, label: &'static str) -> Self {
        Self { inner, label }
    }
}

impl<R> Reducer for Traced<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug,
    R::Action: Debug,
{
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effect<Self::Action> {
        if !tracing::enabled!(Level::DEBUG) {
            return self.inner.reduce(state, action, env);
        }

        tracing::debug!(reducer = self.label, ?action, "received action");
        let before = state.clone();
        let effect = self.inner.reduce(state, action, env);
        let changed = *state != before;
        tracing::debug!(
            reducer = self.label,
            changed,
            synchronous = effect.is_synchronous(),
            "reduced"
        );
        if changed {
            tracing::trace!(reducer = self.label, ?state, "new state");
        }
        effect
    }
}
