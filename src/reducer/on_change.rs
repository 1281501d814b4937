//! Reactions to a projected slice of state changing.

use std::marker::PhantomData;

use super::Reducer;
use crate::effect::Effect;

/// Result of [`ReducerExt::on_change`](super::ReducerExt::on_change).
///
/// Only `projection(state)` is compared, so unrelated mutations never
/// trigger the body.
pub struct OnChange<R, V, P, B> {
    inner: R,
    projection: P,
    body: B,
    _value: PhantomData<fn() -> V>,
}

impl<R, V, P, B> OnChange<R, V, P, B> {
    pub(crate) fn new(inner: R, projection: P, body: B) -> Self {
        Self {
            inner,
            projection,
            body,
            _value: PhantomData,
        }
    }
}

impl<R, V, P, B> Reducer for OnChange<R, V, P, B>
where
    R: Reducer,
    R::Action: Clone,
    V: PartialEq + 'static,
    P: Fn(&R::State) -> V + Send + Sync + 'static,
    B: Fn(&V, &mut R::State, &R::Action, &R::Environment) -> Effect<R::Action>
        + Send
        + Sync
        + 'static,
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
        let before = (self.projection)(state);
        let received = action.clone();
        let effect = self.inner.reduce(state, action, env);
        let after = (self.projection)(state);
        if before == after {
            return effect;
        }
        let reaction = (self.body)(&after, state, &received, env);
        Effect::merge([effect, reaction])
    }
}
