//! Scoping combinators: run a child reducer inside a parent's state.

use std::fmt::Debug;
use std::sync::Arc;

use super::case_path::{CasePath, Lens};
use super::Reducer;
use crate::effect::Effect;

type EnvMap<PE, CE> = Arc<dyn Fn(&PE) -> CE + Send + Sync>;

/// Result of [`ReducerExt::pullback`](super::ReducerExt::pullback).
pub struct Pullback<R: Reducer, PS, PA, PE> {
    child: R,
    lens: Lens<PS, R::State>,
    case: CasePath<PA, R::Action>,
    to_local_env: EnvMap<PE, R::Environment>,
}

impl<R: Reducer, PS, PA, PE: 'static> Pullback<R, PS, PA, PE> {
    pub(crate) fn new<F>(
        child: R,
        lens: Lens<PS, R::State>,
        case: CasePath<PA, R::Action>,
        to_local_env: F,
    ) -> Self
    where
        F: Fn(&PE) -> R::Environment + Send + Sync + 'static,
    {
        Self {
            child,
            lens,
            case,
            to_local_env: Arc::new(to_local_env),
        }
    }
}

impl<R, PS, PA, PE> Reducer for Pullback<R, PS, PA, PE>
where
    R: Reducer,
    PS: 'static,
    PA: Send + 'static,
    PE: 'static,
{
    type State = PS;
    type Action = PA;
    type Environment = PE;

    fn reduce(&self, state: &mut PS, action: PA, env: &PE) -> Effect<PA> {
        let Some(local) = self.case.extract(action) else {
            return Effect::none();
        };
        let local_env = (self.to_local_env)(env);
        let effect = self
            .child
            .reduce(self.lens.get_mut(state), local, &local_env);
        let embed = self.case.embedder();
        effect.map(move |action| embed(action))
    }
}

/// Result of [`ReducerExt::optional_pullback`](super::ReducerExt::optional_pullback).
pub struct OptionalPullback<R: Reducer, PS, PA, PE> {
    child: R,
    lens: Lens<PS, Option<R::State>>,
    case: CasePath<PA, R::Action>,
    to_local_env: EnvMap<PE, R::Environment>,
}

impl<R: Reducer, PS, PA, PE: 'static> OptionalPullback<R, PS, PA, PE> {
    pub(crate) fn new<F>(
        child: R,
        lens: Lens<PS, Option<R::State>>,
        case: CasePath<PA, R::Action>,
        to_local_env: F,
    ) -> Self
    where
        F: Fn(&PE) -> R::Environment + Send + Sync + 'static,
    {
        Self {
            child,
            lens,
            case,
            to_local_env: Arc::new(to_local_env),
        }
    }
}

impl<R, PS, PA, PE> Reducer for OptionalPullback<R, PS, PA, PE>
where
    R: Reducer,
    PS: 'static,
    PA: Send + 'static,
    PE: 'static,
{
    type State = PS;
    type Action = PA;
    type Environment = PE;

    fn reduce(&self, state: &mut PS, action: PA, env: &PE) -> Effect<PA> {
        let Some(local) = self.case.extract(action) else {
            return Effect::none();
        };
        let Some(child_state) = self.lens.get_mut(state).as_mut() else {
            // A dismissal raced an in-flight response; the feature is gone.
            tracing::trace!(
                child = std::any::type_name::<R::State>(),
                "dropping action for absent optional state"
            );
            return Effect::none();
        };
        let local_env = (self.to_local_env)(env);
        let effect = self.child.reduce(child_state, local, &local_env);
        let embed = self.case.embedder();
        effect.map(move |action| embed(action))
    }
}

/// Result of [`ReducerExt::for_each`](super::ReducerExt::for_each).
pub struct ForEach<R: Reducer, PS, PA, PE, Id> {
    child: R,
    lens: Lens<PS, Vec<R::State>>,
    case: CasePath<PA, (Id, R::Action)>,
    id_of: Arc<dyn Fn(&R::State) -> Id + Send + Sync>,
    to_local_env: EnvMap<PE, R::Environment>,
}

impl<R: Reducer, PS, PA, PE: 'static, Id> ForEach<R, PS, PA, PE, Id> {
    pub(crate) fn new<I, F>(
        child: R,
        lens: Lens<PS, Vec<R::State>>,
        case: CasePath<PA, (Id, R::Action)>,
        id_of: I,
        to_local_env: F,
    ) -> Self
    where
        I: Fn(&R::State) -> Id + Send + Sync + 'static,
        F: Fn(&PE) -> R::Environment + Send + Sync + 'static,
    {
        Self {
            child,
            lens,
            case,
            id_of: Arc::new(id_of),
            to_local_env: Arc::new(to_local_env),
        }
    }
}

impl<R, PS, PA, PE, Id> Reducer for ForEach<R, PS, PA, PE, Id>
where
    R: Reducer,
    PS: 'static,
    PA: Send + 'static,
    PE: 'static,
    Id: PartialEq + Clone + Debug + Send + Sync + 'static,
{
    type State = PS;
    type Action = PA;
    type Environment = PE;

    fn reduce(&self, state: &mut PS, action: PA, env: &PE) -> Effect<PA> {
        let Some((id, local)) = self.case.extract(action) else {
            return Effect::none();
        };
        let elements = self.lens.get_mut(state);
        let Some(element) = elements.iter_mut().find(|e| (self.id_of)(&**e) == id) else {
            tracing::trace!(?id, "dropping action for missing element");
            return Effect::none();
        };
        let local_env = (self.to_local_env)(env);
        let effect = self.child.reduce(element, local, &local_env);
        let embed = self.case.embedder();
        effect.map(move |action| embed((id.clone(), action)))
    }
}
