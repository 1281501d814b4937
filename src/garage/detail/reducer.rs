use crate::effect::Effect;
use crate::garage::detail::action::BikeDetailAction;
use crate::garage::detail::state::BikeDetailState;
use crate::garage::detail::DetailEnvironment;
use crate::garage::state::Component;
use crate::reducer::Reducer;

/// Cancellation id of the in-flight brand lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrandLookup;

pub struct BikeDetailReducer;

impl Reducer for BikeDetailReducer {
    type State = BikeDetailState;
    type Action = BikeDetailAction;
    type Environment = DetailEnvironment;

    fn reduce(
        &self,
        state: &mut BikeDetailState,
        action: BikeDetailAction,
        env: &DetailEnvironment,
    ) -> Effect<BikeDetailAction> {
        match action {
            BikeDetailAction::ServiceComponent(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Effect::none();
                }
                let odometer = state.bike.distance_km;
                match state
                    .bike
                    .components
                    .iter_mut()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
                {
                    Some(component) => component.serviced_at_km = odometer,
                    None => state.bike.components.push(Component {
                        name: name.to_string(),
                        serviced_at_km: odometer,
                    }),
                }
                Effect::none()
            }
            BikeDetailAction::LoadBrandInfo => {
                state.loading_brand = true;
                state.error = None;
                Effect::future(env.catalog.lookup(state.bike.brand()))
                    .map(BikeDetailAction::BrandInfoLoaded)
                    .cancellable(BrandLookup)
            }
            BikeDetailAction::BrandInfoLoaded(Ok(info)) => {
                state.loading_brand = false;
                state.brand = Some(info);
                Effect::none()
            }
            BikeDetailAction::BrandInfoLoaded(Err(e)) => {
                state.loading_brand = false;
                state.error = Some(e.to_string());
                Effect::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{CancelId, EffectShape};
    use crate::garage::catalog::StaticCatalog;
    use crate::garage::state::Bike;
    use std::sync::Arc;
    use uuid::Uuid;

    fn env() -> DetailEnvironment {
        DetailEnvironment {
            catalog: Arc::new(StaticCatalog::builtin()),
        }
    }

    fn detail() -> BikeDetailState {
        let mut bike = Bike::new(Uuid::new_v4(), "Trek Domane");
        bike.distance_km = 1200.0;
        BikeDetailState::new(bike)
    }

    #[test]
    fn service_adds_then_resets_component() {
        let mut state = detail();
        let _ = BikeDetailReducer.reduce(
            &mut state,
            BikeDetailAction::ServiceComponent("Chain".into()),
            &env(),
        );
        assert_eq!(state.bike.components.len(), 1);
        assert_eq!(state.bike.components[0].serviced_at_km, 1200.0);

        state.bike.distance_km = 1500.0;
        let _ = BikeDetailReducer.reduce(
            &mut state,
            BikeDetailAction::ServiceComponent("chain".into()),
            &env(),
        );
        assert_eq!(state.bike.components.len(), 1);
        assert_eq!(state.bike.components[0].serviced_at_km, 1500.0);
    }

    #[test]
    fn brand_lookup_is_cancellable_async_work() {
        let mut state = detail();
        let effect = BikeDetailReducer.reduce(&mut state, BikeDetailAction::LoadBrandInfo, &env());
        assert!(state.loading_brand);
        assert_eq!(
            effect.shape(),
            EffectShape::Cancellable {
                id: CancelId::new(BrandLookup),
                effect: Box::new(EffectShape::Run),
            }
        );
    }
}
