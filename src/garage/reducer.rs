use crate::effect::Effect;
use crate::garage::action::GarageAction;
use crate::garage::bike::BikeRowReducer;
use crate::garage::detail::{BikeDetailReducer, BikeDetailState, BrandLookup};
use crate::garage::environment::GarageEnvironment;
use crate::garage::state::{Bike, GarageState};
use crate::reducer::{Reducer, ReducerExt};
use crate::{case_path, combine, lens};

/// Cancellation id of the pending debounced save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersistDebounce;

/// Actions owned by the garage itself: the list, selection and settings.
pub struct GarageReducer;

impl Reducer for GarageReducer {
    type State = GarageState;
    type Action = GarageAction;
    type Environment = GarageEnvironment;

    fn reduce(
        &self,
        state: &mut GarageState,
        action: GarageAction,
        env: &GarageEnvironment,
    ) -> Effect<GarageAction> {
        match action {
            GarageAction::Load => {
                Effect::future(env.persistence.load()).map(GarageAction::Loaded)
            }
            GarageAction::Loaded(Ok(bikes)) => {
                state.bikes = bikes;
                state.last_error = None;
                Effect::none()
            }
            GarageAction::Loaded(Err(e)) | GarageAction::Saved(Err(e)) => {
                tracing::warn!(error = %e, "garage persistence failed");
                state.last_error = Some(e.to_string());
                Effect::none()
            }
            GarageAction::Saved(Ok(())) => {
                state.last_error = None;
                Effect::none()
            }
            GarageAction::AddBike { id, name } => {
                let name = name.trim();
                if name.is_empty() {
                    state.last_error = Some("A bike needs a name".to_string());
                } else if state.bike_named(name).is_some() {
                    state.last_error = Some(format!("A bike named '{}' already exists", name));
                } else {
                    state.bikes.push(Bike::new(id, name));
                    state.last_error = None;
                }
                Effect::none()
            }
            GarageAction::RemoveBike(id) => {
                state.bikes.retain(|b| b.id != id);
                if state.selected.as_ref().is_some_and(|d| d.bike.id == id) {
                    state.selected = None;
                    return Effect::cancel(BrandLookup);
                }
                Effect::none()
            }
            GarageAction::Select(id) => {
                let Some(bike) = state.bike(id).cloned() else {
                    return Effect::none();
                };
                state.selected = Some(BikeDetailState::new(bike));
                // A lookup started for the previous selection must not land here.
                Effect::cancel(BrandLookup)
            }
            GarageAction::Dismiss => {
                state.selected = None;
                Effect::cancel(BrandLookup)
            }
            GarageAction::SetAutosave(enabled) => {
                state.settings.autosave = enabled;
                Effect::none()
            }
            // Handled by the mounted child reducers.
            GarageAction::Bike(..) | GarageAction::Detail(_) => Effect::none(),
        }
    }
}

/// The complete garage: list, rows, detail screen and persistence.
pub fn garage_reducer(
) -> impl Reducer<State = GarageState, Action = GarageAction, Environment = GarageEnvironment> {
    combine!(
        GarageReducer,
        BikeRowReducer.for_each(
            lens!(GarageState => bikes),
            case_path!(GarageAction::Bike(id, action)),
            |bike: &Bike| bike.id,
            |_: &GarageEnvironment| (),
        ),
        BikeDetailReducer.optional_pullback(
            lens!(GarageState => selected),
            case_path!(GarageAction::Detail),
            GarageEnvironment::detail,
        ),
    )
    .on_change(
        |state: &GarageState| state.selected.as_ref().map(|d| d.bike.clone()),
        |edited: &Option<Bike>, state: &mut GarageState, _: &GarageAction, _: &GarageEnvironment| {
            if let Some(edited) = edited {
                if let Some(bike) = state.bikes.iter_mut().find(|b| b.id == edited.id) {
                    *bike = edited.clone();
                }
            }
            Effect::none()
        },
    )
    .on_change(
        |state: &GarageState| state.bikes.clone(),
        |bikes: &Vec<Bike>, state: &mut GarageState, action: &GarageAction, env: &GarageEnvironment| {
            if let Some(detail) = state.selected.as_mut() {
                if let Some(bike) = bikes.iter().find(|b| b.id == detail.bike.id) {
                    detail.bike = bike.clone();
                }
            }
            if matches!(action, GarageAction::Loaded(_)) || !state.settings.autosave {
                return Effect::none();
            }
            Effect::future(env.persistence.save(bikes.clone()))
                .map(GarageAction::Saved)
                .debounce(PersistDebounce, env.persist_debounce, &env.scheduler)
        },
    )
    .traced("garage")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{CancelId, EffectShape, TestScheduler};
    use crate::garage::bike::BikeRowAction;
    use crate::garage::catalog::StaticCatalog;
    use crate::garage::detail::BikeDetailAction;
    use crate::garage::persistence::JsonFileStore;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn env() -> GarageEnvironment {
        GarageEnvironment {
            persistence: Arc::new(JsonFileStore::new("unused.json")),
            catalog: Arc::new(StaticCatalog::builtin()),
            scheduler: TestScheduler::new().shared(),
            persist_debounce: Duration::from_millis(300),
        }
    }

    fn with_bike(id: Uuid) -> GarageState {
        GarageState {
            bikes: vec![Bike::new(id, "Canyon Grail")],
            ..Default::default()
        }
    }

    fn is_debounced_save(shape: &EffectShape<GarageAction>) -> bool {
        matches!(shape, EffectShape::Cancellable { id, .. } if *id == CancelId::new(PersistDebounce))
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let reducer = garage_reducer();
        let id = Uuid::new_v4();
        let mut state = with_bike(id);
        let effect = reducer.reduce(
            &mut state,
            GarageAction::AddBike {
                id: Uuid::new_v4(),
                name: "canyon grail".into(),
            },
            &env(),
        );
        assert_eq!(state.bikes.len(), 1);
        assert!(state.last_error.is_some());
        assert!(effect.is_none());
    }

    #[test]
    fn row_change_schedules_debounced_save() {
        let reducer = garage_reducer();
        let id = Uuid::new_v4();
        let mut state = with_bike(id);
        let effect = reducer.reduce(
            &mut state,
            GarageAction::Bike(id, BikeRowAction::LogRide { km: 30.0 }),
            &env(),
        );
        assert_eq!(state.bikes[0].distance_km, 30.0);
        assert!(is_debounced_save(&effect.shape()));
    }

    #[test]
    fn autosave_off_skips_save() {
        let reducer = garage_reducer();
        let id = Uuid::new_v4();
        let mut state = with_bike(id);
        state.settings.autosave = false;
        let effect = reducer.reduce(
            &mut state,
            GarageAction::Bike(id, BikeRowAction::Rename("Gravel".into())),
            &env(),
        );
        assert_eq!(state.bikes[0].name, "Gravel");
        assert!(effect.is_none());
    }

    #[test]
    fn loading_does_not_save_back() {
        let reducer = garage_reducer();
        let mut state = GarageState::default();
        let effect = reducer.reduce(
            &mut state,
            GarageAction::Loaded(Ok(vec![Bike::new(Uuid::new_v4(), "Trek")])),
            &env(),
        );
        assert_eq!(state.bikes.len(), 1);
        assert!(effect.is_none());
    }

    #[test]
    fn detail_edits_are_written_back_to_the_list() {
        let reducer = garage_reducer();
        let id = Uuid::new_v4();
        let mut state = with_bike(id);
        let _ = reducer.reduce(&mut state, GarageAction::Select(id), &env());
        let effect = reducer.reduce(
            &mut state,
            GarageAction::Detail(BikeDetailAction::ServiceComponent("Chain".into())),
            &env(),
        );

        assert_eq!(state.bikes[0].components.len(), 1);
        assert!(is_debounced_save(&effect.shape()));
    }

    #[test]
    fn detail_action_without_selection_is_dropped() {
        let reducer = garage_reducer();
        let mut state = with_bike(Uuid::new_v4());
        let before = state.clone();
        let effect = reducer.reduce(
            &mut state,
            GarageAction::Detail(BikeDetailAction::ServiceComponent("Chain".into())),
            &env(),
        );
        assert_eq!(state, before);
        assert!(effect.is_none());
    }

    #[test]
    fn dismiss_cancels_brand_lookup() {
        let reducer = garage_reducer();
        let id = Uuid::new_v4();
        let mut state = with_bike(id);
        let _ = reducer.reduce(&mut state, GarageAction::Select(id), &env());
        let effect = reducer.reduce(&mut state, GarageAction::Dismiss, &env());
        assert!(state.selected.is_none());
        assert_eq!(
            effect.shape(),
            EffectShape::Cancel(vec![CancelId::new(BrandLookup)])
        );
    }
}
