use crate::effect::Effect;
use crate::garage::bike::action::BikeRowAction;
use crate::garage::state::Bike;
use crate::reducer::Reducer;

pub struct BikeRowReducer;

impl Reducer for BikeRowReducer {
    type State = Bike;
    type Action = BikeRowAction;
    type Environment = ();

    fn reduce(&self, bike: &mut Bike, action: BikeRowAction, _env: &()) -> Effect<BikeRowAction> {
        match action {
            BikeRowAction::LogRide { km } => {
                if km.is_finite() && km > 0.0 {
                    bike.distance_km += km;
                    bike.rides += 1;
                }
            }
            BikeRowAction::Rename(name) => {
                let name = name.trim();
                if !name.is_empty() {
                    bike.name = name.to_string();
                }
            }
        }
        Effect::none()
    }
}
