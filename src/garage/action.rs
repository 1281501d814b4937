use uuid::Uuid;

use crate::garage::bike::BikeRowAction;
use crate::garage::detail::BikeDetailAction;
use crate::garage::persistence::PersistError;
use crate::garage::state::Bike;

#[derive(Debug, Clone, PartialEq)]
pub enum GarageAction {
    /// Read the bike list from persistence.
    Load,
    Loaded(Result<Vec<Bike>, PersistError>),
    AddBike { id: Uuid, name: String },
    RemoveBike(Uuid),
    /// An action for one row of the list.
    Bike(Uuid, BikeRowAction),
    /// Open the detail screen for a bike.
    Select(Uuid),
    Dismiss,
    Detail(BikeDetailAction),
    SetAutosave(bool),
    Saved(Result<(), PersistError>),
}
