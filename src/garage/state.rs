use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::garage::detail::BikeDetailState;

/// A bicycle and its running totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bike {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub rides: u32,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Bike {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            distance_km: 0.0,
            rides: 0,
            components: Vec::new(),
        }
    }

    /// First word of the name, used to look up the manufacturer.
    pub fn brand(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or_default()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A wear part, tracked by the odometer reading at its last service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub serviced_at_km: f64,
}

impl Component {
    pub fn km_since_service(&self, bike: &Bike) -> f64 {
        (bike.distance_km - self.serviced_at_km).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Write the bike list to disk after every change.
    pub autosave: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { autosave: true }
    }
}

/// Root state of the garage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GarageState {
    pub bikes: Vec<Bike>,
    /// The open detail screen, if any.
    pub selected: Option<BikeDetailState>,
    pub settings: Settings,
    pub last_error: Option<String>,
}

impl GarageState {
    pub fn bike(&self, id: Uuid) -> Option<&Bike> {
        self.bikes.iter().find(|b| b.id == id)
    }

    pub fn bike_named(&self, name: &str) -> Option<&Bike> {
        self.bikes.iter().find(|b| b.name.eq_ignore_ascii_case(name))
    }
}
