//! The detail screen for a single bike.
//!
//! Opened by setting `GarageState::selected`; the parent mounts it with an
//! optional pullback, so actions arriving after dismissal are dropped.

mod action;
mod reducer;
mod state;

use std::sync::Arc;

use crate::garage::catalog::BrandCatalog;

pub use action::BikeDetailAction;
pub use reducer::{BikeDetailReducer, BrandLookup};
pub use state::BikeDetailState;

#[derive(Clone)]
pub struct DetailEnvironment {
    pub catalog: Arc<dyn BrandCatalog>,
}
