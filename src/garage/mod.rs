//! A small bicycle garage built on the store: a list of bikes edited row by
//! row, a detail screen that can be opened and dismissed, and debounced
//! persistence of the list.

pub mod bike;
pub mod detail;

mod action;
mod catalog;
mod environment;
mod persistence;
mod reducer;
mod state;

pub use action::GarageAction;
pub use catalog::{BrandCatalog, BrandInfo, CatalogError, StaticCatalog};
pub use environment::GarageEnvironment;
pub use persistence::{GaragePersistence, JsonFileStore, PersistError};
pub use reducer::{garage_reducer, GarageReducer, PersistDebounce};
pub use state::{Bike, Component, GarageState, Settings};
