//! One row of the bike list.

mod action;
mod reducer;

pub use action::BikeRowAction;
pub use reducer::BikeRowReducer;
