#[derive(Debug, Clone, PartialEq)]
pub enum BikeRowAction {
    /// Add a ride of `km` kilometres to the odometer.
    LogRide { km: f64 },
    Rename(String),
}
