use crate::garage::catalog::{BrandInfo, CatalogError};

#[derive(Debug, Clone, PartialEq)]
pub enum BikeDetailAction {
    /// Mark a component as serviced at the current odometer reading,
    /// adding it when the bike has none by that name.
    ServiceComponent(String),
    LoadBrandInfo,
    BrandInfoLoaded(Result<BrandInfo, CatalogError>),
}
