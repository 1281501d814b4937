use crate::garage::catalog::BrandInfo;
use crate::garage::state::Bike;

#[derive(Debug, Clone, PartialEq)]
pub struct BikeDetailState {
    /// Working copy of the bike; the parent writes changes back to the list.
    pub bike: Bike,
    pub brand: Option<BrandInfo>,
    pub loading_brand: bool,
    pub error: Option<String>,
}

impl BikeDetailState {
    pub fn new(bike: Bike) -> Self {
        Self {
            bike,
            brand: None,
            loading_brand: false,
            error: None,
        }
    }
}
