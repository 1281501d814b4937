use std::collections::HashMap;

use futures::future::{self, BoxFuture};
use thiserror::Error;

/// Manufacturer details shown on the detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandInfo {
    pub brand: String,
    pub country: String,
    pub founded: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Unknown brand '{0}'")]
    UnknownBrand(String),

    #[error("Brand lookup failed: {0}")]
    Unavailable(String),
}

/// Source of manufacturer information.
pub trait BrandCatalog: Send + Sync {
    fn lookup(&self, brand: &str) -> BoxFuture<'static, Result<BrandInfo, CatalogError>>;
}

/// Catalog backed by a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    brands: HashMap<String, BrandInfo>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handful of well-known manufacturers.
    pub fn builtin() -> Self {
        [
            ("Bianchi", "Italy", 1885),
            ("Cannondale", "USA", 1971),
            ("Canyon", "Germany", 2002),
            ("Giant", "Taiwan", 1972),
            ("Specialized", "USA", 1974),
            ("Trek", "USA", 1976),
        ]
        .into_iter()
        .fold(Self::new(), |catalog, (brand, country, founded)| {
            catalog.with_brand(BrandInfo {
                brand: brand.to_string(),
                country: country.to_string(),
                founded,
            })
        })
    }

    pub fn with_brand(mut self, info: BrandInfo) -> Self {
        self.brands.insert(info.brand.to_lowercase(), info);
        self
    }
}

impl BrandCatalog for StaticCatalog {
    fn lookup(&self, brand: &str) -> BoxFuture<'static, Result<BrandInfo, CatalogError>> {
        let result = self
            .brands
            .get(&brand.to_lowercase())
            .cloned()
            .ok_or_else(|| CatalogError::UnknownBrand(brand.to_string()));
        Box::pin(future::ready(result))
    }
}
