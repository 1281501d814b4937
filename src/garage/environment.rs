use std::sync::Arc;
use std::time::Duration;

use crate::effect::SharedScheduler;
use crate::garage::catalog::BrandCatalog;
use crate::garage::detail::DetailEnvironment;
use crate::garage::persistence::GaragePersistence;

/// Dependencies of the garage reducers, supplied once when the store is built.
#[derive(Clone)]
pub struct GarageEnvironment {
    pub persistence: Arc<dyn GaragePersistence>,
    pub catalog: Arc<dyn BrandCatalog>,
    pub scheduler: SharedScheduler,
    /// Quiet period before a changed bike list is saved.
    pub persist_debounce: Duration,
}

impl GarageEnvironment {
    pub(crate) fn detail(&self) -> DetailEnvironment {
        DetailEnvironment {
            catalog: Arc::clone(&self.catalog),
        }
    }
}
