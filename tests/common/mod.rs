//! Shared test utilities and fake garage dependencies.

#![allow(dead_code, unused_imports)]

use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

use velostore::garage::{
    garage_reducer, Bike, BrandCatalog, BrandInfo, CatalogError, GarageAction, GarageEnvironment,
    GaragePersistence, GarageState, PersistError, StaticCatalog,
};
use velostore::reducer::BoxReducer;
use velostore::{ReducerExt, Store, TestScheduler};

pub const DEBOUNCE: Duration = Duration::from_millis(300);

pub type GarageStore = Store<BoxReducer<GarageState, GarageAction, GarageEnvironment>>;

/// In-memory persistence that records every save that actually ran.
#[derive(Clone, Default)]
pub struct RecordingPersistence {
    stored: Arc<Mutex<Vec<Bike>>>,
    saves: Arc<Mutex<Vec<Vec<Bike>>>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl RecordingPersistence {
    pub fn with_bikes(bikes: Vec<Bike>) -> Self {
        let persistence = Self::default();
        *persistence.stored.lock() = bikes;
        persistence
    }

    pub fn saves(&self) -> Vec<Vec<Bike>> {
        self.saves.lock().clone()
    }

    pub fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock() = fail;
    }
}

impl GaragePersistence for RecordingPersistence {
    fn load(&self) -> BoxFuture<'static, Result<Vec<Bike>, PersistError>> {
        Box::pin(future::ready(Ok(self.stored.lock().clone())))
    }

    fn save(&self, bikes: Vec<Bike>) -> BoxFuture<'static, Result<(), PersistError>> {
        let this = self.clone();
        Box::pin(async move {
            if *this.fail_saves.lock() {
                return Err(PersistError::Io {
                    path: PathBuf::from("memory"),
                    message: "disk full".to_string(),
                });
            }
            this.saves.lock().push(bikes.clone());
            *this.stored.lock() = bikes;
            Ok(())
        })
    }
}

/// Catalog whose answers are held back until [`GatedCatalog::release`].
#[derive(Clone)]
pub struct GatedCatalog {
    gate: Arc<Notify>,
    inner: StaticCatalog,
}

impl GatedCatalog {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Notify::new()),
            inner: StaticCatalog::builtin(),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

impl BrandCatalog for GatedCatalog {
    fn lookup(&self, brand: &str) -> BoxFuture<'static, Result<BrandInfo, CatalogError>> {
        let gate = Arc::clone(&self.gate);
        let answer = self.inner.lookup(brand);
        Box::pin(async move {
            gate.notified().await;
            answer.await
        })
    }
}

pub fn garage_env(
    persistence: Arc<dyn GaragePersistence>,
    catalog: Arc<dyn BrandCatalog>,
    scheduler: &TestScheduler,
) -> GarageEnvironment {
    GarageEnvironment {
        persistence,
        catalog,
        scheduler: scheduler.shared(),
        persist_debounce: DEBOUNCE,
    }
}

pub fn garage_store(environment: GarageEnvironment) -> GarageStore {
    Store::new(GarageState::default(), garage_reducer().boxed(), environment)
}

/// Write a config file into a fresh temporary directory.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
