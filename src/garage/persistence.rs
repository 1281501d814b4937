use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use thiserror::Error;

use crate::garage::state::Bike;

/// Errors from reading or writing the garage file.
///
/// Carried inside actions, so it holds messages rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("Failed to access garage file '{path}': {message}")]
    Io { path: PathBuf, message: String },

    #[error("Garage file '{path}' is not valid JSON: {message}")]
    Json { path: PathBuf, message: String },
}

/// Where the bike list lives between runs.
pub trait GaragePersistence: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<Vec<Bike>, PersistError>>;

    fn save(&self, bikes: Vec<Bike>) -> BoxFuture<'static, Result<(), PersistError>>;
}

/// Stores the bike list as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(path: &Path, error: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn json_error(path: &Path, error: serde_json::Error) -> PersistError {
    PersistError::Json {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

impl GaragePersistence for JsonFileStore {
    /// A missing file is an empty garage.
    fn load(&self) -> BoxFuture<'static, Result<Vec<Bike>, PersistError>> {
        let path = self.path.clone();
        Box::pin(async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(io_error(&path, e)),
            };
            serde_json::from_slice(&bytes).map_err(|e| json_error(&path, e))
        })
    }

    fn save(&self, bikes: Vec<Bike>) -> BoxFuture<'static, Result<(), PersistError>> {
        let path = self.path.clone();
        Box::pin(async move {
            let json = serde_json::to_vec_pretty(&bikes).map_err(|e| json_error(&path, e))?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error(&path, e))?;
            }
            // Write beside the target and rename so a crash never leaves half a file.
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, json)
                .await
                .map_err(|e| io_error(&tmp, e))?;
            tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|e| io_error(&path, e))?;
            tracing::debug!(path = %path.display(), count = bikes.len(), "garage saved");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("garage.json"));
        assert_eq!(store.load().await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn save_then_load_restores_bikes() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("garage.json"));
        let bike = Bike::new(Uuid::new_v4(), "Trek Domane");

        store.save(vec![bike.clone()]).await.unwrap();

        assert_eq!(store.load().await, Ok(vec![bike]));
    }

    #[tokio::test]
    async fn corrupt_file_reports_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garage.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, PersistError::Json { .. }));
    }
}
