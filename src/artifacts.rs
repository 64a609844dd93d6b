//! Artifact persistence

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::error::Result;
use crate::models::TrainedModel;

/// Destination for trained model artifacts.
///
/// The engine only needs an opaque reference back for the report; callers
/// decide what storage actually means. A persist failure is confined to the
/// model being saved, never the whole job.
pub trait ArtifactStore {
    fn persist(
        &self,
        model: &TrainedModel,
        instrument_token: u64,
        interval: &str,
        model_name: &str,
    ) -> Result<String>;
}

/// Filesystem store writing one bincode file per artifact under a root
/// directory, created on demand.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for FsArtifactStore {
    fn default() -> Self {
        Self::new("models")
    }
}

impl ArtifactStore for FsArtifactStore {
    fn persist(
        &self,
        model: &TrainedModel,
        instrument_token: u64,
        interval: &str,
        model_name: &str,
    ) -> Result<String> {
        fs::create_dir_all(&self.root)?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let file_name = format!("{}_{}_{}_{}.bin", instrument_token, interval, model_name, stamp);
        let path = self.root.join(file_name);

        let bytes = bincode::serialize(model)?;
        fs::write(&path, bytes)?;

        let reference = path.to_string_lossy().into_owned();
        info!(artifact = %reference, model = model_name, "persisted model artifact");
        Ok(reference)
    }
}

/// Read an artifact back into its fitted state
pub fn load_artifact(path: impl AsRef<Path>) -> Result<TrainedModel> {
    let bytes = fs::read(path)?;
    Ok(bincode::deserialize(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelKind, TrainedModel};
    use crate::models::seasonal::SeasonalModel;
    use ndarray::Array1;
    use tempfile::TempDir;

    fn seasonal_artifact() -> TrainedModel {
        let close = Array1::from_shape_fn(30, |t| 100.0 + 0.3 * t as f64);
        TrainedModel::Seasonal(SeasonalModel::fit(close.view(), 7))
    }

    #[test]
    fn test_persist_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let reference = store
            .persist(&seasonal_artifact(), 256265, "day", "seasonal")
            .unwrap();

        let path = std::path::Path::new(&reference);
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("256265_day_seasonal_"));
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn test_persist_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let artifact = seasonal_artifact();

        let reference = store
            .persist(&artifact, 1, "5minute", "seasonal")
            .unwrap();
        let restored = load_artifact(&reference).unwrap();

        assert_eq!(restored.kind(), ModelKind::Seasonal);
        match restored {
            TrainedModel::Seasonal(model) => assert_eq!(model.period(), 7),
            _ => panic!("expected a seasonal artifact"),
        }
    }

    #[test]
    fn test_missing_root_is_created() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FsArtifactStore::new(&nested);
        let reference = store
            .persist(&seasonal_artifact(), 9, "day", "seasonal")
            .unwrap();
        assert!(std::path::Path::new(&reference).exists());
    }
}
