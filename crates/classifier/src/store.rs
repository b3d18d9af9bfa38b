//! Model artifact persistence

use crate::model::TrainedModel;
use crate::ModelError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Leading bytes of every artifact
const ARTIFACT_MAGIC: &[u8; 6] = b"SEIMDL";

/// Artifact layout version
const ARTIFACT_VERSION: u8 = 2;

/// Reads and writes the model artifact at a fixed location
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    /// Create a store for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Artifact location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an artifact is present
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Serialize a model with its header
    pub fn encode(model: &TrainedModel) -> Result<Vec<u8>, ModelError> {
        let body =
            postcard::to_allocvec(model).map_err(|e| ModelError::CorruptArtifact(e.to_string()))?;
        let mut bytes = Vec::with_capacity(ARTIFACT_MAGIC.len() + 1 + body.len());
        bytes.extend_from_slice(ARTIFACT_MAGIC);
        bytes.push(ARTIFACT_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Parse and validate an artifact
    pub fn decode(bytes: &[u8]) -> Result<TrainedModel, ModelError> {
        let header_len = ARTIFACT_MAGIC.len() + 1;
        if bytes.len() < header_len || &bytes[..ARTIFACT_MAGIC.len()] != ARTIFACT_MAGIC {
            return Err(ModelError::CorruptArtifact(
                "missing model header".to_string(),
            ));
        }
        let version = bytes[ARTIFACT_MAGIC.len()];
        if version != ARTIFACT_VERSION {
            return Err(ModelError::CorruptArtifact(format!(
                "unsupported model version {}",
                version
            )));
        }

        let model: TrainedModel = postcard::from_bytes(&bytes[header_len..])
            .map_err(|e| ModelError::CorruptArtifact(e.to_string()))?;
        if !model.is_consistent() {
            return Err(ModelError::CorruptArtifact(
                "parameter shapes disagree with schema".to_string(),
            ));
        }
        Ok(model)
    }

    /// Write the artifact, replacing any previous one
    pub fn save(&self, model: &TrainedModel) -> Result<(), ModelError> {
        let bytes = Self::encode(model)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &bytes)?;
        info!(
            "Saved model ({} classes, {} features) to {}",
            model.n_classes(),
            model.n_features(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the artifact
    pub fn load(&self) -> Result<TrainedModel, ModelError> {
        if !self.exists() {
            return Err(ModelError::ArtifactMissing(self.path.display().to_string()));
        }
        let bytes = fs::read(&self.path)?;
        debug!("Read {} byte model from {}", bytes.len(), self.path.display());
        Self::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MODEL_TYPE;
    use ndarray::{arr1, arr2};

    fn model() -> TrainedModel {
        TrainedModel {
            model_type: MODEL_TYPE.to_string(),
            classes: vec!["1".into(), "2".into()],
            feature_columns: vec!["psd_centroid".into()],
            means: arr1(&[0.5]),
            scales: arr1(&[1.0]),
            weights: arr2(&[[-0.3, 0.3]]),
            intercepts: arr1(&[0.1, -0.1]),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("nested/model.bin"));
        store.save(&model()).unwrap();
        assert_eq!(store.load().unwrap(), model());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("absent.bin"));
        assert!(matches!(store.load(), Err(ModelError::ArtifactMissing(_))));
    }

    #[test]
    fn test_corrupt_artifacts_rejected() {
        assert!(matches!(
            ModelStore::decode(b"not a model"),
            Err(ModelError::CorruptArtifact(_))
        ));

        let mut bytes = ModelStore::encode(&model()).unwrap();
        bytes[ARTIFACT_MAGIC.len()] = 7;
        assert!(matches!(
            ModelStore::decode(&bytes),
            Err(ModelError::CorruptArtifact(msg)) if msg.contains("version")
        ));

        let bytes = ModelStore::encode(&model()).unwrap();
        assert!(matches!(
            ModelStore::decode(&bytes[..bytes.len() - 4]),
            Err(ModelError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_inconsistent_shapes_rejected() {
        let mut broken = model();
        broken.intercepts = arr1(&[0.1]);
        let bytes = ModelStore::encode(&broken).unwrap();
        assert!(matches!(
            ModelStore::decode(&bytes),
            Err(ModelError::CorruptArtifact(_))
        ));
    }
}
