//! The classification artifact boundary.
//!
//! A [`Classifier`] is the only thing the inference service knows about the
//! model. An [`ArtifactLoader`] produces one at startup.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{LoadError, PredictionError};
use crate::forest::ForestPipeline;
use crate::frame::FeatureFrame;

/// Raw class label produced by a model.
pub type Label = i64;

/// Read-only prediction capability of a loaded model.
///
/// Implementations must be safe to call from many requests at once and must
/// return one label per frame row.
pub trait Classifier: Send + Sync {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<Label>, PredictionError>;
}

/// A classifier together with a description of where it came from.
#[derive(Clone)]
pub struct LoadedArtifact {
    pub classifier: Arc<dyn Classifier>,
    /// Human-readable origin, e.g. the file path.
    pub source: String,
    /// SHA-256 of the artifact bytes, when they were read from storage.
    pub fingerprint: Option<String>,
}

impl LoadedArtifact {
    /// Wraps an in-memory classifier that has no stored representation.
    pub fn in_memory(classifier: Arc<dyn Classifier>, source: impl Into<String>) -> Self {
        Self {
            classifier,
            source: source.into(),
            fingerprint: None,
        }
    }
}

/// Produces the classification artifact. Called once per process.
pub trait ArtifactLoader {
    fn load(&self) -> Result<LoadedArtifact, LoadError>;
}

/// Loads a [`ForestPipeline`] from a JSON file.
#[derive(Debug, Clone)]
pub struct FileArtifactLoader {
    path: PathBuf,
}

impl FileArtifactLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ArtifactLoader for FileArtifactLoader {
    fn load(&self) -> Result<LoadedArtifact, LoadError> {
        tracing::info!("Reading model artifact from {}", self.path.display());

        let bytes = std::fs::read(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        let fingerprint = hex::encode(Sha256::digest(&bytes));
        tracing::debug!("Artifact size: {} bytes, sha256: {}", bytes.len(), fingerprint);

        let pipeline = ForestPipeline::from_json_slice(&bytes)?;
        tracing::info!(
            "Model artifact parsed: {} trees, classes {:?}, encoded width {}",
            pipeline.n_trees(),
            pipeline.classes(),
            pipeline.width()
        );

        Ok(LoadedArtifact {
            classifier: Arc::new(pipeline),
            source: self.path.display().to_string(),
            fingerprint: Some(fingerprint),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let loader = FileArtifactLoader::new("does/not/exist/RFC_pipeline.json");
        match loader.load() {
            Err(LoadError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("does/not/exist/RFC_pipeline.json"))
            }
            Err(other) => panic!("expected Io error, got {}", other),
            Ok(_) => panic!("expected Io error, got an artifact"),
        }
    }
}
