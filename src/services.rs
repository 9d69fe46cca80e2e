use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use utoipa::ToSchema;

use crate::artifact::{ArtifactLoader, Classifier, LoadedArtifact};
use crate::errors::{ClassifyError, LoadError, PredictionError};
use crate::frame::FeatureFrame;
use crate::models::{Decision, LoanApplication};

/// Lifecycle of the model artifact.
///
/// `Unloaded -> Loading -> Ready`, or `Unloaded -> Loading -> Failed`.
/// `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Unloaded => "unloaded",
            ServiceState::Loading => "loading",
            ServiceState::Ready => "ready",
            ServiceState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Where the serving artifact came from and when it became ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ArtifactInfo {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

enum Slot {
    Unloaded,
    Loading,
    Ready {
        classifier: Arc<dyn Classifier>,
        info: ArtifactInfo,
    },
    Failed,
}

impl Slot {
    fn state(&self) -> ServiceState {
        match self {
            Slot::Unloaded => ServiceState::Unloaded,
            Slot::Loading => ServiceState::Loading,
            Slot::Ready { .. } => ServiceState::Ready,
            Slot::Failed => ServiceState::Failed,
        }
    }

    fn ready(artifact: LoadedArtifact) -> (Self, ArtifactInfo) {
        let info = ArtifactInfo {
            source: artifact.source,
            sha256: artifact.fingerprint,
            loaded_at: Utc::now(),
        };
        let slot = Slot::Ready {
            classifier: artifact.classifier,
            info: info.clone(),
        };
        (slot, info)
    }
}

/// Turns loan applications into decisions using the loaded artifact.
///
/// The artifact is owned by the service and installed exactly once, either
/// at construction ([`InferenceService::with_artifact`]) or through
/// [`InferenceService::load`]. Classification only reads shared state, so a
/// single instance serves any number of concurrent requests.
pub struct InferenceService {
    slot: RwLock<Slot>,
}

impl Default for InferenceService {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceService {
    /// Creates a service with no artifact; every `classify` call fails until
    /// [`load`](Self::load) succeeds.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Slot::Unloaded),
        }
    }

    /// Creates a service that is ready immediately.
    pub fn with_artifact(artifact: LoadedArtifact) -> Self {
        Self {
            slot: RwLock::new(Slot::ready(artifact).0),
        }
    }

    /// Runs the one-time artifact load.
    ///
    /// Blocks for as long as `loader` does. No lock is held while loading, so
    /// concurrent `classify` calls see `Loading` and fail fast.
    ///
    /// # Errors
    ///
    /// * [`LoadError::AlreadyAttempted`] if a load has already started.
    /// * Whatever `loader` returns; the service then stays `Failed`.
    pub fn load(&self, loader: &dyn ArtifactLoader) -> Result<ArtifactInfo, LoadError> {
        {
            let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            if !matches!(*slot, Slot::Unloaded) {
                return Err(LoadError::AlreadyAttempted(slot.state()));
            }
            *slot = Slot::Loading;
        }
        tracing::info!("Loading model artifact");

        let outcome = loader.load();

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        match outcome {
            Ok(artifact) => {
                let (ready, info) = Slot::ready(artifact);
                *slot = ready;
                tracing::info!("Model artifact ready: {}", info.source);
                Ok(info)
            }
            Err(e) => {
                *slot = Slot::Failed;
                tracing::error!("Model artifact failed to load: {}", e);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> ServiceState {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }

    /// Details of the serving artifact, once `Ready`.
    pub fn artifact_info(&self) -> Option<ArtifactInfo> {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Ready { info, .. } => Some(info.clone()),
            _ => None,
        }
    }

    fn classifier(&self) -> Result<Arc<dyn Classifier>, ClassifyError> {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Ready { classifier, .. } => Ok(Arc::clone(classifier)),
            other => Err(ClassifyError::ArtifactUnavailable(other.state())),
        }
    }

    /// Classifies one loan application.
    ///
    /// The record is flattened into a one-row frame, scored by the artifact,
    /// and the single returned label is mapped with [`Decision::from_label`].
    ///
    /// # Errors
    ///
    /// * [`ClassifyError::ArtifactUnavailable`] unless the service is `Ready`.
    /// * [`ClassifyError::Prediction`] if the artifact fails or does not return
    ///   exactly one label. Not retried.
    pub fn classify(&self, record: LoanApplication) -> Result<Decision, ClassifyError> {
        let classifier = self.classifier()?;
        let frame = FeatureFrame::single(record);

        let labels = classifier.predict(&frame)?;
        let label = match labels.as_slice() {
            [label] => *label,
            other => {
                return Err(PredictionError(format!(
                    "expected exactly one label, got {}",
                    other.len()
                ))
                .into())
            }
        };

        let decision = Decision::from_label(label);
        tracing::debug!("Model label {} -> {}", label, decision);
        Ok(decision)
    }
}
