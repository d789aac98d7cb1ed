//! Pretrained in-game outcome classifier.
//!
//! The engine treats the classifier as a black box behind [`OutcomeModel`]:
//! four features in (the three running scores plus the remaining board
//! value), three calibrated class probabilities out, one per podium slot.
//! The concrete implementation shipped here is a multinomial logistic
//! regression fitted offline; its weights live in a JSON asset that is
//! compiled into the binary and can be overridden with a file at startup.
//! The loaded model is immutable and shared read-only across requests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Input features: the three slot scores, then remaining board value.
pub const FEATURE_COUNT: usize = 4;
/// Output classes: one per podium slot, canonical order.
pub const CLASS_COUNT: usize = 3;

/// Default model weights, fitted offline on the archived game history.
const DEFAULT_MODEL_JSON: &str = include_str!("../../assets/outcome_model.json");

/// Narrow capability interface the orchestrator depends on.
///
/// Any fitted classifier (serialized regression, lookup table, remote
/// service shim) can stand behind it; inference must behave as a pure
/// function of the feature vector.
pub trait OutcomeModel: Send + Sync {
    fn predict(&self, features: [f64; FEATURE_COUNT]) -> Result<[f64; CLASS_COUNT], EngineError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub trained_games: u32,
    pub log_loss: f64,
    /// Feature names in input order; doubles as the asset's shape check.
    pub features: Vec<String>,
}

/// Multinomial logistic regression over the four game-state features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxModel {
    pub metadata: ModelMetadata,
    /// One weight row per class, classes in canonical slot order.
    pub coefficients: [[f64; FEATURE_COUNT]; CLASS_COUNT],
    pub intercepts: [f64; CLASS_COUNT],
}

impl SoftmaxModel {
    pub fn from_json(raw: &str) -> Result<SoftmaxModel, EngineError> {
        let model: SoftmaxModel = serde_json::from_str(raw)
            .map_err(|e| EngineError::ModelUnavailable(format!("invalid model asset: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_path(path: &Path) -> Result<SoftmaxModel, EngineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ModelUnavailable(format!(
                "cannot read model asset {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    /// The model compiled into the binary.
    pub fn embedded() -> Result<SoftmaxModel, EngineError> {
        Self::from_json(DEFAULT_MODEL_JSON)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.metadata.features.len() != FEATURE_COUNT {
            return Err(EngineError::ModelUnavailable(format!(
                "model {} declares {} features, expected {}",
                self.metadata.version,
                self.metadata.features.len(),
                FEATURE_COUNT
            )));
        }
        let weights_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|w| w.is_finite());
        if !weights_finite {
            return Err(EngineError::ModelUnavailable(format!(
                "model {} contains non-finite weights",
                self.metadata.version
            )));
        }
        Ok(())
    }
}

impl OutcomeModel for SoftmaxModel {
    fn predict(&self, features: [f64; FEATURE_COUNT]) -> Result<[f64; CLASS_COUNT], EngineError> {
        if !features.iter().all(|f| f.is_finite()) {
            return Err(EngineError::ModelUnavailable(format!(
                "non-finite feature vector {features:?}"
            )));
        }
        let mut logits = [0.0; CLASS_COUNT];
        for (k, row) in self.coefficients.iter().enumerate() {
            let mut z = self.intercepts[k];
            for (i, weight) in row.iter().enumerate() {
                z += weight * features[i];
            }
            logits[k] = z;
        }
        // Softmax with the max subtracted so extreme scores cannot overflow
        // the exponentials.
        let max = logits[0].max(logits[1]).max(logits[2]);
        let mut probs = [0.0; CLASS_COUNT];
        let mut sum = 0.0;
        for (p, z) in probs.iter_mut().zip(logits) {
            *p = (z - max).exp();
            sum += *p;
        }
        if !sum.is_finite() || sum <= 0.0 {
            return Err(EngineError::ModelUnavailable(format!(
                "degenerate class distribution for features {features:?}"
            )));
        }
        for p in &mut probs {
            *p /= sum;
        }
        Ok(probs)
    }
}
