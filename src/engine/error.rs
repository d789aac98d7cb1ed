use thiserror::Error;

/// Failure taxonomy for the probability engine.
///
/// Every variant reflects structurally bad input or a missing asset, never a
/// transient fault, so no retry logic lives anywhere in the engine. Errors
/// propagate unchanged to the caller, which owns presentation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Archive rows that cannot be interpreted: unknown responder names,
    /// malformed round codes, impossible board arithmetic.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// The requested show is not in the archive.
    #[error("show {0} not found in the archive")]
    ShowNotFound(u32),

    /// The outcome model could not be loaded, or could not produce a
    /// prediction for a feature vector.
    #[error("outcome model unavailable: {0}")]
    ModelUnavailable(String),

    /// Invalid board constants or a broken/incomplete odds-table asset.
    #[error("configuration error: {0}")]
    Configuration(String),
}
