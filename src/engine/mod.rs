pub mod endgame;
pub mod error;
pub mod lock;
pub mod model;
pub mod replay;
pub mod timeline;

pub use error::EngineError;
pub use model::OutcomeModel;
pub use replay::BoardRules;
pub use timeline::ProbabilityEngine;
