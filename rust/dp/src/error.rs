use mdp_envs::{Continous, Discrete, EnvError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("Discount factor must lie in (0, 1], got {0}")]
    InvalidGamma(Continous),

    #[error("Tolerance {name} must be non-negative, got {value}")]
    InvalidTolerance { name: &'static str, value: Continous },

    #[error("State {state} has no action to evaluate")]
    NoActions { state: Discrete },

    #[error("Cannot parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
