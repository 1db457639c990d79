use crate::{Continous, Discrete};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnvError>;

/// Contract violations surfaced by environments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("State {state} is outside of an observation space of size {n}")]
    StateOutOfBounds { state: Discrete, n: Discrete },

    #[error("Position ({row}, {col}) is outside of a {rows}x{cols} grid")]
    PositionOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Action {action} is outside of an action space of size {n}")]
    InvalidAction { action: Discrete, n: Discrete },

    #[error("Expected a Discrete space, got {0}")]
    NotDiscrete(String),

    #[error("No transitions for state {state}, action {action}")]
    MissingTransitions { state: Discrete, action: Discrete },

    #[error("Transitions for state {state}, action {action} sum to {sum}, expected 1")]
    ProbabilityMass {
        state: Discrete,
        action: Discrete,
        sum: Continous,
    },

    #[error("Invalid probability {name} = {value}, expected a value in [0, 1]")]
    InvalidProbability { name: &'static str, value: Continous },

    #[error("Reward {name} = {value} is not finite")]
    NonFiniteReward { name: &'static str, value: Continous },

    #[error("Cannot sample next state: {0}")]
    Sampling(String),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Action success tensor has shape {found:?}, expected {expected:?}")]
    MovingProbShape {
        expected: [usize; 3],
        found: Vec<usize>,
    },

    #[error("Grid attenuates action success and cannot be tabulated")]
    AttenuatedGrid,
}
