pub mod models;
pub mod solvers;

pub use models::{GridModel, StepReplayModel};

use crate::Result;
use mdp_envs::{Continous, Discrete};

/// One weighted consequence of taking an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub next_state: Discrete,
    /// Probability mass credited to this outcome; may sum below 1 over a (state, action).
    pub weight: Continous,
    pub reward: Continous,
    /// No value is credited past a terminal transition.
    pub done: bool,
}

/// The transition capability value iteration needs from an environment.
pub trait Model {
    fn n_states(&self) -> usize;

    fn n_actions(&self) -> usize;

    fn outcomes(&mut self, s: Discrete, a: Discrete) -> Result<Vec<Outcome>>;

    /// Called once before every sweep.
    fn begin_sweep(&mut self) -> Result<()> {
        Ok(())
    }
}

/// How per-state changes within a sweep are folded into one convergence measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Max,
}

impl Aggregate {
    /// A NaN on either side yields NaN, so an undefined change never reads as
    /// converged.
    pub fn combine(self, acc: Continous, change: Continous) -> Continous {
        match self {
            Aggregate::Sum => acc + change,
            Aggregate::Max if acc.is_nan() || change.is_nan() => Continous::NAN,
            Aggregate::Max => acc.max(change),
        }
    }
}

/// Solver for a Markov Decision Process - Sutton & Barto 2018.
pub trait MdpSolver<T> {
    fn v_star(&self, s: Discrete) -> Option<Continous>;

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous>;

    fn pi_star(&self, s: Discrete) -> Option<Discrete>;

    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> Result<(T, usize)>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(Aggregate::Sum, 0.5)]
    #[case(Aggregate::Max, 0.25)]
    fn combine_folds_changes(#[case] aggregate: Aggregate, #[case] expected: Continous) {
        assert_eq!(aggregate.combine(0.25, 0.25), expected);
    }

    #[rstest]
    #[case(Aggregate::Sum)]
    #[case(Aggregate::Max)]
    fn nan_changes_are_never_swallowed(#[case] aggregate: Aggregate) {
        assert!(aggregate.combine(0., Continous::NAN).is_nan());
        assert!(aggregate.combine(Continous::NAN, 1.).is_nan());
    }
}
