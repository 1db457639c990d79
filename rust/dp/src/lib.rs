extern crate mdp_envs;
extern crate ndarray;
extern crate serde;
extern crate serde_json;

pub mod config;
pub mod error;
pub mod fibonacci;
pub mod mdps;

pub use config::ValueIterationConfig;
pub use error::{Result, SolverError};
pub use fibonacci::{fibonacci, fibonacci_memo};
pub use mdps::solvers::value_iteration::*;
pub use mdps::{Aggregate, GridModel, MdpSolver, Model, Outcome, StepReplayModel};
