extern crate ndarray;
extern crate rand;
extern crate serde;

pub mod error;
pub mod grid;
pub mod grid_world;
pub mod mdp;
pub mod spaces;
pub mod stochastic_grid_world;

pub use error::{EnvError, Result};
pub use grid::{Cell, GridAction, GridEnv, GridMap, GridRewards, GridTransition, Position};
pub use grid_world::GridWorldEnv;
pub use mdp::{pick_next, MdpEnv, StepInfo, TabularMdp, Transition, Transitions, Weighted};
pub use spaces::ObsActSpace;
pub use stochastic_grid_world::StochasticGridWorldEnv;

/// Index into a finite state or action set.
pub type Discrete = usize;
pub type Continous = f64;
