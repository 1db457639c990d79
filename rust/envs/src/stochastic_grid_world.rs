use crate::grid::GridBase;
use crate::{
    Continous, Discrete, EnvError, GridAction, GridEnv, GridMap, GridRewards, GridTransition,
    ObsActSpace, Position, Result,
};
use ndarray::Array3;
use rand::prelude::*;

/// Grid world whose actions slip sideways: the intended move happens with
/// probability `1 - slip`, each perpendicular move with `slip / 2`.
#[derive(Debug, Clone)]
pub struct StochasticGridWorldEnv {
    base: GridBase,
    slip: Continous,
}

impl StochasticGridWorldEnv {
    pub fn new(desc: &[&str], rewards: GridRewards, slip: Continous) -> Result<Self> {
        Self::from_map(GridMap::parse(desc)?, rewards, slip)
    }

    pub fn from_map(map: GridMap, rewards: GridRewards, slip: Continous) -> Result<Self> {
        if !(0. ..=1.).contains(&slip) {
            return Err(EnvError::InvalidProbability {
                name: "slip",
                value: slip,
            });
        }
        rewards.validate()?;

        Ok(Self {
            base: GridBase::new(map, rewards),
            slip,
        })
    }

    pub fn with_moving_prob(mut self, moving_prob: Array3<Continous>) -> Result<Self> {
        self.base.set_moving_prob(moving_prob)?;
        Ok(self)
    }

    /// Draws every action success probability uniformly from `[low, 1]`.
    pub fn with_random_moving_prob(self, seed: u64, low: Continous) -> Result<Self> {
        if !(0. ..=1.).contains(&low) {
            return Err(EnvError::InvalidProbability {
                name: "low",
                value: low,
            });
        }

        let (rows, cols) = self.base.map.shape();
        let rng = &mut StdRng::seed_from_u64(seed);
        let moving_prob = Array3::from_shape_fn((rows, cols, GridAction::ALL.len()), |_| {
            rng.gen_range(low..=1.)
        });
        self.with_moving_prob(moving_prob)
    }

    pub fn slip(&self) -> Continous {
        self.slip
    }

    pub fn map(&self) -> &GridMap {
        &self.base.map
    }
}

impl GridEnv for StochasticGridWorldEnv {
    fn shape(&self) -> (usize, usize) {
        self.base.map.shape()
    }

    fn observation_space(&self) -> &ObsActSpace {
        &self.base.obs_space
    }

    fn action_space(&self) -> &ObsActSpace {
        &self.base.act_space
    }

    fn reset(&mut self) -> Position {
        self.base.reset()
    }

    fn set_state(&mut self, row: usize, col: usize) -> Result<()> {
        self.base.set_state(row, col)
    }

    fn current_position(&self) -> Position {
        self.base.position
    }

    fn get_next_states(&self, action: Discrete) -> Result<Vec<GridTransition>> {
        let action = GridAction::from_index(action)?;
        if let Some(t) = self.base.terminal_outcome() {
            return Ok(vec![t]);
        }

        let [side_a, side_b] = action.perpendicular();
        let moves = [
            (action, 1. - self.slip),
            (side_a, self.slip / 2.),
            (side_b, self.slip / 2.),
        ];

        let reward = self.base.step_reward();
        let mut ts: Vec<GridTransition> = Vec::with_capacity(moves.len());
        for (a, p) in moves {
            if p <= 0. {
                continue;
            }

            let next_state = self.base.map.neighbour(self.base.position, a);
            match ts.iter_mut().find(|t| t.next_state == next_state) {
                Some(t) => t.probability += p,
                None => ts.push(GridTransition {
                    next_state,
                    reward,
                    probability: p,
                    done: false,
                }),
            }
        }

        Ok(ts)
    }

    fn moving_prob(&self) -> &Array3<Continous> {
        &self.base.moving_prob
    }
}
