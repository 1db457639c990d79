use crate::grid::GridBase;
use crate::{
    Continous, Discrete, GridAction, GridEnv, GridMap, GridRewards, GridTransition, ObsActSpace,
    Position, Result,
};
use ndarray::Array3;

/// Grid world where every action moves to exactly one adjacent cell.
#[derive(Debug, Clone)]
pub struct GridWorldEnv {
    base: GridBase,
}

impl Default for GridWorldEnv {
    fn default() -> Self {
        Self {
            base: GridBase::new(GridMap::default(), GridRewards::default()),
        }
    }
}

impl GridWorldEnv {
    pub fn new(desc: &[&str], rewards: GridRewards) -> Result<Self> {
        rewards.validate()?;
        Ok(Self {
            base: GridBase::new(GridMap::parse(desc)?, rewards),
        })
    }

    pub fn with_moving_prob(mut self, moving_prob: Array3<Continous>) -> Result<Self> {
        self.base.set_moving_prob(moving_prob)?;
        Ok(self)
    }

    pub fn map(&self) -> &GridMap {
        &self.base.map
    }
}

impl GridEnv for GridWorldEnv {
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

        Ok(vec![GridTransition {
            next_state: self.base.map.neighbour(self.base.position, action),
            reward: self.base.step_reward(),
            probability: 1.,
            done: false,
        }])
    }

    fn moving_prob(&self) -> &Array3<Continous> {
        &self.base.moving_prob
    }
}
