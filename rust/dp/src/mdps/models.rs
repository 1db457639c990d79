//! Adapters presenting each environment flavour as a [`Model`].

use super::{Model, Outcome};
use crate::Result;
use mdp_envs::{Discrete, EnvError, GridEnv, MdpEnv};

/// Exposes an environment that can only be stepped. Every candidate successor `sp`
/// gets its own sample: reposition on `s`, step once, and keep the sample only if it
/// landed on `sp`. Exact for deterministic environments; for stochastic ones each
/// successor is credited with whatever its sample happened to hit, not its
/// probability.
///
/// The environment is repositioned on `s` before every sample, `n_s` times per
/// (state, action), rather than once per state per sweep: `step` moves the current
/// state, so a second sample taken without repositioning would leave from wherever
/// the first one landed.
pub struct StepReplayModel<'a, E: MdpEnv + ?Sized> {
    env: &'a mut E,
}

impl<'a, E: MdpEnv + ?Sized> StepReplayModel<'a, E> {
    pub fn new(env: &'a mut E) -> Self {
        Self { env }
    }
}

impl<E: MdpEnv + ?Sized> Model for StepReplayModel<'_, E> {
    fn n_states(&self) -> usize {
        self.env.n_s()
    }

    fn n_actions(&self) -> usize {
        self.env.n_a()
    }

    fn outcomes(&mut self, s: Discrete, a: Discrete) -> Result<Vec<Outcome>> {
        let mut outcomes = vec![];
        for sp in 0..self.env.n_s() {
            self.env.reset_state(s)?;
            let info = self.env.step(a)?;
            if info.observation != sp {
                continue;
            }

            outcomes.push(Outcome {
                next_state: sp,
                weight: 1.,
                reward: info.reward,
                done: info.terminated,
            });
        }

        Ok(outcomes)
    }
}

/// Exposes a grid environment with cells numbered row-major. Each outcome is weighted
/// by its probability times the action success probability of the cell it leaves.
pub struct GridModel<'a, E: GridEnv + ?Sized> {
    env: &'a mut E,
    cols: usize,
}

impl<'a, E: GridEnv + ?Sized> GridModel<'a, E> {
    pub fn new(env: &'a mut E) -> Self {
        let (_, cols) = env.shape();
        Self { env, cols }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.env.shape()
    }
}

impl<E: GridEnv + ?Sized> Model for GridModel<'_, E> {
    fn n_states(&self) -> usize {
        let (rows, cols) = self.env.shape();
        rows * cols
    }

    fn n_actions(&self) -> usize {
        self.env.action_space().n()
    }

    fn outcomes(&mut self, s: Discrete, a: Discrete) -> Result<Vec<Outcome>> {
        let (row, col) = (s / self.cols, s % self.cols);
        self.env.set_state(row, col)?;

        let next_states = self.env.get_next_states(a)?;
        let success = self
            .env
            .moving_prob()
            .get([row, col, a])
            .copied()
            .ok_or(EnvError::InvalidAction {
                action: a,
                n: self.n_actions(),
            })?;

        Ok(next_states
            .into_iter()
            .map(|t| Outcome {
                next_state: t.next_state.0 * self.cols + t.next_state.1,
                weight: t.probability * success,
                reward: t.reward,
                done: t.done,
            })
            .collect())
    }

    fn begin_sweep(&mut self) -> Result<()> {
        self.env.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;
    use mdp_envs::{
        GridRewards, GridWorldEnv, ObsActSpace, StepInfo, StochasticGridWorldEnv, TabularMdp,
    };
    use ndarray::Array3;

    #[test]
    fn step_replay_keeps_only_the_matching_sample() {
        let grid = &mut GridWorldEnv::default();
        let mdp = &mut TabularMdp::from_grid(grid, 0).unwrap();
        let model = &mut StepReplayModel::new(mdp);

        // (0, 1) moving right lands on (0, 2).
        let outcomes = model.outcomes(1, 3).unwrap();

        assert_eq!(
            outcomes,
            vec![Outcome {
                next_state: 2,
                weight: 1.,
                reward: 0.,
                done: false,
            }]
        );
    }

    #[test]
    fn grid_outcomes_are_attenuated_by_action_success() {
        let mut moving_prob = Array3::ones((4, 4, 4));
        moving_prob[[1, 1, 0]] = 0.5;
        let env = &mut StochasticGridWorldEnv::new(
            &["SFFF", "FFFF", "FFFF", "FFFG"],
            GridRewards::default(),
            0.2,
        )
        .unwrap()
        .with_moving_prob(moving_prob)
        .unwrap();
        let model = &mut GridModel::new(env);

        let outcomes = model.outcomes(5, 0).unwrap();

        assert_eq!(
            outcomes.iter().map(|o| o.next_state).collect::<Vec<_>>(),
            vec![1, 4, 6]
        );
        assert_float_eq!(outcomes[0].weight, 0.4, abs <= 1e-12);
        assert_float_eq!(outcomes[1].weight, 0.05, abs <= 1e-12);
        assert_float_eq!(outcomes[2].weight, 0.05, abs <= 1e-12);
    }

    #[test]
    fn sweeps_start_from_the_start_cell() {
        let env = &mut GridWorldEnv::new(&["FF", "SG"], GridRewards::default()).unwrap();
        let model = &mut GridModel::new(env);
        model.outcomes(1, 0).unwrap();

        model.begin_sweep().unwrap();

        assert_eq!(model.env.current_position(), (1, 0));
        assert_eq!(model.n_states(), 4);
        assert_eq!(model.shape(), (2, 2));
    }

    #[test]
    fn step_replay_repositions_before_every_sample() {
        /// Records every state the environment is forced into.
        struct Recording {
            mdp: TabularMdp,
            resets: Vec<Discrete>,
        }

        impl MdpEnv for Recording {
            fn observation_space(&self) -> &ObsActSpace {
                self.mdp.observation_space()
            }

            fn action_space(&self) -> &ObsActSpace {
                self.mdp.action_space()
            }

            fn reset_state(&mut self, s: Discrete) -> mdp_envs::Result<()> {
                self.resets.push(s);
                self.mdp.reset_state(s)
            }

            fn step(&mut self, a: Discrete) -> mdp_envs::Result<StepInfo> {
                self.mdp.step(a)
            }
        }

        let grid = &mut GridWorldEnv::default();
        let env = &mut Recording {
            mdp: TabularMdp::from_grid(grid, 0).unwrap(),
            resets: vec![],
        };
        let model = &mut StepReplayModel::new(env);

        // (0, 1) moving down lands on (1, 1), past the first candidate successors.
        let outcomes = model.outcomes(1, 1).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].next_state, 5);
        assert_eq!(model.env.resets, vec![1; 16]);
    }
}
