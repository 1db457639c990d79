use crate::{Continous, Discrete, EnvError, GridEnv, ObsActSpace, Result};
use itertools::iproduct;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next_state: Discrete,
    pub probability: Continous,
    pub reward: Continous,
    pub done: bool,
}

/// Outcomes keyed by (state, action).
pub type Transitions = HashMap<(Discrete, Discrete), Vec<Transition>>;

#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    pub observation: Discrete,
    pub reward: Continous,
    pub terminated: bool,
}

/// Markov Decision Process that can only be queried one sampled transition at a
/// time: position it with `reset_state`, then `step`.
pub trait MdpEnv {
    fn observation_space(&self) -> &ObsActSpace;

    fn action_space(&self) -> &ObsActSpace;

    fn n_s(&self) -> usize {
        self.observation_space().n()
    }

    fn n_a(&self) -> usize {
        self.action_space().n()
    }

    /// Forces the current state.
    fn reset_state(&mut self, s: Discrete) -> Result<()>;

    /// Advances one transition from the current state.
    fn step(&mut self, a: Discrete) -> Result<StepInfo>;
}

pub trait Weighted {
    fn p(&self) -> Continous;
}

impl Weighted for Transition {
    fn p(&self) -> Continous {
        self.probability
    }
}

pub fn pick_next<'a, T>(rng: &mut StdRng, ts: &'a [T]) -> Result<&'a T>
where
    T: Weighted,
{
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p()))
        .map_err(|e| EnvError::Sampling(e.to_string()))?;
    ts.get(dist.sample(rng))
        .ok_or_else(|| EnvError::Sampling("sampled index out of range".to_string()))
}

/// MDP backed by an explicit transition table, sampled with a seeded generator.
#[derive(Debug, Clone)]
pub struct TabularMdp {
    obs_space: ObsActSpace,
    act_space: ObsActSpace,
    transitions: Transitions,
    state: Discrete,
    rng: StdRng,
}

impl TabularMdp {
    /// Every (state, action) pair needs an entry whose probabilities sum to 1 and
    /// whose rewards are finite.
    pub fn new(n_s: usize, n_a: usize, transitions: Transitions, seed: u64) -> Result<Self> {
        for (s, a) in iproduct!(0..n_s, 0..n_a) {
            let ts = transitions
                .get(&(s, a))
                .ok_or(EnvError::MissingTransitions { state: s, action: a })?;

            if let Some(t) = ts.iter().find(|t| t.next_state >= n_s) {
                return Err(EnvError::StateOutOfBounds {
                    state: t.next_state,
                    n: n_s,
                });
            }
            if let Some(t) = ts.iter().find(|t| !(0. ..=1.).contains(&t.probability)) {
                return Err(EnvError::InvalidProbability {
                    name: "probability",
                    value: t.probability,
                });
            }
            if let Some(t) = ts.iter().find(|t| !t.reward.is_finite()) {
                return Err(EnvError::NonFiniteReward {
                    name: "reward",
                    value: t.reward,
                });
            }

            let sum: Continous = ts.iter().map(|t| t.probability).sum();
            if (sum - 1.).abs() > 1e-8 {
                return Err(EnvError::ProbabilityMass {
                    state: s,
                    action: a,
                    sum,
                });
            }
        }

        Ok(Self {
            obs_space: ObsActSpace::Discrete { n: n_s },
            act_space: ObsActSpace::Discrete { n: n_a },
            transitions,
            state: Default::default(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Tabulates a grid environment, numbering cells row-major. The grid's position
    /// is left wherever the enumeration ended.
    pub fn from_grid<E>(env: &mut E, seed: u64) -> Result<Self>
    where
        E: GridEnv + ?Sized,
    {
        if env.moving_prob().iter().any(|&p| p != 1.) {
            return Err(EnvError::AttenuatedGrid);
        }

        let (rows, cols) = env.shape();
        let n_a = env.action_space().discrete_n()?;
        let mut transitions = Transitions::new();
        for (row, col) in iproduct!(0..rows, 0..cols) {
            env.set_state(row, col)?;
            for a in 0..n_a {
                let ts = env
                    .get_next_states(a)?
                    .into_iter()
                    .map(|t| Transition {
                        next_state: t.next_state.0 * cols + t.next_state.1,
                        probability: t.probability,
                        reward: t.reward,
                        done: t.done,
                    })
                    .collect();
                transitions.insert((row * cols + col, a), ts);
            }
        }

        Self::new(rows * cols, n_a, transitions, seed)
    }

    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    pub fn state(&self) -> Discrete {
        self.state
    }
}

impl MdpEnv for TabularMdp {
    fn observation_space(&self) -> &ObsActSpace {
        &self.obs_space
    }

    fn action_space(&self) -> &ObsActSpace {
        &self.act_space
    }

    fn reset_state(&mut self, s: Discrete) -> Result<()> {
        let n = self.obs_space.n();
        if s >= n {
            return Err(EnvError::StateOutOfBounds { state: s, n });
        }

        trace!(s, "repositioned mdp");
        self.state = s;
        Ok(())
    }

    fn step(&mut self, a: Discrete) -> Result<StepInfo> {
        let n = self.act_space.n();
        if a >= n {
            return Err(EnvError::InvalidAction { action: a, n });
        }

        let ts = self
            .transitions
            .get(&(self.state, a))
            .ok_or(EnvError::MissingTransitions {
                state: self.state,
                action: a,
            })?;
        let next = pick_next(&mut self.rng, ts)?;
        let info = StepInfo {
            observation: next.next_state,
            reward: next.reward,
            terminated: next.done,
        };

        self.state = info.observation;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridWorldEnv, StochasticGridWorldEnv};
    use float_eq::*;

    fn t(next_state: Discrete, probability: Continous, reward: Continous, done: bool) -> Transition {
        Transition {
            next_state,
            probability,
            reward,
            done,
        }
    }

    /// Two states; action 0 from state 0 lands on state 1 four times out of five.
    fn coin() -> Transitions {
        Transitions::from([
            ((0, 0), vec![t(0, 0.2, 0., false), t(1, 0.8, 1., false)]),
            ((1, 0), vec![t(1, 1., 0., true)]),
        ])
    }

    #[test]
    fn pick_next_follows_the_weights() {
        let items = coin()[&(0, 0)].clone();
        let counts = &mut [0usize; 2];

        let rng = &mut StdRng::seed_from_u64(2718);
        let n = 100_000;
        for _ in 0..n {
            let next = pick_next(rng, &items).unwrap();
            counts[next.next_state] += 1;
        }

        assert_float_eq!(counts[0] as f64 / n as f64, 0.2, abs <= 1e-2);
        assert_float_eq!(counts[1] as f64 / n as f64, 0.8, abs <= 1e-2);
    }

    #[test]
    fn step_moves_the_current_state() {
        let mdp = &mut TabularMdp::new(2, 1, coin(), 0).unwrap();
        mdp.reset_state(1).unwrap();

        let info = mdp.step(0).unwrap();

        assert_eq!(
            info,
            StepInfo {
                observation: 1,
                reward: 0.,
                terminated: true
            }
        );
        assert_eq!(mdp.state(), 1);
    }

    #[test]
    fn same_seed_replays_the_same_samples() {
        let sample = |seed| {
            let mdp = &mut TabularMdp::new(2, 1, coin(), seed).unwrap();
            (0..50)
                .map(|_| {
                    mdp.reset_state(0).unwrap();
                    mdp.step(0).unwrap().observation
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(sample(7), sample(7));
    }

    #[test]
    fn rejects_incomplete_or_unnormalised_tables() {
        assert_eq!(
            TabularMdp::new(3, 1, coin(), 0).err(),
            Some(EnvError::MissingTransitions {
                state: 2,
                action: 0
            })
        );

        let mut skewed = coin();
        skewed.insert((1, 0), vec![t(1, 0.5, 0., true)]);
        assert!(matches!(
            TabularMdp::new(2, 1, skewed, 0),
            Err(EnvError::ProbabilityMass {
                state: 1,
                action: 0,
                ..
            })
        ));

        let mut escaped = coin();
        escaped.insert((1, 0), vec![t(5, 1., 0., true)]);
        assert_eq!(
            TabularMdp::new(2, 1, escaped, 0).err(),
            Some(EnvError::StateOutOfBounds { state: 5, n: 2 })
        );
    }

    #[test]
    fn rejects_non_finite_rewards() {
        let mut unbounded = coin();
        unbounded.insert((1, 0), vec![t(1, 1., Continous::INFINITY, true)]);
        assert_eq!(
            TabularMdp::new(2, 1, unbounded, 0).err(),
            Some(EnvError::NonFiniteReward {
                name: "reward",
                value: Continous::INFINITY
            })
        );

        let mut undefined = coin();
        undefined.insert((0, 0), vec![t(1, 1., Continous::NAN, false)]);
        assert!(matches!(
            TabularMdp::new(2, 1, undefined, 0),
            Err(EnvError::NonFiniteReward { name: "reward", value }) if value.is_nan()
        ));
    }

    #[test]
    fn rejects_out_of_range_queries() {
        let mdp = &mut TabularMdp::new(2, 1, coin(), 0).unwrap();

        assert_eq!(
            mdp.reset_state(2),
            Err(EnvError::StateOutOfBounds { state: 2, n: 2 })
        );
        assert_eq!(
            mdp.step(1),
            Err(EnvError::InvalidAction { action: 1, n: 1 })
        );
    }

    #[test]
    fn tabulates_a_grid_row_major() {
        let grid = &mut GridWorldEnv::default();
        let mdp = TabularMdp::from_grid(grid, 0).unwrap();

        assert_eq!(mdp.n_s(), 16);
        assert_eq!(mdp.n_a(), 4);
        // (2, 3) moving down lands on the goal (3, 3).
        assert_eq!(mdp.transitions()[&(11, 1)], vec![t(15, 1., 0., false)]);
        assert_eq!(mdp.transitions()[&(15, 0)], vec![t(15, 1., 1., true)]);
    }

    #[test]
    fn refuses_to_tabulate_attenuated_grids() {
        let grid = &mut StochasticGridWorldEnv::new(&["SF", "FG"], Default::default(), 0.1)
            .unwrap()
            .with_random_moving_prob(3, 0.2)
            .unwrap();

        assert_eq!(
            TabularMdp::from_grid(grid, 0).err(),
            Some(EnvError::AttenuatedGrid)
        );
    }
}
