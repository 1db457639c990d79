//! Value iteration: repeated synchronous Bellman optimality backups
//! `V(s) <- max_a sum_sp P(sp|s,a) [R(s,a,sp) + gamma V(sp)]` until the values stop moving.
//!
//! Ref: https://en.wikipedia.org/wiki/Markov_decision_process#Value_iteration

use crate::config::validate_gamma;
use crate::mdps::{Aggregate, GridModel, MdpSolver, Model, Outcome, StepReplayModel};
use crate::{Result, SolverError, ValueIterationConfig};
use itertools::Itertools;
use mdp_envs::{
    Continous, Discrete, GridAction, GridEnv, GridWorldEnv, MdpEnv, StochasticGridWorldEnv,
};
use ndarray::{Array1, Array2};
use tracing::{debug, info, warn};

pub struct ValueIteration<M> {
    model: M,
    gamma: Continous,
    aggregate: Aggregate,
    /// Estimates from the last completed sweep.
    values: Array1<Continous>,
    /// Written during a sweep, then swapped with `values`.
    next_values: Array1<Continous>,
    /// Action values from the last completed sweep, indexed [state, action].
    q: Option<Array2<Continous>>,
}

impl<M: Model> ValueIteration<M> {
    pub fn new(model: M, gamma: Continous, aggregate: Aggregate) -> Result<Self> {
        validate_gamma(gamma)?;

        let n_s = model.n_states();
        Ok(Self {
            model,
            gamma,
            aggregate,
            values: Array1::zeros(n_s),
            next_values: Array1::zeros(n_s),
            q: None,
        })
    }

    pub fn values(&self) -> &Array1<Continous> {
        &self.values
    }

    pub fn into_values(self) -> Array1<Continous> {
        self.values
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Backs up every state once against the previous sweep's values and returns the
    /// aggregated absolute change.
    pub fn sweep(&mut self) -> Result<Continous> {
        self.model.begin_sweep()?;

        let (n_s, n_a) = (self.model.n_states(), self.model.n_actions());
        let gamma = self.gamma;
        let old_values = &self.values;
        let q = self.q.get_or_insert_with(|| Array2::zeros((n_s, n_a)));

        let mut delta = 0.;
        for s in 0..n_s {
            let mut best: Option<Continous> = None;
            for a in 0..n_a {
                let outcomes = self.model.outcomes(s, a)?;
                let q_sa = expected_return(&outcomes, old_values, gamma);
                q[[s, a]] = q_sa;
                best = Some(best.map_or(q_sa, |b| b.max(q_sa)));
            }

            let v = best.ok_or(SolverError::NoActions { state: s })?;
            self.next_values[s] = v;
            delta = self.aggregate.combine(delta, (v - old_values[s]).abs());
        }

        std::mem::swap(&mut self.values, &mut self.next_values);
        Ok(delta)
    }
}

fn expected_return(outcomes: &[Outcome], values: &Array1<Continous>, gamma: Continous) -> Continous {
    outcomes.iter().fold(0., |acc, o| {
        let future = if o.done {
            0.
        } else {
            gamma * values[o.next_state]
        };
        acc + o.weight * (o.reward + future)
    })
}

impl<M: Model> MdpSolver<bool> for ValueIteration<M> {
    fn v_star(&self, s: Discrete) -> Option<Continous> {
        self.values.get(s).copied()
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous> {
        self.q.as_ref()?.get([s, a]).copied()
    }

    /// Greedy action; the lowest index wins ties.
    fn pi_star(&self, s: Discrete) -> Option<Discrete> {
        let q = self.q.as_ref()?;
        if s >= q.nrows() {
            return None;
        }

        q.row(s)
            .iter()
            .enumerate()
            .fold(None, |best: Option<(Discrete, Continous)>, (a, &q_sa)| match best {
                Some((_, b)) if b >= q_sa => best,
                _ => Some((a, q_sa)),
            })
            .map(|(a, _)| a)
    }

    /// Sweeps until the aggregated change is at most `theta` or `num_iterations` sweeps
    /// have run, whichever comes first. Returns (converged, sweeps).
    fn exec(&mut self, theta: Continous, num_iterations: Option<usize>) -> Result<(bool, usize)> {
        let max_iter = num_iterations.unwrap_or(usize::MAX);

        let mut sweeps = 0;
        while sweeps < max_iter {
            let delta = self.sweep()?;
            sweeps += 1;
            debug!(sweep = sweeps, delta, "value iteration sweep");

            if delta <= theta {
                info!(sweeps, delta, "value iteration converged");
                return Ok((true, sweeps));
            }
        }

        warn!(sweeps, theta, "value iteration ran out of sweeps before converging");
        Ok((false, sweeps))
    }
}

/// States without a completed sweep fall back to action 0.
fn greedy_policy<M: Model>(vi: &ValueIteration<M>) -> Vec<Discrete> {
    (0..vi.values().len())
        .map(|s| vi.pi_star(s).unwrap_or_default())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MdpSolution {
    pub values: Array1<Continous>,
    pub policy: Vec<Discrete>,
    pub sweeps: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSolution {
    pub values: Array2<Continous>,
    pub policy: Array2<GridAction>,
    pub sweeps: usize,
    pub converged: bool,
}

/// Solves an environment that can only be stepped, stopping once the summed
/// per-state change is at most `config.eps`.
pub fn solve_mdp<E>(mdp: &mut E, config: &ValueIterationConfig) -> Result<MdpSolution>
where
    E: MdpEnv + ?Sized,
{
    config.validate()?;
    debug!(
        n_s = mdp.n_s(),
        n_a = mdp.n_a(),
        gamma = config.gamma,
        "solving mdp"
    );

    let mut vi = ValueIteration::new(StepReplayModel::new(mdp), config.gamma, Aggregate::Sum)?;
    let (converged, sweeps) = vi.exec(config.eps, Some(config.max_iter))?;

    Ok(MdpSolution {
        policy: greedy_policy(&vi),
        values: vi.into_values(),
        sweeps,
        converged,
    })
}

/// Solves a grid environment, stopping once the largest per-cell change is at most
/// `config.theta`.
pub fn solve_grid<E>(env: &mut E, config: &ValueIterationConfig) -> Result<GridSolution>
where
    E: GridEnv + ?Sized,
{
    config.validate()?;
    let shape = env.shape();
    debug!(
        rows = shape.0,
        cols = shape.1,
        gamma = config.gamma,
        "solving grid world"
    );

    let mut vi = ValueIteration::new(GridModel::new(env), config.gamma, Aggregate::Max)?;
    let (converged, sweeps) = vi.exec(config.theta, Some(config.max_iter))?;

    let policy = greedy_policy(&vi)
        .into_iter()
        .map(GridAction::from_index)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(GridSolution {
        values: vi.into_values().into_shape(shape)?,
        policy: Array2::from_shape_vec(shape, policy)?,
        sweeps,
        converged,
    })
}

/// Value of every state of `mdp`, with the sweep tolerance fixed at 1e-4.
pub fn mdp_value_iteration<E>(
    mdp: &mut E,
    max_iter: usize,
    gamma: Continous,
) -> Result<Array1<Continous>>
where
    E: MdpEnv + ?Sized,
{
    let config = ValueIterationConfig {
        max_iter,
        gamma,
        ..Default::default()
    };

    Ok(solve_mdp(mdp, &config)?.values)
}

pub fn grid_world_value_iteration(
    env: &mut GridWorldEnv,
    max_iter: usize,
    gamma: Continous,
    theta: Continous,
) -> Result<Array2<Continous>> {
    let config = ValueIterationConfig {
        max_iter,
        gamma,
        theta,
        ..Default::default()
    };

    Ok(solve_grid(env, &config)?.values)
}

pub fn stochastic_grid_world_value_iteration(
    env: &mut StochasticGridWorldEnv,
    max_iter: usize,
    gamma: Continous,
    theta: Continous,
) -> Result<Array2<Continous>> {
    let config = ValueIterationConfig {
        max_iter,
        gamma,
        theta,
        ..Default::default()
    };

    Ok(solve_grid(env, &config)?.values)
}

/// One line per grid row, one arrow per cell.
pub fn render_policy(policy: &Array2<GridAction>) -> String {
    policy
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|a| a.arrow()).join(" "))
        .join("\n")
}
