use crate::{Result, SolverError};
use mdp_envs::Continous;
use serde::{Deserialize, Serialize};

/// Termination and discounting for one solve. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueIterationConfig {
    /// Sweep budget.
    pub max_iter: usize,
    pub gamma: Continous,
    /// Largest per-state change tolerated by the grid solvers.
    pub theta: Continous,
    /// Summed per-state change tolerated by the generic MDP solver.
    pub eps: Continous,
}

impl Default for ValueIterationConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            gamma: 1.,
            theta: 1e-5,
            eps: 1e-4,
        }
    }
}

impl ValueIterationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_gamma(self.gamma)?;
        for (name, value) in [("theta", self.theta), ("eps", self.eps)] {
            if value.is_nan() || value < 0. {
                return Err(SolverError::InvalidTolerance { name, value });
            }
        }

        Ok(())
    }
}

pub(crate) fn validate_gamma(gamma: Continous) -> Result<()> {
    if gamma > 0. && gamma <= 1. {
        Ok(())
    } else {
        Err(SolverError::InvalidGamma(gamma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ValueIterationConfig::from_json(r#"{"gamma": 0.9, "max_iter": 50}"#).unwrap();

        assert_eq!(
            config,
            ValueIterationConfig {
                max_iter: 50,
                gamma: 0.9,
                ..Default::default()
            }
        );
    }

    #[rstest]
    #[case(r#"{"gamma": 0.0}"#)]
    #[case(r#"{"gamma": 1.5}"#)]
    #[case(r#"{"theta": -1e-3}"#)]
    #[case(r#"{"eps": -1.0}"#)]
    #[case(r#"{"gamma": "high"}"#)]
    fn rejects_bad_configs(#[case] json: &str) {
        assert!(ValueIterationConfig::from_json(json).is_err());
    }
}
