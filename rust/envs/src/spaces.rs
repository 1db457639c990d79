use crate::{Discrete, EnvError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObsActSpace {
    /// Refer: https://gymnasium.farama.org/api/spaces/fundamental/#discrete
    Discrete { n: Discrete },

    /// Refer: https://gymnasium.farama.org/api/spaces/composite/#tuple
    Tuple { spaces: Vec<ObsActSpace> },
}

impl ObsActSpace {
    /// Number of distinct elements. Tuples count every combination of their components.
    pub fn n(&self) -> Discrete {
        match self {
            ObsActSpace::Discrete { n } => *n,
            ObsActSpace::Tuple { spaces } => spaces.iter().map(|s| s.n()).product(),
        }
    }

    /// Component spaces. A Discrete space is its own single component.
    pub fn spaces(&self) -> &[ObsActSpace] {
        match self {
            ObsActSpace::Discrete { .. } => std::slice::from_ref(self),
            ObsActSpace::Tuple { spaces } => spaces,
        }
    }

    pub fn discrete_n(&self) -> Result<Discrete> {
        if let ObsActSpace::Discrete { n } = self {
            Ok(*n)
        } else {
            Err(EnvError::NotDiscrete(format!("{self:?}")))
        }
    }
}
