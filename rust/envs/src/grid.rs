//! Structured grid environments: the agent occupies one cell of a rectangular map and
//! every action is answered with the full list of reachable cells.

use crate::{Continous, Discrete, EnvError, ObsActSpace, Result};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// (row, col)
pub type Position = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridAction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl GridAction {
    pub const ALL: [GridAction; 4] = [
        GridAction::Up,
        GridAction::Down,
        GridAction::Left,
        GridAction::Right,
    ];

    pub fn from_index(action: Discrete) -> Result<Self> {
        Self::ALL
            .get(action)
            .copied()
            .ok_or(EnvError::InvalidAction {
                action,
                n: Self::ALL.len(),
            })
    }

    pub fn index(self) -> Discrete {
        self as Discrete
    }

    /// (d_row, d_col)
    pub fn delta(self) -> (isize, isize) {
        match self {
            GridAction::Up => (-1, 0),
            GridAction::Down => (1, 0),
            GridAction::Left => (0, -1),
            GridAction::Right => (0, 1),
        }
    }

    /// The two directions an action can slip into.
    pub fn perpendicular(self) -> [GridAction; 2] {
        match self {
            GridAction::Up | GridAction::Down => [GridAction::Left, GridAction::Right],
            GridAction::Left | GridAction::Right => [GridAction::Up, GridAction::Down],
        }
    }

    pub fn arrow(self) -> char {
        match self {
            GridAction::Up => '^',
            GridAction::Down => 'v',
            GridAction::Left => '<',
            GridAction::Right => '>',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Start,
    Floor,
    Wall,
    Hole,
    Goal,
}

impl Cell {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(Cell::Start),
            'F' => Some(Cell::Floor),
            'W' => Some(Cell::Wall),
            'H' => Some(Cell::Hole),
            'G' => Some(Cell::Goal),
            _ => None,
        }
    }

    /// Acting from a terminal cell ends the episode in place.
    pub fn is_terminal(self) -> bool {
        matches!(self, Cell::Wall | Cell::Hole | Cell::Goal)
    }
}

/// Reward for acting from a cell, keyed by the cell kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridRewards {
    pub step: Continous,
    pub goal: Continous,
    pub hole: Continous,
}

impl Default for GridRewards {
    fn default() -> Self {
        Self {
            step: 0.,
            goal: 1.,
            hole: 0.,
        }
    }
}

impl GridRewards {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("step", self.step), ("goal", self.goal), ("hole", self.hole)] {
            if !value.is_finite() {
                return Err(EnvError::NonFiniteReward { name, value });
            }
        }
        Ok(())
    }

    pub fn for_cell(&self, cell: Cell) -> Continous {
        match cell {
            Cell::Start | Cell::Floor => self.step,
            Cell::Goal => self.goal,
            Cell::Hole => self.hole,
            Cell::Wall => 0.,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridTransition {
    pub next_state: Position,
    pub reward: Continous,
    pub probability: Continous,
    pub done: bool,
}

/// Grid environment queried for whole outcome distributions rather than sampled.
pub trait GridEnv {
    /// (rows, cols)
    fn shape(&self) -> (usize, usize);

    /// Tuple of the row and column spaces.
    fn observation_space(&self) -> &ObsActSpace;

    fn action_space(&self) -> &ObsActSpace;

    fn reset(&mut self) -> Position;

    fn set_state(&mut self, row: usize, col: usize) -> Result<()>;

    fn current_position(&self) -> Position;

    /// Every (next_state, reward, probability, done) reachable with `action` from the
    /// current position. Probabilities sum to 1.
    fn get_next_states(&self, action: Discrete) -> Result<Vec<GridTransition>>;

    /// Probability that an action is carried out at all, indexed [row, col, action].
    fn moving_prob(&self) -> &Array3<Continous>;
}

#[derive(Debug, Clone)]
pub struct GridMap {
    cells: Array2<Cell>,
    start: Position,
}

impl Default for GridMap {
    /// Open 4x4 floor, start at (0, 0), goal at (3, 3).
    fn default() -> Self {
        let mut cells = Array2::from_elem((4, 4), Cell::Floor);
        cells[[0, 0]] = Cell::Start;
        cells[[3, 3]] = Cell::Goal;

        Self {
            cells,
            start: (0, 0),
        }
    }
}

impl GridMap {
    /// Parses rows such as `["SFFF", "FWFH", "FFFF", "HFFG"]`.
    pub fn parse(desc: &[&str]) -> Result<Self> {
        let rows = desc.len();
        let cols = desc.first().map_or(0, |r| r.chars().count());
        if rows == 0 || cols == 0 {
            return Err(EnvError::InvalidMap("map is empty".to_string()));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        let mut start = None;
        for (row, line) in desc.iter().enumerate() {
            if line.chars().count() != cols {
                return Err(EnvError::InvalidMap(format!(
                    "row {row} has {} cells, expected {cols}",
                    line.chars().count()
                )));
            }

            for (col, c) in line.chars().enumerate() {
                let cell = Cell::from_char(c).ok_or_else(|| {
                    EnvError::InvalidMap(format!("unknown cell '{c}' at ({row}, {col})"))
                })?;
                if cell == Cell::Start {
                    if start.is_some() {
                        return Err(EnvError::InvalidMap("more than one start".to_string()));
                    }
                    start = Some((row, col));
                }
                cells.push(cell);
            }
        }

        let cells = Array2::from_shape_vec((rows, cols), cells)
            .map_err(|e| EnvError::InvalidMap(e.to_string()))?;

        Ok(Self {
            cells,
            start: start.unwrap_or((0, 0)),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn cell(&self, (row, col): Position) -> Cell {
        self.cells[[row, col]]
    }

    pub fn contains(&self, (row, col): Position) -> bool {
        let (rows, cols) = self.shape();
        row < rows && col < cols
    }

    /// Cell reached by moving once; moving off the grid or into a wall stays put.
    pub fn neighbour(&self, (row, col): Position, action: GridAction) -> Position {
        let (d_row, d_col) = action.delta();
        let next = match (
            row.checked_add_signed(d_row),
            col.checked_add_signed(d_col),
        ) {
            (Some(r), Some(c)) => (r, c),
            _ => return (row, col),
        };

        if !self.contains(next) || self.cell(next) == Cell::Wall {
            (row, col)
        } else {
            next
        }
    }
}

/// State shared by the grid worlds: layout, rewards, position and action success.
#[derive(Debug, Clone)]
pub(crate) struct GridBase {
    pub(crate) map: GridMap,
    pub(crate) rewards: GridRewards,
    pub(crate) position: Position,
    pub(crate) obs_space: ObsActSpace,
    pub(crate) act_space: ObsActSpace,
    pub(crate) moving_prob: Array3<Continous>,
}

impl GridBase {
    pub(crate) fn new(map: GridMap, rewards: GridRewards) -> Self {
        let (rows, cols) = map.shape();
        let n_a = GridAction::ALL.len();

        Self {
            position: map.start(),
            obs_space: ObsActSpace::Tuple {
                spaces: vec![
                    ObsActSpace::Discrete { n: rows },
                    ObsActSpace::Discrete { n: cols },
                ],
            },
            act_space: ObsActSpace::Discrete { n: n_a },
            moving_prob: Array3::ones((rows, cols, n_a)),
            map,
            rewards,
        }
    }

    pub(crate) fn set_moving_prob(&mut self, moving_prob: Array3<Continous>) -> Result<()> {
        let (rows, cols) = self.map.shape();
        let expected = [rows, cols, GridAction::ALL.len()];
        if moving_prob.shape() != expected {
            return Err(EnvError::MovingProbShape {
                expected,
                found: moving_prob.shape().to_vec(),
            });
        }
        if let Some(&value) = moving_prob.iter().find(|p| !(0. ..=1.).contains(*p)) {
            return Err(EnvError::InvalidProbability {
                name: "moving_prob",
                value,
            });
        }

        self.moving_prob = moving_prob;
        Ok(())
    }

    pub(crate) fn reset(&mut self) -> Position {
        self.position = self.map.start();
        self.position
    }

    pub(crate) fn set_state(&mut self, row: usize, col: usize) -> Result<()> {
        if !self.map.contains((row, col)) {
            let (rows, cols) = self.map.shape();
            return Err(EnvError::PositionOutOfBounds {
                row,
                col,
                rows,
                cols,
            });
        }

        trace!(row, col, "repositioned grid environment");
        self.position = (row, col);
        Ok(())
    }

    /// The single in-place outcome of acting from a terminal cell, if the current cell is one.
    pub(crate) fn terminal_outcome(&self) -> Option<GridTransition> {
        let cell = self.map.cell(self.position);
        cell.is_terminal().then(|| GridTransition {
            next_state: self.position,
            reward: self.rewards.for_cell(cell),
            probability: 1.,
            done: true,
        })
    }

    pub(crate) fn step_reward(&self) -> Continous {
        self.rewards.for_cell(self.map.cell(self.position))
    }
}
