use mdp_envs::Position;
use tracing_subscriber::filter::LevelFilter;

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Manhattan distance, the number of moves on an open grid.
#[allow(dead_code)]
pub fn steps_to((row, col): Position, (goal_row, goal_col): Position) -> i32 {
    (row.abs_diff(goal_row) + col.abs_diff(goal_col)) as i32
}
