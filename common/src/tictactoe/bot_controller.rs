use crate::session_rng::SessionRng;
use super::board::{CENTER, CORNERS, get_available_moves};
use super::types::{Difficulty, Grid, Mark};
use super::win_detector::evaluate_winner;

/// What the bot needs to know to pick a cell.
#[derive(Debug, Clone, Copy)]
pub struct BotInput {
    pub grid: Grid,
    pub computer_mark: Mark,
    pub player_mark: Mark,
}

/// `None` only when the grid has no empty cell.
pub fn calculate_move(difficulty: Difficulty, input: &BotInput, rng: &mut SessionRng) -> Option<usize> {
    match difficulty {
        Difficulty::Easy => calculate_random_move(&input.grid, rng),
        Difficulty::Hard => select_move(&input.grid, input.computer_mark, input.player_mark, rng),
    }
}

pub fn calculate_random_move(grid: &Grid, rng: &mut SessionRng) -> Option<usize> {
    rng.choose(&get_available_moves(grid))
}

/// One-ply greedy heuristic: win, block, center, random corner, random cell.
///
/// It does not look for forks, so a perfect opponent can still beat it.
pub fn select_move(
    grid: &Grid,
    computer_mark: Mark,
    player_mark: Mark,
    rng: &mut SessionRng,
) -> Option<usize> {
    let available_moves = get_available_moves(grid);
    if available_moves.is_empty() {
        return None;
    }

    if let Some(index) = find_winning_move(grid, computer_mark, &available_moves) {
        return Some(index);
    }

    if let Some(index) = find_winning_move(grid, player_mark, &available_moves) {
        return Some(index);
    }

    if grid[CENTER].is_empty() {
        return Some(CENTER);
    }

    let empty_corners: Vec<usize> = CORNERS
        .iter()
        .copied()
        .filter(|&index| grid[index].is_empty())
        .collect();
    if let Some(index) = rng.choose(&empty_corners) {
        return Some(index);
    }

    rng.choose(&available_moves)
}

/// Lowest index in `moves` that completes a line for `mark`.
pub fn find_winning_move(grid: &Grid, mark: Mark, moves: &[usize]) -> Option<usize> {
    let mut board = *grid;
    for &index in moves {
        board[index] = mark;
        let winner = evaluate_winner(&board);
        board[index] = Mark::Empty;

        if winner == Some(mark) {
            return Some(index);
        }
    }
    None
}
