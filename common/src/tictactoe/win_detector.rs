use super::board::{LINES, is_board_full};
use super::types::{Grid, Line, Mark, Outcome};

pub fn evaluate_winner(grid: &Grid) -> Option<Mark> {
    winning_line(grid).map(|[a, _, _]| grid[a])
}

/// First line (in [`LINES`] order) whose three cells hold the same non-empty mark.
pub fn winning_line(grid: &Grid) -> Option<Line> {
    LINES.iter().copied().find(|&[a, b, c]| {
        let mark = grid[a];
        mark != Mark::Empty && mark == grid[b] && mark == grid[c]
    })
}

/// A full grid is only a draw once no line has been found.
pub fn evaluate_outcome(grid: &Grid) -> Outcome {
    if let Some(mark) = evaluate_winner(grid) {
        return Outcome::Win(mark);
    }
    if is_board_full(grid) {
        return Outcome::Draw;
    }
    Outcome::InProgress
}
