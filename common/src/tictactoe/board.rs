use super::types::{Grid, Line, Mark};

pub const CELL_COUNT: usize = 9;
pub const CENTER: usize = 4;
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

pub const LINES: [Line; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

pub fn empty_grid() -> Grid {
    [Mark::Empty; CELL_COUNT]
}

/// Empty cell indices in ascending order.
pub fn get_available_moves(grid: &Grid) -> Vec<usize> {
    grid.iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_empty())
        .map(|(index, _)| index)
        .collect()
}

pub fn is_valid_move(grid: &Grid, index: usize) -> bool {
    grid.get(index).is_some_and(Mark::is_empty)
}

pub fn is_board_full(grid: &Grid) -> bool {
    grid.iter().all(|cell| !cell.is_empty())
}

pub fn count_marks(grid: &Grid) -> usize {
    grid.iter().filter(|cell| !cell.is_empty()).count()
}
