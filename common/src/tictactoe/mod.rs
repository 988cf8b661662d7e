mod board;
mod bot_controller;
mod game_state;
mod session;
mod types;
mod win_detector;

pub use board::{CELL_COUNT, CENTER, CORNERS, LINES, empty_grid, get_available_moves, is_board_full, is_valid_move};
pub use bot_controller::{BotInput, calculate_move, calculate_random_move, find_winning_move, select_move};
pub use game_state::{ComputerMoveTicket, GameSnapshot, GameStatus, MoveRejection, TicTacToeGameState, Turn};
pub use session::{DEFAULT_COMPUTER_MOVE_DELAY, TicTacToeSession, TicTacToeSessionSettings};
pub use types::{Difficulty, Grid, Line, Mark, Outcome, Position};
pub use win_detector::{evaluate_outcome, evaluate_winner, winning_line};
