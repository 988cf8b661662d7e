use std::fmt;

use serde::Serialize;

use crate::session_rng::SessionRng;
use super::board::{CELL_COUNT, count_marks, empty_grid, is_valid_move};
use super::bot_controller::{BotInput, calculate_move};
use super::types::{Difficulty, Grid, Line, Mark, Outcome};
use super::win_detector::{evaluate_outcome, winning_line};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turn {
    Player,
    Computer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    PlayerTurn,
    ComputerTurn,
    PlayerWon,
    ComputerWon,
    Draw,
}

impl GameStatus {
    pub fn text(&self) -> &'static str {
        match self {
            GameStatus::PlayerTurn => "Your turn",
            GameStatus::ComputerTurn => "Computer's turn...",
            GameStatus::PlayerWon => "Player wins! 🎉",
            GameStatus::ComputerWon => "Computer wins!",
            GameStatus::Draw => "It's a draw!",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(
            self,
            GameStatus::PlayerWon | GameStatus::ComputerWon | GameStatus::Draw
        )
    }
}

/// Why a move was ignored. Never shown to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRejection {
    OutOfRange,
    Occupied,
    GameOver,
    NotYourTurn,
    /// The session changed after the computer move was scheduled.
    Stale,
    NoMoveAvailable,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            MoveRejection::OutOfRange => "cell index out of range",
            MoveRejection::Occupied => "cell is already marked",
            MoveRejection::GameOver => "game is already over",
            MoveRejection::NotYourTurn => "not this side's turn",
            MoveRejection::Stale => "scheduled move is stale",
            MoveRejection::NoMoveAvailable => "no empty cell left",
        };
        f.write_str(reason)
    }
}

/// Handed out when a computer move becomes due; only redeemable while the
/// session is still at the same generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputerMoveTicket {
    generation: u64,
}

impl ComputerMoveTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub cells: Grid,
    pub status: GameStatus,
    pub status_text: String,
    pub game_over: bool,
    pub player_turn: bool,
    pub winning_line: Option<Line>,
    pub last_move: Option<usize>,
    pub difficulty: Difficulty,
    pub player_mark: Mark,
    pub computer_mark: Mark,
}

#[derive(Debug)]
pub struct TicTacToeGameState {
    grid: Grid,
    player_mark: Mark,
    computer_mark: Mark,
    turn: Turn,
    difficulty: Difficulty,
    status: GameStatus,
    generation: u64,
    last_move: Option<usize>,
}

impl TicTacToeGameState {
    /// `player_mark` must be `X` or `O`; anything else falls back to the player playing `X`.
    pub fn new(player_mark: Mark, difficulty: Difficulty) -> Self {
        let (player_mark, computer_mark) = match player_mark.opponent() {
            Some(computer_mark) => (player_mark, computer_mark),
            None => (Mark::X, Mark::O),
        };

        Self {
            grid: empty_grid(),
            player_mark,
            computer_mark,
            turn: Turn::Player,
            difficulty,
            status: GameStatus::PlayerTurn,
            generation: 0,
            last_move: None,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn player_mark(&self) -> Mark {
        self.player_mark
    }

    pub fn computer_mark(&self) -> Mark {
        self.computer_mark
    }

    pub fn move_count(&self) -> usize {
        count_marks(&self.grid)
    }

    /// On success returns the ticket for the computer's reply, or `None` if the
    /// player's move ended the game.
    pub fn place_player_mark(
        &mut self,
        index: usize,
    ) -> Result<Option<ComputerMoveTicket>, MoveRejection> {
        self.check_can_place(Turn::Player)?;
        if !is_valid_move(&self.grid, index) {
            return Err(if index >= CELL_COUNT {
                MoveRejection::OutOfRange
            } else {
                MoveRejection::Occupied
            });
        }

        self.place(index, self.player_mark, Turn::Computer);

        if self.status.is_game_over() {
            return Ok(None);
        }
        Ok(Some(ComputerMoveTicket {
            generation: self.generation,
        }))
    }

    /// Picks and places the computer's mark, returning the chosen index.
    pub fn place_computer_mark(
        &mut self,
        ticket: ComputerMoveTicket,
        rng: &mut SessionRng,
    ) -> Result<usize, MoveRejection> {
        if ticket.generation != self.generation {
            return Err(MoveRejection::Stale);
        }
        self.check_can_place(Turn::Computer)?;

        let input = BotInput {
            grid: self.grid,
            computer_mark: self.computer_mark,
            player_mark: self.player_mark,
        };
        let index = calculate_move(self.difficulty, &input, rng)
            .ok_or(MoveRejection::NoMoveAvailable)?;

        self.place(index, self.computer_mark, Turn::Player);
        Ok(index)
    }

    /// While the computer is to move, the outstanding ticket is invalidated and a
    /// replacement is returned so the reply can be rescheduled from scratch.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Option<ComputerMoveTicket> {
        self.difficulty = difficulty;
        if self.turn != Turn::Computer || self.status.is_game_over() {
            return None;
        }
        self.generation += 1;
        Some(ComputerMoveTicket {
            generation: self.generation,
        })
    }

    pub fn reset(&mut self) {
        self.grid = empty_grid();
        self.turn = Turn::Player;
        self.status = GameStatus::PlayerTurn;
        self.last_move = None;
        self.generation += 1;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let winning_line = if matches!(
            self.status,
            GameStatus::PlayerWon | GameStatus::ComputerWon
        ) {
            winning_line(&self.grid)
        } else {
            None
        };

        GameSnapshot {
            cells: self.grid,
            status: self.status,
            status_text: self.status.text().to_string(),
            game_over: self.status.is_game_over(),
            player_turn: self.turn == Turn::Player && !self.status.is_game_over(),
            winning_line,
            last_move: self.last_move,
            difficulty: self.difficulty,
            player_mark: self.player_mark,
            computer_mark: self.computer_mark,
        }
    }

    fn check_can_place(&self, side: Turn) -> Result<(), MoveRejection> {
        if self.status.is_game_over() {
            return Err(MoveRejection::GameOver);
        }
        if self.turn != side {
            return Err(MoveRejection::NotYourTurn);
        }
        Ok(())
    }

    fn place(&mut self, index: usize, mark: Mark, next_turn: Turn) {
        self.grid[index] = mark;
        self.last_move = Some(index);
        self.turn = next_turn;
        self.generation += 1;
        self.update_status();
    }

    fn update_status(&mut self) {
        self.status = match evaluate_outcome(&self.grid) {
            Outcome::Win(mark) if mark == self.player_mark => GameStatus::PlayerWon,
            Outcome::Win(_) => GameStatus::ComputerWon,
            Outcome::Draw => GameStatus::Draw,
            Outcome::InProgress => match self.turn {
                Turn::Player => GameStatus::PlayerTurn,
                Turn::Computer => GameStatus::ComputerTurn,
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_game() -> TicTacToeGameState {
        TicTacToeGameState::new(Mark::X, Difficulty::Hard)
    }

    /// Plays `moves` alternating player / computer, bypassing the bot.
    fn play(state: &mut TicTacToeGameState, moves: &[usize]) {
        for (i, &index) in moves.iter().enumerate() {
            if i % 2 == 0 {
                state.place_player_mark(index).unwrap();
            } else {
                state.check_can_place(Turn::Computer).unwrap();
                state.place(index, state.computer_mark, Turn::Player);
            }
        }
    }

    #[test]
    fn test_new_game_is_players_turn() {
        let state = new_game();
        assert_eq!(state.status(), GameStatus::PlayerTurn);
        assert_eq!(state.status().text(), "Your turn");
        assert_eq!(state.turn(), Turn::Player);
        assert_eq!(state.move_count(), 0);
        assert_eq!(state.computer_mark(), Mark::O);
    }

    #[test]
    fn test_player_mark_o_gives_computer_x() {
        let state = TicTacToeGameState::new(Mark::O, Difficulty::Hard);
        assert_eq!(state.player_mark(), Mark::O);
        assert_eq!(state.computer_mark(), Mark::X);
    }

    #[test]
    fn test_empty_player_mark_falls_back_to_x() {
        let state = TicTacToeGameState::new(Mark::Empty, Difficulty::Easy);
        assert_eq!(state.player_mark(), Mark::X);
        assert_eq!(state.computer_mark(), Mark::O);
    }

    #[test]
    fn test_player_move_flips_turn() {
        let mut state = new_game();
        let ticket = state.place_player_mark(0).unwrap();
        assert!(ticket.is_some());
        assert_eq!(state.grid()[0], Mark::X);
        assert_eq!(state.turn(), Turn::Computer);
        assert_eq!(state.status(), GameStatus::ComputerTurn);
        assert_eq!(state.status().text(), "Computer's turn...");
    }

    #[test]
    fn test_player_cannot_move_twice() {
        let mut state = new_game();
        state.place_player_mark(0).unwrap();
        assert_eq!(state.place_player_mark(1), Err(MoveRejection::NotYourTurn));
        assert_eq!(state.grid()[1], Mark::Empty);
    }

    #[test]
    fn test_occupied_and_out_of_range_are_rejected() {
        let mut state = new_game();
        play(&mut state, &[0, 4]);
        let before = state.generation();
        assert_eq!(state.place_player_mark(4), Err(MoveRejection::Occupied));
        assert_eq!(state.place_player_mark(9), Err(MoveRejection::OutOfRange));
        assert_eq!(state.generation(), before);
        assert_eq!(state.move_count(), 2);
    }

    #[test]
    fn test_computer_move_uses_heuristic() {
        let mut state = new_game();
        let ticket = state.place_player_mark(0).unwrap().unwrap();
        let mut rng = SessionRng::new(3);
        let index = state.place_computer_mark(ticket, &mut rng).unwrap();
        assert_eq!(index, 4);
        assert_eq!(state.grid()[4], Mark::O);
        assert_eq!(state.status(), GameStatus::PlayerTurn);
    }

    #[test]
    fn test_stale_ticket_is_rejected_after_reset() {
        let mut state = new_game();
        let ticket = state.place_player_mark(0).unwrap().unwrap();
        state.reset();
        let mut rng = SessionRng::new(3);
        assert_eq!(
            state.place_computer_mark(ticket, &mut rng),
            Err(MoveRejection::Stale)
        );
        assert_eq!(state.move_count(), 0);
    }

    #[test]
    fn test_ticket_cannot_be_redeemed_twice() {
        let mut state = new_game();
        let ticket = state.place_player_mark(0).unwrap().unwrap();
        let mut rng = SessionRng::new(3);
        state.place_computer_mark(ticket, &mut rng).unwrap();
        assert_eq!(
            state.place_computer_mark(ticket, &mut rng),
            Err(MoveRejection::Stale)
        );
        assert_eq!(state.move_count(), 2);
    }

    #[test]
    fn test_player_win_ends_game_without_ticket() {
        let mut state = new_game();
        play(&mut state, &[0, 3, 1, 4]);
        assert_eq!(state.place_player_mark(2), Ok(None));
        assert_eq!(state.status(), GameStatus::PlayerWon);
        assert_eq!(state.status().text(), "Player wins! 🎉");
        assert_eq!(state.place_player_mark(8), Err(MoveRejection::GameOver));

        let snapshot = state.snapshot();
        assert!(snapshot.game_over);
        assert!(!snapshot.player_turn);
        assert_eq!(snapshot.winning_line, Some([0, 1, 2]));
    }

    #[test]
    fn test_computer_win() {
        let mut state = new_game();
        play(&mut state, &[0, 3, 1, 4, 8]);
        // Computer holds 3 and 4, completes the middle row instead of blocking 2.
        let ticket = ComputerMoveTicket {
            generation: state.generation(),
        };
        let mut rng = SessionRng::new(0);
        assert_eq!(state.place_computer_mark(ticket, &mut rng), Ok(5));
        assert_eq!(state.status(), GameStatus::ComputerWon);
        assert_eq!(state.status().text(), "Computer wins!");
        assert_eq!(state.snapshot().winning_line, Some([3, 4, 5]));
    }

    #[test]
    fn test_last_cell_win_is_not_a_draw() {
        let mut state = new_game();
        play(&mut state, &[0, 1, 2, 3, 4, 5, 7, 6]);
        assert_eq!(state.status(), GameStatus::PlayerTurn);
        assert_eq!(state.place_player_mark(8), Ok(None));
        assert_eq!(state.status(), GameStatus::PlayerWon);
    }

    #[test]
    fn test_draw() {
        let mut state = new_game();
        play(&mut state, &[0, 1, 2, 3, 4, 8, 5, 6]);
        assert_eq!(state.place_player_mark(7), Ok(None));
        assert_eq!(state.status(), GameStatus::Draw);
        assert_eq!(state.status().text(), "It's a draw!");
        assert_eq!(state.snapshot().winning_line, None);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut state = TicTacToeGameState::new(Mark::X, Difficulty::Easy);
        play(&mut state, &[0, 3, 1, 4, 2]);
        let generation = state.generation();
        state.reset();

        assert_eq!(*state.grid(), empty_grid());
        assert_eq!(state.turn(), Turn::Player);
        assert_eq!(state.status(), GameStatus::PlayerTurn);
        assert_eq!(state.snapshot().status_text, "Your turn");
        assert_eq!(state.difficulty(), Difficulty::Easy);
        assert!(state.generation() > generation);
        assert!(state.place_player_mark(4).is_ok());
    }

    #[test]
    fn test_marks_equal_completed_turns() {
        let mut state = new_game();
        let mut rng = SessionRng::new(17);
        for turn in 0..3 {
            let free = crate::tictactoe::board::get_available_moves(state.grid())[0];
            let ticket = state.place_player_mark(free).unwrap().unwrap();
            state.place_computer_mark(ticket, &mut rng).unwrap();
            assert_eq!(state.move_count(), (turn + 1) * 2);
        }
    }

    #[test]
    fn test_set_difficulty_keeps_board() {
        let mut state = new_game();
        state.place_player_mark(0).unwrap();
        state.set_difficulty(Difficulty::Easy);
        assert_eq!(state.difficulty(), Difficulty::Easy);
        assert_eq!(state.grid()[0], Mark::X);
        assert_eq!(state.snapshot().difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_set_difficulty_on_computer_turn_reissues_ticket() {
        let mut state = new_game();
        let old_ticket = state.place_player_mark(0).unwrap().unwrap();
        let new_ticket = state.set_difficulty(Difficulty::Easy).unwrap();
        assert_ne!(old_ticket, new_ticket);

        let mut rng = SessionRng::new(3);
        assert_eq!(
            state.place_computer_mark(old_ticket, &mut rng),
            Err(MoveRejection::Stale)
        );
        assert!(state.place_computer_mark(new_ticket, &mut rng).is_ok());
        assert_eq!(state.move_count(), 2);
    }

    #[test]
    fn test_set_difficulty_on_player_turn_issues_nothing() {
        let mut state = new_game();
        let before = state.generation();
        assert_eq!(state.set_difficulty(Difficulty::Easy), None);
        assert_eq!(state.generation(), before);

        play(&mut state, &[0, 3, 1, 4]);
        state.place_player_mark(2).unwrap();
        assert!(state.status().is_game_over());
        assert_eq!(state.set_difficulty(Difficulty::Hard), None);
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(MoveRejection::Occupied.to_string(), "cell is already marked");
        assert_eq!(MoveRejection::Stale.to_string(), "scheduled move is stale");
    }
}
