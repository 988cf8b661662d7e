use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::session_rng::SessionRng;
use crate::{SessionId, debug_log, log};
use super::game_state::{ComputerMoveTicket, GameSnapshot, MoveRejection, TicTacToeGameState};
use super::types::{Difficulty, Mark, Position};

pub const DEFAULT_COMPUTER_MOVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy)]
pub struct TicTacToeSessionSettings {
    pub player_mark: Mark,
    pub difficulty: Difficulty,
    pub computer_move_delay: Duration,
}

impl Default for TicTacToeSessionSettings {
    fn default() -> Self {
        Self {
            player_mark: Mark::X,
            difficulty: Difficulty::Easy,
            computer_move_delay: DEFAULT_COMPUTER_MOVE_DELAY,
        }
    }
}

struct SessionInner {
    game_state: TicTacToeGameState,
    rng: SessionRng,
    pending_move: Option<JoinHandle<()>>,
}

/// One player's game against the computer.
///
/// Every accepted change publishes a fresh [`GameSnapshot`] to subscribers. The computer
/// answers after `computer_move_delay`; at most one such reply is pending and it is dropped
/// if the session moved on (reset or another mutation) before it fired.
#[derive(Clone)]
pub struct TicTacToeSession {
    session_id: SessionId,
    inner: Arc<Mutex<SessionInner>>,
    updates: Arc<watch::Sender<GameSnapshot>>,
    computer_move_delay: Duration,
}

impl TicTacToeSession {
    pub fn new(session_id: SessionId, settings: &TicTacToeSessionSettings, rng: SessionRng) -> Self {
        let game_state = TicTacToeGameState::new(settings.player_mark, settings.difficulty);
        let (updates, _) = watch::channel(game_state.snapshot());

        log!(
            "[session:{}] Created: player {:?}, difficulty {:?}, rng seed {}",
            session_id,
            game_state.player_mark(),
            game_state.difficulty(),
            rng.seed()
        );

        Self {
            session_id,
            inner: Arc::new(Mutex::new(SessionInner {
                game_state,
                rng,
                pending_move: None,
            })),
            updates: Arc::new(updates),
            computer_move_delay: settings.computer_move_delay,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.inner.lock().await.game_state.snapshot()
    }

    /// Returns `false` when the move was ignored.
    pub async fn select_cell(&self, index: usize) -> bool {
        let mut inner = self.inner.lock().await;

        match inner.game_state.place_player_mark(index) {
            Ok(ticket) => {
                let position = Position::from_index(index);
                debug_log!(
                    "[session:{}] Player marked cell {} (x={}, y={})",
                    self.session_id,
                    index,
                    position.x,
                    position.y
                );
                match ticket {
                    Some(ticket) => self.schedule_computer_move(&mut inner, ticket),
                    None => log!(
                        "[session:{}] Game over: {}",
                        self.session_id,
                        inner.game_state.status().text()
                    ),
                }
                self.publish(&inner.game_state);
                true
            }
            Err(rejection) => {
                debug_log!(
                    "[session:{}] Ignored player move at {}: {}",
                    self.session_id,
                    index,
                    rejection
                );
                false
            }
        }
    }

    pub async fn set_difficulty(&self, difficulty: Difficulty) {
        let mut inner = self.inner.lock().await;
        if inner.game_state.difficulty() == difficulty {
            return;
        }
        let ticket = inner.game_state.set_difficulty(difficulty);
        log!("[session:{}] Difficulty set to {:?}", self.session_id, difficulty);
        if let Some(ticket) = ticket {
            self.schedule_computer_move(&mut inner, ticket);
        }
        self.publish(&inner.game_state);
    }

    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(pending_move) = inner.pending_move.take() {
            pending_move.abort();
        }
        inner.game_state.reset();
        log!("[session:{}] Reset", self.session_id);
        self.publish(&inner.game_state);
    }

    /// Cancels a pending computer move; the session stays readable.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(pending_move) = inner.pending_move.take() {
            pending_move.abort();
        }
        log!("[session:{}] Closed", self.session_id);
    }

    fn schedule_computer_move(&self, inner: &mut SessionInner, ticket: ComputerMoveTicket) {
        if let Some(previous) = inner.pending_move.take() {
            previous.abort();
        }

        let session = self.clone();
        let delay = self.computer_move_delay;
        inner.pending_move = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.play_computer_turn(ticket).await;
        }));
    }

    async fn play_computer_turn(&self, ticket: ComputerMoveTicket) {
        let mut inner = self.inner.lock().await;
        if ticket.generation() == inner.game_state.generation() {
            inner.pending_move = None;
        }

        let SessionInner { game_state, rng, .. } = &mut *inner;
        match game_state.place_computer_mark(ticket, rng) {
            Ok(index) => {
                let position = Position::from_index(index);
                debug_log!(
                    "[session:{}] Computer marked cell {} (x={}, y={})",
                    self.session_id,
                    index,
                    position.x,
                    position.y
                );
                if game_state.status().is_game_over() {
                    log!(
                        "[session:{}] Game over: {}",
                        self.session_id,
                        game_state.status().text()
                    );
                }
                self.publish(game_state);
            }
            Err(MoveRejection::Stale) => {
                debug_log!(
                    "[session:{}] Dropped computer move scheduled at generation {}",
                    self.session_id,
                    ticket.generation()
                );
            }
            Err(rejection) => {
                log!(
                    "[session:{}] Computer failed to move: {}",
                    self.session_id,
                    rejection
                );
            }
        }
    }

    fn publish(&self, game_state: &TicTacToeGameState) {
        self.updates.send_replace(game_state.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tictactoe::board::empty_grid;
    use crate::tictactoe::game_state::GameStatus;

    const DELAY: Duration = Duration::from_millis(1000);

    fn new_session(difficulty: Difficulty) -> TicTacToeSession {
        let settings = TicTacToeSessionSettings {
            player_mark: Mark::X,
            difficulty,
            computer_move_delay: DELAY,
        };
        TicTacToeSession::new(SessionId::new("test".to_string()), &settings, SessionRng::new(7))
    }

    #[tokio::test(start_paused = true)]
    async fn test_computer_replies_after_delay() {
        let session = new_session(Difficulty::Hard);
        assert!(session.select_cell(0).await);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.cells[0], Mark::X);
        assert_eq!(snapshot.status, GameStatus::ComputerTurn);
        assert!(!snapshot.player_turn);

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert_eq!(session.snapshot().await.cells[4], Mark::Empty);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.cells[4], Mark::O);
        assert_eq!(snapshot.status, GameStatus::PlayerTurn);
        assert_eq!(snapshot.status_text, "Your turn");
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_cannot_move_during_computer_turn() {
        let session = new_session(Difficulty::Hard);
        assert!(session.select_cell(0).await);
        assert!(!session.select_cell(1).await);
        assert_eq!(session.snapshot().await.cells[1], Mark::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_occupied_cell_is_ignored() {
        let session = new_session(Difficulty::Hard);
        session.select_cell(0).await;
        tokio::time::sleep(DELAY * 2).await;
        assert!(!session.select_cell(4).await);
        assert!(!session.select_cell(0).await);
        assert!(!session.select_cell(42).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_move() {
        let session = new_session(Difficulty::Hard);
        session.select_cell(0).await;
        tokio::time::sleep(DELAY / 2).await;
        session.reset().await;
        tokio::time::sleep(DELAY * 3).await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.cells, empty_grid());
        assert_eq!(snapshot.status, GameStatus::PlayerTurn);
        assert_eq!(snapshot.status_text, "Your turn");
        assert!(snapshot.player_turn);
        assert!(!snapshot.game_over);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_move_does_not_land_after_reset_and_new_move() {
        let session = new_session(Difficulty::Hard);
        session.select_cell(0).await;
        tokio::time::sleep(DELAY / 2).await;
        session.reset().await;
        session.select_cell(8).await;

        // The first timer would have fired here.
        tokio::time::sleep(DELAY / 2 + Duration::from_millis(1)).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.cells[4], Mark::Empty);
        assert_eq!(snapshot.status, GameStatus::ComputerTurn);

        tokio::time::sleep(DELAY / 2).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.cells[4], Mark::O);
        assert_eq!(snapshot.cells.iter().filter(|c| **c == Mark::O).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_move() {
        let session = new_session(Difficulty::Hard);
        session.select_cell(0).await;
        session.close().await;
        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(session.snapshot().await.status, GameStatus::ComputerTurn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_both_moves() {
        let session = new_session(Difficulty::Hard);
        let mut updates = session.subscribe();
        assert_eq!(updates.borrow().cells, empty_grid());

        session.select_cell(0).await;
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().cells[0], Mark::X);

        updates.changed().await.unwrap();
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.cells[4], Mark::O);
        assert!(snapshot.player_turn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_difficulty_is_published() {
        let session = new_session(Difficulty::Hard);
        let mut updates = session.subscribe();
        session.set_difficulty(Difficulty::Easy).await;
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().difficulty, Difficulty::Easy);
        assert_eq!(session.snapshot().await.cells, empty_grid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_difficulty_change_restarts_computer_timer() {
        let session = new_session(Difficulty::Hard);
        session.select_cell(0).await;
        tokio::time::sleep(DELAY / 2).await;
        session.set_difficulty(Difficulty::Easy).await;

        // The original timer would have fired here.
        tokio::time::sleep(DELAY / 2 + Duration::from_millis(1)).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.status, GameStatus::ComputerTurn);
        assert_eq!(snapshot.cells.iter().filter(|c| **c == Mark::O).count(), 0);

        tokio::time::sleep(DELAY / 2).await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.status, GameStatus::PlayerTurn);
        assert_eq!(snapshot.cells.iter().filter(|c| **c == Mark::O).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_difficulty_keeps_computer_timer() {
        let session = new_session(Difficulty::Hard);
        session.select_cell(0).await;
        tokio::time::sleep(DELAY / 2).await;
        session.set_difficulty(Difficulty::Hard).await;

        tokio::time::sleep(DELAY / 2 + Duration::from_millis(1)).await;
        assert_eq!(session.snapshot().await.cells[4], Mark::O);
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_always_finishes() {
        for difficulty in [Difficulty::Easy, Difficulty::Hard] {
            let session = new_session(difficulty);
            for _ in 0..5 {
                let snapshot = session.snapshot().await;
                if snapshot.game_over {
                    break;
                }
                let index = snapshot.cells.iter().position(|c| *c == Mark::Empty).unwrap();
                assert!(session.select_cell(index).await);
                tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
            }

            let snapshot = session.snapshot().await;
            assert!(snapshot.game_over, "{:?}", snapshot);
            assert!(snapshot.status.is_game_over());
            assert!(!session.select_cell(0).await);
        }
    }
}
