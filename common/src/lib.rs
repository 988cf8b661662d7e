pub mod config;
pub mod id_generator;
pub mod identifiers;
pub mod logger;
pub mod session_rng;
pub mod tictactoe;

pub use identifiers::*;
pub use session_rng::SessionRng;
