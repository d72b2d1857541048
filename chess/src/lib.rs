//! # Chess rules engine driven by algebraic notation
//!
//! This crate keeps the authoritative state of a chess game, validates moves submitted in
//! algebraic notation (like `"Nbd7"`, `"exd8=Q+"` or `"O-O"`), and detects the end of the game
//! (checkmate, stalemate, insufficient material).
//!
//! Legality is never computed from attack tables. Instead, each piece keeps its pseudo-legal
//! moves and captures, and a candidate move is played on the board, examined and reverted.
//!
//! # Example
//!
//! ```
//! use rookery::{Color, Game};
//!
//! let mut game = Game::new_initial();
//! for mv in ["f3", "e5", "g4"] {
//!     assert!(game.apply_move(mv));
//! }
//! assert!(!game.apply_move("Qh4+"));
//! assert!(game.apply_move("Qh4#"));
//! assert!(game.is_over());
//! assert_eq!(game.result().as_deref(), Some("0-1 (checkmate)"));
//! assert_eq!(game.side_to_move(), Color::White);
//! ```

pub mod board;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod piece;
pub mod player;

pub use rookery_base::{bitboard, geometry, types};

pub use bitboard::Bitboard;
pub use board::Board;
pub use game::{Game, HistoryEntry};
pub use moves::san::MoveError;
pub use moves::Move;
pub use piece::Piece;
pub use player::{Player, ScriptedPlayer};
pub use types::{CastlingSide, Color, Coord, DrawReason, File, Outcome, PieceKind, Rank, WinReason};
