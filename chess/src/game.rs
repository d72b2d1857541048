use crate::board::Board;
use crate::moves::san::{self, MoveError};
use crate::player::Player;
use crate::types::{Color, Coord, DrawReason, Outcome, PieceKind, WinReason};

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot apply move #{}: {}", .pos + 1, .source)]
pub struct MoveListError {
    pub pos: usize,
    pub source: MoveError,
}

/// One full move in the game history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub number: u32,
    /// White's move, or `None` if the game started with Black to move
    pub white: Option<String>,
    pub black: Option<String>,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}.", self.number)?;
        match &self.white {
            Some(white) => write!(f, " {}", white)?,
            None => write!(f, " ...")?,
        }
        if let Some(black) = &self.black {
            write!(f, " {}", black)?;
        }
        Ok(())
    }
}

/// Game played on a single board
///
/// Moves are submitted as strings in algebraic notation. Rejected moves leave the board
/// untouched, and the reason is kept until the next submission.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    history: Vec<HistoryEntry>,
    last_error: Option<MoveError>,
    outcome: Option<Outcome>,
}

impl Game {
    pub fn new(mut board: Board) -> Game {
        let outcome = board.calc_outcome();
        Game {
            board,
            history: Vec::new(),
            last_error: None,
            outcome,
        }
    }

    pub fn new_initial() -> Game {
        Game::new(Board::initial())
    }

    /// Creates a game and applies the whitespace-separated moves from `list`
    pub fn from_move_list(board: Board, list: &str) -> Result<Game, MoveListError> {
        let mut res = Game::new(board);
        res.push_move_list(list)?;
        Ok(res)
    }

    pub fn push_move_list(&mut self, list: &str) -> Result<(), MoveListError> {
        for (pos, token) in list.split_ascii_whitespace().enumerate() {
            self.try_apply_move(token)
                .map_err(|source| MoveListError { pos, source })?;
        }
        Ok(())
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.board.side()
    }

    #[inline]
    pub fn piece_at(&self, c: Coord) -> Option<(PieceKind, Color)> {
        self.board.piece_at(c)
    }

    #[inline]
    pub fn move_history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[inline]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[inline]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Returns the result line, like `"0-1 (checkmate)"`, if the game is over
    pub fn result(&self) -> Option<String> {
        self.outcome.map(|o| o.to_string())
    }

    /// Returns the reason why the last submitted move was rejected
    #[inline]
    pub fn last_error(&self) -> Option<&MoveError> {
        self.last_error.as_ref()
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(|e| e.to_string())
    }

    /// Applies the move given in algebraic notation
    ///
    /// Returns `false` if the move is rejected. In this case, the reason is available via
    /// [`Game::last_error()`].
    pub fn apply_move(&mut self, notation: &str) -> bool {
        match self.try_apply_move(notation) {
            Ok(()) => {
                self.last_error = None;
                true
            }
            Err(e) => {
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Applies the move given in algebraic notation, returning the rejection reason on error
    ///
    /// Unlike [`Game::apply_move()`], this doesn't touch the last error.
    pub fn try_apply_move(&mut self, notation: &str) -> Result<(), MoveError> {
        let side = self.board.side();
        if self.is_over() {
            debug!(notation, %side, reason = %MoveError::GameOver, "move rejected");
            return Err(MoveError::GameOver);
        }
        let number = self.board.move_number();
        let recorded = match san::play(&mut self.board, notation) {
            Ok(recorded) => recorded,
            Err(e) => {
                debug!(notation, %side, reason = %e, "move rejected");
                return Err(e);
            }
        };
        debug!(notation, %side, %recorded, "move committed");
        self.record(number, side, recorded);
        self.outcome = self.board.calc_outcome();
        if let Some(outcome) = self.outcome {
            info!(%outcome, "game over");
        }
        Ok(())
    }

    fn record(&mut self, number: u32, side: Color, text: String) {
        match side {
            Color::White => self.history.push(HistoryEntry {
                number,
                white: Some(text),
                black: None,
            }),
            Color::Black => match self.history.last_mut() {
                Some(entry) if entry.number == number && entry.black.is_none() => {
                    entry.black = Some(text);
                }
                _ => self.history.push(HistoryEntry {
                    number,
                    white: None,
                    black: Some(text),
                }),
            },
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Result<(), MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        info!(%outcome, "game over");
        self.outcome = Some(outcome);
        Ok(())
    }

    /// Ends the game with the win of the opponent of `side`
    pub fn resign(&mut self, side: Color) -> Result<(), MoveError> {
        self.finish(Outcome::Win {
            side: side.inv(),
            reason: WinReason::Resign,
        })
    }

    /// Ends the game with a draw by agreement
    pub fn agree_draw(&mut self) -> Result<(), MoveError> {
        self.finish(Outcome::Draw(DrawReason::Agreement))
    }

    /// Asks `player` for a move and applies it
    ///
    /// The player is assumed to play for the side to move.
    pub fn play_turn(&mut self, player: &mut impl Player) -> bool {
        let notation = player.next_move(self);
        self.apply_move(&notation)
    }
}

impl Default for Game {
    fn default() -> Game {
        Game::new_initial()
    }
}
