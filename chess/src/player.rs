//! Sources of moves for a [`Game`]

use crate::game::Game;

use std::collections::VecDeque;

/// Anything that can supply a move when it's its turn
pub trait Player {
    /// Returns the next move in algebraic notation
    fn next_move(&mut self, game: &Game) -> String;
}

/// Player that replays a fixed list of moves
///
/// When the list is exhausted, it returns empty strings, which are always rejected.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlayer {
    moves: VecDeque<String>,
}

impl ScriptedPlayer {
    pub fn new<I, S>(moves: I) -> ScriptedPlayer
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPlayer {
            moves: moves.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a player from whitespace-separated moves
    pub fn from_list(list: &str) -> ScriptedPlayer {
        ScriptedPlayer::new(list.split_ascii_whitespace())
    }

    pub fn is_exhausted(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Player for ScriptedPlayer {
    fn next_move(&mut self, _game: &Game) -> String {
        self.moves.pop_front().unwrap_or_default()
    }
}
