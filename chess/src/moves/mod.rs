//! Moves and their notation

pub mod san;

use crate::geometry;
use crate::types::{CastlingSide, Color, Coord, File, PieceKind};

use std::fmt;

/// Chess move resolved against a particular position
///
/// The move is expected to be pseudo-legal in the position it is played in. Whether it leaves
/// the mover's king attacked is decided by [`Board`](crate::board::Board) by playing it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    /// Plain move or capture by any piece, including pawn promotion
    Step {
        src: Coord,
        dst: Coord,
        promote: Option<PieceKind>,
    },
    /// En passant capture by the pawn on `src`
    ///
    /// The landing and captured squares are taken from the pawn's en passant right.
    EnPassant { src: Coord },
    /// Castling by the side to move
    Castling(CastlingSide),
}

impl Move {
    #[inline]
    pub fn step(src: Coord, dst: Coord) -> Move {
        Move::Step {
            src,
            dst,
            promote: None,
        }
    }

    /// Returns the source and destination squares of the king and the rook when `color`
    /// castles to `side`
    pub fn castling_squares(color: Color, side: CastlingSide) -> CastlingSquares {
        let rank = geometry::castling_rank(color);
        let at = |file| Coord::from_parts(file, rank);
        match side {
            CastlingSide::King => CastlingSquares {
                king_src: at(File::E),
                king_dst: at(File::G),
                rook_src: at(File::H),
                rook_dst: at(File::F),
            },
            CastlingSide::Queen => CastlingSquares {
                king_src: at(File::E),
                king_dst: at(File::C),
                rook_src: at(File::A),
                rook_dst: at(File::D),
            },
        }
    }
}

/// Squares involved into castling
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CastlingSquares {
    pub king_src: Coord,
    pub king_dst: Coord,
    pub rook_src: Coord,
    pub rook_dst: Coord,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            Move::Step { src, dst, promote } => {
                write!(f, "{}{}", src, dst)?;
                if let Some(p) = promote {
                    write!(f, "{}", p.as_char().to_ascii_lowercase())?;
                }
                Ok(())
            }
            Move::EnPassant { src } => write!(f, "{}:ep", src),
            Move::Castling(CastlingSide::King) => write!(f, "O-O"),
            Move::Castling(CastlingSide::Queen) => write!(f, "O-O-O"),
        }
    }
}
