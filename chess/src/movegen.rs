//! Pseudo-legal move generation
//!
//! Generators here follow the movement pattern of each piece kind but never consult king safety.
//! Legality is established by [`Board`] by playing the move and looking at the result.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::geometry;
use crate::piece::Piece;
use crate::types::{Coord, PieceKind};

/// Walks from `from` in direction `(df, dr)` while the squares are empty
///
/// Empty squares passed are added to `empties`. Returns the first occupied square reached, or
/// `None` if the walk leaves the board. Non-sliding pieces make only one step.
fn trace(
    b: &Board,
    from: Coord,
    (df, dr): (isize, isize),
    sliding: bool,
    empties: &mut Bitboard,
) -> Option<Coord> {
    let mut cur = from.try_shift(df, dr);
    while let Some(c) = cur {
        if b.get(c).is_some() {
            return Some(c);
        }
        empties.set(c);
        if !sliding {
            return None;
        }
        cur = c.try_shift(df, dr);
    }
    None
}

fn is_enemy(b: &Board, p: &Piece, c: Coord) -> bool {
    matches!(b.get(c), Some(q) if q.color() != p.color())
}

fn pawn_moves(p: &Piece, b: &Board) -> Bitboard {
    let fwd = geometry::pawn_forward(p.color());
    let mut res = Bitboard::EMPTY;
    let Some(one) = p.pos().try_shift(0, fwd) else {
        return res;
    };
    if b.get(one).is_some() {
        return res;
    }
    res.set(one);
    if !p.has_moved() {
        if let Some(two) = one.try_shift(0, fwd) {
            if b.get(two).is_none() {
                res.set(two);
            }
        }
    }
    res
}

/// Both forward diagonals of a pawn, regardless of what stands there
fn pawn_diagonals(p: &Piece) -> Bitboard {
    let fwd = geometry::pawn_forward(p.color());
    [-1, 1]
        .into_iter()
        .filter_map(|df| p.pos().try_shift(df, fwd))
        .collect()
}

/// Returns the squares `p` can move to without capturing
pub fn moves_of(p: &Piece, b: &Board) -> Bitboard {
    if p.kind() == PieceKind::Pawn {
        return pawn_moves(p, b);
    }
    let mut res = Bitboard::EMPTY;
    for &dir in p.kind().directions() {
        trace(b, p.pos(), dir, p.kind().is_sliding(), &mut res);
    }
    res
}

/// Returns the squares with opposing pieces that `p` can capture
///
/// A sliding piece yields at most one capture per direction. En passant is never included.
pub fn captures_of(p: &Piece, b: &Board) -> Bitboard {
    if p.kind() == PieceKind::Pawn {
        return pawn_diagonals(p)
            .into_iter()
            .filter(|&c| is_enemy(b, p, c))
            .collect();
    }
    let mut res = Bitboard::EMPTY;
    let mut empties = Bitboard::EMPTY;
    for &dir in p.kind().directions() {
        if let Some(c) = trace(b, p.pos(), dir, p.kind().is_sliding(), &mut empties) {
            if is_enemy(b, p, c) {
                res.set(c);
            }
        }
    }
    res
}

/// Returns the squares `p` attacks, based on its cached move sets
///
/// For non-pawns this is the union of moves and captures. Pawns attack their forward
/// diagonals only, even when those are empty.
pub fn attacks_of(p: &Piece) -> Bitboard {
    if p.kind() == PieceKind::Pawn {
        return pawn_diagonals(p);
    }
    p.moves() | p.captures()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use std::str::FromStr;

    fn coords(s: &str) -> Bitboard {
        s.split_ascii_whitespace()
            .map(|c| Coord::from_str(c).unwrap())
            .collect()
    }

    fn piece_at<'a>(b: &'a Board, s: &str) -> &'a Piece {
        b.get(Coord::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_initial() {
        let b = Board::initial();
        let knight = piece_at(&b, "g1");
        assert_eq!(moves_of(knight, &b), coords("f3 h3"));
        assert_eq!(captures_of(knight, &b), Bitboard::EMPTY);
        assert_eq!(moves_of(piece_at(&b, "e2"), &b), coords("e3 e4"));
        assert_eq!(moves_of(piece_at(&b, "d7"), &b), coords("d6 d5"));
        assert_eq!(moves_of(piece_at(&b, "a1"), &b), Bitboard::EMPTY);
        assert_eq!(moves_of(piece_at(&b, "d1"), &b), Bitboard::EMPTY);
        assert_eq!(moves_of(piece_at(&b, "e1"), &b), Bitboard::EMPTY);
    }

    #[test]
    fn test_sliding() {
        let b = Board::from_placement("4k3/8/1p6/8/3Q1P2/8/8/4K3", Color::White).unwrap();
        let queen = piece_at(&b, "d4");
        assert_eq!(
            moves_of(queen, &b),
            coords(
                "d5 d6 d7 d8 e5 f6 g7 h8 e4 e3 f2 g1 d3 d2 d1 \
                 c3 b2 a1 c4 b4 a4 c5"
            )
        );
        assert_eq!(captures_of(queen, &b), coords("b6"));
        assert_eq!(attacks_of(queen), moves_of(queen, &b) | coords("b6"));
    }

    #[test]
    fn test_one_capture_per_direction() {
        let b = Board::from_placement("k7/8/8/8/r1r1R2K/8/8/8", Color::White).unwrap();
        let rook = piece_at(&b, "e4");
        assert_eq!(captures_of(rook, &b), coords("c4"));
        assert_eq!(moves_of(rook, &b), coords("d4 f4 g4 e5 e6 e7 e8 e3 e2 e1"));
    }

    #[test]
    fn test_stepping() {
        let b = Board::from_placement("8/8/8/8/8/1p6/2n5/K6k", Color::White).unwrap();
        let king = piece_at(&b, "a1");
        assert_eq!(moves_of(king, &b), coords("a2 b1 b2"));
        assert_eq!(captures_of(king, &b), Bitboard::EMPTY);

        let knight = piece_at(&b, "c2");
        assert_eq!(captures_of(knight, &b), coords("a1"));
        assert_eq!(moves_of(knight, &b), coords("a3 b4 d4 e3 e1"));
    }

    #[test]
    fn test_pawns() {
        let b = Board::from_placement("4k3/8/8/8/1n6/2P5/P3P3/4K3", Color::White).unwrap();
        assert_eq!(moves_of(piece_at(&b, "a2"), &b), coords("a3 a4"));
        assert_eq!(moves_of(piece_at(&b, "c3"), &b), coords("c4"));
        assert_eq!(captures_of(piece_at(&b, "c3"), &b), coords("b4"));
        assert_eq!(attacks_of(piece_at(&b, "c3")), coords("b4 d4"));
        assert_eq!(captures_of(piece_at(&b, "a2"), &b), Bitboard::EMPTY);

        // Blocked double step
        let b = Board::from_placement("4k3/8/8/8/4n3/8/4P3/4K3", Color::White).unwrap();
        assert_eq!(moves_of(piece_at(&b, "e2"), &b), coords("e3"));
        let b = Board::from_placement("4k3/8/8/8/8/4n3/4P3/4K3", Color::White).unwrap();
        assert_eq!(moves_of(piece_at(&b, "e2"), &b), Bitboard::EMPTY);
    }
}
