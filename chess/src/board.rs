//! Board and related things

use crate::moves::Move;
use crate::piece::{EnPassant, Piece};
use crate::types::{
    CastlingSide, Color, Coord, DrawReason, File, Outcome, PieceKind, Rank, WinReason,
};
use crate::{geometry, movegen};

use std::fmt;

use arrayvec::ArrayVec;
use thiserror::Error;

/// Error parsing a piece placement (i.e. the first part of FEN)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum PlacementError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
    /// One of the sides doesn't have a king
    #[error("no king of color {0}")]
    NoKing(Color),
    /// One of the sides has more than one king
    #[error("more than one king of color {0}")]
    TooManyKings(Color),
    /// There is a pawn on the 1st or on the 8th rank
    #[error("invalid pawn position {0}")]
    InvalidPawn(Coord),
    /// The side which has just moved left its king under attack
    #[error("opponent's king is attacked")]
    OpponentKingAttacked,
}

/// Error making a move via [`Board::make_move()`]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// Move doesn't follow the movement pattern of the piece
    #[error("move is not pseudo-legal")]
    NotPseudoLegal,
    /// Castling conditions are not met
    #[error("castling is not available")]
    CastlingUnavailable,
    /// Move leaves the mover's king under attack
    #[error("move leaves the king in check")]
    KingAttacked,
}

/// Squares that must be empty and unattacked for kingside castling
const KINGSIDE_PATH: [File; 2] = [File::F, File::G];

/// Squares that must be empty and unattacked for queenside castling
///
/// The b-file square is required to be unattacked as well, although the king never crosses it.
const QUEENSIDE_PATH: [File; 3] = [File::D, File::C, File::B];

/// Data to revert a tested move
#[derive(Debug, Clone)]
enum Undo {
    Step {
        mover: Piece,
        dst: Coord,
        captured: Option<Piece>,
        marked: ArrayVec<(Coord, Option<EnPassant>), 2>,
    },
    EnPassant {
        mover: Piece,
        target: Coord,
        capture: Coord,
        captured: Option<Piece>,
    },
    Castling {
        side: CastlingSide,
        king: Piece,
        rook: Piece,
    },
}

/// Chess board
///
/// The board owns all the pieces, tracks the side to move and the ply counter, and answers all
/// the legality questions.
///
/// There is no separate attack map. Each piece caches its pseudo-legal moves and captures, and
/// these are regenerated for every piece whenever the position changes. Legality of a move is
/// established by playing it with [`Board::test_move()`], querying the resulting position, and
/// reverting it with [`Board::undo_test_move()`]. Such brackets may nest, but they must never
/// overlap.
#[derive(Debug, Clone)]
pub struct Board {
    cells: [Option<Piece>; 64],
    side: Color,
    ply: u32,
    move_number: u32,
    undo: Vec<Undo>,
}

fn is_home_square(kind: PieceKind, color: Color, c: Coord) -> bool {
    if kind == PieceKind::Pawn {
        return c.rank() == geometry::double_move_src_rank(color);
    }
    if c.rank() != geometry::castling_rank(color) {
        return false;
    }
    match kind {
        PieceKind::Pawn => unreachable!(),
        PieceKind::King => c.file() == File::E,
        PieceKind::Queen => c.file() == File::D,
        PieceKind::Rook => matches!(c.file(), File::A | File::H),
        PieceKind::Knight => matches!(c.file(), File::B | File::G),
        PieceKind::Bishop => matches!(c.file(), File::C | File::F),
    }
}

fn piece_from_char(c: char) -> Option<(PieceKind, Color)> {
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let kind = match c.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'k' => PieceKind::King,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        _ => return None,
    };
    Some((kind, color))
}

impl Board {
    fn empty(side: Color) -> Board {
        Board {
            cells: [None; 64],
            side,
            ply: 0,
            move_number: 1,
            undo: Vec::new(),
        }
    }

    /// Returns a board with the initial position
    pub fn initial() -> Board {
        let mut res = Board::empty(Color::White);
        for (color, rank) in [(Color::White, Rank::R1), (Color::Black, Rank::R8)] {
            let back = [
                PieceKind::Rook,
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Queen,
                PieceKind::King,
                PieceKind::Bishop,
                PieceKind::Knight,
                PieceKind::Rook,
            ];
            for (file, kind) in File::iter().zip(back) {
                res.put(Piece::new(kind, color, Coord::from_parts(file, rank)));
            }
            let pawn_rank = geometry::double_move_src_rank(color);
            for file in File::iter() {
                res.put(Piece::new(
                    PieceKind::Pawn,
                    color,
                    Coord::from_parts(file, pawn_rank),
                ));
            }
        }
        res.refresh();
        res
    }

    /// Builds a board from the piece placement part of FEN (like `"8/8/8/8/8/8/8/K6k"`)
    ///
    /// Each piece standing on one of its initial squares is treated as never moved, all the
    /// other pieces are treated as moved. No en passant rights are granted.
    pub fn from_placement(s: &str, side: Color) -> Result<Board, PlacementError> {
        type Error = PlacementError;

        let mut res = Board::empty(side);
        let mut file = 0_usize;
        let mut rank = 7_usize;
        let mut ranks_done = 0_usize;
        for ch in s.chars() {
            match ch {
                '1'..='8' => {
                    let add = (u32::from(ch) - u32::from('0')) as usize;
                    if file + add > 8 {
                        return Err(Error::RankOverflow(Rank::from_index(rank)));
                    }
                    file += add;
                }
                '/' => {
                    if file < 8 {
                        return Err(Error::RankUnderflow(Rank::from_index(rank)));
                    }
                    if rank == 0 {
                        return Err(Error::Overflow);
                    }
                    rank -= 1;
                    ranks_done += 1;
                    file = 0;
                }
                _ => {
                    if file >= 8 {
                        return Err(Error::RankOverflow(Rank::from_index(rank)));
                    }
                    let (kind, color) = piece_from_char(ch).ok_or(Error::UnexpectedChar(ch))?;
                    let coord = Coord::from_parts(File::from_index(file), Rank::from_index(rank));
                    let mut piece = Piece::new(kind, color, coord);
                    piece.set_moved(!is_home_square(kind, color, coord));
                    res.put(piece);
                    file += 1;
                }
            }
        }
        if file < 8 {
            return Err(Error::RankUnderflow(Rank::from_index(rank)));
        }
        if ranks_done < 7 {
            return Err(Error::Underflow);
        }

        for color in [Color::White, Color::Black] {
            match res.pieces_of(color).filter(|p| p.kind() == PieceKind::King).count() {
                0 => return Err(Error::NoKing(color)),
                1 => {}
                _ => return Err(Error::TooManyKings(color)),
            }
        }
        if let Some(p) = res.pieces().find(|p| {
            p.kind() == PieceKind::Pawn && matches!(p.pos().rank(), Rank::R1 | Rank::R8)
        }) {
            return Err(Error::InvalidPawn(p.pos()));
        }

        res.refresh();
        if res.is_check(side.inv()) {
            return Err(Error::OpponentKingAttacked);
        }
        Ok(res)
    }

    fn put(&mut self, piece: Piece) {
        self.cells[piece.pos().index()] = Some(piece);
    }

    fn take(&mut self, c: Coord) -> Piece {
        match self.cells[c.index()].take() {
            Some(p) => p,
            None => panic!("no piece on {}", c),
        }
    }

    /// Returns the piece on the square `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Option<&Piece> {
        self.cells[c.index()].as_ref()
    }

    /// Returns the kind and the color of the piece on the square `c`
    #[inline]
    pub fn piece_at(&self, c: Coord) -> Option<(PieceKind, Color)> {
        self.get(c).map(|p| (p.kind(), p.color()))
    }

    /// Returns side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.side
    }

    /// Returns the number of half-moves made on this board
    #[inline]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    /// Returns the number of the current full move
    ///
    /// It starts from 1 and is incremented after each move by Black.
    #[inline]
    pub fn move_number(&self) -> u32 {
        self.move_number
    }

    /// Returns the number of tested moves that are not undone yet
    #[inline]
    pub fn test_depth(&self) -> usize {
        self.undo.len()
    }

    /// Iterates over all the pieces on the board
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.cells.iter().flatten()
    }

    /// Iterates over all the pieces of color `c`
    pub fn pieces_of(&self, c: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces().filter(move |p| p.color() == c)
    }

    /// Returns the position of the king of color `c`
    pub fn king_pos(&self, c: Color) -> Coord {
        match self
            .pieces_of(c)
            .find(|p| p.kind() == PieceKind::King)
        {
            Some(p) => p.pos(),
            None => panic!("no {} king on the board", c),
        }
    }

    /// Regenerates pseudo-legal moves and captures for every piece on the board
    fn refresh(&mut self) {
        let mut targets = [None; 64];
        for p in self.pieces() {
            targets[p.pos().index()] = Some((movegen::moves_of(p, self), movegen::captures_of(p, self)));
        }
        for (cell, target) in self.cells.iter_mut().zip(targets) {
            if let (Some(p), Some((moves, captures))) = (cell, target) {
                p.set_targets(moves, captures);
            }
        }
    }

    /// Grants en passant rights to the opposing pawns next to the pawn which has just
    /// made a double step to `dst`
    fn grant_enpassant(
        &mut self,
        mover: &Piece,
        dst: Coord,
    ) -> ArrayVec<(Coord, Option<EnPassant>), 2> {
        let mut marked = ArrayVec::new();
        let Some(target) = mover.pos().try_shift(0, geometry::pawn_forward(mover.color())) else {
            return marked;
        };
        for df in [-1, 1] {
            let Some(c) = dst.try_shift(df, 0) else {
                continue;
            };
            if let Some(p) = self.cells[c.index()].as_mut() {
                if p.kind() == PieceKind::Pawn && p.color() != mover.color() {
                    marked.push((c, p.enpassant()));
                    p.set_enpassant(Some(EnPassant {
                        target,
                        capture: dst,
                    }));
                }
            }
        }
        marked
    }

    /// Plays the move `mv` temporarily
    ///
    /// Side to move, ply counter and "has moved" flags stay unchanged. The move must be undone
    /// with [`Board::undo_test_move()`] or made permanent with [`Board::commit_test_move()`]
    /// before any other tested move is made, unless it is nested into this one.
    ///
    /// # Panics
    ///
    /// The function panics if there is no piece to move, i.e. if `mv` is not pseudo-legal.
    pub fn test_move(&mut self, mv: Move) {
        let frame = match mv {
            Move::Step { src, dst, promote } => {
                let mover = self.take(src);
                let captured = self.cells[dst.index()].take();
                let mut moved = match promote {
                    Some(kind) => mover.promoted(kind),
                    None => mover,
                };
                moved.set_pos(dst);
                self.put(moved);
                let is_double = mover.kind() == PieceKind::Pawn
                    && src.rank().index().abs_diff(dst.rank().index()) == 2;
                let marked = if is_double {
                    self.grant_enpassant(&mover, dst)
                } else {
                    ArrayVec::new()
                };
                Undo::Step {
                    mover,
                    dst,
                    captured,
                    marked,
                }
            }
            Move::EnPassant { src } => {
                let mover = self.take(src);
                let Some(ep) = mover.enpassant() else {
                    panic!("pawn on {} cannot capture en passant", src);
                };
                let captured = self.cells[ep.capture.index()].take();
                let mut moved = mover;
                moved.set_pos(ep.target);
                self.put(moved);
                Undo::EnPassant {
                    mover,
                    target: ep.target,
                    capture: ep.capture,
                    captured,
                }
            }
            Move::Castling(side) => {
                let sq = Move::castling_squares(self.side, side);
                let king = self.take(sq.king_src);
                let rook = self.take(sq.rook_src);
                let mut moved_king = king;
                moved_king.set_pos(sq.king_dst);
                let mut moved_rook = rook;
                moved_rook.set_pos(sq.rook_dst);
                self.put(moved_king);
                self.put(moved_rook);
                Undo::Castling { side, king, rook }
            }
        };
        self.undo.push(frame);
        self.refresh();
    }

    /// Reverts the last tested move
    ///
    /// After this, the board is exactly the same as before the matching [`Board::test_move()`],
    /// including all the generated moves and captures.
    ///
    /// # Panics
    ///
    /// The function panics if there is no tested move to undo.
    pub fn undo_test_move(&mut self) {
        let Some(frame) = self.undo.pop() else {
            panic!("undo_test_move() called without a matching test_move()");
        };
        match frame {
            Undo::Step {
                mover,
                dst,
                captured,
                marked,
            } => {
                for (c, ep) in marked {
                    if let Some(p) = self.cells[c.index()].as_mut() {
                        p.set_enpassant(ep);
                    }
                }
                self.cells[dst.index()] = captured;
                self.put(mover);
            }
            Undo::EnPassant {
                mover,
                target,
                capture,
                captured,
            } => {
                self.cells[target.index()] = None;
                self.cells[capture.index()] = captured;
                self.put(mover);
            }
            Undo::Castling { side, king, rook } => {
                let sq = Move::castling_squares(king.color(), side);
                self.cells[sq.king_dst.index()] = None;
                self.cells[sq.rook_dst.index()] = None;
                self.put(king);
                self.put(rook);
            }
        }
        self.refresh();
    }

    /// Makes the last tested move permanent and passes the turn to the opponent
    ///
    /// # Panics
    ///
    /// The function panics if there is no tested move, or if the tested move is nested into
    /// another one.
    pub fn commit_test_move(&mut self) {
        let Some(frame) = self.undo.pop() else {
            panic!("commit_test_move() called without a matching test_move()");
        };
        assert!(self.undo.is_empty(), "cannot commit a nested tested move");
        let moved: ArrayVec<Coord, 2> = match frame {
            Undo::Step { mover, dst, .. } => {
                // A promoted piece is new, so it is not marked as moved
                let promoted = self.get(dst).map(|p| p.kind()) != Some(mover.kind());
                (!promoted).then_some(dst).into_iter().collect()
            }
            Undo::EnPassant { target, .. } => [target].into_iter().collect(),
            Undo::Castling { side, king, .. } => {
                let sq = Move::castling_squares(king.color(), side);
                [sq.king_dst, sq.rook_dst].into_iter().collect()
            }
        };
        for c in moved {
            if let Some(p) = self.cells[c.index()].as_mut() {
                p.mark_moved();
            }
        }

        let side = self.side;
        for p in self.cells.iter_mut().flatten() {
            if p.color() == side {
                p.set_enpassant(None);
            }
        }
        if side == Color::Black {
            self.move_number += 1;
        }
        self.side = side.inv();
        self.ply += 1;
        self.refresh();
    }

    /// Plays `mv`, calls `f` on the resulting position and reverts the move
    pub fn probe<R>(&mut self, mv: Move, f: impl FnOnce(&mut Board) -> R) -> R {
        self.test_move(mv);
        let res = f(self);
        self.undo_test_move();
        res
    }

    /// Returns `true` if `mv` follows the movement rules for the side to move, ignoring
    /// king safety
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        match mv {
            Move::Step { src, dst, promote } => {
                let Some(p) = self.get(src) else {
                    return false;
                };
                if p.color() != self.side || !(p.moves() | p.captures()).has(dst) {
                    return false;
                }
                let is_promote =
                    p.kind() == PieceKind::Pawn && dst.rank() == geometry::promote_rank(p.color());
                match promote {
                    Some(kind) => is_promote && kind.is_promote_target(),
                    None => !is_promote,
                }
            }
            Move::EnPassant { src } => matches!(
                self.get(src),
                Some(p) if p.color() == self.side && p.enpassant().is_some()
            ),
            Move::Castling(side) => self.can_castle(side),
        }
    }

    /// Makes the move `mv` if it is legal
    ///
    /// On error, the board is left unchanged.
    pub fn make_move(&mut self, mv: Move) -> Result<(), ValidateError> {
        if !self.is_pseudo_legal(mv) {
            return Err(match mv {
                Move::Castling(_) => ValidateError::CastlingUnavailable,
                _ => ValidateError::NotPseudoLegal,
            });
        }
        self.test_move(mv);
        if self.is_check(self.side) {
            self.undo_test_move();
            return Err(ValidateError::KingAttacked);
        }
        self.commit_test_move();
        Ok(())
    }

    /// Returns `true` if the king of color `c` is captured by any opposing piece
    pub fn is_check(&self, c: Color) -> bool {
        let king = self.king_pos(c);
        self.pieces_of(c.inv()).any(|p| p.captures().has(king))
    }

    /// Returns `true` if the king of color `c` is not under attack
    #[inline]
    pub fn is_king_safe(&self, c: Color) -> bool {
        !self.is_check(c)
    }

    /// Returns `true` if any piece of color `by` attacks the square `c`
    pub fn is_attacked(&self, c: Coord, by: Color) -> bool {
        self.pieces_of(by).any(|p| movegen::attacks_of(p).has(c))
    }

    /// Returns all the moves, captures and en passant captures of color `c` that follow the
    /// movement rules, ignoring king safety and castling
    fn pseudo_legal_responses(&self, c: Color) -> Vec<Move> {
        let mut res = Vec::new();
        for p in self.pieces_of(c) {
            for dst in p.moves() | p.captures() {
                res.push(Move::step(p.pos(), dst));
            }
            if p.enpassant().is_some() {
                res.push(Move::EnPassant { src: p.pos() });
            }
        }
        res
    }

    /// Returns `true` if no move of color `c` leaves its king safe
    ///
    /// Every pseudo-legal move is played and reverted to find out. This is the costliest
    /// operation on the board.
    pub fn has_no_legal_responses(&mut self, c: Color) -> bool {
        let candidates = self.pseudo_legal_responses(c);
        !candidates
            .into_iter()
            .any(|mv| self.probe(mv, |b| b.is_king_safe(c)))
    }

    pub fn is_checkmate(&mut self, c: Color) -> bool {
        self.has_no_legal_responses(c) && self.is_check(c)
    }

    pub fn is_stalemate(&mut self, c: Color) -> bool {
        self.has_no_legal_responses(c) && !self.is_check(c)
    }

    /// Returns `true` if there is too little material left to continue
    ///
    /// Besides the kings, the board must contain either at most one piece, or exactly two
    /// bishops. Any pawn, rook or queen rules the draw out.
    pub fn is_insufficient_material(&self) -> bool {
        let mut count = 0;
        let mut bishops = 0;
        for p in self.pieces() {
            match p.kind() {
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                PieceKind::King => {}
                PieceKind::Bishop => {
                    count += 1;
                    bishops += 1;
                }
                PieceKind::Knight => count += 1,
            }
        }
        count < 2 || (count == 2 && bishops == 2)
    }

    /// Returns `true` if the side to move may castle to `side` right now
    ///
    /// The side must not be in check, the king and the rook must stand on their initial squares
    /// and never have moved, and the squares between them must be empty and not attacked.
    pub fn can_castle(&self, side: CastlingSide) -> bool {
        let color = self.side;
        let sq = Move::castling_squares(color, side);
        let unmoved = |c: Coord, kind: PieceKind| {
            matches!(
                self.get(c),
                Some(p) if p.kind() == kind && p.color() == color && !p.has_moved()
            )
        };
        if !unmoved(sq.king_src, PieceKind::King) || !unmoved(sq.rook_src, PieceKind::Rook) {
            return false;
        }
        if self.is_check(color) {
            return false;
        }
        let path: &[File] = match side {
            CastlingSide::King => &KINGSIDE_PATH,
            CastlingSide::Queen => &QUEENSIDE_PATH,
        };
        let rank = geometry::castling_rank(color);
        path.iter().all(|&file| {
            let c = Coord::from_parts(file, rank);
            self.get(c).is_none() && !self.is_attacked(c, color.inv())
        })
    }

    /// Returns all the legal moves for the side to move
    ///
    /// Promotions are listed once for each piece kind a pawn can promote to.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        let side = self.side;
        let mut candidates = Vec::new();
        for mv in self.pseudo_legal_responses(side) {
            match mv {
                Move::Step { src, dst, .. }
                    if self.get(src).map(|p| p.kind()) == Some(PieceKind::Pawn)
                        && dst.rank() == geometry::promote_rank(side) =>
                {
                    for kind in [
                        PieceKind::Queen,
                        PieceKind::Rook,
                        PieceKind::Bishop,
                        PieceKind::Knight,
                    ] {
                        candidates.push(Move::Step {
                            src,
                            dst,
                            promote: Some(kind),
                        });
                    }
                }
                _ => candidates.push(mv),
            }
        }
        let mut res: Vec<Move> = candidates
            .into_iter()
            .filter(|&mv| self.probe(mv, |b| b.is_king_safe(side)))
            .collect();
        for castling in [CastlingSide::King, CastlingSide::Queen] {
            if self.can_castle(castling) {
                res.push(Move::Castling(castling));
            }
        }
        res
    }

    /// Calculates the current outcome on the board for the side to move
    ///
    /// Checkmate and stalemate take precedence over insufficient material.
    pub fn calc_outcome(&mut self) -> Option<Outcome> {
        let side = self.side;
        if self.has_no_legal_responses(side) {
            return if self.is_check(side) {
                Some(Outcome::Win {
                    side: side.inv(),
                    reason: WinReason::Checkmate,
                })
            } else {
                Some(Outcome::Draw(DrawReason::Stalemate))
            };
        }
        if self.is_insufficient_material() {
            return Some(Outcome::Draw(DrawReason::InsufficientMaterial));
        }
        None
    }

    /// Converts the board into a piece placement string
    ///
    /// Does the same as `Board::to_string()`.
    pub fn as_placement(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Board) -> bool {
        self.cells == other.cells
            && self.side == other.side
            && self.ply == other.ply
            && self.move_number == other.move_number
    }
}

impl Eq for Board {}

impl Default for Board {
    fn default() -> Board {
        Board::initial()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for rank in (0..8).rev().map(Rank::from_index) {
            if rank != Rank::R8 {
                write!(f, "/")?;
            }
            let mut empty = 0;
            for file in File::iter() {
                let Some(p) = self.get(Coord::from_parts(file, rank)) else {
                    empty += 1;
                    continue;
                };
                if empty != 0 {
                    write!(f, "{}", empty)?;
                    empty = 0;
                }
                write!(f, "{}", p.as_char())?;
            }
            if empty != 0 {
                write!(f, "{}", empty)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const INI_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

    fn c(s: &str) -> Coord {
        Coord::from_str(s).unwrap()
    }

    fn board(placement: &str, side: Color) -> Board {
        Board::from_placement(placement, side).unwrap()
    }

    #[test]
    fn test_initial() {
        let b = Board::initial();
        assert_eq!(b.as_placement(), INI_PLACEMENT);
        assert_eq!(b, board(INI_PLACEMENT, Color::White));
        assert_eq!(b.side(), Color::White);
        assert_eq!(b.ply(), 0);
        assert_eq!(b.move_number(), 1);
        assert_eq!(b.pieces().count(), 32);
        assert_eq!(b.king_pos(Color::White), c("e1"));
        assert_eq!(b.king_pos(Color::Black), c("e8"));
        assert_eq!(
            b.piece_at(c("d8")),
            Some((PieceKind::Queen, Color::Black))
        );
        assert_eq!(b.piece_at(c("d4")), None);
        assert!(!b.is_check(Color::White));
        assert!(!b.is_check(Color::Black));
    }

    #[test]
    fn test_placement_errors() {
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/K6", Color::White),
            Err(PlacementError::RankUnderflow(Rank::R1))
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/K6k", Color::White),
            Err(PlacementError::Underflow)
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/K6k/8", Color::White),
            Err(PlacementError::Overflow)
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/K7k", Color::White),
            Err(PlacementError::RankOverflow(Rank::R1))
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/K5zk", Color::White),
            Err(PlacementError::UnexpectedChar('z'))
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/K7", Color::White),
            Err(PlacementError::NoKing(Color::Black))
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/KK5k", Color::White),
            Err(PlacementError::TooManyKings(Color::White))
        );
        assert_eq!(
            Board::from_placement("P7/8/8/8/8/8/8/K6k", Color::White),
            Err(PlacementError::InvalidPawn(c("a8")))
        );
        assert_eq!(
            Board::from_placement("8/8/8/8/8/8/8/K5Rk", Color::White),
            Err(PlacementError::OpponentKingAttacked)
        );
    }

    #[test]
    fn test_moved_flags() {
        let b = board("4k3/8/8/8/8/8/P3P3/R3K1R1", Color::White);
        assert!(!b.get(c("a1")).unwrap().has_moved());
        assert!(!b.get(c("e1")).unwrap().has_moved());
        assert!(b.get(c("g1")).unwrap().has_moved());
        assert!(!b.get(c("a2")).unwrap().has_moved());
        assert!(!b.get(c("e8")).unwrap().has_moved());
    }

    #[test]
    fn test_undo_roundtrip() {
        let mut b = board("r3k2r/pp1n1ppp/8/2pPp3/8/5N2/PPP2PPP/R3K2R", Color::White);
        let before = b.clone();
        for mv in b.legal_moves() {
            b.test_move(mv);
            assert_eq!(b.test_depth(), 1);
            b.undo_test_move();
            assert_eq!(b.test_depth(), 0);
            assert_eq!(b, before, "move {} is not reverted", mv);
        }
    }

    #[test]
    fn test_nested_probe() {
        let mut b = Board::initial();
        let before = b.clone();
        let inner = b.probe(Move::step(c("e2"), c("e4")), |b| {
            assert_eq!(b.piece_at(c("e4")), Some((PieceKind::Pawn, Color::White)));
            b.probe(Move::step(c("d7"), c("d5")), |b| {
                assert_eq!(b.test_depth(), 2);
                b.get(c("e4")).unwrap().captures()
            })
        });
        assert!(inner.has(c("d5")));
        assert_eq!(b, before);
        assert_eq!(b.test_depth(), 0);
    }

    #[test]
    #[should_panic]
    fn test_unbalanced_undo() {
        let mut b = Board::initial();
        b.undo_test_move();
    }

    #[test]
    fn test_check() {
        let b = board("4k3/8/8/8/8/8/4r3/4K3", Color::White);
        assert!(b.is_check(Color::White));
        assert!(!b.is_king_safe(Color::White));
        assert!(!b.is_check(Color::Black));
    }

    #[test]
    fn test_discovered_check() {
        // The knight is pinned against its king
        let mut b = board("4k3/8/8/8/4r3/8/4N3/4K3", Color::White);
        let mv = Move::step(c("e2"), c("c3"));
        assert!(b.is_pseudo_legal(mv));
        assert_eq!(b.make_move(mv), Err(ValidateError::KingAttacked));
        assert_eq!(b.side(), Color::White);
        assert!(b.legal_moves().iter().all(|mv| !matches!(
            mv,
            Move::Step { src, .. } if *src == c("e2")
        )));
    }

    #[test]
    fn test_outcome() {
        let mut b = Board::initial();
        assert_eq!(b.calc_outcome(), None);
        assert_eq!(b.legal_moves().len(), 20);

        // Back rank mate
        let mut b = board("6k1/5ppp/8/8/8/8/8/R5K1", Color::White);
        b.make_move(Move::step(c("a1"), c("a8"))).unwrap();
        assert!(b.is_checkmate(Color::Black));
        assert!(!b.is_stalemate(Color::Black));
        assert_eq!(
            b.calc_outcome(),
            Some(Outcome::Win {
                side: Color::White,
                reason: WinReason::Checkmate
            })
        );

        let mut b = board("7K/8/5n2/5n2/8/8/7k/8", Color::White);
        assert!(b.has_no_legal_responses(Color::White));
        assert!(b.is_stalemate(Color::White));
        assert!(!b.is_checkmate(Color::White));
        assert_eq!(b.calc_outcome(), Some(Outcome::Draw(DrawReason::Stalemate)));
    }

    #[test]
    fn test_insufficient_material() {
        let mut b = board("7K/8/8/8/8/8/7k/8", Color::White);
        assert!(b.is_insufficient_material());
        assert_eq!(
            b.calc_outcome(),
            Some(Outcome::Draw(DrawReason::InsufficientMaterial))
        );

        assert!(board("7K/8/5n2/8/8/8/7k/8", Color::White).is_insufficient_material());
        assert!(board("7K/8/5b2/8/8/2B5/7k/8", Color::White).is_insufficient_material());
        assert!(board("7K/8/5b2/8/8/8/2b4k/8", Color::White).is_insufficient_material());
        assert!(!board("7K/8/5n2/8/8/2N5/7k/8", Color::White).is_insufficient_material());
        assert!(!board("7K/8/5n2/8/8/2B5/7k/8", Color::White).is_insufficient_material());
        assert!(!board("7K/8/8/8/8/2R5/7k/8", Color::White).is_insufficient_material());
        assert!(!board("7K/8/8/8/8/2P5/7k/8", Color::White).is_insufficient_material());
        assert!(!board("7K/8/8/8/8/8/7k/q7", Color::White).is_insufficient_material());
    }

    #[test]
    fn test_castling() {
        let mut b = board("r3k2r/8/8/8/8/8/8/R3K2R", Color::White);
        assert!(b.can_castle(CastlingSide::King));
        assert!(b.can_castle(CastlingSide::Queen));
        b.make_move(Move::Castling(CastlingSide::King)).unwrap();
        assert_eq!(b.as_placement(), "r3k2r/8/8/8/8/8/8/R4RK1");
        assert!(b.get(c("g1")).unwrap().has_moved());
        assert!(b.get(c("f1")).unwrap().has_moved());
        assert!(b.can_castle(CastlingSide::Queen));
        b.make_move(Move::Castling(CastlingSide::Queen)).unwrap();
        assert_eq!(b.as_placement(), "2kr3r/8/8/8/8/8/8/R4RK1");

        // Initial position: the path is blocked
        let b = Board::initial();
        assert!(!b.can_castle(CastlingSide::King));
        assert!(!b.can_castle(CastlingSide::Queen));
    }

    #[test]
    fn test_castling_restrictions() {
        // In check
        let b = board("4k3/8/8/8/8/8/4r3/R3K2R", Color::White);
        assert!(!b.can_castle(CastlingSide::King));
        assert!(!b.can_castle(CastlingSide::Queen));

        // Path attacked
        let b = board("4k3/8/8/8/8/8/6r1/R3K2R", Color::White);
        assert!(!b.can_castle(CastlingSide::King));
        assert!(b.can_castle(CastlingSide::Queen));

        // Path attacked by pawns
        let b = board("4k3/8/8/8/8/8/6p1/R3K2R", Color::White);
        assert!(!b.can_castle(CastlingSide::King));
        assert!(b.can_castle(CastlingSide::Queen));
        let b = board("4k3/8/8/8/8/8/2p3p1/R3K2R", Color::White);
        assert!(!b.can_castle(CastlingSide::King));
        assert!(!b.can_castle(CastlingSide::Queen));

        // The b-file square is attacked: queenside castling is refused as well
        let b = board("4k3/8/8/8/8/8/1r6/R3K2R", Color::White);
        assert!(!b.can_castle(CastlingSide::Queen));
        assert!(b.can_castle(CastlingSide::King));

        // The rook has moved away and back
        let mut b = board("4k3/8/8/8/8/8/8/R3K2R", Color::White);
        b.make_move(Move::step(c("h1"), c("h2"))).unwrap();
        b.make_move(Move::step(c("e8"), c("d8"))).unwrap();
        b.make_move(Move::step(c("h2"), c("h1"))).unwrap();
        b.make_move(Move::step(c("d8"), c("e8"))).unwrap();
        assert!(!b.can_castle(CastlingSide::King));
        assert!(b.can_castle(CastlingSide::Queen));
        assert_eq!(
            b.make_move(Move::Castling(CastlingSide::King)),
            Err(ValidateError::CastlingUnavailable)
        );
    }

    #[test]
    fn test_enpassant_window() {
        let mut b = board("4k3/3p4/8/4P3/8/8/8/4K3", Color::Black);
        b.make_move(Move::step(c("d7"), c("d5"))).unwrap();
        let ep = b.get(c("e5")).unwrap().enpassant();
        assert_eq!(
            ep,
            Some(EnPassant {
                target: c("d6"),
                capture: c("d5")
            })
        );
        assert!(b.is_pseudo_legal(Move::EnPassant { src: c("e5") }));

        let mut taken = b.clone();
        taken.make_move(Move::EnPassant { src: c("e5") }).unwrap();
        assert_eq!(taken.as_placement(), "4k3/8/3P4/8/8/8/8/4K3");

        // The right expires after one unrelated move
        b.make_move(Move::step(c("e1"), c("f1"))).unwrap();
        assert_eq!(b.get(c("e5")).unwrap().enpassant(), None);
        b.make_move(Move::step(c("e8"), c("f8"))).unwrap();
        assert!(!b.is_pseudo_legal(Move::EnPassant { src: c("e5") }));
    }

    #[test]
    fn test_enpassant_undo() {
        let mut b = board("4k3/3p4/8/4P3/8/8/8/4K3", Color::Black);
        let before = b.clone();
        b.probe(Move::step(c("d7"), c("d5")), |b| {
            assert!(b.get(c("e5")).unwrap().enpassant().is_some());
            b.probe(Move::EnPassant { src: c("e5") }, |b| {
                assert_eq!(b.piece_at(c("d5")), None);
                assert_eq!(b.piece_at(c("d6")), Some((PieceKind::Pawn, Color::White)));
            });
        });
        assert_eq!(b, before);
        assert_eq!(b.get(c("e5")).unwrap().enpassant(), None);
    }

    #[test]
    fn test_promotion() {
        let mut b = board("8/4P3/8/8/8/8/8/K6k", Color::White);
        assert!(!b.is_pseudo_legal(Move::step(c("e7"), c("e8"))));
        let mv = Move::Step {
            src: c("e7"),
            dst: c("e8"),
            promote: Some(PieceKind::Queen),
        };
        assert!(b.is_pseudo_legal(mv));
        assert_eq!(b.legal_moves().len(), 4 + 3);
        b.make_move(mv).unwrap();
        let queen = b.get(c("e8")).unwrap();
        assert_eq!(queen.kind(), PieceKind::Queen);
        assert_eq!(queen.color(), Color::White);
        assert!(!queen.has_moved());
        assert!(queen.captures().is_empty());
        assert!(queen.moves().has(c("a8")));
    }

    #[test]
    fn test_counters() {
        let mut b = Board::initial();
        b.make_move(Move::step(c("e2"), c("e4"))).unwrap();
        assert_eq!((b.side(), b.ply(), b.move_number()), (Color::Black, 1, 1));
        b.make_move(Move::step(c("e7"), c("e5"))).unwrap();
        assert_eq!((b.side(), b.ply(), b.move_number()), (Color::White, 2, 2));
    }
}
