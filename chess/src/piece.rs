//! Pieces standing on the board

use crate::bitboard::Bitboard;
use crate::types::{Color, Coord, PieceKind};

/// En passant right held by a pawn
///
/// It is granted to a pawn right after an adjacent opposing pawn makes a double step, and
/// it is valid only for the next move of the pawn's owner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EnPassant {
    /// Square where the capturing pawn lands
    pub target: Coord,
    /// Square of the pawn that is captured
    pub capture: Coord,
}

/// Piece standing on the board
///
/// Besides its kind, color and position, the piece remembers whether it has ever moved, its
/// en passant right (for pawns only), and the pseudo-legal move and capture sets generated
/// for the current position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    kind: PieceKind,
    color: Color,
    pos: Coord,
    moved: bool,
    enpassant: Option<EnPassant>,
    moves: Bitboard,
    captures: Bitboard,
}

impl Piece {
    /// Creates a piece that has not moved yet and has no move sets generated
    pub fn new(kind: PieceKind, color: Color, pos: Coord) -> Piece {
        Piece {
            kind,
            color,
            pos,
            moved: false,
            enpassant: None,
            moves: Bitboard::EMPTY,
            captures: Bitboard::EMPTY,
        }
    }

    #[inline]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn pos(&self) -> Coord {
        self.pos
    }

    #[inline]
    pub fn has_moved(&self) -> bool {
        self.moved
    }

    #[inline]
    pub fn enpassant(&self) -> Option<EnPassant> {
        self.enpassant
    }

    /// Squares this piece can move to without capturing
    #[inline]
    pub fn moves(&self) -> Bitboard {
        self.moves
    }

    /// Squares with opposing pieces this piece can capture
    ///
    /// En passant is not included here, see [`Piece::enpassant()`].
    #[inline]
    pub fn captures(&self) -> Bitboard {
        self.captures
    }

    /// Returns the piece replacing this pawn after promotion
    ///
    /// The new piece stands on the same square and is treated as never moved.
    pub fn promoted(&self, kind: PieceKind) -> Piece {
        Piece::new(kind, self.color, self.pos)
    }

    pub(crate) fn set_pos(&mut self, pos: Coord) {
        self.pos = pos;
    }

    pub(crate) fn mark_moved(&mut self) {
        self.moved = true;
    }

    pub(crate) fn set_moved(&mut self, moved: bool) {
        self.moved = moved;
    }

    pub(crate) fn set_enpassant(&mut self, ep: Option<EnPassant>) {
        self.enpassant = ep;
    }

    pub(crate) fn set_targets(&mut self, moves: Bitboard, captures: Bitboard) {
        self.moves = moves;
        self.captures = captures;
    }

    /// Letter as used in board diagrams: uppercase for White, lowercase for Black
    pub fn as_char(&self) -> char {
        let c = self.kind.as_char();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }
}
