//! Utilities to work with moves in algebraic notation
//!
//! The accepted grammar is
//!
//! ```text
//! castle   := "O-O-O" | "O-O"
//! piece    := [KQRBN] [a-h]? [1-8]? "x"? square
//! pawn     := ([a-h] "x")? square ("=" [QRBN])?
//! notation := (castle | piece | pawn) ("+" | "#")?
//! ```
//!
//! Parsing yields a [`Notation`], which is then resolved into a concrete [`Move`] against a
//! particular [`Board`]. Use [`play()`] to do all the steps at once.

use super::Move;
use crate::board::Board;
use crate::geometry;
use crate::types::{CastlingSide, Color, Coord, File, PieceKind, Rank};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error applying a move given in algebraic notation
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum MoveError {
    /// String doesn't match the notation grammar at all
    #[error("invalid input format")]
    InputFormat,
    /// No piece of the given kind can move to the given square
    #[error("no such move: {0} to {1}")]
    NoSuchMove(PieceKind, Coord),
    /// No piece of the given kind can capture on the given square
    #[error("no such capture: {0} on {1}")]
    NoSuchCapture(PieceKind, Coord),
    /// More than one piece matches the description
    #[error("ambiguous move (candidates are at least {0} and {1})")]
    Ambiguous(Coord, Coord),
    /// Move leaves the mover's king under attack
    #[error("move leaves the king in check")]
    IllegalMove,
    /// Castling conditions are not met
    #[error("invalid castle")]
    CastleUnavailable,
    /// Pawn tries to capture en passant, but the right is absent or already expired
    #[error("invalid en passant")]
    InvalidEnPassant,
    /// Promotion piece is missing, malformed or not expected
    #[error("invalid promotion")]
    InvalidPromotion,
    /// Check mark doesn't match the actual position, or there are stray characters
    #[error("extra characters in input")]
    TrailingCharacters,
    /// The game has already finished
    #[error("game is over")]
    GameOver,
}

/// Parsed move, without check mark
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Data {
    /// Castling
    Castling(CastlingSide),
    /// Pawn move or capture
    Pawn {
        /// Source file, present only for captures
        src: Option<File>,
        /// Destination square
        dst: Coord,
        /// Piece to promote, if any
        promote: Option<PieceKind>,
    },
    /// Non-pawn move
    Piece {
        /// Piece to move
        kind: PieceKind,
        /// Source file, if specified
        file: Option<File>,
        /// Source rank, if specified
        rank: Option<Rank>,
        /// Is the move capture?
        is_capture: bool,
        /// Destination square
        dst: Coord,
    },
}

/// Check indication
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CheckMark {
    /// Check (a.k.a. "+")
    Check,
    /// Checkmate (a.k.a "#")
    Checkmate,
}

impl CheckMark {
    /// Calculates the check mark for the side `c`, which is about to move
    pub fn calc(b: &mut Board, c: Color) -> Option<CheckMark> {
        if !b.is_check(c) {
            return None;
        }
        if b.has_no_legal_responses(c) {
            Some(CheckMark::Checkmate)
        } else {
            Some(CheckMark::Check)
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            CheckMark::Check => '+',
            CheckMark::Checkmate => '#',
        }
    }
}

/// Parsed move with a [`CheckMark`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Notation {
    /// Data without check mark
    pub data: Data,
    /// Check mark, if any
    pub check: Option<CheckMark>,
}

fn is_notation_char(c: char) -> bool {
    matches!(
        c,
        'a'..='h' | '1'..='8' | 'K' | 'Q' | 'R' | 'B' | 'N' | 'O' | 'x' | '-' | '=' | '+' | '#'
    )
}

fn parse_check(s: &str) -> Result<(Option<CheckMark>, &str), MoveError> {
    let (check, rest) = match s.chars().last() {
        Some('+') => (Some(CheckMark::Check), &s[..s.len() - 1]),
        Some('#') => (Some(CheckMark::Checkmate), &s[..s.len() - 1]),
        _ => (None, s),
    };
    if rest.ends_with(['+', '#']) {
        return Err(MoveError::TrailingCharacters);
    }
    Ok((check, rest))
}

/// Splits `s` into the prefix and the destination square at its end
fn split_dst(s: &str) -> Result<(&str, Coord), MoveError> {
    if s.len() < 2 {
        return Err(MoveError::InputFormat);
    }
    let (prefix, dst) = s.split_at(s.len() - 2);
    let dst = Coord::from_str(dst).map_err(|_| MoveError::InputFormat)?;
    Ok((prefix, dst))
}

impl Data {
    fn parse_piece(kind: PieceKind, s: &str) -> Result<Data, MoveError> {
        if s.contains('=') {
            return Err(MoveError::InvalidPromotion);
        }
        let (prefix, dst) = split_dst(s)?;
        let mut chars = prefix.chars().peekable();
        let file = chars.next_if(|c| matches!(*c, 'a'..='h')).and_then(File::from_char);
        let rank = chars.next_if(|c| matches!(*c, '1'..='8')).and_then(Rank::from_char);
        let is_capture = chars.next_if_eq(&'x').is_some();
        if chars.next().is_some() {
            return Err(MoveError::InputFormat);
        }
        Ok(Data::Piece {
            kind,
            file,
            rank,
            is_capture,
            dst,
        })
    }

    fn parse_pawn(s: &str) -> Result<Data, MoveError> {
        let (s, promote) = match s.split_once('=') {
            Some((s, promote)) => {
                let mut chars = promote.chars();
                let kind = match (chars.next().and_then(PieceKind::from_char), chars.next()) {
                    (Some(kind), None) if kind.is_promote_target() => kind,
                    _ => return Err(MoveError::InvalidPromotion),
                };
                (s, Some(kind))
            }
            None => (s, None),
        };
        let (prefix, dst) = split_dst(s)?;
        let src = match prefix.as_bytes() {
            [] => None,
            [file @ b'a'..=b'h', b'x'] => File::from_char(*file as char),
            _ => return Err(MoveError::InputFormat),
        };
        Ok(Data::Pawn { src, dst, promote })
    }

    /// Returns the text under which the move is recorded in the game history
    pub fn recorded(&self) -> String {
        match self {
            Data::Castling(CastlingSide::King) => "0-0".to_string(),
            Data::Castling(CastlingSide::Queen) => "0-0-0".to_string(),
            _ => self.to_string(),
        }
    }

    /// Converts the parsed notation into [`Move`] in the position `b`
    ///
    /// The board is used to try candidate moves, but it is left unchanged when the function
    /// returns. The check mark is not verified here, see [`play()`].
    pub fn into_move(self, b: &mut Board) -> Result<Move, MoveError> {
        match self {
            Data::Castling(side) => {
                if !b.can_castle(side) {
                    return Err(MoveError::CastleUnavailable);
                }
                Ok(Move::Castling(side))
            }
            Data::Pawn { src, dst, promote } => resolve_pawn(b, src, dst, promote),
            Data::Piece {
                kind,
                file,
                rank,
                is_capture,
                dst,
            } => resolve_piece(b, kind, file, rank, is_capture, dst),
        }
    }

    /// Creates the parsed notation from move `mv` in position `b`
    ///
    /// The source square is added only when it is required to pick the right piece.
    pub fn from_move(mv: Move, b: &mut Board) -> Data {
        match mv {
            Move::Castling(side) => Data::Castling(side),
            Move::EnPassant { src } => Data::Pawn {
                src: Some(src.file()),
                dst: b
                    .get(src)
                    .and_then(|p| p.enpassant())
                    .map_or(src, |ep| ep.target),
                promote: None,
            },
            Move::Step { src, dst, promote } => {
                let Some(&piece) = b.get(src) else {
                    return Data::Pawn {
                        src: None,
                        dst,
                        promote,
                    };
                };
                if piece.kind() == PieceKind::Pawn {
                    return Data::Pawn {
                        src: (src.file() != dst.file()).then_some(src.file()),
                        dst,
                        promote,
                    };
                }
                let is_capture = b.get(dst).is_some();
                let side = piece.color();
                let mut rivals: Vec<Coord> = b
                    .pieces_of(side)
                    .filter(|p| p.kind() == piece.kind() && p.pos() != src)
                    .filter(|p| {
                        if is_capture {
                            p.captures().has(dst)
                        } else {
                            p.moves().has(dst)
                        }
                    })
                    .map(|p| p.pos())
                    .collect();
                if !rivals.is_empty() {
                    rivals.retain(|&c| b.probe(Move::step(c, dst), |b| b.is_king_safe(side)));
                    let self_legal = b.probe(mv, |b| b.is_king_safe(side));
                    if !self_legal {
                        rivals.clear();
                    }
                }
                let (file, rank) = if rivals.is_empty() {
                    (None, None)
                } else if rivals.iter().all(|c| c.file() != src.file()) {
                    (Some(src.file()), None)
                } else if rivals.iter().all(|c| c.rank() != src.rank()) {
                    (None, Some(src.rank()))
                } else {
                    (Some(src.file()), Some(src.rank()))
                };
                Data::Piece {
                    kind: piece.kind(),
                    file,
                    rank,
                    is_capture,
                    dst,
                }
            }
        }
    }
}

fn resolve_pawn(
    b: &mut Board,
    src: Option<File>,
    dst: Coord,
    promote: Option<PieceKind>,
) -> Result<Move, MoveError> {
    let side = b.side();
    if (dst.rank() == geometry::promote_rank(side)) != promote.is_some() {
        return Err(MoveError::InvalidPromotion);
    }

    let Some(file) = src else {
        let src = b
            .pieces_of(side)
            .find(|p| p.kind() == PieceKind::Pawn && p.moves().has(dst))
            .map(|p| p.pos())
            .ok_or(MoveError::NoSuchMove(PieceKind::Pawn, dst))?;
        return Ok(Move::Step { src, dst, promote });
    };

    let back = -geometry::pawn_forward(side);
    let src = Coord::from_parts(file, dst.rank())
        .try_shift(0, back)
        .ok_or(MoveError::NoSuchCapture(PieceKind::Pawn, dst))?;
    let pawn = match b.get(src) {
        Some(p) if p.kind() == PieceKind::Pawn && p.color() == side => *p,
        _ => return Err(MoveError::NoSuchCapture(PieceKind::Pawn, dst)),
    };
    if pawn.captures().has(dst) {
        return Ok(Move::Step { src, dst, promote });
    }
    if pawn.enpassant().map(|ep| ep.target) == Some(dst) {
        return Ok(Move::EnPassant { src });
    }

    // Looks like en passant, but the right has expired or never existed
    let victim = dst.try_shift(0, back).and_then(|c| b.get(c));
    if b.get(dst).is_none()
        && dst.rank() == geometry::enpassant_dst_rank(side)
        && src.file().index().abs_diff(dst.file().index()) == 1
        && matches!(victim, Some(p) if p.kind() == PieceKind::Pawn && p.color() != side)
    {
        return Err(MoveError::InvalidEnPassant);
    }
    Err(MoveError::NoSuchCapture(PieceKind::Pawn, dst))
}

fn resolve_piece(
    b: &mut Board,
    kind: PieceKind,
    file: Option<File>,
    rank: Option<Rank>,
    is_capture: bool,
    dst: Coord,
) -> Result<Move, MoveError> {
    let side = b.side();
    let no_such = || {
        if is_capture {
            MoveError::NoSuchCapture(kind, dst)
        } else {
            MoveError::NoSuchMove(kind, dst)
        }
    };
    let matches_hint = |c: &Coord| {
        file.map_or(true, |f| c.file() == f) && rank.map_or(true, |r| c.rank() == r)
    };
    // Hints must agree with the only candidate
    let pick = |src: Coord| {
        if matches_hint(&src) {
            Ok(Move::step(src, dst))
        } else {
            Err(no_such())
        }
    };

    let candidates: Vec<Coord> = b
        .pieces_of(side)
        .filter(|p| p.kind() == kind)
        .filter(|p| {
            if is_capture {
                p.captures().has(dst)
            } else {
                p.moves().has(dst)
            }
        })
        .map(|p| p.pos())
        .collect();
    match candidates.as_slice() {
        [] => return Err(no_such()),
        [src] => return pick(*src),
        _ => {}
    }

    let legal: Vec<Coord> = candidates
        .into_iter()
        .filter(|&c| b.probe(Move::step(c, dst), |b| b.is_king_safe(side)))
        .collect();
    match legal.as_slice() {
        [] => return Err(MoveError::IllegalMove),
        [src] => return pick(*src),
        _ => {}
    }

    let hinted: Vec<Coord> = legal.into_iter().filter(|c| matches_hint(c)).collect();
    match hinted.as_slice() {
        [] => Err(no_such()),
        [src] => Ok(Move::step(*src, dst)),
        [first, second, ..] => Err(MoveError::Ambiguous(*first, *second)),
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            Data::Castling(CastlingSide::King) => write!(f, "O-O"),
            Data::Castling(CastlingSide::Queen) => write!(f, "O-O-O"),
            Data::Pawn { src, dst, promote } => {
                if let Some(file) = src {
                    write!(f, "{}x", file)?;
                }
                write!(f, "{}", dst)?;
                if let Some(kind) = promote {
                    write!(f, "={}", kind)?;
                }
                Ok(())
            }
            Data::Piece {
                kind,
                file,
                rank,
                is_capture,
                dst,
            } => {
                write!(f, "{}", kind)?;
                if let Some(file) = file {
                    write!(f, "{}", file)?;
                }
                if let Some(rank) = rank {
                    write!(f, "{}", rank)?;
                }
                if is_capture {
                    write!(f, "x")?;
                }
                write!(f, "{}", dst)
            }
        }
    }
}

impl FromStr for Data {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Data, Self::Err> {
        if s.is_empty() || !s.chars().all(is_notation_char) {
            return Err(MoveError::InputFormat);
        }
        for (marker, side) in [("O-O-O", CastlingSide::Queen), ("O-O", CastlingSide::King)] {
            if let Some(rest) = s.strip_prefix(marker) {
                if !rest.is_empty() {
                    return Err(MoveError::TrailingCharacters);
                }
                return Ok(Data::Castling(side));
            }
        }
        let mut chars = s.chars();
        match chars.next().and_then(PieceKind::from_char) {
            Some(kind) => Data::parse_piece(kind, chars.as_str()),
            None => Data::parse_pawn(s),
        }
    }
}

impl Notation {
    /// Creates the parsed notation from move `mv` in position `b`, with the check mark
    /// calculated
    ///
    /// `mv` must be legal in `b`.
    pub fn from_move(mv: Move, b: &mut Board) -> Notation {
        let data = Data::from_move(mv, b);
        let opponent = b.side().inv();
        let check = b.probe(mv, |b| CheckMark::calc(b, opponent));
        Notation { data, check }
    }

    /// Returns the text under which the move is recorded in the game history
    pub fn recorded(&self) -> String {
        let mut res = self.data.recorded();
        if let Some(check) = self.check {
            res.push(check.as_char());
        }
        res
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.data)?;
        if let Some(check) = self.check {
            write!(f, "{}", check.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for Notation {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Notation, Self::Err> {
        if s.is_empty() || !s.chars().all(is_notation_char) {
            return Err(MoveError::InputFormat);
        }
        let (check, rest) = parse_check(s)?;
        Ok(Notation {
            data: Data::from_str(rest)?,
            check,
        })
    }
}

/// Parses `s`, resolves it against `b` and makes the move
///
/// The submitted check mark must match the actual one if present. On success, the text under
/// which the move must be recorded is returned, with the actual check mark appended. On error,
/// the board is left unchanged.
pub fn play(b: &mut Board, s: &str) -> Result<String, MoveError> {
    let notation = Notation::from_str(s)?;
    let mv = notation.data.into_move(b)?;
    let side = b.side();
    b.test_move(mv);
    if b.is_check(side) {
        b.undo_test_move();
        return Err(MoveError::IllegalMove);
    }
    let check = CheckMark::calc(b, side.inv());
    if notation.check.is_some() && notation.check != check {
        b.undo_test_move();
        return Err(MoveError::TrailingCharacters);
    }
    b.commit_test_move();
    Ok(Notation {
        data: notation.data,
        check,
    }
    .recorded())
}
