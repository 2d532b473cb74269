//! Utilities to work with moves in UCI format

use super::base::{self, MoveTag};
use crate::board::Board;
use crate::castling::Path;
use crate::movegen::legal;
use crate::types::{Coord, CoordParseError, PieceKind};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error creating a parsed UCI representation from string
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawParseError {
    /// Bad string length
    #[error("bad string length")]
    BadLength,
    /// Bad source square
    #[error("bad source: {0}")]
    BadSrc(CoordParseError),
    /// Bad destination square
    #[error("bad destination: {0}")]
    BadDst(CoordParseError),
    /// Bad promote character
    #[error("bad promote char {0:?}")]
    BadPromote(char),
}

/// Error resolving UCI into a legal [`Move`](super::Move)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum UciParseError {
    /// Error parsing move
    #[error("cannot parse move: {0}")]
    Parse(#[from] RawParseError),
    /// Null move cannot be made on the board
    #[error("null move is not allowed")]
    NullMove,
    /// No legal move matches the string
    #[error("illegal move {0}")]
    Illegal(UciMove),
}

/// Parsed move in UCI format
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UciMove {
    /// Null UCI move
    Null,
    /// Non-null UCI move
    Move {
        /// Source square
        src: Coord,
        /// Destination square
        dst: Coord,
        /// Piece to promote, if any
        promote: Option<PieceKind>,
    },
}

/// Returns the other square by which the castling move `mv` may be written
///
/// Classical castling may also be written as king-takes-rook, and castling encoded by the
/// rook square may also be written with the king's destination.
fn castle_alias(b: &Board, mv: base::Move) -> Option<Coord> {
    let side = mv.castle_side()?;
    let path = Path::new(b.packed(), mv.from(), b.side(), side);
    if mv.tag().is_rook_pos() {
        if path.king_dst == path.king_src {
            return None;
        }
        Some(path.king_dst)
    } else {
        Some(path.rook_src)
    }
}

impl UciMove {
    /// Finds the legal move in position `b` denoted by this UCI move
    pub fn into_move(self, b: &Board) -> Result<base::Move, UciParseError> {
        let (src, dst, promote) = match self {
            UciMove::Null => return Err(UciParseError::NullMove),
            UciMove::Move { src, dst, promote } => (src, dst, promote),
        };
        legal::gen_all(b)
            .iter()
            .copied()
            .find(|&mv| {
                mv.from() == src
                    && mv.tag().promote_kind() == promote
                    && (mv.to() == dst || castle_alias(b, mv) == Some(dst))
            })
            .ok_or(UciParseError::Illegal(self))
    }
}

impl From<base::Move> for UciMove {
    #[inline]
    fn from(mv: base::Move) -> UciMove {
        if mv.is_null() {
            return UciMove::Null;
        }
        UciMove::Move {
            src: mv.from(),
            dst: mv.to(),
            promote: mv.tag().promote_kind(),
        }
    }
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match *self {
            UciMove::Null => write!(f, "0000"),
            UciMove::Move { src, dst, promote } => {
                write!(f, "{}{}", src, dst)?;
                if let Some(kind) = promote {
                    write!(f, "{}", kind.as_char())?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for UciMove {
    type Err = RawParseError;

    fn from_str(s: &str) -> Result<UciMove, Self::Err> {
        if s == "0000" {
            return Ok(UciMove::Null);
        }
        if !s.is_ascii() || !matches!(s.len(), 4 | 5) {
            return Err(RawParseError::BadLength);
        }
        let src = Coord::from_str(&s[0..2]).map_err(RawParseError::BadSrc)?;
        let dst = Coord::from_str(&s[2..4]).map_err(RawParseError::BadDst)?;
        let promote = if s.len() == 5 {
            let tag = match s.as_bytes()[4] {
                b'n' => MoveTag::PromoteKnight,
                b'b' => MoveTag::PromoteBishop,
                b'r' => MoveTag::PromoteRook,
                b'q' => MoveTag::PromoteQueen,
                b => return Err(RawParseError::BadPromote(b as char)),
            };
            tag.promote_kind()
        } else {
            None
        };
        Ok(UciMove::Move { src, dst, promote })
    }
}

impl Board {
    /// Parses a move in UCI format and checks that it's legal in the current position
    pub fn parse_uci(&self, s: &str) -> Result<base::Move, UciParseError> {
        UciMove::from_str(s)?.into_move(self)
    }
}
