use crate::types::{CastleSide, Color, Coord, PieceCode, PieceKind};

use std::fmt;

/// Kind of the move
///
/// Captures are not a separate tag: any tag may be combined with the capture flag of
/// [`Move`], which lets promotions with capture be represented directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveTag {
    /// Plain move, or plain capture
    None = 0,
    /// En passant capture. The captured pawn is not on the destination square
    EnPassant = 1,
    PromoteKnight = 2,
    PromoteBishop = 3,
    PromoteRook = 4,
    PromoteQueen = 5,
    /// Pawn advancing two squares from its initial rank
    Double = 6,
    /// Castling towards file A. The destination is the king's destination square
    ACastle = 7,
    /// Castling towards file H. The destination is the king's destination square
    HCastle = 8,
    /// Castling towards file A. The destination is the rook's home square
    ACastleRookPos = 9,
    /// Castling towards file H. The destination is the rook's home square
    HCastleRookPos = 10,
}

impl MoveTag {
    pub const PROMOTES: [MoveTag; 4] = [
        MoveTag::PromoteQueen,
        MoveTag::PromoteRook,
        MoveTag::PromoteBishop,
        MoveTag::PromoteKnight,
    ];

    pub const fn is_castle(&self) -> bool {
        matches!(
            *self,
            MoveTag::ACastle | MoveTag::HCastle | MoveTag::ACastleRookPos | MoveTag::HCastleRookPos
        )
    }

    pub const fn is_promote(&self) -> bool {
        matches!(
            *self,
            MoveTag::PromoteKnight
                | MoveTag::PromoteBishop
                | MoveTag::PromoteRook
                | MoveTag::PromoteQueen
        )
    }

    /// Returns `true` for the castling tags whose destination is the rook's square
    pub const fn is_rook_pos(&self) -> bool {
        matches!(*self, MoveTag::ACastleRookPos | MoveTag::HCastleRookPos)
    }

    pub const fn promote_kind(&self) -> Option<PieceKind> {
        match *self {
            MoveTag::PromoteKnight => Some(PieceKind::Knight),
            MoveTag::PromoteBishop => Some(PieceKind::Bishop),
            MoveTag::PromoteRook => Some(PieceKind::Rook),
            MoveTag::PromoteQueen => Some(PieceKind::Queen),
            _ => None,
        }
    }

    pub const fn for_promote(kind: PieceKind) -> Option<MoveTag> {
        match kind {
            PieceKind::Knight => Some(MoveTag::PromoteKnight),
            PieceKind::Bishop => Some(MoveTag::PromoteBishop),
            PieceKind::Rook => Some(MoveTag::PromoteRook),
            PieceKind::Queen => Some(MoveTag::PromoteQueen),
            _ => None,
        }
    }
}

/// Returns the castle side of a castling tag, or `None` for other tags
pub const fn castle_side_for_movetag(tag: MoveTag) -> Option<CastleSide> {
    match tag {
        MoveTag::ACastle | MoveTag::ACastleRookPos => Some(CastleSide::ASide),
        MoveTag::HCastle | MoveTag::HCastleRookPos => Some(CastleSide::HSide),
        _ => None,
    }
}

/// Returns the castling tag for `side` whose destination is the king's destination square
pub const fn movetag_for_castle_side(side: CastleSide) -> MoveTag {
    match side {
        CastleSide::ASide => MoveTag::ACastle,
        CastleSide::HSide => MoveTag::HCastle,
    }
}

/// Returns the castling tag for `side` whose destination is the rook's home square
pub const fn rook_pos_movetag_for_castle_side(side: CastleSide) -> MoveTag {
    match side {
        CastleSide::ASide => MoveTag::ACastleRookPos,
        CastleSide::HSide => MoveTag::HCastleRookPos,
    }
}

/// Piece that appears on the board after promotion of a pawn of color `color`
pub const fn piececode_for_movetag_promote(tag: MoveTag, color: Color) -> Option<PieceCode> {
    match tag.promote_kind() {
        Some(kind) => Some(PieceCode::new(color, kind)),
        None => None,
    }
}

/// Chess move
///
/// The move is a plain `(from, to, tag)` triple plus a capture flag. It doesn't know which
/// board it belongs to, so it's only meaningful together with the position it was generated in.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    from: Coord,
    to: Coord,
    tag: MoveTag,
    flags: u8,
}

impl Move {
    const CAPTURE: u8 = 1;

    /// Placeholder used to fill move buffers. It is never generated as a move
    pub const NULL: Move = Move {
        from: Coord::from_index(0),
        to: Coord::from_index(0),
        tag: MoveTag::None,
        flags: 0,
    };

    /// Creates a non-capturing move
    ///
    /// # Panics
    ///
    /// Panics if `from == to`.
    #[inline]
    pub const fn new(from: Coord, to: Coord, tag: MoveTag) -> Move {
        assert!(from.index() != to.index(), "move source and destination must differ");
        Move {
            from,
            to,
            tag,
            flags: 0,
        }
    }

    #[inline]
    pub const fn normal(from: Coord, to: Coord) -> Move {
        Move::new(from, to, MoveTag::None)
    }

    #[inline]
    pub const fn capture(from: Coord, to: Coord) -> Move {
        Move::new(from, to, MoveTag::None).with_capture()
    }

    /// Returns the same move with the capture flag set
    #[inline]
    pub const fn with_capture(self) -> Move {
        Move {
            flags: self.flags | Self::CAPTURE,
            ..self
        }
    }

    #[inline]
    pub const fn from(&self) -> Coord {
        self.from
    }

    #[inline]
    pub const fn to(&self) -> Coord {
        self.to
    }

    #[inline]
    pub const fn tag(&self) -> MoveTag {
        self.tag
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.from.index() == self.to.index()
    }

    /// Returns `true` if the move takes an enemy piece, en passant included
    #[inline]
    pub const fn is_capture(&self) -> bool {
        self.flags & Self::CAPTURE != 0 || matches!(self.tag, MoveTag::EnPassant)
    }

    #[inline]
    pub const fn is_castle(&self) -> bool {
        self.tag.is_castle()
    }

    #[inline]
    pub const fn is_promote(&self) -> bool {
        self.tag.is_promote()
    }

    #[inline]
    pub const fn castle_side(&self) -> Option<CastleSide> {
        castle_side_for_movetag(self.tag)
    }
}

impl Default for Move {
    #[inline]
    fn default() -> Self {
        Move::NULL
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.is_null() {
            return write!(f, "Move(null)");
        }
        write!(f, "Move({}{} {:?}", self.from, self.to, self.tag)?;
        if self.flags & Self::CAPTURE != 0 {
            write!(f, " capture")?;
        }
        write!(f, ")")
    }
}

/// Formats the move in UCI notation
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.tag.promote_kind() {
            write!(f, "{}", kind.as_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    fn c(s: &str) -> Coord {
        s.parse().unwrap()
    }

    #[test]
    fn test_size() {
        assert_eq!(mem::size_of::<Move>(), 4);
    }

    #[test]
    fn test_castle_tags() {
        for side in CastleSide::iter() {
            let tag = movetag_for_castle_side(side);
            assert!(tag.is_castle());
            assert!(!tag.is_promote());
            assert_eq!(castle_side_for_movetag(tag), Some(side));
            let tag = rook_pos_movetag_for_castle_side(side);
            assert!(tag.is_rook_pos());
            assert_eq!(castle_side_for_movetag(tag), Some(side));
        }
        assert_eq!(castle_side_for_movetag(MoveTag::Double), None);
        assert_eq!(castle_side_for_movetag(MoveTag::PromoteQueen), None);
    }

    #[test]
    fn test_promote() {
        for tag in MoveTag::PROMOTES {
            assert!(tag.is_promote());
            assert!(!tag.is_castle());
            let kind = tag.promote_kind().unwrap();
            assert_eq!(MoveTag::for_promote(kind), Some(tag));
            assert_eq!(
                piececode_for_movetag_promote(tag, Color::Black),
                Some(PieceCode::new(Color::Black, kind))
            );
        }
        assert_eq!(MoveTag::for_promote(PieceKind::King), None);
        assert_eq!(piececode_for_movetag_promote(MoveTag::None, Color::White), None);
    }

    #[test]
    fn test_capture_flag() {
        let mv = Move::new(c("b7"), c("a8"), MoveTag::PromoteQueen).with_capture();
        assert!(mv.is_capture());
        assert!(mv.is_promote());
        assert_eq!(mv.to_string(), "b7a8q");

        let mv = Move::normal(c("e2"), c("e4"));
        assert!(!mv.is_capture());
        assert_eq!(mv.to_string(), "e2e4");

        let mv = Move::new(c("e5"), c("d6"), MoveTag::EnPassant);
        assert!(mv.is_capture());

        assert!(Move::capture(c("a1"), c("a8")).is_capture());
        assert!(Move::NULL.is_null());
        assert_eq!(Move::NULL.to_string(), "0000");
    }

    #[test]
    #[should_panic]
    fn test_same_squares() {
        let _ = Move::normal(c("e2"), c("e2"));
    }
}
