use crate::attack;
use crate::bitboard::Bitboard;
use crate::state::PackedState;
use crate::types::{CastleSide, Color, Coord, File};
use kestrel_base::geometry;

/// Squares from `a` to `b` inclusive, both of them on the same rank
#[inline]
pub fn span(a: Coord, b: Coord) -> Bitboard {
    attack::between(a, b) | Bitboard::from_coord(a) | Bitboard::from_coord(b)
}

/// Squares involved in castling of color `c` towards side `s`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Path {
    pub king_src: Coord,
    pub king_dst: Coord,
    pub rook_src: Coord,
    pub rook_dst: Coord,
}

impl Path {
    pub fn new(packed: PackedState, king: Coord, c: Color, s: CastleSide) -> Path {
        let rank = geometry::castling_rank(c);
        Path {
            king_src: king,
            king_dst: Coord::from_parts(s.king_dst_file(), rank),
            rook_src: Coord::from_parts(packed.rook_file(s), rank),
            rook_dst: Coord::from_parts(s.rook_dst_file(), rank),
        }
    }

    /// Squares which must be empty, apart from the king and the rook themselves
    #[inline]
    pub fn clearance(&self) -> Bitboard {
        span(self.king_src, self.king_dst) | span(self.rook_src, self.rook_dst)
    }

    /// Squares the king crosses, including its source and destination
    #[inline]
    pub fn king_walk(&self) -> Bitboard {
        span(self.king_src, self.king_dst)
    }

    /// Returns `true` if the position is the classical one, so the move can be encoded with the
    /// king's destination square
    #[inline]
    pub fn is_classical(&self) -> bool {
        let rook_home = match self.rook_dst.file() {
            File::D => File::A,
            _ => File::H,
        };
        self.king_src.file() == File::E && self.rook_src.file() == rook_home
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CastleRights;

    fn c(s: &str) -> Coord {
        s.parse().unwrap()
    }

    #[test]
    fn test_classical() {
        let path = Path::new(PackedState::initial(), c("e1"), Color::White, CastleSide::HSide);
        assert_eq!(path.king_dst, c("g1"));
        assert_eq!(path.rook_src, c("h1"));
        assert_eq!(path.rook_dst, c("f1"));
        assert!(path.is_classical());
        assert_eq!(
            path.clearance(),
            Bitboard::EMPTY.with(c("e1")).with(c("f1")).with(c("g1")).with(c("h1"))
        );

        let path = Path::new(PackedState::initial(), c("e8"), Color::Black, CastleSide::ASide);
        assert_eq!(path.king_dst, c("c8"));
        assert_eq!(path.rook_src, c("a8"));
        assert_eq!(path.king_walk().popcount(), 3);
        assert_eq!(path.clearance().popcount(), 5);
    }

    #[test]
    fn test_shuffled() {
        let packed = PackedState::new(CastleRights::FULL, None, File::B, File::G);
        let path = Path::new(packed, c("f1"), Color::White, CastleSide::HSide);
        assert!(!path.is_classical());
        assert_eq!(path.king_walk(), Bitboard::EMPTY.with(c("f1")).with(c("g1")));
        assert_eq!(path.clearance(), Bitboard::EMPTY.with(c("f1")).with(c("g1")));

        let path = Path::new(packed, c("f1"), Color::White, CastleSide::ASide);
        assert_eq!(
            path.clearance(),
            Bitboard::EMPTY
                .with(c("b1"))
                .with(c("c1"))
                .with(c("d1"))
                .with(c("e1"))
                .with(c("f1"))
        );
        assert_eq!(span(c("d1"), c("d1")), Bitboard::from_coord(c("d1")));
    }
}
