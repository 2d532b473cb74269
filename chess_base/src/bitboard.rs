//! Occupancy masks
//!
//! Bit `i` of a [`Bitboard`] stands for the square with index `i`, so `a8` is the lowest bit
//! and `h1` is the highest one.

use crate::types::Coord;
use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};
use std::fmt;
use std::iter::FusedIterator;

/// Set of squares
#[derive(
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    BitAnd,
    BitAndAssign,
    BitOr,
    BitOrAssign,
    BitXor,
    BitXorAssign,
    Not,
)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);
    pub const FULL: Bitboard = Bitboard(!0);

    #[inline]
    pub const fn from_raw(val: u64) -> Bitboard {
        Bitboard(val)
    }

    #[inline]
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn from_coord(coord: Coord) -> Bitboard {
        Bitboard(1_u64 << coord.index())
    }

    /// Returns the mask with `coord` added
    #[inline]
    pub const fn with(self, coord: Coord) -> Bitboard {
        Bitboard(self.0 | (1_u64 << coord.index()))
    }

    #[inline]
    pub fn set(&mut self, coord: Coord) {
        *self = self.with(coord);
    }

    /// Flips the bit of `coord`
    ///
    /// Piece masks are kept up to date this way, since a piece leaving and entering a square
    /// are the same operation.
    #[inline]
    pub fn toggle(&mut self, coord: Coord) {
        self.0 ^= 1_u64 << coord.index();
    }

    #[inline]
    pub const fn has(&self, coord: Coord) -> bool {
        ((self.0 >> coord.index()) & 1) != 0
    }

    /// Returns `true` if the two masks share a square
    #[inline]
    pub const fn intersects(&self, other: Bitboard) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn popcount(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if more than one square is set
    #[inline]
    pub const fn has_many(&self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    /// Square with the lowest index, i.e. the nearest to `a8`
    #[inline]
    pub const fn first(&self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        Some(Coord::from_index(self.0.trailing_zeros() as usize))
    }

    /// Square with the highest index, i.e. the nearest to `h1`
    #[inline]
    pub const fn last(&self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        Some(Coord::from_index(63 - self.0.leading_zeros() as usize))
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bitboard({})", self)
    }
}

/// Formats the mask rank by rank, starting from rank 8, with files `a` to `h` left to right
impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in 0..8 {
            if rank != 0 {
                write!(f, "/")?;
            }
            let row = (self.0 >> (rank * 8)) & 0xff;
            for file in 0..8 {
                write!(f, "{}", (row >> file) & 1)?;
            }
        }
        Ok(())
    }
}

/// Iterator over the squares of a [`Bitboard`], in index order
#[derive(Debug, Clone)]
pub struct Iter(u64);

impl Iterator for Iter {
    type Item = Coord;

    #[inline]
    fn next(&mut self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0.wrapping_sub(1);
        unsafe { Some(Coord::from_index_unchecked(bit as usize)) }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Iter {}

impl FusedIterator for Iter {}

impl IntoIterator for Bitboard {
    type Item = Coord;
    type IntoIter = Iter;

    #[inline]
    fn into_iter(self) -> Iter {
        Iter(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{File, Rank};

    fn c(file: File, rank: Rank) -> Coord {
        Coord::from_parts(file, rank)
    }

    #[test]
    fn test_iter() {
        let bb = Bitboard::EMPTY
            .with(c(File::A, Rank::R4))
            .with(c(File::E, Rank::R2))
            .with(c(File::F, Rank::R3));
        let iter = bb.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(
            iter.collect::<Vec<_>>(),
            vec![c(File::A, Rank::R4), c(File::F, Rank::R3), c(File::E, Rank::R2)],
        );
        assert_eq!(Bitboard::FULL.into_iter().len(), 64);
    }

    #[test]
    fn test_occupancy() {
        let ca = c(File::A, Rank::R4);
        let cb = c(File::E, Rank::R2);
        let cc = c(File::F, Rank::R3);

        let mut occ = Bitboard::EMPTY.with(ca).with(cb);
        let other = Bitboard::from_coord(cb).with(cc);
        assert_eq!(occ & other, Bitboard::from_coord(cb));
        assert_eq!(occ ^ other, Bitboard::from_coord(ca).with(cc));
        assert!(occ.intersects(other));
        assert!(!occ.intersects(Bitboard::from_coord(cc)));
        assert_eq!((!occ).popcount(), 62);

        occ.toggle(cb);
        assert_eq!(occ, Bitboard::from_coord(ca));
        occ.toggle(cc);
        assert!(occ.has(cc));
        assert!(!occ.has(cb));
    }

    #[test]
    fn test_first_last() {
        let ca = c(File::A, Rank::R4);
        let cb = c(File::E, Rank::R2);
        assert_eq!(Bitboard::EMPTY.first(), None);
        assert_eq!(Bitboard::EMPTY.last(), None);
        let bb = Bitboard::EMPTY.with(ca).with(cb);
        assert_eq!(bb.first(), Some(ca));
        assert_eq!(bb.last(), Some(cb));
        assert!(bb.has_many());
        assert!(!Bitboard::from_coord(ca).has_many());
        assert!(!Bitboard::EMPTY.has_many());
    }

    #[test]
    fn test_format() {
        let bb = Bitboard::EMPTY
            .with(c(File::A, Rank::R4))
            .with(c(File::E, Rank::R2))
            .with(c(File::F, Rank::R3))
            .with(c(File::H, Rank::R8));
        assert_eq!(
            bb.to_string(),
            "00000001/00000000/00000000/00000000/10000000/00000100/00001000/00000000"
        );
    }
}
