use crate::bitboard::Bitboard;
use crate::types::{Color, Coord, Dir};

#[inline]
const fn bb(val: u64) -> Bitboard {
    Bitboard::from_raw(val)
}

include!(concat!(env!("OUT_DIR"), "/near_attacks.rs"));
include!(concat!(env!("OUT_DIR"), "/rays.rs"));

#[inline]
pub fn king(coord: Coord) -> Bitboard {
    unsafe { *KING_ATTACKS.get_unchecked(coord.index()) }
}

#[inline]
pub fn knight(coord: Coord) -> Bitboard {
    unsafe { *KNIGHT_ATTACKS.get_unchecked(coord.index()) }
}

#[inline]
pub fn pawn(color: Color, coord: Coord) -> Bitboard {
    match color {
        Color::White => unsafe { *WHITE_PAWN_ATTACKS.get_unchecked(coord.index()) },
        Color::Black => unsafe { *BLACK_PAWN_ATTACKS.get_unchecked(coord.index()) },
    }
}

/// All the squares from `coord` (exclusive) to the edge of the board in direction `dir`
#[inline]
pub fn ray(dir: Dir, coord: Coord) -> Bitboard {
    unsafe {
        *RAYS
            .get_unchecked(dir.index())
            .get_unchecked(coord.index())
    }
}

/// Squares reached by sliding from `coord` in direction `dir`
///
/// The walk stops at the first occupied square, which is included into the result.
#[inline]
pub fn slide(dir: Dir, coord: Coord, occupied: Bitboard) -> Bitboard {
    let full = ray(dir, coord);
    let blockers = full & occupied;
    let first = if dir.is_increasing() {
        blockers.first()
    } else {
        blockers.last()
    };
    match first {
        Some(p) => full ^ ray(dir, p),
        None => full,
    }
}

/// Returns the direction from `src` to `dst`, if the squares share a rank, file or diagonal
#[inline]
pub fn direction(src: Coord, dst: Coord) -> Option<Dir> {
    let d = unsafe {
        *DIRECTION
            .get_unchecked(src.index())
            .get_unchecked(dst.index())
    };
    match d {
        NO_DIR => None,
        d => Some(Dir::from_index(d as usize)),
    }
}

/// Squares strictly between `src` and `dst`
///
/// Returns an empty bitboard if the squares are not on one line.
#[inline]
pub fn between(src: Coord, dst: Coord) -> Bitboard {
    match direction(src, dst) {
        Some(dir) => ray(dir, src) & ray(dir.opposite(), dst),
        None => Bitboard::EMPTY,
    }
}

#[inline]
pub fn bishop(coord: Coord, occupied: Bitboard) -> Bitboard {
    slide(Dir::NorthEast, coord, occupied)
        | slide(Dir::NorthWest, coord, occupied)
        | slide(Dir::SouthEast, coord, occupied)
        | slide(Dir::SouthWest, coord, occupied)
}

#[inline]
pub fn rook(coord: Coord, occupied: Bitboard) -> Bitboard {
    slide(Dir::North, coord, occupied)
        | slide(Dir::South, coord, occupied)
        | slide(Dir::East, coord, occupied)
        | slide(Dir::West, coord, occupied)
}
