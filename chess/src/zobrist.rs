//! Zobrist keys
//!
//! The keys are generated by the build script from a fixed seed, so they are identical between
//! builds. A position key is the XOR of the keys of every occupied square, of [`SIDE`] if Black
//! is to move, of every granted castle right and of the en passant file, if any.

use crate::state::{CastleRights, PackedState};
use crate::types::{Coord, File, PieceCode};

include!(concat!(env!("OUT_DIR"), "/zobrist.rs"));

#[inline]
pub fn piece(code: PieceCode, coord: Coord) -> u64 {
    unsafe {
        *PIECES
            .get_unchecked(code.index())
            .get_unchecked(coord.index())
    }
}

#[inline]
pub fn ep_file(file: File) -> u64 {
    unsafe { *EP_FILE.get_unchecked(file.index()) }
}

/// XOR of the keys of all the rights present in `rights`
#[inline]
pub fn castle(rights: CastleRights) -> u64 {
    let mut res = 0;
    for (i, key) in CASTLE.iter().enumerate() {
        if rights.index() & (1 << i) != 0 {
            res ^= key;
        }
    }
    res
}

/// Key delta between two packed states, covering castle rights and the en passant file
///
/// Rook home files are not hashed, as they never change during the game.
#[inline]
pub fn packed_delta(old: PackedState, new: PackedState) -> u64 {
    let mut res = castle(CastleRights::from_index(
        old.castle().index() ^ new.castle().index(),
    ));
    if old.ep_file() != new.ep_file() {
        if let Some(f) = old.ep_file() {
            res ^= ep_file(f);
        }
        if let Some(f) = new.ep_file() {
            res ^= ep_file(f);
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CastleSide, Color, PieceKind};

    #[test]
    fn test_distinct() {
        let mut keys = Vec::new();
        for code in PieceCode::iter() {
            for coord in Coord::iter() {
                keys.push(piece(code, coord));
            }
        }
        keys.push(SIDE);
        keys.extend(CASTLE);
        keys.extend(EP_FILE);
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert!(!keys.contains(&0));
    }

    #[test]
    fn test_packed_delta() {
        let mut a = PackedState::initial();
        let b = a;
        assert_eq!(packed_delta(a, b), 0);

        a.set_ep_file(Some(File::E));
        assert_eq!(packed_delta(b, a), ep_file(File::E));

        let mut c = b;
        c.revoke(Color::White, CastleSide::HSide);
        assert_eq!(packed_delta(b, c), packed_delta(c, b));
        assert_eq!(
            packed_delta(b, c),
            castle(CastleRights::EMPTY.with(Color::White, CastleSide::HSide))
        );

        let wk = PieceCode::new(Color::White, PieceKind::King);
        let e1: Coord = "e1".parse().unwrap();
        assert_ne!(piece(wk, e1), 0);
    }
}
