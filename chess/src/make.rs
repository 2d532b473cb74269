//! Making and unmaking moves
//!
//! Both operations update the board incrementally: only the touched squares, lists and
//! bitboards change, and the Zobrist key is adjusted by XOR-ing the same deltas in both
//! directions.

use crate::board::Board;
use crate::castling::Path;
use crate::moves::{self, Move, MoveTag};
use crate::state::State;
use crate::types::{CastleSide, Coord, PieceCode, PieceKind};
use crate::{attack, geometry, zobrist};

impl Board {
    /// Makes the move `mv`
    ///
    /// The move must be legal in the current position. Making an illegal or a foreign move
    /// leaves the board in an unspecified state.
    ///
    /// # Panics
    ///
    /// Panics if the state stack is full.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.side;
        let them = us.inv();
        let prev = *self.stack.peek();
        let mut packed = prev.packed;
        packed.set_ep_file(None);
        let mut captured = PieceCode::EMPTY;
        let mut captured_slot = 0;
        let mut halfmove = prev.halfmove.saturating_add(1);

        if let Some(side) = mv.castle_side() {
            let path = Path::new(prev.packed, mv.from(), us, side);
            self.relocate_pair(
                (path.king_src, path.king_dst),
                (path.rook_src, path.rook_dst),
            );
            packed.revoke_color(us);
        } else {
            let from = mv.from();
            let to = mv.to();
            let piece = self.get(from);

            let victim = match mv.tag() {
                MoveTag::EnPassant => Some(Coord::from_parts(to.file(), from.rank())),
                _ if self.get(to).is_occupied() => Some(to),
                _ => None,
            };
            if let Some(at) = victim {
                (captured, captured_slot) = self.take_piece(at);
                halfmove = 0;
            }

            self.move_piece(from, to);
            if let Some(code) = moves::piececode_for_movetag_promote(mv.tag(), us) {
                self.change_piece(to, code);
            }

            match piece.kind() {
                Some(PieceKind::Pawn) => {
                    halfmove = 0;
                    if mv.tag() == MoveTag::Double {
                        let passed = Coord::from_parts(to.file(), geometry::enpassant_dst_rank(them));
                        let takers = attack::pawn(us, passed) & self.piece2(them, PieceKind::Pawn);
                        if takers.is_nonempty() {
                            packed.set_ep_file(Some(to.file()));
                        }
                    }
                }
                Some(PieceKind::King) => packed.revoke_color(us),
                _ => {}
            }

            for side in CastleSide::iter() {
                let file = packed.rook_file(side);
                if from == Coord::from_parts(file, geometry::castling_rank(us)) {
                    packed.revoke(us, side);
                }
                if to == Coord::from_parts(file, geometry::castling_rank(them)) {
                    packed.revoke(them, side);
                }
            }
        }

        self.key ^= zobrist::packed_delta(prev.packed, packed) ^ zobrist::SIDE;
        self.side = them;
        self.ply += 1;
        let check = self.compute_checks();
        self.stack.push(State {
            check,
            packed,
            captured,
            captured_slot,
            halfmove,
            key: self.key,
        });

        #[cfg(feature = "selftest")]
        self.selftest("make", mv);
    }

    /// Unmakes the move `mv`, which must be the last move made on the board
    ///
    /// # Panics
    ///
    /// Panics if no moves were made.
    pub fn unmake_move(&mut self, mv: Move) {
        let state = self.stack.pop();
        let prev = *self.stack.peek();
        let us = self.side.inv();
        self.side = us;
        self.ply -= 1;
        self.key ^= zobrist::packed_delta(prev.packed, state.packed) ^ zobrist::SIDE;

        if let Some(side) = mv.castle_side() {
            let path = Path::new(prev.packed, mv.from(), us, side);
            self.relocate_pair(
                (path.king_dst, path.king_src),
                (path.rook_dst, path.rook_src),
            );
        } else {
            let from = mv.from();
            let to = mv.to();
            if mv.is_promote() {
                self.change_piece(to, PieceCode::new(us, PieceKind::Pawn));
            }
            self.move_piece(to, from);
            if state.captured.is_occupied() {
                let at = match mv.tag() {
                    MoveTag::EnPassant => Coord::from_parts(to.file(), from.rank()),
                    _ => to,
                };
                self.restore_piece(at, state.captured, state.captured_slot);
            }
        }

        debug_assert_eq!(self.key, prev.key);

        #[cfg(feature = "selftest")]
        self.selftest("unmake", mv);
    }

    /// Makes the move if it's legal, otherwise leaves the board untouched
    ///
    /// Returns `true` if the move was made.
    pub fn try_make_move(&mut self, mv: Move) -> bool {
        if !crate::movegen::legal::gen_all(self).contains(&mv) {
            return false;
        }
        self.make_move(mv);
        true
    }

    #[cfg(feature = "selftest")]
    fn selftest(&self, op: &str, mv: Move) {
        if let Err(e) = self.validate_invariants() {
            panic!("board is broken after {} {}: {}", op, mv, e);
        }
    }
}

/// Remembers the state of the board before the move and restores it when dropped
///
/// Makes sure that unmaking is not forgotten on early returns.
pub struct MoveGuard<'a> {
    board: &'a mut Board,
    mv: Move,
}

impl<'a> MoveGuard<'a> {
    pub fn new(board: &'a mut Board, mv: Move) -> MoveGuard<'a> {
        board.make_move(mv);
        MoveGuard { board, mv }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        self.board
    }

    #[inline]
    pub fn board_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl<'a> Drop for MoveGuard<'a> {
    fn drop(&mut self) {
        self.board.unmake_move(self.mv);
    }
}
