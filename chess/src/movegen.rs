use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::castling::Path;
use crate::moves::{self, Move, MoveTag, MovePush};
use crate::types::{CastleSide, Color, Coord, PieceKind, PieceMask};
use crate::{attack, generic};

use std::marker::PhantomData;

/// Returns all the pieces of color `by` attacking `coord`
///
/// Sliding attacks are traced over `occupied` instead of the real occupancy, which lets the
/// caller ask questions about the position after a hypothetical move.
pub fn cell_attackers(b: &Board, coord: Coord, by: Color, occupied: Bitboard) -> Bitboard {
    // Pawn attacks are traced backwards, so the attack map of the opposite color is used.
    let theirs = b.color(by);
    (b.piece2(by, PieceKind::Pawn) & attack::pawn(by.inv(), coord))
        | (b.piece2(by, PieceKind::Knight) & attack::knight(coord))
        | (b.piece2(by, PieceKind::King) & attack::king(coord))
        | (attack::bishop(coord, occupied) & b.diagonal() & theirs)
        | (attack::rook(coord, occupied) & b.cardinal() & theirs)
}

/// Returns `true` if any piece of color `by` attacks `coord`
///
/// See [`cell_attackers()`] for the meaning of `occupied`.
pub fn is_cell_attacked(b: &Board, coord: Coord, by: Color, occupied: Bitboard) -> bool {
    if b.piece2(by, PieceKind::Pawn).intersects(attack::pawn(by.inv(), coord))
        || b.piece2(by, PieceKind::Knight).intersects(attack::knight(coord))
        || b.piece2(by, PieceKind::King).intersects(attack::king(coord))
    {
        return true;
    }
    let theirs = b.color(by);
    attack::bishop(coord, occupied).intersects(b.diagonal() & theirs)
        || attack::rook(coord, occupied).intersects(b.cardinal() & theirs)
}

/// Our pieces standing between our king and an enemy slider
fn pinned(b: &Board, side: Color, king: Coord) -> Bitboard {
    let ours = b.color(side);
    let theirs = b.color(side.inv());
    let mut res = Bitboard::EMPTY;

    let near = attack::bishop(king, b.all) & ours;
    for p in attack::bishop(king, b.all ^ near) & b.diagonal() & theirs {
        res |= attack::between(king, p) & ours;
    }

    let near = attack::rook(king, b.all) & ours;
    for p in attack::rook(king, b.all ^ near) & b.cardinal() & theirs {
        res |= attack::between(king, p) & ours;
    }

    res
}

/// Constraints on the moves of the side to move, computed once per generation
struct Restrictions {
    /// Squares where non-king pieces may go
    target: Bitboard,
    pinned: Bitboard,
    /// Set on double check
    king_only: bool,
}

impl Restrictions {
    const NONE: Restrictions = Restrictions {
        target: Bitboard::from_raw(!0),
        pinned: Bitboard::EMPTY,
        king_only: false,
    };

    fn new(b: &Board, side: Color, king: Coord) -> Restrictions {
        let state = b.state();
        if state.is_double_check() {
            return Restrictions {
                target: Bitboard::EMPTY,
                pinned: Bitboard::EMPTY,
                king_only: true,
            };
        }
        let check = state.check[0];
        let target = match check.origin {
            Some(origin) => {
                let block = match check.ray {
                    Some(dir) => attack::ray(dir, king) & attack::ray(dir.opposite(), origin),
                    None => Bitboard::EMPTY,
                };
                block.with(origin)
            }
            None => Restrictions::NONE.target,
        };
        Restrictions {
            target,
            pinned: pinned(b, side, king),
            king_only: false,
        }
    }
}

struct MoveGenImpl<'a, P, C, const LEGAL: bool> {
    board: &'a Board,
    dst: &'a mut P,
    king: Coord,
    rs: Restrictions,
    _c: PhantomData<C>,
}

impl<'a, P: MovePush, C: generic::Color, const LEGAL: bool> MoveGenImpl<'a, P, C, LEGAL> {
    fn new(board: &'a Board, dst: &'a mut P) -> Self {
        let king = board.king_pos(C::COLOR);
        let rs = if LEGAL {
            Restrictions::new(board, C::COLOR, king)
        } else {
            Restrictions::NONE
        };
        MoveGenImpl {
            board,
            dst,
            king,
            rs,
            _c: PhantomData,
        }
    }

    #[inline]
    fn add(&mut self, src: Coord, dst: Coord, tag: MoveTag) {
        let mv = Move::new(src, dst, tag);
        if self.board.get(dst).is_occupied() {
            self.dst.push(mv.with_capture());
        } else {
            self.dst.push(mv);
        }
    }

    /// Squares where the piece on `src` may go without exposing our king
    #[inline]
    fn pin_mask(&self, src: Coord) -> Bitboard {
        if !LEGAL || !self.rs.pinned.has(src) {
            return Restrictions::NONE.target;
        }
        match attack::direction(self.king, src) {
            Some(dir) => attack::ray(dir, self.king),
            None => Bitboard::EMPTY,
        }
    }

    fn allowed<const QUIET: bool, const CAPTURE: bool>(&self) -> Bitboard {
        match (QUIET, CAPTURE) {
            (true, true) => !self.board.color(C::COLOR),
            (true, false) => self.board.empty(),
            (false, true) => self.board.color(C::COLOR.inv()),
            (false, false) => Bitboard::EMPTY,
        }
    }

    fn add_pawn(&mut self, src: Coord, dst: Coord) {
        if dst.rank() == C::PROMOTE_RANK {
            for tag in MoveTag::PROMOTES {
                self.add(src, dst, tag);
            }
        } else {
            self.add(src, dst, MoveTag::None);
        }
    }

    fn gen_pawn<const QUIET: bool, const CAPTURE: bool>(&mut self, src: Coord) {
        let mask = self.rs.target & self.pin_mask(src);
        let empty = self.board.empty();

        if QUIET {
            // A pawn never stands on the last rank, so the square ahead is on the board.
            let single = src.add(C::FORWARD);
            if empty.has(single) {
                if mask.has(single) {
                    self.add_pawn(src, single);
                }
                if src.rank() == C::DOUBLE_PUSH_RANK {
                    let double = single.add(C::FORWARD);
                    if empty.has(double) && mask.has(double) {
                        self.add(src, double, MoveTag::Double);
                    }
                }
            }
        }

        if CAPTURE {
            let captures = attack::pawn(C::COLOR, src) & self.board.color(C::COLOR.inv()) & mask;
            for dst in captures {
                self.add_pawn(src, dst);
            }
            self.gen_enpassant(src);
        }
    }

    fn gen_enpassant(&mut self, src: Coord) {
        let file = match self.board.packed().ep_file() {
            Some(f) => f,
            None => return,
        };
        if src.rank() != C::EP_SRC_RANK || src.file().index().abs_diff(file.index()) != 1 {
            return;
        }
        let victim = src.with_file(file);
        let dst = victim.add(C::FORWARD);
        if LEGAL {
            // Both the capturing pawn and the victim leave their squares, which may uncover a
            // slider on the king's rank, so the resulting occupancy is tested directly.
            let occupied = (self.board.all ^ Bitboard::from_coord(src) ^ Bitboard::from_coord(victim))
                .with(dst);
            let attackers = cell_attackers(self.board, self.king, C::COLOR.inv(), occupied)
                & !Bitboard::from_coord(victim);
            if attackers.is_nonempty() {
                return;
            }
        }
        self.dst.push(Move::new(src, dst, MoveTag::EnPassant));
    }

    fn gen_piece<const QUIET: bool, const CAPTURE: bool>(&mut self, src: Coord, attacks: Bitboard) {
        let mask = self.allowed::<QUIET, CAPTURE>() & self.rs.target & self.pin_mask(src);
        for dst in attacks & mask {
            self.add(src, dst, MoveTag::None);
        }
    }

    fn gen_king<const QUIET: bool, const CAPTURE: bool>(&mut self, src: Coord) {
        let without_king = self.board.all ^ Bitboard::from_coord(src);
        for dst in attack::king(src) & self.allowed::<QUIET, CAPTURE>() {
            if LEGAL && is_cell_attacked(self.board, dst, C::COLOR.inv(), without_king) {
                continue;
            }
            self.add(src, dst, MoveTag::None);
        }
    }

    /// Castling is always generated fully legal, in both modes
    fn gen_castling(&mut self) {
        let packed = self.board.packed();
        if self.board.is_check() {
            return;
        }
        for side in [CastleSide::HSide, CastleSide::ASide] {
            if !packed.can_castle(C::COLOR, side) {
                continue;
            }
            let path = Path::new(packed, self.king, C::COLOR, side);
            let rest = self.board.all
                ^ Bitboard::from_coord(path.king_src)
                ^ Bitboard::from_coord(path.rook_src);
            if path.clearance().intersects(rest) {
                continue;
            }
            let after = rest
                .with(path.king_dst)
                .with(path.rook_dst);
            let during = self.board.all ^ Bitboard::from_coord(path.king_src);
            let attacked = path.king_walk().into_iter().any(|c| {
                let occupied = if c == path.king_dst { after } else { during };
                is_cell_attacked(self.board, c, C::COLOR.inv(), occupied)
            });
            if attacked {
                continue;
            }
            let mv = if path.is_classical() {
                Move::new(path.king_src, path.king_dst, moves::movetag_for_castle_side(side))
            } else {
                Move::new(
                    path.king_src,
                    path.rook_src,
                    moves::rook_pos_movetag_for_castle_side(side),
                )
            };
            self.dst.push(mv);
        }
    }

    fn gen<const QUIET: bool, const CAPTURE: bool>(&mut self) {
        let board = self.board;
        for &src in board.piece_list(C::COLOR) {
            let code = board.get(src);
            match code.kind() {
                Some(PieceKind::King) => self.gen_king::<QUIET, CAPTURE>(src),
                _ if self.rs.king_only => {}
                Some(PieceKind::Pawn) => self.gen_pawn::<QUIET, CAPTURE>(src),
                Some(PieceKind::Knight) => self.gen_piece::<QUIET, CAPTURE>(src, attack::knight(src)),
                Some(_) => {
                    let mut attacks = Bitboard::EMPTY;
                    if PieceMask::DIAGONAL.matches(code) {
                        attacks |= attack::bishop(src, board.all);
                    }
                    if PieceMask::CARDINAL.matches(code) {
                        attacks |= attack::rook(src, board.all);
                    }
                    self.gen_piece::<QUIET, CAPTURE>(src, attacks);
                }
                None => {}
            }
        }
        if QUIET {
            self.gen_castling();
        }
    }

    fn gen_all(&mut self) {
        self.gen::<true, true>();
    }

    fn gen_captures(&mut self) {
        self.gen::<false, true>();
    }

    fn gen_quiets(&mut self) {
        self.gen::<true, false>();
    }
}

macro_rules! do_impl {
    ($legal:literal; $($(#[$attr:meta])* $name:ident; $(#[$attr_into:meta])* $name_into:ident;)*) => {
        $(
            $(#[$attr_into])*
            pub fn $name_into<P: MovePush>(b: &Board, dst: &mut P) {
                match b.side() {
                    Color::White => {
                        MoveGenImpl::<P, generic::White, $legal>::new(b, dst).$name()
                    }
                    Color::Black => {
                        MoveGenImpl::<P, generic::Black, $legal>::new(b, dst).$name()
                    }
                }
            }

            $(#[$attr])*
            pub fn $name(b: &Board) -> MoveArray {
                let mut res = MoveArray::new();
                $name_into(b, &mut res);
                res
            }
        )*
    }
}

/// Generation of pseudo-legal moves
///
/// The moves obey the rules of piece movement, but may leave the king of the side to move
/// under attack. Use [`Board::is_legal_trial()`] to filter them.
pub mod semilegal {
    use super::MoveGenImpl;
    use crate::board::Board;
    use crate::generic;
    use crate::moves::{MoveArray, MovePush};
    use crate::types::Color;

    do_impl! {
        false;

        /// Generates all the pseudo-legal moves
        gen_all;
        gen_all_into;

        /// Generates pseudo-legal captures, including en passant and capturing promotions
        gen_captures;
        gen_captures_into;

        /// Generates pseudo-legal non-captures, including castling
        gen_quiets;
        gen_quiets_into;
    }
}

/// Generation of legal moves
///
/// Pins, checks and double checks are resolved during generation, so every produced move can
/// be passed to [`Board::make_move()`] directly.
pub mod legal {
    use super::MoveGenImpl;
    use crate::board::Board;
    use crate::generic;
    use crate::moves::{MoveArray, MovePush};
    use crate::types::Color;

    do_impl! {
        true;

        /// Generates all the legal moves
        gen_all;
        gen_all_into;

        /// Generates legal captures, including en passant and capturing promotions
        gen_captures;
        gen_captures_into;

        /// Generates legal non-captures, including castling
        gen_quiets;
        gen_quiets_into;
    }

    /// Returns `true` if the side to move has at least one legal move
    pub fn has_moves(b: &Board) -> bool {
        !gen_all(b).is_empty()
    }
}

impl Board {
    /// Validates a pseudo-legal move by making it and testing whether our king is attacked
    pub fn is_legal_trial(&mut self, mv: Move) -> bool {
        self.make_move(mv);
        let ok = !self.is_opponent_king_attacked();
        self.unmake_move(mv);
        ok
    }

    /// Returns `true` if `coord` is attacked by any piece of color `by`
    #[inline]
    pub fn is_attacked(&self, coord: Coord, by: Color) -> bool {
        is_cell_attacked(self, coord, by, self.all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveArray;
    use crate::types::{File, Rank};
    use std::collections::BTreeSet;

    fn names(moves: &MoveArray) -> BTreeSet<String> {
        moves.iter().map(ToString::to_string).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn trial_filtered(b: &Board) -> BTreeSet<String> {
        let mut copy = b.clone();
        semilegal::gen_all(b)
            .iter()
            .filter(|&&mv| copy.is_legal_trial(mv))
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_cell_attackers() {
        let b = Board::from_fen("3R3B/8/3R4/1NP1Q3/3p4/1NP5/5B2/3R1K1k w - - 0 1").unwrap();
        let d4 = Coord::from_parts(File::D, Rank::R4);
        assert!(b.is_attacked(d4, Color::White));
        let attackers = Bitboard::EMPTY
            .with(Coord::from_parts(File::D, Rank::R6))
            .with(Coord::from_parts(File::B, Rank::R5))
            .with(Coord::from_parts(File::E, Rank::R5))
            .with(Coord::from_parts(File::B, Rank::R3))
            .with(Coord::from_parts(File::C, Rank::R3))
            .with(Coord::from_parts(File::F, Rank::R2))
            .with(Coord::from_parts(File::D, Rank::R1));
        assert_eq!(cell_attackers(&b, d4, Color::White, b.occupied()), attackers);
        assert!(!b.is_attacked(d4, Color::Black));

        let b = Board::from_fen("8/8/8/2KPk3/8/8/8/8 w - - 0 1").unwrap();
        let d5 = Coord::from_parts(File::D, Rank::R5);
        assert_eq!(
            cell_attackers(&b, d5, Color::White, b.occupied()),
            Bitboard::from_coord(Coord::from_parts(File::C, Rank::R5)),
        );
        assert_eq!(
            cell_attackers(&b, d5, Color::Black, b.occupied()),
            Bitboard::from_coord(Coord::from_parts(File::E, Rank::R5)),
        );
    }

    #[test]
    fn test_initial() {
        let b = Board::initial();
        assert_eq!(legal::gen_all(&b).len(), 20);
        assert_eq!(semilegal::gen_all(&b).len(), 20);
        assert!(legal::gen_captures(&b).is_empty());
        assert_eq!(legal::gen_quiets(&b).len(), 20);
        assert!(legal::has_moves(&b));
    }

    #[test]
    fn test_sliding_check() {
        // The rook on e8 checks along the file. Evasions: king steps and interpositions by the
        // bishop and the knight.
        let b = Board::from_fen("4r2k/8/8/8/8/5N2/2B5/R3K3 w - - 0 1").unwrap();
        assert!(b.is_check());
        assert!(!b.state().is_double_check());
        assert_eq!(
            names(&legal::gen_all(&b)),
            set(&["e1d1", "e1d2", "e1f1", "e1f2", "c2e4", "f3e5"])
        );
        assert_eq!(names(&legal::gen_all(&b)), trial_filtered(&b));
    }

    #[test]
    fn test_double_check() {
        let b = Board::from_fen("1k2r3/8/8/8/8/3n4/8/R3K2R w KQ - 0 1").unwrap();
        assert!(b.state().is_double_check());
        let moves = legal::gen_all(&b);
        assert!(moves.iter().all(|mv| mv.from() == b.king_pos(Color::White)));
        assert_eq!(names(&moves), set(&["e1d1", "e1d2", "e1f1"]));
        assert_eq!(names(&moves), trial_filtered(&b));
    }

    #[test]
    fn test_pins() {
        let b = Board::from_fen("4k3/8/8/8/1b6/8/3N4/4KB1q w - - 0 1").unwrap();
        let moves = names(&legal::gen_all(&b));
        // Knight d2 is pinned by the bishop, bishop f1 by the queen.
        assert!(!moves.iter().any(|m| m.starts_with("d2")));
        assert!(!moves.iter().any(|m| m.starts_with("f1")));
        assert_eq!(moves, trial_filtered(&b));
    }

    #[test]
    fn test_enpassant_pin() {
        // Taking en passant would expose the king on the fifth rank.
        let b = Board::from_fen("8/8/8/KPp4r/8/8/8/7k w - c6 0 1").unwrap();
        assert_eq!(b.packed().ep_file(), Some(File::C));
        let moves = names(&legal::gen_all(&b));
        assert!(!moves.contains("b5c6"));
        assert!(names(&semilegal::gen_all(&b)).contains("b5c6"));
        assert_eq!(moves, trial_filtered(&b));

        let b = Board::from_fen("8/8/8/1Pp4r/8/8/K7/7k w - c6 0 1").unwrap();
        let moves = legal::gen_captures(&b);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].tag(), MoveTag::EnPassant);
        assert!(moves[0].is_capture());
    }

    #[test]
    fn test_castling() {
        let b = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let moves = names(&legal::gen_quiets(&b));
        assert!(moves.contains("e1g1"));
        assert!(moves.contains("e1c1"));

        // f1 is attacked, so short castling is not allowed; b1 may be attacked for long castling.
        let b = Board::from_fen("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1").unwrap();
        let moves = names(&legal::gen_all(&b));
        assert!(!moves.contains("e1g1"));
        let b = Board::from_fen("r3k2r/8/8/8/8/8/1r6/R3K2R w KQkq - 0 1").unwrap();
        let moves = names(&legal::gen_all(&b));
        assert!(moves.contains("e1c1"));
        assert!(moves.contains("e1g1"));

        // Blocked path.
        let b = Board::from_fen("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1").unwrap();
        assert!(!names(&legal::gen_all(&b)).iter().any(|m| m == "e1g1" || m == "e1c1"));
    }

    #[test]
    fn test_shuffled_castling() {
        // King on f1, rooks on b1 and g1: the H-side castling swaps the king and the rook.
        let b = Board::from_fen("5k2/8/8/8/8/8/8/1R3KR1 w GB - 0 1").unwrap();
        let moves = legal::gen_quiets(&b);
        let castles: Vec<_> = moves.iter().filter(|mv| mv.is_castle()).collect();
        assert_eq!(castles.len(), 2);
        assert!(castles.iter().all(|mv| mv.tag().is_rook_pos()));
        assert!(names(&moves).contains("f1g1"));
        assert!(names(&moves).contains("f1b1"));
    }

    #[test]
    fn test_promotions() {
        let b = Board::from_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let all = legal::gen_all(&b);
        let promotes: Vec<_> = all.iter().filter(|mv| mv.is_promote()).collect();
        assert_eq!(promotes.len(), 8);
        assert_eq!(promotes.iter().filter(|mv| mv.is_capture()).count(), 4);
        assert_eq!(legal::gen_captures(&b).len(), 4);
    }

    #[test]
    fn test_checkmate() {
        let b = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert!(b.is_check());
        assert!(!legal::has_moves(&b));
    }
}
