//! Irreversible per-ply state and the stack of such states
//!
//! Making a move pushes a new [`State`] onto the board's [`StateStack`], unmaking it pops the
//! state back. The top of the stack always describes the current position.

use crate::types::{CastleSide, Color, Coord, Dir, File, PieceCode};

use std::fmt;

/// Castle rights of both sides
///
/// Bit `2 * color + side` is set if `color` may still castle towards `side`.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CastleRights(u8);

impl CastleRights {
    const fn to_index(c: Color, s: CastleSide) -> u8 {
        ((c as u8) << 1) | s as u8
    }

    pub const EMPTY: CastleRights = CastleRights(0);
    pub const FULL: CastleRights = CastleRights(15);

    pub const fn has(&self, c: Color, s: CastleSide) -> bool {
        ((self.0 >> Self::to_index(c, s)) & 1) != 0
    }

    pub const fn with(self, c: Color, s: CastleSide) -> CastleRights {
        CastleRights(self.0 | (1_u8 << Self::to_index(c, s)))
    }

    pub const fn without(self, c: Color, s: CastleSide) -> CastleRights {
        CastleRights(self.0 & !(1_u8 << Self::to_index(c, s)))
    }

    pub fn set(&mut self, c: Color, s: CastleSide) {
        *self = self.with(c, s)
    }

    pub fn unset(&mut self, c: Color, s: CastleSide) {
        *self = self.without(c, s)
    }

    pub fn unset_color(&mut self, c: Color) {
        self.unset(c, CastleSide::ASide);
        self.unset(c, CastleSide::HSide);
    }

    pub const fn from_index(val: usize) -> CastleRights {
        assert!(val < 16, "raw castle rights must be between 0 and 15");
        CastleRights(val as u8)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "CastleRights({:04b})", self.0)
    }
}

/// Irreversible information of the position packed into 16 bits
///
/// Layout, from the lowest bits:
///
/// - 4 bits: en passant file, or `0xf` if en passant is not available
/// - 4 bits: castle rights, see [`CastleRights`]
/// - 3 bits: home file of the A-side castling rook
/// - 3 bits: home file of the H-side castling rook
///
/// Rook home files are the same for both colors.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PackedState(u16);

impl PackedState {
    const EP_MASK: u16 = 0x000f;
    const EP_NONE: u16 = 0x000f;
    const CASTLE_SHIFT: u16 = 4;
    const CASTLE_MASK: u16 = 0x00f0;
    const A_ROOK_SHIFT: u16 = 8;
    const H_ROOK_SHIFT: u16 = 11;

    /// No castle rights, no en passant, rooks on files A and H
    pub const EMPTY: PackedState =
        PackedState(Self::EP_NONE | ((File::H as u16) << Self::H_ROOK_SHIFT));

    pub const fn new(castle: CastleRights, ep_file: Option<File>, a_rook: File, h_rook: File) -> PackedState {
        let ep = match ep_file {
            Some(f) => f as u16,
            None => Self::EP_NONE,
        };
        PackedState(
            ep | ((castle.0 as u16) << Self::CASTLE_SHIFT)
                | ((a_rook as u16) << Self::A_ROOK_SHIFT)
                | ((h_rook as u16) << Self::H_ROOK_SHIFT),
        )
    }

    /// State of the standard initial position
    pub const fn initial() -> PackedState {
        PackedState::new(CastleRights::FULL, None, File::A, File::H)
    }

    pub const fn as_raw(&self) -> u16 {
        self.0
    }

    pub const fn ep_file(&self) -> Option<File> {
        match self.0 & Self::EP_MASK {
            Self::EP_NONE => None,
            f => Some(File::from_index(f as usize)),
        }
    }

    pub fn set_ep_file(&mut self, file: Option<File>) {
        let ep = match file {
            Some(f) => f as u16,
            None => Self::EP_NONE,
        };
        self.0 = (self.0 & !Self::EP_MASK) | ep;
    }

    pub const fn castle(&self) -> CastleRights {
        CastleRights(((self.0 & Self::CASTLE_MASK) >> Self::CASTLE_SHIFT) as u8)
    }

    pub fn set_castle(&mut self, rights: CastleRights) {
        self.0 = (self.0 & !Self::CASTLE_MASK) | ((rights.0 as u16) << Self::CASTLE_SHIFT);
    }

    pub const fn can_castle(&self, c: Color, s: CastleSide) -> bool {
        self.castle().has(c, s)
    }

    pub fn revoke(&mut self, c: Color, s: CastleSide) {
        self.set_castle(self.castle().without(c, s));
    }

    pub fn revoke_color(&mut self, c: Color) {
        let mut rights = self.castle();
        rights.unset_color(c);
        self.set_castle(rights);
    }

    pub const fn rook_file(&self, s: CastleSide) -> File {
        let shift = match s {
            CastleSide::ASide => Self::A_ROOK_SHIFT,
            CastleSide::HSide => Self::H_ROOK_SHIFT,
        };
        File::from_index(((self.0 >> shift) & 7) as usize)
    }
}

impl Default for PackedState {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for PackedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("PackedState")
            .field("ep_file", &self.ep_file())
            .field("castle", &self.castle())
            .field("a_rook", &self.rook_file(CastleSide::ASide))
            .field("h_rook", &self.rook_file(CastleSide::HSide))
            .finish()
    }
}

/// One check given to the side to move
///
/// `origin` is the checking piece. `ray` is the direction from the king towards the origin and
/// is present only for sliding checkers, whose check can be blocked.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Check {
    pub origin: Option<Coord>,
    pub ray: Option<Dir>,
}

impl Check {
    pub const NONE: Check = Check {
        origin: None,
        ray: None,
    };

    pub const fn contact(origin: Coord) -> Check {
        Check {
            origin: Some(origin),
            ray: None,
        }
    }

    pub const fn sliding(origin: Coord, ray: Dir) -> Check {
        Check {
            origin: Some(origin),
            ray: Some(ray),
        }
    }

    pub const fn is_some(&self) -> bool {
        self.origin.is_some()
    }
}

/// Snapshot of the irreversible information of one position
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct State {
    /// Checks given to the side to move. The second one is set only on double check
    pub check: [Check; 2],
    pub packed: PackedState,
    /// Piece captured by the move that led to this position
    pub captured: PieceCode,
    /// Index of the captured piece in its color's piece list
    pub captured_slot: u8,
    /// Half-moves since the last capture or pawn move
    pub halfmove: u16,
    /// Zobrist key of the position
    pub key: u64,
}

impl State {
    #[inline]
    pub const fn is_check(&self) -> bool {
        self.check[0].is_some()
    }

    #[inline]
    pub const fn is_double_check(&self) -> bool {
        self.check[1].is_some()
    }
}

/// Bounded stack of [`State`]s, also known as plates
///
/// The stack is never empty: the bottom plate holds the state of the position the board was
/// loaded from, and the top plate the state of the current position. Its depth, i.e. the number
/// of plates above the bottom one, always equals the number of moves made on the board.
#[derive(Clone)]
pub struct StateStack {
    plates: Box<[State]>,
    head: usize,
}

impl StateStack {
    /// Default number of plates, enough for a long game plus a deep search
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a stack with room for `capacity` plates, the root one included
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, root: State) -> StateStack {
        assert!(capacity > 0, "state stack must have room for the root state");
        let mut plates = vec![State::default(); capacity].into_boxed_slice();
        plates[0] = root;
        StateStack { plates, head: 0 }
    }

    /// Pushes `state`, making it the current one
    ///
    /// # Panics
    ///
    /// Panics if the stack is full.
    #[inline]
    pub fn push(&mut self, state: State) {
        assert!(
            self.head + 1 < self.plates.len(),
            "state stack overflow (capacity {})",
            self.plates.len()
        );
        self.head += 1;
        self.plates[self.head] = state;
    }

    /// Pops the current state, so the previous one becomes current
    ///
    /// # Panics
    ///
    /// Panics if only the root state is left.
    #[inline]
    pub fn pop(&mut self) -> State {
        assert!(self.head > 0, "state stack underflow");
        self.head -= 1;
        self.plates[self.head + 1]
    }

    #[inline]
    pub fn peek(&self) -> &State {
        &self.plates[self.head]
    }

    /// Number of states pushed above the root one
    #[inline]
    pub fn depth(&self) -> usize {
        self.head
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.plates.len()
    }

    /// Number of states that can still be pushed
    #[inline]
    pub fn remaining(&self) -> usize {
        self.plates.len() - 1 - self.head
    }

    /// All the states from the root one up to the current one
    #[inline]
    pub fn history(&self) -> &[State] {
        &self.plates[..=self.head]
    }
}

impl PartialEq for StateStack {
    fn eq(&self, other: &StateStack) -> bool {
        self.history() == other.history()
    }
}

impl Eq for StateStack {}

impl fmt::Debug for StateStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("StateStack")
            .field("depth", &self.head)
            .field("capacity", &self.plates.len())
            .field("top", self.peek())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_castle_rights() {
        let empty = CastleRights::EMPTY;
        for c in Color::iter() {
            for s in CastleSide::iter() {
                assert!(!empty.has(c, s));
                assert!(CastleRights::FULL.has(c, s));
            }
        }

        let mut rights = CastleRights::EMPTY;
        rights.set(Color::White, CastleSide::HSide);
        assert!(rights.has(Color::White, CastleSide::HSide));
        assert!(!rights.has(Color::White, CastleSide::ASide));
        assert!(!rights.has(Color::Black, CastleSide::HSide));

        let mut rights = CastleRights::FULL;
        rights.unset_color(Color::Black);
        assert_eq!(
            rights,
            CastleRights::EMPTY
                .with(Color::White, CastleSide::ASide)
                .with(Color::White, CastleSide::HSide)
        );
    }

    #[test]
    fn test_packed() {
        let mut p = PackedState::initial();
        assert_eq!(p.ep_file(), None);
        assert_eq!(p.castle(), CastleRights::FULL);
        assert_eq!(p.rook_file(CastleSide::ASide), File::A);
        assert_eq!(p.rook_file(CastleSide::HSide), File::H);

        p.set_ep_file(Some(File::D));
        assert_eq!(p.ep_file(), Some(File::D));
        p.revoke(Color::White, CastleSide::ASide);
        assert!(!p.can_castle(Color::White, CastleSide::ASide));
        assert!(p.can_castle(Color::White, CastleSide::HSide));
        p.revoke_color(Color::Black);
        assert_eq!(
            p.castle(),
            CastleRights::EMPTY.with(Color::White, CastleSide::HSide)
        );
        assert_eq!(p.ep_file(), Some(File::D));
        p.set_ep_file(None);
        assert_eq!(p.ep_file(), None);

        let p = PackedState::new(CastleRights::FULL, Some(File::A), File::B, File::G);
        assert_eq!(p.ep_file(), Some(File::A));
        assert_eq!(p.rook_file(CastleSide::ASide), File::B);
        assert_eq!(p.rook_file(CastleSide::HSide), File::G);
        assert_eq!(PackedState::default(), PackedState::EMPTY);
        assert_eq!(PackedState::EMPTY.rook_file(CastleSide::HSide), File::H);
    }

    #[test]
    fn test_stack() {
        let root = State {
            halfmove: 3,
            ..State::default()
        };
        let mut stack = StateStack::new(3, root);
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.peek().halfmove, 3);

        stack.push(State {
            halfmove: 4,
            ..State::default()
        });
        stack.push(State {
            halfmove: 5,
            ..State::default()
        });
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.remaining(), 0);
        assert_eq!(stack.peek().halfmove, 5);
        assert_eq!(
            stack.history().iter().map(|s| s.halfmove).collect::<Vec<_>>(),
            vec![3, 4, 5]
        );

        assert_eq!(stack.pop().halfmove, 5);
        assert_eq!(stack.peek().halfmove, 4);
        assert_eq!(stack.pop().halfmove, 4);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    #[should_panic(expected = "state stack underflow")]
    fn test_underflow() {
        let mut stack = StateStack::new(4, State::default());
        stack.pop();
    }

    #[test]
    #[should_panic(expected = "state stack overflow")]
    fn test_overflow() {
        let mut stack = StateStack::new(2, State::default());
        stack.push(State::default());
        stack.push(State::default());
    }
}
