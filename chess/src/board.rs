//! Board and related things

use crate::bitboard::Bitboard;
use crate::state::{CastleRights, Check, PackedState, State, StateStack};
use crate::types::{
    self, CastleSide, Color, Coord, File, PieceCode, PieceKind, PieceMask, Rank,
};
use crate::{attack, bitboard_consts, geometry, movegen, zobrist};

use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::str::FromStr;

use arrayvec::ArrayVec;
use thiserror::Error;

/// Maximum number of pieces of one color
pub const MAX_PIECES: usize = 16;

/// Board validation error
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidateError {
    /// Too many pieces of given color
    ///
    /// No more than 16 pieces of each color is allowed.
    #[error("too many pieces of color {0:?}")]
    TooManyPieces(Color),
    /// One of the sides doesn't have a king
    #[error("no king of color {0:?}")]
    NoKing(Color),
    /// One of the sides has more than one king
    #[error("more than one king of color {0:?}")]
    TooManyKings(Color),
    /// There is a pawn on the 1st or on the 8th rank
    #[error("invalid pawn position {0}")]
    InvalidPawn(Coord),
    /// Opponent's king is under attack
    #[error("opponent's king is attacked")]
    OpponentKingAttacked,
    /// The square contains a code which is not a piece
    #[error("invalid piece code at {0}")]
    InvalidPiece(Coord),
}

/// Broken internal invariant of the board, found by [`Board::validate_invariants()`]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum InvariantError {
    /// Piece list entry points to a square without a piece of this color
    #[error("list entry {index} of {color:?} points to {coord}")]
    ListEntry {
        color: Color,
        index: usize,
        coord: Coord,
    },
    /// Slot index of an occupied square doesn't match its position in the piece list
    #[error("slot of {coord} is not {index}")]
    Slot { coord: Coord, index: usize },
    /// Empty square has a nonzero slot index
    #[error("empty square {0} has nonzero slot")]
    EmptySlot(Coord),
    /// Piece on the square is missing from the piece bitboards
    #[error("piece on {0} is missing from bitboards")]
    PieceBitboard(Coord),
    /// Color bitboards differ from the piece lists
    #[error("color bitboards differ from piece lists")]
    ColorBitboards,
    /// Occupancy bitboard differs from the piece lists
    #[error("occupancy differs from piece lists")]
    Occupancy,
    /// Some square is set in more than one piece bitboard
    #[error("piece bitboards overlap")]
    OverlappingPieces,
    #[error("stack depth {depth} differs from ply {ply}")]
    StackDepth { depth: usize, ply: usize },
    /// Incremental Zobrist key differs from the one computed from scratch
    #[error("zobrist key differs from recomputed one")]
    Key,
    #[error("stored checks differ from recomputed ones")]
    Checks,
}

/// Error parsing the first part of FEN (i.e. the positions of pieces on the board)
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CellsParseError {
    /// Rank is too large
    #[error("too many items in rank {0}")]
    RankOverflow(Rank),
    /// Rank is too small
    #[error("not enough items in rank {0}")]
    RankUnderflow(Rank),
    /// Too many ranks
    #[error("too many ranks")]
    Overflow,
    /// Not enough ranks
    #[error("not enough ranks")]
    Underflow,
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Error parsing the castling part of FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum CastlingParseError {
    /// Unexpected character
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
    /// The same right is given twice
    #[error("duplicate char {0:?}")]
    DuplicateChar(char),
    /// White and Black have castling rooks on different files
    #[error("castling rook files differ between colors")]
    InconsistentRookFiles,
    /// The part is empty
    #[error("unexpected empty string")]
    EmptyString,
}

/// Error parsing [`RawBoard`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum RawFenParseError {
    /// FEN contains non-ASCII characters
    #[error("non-ASCII data in FEN")]
    NonAscii,
    /// FEN doesn't have board part
    #[error("board not specified")]
    NoBoard,
    /// Error parsing board from FEN
    #[error("bad board: {0}")]
    Board(#[from] CellsParseError),
    /// FEN doesn't have move side part
    #[error("no move side")]
    NoMoveSide,
    /// Error parsing move side from FEN
    #[error("bad move side: {0}")]
    MoveSide(#[from] types::ColorParseError),
    /// FEN doesn't have castling rights part
    #[error("no castling rights")]
    NoCastling,
    /// Error parsing castling rights from FEN
    #[error("bad castling rights: {0}")]
    Castling(#[from] CastlingParseError),
    /// FEN doesn't have enpassant part
    #[error("no enpassant")]
    NoEnpassant,
    /// Error parsing enpassant from FEN
    #[error("bad enpassant: {0}")]
    Enpassant(#[from] types::CoordParseError),
    /// Enpassant rank is invalid
    #[error("invalid enpassant rank {0}")]
    InvalidEnpassantRank(Rank),
    /// Error parsing halfmove clock
    #[error("bad halfmove clock: {0}")]
    Halfmove(ParseIntError),
    /// Error parsing move number
    #[error("bad move number: {0}")]
    MoveNumber(ParseIntError),
    /// FEN contains extra data
    #[error("extra data in FEN")]
    ExtraData,
}

/// Error parsing [`Board`] from FEN
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum FenParseError {
    /// Board cannot be parsed
    #[error("cannot parse fen: {0}")]
    Fen(#[from] RawFenParseError),
    /// Board was parsed, but it's invalid
    #[error("invalid position: {0}")]
    Valid(#[from] ValidateError),
}

/// Raw chess position
///
/// Raw board is the structured form in which positions are loaded into and dumped from a
/// [`Board`]. Unlike [`Board`], it is not validated and may contain an invalid position. After
/// filling the fields, convert it via [`Board::try_from()`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RawBoard {
    /// Contents of the board, indexed by [`Coord::index()`]
    pub cells: [PieceCode; 64],
    /// Side to move
    pub side: Color,
    /// Castle rights
    pub castle: CastleRights,
    /// Home files of the castling rooks, indexed by [`CastleSide::index()`]
    pub rook_files: [File; 2],
    /// File of the pawn which may be taken en passant
    pub ep_file: Option<File>,
    /// Number of half-moves without pawn moves or captures
    pub halfmove: u16,
    /// Move number, incremented after each move by Black
    pub move_number: u16,
}

impl RawBoard {
    #[inline]
    pub const fn empty() -> RawBoard {
        RawBoard {
            cells: [PieceCode::EMPTY; 64],
            side: Color::White,
            castle: CastleRights::EMPTY,
            rook_files: [File::A, File::H],
            ep_file: None,
            halfmove: 0,
            move_number: 1,
        }
    }

    /// Returns a board with the initial position
    pub fn initial() -> RawBoard {
        let mut res = RawBoard {
            castle: CastleRights::FULL,
            ..RawBoard::empty()
        };
        for file in File::iter() {
            res.put2(file, Rank::R2, PieceCode::new(Color::White, PieceKind::Pawn));
            res.put2(file, Rank::R7, PieceCode::new(Color::Black, PieceKind::Pawn));
        }
        const BACK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for color in Color::iter() {
            for (file, kind) in File::iter().zip(BACK) {
                res.put2(file, geometry::castling_rank(color), PieceCode::new(color, kind));
            }
        }
        res
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<RawBoard, RawFenParseError> {
        RawBoard::from_str(fen)
    }

    #[inline]
    pub fn get(&self, c: Coord) -> PieceCode {
        self.cells[c.index()]
    }

    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> PieceCode {
        self.get(Coord::from_parts(file, rank))
    }

    #[inline]
    pub fn put(&mut self, c: Coord, code: PieceCode) {
        self.cells[c.index()] = code;
    }

    #[inline]
    pub fn put2(&mut self, file: File, rank: Rank, code: PieceCode) {
        self.put(Coord::from_parts(file, rank), code);
    }

    /// Irreversible state of the position in packed form
    #[inline]
    pub fn packed(&self) -> PackedState {
        PackedState::new(
            self.castle,
            self.ep_file,
            self.rook_files[CastleSide::ASide.index()],
            self.rook_files[CastleSide::HSide.index()],
        )
    }

    /// Computes the Zobrist key of the position from scratch
    pub fn zobrist_hash(&self) -> u64 {
        let mut hash = if self.side == Color::Black {
            zobrist::SIDE
        } else {
            0
        };
        hash ^= zobrist::packed_delta(PackedState::EMPTY, self.packed());
        for c in Coord::iter() {
            let code = self.get(c);
            if code.is_occupied() {
                hash ^= zobrist::piece(code, c);
            }
        }
        hash
    }

    /// Returns the square where a pawn lands after taking en passant, if en passant is allowed
    #[inline]
    pub fn ep_dest(&self) -> Option<Coord> {
        let f = self.ep_file?;
        Some(Coord::from_parts(f, geometry::enpassant_dst_rank(self.side)))
    }

    fn king_file(&self, color: Color) -> Option<File> {
        let rank = geometry::castling_rank(color);
        let king = PieceCode::new(color, PieceKind::King);
        File::iter().find(|&f| self.get2(f, rank) == king)
    }

    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl Default for RawBoard {
    #[inline]
    fn default() -> RawBoard {
        RawBoard::empty()
    }
}

type PieceList = ArrayVec<Coord, MAX_PIECES>;

/// Board that contains a valid position
///
/// Besides the placement of pieces, the board keeps per-color piece lists with the index of
/// each piece in its list, occupancy bitboards, the running Zobrist key and the stack of
/// irreversible states. All of them are updated incrementally by
/// [`Board::make_move()`] and [`Board::unmake_move()`].
///
/// Squares not occupied by any piece always have zero in the slot index table, so two boards
/// with the same history compare equal field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) pieces: [PieceCode; 64],
    pub(crate) lists: [PieceList; 2],
    pub(crate) slots: [u8; 64],
    pub(crate) colors: [Bitboard; 2],
    pub(crate) kinds: [Bitboard; PieceCode::COUNT],
    pub(crate) all: Bitboard,
    pub(crate) cardinal: Bitboard,
    pub(crate) diagonal: Bitboard,
    pub(crate) side: Color,
    pub(crate) ply: usize,
    pub(crate) key: u64,
    pub(crate) stack: StateStack,
    pub(crate) start_move_number: u16,
}

impl Board {
    /// Returns a board with the initial position
    pub fn initial() -> Board {
        Board::from_raw(RawBoard::initial(), StateStack::DEFAULT_CAPACITY)
            .expect("initial position is valid")
    }

    /// Parses a board from FEN
    pub fn from_fen(fen: &str) -> Result<Board, FenParseError> {
        Board::from_str(fen)
    }

    /// Validates `raw` and loads it into a board whose state stack holds `capacity` plates
    ///
    /// Castle rights without the corresponding king and rook on their squares, and en passant
    /// which no pawn can take, are silently dropped.
    pub fn from_raw(mut raw: RawBoard, capacity: usize) -> Result<Board, ValidateError> {
        normalize_castling(&mut raw);
        normalize_enpassant(&mut raw);

        let mut res = Board {
            pieces: [PieceCode::EMPTY; 64],
            lists: [PieceList::new(), PieceList::new()],
            slots: [0; 64],
            colors: [Bitboard::EMPTY; 2],
            kinds: [Bitboard::EMPTY; PieceCode::COUNT],
            all: Bitboard::EMPTY,
            cardinal: Bitboard::EMPTY,
            diagonal: Bitboard::EMPTY,
            side: raw.side,
            ply: 0,
            key: 0,
            stack: StateStack::new(1, State::default()),
            start_move_number: raw.move_number,
        };

        for c in Coord::iter() {
            let code = raw.get(c);
            if code.is_empty() {
                continue;
            }
            let color = match (code.color(), code.kind()) {
                (Some(color), Some(_)) => color,
                _ => return Err(ValidateError::InvalidPiece(c)),
            };
            if res.lists[color.index()].is_full() {
                return Err(ValidateError::TooManyPieces(color));
            }
            res.put_piece(c, code);
        }

        for color in Color::iter() {
            let kings = res.piece2(color, PieceKind::King);
            if kings.is_empty() {
                return Err(ValidateError::NoKing(color));
            }
            if kings.has_many() {
                return Err(ValidateError::TooManyKings(color));
            }
        }

        let pawns = res.piece2(Color::White, PieceKind::Pawn) | res.piece2(Color::Black, PieceKind::Pawn);
        if let Some(c) = (pawns & bitboard_consts::BACK_RANKS).first() {
            return Err(ValidateError::InvalidPawn(c));
        }

        if res.is_opponent_king_attacked() {
            return Err(ValidateError::OpponentKingAttacked);
        }

        let packed = raw.packed();
        res.key ^= zobrist::packed_delta(PackedState::EMPTY, packed);
        if res.side == Color::Black {
            res.key ^= zobrist::SIDE;
        }
        let root = State {
            check: res.compute_checks(),
            packed,
            captured: PieceCode::EMPTY,
            captured_slot: 0,
            halfmove: raw.halfmove,
            key: res.key,
        };
        res.stack = StateStack::new(capacity, root);
        Ok(res)
    }

    /// Dumps the current position
    pub fn raw(&self) -> RawBoard {
        let packed = self.packed();
        let start_side = if self.ply % 2 == 0 {
            self.side
        } else {
            self.side.inv()
        };
        let extra = match start_side {
            Color::White => 0,
            Color::Black => 1,
        };
        RawBoard {
            cells: self.pieces,
            side: self.side,
            castle: packed.castle(),
            rook_files: [
                packed.rook_file(CastleSide::ASide),
                packed.rook_file(CastleSide::HSide),
            ],
            ep_file: packed.ep_file(),
            halfmove: self.halfmove(),
            move_number: u16::try_from((self.ply + extra) / 2)
                .map_or(u16::MAX, |n| self.start_move_number.saturating_add(n)),
        }
    }

    #[inline]
    pub fn get(&self, c: Coord) -> PieceCode {
        unsafe { *self.pieces.get_unchecked(c.index()) }
    }

    #[inline]
    pub fn get2(&self, file: File, rank: Rank) -> PieceCode {
        self.get(Coord::from_parts(file, rank))
    }

    /// Returns side to move
    #[inline]
    pub fn side(&self) -> Color {
        self.side
    }

    /// Number of moves made since the position was loaded
    #[inline]
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// Returns the bitboard over all the pieces with color `c`
    #[inline]
    pub fn color(&self, c: Color) -> Bitboard {
        unsafe { *self.colors.get_unchecked(c.index()) }
    }

    /// Returns the bitboard over all the squares containing `code`
    #[inline]
    pub fn piece(&self, code: PieceCode) -> Bitboard {
        unsafe { *self.kinds.get_unchecked(code.index()) }
    }

    #[inline]
    pub fn piece2(&self, c: Color, kind: PieceKind) -> Bitboard {
        self.piece(PieceCode::new(c, kind))
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.all
    }

    #[inline]
    pub fn empty(&self) -> Bitboard {
        !self.all
    }

    /// Rooks and queens of both colors
    #[inline]
    pub fn cardinal(&self) -> Bitboard {
        self.cardinal
    }

    /// Bishops and queens of both colors
    #[inline]
    pub fn diagonal(&self) -> Bitboard {
        self.diagonal
    }

    /// Returns the squares of all the pieces of color `c`
    ///
    /// The order of the list is unspecified, but it's restored exactly after unmaking moves.
    #[inline]
    pub fn piece_list(&self, c: Color) -> &[Coord] {
        &self.lists[c.index()]
    }

    /// Returns the position of the king of color `c`
    #[inline]
    pub fn king_pos(&self, c: Color) -> Coord {
        match self.piece2(c, PieceKind::King).first() {
            Some(p) => p,
            None => unreachable!("board has no king of color {:?}", c),
        }
    }

    /// Returns the Zobrist key of the position
    ///
    /// The key is maintained incrementally, so this function doesn't compute anything.
    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Recomputes the Zobrist key from the placement and the current state
    pub fn key_from_scratch(&self) -> u64 {
        let mut key = if self.side == Color::Black {
            zobrist::SIDE
        } else {
            0
        };
        key ^= zobrist::packed_delta(PackedState::EMPTY, self.packed());
        for color in Color::iter() {
            for &c in self.piece_list(color) {
                key ^= zobrist::piece(self.get(c), c);
            }
        }
        key
    }

    /// Returns the state of the current position
    #[inline]
    pub fn state(&self) -> &State {
        self.stack.peek()
    }

    #[inline]
    pub fn stack(&self) -> &StateStack {
        &self.stack
    }

    #[inline]
    pub fn packed(&self) -> PackedState {
        self.state().packed
    }

    /// Half-moves since the last capture or pawn move
    #[inline]
    pub fn halfmove(&self) -> u16 {
        self.state().halfmove
    }

    /// Checks given to the side to move
    #[inline]
    pub fn checks(&self) -> &[Check; 2] {
        &self.state().check
    }

    /// Returns `true` if the current side is in check
    #[inline]
    pub fn is_check(&self) -> bool {
        self.state().is_check()
    }

    /// Returns `true` if the opponent's king is under attack
    ///
    /// This never holds for a board loaded from a valid position, but may hold in the middle of
    /// a trial move made without legality checks.
    #[inline]
    pub fn is_opponent_king_attacked(&self) -> bool {
        let c = self.side;
        movegen::is_cell_attacked(self, self.king_pos(c.inv()), c, self.all)
    }

    /// Number of earlier positions in the game equal to the current one
    ///
    /// Only positions with the same side to move since the last irreversible move are
    /// considered. Equality is by Zobrist key.
    pub fn repetitions(&self) -> usize {
        let history = self.stack.history();
        let head = history.len() - 1;
        let key = history[head].key;
        let window = (self.halfmove() as usize).min(head);
        (2..=window)
            .step_by(2)
            .filter(|&back| history[head - back].key == key)
            .count()
    }

    /// Returns `true` if the current position occurred at least twice before
    #[inline]
    pub fn threefold(&self) -> bool {
        self.repetitions() >= 2
    }

    /// Returns `true` if fifty moves passed without captures and pawn moves
    #[inline]
    pub fn is_fifty_moves(&self) -> bool {
        self.halfmove() >= 100
    }

    /// Computes the checks given to the side to move from scratch
    pub(crate) fn compute_checks(&self) -> [Check; 2] {
        let king = self.king_pos(self.side);
        let attackers = movegen::cell_attackers(self, king, self.side.inv(), self.all);
        let mut res = [Check::NONE; 2];
        for (slot, origin) in res.iter_mut().zip(attackers) {
            let code = self.get(origin);
            let slider = PieceMask::CARDINAL.union(PieceMask::DIAGONAL);
            *slot = match attack::direction(king, origin) {
                Some(dir) if slider.intersects(code) => Check::sliding(origin, dir),
                _ => Check::contact(origin),
            };
        }
        res
    }

    #[inline]
    fn toggle(&mut self, c: Coord, code: PieceCode) {
        self.colors[Self::color_of(code)].toggle(c);
        self.kinds[code.index()].toggle(c);
        self.all.toggle(c);
        if PieceMask::CARDINAL.matches(code) {
            self.cardinal.toggle(c);
        }
        if PieceMask::DIAGONAL.matches(code) {
            self.diagonal.toggle(c);
        }
        self.key ^= zobrist::piece(code, c);
    }

    #[inline]
    fn color_of(code: PieceCode) -> usize {
        if code.is(Color::White) {
            0
        } else {
            1
        }
    }

    /// Puts `code` on the empty square `c`, appending it to the piece list
    pub(crate) fn put_piece(&mut self, c: Coord, code: PieceCode) {
        debug_assert!(self.get(c).is_empty());
        let list = &mut self.lists[Self::color_of(code)];
        self.slots[c.index()] = list.len() as u8;
        list.push(c);
        self.pieces[c.index()] = code;
        self.toggle(c, code);
    }

    /// Removes the piece from `c`, returning it with its former index in the piece list
    ///
    /// The last piece of the list takes the freed index.
    pub(crate) fn take_piece(&mut self, c: Coord) -> (PieceCode, u8) {
        let code = self.get(c);
        debug_assert!(code.is_occupied());
        let slot = self.slots[c.index()];
        let list = &mut self.lists[Self::color_of(code)];
        list.swap_remove(slot as usize);
        if let Some(&moved) = list.get(slot as usize) {
            self.slots[moved.index()] = slot;
        }
        self.slots[c.index()] = 0;
        self.pieces[c.index()] = PieceCode::EMPTY;
        self.toggle(c, code);
        (code, slot)
    }

    /// Exact inverse of [`Board::take_piece()`]
    pub(crate) fn restore_piece(&mut self, c: Coord, code: PieceCode, slot: u8) {
        debug_assert!(self.get(c).is_empty());
        let list = &mut self.lists[Self::color_of(code)];
        list.push(c);
        let last = list.len() - 1;
        if slot as usize != last {
            list.swap(slot as usize, last);
            let moved = list[last];
            self.slots[moved.index()] = last as u8;
        }
        self.slots[c.index()] = slot;
        self.pieces[c.index()] = code;
        self.toggle(c, code);
    }

    /// Moves the piece from `from` to the empty square `to`, keeping its list index
    pub(crate) fn move_piece(&mut self, from: Coord, to: Coord) {
        let code = self.get(from);
        debug_assert!(self.get(to).is_empty());
        let slot = self.slots[from.index()];
        self.lists[Self::color_of(code)][slot as usize] = to;
        self.slots[to.index()] = slot;
        self.slots[from.index()] = 0;
        self.pieces[from.index()] = PieceCode::EMPTY;
        self.pieces[to.index()] = code;
        self.toggle(from, code);
        self.toggle(to, code);
    }

    /// Replaces the piece on `c` with `code` of the same color, e.g. on promotion
    pub(crate) fn change_piece(&mut self, c: Coord, code: PieceCode) {
        let old = self.get(c);
        debug_assert_eq!(old.color(), code.color());
        self.toggle(c, old);
        self.pieces[c.index()] = code;
        self.toggle(c, code);
    }

    /// Moves the king and the rook simultaneously, as castling does
    ///
    /// Source and destination squares may overlap.
    pub(crate) fn relocate_pair(&mut self, king: (Coord, Coord), rook: (Coord, Coord)) {
        let king_code = self.get(king.0);
        let rook_code = self.get(rook.0);
        let king_slot = self.slots[king.0.index()];
        let rook_slot = self.slots[rook.0.index()];
        self.toggle(king.0, king_code);
        self.toggle(rook.0, rook_code);
        for c in [king.0, rook.0] {
            self.pieces[c.index()] = PieceCode::EMPTY;
            self.slots[c.index()] = 0;
        }
        self.pieces[king.1.index()] = king_code;
        self.pieces[rook.1.index()] = rook_code;
        self.slots[king.1.index()] = king_slot;
        self.slots[rook.1.index()] = rook_slot;
        let list = &mut self.lists[Self::color_of(king_code)];
        list[king_slot as usize] = king.1;
        list[rook_slot as usize] = rook.1;
        self.toggle(king.1, king_code);
        self.toggle(rook.1, rook_code);
    }

    /// Checks all the redundant structures of the board against each other
    ///
    /// Returns the first broken invariant.
    pub fn validate_invariants(&self) -> Result<(), InvariantError> {
        type Error = InvariantError;

        let mut colors = [Bitboard::EMPTY; 2];
        for color in Color::iter() {
            for (index, &coord) in self.piece_list(color).iter().enumerate() {
                if !self.get(coord).is(color) {
                    return Err(Error::ListEntry {
                        color,
                        index,
                        coord,
                    });
                }
                if self.slots[coord.index()] as usize != index {
                    return Err(Error::Slot { coord, index });
                }
                colors[color.index()].set(coord);
            }
        }
        for c in Coord::iter() {
            let code = self.get(c);
            if code.is_empty() && self.slots[c.index()] != 0 {
                return Err(Error::EmptySlot(c));
            }
            if code.is_occupied() && !self.piece(code).has(c) {
                return Err(Error::PieceBitboard(c));
            }
        }
        if colors != self.colors {
            return Err(Error::ColorBitboards);
        }
        if self.all != (colors[0] | colors[1]) {
            return Err(Error::Occupancy);
        }
        let count: u32 = self.kinds.iter().map(|b| b.popcount()).sum();
        if count != self.all.popcount() {
            return Err(Error::OverlappingPieces);
        }
        if self.stack.depth() != self.ply {
            return Err(Error::StackDepth {
                depth: self.stack.depth(),
                ply: self.ply,
            });
        }
        if self.key != self.key_from_scratch() || self.key != self.state().key {
            return Err(Error::Key);
        }
        if *self.checks() != self.compute_checks() {
            return Err(Error::Checks);
        }
        Ok(())
    }

    #[inline]
    pub fn as_fen(&self) -> String {
        self.to_string()
    }
}

impl TryFrom<RawBoard> for Board {
    type Error = ValidateError;

    fn try_from(raw: RawBoard) -> Result<Board, ValidateError> {
        Board::from_raw(raw, StateStack::DEFAULT_CAPACITY)
    }
}

impl TryFrom<&RawBoard> for Board {
    type Error = ValidateError;

    fn try_from(raw: &RawBoard) -> Result<Board, ValidateError> {
        (*raw).try_into()
    }
}

fn normalize_castling(raw: &mut RawBoard) {
    for color in Color::iter() {
        let rank = geometry::castling_rank(color);
        let king_file = raw.king_file(color);
        let rook = PieceCode::new(color, PieceKind::Rook);
        for side in CastleSide::iter() {
            let rook_file = raw.rook_files[side.index()];
            let valid = match king_file {
                Some(k) => {
                    raw.get2(rook_file, rank) == rook
                        && match side {
                            CastleSide::ASide => rook_file < k,
                            CastleSide::HSide => rook_file > k,
                        }
                }
                None => false,
            };
            if !valid {
                raw.castle.unset(color, side);
            }
        }
    }
}

fn normalize_enpassant(raw: &mut RawBoard) {
    let f = match raw.ep_file {
        Some(f) => f,
        None => return,
    };
    let side = raw.side;
    let victim = Coord::from_parts(f, geometry::enpassant_src_rank(side));
    let dst = Coord::from_parts(f, geometry::enpassant_dst_rank(side));
    let jump = Coord::from_parts(f, geometry::double_push_rank(side.inv()));
    let our_pawn = PieceCode::new(side, PieceKind::Pawn);
    let can_take = attack::pawn(side.inv(), dst)
        .into_iter()
        .any(|c| raw.get(c) == our_pawn);
    if raw.get(victim) != PieceCode::new(side.inv(), PieceKind::Pawn)
        || raw.get(dst).is_occupied()
        || raw.get(jump).is_occupied()
        || !can_take
    {
        raw.ep_file = None;
    }
}

fn parse_cells(s: &str) -> Result<[PieceCode; 64], CellsParseError> {
    type Error = CellsParseError;

    let mut file = 0_usize;
    let mut rank = 0_usize;
    let mut pos = 0_usize;
    let mut cells = [PieceCode::EMPTY; 64];
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if file + add > 8 {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                file += add;
                pos += add;
            }
            b'/' => {
                if file < 8 {
                    return Err(Error::RankUnderflow(Rank::from_index(rank)));
                }
                rank += 1;
                file = 0;
                if rank >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                if file >= 8 {
                    return Err(Error::RankOverflow(Rank::from_index(rank)));
                }
                cells[pos] = match PieceCode::from_char(b as char) {
                    Some(code) if code.is_occupied() => code,
                    _ => return Err(Error::UnexpectedChar(b as char)),
                };
                file += 1;
                pos += 1;
            }
        };
    }

    if file < 8 {
        return Err(Error::RankUnderflow(Rank::from_index(rank)));
    }
    if rank < 7 {
        return Err(Error::Underflow);
    }

    Ok(cells)
}

/// Parses castling in the classical (`KQkq`) or Shredder (`HAha`) form
///
/// `K` and `Q` denote rooks on files H and A. A file letter denotes the rook on that file, and
/// the castle side is found from the position of the king.
fn parse_castling(s: &str, raw: &RawBoard) -> Result<(CastleRights, [File; 2]), CastlingParseError> {
    type Error = CastlingParseError;

    if s == "-" {
        return Ok((CastleRights::EMPTY, [File::A, File::H]));
    }
    if s.is_empty() {
        return Err(Error::EmptyString);
    }
    let mut rights = CastleRights::EMPTY;
    let mut files: [Option<File>; 2] = [None, None];
    for b in s.bytes() {
        let ch = b as char;
        let color = if ch.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let (side, file) = match ch.to_ascii_lowercase() {
            'k' => (CastleSide::HSide, File::H),
            'q' => (CastleSide::ASide, File::A),
            c @ 'a'..='h' => {
                let file = File::from_char(c).ok_or(Error::UnexpectedChar(ch))?;
                let king_file = raw.king_file(color).unwrap_or(File::E);
                let side = if file > king_file {
                    CastleSide::HSide
                } else {
                    CastleSide::ASide
                };
                (side, file)
            }
            _ => return Err(Error::UnexpectedChar(ch)),
        };
        if rights.has(color, side) {
            return Err(Error::DuplicateChar(ch));
        }
        match files[side.index()] {
            Some(prev) if prev != file => return Err(Error::InconsistentRookFiles),
            _ => files[side.index()] = Some(file),
        }
        rights.set(color, side);
    }
    Ok((
        rights,
        [files[0].unwrap_or(File::A), files[1].unwrap_or(File::H)],
    ))
}

fn parse_ep_file(s: &str, side: Color) -> Result<Option<File>, RawFenParseError> {
    if s == "-" {
        return Ok(None);
    }
    let enpassant = Coord::from_str(s)?;
    if enpassant.rank() != geometry::enpassant_dst_rank(side) {
        return Err(RawFenParseError::InvalidEnpassantRank(enpassant.rank()));
    }
    Ok(Some(enpassant.file()))
}

impl FromStr for RawBoard {
    type Err = RawFenParseError;

    fn from_str(s: &str) -> Result<RawBoard, Self::Err> {
        type Error = RawFenParseError;

        if !s.is_ascii() {
            return Err(Error::NonAscii);
        }
        let mut iter = s.split(' ').fuse();

        let mut res = RawBoard {
            cells: parse_cells(iter.next().ok_or(Error::NoBoard)?)?,
            ..RawBoard::empty()
        };
        res.side = Color::from_str(iter.next().ok_or(Error::NoMoveSide)?)?;
        let (castle, rook_files) = parse_castling(iter.next().ok_or(Error::NoCastling)?, &res)?;
        res.castle = castle;
        res.rook_files = rook_files;
        res.ep_file = parse_ep_file(iter.next().ok_or(Error::NoEnpassant)?, res.side)?;
        if let Some(s) = iter.next() {
            res.halfmove = u16::from_str(s).map_err(Error::Halfmove)?;
        }
        if let Some(s) = iter.next() {
            res.move_number = u16::from_str(s).map_err(Error::MoveNumber)?;
        }

        if iter.next().is_some() {
            return Err(Error::ExtraData);
        }

        Ok(res)
    }
}

impl FromStr for Board {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Board, Self::Err> {
        Ok(RawBoard::from_str(s)?.try_into()?)
    }
}

fn format_cells(cells: &[PieceCode; 64], f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for rank in Rank::iter() {
        if rank.index() != 0 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for file in File::iter() {
            let code = cells[Coord::from_parts(file, rank).index()];
            if code.is_empty() {
                empty += 1;
                continue;
            }
            if empty != 0 {
                write!(f, "{}", (b'0' + empty) as char)?;
                empty = 0;
            }
            write!(f, "{}", code)?;
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

fn format_castling(raw: &RawBoard, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    if raw.castle.is_empty() {
        return write!(f, "-");
    }
    let classic = raw.rook_files == [File::A, File::H];
    for color in Color::iter() {
        for side in [CastleSide::HSide, CastleSide::ASide] {
            if !raw.castle.has(color, side) {
                continue;
            }
            let ch = match (classic, side) {
                (true, CastleSide::HSide) => 'k',
                (true, CastleSide::ASide) => 'q',
                (false, _) => raw.rook_files[side.index()].as_char(),
            };
            match color {
                Color::White => write!(f, "{}", ch.to_ascii_uppercase())?,
                Color::Black => write!(f, "{}", ch)?,
            }
        }
    }
    Ok(())
}

impl Display for RawBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.cells, f)?;
        write!(f, " {} ", self.side)?;
        format_castling(self, f)?;
        match self.ep_dest() {
            Some(p) => write!(f, " {}", p)?,
            None => write!(f, " -")?,
        };
        write!(f, " {} {}", self.halfmove, self.move_number)?;
        Ok(())
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        self.raw().fmt(f)
    }
}
