use std::fmt::{self, Display};
use std::hint;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordParseError {
    #[error("unexpected file char {0:?}")]
    UnexpectedFileChar(char),
    #[error("unexpected rank char {0:?}")]
    UnexpectedRankChar(char),
    #[error("invalid string length")]
    BadLength,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PieceCodeParseError {
    #[error("unexpected piece char {0:?}")]
    UnexpectedChar(char),
    #[error("invalid string length")]
    BadLength,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("unexpected color char {0:?}")]
    UnexpectedChar(char),
    #[error("invalid string length")]
    BadLength,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl File {
    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Self {
        match val {
            0 => File::A,
            1 => File::B,
            2 => File::C,
            3 => File::D,
            4 => File::E,
            5 => File::F,
            6 => File::G,
            7 => File::H,
            _ => hint::unreachable_unchecked(),
        }
    }

    pub const fn from_index(val: usize) -> Self {
        assert!(val < 8, "file index must be between 0 and 7");
        unsafe { Self::from_index_unchecked(val) }
    }

    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..8).map(|x| unsafe { Self::from_index_unchecked(x) })
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='h' => Some(Self::from_index((u32::from(c) - u32::from('a')) as usize)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        (b'a' + *self as u8) as char
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

/// Rank of the board
///
/// Ranks are indexed from the eighth one, so [`Rank::R8`] has index 0.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum Rank {
    R8 = 0,
    R7 = 1,
    R6 = 2,
    R5 = 3,
    R4 = 4,
    R3 = 5,
    R2 = 6,
    R1 = 7,
}

impl Rank {
    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Self {
        match val {
            0 => Rank::R8,
            1 => Rank::R7,
            2 => Rank::R6,
            3 => Rank::R5,
            4 => Rank::R4,
            5 => Rank::R3,
            6 => Rank::R2,
            7 => Rank::R1,
            _ => hint::unreachable_unchecked(),
        }
    }

    pub const fn from_index(val: usize) -> Self {
        assert!(val < 8, "rank index must be between 0 and 7");
        unsafe { Self::from_index_unchecked(val) }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..8).map(|x| unsafe { Self::from_index_unchecked(x) })
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1'..='8' => Some(Self::from_index((u32::from('8') - u32::from(c)) as usize)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        (b'8' - *self as u8) as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

/// Location index of a square, between 0 and 63
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord(u8);

impl Coord {
    pub const fn from_index(val: usize) -> Coord {
        assert!(val < 64, "coord must be between 0 and 63");
        Coord(val as u8)
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Coord {
        Coord(val as u8)
    }

    pub const fn from_parts(file: File, rank: Rank) -> Coord {
        Coord(((rank as u8) << 3) | file as u8)
    }

    pub const fn file(&self) -> File {
        unsafe { File::from_index_unchecked((self.0 & 7) as usize) }
    }

    pub const fn rank(&self) -> Rank {
        unsafe { Rank::from_index_unchecked((self.0 >> 3) as usize) }
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    pub const fn flipped_rank(self) -> Coord {
        Coord(self.0 ^ 56)
    }

    pub const fn with_file(self, file: File) -> Coord {
        Coord((self.0 & !7) | file as u8)
    }

    pub const fn add(self, delta: isize) -> Coord {
        Coord::from_index(self.index().wrapping_add(delta as usize))
    }

    pub const unsafe fn add_unchecked(self, delta: isize) -> Coord {
        Coord::from_index_unchecked(self.index().wrapping_add(delta as usize))
    }

    /// Shifts the coordinate by the given number of files and ranks
    ///
    /// Returns `None` if the result falls off the board. Positive `delta_rank` moves towards
    /// the first rank.
    pub fn shift(self, delta_file: isize, delta_rank: isize) -> Option<Coord> {
        let new_file = self.file().index().wrapping_add(delta_file as usize);
        let new_rank = self.rank().index().wrapping_add(delta_rank as usize);
        if new_file >= 8 || new_rank >= 8 {
            return None;
        }
        Some(Coord::from_parts(
            File::from_index(new_file),
            Rank::from_index(new_rank),
        ))
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0_u8..64_u8).map(Coord)
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.0 < 64 {
            return write!(f, "Coord({})", self);
        }
        write!(f, "Coord(?{:?})", self.0)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.file().as_char(), self.rank().as_char())
    }
}

impl FromStr for Coord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(CoordParseError::BadLength);
        }
        let (file_ch, rank_ch) = (bytes[0] as char, bytes[1] as char);
        Ok(Coord::from_parts(
            File::from_char(file_ch).ok_or(CoordParseError::UnexpectedFileChar(file_ch))?,
            Rank::from_char(rank_ch).ok_or(CoordParseError::UnexpectedRankChar(rank_ch))?,
        ))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const fn inv(&self) -> Color {
        match *self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        [Color::White, Color::Black].into_iter()
    }

    pub fn as_char(&self) -> char {
        match *self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 1 {
            return Err(ColorParseError::BadLength);
        }
        let ch = s.as_bytes()[0] as char;
        Color::from_char(ch).ok_or(ColorParseError::UnexpectedChar(ch))
    }
}

/// Kind of a chess piece, without color
///
/// The discriminants form a dense index used by lookup tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const COUNT: usize = 6;

    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const fn from_index(val: usize) -> PieceKind {
        match val {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            5 => PieceKind::King,
            _ => panic!("piece kind index must be between 0 and 5"),
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self::from_index)
    }

    /// Type bits of the kind, as stored inside a [`PieceCode`]
    pub const fn type_bits(&self) -> u8 {
        match *self {
            PieceKind::Pawn => PieceCode::PAWN,
            PieceKind::Knight => PieceCode::KNIGHT,
            PieceKind::King => PieceCode::KING,
            PieceKind::Bishop => PieceCode::BISHOP,
            PieceKind::Rook => PieceCode::ROOK,
            PieceKind::Queen => PieceCode::QUEEN,
        }
    }

    pub fn as_char(&self) -> char {
        b"pnbrqk"[self.index()] as char
    }
}

/// Piece type and color packed into one byte
///
/// The low nibble holds the type. Sliding pieces carry the [`PieceMask::DIAGONAL`] and
/// [`PieceMask::CARDINAL`] bits in it, so a queen is exactly the union of a bishop and a rook.
/// Bits `0x20` and `0x40` hold the color. [`PieceCode::EMPTY`] marks an empty square and
/// [`PieceCode::INVALID`] a square off the board; neither is ever a piece.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PieceCode(u8);

impl PieceCode {
    pub const PAWN: u8 = 0x01;
    pub const KNIGHT: u8 = 0x02;
    pub const KING: u8 = 0x03;
    pub const BISHOP: u8 = 0x04;
    pub const ROOK: u8 = 0x08;
    pub const QUEEN: u8 = 0x0c;
    pub const TYPE_MASK: u8 = 0x0f;
    pub const WHITE: u8 = 0x20;
    pub const BLACK: u8 = 0x40;
    pub const COLOR_MASK: u8 = 0x60;

    pub const EMPTY: PieceCode = PieceCode(0);
    pub const INVALID: PieceCode = PieceCode(0x80);

    /// Number of distinct pieces, i.e. the range of [`PieceCode::index()`]
    pub const COUNT: usize = 12;

    pub const fn new(color: Color, kind: PieceKind) -> PieceCode {
        PieceCode(Self::color_bits(color) | kind.type_bits())
    }

    pub const fn color_bits(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE,
            Color::Black => Self::BLACK,
        }
    }

    pub const fn from_raw(val: u8) -> PieceCode {
        PieceCode(val)
    }

    pub const fn as_raw(&self) -> u8 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_occupied(&self) -> bool {
        self.0 != 0
    }

    pub const fn color(&self) -> Option<Color> {
        match self.0 & Self::COLOR_MASK {
            Self::WHITE => Some(Color::White),
            Self::BLACK => Some(Color::Black),
            _ => None,
        }
    }

    pub const fn kind(&self) -> Option<PieceKind> {
        if self.0 & Self::INVALID.0 != 0 {
            return None;
        }
        match self.0 & Self::TYPE_MASK {
            Self::PAWN => Some(PieceKind::Pawn),
            Self::KNIGHT => Some(PieceKind::Knight),
            Self::KING => Some(PieceKind::King),
            Self::BISHOP => Some(PieceKind::Bishop),
            Self::ROOK => Some(PieceKind::Rook),
            Self::QUEEN => Some(PieceKind::Queen),
            _ => None,
        }
    }

    /// Returns `true` if the code has the given color
    pub const fn is(&self, color: Color) -> bool {
        self.0 & Self::color_bits(color) != 0
    }

    /// Returns `true` if the code is a piece of the given color and kind
    pub const fn is_piece(&self, color: Color, kind: PieceKind) -> bool {
        self.0 == Self::new(color, kind).0
    }

    /// Dense index between 0 and 11, suitable for table lookups
    ///
    /// The code must be a valid piece, otherwise the result is unspecified.
    pub const fn index(&self) -> usize {
        let color = if self.0 & Self::BLACK != 0 { 6 } else { 0 };
        let kind = match self.0 & Self::TYPE_MASK {
            Self::PAWN => 0,
            Self::KNIGHT => 1,
            Self::BISHOP => 2,
            Self::ROOK => 3,
            Self::QUEEN => 4,
            _ => 5,
        };
        color + kind
    }

    pub fn from_index(val: usize) -> PieceCode {
        assert!(val < Self::COUNT, "piece index must be between 0 and 11");
        let color = if val < 6 { Color::White } else { Color::Black };
        PieceCode::new(color, PieceKind::from_index(val % 6))
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self::from_index)
    }

    /// Returns the color mask of this piece, or an empty mask for empty squares
    pub const fn color_mask(&self) -> PieceMask {
        PieceMask(self.0 & Self::COLOR_MASK)
    }

    pub fn as_char(&self) -> char {
        match (self.color(), self.kind()) {
            (Some(Color::White), Some(kind)) => kind.as_char().to_ascii_uppercase(),
            (Some(Color::Black), Some(kind)) => kind.as_char(),
            _ => '.',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        if c == '.' {
            return Some(PieceCode::EMPTY);
        }
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(PieceCode::new(color, kind))
    }
}

impl fmt::Debug for PieceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if *self == Self::INVALID {
            return write!(f, "PieceCode(invalid)");
        }
        write!(f, "PieceCode({})", self.as_char())
    }
}

impl fmt::Display for PieceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for PieceCode {
    type Err = PieceCodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 1 {
            return Err(PieceCodeParseError::BadLength);
        }
        let ch = s.as_bytes()[0] as char;
        PieceCode::from_char(ch).ok_or(PieceCodeParseError::UnexpectedChar(ch))
    }
}

/// Set of piece capabilities tested against a [`PieceCode`]
///
/// A mask matches a code when every bit of the mask is present in the code, so
/// `PieceMask::CARDINAL.with_color(Color::Black)` matches black rooks and queens.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PieceMask(u8);

impl PieceMask {
    pub const NONE: PieceMask = PieceMask(0);
    pub const DIAGONAL: PieceMask = PieceMask(PieceCode::BISHOP);
    pub const CARDINAL: PieceMask = PieceMask(PieceCode::ROOK);
    pub const WHITE: PieceMask = PieceMask(PieceCode::WHITE);
    pub const BLACK: PieceMask = PieceMask(PieceCode::BLACK);

    pub const fn of_color(color: Color) -> PieceMask {
        PieceMask(PieceCode::color_bits(color))
    }

    pub const fn with_color(self, color: Color) -> PieceMask {
        PieceMask(self.0 | PieceCode::color_bits(color))
    }

    pub const fn union(self, other: PieceMask) -> PieceMask {
        PieceMask(self.0 | other.0)
    }

    pub const fn as_raw(&self) -> u8 {
        self.0
    }

    /// Returns `true` if every capability of the mask is present in `code`
    pub const fn matches(&self, code: PieceCode) -> bool {
        code.0 & Self::INVALID_BIT == 0 && code.0 & self.0 == self.0
    }

    /// Returns `true` if `code` shares at least one capability with the mask
    pub const fn intersects(&self, code: PieceCode) -> bool {
        code.0 & self.0 != 0
    }

    const INVALID_BIT: u8 = 0x80;
}

/// Side of the board where the castling rook stands relative to the king
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CastleSide {
    /// Towards file A (queenside in classical chess)
    ASide = 0,
    /// Towards file H (kingside in classical chess)
    HSide = 1,
}

impl CastleSide {
    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        [CastleSide::ASide, CastleSide::HSide].into_iter()
    }

    /// File where the king lands after castling
    pub const fn king_dst_file(&self) -> File {
        match *self {
            CastleSide::ASide => File::C,
            CastleSide::HSide => File::G,
        }
    }

    /// File where the rook lands after castling
    pub const fn rook_dst_file(&self) -> File {
        match *self {
            CastleSide::ASide => File::D,
            CastleSide::HSide => File::F,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file() {
        for (idx, file) in File::iter().enumerate() {
            assert_eq!(file.index(), idx);
            assert_eq!(File::from_index(idx), file);
            assert_eq!(File::from_char(file.as_char()), Some(file));
        }
    }

    #[test]
    fn test_rank() {
        for (idx, rank) in Rank::iter().enumerate() {
            assert_eq!(rank.index(), idx);
            assert_eq!(Rank::from_index(idx), rank);
            assert_eq!(Rank::from_char(rank.as_char()), Some(rank));
        }
    }

    #[test]
    fn test_coord() {
        let mut coords = Vec::new();
        for rank in Rank::iter() {
            for file in File::iter() {
                let coord = Coord::from_parts(file, rank);
                assert_eq!(coord.file(), file);
                assert_eq!(coord.rank(), rank);
                coords.push(coord);
            }
        }
        assert_eq!(coords, Coord::iter().collect::<Vec<_>>());

        let e4 = Coord::from_parts(File::E, Rank::R4);
        assert_eq!(e4.shift(1, -1), Some(Coord::from_parts(File::F, Rank::R5)));
        assert_eq!(e4.shift(4, 0), None);
        assert_eq!(e4.with_file(File::A), Coord::from_parts(File::A, Rank::R4));
    }

    #[test]
    fn test_coord_str() {
        assert_eq!(Coord::from_parts(File::B, Rank::R4).to_string(), "b4");
        assert_eq!(Coord::from_parts(File::A, Rank::R1).to_string(), "a1");
        assert_eq!(
            Coord::from_str("h8"),
            Ok(Coord::from_parts(File::H, Rank::R8))
        );
        assert_eq!(Coord::from_str("h9"), Err(CoordParseError::UnexpectedRankChar('9')));
        assert_eq!(Coord::from_str("i4"), Err(CoordParseError::UnexpectedFileChar('i')));
        assert_eq!(Coord::from_str("a"), Err(CoordParseError::BadLength));
    }

    #[test]
    fn test_piece_code() {
        assert_eq!(PieceCode::EMPTY.color(), None);
        assert_eq!(PieceCode::EMPTY.kind(), None);
        assert_eq!(PieceCode::INVALID.kind(), None);
        for (idx, code) in PieceCode::iter().enumerate() {
            assert_eq!(code.index(), idx);
            let (color, kind) = (code.color().unwrap(), code.kind().unwrap());
            assert_eq!(PieceCode::new(color, kind), code);
            assert!(code.is(color));
            assert!(!code.is(color.inv()));
            assert!(code.is_piece(color, kind));
        }
        let queen = PieceCode::new(Color::White, PieceKind::Queen);
        assert_eq!(
            queen.as_raw() & PieceCode::TYPE_MASK,
            PieceCode::BISHOP | PieceCode::ROOK
        );
    }

    #[test]
    fn test_piece_mask() {
        let white_rook = PieceCode::new(Color::White, PieceKind::Rook);
        let black_queen = PieceCode::new(Color::Black, PieceKind::Queen);
        let black_bishop = PieceCode::new(Color::Black, PieceKind::Bishop);
        let black_king = PieceCode::new(Color::Black, PieceKind::King);

        let black_cardinal = PieceMask::CARDINAL.with_color(Color::Black);
        assert!(!black_cardinal.matches(white_rook));
        assert!(black_cardinal.matches(black_queen));
        assert!(!black_cardinal.matches(black_bishop));
        assert!(!black_cardinal.matches(black_king));

        assert!(PieceMask::DIAGONAL.matches(black_bishop));
        assert!(PieceMask::DIAGONAL.matches(black_queen));
        assert!(!PieceMask::DIAGONAL.matches(PieceCode::INVALID));
        assert!(!PieceMask::DIAGONAL.matches(PieceCode::EMPTY));
        assert_eq!(black_king.color_mask(), PieceMask::BLACK);
        assert!(PieceMask::CARDINAL
            .union(PieceMask::DIAGONAL)
            .matches(black_queen));
    }

    #[test]
    fn test_piece_code_str() {
        for code in PieceCode::iter() {
            let s = code.to_string();
            assert_eq!(PieceCode::from_str(&s), Ok(code));
        }
        assert_eq!(PieceCode::from_str("."), Ok(PieceCode::EMPTY));
        assert_eq!(
            PieceCode::from_str("x"),
            Err(PieceCodeParseError::UnexpectedChar('x'))
        );
    }
}
