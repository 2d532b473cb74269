use crate::types::{Coord, PieceMask};

/// One of the eight directions a piece can slide in
///
/// Directions are named from White's point of view: [`Dir::North`] points towards the eighth
/// rank. Cardinal directions come first, so `index() < 4` means a rook-like direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Dir {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    NorthEast = 4,
    NorthWest = 5,
    SouthEast = 6,
    SouthWest = 7,
}

impl Dir {
    pub const COUNT: usize = 8;

    pub const CARDINALS: [Dir; 4] = [Dir::North, Dir::South, Dir::East, Dir::West];
    pub const DIAGONALS: [Dir; 4] = [
        Dir::NorthEast,
        Dir::NorthWest,
        Dir::SouthEast,
        Dir::SouthWest,
    ];

    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const fn from_index(val: usize) -> Dir {
        match val {
            0 => Dir::North,
            1 => Dir::South,
            2 => Dir::East,
            3 => Dir::West,
            4 => Dir::NorthEast,
            5 => Dir::NorthWest,
            6 => Dir::SouthEast,
            7 => Dir::SouthWest,
            _ => panic!("direction index must be between 0 and 7"),
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Self::from_index)
    }

    pub const fn is_cardinal(&self) -> bool {
        self.index() < 4
    }

    pub const fn is_diagonal(&self) -> bool {
        self.index() >= 4
    }

    pub const fn opposite(&self) -> Dir {
        match *self {
            Dir::North => Dir::South,
            Dir::South => Dir::North,
            Dir::East => Dir::West,
            Dir::West => Dir::East,
            Dir::NorthEast => Dir::SouthWest,
            Dir::NorthWest => Dir::SouthEast,
            Dir::SouthEast => Dir::NorthWest,
            Dir::SouthWest => Dir::NorthEast,
        }
    }

    /// Step of the direction as `(delta_file, delta_rank)` in index space
    pub const fn step(&self) -> (isize, isize) {
        match *self {
            Dir::North => (0, -1),
            Dir::South => (0, 1),
            Dir::East => (1, 0),
            Dir::West => (-1, 0),
            Dir::NorthEast => (1, -1),
            Dir::NorthWest => (-1, -1),
            Dir::SouthEast => (1, 1),
            Dir::SouthWest => (-1, 1),
        }
    }

    /// Change of the square index after one step
    pub const fn delta(&self) -> isize {
        let (df, dr) = self.step();
        dr * 8 + df
    }

    /// Returns `true` if walking in this direction increases the square index
    pub const fn is_increasing(&self) -> bool {
        self.delta() > 0
    }

    /// Piece capability needed to slide along this direction
    pub const fn slider_mask(&self) -> PieceMask {
        if self.is_cardinal() {
            PieceMask::CARDINAL
        } else {
            PieceMask::DIAGONAL
        }
    }

    /// Returns the neighbouring square in this direction, if it is on the board
    pub fn next(&self, c: Coord) -> Option<Coord> {
        let (df, dr) = self.step();
        c.shift(df, dr)
    }
}
