use super::base::Move;

use std::ops::{Deref, DerefMut};
use std::slice;

use arrayvec::ArrayVec;

/// Upper bound on the number of moves in any legal chess position
///
/// The known maximum is 218, so a list of this capacity never overflows.
pub const MAX_MOVES: usize = 256;

/// Sink for generated moves
pub trait MovePush {
    fn push(&mut self, m: Move);
}

/// Ordered list of moves backed by a buffer that belongs to the caller
///
/// The list never grows: its capacity is the length of the buffer. Search code carves one
/// large arena into consecutive lists, one per ply, using [`MoveList::split`].
///
/// # Panics
///
/// Adding a move to a full list is a contract violation and panics.
#[derive(Debug)]
pub struct MoveList<'a> {
    buf: &'a mut [Move],
    len: usize,
}

impl<'a> MoveList<'a> {
    #[inline]
    pub fn new(buf: &'a mut [Move]) -> MoveList<'a> {
        MoveList { buf, len: 0 }
    }

    #[inline]
    pub fn add(&mut self, mv: Move) {
        assert!(
            self.len < self.buf.len(),
            "move list overflow (capacity {})",
            self.buf.len()
        );
        self.buf[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns a view over the moves with indices in `start..end`
    ///
    /// # Panics
    ///
    /// Panics if the range is out of `0..len()`.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &[Move] {
        &self.as_slice()[start..end]
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.buf[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Move> {
        self.as_slice().iter()
    }

    /// Consumes the list, returning the filled moves and the unused rest of the buffer
    ///
    /// The rest can back the list of the next ply while the moves of this one are still
    /// being iterated.
    #[inline]
    pub fn split(self) -> (&'a mut [Move], &'a mut [Move]) {
        self.buf.split_at_mut(self.len)
    }
}

impl<'a, 'b> IntoIterator for &'b MoveList<'a> {
    type Item = &'b Move;
    type IntoIter = slice::Iter<'b, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> MovePush for MoveList<'a> {
    #[inline]
    fn push(&mut self, m: Move) {
        self.add(m);
    }
}

/// Self-contained move list with room for any legal position
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct MoveArray(ArrayVec<Move, MAX_MOVES>);

impl MoveArray {
    pub fn new() -> MoveArray {
        MoveArray(ArrayVec::new())
    }
}

impl Deref for MoveArray {
    type Target = ArrayVec<Move, MAX_MOVES>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MoveArray {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a MoveArray {
    type Item = &'a Move;
    type IntoIter = slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl MovePush for MoveArray {
    #[inline]
    fn push(&mut self, m: Move) {
        self.0.push(m);
    }
}

impl<const N: usize> MovePush for ArrayVec<Move, N> {
    #[inline]
    fn push(&mut self, m: Move) {
        ArrayVec::push(self, m);
    }
}

impl MovePush for Vec<Move> {
    #[inline]
    fn push(&mut self, m: Move) {
        Vec::push(self, m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coord;

    fn mv(from: usize, to: usize) -> Move {
        Move::normal(Coord::from_index(from), Coord::from_index(to))
    }

    #[test]
    fn test_add_slice() {
        let mut buf = [Move::NULL; 8];
        let mut list = MoveList::new(&mut buf);
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 8);
        for i in 0..5 {
            list.add(mv(i, i + 8));
        }
        assert_eq!(list.len(), 5);
        assert_eq!(list.slice(1, 3), &[mv(1, 9), mv(2, 10)]);
        assert_eq!(list.iter().count(), 5);

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.capacity(), 8);
    }

    #[test]
    fn test_split() {
        let mut buf = [Move::NULL; 8];
        let mut list = MoveList::new(&mut buf);
        list.add(mv(0, 1));
        list.add(mv(2, 3));
        let (done, rest) = list.split();
        assert_eq!(done, &[mv(0, 1), mv(2, 3)]);
        let mut next = MoveList::new(rest);
        assert_eq!(next.capacity(), 6);
        next.add(mv(4, 5));
        assert_eq!(done.len(), 2);
        assert_eq!(next.as_slice(), &[mv(4, 5)]);
    }

    #[test]
    #[should_panic(expected = "move list overflow")]
    fn test_overflow() {
        let mut buf = [Move::NULL; 2];
        let mut list = MoveList::new(&mut buf);
        list.add(mv(0, 1));
        list.add(mv(0, 2));
        list.add(mv(0, 3));
    }
}
