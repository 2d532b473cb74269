//! Move generator self-check by counting leaf nodes

use crate::board::Board;
use crate::make::MoveGuard;
use crate::moves::{Move, MoveList, MAX_MOVES};
use crate::movegen::legal;

fn do_perft(b: &mut Board, depth: usize, buf: &mut [Move]) -> u64 {
    let mut list = MoveList::new(buf);
    legal::gen_all_into(b, &mut list);
    if depth == 1 {
        return list.len() as u64;
    }
    let (moves, rest) = list.split();
    let mut res = 0;
    for &mv in moves.iter() {
        b.make_move(mv);
        res += do_perft(b, depth - 1, rest);
        b.unmake_move(mv);
    }
    res
}

impl Board {
    /// Counts the positions reachable in exactly `depth` plies
    ///
    /// Depth zero yields one node, the current position.
    pub fn perft(&mut self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let mut buf = vec![Move::NULL; depth * MAX_MOVES];
        do_perft(self, depth, &mut buf)
    }

    /// Splits the result of [`Board::perft()`] by the first move
    pub fn divide(&mut self, depth: usize) -> Vec<(Move, u64)> {
        if depth == 0 {
            return Vec::new();
        }
        let moves = legal::gen_all(self);
        let mut buf = vec![Move::NULL; depth * MAX_MOVES];
        moves
            .iter()
            .map(|&mv| {
                let mut guard = MoveGuard::new(self, mv);
                let count = match depth {
                    1 => 1,
                    _ => do_perft(guard.board_mut(), depth - 1, &mut buf),
                };
                (mv, count)
            })
            .collect()
    }
}
