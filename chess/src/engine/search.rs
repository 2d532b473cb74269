use super::eval::{Evaluate, Score};
use super::order;
use super::tt::{Bound, TranspositionTable};
use super::{SearchParams, INF, MATE, MATE_BOUND, MAX_PLY};
use crate::board::Board;
use crate::moves::{Move, MoveList};
use crate::movegen::legal;

/// Number of nodes between the checks of the deadline and the stop predicate
const CHECK_INTERVAL: u64 = 1024;

/// Converts a mate score relative to the root into the one relative to the node at `ply`
#[inline]
fn score_to_tt(score: Score, ply: usize) -> Score {
    if score >= MATE_BOUND {
        score + ply as Score
    } else if score <= -MATE_BOUND {
        score - ply as Score
    } else {
        score
    }
}

#[inline]
fn score_from_tt(score: Score, ply: usize) -> Score {
    if score >= MATE_BOUND {
        score - ply as Score
    } else if score <= -MATE_BOUND {
        score + ply as Score
    } else {
        score
    }
}

/// State of a single search
///
/// Every path that makes a move also unmakes it, including the early returns after the search
/// was aborted, so the board is left as it was before the search.
pub(super) struct Searcher<'a, E> {
    board: &'a mut Board,
    tt: &'a mut TranspositionTable,
    eval: &'a E,
    params: &'a SearchParams,
    root_ply: usize,
    pub nodes: u64,
    pub aborted: bool,
}

impl<'a, E: Evaluate> Searcher<'a, E> {
    pub fn new(
        board: &'a mut Board,
        tt: &'a mut TranspositionTable,
        eval: &'a E,
        params: &'a SearchParams,
    ) -> Self {
        let root_ply = board.ply();
        Searcher {
            board,
            tt,
            eval,
            params,
            root_ply,
            nodes: 0,
            aborted: false,
        }
    }

    #[inline]
    fn ply(&self) -> usize {
        self.board.ply() - self.root_ply
    }

    #[inline]
    fn evaluate(&self) -> Score {
        self.eval
            .evaluate(self.board)
            .clamp(-MATE_BOUND + 1, MATE_BOUND - 1)
    }

    /// Checks whether the external limits are exceeded
    pub fn should_stop(&self) -> bool {
        if let Some(limit) = self.params.nodes {
            if self.nodes >= limit {
                return true;
            }
        }
        self.params.is_stopped()
    }

    /// Counts the node and returns `true` if the search must be aborted
    #[inline]
    fn tick(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        self.nodes += 1;
        if let Some(limit) = self.params.nodes {
            if self.nodes > limit {
                self.aborted = true;
            }
        }
        if self.nodes % CHECK_INTERVAL == 0 && self.params.is_stopped() {
            self.aborted = true;
        }
        self.aborted
    }

    /// Returns the score of a node drawn by the fifty-move rule
    ///
    /// The halfmove clock is not part of the key, so this must be settled before probing the
    /// table. Checkmate on the hundredth half-move is still a loss.
    fn fifty_moves_score(&self, ply: usize) -> Option<Score> {
        if !self.board.is_fifty_moves() {
            return None;
        }
        if self.board.is_check() && !legal::has_moves(self.board) {
            return Some(-(MATE - ply as Score));
        }
        Some(0)
    }

    /// Searches the root position to `depth`, trying `hint` first
    ///
    /// On abort, returns the best move among the ones searched completely.
    pub fn root(&mut self, buf: &mut [Move], depth: usize, hint: Option<Move>) -> Option<(Move, Score)> {
        let mut list = MoveList::new(buf);
        legal::gen_all_into(self.board, &mut list);
        let hash_move = hint.or_else(|| self.tt.probe(self.board.key()).and_then(|e| e.mv));
        order::sort_moves(self.board, list.as_mut_slice(), hash_move);
        let (moves, rest) = list.split();

        let mut alpha = -INF;
        let mut best: Option<(Move, Score)> = None;
        for &mv in moves.iter() {
            self.board.make_move(mv);
            let score = -self.alpha_beta(rest, depth - 1, -INF, -alpha);
            self.board.unmake_move(mv);
            if self.aborted {
                break;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
            }
            alpha = alpha.max(score);
        }

        if !self.aborted {
            if let Some((mv, score)) = best {
                self.tt
                    .store(self.board.key(), depth as u8, score, Bound::Exact, Some(mv));
            }
        }
        best
    }

    fn alpha_beta(&mut self, buf: &mut [Move], depth: usize, mut alpha: Score, beta: Score) -> Score {
        if depth == 0 {
            return self.quiesce(buf, alpha, beta);
        }
        if self.tick() {
            return 0;
        }
        let ply = self.ply();
        if self.board.threefold() {
            return 0;
        }
        if ply >= MAX_PLY {
            return self.evaluate();
        }
        if let Some(score) = self.fifty_moves_score(ply) {
            return score;
        }

        let key = self.board.key();
        let mut hash_move = None;
        if let Some(entry) = self.tt.probe(key) {
            hash_move = entry.mv;
            if entry.depth as usize >= depth {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower if score >= beta => return score,
                    Bound::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        let mut list = MoveList::new(buf);
        legal::gen_all_into(self.board, &mut list);
        if list.is_empty() {
            return if self.board.is_check() {
                -(MATE - ply as Score)
            } else {
                0
            };
        }
        order::sort_moves(self.board, list.as_mut_slice(), hash_move);
        let (moves, rest) = list.split();

        let alpha_orig = alpha;
        let mut best = -INF;
        let mut best_move = None;
        for &mv in moves.iter() {
            self.board.make_move(mv);
            let score = -self.alpha_beta(rest, depth - 1, -beta, -alpha);
            self.board.unmake_move(mv);
            if self.aborted {
                return 0;
            }
            if score > best {
                best = score;
                best_move = Some(mv);
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        let bound = if best <= alpha_orig {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt
            .store(key, depth as u8, score_to_tt(best, ply), bound, best_move);
        best
    }

    /// Resolves captures until the position is quiet
    ///
    /// When in check, all the evasions are searched instead, so mates are not missed.
    fn quiesce(&mut self, buf: &mut [Move], mut alpha: Score, beta: Score) -> Score {
        if self.tick() {
            return 0;
        }
        let ply = self.ply();
        if self.board.threefold() {
            return 0;
        }
        if ply >= MAX_PLY {
            return self.evaluate();
        }
        if let Some(score) = self.fifty_moves_score(ply) {
            return score;
        }

        let mut list = MoveList::new(buf);
        let mut best = -INF;
        if self.board.is_check() {
            legal::gen_all_into(self.board, &mut list);
            if list.is_empty() {
                return -(MATE - ply as Score);
            }
        } else {
            best = self.evaluate();
            if best >= beta {
                return best;
            }
            alpha = alpha.max(best);
            legal::gen_captures_into(self.board, &mut list);
        }
        order::sort_moves(self.board, list.as_mut_slice(), None);
        let (moves, rest) = list.split();

        for &mv in moves.iter() {
            self.board.make_move(mv);
            let score = -self.quiesce(rest, -beta, -alpha);
            self.board.unmake_move(mv);
            if self.aborted {
                return 0;
            }
            if score > best {
                best = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_scores() {
        let score = MATE - 7;
        assert_eq!(score_from_tt(score_to_tt(score, 3), 3), score);
        assert_eq!(score_to_tt(score, 3), MATE - 4);
        assert_eq!(score_to_tt(-score, 3), -(MATE - 4));
        assert_eq!(score_to_tt(150, 3), 150);
        assert_eq!(score_from_tt(-150, 9), -150);
    }
}
