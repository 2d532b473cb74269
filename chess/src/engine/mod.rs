//! Alpha-beta search over a transposition table
//!
//! The [`Engine`] owns a board, an arena for the move lists of all the plies, a
//! [`TranspositionTable`](tt::TranspositionTable) and an evaluator. Searches run on the
//! calling thread and stop cooperatively on the limits given in [`SearchParams`].

pub mod eval;
pub mod tt;

mod order;
mod search;

use crate::board::Board;
use crate::moves::{Move, MAX_MOVES};
use crate::movegen::legal;

use eval::{Evaluate, Score};
use search::Searcher;
use tt::{TableError, TranspositionTable};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

/// Maximum distance from the root, in plies, that the search may reach
pub const MAX_PLY: usize = 64;

/// Maximum depth of the main search, leaving room for quiescence
pub const MAX_DEPTH: usize = MAX_PLY / 2;

/// Score of being mated right now
///
/// Being mated in `n` plies from the root scores `-(MATE - n)`.
pub const MATE: Score = 30_000;

/// Scores at least this large in absolute value denote forced mates
pub const MATE_BOUND: Score = MATE - MAX_PLY as Score;

/// Larger than any score returned by the search
pub const INF: Score = MATE + 1;

/// Minimum number of moves in the move arena of an [`Engine`]
pub const MIN_MOVE_BUFFER: usize = MAX_PLY * MAX_MOVES;

/// Error creating an [`Engine`]
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum EngineError {
    /// Move arena cannot hold the lists for all the plies
    #[error("move buffer holds {got} moves, need at least {need}")]
    MoveBuffer { got: usize, need: usize },
    /// Board cannot make enough moves for a full-depth search
    #[error("state stack has room for {got} more moves, need at least {need}")]
    StateStack { got: usize, need: usize },
    /// Error creating the transposition table
    #[error("bad transposition table: {0}")]
    Table(#[from] TableError),
}

type StopFn = dyn Fn() -> bool + Send + Sync;

/// Limits of a single search
///
/// ```
/// use kestrel::SearchParams;
/// use std::time::Duration;
///
/// let params = SearchParams::new().max_depth(8).nodes(1_000_000).time(Duration::from_secs(2));
/// assert_eq!(params.depth(), 8);
/// ```
#[derive(Clone)]
pub struct SearchParams {
    max_depth: usize,
    nodes: Option<u64>,
    deadline: Option<Instant>,
    stop: Option<Arc<StopFn>>,
}

impl SearchParams {
    /// Default depth limit when none is given
    pub const DEFAULT_DEPTH: usize = 6;

    pub fn new() -> SearchParams {
        SearchParams {
            max_depth: Self::DEFAULT_DEPTH,
            nodes: None,
            deadline: None,
            stop: None,
        }
    }

    /// Sets the maximum depth, clamped into `1..=MAX_DEPTH`
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.clamp(1, MAX_DEPTH);
        self
    }

    /// Stops the search after visiting `nodes` nodes
    pub fn nodes(mut self, nodes: u64) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Stops the search at `deadline`
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stops the search after `time` from now
    pub fn time(self, time: Duration) -> Self {
        self.deadline(Instant::now() + time)
    }

    /// Stops the search once `stop` returns `true`
    ///
    /// The predicate is polled periodically, so it may be shared with another thread, for
    /// example to read an atomic flag.
    pub fn stop_when(mut self, stop: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.stop = Some(Arc::new(stop));
        self
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn node_limit(&self) -> Option<u64> {
        self.nodes
    }

    /// Returns `true` if the deadline passed or the stop predicate fired
    pub fn is_stopped(&self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        self.stop.as_ref().map_or(false, |stop| stop())
    }
}

impl Default for SearchParams {
    fn default() -> SearchParams {
        SearchParams::new()
    }
}

impl fmt::Debug for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchParams")
            .field("max_depth", &self.max_depth)
            .field("nodes", &self.nodes)
            .field("deadline", &self.deadline)
            .field("stop", &self.stop.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Outcome of a search
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move found, or `None` if the game is over
    pub best_move: Option<Move>,
    /// Score of the best move for the side to move
    pub score: Score,
    /// Number of visited nodes, over all the iterations
    pub nodes: u64,
    /// Depth of the last completed iteration
    pub depth: usize,
    /// Whether the search stopped on a limit before reaching the maximum depth
    pub aborted: bool,
}

impl SearchResult {
    /// Number of moves until mate if the score is a forced mate
    ///
    /// Positive values mean that the side to move gives mate, negative ones that it's mated.
    pub fn mate_in(&self) -> Option<i32> {
        if self.score >= MATE_BOUND {
            Some((MATE - self.score + 1) / 2)
        } else if self.score <= -MATE_BOUND {
            Some(-(MATE + self.score) / 2)
        } else {
            None
        }
    }
}

/// Searches for the best move in a position
pub struct Engine<E> {
    board: Board,
    moves: Box<[Move]>,
    table: TranspositionTable,
    eval: E,
}

impl<E: Evaluate> Engine<E> {
    /// Creates an engine with a table of `2^table_bits` entries
    pub fn new(board: Board, eval: E, table_bits: u32) -> Result<Engine<E>, EngineError> {
        let moves = vec![Move::NULL; MIN_MOVE_BUFFER].into_boxed_slice();
        let table = TranspositionTable::new(table_bits)?;
        Engine::with_buffers(board, eval, moves, table)
    }

    /// Creates an engine over buffers allocated by the caller
    ///
    /// Fails if `moves` is shorter than [`MIN_MOVE_BUFFER`] or the state stack of `board`
    /// cannot take [`MAX_PLY`] more moves.
    pub fn with_buffers(
        board: Board,
        eval: E,
        moves: Box<[Move]>,
        table: TranspositionTable,
    ) -> Result<Engine<E>, EngineError> {
        if moves.len() < MIN_MOVE_BUFFER {
            return Err(EngineError::MoveBuffer {
                got: moves.len(),
                need: MIN_MOVE_BUFFER,
            });
        }
        check_stack(&board)?;
        Ok(Engine {
            board,
            moves,
            table,
            eval,
        })
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Replaces the position to search
    pub fn set_board(&mut self, board: Board) -> Result<(), EngineError> {
        check_stack(&board)?;
        self.board = board;
        Ok(())
    }

    /// Makes the move `mv` on the engine board
    ///
    /// The move must be legal. Fails if the board would not have room for a full-depth search
    /// afterwards.
    pub fn make_move(&mut self, mv: Move) -> Result<(), EngineError> {
        if self.board.stack().remaining() <= MAX_PLY {
            return Err(EngineError::StateStack {
                got: self.board.stack().remaining().saturating_sub(1),
                need: MAX_PLY,
            });
        }
        self.board.make_move(mv);
        Ok(())
    }

    #[inline]
    pub fn table(&self) -> &TranspositionTable {
        &self.table
    }

    #[inline]
    pub fn eval(&self) -> &E {
        &self.eval
    }

    /// Forgets everything learned in previous searches
    pub fn clear_table(&mut self) {
        self.table.clear();
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    /// Runs iterative deepening from depth 1 up to the maximum depth in `params`
    ///
    /// On abort, returns the result of the last completed iteration. If even the first
    /// iteration was not completed, returns the best of the root moves searched so far, or
    /// any legal move.
    pub fn search(&mut self, params: &SearchParams) -> SearchResult {
        let started = Instant::now();
        let root_moves = legal::gen_all(&self.board);
        if root_moves.is_empty() {
            let score = if self.board.is_check() { -MATE } else { 0 };
            info!("no legal moves, score {}", score);
            return SearchResult {
                best_move: None,
                score,
                nodes: 0,
                depth: 0,
                aborted: false,
            };
        }

        self.table.new_search();
        let mut searcher = Searcher::new(&mut self.board, &mut self.table, &self.eval, params);
        let mut res = SearchResult {
            best_move: None,
            score: 0,
            nodes: 0,
            depth: 0,
            aborted: false,
        };

        for depth in 1..=params.depth() {
            if depth > 1 && searcher.should_stop() {
                res.aborted = true;
                break;
            }
            let best = searcher.root(&mut self.moves, depth, res.best_move);
            if searcher.aborted {
                res.aborted = true;
                if res.best_move.is_none() {
                    res.best_move = best.map(|(mv, _)| mv).or(Some(root_moves[0]));
                    res.score = best.map_or(0, |(_, score)| score);
                    warn!(
                        "search aborted before completing depth 1, falling back to {}",
                        res.best_move.unwrap_or(Move::NULL)
                    );
                }
                break;
            }
            if let Some((mv, score)) = best {
                res.best_move = Some(mv);
                res.score = score;
                res.depth = depth;
            }
            debug!(
                "depth {} score {} nodes {} best {}",
                depth,
                res.score,
                searcher.nodes,
                res.best_move.unwrap_or(Move::NULL)
            );
            if res.score.abs() >= MATE_BOUND && MATE - res.score.abs() <= depth as Score {
                break;
            }
        }
        res.nodes = searcher.nodes;

        let stats = self.table.stats();
        info!(
            "search done: depth {} score {} nodes {} time {:?} best {} table hits {}/{}",
            res.depth,
            res.score,
            res.nodes,
            started.elapsed(),
            res.best_move.unwrap_or(Move::NULL),
            stats.hits,
            stats.probes
        );
        res
    }
}

fn check_stack(board: &Board) -> Result<(), EngineError> {
    let got = board.stack().remaining();
    if got < MAX_PLY {
        return Err(EngineError::StateStack {
            got,
            need: MAX_PLY,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::eval::Material;
    use super::*;
    use crate::board::RawBoard;
    use crate::state::StateStack;

    use std::sync::atomic::{AtomicBool, Ordering};

    fn engine(fen: &str) -> Engine<Material> {
        Engine::new(Board::from_fen(fen).unwrap(), Material::default(), 16).unwrap()
    }

    #[test]
    fn test_buffers() {
        let board = Board::initial();
        let table = TranspositionTable::new(4).unwrap();
        let short = vec![Move::NULL; MIN_MOVE_BUFFER - 1].into_boxed_slice();
        assert_eq!(
            Engine::with_buffers(board.clone(), Material::default(), short, table.clone()).err(),
            Some(EngineError::MoveBuffer {
                got: MIN_MOVE_BUFFER - 1,
                need: MIN_MOVE_BUFFER
            })
        );

        let shallow = Board::from_raw(RawBoard::initial(), 10).unwrap();
        assert!(matches!(
            Engine::new(shallow, Material::default(), 4).err(),
            Some(EngineError::StateStack { got: 9, .. })
        ));
        assert!(matches!(
            Engine::new(board.clone(), Material::default(), 0).err(),
            Some(EngineError::Table(TableError::BadSize(0)))
        ));

        let deep = Board::from_raw(RawBoard::initial(), StateStack::DEFAULT_CAPACITY).unwrap();
        assert!(Engine::new(deep, Material::default(), 4).is_ok());
    }

    #[test]
    fn test_mate_in_one() {
        let mut e = engine("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        let res = e.search(&SearchParams::new().max_depth(4));
        assert_eq!(res.best_move.unwrap().to_string(), "a1a8");
        assert_eq!(res.score, MATE - 1);
        assert_eq!(res.mate_in(), Some(1));
        assert!(!res.aborted);
    }

    #[test]
    fn test_mated() {
        let mut e = engine("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        let res = e.search(&SearchParams::new());
        assert_eq!(res.best_move, None);
        assert_eq!(res.score, -MATE);

        let mut e = engine("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let res = e.search(&SearchParams::new());
        assert_eq!(res.best_move, None);
        assert_eq!(res.score, 0);
    }

    #[test]
    fn test_mate_in_two() {
        // Back rank mate after a rook sacrifice
        let mut e = engine("r5k1/5ppp/8/8/8/8/4RPPP/4R1K1 w - - 0 1");
        let res = e.search(&SearchParams::new().max_depth(4));
        assert_eq!(res.score, MATE - 3);
        assert_eq!(res.mate_in(), Some(2));
        assert_eq!(res.depth, 3);
        assert_eq!(res.best_move.unwrap().to_string(), "e2e8");
    }

    #[test]
    fn test_wins_material() {
        let mut e = engine("4k3/8/8/3q4/8/8/3R4/3RK3 w - - 0 1");
        let res = e.search(&SearchParams::new().max_depth(3));
        assert_eq!(res.best_move.unwrap().to_string(), "d2d5");
        assert!(res.score > 300);
    }

    #[test]
    fn test_determinism() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let mut e = engine(fen);
        let params = SearchParams::new().max_depth(4);
        let first = e.search(&params);
        e.clear_table();
        let second = e.search(&params);
        assert_eq!(first, second);
        assert_eq!(e.board(), &Board::from_fen(fen).unwrap());

        let mut other = engine(fen);
        assert_eq!(other.search(&params), first);
    }

    #[test]
    fn test_board_restored() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut e = engine(fen);
        let before = e.board().clone();
        e.search(&SearchParams::new().max_depth(3));
        assert_eq!(e.board(), &before);
        e.search(&SearchParams::new().max_depth(6).nodes(5_000));
        assert_eq!(e.board(), &before);
    }

    #[test]
    fn test_node_budget() {
        let mut e = engine("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let res = e.search(&SearchParams::new().max_depth(20).nodes(2_000));
        assert!(res.aborted);
        assert!(res.nodes <= 2_001);
        assert!(res.depth >= 1);
        let mv = res.best_move.unwrap();
        assert!(legal::gen_all(e.board()).contains(&mv));

        let res = e.search(&SearchParams::new().max_depth(20).nodes(3));
        assert!(res.aborted);
        assert_eq!(res.depth, 0);
        assert!(legal::gen_all(e.board()).contains(&res.best_move.unwrap()));
    }

    #[test]
    fn test_stop_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let stop = flag.clone();
        let mut e = engine("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let params = SearchParams::new()
            .max_depth(30)
            .stop_when(move || stop.load(Ordering::Relaxed));
        let res = e.search(&params);
        assert!(res.aborted);
        assert!(res.best_move.is_some());
        assert!(res.depth <= 1);

        flag.store(false, Ordering::Relaxed);
        let res = e.search(&params.max_depth(2));
        assert!(!res.aborted);
        assert_eq!(res.depth, 2);
    }

    #[test]
    fn test_deadline() {
        let mut e = engine("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let res = e.search(&SearchParams::new().max_depth(30).deadline(Instant::now()));
        assert!(res.aborted);
        assert!(res.best_move.is_some());
    }

    #[test]
    fn test_repetition_draw() {
        // White is lost, but repeating the position for the third time saves the game
        let mut board = Board::from_fen("k7/2rr4/8/8/8/8/8/7K w - - 0 1").unwrap();
        for _ in 0..2 {
            for s in ["h1g2", "a8b8", "g2h1", "b8a8"] {
                let mv = board.parse_uci(s).unwrap();
                board.make_move(mv);
            }
        }
        let mut e = Engine::new(board, Material::default(), 16).unwrap();
        let res = e.search(&SearchParams::new().max_depth(2));
        assert_eq!(res.best_move.unwrap().to_string(), "h1g2");
        assert_eq!(res.score, 0);

        let mut e = engine("k7/2rr4/8/8/8/8/8/7K w - - 0 1");
        let res = e.search(&SearchParams::new().max_depth(2));
        assert!(res.score < -500);
    }

    #[test]
    fn test_fifty_moves() {
        let mut e = engine("k7/2rr4/8/8/8/8/8/7K w - - 99 80");
        let res = e.search(&SearchParams::new().max_depth(2));
        assert_eq!(res.score, 0);

        // Mate on the hundredth half-move still wins
        let mut e = engine("6k1/5ppp/8/8/8/8/8/R5K1 w - - 99 80");
        let res = e.search(&SearchParams::new().max_depth(2));
        assert_eq!(res.best_move.unwrap().to_string(), "a1a8");
        assert_eq!(res.score, MATE - 1);
    }

    #[test]
    fn test_fifty_moves_filled_table() {
        let mut e = engine("k7/2rr4/8/8/8/8/8/7K w - - 0 80");
        let res = e.search(&SearchParams::new().max_depth(3));
        assert!(res.score < -500);
        assert!(e.table().stats().stores > 0);

        let board = Board::from_fen("k7/2rr4/8/8/8/8/8/7K w - - 99 80").unwrap();
        e.set_board(board).unwrap();
        let res = e.search(&SearchParams::new().max_depth(2));
        assert_eq!(res.score, 0);
    }

    #[test]
    fn test_closure_eval() {
        let board = Board::from_fen("4k3/8/8/3q4/8/8/3R4/3RK3 w - - 0 1").unwrap();
        let eval = |b: &Board| {
            let m = Material::default();
            m.evaluate(b)
        };
        let mut e = Engine::new(board, eval, 12).unwrap();
        let res = e.search(&SearchParams::new().max_depth(2));
        assert_eq!(res.best_move.unwrap().to_string(), "d2d5");
        assert!(e.table().stats().stores > 0);
    }
}
