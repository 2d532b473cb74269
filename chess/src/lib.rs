//! Playing core of a chess engine
//!
//! The crate contains the board with incremental make/unmake, legal and pseudo-legal move
//! generation, Zobrist hashing, and an alpha-beta search over a transposition table.
//!
//! # Example
//!
//! ```
//! use kestrel::{Board, Engine, SearchParams};
//! use kestrel::eval::Material;
//!
//! let mut board = Board::initial();
//! assert_eq!(board.perft(2), 400);
//!
//! let mv = board.parse_uci("e2e4").unwrap();
//! board.make_move(mv);
//!
//! let mut engine = Engine::new(board, Material::default(), 16).unwrap();
//! let res = engine.search(&SearchParams::new().max_depth(3));
//! assert!(res.best_move.is_some());
//! ```

pub mod attack;
pub mod board;
pub mod castling;
pub mod engine;
pub mod generic;
pub mod make;
pub mod movegen;
pub mod moves;
pub mod perft;
pub mod state;
pub mod zobrist;

pub mod types {
    pub use kestrel_base::dir::Dir;
    pub use kestrel_base::types::*;
}

pub use kestrel_base::{bitboard, bitboard_consts, geometry};

pub use bitboard::Bitboard;
pub use board::{Board, FenParseError, InvariantError, RawBoard, ValidateError};
pub use engine::eval::{self, Evaluate, Score};
pub use engine::{Engine, EngineError, SearchParams, SearchResult};
pub use moves::{Move, MoveArray, MoveList, MoveTag};
pub use state::{CastleRights, PackedState, State, StateStack};
pub use types::{CastleSide, Color, Coord, File, PieceCode, PieceKind, PieceMask, Rank};
