//! Type-level colors
//!
//! Move generation is monomorphized over the side to move, so the color-dependent constants
//! below fold away at compile time.

use crate::types::{self, Rank};
use kestrel_base::geometry;

pub trait Color {
    const COLOR: types::Color;
    const FORWARD: isize;
    const DOUBLE_PUSH_RANK: Rank;
    const PROMOTE_RANK: Rank;
    const EP_SRC_RANK: Rank;
    type Inv: Color;
}

pub struct White;
pub struct Black;

impl Color for White {
    const COLOR: types::Color = types::Color::White;
    const FORWARD: isize = geometry::pawn_forward_delta(types::Color::White);
    const DOUBLE_PUSH_RANK: Rank = geometry::double_push_rank(types::Color::White);
    const PROMOTE_RANK: Rank = geometry::promote_rank(types::Color::White);
    const EP_SRC_RANK: Rank = geometry::enpassant_src_rank(types::Color::White);
    type Inv = Black;
}

impl Color for Black {
    const COLOR: types::Color = types::Color::Black;
    const FORWARD: isize = geometry::pawn_forward_delta(types::Color::Black);
    const DOUBLE_PUSH_RANK: Rank = geometry::double_push_rank(types::Color::Black);
    const PROMOTE_RANK: Rank = geometry::promote_rank(types::Color::Black);
    const EP_SRC_RANK: Rank = geometry::enpassant_src_rank(types::Color::Black);
    type Inv = White;
}
