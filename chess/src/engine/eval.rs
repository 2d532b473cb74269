//! Static evaluation of positions

use crate::bitboard_consts;
use crate::board::Board;
use crate::types::{Color, Coord, File, PieceKind};

/// Score in centipawns, from the point of view of the side to move
pub type Score = i32;

/// Static evaluation used by the search at its leaves
///
/// The evaluation must be a pure function of the position: the same board always yields the
/// same score. Positive scores are good for the side to move.
///
/// Any function or closure of type `Fn(&Board) -> Score` is also an evaluator.
pub trait Evaluate {
    fn evaluate(&self, b: &Board) -> Score;
}

impl<F: Fn(&Board) -> Score> Evaluate for F {
    #[inline]
    fn evaluate(&self, b: &Board) -> Score {
        self(b)
    }
}

#[rustfmt::skip]
const PAWN_SQUARES: [Score; 64] = [
     0,  0,   0,   0,   0,   0,  0,  0,
    50, 50,  50,  50,  50,  50, 50, 50,
    10, 10,  20,  30,  30,  20, 10, 10,
     5,  5,  10,  25,  25,  10,  5,  5,
     0,  0,   0,  20,  20,   0,  0,  0,
     5, -5, -10,   0,   0, -10, -5,  5,
     5, 10,  10, -20, -20,  10, 10,  5,
     0,  0,   0,   0,   0,   0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_SQUARES: [Score; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_SQUARES: [Score; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_SQUARES: [Score; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_SQUARES: [Score; 64] = [
    -20, -10, -10, -5, -5, -10, -10, -20,
    -10,   0,   0,  0,  0,   0,   0, -10,
    -10,   0,   5,  5,  5,   5,   0, -10,
     -5,   0,   5,  5,  5,   5,   0,  -5,
      0,   0,   5,  5,  5,   5,   0,  -5,
    -10,   5,   5,  5,  5,   5,   0, -10,
    -10,   0,   5,  0,  0,   0,   0, -10,
    -20, -10, -10, -5, -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_SQUARES: [Score; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];

/// Piece-square tables, indexed by [`PieceKind::index()`]
///
/// Tables are laid out from White's point of view, with the eighth rank first.
const SQUARES: [&[Score; 64]; PieceKind::COUNT] = [
    &PAWN_SQUARES,
    &KNIGHT_SQUARES,
    &BISHOP_SQUARES,
    &ROOK_SQUARES,
    &QUEEN_SQUARES,
    &KING_SQUARES,
];

#[inline]
fn square_index(c: Color, coord: Coord) -> usize {
    match c {
        Color::White => coord.index(),
        Color::Black => coord.flipped_rank().index(),
    }
}

/// Material and piece-square evaluator
///
/// Besides material and piece placement, it penalizes doubled pawns and rewards the bishop
/// pair. All the weights are public and may be tuned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Piece values, indexed by [`PieceKind::index()`]
    pub values: [Score; PieceKind::COUNT],
    /// Penalty for each pawn standing on the same file as another pawn of its color
    pub doubled_pawn: Score,
    /// Bonus for having two or more bishops
    pub bishop_pair: Score,
}

impl Material {
    /// Returns the value of the piece of kind `kind`
    #[inline]
    pub fn value(&self, kind: PieceKind) -> Score {
        self.values[kind.index()]
    }

    /// Evaluates the position from White's point of view
    pub fn evaluate_white(&self, b: &Board) -> Score {
        self.side(b, Color::White) - self.side(b, Color::Black)
    }

    fn side(&self, b: &Board, c: Color) -> Score {
        let mut score = 0;
        for kind in PieceKind::iter() {
            let pieces = b.piece2(c, kind);
            score += pieces.popcount() as Score * self.value(kind);
            let table = SQUARES[kind.index()];
            score += pieces
                .into_iter()
                .map(|coord| table[square_index(c, coord)])
                .sum::<Score>();
        }

        let pawns = b.piece2(c, PieceKind::Pawn);
        for file in File::iter() {
            let count = (pawns & bitboard_consts::file(file)).popcount() as Score;
            if count > 1 {
                score -= count * self.doubled_pawn;
            }
        }

        if b.piece2(c, PieceKind::Bishop).has_many() {
            score += self.bishop_pair;
        }
        score
    }
}

impl Default for Material {
    fn default() -> Material {
        Material {
            values: [100, 320, 330, 500, 900, 0],
            doubled_pawn: 25,
            bishop_pair: 40,
        }
    }
}

impl Evaluate for Material {
    #[inline]
    fn evaluate(&self, b: &Board) -> Score {
        match b.side() {
            Color::White => self.evaluate_white(b),
            Color::Black => -self.evaluate_white(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial() {
        let eval = Material::default();
        let b = Board::initial();
        assert_eq!(eval.evaluate(&b), 0);
        let b = Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let white = eval.evaluate_white(&b);
        assert!(white > 0);
        assert_eq!(eval.evaluate(&b), -white);
    }

    #[test]
    fn test_symmetry() {
        let eval = Material::default();
        let b = Board::from_fen("r1bqk2r/ppp2ppp/2n2n2/3pp3/1b1PP3/2N2N2/PPP2PPP/R1BQKB1R w KQkq - 0 1")
            .unwrap();
        let mirror =
            Board::from_fen("r1bqkb1r/ppp2ppp/2n2n2/1B1pp3/3PP3/2N2N2/PPP2PPP/R1BQK2R b KQkq - 0 1")
                .unwrap();
        assert_eq!(eval.evaluate(&b), eval.evaluate(&mirror));
    }

    #[test]
    fn test_terms() {
        let eval = Material::default();
        let plain = Board::from_fen("4k3/8/8/8/8/8/P1P5/4K3 w - - 0 1").unwrap();
        let doubled = Board::from_fen("4k3/8/8/8/8/P7/P7/4K3 w - - 0 1").unwrap();
        let delta = eval.evaluate(&plain) - eval.evaluate(&doubled);
        let squares = PAWN_SQUARES[Coord::from_parts(File::C, crate::types::Rank::R2).index()]
            - PAWN_SQUARES[Coord::from_parts(File::A, crate::types::Rank::R3).index()];
        assert_eq!(delta, 2 * eval.doubled_pawn + squares);

        let pair = Board::from_fen("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1").unwrap();
        let single = Board::from_fen("4k3/8/8/8/8/8/8/2N1KB2 w - - 0 1").unwrap();
        assert_eq!(
            eval.evaluate(&pair) - eval.evaluate(&single),
            eval.value(PieceKind::Bishop) - eval.value(PieceKind::Knight) + eval.bishop_pair
                + BISHOP_SQUARES[58]
                - KNIGHT_SQUARES[58]
        );
    }

    #[test]
    fn test_closure() {
        let b = Board::initial();
        let eval = |b: &Board| b.piece_list(b.side()).len() as Score;
        assert_eq!(eval.evaluate(&b), 16);
    }
}
