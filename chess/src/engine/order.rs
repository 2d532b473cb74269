use crate::board::Board;
use crate::moves::{Move, MoveTag};
use crate::types::PieceKind;

use std::cmp::Reverse;

const HASH_MOVE: i32 = 1 << 20;
const CAPTURE: i32 = 1 << 16;

const KIND_WEIGHT: [i32; PieceKind::COUNT] = [1, 3, 3, 5, 9, 20];

/// Most valuable victim, least valuable attacker
fn mvv_lva(b: &Board, mv: Move) -> i32 {
    let victim = match mv.tag() {
        MoveTag::EnPassant => PieceKind::Pawn,
        _ => b.get(mv.to()).kind().unwrap_or(PieceKind::Pawn),
    };
    let attacker = b.get(mv.from()).kind().unwrap_or(PieceKind::Pawn);
    KIND_WEIGHT[victim.index()] * 64 - KIND_WEIGHT[attacker.index()]
}

fn weight(b: &Board, mv: Move, hash_move: Option<Move>) -> i32 {
    if hash_move == Some(mv) {
        return HASH_MOVE;
    }
    let mut res = 0;
    if mv.is_capture() {
        res += CAPTURE + mvv_lva(b, mv) * 16;
    }
    if let Some(kind) = mv.tag().promote_kind() {
        res += kind.index() as i32;
    }
    res
}

/// Puts the hash move first, then captures by MVV-LVA, then the quiet moves
///
/// Ties are broken by squares, so the order depends only on the position and the moves.
pub fn sort_moves(b: &Board, moves: &mut [Move], hash_move: Option<Move>) {
    moves.sort_unstable_by_key(|&mv| {
        (
            Reverse(weight(b, mv, hash_move)),
            mv.from().index(),
            mv.to().index(),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::legal;

    fn ordered(fen: &str, hash_move: Option<&str>) -> Vec<String> {
        let b = Board::from_fen(fen).unwrap();
        let hash_move = hash_move.map(|s| b.parse_uci(s).unwrap());
        let mut moves = legal::gen_all(&b);
        sort_moves(&b, &mut moves, hash_move);
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_captures() {
        let fen = "4k3/8/3r4/2P1q3/2N5/8/8/7K w - - 0 1";
        let moves = ordered(fen, None);
        assert_eq!(&moves[..3], &["c4e5", "c5d6", "c4d6"]);

        let moves = ordered(fen, Some("h1g1"));
        assert_eq!(&moves[..4], &["h1g1", "c4e5", "c5d6", "c4d6"]);
    }

    #[test]
    fn test_promote() {
        let moves = ordered("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1", None);
        assert_eq!(
            &moves[..5],
            &["a7b8q", "a7b8r", "a7b8b", "a7b8n", "a7a8q"]
        );
    }
}
