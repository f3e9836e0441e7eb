//! Legal-by-construction move generation.
//!
//! Every move this module emits is already legal: no candidate is ever
//! generated and later discarded by a make/undo check. A single
//! [`LegalContext`] computed once per position carries the check mask and
//! the four pin rays (horizontal, vertical, diagonal, antidiagonal); each
//! piece-type generator intersects its normal attack set with that mask
//! instead of probing the position after every pseudo-legal candidate.

use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::moves::pawn::pawn_attacks;
use crate::moves::square_control::is_legal_castling;
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, MoveBuffer, PROMOTION,
    PROMOTION_CAPTURE, QUEENSIDE_CASTLE, QUIET_MOVE,
};
use crate::square::Square;
use crate::utils::pop_lsb;

const RANK2: u64 = 0x0000_0000_0000_FF00;
const RANK7: u64 = 0x00FF_0000_0000_0000;

const PROMOS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

const WHITE_KINGSIDE_BETWEEN: u64 = 0x0000_0000_0000_0060;
const WHITE_QUEENSIDE_BETWEEN: u64 = 0x0000_0000_0000_000E;
const BLACK_KINGSIDE_BETWEEN: u64 = 0x6000_0000_0000_0000;
const BLACK_QUEENSIDE_BETWEEN: u64 = 0x0E00_0000_0000_0000;

#[inline(always)]
fn kingside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_KINGSIDE_BETWEEN,
        Color::Black => BLACK_KINGSIDE_BETWEEN,
    }
}

#[inline(always)]
fn queenside_between(color: Color) -> u64 {
    match color {
        Color::White => WHITE_QUEENSIDE_BETWEEN,
        Color::Black => BLACK_QUEENSIDE_BETWEEN,
    }
}

/// Squares strictly between two co-linear squares, or 0 if `a` and `b` share
/// no rank, file, or diagonal. Derived from the magic tables themselves:
/// a rook/bishop's attack set from `a` with the sole blocker `b` stops
/// exactly at `b`, so intersecting it with the symmetric ray from `b` back
/// to `a` leaves only the open squares in between.
#[inline]
fn ray_between(tables: &MagicTables, a: u8, b: u8) -> u64 {
    let bb_a = 1u64 << a;
    let bb_b = 1u64 << b;
    let rook = tables.rook.get_attacks(a as usize, bb_b) & tables.rook.get_attacks(b as usize, bb_a);
    let bishop =
        tables.bishop.get_attacks(a as usize, bb_b) & tables.bishop.get_attacks(b as usize, bb_a);
    rook | bishop
}

enum Axis {
    Horizontal,
    Vertical,
    Diagonal,
    Antidiagonal,
}

fn classify_axis(king_sq: u8, other_sq: u8) -> Option<Axis> {
    let (kr, kf) = (king_sq as i8 / 8, king_sq as i8 % 8);
    let (or_, of) = (other_sq as i8 / 8, other_sq as i8 % 8);
    if kr == or_ {
        Some(Axis::Horizontal)
    } else if kf == of {
        Some(Axis::Vertical)
    } else if kr - or_ == kf - of {
        Some(Axis::Diagonal)
    } else if kr - or_ == -(kf - of) {
        Some(Axis::Antidiagonal)
    } else {
        None
    }
}

/// Per-node king-safety data: which squares the king may not step on, the
/// check mask, and the four pin rays. Computed once and shared by every
/// piece-type generator for this call.
pub struct LegalContext {
    king_sq: u8,
    enemy_attack_map: u64,
    checkmask: u64,
    double_check: bool,
    pin_horizontal: u64,
    pin_vertical: u64,
    pin_diagonal: u64,
    pin_antidiagonal: u64,
    pinned: u64,
}

impl LegalContext {
    pub fn compute(board: &Board, tables: &MagicTables) -> Self {
        let color = board.side_to_move;
        let enemy = color.opposite();
        let king_sq = board.king_square(color).index();
        let occ = board.occupied();
        let friendly = board.occupancy(color);

        let enemy_attack_map = enemy_attack_map(board, tables, color);

        let bishop_queens = board.pieces(Piece::Bishop, enemy) | board.pieces(Piece::Queen, enemy);
        let rook_queens = board.pieces(Piece::Rook, enemy) | board.pieces(Piece::Queen, enemy);

        let pawn_checkers = pawn_attacks(king_sq, color) & board.pieces(Piece::Pawn, enemy);
        let knight_checkers = KNIGHT_ATTACKS[king_sq as usize] & board.pieces(Piece::Knight, enemy);
        let diag_checkers = tables.bishop.get_attacks(king_sq as usize, occ) & bishop_queens;
        let orth_checkers = tables.rook.get_attacks(king_sq as usize, occ) & rook_queens;
        let checkers = pawn_checkers | knight_checkers | diag_checkers | orth_checkers;

        let (checkmask, double_check) = match checkers.count_ones() {
            0 => (u64::MAX, false),
            1 => {
                let checker_sq = checkers.trailing_zeros() as u8;
                (ray_between(tables, king_sq, checker_sq) | checkers, false)
            }
            _ => (0, true),
        };

        let mut pin_horizontal = 0u64;
        let mut pin_vertical = 0u64;
        let mut pin_diagonal = 0u64;
        let mut pin_antidiagonal = 0u64;
        let mut pinned = 0u64;

        if !double_check {
            // X-ray through our own pieces: a slider that only becomes
            // visible once friendly occupancy is removed is a candidate
            // pinner, provided exactly one friendly piece sits between it
            // and the king.
            let xray_rook = tables.rook.get_attacks(king_sq as usize, occ & !friendly);
            let xray_bishop = tables.bishop.get_attacks(king_sq as usize, occ & !friendly);

            let mut rook_pinners = xray_rook & rook_queens;
            while rook_pinners != 0 {
                let pinner_sq = pop_lsb(&mut rook_pinners);
                let ray = ray_between(tables, king_sq, pinner_sq) | (1u64 << pinner_sq);
                let blockers = ray & occ & !(1u64 << pinner_sq);
                if blockers.count_ones() == 1 && blockers & friendly != 0 {
                    pinned |= blockers;
                    match classify_axis(king_sq, pinner_sq) {
                        Some(Axis::Horizontal) => pin_horizontal |= ray,
                        Some(Axis::Vertical) => pin_vertical |= ray,
                        _ => {}
                    }
                }
            }

            let mut bishop_pinners = xray_bishop & bishop_queens;
            while bishop_pinners != 0 {
                let pinner_sq = pop_lsb(&mut bishop_pinners);
                let ray = ray_between(tables, king_sq, pinner_sq) | (1u64 << pinner_sq);
                let blockers = ray & occ & !(1u64 << pinner_sq);
                if blockers.count_ones() == 1 && blockers & friendly != 0 {
                    pinned |= blockers;
                    match classify_axis(king_sq, pinner_sq) {
                        Some(Axis::Diagonal) => pin_diagonal |= ray,
                        Some(Axis::Antidiagonal) => pin_antidiagonal |= ray,
                        _ => {}
                    }
                }
            }
        }

        Self {
            king_sq,
            enemy_attack_map,
            checkmask,
            double_check,
            pin_horizontal,
            pin_vertical,
            pin_diagonal,
            pin_antidiagonal,
            pinned,
        }
    }

    #[inline(always)]
    fn is_pinned(&self, sq: u8) -> bool {
        self.pinned & (1u64 << sq) != 0
    }

    #[inline(always)]
    fn pin_ray_for(&self, sq: u8) -> u64 {
        let bit = 1u64 << sq;
        if self.pin_horizontal & bit != 0 {
            self.pin_horizontal
        } else if self.pin_vertical & bit != 0 {
            self.pin_vertical
        } else if self.pin_diagonal & bit != 0 {
            self.pin_diagonal
        } else if self.pin_antidiagonal & bit != 0 {
            self.pin_antidiagonal
        } else {
            u64::MAX
        }
    }
}

/// Union of every square the given color's pieces attack, with that color's
/// own king removed from the occupancy first so sliding attacks correctly
/// see through the square the king is about to vacate.
fn enemy_attack_map(board: &Board, tables: &MagicTables, color: Color) -> u64 {
    let enemy = color.opposite();
    let king_bb = board.pieces(Piece::King, color);
    let occ_without_king = board.occupied() & !king_bb;

    let mut map = 0u64;

    let mut pawns = board.pieces(Piece::Pawn, enemy);
    while pawns != 0 {
        let sq = pop_lsb(&mut pawns);
        map |= pawn_attacks(sq, enemy);
    }

    let mut knights = board.pieces(Piece::Knight, enemy);
    while knights != 0 {
        let sq = pop_lsb(&mut knights);
        map |= KNIGHT_ATTACKS[sq as usize];
    }

    map |= KING_ATTACKS[board.king_square(enemy).index() as usize];

    let bishop_queens = board.pieces(Piece::Bishop, enemy) | board.pieces(Piece::Queen, enemy);
    let mut bq = bishop_queens;
    while bq != 0 {
        let sq = pop_lsb(&mut bq);
        map |= tables.bishop.get_attacks(sq as usize, occ_without_king);
    }

    let rook_queens = board.pieces(Piece::Rook, enemy) | board.pieces(Piece::Queen, enemy);
    let mut rq = rook_queens;
    while rq != 0 {
        let sq = pop_lsb(&mut rq);
        map |= tables.rook.get_attacks(sq as usize, occ_without_king);
    }

    map
}

#[inline(always)]
fn push_moves(
    from: u8,
    mut targets: u64,
    enemy: u64,
    piece: Piece,
    moves: &mut impl MoveBuffer,
) {
    while targets != 0 {
        let to = pop_lsb(&mut targets);
        let is_cap = (enemy >> to) & 1 != 0;
        moves.push(Move {
            from: Square::from_index(from),
            to: Square::from_index(to),
            piece,
            promotion: None,
            flags: if is_cap { CAPTURE } else { QUIET_MOVE },
        });
    }
}

fn generate_king(
    board: &Board,
    ctx: &LegalContext,
    captures_only: bool,
    moves: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy = board.opponent_occupancy(color);

    let mut targets = KING_ATTACKS[ctx.king_sq as usize] & !friendly & !ctx.enemy_attack_map;
    if captures_only {
        targets &= enemy;
    }
    push_moves(ctx.king_sq, targets, enemy, Piece::King, moves);
}

fn generate_castling(board: &Board, tables: &MagicTables, moves: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let king_sq = board.king_square(color).index();
    let occ = board.occupied();

    if board.has_kingside_castle(color) && occ & kingside_between(color) == 0 {
        let mv = Move {
            from: Square::from_index(king_sq),
            to: Square::from_index(king_sq + 2),
            piece: Piece::King,
            promotion: None,
            flags: KINGSIDE_CASTLE,
        };
        if is_legal_castling(board, mv, tables) {
            moves.push(mv);
        }
    }

    if board.has_queenside_castle(color) && occ & queenside_between(color) == 0 {
        let mv = Move {
            from: Square::from_index(king_sq),
            to: Square::from_index(king_sq - 2),
            piece: Piece::King,
            promotion: None,
            flags: QUEENSIDE_CASTLE,
        };
        if is_legal_castling(board, mv, tables) {
            moves.push(mv);
        }
    }
}

fn generate_knights(
    board: &Board,
    ctx: &LegalContext,
    captures_only: bool,
    moves: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy = board.opponent_occupancy(color);

    // A pinned knight has no move that stays on the pin ray, so it simply
    // cannot move at all while the pin holds.
    let mut knights = board.pieces(Piece::Knight, color) & !ctx.pinned;
    while knights != 0 {
        let from = pop_lsb(&mut knights);
        let mut targets = KNIGHT_ATTACKS[from as usize] & !friendly & ctx.checkmask;
        if captures_only {
            targets &= enemy;
        }
        push_moves(from, targets, enemy, Piece::Knight, moves);
    }
}

fn generate_sliders(
    board: &Board,
    tables: &MagicTables,
    ctx: &LegalContext,
    captures_only: bool,
    moves: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy = board.opponent_occupancy(color);
    let occ = board.occupied();

    let mut bishops = board.pieces(Piece::Bishop, color);
    while bishops != 0 {
        let from = pop_lsb(&mut bishops);
        let mut targets = tables.bishop.get_attacks(from as usize, occ) & !friendly & ctx.checkmask;
        if ctx.is_pinned(from) {
            targets &= ctx.pin_ray_for(from);
        }
        if captures_only {
            targets &= enemy;
        }
        push_moves(from, targets, enemy, Piece::Bishop, moves);
    }

    let mut rooks = board.pieces(Piece::Rook, color);
    while rooks != 0 {
        let from = pop_lsb(&mut rooks);
        let mut targets = tables.rook.get_attacks(from as usize, occ) & !friendly & ctx.checkmask;
        if ctx.is_pinned(from) {
            targets &= ctx.pin_ray_for(from);
        }
        if captures_only {
            targets &= enemy;
        }
        push_moves(from, targets, enemy, Piece::Rook, moves);
    }

    let mut queens = board.pieces(Piece::Queen, color);
    while queens != 0 {
        let from = pop_lsb(&mut queens);
        let mut targets = tables.queen_attacks(from as usize, occ) & !friendly & ctx.checkmask;
        if ctx.is_pinned(from) {
            targets &= ctx.pin_ray_for(from);
        }
        if captures_only {
            targets &= enemy;
        }
        push_moves(from, targets, enemy, Piece::Queen, moves);
    }
}

#[allow(clippy::too_many_arguments)]
fn push_pawn_move(
    from: u8,
    to: u8,
    promote: bool,
    flags_quiet: u8,
    flags_promo: u8,
    moves: &mut impl MoveBuffer,
) {
    if promote {
        for &promo in PROMOS.iter() {
            moves.push(Move {
                from: Square::from_index(from),
                to: Square::from_index(to),
                piece: Piece::Pawn,
                promotion: Some(promo),
                flags: flags_promo,
            });
        }
    } else {
        moves.push(Move {
            from: Square::from_index(from),
            to: Square::from_index(to),
            piece: Piece::Pawn,
            promotion: None,
            flags: flags_quiet,
        });
    }
}

fn generate_pawns(
    board: &Board,
    tables: &MagicTables,
    ctx: &LegalContext,
    captures_only: bool,
    moves: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let empty = !board.occupied();
    let enemy = board.opponent_occupancy(color) & !board.pieces(Piece::King, color.opposite());

    let (double_push_start, promote_from_rank, up): (u64, u64, i8) = match color {
        Color::White => (RANK2, RANK7, 8),
        Color::Black => (RANK7, RANK2, -8),
    };

    let mut bb = pawns;
    while bb != 0 {
        let from = pop_lsb(&mut bb);
        let from_bb = 1u64 << from;
        let pin_ray = if ctx.is_pinned(from) {
            ctx.pin_ray_for(from)
        } else {
            u64::MAX
        };
        let promotes = from_bb & promote_from_rank != 0;

        if !captures_only {
            let to1 = (from as i8 + up) as u8;
            let to1_bb = 1u64 << to1;
            if empty & to1_bb != 0 && pin_ray & to1_bb != 0 && ctx.checkmask & to1_bb != 0 {
                push_pawn_move(from, to1, promotes, QUIET_MOVE, PROMOTION, moves);
            }

            if from_bb & double_push_start != 0 && empty & to1_bb != 0 {
                let to2 = (from as i8 + 2 * up) as u8;
                let to2_bb = 1u64 << to2;
                if empty & to2_bb != 0 && pin_ray & to2_bb != 0 && ctx.checkmask & to2_bb != 0 {
                    moves.push(Move {
                        from: Square::from_index(from),
                        to: Square::from_index(to2),
                        piece: Piece::Pawn,
                        promotion: None,
                        flags: DOUBLE_PAWN_PUSH,
                    });
                }
            }
        }

        let mut targets = pawn_attacks(from, color) & enemy & pin_ray & ctx.checkmask;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            push_pawn_move(from, to, promotes, CAPTURE, PROMOTION_CAPTURE, moves);
        }
    }

    if let Some(ep_sq) = board.en_passant {
        generate_en_passant(board, tables, ctx, ep_sq.index(), up, moves);
    }
}

fn generate_en_passant(
    board: &Board,
    tables: &MagicTables,
    ctx: &LegalContext,
    ep: u8,
    up: i8,
    moves: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let cap_sq = (ep as i8 - up) as u8;
    let cap_bb = 1u64 << cap_sq;

    if board.pieces(Piece::Pawn, color.opposite()) & cap_bb == 0 {
        return;
    }

    let mut attackers = board.pieces(Piece::Pawn, color);
    while attackers != 0 {
        let from = pop_lsb(&mut attackers);
        if pawn_attacks(from, color) & (1u64 << ep) == 0 {
            continue;
        }

        let pin_ray = if ctx.is_pinned(from) {
            ctx.pin_ray_for(from)
        } else {
            u64::MAX
        };
        if pin_ray & (1u64 << ep) == 0 {
            continue;
        }

        // If in check, this capture only resolves it when the captured pawn
        // is itself the checker.
        if ctx.checkmask != u64::MAX && ctx.checkmask & cap_bb == 0 {
            continue;
        }

        // Rare discovered-check case: removing both the moving pawn and the
        // captured pawn can expose the king to a rook/queen along the rank.
        let occ_after = (board.occupied() & !(1u64 << from) & !cap_bb) | (1u64 << ep);
        let rook_queens =
            board.pieces(Piece::Rook, color.opposite()) | board.pieces(Piece::Queen, color.opposite());
        if tables.rook.get_attacks(ctx.king_sq as usize, occ_after) & rook_queens != 0 {
            continue;
        }

        moves.push(Move {
            from: Square::from_index(from),
            to: Square::from_index(ep),
            piece: Piece::Pawn,
            promotion: None,
            flags: EN_PASSANT,
        });
    }
}

/// Generate every legal move (or, if `captures_only`, every legal capture
/// and promotion) for the side to move.
pub fn generate_legal(
    board: &Board,
    tables: &MagicTables,
    captures_only: bool,
    moves: &mut impl MoveBuffer,
) {
    moves.clear();
    let ctx = LegalContext::compute(board, tables);

    generate_king(board, &ctx, captures_only, moves);
    if ctx.double_check {
        return;
    }

    generate_pawns(board, tables, &ctx, captures_only, moves);
    generate_knights(board, &ctx, captures_only, moves);
    generate_sliders(board, tables, &ctx, captures_only, moves);

    if !captures_only {
        generate_castling(board, tables, moves);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::moves::magic::loader::load_magic_tables;
    use arrayvec::ArrayVec;
    use std::str::FromStr;

    fn tables() -> MagicTables {
        load_magic_tables()
    }

    #[test]
    fn startpos_has_twenty_legal_moves() {
        let board = Board::new();
        let tables = tables();
        let mut moves: ArrayVec<Move, 256> = ArrayVec::new();
        generate_legal(&board, &tables, false, &mut moves);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn pinned_rook_cannot_leave_pin_ray() {
        // White king e1, white rook e4, black rook e8: the rook is pinned
        // vertically and may shuffle along the e-file but not sidestep.
        let board = Board::from_str("4k3/8/8/8/4R3/8/8/4K2r w - - 0 1").unwrap();
        let tables = tables();
        let mut moves: ArrayVec<Move, 256> = ArrayVec::new();
        generate_legal(&board, &tables, false, &mut moves);
        for mv in &moves {
            if mv.piece == Piece::Rook {
                assert_eq!(mv.from.file(), mv.to.file());
            }
        }
    }

    #[test]
    fn double_check_only_allows_king_moves() {
        // Black king e8 attacked simultaneously by a rook on e1 and a bishop
        // on h5's diagonal; only the king may move.
        let board = Board::from_str("4k3/8/8/7B/8/8/8/4R2K b - - 0 1").unwrap();
        let tables = tables();
        let mut moves: ArrayVec<Move, 256> = ArrayVec::new();
        generate_legal(&board, &tables, false, &mut moves);
        assert!(moves.iter().all(|m| m.piece == Piece::King));
        assert!(!moves.is_empty());
    }

    #[test]
    fn en_passant_discovered_check_is_excluded() {
        // White king e5, white pawn e5-file irrelevant; black rook a5, white
        // pawn d5 can capture e5-pawn en passant but doing so would expose
        // the king to the rook along the 5th rank.
        let board = Board::from_str("8/8/8/r2Pp2K/8/8/8/7k w - e6 0 1").unwrap();
        let tables = tables();
        let mut moves: ArrayVec<Move, 256> = ArrayVec::new();
        generate_legal(&board, &tables, false, &mut moves);
        assert!(!moves.iter().any(|m| m.is_en_passant()));
    }
}
