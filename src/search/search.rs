//! Negamax search core: iterative deepening with aspiration windows driving
//! an alpha-beta recursion with PVS, null-move pruning, razoring, reverse
//! futility, late-move reduction, singular extensions and ProbCut, bottoming
//! out in a quiescence search.

use crate::board::Board;
use crate::moves::execute::{make_move_basic, make_null_move, undo_move_basic, undo_null_move};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::search::context::{MAX_PLY, SearchContext};
use crate::search::eval::{corrected_eval, static_eval, update_correction};
use crate::search::picker::MovePicker;
use crate::search::see::SeeExt;
use crate::search::time::{TimeControl, TimeManager};
use crate::search::tt::{NodeType, TranspositionTable};
use arrayvec::ArrayVec;
use std::time::Duration;

const INF: i32 = 32000;
const MATE_SCORE: i32 = 31000;
const MATE_THRESHOLD: i32 = MATE_SCORE - 1000;
const MAX_Q_PLY: usize = 100;
const DRAW_SCORE: i32 = 0;

// --- Tuning constants for search pruning ---
const RAZOR_DEPTH_LIMIT: i32 = 3;
const RAZOR_MARGIN: i32 = 500;

const RFP_DEPTH_LIMIT: i32 = 9;
const RFP_MARGIN_BASE: i32 = 154;
const RFP_MARGIN_PV_DISCOUNT: i32 = 48;

const NMP_MIN_DEPTH: i32 = 3;

const PROBCUT_MIN_DEPTH: i32 = 5;
const PROBCUT_MARGIN: i32 = 214;

const SINGULAR_MIN_DEPTH: i32 = 6;

const FP_MARGIN_BASE: i32 = 124;
const FP_MARGIN_MULT: i32 = 305;
const FP_HISTORY_THRESHOLD: i32 = 512;

const LMP_BASE_MOVES: i32 = 2;

const SEE_QUIET_MULT: i32 = -97;
const SEE_CAPTURE_MULT: i32 = -36;

/// The node-type lattice used to gate PV-only behavior. `Root` is a PV node
/// with extra root-only bookkeeping; `Null` forbids another null-move right
/// below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Pv,
    NonPv,
    Null,
}

impl NodeKind {
    #[inline]
    fn is_pv(self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Pv)
    }
}

// --- TT score <-> mate-distance adjustment, relative-to-root vs relative-to-ply ---
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

/// Base late-move reduction from depth and move index, a closed-form
/// approximation of the classic `R[depth][idx]` reduction table.
#[inline]
fn base_lmr(depth: i32, move_index: i32) -> i32 {
    if depth < 2 || move_index < 1 {
        return 0;
    }
    let d = (depth as f64).log2();
    let m = (move_index as f64).log2();
    ((d * m * 100.0) / 420.0) as i32
}

#[allow(clippy::too_many_arguments)]
pub fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &TimeManager,
) -> i32 {
    *nodes += 1;
    if time.aborted() {
        return alpha;
    }
    if *nodes & 1023 == 0 && time.poll(*nodes) {
        return alpha;
    }

    if ply >= MAX_PLY - 1 || ply > MAX_Q_PLY {
        return static_eval(board, tables, alpha, beta);
    }

    let hash = board.zobrist;
    let in_check_now = in_check(board, board.side_to_move, tables);

    let mut hash_move = None;
    if let Some(entry) = tt.probe_full(hash)
        && entry.key == hash
    {
        hash_move = entry.best_move;
        let tt_score = score_from_tt(entry.score as i32, ply as i32);
        match entry.bound {
            x if x == NodeType::Exact as u8 => return tt_score,
            x if x == NodeType::LowerBound as u8 && tt_score >= beta => return tt_score,
            x if x == NodeType::UpperBound as u8 && tt_score <= alpha => return tt_score,
            _ => {}
        }
    }

    let color = board.side_to_move;
    let cont = ctx.continuation_context(ply);

    if in_check_now {
        // No stand-pat while in check: every legal response must be tried.
        let mut best = -INF;
        let mut best_move = None;
        let mut picker = MovePicker::new(hash_move, [None, None], false);
        while let Some(mv) = picker.next(board, tables, &ctx.history, color, &cont) {
            let undo = make_move_basic(board, mv);
            ctx.set_moved(ply, mv);
            let score = -quiescence(board, tables, ctx, tt, ply + 1, -beta, -alpha, nodes, time);
            undo_move_basic(board, undo);

            if time.aborted() {
                return alpha;
            }
            if score > best {
                best = score;
                best_move = Some(mv);
                if score > alpha {
                    alpha = score;
                }
            }
            if alpha >= beta {
                break;
            }
        }
        if best == -INF {
            return -MATE_SCORE + ply as i32;
        }
        let bound = if best >= beta {
            NodeType::LowerBound
        } else {
            NodeType::UpperBound
        };
        tt.save(
            hash,
            best_move,
            score_to_tt(best, ply as i32),
            0,
            0,
            bound as u8,
            false,
            ply as i32,
        );
        return best;
    }

    let raw_eval = tt
        .probe_full(hash)
        .filter(|e| e.key == hash)
        .map(|e| e.static_eval as i32)
        .unwrap_or_else(|| static_eval(board, tables, -INF, INF));
    let stand_pat = corrected_eval(raw_eval, board, &ctx.correction);

    if stand_pat >= beta {
        tt.save(
            hash,
            None,
            score_to_tt(stand_pat, ply as i32),
            raw_eval,
            0,
            NodeType::LowerBound as u8,
            false,
            ply as i32,
        );
        return stand_pat;
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    let mut best = stand_pat;
    let mut best_move = None;
    let mut picker = MovePicker::new(hash_move, [None, None], true);

    while let Some(mv) = picker.next(board, tables, &ctx.history, color, &cont) {
        let mut captured_value = 0;
        if let Some(piece) = board.piece_type_at(mv.to) {
            captured_value = piece.value();
        }

        let is_prom = mv.is_promotion();
        let is_ep = mv.is_en_passant();

        if !is_prom && !is_ep && stand_pat + captured_value + 200 < alpha {
            continue;
        }
        if !is_prom && !is_ep && !board.static_exchange_eval(mv, 0, tables) {
            continue;
        }

        let undo = make_move_basic(board, mv);
        ctx.set_moved(ply, mv);
        let score = -quiescence(board, tables, ctx, tt, ply + 1, -beta, -alpha, nodes, time);
        undo_move_basic(board, undo);

        if time.aborted() {
            return alpha;
        }

        if score > best {
            best = score;
            best_move = Some(mv);
            if score > alpha {
                alpha = score;
            }
        }
        if score >= beta {
            break;
        }
    }

    let bound = if best >= beta {
        NodeType::LowerBound
    } else if best > stand_pat {
        NodeType::Exact
    } else {
        NodeType::UpperBound
    };
    tt.save(
        hash,
        best_move,
        score_to_tt(best, ply as i32),
        raw_eval,
        0,
        bound as u8,
        false,
        ply as i32,
    );
    best
}

#[allow(clippy::too_many_arguments)]
pub fn alpha_beta(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    mut depth: i32,
    ply: usize,
    mut alpha: i32,
    mut beta: i32,
    nodes: &mut u64,
    time: &TimeManager,
    node_kind: NodeKind,
    cut_node: bool,
    excluded_move: Option<Move>,
) -> (i32, Option<Move>) {
    *nodes += 1;
    if time.aborted() {
        return (alpha, None);
    }
    if *nodes & 1023 == 0 && time.poll(*nodes) {
        return (alpha, None);
    }

    if ply >= MAX_PLY - 1 {
        return (static_eval(board, tables, alpha, beta), None);
    }

    let is_pv = node_kind.is_pv();
    if is_pv {
        ctx.clear_pv_below(ply);
    }

    // Non-root mate-distance pruning.
    if ply > 0 {
        alpha = alpha.max(-MATE_SCORE + ply as i32);
        beta = beta.min(MATE_SCORE - ply as i32 - 1);
        if alpha >= beta {
            return (alpha, None);
        }

        // Non-root draw detection.
        if board.halfmove_clock >= 100 || board.is_repetition() {
            return (DRAW_SCORE, None);
        }
    }

    let in_check_now = in_check(board, board.side_to_move, tables);
    let extension_from_check = if in_check_now { 1 } else { 0 };

    if depth <= 0 && !in_check_now {
        let score = quiescence(board, tables, ctx, tt, ply, alpha, beta, nodes, time);
        return (score, None);
    }
    depth = depth.max(1);

    let hash = board.zobrist;
    let mut hash_move = None;

    if excluded_move.is_none()
        && let Some(entry) = tt.probe_full(hash)
        && entry.key == hash
    {
        hash_move = entry.best_move;
        let required_depth = if is_pv { depth + 2 } else { depth };
        if entry.depth as i32 >= depth && ply > 0 {
            let tt_score = score_from_tt(entry.score as i32, ply as i32);
            let would_cut = (entry.bound == NodeType::Exact as u8)
                || (entry.bound == NodeType::LowerBound as u8 && tt_score >= beta)
                || (entry.bound == NodeType::UpperBound as u8 && tt_score <= alpha);
            if would_cut {
                if is_pv && (entry.depth as i32) < required_depth {
                    // PV compromise: don't trust a shallow-enough-but-not-deep-enough
                    // entry for a hard cutoff; shave a ply off instead.
                    depth -= 1;
                } else {
                    return (tt_score, entry.best_move);
                }
            }
        }
    }

    // Internal iterative reduction: no hash move to trust, shrink the search.
    if hash_move.is_none() && depth >= 4 {
        depth -= 1;
    }

    let raw_eval = if in_check_now {
        0
    } else if let Some(entry) = tt.probe_full(hash).filter(|e| e.key == hash) {
        entry.static_eval as i32
    } else {
        static_eval(board, tables, alpha, beta)
    };
    let static_eval_val = if in_check_now {
        0
    } else {
        corrected_eval(raw_eval, board, &ctx.correction)
    };
    ctx.set_static_eval(ply, static_eval_val);

    let improving = ply >= 2 && !in_check_now && static_eval_val > ctx.static_eval_at(ply - 2);

    let in_mate_band = alpha.abs() >= MATE_THRESHOLD || beta.abs() >= MATE_THRESHOLD;

    // --- Whole-node pruning, non-root, not in check, away from mate scores ---
    if ply > 0 && !in_check_now && !in_mate_band && excluded_move.is_none() {
        if depth < RAZOR_DEPTH_LIMIT && static_eval_val + RAZOR_MARGIN * depth <= alpha {
            let razor_score = quiescence(board, tables, ctx, tt, ply, alpha, beta, nodes, time);
            if razor_score <= alpha {
                return (razor_score, None);
            }
        }

        if depth < RFP_DEPTH_LIMIT {
            let discount = if is_pv { 0 } else { RFP_MARGIN_PV_DISCOUNT };
            let margin = (RFP_MARGIN_BASE - discount) * (depth - improving as i32).max(0);
            if static_eval_val - margin >= beta {
                return ((static_eval_val + beta) / 2, None);
            }
        }

        if node_kind != NodeKind::Null
            && depth >= NMP_MIN_DEPTH
            && static_eval_val >= beta
            && board.has_major_pieces(board.side_to_move)
        {
            let r = 3 + depth / 3 + improving as i32 + ((static_eval_val - beta) / 245).clamp(0, 3);
            let undo = make_null_move(board);
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1 - r,
                ply + 1,
                -beta,
                -beta + 1,
                nodes,
                time,
                NodeKind::Null,
                !cut_node,
                None,
            );
            undo_null_move(board, undo);
            let score = -val;

            if !time.aborted() && score >= beta {
                return (if score >= MATE_THRESHOLD { beta } else { score }, None);
            }
        }

        if depth >= PROBCUT_MIN_DEPTH {
            let pc_beta = (beta + PROBCUT_MARGIN).min(MATE_THRESHOLD - 1);
            let see_threshold = pc_beta - static_eval_val;
            let mut captures: ArrayVec<Move, 64> = ArrayVec::new();
            crate::moves::legal::generate_legal(board, tables, true, &mut captures);

            for mv in captures {
                if Some(mv) == hash_move || !board.static_exchange_eval(mv, see_threshold, tables) {
                    continue;
                }
                let undo = make_move_basic(board, mv);
                ctx.set_moved(ply, mv);
                let mut score = -quiescence(
                    board,
                    tables,
                    ctx,
                    tt,
                    ply + 1,
                    -pc_beta,
                    -pc_beta + 1,
                    nodes,
                    time,
                );
                if score >= pc_beta {
                    let (val, _) = alpha_beta(
                        board,
                        tables,
                        ctx,
                        tt,
                        depth - 4,
                        ply + 1,
                        -pc_beta,
                        -pc_beta + 1,
                        nodes,
                        time,
                        NodeKind::NonPv,
                        !cut_node,
                        None,
                    );
                    score = -val;
                }
                undo_move_basic(board, undo);

                if time.aborted() {
                    return (alpha, None);
                }
                if score >= pc_beta {
                    tt.save(
                        hash,
                        Some(mv),
                        score_to_tt(score, ply as i32),
                        raw_eval,
                        (depth - 3) as u8,
                        NodeType::LowerBound as u8,
                        is_pv,
                        ply as i32,
                    );
                    return (score, Some(mv));
                }
            }
        }
    }

    let color = board.side_to_move;
    let cont = ctx.continuation_context(ply);
    let mut picker = MovePicker::new(hash_move, ctx.killer_moves[ply], false);

    let mut best_move = None;
    let mut best_score = -INF;
    let original_alpha = alpha;
    let mut move_count = 0i32;
    let mut quiet_count = 0i32;
    let mut tried_quiets: ArrayVec<Move, 64> = ArrayVec::new();
    let mut tried_captures: ArrayVec<(Move, crate::board::Piece), 64> = ArrayVec::new();

    while let Some(mv) = picker.next(board, tables, &ctx.history, color, &cont) {
        if Some(mv) == excluded_move {
            continue;
        }

        let is_quiet = !mv.is_capture() && !mv.is_promotion();

        if ply > 0 && !in_check_now && is_quiet {
            let lmp_limit = LMP_BASE_MOVES + depth * depth / (2 - improving as i32).max(1);
            if quiet_count > lmp_limit {
                continue;
            }

            let est_reduction = base_lmr(depth, move_count + 1);
            let hist = ctx.history.quiet_score(color, mv);
            let lmr_depth = depth - est_reduction - (!improving as i32) + hist / 6000;
            if static_eval_val + FP_MARGIN_BASE + FP_MARGIN_MULT * lmr_depth <= alpha {
                quiet_count += 1;
                continue;
            }
        }

        if ply > 0 && !in_check_now && move_count > 0 {
            let threshold = if is_quiet {
                SEE_QUIET_MULT * depth
            } else {
                SEE_CAPTURE_MULT * depth * depth
            };
            if !board.static_exchange_eval(mv, threshold, tables) {
                if is_quiet {
                    quiet_count += 1;
                }
                continue;
            }
        }

        let mut extension = extension_from_check;

        if excluded_move.is_none()
            && move_count == 0
            && Some(mv) == hash_move
            && depth >= SINGULAR_MIN_DEPTH
            && ply > 0
            && let Some(entry) = tt.probe_full(hash)
            && entry.key == hash
            && entry.depth as i32 >= depth - 3
            && entry.bound != NodeType::UpperBound as u8
        {
            let s_beta = (entry.score as i32) - depth * 100 / 80;
            let (s_score, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                (depth - 1) / 2,
                ply,
                s_beta - 1,
                s_beta,
                nodes,
                time,
                NodeKind::NonPv,
                true,
                Some(mv),
            );
            if time.aborted() {
                return (alpha, None);
            }
            if s_score < s_beta {
                extension = if s_score < s_beta - 50 { 2 } else { 1 };
            } else if s_beta >= beta {
                return (s_beta, Some(mv));
            } else if cut_node {
                extension = -2;
            }
        }

        let captured_for_history = if mv.is_capture() {
            if mv.is_en_passant() {
                Some(crate::board::Piece::Pawn)
            } else {
                board.piece_type_at(mv.to)
            }
        } else {
            None
        };

        let undo = make_move_basic(board, mv);
        ctx.set_moved(ply, mv);
        let nodes_before = *nodes;

        let child_cut_node = if move_count == 0 { !cut_node } else { true };

        let mut score;
        if move_count == 0 {
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1 + extension,
                ply + 1,
                -beta,
                -alpha,
                nodes,
                time,
                if is_pv { NodeKind::Pv } else { NodeKind::NonPv },
                child_cut_node,
                None,
            );
            score = -val;
        } else {
            let mut r = base_lmr(depth, move_count + 1);
            if is_quiet {
                let hist = ctx.history.quiet_score(color, mv);
                if hist > FP_HISTORY_THRESHOLD {
                    r -= 1;
                }
            }
            if !improving {
                r += 1;
            }
            if cut_node {
                r += 1;
            }
            if !in_check_now && depth > 2 && move_count > 3 && is_quiet {
                r = r.clamp(0, depth - 2);
            } else {
                r = 0;
            }

            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1 - r,
                ply + 1,
                -alpha - 1,
                -alpha,
                nodes,
                time,
                NodeKind::NonPv,
                true,
                None,
            );
            score = -val;

            if score > alpha && r > 0 {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 1,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    nodes,
                    time,
                    NodeKind::NonPv,
                    !cut_node,
                    None,
                );
                score = -val;
            }

            if is_pv && score > alpha && score < beta {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 1 + extension,
                    ply + 1,
                    -beta,
                    -alpha,
                    nodes,
                    time,
                    NodeKind::Pv,
                    false,
                    None,
                );
                score = -val;
            }
        }

        undo_move_basic(board, undo);
        let node_delta = *nodes - nodes_before;
        if ply == 0 && excluded_move.is_none() {
            ctx.add_root_move_nodes(mv, node_delta);
        }

        move_count += 1;
        if is_quiet {
            quiet_count += 1;
        }

        if time.aborted() {
            return (alpha, None);
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
                if is_pv {
                    ctx.update_pv(ply, mv);
                }
            }
            if score >= beta {
                let bonus = (depth * depth).min(1200);

                if is_quiet {
                    ctx.update_killer(ply, mv);
                    ctx.history.update_quiet(color, mv, bonus);
                    for prev in cont.iter().flatten() {
                        ctx.history
                            .update_continuation(prev.0, prev.1, mv.piece, mv.to.index(), bonus);
                    }
                    for &prev_mv in &tried_quiets {
                        ctx.history.update_quiet(color, prev_mv, -bonus);
                        for prev in cont.iter().flatten() {
                            ctx.history.update_continuation(
                                prev.0,
                                prev.1,
                                prev_mv.piece,
                                prev_mv.to.index(),
                                -bonus,
                            );
                        }
                    }
                } else if let Some(captured) = captured_for_history {
                    ctx.history.update_capture(mv.piece, mv, captured, bonus);
                    for &(prev_mv, prev_captured) in &tried_captures {
                        ctx.history
                            .update_capture(prev_mv.piece, prev_mv, prev_captured, -bonus);
                    }
                }

                let tt_score = score_to_tt(beta, ply as i32);
                tt.save(
                    hash,
                    Some(mv),
                    tt_score,
                    raw_eval,
                    depth as u8,
                    NodeType::LowerBound as u8,
                    is_pv,
                    ply as i32,
                );

                return (beta, Some(mv));
            }
        }

        if is_quiet {
            let _ = tried_quiets.try_push(mv);
        } else if let Some(captured) = captured_for_history {
            let _ = tried_captures.try_push((mv, captured));
        }
    }

    if move_count == 0 {
        if excluded_move.is_some() {
            return (alpha, None);
        }
        if in_check_now {
            return (-MATE_SCORE + ply as i32, None);
        }
        return (DRAW_SCORE, None);
    }

    if time.aborted() {
        return (alpha, None);
    }

    let node_type = if best_score >= beta {
        NodeType::LowerBound
    } else if best_score > original_alpha {
        NodeType::Exact
    } else {
        NodeType::UpperBound
    };

    if excluded_move.is_none() {
        let tt_score = score_to_tt(best_score, ply as i32);
        tt.save(
            hash,
            best_move,
            tt_score,
            raw_eval,
            depth as u8,
            node_type as u8,
            is_pv,
            ply as i32,
        );

        let best_is_quiet = best_move.map(|m| !m.is_capture()).unwrap_or(true);
        if !in_check_now && best_is_quiet && best_score.abs() < MATE_THRESHOLD {
            let diff = (best_score - static_eval_val).clamp(-256, 256);
            update_correction(&mut ctx.correction, board, diff);
        }
    }

    (best_score, best_move)
}

/// Full-control entry point: runs iterative deepening from `tc` until the
/// time manager says to stop, using an externally-owned transposition table
/// and search context. Callers that play a continuous game (the UCI loop,
/// the WASM engine) must own one `SearchContext` across calls so killer,
/// history, and correction-history state survive between searches, clearing
/// it only via `SearchContext::clear_all` on `ucinewgame`.
pub fn search_with_time_control(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    tc: TimeControl,
    ctx: &mut SearchContext,
) -> (i32, Option<Move>) {
    let mut time = TimeManager::new(tc);
    tt.new_search();

    let mut nodes = 0u64;
    let mut best_move = None;
    let mut best_score = 0;

    let max_depth = tc.depth_limit.unwrap_or(MAX_PLY as i32 - 2).min(MAX_PLY as i32 - 2);

    for depth in 1..=max_depth {
        ctx.history.age();
        ctx.reset_root_move_nodes();

        let mut window = 20;
        let (score, mv) = loop {
            let (alpha, beta) = if depth < 8 {
                (-INF, INF)
            } else {
                ((best_score - window).max(-INF), (best_score + window).min(INF))
            };

            let (score, mv) = alpha_beta(
                board,
                tables,
                &mut *ctx,
                tt,
                depth,
                0,
                alpha,
                beta,
                &mut nodes,
                &time,
                NodeKind::Root,
                false,
                None,
            );

            if time.aborted() {
                break (score, mv);
            }
            if depth >= 8 && score <= alpha && alpha > -INF {
                window *= 2;
                continue;
            }
            if depth >= 8 && score >= beta && beta < INF {
                window *= 2;
                continue;
            }
            break (score, mv);
        };

        if time.aborted() {
            break;
        }

        best_score = score;
        best_move = mv.or(best_move);

        if let Some(valid_mv) = mv {
            let score_str = if best_score.abs() >= MATE_THRESHOLD {
                let moves = (MATE_SCORE - best_score.abs() + 1) / 2;
                if best_score > 0 {
                    format!("mate {}", moves)
                } else {
                    format!("mate -{}", moves)
                }
            } else {
                format!("cp {}", best_score)
            };
            println!(
                "info depth {} score {} nodes {} time {} pv {}",
                depth,
                score_str,
                nodes,
                time.elapsed().as_millis(),
                valid_mv.to_uci()
            );
        }

        if best_score.abs() >= MATE_THRESHOLD {
            break;
        }

        let best_move_nodes = mv.map(|m| ctx.root_move_nodes(m)).unwrap_or(0);
        let eval_correction_magnitude = ctx.static_eval_at(0) - best_score;
        if time.can_end(nodes, best_move_nodes, mv, depth, eval_correction_magnitude) {
            break;
        }
    }

    (best_score, best_move)
}

/// Fixed-depth / simple-deadline entry point kept for callers (tests, one-off
/// EPD-position benches) that don't need a search context persisted across
/// calls. Owns a fresh `SearchContext` for the single search.
pub fn search(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    max_depth: i32,
    time_limit: Option<Duration>,
) -> (i32, Option<Move>) {
    let mut ctx = SearchContext::new();
    search_with_context(board, tables, tt, max_depth, time_limit, &mut ctx)
}

/// Same as `search`, but threads an externally-owned `SearchContext` through
/// so killer/history/correction state persists across searches within one
/// game. The UCI loop and the WASM engine use this, clearing the context
/// only on `ucinewgame`/`new_game`.
pub fn search_with_context(
    board: &mut Board,
    tables: &MagicTables,
    tt: &mut TranspositionTable,
    max_depth: i32,
    time_limit: Option<Duration>,
    ctx: &mut SearchContext,
) -> (i32, Option<Move>) {
    let tc = TimeControl {
        depth_limit: Some(max_depth),
        movetime_ms: time_limit.map(|d| d.as_millis() as u64),
        infinite: time_limit.is_none(),
        ..Default::default()
    };
    search_with_time_control(board, tables, tt, tc, ctx)
}
