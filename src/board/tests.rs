use super::*;

#[test]
fn new_board_has_standard_starting_material() {
    let board = Board::new();
    assert_eq!(board.pieces(Piece::Pawn, Color::White).count_ones(), 8);
    assert_eq!(board.pieces(Piece::Pawn, Color::Black).count_ones(), 8);
    assert_eq!(board.pieces(Piece::King, Color::White).count_ones(), 1);
    assert_eq!(board.occupied().count_ones(), 32);
    assert_eq!(board.side_to_move, Color::White);
}

#[test]
fn validate_rejects_overlapping_bitboards() {
    let mut board = Board::new_empty();
    let e4 = Square::from_index(28);
    board.set_bb(Color::White, Piece::Pawn, e4.bitboard());
    board.set_bb(Color::Black, Piece::Knight, e4.bitboard());
    assert!(board.validate().is_err());
}

#[test]
fn set_bb_keeps_occupancy_and_hash_consistent() {
    let mut board = Board::new_empty();
    let e4 = Square::from_index(28);
    board.set_bb(Color::White, Piece::Queen, e4.bitboard());
    assert_eq!(board.occ_white, e4.bitboard());
    assert_eq!(board.occ_all, e4.bitboard());
    board.assert_hash();
}

#[test]
fn king_square_matches_bitboard() {
    let board = Board::new();
    assert_eq!(board.king_square(Color::White).index(), 4);
    assert_eq!(board.king_square(Color::Black).index(), 60);
}

#[test]
fn repetition_count_tracks_history_matches() {
    let mut board = Board::new();
    assert_eq!(board.repetition_count(), 1);
    board.history.push(board.zobrist);
    assert_eq!(board.repetition_count(), 2);
    assert!(board.is_threefold() == false);
    board.history.push(board.zobrist);
    assert!(board.is_threefold());
}

#[test]
fn default_and_new_empty_agree() {
    let a = Board::default();
    let b = Board::new_empty();
    assert_eq!(a, b);
}
