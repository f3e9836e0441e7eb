use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;

const fn pc_index(piece: Piece, color: Color) -> usize {
    (color as usize) * 6 + (piece as usize)
}

impl Board {
    /// Parse a FEN string into `self`, overwriting all existing state.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let mut fields = fen.split_whitespace();

        let placement = fields
            .next()
            .ok_or_else(|| "FEN missing piece placement field".to_string())?;
        let side = fields.next().unwrap_or("w");
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = Board::new_empty();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "FEN piece placement must have 8 ranks, got {}",
                ranks.len()
            ));
        }

        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                    continue;
                }
                if file >= 8 {
                    return Err(format!("FEN rank {} overflows the board", rank + 1));
                }
                let (piece, color) = CHAR_TO_PC[ch as usize]
                    .ok_or_else(|| format!("invalid FEN piece glyph: {ch}"))?;
                let sq = Square::from_file_rank(file as u8, rank as u8);
                let bb = board.bb(color, piece) | sq.bitboard();
                board.set_bb(color, piece, bb);
                file += 1;
            }
            if file != 8 {
                return Err(format!(
                    "FEN rank {} does not cover all 8 files",
                    rank + 1
                ));
            }
        }

        board.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid FEN side to move: {other}")),
        };

        board.castling_rights = 0;
        if castling != "-" {
            for ch in castling.chars() {
                board.castling_rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => return Err(format!("invalid FEN castling glyph: {other}")),
                };
            }
        }

        board.en_passant = if ep == "-" {
            None
        } else {
            Some(
                ep.parse::<Square>()
                    .map_err(|e| format!("invalid FEN en passant square: {e}"))?,
            )
        };

        board.halfmove_clock = halfmove
            .parse()
            .map_err(|_| format!("invalid FEN halfmove clock: {halfmove}"))?;
        board.fullmove_number = fullmove
            .parse()
            .map_err(|_| format!("invalid FEN fullmove number: {fullmove}"))?;

        board.refresh_zobrist();
        board.history.clear();

        *self = board;
        Ok(())
    }

    /// Serialize `self` to a FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank_from_top in 0..8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u32;
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        placement.push(PC_TO_CHAR[pc_index(piece, color)]);
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.has_castling(CASTLE_WK) {
            castling.push('K');
        }
        if self.has_castling(CASTLE_WQ) {
            castling.push('Q');
        }
        if self.has_castling(CASTLE_BK) {
            castling.push('k');
        }
        if self.has_castling(CASTLE_BQ) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {} {} {}",
            placement, side, castling, ep, self.halfmove_clock, self.fullmove_number
        )
    }
}
