//! Small free-function helpers used in places where pulling in the
//! `BitboardExt` trait would be awkward (generic numeric contexts, hot loops
//! that read better as a function call than a method on a bare `u64`).

/// Pop and return the least significant set bit's index, as used throughout
/// evaluation and SEE where a bitboard is walked destructively.
#[inline(always)]
pub fn pop_lsb(bb: &mut u64) -> u8 {
    let idx = bb.trailing_zeros() as u8;
    *bb &= *bb - 1;
    idx
}

/// File-major square index for a given (rank, file), both 0-based.
#[inline(always)]
pub fn square_index(rank: u8, file: u8) -> usize {
    (rank as usize) * 8 + (file as usize)
}
