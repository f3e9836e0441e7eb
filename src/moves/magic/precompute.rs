//! Builds the rook/bishop magic tables from scratch by brute-force searching
//! for collision-free magic numbers, then baking the resulting attack sets
//! into flat lookup tables.

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Controls how the magic-search PRNG is seeded.
///
/// Magic number search only affects index hashing, never the attack tables
/// themselves, so any valid magic produces identical move generation - but a
/// fixed seed makes the search (and its timing) reproducible across runs.
pub enum MagicTableSeed {
    Fixed(u64),
}

fn rook_relevant_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in (1..rank).rev() {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in (1..file).rev() {
        mask |= 1u64 << (rank * 8 + f);
    }
    mask
}

fn bishop_relevant_mask(square: usize) -> u64 {
    let rank = (square / 8) as i32;
    let file = (square % 8) as i32;
    let mut mask = 0u64;

    let mut r = rank + 1;
    let mut f = file + 1;
    while r < 7 && f < 7 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f += 1;
    }
    let mut r = rank - 1;
    let mut f = file - 1;
    while r > 0 && f > 0 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f -= 1;
    }
    let mut r = rank + 1;
    let mut f = file - 1;
    while r < 7 && f > 0 {
        mask |= 1u64 << (r * 8 + f);
        r += 1;
        f -= 1;
    }
    let mut r = rank - 1;
    let mut f = file + 1;
    while r > 0 && f < 7 {
        mask |= 1u64 << (r * 8 + f);
        r -= 1;
        f += 1;
    }
    mask
}

/// Maps an index in `0..2^bits` onto one specific subset of `mask`'s set bits.
/// Iterating every index this way enumerates every possible blocker pattern.
fn index_to_blockers(index: usize, bits_in_mask: u32, mut mask: u64) -> u64 {
    let mut blockers = 0u64;
    for i in 0..bits_in_mask {
        let bit_pos = mask.trailing_zeros();
        mask &= mask - 1;
        if (index >> i) & 1 != 0 {
            blockers |= 1u64 << bit_pos;
        }
    }
    blockers
}

fn build_entry<R: RngCore>(
    square: usize,
    mask: u64,
    attacks_fn: impl Fn(usize, u64) -> u64,
    rng: &mut R,
) -> Result<MagicEntry, String> {
    let bits = mask.count_ones();
    let shift = 64 - bits;
    let size = 1usize << bits;

    let mut blockers = Vec::with_capacity(size);
    let mut attacks = Vec::with_capacity(size);
    for i in 0..size {
        let b = index_to_blockers(i, bits, mask);
        blockers.push(b);
        attacks.push(attacks_fn(square, b));
    }

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let mut table = vec![0u64; size];
    for i in 0..size {
        let index = ((blockers[i].wrapping_mul(magic)) >> shift) as usize;
        table[index] = attacks[i];
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let MagicTableSeed::Fixed(s) = seed;
    let mut rng = StdRng::seed_from_u64(s);

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        let rmask = rook_relevant_mask(square);
        rook_entries.push(build_entry(
            square,
            rmask,
            rook_attacks_per_square,
            &mut rng,
        )?);

        let bmask = bishop_relevant_mask(square);
        bishop_entries.push(build_entry(
            square,
            bmask,
            bishop_attacks_per_square,
            &mut rng,
        )?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}
