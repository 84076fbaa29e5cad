use super::codec::{WORDS, WORD_MASK};
use wrapping_arithmetic::wrappit;

// Subtract-with-borrow primitives shared by the generators.
// The recurrence is x[n] = x[n - 10] - x[n - 24] - c[n - 1] (mod 2**24),
// with c[n] = 1 when the subtraction borrowed.

/// Long lag of the recurrence.
pub const LAG_R: usize = WORDS;

/// Short lag of the recurrence.
pub const LAG_S: usize = 10;

/// Seed used by the reference initialization when none is given.
pub const DEFAULT_SEED: u32 = 314159265;

/// Returns (x - y - c) mod 2**24 and the new borrow.
#[wrappit] #[inline(always)]
pub fn sub_borrow(x: u32, y: u32, c: u32) -> (u32, u32) {
    let d = x - y - c;
    (d & WORD_MASK, d >> 31)
}

/// Index of the word x[n - 10] while word i of a block is rewritten in place.
#[inline(always)]
pub const fn short_lag(i: usize) -> usize {
    if i < LAG_S { i + LAG_R - LAG_S } else { i - LAG_S }
}

/// Advances a state, stored oldest word first, by 24 steps in place.
/// Returns the new carry.
#[inline]
pub fn block_step(x: &mut [u32; WORDS], mut c: u32) -> u32 {
    for i in 0 .. WORDS {
        let (d, b) = sub_borrow(x[short_lag(i)], x[i], c);
        x[i] = d;
        c = b;
    }
    c
}

/// The 24 integers of the reference initialization, in generation order.
/// Uses the multiplicative congruential generator 40014 * j (mod 2147483563)
/// in Schrage's decomposition, keeping the low 24 bits of each output.
pub fn reference_seeds(seed: u32) -> [u32; WORDS] {
    const ICONS: i64 = 2147483563;
    let mut jseed = seed as i64;
    let mut seeds = [0u32; WORDS];
    for s in seeds.iter_mut() {
        let k = jseed / 53668;
        jseed = 40014 * (jseed - k * 53668) - k * 12211;
        if jseed < 0 {
            jseed += ICONS;
        }
        *s = (jseed as u32) & WORD_MASK;
    }
    seeds
}

/// Initial state, oldest word first, and carry for a seed.
/// The last generated seed word is the oldest state word.
/// Seed 0 selects the default seed; it would otherwise give the all-zero state.
pub fn seed_state(seed: u32) -> ([u32; WORDS], u32) {
    let seeds = reference_seeds(if seed == 0 { DEFAULT_SEED } else { seed });
    let mut x = [0u32; WORDS];
    for (k, w) in x.iter_mut().enumerate() {
        *w = seeds[WORDS - 1 - k];
    }
    let c = (x[0] == 0) as u32;
    (x, c)
}
