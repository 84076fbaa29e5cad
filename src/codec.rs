//! Conversion between the RANLUX domain and the LCG domain.
//!
//! A subtract-with-borrow state is 24 words of 24 bits, oldest word first, plus a carry bit.
//! Packing word k at bit 24k gives a 576-bit number Y. The equivalent LCG state is
//!
//! x = Y - (Y >> 336) + c (mod m),
//!
//! where Y >> 336 is the newest 10 words. One subtract-with-borrow step multiplies x by
//! a = 2**-24 (mod m). Going back, Y = floor(2**576 x / m) and c = x - Y + (Y >> 336).
//! The inverse recovers every state that the generator can reach by stepping.

use super::lcg::{add_limbs, cmp_limbs, times_fold, U576, LIMBS, MODULUS};
use core::cmp::Ordering;

/// Words in a subtract-with-borrow state.
pub const WORDS: usize = 24;

/// Significant bits in a subtract-with-borrow word.
pub const WORD_BITS: usize = 24;

/// Mask of the significant bits of a word.
pub const WORD_MASK: u32 = (1 << WORD_BITS) - 1;

/// Bit offset of the newest 10 words inside the packed state.
const NEWEST_SHIFT: usize = 14 * WORD_BITS;

/// Whether words and carry form a subtract-with-borrow state.
pub fn is_state(words: &[u32; WORDS], carry: u32) -> bool {
    carry <= 1 && words.iter().all(|&w| w <= WORD_MASK)
}

/// Packs 24 words of 24 bits, oldest first, into a 576-bit number.
pub fn pack(words: &[u32; WORDS]) -> U576 {
    let mut y = [0u64; LIMBS];
    for (k, &w) in words.iter().enumerate() {
        debug_assert!(w <= WORD_MASK);
        let bit = k * WORD_BITS;
        let (limb, shift) = (bit / 64, bit % 64);
        y[limb] |= (w as u64) << shift;
        if shift + WORD_BITS > 64 {
            y[limb + 1] |= (w as u64) >> (64 - shift);
        }
    }
    U576(y)
}

/// Inverse of `pack`.
pub fn unpack(y: &U576) -> [u32; WORDS] {
    let mut words = [0u32; WORDS];
    for (k, w) in words.iter_mut().enumerate() {
        let bit = k * WORD_BITS;
        let (limb, shift) = (bit / 64, bit % 64);
        let mut bits = y.0[limb] >> shift;
        if shift + WORD_BITS > 64 {
            bits |= y.0[limb + 1] << (64 - shift);
        }
        *w = bits as u32 & WORD_MASK;
    }
    words
}

/// Converts a subtract-with-borrow state and its carry into the LCG state.
pub fn to_lcg(words: &[u32; WORDS], carry: u32) -> U576 {
    debug_assert!(carry <= 1);
    let y = pack(words);
    let (x, _) = y.overflowing_sub(&y.shr(NEWEST_SHIFT));
    let (x, overflow) = x.overflowing_add(&U576::from_u64(carry as u64));
    debug_assert!(!overflow);
    // Only the all ones state with carry set lands on m; it is the LCG fixed point 0.
    if x >= MODULUS {
        x.overflowing_sub(&MODULUS).0
    } else {
        x
    }
}

/// Converts an LCG state into the subtract-with-borrow state and carry.
pub fn to_ranlux(x: &U576) -> ([u32; WORDS], u32) {
    assert!(*x < MODULUS, "LCG state must be below the modulus");

    // Y = x + e with e = floor(x (2**240 - 1) / m).
    let mut wide = [0u64; 2 * LIMBS];
    wide[.. LIMBS].copy_from_slice(&x.0);
    let dx = times_fold(&wide);

    // e is either the top half of dx or one more, since
    // dx - m * top = low + top * (2**240 - 1) < 2m.
    let mut e = U576([0; LIMBS]);
    e.0.copy_from_slice(&dx[LIMBS ..]);
    let mut low = [0u64; 2 * LIMBS];
    low[.. LIMBS].copy_from_slice(&dx[.. LIMBS]);
    let mut top = [0u64; 2 * LIMBS];
    top[.. LIMBS].copy_from_slice(&e.0);
    let (remainder, _) = add_limbs(&low, &times_fold(&top));
    let mut modulus = [0u64; 2 * LIMBS];
    modulus[.. LIMBS].copy_from_slice(&MODULUS.0);
    if cmp_limbs(&remainder, &modulus) != Ordering::Less {
        e = e.overflowing_add(&U576::ONE).0;
    }

    let (y, overflow) = x.overflowing_add(&e);
    debug_assert!(!overflow);
    let (carry, borrow) = y.shr(NEWEST_SHIFT).overflowing_sub(&e);
    debug_assert!(!borrow && carry.0[0] <= 1 && carry.0[1 ..].iter().all(|&l| l == 0));
    (unpack(&y), carry.0[0] as u32)
}

/// Repacks 24-bit words into a dense stream of 32-bit words, four words into three,
/// most significant bits first. `out` receives 3/4 as many words as `words` yields.
pub fn repack_u32(words: impl IntoIterator<Item = u32>, out: &mut [u32]) {
    let mut words = words.into_iter();
    for o in out.chunks_exact_mut(3) {
        let mut w = [0u32; 4];
        for v in w.iter_mut() {
            *v = words.next().unwrap_or(0);
        }
        o[0] = (w[0] << 8) | (w[1] >> 16);
        o[1] = (w[1] << 16) | (w[2] >> 8);
        o[2] = (w[2] << 24) | w[3];
    }
}
