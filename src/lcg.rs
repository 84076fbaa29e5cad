use core::cmp::Ordering;
use core::fmt;
#[cfg(feature = "serde")] use serde::{Deserialize, Serialize};

// This module contains exact arithmetic modulo m = 2**576 - 2**240 + 1,
// the modulus of the LCG that is equivalent to RANLUX.
// Numbers are fixed width: nine little-endian 64-bit limbs.

/// Number of 64-bit limbs in a 576-bit number.
pub const LIMBS: usize = 9;

/// Width of a product before reduction.
const WIDE: usize = 2 * LIMBS;

/// 2**576 = 2**240 - 1 (mod m).
const FOLD_SHIFT: usize = 240;

/// A 576-bit unsigned integer, least significant limb first.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct U576(pub [u64; LIMBS]);

/// The modulus m = 2**576 - 2**240 + 1.
pub const MODULUS: U576 = U576([1, 0, 0, 0xffff_0000_0000_0000, !0, !0, !0, !0, !0]);

impl U576 {
    pub const ZERO: U576 = U576([0; LIMBS]);
    pub const ONE: U576 = U576([1, 0, 0, 0, 0, 0, 0, 0, 0]);

    #[inline]
    pub fn from_u64(x: u64) -> Self {
        let mut limbs = [0; LIMBS];
        limbs[0] = x;
        U576(limbs)
    }

    #[inline]
    pub fn limbs(&self) -> &[u64; LIMBS] {
        &self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0)
    }

    /// Returns self + rhs and whether the sum overflowed 576 bits.
    #[inline]
    pub fn overflowing_add(&self, rhs: &U576) -> (U576, bool) {
        let (sum, carry) = add_limbs(&self.0, &rhs.0);
        (U576(sum), carry != 0)
    }

    /// Returns self - rhs and whether the difference borrowed.
    #[inline]
    pub fn overflowing_sub(&self, rhs: &U576) -> (U576, bool) {
        let (difference, borrow) = sub_limbs(&self.0, &rhs.0);
        (U576(difference), borrow != 0)
    }

    #[inline]
    pub fn shr(&self, bits: usize) -> U576 {
        U576(shr_limbs(&self.0, bits))
    }

    #[inline]
    pub fn shl(&self, bits: usize) -> U576 {
        U576(shl_limbs(&self.0, bits))
    }

    /// Zero extends to product width.
    #[inline]
    fn widen(&self) -> [u64; WIDE] {
        let mut wide = [0; WIDE];
        wide[..LIMBS].copy_from_slice(&self.0);
        wide
    }
}

impl Ord for U576 {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_limbs(&self.0, &other.0)
    }
}

impl PartialOrd for U576 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::LowerHex for U576 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for limb in self.0.iter().rev() {
            write!(f, "{:016x}", limb)?;
        }
        Ok(())
    }
}

impl fmt::Debug for U576 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "U576(0x{:x})", self)
    }
}

/// Returns a + b + carry, updating carry.
#[inline]
fn adc(a: u64, b: u64, carry: &mut u64) -> u64 {
    let t = (a as u128) + (b as u128) + (*carry as u128);
    *carry = (t >> 64) as u64;
    t as u64
}

/// Returns a - b - borrow, updating borrow.
#[inline]
fn sbb(a: u64, b: u64, borrow: &mut u64) -> u64 {
    let t = (a as u128).wrapping_sub(b as u128).wrapping_sub(*borrow as u128);
    *borrow = (t >> 127) as u64;
    t as u64
}

/// Returns a + b * c + carry, updating carry. Cannot overflow 128 bits.
#[inline]
fn mac(a: u64, b: u64, c: u64, carry: &mut u64) -> u64 {
    let t = (a as u128) + (b as u128) * (c as u128) + (*carry as u128);
    *carry = (t >> 64) as u64;
    t as u64
}

pub(crate) fn add_limbs<const N: usize>(a: &[u64; N], b: &[u64; N]) -> ([u64; N], u64) {
    let mut sum = [0; N];
    let mut carry = 0;
    for i in 0 .. N {
        sum[i] = adc(a[i], b[i], &mut carry);
    }
    (sum, carry)
}

pub(crate) fn sub_limbs<const N: usize>(a: &[u64; N], b: &[u64; N]) -> ([u64; N], u64) {
    let mut difference = [0; N];
    let mut borrow = 0;
    for i in 0 .. N {
        difference[i] = sbb(a[i], b[i], &mut borrow);
    }
    (difference, borrow)
}

/// Bits shifted past the top limb are discarded.
pub(crate) fn shl_limbs<const N: usize>(x: &[u64; N], bits: usize) -> [u64; N] {
    let (offset, shift) = (bits / 64, bits % 64);
    let mut r = [0; N];
    for i in offset .. N {
        let low = if shift > 0 && i > offset { x[i - offset - 1] >> (64 - shift) } else { 0 };
        r[i] = (x[i - offset] << shift) | low;
    }
    r
}

pub(crate) fn shr_limbs<const N: usize>(x: &[u64; N], bits: usize) -> [u64; N] {
    let (offset, shift) = (bits / 64, bits % 64);
    let mut r = [0; N];
    for i in 0 .. N.saturating_sub(offset) {
        let high = if shift > 0 && i + offset + 1 < N { x[i + offset + 1] << (64 - shift) } else { 0 };
        r[i] = (x[i + offset] >> shift) | high;
    }
    r
}

pub(crate) fn cmp_limbs<const N: usize>(a: &[u64; N], b: &[u64; N]) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}

/// Returns x * (2**240 - 1), which is x * 2**576 modulo m, without reducing.
/// Requires x < 2**912 so the result fits.
pub(crate) fn times_fold<const N: usize>(x: &[u64; N]) -> [u64; N] {
    let (r, borrow) = sub_limbs(&shl_limbs(x, FOLD_SHIFT), x);
    debug_assert_eq!(borrow, 0);
    r
}

/// Full 1152-bit product.
fn mul_wide(a: &U576, b: &U576) -> [u64; WIDE] {
    let mut t = [0; WIDE];
    for i in 0 .. LIMBS {
        let mut carry = 0;
        for j in 0 .. LIMBS {
            t[i + j] = mac(t[i + j], a.0[i], b.0[j], &mut carry);
        }
        t[i + LIMBS] = carry;
    }
    t
}

/// Reduces a double width number modulo m.
fn reduce(mut t: [u64; WIDE]) -> U576 {
    // Write t = L + H * 2**576 and replace it with L + H * (2**240 - 1)
    // until H vanishes. Each fold strictly decreases t, and at most four are needed.
    while t[LIMBS ..].iter().any(|&x| x != 0) {
        let mut low = [0; WIDE];
        let mut high = [0; WIDE];
        low[.. LIMBS].copy_from_slice(&t[.. LIMBS]);
        high[.. LIMBS].copy_from_slice(&t[LIMBS ..]);
        let (sum, carry) = add_limbs(&low, &times_fold(&high));
        debug_assert_eq!(carry, 0);
        t = sum;
    }
    let mut x = U576([0; LIMBS]);
    x.0.copy_from_slice(&t[.. LIMBS]);
    if x >= MODULUS {
        x = x.overflowing_sub(&MODULUS).0;
    }
    x
}

/// Returns a * b mod m.
pub fn mul_mod(a: &U576, b: &U576) -> U576 {
    reduce(mul_wide(a, b))
}

/// Returns base**exp mod m by binary exponentiation, most significant bit first.
pub fn pow_mod(base: &U576, exp: u64) -> U576 {
    let mut acc = U576::ONE;
    let bits = 64 - exp.leading_zeros();
    for bit in (0 .. bits).rev() {
        acc = mul_mod(&acc, &acc);
        if (exp >> bit) & 1 == 1 {
            acc = mul_mod(&acc, base);
        }
    }
    acc
}

/// Returns x**(2**k) mod m.
pub fn square_times(x: &U576, k: u32) -> U576 {
    let mut acc = *x;
    for _ in 0 .. k {
        acc = mul_mod(&acc, &acc);
    }
    acc
}

/// Returns x mod m for a 576-bit number x.
pub fn reduce_576(x: &U576) -> U576 {
    reduce(x.widen())
}

/// The base multiplier a = m - (m - 1) / 2**24, the inverse of 2**24 modulo m.
/// One LCG step by a equals one subtract-with-borrow step.
pub fn base_multiplier() -> U576 {
    let (m_minus_one, _) = MODULUS.overflowing_sub(&U576::ONE);
    MODULUS.overflowing_sub(&m_minus_one.shr(24)).0
}

/// Returns the jump multiplier A = a**p mod m that advances the state by p steps.
pub fn jump_multiplier(p: u64) -> U576 {
    let a = pow_mod(&base_multiplier(), p);
    tracing::debug!(p, "computed jump multiplier");
    a
}

#[cfg(test)] mod tests {
    use super::*;

    fn naive_power(base: &U576, p: u64) -> U576 {
        let mut acc = U576::ONE;
        for _ in 0 .. p { acc = mul_mod(&acc, base); }
        acc
    }

    #[test] pub fn run_tests() {

        let a = base_multiplier();
        assert!(a < MODULUS);
        // a is the inverse of the base 2**24.
        assert_eq!(U576::ONE, mul_mod(&a, &U576::from_u64(1 << 24)));
        // (m - 1)**2 = (-1)**2 = 1.
        let m_minus_one = MODULUS.overflowing_sub(&U576::ONE).0;
        assert_eq!(U576::ONE, mul_mod(&m_minus_one, &m_minus_one));
        assert_eq!(U576::ZERO, reduce_576(&MODULUS));
        assert_eq!((U576([!0; LIMBS]), true), U576::ZERO.overflowing_sub(&U576::ONE));
        assert_eq!((U576::ZERO, true), U576([!0; LIMBS]).overflowing_add(&U576::ONE));
        assert_eq!(U576::ONE, pow_mod(&a, 0));
        assert_eq!(a, pow_mod(&a, 1));

        for p in [24, 48, 408] {
            assert_eq!(naive_power(&a, p), jump_multiplier(p));
        }

        let mut r: u64 = 0;
        let mut rnd = || -> u64 { r = r.wrapping_mul(0xd1342543de82ef95).wrapping_add(0xffff); r };

        for _ in 0 .. 1<<6 {
            let x = rnd() & 0xfff;
            let y = rnd() & 0xfff;
            assert_eq!(mul_mod(&pow_mod(&a, x), &pow_mod(&a, y)), pow_mod(&a, x + y));

            let mut v = U576([0; LIMBS]);
            for limb in v.0.iter_mut() { *limb = rnd(); }
            let v = reduce_576(&v);
            assert!(v < MODULUS);
            assert_eq!(v, mul_mod(&v, &U576::ONE));
            // Multiplying by 2**24 and by its inverse cancels.
            assert_eq!(v, mul_mod(&mul_mod(&v, &a), &U576::from_u64(1 << 24)));
            assert_eq!(square_times(&v, 3), pow_mod(&v, 8));
            // shl and shr are inverse when no bits are lost.
            assert_eq!(v.shr(100), v.shr(100).shl(100).shr(100));
        }
    }
}
