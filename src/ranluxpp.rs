use super::codec::{is_state, to_lcg, to_ranlux, WORDS};
use super::lcg::{jump_multiplier, mul_mod, pow_mod, square_times, U576, LIMBS, MODULUS};
#[cfg(feature = "serde")] use serde::{Deserialize, Serialize};

// RANLUX++ features
// -LCG x <- A * x mod m with m = 2**576 - 2**240 + 1 and A = a**p,
//  equivalent to RANLUX with a skip of p steps
// -every bit of the 576-bit state is output, there is no separate decimation
// -random access by arbitrary jumps
// -seeds select substreams 2**96 advances apart

/// Skip distance of the default generator.
pub const DEFAULT_SKIP: u64 = 2048;

/// Bits in one LCG state.
const STATE_BITS: u32 = 64 * LIMBS as u32;

/// Advances between substreams of consecutive seeds, as a power of two.
const SEED_SPACING_LOG2: u32 = 96;

/// RANLUX++ generator. Equivalent to RANLUX skipping p steps between states.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Eq, PartialEq)]
pub struct Ranluxpp {
    /// LCG state, below the modulus.
    x: U576,
    /// Jump multiplier a**p.
    a: U576,
    /// Skip distance.
    p: u64,
    /// Bits of the current state already delivered.
    pos: u32,
}

// As recommended, this Debug implementation does not expose internal state.
impl core::fmt::Debug for Ranluxpp {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Ranluxpp {{ p: {} }}", self.p)
    }
}

impl Ranluxpp {

    /// Creates a generator with skip distance 2048.
    pub fn new(seed: u64) -> Self {
        Self::with_skip(seed, DEFAULT_SKIP)
    }

    /// Creates a generator with skip distance p. The state starts at 1 and jumps
    /// seed * 2**96 advances. The first number requested triggers an advance.
    pub fn with_skip(seed: u64, p: u64) -> Self {
        assert!(p > 0, "skip distance must be positive");
        let a = jump_multiplier(p);
        let x = pow_mod(&square_times(&a, SEED_SPACING_LOG2), seed);
        Ranluxpp { x, a, p, pos: STATE_BITS }
    }

    /// Creates a generator from a subtract-with-borrow state, oldest word first.
    pub fn from_ranlux(words: &[u32; WORDS], carry: u32, p: u64) -> Self {
        assert!(is_state(words, carry), "state words must be below 2**24 and the carry at most 1");
        let mut rnd = Self::with_skip(0, p);
        rnd.set_state(to_lcg(words, carry));
        rnd
    }

    #[inline]
    pub fn skip_distance(&self) -> u64 {
        self.p
    }

    /// Returns the jump multiplier a**p.
    #[inline]
    pub fn multiplier(&self) -> &U576 {
        &self.a
    }

    /// Returns the LCG state.
    #[inline]
    pub fn state(&self) -> &U576 {
        &self.x
    }

    /// Replaces the LCG state. Output resumes with the next state.
    pub fn set_state(&mut self, x: U576) {
        assert!(x < MODULUS, "LCG state must be below the modulus");
        self.x = x;
        self.pos = STATE_BITS;
    }

    /// Returns the equivalent subtract-with-borrow state and carry.
    pub fn ranlux_state(&self) -> ([u32; WORDS], u32) {
        to_ranlux(&self.x)
    }

    /// Advances to the next state.
    #[inline]
    pub fn next_state(&mut self) {
        self.x = mul_mod(&self.a, &self.x);
    }

    /// Advances once and returns the new state.
    pub fn next_state_words(&mut self) -> [u64; LIMBS] {
        self.next_state();
        self.pos = STATE_BITS;
        self.x.0
    }

    /// Jumps forward by n subtract-with-borrow steps. Output resumes with the next state.
    pub fn jump(&mut self, n: u64) {
        self.x = mul_mod(&jump_multiplier(n), &self.x);
        self.pos = STATE_BITS;
    }

    /// Returns the next w bits of the state stream, low bits first (w <= 64).
    #[inline]
    fn next_bits(&mut self, w: u32) -> u64 {
        debug_assert!(w > 0 && w <= 64);
        if self.pos + w > STATE_BITS {
            self.next_state();
            self.pos = 0;
        }
        let (limb, shift) = ((self.pos / 64) as usize, self.pos % 64);
        let mut bits = self.x.0[limb] >> shift;
        if shift + w > 64 {
            bits |= self.x.0[limb + 1] << (64 - shift);
        }
        self.pos += w;
        if w == 64 { bits } else { bits & ((1 << w) - 1) }
    }

    /// Returns a number in [0, 1) with 24 random bits.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.next_bits(24) as f32 * (1.0 / (1u64 << 24) as f32)
    }

    /// Returns a number in [0, 1) with 52 random bits.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.next_bits(52) as f64 * (1.0 / (1u64 << 52) as f64)
    }

    pub fn fill_f32(&mut self, out: &mut [f32]) {
        for x in out.iter_mut() {
            *x = self.next_f32();
        }
    }

    pub fn fill_f64(&mut self, out: &mut [f64]) {
        for x in out.iter_mut() {
            *x = self.next_f64();
        }
    }
}

use rand_core::{Error, RngCore, SeedableRng};

impl RngCore for Ranluxpp {
    fn next_u32(&mut self) -> u32 {
        self.next_bits(32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_bits(64)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let bytes = dest.len();
        let mut i = 0;
        while i < bytes {
            let x = self.next_u64();
            let j = bytes.min(i + 8);
            // Always use Little-Endian.
            dest[i .. j].copy_from_slice(&x.to_le_bytes()[0 .. (j - i)]);
            i = j;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Ranluxpp {
    type Seed = [u8; 8];

    /// Creates a new Ranluxpp RNG from a seed with skip distance 2048.
    fn from_seed(seed: Self::Seed) -> Self {
        // Always use Little-Endian.
        Ranluxpp::new(u64::from_le_bytes(seed))
    }
}

#[cfg(test)] mod tests {
    use super::*;
    use super::super::scalar::{AdvanceMode, Ranlux};

    #[test] pub fn run_tests() {

        // The LCG sequence is the RANLUX sequence with the same skip.
        let stride = 17;
        let mut ranlux = Ranlux::with_mode(100, stride, AdvanceMode::Direct);
        ranlux.skip(1);
        let (y, c) = ranlux.state();
        let mut rnd = Ranluxpp::from_ranlux(&y, c, 24 * stride as u64);
        assert_eq!(&ranlux.lcg_state(), rnd.state());
        for _ in 0 .. 1000 {
            ranlux.advance();
            rnd.next_state();
            assert_eq!(&ranlux.lcg_state(), rnd.state());
            assert_eq!(ranlux.state(), rnd.ranlux_state());
        }

        // Seeds are reproducible and distinct.
        let mut a = Ranluxpp::new(1);
        let mut b = Ranluxpp::from_seed(1u64.to_le_bytes());
        let c = Ranluxpp::new(2);
        assert_eq!(a.next_u64(), b.next_u64());
        assert_ne!(a.state(), c.state());
        assert_eq!(&U576::ONE, Ranluxpp::with_skip(0, 24).state());

        // A state yields 24 floats, 11 doubles, 9 u64s.
        let mut r = Ranluxpp::new(3124);
        let mut floats = [0f32; 24];
        r.fill_f32(&mut floats);
        let x = *r.state();
        assert_eq!((x.0[0] & 0xffffff) as f32 / 16777216.0, floats[0]);
        assert_eq!((x.0[8] >> 40) as f32 / 16777216.0, floats[23]);
        r.next_f32();
        assert_ne!(&x, r.state());
        for x in floats.iter() { assert!((0.0 .. 1.0).contains(x)); }

        let mut r = Ranluxpp::new(3124);
        let mut doubles = [0f64; 12];
        r.fill_f64(&mut doubles[.. 11]);
        let x = *r.state();
        assert_eq!((x.0[0] & ((1 << 52) - 1)) as f64 / 4503599627370496.0, doubles[0]);
        doubles[11] = r.next_f64();
        assert_ne!(&x, r.state());

        let mut r = Ranluxpp::new(9);
        let mut words = [0u64; 9];
        for w in words.iter_mut() { *w = r.next_u64(); }
        assert_eq!(r.state().0, words);

        // Jumps compose with advances.
        let mut j1 = Ranluxpp::with_skip(4, 408);
        let mut j2 = j1.clone();
        j1.jump(408 * 3);
        for _ in 0 .. 3 { j2.next_state(); }
        assert_eq!(j1.state(), j2.state());

        let mut bytes = [0u8; 13];
        let mut r1 = Ranluxpp::new(6);
        let mut r2 = Ranluxpp::new(6);
        r1.fill_bytes(&mut bytes);
        assert_eq!(&r2.next_u64().to_le_bytes()[..], &bytes[.. 8]);
        assert_eq!(&r2.next_u64().to_le_bytes()[.. 5], &bytes[8 ..]);
    }

    #[test] #[should_panic] pub fn rejects_wide_words() {
        let mut words = [0u32; WORDS];
        words[23] = 0x1000000;
        Ranluxpp::from_ranlux(&words, 0, 408);
    }
}
