use super::codec::{is_state, repack_u32, to_lcg, to_ranlux, WORDS};
use super::generator::{Generator, PACKED_WORDS, TWOM24};
use super::lcg::{jump_multiplier, mul_mod, U576};
use super::swb::{block_step, seed_state};
#[cfg(feature = "serde")] use serde::{Deserialize, Serialize};

/// Default number of 24-word blocks per advance (skip distance 408).
pub const DEFAULT_STRIDE: u32 = 17;

/// How a generator advances by its skip distance.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdvanceMode {
    /// Repeated subtract-with-borrow steps.
    Direct,
    /// One multiplication by the jump multiplier in the LCG domain.
    Lcg,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Eq, PartialEq)]
enum Advance {
    Direct,
    Lcg(U576),
}

/// Scalar RANLUX generator. Delivers 24 numbers per advance of 24 * stride steps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Eq, PartialEq)]
pub struct Ranlux {
    /// State words, oldest first. Only the low 24 bits are used.
    x: [u32; WORDS],
    /// Carry bit.
    c: u32,
    /// Blocks of 24 steps per advance.
    stride: u32,
    /// Next word to deliver.
    pos: usize,
    advance: Advance,
}

// As recommended, this Debug implementation does not expose internal state.
impl core::fmt::Debug for Ranlux {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Ranlux {{ stride: {} }}", self.stride)
    }
}

impl Ranlux {

    /// Creates a generator with the default stride and direct stepping.
    pub fn new(seed: u32) -> Self {
        Self::with_stride(seed, DEFAULT_STRIDE)
    }

    pub fn with_stride(seed: u32, stride: u32) -> Self {
        Self::with_mode(seed, stride, AdvanceMode::Direct)
    }

    /// Creates a generator skipping 24 * stride steps per advance.
    /// The first number requested triggers an advance.
    pub fn with_mode(seed: u32, stride: u32, mode: AdvanceMode) -> Self {
        let (x, c) = seed_state(seed);
        Self::from_state(x, c, stride, mode)
    }

    /// Creates a generator from an explicit state, oldest word first.
    pub fn from_state(x: [u32; WORDS], c: u32, stride: u32, mode: AdvanceMode) -> Self {
        assert!(stride > 0, "stride must be positive");
        assert!(is_state(&x, c), "state words must be below 2**24 and the carry at most 1");
        let advance = match mode {
            AdvanceMode::Direct => Advance::Direct,
            AdvanceMode::Lcg => Advance::Lcg(jump_multiplier(24 * stride as u64)),
        };
        Ranlux { x, c, stride, pos: WORDS, advance }
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Subtract-with-borrow steps per advance.
    #[inline]
    pub fn skip_distance(&self) -> u64 {
        24 * self.stride as u64
    }

    pub fn mode(&self) -> AdvanceMode {
        match self.advance {
            Advance::Direct => AdvanceMode::Direct,
            Advance::Lcg(_) => AdvanceMode::Lcg,
        }
    }

    /// Returns the state words, oldest first, and the carry.
    pub fn state(&self) -> ([u32; WORDS], u32) {
        (self.x, self.c)
    }

    /// Returns the state in the LCG domain.
    pub fn lcg_state(&self) -> U576 {
        to_lcg(&self.x, self.c)
    }

    /// Advances the state by the skip distance.
    pub fn advance(&mut self) {
        match &self.advance {
            Advance::Direct => {
                for _ in 0 .. self.stride {
                    self.c = block_step(&mut self.x, self.c);
                }
            }
            Advance::Lcg(a) => {
                let x = mul_mod(a, &to_lcg(&self.x, self.c));
                (self.x, self.c) = to_ranlux(&x);
            }
        }
    }

    /// Advances the state by `nstates` blocks of 24 steps.
    pub fn skip(&mut self, nstates: u64) {
        for _ in 0 .. nstates {
            self.c = block_step(&mut self.x, self.c);
        }
    }

    /// Returns the next number in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        if self.pos >= WORDS {
            self.advance();
            self.pos = 0;
        }
        let x = self.x[self.pos];
        self.pos += 1;
        x as f32 * TWOM24
    }

    /// Fills `out` with the next numbers.
    pub fn fill_f32(&mut self, out: &mut [f32]) {
        let mut i = 0;
        while i < out.len() {
            if self.pos >= WORDS {
                self.advance();
                self.pos = 0;
            }
            let n = (WORDS - self.pos).min(out.len() - i);
            for (o, &x) in out[i .. i + n].iter_mut().zip(self.x[self.pos .. self.pos + n].iter()) {
                *o = x as f32 * TWOM24;
            }
            self.pos += n;
            i += n;
        }
    }

    /// Advances once and returns the state as 18 dense 32-bit words.
    /// The words of the state count as delivered.
    pub fn next_state_words(&mut self) -> [u32; PACKED_WORDS] {
        self.advance();
        self.pos = WORDS;
        let mut out = [0u32; PACKED_WORDS];
        repack_u32(self.x.iter().copied(), &mut out);
        out
    }
}

impl Generator for Ranlux {
    const LANES: usize = 1;

    fn advance(&mut self) {
        Ranlux::advance(self)
    }

    fn skip(&mut self, nstates: u64) {
        Ranlux::skip(self, nstates)
    }

    #[inline]
    fn next_f32(&mut self) -> f32 {
        Ranlux::next_f32(self)
    }

    fn fill_f32(&mut self, out: &mut [f32]) {
        Ranlux::fill_f32(self, out)
    }

    fn next_state_words(&mut self, out: &mut [u32]) {
        out.copy_from_slice(&Ranlux::next_state_words(self));
    }
}

#[cfg(test)] mod tests {
    use super::*;

    #[test] pub fn run_tests() {

        let mut rnd = Ranlux::new(3124);
        let first = rnd.next_f32();
        assert_eq!(4470334.0 * TWOM24, first);
        let (x, c) = rnd.state();
        assert_eq!([4470334, 15232478, 6155052, 11202321, 379917], x[.. 5]);
        assert_eq!(1, c);

        // Seed 0 is the default seed, not the all-zero state.
        let mut zero = Ranlux::new(0);
        let mut default = Ranlux::new(super::super::swb::DEFAULT_SEED);
        let mut x = [0f32; 48];
        let mut y = [0f32; 48];
        zero.fill_f32(&mut x);
        default.fill_f32(&mut y);
        assert_eq!(x, y);

        // Advancing by multiplication in the LCG domain reproduces direct stepping.
        for seed in [0, 100] {
            let mut direct = Ranlux::with_mode(seed, DEFAULT_STRIDE, AdvanceMode::Direct);
            let mut lcg = Ranlux::with_mode(seed, DEFAULT_STRIDE, AdvanceMode::Lcg);
            for _ in 0 .. 2000 {
                direct.advance();
                lcg.advance();
                assert_eq!(direct.state(), lcg.state());
                assert_eq!(direct.lcg_state(), lcg.lcg_state());
            }
        }

        let mut r: u64 = 0;
        let mut rnd = || -> u64 { r = r.wrapping_mul(0xd1342543de82ef95).wrapping_add(0xffff); r };

        for _ in 0 .. 1<<4 {
            let seed = rnd() as u32;
            let stride = 1 + (rnd() % 20) as u32;
            let mut g1 = Ranlux::with_stride(seed, stride);
            let mut g2 = Ranlux::with_mode(seed, stride, AdvanceMode::Lcg);
            let n = (rnd() % 200) as usize;
            let mut buffer = [0f32; 200];
            g1.fill_f32(&mut buffer[.. n]);
            for &x in buffer[.. n].iter() {
                assert!((0.0 .. 1.0).contains(&x));
                assert_eq!(x, g2.next_f32());
            }

            // Skipping blocks equals advancing with stride 1.
            let mut g3 = Ranlux::with_stride(seed, 1);
            let mut g4 = Ranlux::with_stride(seed, 1);
            g3.skip(stride as u64);
            for _ in 0 .. stride { g4.advance(); }
            assert_eq!(g3.state(), g4.state());

            let mut packed = [0u32; PACKED_WORDS];
            Generator::next_state_words(&mut g3, &mut packed);
            let (x, _) = g3.state();
            assert_eq!((x[0] << 8) | (x[1] >> 16), packed[0]);
            assert_eq!((x[22] << 24) | x[23], packed[17]);
        }
    }

    #[test] #[should_panic] pub fn rejects_wide_words() {
        let mut x = [0u32; WORDS];
        x[7] = 1 << 24;
        Ranlux::from_state(x, 0, DEFAULT_STRIDE, AdvanceMode::Lcg);
    }

    #[test] #[should_panic] pub fn rejects_wide_carry() {
        Ranlux::from_state([1; WORDS], 2, DEFAULT_STRIDE, AdvanceMode::Direct);
    }
}
