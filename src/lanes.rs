use super::codec::{repack_u32, WORDS};
use super::generator::{Generator, PACKED_WORDS, TWOM24};
use super::scalar::DEFAULT_STRIDE;
use super::swb::{seed_state, short_lag, sub_borrow};
use multiversion::multiversion;

// Lane parallel RANLUX. W independent generators share one program counter:
// word k of lane l is stored at x[k][l] so every step is a W wide vector operation
// with no dependency between lanes.

/// How lanes are seeded from a single integer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeedMode {
    /// Lane l is seeded with seed + l (wrapping).
    Distinct,
    /// Every lane is seeded with seed and duplicates the scalar generator.
    Same,
}

/// W lane RANLUX generator. Numbers are delivered word major with lanes interleaved:
/// after an advance, number i is word i / W of lane i % W.
#[derive(Clone, Eq, PartialEq)]
pub struct RanluxLanes<const W: usize> {
    /// State words, oldest first, one column per lane.
    x: [[u32; W]; WORDS],
    /// Carry bits.
    c: [u32; W],
    /// Blocks of 24 steps per advance.
    stride: u32,
    /// Next number to deliver, counted over all lanes.
    pos: usize,
}

/// Four lanes, one SSE2 register per word.
pub type RanluxX4 = RanluxLanes<4>;

/// Eight lanes, one AVX2 register per word.
pub type RanluxX8 = RanluxLanes<8>;

// As recommended, this Debug implementation does not expose internal state.
impl<const W: usize> core::fmt::Debug for RanluxLanes<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "RanluxLanes<{}> {{ stride: {} }}", W, self.stride)
    }
}

#[inline(always)]
fn lanes_block_step<const W: usize>(x: &mut [[u32; W]; WORDS], c: &mut [u32; W]) {
    for i in 0 .. WORDS {
        let lag = short_lag(i);
        for l in 0 .. W {
            let (d, b) = sub_borrow(x[lag][l], x[i][l], c[l]);
            x[i][l] = d;
            c[l] = b;
        }
    }
}

#[multiversion(targets = "simd")]
fn lanes_skip<const W: usize>(x: &mut [[u32; W]; WORDS], c: &mut [u32; W], nstates: u64) {
    for _ in 0 .. nstates {
        lanes_block_step(x, c);
    }
}

impl<const W: usize> RanluxLanes<W> {

    /// Creates a generator with the default stride and distinct lane seeds.
    pub fn new(seed: u32) -> Self {
        Self::with_seeding(seed, DEFAULT_STRIDE, SeedMode::Distinct)
    }

    pub fn with_stride(seed: u32, stride: u32) -> Self {
        Self::with_seeding(seed, stride, SeedMode::Distinct)
    }

    /// Creates a generator skipping 24 * stride steps per advance in every lane.
    pub fn with_seeding(seed: u32, stride: u32, mode: SeedMode) -> Self {
        assert!(W > 0, "at least one lane is required");
        assert!(stride > 0, "stride must be positive");
        let mut rnd = RanluxLanes { x: [[0; W]; WORDS], c: [0; W], stride, pos: WORDS * W };
        for l in 0 .. W {
            let lane_seed = match mode {
                SeedMode::Distinct => seed.wrapping_add(l as u32),
                SeedMode::Same => seed,
            };
            let (x, c) = seed_state(lane_seed);
            for k in 0 .. WORDS {
                rnd.x[k][l] = x[k];
            }
            rnd.c[l] = c;
        }
        rnd
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Returns the state words, oldest first, and the carry of one lane.
    pub fn lane_state(&self, lane: usize) -> ([u32; WORDS], u32) {
        let mut x = [0u32; WORDS];
        for (k, w) in x.iter_mut().enumerate() {
            *w = self.x[k][lane];
        }
        (x, self.c[lane])
    }

    /// Advances every lane by the skip distance.
    #[inline]
    pub fn advance(&mut self) {
        lanes_skip(&mut self.x, &mut self.c, self.stride as u64);
    }

    /// Advances every lane by `nstates` blocks of 24 steps.
    pub fn skip(&mut self, nstates: u64) {
        lanes_skip(&mut self.x, &mut self.c, nstates);
    }

    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        if self.pos >= WORDS * W {
            self.advance();
            self.pos = 0;
        }
        let x = self.x[self.pos / W][self.pos % W];
        self.pos += 1;
        x as f32 * TWOM24
    }

    pub fn fill_f32(&mut self, out: &mut [f32]) {
        for o in out.iter_mut() {
            if self.pos >= WORDS * W {
                self.advance();
                self.pos = 0;
            }
            *o = self.x[self.pos / W][self.pos % W] as f32 * TWOM24;
            self.pos += 1;
        }
    }

    /// Advances once and writes 18 * W dense 32-bit words. Words are repacked in
    /// delivery order, so consecutive input words come from neighbouring lanes.
    pub fn next_state_words(&mut self, out: &mut [u32]) {
        assert_eq!(PACKED_WORDS * W, out.len(), "output must hold 18 words per lane");
        self.advance();
        self.pos = WORDS * W;
        repack_u32(self.x.iter().flat_map(|word| word.iter().copied()), out);
    }
}

impl<const W: usize> Generator for RanluxLanes<W> {
    const LANES: usize = W;

    fn advance(&mut self) {
        RanluxLanes::advance(self)
    }

    fn skip(&mut self, nstates: u64) {
        RanluxLanes::skip(self, nstates)
    }

    #[inline]
    fn next_f32(&mut self) -> f32 {
        RanluxLanes::next_f32(self)
    }

    fn fill_f32(&mut self, out: &mut [f32]) {
        RanluxLanes::fill_f32(self, out)
    }

    fn next_state_words(&mut self, out: &mut [u32]) {
        RanluxLanes::next_state_words(self, out)
    }
}

#[cfg(test)] mod tests {
    use super::*;
    use super::super::scalar::Ranlux;

    /// Lane 0 of the first 24 * W numbers.
    fn lane0<const W: usize>(rnd: &mut RanluxLanes<W>) -> [f32; WORDS] {
        let mut out = [0f32; WORDS];
        for i in 0 .. WORDS * W {
            let x = rnd.next_f32();
            if i % W == 0 { out[i / W] = x; }
        }
        out
    }

    #[test] pub fn run_tests() {

        // Same seed lanes duplicate the scalar generator.
        let mut scalar = Ranlux::new(3124);
        scalar.skip(1000);
        let mut expected = [0f32; WORDS];
        scalar.fill_f32(&mut expected);

        let mut x4 = RanluxX4::with_seeding(3124, DEFAULT_STRIDE, SeedMode::Same);
        x4.skip(1000);
        let mut x8 = RanluxX8::with_seeding(3124, DEFAULT_STRIDE, SeedMode::Same);
        x8.skip(1000);
        assert_eq!(expected, lane0(&mut x4));
        assert_eq!(expected, lane0(&mut x8));
        for l in 0 .. 8 { assert_eq!(scalar.state(), x8.lane_state(l)); }

        // Distinct seeding gives lane l the scalar stream of seed + l.
        let mut x4 = RanluxX4::new(77);
        x4.advance();
        x4.advance();
        for l in 0 .. 4 {
            let mut scalar = Ranlux::new(77 + l as u32);
            scalar.advance();
            scalar.advance();
            assert_eq!(scalar.state(), x4.lane_state(l));
        }

        // Reproducible across instances and widths agree lane by lane.
        let mut a = RanluxX8::new(5);
        let mut b = RanluxX8::new(5);
        let mut c = RanluxX4::new(5);
        let mut buffer = [0f32; 500];
        a.fill_f32(&mut buffer);
        for &x in buffer.iter() { assert_eq!(x, b.next_f32()); }
        c.skip(3 * DEFAULT_STRIDE as u64 + 3);
        a.skip(3);
        for l in 0 .. 4 { assert_eq!(a.lane_state(l), c.lane_state(l)); }

        // Bulk words follow the interleaved delivery order.
        let mut words = [0u32; PACKED_WORDS * 4];
        x4.next_state_words(&mut words);
        let (lane0_state, _) = x4.lane_state(0);
        let (lane1_state, _) = x4.lane_state(1);
        assert_eq!((lane0_state[0] << 8) | (lane1_state[0] >> 16), words[0]);
    }
}
