/// Interface shared by the subtract-with-borrow generators.
///
/// Implementations are selected statically, so dispatch happens once
/// outside the per-number loop.
pub trait Generator {
    /// Independent subtract-with-borrow streams advanced together.
    const LANES: usize;

    /// Advances every lane by the configured skip distance.
    fn advance(&mut self);

    /// Advances every lane by `nstates` blocks of 24 steps without delivering numbers.
    fn skip(&mut self, nstates: u64);

    /// Returns the next number in [0, 1) with 24 random bits.
    fn next_f32(&mut self) -> f32;

    /// Fills `out` with the numbers `next_f32` would return.
    fn fill_f32(&mut self, out: &mut [f32]);

    /// Advances once and writes the whole state repacked into 18 32-bit words per lane.
    /// `out` must hold exactly `18 * LANES` words.
    fn next_state_words(&mut self, out: &mut [u32]);
}

/// 2**-24.
pub(crate) const TWOM24: f32 = 1.0 / (1u32 << 24) as f32;

/// 32-bit words produced by repacking one 24-word state.
pub const PACKED_WORDS: usize = 18;
