//! RANLUX random number generators.
//!
//! RANLUX is the subtract-with-borrow generator x[n] = x[n - 10] - x[n - 24] - c (mod 2**24)
//! of Marsaglia and Zaman, decimated as proposed by Lüscher. The same sequence is the
//! linear congruential generator x <- a * x mod m with m = 2**576 - 2**240 + 1, which
//! RANLUX++ (Sibidanov) uses to skip any distance with one multiplication.
//!
//! - [`Ranlux`], [`RanluxX4`], [`RanluxX8`]: scalar and lane parallel generators.
//! - [`Ranluxpp`]: the LCG form, delivering all 576 bits of every state.
//! - [`RanluxJames`], [`RanluxppJames`]: drop-in emulations of the FORTRAN routines.

pub mod codec;
pub mod error;
pub mod generator;
pub mod james;
pub mod lanes;
pub mod lcg;
pub mod ranluxpp;
pub mod scalar;
pub mod stream;
pub mod swb;

pub use error::Error;
pub use generator::Generator;
pub use james::{James, LcgSkip, Position, RanluxJames, RanluxppJames, SaveVector, Skipper, SwbSkip};
pub use lanes::{RanluxLanes, RanluxX4, RanluxX8, SeedMode};
pub use lcg::U576;
pub use ranluxpp::Ranluxpp;
pub use scalar::{AdvanceMode, Ranlux};
pub use stream::WordSink;
pub use rand_core::{RngCore, SeedableRng};
