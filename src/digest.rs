//! Default digest function: a deterministic folded-multiply mixer.
//!
//! Containers in this crate hash through the standard `BuildHasher` seam, so
//! any hasher plugs in. `DigestState` is the default: a fixed-seed mixer with
//! dedicated fast paths for integer writes (one multiply-fold per word) and a
//! chunked path for byte sequences. Keys that hash equal must compare equal
//! under the container's equality seam; that contract is the caller's.
//!
//! Float keys have no `Hash` impl in std because of NaN and -0.0. `FloatBits`
//! wraps `f32`/`f64` with bit-preserving equality and hashing so they can be
//! used as keys when that semantic is acceptable.

use core::hash::{BuildHasher, Hash, Hasher};

const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;
const SECRET: u64 = 0x9ddf_ea08_eb38_2d69;

/// Multiply-fold: full 128-bit product, xor of the two halves.
#[inline]
pub(crate) fn mix(a: u64, b: u64) -> u64 {
    let m = u128::from(a).wrapping_mul(u128::from(b));
    (m as u64) ^ ((m >> 64) as u64)
}

/// Deterministic `BuildHasher` producing the crate's default 64-bit digests.
///
/// Unlike `RandomState` this is stable across processes, which keeps bucket
/// layouts reproducible. Use `with_seed` when distinct instances must
/// disagree (or, in tests, agree on purpose).
#[derive(Clone, Copy, Debug)]
pub struct DigestState {
    seed: u64,
}

impl DigestState {
    pub const fn new() -> Self {
        Self { seed: GOLDEN }
    }

    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for DigestState {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildHasher for DigestState {
    type Hasher = DigestHasher;

    #[inline]
    fn build_hasher(&self) -> DigestHasher {
        DigestHasher { state: self.seed }
    }
}

/// Streaming state for `DigestState`. One folded multiply per 64-bit word.
#[derive(Clone, Debug)]
pub struct DigestHasher {
    state: u64,
}

impl Hasher for DigestHasher {
    #[inline]
    fn finish(&self) -> u64 {
        mix(self.state, SECRET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.state = mix(self.state ^ u64::from_le_bytes(word), GOLDEN);
        }
        // Length fold keeps zero-padded tails of different lengths distinct.
        self.state = mix(self.state ^ bytes.len() as u64, GOLDEN);
    }

    #[inline]
    fn write_u8(&mut self, v: u8) {
        self.write_u64(u64::from(v));
    }

    #[inline]
    fn write_u16(&mut self, v: u16) {
        self.write_u64(u64::from(v));
    }

    #[inline]
    fn write_u32(&mut self, v: u32) {
        self.write_u64(u64::from(v));
    }

    #[inline]
    fn write_u64(&mut self, v: u64) {
        self.state = mix(self.state ^ v, GOLDEN);
    }

    #[inline]
    fn write_u128(&mut self, v: u128) {
        self.write_u64(v as u64);
        self.write_u64((v >> 64) as u64);
    }

    #[inline]
    fn write_usize(&mut self, v: usize) {
        self.write_u64(v as u64);
    }
}

/// Bit-preserving float key wrapper.
///
/// Equality and hashing go through `to_bits`, so `NaN == NaN` holds for
/// identical payloads and `0.0 != -0.0`. That is the right semantic for a
/// key: it matches what was stored, bit for bit.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloatBits<T>(pub T);

macro_rules! float_bits_impl {
    ($f:ty, $write:ident) => {
        impl PartialEq for FloatBits<$f> {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                self.0.to_bits() == other.0.to_bits()
            }
        }

        impl Eq for FloatBits<$f> {}

        impl Hash for FloatBits<$f> {
            #[inline]
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.$write(self.0.to_bits());
            }
        }
    };
}

float_bits_impl!(f32, write_u32);
float_bits_impl!(f64, write_u64);
