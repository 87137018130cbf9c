//! Seeded permutation table and classic 2D gradient noise.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seed used by the studio when none is supplied.
pub const DEFAULT_SEED: u32 = 1337;

/// Immutable 512-entry permutation table for gradient noise.
///
/// The first 256 entries are a seeded shuffle of `0..=255`; the second half
/// repeats the first so corner lookups never need a modulo.
#[derive(Clone)]
pub struct NoiseTable {
    perm: [u8; 512],
    seed: u32,
}

impl std::fmt::Debug for NoiseTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseTable").field("seed", &self.seed).finish_non_exhaustive()
    }
}

impl Default for NoiseTable {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl NoiseTable {
    /// Builds the table for `seed`. Identical seeds give identical tables.
    pub fn new(seed: u32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);

        let mut base: Vec<u8> = (0..=255u8).collect();
        base.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = base[i & 255];
        }

        Self { perm, seed }
    }

    /// The seed this table was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Raw permutation entries.
    pub fn permutation(&self) -> &[u8; 512] {
        &self.perm
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Classic 2D Perlin noise, approximately in [-1, 1].
    pub fn evaluate(&self, x: f32, y: f32) -> f32 {
        let fx = x.floor();
        let fy = y.floor();
        let xi = ((fx as i32) & 255) as usize;
        let yi = ((fy as i32) & 255) as usize;

        let x = x - fx;
        let y = y - fy;
        let u = fade(x);
        let v = fade(y);

        let a = self.p(xi) + yi;
        let b = self.p(xi + 1) + yi;

        lerp(
            lerp(grad(self.p(a), x, y), grad(self.p(b), x - 1.0, y), u),
            lerp(
                grad(self.p(a + 1), x, y - 1.0),
                grad(self.p(b + 1), x - 1.0, y - 1.0),
                u,
            ),
            v,
        )
    }
}

/// Builds the shared noise table once at startup.
pub fn init_noise(seed: u32) -> NoiseTable {
    NoiseTable::new(seed)
}

/// Quintic fade curve `t^3 (t (6t - 15) + 10)`.
#[inline(always)]
pub(crate) fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Gradient dot product selected by the low 3 bits of `hash`.
///
/// Bit 2 swaps the axes, bit 0 negates `u`, bit 1 negates the doubled `v`.
#[inline(always)]
pub(crate) fn grad(hash: usize, x: f32, y: f32) -> f32 {
    let h = hash & 7;
    let (u, v) = if h < 4 { (x, y) } else { (y, x) };
    let u = if h & 1 != 0 { -u } else { u };
    let v = if h & 2 != 0 { -2.0 * v } else { 2.0 * v };
    u + v
}
