//! Random number sources consumed by the simulation engine.
//!
//! Every tick takes one seed from a [`UniformSource`], so tests can swap in a
//! scripted sequence and parallel workers can each own a seeded stream. The
//! Bernoulli trials inside a tick come from [`TickDraws`], which keys each
//! draw by node and slot so that one node's draws never depend on another's.

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// SplitMix64 increment (the 64-bit golden ratio) used for stream derivation.
const STREAM_SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;
/// Mantissa width of an `f64`; draws keep the top 53 bits of a mixed word.
const UNIT_BITS: u32 = 53;
const UNIT_SCALE: f64 = 1.0 / (1_u64 << UNIT_BITS) as f64;

/// A source of uniform draws in `[0, 1)`.
pub trait UniformSource {
    /// Returns the next uniform draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Returns a 64-bit seed. The default scales one uniform draw, so it
    /// consumes exactly one draw.
    fn next_seed(&mut self) -> u64 {
        (self.next_uniform() * (1_u64 << UNIT_BITS) as f64) as u64
    }
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    fn next_uniform(&mut self) -> f64 {
        (**self).next_uniform()
    }

    fn next_seed(&mut self) -> u64 {
        (**self).next_seed()
    }
}

/// Adapts any [`rand::Rng`] into a [`UniformSource`].
///
/// # Examples
/// ```
/// use contagion_core::{SeededSource, UniformSource};
///
/// let mut left = SeededSource::from_seed(7);
/// let mut right = SeededSource::from_seed(7);
/// let draw = left.next_uniform();
/// assert!((0.0..1.0).contains(&draw));
/// assert_eq!(draw, right.next_uniform());
/// ```
#[derive(Clone, Debug)]
pub struct RngSource<R>(R);

impl<R: Rng> RngSource<R> {
    /// Wraps `rng`.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self(rng)
    }

    /// Gives access to the wrapped generator, for sampling helpers that need
    /// more than uniform floats.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.0
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    fn next_seed(&mut self) -> u64 {
        self.0.next_u64()
    }
}

/// The seeded generator used throughout the crate.
pub type SeededSource = RngSource<SmallRng>;

impl SeededSource {
    /// Creates a reproducible stream from `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// An empty script always yields `0.0`.
///
/// # Examples
/// ```
/// use contagion_core::{ScriptedSource, UniformSource};
///
/// let mut source = ScriptedSource::new(vec![0.25, 0.75]);
/// assert_eq!(source.next_uniform(), 0.25);
/// assert_eq!(source.next_uniform(), 0.75);
/// assert_eq!(source.next_uniform(), 0.25);
/// assert_eq!(source.draws(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    script: Vec<f64>,
    draws: usize,
}

impl ScriptedSource {
    /// Creates a source replaying `script`.
    #[must_use]
    pub fn new(script: Vec<f64>) -> Self {
        Self { script, draws: 0 }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl UniformSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        let draw = match self.script.len() {
            0 => 0.0,
            len => self.script[self.draws % len],
        };
        self.draws += 1;
        draw
    }
}

/// Random-access uniform draws for one tick.
///
/// Draw `(node, slot)` is a pure function of the tick seed, so a node that
/// skips its draws (because it is vaccinated, say) leaves every other node's
/// draws untouched. Two runs that share a tick seed therefore see the same
/// coin for every node and slot.
///
/// # Examples
/// ```
/// use contagion_core::{ScriptedSource, TickDraws};
///
/// let draws = TickDraws::from_source(&mut ScriptedSource::new(vec![0.5]));
/// let again = TickDraws::from_source(&mut ScriptedSource::new(vec![0.5]));
/// assert_eq!(draws.draw(3, 1), again.draw(3, 1));
/// assert!((0.0..1.0).contains(&draws.draw(3, 1)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickDraws {
    seed: u64,
}

impl TickDraws {
    /// Keys the tick on `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Takes exactly one seed from `rng`.
    pub fn from_source<S>(rng: &mut S) -> Self
    where
        S: UniformSource + ?Sized,
    {
        Self::new(rng.next_seed())
    }

    /// Draws for a later round keyed on the same seed.
    #[must_use]
    pub fn round(&self, round: usize) -> Self {
        Self::new(mix_seed(self.seed, round))
    }

    /// Uniform draw in `[0, 1)` for `slot` of `node`.
    #[must_use]
    pub fn draw(&self, node: usize, slot: usize) -> f64 {
        let word = mix_seed(mix_seed(self.seed, node), slot);
        (word >> (64 - UNIT_BITS)) as f64 * UNIT_SCALE
    }
}

/// Derives an independent stream seed for `index` from `base_seed`.
#[inline]
pub(crate) fn mix_seed(base_seed: u64, index: usize) -> u64 {
    splitmix64(base_seed ^ ((index as u64 + 1).wrapping_mul(STREAM_SEED_SPACING)))
}

#[inline]
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(STREAM_SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

/// Returns `seed`, or fresh entropy when none was configured.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}
