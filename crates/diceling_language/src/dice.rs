//! Random sources for dice rolls.
//!
//! The VM never touches a global generator. It rolls through a
//! [`DiceSource`], so tests can seed or script every face.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Produces single die faces.
pub trait DiceSource {
    /// Rolls one die with `sides` faces, returning a value in `1..=sides`.
    /// Dice with no faces (`sides <= 0`) roll 0.
    fn roll(&mut self, sides: i64) -> i64;
}

impl<D: DiceSource + ?Sized> DiceSource for &mut D {
    fn roll(&mut self, sides: i64) -> i64 {
        (**self).roll(sides)
    }
}

/// Dice backed by a [`rand`] generator.
#[derive(Clone, Debug)]
pub struct RngDice<R = ChaCha8Rng> {
    rng: R,
}

impl RngDice {
    /// Deterministic dice for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Dice seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> RngDice<R> {
    /// Wraps an existing generator.
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DiceSource for RngDice<R> {
    fn roll(&mut self, sides: i64) -> i64 {
        if sides <= 0 {
            return 0;
        }
        self.rng.gen_range(1..=sides)
    }
}

/// Replays a fixed list of faces, then keeps returning the last one.
///
/// Faces are clamped into `1..=sides` so a script written for a d20 still
/// behaves on a d6.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    faces: Vec<i64>,
    next: usize,
}

impl ScriptedDice {
    /// Creates dice that roll `faces` in order.
    #[must_use]
    pub fn new(faces: impl Into<Vec<i64>>) -> Self {
        Self {
            faces: faces.into(),
            next: 0,
        }
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self, sides: i64) -> i64 {
        if sides <= 0 {
            return 0;
        }
        let face = self
            .faces
            .get(self.next)
            .or_else(|| self.faces.last())
            .copied()
            .unwrap_or(1);
        self.next += 1;
        face.clamp(1, sides)
    }
}
