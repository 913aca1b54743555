use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COHERENCE, FIELD_PERTURBATION, FIELD_RETENTION};
use crate::projection::clamp_coherence;

/// Sample band while the field is stable.
pub const STABLE_BAND: (f64, f64) = (0.70, 1.00);

/// Sample band when a perturbation fires.
pub const EXPLORATION_BAND: (f64, f64) = (0.40, 0.70);

/// Periodically recomputed coherence signal.
///
/// Each update blends the previous score with a fresh sample at a 3:1 ratio:
/// `score = 0.75 * score + 0.25 * sample`. Samples come from the stable band,
/// or from the exploration band with probability `FIELD_PERTURBATION`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoherenceField {
    score: f64,
    updates: u64,
}

impl Default for CoherenceField {
    fn default() -> Self {
        Self::new(DEFAULT_COHERENCE)
    }
}

impl CoherenceField {
    pub fn new(initial: f64) -> Self {
        Self {
            score: clamp_coherence(initial),
            updates: 0,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Blend in one sample. Out-of-range samples are clamped first.
    pub fn blend(&mut self, sample: f64) -> f64 {
        let sample = clamp_coherence(sample);
        let blended = FIELD_RETENTION * self.score + (1.0 - FIELD_RETENTION) * sample;
        self.score = clamp_coherence(blended);
        self.updates += 1;
        self.score
    }

    /// Draw a sample and blend it. Returns the new score.
    pub fn advance(&mut self, rng: &mut impl Rng) -> f64 {
        let (lo, hi) = if rng.random::<f64>() < FIELD_PERTURBATION {
            EXPLORATION_BAND
        } else {
            STABLE_BAND
        };
        let sample = rng.random_range(lo..=hi);
        self.blend(sample)
    }
}
