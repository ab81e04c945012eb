//! Seedable source for the deep-focus unlock draw.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

/// Focus streak needed before deep focus can be drawn at all.
pub const DEEP_FOCUS_UNLOCK_STREAK: u32 = 2;

/// Decides whether a new focus phase becomes deep focus.
#[derive(Debug, Clone)]
pub struct DeepFocusRoll {
    rng: Mcg128Xsl64,
}

impl DeepFocusRoll {
    /// Deterministic draws, for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }

    /// Below the unlock streak no random number is consumed.
    pub fn roll(&mut self, consecutive_focus_sessions: u32, probability: f64) -> bool {
        if consecutive_focus_sessions < DEEP_FOCUS_UNLOCK_STREAK {
            return false;
        }
        self.rng.gen::<f64>() < probability
    }
}
