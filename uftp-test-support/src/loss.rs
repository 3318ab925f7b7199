//! Frame loss injection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Which frames to drop.
#[derive(Debug, Clone)]
pub enum LossPattern {
    /// Pass everything.
    None,
    /// Drop every Nth frame.
    Periodic { every_n: usize },
    /// Drop frames with the given probability.
    Random { probability: f64 },
    /// Drop the first frame seen for each listed sequence number, so
    /// retransmissions pass.
    Specific { sequences: Vec<i32> },
}

/// Decides which frames a lossy transport swallows.
///
/// Seeded, so probabilistic runs are reproducible.
pub struct LossGenerator {
    pattern: LossPattern,
    frames_seen: usize,
    dropped: usize,
    rng: StdRng,
}

impl LossGenerator {
    pub fn new(pattern: LossPattern) -> Self {
        Self::with_seed(pattern, 0)
    }

    pub fn with_seed(pattern: LossPattern, seed: u64) -> Self {
        Self {
            pattern,
            frames_seen: 0,
            dropped: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn none() -> Self {
        Self::new(LossPattern::None)
    }

    pub fn periodic(every_n: usize) -> Self {
        Self::new(LossPattern::Periodic { every_n })
    }

    pub fn random(probability: f64, seed: u64) -> Self {
        Self::with_seed(
            LossPattern::Random {
                probability: probability.clamp(0.0, 1.0),
            },
            seed,
        )
    }

    pub fn specific(sequences: impl IntoIterator<Item = i32>) -> Self {
        Self::new(LossPattern::Specific {
            sequences: sequences.into_iter().collect(),
        })
    }

    /// Decide whether to drop the frame carrying `seq`.
    pub fn should_drop(&mut self, seq: i32) -> bool {
        self.frames_seen += 1;
        let drop = match &mut self.pattern {
            LossPattern::None => false,
            LossPattern::Periodic { every_n } => *every_n > 0 && self.frames_seen % *every_n == 0,
            LossPattern::Random { probability } => self.rng.gen::<f64>() < *probability,
            LossPattern::Specific { sequences } => {
                match sequences.iter().position(|&s| s == seq) {
                    Some(pos) => {
                        sequences.remove(pos);
                        true
                    }
                    None => false,
                }
            }
        };

        if drop {
            self.dropped += 1;
        }
        drop
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
