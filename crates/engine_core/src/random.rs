//! Per-purpose seeded random streams.
//!
//! Each purpose draws from its own generator, so adding a sparkle never
//! shifts the sequence that places decorations.

use rand::prelude::*;

/// What a random draw is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RandomClass {
    Decoration,
    Sparkle,
    RandomSkin,
}

impl RandomClass {
    pub const ALL: [RandomClass; 3] = [
        RandomClass::Decoration,
        RandomClass::Sparkle,
        RandomClass::RandomSkin,
    ];

    fn index(self) -> usize {
        match self {
            RandomClass::Decoration => 0,
            RandomClass::Sparkle => 1,
            RandomClass::RandomSkin => 2,
        }
    }
}

/// One `StdRng` per [`RandomClass`], all derived from a single stage seed.
pub struct RandomStreams {
    streams: Vec<StdRng>,
}

impl RandomStreams {
    pub fn new(seed: u64) -> Self {
        let streams = RandomClass::ALL
            .iter()
            .map(|class| {
                let salt = (class.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                StdRng::seed_from_u64(seed ^ salt)
            })
            .collect();
        Self { streams }
    }

    /// Uniform integer in `lo..=hi`.
    pub fn range(&mut self, class: RandomClass, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.streams[class.index()].gen_range(lo..=hi)
    }

    /// Uniform index in `0..len`; zero when `len` is zero.
    pub fn index(&mut self, class: RandomClass, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.streams[class.index()].gen_range(0..len)
    }
}
