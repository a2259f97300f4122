//! Per-tick ambient state threaded through every update.

use crate::random::RandomStream;
use crate::sound::SoundOutbox;

/// Clock, random stream and sound sink shared by all state machines.
///
/// Thinkers receive this explicitly rather than reaching for globals, so a
/// test can seed the stream and inspect the emitted sounds.
#[derive(Debug, Default, Clone)]
pub struct SimContext {
    /// Tics elapsed since the level started.
    pub level_time: i32,
    /// Shared random table cursors.
    pub rng: RandomStream,
    /// Sounds requested this tic.
    pub sounds: SoundOutbox,
}

impl SimContext {
    /// Fresh context at tic zero with the random cursors at `random_index`.
    #[must_use]
    pub fn new(random_index: u8) -> Self {
        Self {
            level_time: 0,
            rng: RandomStream::new(random_index),
            sounds: SoundOutbox::default(),
        }
    }
}
