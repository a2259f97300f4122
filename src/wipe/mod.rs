//! Screen transitions between two captured frames.
//!
//! A wipe owns three 8-bit paletted buffers of the same size: the frame
//! being left, the frame being entered, and the visible result. Each call to
//! [`ScreenWipe::run`] advances the effect by a number of tics and reports
//! whether the visible buffer now shows the new frame.

mod color;
mod melt;

use log::debug;
use thiserror::Error;

use crate::random::RandomStream;

pub use color::ColorTransform;
pub use melt::Melt;

/// Problems with the frames handed to a wipe.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WipeError {
    /// A frame does not hold `width * height` pixels.
    #[error("wipe frame has {found} pixels, expected {expected}")]
    FrameSize {
        /// Pixels the screen size calls for.
        expected: usize,
        /// Pixels the frame holds.
        found: usize,
    },
    /// The melt moves pixels in pairs and needs an even width.
    #[error("melt needs an even screen width, got {width}")]
    OddWidth {
        /// The requested width.
        width: usize,
    },
    /// No effect has this index.
    #[error("no wipe with index {index}")]
    UnknownKind {
        /// The requested index.
        index: i32,
    },
}

/// Selects one of the interchangeable effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WipeKind {
    /// Every pixel steps towards its new value.
    ColorTransform = 0,
    /// Columns slide down with staggered starts.
    Melt = 1,
}

impl WipeKind {
    /// The effect with the given menu index.
    ///
    /// # Errors
    /// Returns [`WipeError::UnknownKind`] for any other index.
    pub const fn from_index(index: i32) -> Result<Self, WipeError> {
        match index {
            0 => Ok(Self::ColorTransform),
            1 => Ok(Self::Melt),
            _ => Err(WipeError::UnknownKind { index }),
        }
    }
}

/// The buffers an effect reads and writes, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WipeFrames {
    /// Pixels per row.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Frame being left.
    pub start: Vec<u8>,
    /// Frame being entered.
    pub end: Vec<u8>,
    /// What is on screen now.
    pub screen: Vec<u8>,
}

impl WipeFrames {
    /// Checks both frames against the screen size. The visible buffer starts
    /// as a copy of `start`.
    ///
    /// # Errors
    /// Returns [`WipeError::FrameSize`] when either frame has the wrong size.
    pub fn new(width: usize, height: usize, start: Vec<u8>, end: Vec<u8>) -> Result<Self, WipeError> {
        let expected = width * height;
        for frame in [&start, &end] {
            if frame.len() != expected {
                return Err(WipeError::FrameSize {
                    expected,
                    found: frame.len(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            screen: start.clone(),
            start,
            end,
        })
    }
}

/// The three phases every effect goes through.
pub trait WipeEffect {
    /// Prepares the effect; runs once before the first step.
    fn init(&mut self, frames: &mut WipeFrames, rng: &mut RandomStream);

    /// Advances by `ticks` tics. Returns `true` once nothing changed.
    fn step(&mut self, frames: &mut WipeFrames, ticks: i32) -> bool;

    /// Releases per-run state after the last step.
    fn exit(&mut self, frames: &mut WipeFrames);
}

/// A wipe in progress.
pub struct ScreenWipe {
    frames: WipeFrames,
    effect: Box<dyn WipeEffect>,
    started: bool,
    done: bool,
}

impl ScreenWipe {
    /// Sets up a `kind` wipe from `start` to `end`.
    ///
    /// # Errors
    /// Returns [`WipeError::FrameSize`] for mis-sized frames and
    /// [`WipeError::OddWidth`] for a melt on an odd-width screen.
    ///
    /// # Examples
    /// ```
    /// use gloom::random::RandomStream;
    /// use gloom::wipe::{ScreenWipe, WipeKind};
    ///
    /// let mut wipe = ScreenWipe::new(WipeKind::Melt, 4, 2, vec![0; 8], vec![9; 8]).unwrap();
    /// let mut rng = RandomStream::new(0);
    /// while !wipe.run(1, &mut rng) {}
    /// assert_eq!(wipe.screen(), &[9; 8]);
    /// ```
    pub fn new(
        kind: WipeKind,
        width: usize,
        height: usize,
        start: Vec<u8>,
        end: Vec<u8>,
    ) -> Result<Self, WipeError> {
        let frames = WipeFrames::new(width, height, start, end)?;
        let effect: Box<dyn WipeEffect> = match kind {
            WipeKind::ColorTransform => Box::new(ColorTransform),
            WipeKind::Melt => {
                if width % 2 != 0 {
                    return Err(WipeError::OddWidth { width });
                }
                Box::new(Melt::default())
            }
        };
        Ok(Self {
            frames,
            effect,
            started: false,
            done: false,
        })
    }

    /// Runs `ticks` tics of the effect, initialising it on the first call.
    /// Returns `true` when the wipe has finished; later calls do nothing.
    pub fn run(&mut self, ticks: i32, rng: &mut RandomStream) -> bool {
        if self.done {
            return true;
        }
        if !self.started {
            self.started = true;
            self.effect.init(&mut self.frames, rng);
            debug!("wipe started ({}x{})", self.frames.width, self.frames.height);
        }
        if self.effect.step(&mut self.frames, ticks) {
            self.effect.exit(&mut self.frames);
            self.done = true;
            debug!("wipe finished");
        }
        self.done
    }

    /// The visible buffer.
    #[must_use]
    pub fn screen(&self) -> &[u8] {
        &self.frames.screen
    }

    /// Whether the wipe has finished.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::color(0, WipeKind::ColorTransform)]
    #[case::melt(1, WipeKind::Melt)]
    fn kinds_follow_menu_order(#[case] index: i32, #[case] kind: WipeKind) {
        assert_eq!(WipeKind::from_index(index), Ok(kind));
    }

    #[rstest]
    fn unknown_index_is_rejected() {
        assert_eq!(
            WipeKind::from_index(2),
            Err(WipeError::UnknownKind { index: 2 })
        );
    }

    #[rstest]
    fn frames_must_match_screen() {
        let err = WipeFrames::new(4, 4, vec![0; 16], vec![0; 15]).expect_err("short frame");
        assert_eq!(
            err,
            WipeError::FrameSize {
                expected: 16,
                found: 15
            }
        );
    }

    #[rstest]
    fn melt_needs_even_width() {
        let err = ScreenWipe::new(WipeKind::Melt, 3, 1, vec![0; 3], vec![0; 3])
            .err()
            .expect("odd width");
        assert_eq!(err, WipeError::OddWidth { width: 3 });
    }

    #[rstest]
    #[case::color(WipeKind::ColorTransform)]
    #[case::melt(WipeKind::Melt)]
    fn every_wipe_ends_on_the_new_frame(#[case] kind: WipeKind) {
        let start: Vec<u8> = (0..=250_u8).cycle().take(16 * 24).collect();
        let end: Vec<u8> = start.iter().map(|p| p.wrapping_mul(3)).collect();
        let mut wipe = ScreenWipe::new(kind, 16, 24, start, end.clone()).expect("valid frames");
        let mut rng = RandomStream::new(0);
        let mut calls = 0;
        while !wipe.run(4, &mut rng) {
            calls += 1;
            assert!(calls < 500, "wipe never finished");
        }
        assert_eq!(wipe.screen(), end.as_slice());
        assert!(wipe.run(4, &mut rng));
    }

    #[rstest]
    fn melt_draws_only_from_the_menu_stream() {
        let mut wipe =
            ScreenWipe::new(WipeKind::Melt, 8, 4, vec![0; 32], vec![1; 32]).expect("valid frames");
        let mut rng = RandomStream::new(0);
        wipe.run(1, &mut rng);
        assert_eq!(rng.gameplay_index(), 0);
    }
}
