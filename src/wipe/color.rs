//! Per-pixel fade towards the new frame.

use super::{WipeEffect, WipeFrames};
use crate::random::RandomStream;

/// Moves every pixel value up or down by `ticks` per step until it matches
/// the new frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColorTransform;

impl WipeEffect for ColorTransform {
    fn init(&mut self, frames: &mut WipeFrames, _rng: &mut RandomStream) {
        frames.screen.copy_from_slice(&frames.start);
    }

    fn step(&mut self, frames: &mut WipeFrames, ticks: i32) -> bool {
        let mut changed = false;
        for (pixel, &target) in frames.screen.iter_mut().zip(&frames.end) {
            let current = i32::from(*pixel);
            let goal = i32::from(target);
            let next = if current > goal {
                (current - ticks).max(goal)
            } else if current < goal {
                (current + ticks).min(goal)
            } else {
                continue;
            };
            *pixel = u8::try_from(next).unwrap_or(target);
            changed = true;
        }
        !changed
    }

    fn exit(&mut self, _frames: &mut WipeFrames) {}
}
