//! Column melt: the old frame slides down, revealing the new one.
//!
//! Pixels move in horizontal pairs. Each pair-column waits a few tics
//! before it starts falling; neighbouring columns start at most one tic
//! apart, which gives the torn edge.

use super::{WipeEffect, WipeFrames};
use crate::random::RandomStream;

/// Longest initial delay, in tics.
const MAX_DELAY: i32 = 15;
/// Rows a column falls per tic once it is moving fast.
const FAST_FALL: usize = 8;
/// Below this row a column is still accelerating.
const ACCEL_ROWS: usize = 16;

/// Column state: negative values count down the start delay, others are
/// the row the old frame's top edge has reached.
#[derive(Clone, Debug, Default)]
pub struct Melt {
    columns: Vec<i32>,
}

impl Melt {
    /// Current per-column positions.
    #[must_use]
    pub fn columns(&self) -> &[i32] {
        &self.columns
    }

    /// Draws start delays as a bounded random walk from the menu stream.
    fn seed_columns(&mut self, count: usize, rng: &mut RandomStream) {
        self.columns.clear();
        let mut y = -(rng.m_random() % 16);
        for i in 0..count {
            if i > 0 {
                y += rng.m_random() % 3 - 1;
                y = y.clamp(-MAX_DELAY, 0);
            }
            self.columns.push(y);
        }
    }
}

fn copy_pair(from: &[u8], from_row: usize, to: &mut [u8], to_row: usize, col: usize, width: usize) {
    let src = from_row * width + col * 2;
    let dst = to_row * width + col * 2;
    if let (Some(pair), Some(slot)) = (from.get(src..src + 2), to.get_mut(dst..dst + 2)) {
        slot.copy_from_slice(pair);
    }
}

impl WipeEffect for Melt {
    fn init(&mut self, frames: &mut WipeFrames, rng: &mut RandomStream) {
        frames.screen.copy_from_slice(&frames.start);
        self.seed_columns(frames.width / 2, rng);
    }

    fn step(&mut self, frames: &mut WipeFrames, ticks: i32) -> bool {
        let (width, height) = (frames.width, frames.height);
        let WipeFrames {
            start, end, screen, ..
        } = frames;
        let mut done = true;
        for _ in 0..ticks {
            for (col, y) in self.columns.iter_mut().enumerate() {
                if *y < 0 {
                    *y += 1;
                    done = false;
                    continue;
                }
                let top = usize::try_from(*y).unwrap_or(height);
                if top >= height {
                    continue;
                }
                let speed = if top < ACCEL_ROWS { top + 1 } else { FAST_FALL };
                let fall = speed.min(height - top);
                for row in top..top + fall {
                    copy_pair(end, row, screen, row, col, width);
                }
                let edge = top + fall;
                for (src_row, row) in (edge..height).enumerate() {
                    copy_pair(start, src_row, screen, row, col, width);
                }
                *y = i32::try_from(edge).unwrap_or(i32::MAX);
                done = false;
            }
        }
        done
    }

    fn exit(&mut self, _frames: &mut WipeFrames) {
        self.columns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(37)]
    #[case(200)]
    fn start_delays_are_a_bounded_walk(#[case] seed: u8) {
        let mut melt = Melt::default();
        melt.seed_columns(160, &mut RandomStream::new(seed));
        let columns = melt.columns();
        assert_eq!(columns.len(), 160);
        assert!(columns.iter().all(|y| (-MAX_DELAY..=0).contains(y)));
        assert!(columns.windows(2).all(|w| (w[0] - w[1]).abs() <= 1));
    }

    #[rstest]
    fn falling_column_accelerates() {
        let mut frames = WipeFrames::new(2, 40, vec![1; 80], vec![2; 80]).expect("valid frames");
        let mut melt = Melt {
            columns: vec![0],
        };
        frames.screen.copy_from_slice(&frames.start);
        for expected in [1, 3, 7, 15, 31, 39, 40] {
            assert!(!melt.step(&mut frames, 1));
            assert_eq!(melt.columns(), &[expected]);
        }
        assert!(melt.step(&mut frames, 1));
        assert_eq!(frames.screen, frames.end);
    }

    #[rstest]
    fn delayed_column_holds_the_old_frame() {
        let mut frames = WipeFrames::new(4, 4, vec![1; 16], vec![2; 16]).expect("valid frames");
        let mut melt = Melt {
            columns: vec![0, -3],
        };
        melt.step(&mut frames, 1);
        assert_eq!(melt.columns(), &[1, -2]);
        assert_eq!(&frames.screen[..4], &[2, 2, 1, 1]);
    }
}
