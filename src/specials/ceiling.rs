//! Moving ceilings and crushers.

use log::debug;

use super::active::{ActiveListError, Stasis};
use super::plane::{MoveResult, Plane, PlaneStep, SpecialEnv};
use crate::constants::CEILSPEED;
use crate::game::World;
use crate::numeric::Fixed;
use crate::sound::{Sfx, SoundOrigin};
use crate::thinker::{ThinkOutcome, Thinker};

/// Ceiling behaviours, numbered as they are archived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CeilingKind {
    /// Lowers to the floor and stops.
    LowerToFloor = 0,
    /// Raises to the highest neighbouring ceiling and stops.
    RaiseToHighest = 1,
    /// Lowers to 8 units above the floor and stops.
    LowerAndCrush = 2,
    /// Crushes down and back up until stopped.
    CrushAndRaise = 3,
    /// Crushes at double speed and never slows.
    FastCrushAndRaise = 4,
    /// Like [`CeilingKind::CrushAndRaise`] with no movement sound.
    SilentCrushAndRaise = 5,
}

impl CeilingKind {
    /// The kind archived as `value`.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::LowerToFloor,
            1 => Self::RaiseToHighest,
            2 => Self::LowerAndCrush,
            3 => Self::CrushAndRaise,
            4 => Self::FastCrushAndRaise,
            5 => Self::SilentCrushAndRaise,
            _ => return None,
        })
    }

    /// Kinds that bounce between top and bottom until stopped.
    #[must_use]
    pub const fn is_perpetual(self) -> bool {
        matches!(
            self,
            Self::CrushAndRaise | Self::FastCrushAndRaise | Self::SilentCrushAndRaise
        )
    }
}

/// A ceiling mover. `direction` is `1` up, `-1` down and `0` in stasis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ceiling {
    /// Behaviour.
    pub kind: CeilingKind,
    /// Sector being moved.
    pub sector: usize,
    /// Lowest point of travel.
    pub bottom_height: Fixed,
    /// Highest point of travel.
    pub top_height: Fixed,
    /// Distance per tic.
    pub speed: Fixed,
    /// Whether it damages what it cannot pass.
    pub crush: bool,
    /// Current direction.
    pub direction: i32,
    /// Tag it was started with.
    pub tag: i32,
    /// Direction to resume with after stasis.
    pub old_direction: i32,
}

impl Stasis for Ceiling {
    fn tag(&self) -> i32 {
        self.tag
    }

    fn in_stasis(&self) -> bool {
        self.direction == 0
    }

    fn enter_stasis(&mut self) {
        self.old_direction = self.direction;
        self.direction = 0;
    }

    fn leave_stasis(&mut self) {
        self.direction = self.old_direction;
    }
}

impl Ceiling {
    const fn step(&self, dest: Fixed, crush: bool) -> PlaneStep {
        PlaneStep {
            sector: self.sector,
            plane: Plane::Ceiling,
            speed: self.speed,
            dest,
            crush,
            direction: self.direction,
        }
    }

    /// Advances one tic.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        let origin = SoundOrigin::Sector(self.sector);
        let res = match self.direction {
            1 => env.move_plane(self.step(self.top_height, false)),
            -1 => env.move_plane(self.step(self.bottom_height, self.crush)),
            _ => return ThinkOutcome::Continue,
        };
        if env.ctx.level_time & 7 == 0 && self.kind != CeilingKind::SilentCrushAndRaise {
            env.ctx.sounds.start(origin, Sfx::Stnmov);
        }

        if self.direction == 1 {
            if res == MoveResult::PastDest {
                match self.kind {
                    CeilingKind::RaiseToHighest => return ThinkOutcome::Finished,
                    CeilingKind::SilentCrushAndRaise => {
                        env.ctx.sounds.start(origin, Sfx::Pstop);
                        self.direction = -1;
                    }
                    CeilingKind::CrushAndRaise | CeilingKind::FastCrushAndRaise => {
                        self.direction = -1;
                    }
                    CeilingKind::LowerToFloor | CeilingKind::LowerAndCrush => {}
                }
            }
            return ThinkOutcome::Continue;
        }

        match (res, self.kind) {
            (MoveResult::PastDest, CeilingKind::SilentCrushAndRaise) => {
                env.ctx.sounds.start(origin, Sfx::Pstop);
                self.speed = CEILSPEED;
                self.direction = 1;
            }
            (MoveResult::PastDest, CeilingKind::CrushAndRaise) => {
                self.speed = CEILSPEED;
                self.direction = 1;
            }
            (MoveResult::PastDest, CeilingKind::FastCrushAndRaise) => self.direction = 1,
            (MoveResult::PastDest, CeilingKind::LowerAndCrush | CeilingKind::LowerToFloor) => {
                return ThinkOutcome::Finished;
            }
            (
                MoveResult::Crushed,
                CeilingKind::SilentCrushAndRaise
                | CeilingKind::CrushAndRaise
                | CeilingKind::LowerAndCrush,
            ) => self.speed = CEILSPEED / 8,
            _ => {}
        }
        ThinkOutcome::Continue
    }
}

impl World {
    /// Starts a ceiling of `kind` on every free sector tagged like `line`.
    ///
    /// Crusher kinds first resume any suspended crushers sharing the tag.
    /// Returns whether at least one new ceiling started.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Full`] when the ceiling tracker has no room.
    /// Ceilings started on earlier sectors keep running; nothing is spawned
    /// for the sector that found the tracker full.
    pub fn do_ceiling(&mut self, line: usize, kind: CeilingKind) -> Result<bool, ActiveListError> {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return Ok(false);
        };
        if kind.is_perpetual() {
            self.active_ceilings
                .activate_in_stasis(&mut self.thinkers, i32::from(tag));
        }

        let mut started = false;
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for index in sectors {
            let Some(sec) = self.level.sectors.get(index).filter(|s| !s.is_busy()) else {
                continue;
            };
            self.active_ceilings.ensure_room()?;
            let eight = Fixed::from_int(8);
            let (top_height, bottom_height, direction, speed, crush) = match kind {
                CeilingKind::FastCrushAndRaise => (
                    sec.ceiling_height,
                    sec.floor_height + eight,
                    -1,
                    CEILSPEED * 2,
                    true,
                ),
                CeilingKind::SilentCrushAndRaise | CeilingKind::CrushAndRaise => (
                    sec.ceiling_height,
                    sec.floor_height + eight,
                    -1,
                    CEILSPEED,
                    true,
                ),
                CeilingKind::LowerAndCrush => {
                    (Fixed::ZERO, sec.floor_height + eight, -1, CEILSPEED, false)
                }
                CeilingKind::LowerToFloor => (Fixed::ZERO, sec.floor_height, -1, CEILSPEED, false),
                CeilingKind::RaiseToHighest => (
                    self.level.highest_ceiling_surrounding(index),
                    Fixed::ZERO,
                    1,
                    CEILSPEED,
                    false,
                ),
            };
            let ceiling = Ceiling {
                kind,
                sector: index,
                bottom_height,
                top_height,
                speed,
                crush,
                direction,
                tag: i32::from(tag),
                old_direction: 0,
            };
            let id = self.spawn_special(index, Thinker::Ceiling(ceiling));
            self.active_ceilings.add(id)?;
            debug!("ceiling {kind:?} started on sector {index}");
            started = true;
        }
        Ok(started)
    }

    /// Suspends every running crusher tagged like `line`.
    pub fn ceiling_crush_stop(&mut self, line: usize) -> bool {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return false;
        };
        self.active_ceilings
            .stop_by_tag(&mut self.thinkers, i32::from(tag))
    }
}
