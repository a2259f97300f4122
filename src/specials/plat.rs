//! Platforms (lifts): floors that travel between a low and a high stop.

use log::debug;

use super::active::{ActiveListError, Stasis};
use super::plane::{MoveResult, Plane, PlaneStep, SpecialEnv};
use crate::constants::{PLATSPEED, PLATWAIT, TICRATE};
use crate::game::World;
use crate::numeric::Fixed;
use crate::sound::{Sfx, SoundOrigin};
use crate::thinker::{ThinkOutcome, Thinker};

/// Platform motion state, numbered as archived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlatStatus {
    /// Rising toward the high stop.
    Up = 0,
    /// Lowering toward the low stop.
    Down = 1,
    /// Pausing at a stop.
    Waiting = 2,
    /// Suspended by a stop line.
    InStasis = 3,
}

impl PlatStatus {
    /// The status archived as `value`.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Up,
            1 => Self::Down,
            2 => Self::Waiting,
            3 => Self::InStasis,
            _ => return None,
        })
    }
}

/// Platform behaviours, numbered as archived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlatKind {
    /// Cycles between the lowest and highest neighbouring floors forever.
    PerpetualRaise = 0,
    /// Lowers, waits, rises back and stops.
    DownWaitUpStay = 1,
    /// Rises by a fixed amount, taking the line's floor texture.
    RaiseAndChange = 2,
    /// Rises to the next higher floor, taking the line's floor texture.
    RaiseToNearestAndChange = 3,
    /// A fast [`PlatKind::DownWaitUpStay`].
    BlazeDwus = 4,
}

impl PlatKind {
    /// The kind archived as `value`.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::PerpetualRaise,
            1 => Self::DownWaitUpStay,
            2 => Self::RaiseAndChange,
            3 => Self::RaiseToNearestAndChange,
            4 => Self::BlazeDwus,
            _ => return None,
        })
    }

    /// Kinds that remove themselves after reaching the top once.
    #[must_use]
    pub const fn is_one_shot(self) -> bool {
        !matches!(self, Self::PerpetualRaise)
    }
}

/// A running platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plat {
    /// Sector being moved.
    pub sector: usize,
    /// Distance per tic.
    pub speed: Fixed,
    /// Low stop.
    pub low: Fixed,
    /// High stop.
    pub high: Fixed,
    /// Tics to pause at either stop.
    pub wait: i32,
    /// Tics left in the current pause.
    pub count: i32,
    /// Current motion.
    pub status: PlatStatus,
    /// Motion to resume with after stasis.
    pub old_status: PlatStatus,
    /// Whether rising damages what blocks it.
    pub crush: bool,
    /// Tag it was started with.
    pub tag: i32,
    /// Behaviour.
    pub kind: PlatKind,
}

impl Stasis for Plat {
    fn tag(&self) -> i32 {
        self.tag
    }

    fn in_stasis(&self) -> bool {
        self.status == PlatStatus::InStasis
    }

    fn enter_stasis(&mut self) {
        self.old_status = self.status;
        self.status = PlatStatus::InStasis;
    }

    fn leave_stasis(&mut self) {
        self.status = self.old_status;
    }
}

impl Plat {
    const fn step(&self, dest: Fixed, crush: bool, direction: i32) -> PlaneStep {
        PlaneStep {
            sector: self.sector,
            plane: Plane::Floor,
            speed: self.speed,
            dest,
            crush,
            direction,
        }
    }

    /// Advances one tic.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        let origin = SoundOrigin::Sector(self.sector);
        match self.status {
            PlatStatus::Up => {
                let (res, blocked) = env.move_plane_blocked(self.step(self.high, self.crush, 1));
                if matches!(
                    self.kind,
                    PlatKind::RaiseAndChange | PlatKind::RaiseToNearestAndChange
                ) && env.ctx.level_time & 7 == 0
                {
                    env.ctx.sounds.start(origin, Sfx::Stnmov);
                }
                if blocked {
                    self.count = self.wait;
                    self.status = PlatStatus::Down;
                    env.ctx.sounds.start(origin, Sfx::Pstart);
                } else if res == MoveResult::PastDest {
                    self.count = self.wait;
                    self.status = PlatStatus::Waiting;
                    env.ctx.sounds.start(origin, Sfx::Pstop);
                    if self.kind.is_one_shot() {
                        return ThinkOutcome::Finished;
                    }
                }
            }
            PlatStatus::Down => {
                let res = env.move_plane(self.step(self.low, false, -1));
                if res == MoveResult::PastDest {
                    self.count = self.wait;
                    self.status = PlatStatus::Waiting;
                    env.ctx.sounds.start(origin, Sfx::Pstop);
                }
            }
            PlatStatus::Waiting => {
                self.count -= 1;
                if self.count == 0 {
                    let floor = env
                        .level
                        .sectors
                        .get(self.sector)
                        .map(|s| s.floor_height);
                    self.status = if floor == Some(self.low) {
                        PlatStatus::Up
                    } else {
                        PlatStatus::Down
                    };
                    env.ctx.sounds.start(origin, Sfx::Pstart);
                }
            }
            PlatStatus::InStasis => {}
        }
        ThinkOutcome::Continue
    }
}

impl World {
    /// Starts a platform of `kind` on every free sector tagged like `line`.
    ///
    /// `amount` is the rise in whole units for [`PlatKind::RaiseAndChange`].
    /// Perpetual platforms first resume suspended ones sharing the tag.
    /// Returns whether at least one new platform started.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Full`] when the platform tracker has no
    /// room. Platforms started on earlier sectors keep running; the sector
    /// that found the tracker full is left untouched.
    pub fn do_plat(
        &mut self,
        line: usize,
        kind: PlatKind,
        amount: i32,
    ) -> Result<bool, ActiveListError> {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return Ok(false);
        };
        if kind == PlatKind::PerpetualRaise {
            self.active_plats
                .activate_in_stasis(&mut self.thinkers, i32::from(tag));
        }
        let line_floor_pic = self
            .level
            .line_front_sector(line)
            .and_then(|s| self.level.sectors.get(s))
            .map(|s| s.floor_pic);

        let mut started = false;
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for index in sectors {
            let Some(floor) = self
                .level
                .sectors
                .get(index)
                .filter(|s| !s.is_busy())
                .map(|s| s.floor_height)
            else {
                continue;
            };
            self.active_plats.ensure_room()?;
            let lowest = self.level.lowest_floor_surrounding(index).min(floor);
            let mut plat = Plat {
                sector: index,
                speed: PLATSPEED,
                low: Fixed::ZERO,
                high: Fixed::ZERO,
                wait: 0,
                count: 0,
                status: PlatStatus::Up,
                old_status: PlatStatus::Up,
                crush: false,
                tag: i32::from(tag),
                kind,
            };
            let origin = SoundOrigin::Sector(index);
            match kind {
                PlatKind::RaiseToNearestAndChange | PlatKind::RaiseAndChange => {
                    plat.speed = PLATSPEED / 2;
                    plat.high = if kind == PlatKind::RaiseAndChange {
                        floor + Fixed::from_int(amount)
                    } else {
                        self.level.next_highest_floor(index, floor)
                    };
                    if let Some(sector) = self.level.sectors.get_mut(index) {
                        if let Some(pic) = line_floor_pic {
                            sector.floor_pic = pic;
                        }
                        if kind == PlatKind::RaiseToNearestAndChange {
                            sector.special = 0;
                        }
                    }
                    self.ctx.sounds.start(origin, Sfx::Stnmov);
                }
                PlatKind::DownWaitUpStay | PlatKind::BlazeDwus => {
                    plat.speed = if kind == PlatKind::BlazeDwus {
                        PLATSPEED * 8
                    } else {
                        PLATSPEED * 4
                    };
                    plat.low = lowest;
                    plat.high = floor;
                    plat.wait = TICRATE * PLATWAIT;
                    plat.status = PlatStatus::Down;
                    self.ctx.sounds.start(origin, Sfx::Pstart);
                }
                PlatKind::PerpetualRaise => {
                    plat.low = lowest;
                    plat.high = self.level.highest_floor_surrounding(index).max(floor);
                    plat.wait = TICRATE * PLATWAIT;
                    plat.status = if self.ctx.rng.p_random() & 1 == 0 {
                        PlatStatus::Up
                    } else {
                        PlatStatus::Down
                    };
                    self.ctx.sounds.start(origin, Sfx::Pstart);
                }
            }
            let id = self.spawn_special(index, Thinker::Plat(plat));
            self.active_plats.add(id)?;
            debug!("plat {kind:?} started on sector {index}");
            started = true;
        }
        Ok(started)
    }

    /// Suspends every running platform tagged like `line`.
    pub fn stop_plat(&mut self, line: usize) -> bool {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return false;
        };
        self.active_plats
            .stop_by_tag(&mut self.thinkers, i32::from(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use crate::level::{Level, Sector};
    use crate::specials::plane::MockSectorOccupants;
    use rstest::{fixture, rstest};

    #[fixture]
    fn lift() -> Plat {
        Plat {
            sector: 0,
            speed: PLATSPEED * 4,
            low: Fixed::from_int(-8),
            high: Fixed::ZERO,
            wait: 3,
            count: 0,
            status: PlatStatus::Down,
            old_status: PlatStatus::Up,
            crush: false,
            tag: 1,
            kind: PlatKind::PerpetualRaise,
        }
    }

    fn run(plat: &mut Plat, level: &mut Level, ctx: &mut SimContext) -> ThinkOutcome {
        let mut occupants = MockSectorOccupants::new();
        occupants.expect_change_sector().return_const(false);
        let mut env = SpecialEnv {
            level,
            occupants: &mut occupants,
            ctx,
        };
        plat.think(&mut env)
    }

    #[rstest]
    fn perpetual_lift_cycles(mut lift: Plat) {
        let mut level = Level::new(vec![Sector::new(0, 128, 100)], vec![], vec![], 1, vec![]);
        let mut ctx = SimContext::default();
        let mut statuses = Vec::new();
        for _ in 0..12 {
            assert_eq!(run(&mut lift, &mut level, &mut ctx), ThinkOutcome::Continue);
            statuses.push(lift.status);
        }
        use PlatStatus::{Down, Up, Waiting};
        assert_eq!(
            statuses,
            vec![Down, Down, Waiting, Waiting, Waiting, Up, Up, Up, Waiting, Waiting, Waiting, Down]
        );
    }

    #[rstest]
    fn one_shot_finishes_at_top(mut lift: Plat) {
        lift.kind = PlatKind::DownWaitUpStay;
        lift.status = PlatStatus::Up;
        let mut level = Level::new(vec![Sector::new(-2, 128, 100)], vec![], vec![], 1, vec![]);
        let mut ctx = SimContext::default();
        assert_eq!(run(&mut lift, &mut level, &mut ctx), ThinkOutcome::Finished);
        assert_eq!(level.sectors[0].floor_height, Fixed::ZERO);
        let last = ctx.sounds.drain().last().map(|e| e.sfx);
        assert_eq!(last, Some(Sfx::Pstop));
    }

    #[rstest]
    fn blocked_lift_heads_back_down(mut lift: Plat) {
        lift.status = PlatStatus::Up;
        lift.high = Fixed::from_int(64);
        let mut level = Level::new(vec![Sector::new(0, 128, 100)], vec![], vec![], 1, vec![]);
        let mut occupants = MockSectorOccupants::new();
        occupants.expect_change_sector().return_const(true);
        let mut ctx = SimContext::default();
        let mut env = SpecialEnv {
            level: &mut level,
            occupants: &mut occupants,
            ctx: &mut ctx,
        };
        assert_eq!(lift.think(&mut env), ThinkOutcome::Continue);
        assert_eq!(lift.status, PlatStatus::Down);
        assert_eq!(lift.count, lift.wait);
        assert_eq!(level.sectors[0].floor_height, Fixed::ZERO);
    }

    #[rstest]
    fn stasis_freezes_everything(mut lift: Plat) {
        lift.enter_stasis();
        let mut level = Level::new(vec![Sector::new(0, 128, 100)], vec![], vec![], 1, vec![]);
        let mut ctx = SimContext::default();
        run(&mut lift, &mut level, &mut ctx);
        assert_eq!(level.sectors[0].floor_height, Fixed::ZERO);
        lift.leave_stasis();
        assert_eq!(lift.status, PlatStatus::Down);
    }

    #[rstest]
    #[case(0, Some(PlatStatus::Up))]
    #[case(3, Some(PlatStatus::InStasis))]
    #[case(9, None)]
    fn status_decodes(#[case] raw: i32, #[case] expected: Option<PlatStatus>) {
        assert_eq!(PlatStatus::from_i32(raw), expected);
    }
}
