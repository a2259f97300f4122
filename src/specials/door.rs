//! Vertical doors: ceilings that open, wait and close again.

use log::debug;

use super::plane::{MoveResult, Plane, PlaneStep, SpecialEnv};
use crate::constants::{TICRATE, VDOORSPEED, VDOORWAIT};
use crate::game::World;
use crate::numeric::Fixed;
use crate::player::KeyColor;
use crate::sound::{Sfx, SoundOrigin};
use crate::thinker::{ThinkOutcome, Thinker};

/// Door behaviours, numbered as archived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DoorKind {
    /// Opens, waits and closes.
    Normal = 0,
    /// Closes, waits 30 seconds and opens.
    Close30ThenOpen = 1,
    /// Closes and stays shut.
    Close = 2,
    /// Opens and stays open.
    Open = 3,
    /// Opens five minutes into the level, then behaves normally.
    RaiseIn5Mins = 4,
    /// A fast [`DoorKind::Normal`].
    BlazeRaise = 5,
    /// A fast [`DoorKind::Open`].
    BlazeOpen = 6,
    /// A fast [`DoorKind::Close`].
    BlazeClose = 7,
}

impl DoorKind {
    /// The kind archived as `value`.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Normal,
            1 => Self::Close30ThenOpen,
            2 => Self::Close,
            3 => Self::Open,
            4 => Self::RaiseIn5Mins,
            5 => Self::BlazeRaise,
            6 => Self::BlazeOpen,
            7 => Self::BlazeClose,
            _ => return None,
        })
    }
}

/// A door mover.
///
/// `direction` is `1` opening, `-1` closing, `0` waiting at the top and `2`
/// waiting for a delayed first opening.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Door {
    /// Behaviour.
    pub kind: DoorKind,
    /// Sector whose ceiling is the door.
    pub sector: usize,
    /// Fully open height.
    pub top_height: Fixed,
    /// Distance per tic.
    pub speed: Fixed,
    /// Current phase.
    pub direction: i32,
    /// Tics to wait at the top.
    pub top_wait: i32,
    /// Tics left in the current wait.
    pub top_countdown: i32,
}

impl Door {
    const fn new(kind: DoorKind, sector: usize) -> Self {
        Self {
            kind,
            sector,
            top_height: Fixed::ZERO,
            speed: VDOORSPEED,
            direction: 1,
            top_wait: VDOORWAIT,
            top_countdown: 0,
        }
    }

    /// Advances one tic.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        let origin = SoundOrigin::Sector(self.sector);
        match self.direction {
            0 => {
                self.top_countdown -= 1;
                if self.top_countdown == 0 {
                    match self.kind {
                        DoorKind::BlazeRaise => {
                            self.direction = -1;
                            env.ctx.sounds.start(origin, Sfx::Bdcls);
                        }
                        DoorKind::Normal => {
                            self.direction = -1;
                            env.ctx.sounds.start(origin, Sfx::Dorcls);
                        }
                        DoorKind::Close30ThenOpen => {
                            self.direction = 1;
                            env.ctx.sounds.start(origin, Sfx::Doropn);
                        }
                        _ => {}
                    }
                }
            }
            2 => {
                self.top_countdown -= 1;
                if self.top_countdown == 0 && self.kind == DoorKind::RaiseIn5Mins {
                    self.direction = 1;
                    self.kind = DoorKind::Normal;
                    env.ctx.sounds.start(origin, Sfx::Doropn);
                }
            }
            -1 => {
                let Some(floor) = env.level.sectors.get(self.sector).map(|s| s.floor_height)
                else {
                    return ThinkOutcome::Finished;
                };
                let (res, blocked) = env.move_plane_blocked(self.step(floor));
                if res == MoveResult::PastDest {
                    match self.kind {
                        DoorKind::BlazeRaise | DoorKind::BlazeClose => {
                            env.ctx.sounds.start(origin, Sfx::Bdcls);
                            return ThinkOutcome::Finished;
                        }
                        DoorKind::Normal | DoorKind::Close => return ThinkOutcome::Finished,
                        DoorKind::Close30ThenOpen => {
                            self.direction = 0;
                            self.top_countdown = TICRATE * 30;
                        }
                        _ => {}
                    }
                } else if blocked && !matches!(self.kind, DoorKind::Close | DoorKind::BlazeClose)
                {
                    self.direction = 1;
                    env.ctx.sounds.start(origin, Sfx::Doropn);
                }
            }
            1 => {
                let res = env.move_plane(self.step(self.top_height));
                if res == MoveResult::PastDest {
                    match self.kind {
                        DoorKind::BlazeRaise | DoorKind::Normal => {
                            self.direction = 0;
                            self.top_countdown = self.top_wait;
                        }
                        DoorKind::Close30ThenOpen | DoorKind::BlazeOpen | DoorKind::Open => {
                            return ThinkOutcome::Finished;
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        ThinkOutcome::Continue
    }

    const fn step(&self, dest: Fixed) -> PlaneStep {
        PlaneStep {
            sector: self.sector,
            plane: Plane::Ceiling,
            speed: self.speed,
            dest,
            crush: false,
            direction: self.direction,
        }
    }
}

/// Key demanded by a locked door special, if any.
const fn required_key(special: i16) -> Option<KeyColor> {
    match special {
        26 | 32 | 99 | 133 => Some(KeyColor::Blue),
        27 | 34 | 136 | 137 => Some(KeyColor::Yellow),
        28 | 33 | 134 | 135 => Some(KeyColor::Red),
        _ => None,
    }
}

impl World {
    /// Starts a door of `kind` on every free sector tagged like `line`.
    /// Returns whether any door started.
    pub fn do_door(&mut self, line: usize, kind: DoorKind) -> bool {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return false;
        };
        let mut started = false;
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for index in sectors {
            let Some(ceiling) = self
                .level
                .sectors
                .get(index)
                .filter(|s| !s.is_busy())
                .map(|s| s.ceiling_height)
            else {
                continue;
            };
            started = true;
            let lowest = self.level.lowest_ceiling_surrounding(index) - Fixed::from_int(4);
            let origin = SoundOrigin::Sector(index);
            let mut door = Door::new(kind, index);
            match kind {
                DoorKind::BlazeClose => {
                    door.top_height = lowest;
                    door.direction = -1;
                    door.speed = VDOORSPEED * 4;
                    self.ctx.sounds.start(origin, Sfx::Bdcls);
                }
                DoorKind::Close => {
                    door.top_height = lowest;
                    door.direction = -1;
                    self.ctx.sounds.start(origin, Sfx::Dorcls);
                }
                DoorKind::Close30ThenOpen => {
                    door.top_height = ceiling;
                    door.direction = -1;
                    self.ctx.sounds.start(origin, Sfx::Dorcls);
                }
                DoorKind::BlazeRaise | DoorKind::BlazeOpen => {
                    door.top_height = lowest;
                    door.speed = VDOORSPEED * 4;
                    if door.top_height != ceiling {
                        self.ctx.sounds.start(origin, Sfx::Bdopn);
                    }
                }
                DoorKind::Normal | DoorKind::Open => {
                    door.top_height = lowest;
                    if door.top_height != ceiling {
                        self.ctx.sounds.start(origin, Sfx::Doropn);
                    }
                }
                DoorKind::RaiseIn5Mins => {}
            }
            self.spawn_special(index, Thinker::Door(door));
            debug!("door {kind:?} started on sector {index}");
        }
        started
    }

    /// Like [`World::do_door`], but only for a player holding the key the
    /// line's special demands.
    pub fn do_locked_door(&mut self, line: usize, kind: DoorKind, user: Option<usize>) -> bool {
        let Some(special) = self.level.lines.get(line).map(|l| l.special) else {
            return false;
        };
        let Some(slot) = user else {
            return false;
        };
        if let Some(key) = required_key(special) {
            if !self.player_holds_key(slot, key) {
                return false;
            }
        }
        self.do_door(line, kind)
    }

    /// A door used directly: the sector behind `line` opens, or a moving
    /// door there reverses.
    ///
    /// `user` is the player slot of the activating thing; monsters pass
    /// `None` and can neither open locked doors nor close open ones.
    pub fn vertical_door(&mut self, line: usize, user: Option<usize>) {
        let Some(special) = self.level.lines.get(line).map(|l| l.special) else {
            return;
        };
        if let Some(key) = required_key(special) {
            let Some(slot) = user else {
                return;
            };
            if !self.player_holds_key(slot, key) {
                return;
            }
        }
        let Some(index) = self.level.back_sector_of_line(line) else {
            return;
        };

        let Some(busy) = self.level.sectors.get(index).map(|s| s.special_data) else {
            return;
        };
        if let Some(id) = busy {
            if matches!(special, 1 | 26 | 27 | 28 | 117) {
                if let Some(Thinker::Door(door)) = self.thinkers.get_mut(id) {
                    if door.direction == -1 {
                        door.direction = 1;
                    } else if user.is_some() {
                        door.direction = -1;
                    }
                }
            }
            return;
        }

        let origin = SoundOrigin::Sector(index);
        let sfx = if matches!(special, 117 | 118) {
            Sfx::Bdopn
        } else {
            Sfx::Doropn
        };
        self.ctx.sounds.start(origin, sfx);

        let kind = match special {
            31..=34 => DoorKind::Open,
            117 => DoorKind::BlazeRaise,
            118 => DoorKind::BlazeOpen,
            _ => DoorKind::Normal,
        };
        let mut door = Door::new(kind, index);
        if matches!(kind, DoorKind::BlazeRaise | DoorKind::BlazeOpen) {
            door.speed = VDOORSPEED * 4;
        }
        if matches!(kind, DoorKind::Open | DoorKind::BlazeOpen) {
            if let Some(used) = self.level.lines.get_mut(line) {
                used.special = 0;
            }
        }
        door.top_height = self.level.lowest_ceiling_surrounding(index) - Fixed::from_int(4);
        self.spawn_special(index, Thinker::Door(door));
    }

    /// Level-start door that closes now and reopens after 30 seconds.
    pub fn spawn_door_close_in_30(&mut self, sector: usize) {
        let Some(sec) = self.level.sectors.get_mut(sector) else {
            return;
        };
        sec.special = 0;
        let mut door = Door::new(DoorKind::Normal, sector);
        door.direction = 0;
        door.top_countdown = 30 * TICRATE;
        self.spawn_special(sector, Thinker::Door(door));
    }

    /// Level-start door that first opens after five minutes.
    pub fn spawn_door_raise_in_5_mins(&mut self, sector: usize) {
        let Some(sec) = self.level.sectors.get_mut(sector) else {
            return;
        };
        sec.special = 0;
        let mut door = Door::new(DoorKind::RaiseIn5Mins, sector);
        door.direction = 2;
        door.top_height = self.level.lowest_ceiling_surrounding(sector) - Fixed::from_int(4);
        door.top_countdown = 5 * 60 * TICRATE;
        self.spawn_special(sector, Thinker::Door(door));
    }

    /// Checks the key and, when missing, tells the player and plays the
    /// refusal grunt.
    fn player_holds_key(&mut self, slot: usize, key: KeyColor) -> bool {
        let Some(player) = self.players.get_mut(slot) else {
            return false;
        };
        if player.has_key(key) {
            return true;
        }
        player.message = Some(key.door_message());
        self.ctx.sounds.start(SoundOrigin::Global, Sfx::Oof);
        debug!("player {slot} lacks the {key:?} key");
        false
    }
}
