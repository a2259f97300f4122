//! Moving floors, stairs and donuts.

use log::debug;

use super::plane::{MoveResult, Plane, PlaneStep, SpecialEnv};
use crate::constants::FLOORSPEED;
use crate::game::World;
use crate::level::ML_TWOSIDED;
use crate::numeric::Fixed;
use crate::sound::{Sfx, SoundOrigin};
use crate::thinker::{ThinkOutcome, Thinker};

/// Floor behaviours, numbered as archived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloorKind {
    /// Down to the highest neighbouring floor.
    LowerFloor = 0,
    /// Down to the lowest neighbouring floor.
    LowerFloorToLowest = 1,
    /// Fast, to 8 above the highest neighbouring floor.
    TurboLower = 2,
    /// Up to the lowest neighbouring ceiling.
    RaiseFloor = 3,
    /// Up to the next neighbouring floor.
    RaiseFloorToNearest = 4,
    /// Up by the height of the shortest lower texture.
    RaiseToTexture = 5,
    /// Down to the lowest neighbour, taking its picture and special.
    LowerAndChange = 6,
    /// Up 24 units.
    RaiseFloor24 = 7,
    /// Up 24 units, taking the activating line's floor picture and special.
    RaiseFloor24AndChange = 8,
    /// Like [`FloorKind::RaiseFloor`] but crushing, stopping 8 short.
    RaiseFloorCrush = 9,
    /// Fast, to the next neighbouring floor.
    RaiseFloorTurbo = 10,
    /// Slime rising around a donut.
    DonutRaise = 11,
    /// Up 512 units.
    RaiseFloor512 = 12,
    /// One step of a staircase.
    BuildStair = 13,
}

impl FloorKind {
    /// The kind archived as `value`.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::LowerFloor,
            1 => Self::LowerFloorToLowest,
            2 => Self::TurboLower,
            3 => Self::RaiseFloor,
            4 => Self::RaiseFloorToNearest,
            5 => Self::RaiseToTexture,
            6 => Self::LowerAndChange,
            7 => Self::RaiseFloor24,
            8 => Self::RaiseFloor24AndChange,
            9 => Self::RaiseFloorCrush,
            10 => Self::RaiseFloorTurbo,
            11 => Self::DonutRaise,
            12 => Self::RaiseFloor512,
            13 => Self::BuildStair,
            _ => return None,
        })
    }
}

/// Staircase flavours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StairKind {
    /// Slow, 8-unit steps.
    Build8,
    /// Fast, 16-unit steps.
    Turbo16,
}

/// A floor mover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FloorMove {
    /// Behaviour.
    pub kind: FloorKind,
    /// Whether it damages what blocks it.
    pub crush: bool,
    /// Sector being moved.
    pub sector: usize,
    /// `1` up, `-1` down.
    pub direction: i32,
    /// Sector special applied on arrival by the changing kinds.
    pub new_special: i32,
    /// Floor picture applied on arrival by the changing kinds.
    pub texture: i16,
    /// Height to stop at.
    pub dest_height: Fixed,
    /// Distance per tic.
    pub speed: Fixed,
}

impl FloorMove {
    const fn new(
        kind: FloorKind,
        sector: usize,
        direction: i32,
        speed: Fixed,
        dest_height: Fixed,
    ) -> Self {
        Self {
            kind,
            crush: false,
            sector,
            direction,
            new_special: 0,
            texture: 0,
            dest_height,
            speed,
        }
    }

    /// Advances one tic; finishes on arrival.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        let res = env.move_plane(PlaneStep {
            sector: self.sector,
            plane: Plane::Floor,
            speed: self.speed,
            dest: self.dest_height,
            crush: self.crush,
            direction: self.direction,
        });
        let origin = SoundOrigin::Sector(self.sector);
        if env.ctx.level_time & 7 == 0 {
            env.ctx.sounds.start(origin, Sfx::Stnmov);
        }
        if res != MoveResult::PastDest {
            return ThinkOutcome::Continue;
        }

        let changes = match self.direction {
            1 => self.kind == FloorKind::DonutRaise,
            -1 => self.kind == FloorKind::LowerAndChange,
            _ => false,
        };
        if changes {
            if let Some(sector) = env.level.sectors.get_mut(self.sector) {
                sector.special = crate::numeric::low16(self.new_special);
                sector.floor_pic = self.texture;
            }
        }
        env.ctx.sounds.start(origin, Sfx::Pstop);
        ThinkOutcome::Finished
    }
}

impl World {
    /// Starts a floor of `kind` on every free sector tagged like `line`.
    /// Returns whether at least one floor started.
    pub fn do_floor(&mut self, line: usize, kind: FloorKind) -> bool {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return false;
        };
        let mut started = false;
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for index in sectors {
            if !self.level.sector_is_free(index) {
                continue;
            }
            let Some(floor) = self.build_floor(line, index, kind) else {
                continue;
            };
            self.spawn_special(index, Thinker::Floor(floor));
            debug!("floor {kind:?} started on sector {index}");
            started = true;
        }
        started
    }

    fn build_floor(&mut self, line: usize, index: usize, kind: FloorKind) -> Option<FloorMove> {
        let level = &self.level;
        let sec = level.sectors.get(index)?;
        let (direction, speed, dest) = match kind {
            FloorKind::LowerFloor => (-1, FLOORSPEED, level.highest_floor_surrounding(index)),
            FloorKind::LowerFloorToLowest | FloorKind::LowerAndChange => {
                (-1, FLOORSPEED, level.lowest_floor_surrounding(index))
            }
            FloorKind::TurboLower => {
                let highest = level.highest_floor_surrounding(index);
                let dest = if highest == sec.floor_height {
                    highest
                } else {
                    highest + Fixed::from_int(8)
                };
                (-1, FLOORSPEED * 4, dest)
            }
            FloorKind::RaiseFloor | FloorKind::RaiseFloorCrush => {
                let lowest = level.lowest_ceiling_surrounding(index).min(sec.ceiling_height);
                let dest = if kind == FloorKind::RaiseFloorCrush {
                    lowest - Fixed::from_int(8)
                } else {
                    lowest
                };
                (1, FLOORSPEED, dest)
            }
            FloorKind::RaiseFloorTurbo => (
                1,
                FLOORSPEED * 4,
                level.next_highest_floor(index, sec.floor_height),
            ),
            FloorKind::RaiseFloorToNearest => (
                1,
                FLOORSPEED,
                level.next_highest_floor(index, sec.floor_height),
            ),
            FloorKind::RaiseFloor24 | FloorKind::RaiseFloor24AndChange => {
                (1, FLOORSPEED, sec.floor_height + Fixed::from_int(24))
            }
            FloorKind::RaiseFloor512 => (1, FLOORSPEED, sec.floor_height + Fixed::from_int(512)),
            FloorKind::RaiseToTexture => (
                1,
                FLOORSPEED,
                sec.floor_height + self.shortest_lower_texture(index),
            ),
            FloorKind::DonutRaise | FloorKind::BuildStair => (1, FLOORSPEED, sec.floor_height),
        };
        let mut floor = FloorMove::new(kind, index, direction, speed, dest);
        floor.crush = kind == FloorKind::RaiseFloorCrush;

        match kind {
            FloorKind::RaiseFloor24AndChange => {
                let model = self
                    .level
                    .line_front_sector(line)
                    .and_then(|front| self.level.sectors.get(front))
                    .map(|src| (src.floor_pic, src.special));
                if let (Some((pic, special)), Some(target)) =
                    (model, self.level.sectors.get_mut(index))
                {
                    target.floor_pic = pic;
                    target.special = special;
                }
            }
            FloorKind::LowerAndChange => {
                let model = self.change_model(index, dest).unwrap_or(index);
                if let Some(src) = self.level.sectors.get(model) {
                    floor.texture = src.floor_pic;
                    floor.new_special = i32::from(src.special);
                }
            }
            _ => {}
        }
        Some(floor)
    }

    /// Height of the shortest lower texture on any two-sided line of
    /// `index`.
    fn shortest_lower_texture(&self, index: usize) -> Fixed {
        let level = &self.level;
        let count = level.sectors.get(index).map_or(0, |s| s.lines.len());
        let mut shortest = Fixed::MAX;
        for line in 0..count {
            if !level.two_sided(index, line) {
                continue;
            }
            for face in 0..2 {
                let texture_height = level
                    .side_of(index, line, face)
                    .and_then(|side| usize::try_from(side.bottom_texture).ok())
                    .and_then(|texture| level.texture_heights.get(texture));
                if let Some(&height) = texture_height {
                    shortest = shortest.min(height);
                }
            }
        }
        shortest
    }

    /// First neighbour across a two-sided line whose floor sits at `dest`.
    fn change_model(&self, index: usize, dest: Fixed) -> Option<usize> {
        let level = &self.level;
        let count = level.sectors.get(index).map_or(0, |s| s.lines.len());
        (0..count)
            .filter(|&line| level.two_sided(index, line))
            .find_map(|line| {
                let front = level.sector_of(index, line, 0)?;
                let other = if front == index {
                    level.sector_of(index, line, 1)?
                } else {
                    front
                };
                level
                    .sectors
                    .get(other)
                    .filter(|s| s.floor_height == dest)
                    .map(|_| other)
            })
    }

    /// Raises a staircase from every free sector tagged like `line`,
    /// following two-sided lines into neighbours with the same floor
    /// picture.
    pub fn build_stairs(&mut self, line: usize, kind: StairKind) -> bool {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return false;
        };
        let (speed, stair_size) = match kind {
            StairKind::Build8 => (FLOORSPEED / 4, Fixed::from_int(8)),
            StairKind::Turbo16 => (FLOORSPEED * 4, Fixed::from_int(16)),
        };

        let mut started = false;
        let mut cursor = None;
        while let Some(first) = self.level.find_sector_from_tag(tag, cursor) {
            cursor = Some(first);
            let Some((texture, base)) = self
                .level
                .sectors
                .get(first)
                .filter(|s| !s.is_busy())
                .map(|s| (s.floor_pic, s.floor_height))
            else {
                continue;
            };
            started = true;
            let mut height = base + stair_size;
            let mut current = first;
            let first_step = FloorMove::new(FloorKind::BuildStair, current, 1, speed, height);
            self.spawn_special(current, Thinker::Floor(first_step));

            loop {
                let (next, reached) = self.next_stair(current, texture, height, stair_size);
                height = reached;
                let Some(stair) = next else {
                    break;
                };
                current = stair;
                let step = FloorMove::new(FloorKind::BuildStair, current, 1, speed, height);
                self.spawn_special(current, Thinker::Floor(step));
            }
            debug!("stairs from sector {first} to {current}");
            cursor = Some(current);
        }
        started
    }

    /// Next stair after `current`: the back sector of a two-sided line
    /// fronted by `current` whose floor matches `texture`. Every matching
    /// candidate raises the step height, even a busy one that is skipped.
    fn next_stair(
        &self,
        current: usize,
        texture: i16,
        mut height: Fixed,
        stair_size: Fixed,
    ) -> (Option<usize>, Fixed) {
        let level = &self.level;
        let bounds = level
            .sectors
            .get(current)
            .map(|s| s.lines.as_slice())
            .unwrap_or_default();
        for line in bounds.iter().filter_map(|&l| level.lines.get(l)) {
            if line.flags & ML_TWOSIDED == 0 || line.front_sector != current {
                continue;
            }
            let Some(back) = line.back_sector else {
                continue;
            };
            let Some(sector) = level.sectors.get(back) else {
                continue;
            };
            if sector.floor_pic != texture {
                continue;
            }
            height += stair_size;
            if sector.is_busy() {
                continue;
            }
            return (Some(back), height);
        }
        (None, height)
    }

    /// Lowers the hole of every free donut tagged like `line` and raises
    /// the surrounding ring to the outer floor, taking its picture.
    pub fn do_donut(&mut self, line: usize) -> bool {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return false;
        };
        let mut started = false;
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for hole in sectors {
            let Some(hole_sector) = self.level.sectors.get(hole).filter(|s| !s.is_busy()) else {
                continue;
            };
            started = true;
            let Some(ring) = hole_sector
                .lines
                .first()
                .and_then(|&l| self.level.next_sector(l, hole))
            else {
                continue;
            };
            let beyond_ring = self
                .level
                .sectors
                .get(ring)
                .map(|s| s.lines.as_slice())
                .unwrap_or_default()
                .iter()
                .filter_map(|&l| self.level.lines.get(l))
                .find_map(|l| l.back_sector.filter(|&back| back != hole));
            let Some(outer) = beyond_ring else {
                continue;
            };
            let Some((dest, pic)) = self
                .level
                .sectors
                .get(outer)
                .map(|s| (s.floor_height, s.floor_pic))
            else {
                continue;
            };
            let mut raise = FloorMove::new(FloorKind::DonutRaise, ring, 1, FLOORSPEED / 2, dest);
            raise.texture = pic;
            self.spawn_special(ring, Thinker::Floor(raise));
            let lower = FloorMove::new(FloorKind::LowerFloor, hole, -1, FLOORSPEED / 2, dest);
            self.spawn_special(hole, Thinker::Floor(lower));
            debug!("donut: hole {hole}, ring {ring}, outer {outer}");
        }
        started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use crate::level::{Level, Sector};
    use crate::specials::plane::MockSectorOccupants;
    use rstest::rstest;

    fn run(floor: &mut FloorMove, level: &mut Level, ctx: &mut SimContext) -> ThinkOutcome {
        let mut occupants = MockSectorOccupants::new();
        occupants.expect_change_sector().return_const(false);
        let mut env = SpecialEnv {
            level,
            occupants: &mut occupants,
            ctx,
        };
        floor.think(&mut env)
    }

    #[rstest]
    #[case::lower_and_change(FloorKind::LowerAndChange, -1, true)]
    #[case::donut_raise(FloorKind::DonutRaise, 1, true)]
    #[case::plain_lower(FloorKind::LowerFloor, -1, false)]
    #[case::donut_kind_going_down(FloorKind::DonutRaise, -1, false)]
    fn arrival_applies_change_only_for_changing_kinds(
        #[case] kind: FloorKind,
        #[case] direction: i32,
        #[case] changes: bool,
    ) {
        let mut level = Level::new(vec![Sector::new(0, 128, 100)], vec![], vec![], 8, vec![]);
        let dest = Fixed::from_int(direction);
        let mut floor = FloorMove {
            new_special: 9,
            texture: 5,
            ..FloorMove::new(kind, 0, direction, FLOORSPEED * 2, dest)
        };
        let mut ctx = SimContext::default();
        assert_eq!(run(&mut floor, &mut level, &mut ctx), ThinkOutcome::Finished);
        assert_eq!(level.sectors[0].floor_height, dest);
        assert_eq!(level.sectors[0].floor_pic == 5, changes);
        assert_eq!(level.sectors[0].special == 9, changes);
        assert_eq!(ctx.sounds.drain().last().map(|e| e.sfx), Some(Sfx::Pstop));
    }

    #[rstest]
    fn moving_floor_continues_until_arrival() {
        let mut level = Level::new(vec![Sector::new(0, 128, 100)], vec![], vec![], 8, vec![]);
        let mut floor = FloorMove::new(FloorKind::RaiseFloor24, 0, 1, FLOORSPEED, Fixed::from_int(24));
        let mut ctx = SimContext {
            level_time: 3,
            ..SimContext::default()
        };
        assert_eq!(run(&mut floor, &mut level, &mut ctx), ThinkOutcome::Continue);
        assert_eq!(level.sectors[0].floor_height, Fixed::UNIT);
        assert!(ctx.sounds.is_empty());
    }

    #[rstest]
    fn unknown_kind_does_not_decode() {
        assert_eq!(FloorKind::from_i32(14), None);
        assert_eq!(FloorKind::from_i32(11), Some(FloorKind::DonutRaise));
    }
}
