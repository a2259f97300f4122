//! Light effects. None of these touch sector heights, and none claim the
//! sector's mover slot.

use log::debug;

use super::plane::SpecialEnv;
use crate::constants::{GLOWSPEED, SLOWDARK, STROBEBRIGHT};
use crate::game::World;
use crate::thinker::{ThinkOutcome, Thinker};

/// Fire flicker: dips below the peak by a random multiple of 16.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FireFlicker {
    /// Sector being lit.
    pub sector: usize,
    /// Tics until the next change.
    pub count: i32,
    /// Peak level.
    pub max_light: i32,
    /// Floor level.
    pub min_light: i32,
}

/// Random flash between two levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LightFlash {
    /// Sector being lit.
    pub sector: usize,
    /// Tics until the next change.
    pub count: i32,
    /// Bright level.
    pub max_light: i32,
    /// Dark level.
    pub min_light: i32,
    /// Mask for the bright period.
    pub max_time: i32,
    /// Mask for the dark period.
    pub min_time: i32,
}

/// Strobe on fixed timers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strobe {
    /// Sector being lit.
    pub sector: usize,
    /// Tics until the next change.
    pub count: i32,
    /// Dark level.
    pub min_light: i32,
    /// Bright level.
    pub max_light: i32,
    /// Tics spent dark.
    pub dark_time: i32,
    /// Tics spent bright.
    pub bright_time: i32,
}

/// Continuous ramp between two levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glow {
    /// Sector being lit.
    pub sector: usize,
    /// Bottom of the ramp.
    pub min_light: i32,
    /// Top of the ramp.
    pub max_light: i32,
    /// `1` brightening, `-1` dimming.
    pub direction: i32,
}

fn light_of<'a>(env: &'a mut SpecialEnv<'_>, sector: usize) -> Option<&'a mut i32> {
    env.level.sectors.get_mut(sector).map(|s| &mut s.light_level)
}

/// Decrements `count`, returning true when it reaches zero.
const fn expired(count: &mut i32) -> bool {
    *count -= 1;
    *count == 0
}

impl FireFlicker {
    /// Advances one tic.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        if !expired(&mut self.count) {
            return ThinkOutcome::Continue;
        }
        let amount = (env.ctx.rng.p_random() & 3) * 16;
        if let Some(light) = light_of(env, self.sector) {
            *light = if *light - amount < self.min_light {
                self.min_light
            } else {
                self.max_light - amount
            };
        }
        self.count = 4;
        ThinkOutcome::Continue
    }
}

impl LightFlash {
    /// Advances one tic.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        if !expired(&mut self.count) {
            return ThinkOutcome::Continue;
        }
        let roll = env.ctx.rng.p_random();
        if let Some(light) = light_of(env, self.sector) {
            if *light == self.max_light {
                *light = self.min_light;
                self.count = (roll & self.min_time) + 1;
            } else {
                *light = self.max_light;
                self.count = (roll & self.max_time) + 1;
            }
        }
        ThinkOutcome::Continue
    }
}

impl Strobe {
    /// Advances one tic.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        if !expired(&mut self.count) {
            return ThinkOutcome::Continue;
        }
        if let Some(light) = light_of(env, self.sector) {
            if *light == self.min_light {
                *light = self.max_light;
                self.count = self.bright_time;
            } else {
                *light = self.min_light;
                self.count = self.dark_time;
            }
        }
        ThinkOutcome::Continue
    }
}

impl Glow {
    /// Advances one tic.
    pub fn think(&mut self, env: &mut SpecialEnv<'_>) -> ThinkOutcome {
        let Some(light) = light_of(env, self.sector) else {
            return ThinkOutcome::Continue;
        };
        match self.direction {
            -1 => {
                *light -= GLOWSPEED;
                if *light <= self.min_light {
                    *light += GLOWSPEED;
                    self.direction = 1;
                }
            }
            1 => {
                *light += GLOWSPEED;
                if *light >= self.max_light {
                    *light -= GLOWSPEED;
                    self.direction = -1;
                }
            }
            _ => {}
        }
        ThinkOutcome::Continue
    }
}

impl World {
    fn take_light_special(&mut self, sector: usize) -> Option<i32> {
        let sec = self.level.sectors.get_mut(sector)?;
        sec.special = 0;
        Some(sec.light_level)
    }

    /// Level-start flicker on `sector`.
    pub fn spawn_fire_flicker(&mut self, sector: usize) {
        let Some(level) = self.take_light_special(sector) else {
            return;
        };
        let flicker = FireFlicker {
            sector,
            count: 4,
            max_light: level,
            min_light: self.level.min_surrounding_light(sector, level) + 16,
        };
        self.thinkers.add(Thinker::Flicker(flicker));
    }

    /// Level-start random flash on `sector`.
    pub fn spawn_light_flash(&mut self, sector: usize) {
        let Some(level) = self.take_light_special(sector) else {
            return;
        };
        let max_time = 64;
        let flash = LightFlash {
            sector,
            count: (self.ctx.rng.p_random() & max_time) + 1,
            max_light: level,
            min_light: self.level.min_surrounding_light(sector, level),
            max_time,
            min_time: 7,
        };
        self.thinkers.add(Thinker::Flash(flash));
    }

    /// Starts a strobe with a dark period of `dark_time` tics. Unsynchronised
    /// strobes start at a random phase.
    pub fn spawn_strobe_flash(&mut self, sector: usize, dark_time: i32, in_sync: bool) {
        let Some(level) = self.take_light_special(sector) else {
            return;
        };
        let dimmest = self.level.min_surrounding_light(sector, level);
        let min_light = if dimmest == level { 0 } else { dimmest };
        let count = if in_sync {
            1
        } else {
            (self.ctx.rng.p_random() & 7) + 1
        };
        let strobe = Strobe {
            sector,
            count,
            min_light,
            max_light: level,
            dark_time,
            bright_time: STROBEBRIGHT,
        };
        self.thinkers.add(Thinker::Strobe(strobe));
    }

    /// Level-start glow on `sector`.
    pub fn spawn_glowing_light(&mut self, sector: usize) {
        let Some(level) = self.take_light_special(sector) else {
            return;
        };
        let glow = Glow {
            sector,
            min_light: self.level.min_surrounding_light(sector, level),
            max_light: level,
            direction: -1,
        };
        self.thinkers.add(Thinker::Glow(glow));
    }

    /// Slow strobes on every tagged sector without a running mover.
    pub fn start_light_strobing(&mut self, line: usize) {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return;
        };
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for index in sectors {
            if !self.level.sector_is_free(index) {
                continue;
            }
            self.spawn_strobe_flash(index, SLOWDARK, false);
        }
    }

    /// Drops every tagged sector to its darkest neighbour's level.
    pub fn turn_tag_lights_off(&mut self, line: usize) {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return;
        };
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for index in sectors {
            let neighbour_light = self
                .level
                .sectors
                .get(index)
                .map(|s| self.level.min_surrounding_light(index, s.light_level));
            if let (Some(dimmest), Some(sector)) =
                (neighbour_light, self.level.sectors.get_mut(index))
            {
                sector.light_level = dimmest;
            }
        }
    }

    /// Sets every tagged sector to `bright`, or when `bright` is zero to the
    /// brightest neighbour of the first tagged sector.
    pub fn light_turn_on(&mut self, line: usize, bright: i32) {
        let Some(tag) = self.level.lines.get(line).map(|l| l.tag) else {
            return;
        };
        let mut target = bright;
        let sectors: Vec<usize> = self.level.tagged_sectors(tag).collect();
        for index in sectors {
            if target == 0 {
                target = self.level.max_surrounding_light(index, 0);
            }
            if let Some(sector) = self.level.sectors.get_mut(index) {
                sector.light_level = target;
            }
        }
        debug!("tag {tag} lights set to {target}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use crate::level::{Level, Sector};
    use crate::specials::plane::MockSectorOccupants;
    use rstest::rstest;

    fn lit(light: i32) -> Level {
        Level::new(vec![Sector::new(0, 128, light)], vec![], vec![], 1, vec![])
    }

    fn tick<F>(level: &mut Level, ctx: &mut SimContext, mut think: F) -> ThinkOutcome
    where
        F: FnMut(&mut SpecialEnv<'_>) -> ThinkOutcome,
    {
        let mut occupants = MockSectorOccupants::new();
        let mut env = SpecialEnv {
            level,
            occupants: &mut occupants,
            ctx,
        };
        think(&mut env)
    }

    #[rstest]
    fn glow_reverses_at_both_extremes() {
        let mut level = lit(160);
        let mut ctx = SimContext::default();
        let mut glow = Glow {
            sector: 0,
            min_light: 144,
            max_light: 160,
            direction: -1,
        };
        let mut levels = Vec::new();
        for _ in 0..4 {
            tick(&mut level, &mut ctx, |env| glow.think(env));
            levels.push((level.sectors[0].light_level, glow.direction));
        }
        assert_eq!(levels, vec![(152, -1), (152, 1), (152, -1), (152, 1)]);
    }

    #[rstest]
    fn strobe_alternates_on_fixed_timers() {
        let mut level = lit(200);
        let mut ctx = SimContext::default();
        let mut strobe = Strobe {
            sector: 0,
            count: 1,
            min_light: 40,
            max_light: 200,
            dark_time: 3,
            bright_time: 2,
        };
        let mut levels = Vec::new();
        for _ in 0..6 {
            tick(&mut level, &mut ctx, |env| strobe.think(env));
            levels.push(level.sectors[0].light_level);
        }
        assert_eq!(levels, vec![40, 40, 40, 200, 200, 40]);
    }

    #[rstest]
    fn flicker_never_drops_below_floor() {
        let mut level = lit(100);
        let mut ctx = SimContext::default();
        let mut flicker = FireFlicker {
            sector: 0,
            count: 1,
            max_light: 100,
            min_light: 90,
        };
        for _ in 0..40 {
            tick(&mut level, &mut ctx, |env| flicker.think(env));
            let light = level.sectors[0].light_level;
            assert!((90..=100).contains(&light), "light {light}");
        }
    }

    #[rstest]
    fn flash_draws_from_the_gameplay_stream() {
        let mut level = lit(255);
        let mut ctx = SimContext::default();
        let mut flash = LightFlash {
            sector: 0,
            count: 1,
            max_light: 255,
            min_light: 0,
            max_time: 64,
            min_time: 7,
        };
        tick(&mut level, &mut ctx, |env| flash.think(env));
        assert_eq!(level.sectors[0].light_level, 0);
        assert!((1..=8).contains(&flash.count));
        assert_eq!(ctx.rng.gameplay_index(), 1);
    }
}
