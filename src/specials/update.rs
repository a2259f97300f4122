//! Level-start special spawning and the per-tic specials update: level
//! timer, animated flats and textures, scrolling walls and switch buttons.

use log::{debug, info};

use super::active::ActiveListError;
use crate::constants::{BUTTONTIME, FASTDARK, SLOWDARK, TICRATE};
use crate::game::World;
use crate::level::Level;
use crate::numeric::Fixed;
use crate::sound::{Sfx, SoundOrigin, SoundOutbox};

/// Line special that scrolls its front wall texture.
pub const SCROLL_LINE_SPECIAL: i16 = 48;

/// A cycle of flats or wall textures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Anim {
    /// Whether the cycle is of wall textures rather than flats.
    pub is_texture: bool,
    /// First picture of the cycle.
    pub base_pic: i16,
    /// Number of pictures in the cycle.
    pub num_pics: i16,
    /// Tics per frame.
    pub speed: i32,
}

impl Anim {
    /// A cycle from `base_pic` to `last_pic` inclusive. Cycles of fewer than
    /// two frames, or with a non-positive speed, are rejected.
    #[must_use]
    pub fn new(is_texture: bool, base_pic: i16, last_pic: i16, speed: i32) -> Option<Self> {
        let num_pics = last_pic.checked_sub(base_pic)?.checked_add(1)?;
        (num_pics >= 2 && speed > 0).then_some(Self {
            is_texture,
            base_pic,
            num_pics,
            speed,
        })
    }

    fn apply(&self, level: &mut Level, level_time: i32) {
        let table = if self.is_texture {
            &mut level.texture_translation
        } else {
            &mut level.flat_translation
        };
        let base = i32::from(self.base_pic);
        let count = i32::from(self.num_pics);
        for pic in base..base + count {
            let shown = base + (level_time / self.speed + pic) % count;
            let Ok(index) = usize::try_from(pic) else {
                continue;
            };
            if let (Some(slot), Ok(frame)) = (table.get_mut(index), i16::try_from(shown)) {
                *slot = frame;
            }
        }
    }
}

/// Which wall texture a pressed switch changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonWhere {
    /// Upper texture.
    Top,
    /// Middle texture.
    Middle,
    /// Lower texture.
    Bottom,
}

/// A pressed switch waiting to pop back out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Button {
    /// Line carrying the switch.
    pub line: usize,
    /// Wall texture that changed.
    pub position: ButtonWhere,
    /// Texture to restore.
    pub texture: i16,
    /// Tics until the switch pops back.
    pub timer: i32,
    /// Where the pop sound plays.
    pub origin: SoundOrigin,
}

/// Fixed-capacity set of pressed switches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonList {
    slots: Vec<Option<Button>>,
}

impl ButtonList {
    /// An empty set with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Pressed buttons in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Button> + '_ {
        self.slots.iter().flatten()
    }

    /// Forgets every pressed button.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Registers a pressed button unless one is already timing on the same
    /// line.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Full`] when every slot is taken.
    pub fn start(&mut self, button: Button) -> Result<(), ActiveListError> {
        if self.iter().any(|b| b.line == button.line) {
            return Ok(());
        }
        let capacity = self.slots.len();
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(ActiveListError::Full {
                list: "buttons",
                capacity,
            })?;
        *slot = Some(button);
        Ok(())
    }

    /// Counts every button down, restoring the wall texture of those that
    /// expire.
    pub fn tick(&mut self, level: &mut Level, sounds: &mut SoundOutbox) {
        for slot in &mut self.slots {
            let Some(button) = slot else {
                continue;
            };
            button.timer -= 1;
            if button.timer > 0 {
                continue;
            }
            let front = level
                .lines
                .get(button.line)
                .and_then(|l| l.side_num.first().copied().flatten())
                .and_then(|s| level.sides.get_mut(s));
            if let Some(side) = front {
                match button.position {
                    ButtonWhere::Top => side.top_texture = button.texture,
                    ButtonWhere::Middle => side.mid_texture = button.texture,
                    ButtonWhere::Bottom => side.bottom_texture = button.texture,
                }
            }
            sounds.start(button.origin, Sfx::Swtchn);
            *slot = None;
        }
    }
}

impl World {
    /// Starts the mechanisms named by sector specials, collects scrolling
    /// lines, empties the trackers and arms the level timer.
    pub fn spawn_specials(&mut self) {
        self.level_timer = self
            .config
            .level_timer_minutes
            .filter(|m| *m > 0)
            .and_then(|m| i32::try_from(m).ok())
            .map(|m| m * 60 * TICRATE);

        for index in 0..self.level.sectors.len() {
            let Some(special) = self.level.sectors.get(index).map(|s| s.special) else {
                continue;
            };
            match special {
                1 => self.spawn_light_flash(index),
                2 => self.spawn_strobe_flash(index, FASTDARK, false),
                3 => self.spawn_strobe_flash(index, SLOWDARK, false),
                4 => {
                    self.spawn_strobe_flash(index, FASTDARK, false);
                    if let Some(sector) = self.level.sectors.get_mut(index) {
                        sector.special = 4;
                    }
                }
                8 => self.spawn_glowing_light(index),
                9 => self.total_secret += 1,
                10 => self.spawn_door_close_in_30(index),
                12 => self.spawn_strobe_flash(index, SLOWDARK, true),
                13 => self.spawn_strobe_flash(index, FASTDARK, true),
                14 => self.spawn_door_raise_in_5_mins(index),
                17 => self.spawn_fire_flicker(index),
                _ => {}
            }
        }

        self.scrolling_lines = self
            .level
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.special == SCROLL_LINE_SPECIAL)
            .map(|(index, _)| index)
            .collect();

        self.active_ceilings.clear();
        self.active_plats.clear();
        self.buttons.clear();
        debug!(
            "specials spawned: {} thinkers, {} scrolling lines, {} secrets",
            self.thinkers.len(),
            self.scrolling_lines.len(),
            self.total_secret
        );
    }

    /// Per-tic animation and timer work.
    pub fn update_specials(&mut self) {
        if let Some(count) = self.level_timer.as_mut() {
            *count -= 1;
            if *count == 0 {
                info!("level timer expired at tic {}", self.ctx.level_time);
                self.exit_requested = true;
            }
        }

        for anim in &self.anims {
            anim.apply(&mut self.level, self.ctx.level_time);
        }

        for &line in &self.scrolling_lines {
            let front = self
                .level
                .lines
                .get(line)
                .and_then(|l| l.side_num.first().copied().flatten())
                .and_then(|s| self.level.sides.get_mut(s));
            if let Some(side) = front {
                side.texture_offset += Fixed::UNIT;
            }
        }

        self.buttons.tick(&mut self.level, &mut self.ctx.sounds);
    }

    /// Queues `line`'s switch to pop back to `texture` after `time` tics.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Full`] when no button slot is free.
    pub fn start_button(
        &mut self,
        line: usize,
        position: ButtonWhere,
        texture: i16,
        time: i32,
    ) -> Result<(), ActiveListError> {
        let origin = self
            .level
            .lines
            .get(line)
            .map_or(SoundOrigin::Global, |l| SoundOrigin::Sector(l.front_sector));
        self.buttons.start(Button {
            line,
            position,
            texture,
            timer: time,
            origin,
        })
    }

    /// Flips the switch texture on `line`'s front side. Reusable switches
    /// are queued to flip back; others lose their special.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Full`] when a reusable switch finds no
    /// free button slot.
    pub fn change_switch_texture(
        &mut self,
        line: usize,
        use_again: bool,
    ) -> Result<(), ActiveListError> {
        let Some(l) = self.level.lines.get_mut(line) else {
            return Ok(());
        };
        if !use_again {
            l.special = 0;
        }
        let front = l.front_sector;
        let Some(side_index) = l.side_num.first().copied().flatten() else {
            return Ok(());
        };
        let Some(side) = self.level.sides.get(side_index) else {
            return Ok(());
        };
        let walls = [
            (ButtonWhere::Top, side.top_texture),
            (ButtonWhere::Middle, side.mid_texture),
            (ButtonWhere::Bottom, side.bottom_texture),
        ];
        let hit = self.level.switch_list.iter().enumerate().find_map(|(i, &tex)| {
            walls
                .iter()
                .find(|(_, wall)| *wall == tex)
                .map(|&(position, _)| (i, position, tex))
        });
        let Some((i, position, old)) = hit else {
            return Ok(());
        };
        let Some(&new) = self.level.switch_list.get(i ^ 1) else {
            return Ok(());
        };
        self.ctx.sounds.start(SoundOrigin::Sector(front), Sfx::Swtchn);
        if let Some(wall) = self.level.sides.get_mut(side_index) {
            match position {
                ButtonWhere::Top => wall.top_texture = new,
                ButtonWhere::Middle => wall.mid_texture = new,
                ButtonWhere::Bottom => wall.bottom_texture = new,
            }
        }
        if use_again {
            self.start_button(line, position, old, BUTTONTIME)?;
        }
        Ok(())
    }
}
