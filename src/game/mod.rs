//! The world and its per-tic driver.
//!
//! A [`World`] owns the level geometry, every thinker, the active-mechanism
//! trackers and the player slots. One call to [`World::tick`] advances it by
//! exactly one tic in a fixed order that demos and saves depend on.

pub mod respawn;

use log::debug;
use thiserror::Error;

use crate::config::SimConfig;
use crate::constants::MAXPLAYERS;
use crate::context::SimContext;
use crate::level::Level;
use crate::numeric::Fixed;
use crate::player::Player;
use crate::specials::active::{ActiveList, ActiveListError};
use crate::specials::plane::SpecialEnv;
use crate::specials::update::{Anim, ButtonList};
use crate::thinker::{Mobj, ThinkOutcome, Thinker, ThinkerId, ThinkerRegistry};

pub use respawn::{QueuedItem, RespawnQueue};

/// Invariant violations raised while running a tic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A tracker overflowed or lost a mechanism.
    #[error(transparent)]
    ActiveList(#[from] ActiveListError),
}

/// Collaborators outside the core that the tick calls into.
#[cfg_attr(test, mockall::automock)]
pub trait TickHooks {
    /// Input and movement for one in-game player.
    fn player_think(&mut self, _slot: usize, _player: &mut Player, _ctx: &mut SimContext) {}

    /// Dynamic music selection, run after the thinkers.
    fn music_info(&mut self, _level_time: i32) {}
}

/// Hooks that do nothing, for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl TickHooks for NoHooks {}

/// Everything that changes while a level is played.
#[derive(Clone, Debug)]
pub struct World {
    /// Map geometry.
    pub level: Level,
    /// Every thinker, in update order.
    pub thinkers: ThinkerRegistry,
    /// Running ceilings that a stop line can suspend.
    pub active_ceilings: ActiveList,
    /// Running platforms that a stop line can suspend.
    pub active_plats: ActiveList,
    /// Pressed switches waiting to pop back.
    pub buttons: ButtonList,
    /// Player slots.
    pub players: [Player; MAXPLAYERS],
    /// Which player slots are playing.
    pub player_in_game: [bool; MAXPLAYERS],
    /// Picked-up items waiting to respawn.
    pub respawn: RespawnQueue,
    /// Clock, random stream and sound queue.
    pub ctx: SimContext,
    /// Settings the world was built with.
    pub config: SimConfig,
    /// Flat and texture animation cycles.
    pub anims: Vec<Anim>,
    /// Lines whose front texture scrolls every tic.
    pub scrolling_lines: Vec<usize>,
    /// Tics until the level timer forces an exit.
    pub level_timer: Option<i32>,
    /// Skill level, 0 to 4.
    pub skill: u8,
    /// Episode number.
    pub episode: u8,
    /// Map number within the episode.
    pub map: u8,
    /// Game paused by the player.
    pub paused: bool,
    /// A menu is open.
    pub menu_active: bool,
    /// A demo is driving input.
    pub demo_playback: bool,
    /// Secret sectors on the level.
    pub total_secret: i32,
    /// Set when the level timer runs out.
    pub exit_requested: bool,
    /// Whether at least one tic has run since the level started. An open
    /// menu only pauses a single-player game after the first tic.
    pub has_ticked: bool,
}

impl World {
    /// A world for `level` with no thinkers and trackers sized by `config`.
    #[must_use]
    pub fn new(level: Level, config: SimConfig) -> Self {
        Self {
            level,
            thinkers: ThinkerRegistry::new(),
            active_ceilings: ActiveList::new("ceilings", config.max_ceilings),
            active_plats: ActiveList::new("plats", config.max_plats),
            buttons: ButtonList::new(config.max_buttons),
            players: Default::default(),
            player_in_game: [false; MAXPLAYERS],
            respawn: RespawnQueue::default(),
            ctx: SimContext::new(config.random_index),
            anims: Vec::new(),
            scrolling_lines: Vec::new(),
            level_timer: None,
            skill: 0,
            episode: 1,
            map: 1,
            paused: false,
            menu_active: false,
            demo_playback: false,
            total_secret: 0,
            exit_requested: false,
            has_ticked: false,
            config,
        }
    }

    /// Registers a sector mechanism and marks `sector` as driven by it.
    pub fn spawn_special(&mut self, sector: usize, thinker: Thinker) -> ThinkerId {
        let id = self.thinkers.add(thinker);
        if let Some(sec) = self.level.sectors.get_mut(sector) {
            sec.special_data = Some(id);
        }
        id
    }

    /// Whether a mechanism currently drives `sector`.
    #[must_use]
    pub fn sector_busy(&self, sector: usize) -> bool {
        self.level.sectors.get(sector).is_some_and(|s| s.is_busy())
    }

    /// Places an actor of `kind` on the floor of `sector`.
    pub fn spawn_mobj(&mut self, kind: i32, x: Fixed, y: Fixed, sector: usize) -> Option<ThinkerId> {
        let sec = self.level.sectors.get(sector)?;
        let mobj = Mobj::spawn(kind, x, y, sector, sec).with_first_look(&mut self.ctx.rng);
        Some(self.thinkers.add(Thinker::Mobj(mobj)))
    }

    /// Puts a player into the game, driving a fresh actor.
    pub fn spawn_player(&mut self, slot: usize, x: Fixed, y: Fixed, sector: usize) -> Option<ThinkerId> {
        let sec = self.level.sectors.get(sector)?;
        let player = self.players.get_mut(slot)?;
        let mobj = Mobj {
            player: Some(slot),
            ..Mobj::spawn(0, x, y, sector, sec)
        }
        .with_first_look(&mut self.ctx.rng);
        let id = self.thinkers.add(Thinker::Mobj(mobj));
        player.mo = Some(id);
        if let Some(in_game) = self.player_in_game.get_mut(slot) {
            *in_game = true;
        }
        Some(id)
    }

    /// Advances the world by one tic.
    ///
    /// The order is fixed: players, thinkers, music, specials, item
    /// respawn, clock. A paused game, or a single-player game with the menu
    /// open after its first tic, does nothing.
    ///
    /// # Errors
    /// Returns [`SimError::ActiveList`] when a finished ceiling or platform
    /// was not tracked.
    pub fn try_tick(&mut self, hooks: &mut dyn TickHooks) -> Result<(), SimError> {
        if self.paused {
            return Ok(());
        }
        if !self.config.netgame && self.menu_active && !self.demo_playback && self.has_ticked {
            return Ok(());
        }
        let playing = self.player_in_game;
        for (slot, (player, in_game)) in self.players.iter_mut().zip(playing).enumerate() {
            if in_game {
                hooks.player_think(slot, player, &mut self.ctx);
            }
        }
        self.run_thinkers()?;
        hooks.music_info(self.ctx.level_time);
        self.update_specials();
        self.respawn_specials();
        self.ctx.level_time += 1;
        self.has_ticked = true;
        Ok(())
    }

    /// Advances one tic, treating an invariant violation as fatal.
    ///
    /// # Examples
    /// ```
    /// use gloom::config::SimConfig;
    /// use gloom::game::{NoHooks, World};
    /// use gloom::level::Level;
    ///
    /// let mut world = World::new(Level::default(), SimConfig::default());
    /// world.tick(&mut NoHooks);
    /// assert_eq!(world.ctx.level_time, 1);
    /// ```
    ///
    /// # Panics
    /// Panics when [`World::try_tick`] returns an error.
    #[track_caller]
    pub fn tick(&mut self, hooks: &mut dyn TickHooks) {
        if let Err(err) = self.try_tick(hooks) {
            panic!("World::tick failed at tic {}: {err}", self.ctx.level_time);
        }
    }

    /// One registry pass. Finished mechanisms release their sector and
    /// their tracker slot before the registry reclaims them.
    fn run_thinkers(&mut self) -> Result<(), SimError> {
        let Self {
            level,
            thinkers,
            active_ceilings,
            active_plats,
            ctx,
            ..
        } = self;
        let mut failure = None;
        thinkers.run_all(|id, thinker, registry| {
            if thinker.in_stasis() {
                return ThinkOutcome::Continue;
            }
            let outcome = {
                let mut env = SpecialEnv {
                    level: &mut *level,
                    occupants: registry,
                    ctx: &mut *ctx,
                };
                match thinker {
                    Thinker::Mobj(mobj) => mobj.think(),
                    Thinker::Ceiling(c) => c.think(&mut env),
                    Thinker::Floor(f) => f.think(&mut env),
                    Thinker::Plat(p) => p.think(&mut env),
                    Thinker::Door(d) => d.think(&mut env),
                    Thinker::Flicker(l) => l.think(&mut env),
                    Thinker::Flash(l) => l.think(&mut env),
                    Thinker::Strobe(l) => l.think(&mut env),
                    Thinker::Glow(l) => l.think(&mut env),
                }
            };
            if outcome == ThinkOutcome::Finished {
                if let Some(sector) = thinker.sector().and_then(|s| level.sectors.get_mut(s)) {
                    if sector.special_data == Some(id) {
                        sector.special_data = None;
                    }
                }
                let tracker = match thinker {
                    Thinker::Ceiling(_) => Some(&mut *active_ceilings),
                    Thinker::Plat(_) => Some(&mut *active_plats),
                    _ => None,
                };
                if let Some(Err(err)) = tracker.map(|list| list.remove(id)) {
                    failure.get_or_insert(err);
                }
                debug!("{:?} {id} finished", thinker.kind());
            }
            outcome
        });
        failure.map_or(Ok(()), |err| Err(SimError::from(err)))
    }

    /// Drops every thinker and resets per-level state, keeping players and
    /// configuration.
    pub fn reset_level(&mut self, level: Level) {
        self.level = level;
        self.thinkers.clear();
        self.active_ceilings.clear();
        self.active_plats.clear();
        self.buttons.clear();
        self.respawn.clear();
        self.scrolling_lines.clear();
        self.level_timer = None;
        self.total_secret = 0;
        self.exit_requested = false;
        self.has_ticked = false;
        self.ctx.level_time = 0;
        for player in &mut self.players {
            player.mo = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Sector;
    use crate::specials::ceiling::{Ceiling, CeilingKind};
    use crate::specials::lights::Glow;
    use mockall::Sequence;
    use rstest::{fixture, rstest};

    #[fixture]
    fn world() -> World {
        let level = Level::new(
            vec![Sector::new(0, 128, 160), Sector::new(0, 64, 160)],
            vec![],
            vec![],
            1,
            vec![],
        );
        World::new(level, SimConfig::default())
    }

    #[rstest]
    fn tick_runs_players_then_music(mut world: World) {
        world.player_in_game = [true, false, true, false];
        let mut hooks = MockTickHooks::new();
        let mut seq = Sequence::new();
        hooks
            .expect_player_think()
            .withf(|slot, _, _| *slot == 0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        hooks
            .expect_player_think()
            .withf(|slot, _, _| *slot == 2)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        hooks
            .expect_music_info()
            .withf(|time| *time == 0)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        world.tick(&mut hooks);
        assert_eq!(world.ctx.level_time, 1);
    }

    #[rstest]
    fn paused_world_stands_still(mut world: World) {
        world.paused = true;
        let mut hooks = MockTickHooks::new();
        world.tick(&mut hooks);
        assert_eq!(world.ctx.level_time, 0);
    }

    #[rstest]
    fn menu_pauses_only_after_first_tic(mut world: World) {
        world.menu_active = true;
        world.tick(&mut NoHooks);
        world.tick(&mut NoHooks);
        assert_eq!(world.ctx.level_time, 1);
        world.config.netgame = true;
        world.tick(&mut NoHooks);
        assert_eq!(world.ctx.level_time, 2);
    }

    #[rstest]
    fn finished_ceiling_releases_sector_and_slot(mut world: World) {
        let ceiling = Ceiling {
            kind: CeilingKind::LowerToFloor,
            sector: 1,
            bottom_height: Fixed::from_int(63),
            top_height: Fixed::from_int(64),
            speed: Fixed::from_int(8),
            crush: false,
            direction: -1,
            tag: 0,
            old_direction: 0,
        };
        let id = world.spawn_special(1, Thinker::Ceiling(ceiling));
        world.active_ceilings.add(id).expect("slot");
        assert!(world.sector_busy(1));
        world.tick(&mut NoHooks);
        assert!(!world.sector_busy(1));
        assert!(world.active_ceilings.is_empty());
        assert!(!world.thinkers.is_live(id));
    }

    #[rstest]
    fn untracked_ceiling_is_an_invariant_violation(mut world: World) {
        let ceiling = Ceiling {
            kind: CeilingKind::LowerToFloor,
            sector: 1,
            bottom_height: Fixed::from_int(63),
            top_height: Fixed::from_int(64),
            speed: Fixed::from_int(8),
            crush: false,
            direction: -1,
            tag: 0,
            old_direction: 0,
        };
        world.spawn_special(1, Thinker::Ceiling(ceiling));
        let err = world.try_tick(&mut NoHooks).expect_err("missing from tracker");
        assert!(matches!(err, SimError::ActiveList(ActiveListError::Missing { .. })));
    }

    #[rstest]
    fn every_light_runs_each_tic(mut world: World) {
        world.thinkers.add(Thinker::Glow(Glow {
            sector: 0,
            min_light: 0,
            max_light: 255,
            direction: -1,
        }));
        world.thinkers.add(Thinker::Glow(Glow {
            sector: 0,
            min_light: 0,
            max_light: 255,
            direction: 1,
        }));
        world.tick(&mut NoHooks);
        assert_eq!(world.level.sectors[0].light_level, 160);
    }
}
