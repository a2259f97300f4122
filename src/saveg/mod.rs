//! Save games: a flat little-endian archive of the header, the players, the
//! mutable level state and every thinker.
//!
//! Actor references are written as 1-based ordinals among live actors in
//! registry order (0 means none). Loading decodes into a copy of the world,
//! rebuilds every actor, then resolves the raw ordinals in a second pass;
//! the caller's world is replaced only when the whole stream decoded.

pub mod records;
pub mod stream;

use std::io::{self, Write};

use log::{debug, warn};
use thiserror::Error;

use crate::constants::{MAXPLAYERS, SAVEGAME_EOF, SAVESTRINGSIZE, VERSIONSIZE};
use crate::game::World;
use crate::level::Level;
use crate::numeric::{low16, low8, Fixed};
use crate::specials::active::ActiveListError;
use crate::thinker::{Thinker, ThinkerId, ThinkerRegistry};

use records::PendingRefs;
use stream::{SaveReader, SaveWriter};

/// Closes the actor section.
pub const TC_END: u8 = 0;
/// Precedes an actor record.
pub const TC_MOBJ: u8 = 1;

/// Precedes a ceiling record in the specials section.
pub const TC_CEILING: u8 = 0;
/// Precedes a door record.
pub const TC_DOOR: u8 = 1;
/// Precedes a floor record.
pub const TC_FLOOR: u8 = 2;
/// Precedes a platform record.
pub const TC_PLAT: u8 = 3;
/// Precedes a light flash record.
pub const TC_FLASH: u8 = 4;
/// Precedes a strobe record.
pub const TC_STROBE: u8 = 5;
/// Precedes a glow record.
pub const TC_GLOW: u8 = 6;
/// Closes the specials section.
pub const TC_END_SPECIALS: u8 = 7;
/// Fire flickers follow the classic tags so older readers stop at them.
pub const TC_FLICKER: u8 = 8;

/// Failure to produce a save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The sink rejected a write or the flush.
    #[error("failed to write save game: {0}")]
    Write(#[from] io::Error),
}

/// Reasons a save stream is rejected. A rejected load never touches the
/// live world.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The header names another engine version.
    #[error("save game is version {found:?}, expected {expected:?}")]
    BadVersion {
        /// Version string in the save.
        found: String,
        /// Version string this build writes.
        expected: String,
    },
    /// The actor section holds an unknown tag.
    #[error("unknown thinker class {class} in save game")]
    UnknownThinkerClass {
        /// The tag byte.
        class: u8,
    },
    /// The specials section holds an unknown tag.
    #[error("unknown special class {class} in save game")]
    UnknownSpecialClass {
        /// The tag byte.
        class: u8,
    },
    /// The stream ran out before the end marker.
    #[error("save game ends early")]
    Truncated,
    /// The byte after the specials section is not the end marker.
    #[error("bad end-of-file marker {found:#04x} in save game")]
    MissingEof {
        /// The byte found instead.
        found: u8,
    },
    /// A record names a sector the level does not have.
    #[error("save game names sector {index}, which does not exist")]
    SectorOutOfRange {
        /// The archived sector number.
        index: i32,
    },
    /// An enumerated field holds an unknown value.
    #[error("save game field {field} has invalid value {value}")]
    InvalidValue {
        /// Record and field name.
        field: &'static str,
        /// The archived value.
        value: i32,
    },
    /// A restored ceiling or platform did not fit its tracker.
    #[error(transparent)]
    ActiveList(#[from] ActiveListError),
}

/// The fixed-size block at the start of every save.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveHeader {
    /// Name the player gave the save.
    pub description: String,
    /// Engine version that wrote the save.
    pub version: String,
    /// Skill level.
    pub skill: u8,
    /// Episode number.
    pub episode: u8,
    /// Map number.
    pub map: u8,
    /// Which player slots were playing.
    pub player_in_game: [bool; MAXPLAYERS],
    /// Level clock, stored in 24 bits.
    pub level_time: i32,
}

impl SaveHeader {
    /// Header describing the current state of `world`.
    #[must_use]
    pub fn for_world(world: &World, description: &str) -> Self {
        Self {
            description: description.to_owned(),
            version: world.config.version_string(),
            skill: world.skill,
            episode: world.episode,
            map: world.map,
            player_in_game: world.player_in_game,
            level_time: world.ctx.level_time,
        }
    }

    fn write_to<W: Write>(&self, w: &mut SaveWriter<W>) {
        w.write_str_field(&self.description, SAVESTRINGSIZE);
        w.write_str_field(&self.version, VERSIONSIZE);
        w.write8(self.skill);
        w.write8(self.episode);
        w.write8(self.map);
        for in_game in self.player_in_game {
            w.write8(u8::from(in_game));
        }
        // Three bytes, most significant first.
        w.write8(low8(self.level_time >> 16));
        w.write8(low8(self.level_time >> 8));
        w.write8(low8(self.level_time));
    }

    fn read_from(r: &mut SaveReader<'_>) -> Self {
        let description = r.read_str_field(SAVESTRINGSIZE);
        let version = r.read_str_field(VERSIONSIZE);
        let skill = r.read8();
        let episode = r.read8();
        let map = r.read8();
        let player_in_game = std::array::from_fn(|_| r.read8() != 0);
        let a = i32::from(r.read8());
        let b = i32::from(r.read8());
        let c = i32::from(r.read8());
        Self {
            description,
            version,
            skill,
            episode,
            map,
            player_in_game,
            level_time: (a << 16) + (b << 8) + c,
        }
    }
}

/// What a successful load brought back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    /// The decoded header.
    pub header: SaveHeader,
    /// Actors restored.
    pub actors: usize,
    /// Sector mechanisms and lights restored.
    pub specials: usize,
    /// Target or tracer ordinals that named no actor and were left empty.
    pub unresolved_refs: usize,
}

/// Reads only the header, e.g. to list save slots.
///
/// # Errors
/// Returns [`LoadError::Truncated`] when the stream is shorter than a
/// header.
pub fn peek_header(bytes: &[u8]) -> Result<SaveHeader, LoadError> {
    let mut r = SaveReader::new(bytes);
    let header = SaveHeader::read_from(&mut r);
    if r.failed() {
        return Err(LoadError::Truncated);
    }
    Ok(header)
}

/// Archives `world` into `sink` and hands the sink back.
///
/// # Errors
/// Returns [`SaveError::Write`] with the first I/O error the sink raised.
pub fn save_game<W: Write>(world: &World, description: &str, sink: W) -> Result<W, SaveError> {
    let mut w = SaveWriter::new(sink);
    SaveHeader::for_world(world, description).write_to(&mut w);
    debug!("save: header done at byte {}", w.position());
    archive_players(world, &mut w);
    archive_world(&world.level, &mut w);
    debug!("save: world done at byte {}", w.position());
    archive_thinkers(&world.thinkers, &mut w);
    archive_specials(&world.thinkers, &mut w);
    w.write8(SAVEGAME_EOF);
    debug!("save: {} bytes", w.position());
    Ok(w.finish()?)
}

/// Archives `world` into a fresh buffer.
///
/// # Errors
/// Never fails in practice; the signature matches [`save_game`].
pub fn save_to_vec(world: &World, description: &str) -> Result<Vec<u8>, SaveError> {
    save_game(world, description, Vec::new())
}

/// Restores `world` from `bytes`.
///
/// The world must already hold the geometry of the saved map; only its
/// mutable state is replaced. On error `world` is left as it was.
///
/// # Errors
/// See [`LoadError`]. Any failure after the stream ran dry is reported as
/// [`LoadError::Truncated`].
pub fn load_game(world: &mut World, bytes: &[u8]) -> Result<LoadSummary, LoadError> {
    let mut r = SaveReader::new(bytes);
    let mut next = world.clone();
    match unarchive(&mut next, &mut r) {
        Ok(summary) => {
            *world = next;
            Ok(summary)
        }
        Err(_) if r.failed() => Err(LoadError::Truncated),
        Err(err) => Err(err),
    }
}

fn unarchive(world: &mut World, r: &mut SaveReader<'_>) -> Result<LoadSummary, LoadError> {
    let header = SaveHeader::read_from(r);
    let expected = world.config.version_string();
    if header.version != expected {
        return Err(LoadError::BadVersion {
            found: header.version,
            expected,
        });
    }
    world.skill = header.skill;
    world.episode = header.episode;
    world.map = header.map;
    world.player_in_game = header.player_in_game;
    world.ctx.level_time = header.level_time;
    world.has_ticked = false;
    world.exit_requested = false;

    unarchive_players(world, r)?;
    unarchive_world(&mut world.level, r);
    debug!("load: world done at byte {}", r.position());

    world.thinkers.clear();
    world.active_ceilings.clear();
    world.active_plats.clear();
    world.buttons.clear();
    world.respawn.clear();
    world.level.clear_special_data();

    let pending = unarchive_thinkers(world, r)?;
    let specials = unarchive_specials(world, r)?;
    let unresolved_refs = restore_targets(&mut world.thinkers, &pending);

    let eof = r.read8();
    if eof != SAVEGAME_EOF {
        return Err(LoadError::MissingEof { found: eof });
    }
    debug!("load: {} bytes", r.position());
    Ok(LoadSummary {
        header,
        actors: pending.len(),
        specials,
        unresolved_refs,
    })
}

fn archive_players<W: Write>(world: &World, w: &mut SaveWriter<W>) {
    for (player, _) in world
        .players
        .iter()
        .zip(world.player_in_game)
        .filter(|(_, in_game)| *in_game)
    {
        w.write_pad();
        records::write_player(w, player);
    }
}

fn unarchive_players(world: &mut World, r: &mut SaveReader<'_>) -> Result<(), LoadError> {
    for (player, in_game) in world.players.iter_mut().zip(world.player_in_game) {
        if in_game {
            r.read_pad();
            *player = records::read_player(r)?;
        }
    }
    Ok(())
}

fn archive_world<W: Write>(level: &Level, w: &mut SaveWriter<W>) {
    for sector in &level.sectors {
        w.write16(records::height_word(sector.floor_height));
        w.write16(records::height_word(sector.ceiling_height));
        w.write16(sector.floor_pic);
        w.write16(sector.ceiling_pic);
        w.write16(low16(sector.light_level));
        w.write16(sector.special);
        w.write16(sector.tag);
    }
    for line in &level.lines {
        w.write16(line.flags);
        w.write16(line.special);
        w.write16(line.tag);
        for index in line.side_num.iter().flatten() {
            let side = level.sides.get(*index).cloned().unwrap_or_default();
            w.write16(records::height_word(side.texture_offset));
            w.write16(records::height_word(side.row_offset));
            w.write16(side.top_texture);
            w.write16(side.bottom_texture);
            w.write16(side.mid_texture);
        }
    }
}

fn unarchive_world(level: &mut Level, r: &mut SaveReader<'_>) {
    let flats = 0..level.num_flats;
    for sector in &mut level.sectors {
        sector.floor_height = Fixed::from_int(i32::from(r.read16()));
        sector.ceiling_height = Fixed::from_int(i32::from(r.read16()));
        let floor_pic = r.read16();
        let ceiling_pic = r.read16();
        if flats.contains(&floor_pic) {
            sector.floor_pic = floor_pic;
        }
        if flats.contains(&ceiling_pic) {
            sector.ceiling_pic = ceiling_pic;
        }
        sector.light_level = i32::from(r.read16());
        sector.special = r.read16();
        sector.tag = r.read16();
    }
    let Level { lines, sides, .. } = level;
    for line in lines.iter_mut() {
        line.flags = r.read16();
        line.special = r.read16();
        line.tag = r.read16();
        for side_index in line.side_num.into_iter().flatten() {
            let texture_offset = Fixed::from_int(i32::from(r.read16()));
            let row_offset = Fixed::from_int(i32::from(r.read16()));
            let top = r.read16();
            let bottom = r.read16();
            let mid = r.read16();
            if let Some(side) = sides.get_mut(side_index) {
                side.texture_offset = texture_offset;
                side.row_offset = row_offset;
                side.top_texture = top;
                side.bottom_texture = bottom;
                side.mid_texture = mid;
            }
        }
    }
}

fn archive_thinkers<W: Write>(registry: &ThinkerRegistry, w: &mut SaveWriter<W>) {
    let ordinals = registry.ordinal_table();
    for (_, mobj) in registry.mobjs() {
        w.write8(TC_MOBJ);
        w.write_pad();
        records::write_mobj(w, mobj, &ordinals);
    }
    w.write8(TC_END);
    debug!("save: {} actors", ordinals.len());
}

fn unarchive_thinkers(
    world: &mut World,
    r: &mut SaveReader<'_>,
) -> Result<Vec<(ThinkerId, PendingRefs)>, LoadError> {
    let num_sectors = world.level.sectors.len();
    let mut pending = Vec::new();
    loop {
        match r.read8() {
            TC_END => break,
            TC_MOBJ => {
                r.read_pad();
                let (mobj, refs) = records::read_mobj(r, num_sectors)?;
                let player = mobj.player;
                let id = world.thinkers.add(Thinker::Mobj(mobj));
                if let Some(owner) = player.and_then(|slot| world.players.get_mut(slot)) {
                    owner.mo = Some(id);
                }
                pending.push((id, refs));
            }
            class => return Err(LoadError::UnknownThinkerClass { class }),
        }
    }
    debug!("load: {} actors", pending.len());
    Ok(pending)
}

fn archive_specials<W: Write>(registry: &ThinkerRegistry, w: &mut SaveWriter<W>) {
    let mut count = 0_usize;
    for (_, thinker) in registry.iter() {
        let tag = match thinker {
            Thinker::Mobj(_) => continue,
            Thinker::Ceiling(_) => TC_CEILING,
            Thinker::Door(_) => TC_DOOR,
            Thinker::Floor(_) => TC_FLOOR,
            Thinker::Plat(_) => TC_PLAT,
            Thinker::Flash(_) => TC_FLASH,
            Thinker::Strobe(_) => TC_STROBE,
            Thinker::Glow(_) => TC_GLOW,
            Thinker::Flicker(_) => TC_FLICKER,
        };
        w.write8(tag);
        w.write_pad();
        match thinker {
            Thinker::Mobj(_) => {}
            Thinker::Ceiling(c) => records::write_ceiling(w, c),
            Thinker::Door(d) => records::write_door(w, d),
            Thinker::Floor(f) => records::write_floor(w, f),
            Thinker::Plat(p) => records::write_plat(w, p),
            Thinker::Flash(l) => records::write_flash(w, l),
            Thinker::Strobe(l) => records::write_strobe(w, l),
            Thinker::Glow(l) => records::write_glow(w, l),
            Thinker::Flicker(l) => records::write_flicker(w, l),
        }
        count += 1;
    }
    w.write8(TC_END_SPECIALS);
    debug!("save: {count} specials");
}

fn unarchive_specials(world: &mut World, r: &mut SaveReader<'_>) -> Result<usize, LoadError> {
    let num_sectors = world.level.sectors.len();
    let mut count = 0_usize;
    loop {
        let class = r.read8();
        if class == TC_END_SPECIALS {
            break;
        }
        r.read_pad();
        match class {
            TC_CEILING => {
                let ceiling = records::read_ceiling(r, num_sectors)?;
                let id = world.spawn_special(ceiling.sector, Thinker::Ceiling(ceiling));
                world.active_ceilings.add(id)?;
            }
            TC_DOOR => {
                let door = records::read_door(r, num_sectors)?;
                world.spawn_special(door.sector, Thinker::Door(door));
            }
            TC_FLOOR => {
                let floor = records::read_floor(r, num_sectors)?;
                world.spawn_special(floor.sector, Thinker::Floor(floor));
            }
            TC_PLAT => {
                let plat = records::read_plat(r, num_sectors)?;
                let id = world.spawn_special(plat.sector, Thinker::Plat(plat));
                world.active_plats.add(id)?;
            }
            TC_FLASH => {
                let light = records::read_flash(r, num_sectors)?;
                world.thinkers.add(Thinker::Flash(light));
            }
            TC_STROBE => {
                let light = records::read_strobe(r, num_sectors)?;
                world.thinkers.add(Thinker::Strobe(light));
            }
            TC_GLOW => {
                let light = records::read_glow(r, num_sectors)?;
                world.thinkers.add(Thinker::Glow(light));
            }
            TC_FLICKER => {
                let light = records::read_flicker(r, num_sectors)?;
                world.thinkers.add(Thinker::Flicker(light));
            }
            other => return Err(LoadError::UnknownSpecialClass { class: other }),
        }
        count += 1;
    }
    debug!("load: {count} specials");
    Ok(count)
}

/// Second load pass: turns archived ordinals back into actor ids.
///
/// Returns how many non-zero ordinals named no actor; those references are
/// left empty and reported once.
pub fn restore_targets(
    registry: &mut ThinkerRegistry,
    pending: &[(ThinkerId, PendingRefs)],
) -> usize {
    let actors: Vec<ThinkerId> = registry.mobjs().map(|(id, _)| id).collect();
    let mut unresolved = 0_usize;
    let mut resolve = |ordinal: u32| -> Option<ThinkerId> {
        if ordinal == 0 {
            return None;
        }
        let found = usize::try_from(ordinal - 1)
            .ok()
            .and_then(|i| actors.get(i).copied());
        if found.is_none() {
            unresolved += 1;
        }
        found
    };
    for (id, refs) in pending {
        let target = resolve(refs.target);
        let tracer = resolve(refs.tracer);
        if let Some(mobj) = registry.mobj_mut(*id) {
            mobj.target = target;
            mobj.tracer = tracer;
        }
    }
    if unresolved > 0 {
        warn!("restore_targets: {unresolved} references could not be resolved");
    }
    unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::level::{Line, Sector, Side};
    use crate::specials::ceiling::{Ceiling, CeilingKind};
    use crate::specials::lights::FireFlicker;
    use crate::thinker::Mobj;
    use rstest::{fixture, rstest};

    #[fixture]
    fn world() -> World {
        let line = Line {
            special: 48,
            side_num: [Some(0), None],
            ..Line::default()
        };
        let level = Level::new(
            vec![Sector::new(0, 128, 160), Sector::new(16, 96, 200)],
            vec![line],
            vec![Side::default()],
            4,
            vec![],
        );
        let mut world = World::new(level, SimConfig::default());
        world.map = 7;
        world.ctx.level_time = 0x01_2345;
        world
    }

    fn crusher() -> Ceiling {
        Ceiling {
            kind: CeilingKind::CrushAndRaise,
            sector: 1,
            bottom_height: Fixed::from_int(24),
            top_height: Fixed::from_int(96),
            speed: Fixed::UNIT,
            crush: true,
            direction: -1,
            tag: 3,
            old_direction: 0,
        }
    }

    #[rstest]
    fn header_survives_a_round_trip(world: World) {
        let bytes = save_to_vec(&world, "E1M7 test").expect("vec sink");
        let header = peek_header(&bytes).expect("complete header");
        assert_eq!(header.description, "E1M7 test");
        assert_eq!(header.version, "version 109");
        assert_eq!(header.map, 7);
        assert_eq!(header.level_time, 0x01_2345);
        assert_eq!(&bytes[SAVESTRINGSIZE + VERSIONSIZE + 7..][..3], &[0x01, 0x23, 0x45]);
    }

    #[rstest]
    fn world_fields_and_specials_come_back(mut world: World) {
        world.level.sectors[1].light_level = 96;
        world.level.sides[0].texture_offset = Fixed::from_int(5);
        let ceiling = world.spawn_special(1, Thinker::Ceiling(crusher()));
        world.active_ceilings.add(ceiling).expect("slot");
        world.thinkers.add(Thinker::Flicker(FireFlicker {
            sector: 0,
            count: 3,
            max_light: 160,
            min_light: 144,
        }));
        let bytes = save_to_vec(&world, "").expect("vec sink");

        let mut loaded = World::new(world.level.clone(), SimConfig::default());
        loaded.level.clear_special_data();
        loaded.level.sectors[1].light_level = 0;
        let summary = load_game(&mut loaded, &bytes).expect("valid save");

        assert_eq!(summary.specials, 2);
        assert_eq!(loaded.level.sectors[1].light_level, 96);
        assert_eq!(loaded.level.sides[0].texture_offset, Fixed::from_int(5));
        assert!(loaded.sector_busy(1));
        assert!(!loaded.sector_busy(0));
        assert_eq!(loaded.active_ceilings.len(), 1);
        assert_eq!(save_to_vec(&loaded, "").expect("vec sink"), bytes);
    }

    #[rstest]
    fn self_tracer_survives(mut world: World) {
        let first = world.thinkers.add(Thinker::Mobj(Mobj::default()));
        let second = world.thinkers.add(Thinker::Mobj(Mobj {
            health: 40,
            ..Mobj::default()
        }));
        if let Some(m) = world.thinkers.mobj_mut(second) {
            m.tracer = Some(second);
            m.target = Some(first);
        }
        let bytes = save_to_vec(&world, "").expect("vec sink");
        let summary = load_game(&mut world, &bytes).expect("valid save");
        assert_eq!(summary.actors, 2);
        assert_eq!(summary.unresolved_refs, 0);

        let ids: Vec<ThinkerId> = world.thinkers.mobjs().map(|(id, _)| id).collect();
        let reloaded = world.thinkers.mobj(ids[1]).expect("second actor");
        assert_eq!(reloaded.health, 40);
        assert_eq!(reloaded.tracer, Some(ids[1]));
        assert_eq!(reloaded.target, Some(ids[0]));
    }

    #[rstest]
    fn player_actor_is_relinked(mut world: World) {
        world.spawn_player(2, Fixed::ZERO, Fixed::ZERO, 0).expect("valid sector");
        world.players[2].health = 73;
        let bytes = save_to_vec(&world, "").expect("vec sink");
        world.players[2] = crate::player::Player::default();
        load_game(&mut world, &bytes).expect("valid save");
        assert_eq!(world.players[2].health, 73);
        let mo = world.players[2].mo.expect("linked actor");
        assert_eq!(world.thinkers.mobj(mo).and_then(|m| m.player), Some(2));
    }

    #[rstest]
    fn foreign_version_leaves_world_untouched(mut world: World) {
        let mut bytes = save_to_vec(&world, "").expect("vec sink");
        bytes[SAVESTRINGSIZE + 8..SAVESTRINGSIZE + 11].copy_from_slice(b"666");
        world.ctx.level_time = 9;
        let err = load_game(&mut world, &bytes).expect_err("foreign save");
        assert!(matches!(err, LoadError::BadVersion { .. }));
        assert_eq!(world.ctx.level_time, 9);
    }

    #[rstest]
    fn short_stream_is_truncated(mut world: World) {
        world.thinkers.add(Thinker::Mobj(Mobj::default()));
        let bytes = save_to_vec(&world, "").expect("vec sink");
        for cut in [10, bytes.len() / 2, bytes.len() - 1] {
            assert_eq!(load_game(&mut world, &bytes[..cut]), Err(LoadError::Truncated));
        }
    }

    #[rstest]
    fn unknown_tags_are_fatal(mut world: World) {
        let bytes = save_to_vec(&world, "").expect("vec sink");
        // Empty registry: the actor terminator sits three bytes from the end.
        let actor_end = bytes.len() - 3;
        let mut bad_actor = bytes.clone();
        bad_actor[actor_end] = 9;
        assert_eq!(
            load_game(&mut world, &bad_actor),
            Err(LoadError::UnknownThinkerClass { class: 9 })
        );

        let mut bad_special = bytes.clone();
        bad_special[actor_end + 1] = 42;
        bad_special.extend_from_slice(&[0; 3]);
        assert_eq!(
            load_game(&mut world, &bad_special),
            Err(LoadError::UnknownSpecialClass { class: 42 })
        );

        let mut bad_eof = bytes;
        bad_eof[actor_end + 2] = 0;
        assert_eq!(
            load_game(&mut world, &bad_eof),
            Err(LoadError::MissingEof { found: 0 })
        );
    }

    #[rstest]
    fn dangling_ordinals_are_counted() {
        let mut registry = ThinkerRegistry::new();
        let id = registry.add(Thinker::Mobj(Mobj::default()));
        let pending = [(
            id,
            PendingRefs {
                target: 5,
                tracer: 1,
            },
        )];
        assert_eq!(restore_targets(&mut registry, &pending), 1);
        let mobj = registry.mobj(id).expect("live actor");
        assert_eq!(mobj.target, None);
        assert_eq!(mobj.tracer, Some(id));
    }
}
