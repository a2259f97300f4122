//! Field-by-field encoders and decoders for each archived record.
//!
//! Field order and width follow the on-disk layout exactly. Links that mean
//! nothing in another session (sector chains, info tables, messages) are
//! written as zero words and skipped on the way back in.

use hashbrown::HashMap;
use std::io::Write;

use super::stream::{SaveReader, SaveWriter};
use super::LoadError;
use crate::constants::{MAXPLAYERS, NUMAMMO, NUMCARDS, NUMPOWERS, NUMWEAPONS};
use crate::numeric::{angle_to_word, low16, word_to_angle, Fixed};
use crate::player::{Player, PlayerState, PspDef, TicCmd};
use crate::specials::active::Stasis;
use crate::specials::ceiling::{Ceiling, CeilingKind};
use crate::specials::door::{Door, DoorKind};
use crate::specials::floor::{FloorKind, FloorMove};
use crate::specials::lights::{FireFlicker, Glow, LightFlash, Strobe};
use crate::specials::plat::{Plat, PlatKind, PlatStatus};
use crate::thinker::mobj::MapThing;
use crate::thinker::{Mobj, ThinkerId};

/// Raw reference fields of a decoded actor, resolved once every actor is
/// back in the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingRefs {
    /// Ordinal of the target, 0 for none.
    pub target: u32,
    /// Ordinal of the tracer, 0 for none.
    pub tracer: u32,
}

fn index_word(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(-1)
}

fn ordinal_word(ordinal: u32) -> i32 {
    i32::try_from(ordinal).unwrap_or(0)
}

fn decode<T>(
    field: &'static str,
    value: i32,
    parse: impl FnOnce(i32) -> Option<T>,
) -> Result<T, LoadError> {
    parse(value).ok_or(LoadError::InvalidValue { field, value })
}

fn read_sector(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<usize, LoadError> {
    let index = r.read32();
    usize::try_from(index)
        .ok()
        .filter(|i| *i < num_sectors)
        .ok_or(LoadError::SectorOutOfRange { index })
}

/// The thinker header word: non-zero while the mechanism is running.
fn write_header<W: Write>(w: &mut SaveWriter<W>, running: bool) {
    w.write32(i32::from(running));
}

fn write_bools<W: Write>(w: &mut SaveWriter<W>, values: &[bool]) {
    for &v in values {
        w.write_bool(v);
    }
}

fn write_ints<W: Write>(w: &mut SaveWriter<W>, values: &[i32]) {
    for &v in values {
        w.write32(v);
    }
}

fn read_bools<const N: usize>(r: &mut SaveReader<'_>) -> [bool; N] {
    std::array::from_fn(|_| r.read_bool())
}

fn read_ints<const N: usize>(r: &mut SaveReader<'_>) -> [i32; N] {
    std::array::from_fn(|_| r.read32())
}

/// Encodes a map placement.
pub fn write_map_thing<W: Write>(w: &mut SaveWriter<W>, thing: &MapThing) {
    w.write16(thing.x);
    w.write16(thing.y);
    w.write16(thing.angle);
    w.write16(thing.kind);
    w.write16(thing.options);
}

/// Decodes a map placement.
pub fn read_map_thing(r: &mut SaveReader<'_>) -> MapThing {
    MapThing {
        x: r.read16(),
        y: r.read16(),
        angle: r.read16(),
        kind: r.read16(),
        options: r.read16(),
    }
}

/// Encodes an actor.
pub fn write_mobj<W: Write>(
    w: &mut SaveWriter<W>,
    mobj: &Mobj,
    ordinals: &HashMap<ThinkerId, u32>,
) {
    let ordinal = |id: Option<ThinkerId>| {
        ordinal_word(id.and_then(|id| ordinals.get(&id).copied()).unwrap_or(0))
    };
    write_header(w, true);
    w.write_fixed(mobj.x);
    w.write_fixed(mobj.y);
    w.write_fixed(mobj.z);
    w.write32(0); // snext
    w.write32(0); // sprev
    w.write32(angle_to_word(mobj.angle));
    w.write32(mobj.sprite);
    w.write32(mobj.frame);
    w.write32(0); // bnext
    w.write32(0); // bprev
    w.write32(index_word(mobj.sector));
    w.write_fixed(mobj.floor_z);
    w.write_fixed(mobj.ceiling_z);
    w.write_fixed(mobj.radius);
    w.write_fixed(mobj.height);
    w.write_fixed(mobj.mom_x);
    w.write_fixed(mobj.mom_y);
    w.write_fixed(mobj.mom_z);
    w.write32(mobj.valid_count);
    w.write32(mobj.kind);
    w.write32(0); // info
    w.write32(mobj.tics);
    w.write32(mobj.state);
    w.write32(mobj.flags);
    w.write32(mobj.health);
    w.write32(mobj.move_dir);
    w.write32(mobj.move_count);
    w.write32(ordinal(mobj.target));
    w.write32(mobj.reaction_time);
    w.write32(mobj.threshold);
    w.write32(mobj.player.map_or(0, |slot| index_word(slot) + 1));
    w.write32(mobj.last_look);
    write_map_thing(w, &mobj.spawn_point);
    w.write32(ordinal(mobj.tracer));
}

/// Decodes an actor. Its references come back as raw ordinals and its
/// player link as the archived slot number.
pub fn read_mobj(
    r: &mut SaveReader<'_>,
    num_sectors: usize,
) -> Result<(Mobj, PendingRefs), LoadError> {
    let _running = r.read32();
    let mut mobj = Mobj {
        x: r.read_fixed(),
        y: r.read_fixed(),
        z: r.read_fixed(),
        ..Mobj::default()
    };
    r.read32();
    r.read32();
    mobj.angle = word_to_angle(r.read32());
    mobj.sprite = r.read32();
    mobj.frame = r.read32();
    r.read32();
    r.read32();
    mobj.sector = read_sector(r, num_sectors)?;
    mobj.floor_z = r.read_fixed();
    mobj.ceiling_z = r.read_fixed();
    mobj.radius = r.read_fixed();
    mobj.height = r.read_fixed();
    mobj.mom_x = r.read_fixed();
    mobj.mom_y = r.read_fixed();
    mobj.mom_z = r.read_fixed();
    mobj.valid_count = r.read32();
    mobj.kind = r.read32();
    r.read32();
    mobj.tics = r.read32();
    mobj.state = r.read32();
    mobj.flags = r.read32();
    mobj.health = r.read32();
    mobj.move_dir = r.read32();
    mobj.move_count = r.read32();
    let target = r.read32();
    mobj.reaction_time = r.read32();
    mobj.threshold = r.read32();
    let player = r.read32();
    mobj.player = match player {
        0 => None,
        p => Some(decode("mobj.player", p, |p| {
            usize::try_from(p - 1).ok().filter(|slot| *slot < MAXPLAYERS)
        })?),
    };
    mobj.last_look = r.read32();
    mobj.spawn_point = read_map_thing(r);
    let tracer = r.read32();
    let refs = PendingRefs {
        target: u32::try_from(target).unwrap_or(0),
        tracer: u32::try_from(tracer).unwrap_or(0),
    };
    Ok((mobj, refs))
}

fn write_ticcmd<W: Write>(w: &mut SaveWriter<W>, cmd: &TicCmd) {
    w.write8(cmd.forward_move.cast_unsigned());
    w.write8(cmd.side_move.cast_unsigned());
    w.write16(cmd.angle_turn);
    w.write16(cmd.consistency);
    w.write8(cmd.chat_char);
    w.write8(cmd.buttons);
}

fn read_ticcmd(r: &mut SaveReader<'_>) -> TicCmd {
    TicCmd {
        forward_move: r.read8().cast_signed(),
        side_move: r.read8().cast_signed(),
        angle_turn: r.read16(),
        consistency: r.read16(),
        chat_char: r.read8(),
        buttons: r.read8(),
    }
}

/// Encodes a player.
pub fn write_player<W: Write>(w: &mut SaveWriter<W>, player: &Player) {
    w.write32(0); // mo, relinked by the actor records
    w.write32(player.state as i32);
    write_ticcmd(w, &player.cmd);
    w.write_fixed(player.view_z);
    w.write_fixed(player.view_height);
    w.write_fixed(player.delta_view_height);
    w.write_fixed(player.bob);
    w.write32(player.health);
    w.write32(player.armor_points);
    w.write32(player.armor_type);
    write_ints(w, &player.powers);
    write_bools(w, &player.cards);
    w.write_bool(player.backpack);
    write_ints(w, &player.frags);
    w.write32(player.ready_weapon);
    w.write32(player.pending_weapon);
    write_bools(w, &player.weapon_owned);
    write_ints(w, &player.ammo);
    write_ints(w, &player.max_ammo);
    w.write_bool(player.attack_down);
    w.write_bool(player.use_down);
    w.write32(player.cheats);
    w.write32(player.refire);
    w.write32(player.kill_count);
    w.write32(player.item_count);
    w.write32(player.secret_count);
    w.write32(0); // message
    w.write32(player.damage_count);
    w.write32(player.bonus_count);
    w.write32(0); // attacker
    w.write32(player.extra_light);
    w.write32(player.fixed_colormap);
    w.write32(player.colormap);
    for psp in &player.psprites {
        w.write32(psp.state);
        w.write32(psp.tics);
        w.write_fixed(psp.sx);
        w.write_fixed(psp.sy);
    }
    w.write_bool(player.did_secret);
}

/// Decodes a player.
pub fn read_player(r: &mut SaveReader<'_>) -> Result<Player, LoadError> {
    r.read32();
    let state = decode("player.state", r.read32(), PlayerState::from_i32)?;
    let cmd = read_ticcmd(r);
    let mut player = Player {
        state,
        cmd,
        view_z: r.read_fixed(),
        view_height: r.read_fixed(),
        delta_view_height: r.read_fixed(),
        bob: r.read_fixed(),
        health: r.read32(),
        armor_points: r.read32(),
        armor_type: r.read32(),
        ..Player::default()
    };
    player.powers = read_ints::<NUMPOWERS>(r);
    player.cards = read_bools::<NUMCARDS>(r);
    player.backpack = r.read_bool();
    player.frags = read_ints::<MAXPLAYERS>(r);
    player.ready_weapon = r.read32();
    player.pending_weapon = r.read32();
    player.weapon_owned = read_bools::<NUMWEAPONS>(r);
    player.ammo = read_ints::<NUMAMMO>(r);
    player.max_ammo = read_ints::<NUMAMMO>(r);
    player.attack_down = r.read_bool();
    player.use_down = r.read_bool();
    player.cheats = r.read32();
    player.refire = r.read32();
    player.kill_count = r.read32();
    player.item_count = r.read32();
    player.secret_count = r.read32();
    r.read32();
    player.damage_count = r.read32();
    player.bonus_count = r.read32();
    r.read32();
    player.extra_light = r.read32();
    player.fixed_colormap = r.read32();
    player.colormap = r.read32();
    for psp in &mut player.psprites {
        *psp = PspDef {
            state: r.read32(),
            tics: r.read32(),
            sx: r.read_fixed(),
            sy: r.read_fixed(),
        };
    }
    player.did_secret = r.read_bool();
    Ok(player)
}

/// Encodes a ceiling mover.
pub fn write_ceiling<W: Write>(w: &mut SaveWriter<W>, c: &Ceiling) {
    write_header(w, !c.in_stasis());
    w.write32(c.kind as i32);
    w.write32(index_word(c.sector));
    w.write_fixed(c.bottom_height);
    w.write_fixed(c.top_height);
    w.write_fixed(c.speed);
    w.write_bool(c.crush);
    w.write32(c.direction);
    w.write32(c.tag);
    w.write32(c.old_direction);
}

/// Decodes a ceiling mover.
pub fn read_ceiling(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<Ceiling, LoadError> {
    r.read32();
    Ok(Ceiling {
        kind: decode("ceiling.type", r.read32(), CeilingKind::from_i32)?,
        sector: read_sector(r, num_sectors)?,
        bottom_height: r.read_fixed(),
        top_height: r.read_fixed(),
        speed: r.read_fixed(),
        crush: r.read_bool(),
        direction: r.read32(),
        tag: r.read32(),
        old_direction: r.read32(),
    })
}

/// Encodes a door.
pub fn write_door<W: Write>(w: &mut SaveWriter<W>, d: &Door) {
    write_header(w, true);
    w.write32(d.kind as i32);
    w.write32(index_word(d.sector));
    w.write_fixed(d.top_height);
    w.write_fixed(d.speed);
    w.write32(d.direction);
    w.write32(d.top_wait);
    w.write32(d.top_countdown);
}

/// Decodes a door.
pub fn read_door(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<Door, LoadError> {
    r.read32();
    Ok(Door {
        kind: decode("door.type", r.read32(), DoorKind::from_i32)?,
        sector: read_sector(r, num_sectors)?,
        top_height: r.read_fixed(),
        speed: r.read_fixed(),
        direction: r.read32(),
        top_wait: r.read32(),
        top_countdown: r.read32(),
    })
}

/// Encodes a floor mover.
pub fn write_floor<W: Write>(w: &mut SaveWriter<W>, f: &FloorMove) {
    write_header(w, true);
    w.write32(f.kind as i32);
    w.write_bool(f.crush);
    w.write32(index_word(f.sector));
    w.write32(f.direction);
    w.write32(f.new_special);
    w.write16(f.texture);
    w.write_fixed(f.dest_height);
    w.write_fixed(f.speed);
}

/// Decodes a floor mover.
pub fn read_floor(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<FloorMove, LoadError> {
    r.read32();
    Ok(FloorMove {
        kind: decode("floor.type", r.read32(), FloorKind::from_i32)?,
        crush: r.read_bool(),
        sector: read_sector(r, num_sectors)?,
        direction: r.read32(),
        new_special: r.read32(),
        texture: r.read16(),
        dest_height: r.read_fixed(),
        speed: r.read_fixed(),
    })
}

/// Encodes a platform.
pub fn write_plat<W: Write>(w: &mut SaveWriter<W>, p: &Plat) {
    write_header(w, !p.in_stasis());
    w.write32(index_word(p.sector));
    w.write_fixed(p.speed);
    w.write_fixed(p.low);
    w.write_fixed(p.high);
    w.write32(p.wait);
    w.write32(p.count);
    w.write32(p.status as i32);
    w.write32(p.old_status as i32);
    w.write_bool(p.crush);
    w.write32(p.tag);
    w.write32(p.kind as i32);
}

/// Decodes a platform.
pub fn read_plat(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<Plat, LoadError> {
    r.read32();
    Ok(Plat {
        sector: read_sector(r, num_sectors)?,
        speed: r.read_fixed(),
        low: r.read_fixed(),
        high: r.read_fixed(),
        wait: r.read32(),
        count: r.read32(),
        status: decode("plat.status", r.read32(), PlatStatus::from_i32)?,
        old_status: decode("plat.oldstatus", r.read32(), PlatStatus::from_i32)?,
        crush: r.read_bool(),
        tag: r.read32(),
        kind: decode("plat.type", r.read32(), PlatKind::from_i32)?,
    })
}

/// Encodes a light flash.
pub fn write_flash<W: Write>(w: &mut SaveWriter<W>, l: &LightFlash) {
    write_header(w, true);
    w.write32(index_word(l.sector));
    write_ints(w, &[l.count, l.max_light, l.min_light, l.max_time, l.min_time]);
}

/// Decodes a light flash.
pub fn read_flash(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<LightFlash, LoadError> {
    r.read32();
    let sector = read_sector(r, num_sectors)?;
    let [count, max_light, min_light, max_time, min_time] = read_ints::<5>(r);
    Ok(LightFlash {
        sector,
        count,
        max_light,
        min_light,
        max_time,
        min_time,
    })
}

/// Encodes a strobe.
pub fn write_strobe<W: Write>(w: &mut SaveWriter<W>, l: &Strobe) {
    write_header(w, true);
    w.write32(index_word(l.sector));
    write_ints(w, &[l.count, l.min_light, l.max_light, l.dark_time, l.bright_time]);
}

/// Decodes a strobe.
pub fn read_strobe(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<Strobe, LoadError> {
    r.read32();
    let sector = read_sector(r, num_sectors)?;
    let [count, min_light, max_light, dark_time, bright_time] = read_ints::<5>(r);
    Ok(Strobe {
        sector,
        count,
        min_light,
        max_light,
        dark_time,
        bright_time,
    })
}

/// Encodes a glow.
pub fn write_glow<W: Write>(w: &mut SaveWriter<W>, l: &Glow) {
    write_header(w, true);
    w.write32(index_word(l.sector));
    write_ints(w, &[l.min_light, l.max_light, l.direction]);
}

/// Decodes a glow.
pub fn read_glow(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<Glow, LoadError> {
    r.read32();
    let sector = read_sector(r, num_sectors)?;
    let [min_light, max_light, direction] = read_ints::<3>(r);
    Ok(Glow {
        sector,
        min_light,
        max_light,
        direction,
    })
}

/// Encodes a fire flicker.
pub fn write_flicker<W: Write>(w: &mut SaveWriter<W>, l: &FireFlicker) {
    write_header(w, true);
    w.write32(index_word(l.sector));
    write_ints(w, &[l.count, l.max_light, l.min_light]);
}

/// Decodes a fire flicker.
pub fn read_flicker(r: &mut SaveReader<'_>, num_sectors: usize) -> Result<FireFlicker, LoadError> {
    r.read32();
    let sector = read_sector(r, num_sectors)?;
    let [count, max_light, min_light] = read_ints::<3>(r);
    Ok(FireFlicker {
        sector,
        count,
        max_light,
        min_light,
    })
}

/// Sixteen-bit archive form of a whole-unit height or offset.
#[must_use]
pub const fn height_word(value: Fixed) -> i16 {
    low16(value.to_int())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn encode<F>(write: F) -> Vec<u8>
    where
        F: FnOnce(&mut SaveWriter<Vec<u8>>),
    {
        let mut w = SaveWriter::new(Vec::new());
        write(&mut w);
        w.finish().expect("vec sink")
    }

    #[rstest]
    fn actor_record_has_fixed_width() {
        let bytes = encode(|w| write_mobj(w, &Mobj::default(), &HashMap::new()));
        assert_eq!(bytes.len(), 146);
    }

    #[rstest]
    fn player_record_has_fixed_width() {
        let bytes = encode(|w| write_player(w, &Player::default()));
        assert_eq!(bytes.len(), 280);
    }

    #[rstest]
    fn paused_ceiling_writes_zero_header() {
        let ceiling = Ceiling {
            kind: CeilingKind::CrushAndRaise,
            sector: 2,
            bottom_height: Fixed::from_int(8),
            top_height: Fixed::from_int(64),
            speed: Fixed::UNIT,
            crush: true,
            direction: 0,
            tag: 7,
            old_direction: -1,
        };
        let bytes = encode(|w| write_ceiling(w, &ceiling));
        assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
        let mut r = SaveReader::new(&bytes);
        assert_eq!(read_ceiling(&mut r, 3).expect("valid record"), ceiling);
    }

    #[rstest]
    fn out_of_range_sector_is_rejected() {
        let glow = Glow {
            sector: 9,
            min_light: 0,
            max_light: 0,
            direction: 1,
        };
        let bytes = encode(|w| write_glow(w, &glow));
        let mut r = SaveReader::new(&bytes);
        assert_eq!(
            read_glow(&mut r, 4),
            Err(LoadError::SectorOutOfRange { index: 9 })
        );
    }

    #[rstest]
    fn unknown_enum_value_is_rejected() {
        let mut bytes = encode(|w| {
            write_header(w, true);
            w.write32(42);
        });
        bytes.extend_from_slice(&[0; 40]);
        let mut r = SaveReader::new(&bytes);
        assert_eq!(
            read_door(&mut r, 1),
            Err(LoadError::InvalidValue {
                field: "door.type",
                value: 42
            })
        );
    }
}
