//! Simulation constants shared across the thinkers, specials and save codec.
//!
//! These values match the data the shipped levels and demos were authored
//! against, so changing any of them breaks tick-for-tick compatibility.

use crate::numeric::Fixed;

/// Simulation tics per second.
pub const TICRATE: i32 = 35;
/// Number of player slots.
pub const MAXPLAYERS: usize = 4;

/// Seconds a platform waits at either end of its travel.
pub const PLATWAIT: i32 = 3;
/// Base platform speed.
pub const PLATSPEED: Fixed = Fixed::UNIT;
/// Default capacity of the active-platform tracker.
pub const MAXPLATS: usize = 30 * 256;

/// Base ceiling speed.
pub const CEILSPEED: Fixed = Fixed::UNIT;
/// Default capacity of the active-ceiling tracker.
pub const MAXCEILINGS: usize = 30;

/// Base floor speed.
pub const FLOORSPEED: Fixed = Fixed::UNIT;

/// Base door speed.
pub const VDOORSPEED: Fixed = Fixed::from_int(2);
/// Tics a door waits at the top before closing.
pub const VDOORWAIT: i32 = 150;

/// Light units a glowing sector changes per tic.
pub const GLOWSPEED: i32 = 8;
/// Tics a strobe stays bright.
pub const STROBEBRIGHT: i32 = 5;
/// Dark period of a fast strobe.
pub const FASTDARK: i32 = 15;
/// Dark period of a slow strobe.
pub const SLOWDARK: i32 = 35;

/// Switch buttons that may be pressed at once.
pub const MAXBUTTONS: usize = 16;
/// Tics before a pressed switch pops back out.
pub const BUTTONTIME: i32 = 35;

/// Entries in the item respawn ring.
pub const ITEMQUESIZE: usize = 128;
/// Minimum age of a queued item before it respawns.
pub const ITEM_RESPAWN_DELAY: i32 = 30 * TICRATE;

/// Damage dealt by a crusher every fourth tic.
pub const CRUSH_DAMAGE: i32 = 10;

/// Width of the save description field.
pub const SAVESTRINGSIZE: usize = 24;
/// Width of the save version field.
pub const VERSIONSIZE: usize = 16;
/// Trailing byte of a complete save stream.
pub const SAVEGAME_EOF: u8 = 0x1d;
/// Version code written into the save header by default.
pub const DEFAULT_VERSION_CODE: i32 = 109;

/// Power-up slots per player.
pub const NUMPOWERS: usize = 6;
/// Key card slots per player.
pub const NUMCARDS: usize = 6;
/// Weapon slots per player.
pub const NUMWEAPONS: usize = 9;
/// Ammunition kinds.
pub const NUMAMMO: usize = 4;
/// Weapon sprite layers per player.
pub const NUMPSPRITES: usize = 2;

/// Lowest height the surrounding-floor search starts from.
pub const HIGHEST_FLOOR_START: Fixed = Fixed::from_int(-500);
