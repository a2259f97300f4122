//! Map objects ("actors") and crush processing.
//!
//! Only the state the core needs is modelled: the archived field set, a
//! simple momentum think, and the re-clip pass run when a plane moves
//! through a sector.

use log::debug;

use super::{ThinkOutcome, Thinker, ThinkerId, ThinkerRegistry};
use crate::constants::{CRUSH_DAMAGE, MAXPLAYERS};
use crate::context::SimContext;
use crate::level::Sector;
use crate::numeric::{Angle, Fixed};
use crate::random::RandomStream;
use crate::specials::plane::SectorOccupants;

/// Picked up by touching.
pub const MF_SPECIAL: i32 = 1;
/// Blocks other things.
pub const MF_SOLID: i32 = 2;
/// Can take damage.
pub const MF_SHOOTABLE: i32 = 4;
/// May step off ledges.
pub const MF_DROPOFF: i32 = 0x400;
/// Flying monster.
pub const MF_FLOAT: i32 = 0x4000;
/// Charging lost soul.
pub const MF_SKULLFLY: i32 = 0x0100_0000;
/// Dropped by a dead monster; never respawns.
pub const MF_DROPPED: i32 = 0x0002_0000;
/// Dead body.
pub const MF_CORPSE: i32 = 0x0010_0000;

/// State index of the crushed-remains frame.
pub const S_GIBS: i32 = 895;
/// Type number of the blood a crusher sprays.
pub const MT_BLOOD: i32 = 38;
/// First frame of the blood splat.
pub const S_BLOOD1: i32 = 89;
/// Tics from a splat's first frame until it disappears.
pub const BLOOD_TICS: i32 = 24;

/// Placement record from the map's thing list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapThing {
    /// Map x in whole units.
    pub x: i16,
    /// Map y in whole units.
    pub y: i16,
    /// Facing in degrees.
    pub angle: i16,
    /// Editor type number.
    pub kind: i16,
    /// Skill and multiplayer flags.
    pub options: i16,
}

/// A map object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mobj {
    /// Map x.
    pub x: Fixed,
    /// Map y.
    pub y: Fixed,
    /// Height of the object's feet.
    pub z: Fixed,
    /// Facing.
    pub angle: Angle,
    /// Sprite lump.
    pub sprite: i32,
    /// Sprite frame, possibly full-bright.
    pub frame: i32,
    /// Sector containing the object's origin.
    pub sector: usize,
    /// Floor height under the object.
    pub floor_z: Fixed,
    /// Ceiling height over the object.
    pub ceiling_z: Fixed,
    /// Collision radius.
    pub radius: Fixed,
    /// Collision height.
    pub height: Fixed,
    /// Momentum along x per tic.
    pub mom_x: Fixed,
    /// Momentum along y per tic.
    pub mom_y: Fixed,
    /// Vertical momentum per tic.
    pub mom_z: Fixed,
    /// Visit stamp for map searches.
    pub valid_count: i32,
    /// Type number.
    pub kind: i32,
    /// Tics left in the current frame; -1 holds it forever.
    pub tics: i32,
    /// Current frame.
    pub state: i32,
    /// `MF_*` bits.
    pub flags: i32,
    /// Hit points.
    pub health: i32,
    /// Chase direction, 0 to 7.
    pub move_dir: i32,
    /// Steps left before a new direction.
    pub move_count: i32,
    /// Thing being chased or attacked.
    pub target: Option<ThinkerId>,
    /// Tics before the first attack.
    pub reaction_time: i32,
    /// Tics to keep chasing the current target.
    pub threshold: i32,
    /// Player slot controlling this object.
    pub player: Option<usize>,
    /// Player slot to look at next.
    pub last_look: i32,
    /// Where the map placed this object.
    pub spawn_point: MapThing,
    /// Thing a homing missile follows.
    pub tracer: Option<ThinkerId>,
}

impl Mobj {
    /// Places an object of `kind` on the floor of `sector`.
    #[must_use]
    pub fn spawn(kind: i32, x: Fixed, y: Fixed, sector_index: usize, sector: &Sector) -> Self {
        Self {
            x,
            y,
            z: sector.floor_height,
            sector: sector_index,
            floor_z: sector.floor_height,
            ceiling_z: sector.ceiling_height,
            kind,
            tics: -1,
            ..Self::default()
        }
    }

    /// Picks the player slot the object looks at first. Every spawn draws
    /// this from the gameplay stream.
    #[must_use]
    pub fn with_first_look(mut self, rng: &mut RandomStream) -> Self {
        let slots = i32::try_from(MAXPLAYERS).unwrap_or(1);
        self.last_look = rng.p_random() % slots;
        self
    }

    /// Whether any bit of `flag` is set.
    #[must_use]
    pub const fn has_flag(&self, flag: i32) -> bool {
        self.flags & flag != 0
    }

    /// One tic of motion: apply momentum, keep between floor and ceiling,
    /// count down the current frame. A blood splat finishes when its last
    /// frame runs out.
    pub fn think(&mut self) -> ThinkOutcome {
        self.x += self.mom_x;
        self.y += self.mom_y;
        self.z += self.mom_z;
        if self.z <= self.floor_z {
            self.z = self.floor_z;
            self.mom_z = self.mom_z.max(Fixed::ZERO);
        }
        if self.z + self.height > self.ceiling_z {
            self.z = self.ceiling_z - self.height;
            self.mom_z = self.mom_z.min(Fixed::ZERO);
        }
        if self.tics > 0 {
            self.tics -= 1;
            if self.tics == 0 && self.kind == MT_BLOOD {
                return ThinkOutcome::Finished;
            }
        }
        ThinkOutcome::Continue
    }

    /// Re-reads floor and ceiling from `sector` and reports whether the
    /// object still fits between them.
    pub fn height_clip(&mut self, sector: &Sector) -> bool {
        let on_floor = self.z == self.floor_z;
        self.floor_z = sector.floor_height;
        self.ceiling_z = sector.ceiling_height;
        if on_floor {
            self.z = self.floor_z;
        } else if self.z + self.height > self.ceiling_z {
            self.z = self.ceiling_z - self.height;
        }
        self.ceiling_z - self.floor_z >= self.height
    }

    /// Applies `amount` damage, turning the object into a corpse at zero
    /// health.
    ///
    /// Every hit draws once from the gameplay stream: a survivor rolls for
    /// pain, a dying object jitters the length of its current frame.
    pub fn damage(&mut self, amount: i32, rng: &mut RandomStream) {
        if !self.has_flag(MF_SHOOTABLE) {
            return;
        }
        self.health -= amount;
        let roll = rng.p_random();
        if self.health <= 0 {
            self.flags &= !(MF_SHOOTABLE | MF_FLOAT | MF_SKULLFLY);
            self.flags |= MF_CORPSE | MF_DROPOFF;
            self.height = self.height / 4;
            if self.tics > 0 {
                self.tics = (self.tics - (roll & 3)).max(1);
            }
        }
    }

    /// Blood sprayed from the middle of this object in a random direction.
    fn spray_blood(&self, sector: &Sector, rng: &mut RandomStream) -> Self {
        let mut blood = Self {
            z: self.z + self.height / 2,
            state: S_BLOOD1,
            tics: BLOOD_TICS,
            ..Self::spawn(MT_BLOOD, self.x, self.y, self.sector, sector)
        }
        .with_first_look(rng);
        blood.mom_x = Fixed((rng.p_random() - rng.p_random()) << 12);
        blood.mom_y = Fixed((rng.p_random() - rng.p_random()) << 12);
        blood
    }

    fn become_gibs(&mut self) {
        self.state = S_GIBS;
        self.flags &= !MF_SOLID;
        self.height = Fixed::ZERO;
        self.radius = Fixed::ZERO;
    }
}

/// What crush processing decided for one object.
enum Crush {
    Fits,
    Gibbed,
    Drop,
    Ignored,
    Blocks,
    Bleeds(Mobj),
}

fn crush_one(mobj: &mut Mobj, sector: &Sector, crush: bool, ctx: &mut SimContext) -> Crush {
    if mobj.height_clip(sector) {
        return Crush::Fits;
    }
    if mobj.health <= 0 {
        mobj.become_gibs();
        return Crush::Gibbed;
    }
    if mobj.has_flag(MF_DROPPED) {
        return Crush::Drop;
    }
    if !mobj.has_flag(MF_SHOOTABLE) {
        return Crush::Ignored;
    }
    if crush && ctx.level_time & 3 == 0 {
        mobj.damage(CRUSH_DAMAGE, &mut ctx.rng);
        return Crush::Bleeds(mobj.spray_blood(sector, &mut ctx.rng));
    }
    Crush::Blocks
}

impl SectorOccupants for ThinkerRegistry {
    fn change_sector(
        &mut self,
        sector: &Sector,
        sector_index: usize,
        crush: bool,
        ctx: &mut SimContext,
    ) -> bool {
        let occupants: Vec<ThinkerId> = self
            .mobjs()
            .filter(|(_, mobj)| mobj.sector == sector_index)
            .map(|(id, _)| id)
            .collect();
        let mut no_fit = false;
        let mut dropped = Vec::new();
        let mut splats = Vec::new();
        for id in occupants {
            let Some(mobj) = self.mobj_mut(id) else {
                continue;
            };
            match crush_one(mobj, sector, crush, ctx) {
                Crush::Blocks => no_fit = true,
                Crush::Bleeds(blood) => {
                    no_fit = true;
                    splats.push(blood);
                }
                Crush::Drop => dropped.push(id),
                Crush::Gibbed => debug!("thinker {id} crushed to gibs"),
                Crush::Fits | Crush::Ignored => {}
            }
        }
        for id in dropped {
            self.remove(id);
        }
        for blood in splats {
            self.add(Thinker::Mobj(blood));
        }
        no_fit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinker::Thinker;
    use rstest::{fixture, rstest};

    #[fixture]
    fn room() -> Sector {
        Sector::new(0, 128, 160)
    }

    fn monster(room: &Sector, health: i32) -> Mobj {
        Mobj {
            height: Fixed::from_int(56),
            health,
            flags: MF_SOLID | MF_SHOOTABLE,
            ..Mobj::spawn(9, Fixed::ZERO, Fixed::ZERO, 0, room)
        }
    }

    #[rstest]
    fn think_applies_momentum_and_stops_on_floor(room: Sector) {
        let mut mobj = Mobj {
            mom_x: Fixed::UNIT,
            mom_z: Fixed::from_int(-4),
            tics: 2,
            ..Mobj::spawn(1, Fixed::ZERO, Fixed::ZERO, 0, &room)
        };
        mobj.think();
        assert_eq!(mobj.x, Fixed::UNIT);
        assert_eq!(mobj.z, Fixed::ZERO);
        assert_eq!(mobj.mom_z, Fixed::ZERO);
        assert_eq!(mobj.tics, 1);
    }

    #[rstest]
    fn fitting_actor_follows_rising_floor(room: Sector) {
        let mut registry = ThinkerRegistry::new();
        let id = registry.add(Thinker::Mobj(monster(&room, 100)));
        let mut raised = room;
        raised.floor_height = Fixed::from_int(16);
        let mut ctx = SimContext::default();
        assert!(!registry.change_sector(&raised, 0, true, &mut ctx));
        assert_eq!(registry.mobj(id).map(|m| m.z), Some(Fixed::from_int(16)));
    }

    #[rstest]
    #[case::damage_tic(4, 90)]
    #[case::quiet_tic(5, 100)]
    fn crushing_damages_every_fourth_tic(room: Sector, #[case] level_time: i32, #[case] health: i32) {
        let mut registry = ThinkerRegistry::new();
        let id = registry.add(Thinker::Mobj(monster(&room, 100)));
        let mut squeezed = room;
        squeezed.ceiling_height = Fixed::from_int(40);
        let mut ctx = SimContext {
            level_time,
            ..SimContext::default()
        };
        assert!(registry.change_sector(&squeezed, 0, true, &mut ctx));
        assert_eq!(registry.mobj(id).map(|m| m.health), Some(health));
    }

    #[rstest]
    fn crush_hit_sprays_blood_from_the_gameplay_stream(room: Sector) {
        let mut registry = ThinkerRegistry::new();
        let victim = registry.add(Thinker::Mobj(monster(&room, 100)));
        let mut squeezed = room;
        squeezed.ceiling_height = Fixed::from_int(40);
        let mut ctx = SimContext::default();
        assert!(registry.change_sector(&squeezed, 0, true, &mut ctx));

        // Pain roll, first look, then two momentum pairs.
        assert_eq!(ctx.rng.gameplay_index(), 6);
        let splats: Vec<&Mobj> = registry
            .mobjs()
            .filter(|(id, _)| *id != victim)
            .map(|(_, mobj)| mobj)
            .collect();
        assert_eq!(splats.len(), 1);
        let blood = splats[0];
        assert_eq!(blood.kind, MT_BLOOD);
        assert_eq!(blood.z, Fixed::from_int(28));
        assert_eq!(blood.tics, BLOOD_TICS);
        assert_eq!(blood.mom_x.raw() % (1 << 12), 0);
    }

    #[rstest]
    fn quiet_tic_draws_nothing(room: Sector) {
        let mut registry = ThinkerRegistry::new();
        registry.add(Thinker::Mobj(monster(&room, 100)));
        let mut squeezed = room;
        squeezed.ceiling_height = Fixed::from_int(40);
        let mut ctx = SimContext {
            level_time: 1,
            ..SimContext::default()
        };
        assert!(registry.change_sector(&squeezed, 0, true, &mut ctx));
        assert_eq!(ctx.rng.gameplay_index(), 0);
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn blood_vanishes_after_its_frames(room: Sector) {
        let mut blood = Mobj {
            tics: BLOOD_TICS,
            ..Mobj::spawn(MT_BLOOD, Fixed::ZERO, Fixed::ZERO, 0, &room)
        };
        for _ in 1..BLOOD_TICS {
            assert_eq!(blood.think(), ThinkOutcome::Continue);
        }
        assert_eq!(blood.think(), ThinkOutcome::Finished);
    }

    #[rstest]
    fn killing_blow_still_draws_once(room: Sector) {
        let mut mobj = Mobj {
            tics: 6,
            ..monster(&room, 5)
        };
        let mut rng = RandomStream::new(0);
        mobj.damage(CRUSH_DAMAGE, &mut rng);
        assert_eq!(rng.gameplay_index(), 1);
        assert!(mobj.has_flag(MF_CORPSE));
        assert!((3..=6).contains(&mobj.tics));
    }

    #[rstest]
    fn corpses_become_gibs_and_dropped_items_vanish(room: Sector) {
        let mut registry = ThinkerRegistry::new();
        let corpse = registry.add(Thinker::Mobj(monster(&room, 0)));
        let item = registry.add(Thinker::Mobj(Mobj {
            height: Fixed::from_int(16),
            health: 1000,
            flags: MF_SPECIAL | MF_DROPPED,
            ..Mobj::spawn(2011, Fixed::ZERO, Fixed::ZERO, 0, &room)
        }));
        let mut flat = room;
        flat.ceiling_height = Fixed::from_int(8);
        let mut ctx = SimContext::default();
        assert!(!registry.change_sector(&flat, 0, false, &mut ctx));
        let gibs = registry.mobj(corpse).expect("corpse stays");
        assert_eq!(gibs.state, S_GIBS);
        assert_eq!(gibs.height, Fixed::ZERO);
        assert!(!registry.is_live(item));
    }

    #[rstest]
    fn other_sectors_are_untouched(room: Sector) {
        let mut registry = ThinkerRegistry::new();
        let elsewhere = Mobj {
            sector: 3,
            ..monster(&room, 100)
        };
        registry.add(Thinker::Mobj(elsewhere));
        let mut squeezed = room;
        squeezed.ceiling_height = Fixed::from_int(10);
        let mut ctx = SimContext::default();
        assert!(!registry.change_sector(&squeezed, 0, true, &mut ctx));
    }
}
