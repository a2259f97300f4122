//! The shared plane mover.
//!
//! Every height-changing mechanism funnels through [`move_plane`], which
//! steps one plane of one sector toward a destination and asks the sector's
//! occupants whether they still fit.

use crate::context::SimContext;
use crate::level::{Level, Sector};
use crate::numeric::Fixed;

/// Outcome of one [`move_plane`] step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveResult {
    /// Moved a full step, or was blocked without crushing.
    Ok,
    /// Blocked by something that is being crushed.
    Crushed,
    /// Arrived at the destination this step.
    PastDest,
}

/// Which plane of a sector is moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    /// The floor.
    Floor,
    /// The ceiling.
    Ceiling,
}

/// Whatever stands in a sector and can obstruct a moving plane.
#[cfg_attr(test, mockall::automock)]
pub trait SectorOccupants {
    /// Re-clips everything standing in `sector` (at index `sector_index`)
    /// after one of its planes moved. Returns `true` when something no
    /// longer fits. When `crush` is set, shootable things that do not fit
    /// take damage on every fourth tic.
    fn change_sector(
        &mut self,
        sector: &Sector,
        sector_index: usize,
        crush: bool,
        ctx: &mut SimContext,
    ) -> bool;
}

/// Borrowed world pieces a sector mechanism needs for one update.
pub struct SpecialEnv<'a> {
    /// Geometry being moved.
    pub level: &'a mut Level,
    /// Things that may block or be crushed.
    pub occupants: &'a mut dyn SectorOccupants,
    /// Clock, random stream and sound queue.
    pub ctx: &'a mut SimContext,
}

impl SpecialEnv<'_> {
    /// Steps a plane; see [`move_plane`].
    pub fn move_plane(&mut self, step: PlaneStep) -> MoveResult {
        move_plane(self.level, self.occupants, self.ctx, step)
    }

    /// Steps a plane and also reports whether an occupant refused a
    /// non-crushing step, leaving the plane where it was.
    pub fn move_plane_blocked(&mut self, step: PlaneStep) -> (MoveResult, bool) {
        let before = self.plane_height(step.sector, step.plane);
        let res = self.move_plane(step);
        let stalled = res == MoveResult::Ok
            && step.speed != Fixed::ZERO
            && self.plane_height(step.sector, step.plane) == before;
        (res, stalled)
    }

    fn plane_height(&self, sector: usize, plane: Plane) -> Option<Fixed> {
        self.level.sectors.get(sector).map(|s| match plane {
            Plane::Floor => s.floor_height,
            Plane::Ceiling => s.ceiling_height,
        })
    }
}

/// Parameters of one plane step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneStep {
    /// Sector index.
    pub sector: usize,
    /// Floor or ceiling.
    pub plane: Plane,
    /// Distance per tic.
    pub speed: Fixed,
    /// Height to stop at.
    pub dest: Fixed,
    /// Whether blocking occupants get damaged instead of stopping the plane.
    pub crush: bool,
    /// `1` raises the plane, `-1` lowers it.
    pub direction: i32,
}

const fn plane_height(sector: &mut Sector, plane: Plane) -> &mut Fixed {
    match plane {
        Plane::Floor => &mut sector.floor_height,
        Plane::Ceiling => &mut sector.ceiling_height,
    }
}

/// Moves one plane toward `step.dest` by at most `step.speed`.
///
/// When the destination is within one step the plane lands on it exactly
/// and the result is [`MoveResult::PastDest`]; if landing obstructs an
/// occupant the previous height is restored. An obstruction part-way
/// reports [`MoveResult::Crushed`] when `step.crush` is set, and otherwise
/// restores the previous height and reports [`MoveResult::Ok`]. A crushing
/// floor keeps its new height only while rising; a lowering floor never
/// drops away from what it crushes.
///
/// A direction other than `1` or `-1` leaves the plane alone.
pub fn move_plane(
    level: &mut Level,
    occupants: &mut dyn SectorOccupants,
    ctx: &mut SimContext,
    step: PlaneStep,
) -> MoveResult {
    let Some(sector) = level.sectors.get_mut(step.sector) else {
        return MoveResult::Ok;
    };
    let last = *plane_height(sector, step.plane);
    let (arrives, next) = match step.direction {
        1 => (last + step.speed > step.dest, last + step.speed),
        -1 => (last - step.speed < step.dest, last - step.speed),
        _ => return MoveResult::Ok,
    };

    let target = if arrives { step.dest } else { next };
    *plane_height(sector, step.plane) = target;
    let blocked = occupants.change_sector(sector, step.sector, step.crush, ctx);
    let lowering_floor = step.plane == Plane::Floor && step.direction == -1;
    if blocked && (arrives || !step.crush || lowering_floor) {
        *plane_height(sector, step.plane) = last;
        occupants.change_sector(sector, step.sector, step.crush, ctx);
    }

    if arrives {
        MoveResult::PastDest
    } else if blocked && step.crush {
        MoveResult::Crushed
    } else {
        MoveResult::Ok
    }
}
