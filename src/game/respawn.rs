//! Ring of picked-up items waiting to reappear.

use log::debug;

use super::World;
use crate::constants::{ITEMQUESIZE, ITEM_RESPAWN_DELAY};
use crate::numeric::{Angle, Fixed};
use crate::sound::{Sfx, SoundOrigin};
use crate::thinker::mobj::{MapThing, MF_DROPPED, MF_SPECIAL};
use crate::thinker::{Mobj, Thinker, ThinkerId};

const ANG45: u32 = 0x2000_0000;

/// An item removed from the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueuedItem {
    /// Placement to respawn from.
    pub spawn_point: MapThing,
    /// Sector the item was placed in.
    pub sector: usize,
    /// Tic the item was taken.
    pub queued_at: i32,
}

/// Fixed-size ring; pushing onto a full ring drops the oldest entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RespawnQueue {
    items: Vec<QueuedItem>,
    head: usize,
    tail: usize,
}

impl Default for RespawnQueue {
    fn default() -> Self {
        Self {
            items: vec![QueuedItem::default(); ITEMQUESIZE],
            head: 0,
            tail: 0,
        }
    }
}

impl RespawnQueue {
    /// Number of queued items.
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.head + ITEMQUESIZE - self.tail) % ITEMQUESIZE
    }

    /// Whether nothing is queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Queues `item`, overwriting the oldest entry when full.
    pub fn push(&mut self, item: QueuedItem) {
        if let Some(slot) = self.items.get_mut(self.head) {
            *slot = item;
        }
        self.head = (self.head + 1) % ITEMQUESIZE;
        if self.head == self.tail {
            self.tail = (self.tail + 1) % ITEMQUESIZE;
        }
    }

    /// Takes the oldest entry once it has waited long enough.
    pub fn pop_due(&mut self, level_time: i32) -> Option<QueuedItem> {
        if self.is_empty() {
            return None;
        }
        let item = *self.items.get(self.tail)?;
        if level_time - item.queued_at < ITEM_RESPAWN_DELAY {
            return None;
        }
        self.tail = (self.tail + 1) % ITEMQUESIZE;
        Some(item)
    }

    /// Drops every queued item.
    pub const fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

impl World {
    /// Removes an actor, queueing placed pickups for respawn.
    pub fn remove_mobj(&mut self, id: ThinkerId) {
        let Some(mobj) = self.thinkers.mobj(id) else {
            return;
        };
        if mobj.has_flag(MF_SPECIAL) && !mobj.has_flag(MF_DROPPED) {
            self.respawn.push(QueuedItem {
                spawn_point: mobj.spawn_point,
                sector: mobj.sector,
                queued_at: self.ctx.level_time,
            });
        }
        self.thinkers.remove(id);
    }

    /// Brings back at most one due item per tic when item respawn is on.
    pub fn respawn_specials(&mut self) {
        if !self.config.item_respawn {
            return;
        }
        let Some(item) = self.respawn.pop_due(self.ctx.level_time) else {
            return;
        };
        let Some(sector) = self.level.sectors.get(item.sector) else {
            return;
        };
        let thing = item.spawn_point;
        let x = Fixed::from_int(i32::from(thing.x));
        let y = Fixed::from_int(i32::from(thing.y));
        let turns = u32::try_from(i32::from(thing.angle) / 45).unwrap_or(0);
        let mobj = Mobj {
            angle: Angle(ANG45.wrapping_mul(turns)),
            flags: MF_SPECIAL,
            spawn_point: thing,
            ..Mobj::spawn(i32::from(thing.kind), x, y, item.sector, sector)
        }
        .with_first_look(&mut self.ctx.rng);
        let id = self.thinkers.add(Thinker::Mobj(mobj));
        self.ctx.sounds.start(SoundOrigin::Point { x, y }, Sfx::Itmbk);
        debug!("item {} respawned as {id}", thing.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn item(at: i32) -> QueuedItem {
        QueuedItem {
            queued_at: at,
            ..QueuedItem::default()
        }
    }

    #[rstest]
    fn items_wait_thirty_seconds() {
        let mut queue = RespawnQueue::default();
        queue.push(item(10));
        assert_eq!(queue.pop_due(10 + ITEM_RESPAWN_DELAY - 1), None);
        assert_eq!(queue.pop_due(10 + ITEM_RESPAWN_DELAY), Some(item(10)));
        assert!(queue.is_empty());
    }

    #[rstest]
    fn overflow_drops_the_oldest() {
        let mut queue = RespawnQueue::default();
        for at in 0..i32::try_from(ITEMQUESIZE).unwrap_or(i32::MAX) {
            queue.push(item(at));
        }
        assert_eq!(queue.len(), ITEMQUESIZE - 1);
        assert_eq!(queue.pop_due(i32::MAX / 2), Some(item(1)));
    }
}
