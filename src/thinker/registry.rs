//! Arena that owns every thinker and fixes the per-tic update order.
//!
//! Slots are stable: a [`ThinkerId`] stays valid until the slot is swept,
//! and removal only flips a flag. Physical reclamation happens in
//! [`ThinkerRegistry::sweep`], which [`ThinkerRegistry::run_all`] calls once
//! its pass is complete, so a visitor can never observe a slot vanishing
//! underneath it.

use hashbrown::HashMap;
use log::debug;

use super::{Mobj, ThinkOutcome, Thinker, ThinkerId, ThinkerKind};

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    removed: bool,
    thinker: Option<Thinker>,
}

/// Owner of all thinker memory, iterated in add order.
#[derive(Clone, Debug, Default)]
pub struct ThinkerRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<u32>,
}

impl ThinkerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `thinker` to the tail of the update order.
    ///
    /// # Examples
    /// ```
    /// use gloom::thinker::{Mobj, Thinker, ThinkerRegistry};
    /// let mut registry = ThinkerRegistry::new();
    /// let id = registry.add(Thinker::Mobj(Mobj::default()));
    /// assert!(registry.is_live(id));
    /// registry.remove(id);
    /// registry.remove(id);
    /// assert!(!registry.is_live(id));
    /// ```
    pub fn add(&mut self, thinker: Thinker) -> ThinkerId {
        let kind = thinker.kind();
        let index = self.free.pop().unwrap_or_else(|| {
            let next = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot::default());
            next
        });
        let generation = self.slots.get_mut(index as usize).map_or(0, |slot| {
            slot.removed = false;
            slot.thinker = Some(thinker);
            slot.generation
        });
        self.order.push(index);
        let id = ThinkerId::new(index, generation);
        debug!("spawned {kind:?} thinker {id}");
        id
    }

    /// Marks `id` for deletion. Removing twice, or removing a stale id, is a
    /// no-op.
    pub fn remove(&mut self, id: ThinkerId) {
        if let Some(slot) = self.slot_mut(id) {
            if !slot.removed {
                slot.removed = true;
                debug!("removed thinker {id}");
            }
        }
    }

    fn slot(&self, id: ThinkerId) -> Option<&Slot> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
    }

    fn slot_mut(&mut self, id: ThinkerId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
    }

    /// Whether `id` refers to a thinker that has not been removed.
    #[must_use]
    pub fn is_live(&self, id: ThinkerId) -> bool {
        self.slot(id).is_some_and(|slot| !slot.removed)
    }

    /// Borrows a live thinker.
    ///
    /// A thinker is not visible to lookups while its own update runs.
    #[must_use]
    pub fn get(&self, id: ThinkerId) -> Option<&Thinker> {
        self.slot(id)
            .filter(|slot| !slot.removed)
            .and_then(|slot| slot.thinker.as_ref())
    }

    /// Mutably borrows a live thinker.
    pub fn get_mut(&mut self, id: ThinkerId) -> Option<&mut Thinker> {
        self.slot_mut(id)
            .filter(|slot| !slot.removed)
            .and_then(|slot| slot.thinker.as_mut())
    }

    /// Borrows a live actor.
    #[must_use]
    pub fn mobj(&self, id: ThinkerId) -> Option<&Mobj> {
        self.get(id).and_then(Thinker::as_mobj)
    }

    /// Mutably borrows a live actor.
    pub fn mobj_mut(&mut self, id: ThinkerId) -> Option<&mut Mobj> {
        self.get_mut(id).and_then(Thinker::as_mobj_mut)
    }

    /// Live thinkers in update order.
    pub fn iter(&self) -> impl Iterator<Item = (ThinkerId, &Thinker)> + '_ {
        self.order.iter().filter_map(move |&index| {
            let slot = self.slots.get(index as usize)?;
            if slot.removed {
                return None;
            }
            slot.thinker
                .as_ref()
                .map(|thinker| (ThinkerId::new(index, slot.generation), thinker))
        })
    }

    /// Live actors in update order; this is the enumeration ordinals count.
    pub fn mobjs(&self) -> impl Iterator<Item = (ThinkerId, &Mobj)> + '_ {
        self.iter()
            .filter_map(|(id, thinker)| thinker.as_mobj().map(|mobj| (id, mobj)))
    }

    /// Live thinkers of one kind, in update order.
    pub fn of_kind(&self, kind: ThinkerKind) -> impl Iterator<Item = (ThinkerId, &Thinker)> + '_ {
        self.iter().filter(move |(_, thinker)| thinker.kind() == kind)
    }

    /// First live thinker satisfying `predicate`, in update order.
    pub fn visit<P>(&self, mut predicate: P) -> Option<ThinkerId>
    where
        P: FnMut(ThinkerId, &Thinker) -> bool,
    {
        self.iter()
            .find(|(id, thinker)| predicate(*id, thinker))
            .map(|(id, _)| id)
    }

    /// Number of live thinkers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no live thinker remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs one full pass.
    ///
    /// Each live thinker is lifted out of its slot and handed to `update`
    /// together with the registry, so the update may add or remove other
    /// thinkers. Thinkers added during the pass run in the same pass, after
    /// everything already present. Removed thinkers are skipped and
    /// reclaimed once the pass ends.
    pub fn run_all<F>(&mut self, mut update: F)
    where
        F: FnMut(ThinkerId, &mut Thinker, &mut Self) -> ThinkOutcome,
    {
        let mut cursor = 0;
        while let Some(&index) = self.order.get(cursor) {
            cursor += 1;
            let Some(slot) = self.slots.get_mut(index as usize) else {
                continue;
            };
            if slot.removed {
                continue;
            }
            let Some(mut thinker) = slot.thinker.take() else {
                continue;
            };
            let id = ThinkerId::new(index, slot.generation);
            let outcome = update(id, &mut thinker, self);
            if let Some(home) = self.slots.get_mut(index as usize) {
                home.thinker = Some(thinker);
            }
            if outcome == ThinkOutcome::Finished {
                self.remove(id);
            }
        }
        self.sweep();
    }

    /// Reclaims every slot marked removed.
    pub fn sweep(&mut self) {
        let slots = &mut self.slots;
        let free = &mut self.free;
        self.order.retain(|&index| {
            let Some(slot) = slots.get_mut(index as usize) else {
                return false;
            };
            if !slot.removed {
                return true;
            }
            slot.removed = false;
            slot.thinker = None;
            slot.generation = slot.generation.wrapping_add(1);
            free.push(index);
            false
        });
    }

    /// Drops every thinker. Ids handed out before the call stay invalid.
    pub fn clear(&mut self) {
        self.order.clear();
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.thinker.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.removed = false;
            self.free.push(u32::try_from(index).unwrap_or(u32::MAX));
        }
    }

    /// 1-based position of `id` among live actors, or 0 when `id` is `None`
    /// or not a live actor.
    #[must_use]
    pub fn ordinal_of(&self, id: Option<ThinkerId>) -> u32 {
        id.and_then(|target| self.mobjs().position(|(candidate, _)| candidate == target))
            .and_then(|pos| u32::try_from(pos + 1).ok())
            .unwrap_or(0)
    }

    /// Ordinal lookup table for every live actor, built in one pass.
    #[must_use]
    pub fn ordinal_table(&self) -> HashMap<ThinkerId, u32> {
        self.mobjs()
            .zip(1_u32..)
            .map(|((id, _), ordinal)| (id, ordinal))
            .collect()
    }

    /// Live actor at 1-based `ordinal`.
    #[must_use]
    pub fn mobj_at_ordinal(&self, ordinal: u32) -> Option<ThinkerId> {
        let position = usize::try_from(ordinal).ok()?.checked_sub(1)?;
        self.mobjs().nth(position).map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specials::lights::Glow;
    use rstest::{fixture, rstest};

    fn glow(sector: usize) -> Thinker {
        Thinker::Glow(Glow {
            sector,
            min_light: 0,
            max_light: 255,
            direction: 1,
        })
    }

    fn actor(health: i32) -> Thinker {
        Thinker::Mobj(Mobj {
            health,
            ..Mobj::default()
        })
    }

    #[fixture]
    fn registry() -> ThinkerRegistry {
        ThinkerRegistry::new()
    }

    #[rstest]
    fn iteration_follows_add_order(mut registry: ThinkerRegistry) {
        let a = registry.add(glow(0));
        let b = registry.add(actor(10));
        let c = registry.add(glow(1));
        let ids: Vec<_> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[rstest]
    fn removal_is_idempotent(mut registry: ThinkerRegistry) {
        let a = registry.add(glow(0));
        let b = registry.add(glow(1));
        registry.remove(a);
        registry.remove(a);
        assert_eq!(registry.len(), 1);
        registry.sweep();
        registry.remove(a);
        assert!(registry.is_live(b));
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    fn reused_slot_gets_a_new_generation(mut registry: ThinkerRegistry) {
        let a = registry.add(glow(0));
        registry.remove(a);
        registry.sweep();
        let b = registry.add(glow(2));
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_some());
    }

    #[rstest]
    fn run_all_skips_removed_and_runs_spawned(mut registry: ThinkerRegistry) {
        let first = registry.add(glow(0));
        let doomed = registry.add(glow(1));
        let mut seen = Vec::new();
        let mut spawned = None;
        registry.run_all(|id, _, reg| {
            seen.push(id);
            if id == first {
                reg.remove(doomed);
                spawned = Some(reg.add(glow(9)));
            }
            ThinkOutcome::Continue
        });
        assert_eq!(seen, vec![first, spawned.expect("spawned during pass")]);
        assert!(!registry.is_live(doomed));
    }

    #[rstest]
    fn finished_thinkers_are_reclaimed(mut registry: ThinkerRegistry) {
        let id = registry.add(glow(0));
        registry.run_all(|_, _, _| ThinkOutcome::Finished);
        assert!(registry.is_empty());
        assert!(registry.get(id).is_none());
    }

    #[rstest]
    fn visit_stops_at_first_match(mut registry: ThinkerRegistry) {
        registry.add(glow(0));
        let hit = registry.add(glow(5));
        registry.add(glow(5));
        let mut calls = 0;
        let found = registry.visit(|_, thinker| {
            calls += 1;
            thinker.sector() == Some(5)
        });
        assert_eq!(found, Some(hit));
        assert_eq!(calls, 2);
    }

    #[rstest]
    fn ordinals_count_only_live_actors(mut registry: ThinkerRegistry) {
        let a = registry.add(actor(1));
        registry.add(glow(0));
        let b = registry.add(actor(2));
        let c = registry.add(actor(3));
        assert_eq!(registry.ordinal_of(Some(a)), 1);
        assert_eq!(registry.ordinal_of(Some(b)), 2);
        assert_eq!(registry.ordinal_of(None), 0);
        registry.remove(b);
        assert_eq!(registry.ordinal_of(Some(c)), 2);
        assert_eq!(registry.mobj_at_ordinal(2), Some(c));
        assert_eq!(registry.mobj_at_ordinal(3), None);
        assert_eq!(registry.mobj_at_ordinal(0), None);
        let table = registry.ordinal_table();
        assert_eq!(table.get(&a), Some(&1));
        assert_eq!(table.get(&c), Some(&2));
    }
}
