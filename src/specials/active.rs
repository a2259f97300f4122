//! Fixed-capacity trackers for ceilings and platforms that can be paused.
//!
//! Line actions stop or resume every mechanism carrying a tag. The
//! trackers make that an O(active) walk instead of a scan of the whole
//! registry, and they double as an audit: a mechanism that finishes without
//! being tracked is an invariant violation.

use log::debug;
use thiserror::Error;

use crate::thinker::{Thinker, ThinkerId, ThinkerRegistry};

/// Failures of the active-list invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActiveListError {
    /// Every slot is taken.
    #[error("{list}: no free slot (capacity {capacity})")]
    Full {
        /// Tracker name.
        list: &'static str,
        /// Number of slots.
        capacity: usize,
    },
    /// A mechanism expected to be tracked was not found.
    #[error("{list}: thinker {id} is not tracked")]
    Missing {
        /// Tracker name.
        list: &'static str,
        /// The untracked mechanism.
        id: ThinkerId,
    },
}

/// A mechanism that can be suspended by tag.
pub trait Stasis {
    /// Tag of the sector group the mechanism was started on.
    fn tag(&self) -> i32;
    /// Whether the mechanism is currently suspended.
    fn in_stasis(&self) -> bool;
    /// Suspends, remembering the current motion.
    fn enter_stasis(&mut self);
    /// Resumes the motion remembered by [`Stasis::enter_stasis`].
    fn leave_stasis(&mut self);
}

impl Thinker {
    /// The pausable view of this thinker, if it has one.
    pub fn as_stasis_mut(&mut self) -> Option<&mut dyn Stasis> {
        match self {
            Self::Ceiling(c) => Some(c),
            Self::Plat(p) => Some(p),
            _ => None,
        }
    }
}

/// Slot array mapping running mechanisms to their registry ids.
#[derive(Clone, Debug)]
pub struct ActiveList {
    name: &'static str,
    slots: Vec<Option<ThinkerId>>,
}

impl ActiveList {
    /// An empty tracker with `capacity` slots.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            slots: vec![None; capacity],
        }
    }

    /// Number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of tracked mechanisms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` is tracked.
    #[must_use]
    pub fn contains(&self, id: ThinkerId) -> bool {
        self.slots.contains(&Some(id))
    }

    /// Tracked ids in slot order.
    pub fn iter(&self) -> impl Iterator<Item = ThinkerId> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Stores `id` in the first free slot.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Full`] when no slot is free.
    ///
    /// # Examples
    /// ```
    /// use gloom::specials::active::{ActiveList, ActiveListError};
    /// use gloom::thinker::{Mobj, Thinker, ThinkerRegistry};
    /// let mut registry = ThinkerRegistry::new();
    /// let a = registry.add(Thinker::Mobj(Mobj::default()));
    /// let b = registry.add(Thinker::Mobj(Mobj::default()));
    /// let mut list = ActiveList::new("ceilings", 1);
    /// list.add(a).unwrap();
    /// assert!(matches!(list.add(b), Err(ActiveListError::Full { capacity: 1, .. })));
    /// ```
    pub fn add(&mut self, id: ThinkerId) -> Result<(), ActiveListError> {
        let full = self.full();
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(full)?;
        *slot = Some(id);
        Ok(())
    }

    /// Checks that [`ActiveList::add`] would succeed. Callers run this before
    /// spawning a tracked mechanism so a full tracker leaves the world as it
    /// was.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Full`] when no slot is free.
    pub fn ensure_room(&self) -> Result<(), ActiveListError> {
        if self.slots.contains(&None) {
            Ok(())
        } else {
            Err(self.full())
        }
    }

    fn full(&self) -> ActiveListError {
        ActiveListError::Full {
            list: self.name,
            capacity: self.slots.len(),
        }
    }

    /// Clears the slot holding `id`.
    ///
    /// # Errors
    /// Returns [`ActiveListError::Missing`] when `id` is not tracked.
    pub fn remove(&mut self, id: ThinkerId) -> Result<(), ActiveListError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| **slot == Some(id))
            .ok_or(ActiveListError::Missing {
                list: self.name,
                id,
            })?;
        *slot = None;
        Ok(())
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Suspends every running mechanism tagged `tag`. Returns whether any
    /// was stopped.
    pub fn stop_by_tag(&self, registry: &mut ThinkerRegistry, tag: i32) -> bool {
        let mut stopped = false;
        for id in self.iter() {
            let Some(mech) = registry.get_mut(id).and_then(Thinker::as_stasis_mut) else {
                continue;
            };
            if mech.tag() == tag && !mech.in_stasis() {
                mech.enter_stasis();
                stopped = true;
                debug!("{}: {id} entered stasis (tag {tag})", self.name);
            }
        }
        stopped
    }

    /// Resumes every suspended mechanism tagged `tag`.
    pub fn activate_in_stasis(&self, registry: &mut ThinkerRegistry, tag: i32) {
        for id in self.iter() {
            let Some(mech) = registry.get_mut(id).and_then(Thinker::as_stasis_mut) else {
                continue;
            };
            if mech.tag() == tag && mech.in_stasis() {
                mech.leave_stasis();
                debug!("{}: {id} resumed (tag {tag})", self.name);
            }
        }
    }
}
