//! Thinkers: every entity that updates once per tic.
//!
//! The closed set of kinds is a sum type, so dispatch is a single `match`
//! rather than a function pointer tagged by argument shape.

pub mod mobj;
pub mod registry;

use std::fmt;

use crate::specials::active::Stasis;
use crate::specials::ceiling::Ceiling;
use crate::specials::door::Door;
use crate::specials::floor::FloorMove;
use crate::specials::lights::{FireFlicker, Glow, LightFlash, Strobe};
use crate::specials::plat::Plat;

pub use mobj::Mobj;
pub use registry::ThinkerRegistry;

/// Stable handle to a registry slot.
///
/// The generation makes a handle to a reclaimed slot compare unequal to
/// whatever is stored there next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThinkerId {
    index: u32,
    generation: u32,
}

impl ThinkerId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the registry.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Reuse count of the slot when this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ThinkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Result of one update of a thinker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThinkOutcome {
    /// Keep running next tic.
    Continue,
    /// The state machine reached its terminal state and must be removed.
    Finished,
}

/// Discriminant of [`Thinker`], for logging and kind filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThinkerKind {
    /// Map object.
    Mobj,
    /// Moving ceiling.
    Ceiling,
    /// Moving floor.
    Floor,
    /// Platform lift.
    Plat,
    /// Vertical door.
    Door,
    /// Fire flicker light.
    Flicker,
    /// Random light flash.
    Flash,
    /// Strobe light.
    Strobe,
    /// Glowing light.
    Glow,
}

/// A live simulation entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Thinker {
    /// An actor: monster, player, item or decoration.
    Mobj(Mobj),
    /// A ceiling mover.
    Ceiling(Ceiling),
    /// A floor mover.
    Floor(FloorMove),
    /// A lift.
    Plat(Plat),
    /// A door.
    Door(Door),
    /// A flickering light.
    Flicker(FireFlicker),
    /// A flashing light.
    Flash(LightFlash),
    /// A strobing light.
    Strobe(Strobe),
    /// A glowing light.
    Glow(Glow),
}

impl Thinker {
    /// Which variant this is.
    #[must_use]
    pub const fn kind(&self) -> ThinkerKind {
        match self {
            Self::Mobj(_) => ThinkerKind::Mobj,
            Self::Ceiling(_) => ThinkerKind::Ceiling,
            Self::Floor(_) => ThinkerKind::Floor,
            Self::Plat(_) => ThinkerKind::Plat,
            Self::Door(_) => ThinkerKind::Door,
            Self::Flicker(_) => ThinkerKind::Flicker,
            Self::Flash(_) => ThinkerKind::Flash,
            Self::Strobe(_) => ThinkerKind::Strobe,
            Self::Glow(_) => ThinkerKind::Glow,
        }
    }

    /// Sector driven by this thinker; actors have none.
    #[must_use]
    pub const fn sector(&self) -> Option<usize> {
        match self {
            Self::Mobj(_) => None,
            Self::Ceiling(c) => Some(c.sector),
            Self::Floor(f) => Some(f.sector),
            Self::Plat(p) => Some(p.sector),
            Self::Door(d) => Some(d.sector),
            Self::Flicker(l) => Some(l.sector),
            Self::Flash(l) => Some(l.sector),
            Self::Strobe(l) => Some(l.sector),
            Self::Glow(l) => Some(l.sector),
        }
    }

    /// Whether the thinker is suspended and skipped by the tick loop.
    #[must_use]
    pub fn in_stasis(&self) -> bool {
        match self {
            Self::Ceiling(c) => c.in_stasis(),
            Self::Plat(p) => p.in_stasis(),
            _ => false,
        }
    }

    /// The actor, if this is one.
    #[must_use]
    pub const fn as_mobj(&self) -> Option<&Mobj> {
        match self {
            Self::Mobj(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable access to the actor, if this is one.
    pub const fn as_mobj_mut(&mut self) -> Option<&mut Mobj> {
        match self {
            Self::Mobj(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this is an actor.
    #[must_use]
    pub const fn is_mobj(&self) -> bool {
        matches!(self, Self::Mobj(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specials::lights::Glow;
    use rstest::rstest;

    #[rstest]
    fn kind_and_sector_follow_variant() {
        let glow = Thinker::Glow(Glow {
            sector: 4,
            min_light: 10,
            max_light: 200,
            direction: -1,
        });
        assert_eq!(glow.kind(), ThinkerKind::Glow);
        assert_eq!(glow.sector(), Some(4));
        assert!(!glow.is_mobj());
        assert!(!glow.in_stasis());

        let actor = Thinker::Mobj(Mobj::default());
        assert_eq!(actor.sector(), None);
        assert!(actor.as_mobj().is_some());
    }

    #[rstest]
    fn ids_display_index_and_generation() {
        assert_eq!(ThinkerId::new(3, 1).to_string(), "#3v1");
    }
}
