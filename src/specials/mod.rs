//! Sector specials: the mechanisms that move planes and change lights, the
//! trackers that pause them by tag, and the per-tic specials update.
//!
//! Each mechanism is a plain record with a `think` method taking a
//! [`plane::SpecialEnv`]. Line actions that start mechanisms are methods on
//! [`crate::game::World`] living next to the mechanism they start.

pub mod active;
pub mod ceiling;
pub mod door;
pub mod floor;
pub mod lights;
pub mod plane;
pub mod plat;
pub mod update;

pub use active::{ActiveList, ActiveListError, Stasis};
pub use plane::{move_plane, MoveResult, Plane, PlaneStep, SectorOccupants, SpecialEnv};
