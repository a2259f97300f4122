//! Level fixtures shared by the integration tests.

use gloom::config::SimConfig;
use gloom::game::World;
use gloom::level::{Level, Line, Sector, Side, ML_TWOSIDED};
use gloom::numeric::Fixed;

/// Builds small sector graphs one sector and line at a time.
#[derive(Debug, Default)]
pub struct LevelBuilder {
    sectors: Vec<Sector>,
    lines: Vec<Line>,
    sides: Vec<Side>,
    texture_heights: Vec<Fixed>,
}

impl LevelBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an untagged sector with heights in whole units.
    #[must_use]
    pub fn sector(self, floor: i32, ceiling: i32, light: i32) -> Self {
        self.tagged_sector(floor, ceiling, light, 0)
    }

    #[must_use]
    pub fn tagged_sector(mut self, floor: i32, ceiling: i32, light: i32, tag: i16) -> Self {
        self.sectors.push(Sector {
            tag,
            ..Sector::new(floor, ceiling, light)
        });
        self
    }

    /// Sets the special of the most recently added sector.
    #[must_use]
    pub fn with_special(mut self, special: i16) -> Self {
        if let Some(sector) = self.sectors.last_mut() {
            sector.special = special;
        }
        self
    }

    /// Adds a wall with one side facing `front`.
    #[must_use]
    pub fn wall(mut self, front: usize, special: i16, tag: i16) -> Self {
        let side = self.push_side(front);
        self.lines.push(Line {
            special,
            tag,
            side_num: [Some(side), None],
            front_sector: front,
            back_sector: None,
            ..Line::default()
        });
        self
    }

    /// Adds a two-sided line between `front` and `back`.
    #[must_use]
    pub fn portal(mut self, front: usize, back: usize) -> Self {
        let front_side = self.push_side(front);
        let back_side = self.push_side(back);
        self.lines.push(Line {
            flags: ML_TWOSIDED,
            side_num: [Some(front_side), Some(back_side)],
            front_sector: front,
            back_sector: Some(back),
            ..Line::default()
        });
        self
    }

    /// Registers a wall texture of the given height.
    #[must_use]
    pub fn texture(mut self, height: i32) -> Self {
        self.texture_heights.push(Fixed::from_int(height));
        self
    }

    fn push_side(&mut self, sector: usize) -> usize {
        self.sides.push(Side {
            sector,
            ..Side::default()
        });
        self.sides.len() - 1
    }

    #[must_use]
    pub fn build(self) -> Level {
        Level::new(self.sectors, self.lines, self.sides, 8, self.texture_heights)
    }
}

/// Hall sector in [`corridor`].
pub const HALL: usize = 0;
/// Lift sector (tag 1), floor 64 above the hall.
pub const LIFT: usize = 1;
/// Crusher sector (tag 2), ceiling 96.
pub const CRUSHER: usize = 2;
/// Closed door sector (tag 3).
pub const DOOR: usize = 3;
/// Switch line tagged for the lift.
pub const LIFT_SWITCH: usize = 3;
/// Switch line tagged for the crusher.
pub const CRUSHER_SWITCH: usize = 4;
/// Switch line tagged for the door.
pub const DOOR_SWITCH: usize = 5;

/// A hall joined to a lift, a crusher room and a door, with one switch
/// line per tag on the hall wall. Lines 0 to 2 are the portals.
#[must_use]
pub fn corridor() -> Level {
    LevelBuilder::new()
        .sector(0, 128, 160)
        .tagged_sector(64, 128, 160, 1)
        .tagged_sector(0, 96, 160, 2)
        .tagged_sector(0, 0, 160, 3)
        .portal(HALL, LIFT)
        .portal(HALL, CRUSHER)
        .portal(HALL, DOOR)
        .wall(HALL, 0, 1)
        .wall(HALL, 0, 2)
        .wall(HALL, 0, 3)
        .build()
}

/// A fresh world on `level` with default settings.
#[must_use]
pub fn world_on(level: Level) -> World {
    World::new(level, SimConfig::default())
}
