//! Mutable level geometry: sectors, lines and sides.
//!
//! A [`Level`] is owned by the world for the lifetime of a map. Thinkers refer
//! to sectors by index; a sector's [`Sector::special_data`] is a non-owning
//! back-reference naming the one mechanism currently allowed to move or light
//! it.

mod queries;

use crate::numeric::Fixed;
use crate::thinker::ThinkerId;

/// Line blocks players and monsters.
pub const ML_BLOCKING: i16 = 1;
/// Line blocks monsters only.
pub const ML_BLOCKMONSTERS: i16 = 2;
/// Line has a back side.
pub const ML_TWOSIDED: i16 = 4;
/// Upper texture is unpegged.
pub const ML_DONTPEGTOP: i16 = 8;
/// Lower texture is unpegged.
pub const ML_DONTPEGBOTTOM: i16 = 16;
/// Line shows as one-sided on the automap.
pub const ML_SECRET: i16 = 32;

/// A map region with a floor, a ceiling and a light level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sector {
    /// Floor plane height.
    pub floor_height: Fixed,
    /// Ceiling plane height.
    pub ceiling_height: Fixed,
    /// Flat drawn on the floor.
    pub floor_pic: i16,
    /// Flat drawn on the ceiling.
    pub ceiling_pic: i16,
    /// Light level, 0 to 255.
    pub light_level: i32,
    /// Special type: lighting effect, damage or secret.
    pub special: i16,
    /// Tag matched by line triggers.
    pub tag: i16,
    /// Mechanism currently driving this sector, if any.
    pub special_data: Option<ThinkerId>,
    /// Indices of the lines bounding this sector.
    pub lines: Vec<usize>,
}

impl Sector {
    /// Builds a sector with the given heights (in whole units) and light.
    #[must_use]
    pub fn new(floor: i32, ceiling: i32, light_level: i32) -> Self {
        Self {
            floor_height: Fixed::from_int(floor),
            ceiling_height: Fixed::from_int(ceiling),
            light_level,
            ..Self::default()
        }
    }

    /// Whether a mechanism already owns this sector.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.special_data.is_some()
    }
}

/// A linedef separating one or two sectors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    /// `ML_*` bits.
    pub flags: i16,
    /// Action triggered by using or crossing the line.
    pub special: i16,
    /// Sector tag the action applies to.
    pub tag: i16,
    /// Front and back side indices into [`Level::sides`].
    pub side_num: [Option<usize>; 2],
    /// Sector on the front side.
    pub front_sector: usize,
    /// Sector on the back side of a two-sided line.
    pub back_sector: Option<usize>,
}

/// One face of a line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Side {
    /// Horizontal texture offset.
    pub texture_offset: Fixed,
    /// Vertical texture offset.
    pub row_offset: Fixed,
    /// Texture above the back sector's ceiling.
    pub top_texture: i16,
    /// Texture below the back sector's floor.
    pub bottom_texture: i16,
    /// Texture in the opening.
    pub mid_texture: i16,
    /// Sector this side faces.
    pub sector: usize,
}

/// Geometry and texture tables for the current map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Level {
    /// Every sector, indexed by sector number.
    pub sectors: Vec<Sector>,
    /// Every linedef.
    pub lines: Vec<Line>,
    /// Every sidedef.
    pub sides: Vec<Side>,
    /// Number of flats loaded; saved floor and ceiling pictures outside
    /// `0..num_flats` are ignored on load.
    pub num_flats: i16,
    /// Height of each wall texture, used by raise-to-texture floors.
    pub texture_heights: Vec<Fixed>,
    /// Current frame for every flat, advanced by animations.
    pub flat_translation: Vec<i16>,
    /// Current frame for every wall texture, advanced by animations.
    pub texture_translation: Vec<i16>,
    /// Switch textures as consecutive (off, on) pairs.
    pub switch_list: Vec<i16>,
}

impl Level {
    /// Builds a level, wiring each sector's line list from the line table
    /// and giving every flat and texture an identity translation.
    #[must_use]
    pub fn new(
        mut sectors: Vec<Sector>,
        lines: Vec<Line>,
        sides: Vec<Side>,
        num_flats: i16,
        texture_heights: Vec<Fixed>,
    ) -> Self {
        for sector in &mut sectors {
            sector.lines.clear();
        }
        for (index, line) in lines.iter().enumerate() {
            if let Some(sector) = sectors.get_mut(line.front_sector) {
                sector.lines.push(index);
            }
            if let Some(back) = line.back_sector.filter(|b| *b != line.front_sector) {
                if let Some(sector) = sectors.get_mut(back) {
                    sector.lines.push(index);
                }
            }
        }
        let flat_translation = (0..num_flats.max(0)).collect();
        let texture_translation = (0..texture_heights.len())
            .map(|i| i16::try_from(i).unwrap_or(i16::MAX))
            .collect();
        Self {
            sectors,
            lines,
            sides,
            num_flats,
            texture_heights,
            flat_translation,
            texture_translation,
            switch_list: Vec::new(),
        }
    }

    /// Number of wall textures known to the level.
    #[must_use]
    pub const fn num_textures(&self) -> usize {
        self.texture_heights.len()
    }

    /// Whether sector `index` exists and no mechanism owns it.
    #[must_use]
    pub fn sector_is_free(&self, index: usize) -> bool {
        self.sectors.get(index).is_some_and(|s| !s.is_busy())
    }

    /// Releases every sector from its controlling mechanism.
    pub fn clear_special_data(&mut self) {
        for sector in &mut self.sectors {
            sector.special_data = None;
        }
    }
}
