//! Neighbourhood searches used by line actions and mechanisms.
//!
//! Every search walks a sector's bounding lines and looks across two-sided
//! ones. Starting values follow the shipped engine so destination heights
//! come out identical.

use super::{Level, Line, Sector, Side, ML_TWOSIDED};
use crate::constants::HIGHEST_FLOOR_START;
use crate::numeric::Fixed;

impl Level {
    /// First sector after `start` carrying `tag`.
    ///
    /// Passing `None` starts from the first sector, so repeated calls walk a
    /// whole tag group.
    ///
    /// # Examples
    /// ```
    /// use gloom::level::{Level, Sector};
    /// let mut a = Sector::new(0, 64, 128);
    /// a.tag = 7;
    /// let level = Level::new(vec![a.clone(), Sector::new(0, 64, 128), a], vec![], vec![], 1, vec![]);
    /// assert_eq!(level.find_sector_from_tag(7, None), Some(0));
    /// assert_eq!(level.find_sector_from_tag(7, Some(0)), Some(2));
    /// assert_eq!(level.find_sector_from_tag(7, Some(2)), None);
    /// ```
    #[must_use]
    pub fn find_sector_from_tag(&self, tag: i16, start: Option<usize>) -> Option<usize> {
        let from = start.map_or(0, |s| s + 1);
        self.sectors
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, sector)| sector.tag == tag)
            .map(|(index, _)| index)
    }

    /// All sectors carrying `tag`, in index order.
    pub fn tagged_sectors(&self, tag: i16) -> impl Iterator<Item = usize> + '_ {
        self.sectors
            .iter()
            .enumerate()
            .filter(move |(_, sector)| sector.tag == tag)
            .map(|(index, _)| index)
    }

    /// The sector on the other side of `line` from `sector`.
    #[must_use]
    pub fn next_sector(&self, line: usize, sector: usize) -> Option<usize> {
        let linedef = self.lines.get(line)?;
        if linedef.flags & ML_TWOSIDED == 0 {
            return None;
        }
        if linedef.front_sector == sector {
            linedef.back_sector
        } else {
            Some(linedef.front_sector)
        }
    }

    fn neighbours(&self, sector: usize) -> impl Iterator<Item = usize> + '_ {
        self.sectors
            .get(sector)
            .map(|s| s.lines.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&line| self.next_sector(line, sector))
    }

    fn neighbour_sectors(&self, sector: usize) -> impl Iterator<Item = &Sector> + '_ {
        self.neighbours(sector)
            .filter_map(move |other| self.sectors.get(other))
    }

    /// Lowest neighbouring floor, or this sector's own floor if lower.
    #[must_use]
    pub fn lowest_floor_surrounding(&self, sector: usize) -> Fixed {
        let own = self.sectors.get(sector).map_or(Fixed::ZERO, |s| s.floor_height);
        self.neighbour_sectors(sector)
            .map(|other| other.floor_height)
            .fold(own, Fixed::min)
    }

    /// Highest neighbouring floor, never below -500 units.
    #[must_use]
    pub fn highest_floor_surrounding(&self, sector: usize) -> Fixed {
        self.neighbour_sectors(sector)
            .map(|other| other.floor_height)
            .fold(HIGHEST_FLOOR_START, Fixed::max)
    }

    /// Smallest neighbouring floor strictly above `current`, or `current`
    /// when no neighbour is higher.
    #[must_use]
    pub fn next_highest_floor(&self, sector: usize, current: Fixed) -> Fixed {
        self.neighbour_sectors(sector)
            .map(|other| other.floor_height)
            .filter(|height| *height > current)
            .min()
            .unwrap_or(current)
    }

    /// Lowest neighbouring ceiling, starting from the largest height.
    #[must_use]
    pub fn lowest_ceiling_surrounding(&self, sector: usize) -> Fixed {
        self.neighbour_sectors(sector)
            .map(|other| other.ceiling_height)
            .fold(Fixed::MAX, Fixed::min)
    }

    /// Highest neighbouring ceiling, starting from zero.
    #[must_use]
    pub fn highest_ceiling_surrounding(&self, sector: usize) -> Fixed {
        self.neighbour_sectors(sector)
            .map(|other| other.ceiling_height)
            .fold(Fixed::ZERO, Fixed::max)
    }

    /// Dimmest neighbouring light level, capped at `max`.
    #[must_use]
    pub fn min_surrounding_light(&self, sector: usize, max: i32) -> i32 {
        self.neighbour_sectors(sector)
            .map(|other| other.light_level)
            .fold(max, i32::min)
    }

    /// Brightest neighbouring light level, never below `min`.
    #[must_use]
    pub fn max_surrounding_light(&self, sector: usize, min: i32) -> i32 {
        self.neighbour_sectors(sector)
            .map(|other| other.light_level)
            .fold(min, i32::max)
    }

    fn sector_line(&self, sector: usize, line: usize) -> Option<&Line> {
        let index = *self.sectors.get(sector)?.lines.get(line)?;
        self.lines.get(index)
    }

    /// Whether the `line`th bounding line of `sector` is two-sided.
    #[must_use]
    pub fn two_sided(&self, sector: usize, line: usize) -> bool {
        self.sector_line(sector, line)
            .is_some_and(|l| l.flags & ML_TWOSIDED != 0)
    }

    /// Side `side` (0 front, 1 back) of the `line`th bounding line of `sector`.
    #[must_use]
    pub fn side_of(&self, sector: usize, line: usize, side: usize) -> Option<&Side> {
        let index = (*self.sector_line(sector, line)?.side_num.get(side)?)?;
        self.sides.get(index)
    }

    /// Sector behind side `side` of the `line`th bounding line of `sector`.
    #[must_use]
    pub fn sector_of(&self, sector: usize, line: usize, side: usize) -> Option<usize> {
        self.side_of(sector, line, side).map(|s| s.sector)
    }

    /// Front-side sector of line `line`, used by actions that copy a floor
    /// picture from the activating line.
    #[must_use]
    pub fn line_front_sector(&self, line: usize) -> Option<usize> {
        let side = (*self.lines.get(line)?.side_num.first()?)?;
        self.sides.get(side).map(|s| s.sector)
    }

    /// Sector on the back side of `line`, where a used door lives.
    #[must_use]
    pub fn back_sector_of_line(&self, line: usize) -> Option<usize> {
        let side = (*self.lines.get(line)?.side_num.get(1)?)?;
        self.sides.get(side).map(|s| s.sector)
    }
}

#[cfg(test)]
mod tests {
    use crate::level::{Level, Line, Sector, Side, ML_TWOSIDED};
    use crate::numeric::Fixed;
    use rstest::{fixture, rstest};

    /// Hub sector 0 joined to sectors 1..=3 by two-sided lines, plus one
    /// one-sided wall.
    #[fixture]
    fn hub() -> Level {
        let sectors = vec![
            Sector::new(0, 128, 200),
            Sector::new(-64, 96, 120),
            Sector::new(32, 256, 180),
            Sector::new(16, 72, 140),
        ];
        let mut lines = Vec::new();
        let mut sides = Vec::new();
        for neighbour in 1..=3 {
            let front = sides.len();
            sides.push(Side::default());
            sides.push(Side {
                sector: neighbour,
                ..Side::default()
            });
            lines.push(Line {
                flags: ML_TWOSIDED,
                side_num: [Some(front), Some(front + 1)],
                front_sector: 0,
                back_sector: Some(neighbour),
                ..Line::default()
            });
        }
        let wall = sides.len();
        sides.push(Side::default());
        lines.push(Line {
            side_num: [Some(wall), None],
            front_sector: 0,
            ..Line::default()
        });
        Level::new(sectors, lines, sides, 8, vec![])
    }

    #[rstest]
    fn floor_searches(hub: Level) {
        assert_eq!(hub.lowest_floor_surrounding(0), Fixed::from_int(-64));
        assert_eq!(hub.highest_floor_surrounding(0), Fixed::from_int(32));
        assert_eq!(hub.next_highest_floor(0, Fixed::ZERO), Fixed::from_int(16));
        assert_eq!(
            hub.next_highest_floor(0, Fixed::from_int(32)),
            Fixed::from_int(32)
        );
    }

    #[rstest]
    fn ceiling_searches(hub: Level) {
        assert_eq!(hub.lowest_ceiling_surrounding(0), Fixed::from_int(72));
        assert_eq!(hub.highest_ceiling_surrounding(0), Fixed::from_int(256));
    }

    #[rstest]
    fn isolated_sector_uses_start_values() {
        let level = Level::new(vec![Sector::new(8, 64, 100)], vec![], vec![], 1, vec![]);
        assert_eq!(level.lowest_floor_surrounding(0), Fixed::from_int(8));
        assert_eq!(level.highest_floor_surrounding(0), Fixed::from_int(-500));
        assert_eq!(level.lowest_ceiling_surrounding(0), Fixed::MAX);
        assert_eq!(level.highest_ceiling_surrounding(0), Fixed::ZERO);
    }

    #[rstest]
    fn light_searches(hub: Level) {
        assert_eq!(hub.min_surrounding_light(0, 200), 120);
        assert_eq!(hub.min_surrounding_light(0, 100), 100);
        assert_eq!(hub.max_surrounding_light(0, 0), 180);
    }

    #[rstest]
    fn next_sector_skips_one_sided_lines(hub: Level) {
        assert_eq!(hub.next_sector(0, 0), Some(1));
        assert_eq!(hub.next_sector(0, 1), Some(0));
        assert_eq!(hub.next_sector(3, 0), None);
    }

    #[rstest]
    fn side_helpers_follow_sector_line_lists(hub: Level) {
        assert!(hub.two_sided(0, 1));
        assert!(!hub.two_sided(0, 3));
        assert_eq!(hub.sector_of(0, 2, 1), Some(3));
        assert!(hub.side_of(0, 3, 1).is_none());
        assert_eq!(hub.line_front_sector(1), Some(0));
    }
}
