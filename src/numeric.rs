//! Fixed-point and angle primitives consumed by the simulation.
//!
//! All simulation math is integer-deterministic. [`Fixed`] is a 16.16
//! value with two's-complement wraparound, [`Angle`] a binary angle that
//! wraps at a full turn. Only the operations the thinkers need are exposed.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Number of fractional bits in a [`Fixed`].
pub const FRACBITS: u32 = 16;
/// Raw representation of `1.0`.
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// 16.16 fixed-point value.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Fixed(pub i32);

impl Fixed {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One map unit.
    pub const UNIT: Self = Self(FRACUNIT);
    /// Largest representable value.
    pub const MAX: Self = Self(i32::MAX);

    /// Builds a value from whole map units.
    ///
    /// # Examples
    /// ```
    /// use gloom::numeric::Fixed;
    /// assert_eq!(Fixed::from_int(2).raw(), 2 << 16);
    /// ```
    #[must_use]
    pub const fn from_int(units: i32) -> Self {
        Self(units.wrapping_shl(FRACBITS))
    }

    /// Whole map units, rounding toward negative infinity.
    #[must_use]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    /// Raw 16.16 representation.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;

    fn mul(self, factor: i32) -> Self {
        Self(self.0.wrapping_mul(factor))
    }
}

impl Div<i32> for Fixed {
    type Output = Self;

    fn div(self, divisor: i32) -> Self {
        Self(self.0.wrapping_div(divisor))
    }
}

/// Binary angle; `u32::MAX + 1` is a full turn.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Angle(pub u32);

impl Add for Angle {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }
}

impl Sub for Angle {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.wrapping_sub(other.0))
    }
}

/// Keeps the low 16 bits of `value`, as a 16-bit field store does.
#[expect(
    clippy::cast_possible_truncation,
    reason = "Sixteen-bit archive fields intentionally drop the high half."
)]
#[must_use]
pub const fn low16(value: i32) -> i16 {
    value as i16
}

/// Keeps the low 8 bits of `value`, as a byte field store does.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Byte archive fields intentionally drop the high bits."
)]
#[must_use]
pub const fn low8(value: i32) -> u8 {
    value as u8
}

/// Reinterprets a binary angle as the signed word it is archived as.
#[expect(
    clippy::cast_possible_wrap,
    reason = "Angles are stored as raw 32-bit words."
)]
#[must_use]
pub const fn angle_to_word(angle: Angle) -> i32 {
    angle.0 as i32
}

/// Inverse of [`angle_to_word`].
#[expect(
    clippy::cast_sign_loss,
    reason = "Angles are stored as raw 32-bit words."
)]
#[must_use]
pub const fn word_to_angle(word: i32) -> Angle {
    Angle(word as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::positive(3, 3)]
    #[case::negative(-128, -128)]
    #[case::zero(0, 0)]
    fn int_conversion_round_trips(#[case] units: i32, #[case] expected: i32) {
        assert_eq!(Fixed::from_int(units).to_int(), expected);
    }

    #[rstest]
    fn arithmetic_wraps_instead_of_panicking() {
        let sum = Fixed::MAX + Fixed(1);
        assert_eq!(sum, Fixed(i32::MIN));
    }

    #[rstest]
    fn speed_scaling_matches_raw_math() {
        assert_eq!(Fixed::UNIT * 4, Fixed(4 * FRACUNIT));
        assert_eq!(Fixed::UNIT / 8, Fixed(FRACUNIT / 8));
    }

    #[rstest]
    fn low16_keeps_low_half() {
        assert_eq!(low16(0x0001_8000), i16::MIN);
        assert_eq!(low16(-5), -5);
    }

    #[rstest]
    fn angles_wrap_at_full_turn() {
        let a = Angle(u32::MAX) + Angle(2);
        assert_eq!(a, Angle(1));
        assert_eq!(word_to_angle(angle_to_word(Angle(0xdead_beef))), Angle(0xdead_beef));
    }
}
