use fixed::types::I32F32;

use crate::error::{LayoutError, Result};

/// A length in points, quantized to thousandths of a point so that layout
/// results are bit-identical from run to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pt(I32F32);

impl Pt {
    pub const ZERO: Pt = Pt(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Pt {
        if !value.is_finite() {
            return Pt::ZERO;
        }
        let milli = (value as f64 * 1000.0).round();
        let milli = milli.clamp(i64::MIN as f64, i64::MAX as f64) as i64;
        Pt::from_milli_i64(milli)
    }

    /// Compile-time constructor for constants expressed in milli-points.
    pub const fn from_milli(milli: i64) -> Pt {
        let adj: i128 = if milli >= 0 { 500 } else { -500 };
        Pt(I32F32::from_bits(
            ((milli as i128 * (1i128 << 32) + adj) / 1000) as i64,
        ))
    }

    pub fn from_i32(value: i32) -> Pt {
        Pt::from_milli_i64((value as i64) * 1000)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli_i64(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        let milli = (scaled + adj) / denom;
        milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn from_milli_i64(milli: i64) -> Pt {
        Pt::from_milli_i128(milli as i128)
    }

    fn from_milli_i128(milli: i128) -> Pt {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Pt(I32F32::from_bits(bits))
    }

    pub fn max(self, other: Pt) -> Pt {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Pt) -> Pt {
        if self <= other { self } else { other }
    }

    pub fn abs(self) -> Pt {
        if self.to_milli_i64() < 0 { -self } else { self }
    }

    pub fn is_negative(self) -> bool {
        self < Pt::ZERO
    }

    pub fn mul_ratio(self, num: i32, denom: i32) -> Pt {
        if denom == 0 {
            return Pt::ZERO;
        }
        let milli = self.to_milli_i64() as i128;
        let value = div_round_i128(milli.saturating_mul(num as i128), denom as i128);
        Pt::from_milli_i128(value)
    }
}

impl std::fmt::Display for Pt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let milli = self.to_milli_i64();
        let sign = if milli < 0 { "-" } else { "" };
        let milli = milli.unsigned_abs();
        write!(f, "{}{}.{:03}", sign, milli / 1000, milli % 1000)
    }
}

impl std::ops::Add for Pt {
    type Output = Pt;
    fn add(self, rhs: Pt) -> Pt {
        Pt::from_milli_i128(self.to_milli_i64() as i128 + rhs.to_milli_i64() as i128)
    }
}

impl std::ops::AddAssign for Pt {
    fn add_assign(&mut self, rhs: Pt) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Pt {
    type Output = Pt;
    fn sub(self, rhs: Pt) -> Pt {
        Pt::from_milli_i128(self.to_milli_i64() as i128 - rhs.to_milli_i64() as i128)
    }
}

impl std::ops::SubAssign for Pt {
    fn sub_assign(&mut self, rhs: Pt) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<i32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: i32) -> Pt {
        let milli = self.to_milli_i64() as i128;
        Pt::from_milli_i128(milli.saturating_mul(rhs as i128))
    }
}

impl std::ops::Div<i32> for Pt {
    type Output = Pt;
    fn div(self, rhs: i32) -> Pt {
        if rhs == 0 {
            Pt::ZERO
        } else {
            let milli = self.to_milli_i64() as i128;
            Pt::from_milli_i128(div_round_i128(milli, rhs as i128))
        }
    }
}

impl std::ops::Mul<f32> for Pt {
    type Output = Pt;
    fn mul(self, rhs: f32) -> Pt {
        if !rhs.is_finite() {
            return Pt::ZERO;
        }
        Pt::from_f32(self.to_f32() * rhs)
    }
}

impl std::ops::Div<f32> for Pt {
    type Output = Pt;
    fn div(self, rhs: f32) -> Pt {
        if rhs == 0.0 || !rhs.is_finite() {
            Pt::ZERO
        } else {
            Pt::from_f32(self.to_f32() / rhs)
        }
    }
}

impl std::ops::Neg for Pt {
    type Output = Pt;
    fn neg(self) -> Pt {
        Pt::from_milli_i128(-(self.to_milli_i64() as i128))
    }
}

impl std::iter::Sum for Pt {
    fn sum<I: Iterator<Item = Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + v)
    }
}

impl<'a> std::iter::Sum<&'a Pt> for Pt {
    fn sum<I: Iterator<Item = &'a Pt>>(iter: I) -> Pt {
        iter.fold(Pt::ZERO, |acc, v| acc + *v)
    }
}

fn div_round_i128(num: i128, den: i128) -> i128 {
    if den == 0 {
        return 0;
    }
    let den_abs = den.abs();
    if num >= 0 {
        (num + (den_abs / 2)) / den
    } else {
        -(((-num) + (den_abs / 2)) / den)
    }
}

/// Width and height of something; both are never negative.
///
/// Not to be confused with an [`Offset`], which is a position where y grows
/// upward from the bottom of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    width: Pt,
    height: Pt,
}

impl Dimension {
    pub const ZERO: Dimension = Dimension {
        width: Pt::ZERO,
        height: Pt::ZERO,
    };

    pub fn new(width: Pt, height: Pt) -> Result<Self> {
        if width.is_negative() || height.is_negative() {
            return Err(LayoutError::NegativeDimension { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn from_f32(width: f32, height: f32) -> Result<Self> {
        Self::new(Pt::from_f32(width), Pt::from_f32(height))
    }

    // Sums and maxima of measured sizes; cannot go negative.
    pub(crate) fn measured(width: Pt, height: Pt) -> Self {
        Self {
            width: width.max(Pt::ZERO),
            height: height.max(Pt::ZERO),
        }
    }

    pub fn width(&self) -> Pt {
        self.width
    }

    pub fn height(&self) -> Pt {
        self.height
    }

    pub fn with_width(self, width: Pt) -> Result<Self> {
        Self::new(width, self.height)
    }

    pub fn with_height(self, height: Pt) -> Result<Self> {
        Self::new(self.width, height)
    }

    /// Landscape pages report their long side as height, so callers
    /// sometimes need the two swapped.
    pub fn swap_wh(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn plus(self, other: Dimension) -> Self {
        Self {
            width: self.width + other.width,
            height: self.height + other.height,
        }
    }

    pub fn minus(self, other: Dimension) -> Result<Self> {
        Self::new(self.width - other.width, self.height - other.height)
    }

    /// True when this dimension does not extend beyond `other` in either
    /// direction.
    pub fn lte(&self, other: &Dimension) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

/// A position on the page. Unlike a [`Dimension`], y increases upward and
/// either coordinate may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Offset {
    pub x: Pt,
    pub y: Pt,
}

impl Offset {
    pub fn new(x: Pt, y: Pt) -> Self {
        Self { x, y }
    }

    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::new(Pt::from_f32(x), Pt::from_f32(y))
    }

    /// Rightmost x and lowest y of the two offsets.
    pub fn max_x_min_y(self, other: Offset) -> Self {
        Self::new(self.x.max(other.x), self.y.min(other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(w: f32, h: f32) -> Dimension {
        Dimension::from_f32(w, h).expect("dimension")
    }

    #[test]
    fn pt_quantizes_to_milli_points() {
        assert_eq!(Pt::from_f32(34.9031255).to_milli_i64(), 34903);
        assert_eq!(Pt::from_f32(1.5) + Pt::from_f32(2.25), Pt::from_f32(3.75));
        assert_eq!(Pt::from_f32(7.0) / 2, Pt::from_f32(3.5));
        assert_eq!(Pt::from_f32(-1.25).abs(), Pt::from_f32(1.25));
        assert_eq!(Pt::from_f32(f32::NAN), Pt::ZERO);
        assert_eq!(Pt::from_f32(-2.5).to_string(), "-2.500");
    }

    #[test]
    fn dimension_rejects_negative_sides() {
        assert!(matches!(
            Dimension::from_f32(3.5, -1.0),
            Err(LayoutError::NegativeDimension { .. })
        ));
        assert!(Dimension::from_f32(-3.5, 1.0).is_err());
        assert!(dim(4.0, 6.0).minus(dim(5.0, 1.0)).is_err());
    }

    #[test]
    fn dimension_arithmetic() {
        assert_eq!(dim(5.0, 3.0).swap_wh(), dim(3.0, 5.0));
        assert_eq!(dim(4.0, 6.0).minus(dim(1.0, 1.0)).unwrap(), dim(3.0, 5.0));
        assert_eq!(dim(2.0, 4.0).plus(dim(1.0, 1.0)), dim(3.0, 5.0));
        assert_eq!(
            Dimension::ZERO
                .with_width(Pt::from_f32(7.0))
                .and_then(|d| d.with_height(Pt::from_f32(11.0)))
                .unwrap(),
            dim(7.0, 11.0)
        );

        assert!(dim(5.0, 11.0).lte(&dim(5.0, 11.0)));
        assert!(dim(5.0, 11.0).lte(&dim(5.001, 11.001)));
        assert!(!dim(5.0, 11.0).lte(&dim(4.999, 11.0)));
        assert!(!dim(5.0, 11.0).lte(&dim(5.0, 10.999)));
    }

    #[test]
    fn offset_helpers() {
        let a = Offset::from_f32(10.0, 50.0);
        let b = Offset::from_f32(4.0, 20.0);
        assert_eq!(a.max_x_min_y(b), Offset::from_f32(10.0, 20.0));
        assert_eq!(b.max_x_min_y(a), Offset::from_f32(10.0, 20.0));
    }
}
