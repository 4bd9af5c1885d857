//! Signed fixed-point numbers with a compile-time integer/fraction split.
//!
//! `Fixed<B, I, F>` stores a value scaled by `2^F` in the native integer
//! `B`. `I` counts the integer bits including the sign, so `I + F` must fit
//! in `B`. The GTE keeps its matrix coefficients and depth-cue factors in
//! these types and moves them to and from its registers as raw bit patterns.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Native signed integer that can back a [`Fixed`].
///
/// Every arithmetic step that could lose bits is carried out in `i128`,
/// which is wider than any backing type.
pub trait Backing: Copy + Default + Eq + Ord + std::hash::Hash + fmt::Debug + 'static {
    const BITS: u32;

    fn widen(self) -> i128;
    /// Truncates to the backing width, keeping the low bits.
    fn narrow(value: i128) -> Self;
}

macro_rules! impl_backing {
    ($($t:ty),*) => {
        $(
            impl Backing for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline(always)]
                fn widen(self) -> i128 {
                    self as i128
                }

                #[inline(always)]
                fn narrow(value: i128) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_backing!(i8, i16, i32, i64);

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed<B: Backing, const I: u32, const F: u32> {
    raw: B,
}

/// 1.3.12 coefficient, the layout of the GTE rotation/light/color matrices.
pub type Coeff = Fixed<i16, 4, 12>;
/// 1.7.8 factor, the layout of the GTE depth-cue coefficient DQA.
pub type DepthCoeff = Fixed<i16, 8, 8>;
/// 1.7.24 offset, the layout of the GTE depth-cue offset DQB.
pub type DepthOffset = Fixed<i32, 8, 24>;

impl<B: Backing, const I: u32, const F: u32> Fixed<B, I, F> {
    const LAYOUT: () = assert!(I + F <= B::BITS, "integer and fraction bits exceed the backing type");

    pub const FRACTION_BITS: u32 = F;
    pub const INTEGER_BITS: u32 = I;

    /// Builds a value from its raw bit pattern, bypassing scaling.
    #[inline(always)]
    pub fn from_raw(raw: B) -> Self {
        let () = Self::LAYOUT;
        Self { raw }
    }

    #[inline(always)]
    pub fn raw(self) -> B {
        self.raw
    }

    #[inline(always)]
    pub fn set_raw(&mut self, raw: B) {
        self.raw = raw;
    }

    #[inline(always)]
    fn from_wide(value: i128) -> Self {
        Self::from_raw(B::narrow(value))
    }

    pub fn from_int(value: i64) -> Self {
        Self::from_wide((value as i128) << F)
    }

    /// Scales by `2^F`, rounding half away from zero.
    pub fn from_f64(value: f64) -> Self {
        let scaled = value * (1u128 << F) as f64;
        let rounded = if scaled >= 0.0 { scaled + 0.5 } else { scaled - 0.5 };
        Self::from_wide(rounded as i128)
    }

    pub fn from_f32(value: f32) -> Self {
        Self::from_f64(value as f64)
    }

    /// Rescales into another split, shifting by the fraction-bit difference
    /// after widening so no bits are lost mid-shift.
    pub fn convert<B2: Backing, const I2: u32, const F2: u32>(self) -> Fixed<B2, I2, F2> {
        let wide = self.raw.widen();
        let shifted = if F2 >= F { wide << (F2 - F) } else { wide >> (F - F2) };
        Fixed::<B2, I2, F2>::from_wide(shifted)
    }

    /// Integer part, rounded toward negative infinity.
    #[inline(always)]
    pub fn to_i64(self) -> i64 {
        (self.raw.widen() >> F) as i64
    }

    #[inline(always)]
    pub fn to_f64(self) -> f64 {
        self.raw.widen() as f64 / (1u128 << F) as f64
    }

    #[inline(always)]
    pub fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }

    /// `None` when `rhs` is zero.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        let divisor = rhs.raw.widen();
        if divisor == 0 {
            return None;
        }

        Some(Self::from_wide((self.raw.widen() << F) / divisor))
    }
}

macro_rules! impl_int_conversions {
    ($($name:ident => $t:ty),*) => {
        impl<B: Backing, const I: u32, const F: u32> Fixed<B, I, F> {
            $(
                #[inline(always)]
                pub fn $name(self) -> $t {
                    self.to_i64() as $t
                }
            )*
        }
    };
}

impl_int_conversions!(to_i8 => i8, to_i16 => i16, to_i32 => i32, to_u8 => u8, to_u16 => u16, to_u32 => u32, to_u64 => u64);

impl<B: Backing, const I: u32, const F: u32> From<i32> for Fixed<B, I, F> {
    fn from(value: i32) -> Self {
        Self::from_int(value as i64)
    }
}

impl<B: Backing, const I: u32, const F: u32> From<bool> for Fixed<B, I, F> {
    fn from(value: bool) -> Self {
        Self::from_int(value as i64)
    }
}

impl<B: Backing, const I: u32, const F: u32> From<f64> for Fixed<B, I, F> {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl<B: Backing, const I: u32, const F: u32> Add for Fixed<B, I, F> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_wide(self.raw.widen() + rhs.raw.widen())
    }
}

impl<B: Backing, const I: u32, const F: u32> Sub for Fixed<B, I, F> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_wide(self.raw.widen() - rhs.raw.widen())
    }
}

impl<B: Backing, const I: u32, const F: u32> AddAssign for Fixed<B, I, F> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<B: Backing, const I: u32, const F: u32> SubAssign for Fixed<B, I, F> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<B: Backing, const I: u32, const F: u32> Neg for Fixed<B, I, F> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_wide(-self.raw.widen())
    }
}

impl<B: Backing, const I: u32, const F: u32> Mul for Fixed<B, I, F> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::from_wide((self.raw.widen() * rhs.raw.widen()) >> F)
    }
}

/// # Panics
///
/// Panics on a zero divisor, like native integer division.
impl<B: Backing, const I: u32, const F: u32> Div for Fixed<B, I, F> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        match self.checked_div(rhs) {
            Some(quotient) => quotient,
            None => panic!("attempt to divide a fixed-point value by zero"),
        }
    }
}

impl<B: Backing, const I: u32, const F: u32> fmt::Debug for Fixed<B, I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, Q{}.{})", self.to_f64(), self.raw, I, F)
    }
}

impl<B: Backing, const I: u32, const F: u32> fmt::Display for Fixed<B, I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
