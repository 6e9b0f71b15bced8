//! Defines the [`Element`] trait, which describes the numeric types that can
//! be stored in a source or output buffer.
//!
//! We lean on `num_traits` for the handful of operations that aren't
//! expressible through `core` alone (namely, the bounds of a type,
//! conversions from a group size and wrapping integer addition).

use core::fmt::Debug;
use core::ops::{Add, Div};
use num_traits::{Bounded, NumCast, WrappingAdd, Zero};

/// A numeric type that the segment kernels know how to fold.
///
/// This is implemented for the primitive integer & floating point types.
pub trait Element:
    Copy + PartialOrd + Debug + Zero + Bounded + NumCast + Add<Output = Self> + Div<Output = Self>
{
    /// The largest representable value (for floats, this is the largest
    /// finite value rather than infinity)
    #[inline(always)]
    fn highest() -> Self {
        <Self as Bounded>::max_value()
    }

    /// The smallest representable value (for floats, this is the most
    /// negative finite value)
    #[inline(always)]
    fn lowest() -> Self {
        <Self as Bounded>::min_value()
    }

    /// Convert a group size into `Self`.
    ///
    /// When `count` can't be represented (e.g. `300` as a `u8`) we saturate
    /// to [`Element::highest`] rather than wrapping. Wrapping could produce
    /// `0` and an integer division by zero.
    #[inline(always)]
    fn from_count(count: usize) -> Self {
        <Self as NumCast>::from(count).unwrap_or_else(Self::highest)
    }

    /// The sum used by the additive reductions. Integer types wrap around on
    /// overflow (in every build profile).
    fn accumulate(self, other: Self) -> Self;
}

macro_rules! impl_element_wrapping {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                #[inline(always)]
                fn accumulate(self, other: Self) -> Self {
                    WrappingAdd::wrapping_add(&self, &other)
                }
            }
        )*
    };
}

macro_rules! impl_element_float {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                #[inline(always)]
                fn accumulate(self, other: Self) -> Self {
                    self + other
                }
            }
        )*
    };
}

impl_element_wrapping!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_element_float!(f32, f64);
