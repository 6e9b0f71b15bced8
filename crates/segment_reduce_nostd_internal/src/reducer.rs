//! Define the reduction strategies
//!
//! # Reduction Machinery
//!
//! Both segment kernels are agnostic about the kind of reduction they
//! perform. All of the reduction-specific numeric semantics live in the types
//! implementing the [`Reducer`] trait. A reducer doesn't hold any state of
//! its own. Instead, it provides the logic for working with an accumulator
//! (a single scalar value, plus a remembered position for the reductions that
//! track one) that is managed by external code.
//!
//! The life-cycle of an accumulator has 3 stages:
//! 1. it's initialized with [`Reducer::init`] (or, in the COO kernel, it may
//!    be seeded from the existing contents of the output buffer)
//! 2. each element of a group is folded in with [`Reducer::update`]
//! 3. the final value is written out with [`Reducer::write`], which is also
//!    where the group size gets taken into account

use crate::element::Element;

/// Enumerates the supported kinds of reductions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReductionKind {
    Sum,
    Mean,
    Min,
    Max,
}

impl ReductionKind {
    /// every name that [`ReductionKind::from_name`] understands
    pub const NAMES: &'static [&'static str] = &["sum", "add", "mean", "min", "max"];

    /// Look up the reduction kind associated with `name`. Note that `"add"` is
    /// an alias for `"sum"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" | "add" => Some(Self::Sum),
            "mean" => Some(Self::Mean),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    /// the canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// whether the reduction reports the position of the extreme value
    pub fn has_arg(&self) -> bool {
        matches!(self, Self::Min | Self::Max)
    }

    /// the value of an accumulator before it has consumed anything
    pub fn init<T: Element>(&self) -> T {
        match self {
            Self::Sum | Self::Mean => T::zero(),
            Self::Min => T::highest(),
            Self::Max => T::lowest(),
        }
    }
}

/// Reducers operate on an individual accumulator at a time.
///
/// Positions are always `i64`. They index the source along the reduction
/// dimension.
pub trait Reducer<T: Element> {
    fn kind(&self) -> ReductionKind;

    /// returns the initial value of an accumulator
    #[inline(always)]
    fn init(&self) -> T {
        self.kind().init()
    }

    /// fold `new_val`, found at position `new_arg`, into the accumulator
    /// `val`. Only the reductions that track a position touch `arg`.
    fn update(&self, val: &mut T, new_val: T, arg: &mut i64, new_arg: i64);

    /// store the accumulator `val` in `address`. The remembered position,
    /// `arg`, is stored in `arg_address` when the reduction tracks positions
    /// and the group wasn't empty.
    ///
    /// `count` is the number of elements that were folded into `val`.
    fn write(&self, address: &mut T, val: T, arg_address: Option<&mut i64>, arg: i64, count: usize);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Sum;

impl<T: Element> Reducer<T> for Sum {
    fn kind(&self) -> ReductionKind {
        ReductionKind::Sum
    }

    #[inline(always)]
    fn update(&self, val: &mut T, new_val: T, _arg: &mut i64, _new_arg: i64) {
        *val = (*val).accumulate(new_val);
    }

    #[inline(always)]
    fn write(&self, address: &mut T, val: T, _: Option<&mut i64>, _: i64, _: usize) {
        *address = val;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Mean;

impl<T: Element> Reducer<T> for Mean {
    fn kind(&self) -> ReductionKind {
        ReductionKind::Mean
    }

    #[inline(always)]
    fn update(&self, val: &mut T, new_val: T, _arg: &mut i64, _new_arg: i64) {
        *val = (*val).accumulate(new_val);
    }

    #[inline(always)]
    fn write(&self, address: &mut T, val: T, _: Option<&mut i64>, _: i64, count: usize) {
        // an empty group holds the initial value, 0, so this yields 0
        *address = val / T::from_count(count.max(1));
    }
}

/// shared by [`Min`] & [`Max`]
#[inline(always)]
fn write_extreme<T: Element>(
    address: &mut T,
    val: T,
    arg_address: Option<&mut i64>,
    arg: i64,
    count: usize,
) {
    if count > 0 {
        *address = val;
        if let Some(arg_address) = arg_address {
            *arg_address = arg;
        }
    } else {
        // we intentionally avoid writing the initial value (the extreme
        // bound of T). The position is left untouched (it holds a sentinel)
        *address = T::zero();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Min;

impl<T: Element> Reducer<T> for Min {
    fn kind(&self) -> ReductionKind {
        ReductionKind::Min
    }

    #[inline(always)]
    fn update(&self, val: &mut T, new_val: T, arg: &mut i64, new_arg: i64) {
        // strict comparison: ties keep the first position
        if new_val < *val {
            *val = new_val;
            *arg = new_arg;
        }
    }

    #[inline(always)]
    fn write(&self, address: &mut T, val: T, arg_address: Option<&mut i64>, arg: i64, count: usize) {
        write_extreme(address, val, arg_address, arg, count);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Max;

impl<T: Element> Reducer<T> for Max {
    fn kind(&self) -> ReductionKind {
        ReductionKind::Max
    }

    #[inline(always)]
    fn update(&self, val: &mut T, new_val: T, arg: &mut i64, new_arg: i64) {
        if new_val > *val {
            *val = new_val;
            *arg = new_arg;
        }
    }

    #[inline(always)]
    fn write(&self, address: &mut T, val: T, arg_address: Option<&mut i64>, arg: i64, count: usize) {
        write_extreme(address, val, arg_address, arg, count);
    }
}
