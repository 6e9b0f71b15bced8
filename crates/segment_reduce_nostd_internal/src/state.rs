//! Introduces [`LaneStateViewMut`], which tracks the accumulators for every
//! lane of a single group.
//!
//! A group of the source array is `K` lanes wide (`K` is the product of the
//! extents of all axes after the reduction dimension). Each lane has its own
//! accumulator and its own remembered position. The storage is always
//! provided by external code. The kernels in this crate never allocate.

use crate::element::Element;
use crate::reducer::Reducer;
use ndarray::{ArrayView1, ArrayViewMut1};

pub struct LaneStateViewMut<'a, T: Element> {
    vals: &'a mut [T],
    args: &'a mut [i64],
    // the "no contributing element" marker for the remembered positions
    sentinel: i64,
}

impl<'a, T: Element> LaneStateViewMut<'a, T> {
    /// Wrap scratch storage for `vals.len()` lanes.
    ///
    /// `sentinel` should be the extent of the reduction dimension.
    pub fn new(
        vals: &'a mut [T],
        args: &'a mut [i64],
        sentinel: i64,
    ) -> Result<LaneStateViewMut<'a, T>, &'static str> {
        if vals.len() != args.len() {
            Err("the value and position scratch buffers must have the same length")
        } else {
            Ok(Self {
                vals,
                args,
                sentinel,
            })
        }
    }

    /// the number of lanes
    #[inline]
    pub fn n_lanes(&self) -> usize {
        self.vals.len()
    }

    pub fn vals(&self) -> &[T] {
        &*self.vals
    }

    pub fn args(&self) -> &[i64] {
        &*self.args
    }

    /// initializes every lane. This blindly overwrites existing values.
    #[inline]
    pub fn reset(&mut self, reducer: &impl Reducer<T>) {
        self.vals.fill(reducer.init());
        self.args.fill(self.sentinel);
    }

    /// start a group with the source row found at position `pos`. Every
    /// lane takes that row's value, even when it doesn't beat
    /// [`Reducer::init`].
    #[inline]
    pub fn start(&mut self, row: ArrayView1<T>, pos: i64) {
        debug_assert_eq!(row.len(), self.n_lanes());
        for (val, first) in self.vals.iter_mut().zip(row.iter()) {
            *val = *first;
        }
        self.args.fill(pos);
    }

    /// use the current contents of an output row as the starting values of
    /// the accumulators (the remembered positions are reset)
    #[inline]
    pub fn seed(&mut self, row: ArrayView1<T>) {
        debug_assert_eq!(row.len(), self.n_lanes());
        for (val, seed) in self.vals.iter_mut().zip(row.iter()) {
            *val = *seed;
        }
        self.args.fill(self.sentinel);
    }

    /// fold every lane of a single source row (found at position `pos` along
    /// the reduction dimension) into the accumulators
    #[inline]
    pub fn consume(&mut self, reducer: &impl Reducer<T>, row: ArrayView1<T>, pos: i64) {
        debug_assert_eq!(row.len(), self.n_lanes());
        for ((val, arg), new_val) in self.vals.iter_mut().zip(self.args.iter_mut()).zip(row) {
            reducer.update(val, *new_val, arg, pos);
        }
    }

    /// write the accumulators for a group that held `count` elements
    #[inline]
    pub fn write(
        &self,
        reducer: &impl Reducer<T>,
        mut out_row: ArrayViewMut1<T>,
        arg_row: Option<ArrayViewMut1<i64>>,
        count: usize,
    ) {
        debug_assert_eq!(out_row.len(), self.n_lanes());
        match arg_row {
            Some(mut arg_row) => {
                for k in 0..self.n_lanes() {
                    reducer.write(
                        &mut out_row[k],
                        self.vals[k],
                        Some(&mut arg_row[k]),
                        self.args[k],
                        count,
                    );
                }
            }
            None => {
                for k in 0..self.n_lanes() {
                    reducer.write(&mut out_row[k], self.vals[k], None, self.args[k], count);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{Max, Sum};
    use ndarray::{ArrayView2, ArrayViewMut1};

    #[test]
    fn mismatched_scratch() {
        let mut vals = [0.0; 3];
        let mut args = [0; 2];
        assert!(LaneStateViewMut::new(&mut vals, &mut args, 4).is_err());
    }

    #[test]
    fn fold_two_rows() {
        #[rustfmt::skip]
        let src = [
            1.0, 9.0,
            4.0, 2.0,
        ];
        let src = ArrayView2::from_shape((2, 2), &src).unwrap();

        let mut vals = [0.0; 2];
        let mut args = [0; 2];
        let mut lanes = LaneStateViewMut::new(&mut vals, &mut args, 2).unwrap();

        lanes.reset(&Max);
        assert_eq!(lanes.args(), &[2, 2]);
        lanes.consume(&Max, src.row(0), 0);
        lanes.consume(&Max, src.row(1), 1);

        let mut out = [0.0; 2];
        let mut arg_out = [2; 2];
        lanes.write(
            &Max,
            ArrayViewMut1::from(&mut out[..]),
            Some(ArrayViewMut1::from(&mut arg_out[..])),
            2,
        );
        assert_eq!(out, [4.0, 9.0]);
        assert_eq!(arg_out, [1, 0]);

        // seeding reuses existing output values
        lanes.seed(ArrayView1::from(&out[..]));
        lanes.consume(&Sum, src.row(0), 0);
        assert_eq!(lanes.vals(), &[5.0, 18.0]);
        assert_eq!(lanes.args(), &[2, 2]);
    }

    #[test]
    fn start_takes_first_row() {
        let row = [f64::MIN, f64::NEG_INFINITY];
        let mut vals = [7.0; 2];
        let mut args = [0; 2];
        let mut lanes = LaneStateViewMut::new(&mut vals, &mut args, 5).unwrap();

        lanes.start(ArrayView1::from(&row[..]), 3);
        assert_eq!(lanes.vals(), &[f64::MIN, f64::NEG_INFINITY]);
        assert_eq!(lanes.args(), &[3, 3]);

        let mut out = [0.0; 2];
        let mut arg_out = [5; 2];
        lanes.write(
            &Max,
            ArrayViewMut1::from(&mut out[..]),
            Some(ArrayViewMut1::from(&mut arg_out[..])),
            1,
        );
        assert_eq!(out, [f64::MIN, f64::NEG_INFINITY]);
        assert_eq!(arg_out, [3, 3]);
    }
}
