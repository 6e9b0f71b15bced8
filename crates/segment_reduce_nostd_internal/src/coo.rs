//! Implements the segment reduction kernel for COO-style segmentation (every
//! source element is labelled with a group id).
//!
//! The views have the same layout as in the CSR kernel: `src` is `(B, E, K)`
//! and `out` is `(B, G, K)`. The group ids are logically shaped `(B, E)`
//! (they're usually broadcast along some axes).
//!
//! # Accumulating into `out`
//!
//! Unlike the CSR kernel, this kernel *accumulates* into `out`. Whenever a
//! run of equal group ids starts, the accumulators are seeded with the current
//! contents of `out` for that group. This means that:
//! - a zero-filled `out` produces a fresh sum,
//! - an `out` filled with [`crate::Reducer::init`] produces a fresh min/max,
//! - calling the kernel again on more data (with larger or equal group ids)
//!   extends the previous results.
//!
//! Group boundaries are discovered on the fly by comparing each group id with
//! the next one. Thus, the group ids must be sorted (non-decreasing) along
//! the reduction dimension. Gaps are fine: a group that never shows up is
//! left untouched.

use crate::element::Element;
use crate::index_info::IndexInfo;
use crate::reducer::Reducer;
use crate::state::LaneStateViewMut;
use ndarray::{ArrayView3, ArrayViewMut3, Axis, s};

/// Fold the elements of `src` into the groups of `out` identified by `index`.
///
/// `lanes` provides scratch space for the accumulators. It must be `K` lanes
/// wide. For reductions that track positions, `arg_out` receives the
/// position of the extreme value for every group touched by this call (or the
/// sentinel, when the seeded value was never beaten).
///
/// # Panics
/// This panics if `index` decreases along the reduction dimension. Unsorted
/// group ids violate a precondition of this kernel. We refuse to guess at the
/// intended result.
///
/// A group id that doesn't lie in `[0, G)` also produces a panic (from the
/// bounds-checked access to `out`), unless the id is negative, in which case
/// an error is returned.
pub fn reduce_coo<T: Element, R: Reducer<T>>(
    reducer: &R,
    src: ArrayView3<T>,
    index: &IndexInfo,
    mut out: ArrayViewMut3<T>,
    mut arg_out: Option<ArrayViewMut3<i64>>,
    lanes: &mut LaneStateViewMut<T>,
) -> Result<(), &'static str> {
    let (n_batch, n_elem, n_lanes) = src.dim();

    if out.len_of(Axis(0)) != n_batch || out.len_of(Axis(2)) != n_lanes {
        return Err("out must have the same batch & lane extents as src");
    } else if arg_out.as_ref().is_some_and(|a| a.dim() != out.dim()) {
        return Err("arg_out must have the same shape as out");
    } else if lanes.n_lanes() != n_lanes {
        return Err("the scratch buffers must have an entry per lane");
    } else if index.shape().last() != Some(&n_elem) {
        return Err("the last axis of index must match the reduction dimension of src");
    } else if index.numel() != n_batch * n_elem {
        return Err("index must hold a group id for every element of every batch");
    } else if n_elem == 0 {
        // nothing to fold
        return Ok(());
    }

    for b in 0..n_batch {
        let offset = index.offset(b * n_elem);
        let mut idx = to_group_id(index.get(offset))?;

        lanes.seed(out.slice(s![b, idx, ..]));

        let mut row_start = 0;
        for e in 0..n_elem {
            lanes.consume(reducer, src.slice(s![b, e, ..]), e as i64);

            if e == n_elem - 1 {
                lanes.write(
                    reducer,
                    out.slice_mut(s![b, idx, ..]),
                    arg_out.as_mut().map(|a| a.slice_mut(s![b, idx, ..])),
                    e + 1 - row_start,
                );
            } else {
                let next_idx = to_group_id(index.get(index.step(offset, e + 1)))?;
                assert!(
                    idx <= next_idx,
                    "group ids must be sorted along the reduction dimension \
                     ({idx} precedes {next_idx})"
                );

                if idx != next_idx {
                    lanes.write(
                        reducer,
                        out.slice_mut(s![b, idx, ..]),
                        arg_out.as_mut().map(|a| a.slice_mut(s![b, idx, ..])),
                        e + 1 - row_start,
                    );
                    lanes.seed(out.slice(s![b, next_idx, ..]));
                    row_start = e + 1;
                }

                idx = next_idx;
            }
        }
    }
    Ok(())
}

#[inline(always)]
fn to_group_id(id: i64) -> Result<usize, &'static str> {
    usize::try_from(id).map_err(|_| "index holds a negative group id")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{Max, Mean, Min, Sum};

    // a helper that drives reduce_coo on flat buffers
    fn run<R: Reducer<f64>>(
        reducer: &R,
        src: &[f64],
        src_shape: (usize, usize, usize),
        index: &[i64],
        index_shape: &[usize],
        out: &mut [f64],
        n_groups: usize,
        arg_out: Option<&mut [i64]>,
    ) -> Result<(), &'static str> {
        let (n_batch, n_elem, n_lanes) = src_shape;
        let index = IndexInfo::broadcast(index, index_shape, &[n_batch, n_elem])?;
        let src = ArrayView3::from_shape(src_shape, src).unwrap();
        let out = ArrayViewMut3::from_shape((n_batch, n_groups, n_lanes), out).unwrap();
        let arg_out = arg_out
            .map(|a| ArrayViewMut3::from_shape((n_batch, n_groups, n_lanes), a).unwrap());

        let mut vals = [0.0; 8];
        let mut args = [0; 8];
        let mut lanes = LaneStateViewMut::new(
            &mut vals[..n_lanes],
            &mut args[..n_lanes],
            n_elem as i64,
        )?;
        reduce_coo(reducer, src, &index, out, arg_out, &mut lanes)
    }

    #[test]
    fn max_with_args() {
        let src = [1.0, 5.0, 3.0, 9.0, 2.0];
        let index = [0, 0, 1, 1, 2];
        let mut out = [f64::MIN; 3];
        let mut arg_out = [5; 3];
        run(&Max, &src, (1, 5, 1), &index, &[1, 5], &mut out, 3, Some(&mut arg_out)).unwrap();
        assert_eq!(out, [5.0, 9.0, 2.0]);
        assert_eq!(arg_out, [1, 3, 4]);
    }

    #[test]
    fn sum_accumulates() {
        let src = [1.0, 2.0, 3.0, 4.0];
        let index = [0, 0, 2, 2];
        let mut out = [10.0, 20.0, 30.0];
        run(&Sum, &src, (1, 4, 1), &index, &[1, 4], &mut out, 3, None).unwrap();
        // group 1 never shows up, so it's untouched
        assert_eq!(out, [13.0, 20.0, 37.0]);

        // accumulate a second time
        run(&Sum, &src, (1, 4, 1), &index, &[1, 4], &mut out, 3, None).unwrap();
        assert_eq!(out, [16.0, 20.0, 44.0]);
    }

    #[test]
    fn seeds_from_the_first_group() {
        // the first group id of the slice isn't 0: the accumulator must be
        // seeded from group 1
        let src = [1.0, 2.0, 3.0];
        let index = [1, 1, 2];
        let mut out = [100.0, 5.0, 7.0];
        run(&Sum, &src, (1, 3, 1), &index, &[1, 3], &mut out, 3, None).unwrap();
        assert_eq!(out, [100.0, 8.0, 10.0]);
    }

    #[test]
    fn mean_and_min() {
        let src = [1.0, 2.0, 6.0, -4.0];
        let index = [0, 1, 1, 1];

        let mut out = [0.0; 2];
        run(&Mean, &src, (1, 4, 1), &index, &[1, 4], &mut out, 2, None).unwrap();
        assert_eq!(out, [1.0, 4.0 / 3.0]);

        let mut out = [f64::MAX; 2];
        let mut arg_out = [4; 2];
        run(&Min, &src, (1, 4, 1), &index, &[1, 4], &mut out, 2, Some(&mut arg_out)).unwrap();
        assert_eq!(out, [1.0, -4.0]);
        assert_eq!(arg_out, [0, 3]);
    }

    #[test]
    fn seeded_extreme_keeps_sentinel() {
        // the existing max of group 0 is never beaten in this call
        let src = [1.0, 2.0, 3.0];
        let index = [0, 0, 1];
        let mut out = [50.0, f64::MIN];
        let mut arg_out = [3; 2];
        run(&Max, &src, (1, 3, 1), &index, &[1, 3], &mut out, 2, Some(&mut arg_out)).unwrap();
        assert_eq!(out, [50.0, 3.0]);
        assert_eq!(arg_out, [3, 2]);
    }

    #[test]
    fn batches_and_lanes() {
        // 2 batches, 3 elements, 2 lanes
        #[rustfmt::skip]
        let src = [
            1.0, 2.0,   3.0, 4.0,   5.0, 6.0,
            7.0, 8.0,   9.0, 10.0,  11.0, 12.0,
        ];
        #[rustfmt::skip]
        let index = [
            0, 0, 1,
            1, 1, 1,
        ];
        let mut out = [0.0; 8];
        run(&Sum, &src, (2, 3, 2), &index, &[2, 3], &mut out, 2, None).unwrap();
        assert_eq!(out, [4.0, 6.0, 5.0, 6.0, 0.0, 0.0, 27.0, 30.0]);
    }

    #[test]
    fn broadcast_index() {
        #[rustfmt::skip]
        let src = [
            1.0, 2.0, 3.0,
            4.0, 5.0, 6.0,
        ];
        let index = [0, 1, 1];
        let mut out = [0.0; 4];
        run(&Sum, &src, (2, 3, 1), &index, &[1, 3], &mut out, 2, None).unwrap();
        assert_eq!(out, [1.0, 5.0, 4.0, 11.0]);
    }

    #[test]
    #[should_panic]
    fn unsorted_index() {
        let src = [1.0, 2.0, 3.0];
        let index = [1, 0, 1];
        let mut out = [0.0; 2];
        let _ = run(&Sum, &src, (1, 3, 1), &index, &[1, 3], &mut out, 2, None);
    }

    #[test]
    fn negative_index() {
        let src = [1.0, 2.0];
        let index = [-1, 0];
        let mut out = [0.0; 2];
        assert!(run(&Sum, &src, (1, 2, 1), &index, &[1, 2], &mut out, 2, None).is_err());
    }
}
