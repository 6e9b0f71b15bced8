//! Implements the segment reduction kernel for CSR-style segmentation (group
//! boundaries given by an array of offsets).
//!
//! # Layout
//!
//! The kernel works with a 3D view of every buffer:
//! - `src` has the shape `(B, E, K)`, where `B` is the number of independent
//!   batches (the product of the extents of the axes preceding the reduction
//!   dimension), `E` is the extent of the reduction dimension and `K` is the
//!   number of lanes (the product of the extents of the trailing axes).
//! - `out` has the shape `(B, G, K)`, where `G` is the number of groups.
//! - `indptr` is logically shaped like `src`'s leading axes followed by an
//!   axis holding `G + 1` boundaries (it is usually broadcast).
//!
//! Group `g` of batch `b` owns the source elements in the half-open range
//! `[indptr[b, g], indptr[b, g + 1])`. Each source element is visited once.

use crate::element::Element;
use crate::index_info::IndexInfo;
use crate::reducer::Reducer;
use crate::state::LaneStateViewMut;
use ndarray::{ArrayView3, ArrayViewMut3, Axis, s};

/// Reduce every group described by `indptr` and overwrite the associated
/// entries of `out` (and `arg_out`, when provided).
///
/// `lanes` provides scratch space for the accumulators. It must be `K` lanes
/// wide.
///
/// # Preconditions
/// Every row of `indptr` must be non-decreasing, the first boundary must be
/// non-negative and the last boundary must not exceed `E`. We don't check this
/// within the loop. A violation produces an out-of-bounds panic or
/// meaningless output.
pub fn reduce_csr<T: Element, R: Reducer<T>>(
    reducer: &R,
    src: ArrayView3<T>,
    indptr: &IndexInfo,
    mut out: ArrayViewMut3<T>,
    mut arg_out: Option<ArrayViewMut3<i64>>,
    lanes: &mut LaneStateViewMut<T>,
) -> Result<(), &'static str> {
    let (n_batch, _, n_lanes) = src.dim();
    let n_groups = out.len_of(Axis(1));

    if out.len_of(Axis(0)) != n_batch || out.len_of(Axis(2)) != n_lanes {
        return Err("out must have the same batch & lane extents as src");
    } else if arg_out.as_ref().is_some_and(|a| a.dim() != out.dim()) {
        return Err("arg_out must have the same shape as out");
    } else if lanes.n_lanes() != n_lanes {
        return Err("the scratch buffers must have an entry per lane");
    } else if indptr.shape().last() != Some(&(n_groups + 1)) {
        return Err("the last axis of indptr must hold n_groups + 1 entries");
    } else if indptr.numel() != n_batch * (n_groups + 1) {
        return Err("indptr must describe a row of boundaries for each batch");
    }

    for n in 0..(n_batch * n_groups) {
        let (b, g) = (n / n_groups, n % n_groups);

        let offset = indptr.ptr_offset(n);
        let row_start = to_position(indptr.get(offset))?;
        let row_end = to_position(indptr.get(indptr.step(offset, 1)))?;

        if row_start < row_end {
            // the first element always wins, so a non-empty group never
            // reports the sentinel
            lanes.start(src.slice(s![b, row_start, ..]), row_start as i64);
            for e in (row_start + 1)..row_end {
                lanes.consume(reducer, src.slice(s![b, e, ..]), e as i64);
            }
        } else {
            lanes.reset(reducer);
        }

        lanes.write(
            reducer,
            out.slice_mut(s![b, g, ..]),
            arg_out.as_mut().map(|a| a.slice_mut(s![b, g, ..])),
            row_end.saturating_sub(row_start),
        );
    }
    Ok(())
}

#[inline(always)]
fn to_position(boundary: i64) -> Result<usize, &'static str> {
    usize::try_from(boundary).map_err(|_| "indptr holds a negative boundary")
}
