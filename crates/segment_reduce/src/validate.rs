//! Argument checks shared by the CSR & COO entry points
//!
//! Everything in this module runs before a kernel is launched. If any of
//! these checks fail, none of the caller's buffers are touched.

use crate::Error;
use ndarray::{ArrayViewD, ArrayViewMutD, Axis};
use segment_reduce_nostd_internal::{Element, MAX_DIMS};

/// Describes how a source array is viewed by the kernels: as a 3D array with
/// the shape `(n_batch, n_elem, n_lanes)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub(crate) reduce_dim: usize,
    /// the product of the extents of the axes preceding the reduction dim
    pub(crate) n_batch: usize,
    /// the extent of the reduction dimension
    pub(crate) n_elem: usize,
    /// the product of the extents of the axes following the reduction dim
    pub(crate) n_lanes: usize,
}

impl Geometry {
    pub(crate) fn new(src_shape: &[usize], reduce_dim: usize) -> Self {
        Geometry {
            reduce_dim,
            n_batch: src_shape[..reduce_dim].iter().product(),
            n_elem: src_shape[reduce_dim],
            n_lanes: src_shape[reduce_dim + 1..].iter().product(),
        }
    }

    /// the shape of an output array holding `n_groups` groups
    pub(crate) fn out_shape(&self, src_shape: &[usize], n_groups: usize) -> Vec<usize> {
        let mut shape = src_shape.to_vec();
        shape[self.reduce_dim] = n_groups;
        shape
    }

    /// the sentinel position, used to indicate that no element contributed
    pub(crate) fn sentinel(&self) -> i64 {
        self.n_elem as i64
    }
}

/// check that a segmentation descriptor, called `who`, has an acceptable
/// number of dimensions relative to the source array
pub(crate) fn check_rank(who: &'static str, descr_ndim: usize, src_ndim: usize) -> Result<(), Error> {
    if src_ndim > MAX_DIMS {
        Err(Error::rank("src", src_ndim, 1, MAX_DIMS))
    } else if descr_ndim == 0 || descr_ndim > src_ndim {
        Err(Error::rank(who, descr_ndim, 1, src_ndim))
    } else {
        Ok(())
    }
}

/// Computes the shape that a segmentation descriptor, called `who`, is
/// logically expanded to. The first `n_axes` axes are expanded to match
/// `src_shape`, while the remaining axis keeps its length.
///
/// Returns an error if any expanded axis has a length other than 1 or the
/// corresponding length of `src_shape`.
pub(crate) fn broadcast_target(
    who: &'static str,
    descr_shape: &[usize],
    src_shape: &[usize],
    n_axes: usize,
) -> Result<Vec<usize>, Error> {
    let mut target = descr_shape.to_vec();
    for axis in 0..n_axes {
        let (actual, expected) = (descr_shape[axis], src_shape[axis]);
        if actual != 1 && actual != expected {
            return Err(Error::broadcast(who, axis, actual, expected));
        }
        target[axis] = expected;
    }
    Ok(target)
}

/// check that a caller-supplied output array has the expected shape
pub(crate) fn check_out_shape(expected: &[usize], actual: &[usize]) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::output_shape(expected.to_vec(), actual.to_vec()))
    }
}

/// get the contiguous storage of a caller-supplied output array
pub(crate) fn standard_slice_mut<'a, T: Element>(
    out: &'a mut ArrayViewMutD<'_, T>,
) -> Result<&'a mut [T], Error> {
    out.as_slice_mut().ok_or_else(|| Error::layout("out"))
}

/// check that every row of CSR offsets is well-formed:
/// - the first boundary is non-negative
/// - the boundaries never decrease
/// - the last boundary doesn't exceed `n_elem`
pub(crate) fn check_indptr(indptr: &ArrayViewD<i64>, n_elem: usize) -> Result<(), Error> {
    let last_axis = Axis(indptr.ndim() - 1);
    for (i, row) in indptr.lanes(last_axis).into_iter().enumerate() {
        let (Some(&first), Some(&last)) = (row.first(), row.last()) else {
            continue;
        };
        if first < 0 {
            return Err(Error::segmentation(
                "indptr",
                i,
                format!("the first boundary, {first}, is negative"),
            ));
        } else if last > n_elem as i64 {
            return Err(Error::segmentation(
                "indptr",
                i,
                format!(
                    "the last boundary, {last}, exceeds the length of the \
                     reduction dimension, {n_elem}"
                ),
            ));
        }
        for (j, pair) in row.windows(2).into_iter().enumerate() {
            if pair[1] < pair[0] {
                return Err(Error::segmentation(
                    "indptr",
                    i,
                    format!(
                        "boundaries must be non-decreasing ({} at position \
                         {j} is followed by {})",
                        pair[0], pair[1]
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// check that every row of COO group ids is well-formed:
/// - every id lies in `[0, n_groups)`
/// - the ids never decrease
pub(crate) fn check_index(index: &ArrayViewD<i64>, n_groups: usize) -> Result<(), Error> {
    let last_axis = Axis(index.ndim() - 1);
    for (i, row) in index.lanes(last_axis).into_iter().enumerate() {
        let mut prev = 0;
        for (j, &id) in row.iter().enumerate() {
            if id < 0 || id >= n_groups as i64 {
                return Err(Error::segmentation(
                    "index",
                    i,
                    format!(
                        "the group id at position {j}, {id}, doesn't lie in \
                         the range [0, {n_groups})"
                    ),
                ));
            } else if id < prev {
                return Err(Error::segmentation(
                    "index",
                    i,
                    format!(
                        "group ids must be sorted ({prev} is followed by {id} \
                         at position {j})"
                    ),
                ));
            }
            prev = id;
        }
    }
    Ok(())
}
