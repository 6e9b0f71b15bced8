//! Index/Offset addressing for the (possibly broadcast) integer arrays that
//! describe a segmentation.
//!
//! Both kinds of segmentation descriptors (CSR offsets & COO group ids) are
//! logically expanded to match the leading axes of the source array. Rather
//! than materializing the expanded array, we describe it with a shape and a
//! set of strides, where every broadcast axis has a stride of 0. The helpers
//! in this module map a flat logical coordinate to an offset into the
//! underlying storage.
//!
//! The kernels repeatedly need to read the *next* value along the last axis.
//! Rather than decomposing a fresh flat coordinate every time, they compute
//! the offset of the first value once and then [`IndexInfo::step`] along the
//! last axis.

/// The maximum number of dimensions that an [`IndexInfo`] can describe.
///
/// We need some upper bound since we don't allocate (this matches the limit
/// that most tensor frameworks impose).
pub const MAX_DIMS: usize = 25;

/// Map the flat (row-major) coordinate, `linear`, of an array with the
/// specified `shape` and `strides` to an offset into its storage.
///
/// Every entry of `strides` is measured in elements.
pub fn linear_to_offset(linear: usize, shape: &[usize], strides: &[usize]) -> usize {
    debug_assert_eq!(shape.len(), strides.len());
    let mut remaining = linear;
    let mut offset = 0;
    for (&len, &stride) in shape.iter().zip(strides.iter()).rev() {
        // length 0 axes can't show up here unless linear is out of bounds
        let cur = remaining % len;
        remaining /= len;
        offset += cur * stride;
    }
    offset
}

/// A variant of [`linear_to_offset`] for CSR offset arrays.
///
/// When the last axis holds `G + 1` boundaries, it describes `G` groups.
/// Here, `linear` enumerates groups rather than elements: we treat the last
/// axis as though it had `shape[last] - 1` entries. The returned offset
/// refers to the boundary at the start of the group (the end boundary is one
/// step further along the last axis).
pub fn ptr_linear_to_offset(linear: usize, shape: &[usize], strides: &[usize]) -> usize {
    debug_assert_eq!(shape.len(), strides.len());
    let (Some((&last_len, leading_shape)), Some((&last_stride, leading_strides))) =
        (shape.split_last(), strides.split_last())
    else {
        return 0;
    };
    let n_groups = last_len - 1;
    let group = linear % n_groups;
    group * last_stride + linear_to_offset(linear / n_groups, leading_shape, leading_strides)
}

/// Describes a read-only, possibly broadcast, `i64` array.
///
/// The underlying storage, `data`, must be a contiguous row-major array. The
/// logical (broadcast) shape and the strides are tracked separately.
#[derive(Clone, Debug)]
pub struct IndexInfo<'a> {
    data: &'a [i64],
    shape: [usize; MAX_DIMS],
    strides: [usize; MAX_DIMS],
    dims: usize,
}

impl<'a> IndexInfo<'a> {
    /// Describe the row-major array, `data`, with the shape `data_shape`, as
    /// though it were expanded to `target_shape`.
    ///
    /// Each axis of `data_shape` must either match the corresponding axis of
    /// `target_shape` or have a length of 1 (in which case it is repeated).
    pub fn broadcast(
        data: &'a [i64],
        data_shape: &[usize],
        target_shape: &[usize],
    ) -> Result<IndexInfo<'a>, &'static str> {
        let dims = data_shape.len();
        if dims == 0 {
            Err("an index array must have at least 1 dimension")
        } else if dims > MAX_DIMS {
            Err("an index array can't have more than MAX_DIMS dimensions")
        } else if target_shape.len() != dims {
            Err("the target shape of an index array must have the same number of dimensions")
        } else if data.len() != data_shape.iter().product::<usize>() {
            Err("the length of an index array is inconsistent with its shape")
        } else {
            let mut shape = [0; MAX_DIMS];
            let mut strides = [0; MAX_DIMS];
            let mut contiguous_stride = 1;
            for i in (0..dims).rev() {
                if data_shape[i] == target_shape[i] {
                    strides[i] = contiguous_stride;
                } else if data_shape[i] == 1 {
                    strides[i] = 0;
                } else {
                    return Err("an index array can't be broadcast to the target shape");
                }
                shape[i] = target_shape[i];
                contiguous_stride *= data_shape[i];
            }
            Ok(IndexInfo {
                data,
                shape,
                strides,
                dims,
            })
        }
    }

    /// Describe a row-major array without any broadcasting
    pub fn contiguous(data: &'a [i64], shape: &[usize]) -> Result<IndexInfo<'a>, &'static str> {
        Self::broadcast(data, shape, shape)
    }

    /// the logical (broadcast) shape
    pub fn shape(&self) -> &[usize] {
        &self.shape[..self.dims]
    }

    /// the per-axis strides (in elements)
    pub fn strides(&self) -> &[usize] {
        &self.strides[..self.dims]
    }

    /// the stride along the last axis
    #[inline]
    pub fn last_stride(&self) -> usize {
        self.strides[self.dims - 1]
    }

    /// the number of logical elements
    pub fn numel(&self) -> usize {
        self.shape().iter().product()
    }

    /// The offset of the element with the flat logical coordinate `linear`
    #[inline]
    pub fn offset(&self, linear: usize) -> usize {
        linear_to_offset(linear, self.shape(), self.strides())
    }

    /// The offset of the start-boundary of the group enumerated by `linear`
    /// (see [`ptr_linear_to_offset`])
    #[inline]
    pub fn ptr_offset(&self, linear: usize) -> usize {
        ptr_linear_to_offset(linear, self.shape(), self.strides())
    }

    /// advance `offset` by `n` positions along the last axis
    #[inline(always)]
    pub fn step(&self, offset: usize, n: usize) -> usize {
        offset + n * self.last_stride()
    }

    /// read the value stored at `offset`
    #[inline(always)]
    pub fn get(&self, offset: usize) -> i64 {
        self.data[offset]
    }
}
