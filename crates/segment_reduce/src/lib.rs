/*!
Provides segmented reductions: the elements of an array are partitioned into
contiguous groups along a single axis (the reduction dimension) and each group
is reduced to a single value with a sum, mean, min or max.

# User Guide

There are 2 ways to describe the groups:
- **CSR offsets** (`indptr`): group `g` owns the elements whose positions lie
  in `[indptr[..., g], indptr[..., g + 1])`. See [`segment_csr`] and
  [`segment_csr_into`].
- **sorted group ids** (`index`): every element is labelled with the id of the
  group it belongs to. The ids must be non-decreasing along the reduction
  dimension. See [`segment_coo`].

In both cases, the reduction dimension is `descr.ndim() - 1`, where `descr`
is the segmentation descriptor. The axes of `src` preceding the reduction
dimension are batch axes, each reduced independently, while the axes following
it are carried along unchanged. A descriptor axis of length 1 is broadcast
over the corresponding axis of `src`.

For min & max, the position (along the reduction dimension) of the extreme
value is also returned. When a group doesn't have any elements, the position
holds a sentinel: the length of the reduction dimension.

```
use ndarray::array;
use segment_reduce::segment_csr;

let src = array![1.0, 2.0, 3.0, 4.0, 5.0];
let indptr = array![0_i64, 2, 2, 5];
let (out, arg_out) = segment_csr(src.view(), indptr.view(), "max").unwrap();
assert_eq!(out.as_slice().unwrap(), &[2.0, 0.0, 5.0]);
assert_eq!(arg_out.unwrap().as_slice().unwrap(), &[1, 5, 4]);
```

The group-id form accumulates into a caller-supplied output, so it can be
called repeatedly on consecutive chunks of a source array.

```
use ndarray::{Array1, array};
use segment_reduce::{fill_init, segment_coo};

let mut out = Array1::<f64>::zeros(3);
fill_init(out.view_mut(), "min").unwrap();
let src = array![4.0, 5.0, 1.0, 9.0];
let index = array![0_i64, 0, 2, 2];
segment_coo(src.view(), index.view(), out.view_mut(), "min").unwrap();
assert_eq!(out[0], 4.0);
assert_eq!(out[2], 1.0);
```

# Developer Guide

See the crate-level documentation for [`segment_reduce_nostd_internal`].

*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
mod config;
mod coo;
mod csr;
mod error;
mod misc;
mod reducers;
mod validate;

// pull in symbols that are visible outside of the package
pub use config::{
    SegmentOutput, SegmentReduce, SegmentReduceBuilder, fill_init, segment_coo, segment_csr,
    segment_csr_into,
};
pub use error::Error;
pub use segment_reduce_nostd_internal::{Element, MAX_DIMS, ReductionKind};
