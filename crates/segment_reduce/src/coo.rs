//! Validates & launches segment reductions described by sorted group ids

use crate::Error;
use crate::misc::{standard_layout, view3, view3_mut};
use crate::reducers::forward_to_reducer;
use crate::validate::{
    Geometry, broadcast_target, check_index, check_out_shape, check_rank, standard_slice_mut,
};
use ndarray::{ArrayD, ArrayView3, ArrayViewD, ArrayViewMut3, ArrayViewMutD, IxDyn};
use segment_reduce_nostd_internal::{
    Element, IndexInfo, LaneStateViewMut, Max, Mean, Min, ReductionKind, Reducer, Sum, reduce_coo,
};

/// Fold `src` into the groups of `out` identified by `index`.
///
/// `out` is accumulated into (the existing contents seed every group that
/// `index` mentions). When `kind` tracks positions, they're returned in a
/// newly allocated array with the same shape as `out`.
pub(crate) fn exec_coo<T: Element>(
    kind: ReductionKind,
    src: ArrayViewD<T>,
    index: ArrayViewD<i64>,
    mut out: ArrayViewMutD<T>,
) -> Result<Option<ArrayD<i64>>, Error> {
    check_rank("index", index.ndim(), src.ndim())?;
    let reduce_dim = index.ndim() - 1;
    let index_target = broadcast_target("index", index.shape(), src.shape(), index.ndim())?;
    if out.ndim() != src.ndim() {
        return Err(Error::rank("out", out.ndim(), src.ndim(), src.ndim()));
    }

    let geometry = Geometry::new(src.shape(), reduce_dim);
    let n_groups = out.shape()[reduce_dim];
    let out_shape = geometry.out_shape(src.shape(), n_groups);
    check_out_shape(&out_shape, out.shape())?;
    check_index(&index, n_groups)?;
    let out_data = standard_slice_mut(&mut out)?;

    let Geometry {
        n_batch,
        n_elem,
        n_lanes,
        ..
    } = geometry;
    log::debug!(
        "segment_coo: reduce={}, B={n_batch}, E={n_elem}, K={n_lanes}, G={n_groups}, N={}",
        kind.name(),
        n_batch * n_groups
    );

    let src = standard_layout("src", src);
    let index = standard_layout("index", index);
    let src_data = src
        .as_slice()
        .ok_or_else(|| Error::internal_legacy_adhoc("src isn't contiguous"))?;
    let index_data = index
        .as_slice()
        .ok_or_else(|| Error::internal_legacy_adhoc("index isn't contiguous"))?;
    let index_info = IndexInfo::broadcast(index_data, index.shape(), &index_target)
        .map_err(Error::internal_legacy_adhoc)?;

    let sentinel = geometry.sentinel();
    let mut arg_out = if kind.has_arg() {
        log::trace!("allocating a position buffer with the shape {out_shape:?}");
        Some(ArrayD::from_elem(IxDyn(&out_shape), sentinel))
    } else {
        None
    };

    let src3 = view3(src_data, (n_batch, n_elem, n_lanes))?;
    let out3 = view3_mut(out_data, (n_batch, n_groups, n_lanes))?;
    let arg3 = match arg_out.as_mut() {
        Some(arr) => {
            let data = arr
                .as_slice_mut()
                .ok_or_else(|| Error::internal_legacy_adhoc("arg_out isn't contiguous"))?;
            Some(view3_mut(data, (n_batch, n_groups, n_lanes))?)
        }
        None => None,
    };

    forward_to_reducer!(kind; launch(src3, &index_info, out3, arg3, sentinel))?;
    Ok(arg_out)
}

fn launch<T: Element, R: Reducer<T>>(
    reducer: &R,
    src: ArrayView3<T>,
    index: &IndexInfo,
    out: ArrayViewMut3<T>,
    arg_out: Option<ArrayViewMut3<i64>>,
    sentinel: i64,
) -> Result<(), Error> {
    let n_lanes = src.dim().2;
    let mut vals = vec![reducer.init(); n_lanes];
    let mut args = vec![sentinel; n_lanes];
    let mut lanes = LaneStateViewMut::new(&mut vals, &mut args, sentinel)
        .map_err(Error::internal_legacy_adhoc)?;
    reduce_coo(reducer, src, index, out, arg_out, &mut lanes).map_err(Error::internal_legacy_adhoc)
}
