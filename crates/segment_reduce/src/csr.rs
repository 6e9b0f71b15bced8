//! Validates & launches segment reductions described by CSR offsets

use crate::Error;
use crate::misc::{standard_layout, view3, view3_mut};
use crate::reducers::forward_to_reducer;
use crate::validate::{
    Geometry, broadcast_target, check_indptr, check_out_shape, check_rank, standard_slice_mut,
};
use ndarray::{ArrayD, ArrayView3, ArrayViewD, ArrayViewMut3, ArrayViewMutD, CowArray, IxDyn};
use segment_reduce_nostd_internal::{
    Element, IndexInfo, LaneStateViewMut, Max, Mean, Min, ReductionKind, Reducer, Sum, reduce_csr,
};

/// A fully validated CSR problem.
///
/// Constructing one of these performs every check that doesn't involve the
/// output array.
pub(crate) struct CsrProblem<'s, 'i, T: Element> {
    src: CowArray<'s, T, IxDyn>,
    indptr: CowArray<'i, i64, IxDyn>,
    /// the shape that indptr is logically expanded to
    indptr_target: Vec<usize>,
    geometry: Geometry,
    n_groups: usize,
}

impl<'s, 'i, T: Element> CsrProblem<'s, 'i, T> {
    pub(crate) fn new(src: ArrayViewD<'s, T>, indptr: ArrayViewD<'i, i64>) -> Result<Self, Error> {
        check_rank("indptr", indptr.ndim(), src.ndim())?;
        let reduce_dim = indptr.ndim() - 1;
        let indptr_target = broadcast_target("indptr", indptr.shape(), src.shape(), reduce_dim)?;
        let geometry = Geometry::new(src.shape(), reduce_dim);

        let n_groups = match indptr.shape()[reduce_dim] {
            0 => {
                return Err(Error::segmentation(
                    "indptr",
                    0,
                    "the last axis must hold at least 1 boundary".to_owned(),
                ));
            }
            n_boundaries => n_boundaries - 1,
        };
        check_indptr(&indptr, geometry.n_elem)?;

        Ok(CsrProblem {
            src: standard_layout("src", src),
            indptr: standard_layout("indptr", indptr),
            indptr_target,
            geometry,
            n_groups,
        })
    }

    /// the shape of the output array
    pub(crate) fn out_shape(&self) -> Vec<usize> {
        self.geometry.out_shape(self.src.shape(), self.n_groups)
    }

    /// Overwrite `out` with the result of the reduction.
    ///
    /// When `kind` tracks positions, the positions are returned in a newly
    /// allocated array with the same shape as `out`.
    pub(crate) fn exec(
        &self,
        kind: ReductionKind,
        mut out: ArrayViewMutD<T>,
    ) -> Result<Option<ArrayD<i64>>, Error> {
        let out_shape = self.out_shape();
        check_out_shape(&out_shape, out.shape())?;
        let out_data = standard_slice_mut(&mut out)?;

        let Geometry {
            n_batch,
            n_elem,
            n_lanes,
            ..
        } = self.geometry;
        let n_groups = self.n_groups;
        log::debug!(
            "segment_csr: reduce={}, B={n_batch}, E={n_elem}, K={n_lanes}, G={n_groups}, N={}",
            kind.name(),
            n_batch * n_groups
        );

        let src_data = self
            .src
            .as_slice()
            .ok_or_else(|| Error::internal_legacy_adhoc("src isn't contiguous"))?;
        let indptr_data = self
            .indptr
            .as_slice()
            .ok_or_else(|| Error::internal_legacy_adhoc("indptr isn't contiguous"))?;
        let indptr_info = IndexInfo::broadcast(indptr_data, self.indptr.shape(), &self.indptr_target)
            .map_err(Error::internal_legacy_adhoc)?;

        let sentinel = self.geometry.sentinel();
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

        forward_to_reducer!(kind; launch(src3, &indptr_info, out3, arg3, sentinel))?;
        Ok(arg_out)
    }
}

fn launch<T: Element, R: Reducer<T>>(
    reducer: &R,
    src: ArrayView3<T>,
    indptr: &IndexInfo,
    out: ArrayViewMut3<T>,
    arg_out: Option<ArrayViewMut3<i64>>,
    sentinel: i64,
) -> Result<(), Error> {
    let n_lanes = src.dim().2;
    let mut vals = vec![reducer.init(); n_lanes];
    let mut args = vec![sentinel; n_lanes];
    let mut lanes = LaneStateViewMut::new(&mut vals, &mut args, sentinel)
        .map_err(Error::internal_legacy_adhoc)?;
    reduce_csr(reducer, src, indptr, out, arg_out, &mut lanes).map_err(Error::internal_legacy_adhoc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};

    #[test]
    fn out_shape() {
        let src = Array2::<f64>::zeros((3, 10));
        let indptr: Array2<i64> = array![[0, 2, 10]];
        let problem = CsrProblem::new(src.view().into_dyn(), indptr.view().into_dyn()).unwrap();
        assert_eq!(problem.out_shape(), vec![3, 2]);

        // a 1D indptr reduces along the first axis
        let indptr: Array1<i64> = array![0, 1, 2, 3];
        let problem = CsrProblem::new(src.view().into_dyn(), indptr.view().into_dyn()).unwrap();
        assert_eq!(problem.out_shape(), vec![3, 10]);
    }

    #[test]
    fn independent_borrows() {
        let src: Array2<f64> = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let out_shape = {
            // indptr doesn't outlive this block, but src does
            let indptr: Array1<i64> = array![0, 2];
            let problem = CsrProblem::new(src.view().into_dyn(), indptr.view().into_dyn()).unwrap();
            let mut out = Array2::<f64>::zeros((1, 3));
            problem.exec(ReductionKind::Sum, out.view_mut().into_dyn()).unwrap();
            assert_eq!(out, array![[5.0, 7.0, 9.0]]);
            problem.out_shape()
        };
        assert_eq!(out_shape, vec![1, 3]);
    }

    #[test]
    fn empty_indptr() {
        let src = Array1::<f64>::zeros(4);
        let indptr = Array1::<i64>::zeros(0);
        assert!(CsrProblem::new(src.view().into_dyn(), indptr.view().into_dyn()).is_err());
    }

    #[test]
    fn non_standard_out() {
        let src: Array2<f64> = array![[1.0, 2.0], [3.0, 4.0]];
        let indptr: Array2<i64> = array![[0, 1, 2]];
        let problem = CsrProblem::new(src.view().into_dyn(), indptr.view().into_dyn()).unwrap();

        let mut out = Array2::<f64>::zeros((2, 2));
        let err = problem.exec(ReductionKind::Sum, out.view_mut().reversed_axes().into_dyn());
        assert!(err.is_err());
        // nothing was written
        assert_eq!(out, Array2::<f64>::zeros((2, 2)));
    }
}
