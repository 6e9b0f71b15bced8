//! The configuration object & the free functions wrapping it

use crate::Error;
use crate::coo::exec_coo;
use crate::csr::CsrProblem;
use crate::reducers::kind_from_name;
use ndarray::{ArrayD, ArrayView, ArrayViewMut, Dimension, IxDyn};
use segment_reduce_nostd_internal::{Element, ReductionKind};

/// The output of a CSR segment reduction: the reduced values and, for the
/// reductions that track positions, the position of every extreme value.
pub type SegmentOutput<T> = (ArrayD<T>, Option<ArrayD<i64>>);

/// Used to construct a [`SegmentReduce`].
///
/// ```
/// use segment_reduce::SegmentReduceBuilder;
/// let op = SegmentReduceBuilder::new().reduce("max").build().unwrap();
/// assert_eq!(op.kind().name(), "max");
/// ```
#[derive(Clone, Debug, Default)]
pub struct SegmentReduceBuilder {
    reduce: Option<String>,
}

impl SegmentReduceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// specify the reduction by name. When this is never called, the builder
    /// produces a sum.
    pub fn reduce(mut self, name: &str) -> Self {
        self.reduce = Some(name.to_owned());
        self
    }

    pub fn build(&self) -> Result<SegmentReduce, Error> {
        let kind = match self.reduce {
            Some(ref name) => kind_from_name(name)?,
            None => ReductionKind::Sum,
        };
        Ok(SegmentReduce::new(kind))
    }
}

/// A segment reduction with a fixed [`ReductionKind`].
///
/// The reduction dimension is implied by the segmentation descriptor: it's
/// `descr.ndim() - 1`. Every axis of the descriptor preceding the reduction
/// dimension (and, for group ids, the reduction dimension itself) must either
/// have a length of 1, in which case it's broadcast, or match the length of
/// the corresponding axis of `src`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentReduce {
    kind: ReductionKind,
}

impl SegmentReduce {
    pub fn new(kind: ReductionKind) -> Self {
        SegmentReduce { kind }
    }

    pub fn kind(&self) -> ReductionKind {
        self.kind
    }

    /// Reduce the groups of `src` delimited by the offsets in `indptr`.
    ///
    /// Group `g` owns the elements in `[indptr[..., g], indptr[..., g + 1])`
    /// along the reduction dimension. The output has the shape of `src`,
    /// except that the reduction dimension holds `indptr.shape()[-1] - 1`
    /// groups. Empty groups produce 0 (and the sentinel position, which is the
    /// length of the reduction dimension).
    pub fn csr<T, D1, D2>(
        &self,
        src: ArrayView<T, D1>,
        indptr: ArrayView<i64, D2>,
    ) -> Result<SegmentOutput<T>, Error>
    where
        T: Element,
        D1: Dimension,
        D2: Dimension,
    {
        let problem = CsrProblem::new(src.into_dyn(), indptr.into_dyn())?;
        let out_shape = problem.out_shape();
        log::trace!("allocating an output buffer with the shape {out_shape:?}");
        let mut out = ArrayD::zeros(IxDyn(&out_shape));
        let arg_out = problem.exec(self.kind, out.view_mut())?;
        Ok((out, arg_out))
    }

    /// Like [`SegmentReduce::csr`], but the values are written to `out`,
    /// which must already have the right shape and a standard layout.
    ///
    /// Every entry of `out` is overwritten. Nothing is written when an error
    /// is returned.
    pub fn csr_into<T, D1, D2, D3>(
        &self,
        src: ArrayView<T, D1>,
        indptr: ArrayView<i64, D2>,
        out: ArrayViewMut<T, D3>,
    ) -> Result<Option<ArrayD<i64>>, Error>
    where
        T: Element,
        D1: Dimension,
        D2: Dimension,
        D3: Dimension,
    {
        let problem = CsrProblem::new(src.into_dyn(), indptr.into_dyn())?;
        problem.exec(self.kind, out.into_dyn())
    }

    /// Fold the elements of `src` into the groups of `out` labelled by the
    /// sorted group ids in `index`.
    ///
    /// `out` must have the shape of `src`, except along the reduction
    /// dimension, where its length sets the number of groups. The existing
    /// contents of `out` seed each group that `index` mentions (other groups
    /// are untouched). Use [`SegmentReduce::fill_init`] to prepare `out` for
    /// a fresh min or max.
    ///
    /// The returned positions refer to this call's `src`. A group whose seed
    /// was never beaten reports the sentinel (the length of the reduction
    /// dimension).
    pub fn coo<T, D1, D2, D3>(
        &self,
        src: ArrayView<T, D1>,
        index: ArrayView<i64, D2>,
        out: ArrayViewMut<T, D3>,
    ) -> Result<Option<ArrayD<i64>>, Error>
    where
        T: Element,
        D1: Dimension,
        D2: Dimension,
        D3: Dimension,
    {
        exec_coo(self.kind, src.into_dyn(), index.into_dyn(), out.into_dyn())
    }

    /// Fill `out` with the initial accumulator value of the reduction
    pub fn fill_init<T: Element, D: Dimension>(&self, mut out: ArrayViewMut<T, D>) {
        out.fill(self.kind.init());
    }
}

/// Reduce the groups of `src` delimited by `indptr` with the reduction named
/// `reduce`.
///
/// See [`SegmentReduce::csr`] for details.
pub fn segment_csr<T, D1, D2>(
    src: ArrayView<T, D1>,
    indptr: ArrayView<i64, D2>,
    reduce: &str,
) -> Result<SegmentOutput<T>, Error>
where
    T: Element,
    D1: Dimension,
    D2: Dimension,
{
    SegmentReduceBuilder::new()
        .reduce(reduce)
        .build()?
        .csr(src, indptr)
}

/// See [`SegmentReduce::csr_into`].
pub fn segment_csr_into<T, D1, D2, D3>(
    src: ArrayView<T, D1>,
    indptr: ArrayView<i64, D2>,
    out: ArrayViewMut<T, D3>,
    reduce: &str,
) -> Result<Option<ArrayD<i64>>, Error>
where
    T: Element,
    D1: Dimension,
    D2: Dimension,
    D3: Dimension,
{
    SegmentReduceBuilder::new()
        .reduce(reduce)
        .build()?
        .csr_into(src, indptr, out)
}

/// Fold `src` into the groups of `out` labelled by `index` with the reduction
/// named `reduce`.
///
/// See [`SegmentReduce::coo`] for details.
pub fn segment_coo<T, D1, D2, D3>(
    src: ArrayView<T, D1>,
    index: ArrayView<i64, D2>,
    out: ArrayViewMut<T, D3>,
    reduce: &str,
) -> Result<Option<ArrayD<i64>>, Error>
where
    T: Element,
    D1: Dimension,
    D2: Dimension,
    D3: Dimension,
{
    SegmentReduceBuilder::new()
        .reduce(reduce)
        .build()?
        .coo(src, index, out)
}

/// Fill `out` with the initial accumulator value of the reduction named
/// `reduce`.
pub fn fill_init<T: Element, D: Dimension>(
    out: ArrayViewMut<T, D>,
    reduce: &str,
) -> Result<(), Error> {
    SegmentReduceBuilder::new()
        .reduce(reduce)
        .build()?
        .fill_init(out);
    Ok(())
}
