use crate::Error;
use ndarray::{ArrayView, ArrayView3, ArrayViewMut3, CowArray, Dimension};

/// Returns a view of `view` with a standard (row-major contiguous) layout,
/// which only involves a copy when `view` doesn't already have that layout.
pub(crate) fn standard_layout<'a, A: Clone, D: Dimension>(
    who: &'static str,
    view: ArrayView<'a, A, D>,
) -> CowArray<'a, A, D> {
    if view.is_standard_layout() {
        CowArray::from(view)
    } else {
        log::trace!("copying {who} ({:?}) into a standard layout", view.shape());
        CowArray::from(view.as_standard_layout().into_owned())
    }
}

/// wraps contiguous storage in the 3D view that the kernels operate on
pub(crate) fn view3<A>(data: &[A], dim: (usize, usize, usize)) -> Result<ArrayView3<'_, A>, Error> {
    ArrayView3::from_shape(dim, data)
        .map_err(|_| Error::internal_legacy_adhoc("can't construct a 3D view of a buffer"))
}

/// the mutable counterpart to [`view3`]
pub(crate) fn view3_mut<A>(
    data: &mut [A],
    dim: (usize, usize, usize),
) -> Result<ArrayViewMut3<'_, A>, Error> {
    ArrayViewMut3::from_shape(dim, data)
        .map_err(|_| Error::internal_legacy_adhoc("can't construct a 3D view of a buffer"))
}
