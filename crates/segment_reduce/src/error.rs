// We define a single public Error type that wraps a private ErrorKind.
//
// The kernel crate (`segment_reduce_nostd_internal`) returns `&'static str`
// for the handful of checks it performs. Nearly all of those checks are
// repeated (with better messages) by the validation performed in this crate
// before a kernel is ever launched. Thus, if one of those strings reaches a
// user, it's probably a sign of a bug in our validation logic.

use segment_reduce_nostd_internal::ReductionKind;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error that occurs when an array can't be broadcast to match the
    /// source array
    Broadcast(BroadcastError),
    /// An error that occurs within `segment_reduce_nostd_internal`
    InternalLegacyAdHoc(InternalLegacyAdHocError),
    /// An error that occurs when an output array isn't in standard layout
    Layout(LayoutError),
    /// An error that occurs when a supplied output array has the wrong shape
    OutputShape(OutputShapeError),
    /// An error that occurs when arrays have incompatible dimensionality
    Rank(RankError),
    /// An error that occurs when an unknown reducer name is specified
    ReducerName(ReducerNameError),
    /// An error that occurs when a segmentation descriptor (CSR offsets or
    /// COO group ids) is malformed
    Segmentation(SegmentationError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that axis `axis` of the array called `who`
    /// can't be broadcast to the corresponding axis of the source array
    pub(crate) fn broadcast(who: &'static str, axis: usize, actual: usize, expected: usize) -> Self {
        Error {
            kind: ErrorKind::Broadcast(BroadcastError {
                who,
                axis,
                actual,
                expected,
            }),
        }
    }

    /// wraps a legacy internal error string
    pub(crate) fn internal_legacy_adhoc(message: &'static str) -> Self {
        Error {
            kind: ErrorKind::InternalLegacyAdHoc(InternalLegacyAdHocError(message)),
        }
    }

    /// produce an error indicating that an output array must be contiguous
    /// with a standard (row-major) layout
    pub(crate) fn layout(who: &'static str) -> Self {
        Error {
            kind: ErrorKind::Layout(LayoutError { who }),
        }
    }

    /// produce an error indicating that a supplied output array has the
    /// wrong shape
    pub(crate) fn output_shape(expected: Vec<usize>, actual: Vec<usize>) -> Self {
        Error {
            kind: ErrorKind::OutputShape(OutputShapeError { expected, actual }),
        }
    }

    /// produce an error indicating that the array called `who` has `actual`
    /// dimensions, which lies outside of the acceptable range
    pub(crate) fn rank(who: &'static str, actual: usize, min_val: usize, max_val: usize) -> Self {
        Error {
            kind: ErrorKind::Rank(RankError {
                who,
                actual,
                min_val,
                max_val,
            }),
        }
    }

    /// produce an error indicating that an unknown reducer name was specified
    pub(crate) fn reducer_name(actual: String) -> Self {
        Error {
            kind: ErrorKind::ReducerName(ReducerNameError {
                actual,
                choices: ReductionKind::NAMES,
            }),
        }
    }

    /// produce an error indicating that a segmentation descriptor is
    /// malformed. `row` is the flat index of the offending row (the row that
    /// holds the boundaries or group ids of a single batch)
    pub(crate) fn segmentation(who: &'static str, row: usize, what: String) -> Self {
        Error {
            kind: ErrorKind::Segmentation(SegmentationError { who, row, what }),
        }
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ErrorKind {}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::Broadcast(ref err) => err.fmt(f),
            ErrorKind::InternalLegacyAdHoc(ref msg) => msg.fmt(f),
            ErrorKind::Layout(ref err) => err.fmt(f),
            ErrorKind::OutputShape(ref err) => err.fmt(f),
            ErrorKind::Rank(ref err) => err.fmt(f),
            ErrorKind::ReducerName(ref err) => err.fmt(f),
            ErrorKind::Segmentation(ref err) => err.fmt(f),
        }
    }
}

/// An error that occurs when an array can't be broadcast to match the source
/// array
#[derive(Clone, Debug)]
struct BroadcastError {
    who: &'static str,
    axis: usize,
    actual: usize,
    expected: usize,
}

impl std::error::Error for BroadcastError {}

impl core::fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "axis {} of {} has a length of {}. It must be 1 or match the \
             length of src along that axis, {}",
            self.axis, self.who, self.actual, self.expected
        )
    }
}

/// A temporary type that wraps the string errors from
/// `segment_reduce_nostd_internal`.
#[derive(Clone)]
struct InternalLegacyAdHocError(&'static str);

impl std::error::Error for InternalLegacyAdHocError {}

impl core::fmt::Display for InternalLegacyAdHocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::fmt::Debug for InternalLegacyAdHocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.0, f)
    }
}

/// An error that occurs when an output array isn't in standard layout
#[derive(Clone, Debug)]
struct LayoutError {
    who: &'static str,
}

impl std::error::Error for LayoutError {}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} must be contiguous, with a standard (row-major) layout",
            self.who
        )
    }
}

/// An error that occurs when a supplied output array has the wrong shape
#[derive(Clone, Debug)]
struct OutputShapeError {
    expected: Vec<usize>,
    actual: Vec<usize>,
}

impl std::error::Error for OutputShapeError {}

impl core::fmt::Display for OutputShapeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "out has the shape {:?}. It should have the shape {:?}",
            self.actual, self.expected
        )
    }
}

/// An error that occurs when an array's dimensionality lies outside of the
/// acceptable range
#[derive(Clone, Debug)]
struct RankError {
    who: &'static str,
    actual: usize,
    min_val: usize,
    max_val: usize,
}

impl std::error::Error for RankError {}

impl core::fmt::Display for RankError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has {} dimensions. The number of dimensions should be no \
             less than {} and not exceed {}",
            self.who, self.actual, self.min_val, self.max_val
        )
    }
}

/// An error occurs when an unknown reducer name is specified
#[derive(Clone, Debug)]
struct ReducerNameError {
    actual: String,
    choices: &'static [&'static str],
}

impl std::error::Error for ReducerNameError {}

impl core::fmt::Display for ReducerNameError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} is not a reducer name. Choices include: {:?}",
            self.actual, self.choices
        )
    }
}

/// An error that occurs when a segmentation descriptor is malformed
#[derive(Clone, Debug)]
struct SegmentationError {
    who: &'static str,
    row: usize,
    what: String,
}

impl std::error::Error for SegmentationError {}

impl core::fmt::Display for SegmentationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let who = self.who;
        let row = self.row;
        let what = self.what.as_str();
        write!(f, "problem with row {row} of {who}: {what}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = Error::reducer_name("prod".to_owned());
        assert_eq!(
            err.to_string(),
            "prod is not a reducer name. Choices include: \
             [\"sum\", \"add\", \"mean\", \"min\", \"max\"]"
        );

        let err = Error::segmentation("indptr", 2, "boundaries decrease".to_owned());
        assert_eq!(
            err.to_string(),
            "problem with row 2 of indptr: boundaries decrease"
        );

        let err = Error::output_shape(vec![2, 3], vec![2, 4]);
        assert_eq!(
            err.to_string(),
            "out has the shape [2, 4]. It should have the shape [2, 3]"
        );
    }
}
