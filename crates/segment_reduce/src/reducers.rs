//! Maps reduction names onto the reducer types of the kernel crate.

use crate::Error;
use segment_reduce_nostd_internal::ReductionKind;

/// Look up the [`ReductionKind`] associated with `name`.
///
/// Recognized names include "sum" (or its alias "add"), "mean", "min" and
/// "max". The lookup is case-sensitive.
pub(crate) fn kind_from_name(name: &str) -> Result<ReductionKind, Error> {
    ReductionKind::from_name(name).ok_or_else(|| Error::reducer_name(name.to_owned()))
}

/// Calls `$func` with a reference to the reducer type associated with the
/// [`ReductionKind`] value, `$kind`, followed by the remaining arguments.
///
/// The reducer types are zero-sized, so the match is the only place where we
/// pay for runtime selection.
macro_rules! forward_to_reducer{
    ($kind:expr; $func:ident($($args:expr),*)) => {
        match $kind {
            ReductionKind::Sum => $func(&Sum, $($args),*),
            ReductionKind::Mean => $func(&Mean, $($args),*),
            ReductionKind::Min => $func(&Min, $($args),*),
            ReductionKind::Max => $func(&Max, $($args),*),
        }
    }
}

pub(crate) use forward_to_reducer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(kind_from_name("add").unwrap(), ReductionKind::Sum);
        assert_eq!(kind_from_name("max").unwrap(), ReductionKind::Max);
        assert!(kind_from_name("prod").is_err());
        assert!(kind_from_name("Max").is_err());
    }
}
