// not every test file uses every helper
#![allow(dead_code)]

// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

use ndarray::{ArrayD, ArrayViewD, Dimension, IxDyn, indices};

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

pub fn assert_allclose(actual: &ArrayD<f64>, expected: &ArrayD<f64>, rtol: f64, atol: f64) {
    assert_eq!(actual.shape(), expected.shape(), "the shapes are unequal");
    for (idx, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            isclose(*a, *e, rtol, atol),
            "element {idx} isn't consistent. actual = {a}, expected = {e}",
        );
    }
}

// build the full index into src (or out) from an index into the batch axes,
// the position along the reduction dimension and an index into the lane axes
fn join(batch: &[usize], pos: usize, lane: &[usize]) -> IxDyn {
    let mut out = batch.to_vec();
    out.push(pos);
    out.extend_from_slice(lane);
    IxDyn(&out)
}

fn positions_in_order(kind: &str, cur: f64, val: f64) -> bool {
    match kind {
        "min" => val < cur,
        "max" => val > cur,
        _ => panic!("{kind} doesn't track positions"),
    }
}

/// A straight-forward implementation of a CSR segment reduction.
///
/// Unlike the library, `indptr` must already be expanded to its full shape.
pub fn naive_csr(
    src: ArrayViewD<f64>,
    indptr: ArrayViewD<i64>,
    kind: &str,
) -> (ArrayD<f64>, Option<ArrayD<i64>>) {
    let reduce_dim = indptr.ndim() - 1;
    let n_elem = src.shape()[reduce_dim];
    let n_groups = indptr.shape()[reduce_dim] - 1;

    let mut out_shape = src.shape().to_vec();
    out_shape[reduce_dim] = n_groups;
    let mut out = ArrayD::<f64>::zeros(IxDyn(&out_shape));
    let mut arg_out = ArrayD::<i64>::from_elem(IxDyn(&out_shape), n_elem as i64);

    for idx in indices(IxDyn(&out_shape)) {
        let idx = idx.slice().to_vec();
        let (batch, rest) = idx.split_at(reduce_dim);
        let (g, lane) = (rest[0], &rest[1..]);

        let start = indptr[join(batch, g, &[])] as usize;
        let stop = indptr[join(batch, g + 1, &[])] as usize;
        let vals: Vec<(usize, f64)> = (start..stop)
            .map(|e| (e, src[join(batch, e, lane)]))
            .collect();

        let (val, arg) = match kind {
            "sum" | "add" => (vals.iter().map(|(_, v)| v).sum::<f64>(), None),
            "mean" => {
                let total: f64 = vals.iter().map(|(_, v)| v).sum();
                (total / (vals.len().max(1) as f64), None)
            }
            "min" | "max" => match vals.first() {
                None => (0.0, Some(n_elem as i64)),
                Some(&first) => {
                    let (mut best_e, mut best) = first;
                    for &(e, v) in &vals[1..] {
                        if positions_in_order(kind, best, v) {
                            (best_e, best) = (e, v);
                        }
                    }
                    (best, Some(best_e as i64))
                }
            },
            _ => panic!("unknown reduction: {kind}"),
        };
        out[IxDyn(&idx)] = val;
        if let Some(arg) = arg {
            arg_out[IxDyn(&idx)] = arg;
        }
    }

    let has_arg = matches!(kind, "min" | "max");
    (out, has_arg.then_some(arg_out))
}

/// A straight-forward implementation of a COO segment reduction that
/// accumulates into `out`.
///
/// Unlike the library, `index` must already be expanded to its full shape.
pub fn naive_coo(
    src: ArrayViewD<f64>,
    index: ArrayViewD<i64>,
    out: &mut ArrayD<f64>,
    kind: &str,
) -> Option<ArrayD<i64>> {
    let reduce_dim = index.ndim() - 1;
    let n_elem = src.shape()[reduce_dim];
    let out_shape = out.shape().to_vec();
    let mut arg_out = ArrayD::<i64>::from_elem(IxDyn(&out_shape), n_elem as i64);

    for idx in indices(IxDyn(&out_shape)) {
        let idx = idx.slice().to_vec();
        let (batch, rest) = idx.split_at(reduce_dim);
        let (g, lane) = (rest[0], &rest[1..]);

        let vals: Vec<(usize, f64)> = (0..n_elem)
            .filter(|&e| index[join(batch, e, &[])] == g as i64)
            .map(|e| (e, src[join(batch, e, lane)]))
            .collect();
        if vals.is_empty() {
            continue;
        }

        let seed = out[IxDyn(&idx)];
        out[IxDyn(&idx)] = match kind {
            "sum" | "add" => seed + vals.iter().map(|(_, v)| v).sum::<f64>(),
            "mean" => (seed + vals.iter().map(|(_, v)| v).sum::<f64>()) / (vals.len() as f64),
            "min" | "max" => {
                let mut best = seed;
                for &(e, v) in &vals {
                    if positions_in_order(kind, best, v) {
                        best = v;
                        arg_out[IxDyn(&idx)] = e as i64;
                    }
                }
                best
            }
            _ => panic!("unknown reduction: {kind}"),
        };
    }

    matches!(kind, "min" | "max").then_some(arg_out)
}
