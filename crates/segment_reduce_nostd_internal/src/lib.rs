/*!
The kernels that implement segment reductions (without the standard library).

# Developer Guide

A segment reduction folds the elements of a source array along a single axis
(the reduction dimension) into groups. Every other axis is either a batch
axis (preceding the reduction dimension) or a lane axis (following it).

This crate contains the pieces that don't need to allocate:
- [`Reducer`] and its implementors ([`Sum`], [`Mean`], [`Min`], [`Max`])
  encapsulate all reduction-specific numeric semantics.
- [`IndexInfo`] maps flat coordinates of a (possibly broadcast) segmentation
  descriptor to offsets into its storage.
- [`LaneStateViewMut`] tracks the accumulators of every lane in a group.
- [`reduce_csr`] & [`reduce_coo`] are the kernels.

Argument validation, allocation and name-lookup are handled by the
`segment_reduce` crate.
*/

#![no_std]

mod coo;
mod csr;
mod element;
mod index_info;
mod reducer;
mod state;

pub use coo::reduce_coo;
pub use csr::reduce_csr;
pub use element::Element;
pub use index_info::{IndexInfo, MAX_DIMS, linear_to_offset, ptr_linear_to_offset};
pub use reducer::{Max, Mean, Min, ReductionKind, Reducer, Sum};
pub use state::LaneStateViewMut;
