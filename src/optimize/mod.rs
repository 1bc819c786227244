//! Optimiser passes: constant folding, dead-branch elimination, and filter
//! inlining (spec §4.5-§4.7).

pub mod dead_branch;
pub mod filter_inline;
pub mod fold;

pub use dead_branch::eliminate as eliminate_dead_branches;
pub use filter_inline::{inline_filters, FilterOp};
pub use fold::{fold, try_fold};
