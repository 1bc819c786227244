//! The filter inliner (spec §4.7): turns an ordered filter chain into a
//! sequence of value transforms, substituting a pure filter's inline code
//! template where possible and falling back to a runtime `apply_filter`
//! call otherwise.

use crate::filters::{self, FilterSpec};
use crate::tree::FilterCall;

/// One step of a lowered filter chain; the compiler turns these into a run
/// of value reassignments when emitting `EmitVariable` ops and when closing
/// a filtered macro call's `EndCapture`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterOp {
	/// Substitute the current value into a known-pure filter's template.
	Inline(String),
	/// Fall back to the runtime helper table's `apply_filter(expr, value)`.
	Runtime { name: String, args: Vec<String> },
}

/// Lowers an ordered filter chain into a sequence of [`FilterOp`]s, one per
/// call, in the order they're applied.
pub fn inline_filters(chain: &[FilterCall]) -> Vec<FilterOp> {
	chain.iter().map(inline_one).collect()
}

fn inline_one(call: &FilterCall) -> FilterOp {
	match filters::lookup(&call.name) {
		Some(spec) if is_inlinable_here(spec, call) => {
			let template = spec.inline_template.expect("checked by is_inlinable_here");
			FilterOp::Inline(template.replace("{value}", "value"))
		}
		_ => FilterOp::Runtime {
			name: call.name.clone(),
			args: call.args.clone(),
		},
	}
}

/// A filter is only inlined when it has an inline template *and* the call
/// site passes no arguments — the template has nowhere to put them.
fn is_inlinable_here(spec: &FilterSpec, call: &FilterCall) -> bool {
	spec.inline_template.is_some() && call.args.is_empty()
}
