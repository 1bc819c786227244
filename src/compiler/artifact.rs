//! The compiler's output artifact (spec §4.8): an ordered instruction
//! sequence a runtime can walk to render the template, plus a content hash
//! a caller can use as an external cache key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::optimize::FilterOp;

/// Either a literal known at compile time, or a dotted path the runtime
/// must resolve against the render-time scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableValue {
	Constant(String),
	RuntimeLookup(String),
}

/// A macro-call argument, already classified per spec §4.8 step 6 ("if it
/// parses as a literal, pass the literal; otherwise resolve via the
/// runtime variable-resolver").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgBinding {
	Literal(String),
	RuntimeLookup(String),
}

/// One instruction of the lowered program.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
	EmitLiteral(String),
	EmitVariable {
		value: VariableValue,
		filters: Vec<FilterOp>,
	},
	BeginLoop {
		item_name: String,
		iterable_expr: String,
		filter_expr: Option<String>,
	},
	EndLoop,
	BeginIf(String),
	Elseif(String),
	Else,
	EndIf,
	/// Saves the current scope, extends it with `bindings`, and causes the
	/// ops up to the matching `EndMacroCall` to run against the extended
	/// scope (spec §4.8 step 6's save/extend/restore). The macro body's
	/// lowered ops are spliced directly between this pair since macro calls
	/// are always fully expanded at compile time.
	BeginMacroCall {
		name: String,
		bindings: Vec<(String, ArgBinding)>,
	},
	EndMacroCall,
	/// Redirects the ops between this and the matching `EndCapture` into a
	/// temporary value instead of the main output; only emitted around a
	/// macro call that itself has a filter chain, since a plain macro call
	/// can splice straight into the output.
	BeginCapture,
	EndCapture {
		filters: Vec<FilterOp>,
	},
}

/// The lowered program plus the bookkeeping needed to key an external
/// persistent cache, or to compare two compilations for equality in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetProgram {
	pub ops: Vec<Op>,
}

impl TargetProgram {
	pub fn new() -> Self {
		TargetProgram { ops: Vec::new() }
	}

	pub fn push(&mut self, op: Op) {
		self.ops.push(op);
	}
}

impl Default for TargetProgram {
	fn default() -> Self {
		Self::new()
	}
}

/// The opaque artifact produced by [`crate::compiler::Compiler::compile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledTemplate {
	pub template_name: Option<String>,
	pub program: TargetProgram,
}

impl CompiledTemplate {
	/// A stable hash of the lowered program, suitable as an external cache
	/// key. Caching itself is the caller's responsibility (spec §1: out of
	/// scope).
	pub fn content_hash(&self) -> u64 {
		let mut hasher = DefaultHasher::new();
		self.program.ops.hash(&mut hasher);
		hasher.finish()
	}
}
