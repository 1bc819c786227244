//! The runtime helper table an emitted artifact expects at render time
//! (spec §6). Rendering itself is out of scope for this crate; this trait
//! exists only so [`crate::compiler::Op`] has a concrete, typed destination
//! to name instead of an opaque string naming a function this crate never
//! defines.

/// Implemented by a caller's own renderer. Never called from within this
/// crate.
pub trait RuntimeHelpers {
	type Value;
	type Scope;

	/// Resolves a dotted path (`user.name`) against the current scope.
	fn resolve_variable(&self, dotted_path: &str, scope: &Self::Scope) -> Self::Value;

	/// Applies a single filter call's expression text (e.g. `default: 'n/a'`)
	/// to `value`.
	fn apply_filter(&self, expression: &str, value: Self::Value) -> Self::Value;

	/// Evaluates a boolean expression against the current scope.
	fn evaluate_condition(&self, expression: &str, scope: &Self::Scope) -> bool;
}
