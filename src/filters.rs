//! The catalogue of built-in filters known to the [`crate::optimize::filter_inline`]
//! pass (spec §6's filter table), built once and shared.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// One entry of the filter catalogue.
#[derive(Clone, Copy, Debug)]
pub struct FilterSpec {
	pub name: &'static str,
	pub min_arity: usize,
	pub max_arity: Option<usize>,
	/// Present only for filters with no runtime-parameterised arguments;
	/// contains the literal `{value}` placeholder for the inliner to
	/// substitute.
	pub inline_template: Option<&'static str>,
}

impl FilterSpec {
	pub fn accepts_arity(&self, arity: usize) -> bool {
		arity >= self.min_arity && self.max_arity.map(|max| arity <= max).unwrap_or(true)
	}
}

macro_rules! spec {
	($name:expr, $min:expr, $max:expr, $inline:expr) => {
		FilterSpec {
			name: $name,
			min_arity: $min,
			max_arity: $max,
			inline_template: $inline,
		}
	};
}

pub static FILTERS: Lazy<HashMap<&'static str, FilterSpec>> = Lazy::new(|| {
	let entries = [
		spec!("upper", 0, Some(0), Some("{value}.to_uppercase()")),
		spec!("lower", 0, Some(0), Some("{value}.to_lowercase()")),
		spec!("trim", 0, Some(1), None),
		spec!("escape", 0, Some(0), Some("html_escape({value})")),
		spec!("length", 0, Some(0), None),
		spec!("json", 0, Some(1), None),
		spec!("default", 1, Some(1), None),
		spec!("date", 1, Some(1), None),
		spec!("number", 0, Some(3), None),
		spec!("first", 0, Some(1), None),
		spec!("last", 0, Some(1), None),
		spec!("join", 0, Some(1), None),
		spec!("reverse", 0, Some(0), None),
		spec!("sort", 0, Some(1), None),
		spec!("slice", 1, Some(2), None),
		spec!("map", 1, Some(1), None),
		spec!("filter", 1, Some(1), None),
		spec!("batch", 1, Some(2), None),
	];
	entries.into_iter().map(|s| (s.name, s)).collect()
});

pub fn lookup(name: &str) -> Option<&'static FilterSpec> {
	FILTERS.get(name)
}
