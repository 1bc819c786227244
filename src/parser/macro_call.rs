use once_cell::sync::Lazy;
use regex::Regex;

static MACRO_CALL_SHAPE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^(?P<callee>[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\((?P<args>.*)\)$").unwrap());

/// Recognises the `IDENT(ARGS)` / `IDENT.IDENT(ARGS)` macro-call shape in a
/// variable expression, returning `(callee, raw_args)` when it matches.
///
/// This runs once at parse time rather than being re-derived during
/// lowering: the compiler still decides whether `callee` actually names a
/// known macro (spec §4.8 step 5), but the shape itself — the thing that
/// would otherwise need a second ad-hoc regex at lowering time — is
/// recorded on the node up front.
pub fn detect_macro_call_shape(expr: &str) -> Option<(String, String)> {
	let caps = MACRO_CALL_SHAPE.captures(expr.trim())?;
	Some((caps["callee"].to_string(), caps["args"].to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_bare_call() {
		let (callee, args) = detect_macro_call_shape(r#"greet("Ada")"#).unwrap();
		assert_eq!(callee, "greet");
		assert_eq!(args, "\"Ada\"");
	}

	#[test]
	fn detects_namespaced_call() {
		let (callee, args) = detect_macro_call_shape("ui.button(label=\"Go\")").unwrap();
		assert_eq!(callee, "ui.button");
		assert_eq!(args, "label=\"Go\"");
	}

	#[test]
	fn plain_identifier_is_not_a_call() {
		assert_eq!(detect_macro_call_shape("name"), None);
	}

	#[test]
	fn dotted_path_without_parens_is_not_a_call() {
		assert_eq!(detect_macro_call_shape("user.name"), None);
	}
}
