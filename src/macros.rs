//! Macro extraction, import resolution, and call-site argument binding
//! (spec §4.4).

use std::collections::HashMap;

use crate::core::{CompileError, CompileErrorKind};
use crate::loader::Loader;
use crate::parser;
use crate::tree::{Node, NodeKind};
use crate::util::{is_quoted_string, split_top_level, unquote};

/// A literal value recognised in a macro default or call-site argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
	String(String),
	Int(i64),
	Float(f64),
	Bool(bool),
	Null,
}

impl Literal {
	pub fn parse(text: &str) -> Option<Literal> {
		let text = text.trim();
		if is_quoted_string(text) {
			return Some(Literal::String(unquote(text)));
		}
		match text {
			"true" => return Some(Literal::Bool(true)),
			"false" => return Some(Literal::Bool(false)),
			"null" => return Some(Literal::Null),
			_ => {}
		}
		if let Ok(i) = text.parse::<i64>() {
			return Some(Literal::Int(i));
		}
		if let Ok(f) = text.parse::<f64>() {
			return Some(Literal::Float(f));
		}
		None
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct MacroDefinition {
	pub name: String,
	pub parameter_names: Vec<String>,
	pub defaults: HashMap<String, Literal>,
	pub body: Node,
}

impl MacroDefinition {
	fn from_node(node: &Node) -> Result<MacroDefinition, CompileError> {
		let attrs = node.attrs.macro_def.as_ref().expect("MACRO node carries MacroAttrs");
		let (parameter_names, defaults) = parse_signature(&attrs.signature)?;
		Ok(MacroDefinition {
			name: attrs.name.clone(),
			parameter_names,
			defaults,
			body: Node {
				children: node.children.clone(),
				..node.clone()
			},
		})
	}
}

fn parse_signature(signature: &str) -> Result<(Vec<String>, HashMap<String, Literal>), CompileError> {
	let mut names = Vec::new();
	let mut defaults = HashMap::new();
	if signature.trim().is_empty() {
		return Ok((names, defaults));
	}
	for part in split_top_level(signature, ',') {
		if let Some((name, value)) = part.split_once('=') {
			let name = name.trim().to_string();
			let literal = Literal::parse(value.trim()).ok_or_else(|| {
				CompileError::new(CompileErrorKind::InvalidMacroDirective(format!(
					"default value `{}` for parameter `{}` is not a recognised literal",
					value.trim(),
					name
				)))
			})?;
			defaults.insert(name.clone(), literal);
			names.push(name);
		} else {
			names.push(part.trim().to_string());
		}
	}
	Ok((names, defaults))
}

/// Local macro definitions plus imported namespaces, scoped to one template.
#[derive(Clone, Default)]
pub struct MacroRegistry {
	local: HashMap<String, MacroDefinition>,
	imports: HashMap<String, MacroRegistry>,
}

impl MacroRegistry {
	pub fn get_local(&self, name: &str) -> Option<&MacroDefinition> {
		self.local.get(name)
	}

	/// Resolves `callee`, which is either a bare macro name or
	/// `alias.name`, against local macros and imported namespaces.
	pub fn resolve_call(&self, callee: &str) -> Option<&MacroDefinition> {
		if let Some((alias, name)) = callee.split_once('.') {
			self.imports.get(alias)?.get_local(name)
		} else {
			self.get_local(callee)
		}
	}
}

/// Extracts macro definitions and import directives from `root`, returning
/// the populated registry and a copy of the tree with `MACRO`/`IMPORT`
/// children removed (spec §4.4 steps 1–3).
pub fn process(name: &str, root: &Node, loader: &dyn Loader) -> Result<(Node, MacroRegistry), CompileError> {
	let mut registry = MacroRegistry::default();

	for child in &root.children {
		if child.kind == NodeKind::Macro {
			let definition = MacroDefinition::from_node(child)?;
			if registry.local.contains_key(&definition.name) {
				return Err(
					CompileError::new(CompileErrorKind::DuplicateMacro(definition.name.clone())).in_template(name),
				);
			}
			registry.local.insert(definition.name.clone(), definition);
		}
	}

	for child in &root.children {
		if child.kind == NodeKind::Import {
			let attrs = child.attrs.import.as_ref().expect("IMPORT node carries ImportAttrs");
			if registry.imports.contains_key(&attrs.alias) {
				return Err(
					CompileError::new(CompileErrorKind::DuplicateAlias(attrs.alias.clone())).in_template(name),
				);
			}
			let source = loader.load(&attrs.path)?;
			let parsed = parser::parse(&attrs.path, &source)?;
			let (_, sub_registry) = process(&attrs.path, &parsed.root, loader)?;
			registry.imports.insert(attrs.alias.clone(), sub_registry);
		}
	}

	let stripped = Node {
		children: root
			.children
			.iter()
			.filter(|c| !matches!(c.kind, NodeKind::Macro | NodeKind::Import))
			.cloned()
			.collect(),
		..root.clone()
	};

	Ok((stripped, registry))
}

/// One call-site argument: positional, or named with its value expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
	Positional(String),
	Named(String, String),
}

/// Splits a raw argument-list string (the text between a macro call's
/// parentheses) into [`Argument`]s (spec §4.4, argument binding step 1–2).
pub fn parse_arguments(raw: &str) -> Vec<Argument> {
	split_top_level(raw, ',')
		.into_iter()
		.filter(|part| !part.is_empty())
		.map(|part| match split_named_argument(&part) {
			Some((name, value)) => Argument::Named(name, value),
			None => Argument::Positional(part),
		})
		.collect()
}

/// Splits `part` into `(name, value)` if it has the shape `name = expr`,
/// where `name` is a bare identifier and the `=` is a single assignment
/// sign rather than part of `==`, `!=`, `<=`, or `>=`.
fn split_named_argument(part: &str) -> Option<(String, String)> {
	let bytes = part.as_bytes();
	for (i, ch) in part.char_indices() {
		if ch != '=' {
			continue;
		}
		let prev = part[..i].chars().next_back();
		let next = bytes.get(i + 1).copied();
		if next == Some(b'=') || matches!(prev, Some('!') | Some('<') | Some('>') | Some('=')) {
			continue;
		}
		let name = part[..i].trim();
		let value = part[i + 1..].trim();
		if is_identifier(name) && !value.is_empty() {
			return Some((name.to_string(), value.to_string()));
		}
		return None;
	}
	None
}

fn is_identifier(text: &str) -> bool {
	let mut chars = text.chars();
	match chars.next() {
		Some(c) if c.is_alphabetic() || c == '_' => {}
		_ => return false,
	}
	chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Binds call-site arguments to `definition`'s parameters (spec §4.4 steps
/// 2–4), returning an ordered list of `(parameter_name, expression)` where
/// `expression` is either the caller's raw expression text or the
/// stringified default literal.
pub fn bind_arguments(definition: &MacroDefinition, args: &[Argument]) -> Result<Vec<(String, String)>, CompileError> {
	let mut slots: Vec<Option<String>> = vec![None; definition.parameter_names.len()];
	let index_of = |name: &str| definition.parameter_names.iter().position(|p| p == name);

	let mut next_positional = 0usize;
	for arg in args {
		match arg {
			Argument::Positional(expr) => {
				if next_positional >= slots.len() {
					return Err(CompileError::new(CompileErrorKind::TooManyArguments(definition.name.clone())));
				}
				slots[next_positional] = Some(expr.clone());
				next_positional += 1;
			}
			Argument::Named(name, expr) => {
				let Some(idx) = index_of(name) else {
					return Err(CompileError::new(CompileErrorKind::UnknownParameter(
						name.clone(),
						definition.name.clone(),
					)));
				};
				if slots[idx].is_some() {
					return Err(CompileError::new(CompileErrorKind::DuplicateArgument(
						name.clone(),
						definition.name.clone(),
					)));
				}
				slots[idx] = Some(expr.clone());
			}
		}
	}

	let mut bound = Vec::with_capacity(slots.len());
	for (idx, slot) in slots.into_iter().enumerate() {
		let name = &definition.parameter_names[idx];
		let expr = match slot {
			Some(expr) => expr,
			None => match definition.defaults.get(name) {
				Some(literal) => literal_to_expr(literal),
				None => {
					return Err(CompileError::new(CompileErrorKind::MissingRequiredArgument(
						name.clone(),
						definition.name.clone(),
					)));
				}
			},
		};
		bound.push((name.clone(), expr));
	}
	Ok(bound)
}

fn literal_to_expr(literal: &Literal) -> String {
	match literal {
		Literal::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
		Literal::Int(i) => i.to_string(),
		Literal::Float(f) => f.to_string(),
		Literal::Bool(b) => b.to_string(),
		Literal::Null => "null".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::loader::MapLoader;

	fn macro_root(source: &str) -> Node {
		parser::parse("t", source).unwrap().root
	}

	#[test]
	fn extracts_signature_with_default() {
		let root = macro_root(r#"{% macro greet(who, greeting="Hello") %}{{ greeting }}, {{ who }}{% endmacro %}"#);
		let (stripped, registry) = process("t", &root, &MapLoader::new()).unwrap();
		assert!(stripped.children.is_empty());
		let def = registry.get_local("greet").unwrap();
		assert_eq!(def.parameter_names, vec!["who", "greeting"]);
		assert_eq!(def.defaults.get("greeting"), Some(&Literal::String("Hello".into())));
	}

	#[test]
	fn duplicate_macro_name_is_an_error() {
		let root = macro_root("{% macro a() %}{% endmacro %}{% macro a() %}{% endmacro %}");
		assert!(process("t", &root, &MapLoader::new()).is_err());
	}

	#[test]
	fn duplicate_import_alias_is_an_error() {
		let loader = MapLoader::new().with("a", "").with("b", "");
		let root = macro_root(r#"{% import "a" as ui %}{% import "b" as ui %}"#);
		assert!(process("t", &root, &loader).is_err());
	}

	#[test]
	fn import_exposes_namespaced_macros() {
		let loader = MapLoader::new().with("buttons", "{% macro button(label) %}[{{ label }}]{% endmacro %}");
		let root = macro_root(r#"{% import "buttons" as ui %}"#);
		let (_, registry) = process("t", &root, &loader).unwrap();
		assert!(registry.resolve_call("ui.button").is_some());
		assert!(registry.resolve_call("button").is_none());
	}

	#[test]
	fn binds_positional_and_named_arguments_identically() {
		let root = macro_root(r#"{% macro greet(who, greeting="Hello") %}x{% endmacro %}"#);
		let (_, registry) = process("t", &root, &MapLoader::new()).unwrap();
		let def = registry.get_local("greet").unwrap();

		let positional = bind_arguments(def, &parse_arguments("'Ada', 'Hi'")).unwrap();
		let named = bind_arguments(def, &parse_arguments("greeting='Hi', who='Ada'")).unwrap();
		assert_eq!(positional, named);
	}

	#[test]
	fn missing_required_argument_is_an_error() {
		let root = macro_root(r#"{% macro greet(who, greeting="Hello") %}x{% endmacro %}"#);
		let (_, registry) = process("t", &root, &MapLoader::new()).unwrap();
		let def = registry.get_local("greet").unwrap();
		assert!(matches!(
			bind_arguments(def, &parse_arguments("")).unwrap_err().kind,
			CompileErrorKind::MissingRequiredArgument(..)
		));
	}

	#[test]
	fn unknown_named_argument_is_an_error() {
		let root = macro_root(r#"{% macro greet(who) %}x{% endmacro %}"#);
		let (_, registry) = process("t", &root, &MapLoader::new()).unwrap();
		let def = registry.get_local("greet").unwrap();
		assert!(matches!(
			bind_arguments(def, &parse_arguments("other='x'")).unwrap_err().kind,
			CompileErrorKind::UnknownParameter(..)
		));
	}

	#[test]
	fn too_many_positional_arguments_is_an_error() {
		let root = macro_root(r#"{% macro greet(who) %}x{% endmacro %}"#);
		let (_, registry) = process("t", &root, &MapLoader::new()).unwrap();
		let def = registry.get_local("greet").unwrap();
		assert!(matches!(
			bind_arguments(def, &parse_arguments("'a', 'b'")).unwrap_err().kind,
			CompileErrorKind::TooManyArguments(..)
		));
	}
}
