//! The compiler (spec §4.8): lowers a parsed, optimised tree into a
//! [`TargetProgram`], running the rate limiter, inheritance resolver, and
//! macro processor first in the strict order spec.md mandates.

mod artifact;

pub use artifact::{ArgBinding, CompiledTemplate, Op, TargetProgram, VariableValue};

use tracing::info_span;

use crate::config::CompilerOptions;
use crate::core::{CompileError, CompileErrorKind, Errors, Result};
use crate::filters;
use crate::inherit;
use crate::loader::Loader;
use crate::macros::{self, Literal, MacroDefinition, MacroRegistry};
use crate::optimize::{self, inline_filters, FilterOp};
use crate::parser;
use crate::ratelimit::{Decision, RateLimiter};
use crate::tree::{Node, NodeKind};

/// Orchestrates the full pipeline. Cheap to clone: the rate limiter's
/// counters are shared, everything else is stateless configuration.
#[derive(Clone)]
pub struct Compiler {
	options: CompilerOptions,
	rate_limiter: RateLimiter,
}

impl Compiler {
	pub fn new(options: CompilerOptions) -> Self {
		let rate_limiter = match options.rate_limit {
			Some(cfg) => RateLimiter::new(cfg.max_attempts, cfg.window_seconds),
			None => RateLimiter::disabled(),
		};
		Compiler { options, rate_limiter }
	}

	/// Parses, resolves, and optimises `source` without lowering it,
	/// collecting every diagnostic it can find rather than stopping at the
	/// first one (used by `tmplc check`).
	pub fn check(&self, name: &str, source: &str, loader: &dyn Loader) -> std::result::Result<(), Errors> {
		let optimised = self.parse_resolve_optimise(Some(name), source, loader).map_err(Errors::from)?;
		let mut errors = Errors::new();
		check_filters(&optimised, &mut errors, self.options.max_errors);
		errors.check()
	}

	/// Runs the full pipeline and returns the lowered artifact.
	pub fn compile(&self, name: Option<&str>, source: &str, loader: &dyn Loader) -> Result<CompiledTemplate> {
		if let Some(name) = name {
			if let Decision::Rejected { wait_seconds } = self.rate_limiter.check(name) {
				return Err(CompileError::new(CompileErrorKind::RateLimitExceeded { wait_seconds }).in_template(name));
			}
		}

		let span = info_span!("compile", template = name.unwrap_or("<anonymous>"));
		let _enter = span.enter();

		let (root, registry) = self.resolve_and_process(name, source, loader)?;

		let mut program = TargetProgram::new();
		lower_children(&root.children, &registry, &self.options, &mut program)?;

		Ok(CompiledTemplate {
			template_name: name.map(String::from),
			program,
		})
	}

	fn parse_resolve_optimise(&self, name: Option<&str>, source: &str, loader: &dyn Loader) -> Result<Node> {
		let (root, _registry) = self.resolve_and_process(name, source, loader)?;
		Ok(root)
	}

	fn resolve_and_process(&self, name: Option<&str>, source: &str, loader: &dyn Loader) -> Result<(Node, MacroRegistry)> {
		let label = name.unwrap_or("<anonymous>");
		let parsed = parser::parse(label, source)?;
		let mut root = parsed.root;

		if self.options.resolve_inheritance {
			if let Some(name) = name {
				root = inherit::resolve(name, &root, loader)?;
			}
		}

		let mut registry = MacroRegistry::default();
		if self.options.process_macros {
			if let Some(name) = name {
				let (stripped, reg) = macros::process(name, &root, loader)?;
				root = stripped;
				registry = reg;
			}
		}

		if self.options.eliminate_dead_branches {
			root = optimize::eliminate_dead_branches(&root);
		}

		Ok((root, registry))
	}
}

fn check_filters(node: &Node, errors: &mut Errors, max_errors: usize) {
	if errors.len() >= max_errors {
		return;
	}
	if node.kind == NodeKind::Variable {
		if let Some(attrs) = &node.attrs.variable {
			for filter in &attrs.filters {
				if errors.len() >= max_errors {
					return;
				}
				if filters::lookup(&filter.name).is_none() {
					errors.add(CompileError::new(CompileErrorKind::InvalidFilter(filter.name.clone())).at(node.span.clone()));
				}
			}
		}
	}
	for child in &node.children {
		check_filters(child, errors, max_errors);
		if errors.len() >= max_errors {
			return;
		}
	}
}

fn lower_children(children: &[Node], registry: &MacroRegistry, options: &CompilerOptions, program: &mut TargetProgram) -> Result<()> {
	for child in children {
		lower_node(child, registry, options, program)?;
	}
	Ok(())
}

fn lower_node(node: &Node, registry: &MacroRegistry, options: &CompilerOptions, program: &mut TargetProgram) -> Result<()> {
	match node.kind {
		NodeKind::Root | NodeKind::Block => lower_children(&node.children, registry, options, program)?,
		NodeKind::Text => program.push(Op::EmitLiteral(node.literal_text.clone())),
		NodeKind::Variable => lower_variable(node, registry, options, program)?,
		NodeKind::ForLoop => {
			let attrs = node.attrs.for_loop.as_ref().expect("FOR_LOOP carries ForLoopAttrs");
			program.push(Op::BeginLoop {
				item_name: attrs.item_name.clone(),
				iterable_expr: attrs.iterable_expr.clone(),
				filter_expr: attrs.filter_expr.clone(),
			});
			lower_children(&node.children, registry, options, program)?;
			program.push(Op::EndLoop);
		}
		NodeKind::IfCondition => lower_if_chain(node, registry, options, program)?,
		NodeKind::Extends | NodeKind::Parent | NodeKind::Macro | NodeKind::Import => {}
		NodeKind::ElseifCondition | NodeKind::ElseCondition => {
			unreachable!("only ever visited as a tail child of an IF_CONDITION")
		}
	}
	Ok(())
}

fn lower_if_chain(if_node: &Node, registry: &MacroRegistry, options: &CompilerOptions, program: &mut TargetProgram) -> Result<()> {
	let predicate = &if_node
		.attrs
		.condition
		.as_ref()
		.expect("IF_CONDITION carries ConditionAttrs")
		.predicate_expr;
	program.push(Op::BeginIf(predicate.clone()));

	let tail_start = if_node
		.children
		.iter()
		.position(|c| matches!(c.kind, NodeKind::ElseifCondition | NodeKind::ElseCondition))
		.unwrap_or(if_node.children.len());
	lower_children(&if_node.children[..tail_start], registry, options, program)?;

	for tail in &if_node.children[tail_start..] {
		match tail.kind {
			NodeKind::ElseifCondition => {
				let predicate = &tail.attrs.condition.as_ref().expect("ELSEIF_CONDITION carries ConditionAttrs").predicate_expr;
				program.push(Op::Elseif(predicate.clone()));
			}
			NodeKind::ElseCondition => program.push(Op::Else),
			_ => unreachable!("tail of an IF_CONDITION group is only ever elseif/else"),
		}
		lower_children(&tail.children, registry, options, program)?;
	}

	program.push(Op::EndIf);
	Ok(())
}

fn lower_variable(node: &Node, registry: &MacroRegistry, options: &CompilerOptions, program: &mut TargetProgram) -> Result<()> {
	let attrs = node.attrs.variable.as_ref().expect("VARIABLE carries VariableAttrs");

	let filter_ops: Vec<FilterOp> = if options.inline_filters {
		inline_filters(&attrs.filters)
	} else {
		attrs
			.filters
			.iter()
			.map(|f| FilterOp::Runtime {
				name: f.name.clone(),
				args: f.args.clone(),
			})
			.collect()
	};

	if let Some((callee, raw_args)) = &attrs.call_shape {
		if let Some(definition) = registry.resolve_call(callee) {
			return lower_macro_call(definition, raw_args, filter_ops, registry, options, program);
		}
	}

	let value = if options.fold_constants {
		match optimize::try_fold(&attrs.expr) {
			Some(folded) => VariableValue::Constant(folded),
			None => VariableValue::RuntimeLookup(attrs.expr.clone()),
		}
	} else {
		VariableValue::RuntimeLookup(attrs.expr.clone())
	};
	program.push(Op::EmitVariable { value, filters: filter_ops });
	Ok(())
}

/// Spec §4.8 step 6: bind arguments, save/extend/restore the variable
/// scope around the macro body's lowered ops. A filter chain following the
/// call is applied to the macro's rendered output as a whole, so the body
/// is wrapped in a capture when one is present.
fn lower_macro_call(
	definition: &MacroDefinition,
	raw_args: &str,
	filter_ops: Vec<FilterOp>,
	registry: &MacroRegistry,
	options: &CompilerOptions,
	program: &mut TargetProgram,
) -> Result<()> {
	let args = macros::parse_arguments(raw_args);
	let bound = macros::bind_arguments(definition, &args)?;
	let bindings = bound
		.into_iter()
		.map(|(name, expr)| {
			let binding = if Literal::parse(&expr).is_some() {
				ArgBinding::Literal(expr)
			} else {
				ArgBinding::RuntimeLookup(expr)
			};
			(name, binding)
		})
		.collect();

	let captures = !filter_ops.is_empty();
	if captures {
		program.push(Op::BeginCapture);
	}
	program.push(Op::BeginMacroCall {
		name: definition.name.clone(),
		bindings,
	});
	lower_children(&definition.body.children, registry, options, program)?;
	program.push(Op::EndMacroCall);
	if captures {
		program.push(Op::EndCapture { filters: filter_ops });
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::loader::MapLoader;

	fn compiler() -> Compiler {
		Compiler::new(CompilerOptions::default())
	}

	#[test]
	fn scenario_s1_basic_interpolation() {
		let program = compiler().compile(None, "Hello {{ name }}!", &MapLoader::new()).unwrap().program;
		assert_eq!(
			program.ops,
			vec![
				Op::EmitLiteral("Hello ".into()),
				Op::EmitVariable {
					value: VariableValue::RuntimeLookup("name".into()),
					filters: vec![],
				},
				Op::EmitLiteral("!".into()),
			]
		);
	}

	#[test]
	fn scenario_s2_constant_condition_leaves_no_conditional_op() {
		let program = compiler()
			.compile(None, "{% if true %}Y{% else %}N{% endif %}", &MapLoader::new())
			.unwrap()
			.program;
		assert_eq!(program.ops, vec![Op::EmitLiteral("Y".into())]);
	}

	#[test]
	fn scenario_s6_arithmetic_constant_is_inlined() {
		let program = compiler().compile(None, "{{ 24 * 60 * 60 }}", &MapLoader::new()).unwrap().program;
		assert_eq!(
			program.ops,
			vec![Op::EmitVariable {
				value: VariableValue::Constant("86400".into()),
				filters: vec![],
			}]
		);
	}

	#[test]
	fn pure_filter_is_inlined_into_the_op() {
		let program = compiler().compile(None, "{{ name | upper }}", &MapLoader::new()).unwrap().program;
		assert_eq!(
			program.ops,
			vec![Op::EmitVariable {
				value: VariableValue::RuntimeLookup("name".into()),
				filters: vec![FilterOp::Inline("value.to_uppercase()".into())],
			}]
		);
	}

	#[test]
	fn macro_call_is_fully_expanded_at_compile_time() {
		let source = r#"{% macro greet(who) %}Hi {{ who }}{% endmacro %}{{ greet('Ada') }}"#;
		let program = compiler().compile(None, source, &MapLoader::new()).unwrap().program;
		assert_eq!(
			program.ops,
			vec![
				Op::BeginMacroCall {
					name: "greet".into(),
					bindings: vec![("who".into(), ArgBinding::Literal("'Ada'".into()))],
				},
				Op::EmitLiteral("Hi ".into()),
				Op::EmitVariable {
					value: VariableValue::RuntimeLookup("who".into()),
					filters: vec![],
				},
				Op::EndMacroCall,
			]
		);
	}

	#[test]
	fn filtered_macro_call_is_captured() {
		let source = r#"{% macro greet(who) %}Hi {{ who }}{% endmacro %}{{ greet('Ada') | upper }}"#;
		let program = compiler().compile(None, source, &MapLoader::new()).unwrap().program;
		assert_eq!(program.ops[0], Op::BeginCapture);
		assert!(matches!(program.ops.last(), Some(Op::EndCapture { .. })));
	}

	#[test]
	fn rate_limit_rejects_beyond_configured_attempts() {
		let options = CompilerOptions::default().with_rate_limit(1, 60);
		let compiler = Compiler::new(options);
		let loader = MapLoader::new();
		assert!(compiler.compile(Some("t"), "hi", &loader).is_ok());
		let err = compiler.compile(Some("t"), "hi", &loader).unwrap_err();
		assert!(matches!(err.kind, CompileErrorKind::RateLimitExceeded { .. }));
	}

	#[test]
	fn check_reports_unknown_filter() {
		let errors = compiler().check("t", "{{ name | not_a_filter }}", &MapLoader::new()).unwrap_err();
		assert_eq!(errors.len(), 1);
	}

	#[test]
	fn content_hash_is_stable_for_equal_programs() {
		let a = compiler().compile(None, "Hello {{ name }}", &MapLoader::new()).unwrap();
		let b = compiler().compile(None, "Hello {{ name }}", &MapLoader::new()).unwrap();
		assert_eq!(a.content_hash(), b.content_hash());
	}
}
