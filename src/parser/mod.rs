mod macro_call;

pub use macro_call::detect_macro_call_shape;

use crate::core::{CompileError, CompileErrorKind, Input};
use crate::lexer::{self, Token, TokenKind};
use crate::tree::*;

/// The result of parsing: an immutable tree plus the tokens and
/// comment-stripped source that produced it.
#[derive(Clone)]
pub struct ParsedTemplate {
	pub cleaned_source: Input,
	pub tokens: Vec<Token>,
	pub root: Node,
}

enum Frame {
	Root(Node),
	For(Node),
	If(Node),
	ElseifOrElse(Node),
	Block(Node),
	Macro(Node),
}

impl Frame {
	fn node_mut(&mut self) -> &mut Node {
		match self {
			Frame::Root(n) | Frame::For(n) | Frame::If(n) | Frame::ElseifOrElse(n) | Frame::Block(n) | Frame::Macro(n) => n,
		}
	}

	fn into_node(self) -> Node {
		match self {
			Frame::Root(n) | Frame::For(n) | Frame::If(n) | Frame::ElseifOrElse(n) | Frame::Block(n) | Frame::Macro(n) => n,
		}
	}

	fn kind_name(&self) -> &'static str {
		match self {
			Frame::Root(_) => "root",
			Frame::For(_) => "for",
			Frame::If(_) => "if",
			Frame::ElseifOrElse(_) => "elseif/else",
			Frame::Block(_) => "block",
			Frame::Macro(_) => "macro",
		}
	}
}

/// Parses the comment-stripped source named `name` into a [`ParsedTemplate`].
pub fn parse(name: &str, source: &str) -> Result<ParsedTemplate, CompileError> {
	let cleaned = lexer::strip_comments(source)?;
	let input = Input::new(name.to_string(), cleaned);
	let tokens = lexer::lex(&input)?;
	let root = parse_tokens(&tokens, &input)?;
	Ok(ParsedTemplate {
		cleaned_source: input,
		tokens,
		root,
	})
}

fn parse_tokens(tokens: &[Token], input: &Input) -> Result<Node, CompileError> {
	let root_span = input.start().span_to(&input.start());
	let mut stack: Vec<Frame> = vec![Frame::Root(Node::new(NodeKind::Root, root_span))];

	let attach = |stack: &mut Vec<Frame>, node: Node| {
		stack.last_mut().unwrap().node_mut().children.push(node);
	};

	for token in tokens {
		match &token.kind {
			TokenKind::Text => {
				attach(&mut stack, Node::text(token.span.clone(), token.lexeme.clone()));
			}
			TokenKind::Variable { expr, filters } => {
				let call_shape = detect_macro_call_shape(expr);
				let mut node = Node::new(NodeKind::Variable, token.span.clone());
				node.attrs.variable = Some(VariableAttrs {
					expr: expr.clone(),
					filters: filters.clone(),
					call_shape,
				});
				attach(&mut stack, node);
			}
			TokenKind::Parent => {
				attach(&mut stack, Node::new(NodeKind::Parent, token.span.clone()));
				let in_block = stack.iter().any(|f| matches!(f, Frame::Block(_)));
				if !in_block {
					return Err(structure_error("`parent()` used outside of a block", token));
				}
			}
			TokenKind::Extends { parent_path } => {
				if !matches!(stack.last(), Some(Frame::Root(_))) {
					return Err(CompileError::new(CompileErrorKind::InvalidExtendsDirective(
						"`extends` must be a direct child of the template root".into(),
					))
					.at(token.span.clone()));
				}
				let mut node = Node::new(NodeKind::Extends, token.span.clone());
				node.attrs.extends = Some(ExtendsAttrs {
					parent_path: parent_path.clone(),
				});
				attach(&mut stack, node);
			}
			TokenKind::Import { path, alias } => {
				if !matches!(stack.last(), Some(Frame::Root(_))) {
					return Err(CompileError::new(CompileErrorKind::InvalidImportDirective(
						"`import` must be a direct child of the template root".into(),
					))
					.at(token.span.clone()));
				}
				let mut node = Node::new(NodeKind::Import, token.span.clone());
				node.attrs.import = Some(ImportAttrs {
					path: path.clone(),
					alias: alias.clone(),
				});
				attach(&mut stack, node);
			}
			TokenKind::ForStart {
				item_name,
				iterable_expr,
				filter_expr,
			} => {
				let mut node = Node::new(NodeKind::ForLoop, token.span.clone());
				node.attrs.for_loop = Some(ForLoopAttrs {
					item_name: item_name.clone(),
					iterable_expr: iterable_expr.clone(),
					filter_expr: filter_expr.clone(),
				});
				stack.push(Frame::For(node));
			}
			TokenKind::ForEnd => {
				pop_matching(&mut stack, "for", token)?;
			}
			TokenKind::IfStart { predicate_expr } => {
				let mut node = Node::new(NodeKind::IfCondition, token.span.clone());
				node.attrs.condition = Some(ConditionAttrs {
					predicate_expr: predicate_expr.clone(),
				});
				stack.push(Frame::If(node));
			}
			TokenKind::Elseif { predicate_expr } => {
				close_branch_and_reopen(&mut stack, token)?;
				let mut node = Node::new(NodeKind::ElseifCondition, token.span.clone());
				node.attrs.condition = Some(ConditionAttrs {
					predicate_expr: predicate_expr.clone(),
				});
				stack.push(Frame::ElseifOrElse(node));
			}
			TokenKind::Else => {
				close_branch_and_reopen(&mut stack, token)?;
				let node = Node::new(NodeKind::ElseCondition, token.span.clone());
				stack.push(Frame::ElseifOrElse(node));
			}
			TokenKind::IfEnd => {
				// pop a trailing elseif/else branch (if any), then the if itself
				if matches!(stack.last(), Some(Frame::ElseifOrElse(_))) {
					let branch = stack.pop().unwrap().into_node();
					attach(&mut stack, branch);
				}
				pop_matching(&mut stack, "if", token)?;
			}
			TokenKind::BlockStart { name } => {
				let mut node = Node::new(NodeKind::Block, token.span.clone());
				node.attrs.block = Some(BlockAttrs { name: name.clone() });
				stack.push(Frame::Block(node));
			}
			TokenKind::BlockEnd => {
				pop_matching(&mut stack, "block", token)?;
			}
			TokenKind::MacroStart { name, signature } => {
				let mut node = Node::new(NodeKind::Macro, token.span.clone());
				node.attrs.macro_def = Some(MacroAttrs {
					name: name.clone(),
					signature: signature.clone(),
				});
				stack.push(Frame::Macro(node));
			}
			TokenKind::MacroEnd => {
				pop_matching(&mut stack, "macro", token)?;
			}
		}
	}

	if stack.len() != 1 {
		let unclosed: Vec<_> = stack[1..].iter().map(|f| f.kind_name()).collect();
		return Err(CompileError::new(CompileErrorKind::StructureError(format!(
			"unclosed block(s) at end of template: {}",
			unclosed.join(", ")
		))));
	}

	Ok(stack.pop().unwrap().into_node())
}

/// When hitting `elseif`/`else`, the currently open branch (if/elseif) is
/// popped and attached to its enclosing `IF_CONDITION` before the new
/// branch is pushed.
fn close_branch_and_reopen(stack: &mut Vec<Frame>, token: &Token) -> Result<(), CompileError> {
	match stack.last() {
		Some(Frame::If(_)) | Some(Frame::ElseifOrElse(_)) => {
			let branch = stack.pop().unwrap();
			let closed = branch.into_node();
			match closed.kind {
				NodeKind::IfCondition => {
					// keep the `if` open; push it back, its body stays attached via children
					stack.push(Frame::If(closed));
				}
				_ => {
					// an elseif/else branch: attach to the enclosing if
					stack.last_mut().unwrap().node_mut().children.push(closed);
				}
			}
			Ok(())
		}
		_ => Err(structure_error("`elseif`/`else` with no matching `if`", token)),
	}
}

fn pop_matching(stack: &mut Vec<Frame>, expected: &str, token: &Token) -> Result<(), CompileError> {
	let matches = match (stack.last(), expected) {
		(Some(Frame::For(_)), "for") => true,
		(Some(Frame::If(_)), "if") => true,
		(Some(Frame::Block(_)), "block") => true,
		(Some(Frame::Macro(_)), "macro") => true,
		_ => false,
	};
	if !matches {
		return Err(structure_error(
			&format!("`end{expected}` with no matching opener"),
			token,
		));
	}
	let node = stack.pop().unwrap().into_node();
	stack.last_mut().unwrap().node_mut().children.push(node);
	Ok(())
}

fn structure_error(message: &str, token: &Token) -> CompileError {
	CompileError::new(CompileErrorKind::StructureError(message.to_string())).at(token.span.clone())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_simple_variable() {
		let parsed = parse("t", "Hello {{ name }}").unwrap();
		assert_eq!(parsed.root.children.len(), 2);
		assert_eq!(parsed.root.children[0].kind, NodeKind::Text);
		assert_eq!(parsed.root.children[1].kind, NodeKind::Variable);
	}

	#[test]
	fn parses_if_elseif_else_chain() {
		let parsed = parse(
			"t",
			"{% if a %}A{% elseif b %}B{% else %}C{% endif %}",
		)
		.unwrap();
		let if_node = &parsed.root.children[0];
		assert_eq!(if_node.kind, NodeKind::IfCondition);
		assert_eq!(if_node.children.len(), 3); // text "A" + elseif + else
		assert_eq!(if_node.children[0].kind, NodeKind::Text);
		assert_eq!(if_node.children[1].kind, NodeKind::ElseifCondition);
		assert_eq!(if_node.children[2].kind, NodeKind::ElseCondition);
	}

	#[test]
	fn unbalanced_closer_is_a_structure_error() {
		assert!(parse("t", "{% endif %}").is_err());
	}

	#[test]
	fn unclosed_block_at_eof_is_a_structure_error() {
		assert!(parse("t", "{% if a %}A").is_err());
	}

	#[test]
	fn round_trip_text_matches_cleaned_source_minus_directives() {
		let source = "Hello {{ name }}, {% if x %}yes{% endif %} end";
		let parsed = parse("t", source).unwrap();
		assert_eq!(parsed.root.text_leaves(), "Hello , yes end");
	}

	#[test]
	fn parent_outside_block_is_rejected() {
		assert!(parse("t", "{{ parent() }}").is_err());
	}

	#[test]
	fn parent_inside_block_is_accepted() {
		let parsed = parse("t", "{% block b %}[{{ parent() }}]{% endblock %}").unwrap();
		let block = &parsed.root.children[0];
		assert_eq!(block.children[1].kind, NodeKind::Parent);
	}
}
