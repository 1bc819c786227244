use crate::core::Span;

/// A single call in a `{{ expr | filter [: args] }}` filter chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCall {
	pub name: String,
	pub args: Vec<String>,
}

/// Per-kind attributes captured from the source directive.
///
/// The spec's data model describes a generic `capture_groups` map; this
/// crate promotes those captures to a typed struct per node kind instead, as
/// suggested in the design notes.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NodeAttrs {
	pub variable: Option<VariableAttrs>,
	pub for_loop: Option<ForLoopAttrs>,
	pub condition: Option<ConditionAttrs>,
	pub extends: Option<ExtendsAttrs>,
	pub block: Option<BlockAttrs>,
	pub macro_def: Option<MacroAttrs>,
	pub import: Option<ImportAttrs>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableAttrs {
	pub expr: String,
	pub filters: Vec<FilterCall>,
	/// Precomputed at parse time: `Some((callee, raw_args))` when `expr`
	/// looks like `NAME(ARGS)` or `ALIAS.NAME(ARGS)`.
	pub call_shape: Option<(String, String)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForLoopAttrs {
	pub item_name: String,
	pub iterable_expr: String,
	pub filter_expr: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionAttrs {
	pub predicate_expr: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendsAttrs {
	pub parent_path: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockAttrs {
	pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroAttrs {
	pub name: String,
	pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportAttrs {
	pub path: String,
	pub alias: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	Root,
	Text,
	Variable,
	ForLoop,
	IfCondition,
	ElseifCondition,
	ElseCondition,
	Extends,
	Block,
	Parent,
	Macro,
	Import,
}

/// A node of the template syntax tree.
///
/// A node is owned exclusively by its parent; the root is owned by the
/// [`crate::ParsedTemplate`] that produced it. Passes rewrite the tree by
/// cloning rather than mutating shared structure (see `span` §4.3/§4.6 of
/// the design notes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
	pub kind: NodeKind,
	pub literal_text: String,
	pub attrs: NodeAttrs,
	pub span: Span,
	pub children: Vec<Node>,
}

impl Node {
	pub fn new(kind: NodeKind, span: Span) -> Self {
		Node {
			kind,
			literal_text: String::new(),
			attrs: NodeAttrs::default(),
			span,
			children: Vec::new(),
		}
	}

	pub fn text(span: Span, text: impl Into<String>) -> Self {
		Node {
			literal_text: text.into(),
			..Node::new(NodeKind::Text, span)
		}
	}

	pub fn with_children(mut self, children: Vec<Node>) -> Self {
		self.children = children;
		self
	}

	/// Depth-first concatenation of every `TEXT` leaf's literal text. Used
	/// by the parser round-trip property test.
	pub fn text_leaves(&self) -> String {
		let mut out = String::new();
		self.collect_text_leaves(&mut out);
		out
	}

	fn collect_text_leaves(&self, out: &mut String) {
		if self.kind == NodeKind::Text {
			out.push_str(&self.literal_text);
		}
		for child in &self.children {
			child.collect_text_leaves(out);
		}
	}

	/// Depth-first traversal yielding every `BLOCK` descendant, including
	/// the receiver if it is itself a block.
	pub fn blocks<'a>(&'a self) -> Vec<&'a Node> {
		let mut out = Vec::new();
		self.collect_blocks(&mut out);
		out
	}

	fn collect_blocks<'a>(&'a self, out: &mut Vec<&'a Node>) {
		if self.kind == NodeKind::Block {
			out.push(self);
		}
		for child in &self.children {
			child.collect_blocks(out);
		}
	}

	pub fn block_name(&self) -> Option<&str> {
		self.attrs.block.as_ref().map(|b| b.name.as_str())
	}
}
