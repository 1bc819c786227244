//! Dead-branch elimination (spec §4.6): rewrites `if`/`elseif`/`else`
//! groups whose predicates fold to a constant, only ever using the
//! group-aware behaviour (the spec explicitly drops the legacy per-node
//! path some source ecosystems keep around).

use super::fold::fold;
use crate::tree::{ConditionAttrs, Node, NodeKind};

/// Recursively eliminates dead branches throughout `node`, returning a
/// freshly built tree. `node` is not mutated.
pub fn eliminate(node: &Node) -> Node {
	Node {
		children: optimize_children(&node.children),
		..clone_shallow(node)
	}
}

fn clone_shallow(node: &Node) -> Node {
	Node {
		kind: node.kind,
		literal_text: node.literal_text.clone(),
		attrs: node.attrs.clone(),
		span: node.span.clone(),
		children: Vec::new(),
	}
}

fn optimize_children(children: &[Node]) -> Vec<Node> {
	let mut out = Vec::new();
	for child in children {
		if child.kind == NodeKind::IfCondition {
			out.extend(eliminate_if_group(child));
		} else {
			out.push(eliminate(child));
		}
	}
	out
}

struct Branch<'a> {
	source: &'a Node,
	predicate: Option<&'a str>,
	body: &'a [Node],
}

fn collect_branches(if_node: &Node) -> Vec<Branch<'_>> {
	let tail_start = if_node
		.children
		.iter()
		.position(|c| matches!(c.kind, NodeKind::ElseifCondition | NodeKind::ElseCondition))
		.unwrap_or(if_node.children.len());

	let mut branches = vec![Branch {
		source: if_node,
		predicate: Some(
			if_node
				.attrs
				.condition
				.as_ref()
				.expect("IF_CONDITION carries ConditionAttrs")
				.predicate_expr
				.as_str(),
		),
		body: &if_node.children[..tail_start],
	}];

	for child in &if_node.children[tail_start..] {
		let predicate = child.attrs.condition.as_ref().map(|c| c.predicate_expr.as_str());
		branches.push(Branch {
			source: child,
			predicate,
			body: &child.children,
		});
	}
	branches
}

fn is_constant_true(folded: &str) -> bool {
	matches!(folded, "true" | "1")
}

fn is_constant_false(folded: &str) -> bool {
	matches!(folded, "false" | "0")
}

/// Returns the replacement children for an `IF_CONDITION` group: the
/// winning branch's optimised body, a reconstructed group starting at the
/// first non-constant branch, or nothing if every branch was eliminated.
fn eliminate_if_group(if_node: &Node) -> Vec<Node> {
	let branches = collect_branches(if_node);

	for (idx, branch) in branches.iter().enumerate() {
		match branch.predicate {
			None => return optimize_children(branch.body),
			Some(predicate) => {
				let folded = fold(predicate);
				if is_constant_true(&folded) {
					return optimize_children(branch.body);
				} else if is_constant_false(&folded) {
					continue;
				} else {
					return vec![reconstruct_group(&branches[idx..])];
				}
			}
		}
	}
	Vec::new()
}

fn reconstruct_group(branches: &[Branch]) -> Node {
	let head = &branches[0];
	let mut new_if = Node {
		kind: NodeKind::IfCondition,
		literal_text: String::new(),
		attrs: head.source.attrs.clone(),
		span: head.source.span.clone(),
		children: optimize_children(head.body),
	};
	// `head` may originally have been an ELSEIF promoted to the group's new
	// `if`; make sure its predicate attrs reflect that (kind carries no
	// predicate text itself, `ConditionAttrs` already does, so nothing else
	// to adjust here).
	new_if.attrs.condition = Some(ConditionAttrs {
		predicate_expr: head.predicate.expect("non-constant branch always has a predicate").to_string(),
	});

	for branch in &branches[1..] {
		let node = Node {
			kind: branch.source.kind,
			literal_text: String::new(),
			attrs: branch.source.attrs.clone(),
			span: branch.source.span.clone(),
			children: optimize_children(branch.body),
		};
		new_if.children.push(node);
	}
	new_if
}
