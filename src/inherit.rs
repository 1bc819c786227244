//! The inheritance resolver: merges a child template's `{% block %}`
//! overrides into its parent (transitively), per spec §4.3.

use std::collections::HashMap;

use tracing::debug;

use crate::core::{CompileError, CompileErrorKind};
use crate::loader::Loader;
use crate::parser;
use crate::tree::{Node, NodeKind};

/// Resolves inheritance for `root`, which was parsed from the template
/// named `name`. If `root` has no `EXTENDS` child the tree is returned
/// unchanged (spec property: inheritance idempotence).
pub fn resolve(name: &str, root: &Node, loader: &dyn Loader) -> Result<Node, CompileError> {
	let mut visiting = vec![name.to_string()];
	resolve_with_visiting(name, root, loader, &mut visiting)
}

fn resolve_with_visiting(
	name: &str,
	root: &Node,
	loader: &dyn Loader,
	visiting: &mut Vec<String>,
) -> Result<Node, CompileError> {
	let Some(extends) = root.children.iter().find(|c| c.kind == NodeKind::Extends) else {
		return Ok(root.clone());
	};
	let parent_path = &extends
		.attrs
		.extends
		.as_ref()
		.expect("EXTENDS node always carries ExtendsAttrs")
		.parent_path;

	if visiting.contains(parent_path) {
		let mut cycle = visiting.clone();
		cycle.push(parent_path.clone());
		return Err(CompileError::new(CompileErrorKind::CyclicInheritance(cycle)).in_template(name));
	}

	debug!(template = name, parent = parent_path, "resolving inheritance");

	let parent_source = loader.load(parent_path)?;
	let parent_parsed = parser::parse(parent_path, &parent_source)?;

	visiting.push(parent_path.clone());
	let resolved_parent = resolve_with_visiting(parent_path, &parent_parsed.root, loader, visiting)?;
	visiting.pop();

	let mut child_blocks: HashMap<String, &Node> = HashMap::new();
	for block in root.blocks() {
		if let Some(block_name) = block.block_name() {
			// "later definitions of the same name within the child override
			// earlier ones" — a plain insert already does this since
			// `blocks()` walks depth-first in source order.
			child_blocks.insert(block_name.to_string(), block);
		}
	}

	Ok(substitute(&resolved_parent, &child_blocks))
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

fn substitute(node: &Node, child_blocks: &HashMap<String, &Node>) -> Node {
	if node.kind == NodeKind::Block {
		if let Some(name) = node.block_name() {
			if let Some(child_block) = child_blocks.get(name) {
				return substitute_block(node, child_block, child_blocks);
			}
		}
	}

	let mut new_node = clone_shallow(node);
	new_node.children = node.children.iter().map(|c| substitute(c, child_blocks)).collect();
	new_node
}

/// Splices `child_block`'s content into `parent_block`'s identity, expanding
/// any `PARENT` node into the parent block's own (recursively substituted)
/// children.
fn substitute_block(parent_block: &Node, child_block: &Node, child_blocks: &HashMap<String, &Node>) -> Node {
	let mut new_block = clone_shallow(parent_block);
	let mut children = Vec::new();
	for child in &child_block.children {
		if child.kind == NodeKind::Parent {
			children.extend(parent_block.children.iter().map(|c| substitute(c, child_blocks)));
		} else {
			children.push(substitute(child, child_blocks));
		}
	}
	new_block.children = children;
	new_block
}
