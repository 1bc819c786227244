//! Crate-level coverage for the testable properties of spec §8 that don't
//! already have a natural home as an inline unit test next to the module
//! they exercise (parser round-trip, inheritance idempotence/composition,
//! cycle detection, constant-folder purity, dead-branch equivalence, and
//! macro binding laws all live beside their modules instead).

use std::time::Duration;

use tmplc::core::CompileErrorKind;
use tmplc::loader::MapLoader;
use tmplc::parser::parse;
use tmplc::ratelimit::{Decision, RateLimiter};
use tmplc::tree::NodeKind;
use tmplc::{CompilerOptions, Compiler};

/// Property 2: tree well-formedness. `ELSEIF`/`ELSE` only ever appear as
/// children of an `IF_CONDITION`, `PARENT` only inside a `BLOCK`, and
/// `EXTENDS`/`IMPORT` only as direct children of the root — walk a tree
/// exercising every directive and confirm the shape holds everywhere.
#[test]
fn property_2_tree_well_formedness() {
	let source = r#"{% extends "base" %}
{% import "buttons" as ui %}
{% block body %}
  {% for item in items %}
    {% if item.active %}A{% elseif item.pending %}P{% else %}N{% endif %}
    {{ parent() }}
  {% endfor %}
{% endblock %}"#;
	let root = parse("t", source).unwrap().root;
	assert_well_formed(&root, &[]);
}

fn assert_well_formed(node: &tmplc::Node, ancestors: &[NodeKind]) {
	match node.kind {
		NodeKind::ElseifCondition | NodeKind::ElseCondition => {
			assert_eq!(
				ancestors.last(),
				Some(&NodeKind::IfCondition),
				"ELSEIF/ELSE must be a direct child of IF_CONDITION"
			);
		}
		NodeKind::Parent => {
			assert!(ancestors.contains(&NodeKind::Block), "parent() must appear inside a BLOCK");
		}
		NodeKind::Extends | NodeKind::Import => {
			assert_eq!(ancestors, &[NodeKind::Root], "EXTENDS/IMPORT must be a direct child of the root");
		}
		_ => {}
	}
	let mut path = ancestors.to_vec();
	path.push(node.kind);
	for child in &node.children {
		assert_well_formed(child, &path);
	}
}

/// Property 9: after `max_attempts` accepted checks within the window, the
/// next check is rejected; after the window elapses, checks succeed again;
/// `remaining` plus what was accepted equals `max_attempts`; `wait_time`
/// never exceeds the window.
#[test]
fn property_9_rate_limiter_sliding_window() {
	let limiter = RateLimiter::new(3, 1);
	for _ in 0..3 {
		assert_eq!(limiter.check("k"), Decision::Accepted);
	}
	assert_eq!(limiter.remaining("k") + 3, 3);

	match limiter.check("k") {
		Decision::Rejected { wait_seconds } => assert!(wait_seconds <= 1),
		Decision::Accepted => panic!("expected rejection at the attempt limit"),
	}
	assert!(limiter.wait_time("k") <= 1);

	std::thread::sleep(Duration::from_millis(1100));
	assert_eq!(limiter.check("k"), Decision::Accepted);
}

/// End-to-end: `compile` surfaces the same `RateLimitExceeded` the
/// standalone limiter would, once the configured attempt budget is spent.
#[test]
fn property_9_compiler_surfaces_rate_limit_exceeded() {
	let options = CompilerOptions::default().with_rate_limit(1, 60);
	let compiler = Compiler::new(options);
	let loader = MapLoader::new();
	assert!(compiler.compile(Some("t"), "x", &loader).is_ok());
	let err = compiler.compile(Some("t"), "x", &loader).unwrap_err();
	assert!(matches!(err.kind, CompileErrorKind::RateLimitExceeded { .. }));
}
