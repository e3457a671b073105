//! # Shared fixtures
//!
//! Grammars and hand-built trees used across the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use asdl::ast::{GenericNode, NodeBuilder};
use asdl::grammar::{Grammar, GrammarConfig};
use asdl::transition::TransitionSystem;

pub const EXPR_GRAMMAR: &str = "Expr = Add(Expr left, Expr right) | Num(int value)";

pub const PY_SUBSET: &str = include_str!("../../grammars/py3_subset.asdl");

pub fn expr_grammar() -> Arc<Grammar> {
    Arc::new(Grammar::from_text(EXPR_GRAMMAR).unwrap())
}

pub fn py_grammar() -> Arc<Grammar> {
    Arc::new(Grammar::from_text(PY_SUBSET).unwrap())
}

pub fn py_grammar_with(config: GrammarConfig) -> Arc<Grammar> {
    Arc::new(Grammar::from_text_with_config(PY_SUBSET, config).unwrap())
}

pub fn system(grammar: &Arc<Grammar>) -> TransitionSystem {
    TransitionSystem::new(Arc::clone(grammar))
}

pub fn num(grammar: &Grammar, value: &str) -> GenericNode {
    NodeBuilder::new(grammar, "Num")
        .unwrap()
        .token("value", value)
        .unwrap()
        .build()
}

pub fn add(grammar: &Grammar, left: GenericNode, right: GenericNode) -> GenericNode {
    NodeBuilder::new(grammar, "Add")
        .unwrap()
        .child("left", left)
        .unwrap()
        .child("right", right)
        .unwrap()
        .build()
}

/// `Add(Num 2, Num 3)`
pub fn two_plus_three(grammar: &Grammar) -> GenericNode {
    add(grammar, num(grammar, "2"), num(grammar, "3"))
}

// ----------------------------------------------------------------------------
// Python subset
// ----------------------------------------------------------------------------

pub fn name(grammar: &Grammar, id: &str) -> GenericNode {
    NodeBuilder::new(grammar, "Name")
        .unwrap()
        .token("id", id)
        .unwrap()
        .build()
}

pub fn string(grammar: &Grammar, text: &str) -> GenericNode {
    NodeBuilder::new(grammar, "Str")
        .unwrap()
        .token("s", text)
        .unwrap()
        .build()
}

pub fn module(grammar: &Grammar, body: Vec<GenericNode>) -> GenericNode {
    NodeBuilder::new(grammar, "Module")
        .unwrap()
        .children("body", body)
        .unwrap()
        .build()
}

pub fn expr_stmt(grammar: &Grammar, value: GenericNode) -> GenericNode {
    NodeBuilder::new(grammar, "Expr")
        .unwrap()
        .child("value", value)
        .unwrap()
        .build()
}

/// `f(args...)` with no keywords.
pub fn call(grammar: &Grammar, func: &str, args: Vec<GenericNode>) -> GenericNode {
    NodeBuilder::new(grammar, "Call")
        .unwrap()
        .child("func", name(grammar, func))
        .unwrap()
        .children("args", args)
        .unwrap()
        .empty("keywords")
        .unwrap()
        .build()
}

pub fn alias(grammar: &Grammar, name: &str) -> GenericNode {
    NodeBuilder::new(grammar, "alias")
        .unwrap()
        .token("name", name)
        .unwrap()
        .build()
}

/// `from <module> import <names...>`, relative level left unset.
pub fn import_from(grammar: &Grammar, module: &str, names: &[&str]) -> GenericNode {
    NodeBuilder::new(grammar, "ImportFrom")
        .unwrap()
        .token("module", module)
        .unwrap()
        .children("names", names.iter().map(|n| alias(grammar, n)))
        .unwrap()
        .build()
}
