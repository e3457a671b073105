// Generic trees: construction, validation, equality and rendering.

mod common;

use asdl::ast::{FieldValue, GenericNode, NodeBuilder, Value};
use asdl::{ErrorCategory, Grammar};
use common::*;

#[test]
fn new_node_has_one_unset_field_per_declared_field() {
    let grammar = py_grammar();
    let production = grammar.production_by_constructor("ImportFrom").unwrap();
    let node = GenericNode::new(production);

    assert_eq!(node.fields.len(), 3);
    assert!(node.fields.iter().all(|f| f.value.is_unset()));
    assert_eq!(node.created_at, None);
}

#[test]
fn builder_binds_fields_by_name() {
    let grammar = expr_grammar();
    let tree = two_plus_three(&grammar);

    assert_eq!(tree.size(), 3);
    let left = tree.field(&grammar, "left").unwrap();
    let child = left.values()[0].as_node().unwrap();
    let value = child.field(&grammar, "value").unwrap();
    assert_eq!(value.value, FieldValue::Single(Value::Token("2".into())));
    tree.validate(&grammar).unwrap();
}

#[test]
fn builder_rejects_wrong_field_kinds() {
    let grammar = expr_grammar();

    let err = NodeBuilder::new(&grammar, "Num")
        .unwrap()
        .child("value", num(&grammar, "1"))
        .err()
        .unwrap();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);

    let err = NodeBuilder::new(&grammar, "Add")
        .unwrap()
        .token("left", "1")
        .err()
        .unwrap();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);

    let err = NodeBuilder::new(&grammar, "Add")
        .unwrap()
        .token("middle", "1")
        .err()
        .unwrap();
    assert_eq!(err.category(), ErrorCategory::FieldExtraction);
}

#[test]
fn builder_rejects_child_of_wrong_type() {
    let grammar = py_grammar();
    let pass = NodeBuilder::new(&grammar, "Pass").unwrap().build();
    let err = NodeBuilder::new(&grammar, "Expr")
        .unwrap()
        .child("value", pass)
        .err()
        .unwrap();
    assert!(err.to_string().contains("expects expr"));
}

#[test]
fn single_field_takes_one_value_only() {
    let grammar = expr_grammar();
    let err = NodeBuilder::new(&grammar, "Num")
        .unwrap()
        .token("value", "1")
        .unwrap()
        .token("value", "2")
        .err()
        .unwrap();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);
}

#[test]
fn empty_and_unset_multiple_fields_differ() {
    let grammar = py_grammar();
    let empty = module(&grammar, Vec::new());
    let unset = GenericNode::new(grammar.production_by_constructor("Module").unwrap());

    assert_eq!(empty.fields[0].value, FieldValue::Empty);
    assert!(unset.fields[0].value.is_unset());
    assert_ne!(empty, unset);
    empty.validate(&grammar).unwrap();
    assert!(unset.validate(&grammar).is_err());
}

#[test]
fn validate_flags_unset_single_field() {
    let grammar = expr_grammar();
    let node = GenericNode::new(grammar.production_by_constructor("Add").unwrap());
    let err = node.validate(&grammar).unwrap_err();
    assert!(err.to_string().contains("Add.left is unset"));
}

#[test]
fn validate_accepts_unset_optional_field() {
    let grammar = py_grammar();
    let ret = NodeBuilder::new(&grammar, "Return").unwrap().build();
    ret.validate(&grammar).unwrap();
}

#[test]
fn validate_respects_allow_empty_multiple() {
    let strict = Grammar::from_text_with_config(
        PY_SUBSET,
        asdl::GrammarConfig {
            allow_empty_multiple: false,
            ..Default::default()
        },
    )
    .unwrap();
    let tree = module(&strict, Vec::new());
    assert!(tree.validate(&strict).is_err());
}

#[test]
fn equality_ignores_creation_time() {
    let grammar = expr_grammar();
    let a = two_plus_three(&grammar);
    let mut b = a.clone();
    b.created_at = Some(7);
    assert_eq!(a, b);

    let c = add(&grammar, num(&grammar, "2"), num(&grammar, "4"));
    assert_ne!(a, c);
}

#[test]
fn clone_is_a_deep_copy() {
    let grammar = expr_grammar();
    let original = two_plus_three(&grammar);
    let mut copy = original.clone();
    copy.fields[0].value = FieldValue::Single(Value::Node(num(&grammar, "9")));

    let left = original.fields[0].values()[0].as_node().unwrap();
    assert_eq!(left, &num(&grammar, "2"));
}

#[test]
fn display_renders_s_expression() {
    let grammar = expr_grammar();
    let tree = two_plus_three(&grammar);
    assert_eq!(
        tree.display(&grammar).to_string(),
        "(Add (left (Num (value 2))) (right (Num (value 3))))"
    );

    let py = py_grammar();
    assert_eq!(module(&py, Vec::new()).display(&py).to_string(), "(Module (body []))");
}

#[test]
fn sequence_builders_require_multiple_fields() {
    let grammar = py_grammar();

    let err = NodeBuilder::new(&grammar, "Return")
        .unwrap()
        .children("value", Vec::new())
        .err()
        .unwrap();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);
    assert!(err.to_string().contains("Return.value is not a multiple field"));

    let err = NodeBuilder::new(&grammar, "ImportFrom")
        .unwrap()
        .tokens("module", ["os"])
        .err()
        .unwrap();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);

    assert!(NodeBuilder::new(&grammar, "Name").unwrap().empty("id").is_err());
}

#[test]
fn validate_rejects_unknown_production_id() {
    let grammar = expr_grammar();
    let mut tree = two_plus_three(&grammar);
    if let FieldValue::Single(Value::Node(left)) = &mut tree.fields[0].value {
        left.production = asdl::ProductionId(50);
    }
    let err = tree.validate(&grammar).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::GrammarViolation);
    assert!(err.to_string().contains("#50"));
}
