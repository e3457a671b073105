// Grammar loading: parsing, name resolution, and the closed-world checks.

mod common;

use asdl::grammar::{Cardinality, Grammar, GrammarConfig, TypeKind};
use asdl::{ErrorCategory, ErrorKind};
use common::{EXPR_GRAMMAR, PY_SUBSET};

#[test]
fn expr_grammar_has_one_type_and_two_productions() {
    let grammar = Grammar::from_text(EXPR_GRAMMAR).unwrap();
    let expr = grammar.type_by_name("Expr").unwrap();

    assert_eq!(grammar.productions().len(), 2);
    assert_eq!(grammar.production_ids_for(expr).len(), 2);

    let add = grammar.production_by_constructor("Add").unwrap();
    assert_eq!(add.lhs, expr);
    let fields: Vec<_> = add.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, ["left", "right"]);
    assert!(add.fields.iter().all(|f| f.cardinality == Cardinality::Single));

    let num = grammar.production_by_constructor("Num").unwrap();
    assert_eq!(grammar.type_name(num.fields[0].ty), "int");
    assert_eq!(grammar.asdl_type(num.fields[0].ty).kind, TypeKind::Primitive);
}

#[test]
fn cardinality_markers_resolve() {
    let grammar = Grammar::from_text(PY_SUBSET).unwrap();
    let import_from = grammar.production_by_constructor("ImportFrom").unwrap();

    let cardinalities: Vec<_> = import_from.fields.iter().map(|f| f.cardinality).collect();
    assert_eq!(
        cardinalities,
        [Cardinality::Optional, Cardinality::Multiple, Cardinality::Optional]
    );
    assert_eq!(grammar.render_production(import_from), "ImportFrom(identifier? module, alias* names, int? level)");
}

#[test]
fn zero_field_constructors_are_productions() {
    let grammar = Grammar::from_text(PY_SUBSET).unwrap();
    let pass = grammar.production_by_constructor("Pass").unwrap();
    assert!(pass.fields.is_empty());
    assert_eq!(grammar.type_name(pass.lhs), "stmt");
    assert_eq!(grammar.render_production(pass), "Pass");
}

#[test]
fn root_type_defaults_to_first_declared_type() {
    let grammar = Grammar::from_text(PY_SUBSET).unwrap();
    assert_eq!(grammar.type_name(grammar.root_type()), "mod");

    let config = GrammarConfig {
        root_type: Some("stmt".into()),
        ..GrammarConfig::default()
    };
    let grammar = Grammar::from_text_with_config(PY_SUBSET, config).unwrap();
    assert_eq!(grammar.type_name(grammar.root_type()), "stmt");
}

#[test]
fn unknown_root_type_is_rejected() {
    let err = Grammar::from_text(EXPR_GRAMMAR)
        .unwrap()
        .with_root_type("Stmt")
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownType { .. }));
}

#[test]
fn lookups_of_missing_names_fail() {
    let grammar = Grammar::from_text(EXPR_GRAMMAR).unwrap();
    let err = grammar.production_by_constructor("Mul").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnknownConstructor);
    assert!(grammar.type_by_name("Stmt").is_err());
}

#[test]
fn display_reparses_to_the_same_productions() {
    let grammar = Grammar::from_text(PY_SUBSET).unwrap();
    let reparsed = Grammar::from_text(&grammar.to_string()).unwrap();
    assert_eq!(grammar.productions(), reparsed.productions());
    assert_eq!(grammar.root_type(), reparsed.root_type());
}

#[test]
fn sample_grammar_lints_clean() {
    let grammar = Grammar::from_text(PY_SUBSET).unwrap();
    assert!(grammar.lint().is_empty(), "{:?}", grammar.lint());
}

#[test]
fn unreachable_type_is_reported() {
    let grammar = Grammar::from_text("Expr = Num(int value)\nStmt = Pass").unwrap();
    let warnings = grammar.lint();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Stmt"));
}

// ============================================================================
// Load failures
// ============================================================================

#[test]
fn duplicate_constructor_fails() {
    let err = Grammar::from_text("Expr = Num(int value) | Num(float value)").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateConstructor { ref constructor } if constructor == "Num"));
    assert_eq!(err.category(), ErrorCategory::GrammarSyntax);
    assert!(err.source_info.is_some());
}

#[test]
fn duplicate_constructor_across_types_fails() {
    let err = Grammar::from_text("A = X(int v)\nB = X").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateConstructor { .. }));
}

#[test]
fn undeclared_field_type_fails() {
    let err = Grammar::from_text("Expr = Call(Func func)").unwrap_err();
    match err.kind {
        ErrorKind::UndeclaredType {
            type_name,
            constructor,
        } => {
            assert_eq!(type_name, "Func");
            assert_eq!(constructor, "Call");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn conflicting_markers_fail() {
    let err = Grammar::from_text("Expr = Call(Expr?* args)").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CardinalityConflict { .. }));
    assert_eq!(err.category(), ErrorCategory::GrammarSyntax);
}

#[test]
fn unbalanced_parenthesis_fails() {
    let err = Grammar::from_text("Expr = Num(int value").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::GrammarSyntax);
    assert!(err.to_string().contains("unbalanced"));
}

#[test]
fn empty_grammar_fails() {
    let err = Grammar::from_text("-- nothing here\n").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::GrammarSyntax);
}

#[test]
fn type_redefining_a_primitive_fails() {
    let err = Grammar::from_text("int = Big(string digits)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::GrammarSyntax);
}

#[test]
fn primitive_header_declares_extra_types() {
    let grammar = Grammar::from_text("char\nExpr = Chr(char c)").unwrap();
    let chr = grammar.production_by_constructor("Chr").unwrap();
    assert!(!grammar.is_composite(chr.fields[0].ty));
    assert_eq!(grammar.type_name(chr.fields[0].ty), "char");
}
