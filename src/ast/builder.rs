//! # Node Builder
//!
//! Assembles [`GenericNode`]s by constructor and field name, checking each
//! value against the grammar as it is added. Used by front ends and tests to
//! write trees by hand.
//!
//! ```rust
//! use asdl::ast::NodeBuilder;
//! use asdl::grammar::Grammar;
//!
//! let grammar = Grammar::from_text("Expr = Add(Expr left, Expr right) | Num(int value)").unwrap();
//! let two = NodeBuilder::new(&grammar, "Num").unwrap().token("value", "2").unwrap().build();
//! let three = NodeBuilder::new(&grammar, "Num").unwrap().token("value", "3").unwrap().build();
//! let sum = NodeBuilder::new(&grammar, "Add").unwrap()
//!     .child("left", two).unwrap()
//!     .child("right", three).unwrap()
//!     .build();
//! assert_eq!(sum.size(), 3);
//! ```

use super::{GenericNode, RealizedField, Value};
use crate::errors::AsdlError;
use crate::grammar::{Cardinality, Grammar, Production};

pub struct NodeBuilder<'g> {
    grammar: &'g Grammar,
    production: &'g Production,
    node: GenericNode,
}

impl<'g> NodeBuilder<'g> {
    pub fn new(grammar: &'g Grammar, constructor: &str) -> Result<Self, AsdlError> {
        let production = grammar.production_by_constructor(constructor)?;
        Ok(Self {
            grammar,
            production,
            node: GenericNode::new(production),
        })
    }

    /// Adds a child node to a composite field.
    pub fn child(mut self, field: &str, node: GenericNode) -> Result<Self, AsdlError> {
        self.push(field, Value::Node(node), true)?;
        Ok(self)
    }

    /// Adds child nodes to a `multiple` composite field, in order.
    pub fn children(
        mut self,
        field: &str,
        nodes: impl IntoIterator<Item = GenericNode>,
    ) -> Result<Self, AsdlError> {
        self.open_sequence(field)?;
        for node in nodes {
            self.push(field, Value::Node(node), true)?;
        }
        Ok(self)
    }

    /// Sets a primitive field (or appends, for `multiple` primitives).
    pub fn token(mut self, field: &str, token: impl Into<String>) -> Result<Self, AsdlError> {
        self.push(field, Value::Token(token.into()), false)?;
        Ok(self)
    }

    pub fn tokens<S: Into<String>>(
        mut self,
        field: &str,
        tokens: impl IntoIterator<Item = S>,
    ) -> Result<Self, AsdlError> {
        self.open_sequence(field)?;
        for token in tokens {
            self.push(field, Value::Token(token.into()), false)?;
        }
        Ok(self)
    }

    /// Marks a `multiple` field as explicitly empty.
    pub fn empty(mut self, field: &str) -> Result<Self, AsdlError> {
        self.open_sequence(field)?;
        Ok(self)
    }

    pub fn build(self) -> GenericNode {
        self.node
    }

    fn slot(&mut self, field: &str) -> Result<&mut RealizedField, AsdlError> {
        let production = self.production;
        let index = production
            .fields
            .iter()
            .position(|f| f.name == field)
            .ok_or_else(|| AsdlError::field_extraction(&production.constructor, field))?;
        Ok(&mut self.node.fields[index])
    }

    /// Marks `field` empty, failing unless it is a `multiple` field.
    fn open_sequence(&mut self, field: &str) -> Result<(), AsdlError> {
        let production = self.production;
        let constructor = &production.constructor;
        let slot = self.slot(field)?;
        if slot.cardinality != Cardinality::Multiple {
            return Err(AsdlError::violation(format!(
                "{}.{} is not a multiple field",
                constructor, field
            )));
        }
        slot.init_empty();
        Ok(())
    }

    fn push(&mut self, field: &str, value: Value, composite: bool) -> Result<(), AsdlError> {
        let grammar = self.grammar;
        let production = self.production;
        let constructor = &production.constructor;
        let slot = self.slot(field)?;
        if grammar.is_composite(slot.ty) != composite {
            return Err(AsdlError::violation(format!(
                "{}.{} has type {}, which does not take this kind of value",
                constructor,
                field,
                grammar.type_name(slot.ty)
            )));
        }
        if let Value::Node(child) = &value {
            let lhs = grammar
                .get_production(child.production)
                .map(|p| p.lhs)
                .ok_or_else(|| {
                    AsdlError::violation(format!(
                        "{}.{} got a node of unknown production #{}",
                        constructor, field, child.production.0
                    ))
                })?;
            if lhs != slot.ty {
                return Err(AsdlError::violation(format!(
                    "{}.{} expects {}, found {}",
                    constructor,
                    field,
                    grammar.type_name(slot.ty),
                    grammar.type_name(lhs)
                )));
            }
        }
        slot.add_value(value)
    }
}
