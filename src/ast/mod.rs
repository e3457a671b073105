//! Generic typed trees.
//!
//! A [`GenericNode`] binds one grammar production to exactly one
//! [`RealizedField`] per declared field, in declared order. Every concrete
//! language tree is mapped into this representation before it is flattened
//! into actions. Children are owned exclusively by their field, so cloning a
//! node is a structural deep copy.

pub mod builder;

pub use builder::NodeBuilder;

use crate::errors::AsdlError;
use crate::grammar::{Cardinality, Field, Grammar, Production, ProductionId, TypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// One realized value: a child tree for composite fields, a token otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Node(GenericNode),
    Token(String),
}

impl Value {
    pub fn as_node(&self) -> Option<&GenericNode> {
        match self {
            Value::Node(node) => Some(node),
            Value::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            Value::Token(token) => Some(token),
            Value::Node(_) => None,
        }
    }
}

/// What a field currently holds.
///
/// `Unset` (never bound, or not applicable) and `Empty` (a `multiple` field
/// closed with zero elements) are distinct states. `Many` is never empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum FieldValue {
    #[default]
    Unset,
    Empty,
    Single(Value),
    Many(Vec<Value>),
}

impl FieldValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }

    /// Bound values in order; empty for `Unset` and `Empty`.
    pub fn values(&self) -> &[Value] {
        match self {
            FieldValue::Unset | FieldValue::Empty => &[],
            FieldValue::Single(value) => std::slice::from_ref(value),
            FieldValue::Many(values) => values,
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    fn last_mut(&mut self) -> Option<&mut Value> {
        match self {
            FieldValue::Unset | FieldValue::Empty => None,
            FieldValue::Single(value) => Some(value),
            FieldValue::Many(values) => values.last_mut(),
        }
    }
}

/// A declared field bound to its realized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedField {
    pub ty: TypeId,
    pub cardinality: Cardinality,
    pub value: FieldValue,
}

impl RealizedField {
    pub fn new(field: &Field) -> Self {
        Self {
            ty: field.ty,
            cardinality: field.cardinality,
            value: FieldValue::Unset,
        }
    }

    /// Adds one value, respecting the field's cardinality.
    pub fn add_value(&mut self, value: Value) -> Result<(), AsdlError> {
        let multiple = self.cardinality == Cardinality::Multiple;
        match &mut self.value {
            FieldValue::Many(values) if multiple => values.push(value),
            slot @ (FieldValue::Unset | FieldValue::Empty) if multiple => {
                *slot = FieldValue::Many(vec![value]);
            }
            slot @ FieldValue::Unset => *slot = FieldValue::Single(value),
            _ => {
                return Err(AsdlError::violation(
                    "field already holds its only value",
                ))
            }
        }
        Ok(())
    }

    /// Marks a `multiple` field as explicitly holding zero elements.
    pub fn init_empty(&mut self) {
        if self.value.is_unset() {
            self.value = FieldValue::Empty;
        }
    }

    pub fn values(&self) -> &[Value] {
        self.value.values()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericNode {
    pub production: ProductionId,
    pub fields: Vec<RealizedField>,
    /// Hypothesis timestamp of the action that created this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

/// Structural equality: same production and field values. Creation times are
/// bookkeeping and do not take part.
impl PartialEq for GenericNode {
    fn eq(&self, other: &Self) -> bool {
        self.production == other.production && self.fields == other.fields
    }
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl GenericNode {
    /// A node for `production` with every field unset.
    pub fn new(production: &Production) -> Self {
        Self {
            production: production.id,
            fields: production.fields.iter().map(RealizedField::new).collect(),
            created_at: None,
        }
    }

    pub fn field_at(&self, index: usize) -> Option<&RealizedField> {
        self.fields.get(index)
    }

    pub fn field_at_mut(&mut self, index: usize) -> Option<&mut RealizedField> {
        self.fields.get_mut(index)
    }

    /// Field by declared name.
    pub fn field<'a>(&'a self, grammar: &Grammar, name: &str) -> Option<&'a RealizedField> {
        let index = grammar
            .get_production(self.production)?
            .fields
            .iter()
            .position(|f| f.name == name)?;
        self.fields.get(index)
    }

    /// The most recently added child node of field `index`.
    pub(crate) fn last_child_mut(&mut self, index: usize) -> Option<&mut GenericNode> {
        match self.fields.get_mut(index)?.value.last_mut()? {
            Value::Node(node) => Some(node),
            Value::Token(_) => None,
        }
    }

    /// Number of nodes in this tree.
    pub fn size(&self) -> usize {
        1 + self
            .fields
            .iter()
            .flat_map(|f| f.values())
            .filter_map(Value::as_node)
            .map(GenericNode::size)
            .sum::<usize>()
    }

    /// Checks this tree against the grammar: shape, value kinds, bound
    /// `single` fields, and children drawn from their field's type.
    pub fn validate(&self, grammar: &Grammar) -> Result<(), AsdlError> {
        let production = grammar.get_production(self.production).ok_or_else(|| {
            AsdlError::violation(format!("unknown production #{}", self.production.0))
        })?;
        if self.fields.len() != production.fields.len() {
            return Err(AsdlError::violation(format!(
                "'{}' has {} fields, expected {}",
                production.constructor,
                self.fields.len(),
                production.fields.len()
            )));
        }

        for (declared, realized) in production.fields.iter().zip(&self.fields) {
            let context = || format!("{}.{}", production.constructor, declared.name);
            if realized.ty != declared.ty || realized.cardinality != declared.cardinality {
                return Err(AsdlError::violation(format!(
                    "{} does not match its declaration",
                    context()
                )));
            }
            match (&realized.value, declared.cardinality) {
                (FieldValue::Unset, Cardinality::Single) => {
                    return Err(AsdlError::violation(format!("{} is unset", context())))
                }
                (FieldValue::Unset, Cardinality::Multiple) => {
                    return Err(AsdlError::violation(format!(
                        "{} is unset; a multiple field must be empty or hold values",
                        context()
                    )))
                }
                (FieldValue::Empty, Cardinality::Multiple) if !grammar.allow_empty_multiple() => {
                    return Err(AsdlError::violation(format!(
                        "{} may not be empty in this grammar",
                        context()
                    )))
                }
                (FieldValue::Empty, Cardinality::Single | Cardinality::Optional)
                | (FieldValue::Many(_), Cardinality::Single | Cardinality::Optional) => {
                    return Err(AsdlError::violation(format!(
                        "{} holds a sequence but is not multiple",
                        context()
                    )))
                }
                _ => {}
            }

            let composite = grammar.is_composite(declared.ty);
            for value in realized.values() {
                match value {
                    Value::Node(child) if composite => {
                        child.validate(grammar)?;
                        let child_lhs = grammar.production(child.production).lhs;
                        if child_lhs != declared.ty {
                            return Err(AsdlError::violation(format!(
                                "{} expects {}, found {}",
                                context(),
                                grammar.type_name(declared.ty),
                                grammar.type_name(child_lhs)
                            )));
                        }
                    }
                    Value::Token(_) if !composite => {}
                    _ => {
                        return Err(AsdlError::violation(format!(
                            "{} mixes nodes and primitive tokens",
                            context()
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// S-expression rendering, e.g. `(Add (left (Num (value 2))) ...)`.
    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> NodeDisplay<'a> {
        NodeDisplay {
            node: self,
            grammar,
        }
    }
}

pub struct NodeDisplay<'a> {
    node: &'a GenericNode,
    grammar: &'a Grammar,
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(production) = self.grammar.get_production(self.node.production) else {
            return write!(f, "(#{})", self.node.production.0);
        };
        write!(f, "({}", production.constructor)?;
        for (declared, realized) in production.fields.iter().zip(&self.node.fields) {
            write!(f, " ({}", declared.name)?;
            match &realized.value {
                FieldValue::Unset => {}
                FieldValue::Empty => write!(f, " []")?,
                FieldValue::Single(_) | FieldValue::Many(_) => {
                    for value in realized.values() {
                        match value {
                            Value::Node(child) => write!(f, " {}", child.display(self.grammar))?,
                            Value::Token(token) => write!(f, " {}", token)?,
                        }
                    }
                }
            }
            write!(f, ")")?;
        }
        write!(f, ")")
    }
}
