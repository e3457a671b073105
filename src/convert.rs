//! Conversion between concrete language trees and generic trees.
//!
//! A front end exposes its nodes through [`DomainNode`]; this module walks
//! them against the grammar to produce [`GenericNode`]s, and rebuilds domain
//! nodes through a [`NodeFactory`] keyed by constructor name. Primitive values
//! live in the generic tree as tokens and are coerced back to typed
//! [`Primitive`]s according to the grammar's configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::{FieldValue, GenericNode, Value};
use crate::errors::AsdlError;
use crate::grammar::{Cardinality, Grammar};

// ============================================================================
// PRIMITIVES
// ============================================================================

/// A typed primitive value on the domain side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Primitive {
    /// Token spelling stored in the generic tree; `None` for `Null`.
    pub fn to_token(&self) -> Option<String> {
        match self {
            Primitive::Null => None,
            Primitive::Bool(b) => Some(b.to_string()),
            Primitive::Int(i) => Some(i.to_string()),
            // Debug keeps the decimal point, so "2.0" does not come back as 2
            Primitive::Float(f) => Some(format!("{:?}", f)),
            Primitive::Text(s) => Some(s.clone()),
        }
    }
}

/// Token a null singleton is stored as.
pub const NONE_TOKEN: &str = "None";

/// How a stored token is turned back into a typed primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    Int,
    Float,
    /// Integer unless the token has a decimal point or exponent marker.
    Number,
    Bool,
    /// `None`, `True` or `False`.
    Singleton,
    Text,
}

/// Coerces `token` to the primitive type `type_name`.
pub fn coerce(token: &str, type_name: &str, coercion: Coercion) -> Result<Primitive, AsdlError> {
    let fail = || AsdlError::primitive_coercion(token, type_name);
    match coercion {
        Coercion::Text => Ok(Primitive::Text(token.to_string())),
        Coercion::Int => token.parse().map(Primitive::Int).map_err(|_| fail()),
        Coercion::Float => parse_float(token).map(Primitive::Float).ok_or_else(fail),
        Coercion::Number => {
            if token.contains(['.', 'e', 'E']) {
                return parse_float(token).map(Primitive::Float).ok_or_else(fail);
            }
            if let Ok(int) = token.parse::<i64>() {
                return Ok(Primitive::Int(int));
            }
            parse_float(token).map(Primitive::Float).ok_or_else(fail)
        }
        Coercion::Bool => match token {
            "true" | "True" => Ok(Primitive::Bool(true)),
            "false" | "False" => Ok(Primitive::Bool(false)),
            _ => Err(fail()),
        },
        Coercion::Singleton => match token {
            "None" | "null" => Ok(Primitive::Null),
            "True" | "true" => Ok(Primitive::Bool(true)),
            "False" | "false" => Ok(Primitive::Bool(false)),
            _ => Err(fail()),
        },
    }
}

fn parse_float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|f| f.is_finite())
}

// ============================================================================
// DOMAIN SIDE
// ============================================================================

/// A field as read from a concrete node.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainValue<'a, N> {
    Null,
    Node(&'a N),
    Nodes(Vec<&'a N>),
    Primitive(Primitive),
    Primitives(Vec<Primitive>),
}

/// A concrete language node as the converter sees it.
pub trait DomainNode: Sized {
    /// Constructor tag; drives production lookup.
    fn constructor_name(&self) -> &str;

    /// The value of a declared field, or `None` if the node has no such field.
    fn field(&self, name: &str) -> Option<DomainValue<'_, Self>>;
}

/// An owned field value handed to a [`NodeFactory`] constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData<N> {
    Null,
    Node(N),
    Nodes(Vec<N>),
    Primitive(Primitive),
    Primitives(Vec<Primitive>),
}

/// Field values for one node, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainFields<N> {
    entries: Vec<(String, FieldData<N>)>,
}

impl<N> DomainFields<N> {
    pub fn get(&self, name: &str) -> Option<&FieldData<N>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldData<N>)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N> IntoIterator for DomainFields<N> {
    type Item = (String, FieldData<N>);
    type IntoIter = std::vec::IntoIter<(String, FieldData<N>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

pub type Constructor<N> = Box<dyn Fn(DomainFields<N>) -> Result<N, AsdlError> + Send + Sync>;

/// Registry of domain node constructors keyed by constructor name.
pub struct NodeFactory<N> {
    constructors: HashMap<String, Constructor<N>>,
}

impl<N> Default for NodeFactory<N> {
    fn default() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }
}

impl<N> NodeFactory<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, constructor: &str, build: F)
    where
        F: Fn(DomainFields<N>) -> Result<N, AsdlError> + Send + Sync + 'static,
    {
        self.constructors
            .insert(constructor.to_string(), Box::new(build));
    }

    pub fn get(&self, constructor: &str) -> Result<&Constructor<N>, AsdlError> {
        self.constructors
            .get(constructor)
            .ok_or_else(|| AsdlError::unknown_constructor(constructor))
    }

    pub fn contains(&self, constructor: &str) -> bool {
        self.constructors.contains_key(constructor)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

// ============================================================================
// DOMAIN -> GENERIC
// ============================================================================

/// Maps a concrete tree onto the grammar.
pub fn domain_to_generic<N: DomainNode>(node: &N, grammar: &Grammar) -> Result<GenericNode, AsdlError> {
    let constructor = node.constructor_name();
    let production = grammar.production_by_constructor(constructor)?;
    let mut tree = GenericNode::new(production);

    for (declared, slot) in production.fields.iter().zip(tree.fields.iter_mut()) {
        let value = node
            .field(&declared.name)
            .ok_or_else(|| AsdlError::field_extraction(constructor, &declared.name))?;
        let composite = grammar.is_composite(declared.ty);
        let type_name = grammar.type_name(declared.ty);
        let mismatch = || {
            AsdlError::field_extraction(constructor, &declared.name).with_help(format!(
                "field has type {}{}, which the node's value does not fit",
                type_name,
                declared.cardinality.marker()
            ))
        };
        let token_of = |primitive: &Primitive| match primitive.to_token() {
            Some(token) => Some(token),
            None if grammar.config().coercion_for(type_name) == Coercion::Singleton => {
                Some(NONE_TOKEN.to_string())
            }
            None => None,
        };

        match declared.cardinality {
            Cardinality::Single | Cardinality::Optional => match value {
                DomainValue::Null if composite => {}
                DomainValue::Null => {
                    if let Some(token) = token_of(&Primitive::Null) {
                        slot.add_value(Value::Token(token))?;
                    }
                }
                DomainValue::Node(child) if composite => {
                    slot.add_value(Value::Node(domain_to_generic(child, grammar)?))?;
                }
                DomainValue::Primitive(primitive) if !composite => {
                    if let Some(token) = token_of(&primitive) {
                        slot.add_value(Value::Token(token))?;
                    }
                }
                _ => return Err(mismatch()),
            },
            Cardinality::Multiple => {
                // "no elements" is recorded explicitly, never left unset
                slot.init_empty();
                match value {
                    DomainValue::Null => {}
                    DomainValue::Nodes(children) if composite || children.is_empty() => {
                        for child in children {
                            slot.add_value(Value::Node(domain_to_generic(child, grammar)?))?;
                        }
                    }
                    DomainValue::Primitives(values) if !composite || values.is_empty() => {
                        for token in values.iter().filter_map(token_of) {
                            slot.add_value(Value::Token(token))?;
                        }
                    }
                    _ => return Err(mismatch()),
                }
            }
        }
    }

    trace!(constructor, size = tree.size(), "domain node converted");
    Ok(tree)
}

// ============================================================================
// GENERIC -> DOMAIN
// ============================================================================

/// Rebuilds a concrete tree through `factory`.
pub fn generic_to_domain<N>(
    tree: &GenericNode,
    grammar: &Grammar,
    factory: &NodeFactory<N>,
) -> Result<N, AsdlError> {
    let production = grammar.get_production(tree.production).ok_or_else(|| {
        AsdlError::violation(format!("unknown production #{}", tree.production.0))
    })?;
    let build = factory.get(&production.constructor)?;
    let config = grammar.config();

    let mut entries = Vec::with_capacity(production.fields.len());
    for (declared, realized) in production.fields.iter().zip(&tree.fields) {
        let type_name = grammar.type_name(declared.ty);
        let data = if grammar.is_composite(declared.ty) {
            let mut children = realized
                .values()
                .iter()
                .filter_map(Value::as_node)
                .map(|child| generic_to_domain(child, grammar, factory));
            match (declared.cardinality, &realized.value) {
                (Cardinality::Multiple, FieldValue::Unset) => FieldData::Null,
                (Cardinality::Multiple, _) => FieldData::Nodes(children.collect::<Result<_, _>>()?),
                _ => match children.next() {
                    Some(child) => FieldData::Node(child?),
                    None => FieldData::Null,
                },
            }
        } else {
            let coercion = config.coercion_for(type_name);
            let coerce_value = |value: &Value| match value {
                Value::Token(token) => coerce(token, type_name, coercion),
                Value::Node(_) => Err(AsdlError::violation(format!(
                    "primitive field '{}' holds a node",
                    declared.name
                ))),
            };
            match (&realized.value, declared.cardinality) {
                (FieldValue::Unset, Cardinality::Optional) => config
                    .field_defaults
                    .get(&declared.name)
                    .cloned()
                    .map(FieldData::Primitive)
                    .unwrap_or(FieldData::Null),
                (FieldValue::Unset, _) => FieldData::Null,
                (_, Cardinality::Multiple) => FieldData::Primitives(
                    realized
                        .values()
                        .iter()
                        .map(coerce_value)
                        .collect::<Result<_, _>>()?,
                ),
                (FieldValue::Single(value), _) => FieldData::Primitive(coerce_value(value)?),
                _ => FieldData::Null,
            }
        };
        entries.push((declared.name.clone(), data));
    }

    build(DomainFields { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coercion() {
        assert_eq!(coerce("42", "object", Coercion::Number).unwrap(), Primitive::Int(42));
        assert_eq!(coerce("4.5", "object", Coercion::Number).unwrap(), Primitive::Float(4.5));
        assert_eq!(coerce("1e3", "object", Coercion::Number).unwrap(), Primitive::Float(1000.0));
        assert_eq!(coerce("-7", "object", Coercion::Number).unwrap(), Primitive::Int(-7));
    }

    #[test]
    fn test_number_coercion_failures() {
        for bad in ["abc", "1.2.3", "inf", "", "0x10"] {
            let err = coerce(bad, "object", Coercion::Number).unwrap_err();
            assert_eq!(err.category(), crate::errors::ErrorCategory::PrimitiveCoercion, "{bad}");
        }
    }

    #[test]
    fn test_int_rejects_decimal() {
        assert!(coerce("2.0", "int", Coercion::Int).is_err());
        assert_eq!(coerce("2", "int", Coercion::Int).unwrap(), Primitive::Int(2));
    }

    #[test]
    fn test_singleton_and_text() {
        assert_eq!(coerce("None", "singleton", Coercion::Singleton).unwrap(), Primitive::Null);
        assert_eq!(coerce("True", "singleton", Coercion::Singleton).unwrap(), Primitive::Bool(true));
        assert_eq!(
            coerce("a b", "string", Coercion::Text).unwrap(),
            Primitive::Text("a b".into())
        );
    }

    #[test]
    fn test_float_token_keeps_decimal_point() {
        assert_eq!(Primitive::Float(2.0).to_token().as_deref(), Some("2.0"));
        assert_eq!(Primitive::Null.to_token(), None);
    }
}
