//! JSON front end.
//!
//! Trees written as JSON objects whose `"_type"` key names the constructor
//! and whose other keys are the declared fields:
//!
//! ```json
//! {"_type": "Add", "left": {"_type": "Num", "value": 2}, "right": {"_type": "Num", "value": 3}}
//! ```
//!
//! `multiple` fields are arrays, absent values are `null`. This is the
//! front end the CLI reads and writes.

use serde_json::{Map, Number, Value as Json};

use crate::convert::{DomainFields, DomainNode, DomainValue, FieldData, NodeFactory, Primitive};
use crate::errors::AsdlError;
use crate::grammar::Grammar;
use crate::transition::LanguageAdapter;

pub const TYPE_KEY: &str = "_type";

// ============================================================================
// DOMAIN NODE
// ============================================================================

impl DomainNode for Json {
    fn constructor_name(&self) -> &str {
        self.get(TYPE_KEY).and_then(Json::as_str).unwrap_or_default()
    }

    fn field(&self, name: &str) -> Option<DomainValue<'_, Self>> {
        let value = self.as_object()?.get(name)?;
        Some(match value {
            Json::Null => DomainValue::Null,
            Json::Object(_) => DomainValue::Node(value),
            Json::Array(items) if items.iter().all(Json::is_object) => {
                DomainValue::Nodes(items.iter().collect())
            }
            Json::Array(items) => {
                DomainValue::Primitives(items.iter().map(to_primitive).collect::<Option<_>>()?)
            }
            scalar => DomainValue::Primitive(to_primitive(scalar)?),
        })
    }
}

fn to_primitive(value: &Json) -> Option<Primitive> {
    match value {
        Json::Null => Some(Primitive::Null),
        Json::Bool(b) => Some(Primitive::Bool(*b)),
        Json::Number(n) => n
            .as_i64()
            .map(Primitive::Int)
            .or_else(|| n.as_f64().map(Primitive::Float)),
        Json::String(s) => Some(Primitive::Text(s.clone())),
        Json::Array(_) | Json::Object(_) => None,
    }
}

fn from_primitive(primitive: Primitive) -> Json {
    match primitive {
        Primitive::Null => Json::Null,
        Primitive::Bool(b) => Json::Bool(b),
        Primitive::Int(i) => Json::Number(i.into()),
        Primitive::Float(f) => Number::from_f64(f).map(Json::Number).unwrap_or(Json::Null),
        Primitive::Text(s) => Json::String(s),
    }
}

fn from_field(data: FieldData<Json>) -> Json {
    match data {
        FieldData::Null => Json::Null,
        FieldData::Node(node) => node,
        FieldData::Nodes(nodes) => Json::Array(nodes),
        FieldData::Primitive(p) => from_primitive(p),
        FieldData::Primitives(ps) => Json::Array(ps.into_iter().map(from_primitive).collect()),
    }
}

// ============================================================================
// FACTORY
// ============================================================================

/// A factory with a JSON constructor for every production of `grammar`.
pub fn json_factory(grammar: &Grammar) -> NodeFactory<Json> {
    let mut factory = NodeFactory::new();
    for production in grammar.productions() {
        let constructor = production.constructor.clone();
        factory.register(&production.constructor, move |fields: DomainFields<Json>| {
            let mut object = Map::new();
            object.insert(TYPE_KEY.to_string(), Json::String(constructor.clone()));
            for (name, data) in fields {
                object.insert(name, from_field(data));
            }
            Ok(Json::Object(object))
        });
    }
    factory
}

// ============================================================================
// LANGUAGE ADAPTER
// ============================================================================

/// JSON as a "surface language": parsing is `serde_json`, printing is pretty
/// JSON, tokens are JSON lexemes.
pub struct JsonLanguage {
    factory: NodeFactory<Json>,
}

impl JsonLanguage {
    pub fn new(grammar: &Grammar) -> Self {
        Self {
            factory: json_factory(grammar),
        }
    }
}

impl LanguageAdapter for JsonLanguage {
    type Node = Json;

    fn parse(&self, code: &str) -> Result<Json, AsdlError> {
        serde_json::from_str(code)
            .map_err(|e| AsdlError::grammar_syntax(format!("invalid JSON tree: {}", e)))
    }

    fn tokenize(&self, code: &str) -> Vec<String> {
        tokenize_json(code)
    }

    fn to_source(&self, node: &Json) -> String {
        serde_json::to_string_pretty(node).unwrap_or_default()
    }

    fn factory(&self) -> &NodeFactory<Json> {
        &self.factory
    }
}

/// Splits JSON text into punctuation, string, and scalar lexemes.
pub fn tokenize_json(code: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = code.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '{' | '}' | '[' | ']' | ':' | ',' => tokens.push(ch.to_string()),
            '"' => {
                let mut end = code.len();
                let mut escaped = false;
                for (index, c) in chars.by_ref() {
                    match c {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        '"' => {
                            end = index + 1;
                            break;
                        }
                        _ => {}
                    }
                }
                tokens.push(code[start..end].to_string());
            }
            _ => {
                let mut end = code.len();
                while let Some(&(index, c)) = chars.peek() {
                    if c.is_whitespace() || "{}[]:,\"".contains(c) {
                        end = index;
                        break;
                    }
                    chars.next();
                }
                tokens.push(code[start..end].to_string());
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_json() {
        let tokens = tokenize_json(r#"{"a b": [1, -2.5e3, true], "c\"d": null}"#);
        assert_eq!(
            tokens,
            [
                "{", r#""a b""#, ":", "[", "1", ",", "-2.5e3", ",", "true", "]", ",",
                r#""c\"d""#, ":", "null", "}"
            ]
        );
    }

    #[test]
    fn test_field_kinds() {
        let node: Json = serde_json::json!({
            "_type": "Call",
            "func": {"_type": "Name", "id": "f"},
            "args": [],
            "names": ["a", "b"],
            "level": null,
        });
        assert_eq!(node.constructor_name(), "Call");
        assert!(matches!(node.field("func"), Some(DomainValue::Node(_))));
        assert!(matches!(node.field("args"), Some(DomainValue::Nodes(v)) if v.is_empty()));
        assert!(matches!(node.field("names"), Some(DomainValue::Primitives(v)) if v.len() == 2));
        assert!(matches!(node.field("level"), Some(DomainValue::Null)));
        assert!(node.field("missing").is_none());
    }
}
