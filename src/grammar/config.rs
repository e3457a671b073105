//! Grammar configuration.
//!
//! Options a language attaches to its grammar: the root-type override, the
//! zero-element closing rule for `multiple` fields, extra primitive types, and
//! the tables used when generic trees are turned back into domain values.
//! Loadable from YAML or JSON.

use crate::convert::{Coercion, Primitive};
use crate::errors::AsdlError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Primitive types every grammar knows without declaring them.
pub const BUILTIN_PRIMITIVES: &[&str] = &[
    "identifier",
    "int",
    "float",
    "bool",
    "string",
    "bytes",
    "object",
    "constant",
    "singleton",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrammarConfig {
    /// Restricts the legal top-level productions to those of this type.
    pub root_type: Option<String>,
    /// Whether `Reduce` may close a `multiple` field that has no elements.
    pub allow_empty_multiple: bool,
    /// Primitive type names in addition to [`BUILTIN_PRIMITIVES`].
    pub primitive_types: Vec<String>,
    /// Per-field defaults for unset `optional` primitives, keyed by field name.
    pub field_defaults: BTreeMap<String, Primitive>,
    /// Coercion applied to stored tokens, keyed by primitive type name.
    pub coercions: BTreeMap<String, Coercion>,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        let mut field_defaults = BTreeMap::new();
        // `ImportFrom(identifier? module, alias* names, int? level)`
        field_defaults.insert("level".to_string(), Primitive::Int(0));

        let coercions = [
            ("int", Coercion::Int),
            ("float", Coercion::Float),
            ("object", Coercion::Number),
            ("constant", Coercion::Number),
            ("bool", Coercion::Bool),
            ("singleton", Coercion::Singleton),
        ]
        .into_iter()
        .map(|(name, coercion)| (name.to_string(), coercion))
        .collect();

        Self {
            root_type: None,
            allow_empty_multiple: true,
            primitive_types: Vec::new(),
            field_defaults,
            coercions,
        }
    }
}

impl GrammarConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, AsdlError> {
        serde_yaml::from_str(text).map_err(|e| AsdlError::config(e.to_string()))
    }

    pub fn from_json_str(text: &str) -> Result<Self, AsdlError> {
        serde_json::from_str(text).map_err(|e| AsdlError::config(e.to_string()))
    }

    /// Loads a config file, picking the format from its extension.
    pub fn load(path: &std::path::Path) -> Result<Self, AsdlError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AsdlError::io(path.display().to_string(), &e))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// How tokens of `type_name` are coerced; unlisted types stay text.
    pub fn coercion_for(&self, type_name: &str) -> Coercion {
        self.coercions
            .get(type_name)
            .copied()
            .unwrap_or(Coercion::Text)
    }

    pub fn is_primitive_name(&self, name: &str) -> bool {
        BUILTIN_PRIMITIVES.contains(&name) || self.primitive_types.iter().any(|p| p == name)
    }
}
