//! ASDL grammar model.
//!
//! A [`Grammar`] is a closed type system of productions loaded from text. Names
//! are resolved once at load into dense [`TypeId`] / [`ProductionId`] indices;
//! after that the grammar is immutable and safe to share between threads.

pub mod config;
pub mod parser;
pub mod validators;

use crate::errors::{AsdlError, ErrorKind, SourceContext};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

pub use config::{GrammarConfig, BUILTIN_PRIMITIVES};
use validators::{GrammarValidators, ValidationResult};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Single,
    Optional,
    Multiple,
}

impl Cardinality {
    pub fn marker(self) -> &'static str {
        match self {
            Cardinality::Single => "",
            Cardinality::Optional => "?",
            Cardinality::Multiple => "*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Expands to one of the type's productions.
    Composite,
    /// Leaf token: identifier, number, string, singleton.
    Primitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsdlType {
    pub name: String,
    pub kind: TypeKind,
}

impl AsdlType {
    pub fn is_composite(&self) -> bool {
        self.kind == TypeKind::Composite
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Production {
    pub id: ProductionId,
    pub constructor: String,
    pub lhs: TypeId,
    /// Declared order; defines both action order and print order.
    pub fields: Vec<Field>,
}

impl Production {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    types: Vec<AsdlType>,
    productions: Vec<Production>,
    type_index: HashMap<String, TypeId>,
    constructor_index: HashMap<String, ProductionId>,
    productions_by_type: Vec<Vec<ProductionId>>,
    root_type: TypeId,
    config: GrammarConfig,
}

// ============================================================================
// LOADING
// ============================================================================

impl Grammar {
    /// Parses a grammar with the default configuration.
    pub fn from_text(text: &str) -> Result<Self, AsdlError> {
        Self::from_source(&SourceContext::inline(text), GrammarConfig::default())
    }

    pub fn from_text_with_config(text: &str, config: GrammarConfig) -> Result<Self, AsdlError> {
        Self::from_source(&SourceContext::inline(text), config)
    }

    pub fn from_source(source: &SourceContext, mut config: GrammarConfig) -> Result<Self, AsdlError> {
        let raw = parser::parse(source)?;

        for prim in &raw.primitives {
            if !config.is_primitive_name(&prim.value) {
                config.primitive_types.push(prim.value.clone());
            }
        }

        let mut result = ValidationResult::new();
        GrammarValidators::check_type_declarations(&raw, &config, source, &mut result);
        GrammarValidators::check_duplicate_constructors(&raw, source, &mut result);
        GrammarValidators::check_field_markers(&raw, source, &mut result);
        GrammarValidators::check_duplicate_fields(&raw, source, &mut result);
        GrammarValidators::check_field_types(&raw, &config, source, &mut result);
        result.into_result()?;

        let mut types = Vec::new();
        let mut type_index = HashMap::new();
        let mut intern = |name: &str, kind: TypeKind| -> TypeId {
            *type_index.entry(name.to_string()).or_insert_with(|| {
                types.push(AsdlType {
                    name: name.to_string(),
                    kind,
                });
                TypeId((types.len() - 1) as u32)
            })
        };

        for decl in &raw.types {
            intern(&decl.name.value, TypeKind::Composite);
        }
        let primitive_names: Vec<String> = BUILTIN_PRIMITIVES
            .iter()
            .map(|p| p.to_string())
            .chain(config.primitive_types.iter().cloned())
            .collect();
        for name in &primitive_names {
            intern(name, TypeKind::Primitive);
        }

        let mut productions = Vec::new();
        let mut constructor_index = HashMap::new();
        let mut productions_by_type = vec![Vec::new(); types.len()];
        for decl in &raw.types {
            let lhs = type_index[&decl.name.value];
            for ctor in &decl.constructors {
                let id = ProductionId(productions.len() as u32);
                let fields = ctor
                    .fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.value.clone(),
                        ty: type_index[&f.type_name.value],
                        cardinality: match f.markers.value.as_str() {
                            "?" => Cardinality::Optional,
                            "*" => Cardinality::Multiple,
                            _ => Cardinality::Single,
                        },
                    })
                    .collect();
                constructor_index.insert(ctor.name.value.clone(), id);
                productions_by_type[lhs.0 as usize].push(id);
                productions.push(Production {
                    id,
                    constructor: ctor.name.value.clone(),
                    lhs,
                    fields,
                });
            }
        }

        let Some(first) = raw.types.first() else {
            return Err(AsdlError::grammar_syntax("grammar declares no types"));
        };
        let mut grammar = Self {
            root_type: type_index[&first.name.value],
            types,
            productions,
            type_index,
            constructor_index,
            productions_by_type,
            config,
        };
        if let Some(root) = grammar.config.root_type.clone() {
            grammar.root_type = grammar.composite_type_named(&root)?;
        }

        debug!(
            types = grammar.types.len(),
            productions = grammar.productions.len(),
            root = grammar.type_name(grammar.root_type),
            "grammar loaded"
        );
        Ok(grammar)
    }

    /// Restricts the legal top-level productions to those of `type_name`.
    pub fn with_root_type(mut self, type_name: &str) -> Result<Self, AsdlError> {
        self.root_type = self.composite_type_named(type_name)?;
        self.config.root_type = Some(type_name.to_string());
        Ok(self)
    }

    fn composite_type_named(&self, name: &str) -> Result<TypeId, AsdlError> {
        let id = self.type_by_name(name)?;
        if !self.is_composite(id) {
            return Err(AsdlError::grammar_syntax(format!(
                "root type '{}' must be a composite type",
                name
            )));
        }
        Ok(id)
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

impl Grammar {
    pub fn root_type(&self) -> TypeId {
        self.root_type
    }

    pub fn config(&self) -> &GrammarConfig {
        &self.config
    }

    pub fn allow_empty_multiple(&self) -> bool {
        self.config.allow_empty_multiple
    }

    pub fn types(&self) -> &[AsdlType] {
        &self.types
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn asdl_type(&self, id: TypeId) -> &AsdlType {
        &self.types[id.0 as usize]
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        &self.asdl_type(id).name
    }

    pub fn type_by_name(&self, name: &str) -> Result<TypeId, AsdlError> {
        self.type_index.get(name).copied().ok_or_else(|| {
            AsdlError::new(ErrorKind::UnknownType {
                type_name: name.to_string(),
            })
        })
    }

    pub fn is_composite(&self, id: TypeId) -> bool {
        self.asdl_type(id).is_composite()
    }

    /// Production by id. Ids come from this grammar; use
    /// [`get_production`](Self::get_production) for ids from elsewhere.
    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.0 as usize]
    }

    pub fn get_production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id.0 as usize)
    }

    pub fn production_by_constructor(&self, name: &str) -> Result<&Production, AsdlError> {
        self.constructor_index
            .get(name)
            .map(|id| self.production(*id))
            .ok_or_else(|| AsdlError::unknown_constructor(name))
    }

    /// Productions of `ty` in declaration order.
    pub fn production_ids_for(&self, ty: TypeId) -> &[ProductionId] {
        &self.productions_by_type[ty.0 as usize]
    }

    pub fn productions_for(&self, ty: TypeId) -> impl Iterator<Item = &Production> + '_ {
        self.production_ids_for(ty)
            .iter()
            .map(move |id| self.production(*id))
    }

    /// Non-fatal findings, e.g. composite types unreachable from the root.
    pub fn lint(&self) -> Vec<String> {
        GrammarValidators::unreachable_types(self)
    }

    pub fn render_field(&self, field: &Field) -> String {
        format!(
            "{}{} {}",
            self.type_name(field.ty),
            field.cardinality.marker(),
            field.name
        )
    }

    pub fn render_production(&self, production: &Production) -> String {
        if production.fields.is_empty() {
            return production.constructor.clone();
        }
        let fields: Vec<String> = production
            .fields
            .iter()
            .map(|f| self.render_field(f))
            .collect();
        format!("{}({})", production.constructor, fields.join(", "))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, ty) in self.types.iter().enumerate() {
            if !ty.is_composite() {
                continue;
            }
            let alternatives: Vec<String> = self
                .productions_for(TypeId(index as u32))
                .map(|p| self.render_production(p))
                .collect();
            writeln!(f, "{} = {}", ty.name, alternatives.join("\n    | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPR: &str = "Expr = Add(Expr left, Expr right) | Num(int value)";

    #[test]
    fn test_productions_in_declaration_order() {
        let grammar = Grammar::from_text(EXPR).unwrap();
        let expr = grammar.type_by_name("Expr").unwrap();
        let names: Vec<_> = grammar
            .productions_for(expr)
            .map(|p| p.constructor.as_str())
            .collect();
        assert_eq!(names, ["Add", "Num"]);
        assert_eq!(grammar.root_type(), expr);
    }

    #[test]
    fn test_display_round_trips() {
        let grammar = Grammar::from_text(EXPR).unwrap();
        let reparsed = Grammar::from_text(&grammar.to_string()).unwrap();
        assert_eq!(grammar.productions(), reparsed.productions());
    }

    #[test]
    fn test_root_type_must_be_composite() {
        let err = Grammar::from_text(EXPR).unwrap().with_root_type("int").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::GrammarSyntax { .. }));
    }
}
