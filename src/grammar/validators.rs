use std::collections::{HashMap, HashSet};

use super::config::GrammarConfig;
use super::parser::{RawGrammar, Spanned};
use super::{Grammar, TypeId};
use crate::errors::{AsdlError, ErrorKind, SourceContext};

// =====================
// Core Data Structures
// =====================

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<AsdlError>,
    pub warnings: Vec<String>,
}

pub trait ValidationReporter {
    fn report_error(&mut self, error: AsdlError);
    fn report_warning(&mut self, message: impl Into<String>);
}

impl ValidationReporter for ValidationResult {
    fn report_error(&mut self, error: AsdlError) {
        self.errors.push(error);
    }
    fn report_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grammar errors are fatal: the first one reported wins.
    pub fn into_result(self) -> Result<Vec<String>, AsdlError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.warnings),
        }
    }
}

// =====================
// Validators
// =====================

/// Closed-world checks over a parsed grammar.
/// Each validator focuses on a single concern.
pub struct GrammarValidators;

impl GrammarValidators {
    /// Checks that every type is defined once and is not also a primitive.
    pub fn check_type_declarations(
        raw: &RawGrammar,
        config: &GrammarConfig,
        source: &SourceContext,
        result: &mut impl ValidationReporter,
    ) {
        let mut seen = HashSet::new();
        for decl in &raw.types {
            let name = &decl.name;
            if config.is_primitive_name(&name.value) {
                result.report_error(spanned(
                    format!("type '{}' is declared as primitive", name.value),
                    source,
                    name,
                ));
            } else if !seen.insert(name.value.as_str()) {
                result.report_error(spanned(
                    format!("type '{}' is defined more than once", name.value),
                    source,
                    name,
                ));
            }
        }
    }

    /// Checks that constructor names are globally unique.
    pub fn check_duplicate_constructors(
        raw: &RawGrammar,
        source: &SourceContext,
        result: &mut impl ValidationReporter,
    ) {
        let mut seen = HashSet::new();
        for ctor in raw.types.iter().flat_map(|t| &t.constructors) {
            if seen.insert(ctor.name.value.as_str()) {
                continue;
            }
            result.report_error(AsdlError::spanned(
                ErrorKind::DuplicateConstructor {
                    constructor: ctor.name.value.clone(),
                },
                source,
                ctor.name.span,
            ));
        }
    }

    /// Checks that each field carries at most one cardinality marker.
    pub fn check_field_markers(
        raw: &RawGrammar,
        source: &SourceContext,
        result: &mut impl ValidationReporter,
    ) {
        for field in raw
            .types
            .iter()
            .flat_map(|t| &t.constructors)
            .flat_map(|c| &c.fields)
        {
            if field.markers.value.len() <= 1 {
                continue;
            }
            result.report_error(
                AsdlError::spanned(
                    ErrorKind::CardinalityConflict {
                        field: field.name.value.clone(),
                        marker: field.markers.value.clone(),
                    },
                    source,
                    field.markers.span,
                )
                .with_help("use `?` for optional or `*` for multiple, not both"),
            );
        }
    }

    /// Checks that field names are unique within a constructor.
    pub fn check_duplicate_fields(
        raw: &RawGrammar,
        source: &SourceContext,
        result: &mut impl ValidationReporter,
    ) {
        for ctor in raw.types.iter().flat_map(|t| &t.constructors) {
            let mut seen = HashSet::new();
            for field in &ctor.fields {
                if seen.insert(field.name.value.as_str()) {
                    continue;
                }
                result.report_error(spanned(
                    format!(
                        "constructor '{}' declares field '{}' twice",
                        ctor.name.value, field.name.value
                    ),
                    source,
                    &field.name,
                ));
            }
        }
    }

    /// Checks for field types that are neither primitive nor defined.
    pub fn check_field_types(
        raw: &RawGrammar,
        config: &GrammarConfig,
        source: &SourceContext,
        result: &mut impl ValidationReporter,
    ) {
        let defined: HashSet<&str> = raw.types.iter().map(|t| t.name.value.as_str()).collect();

        for ctor in raw.types.iter().flat_map(|t| &t.constructors) {
            for field in &ctor.fields {
                let ty = field.type_name.value.as_str();
                if defined.contains(ty) || config.is_primitive_name(ty) {
                    continue;
                }
                result.report_error(AsdlError::spanned(
                    ErrorKind::UndeclaredType {
                        type_name: ty.to_string(),
                        constructor: ctor.name.value.clone(),
                    },
                    source,
                    field.type_name.span,
                ));
            }
        }
    }

    /// Composite types that no production reachable from the root can produce.
    pub fn unreachable_types(grammar: &Grammar) -> Vec<String> {
        let mut edges: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        for production in grammar.productions() {
            edges
                .entry(production.lhs)
                .or_default()
                .extend(production.fields.iter().map(|f| f.ty));
        }

        let mut reached = HashSet::new();
        let mut pending = vec![grammar.root_type()];
        while let Some(ty) = pending.pop() {
            if !reached.insert(ty) {
                continue;
            }
            if let Some(next) = edges.get(&ty) {
                pending.extend(next.iter().copied());
            }
        }

        grammar
            .types()
            .iter()
            .enumerate()
            .filter(|(index, ty)| ty.is_composite() && !reached.contains(&TypeId(*index as u32)))
            .map(|(_, ty)| format!("type '{}' is unreachable from the root type", ty.name))
            .collect()
    }
}

fn spanned(message: String, source: &SourceContext, at: &Spanned<String>) -> AsdlError {
    AsdlError::spanned(ErrorKind::GrammarSyntax { message }, source, at.span)
}
