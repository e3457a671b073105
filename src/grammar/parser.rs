//! ASDL Grammar Parser
//!
//! Converts grammar text into an unresolved [`RawGrammar`] with source spans.
//! This parser is purely syntactic; name resolution and the closed-world checks
//! happen in [`super::validators`].

use crate::errors::{AsdlError, ErrorKind, SourceContext};
use miette::SourceSpan;
use pest::{error::Error, iterators::Pair, Parser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar/asdl.pest"]
struct AsdlParser;

// ============================================================================
// RAW SYNTAX TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Default)]
pub struct RawGrammar {
    pub primitives: Vec<Spanned<String>>,
    pub types: Vec<RawType>,
}

#[derive(Debug, Clone)]
pub struct RawType {
    pub name: Spanned<String>,
    pub constructors: Vec<RawConstructor>,
}

#[derive(Debug, Clone)]
pub struct RawConstructor {
    pub name: Spanned<String>,
    pub fields: Vec<RawField>,
}

#[derive(Debug, Clone)]
pub struct RawField {
    pub type_name: Spanned<String>,
    /// Cardinality markers exactly as written (`?`, `*`, or a conflicting run).
    pub markers: Spanned<String>,
    pub name: Spanned<String>,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse grammar text into its raw, unresolved form.
pub fn parse(source: &SourceContext) -> Result<RawGrammar, AsdlError> {
    let mut pairs = AsdlParser::parse(Rule::grammar, &source.content)
        .map_err(|e| convert_parse_error(e, source))?;

    let Some(grammar) = pairs.next() else {
        return Ok(RawGrammar::default());
    };

    let mut raw = RawGrammar::default();
    for pair in grammar.into_inner() {
        match pair.as_rule() {
            Rule::primitive_list => {
                raw.primitives.extend(pair.into_inner().map(spanned_str));
            }
            Rule::type_decl => raw.types.push(build_type(pair)?),
            Rule::EOI => {}
            rule => return Err(unexpected(rule, &pair, source)),
        }
    }
    Ok(raw)
}

// ============================================================================
// BUILDERS
// ============================================================================

fn build_type(pair: Pair<Rule>) -> Result<RawType, AsdlError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(spanned_str)
        .ok_or_else(|| AsdlError::grammar_syntax("type declaration without a name"))?;
    let constructors = inner.map(build_constructor).collect();
    Ok(RawType { name, constructors })
}

fn build_constructor(pair: Pair<Rule>) -> RawConstructor {
    let mut inner = pair.into_inner();
    // grammar guarantees the constructor name comes first
    let name = inner.next().map(spanned_str).unwrap_or_else(|| Spanned {
        value: String::new(),
        span: (0..0).into(),
    });
    let fields = inner
        .next()
        .map(|list| list.into_inner().map(build_field).collect())
        .unwrap_or_default();
    RawConstructor { name, fields }
}

fn build_field(pair: Pair<Rule>) -> RawField {
    let field_span = span_of(&pair);
    let mut type_name = None;
    let mut name = None;
    let mut markers = String::new();
    let mut marker_span: Option<SourceSpan> = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::cardinality => {
                markers.push_str(part.as_str());
                marker_span.get_or_insert_with(|| span_of(&part));
            }
            Rule::ident if type_name.is_none() => type_name = Some(spanned_str(part)),
            Rule::ident => name = Some(spanned_str(part)),
            _ => {}
        }
    }

    let empty = || Spanned {
        value: String::new(),
        span: field_span,
    };
    RawField {
        type_name: type_name.unwrap_or_else(empty),
        markers: Spanned {
            value: markers,
            span: marker_span.unwrap_or(field_span),
        },
        name: name.unwrap_or_else(empty),
    }
}

fn spanned_str(pair: Pair<Rule>) -> Spanned<String> {
    Spanned {
        span: span_of(&pair),
        value: pair.as_str().to_string(),
    }
}

fn span_of(pair: &Pair<Rule>) -> SourceSpan {
    let span = pair.as_span();
    (span.start()..span.end()).into()
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn unexpected(rule: Rule, pair: &Pair<Rule>, source: &SourceContext) -> AsdlError {
    AsdlError::spanned(
        ErrorKind::GrammarSyntax {
            message: format!("unexpected {:?}", rule),
        },
        source,
        span_of(pair),
    )
}

fn convert_parse_error(error: Error<Rule>, source: &SourceContext) -> AsdlError {
    let (start, end) = match error.location {
        pest::error::InputLocation::Pos(pos) => (pos, pos),
        pest::error::InputLocation::Span((start, end)) => (start, end),
    };

    let opened = source.content.matches('(').count();
    let closed = source.content.matches(')').count();
    let message = if opened != closed {
        "unbalanced field list".to_string()
    } else {
        format!("malformed production: {}", error.variant.message())
    };

    AsdlError::spanned(ErrorKind::GrammarSyntax { message }, source, (start..end).into())
        .with_help("productions look like `Type = Ctor(type name, type? name, type* name) | Other`")
}
