//! The action vocabulary.
//!
//! Trees are built one action at a time: `ApplyRule` binds a production to the
//! frontier field, `Reduce` closes a field, and `GenToken` emits one primitive
//! token. String-typed values are spelled as one token per space-separated
//! piece followed by [`END_OF_VALUE`].

use crate::grammar::{Grammar, ProductionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel token that terminates a string-typed value.
pub const END_OF_VALUE: &str = "</primitive>";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    ApplyRule(ProductionId),
    Reduce,
    GenToken(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    ApplyRule,
    Reduce,
    GenToken,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ApplyRule(_) => ActionKind::ApplyRule,
            Action::Reduce => ActionKind::Reduce,
            Action::GenToken(_) => ActionKind::GenToken,
        }
    }

    pub fn gen_token(token: impl Into<String>) -> Self {
        Action::GenToken(token.into())
    }

    pub fn end_of_value() -> Self {
        Action::GenToken(END_OF_VALUE.to_string())
    }

    pub fn is_end_of_value(&self) -> bool {
        matches!(self, Action::GenToken(token) if token == END_OF_VALUE)
    }

    /// Human-readable form with constructor names resolved,
    /// e.g. `ApplyRule(Add)` or `GenToken(2)`.
    pub fn display<'a>(&'a self, grammar: &'a Grammar) -> ActionDisplay<'a> {
        ActionDisplay {
            action: self,
            grammar,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::ApplyRule => "ApplyRule",
            ActionKind::Reduce => "Reduce",
            ActionKind::GenToken => "GenToken",
        };
        f.write_str(name)
    }
}

pub struct ActionDisplay<'a> {
    action: &'a Action,
    grammar: &'a Grammar,
}

impl fmt::Display for ActionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Action::ApplyRule(id) => match self.grammar.get_production(*id) {
                Some(production) => write!(f, "ApplyRule({})", production.constructor),
                None => write!(f, "ApplyRule(#{})", id.0),
            },
            Action::Reduce => f.write_str("Reduce"),
            Action::GenToken(token) => write!(f, "GenToken({})", token),
        }
    }
}
