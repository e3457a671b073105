//! ASDL grammars, generic typed trees, and a grammar-driven transition system.
//!
//! Trees of any language are mapped onto a [`grammar::Grammar`], flattened
//! into [`action::Action`] sequences, and rebuilt one action at a time by a
//! [`hypothesis::Hypothesis`] that always knows which actions are legal next.

pub use crate::errors::{AsdlError, ErrorCategory, ErrorKind};

pub mod action;
pub mod ast;
pub mod cli;
pub mod convert;
pub mod errors;
pub mod grammar;
pub mod hypothesis;
pub mod json;
pub mod transition;

pub use crate::action::{Action, ActionKind, END_OF_VALUE};
pub use crate::ast::{FieldValue, GenericNode, NodeBuilder, RealizedField, Value};
pub use crate::grammar::{Cardinality, Grammar, GrammarConfig, Production, ProductionId, TypeId};
pub use crate::hypothesis::Hypothesis;
pub use crate::transition::{LanguageAdapter, LanguageTransitionSystem, TransitionSystem};
