//! Per-language adapter contract.
//!
//! A concrete language plugs in a parser, tokenizer, pretty-printer and node
//! factory; [`LanguageTransitionSystem`] combines them with the generic
//! algorithms to move between surface code, generic trees and actions.

use std::sync::Arc;

use tracing::debug;

use super::TransitionSystem;
use crate::ast::GenericNode;
use crate::convert::{domain_to_generic, generic_to_domain, DomainNode, NodeFactory};
use crate::errors::AsdlError;
use crate::grammar::Grammar;
use crate::hypothesis::Hypothesis;

/// What a concrete language front end provides.
pub trait LanguageAdapter {
    type Node: DomainNode;

    /// Parses surface code into a domain tree.
    fn parse(&self, code: &str) -> Result<Self::Node, AsdlError>;

    fn tokenize(&self, code: &str) -> Vec<String>;

    /// Pretty-prints a domain tree back to code.
    fn to_source(&self, node: &Self::Node) -> String;

    /// Constructors for rebuilding domain nodes.
    fn factory(&self) -> &NodeFactory<Self::Node>;
}

pub struct LanguageTransitionSystem<A> {
    system: TransitionSystem,
    adapter: A,
}

impl<A: LanguageAdapter> LanguageTransitionSystem<A> {
    pub fn new(grammar: Arc<Grammar>, adapter: A) -> Self {
        Self {
            system: TransitionSystem::new(grammar),
            adapter,
        }
    }

    pub fn system(&self) -> &TransitionSystem {
        &self.system
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn grammar(&self) -> &Grammar {
        self.system.grammar()
    }

    pub fn tokenize_code(&self, code: &str) -> Vec<String> {
        self.adapter.tokenize(code)
    }

    pub fn surface_code_to_ast(&self, code: &str) -> Result<GenericNode, AsdlError> {
        let node = self.adapter.parse(code)?;
        domain_to_generic(&node, self.grammar())
    }

    pub fn ast_to_surface_code(&self, tree: &GenericNode) -> Result<String, AsdlError> {
        let node = generic_to_domain(tree, self.grammar(), self.adapter.factory())?;
        Ok(self.adapter.to_source(&node).trim().to_string())
    }

    /// Two trees match when their regenerated code tokenizes identically.
    pub fn compare_ast(&self, hyp_ast: &GenericNode, ref_ast: &GenericNode) -> Result<bool, AsdlError> {
        let hyp_code = self.ast_to_surface_code(hyp_ast)?;
        let ref_code = self.ast_to_surface_code(ref_ast)?;
        Ok(self.tokenize_code(&hyp_code) == self.tokenize_code(&ref_code))
    }

    /// The hypothesis has a tree whose regenerated code parses again.
    pub fn is_valid_hypothesis(&self, hyp: &Hypothesis) -> bool {
        let Some(tree) = hyp.tree() else {
            return false;
        };
        let checked = self
            .ast_to_surface_code(tree)
            .and_then(|code| self.adapter.parse(&code));
        match checked {
            Ok(_) => true,
            Err(error) => {
                debug!(%error, "hypothesis does not regenerate valid code");
                false
            }
        }
    }
}
