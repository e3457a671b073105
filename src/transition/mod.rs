//! Language-independent transition system.
//!
//! Flattens a generic tree into its canonical action sequence (a pre-order
//! walk in declared field order) and replays action sequences through a
//! [`Hypothesis`]. The per-language parts live behind [`LanguageAdapter`].

pub mod language;

pub use language::{LanguageAdapter, LanguageTransitionSystem};

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::action::{Action, ActionKind};
use crate::ast::{GenericNode, RealizedField, Value};
use crate::convert::{Coercion, NONE_TOKEN};
use crate::errors::AsdlError;
use crate::grammar::{Cardinality, Grammar, Production};
use crate::hypothesis::{Hypothesis, STRING_TYPE};

#[derive(Debug, Clone)]
pub struct TransitionSystem {
    grammar: Arc<Grammar>,
}

impl TransitionSystem {
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn new_hypothesis(&self) -> Hypothesis {
        Hypothesis::new(Arc::clone(&self.grammar))
    }

    // ------------------------------------------------------------------------
    // Tree -> actions
    // ------------------------------------------------------------------------

    /// Canonical action sequence that rebuilds `tree` from an empty hypothesis.
    pub fn get_actions(&self, tree: &GenericNode) -> Vec<Action> {
        let mut actions = Vec::new();
        self.push_node_actions(tree, &mut actions);
        actions
    }

    /// Same as [`get_actions`](Self::get_actions) minus the root `ApplyRule`,
    /// for hypotheses started with [`Hypothesis::with_root`].
    pub fn get_actions_from_root_fields(&self, tree: &GenericNode) -> Vec<Action> {
        let mut actions = Vec::new();
        self.push_field_actions(tree, &mut actions);
        actions
    }

    fn push_node_actions(&self, node: &GenericNode, actions: &mut Vec<Action>) {
        actions.push(Action::ApplyRule(node.production));
        self.push_field_actions(node, actions);
    }

    fn push_field_actions(&self, node: &GenericNode, actions: &mut Vec<Action>) {
        for field in &node.fields {
            if !self.grammar.is_composite(field.ty) {
                actions.extend(self.get_primitive_field_actions(field));
                continue;
            }

            let children = field.values().iter().filter_map(Value::as_node);
            match field.cardinality {
                Cardinality::Single => {
                    for child in children {
                        self.push_node_actions(child, actions);
                    }
                }
                Cardinality::Optional => {
                    let before = actions.len();
                    for child in children {
                        self.push_node_actions(child, actions);
                    }
                    if actions.len() == before {
                        actions.push(Action::Reduce);
                    }
                }
                Cardinality::Multiple => {
                    for child in children {
                        self.push_node_actions(child, actions);
                    }
                    actions.push(Action::Reduce);
                }
            }
        }
    }

    /// Actions spelling a primitive field.
    ///
    /// Each string value becomes one token per space-separated piece plus the
    /// end-of-value token; other values are a single token. `multiple` fields
    /// end with `Reduce`, as does an unset `optional` field. An unset `single`
    /// singleton spells `None`; any other unset `single` field emits nothing.
    pub fn get_primitive_field_actions(&self, field: &RealizedField) -> Vec<Action> {
        let mut actions = Vec::new();
        let type_name = self.grammar.type_name(field.ty);
        let is_string = type_name == STRING_TYPE;

        if field.cardinality == Cardinality::Single
            && field.value.is_unset()
            && self.grammar.config().coercion_for(type_name) == Coercion::Singleton
        {
            actions.push(Action::gen_token(NONE_TOKEN));
            return actions;
        }

        for token in field.values().iter().filter_map(Value::as_token) {
            if is_string {
                if !token.is_empty() {
                    actions.extend(token.split(' ').map(Action::gen_token));
                }
                actions.push(Action::end_of_value());
            } else {
                actions.push(Action::gen_token(token));
            }
        }

        match field.cardinality {
            Cardinality::Multiple => actions.push(Action::Reduce),
            Cardinality::Optional if actions.is_empty() => actions.push(Action::Reduce),
            _ => {}
        }
        actions
    }

    // ------------------------------------------------------------------------
    // Queries over hypotheses
    // ------------------------------------------------------------------------

    pub fn get_valid_continuation_types(&self, hyp: &Hypothesis) -> BTreeSet<ActionKind> {
        hyp.valid_continuation_types()
    }

    pub fn get_valid_continuating_productions<'h>(&self, hyp: &'h Hypothesis) -> Vec<&'h Production> {
        let grammar = hyp.grammar();
        hyp.valid_productions()
            .iter()
            .map(|id| grammar.production(*id))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Actions -> tree
    // ------------------------------------------------------------------------

    /// Applies `actions` to a fresh hypothesis, checking each against the
    /// valid continuations first.
    pub fn replay(&self, actions: impl IntoIterator<Item = Action>) -> Result<Hypothesis, AsdlError> {
        let mut hyp = self.new_hypothesis();
        for (step, action) in actions.into_iter().enumerate() {
            if !hyp.valid_continuation_types().contains(&action.kind()) {
                debug!(step, action = %action.display(&self.grammar), "action rejected");
                return Err(AsdlError::violation(format!(
                    "step {}: {} is not a valid continuation",
                    step,
                    action.display(&self.grammar)
                )));
            }
            hyp.apply_action(action)?;
        }
        Ok(hyp)
    }

    /// Encodes `tree`, replays it, and returns the rebuilt tree.
    pub fn round_trip(&self, tree: &GenericNode) -> Result<GenericNode, AsdlError> {
        let hyp = self.replay(self.get_actions(tree))?;
        if !hyp.is_complete() {
            return Err(AsdlError::violation(
                "action sequence ended before the tree was complete",
            ));
        }
        hyp.into_tree()
            .ok_or_else(|| AsdlError::violation("action sequence produced no tree"))
    }
}
