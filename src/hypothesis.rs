//! Hypothesis: a partially built tree plus its frontier.
//!
//! The frontier is the path from the root to the single open field awaiting
//! the next action. Each [`Frame`] records the field index currently open in
//! the node at that depth; the node one level down is always the most recently
//! added child of that field. A hypothesis is complete once the root exists
//! and the frontier is empty.
//!
//! ## Invariants
//! - A rejected action leaves the hypothesis untouched.
//! - Every field of every node consumes at least one action, so the frontier
//!   is never empty while the tree is incomplete.
//! - Cloning copies the whole tree; clones only share the immutable grammar.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::trace;

use crate::action::{Action, ActionKind, END_OF_VALUE};
use crate::ast::{GenericNode, RealizedField, Value};
use crate::errors::AsdlError;
use crate::grammar::{Cardinality, Grammar, ProductionId, TypeId};

/// Primitive type whose values span several `GenToken`s.
pub const STRING_TYPE: &str = "string";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    field: usize,
}

#[derive(Debug, Clone)]
pub struct Hypothesis {
    grammar: Arc<Grammar>,
    tree: Option<GenericNode>,
    frontier: Vec<Frame>,
    /// Tokens of a string value still waiting for its end-of-value token.
    pending: Vec<String>,
    history: Vec<(Action, u64)>,
    t: u64,
    /// Free for callers ranking hypotheses, e.g. during beam search.
    pub score: f64,
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl Hypothesis {
    /// Empty hypothesis: no root yet, frontier is the grammar's root type.
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            tree: None,
            frontier: Vec::new(),
            pending: Vec::new(),
            history: Vec::new(),
            t: 0,
            score: 0.0,
        }
    }

    /// Hypothesis whose root production is fixed by the caller.
    pub fn with_root(grammar: Arc<Grammar>, production: ProductionId) -> Result<Self, AsdlError> {
        let mut hyp = Self::new(grammar);
        hyp.apply_action(Action::ApplyRule(production))?;
        Ok(hyp)
    }

    pub fn clone_and_apply_action(&self, action: Action) -> Result<Self, AsdlError> {
        let mut next = self.clone();
        next.apply_action(action)?;
        Ok(next)
    }
}

// ============================================================================
// INTROSPECTION
// ============================================================================

impl Hypothesis {
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn tree(&self) -> Option<&GenericNode> {
        self.tree.as_ref()
    }

    pub fn into_tree(self) -> Option<GenericNode> {
        self.tree
    }

    pub fn is_complete(&self) -> bool {
        self.tree.is_some() && self.frontier.is_empty()
    }

    /// Applied actions with the timestamp each was applied at.
    pub fn history(&self) -> &[(Action, u64)] {
        &self.history
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> + '_ {
        self.history.iter().map(|(action, _)| action)
    }

    /// Timestamp the next action will receive.
    pub fn timestamp(&self) -> u64 {
        self.t
    }

    pub fn pending_tokens(&self) -> &[String] {
        &self.pending
    }

    pub fn frontier_depth(&self) -> usize {
        self.frontier.len()
    }

    /// Node owning the open field.
    pub fn frontier_node(&self) -> Option<&GenericNode> {
        let depth = self.frontier.len().checked_sub(1)?;
        self.node_at(depth)
    }

    pub fn frontier_field(&self) -> Option<&RealizedField> {
        let frame = self.frontier.last()?;
        self.frontier_node()?.field_at(frame.field)
    }

    pub fn frontier_field_name(&self) -> Option<&str> {
        let frame = self.frontier.last()?;
        let node = self.frontier_node()?;
        let production = self.grammar.production(node.production);
        production.fields.get(frame.field).map(|f| f.name.as_str())
    }

    /// Type expected at the frontier; the root type before the first action,
    /// `None` once complete.
    pub fn frontier_type(&self) -> Option<TypeId> {
        match self.tree {
            None => Some(self.grammar.root_type()),
            Some(_) => self.frontier_field().map(|f| f.ty),
        }
    }

    pub fn frontier_cardinality(&self) -> Option<Cardinality> {
        match self.tree {
            None => Some(Cardinality::Single),
            Some(_) => self.frontier_field().map(|f| f.cardinality),
        }
    }

    /// Action kinds legal in the current state; empty only when complete.
    pub fn valid_continuation_types(&self) -> BTreeSet<ActionKind> {
        let mut kinds = BTreeSet::new();
        if self.tree.is_none() {
            kinds.insert(ActionKind::ApplyRule);
            return kinds;
        }
        let Some(field) = self.frontier_field() else {
            return kinds;
        };

        if self.grammar.is_composite(field.ty) {
            kinds.insert(ActionKind::ApplyRule);
        } else {
            kinds.insert(ActionKind::GenToken);
        }
        if self.can_reduce(field) {
            kinds.insert(ActionKind::Reduce);
        }
        kinds
    }

    /// Productions `ApplyRule` may bind here, in declaration order. Empty when
    /// `ApplyRule` is not a valid continuation.
    pub fn valid_productions(&self) -> &[ProductionId] {
        match self.frontier_type() {
            Some(ty) if self.grammar.is_composite(ty) => self.grammar.production_ids_for(ty),
            _ => &[],
        }
    }

    fn can_reduce(&self, field: &RealizedField) -> bool {
        if !self.pending.is_empty() {
            return false;
        }
        match field.cardinality {
            Cardinality::Single => false,
            Cardinality::Optional => field.value.is_unset(),
            Cardinality::Multiple => !field.value.is_empty() || self.grammar.allow_empty_multiple(),
        }
    }

    fn is_string_field(&self, field: &RealizedField) -> bool {
        self.grammar.type_name(field.ty) == STRING_TYPE
    }

    fn node_at(&self, depth: usize) -> Option<&GenericNode> {
        let mut node = self.tree.as_ref()?;
        for frame in &self.frontier[..depth] {
            node = node
                .field_at(frame.field)?
                .values()
                .last()
                .and_then(Value::as_node)?;
        }
        Some(node)
    }

    fn node_at_mut(&mut self, depth: usize) -> Option<&mut GenericNode> {
        let mut node = self.tree.as_mut()?;
        for frame in &self.frontier[..depth] {
            node = node.last_child_mut(frame.field)?;
        }
        Some(node)
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

impl Hypothesis {
    /// Applies one action, or fails with a grammar violation and leaves the
    /// hypothesis unchanged.
    pub fn apply_action(&mut self, action: Action) -> Result<(), AsdlError> {
        self.check_action(&action)?;

        let t = self.t;
        match &action {
            Action::ApplyRule(id) => self.apply_rule(*id, t)?,
            Action::Reduce => self.reduce()?,
            Action::GenToken(token) => self.gen_token(token)?,
        }

        trace!(
            t,
            action = %action.display(&self.grammar),
            depth = self.frontier.len(),
            complete = self.is_complete(),
            "action applied"
        );
        self.history.push((action, t));
        self.t += 1;
        Ok(())
    }

    fn check_action(&self, action: &Action) -> Result<(), AsdlError> {
        if self.is_complete() {
            return Err(AsdlError::violation(
                "hypothesis is complete; no further actions are legal",
            ));
        }
        let kinds = self.valid_continuation_types();
        match action {
            Action::ApplyRule(id) => {
                if !self.valid_productions().contains(id) {
                    return Err(AsdlError::violation(format!(
                        "production {} is not valid at the frontier{}",
                        self.describe_production(*id),
                        self.describe_frontier()
                    )));
                }
            }
            Action::Reduce if !kinds.contains(&ActionKind::Reduce) => {
                return Err(AsdlError::violation(format!(
                    "Reduce is not valid at the frontier{}",
                    self.describe_frontier()
                )));
            }
            Action::GenToken(_) if !kinds.contains(&ActionKind::GenToken) => {
                return Err(AsdlError::violation(format!(
                    "GenToken requires a primitive field at the frontier{}",
                    self.describe_frontier()
                )));
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_rule(&mut self, id: ProductionId, t: u64) -> Result<(), AsdlError> {
        let production = self.grammar.production(id);
        let has_fields = !production.fields.is_empty();
        let mut node = GenericNode::new(production);
        node.created_at = Some(t);

        if self.tree.is_none() {
            self.tree = Some(node);
            if has_fields {
                self.frontier.push(Frame { field: 0 });
            }
            return Ok(());
        }

        self.open_field_mut()?.add_value(Value::Node(node))?;
        if has_fields {
            self.frontier.push(Frame { field: 0 });
        } else {
            self.value_completed()?;
        }
        Ok(())
    }

    fn reduce(&mut self) -> Result<(), AsdlError> {
        let field = self.open_field_mut()?;
        if field.cardinality == Cardinality::Multiple {
            field.init_empty();
        }
        self.advance()
    }

    fn gen_token(&mut self, token: &str) -> Result<(), AsdlError> {
        let is_string = self
            .frontier_field()
            .map(|field| self.is_string_field(field))
            .unwrap_or(false);

        let value = if is_string {
            if token != END_OF_VALUE {
                self.pending.push(token.to_string());
                return Ok(());
            }
            std::mem::take(&mut self.pending).join(" ")
        } else {
            token.to_string()
        };

        self.open_field_mut()?.add_value(Value::Token(value))?;
        self.value_completed()
    }

    /// A value was bound to the open field. `multiple` fields stay open until
    /// `Reduce`; anything else moves on.
    fn value_completed(&mut self) -> Result<(), AsdlError> {
        match self.frontier_field().map(|f| f.cardinality) {
            Some(Cardinality::Multiple) => Ok(()),
            Some(_) => self.advance(),
            None => Err(AsdlError::violation("no open field to complete")),
        }
    }

    /// Moves to the next declared field, closing finished ancestors until an
    /// open field is found or the tree is complete.
    fn advance(&mut self) -> Result<(), AsdlError> {
        while let Some(depth) = self.frontier.len().checked_sub(1) {
            let field_count = self
                .node_at(depth)
                .map(|node| node.fields.len())
                .ok_or_else(|| AsdlError::violation("frontier points outside the tree"))?;

            let frame = &mut self.frontier[depth];
            frame.field += 1;
            if frame.field < field_count {
                return Ok(());
            }

            self.frontier.pop();
            // The finished node fills its parent's field; a multiple field
            // stays open for more elements.
            if self.frontier_cardinality() == Some(Cardinality::Multiple) {
                return Ok(());
            }
        }
        Ok(())
    }

    fn open_field_mut(&mut self) -> Result<&mut RealizedField, AsdlError> {
        let depth = self
            .frontier
            .len()
            .checked_sub(1)
            .ok_or_else(|| AsdlError::violation("no open field"))?;
        let index = self.frontier[depth].field;
        self.node_at_mut(depth)
            .and_then(|node| node.field_at_mut(index))
            .ok_or_else(|| AsdlError::violation("frontier points outside the tree"))
    }

    fn describe_production(&self, id: ProductionId) -> String {
        match self.grammar.get_production(id) {
            Some(production) => format!("'{}'", production.constructor),
            None => format!("#{}", id.0),
        }
    }

    fn describe_frontier(&self) -> String {
        let ty = self
            .frontier_type()
            .map(|ty| self.grammar.type_name(ty).to_string())
            .unwrap_or_default();
        match self.frontier_field_name() {
            Some(name) => format!(" (field '{}' of type {})", name, ty),
            None => format!(" (root of type {})", ty),
        }
    }
}
