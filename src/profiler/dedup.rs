//! Deduplication keys for recorded events.
//!
//! Prediction can observe the same event more than once: a cached DFA error
//! edge is hit again on every replay of the same input, and a predicate may
//! be evaluated repeatedly at one position. Errors and predicate evaluations
//! are therefore kept in an [`EventSet`], which drops repeats by [`EventKey`]
//! while keeping first-seen order.
//!
//! ## What counts as "the same event"
//!
//! - decision, `start_index`, `stop_index`, `full_ctx`;
//! - for predicate evaluations, also the predicate and the alternative it
//!   guards, so two predicates evaluated at one position stay distinct.
//!
//! Configurations and input handles are not part of the key.

use super::events::{DecisionEvent, DecisionEventInfo};
use crate::{Alt, SemanticContext};
use std::collections::HashSet;
use std::slice;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub decision: usize,
    pub start_index: usize,
    pub stop_index: usize,
    pub full_ctx: bool,
    pub detail: Option<(SemanticContext, Alt)>,
}

impl EventKey {
    pub fn of(base: &DecisionEventInfo) -> Self {
        EventKey {
            decision: base.decision,
            start_index: base.start_index,
            stop_index: base.stop_index,
            full_ctx: base.full_ctx,
            detail: None,
        }
    }

    pub fn with_predicate(mut self, pred: SemanticContext, alt: Alt) -> Self {
        self.detail = Some((pred, alt));
        self
    }
}

/// Insertion-ordered set of events, unique by [`DecisionEvent::key`].
#[derive(Debug, Clone)]
pub struct EventSet<T> {
    items: Vec<T>,
    seen: HashSet<EventKey>,
}

impl<T> Default for EventSet<T> {
    fn default() -> Self {
        EventSet { items: Vec::new(), seen: HashSet::new() }
    }
}

impl<T: DecisionEvent> EventSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `event` unless an equal-keyed one is already present.
    pub fn insert(&mut self, event: T) -> bool {
        if !self.seen.insert(event.key()) {
            return false;
        }
        self.items.push(event);
        true
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.seen.contains(key)
    }
}

impl<T> EventSet<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a EventSet<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
