//! Per-decision DFA cache.
//!
//! SLL prediction memoizes what it learns: every distinct configuration set
//! becomes a DFA state, and every (state, token) step becomes an edge. Most
//! decisions are then answered by following one or two cached edges.
//!
//! Edges point either at a state or at [`DfaTarget::Error`], the sentinel for
//! "no configuration survives this token".

use crate::{Alt, AltSet, ConfigSet, SemanticContext, TokenType};
use std::collections::HashMap;
use std::sync::Arc;

/// Index of a state in its [`Dfa`].
pub type StateId = usize;

/// Result of following a DFA edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DfaTarget {
    State(StateId),
    /// The shared error sentinel.
    Error,
}

/// A predicate that must hold for `alt` to be predicted from an accept state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredPrediction {
    pub pred: SemanticContext,
    pub alt: Alt,
}

#[derive(Debug, Clone)]
pub struct DfaState {
    pub configs: Arc<ConfigSet>,
    pub is_accept: bool,
    /// Predicted alternative for accept states without predicates.
    pub prediction: Option<Alt>,
    /// SLL stopped on a conflict that LL may be able to resolve.
    pub requires_full_context: bool,
    pub conflicting_alts: Option<AltSet>,
    /// Predicates to evaluate before trusting this accept state.
    pub predicates: Option<Vec<PredPrediction>>,
}

impl DfaState {
    pub fn new(configs: ConfigSet) -> Self {
        DfaState {
            configs: Arc::new(configs),
            is_accept: false,
            prediction: None,
            requires_full_context: false,
            conflicting_alts: None,
            predicates: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dfa {
    pub decision: usize,
    states: Vec<DfaState>,
    by_configs: HashMap<Arc<ConfigSet>, StateId>,
    edges: HashMap<(StateId, TokenType), DfaTarget>,
    s0: Option<StateId>,
}

impl Dfa {
    pub fn new(decision: usize) -> Self {
        Dfa { decision, states: Vec::new(), by_configs: HashMap::new(), edges: HashMap::new(), s0: None }
    }

    pub fn s0(&self) -> Option<StateId> {
        self.s0
    }

    pub fn set_s0(&mut self, state: StateId) {
        self.s0 = Some(state);
    }

    /// Intern `state`, returning the id of an existing state with the same
    /// configurations when there is one.
    pub fn add_state(&mut self, state: DfaState) -> StateId {
        if let Some(&id) = self.by_configs.get(&state.configs) {
            return id;
        }
        let id = self.states.len();
        self.by_configs.insert(Arc::clone(&state.configs), id);
        self.states.push(state);
        id
    }

    pub fn state(&self, id: StateId) -> &DfaState {
        &self.states[id]
    }

    pub fn edge(&self, from: StateId, t: TokenType) -> Option<DfaTarget> {
        self.edges.get(&(from, t)).copied()
    }

    pub fn add_edge(&mut self, from: StateId, t: TokenType, target: DfaTarget) {
        self.edges.insert((from, t), target);
    }

    /// Number of states, the usual measure of how much a decision cached.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
