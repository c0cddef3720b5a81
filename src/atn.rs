//! Declarative ATN model.
//!
//! Building an ATN from grammar text is out of scope; this module holds the
//! *static* side of prediction in a form small enough to write by hand:
//!
//! - each decision lists its productions as flat token sequences, numbered by
//!   alternative and optionally guarded by a semantic predicate;
//! - each decision lists the return states (call sites) its rule is invoked
//!   from, and every return state carries the tokens that follow the call.
//!
//! SLL prediction follows *every* caller when a production completes, which
//! is exactly the context-insensitivity that can make it disagree with LL.
//!
//! ```text
//! decision "stat"          return states
//!   1: ID                    member:    . ;
//!   2: ID .                  statement: ;
//!
//! input "x . ;" from statement:
//!   SLL sees 1 (via member) and 2 (via statement) both reach the end -> conflict
//!   LL only follows statement -> 2
//! ```
//!
//! ## Invariants
//!
//! - Decision `i` is stored at `decisions[i]`; [`Atn::decision`] panics on an
//!   unknown index (a caller contract violation).
//! - Alternative numbers start at 1.
//! - Every caller id refers to an existing return state.

#[path = "atn/config.rs"]
mod config;

pub use config::{AtnConfig, ConfigSet, ConfigState};

use crate::error::{Error, Result};
use crate::{Alt, AltSet, EOF, ReturnStateId, SemanticContext, TokenType};

static EOF_FOLLOW: [TokenType; 1] = [EOF];

/// One production of a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub alt: Alt,
    pub guard: SemanticContext,
    pub symbols: Vec<TokenType>,
}

/// A decision point and the productions it chooses between.
#[derive(Debug, Clone)]
pub struct DecisionState {
    pub decision: usize,
    pub name: String,
    pub productions: Vec<Production>,
    /// Return states the decision's rule is invoked from.
    pub callers: Vec<ReturnStateId>,
}

impl DecisionState {
    pub fn alts(&self) -> AltSet {
        self.productions.iter().map(|p| p.alt).collect()
    }
}

/// A call site: the tokens that follow once the invoked rule completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnState {
    pub name: String,
    pub follow: Vec<TokenType>,
}

/// What comes after a completed production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Follow {
    /// Continue with a caller's follow tokens.
    Caller(ReturnStateId),
    /// The rule was invoked from the start rule: only EOF may follow.
    Eof,
}

/// Immutable prediction automaton shared by every simulator over a grammar.
#[derive(Debug, Clone)]
pub struct Atn {
    decisions: Vec<DecisionState>,
    return_states: Vec<ReturnState>,
}

impl Atn {
    pub fn num_decisions(&self) -> usize {
        self.decisions.len()
    }

    pub fn decisions(&self) -> &[DecisionState] {
        &self.decisions
    }

    pub fn decision(&self, decision: usize) -> &DecisionState {
        match self.decisions.get(decision) {
            Some(state) => state,
            None => panic!("decision {decision} out of range (ATN has {} decisions)", self.decisions.len()),
        }
    }

    pub fn return_states(&self) -> &[ReturnState] {
        &self.return_states
    }

    pub fn return_state(&self, id: ReturnStateId) -> Option<&ReturnState> {
        self.return_states.get(id)
    }

    pub fn follow_symbols(&self, follow: Follow) -> &[TokenType] {
        match follow {
            Follow::Caller(id) => self.return_states.get(id).map(|rs| rs.follow.as_slice()).unwrap_or(&EOF_FOLLOW),
            Follow::Eof => &EOF_FOLLOW,
        }
    }

    /// The token a configuration of `decision` is waiting for, or `None` at
    /// rule stop.
    pub fn expected(&self, decision: &DecisionState, state: &ConfigState) -> Option<TokenType> {
        match *state {
            ConfigState::Body { production, offset } => {
                decision.productions.get(production).and_then(|p| p.symbols.get(offset)).copied()
            }
            ConfigState::Follow { follow, offset } => self.follow_symbols(follow).get(offset).copied(),
            ConfigState::Stop => None,
        }
    }
}

// --- Builder -----------------------------------------------------------------

/// Productions and call sites for one decision, consumed by [`AtnBuilder`].
#[derive(Debug, Clone)]
pub struct DecisionBuilder {
    name: String,
    productions: Vec<Production>,
    callers: Vec<ReturnStateId>,
}

impl DecisionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        DecisionBuilder { name: name.into(), productions: Vec::new(), callers: Vec::new() }
    }

    /// Add an unguarded production for `alt`.
    pub fn alt(self, alt: Alt, symbols: impl IntoIterator<Item = TokenType>) -> Self {
        self.guarded(alt, SemanticContext::None, symbols)
    }

    /// Add a production for `alt` guarded by `guard`.
    pub fn guarded(mut self, alt: Alt, guard: SemanticContext, symbols: impl IntoIterator<Item = TokenType>) -> Self {
        self.productions.push(Production { alt, guard, symbols: symbols.into_iter().collect() });
        self
    }

    pub fn called_from(mut self, return_state: ReturnStateId) -> Self {
        if !self.callers.contains(&return_state) {
            self.callers.push(return_state);
        }
        self
    }
}

/// Incrementally assembles and validates an [`Atn`].
#[derive(Debug, Default)]
pub struct AtnBuilder {
    decisions: Vec<DecisionBuilder>,
    return_states: Vec<ReturnState>,
}

impl AtnBuilder {
    pub fn new() -> Self {
        AtnBuilder::default()
    }

    /// Register a call site and return its id.
    pub fn return_state(&mut self, name: impl Into<String>, follow: impl IntoIterator<Item = TokenType>) -> ReturnStateId {
        self.return_states.push(ReturnState { name: name.into(), follow: follow.into_iter().collect() });
        self.return_states.len() - 1
    }

    /// Register a decision and return its index.
    pub fn decision(&mut self, decision: DecisionBuilder) -> usize {
        self.decisions.push(decision);
        self.decisions.len() - 1
    }

    pub fn build(self) -> Result<Atn> {
        let mut decisions = Vec::with_capacity(self.decisions.len());
        for (index, d) in self.decisions.into_iter().enumerate() {
            if d.productions.is_empty() {
                return Err(invalid(format!("decision {index} ({}) has no productions", d.name)));
            }
            if let Some(p) = d.productions.iter().find(|p| p.alt == 0) {
                return Err(invalid(format!("decision {index} ({}): alternative numbers start at 1, got {}", d.name, p.alt)));
            }
            if let Some(&caller) = d.callers.iter().find(|&&c| c >= self.return_states.len()) {
                return Err(invalid(format!("decision {index} ({}) references unknown return state {caller}", d.name)));
            }
            decisions.push(DecisionState { decision: index, name: d.name, productions: d.productions, callers: d.callers });
        }
        Ok(Atn { decisions, return_states: self.return_states })
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidAtn { message }
}
