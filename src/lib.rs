//! Profiling layer for adaptive LL(*) prediction.
//!
//! Generated parsers resolve every grammar decision by asking a prediction
//! engine which alternative to take. The engine first tries a fast,
//! context-insensitive walk over a per-decision DFA cache (SLL) and only
//! escalates to full-context (LL) prediction when SLL detects a conflict.
//!
//! This crate ships:
//!
//! - a compact reference engine ([`ParserAtnSimulator`]) whose extension
//!   points are exposed through the [`Simulator`] trait;
//! - a profiling decorator ([`ProfilingAtnSimulator`]) that observes those
//!   extension points and fills one [`DecisionInfo`] per decision;
//! - reporting queries over the collected table ([`ParseInfo`]).
//!
//! ```
//! use atn_profiler::{CommonTokenStream, ParserAtnSimulator, ParserContext, ProfilingAtnSimulator, Simulator};
//! use atn_profiler::sample;
//!
//! let mut profiler = ProfilingAtnSimulator::new(ParserAtnSimulator::new(sample::atn()));
//! let tokens = sample::tokenize("x = 1 ;").unwrap();
//! let mut input = CommonTokenStream::new("<doc>", tokens);
//!
//! let alt = profiler.adaptive_predict(&mut input, sample::STAT, &sample::statement_context()).unwrap();
//! assert_eq!(alt, 4);
//! assert_eq!(profiler.decision_info()[sample::STAT].invocations, 1);
//! ```

extern crate self as atn_profiler;

use std::collections::BTreeSet;
use std::fmt;

#[macro_use]
mod macros;
mod api;
mod atn;
mod engine;
mod error;
pub mod logging;
mod profiler;
pub mod sample;
mod token;

pub use api::{DecisionFlags, DecisionSummary, ParseInfo};
pub use atn::{Atn, AtnBuilder, AtnConfig, ConfigSet, ConfigState, DecisionBuilder, DecisionState, Follow, Production, ReturnState};
pub use engine::{
    DecisionFrame, Dfa, DfaState, DfaTarget, PredPrediction, ParserAtnSimulator, PredicateEvaluator, PredictionMode,
    Simulator, StateId, TruePredicates,
};
pub use error::{Error, PredictionError, Result};
pub use profiler::{
    AmbiguityInfo, ContextSensitivityInfo, DecisionEvent, DecisionEventInfo, DecisionInfo, ErrorInfo, EventKey,
    EventSet, LookaheadEventInfo, LookaheadStats, PredicateEvalInfo, ProfilerOptions, ProfilingAtnSimulator,
};
pub use token::{CommonTokenStream, InputHandle, Token, TokenStream};

// --- Core identifiers -------------------------------------------------------

/// Token type as produced by a lexer. Negative values are reserved.
pub type TokenType = i32;

/// End-of-file token type.
pub const EOF: TokenType = -1;

/// Alternative number within a decision. Alternatives are numbered from 1.
pub type Alt = u32;

/// Index of a return state (a call site of a decision's rule) in the ATN.
pub type ReturnStateId = usize;

// --- Alternative sets -------------------------------------------------------

/// Ordered set of alternative numbers.
///
/// Iteration and [`AltSet::lowest`] are deterministic, which is what makes the
/// "representative alternative" of a conflict reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AltSet(BTreeSet<Alt>);

impl AltSet {
    pub fn new() -> Self {
        AltSet(BTreeSet::new())
    }

    pub fn insert(&mut self, alt: Alt) -> bool {
        self.0.insert(alt)
    }

    pub fn contains(&self, alt: Alt) -> bool {
        self.0.contains(&alt)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest alternative in the set.
    pub fn lowest(&self) -> Option<Alt> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Alt> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Alt> for AltSet {
    fn from_iter<I: IntoIterator<Item = Alt>>(iter: I) -> Self {
        AltSet(iter.into_iter().collect())
    }
}

impl Extend<Alt> for AltSet {
    fn extend<I: IntoIterator<Item = Alt>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl fmt::Display for AltSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, alt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{alt}")?;
        }
        f.write_str("}")
    }
}

// --- Semantic predicates ----------------------------------------------------

/// Guard attached to a production.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SemanticContext {
    /// No guard; always true.
    #[default]
    None,
    /// A user predicate `{...}?` identified by rule and predicate index.
    ///
    /// Context-dependent predicates read the invoking context and are only
    /// evaluated during full-context prediction.
    Predicate { rule_index: usize, pred_index: usize, ctx_dependent: bool },
    /// A precedence predicate `{precpred(_ctx, n)}?` from left-recursion
    /// elimination.
    Precedence { precedence: u32 },
}

impl SemanticContext {
    pub fn is_none(&self) -> bool {
        matches!(self, SemanticContext::None)
    }

    pub fn is_ctx_dependent(&self) -> bool {
        matches!(self, SemanticContext::Predicate { ctx_dependent: true, .. })
    }

    pub fn is_precedence(&self) -> bool {
        matches!(self, SemanticContext::Precedence { .. })
    }
}

impl fmt::Display for SemanticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticContext::None => f.write_str("true"),
            SemanticContext::Predicate { rule_index, pred_index, .. } => write!(f, "{{{rule_index}:{pred_index}}}?"),
            SemanticContext::Precedence { precedence } => write!(f, "{{{precedence}>=prec}}?"),
        }
    }
}

// --- Outer parser context ---------------------------------------------------

/// The invocation stack at the point a decision is predicted.
///
/// Only the innermost return state matters to full-context prediction in
/// this engine: it selects which follow sequence comes after the decision's
/// rule. An empty context means the rule was the start rule (follow = EOF).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParserContext {
    invoking: Vec<ReturnStateId>,
    precedence: u32,
}

impl ParserContext {
    pub fn empty() -> Self {
        ParserContext::default()
    }

    /// Return a context with `return_state` pushed as the innermost call site.
    pub fn invoked_from(mut self, return_state: ReturnStateId) -> Self {
        self.invoking.push(return_state);
        self
    }

    pub fn with_precedence(mut self, precedence: u32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn innermost(&self) -> Option<ReturnStateId> {
        self.invoking.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.invoking.len()
    }

    pub fn precedence(&self) -> u32 {
        self.precedence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alt_set_lowest_ignores_insertion_order() {
        let mut alts = AltSet::new();
        alts.insert(3);
        alts.insert(1);
        alts.insert(2);
        assert_eq!(alts.lowest(), Some(1));
        assert_eq!(alts.to_string(), "{1, 2, 3}");
        assert_eq!(AltSet::new().lowest(), None);
        assert_eq!(alts![4, 2].lowest(), Some(2));
    }

    #[test]
    fn semantic_context_classification() {
        let ctx_pred = SemanticContext::Predicate { rule_index: 0, pred_index: 1, ctx_dependent: true };
        assert!(ctx_pred.is_ctx_dependent());
        assert!(!ctx_pred.is_precedence());
        assert!(SemanticContext::Precedence { precedence: 2 }.is_precedence());
        assert!(SemanticContext::default().is_none());
        assert_eq!(ctx_pred.to_string(), "{0:1}?");
    }

    #[test]
    fn parser_context_tracks_innermost_call_site() {
        let ctx = ParserContext::empty().invoked_from(4).invoked_from(7);
        assert_eq!(ctx.innermost(), Some(7));
        assert_eq!(ctx.depth(), 2);
        assert_eq!(ParserContext::empty().innermost(), None);
    }
}
