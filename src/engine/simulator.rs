//! The prediction engine's extension points.
//!
//! [`Simulator`] is the contract between prediction and anything that wants
//! to observe or adjust it. The required methods expose engine state; the
//! provided methods are the extension points, each defaulting to the base
//! routine in [`predict`](super::predict). Those routines are generic over
//! the simulator, so when one extension point calls another it goes through
//! whatever implementation is in front:
//!
//! ```text
//! adaptive_predict ──▶ existing_target_state ──(miss)──▶ compute_target_state
//!        │                                                     └─▶ compute_reach_set
//!        └─(conflict)─▶ report_attempting_full_context
//!                       compute_reach_set(full_ctx) ... ──▶ report_context_sensitivity
//!                                                       └─▶ report_ambiguity
//! ```
//!
//! [`ParserAtnSimulator`] is the plain engine: it owns the DFA caches and
//! takes every default.

use super::dfa::{Dfa, DfaTarget, StateId};
use super::mode::PredictionMode;
use super::predict;
use crate::error::PredictionError;
use crate::{Alt, AltSet, Atn, ConfigSet, ParserContext, SemanticContext, TokenStream, TokenType};
use std::fmt;
use std::sync::Arc;

/// Evaluates the parser's semantic predicates.
pub trait PredicateEvaluator {
    /// Evaluate predicate `pred_index` of rule `rule_index` in `ctx`.
    fn sempred(&self, ctx: &ParserContext, rule_index: usize, pred_index: usize) -> bool;

    /// Evaluate a precedence predicate. The default accepts precedence levels
    /// at or above the context's.
    fn precpred(&self, ctx: &ParserContext, precedence: u32) -> bool {
        precedence >= ctx.precedence()
    }
}

/// Evaluator for grammars without user predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruePredicates;

impl PredicateEvaluator for TruePredicates {
    fn sempred(&self, _ctx: &ParserContext, _rule_index: usize, _pred_index: usize) -> bool {
        true
    }
}

/// Per-call prediction state handed to every extension point.
pub struct DecisionFrame<'a> {
    pub decision: usize,
    /// Token index where this prediction started.
    pub start_index: usize,
    pub input: &'a dyn TokenStream,
    pub outer: &'a ParserContext,
}

impl<'a> DecisionFrame<'a> {
    pub fn new(decision: usize, start_index: usize, input: &'a dyn TokenStream, outer: &'a ParserContext) -> Self {
        DecisionFrame { decision, start_index, input, outer }
    }

    /// Current input position.
    pub fn index(&self) -> usize {
        self.input.index()
    }
}

impl fmt::Debug for DecisionFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionFrame")
            .field("decision", &self.decision)
            .field("start_index", &self.start_index)
            .field("index", &self.input.index())
            .field("outer", &self.outer)
            .finish()
    }
}

/// A prediction engine with observable extension points.
pub trait Simulator {
    fn atn(&self) -> &Arc<Atn>;

    fn prediction_mode(&self) -> PredictionMode;

    fn dfa(&self, decision: usize) -> &Dfa;

    fn dfa_mut(&mut self, decision: usize) -> &mut Dfa;

    fn predicate_evaluator(&self) -> &dyn PredicateEvaluator;

    /// Predict which alternative of `decision` to take at the current input
    /// position. The input is left where it was.
    fn adaptive_predict(
        &mut self,
        input: &mut dyn TokenStream,
        decision: usize,
        outer: &ParserContext,
    ) -> Result<Alt, PredictionError> {
        predict::adaptive_predict(self, input, decision, outer)
    }

    /// Cached DFA edge from `previous` on `t`, if SLL already computed it.
    fn existing_target_state(&mut self, frame: &DecisionFrame<'_>, previous: StateId, t: TokenType) -> Option<DfaTarget> {
        predict::existing_target_state(self, frame, previous, t)
    }

    /// Compute (and cache) the DFA edge from `previous` on `t`.
    fn compute_target_state(&mut self, frame: &DecisionFrame<'_>, previous: StateId, t: TokenType) -> DfaTarget {
        predict::compute_target_state(self, frame, previous, t)
    }

    /// Configurations reachable from `closure` by matching `t`. Empty when
    /// nothing survives.
    fn compute_reach_set(&mut self, frame: &DecisionFrame<'_>, closure: &ConfigSet, t: TokenType, full_ctx: bool) -> ConfigSet {
        predict::compute_reach_set(self, frame, closure, t, full_ctx)
    }

    fn eval_semantic_context(&mut self, frame: &DecisionFrame<'_>, pred: &SemanticContext, alt: Alt, full_ctx: bool) -> bool {
        predict::eval_semantic_context(self, frame, pred, alt, full_ctx)
    }

    /// SLL hit a conflict and prediction is about to retry with full context.
    fn report_attempting_full_context(
        &mut self,
        frame: &DecisionFrame<'_>,
        conflicting_alts: Option<&AltSet>,
        configs: &ConfigSet,
        start_index: usize,
        stop_index: usize,
    ) {
        tracing::debug!(
            decision = frame.decision,
            start_index,
            stop_index,
            conflicting = %conflicting_alts.map(ToString::to_string).unwrap_or_else(|| configs.alts().to_string()),
            input = %frame.input.handle().text(start_index, stop_index),
            "attempting full context"
        );
    }

    /// Full-context prediction found a unique alternative after SLL conflicted.
    fn report_context_sensitivity(
        &mut self,
        frame: &DecisionFrame<'_>,
        prediction: Alt,
        configs: &ConfigSet,
        start_index: usize,
        stop_index: usize,
    ) {
        tracing::debug!(
            decision = frame.decision,
            prediction,
            start_index,
            stop_index,
            configs = configs.len(),
            input = %frame.input.handle().text(start_index, stop_index),
            "context sensitivity"
        );
    }

    /// Prediction settled on a conflict: several alternatives match the input.
    #[allow(clippy::too_many_arguments)]
    fn report_ambiguity(
        &mut self,
        frame: &DecisionFrame<'_>,
        state: Option<StateId>,
        start_index: usize,
        stop_index: usize,
        exact: bool,
        ambig_alts: Option<&AltSet>,
        configs: &ConfigSet,
    ) {
        tracing::debug!(
            decision = frame.decision,
            ?state,
            start_index,
            stop_index,
            exact,
            alts = %ambig_alts.map(ToString::to_string).unwrap_or_else(|| configs.alts().to_string()),
            input = %frame.input.handle().text(start_index, stop_index),
            "ambiguity"
        );
    }
}

/// The base prediction engine.
pub struct ParserAtnSimulator {
    atn: Arc<Atn>,
    dfas: Vec<Dfa>,
    mode: PredictionMode,
    predicates: Box<dyn PredicateEvaluator + Send + Sync>,
}

impl ParserAtnSimulator {
    pub fn new(atn: Arc<Atn>) -> Self {
        let dfas = (0..atn.num_decisions()).map(Dfa::new).collect();
        ParserAtnSimulator { atn, dfas, mode: PredictionMode::default(), predicates: Box::new(TruePredicates) }
    }

    pub fn with_mode(mut self, mode: PredictionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_predicates(mut self, predicates: impl PredicateEvaluator + Send + Sync + 'static) -> Self {
        self.predicates = Box::new(predicates);
        self
    }

    pub fn set_prediction_mode(&mut self, mode: PredictionMode) {
        self.mode = mode;
    }

    /// Drop every cached DFA state.
    pub fn clear_dfa(&mut self) {
        self.dfas = (0..self.atn.num_decisions()).map(Dfa::new).collect();
    }
}

impl fmt::Debug for ParserAtnSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserAtnSimulator")
            .field("decisions", &self.atn.num_decisions())
            .field("dfa_states", &self.dfas.iter().map(Dfa::len).sum::<usize>())
            .field("mode", &self.mode)
            .finish()
    }
}

impl Simulator for ParserAtnSimulator {
    fn atn(&self) -> &Arc<Atn> {
        &self.atn
    }

    fn prediction_mode(&self) -> PredictionMode {
        self.mode
    }

    fn dfa(&self, decision: usize) -> &Dfa {
        &self.dfas[decision]
    }

    fn dfa_mut(&mut self, decision: usize) -> &mut Dfa {
        &mut self.dfas[decision]
    }

    fn predicate_evaluator(&self) -> &dyn PredicateEvaluator {
        self.predicates.as_ref()
    }
}
