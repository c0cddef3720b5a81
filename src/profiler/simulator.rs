//! The profiling decorator.
//!
//! ## How the hooks are wired
//!
//! Hooks whose base routine calls other hooks (`adaptive_predict`,
//! `compute_target_state`, `compute_reach_set`) run that routine with the
//! profiler as the simulator, so every nested hook call is observed. Leaf
//! hooks forward to the wrapped simulator. DFA caches, the ATN, the prediction
//! mode, and predicate evaluation always belong to the wrapped simulator.
//!
//! ## Per-call trackers
//!
//! `adaptive_predict` resets these before running:
//!
//! - `sll_stop_index`: input index at the latest SLL step;
//! - `ll_stop_index`: input index at the latest LL step, `None` unless
//!   full-context prediction ran;
//! - `sll_resolved_alt`: what SLL would have predicted when it escalated.
//!
//! Hooks called while no decision is active are a contract violation and
//! panic.

use crate::engine::predict;
use crate::{
    Alt, AltSet, Atn, ConfigSet, DecisionEventInfo, DecisionFrame, DecisionInfo, Dfa, DfaTarget, ParseInfo,
    ParserAtnSimulator, ParserContext, PredicateEvaluator, PredictionError, PredictionMode, SemanticContext, Simulator,
    StateId, TokenStream, TokenType,
};
use super::events::{AmbiguityInfo, ContextSensitivityInfo, ErrorInfo, LookaheadEventInfo, PredicateEvalInfo};
use std::sync::Arc;
use std::time::Instant;

/// Profiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilerOptions {
    /// Keep a snapshot of the active configurations on error, ambiguity and
    /// context-sensitivity events.
    pub capture_configs: bool,
}

impl Default for ProfilerOptions {
    fn default() -> Self {
        ProfilerOptions { capture_configs: true }
    }
}

/// A [`Simulator`] that records per-decision statistics and events.
#[derive(Debug)]
pub struct ProfilingAtnSimulator<S = ParserAtnSimulator> {
    inner: S,
    options: ProfilerOptions,
    decisions: Vec<DecisionInfo>,
    current_decision: Option<usize>,
    current_state: Option<DfaTarget>,
    sll_stop_index: Option<usize>,
    ll_stop_index: Option<usize>,
    sll_resolved_alt: Option<Alt>,
}

/// Keeps a decision active until dropped, unwinding included.
struct ActiveDecision<'a, S> {
    profiler: &'a mut ProfilingAtnSimulator<S>,
}

impl<'a, S> ActiveDecision<'a, S> {
    fn enter(profiler: &'a mut ProfilingAtnSimulator<S>, decision: usize) -> Self {
        profiler.current_decision = Some(decision);
        ActiveDecision { profiler }
    }
}

impl<S> Drop for ActiveDecision<'_, S> {
    fn drop(&mut self) {
        self.profiler.current_decision = None;
    }
}

impl<S: Simulator> ProfilingAtnSimulator<S> {
    pub fn new(inner: S) -> Self {
        Self::with_options(inner, ProfilerOptions::default())
    }

    pub fn with_options(inner: S, options: ProfilerOptions) -> Self {
        let decisions = (0..inner.atn().num_decisions()).map(DecisionInfo::new).collect();
        ProfilingAtnSimulator {
            inner,
            options,
            decisions,
            current_decision: None,
            current_state: None,
            sll_stop_index: None,
            ll_stop_index: None,
            sll_resolved_alt: None,
        }
    }

    /// The table of per-decision data, indexed by decision number.
    pub fn decision_info(&self) -> &[DecisionInfo] {
        &self.decisions
    }

    /// Reporting view over [`decision_info`](Self::decision_info).
    pub fn parse_info(&self) -> ParseInfo<'_> {
        let dfa_sizes = (0..self.decisions.len()).map(|d| self.inner.dfa(d).len()).collect();
        ParseInfo::new(&self.decisions, dfa_sizes)
    }

    /// The DFA target most recently computed by SLL.
    pub fn current_state(&self) -> Option<DfaTarget> {
        self.current_state
    }

    pub fn options(&self) -> ProfilerOptions {
        self.options
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn active_decision(&self) -> usize {
        match self.current_decision {
            Some(decision) => decision,
            None => panic!("profiler hook called outside adaptive_predict"),
        }
    }

    fn snapshot(&self, configs: impl FnOnce() -> Arc<ConfigSet>) -> Option<Arc<ConfigSet>> {
        self.options.capture_configs.then(configs)
    }

    fn event(
        &self,
        frame: &DecisionFrame<'_>,
        configs: Option<Arc<ConfigSet>>,
        stop_index: usize,
        full_ctx: bool,
    ) -> DecisionEventInfo {
        DecisionEventInfo::new(frame.decision, configs, frame.input.handle(), frame.start_index, stop_index, full_ctx)
    }

    fn record_error(&mut self, frame: &DecisionFrame<'_>, configs: Option<Arc<ConfigSet>>, stop_index: usize, full_ctx: bool) {
        let decision = self.active_decision();
        let error = ErrorInfo { base: self.event(frame, configs, stop_index, full_ctx) };
        if self.decisions[decision].errors.insert(error) {
            tracing::trace!(decision, start_index = frame.start_index, stop_index, full_ctx, "no viable alternative");
        }
    }

    fn record_context_sensitivity(&mut self, frame: &DecisionFrame<'_>, configs: &ConfigSet, stop_index: usize) {
        let decision = self.active_decision();
        let snapshot = self.snapshot(|| Arc::new(configs.clone()));
        let event = ContextSensitivityInfo { base: self.event(frame, snapshot, stop_index, true) };
        self.decisions[decision].context_sensitivities.push(event);
    }
}

impl<S: Simulator> Simulator for ProfilingAtnSimulator<S> {
    fn atn(&self) -> &Arc<Atn> {
        self.inner.atn()
    }

    fn prediction_mode(&self) -> PredictionMode {
        self.inner.prediction_mode()
    }

    fn dfa(&self, decision: usize) -> &Dfa {
        self.inner.dfa(decision)
    }

    fn dfa_mut(&mut self, decision: usize) -> &mut Dfa {
        self.inner.dfa_mut(decision)
    }

    fn predicate_evaluator(&self) -> &dyn PredicateEvaluator {
        self.inner.predicate_evaluator()
    }

    fn adaptive_predict(
        &mut self,
        input: &mut dyn TokenStream,
        decision: usize,
        outer: &ParserContext,
    ) -> Result<Alt, PredictionError> {
        assert!(
            decision < self.decisions.len(),
            "decision {decision} out of range ({} decisions)",
            self.decisions.len()
        );
        self.sll_stop_index = None;
        self.ll_stop_index = None;
        self.sll_resolved_alt = None;
        self.current_state = None;

        let start_index = input.index();
        let started = Instant::now();
        let result = {
            let mut active = ActiveDecision::enter(self, decision);
            predict::adaptive_predict(&mut *active.profiler, input, decision, outer)
        };
        let elapsed = Instant::now().checked_duration_since(started);

        let handle = input.handle();
        let predicted_alt = result.as_ref().ok().copied();
        let (sll_stop, ll_stop) = (self.sll_stop_index, self.ll_stop_index);
        let info = &mut self.decisions[decision];

        match elapsed {
            Some(elapsed) => info.time_in_prediction += elapsed,
            None => tracing::warn!(decision, "clock went backwards, prediction time not recorded"),
        }
        info.invocations += 1;

        if let Some(stop) = sll_stop {
            let depth = (stop.saturating_sub(start_index) + 1) as u64;
            info.sll.record(depth, || LookaheadEventInfo {
                base: DecisionEventInfo::new(decision, None, handle.clone(), start_index, stop, false),
                predicted_alt,
            });
        }
        if let Some(stop) = ll_stop {
            let depth = (stop.saturating_sub(start_index) + 1) as u64;
            info.ll.record(depth, || LookaheadEventInfo {
                base: DecisionEventInfo::new(decision, None, handle.clone(), start_index, stop, true),
                predicted_alt,
            });
        }
        result
    }

    fn existing_target_state(&mut self, frame: &DecisionFrame<'_>, previous: StateId, t: TokenType) -> Option<DfaTarget> {
        let decision = self.active_decision();
        let stop_index = frame.index();
        self.sll_stop_index = Some(stop_index);

        let target = self.inner.existing_target_state(frame, previous, t);
        if let Some(target) = target {
            self.current_state = Some(target);
            self.decisions[decision].sll_dfa_transitions += 1;
            if target == DfaTarget::Error {
                let configs = self.snapshot(|| Arc::clone(&self.inner.dfa(decision).state(previous).configs));
                self.record_error(frame, configs, stop_index, false);
            }
        }
        target
    }

    fn compute_target_state(&mut self, frame: &DecisionFrame<'_>, previous: StateId, t: TokenType) -> DfaTarget {
        self.active_decision();
        let target = predict::compute_target_state(self, frame, previous, t);
        self.current_state = Some(target);
        target
    }

    fn compute_reach_set(&mut self, frame: &DecisionFrame<'_>, closure: &ConfigSet, t: TokenType, full_ctx: bool) -> ConfigSet {
        let decision = self.active_decision();
        if full_ctx {
            self.ll_stop_index = Some(frame.index());
        }

        let reach = predict::compute_reach_set(self, frame, closure, t, full_ctx);

        let info = &mut self.decisions[decision];
        if full_ctx {
            info.ll_atn_transitions += 1;
        } else {
            info.sll_atn_transitions += 1;
        }

        if reach.is_empty() {
            let stop = if full_ctx { self.ll_stop_index } else { self.sll_stop_index };
            let stop_index = stop.unwrap_or_else(|| frame.index());
            let configs = self.snapshot(|| Arc::new(closure.clone()));
            self.record_error(frame, configs, stop_index, full_ctx);
        }
        reach
    }

    fn eval_semantic_context(&mut self, frame: &DecisionFrame<'_>, pred: &SemanticContext, alt: Alt, full_ctx: bool) -> bool {
        let decision = self.active_decision();
        let result = self.inner.eval_semantic_context(frame, pred, alt, full_ctx);

        if !pred.is_precedence() {
            let stop_index = self.ll_stop_index.or(self.sll_stop_index).unwrap_or_else(|| frame.index());
            let event = PredicateEvalInfo {
                base: self.event(frame, None, stop_index, full_ctx),
                semctx: pred.clone(),
                predicted_alt: alt,
                eval_result: result,
            };
            self.decisions[decision].predicate_evals.insert(event);
        }
        result
    }

    fn report_attempting_full_context(
        &mut self,
        frame: &DecisionFrame<'_>,
        conflicting_alts: Option<&AltSet>,
        configs: &ConfigSet,
        start_index: usize,
        stop_index: usize,
    ) {
        let decision = self.active_decision();
        self.sll_resolved_alt = conflicting_alts.and_then(AltSet::lowest).or_else(|| configs.alts().lowest());
        self.decisions[decision].ll_fallback += 1;
        self.inner.report_attempting_full_context(frame, conflicting_alts, configs, start_index, stop_index);
    }

    fn report_context_sensitivity(
        &mut self,
        frame: &DecisionFrame<'_>,
        prediction: Alt,
        configs: &ConfigSet,
        start_index: usize,
        stop_index: usize,
    ) {
        self.active_decision();
        if self.sll_resolved_alt != Some(prediction) {
            self.record_context_sensitivity(frame, configs, stop_index);
        }
        self.inner.report_context_sensitivity(frame, prediction, configs, start_index, stop_index);
    }

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
        let decision = self.active_decision();
        let alts = ambig_alts.cloned().unwrap_or_else(|| configs.alts());
        let representative = alts.lowest();

        // LL settled on a different alternative than SLL would have.
        if configs.full_ctx() && matches!((self.sll_resolved_alt, representative), (Some(sll), Some(ll)) if sll != ll) {
            self.record_context_sensitivity(frame, configs, stop_index);
        }

        let snapshot = self.snapshot(|| Arc::new(configs.clone()));
        let event = AmbiguityInfo { base: self.event(frame, snapshot, stop_index, configs.full_ctx()), ambig_alts: alts };
        self.decisions[decision].ambiguities.push(event);

        self.inner.report_ambiguity(frame, state, start_index, stop_index, exact, ambig_alts, configs);
    }
}
