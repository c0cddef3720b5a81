//! Per-decision profiling data.
//!
//! One [`DecisionInfo`] exists per decision, created when the profiler is
//! built. The profiler is the only writer; counters only ever grow.
//!
//! Lookahead depth is tracked separately for SLL and LL. Both start *unset*
//! (`None`), which is different from a depth of zero: LL stats stay unset for
//! decisions that never fell back to full context.

use super::dedup::EventSet;
use super::events::{AmbiguityInfo, ContextSensitivityInfo, ErrorInfo, LookaheadEventInfo, PredicateEvalInfo};
use crate::DecisionFlags;
use std::time::Duration;

/// Lookahead depth statistics for one prediction stage.
#[derive(Debug, Clone, Default)]
pub struct LookaheadStats {
    /// Sum of depths over every prediction that ran this stage.
    pub total_look: u64,
    pub min_look: Option<u64>,
    pub max_look: Option<u64>,
    /// The prediction that set the current maximum.
    pub max_look_event: Option<LookaheadEventInfo>,
}

impl LookaheadStats {
    /// Fold in one prediction that examined `depth` tokens. `event` is only
    /// built when the depth is a new maximum.
    pub fn record(&mut self, depth: u64, event: impl FnOnce() -> LookaheadEventInfo) {
        self.total_look += depth;
        self.min_look = Some(self.min_look.map_or(depth, |min| min.min(depth)));
        if self.max_look.is_none_or(|max| depth > max) {
            self.max_look = Some(depth);
            self.max_look_event = Some(event());
        }
    }

    pub fn is_set(&self) -> bool {
        self.min_look.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct DecisionInfo {
    pub decision: usize,
    /// Calls to `adaptive_predict` for this decision, failed ones included.
    pub invocations: u64,
    pub time_in_prediction: Duration,
    pub sll: LookaheadStats,
    pub ll: LookaheadStats,
    /// Reach sets computed during SLL (DFA misses).
    pub sll_atn_transitions: u64,
    /// Cached DFA edges followed during SLL.
    pub sll_dfa_transitions: u64,
    pub ll_atn_transitions: u64,
    /// Times SLL escalated to full-context prediction.
    pub ll_fallback: u64,
    pub context_sensitivities: Vec<ContextSensitivityInfo>,
    pub errors: EventSet<ErrorInfo>,
    pub ambiguities: Vec<AmbiguityInfo>,
    pub predicate_evals: EventSet<PredicateEvalInfo>,
}

impl DecisionInfo {
    pub fn new(decision: usize) -> Self {
        DecisionInfo {
            decision,
            invocations: 0,
            time_in_prediction: Duration::ZERO,
            sll: LookaheadStats::default(),
            ll: LookaheadStats::default(),
            sll_atn_transitions: 0,
            sll_dfa_transitions: 0,
            ll_atn_transitions: 0,
            ll_fallback: 0,
            context_sensitivities: Vec::new(),
            errors: EventSet::new(),
            ambiguities: Vec::new(),
            predicate_evals: EventSet::new(),
        }
    }

    /// ATN steps across both stages.
    pub fn atn_transitions(&self) -> u64 {
        self.sll_atn_transitions + self.ll_atn_transitions
    }

    pub fn flags(&self) -> DecisionFlags {
        let mut flags = DecisionFlags::empty();
        flags.set(DecisionFlags::FULL_CONTEXT, self.ll_fallback > 0);
        flags.set(DecisionFlags::CONTEXT_SENSITIVE, !self.context_sensitivities.is_empty());
        flags.set(DecisionFlags::AMBIGUOUS, !self.ambiguities.is_empty());
        flags.set(DecisionFlags::ERRORS, !self.errors.is_empty());
        flags.set(DecisionFlags::PREDICATES, !self.predicate_evals.is_empty());
        flags
    }
}
