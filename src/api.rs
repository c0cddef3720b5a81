use crate::DecisionInfo;
use std::time::Duration;

bitflags::bitflags! {
    /// What happened to a decision during profiling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DecisionFlags: u8 {
        /// SLL escalated to full-context prediction at least once.
        const FULL_CONTEXT = 1 << 0;
        const CONTEXT_SENSITIVE = 1 << 1;
        const AMBIGUOUS = 1 << 2;
        /// At least one "no viable alternative".
        const ERRORS = 1 << 3;
        /// Semantic predicates were evaluated.
        const PREDICATES = 1 << 4;
    }
}

impl DecisionFlags {
    /// Compact marker string, one letter per flag (`F`, `C`, `A`, `E`, `P`).
    pub fn markers(self) -> String {
        [
            (DecisionFlags::FULL_CONTEXT, 'F'),
            (DecisionFlags::CONTEXT_SENSITIVE, 'C'),
            (DecisionFlags::AMBIGUOUS, 'A'),
            (DecisionFlags::ERRORS, 'E'),
            (DecisionFlags::PREDICATES, 'P'),
        ]
        .into_iter()
        .map(|(flag, c)| if self.contains(flag) { c } else { '-' })
        .collect()
    }
}

/// One row of a profile report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionSummary {
    pub decision: usize,
    pub invocations: u64,
    pub time: Duration,
    pub sll_max_look: Option<u64>,
    /// `None` unless the decision fell back to full context.
    pub ll_max_look: Option<u64>,
    pub ll_fallback: u64,
    pub dfa_size: usize,
    pub flags: DecisionFlags,
}

/// Read-only view over a profiler's decision table.
///
/// Obtained from [`ProfilingAtnSimulator::parse_info`](crate::ProfilingAtnSimulator::parse_info).
///
/// # Example
/// ```
/// use atn_profiler::{CommonTokenStream, ParserAtnSimulator, ProfilingAtnSimulator, Simulator};
/// use atn_profiler::sample;
///
/// let mut profiler = ProfilingAtnSimulator::new(ParserAtnSimulator::new(sample::atn()));
/// let mut input = CommonTokenStream::new("<doc>", sample::tokenize("f ( ) ;").unwrap());
/// profiler.adaptive_predict(&mut input, sample::STAT, &sample::statement_context()).unwrap();
///
/// let info = profiler.parse_info();
/// assert_eq!(info.total_sll_lookahead_ops(), 2);
/// assert!(info.ll_decisions().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ParseInfo<'a> {
    decisions: &'a [DecisionInfo],
    dfa_sizes: Vec<usize>,
}

impl<'a> ParseInfo<'a> {
    /// `dfa_sizes[d]` is the number of DFA states cached for decision `d`.
    pub fn new(decisions: &'a [DecisionInfo], dfa_sizes: Vec<usize>) -> Self {
        ParseInfo { decisions, dfa_sizes }
    }

    pub fn decision_info(&self) -> &'a [DecisionInfo] {
        self.decisions
    }

    /// Decisions that fell back to full-context prediction at least once.
    pub fn ll_decisions(&self) -> Vec<usize> {
        self.matching(|d| d.ll_fallback > 0)
    }

    pub fn total_time_in_prediction(&self) -> Duration {
        self.decisions.iter().map(|d| d.time_in_prediction).sum()
    }

    pub fn total_sll_lookahead_ops(&self) -> u64 {
        self.decisions.iter().map(|d| d.sll.total_look).sum()
    }

    pub fn total_ll_lookahead_ops(&self) -> u64 {
        self.decisions.iter().map(|d| d.ll.total_look).sum()
    }

    pub fn total_sll_atn_lookahead_ops(&self) -> u64 {
        self.decisions.iter().map(|d| d.sll_atn_transitions).sum()
    }

    pub fn total_ll_atn_lookahead_ops(&self) -> u64 {
        self.decisions.iter().map(|d| d.ll_atn_transitions).sum()
    }

    pub fn total_atn_lookahead_ops(&self) -> u64 {
        self.decisions.iter().map(DecisionInfo::atn_transitions).sum()
    }

    /// DFA states cached across every decision.
    pub fn dfa_size(&self) -> usize {
        self.dfa_sizes.iter().sum()
    }

    pub fn dfa_size_of(&self, decision: usize) -> usize {
        self.dfa_sizes.get(decision).copied().unwrap_or(0)
    }

    /// Up to `n` invoked decisions, most time in prediction first.
    pub fn slowest(&self, n: usize) -> Vec<&'a DecisionInfo> {
        let mut invoked: Vec<_> = self.decisions.iter().filter(|d| d.invocations > 0).collect();
        invoked.sort_by(|a, b| b.time_in_prediction.cmp(&a.time_in_prediction).then(a.decision.cmp(&b.decision)));
        invoked.truncate(n);
        invoked
    }

    pub fn ambiguous_decisions(&self) -> Vec<usize> {
        self.matching(|d| !d.ambiguities.is_empty())
    }

    pub fn context_sensitive_decisions(&self) -> Vec<usize> {
        self.matching(|d| !d.context_sensitivities.is_empty())
    }

    pub fn decisions_with_errors(&self) -> Vec<usize> {
        self.matching(|d| !d.errors.is_empty())
    }

    /// Up to `n` `(decision, distinct evaluations)` pairs, busiest first.
    pub fn predicate_hot_spots(&self, n: usize) -> Vec<(usize, usize)> {
        let mut spots: Vec<_> = self
            .decisions
            .iter()
            .filter(|d| !d.predicate_evals.is_empty())
            .map(|d| (d.decision, d.predicate_evals.len()))
            .collect();
        spots.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        spots.truncate(n);
        spots
    }

    /// One summary per invoked decision, in decision order.
    pub fn summaries(&self) -> Vec<DecisionSummary> {
        self.decisions
            .iter()
            .filter(|d| d.invocations > 0)
            .map(|d| DecisionSummary {
                decision: d.decision,
                invocations: d.invocations,
                time: d.time_in_prediction,
                sll_max_look: d.sll.max_look,
                ll_max_look: d.ll.max_look,
                ll_fallback: d.ll_fallback,
                dfa_size: self.dfa_size_of(d.decision),
                flags: d.flags(),
            })
            .collect()
    }

    fn matching(&self, pred: impl Fn(&DecisionInfo) -> bool) -> Vec<usize> {
        self.decisions.iter().filter(|d| pred(d)).map(|d| d.decision).collect()
    }
}
