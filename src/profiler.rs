//! Prediction profiler.
//!
//! [`ProfilingAtnSimulator`] wraps any [`Simulator`](crate::Simulator) and
//! records, per decision, what prediction cost and what it ran into:
//!
//! ```text
//! adaptive_predict(d) ─┬─ timer, invocations
//!                      ├─ SLL/LL lookahead depth (stop - start + 1)
//!                      ├─ DFA hits vs ATN steps, LL fallbacks
//!                      └─ events: errors, ambiguities, context
//!                         sensitivities, predicate evaluations
//!                                   │
//!                                   v
//!                          DecisionInfo[d]   (decision_info.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `events.rs`: immutable event records sharing a [`DecisionEventInfo`] base.
//! - `dedup.rs`: [`EventKey`] and the insertion-ordered [`EventSet`] used for
//!   errors and predicate evaluations.
//! - `decision_info.rs`: the per-decision accumulator.
//! - `simulator.rs`: the decorator itself.
//!
//! The profiler only observes. Predictions, errors, and DFA contents are
//! exactly what the wrapped simulator would produce on its own.

#[path = "profiler/decision_info.rs"]
mod decision_info;
#[path = "profiler/dedup.rs"]
mod dedup;
#[path = "profiler/events.rs"]
mod events;
#[path = "profiler/simulator.rs"]
mod simulator;

#[cfg(test)]
#[path = "profiler/tests.rs"]
mod tests;

pub use decision_info::{DecisionInfo, LookaheadStats};
pub use dedup::{EventKey, EventSet};
pub use events::{
    AmbiguityInfo, ContextSensitivityInfo, DecisionEvent, DecisionEventInfo, ErrorInfo, LookaheadEventInfo,
    PredicateEvalInfo,
};
pub use simulator::{ProfilerOptions, ProfilingAtnSimulator};
