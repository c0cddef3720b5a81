//! Reference prediction engine.
//!
//! The engine answers one question per call: which alternative of a decision
//! should the parser take at the current input position. It is split into
//! focused submodules under `src/engine/`:
//!
//! ```text
//! Simulator::adaptive_predict          (simulator.rs)
//!        │
//!        v
//! predict::adaptive_predict            (predict.rs)
//!   - s0 = SLL closure, computed once per decision
//!   - walk DFA edges, computing missing ones      ──▶ Dfa (dfa.rs)
//!   - stop on unique alt, or on a conflict        ──▶ mode.rs
//!   - conflict in LL mode: rerun with full context
//!        │
//!        v
//!     Ok(alt) | Err(NoViableAlt)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `dfa.rs`: the per-decision cache of configuration sets and edges,
//!   including the shared error sentinel.
//! - `mode.rs`: prediction modes and the conflict analysis that decides when
//!   lookahead can stop.
//! - `predict.rs`: the base routines behind each extension point.
//! - `simulator.rs`: the [`Simulator`] trait (extension points) and the plain
//!   [`ParserAtnSimulator`].
//!
//! ## Debugging
//!
//! The report hooks log at `debug` level under this module's target; run with
//! `RUST_LOG=atn_profiler::engine=debug` to see every full-context retry.

#[path = "engine/dfa.rs"]
mod dfa;
#[path = "engine/mode.rs"]
mod mode;
#[path = "engine/predict.rs"]
pub(crate) mod predict;
#[path = "engine/simulator.rs"]
mod simulator;

pub use dfa::{Dfa, DfaState, DfaTarget, PredPrediction, StateId};
pub use mode::PredictionMode;
pub use simulator::{DecisionFrame, ParserAtnSimulator, PredicateEvaluator, Simulator, TruePredicates};
