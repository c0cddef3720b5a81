//! Two-stage adaptive prediction.
//!
//! These are the base routines behind the [`Simulator`] extension points.
//! Every routine takes the simulator generically and calls other extension
//! points *through* it, never directly, so a decorator sees the nested calls.
//!
//! ## Stages
//!
//! ```text
//! (1) SLL: walk the DFA from s0, one token at a time
//!        cached edge? ── yes ─▶ follow it
//!              └─ no ─▶ compute_target_state (reach + closure, cache edge)
//!        accept state?        ─▶ predicates? evaluate : return prediction
//!        conflict (LL mode)   ─▶ predicates may settle it, else
//! (2) LL: rewind, closure with the real outer context, step until the
//!     configurations agree (context sensitivity) or provably conflict
//!     (ambiguity)
//! ```
//!
//! The input is always rewound to the decision's start before returning.

use super::dfa::{DfaState, DfaTarget, PredPrediction, StateId};
use super::mode::{self, PredictionMode};
use super::simulator::{DecisionFrame, Simulator};
use crate::error::PredictionError;
use crate::{
    Alt, AltSet, Atn, AtnConfig, ConfigSet, ConfigState, DecisionState, EOF, Follow, ParserContext, SemanticContext,
    TokenStream, TokenType,
};
use std::collections::BTreeSet;
use std::sync::Arc;

pub fn adaptive_predict<S: Simulator + ?Sized>(
    sim: &mut S,
    input: &mut dyn TokenStream,
    decision: usize,
    outer: &ParserContext,
) -> Result<Alt, PredictionError> {
    let start_index = input.index();

    let s0 = match sim.dfa(decision).s0() {
        Some(s0) => s0,
        None => {
            let configs = {
                let frame = DecisionFrame::new(decision, start_index, &*input, outer);
                compute_start_state(sim, &frame, false)
            };
            let dfa = sim.dfa_mut(decision);
            let s0 = dfa.add_state(DfaState::new(configs));
            dfa.set_s0(s0);
            s0
        }
    };

    let result = exec_atn(sim, input, decision, outer, s0, start_index);
    input.seek(start_index);
    result
}

pub fn existing_target_state<S: Simulator + ?Sized>(
    sim: &mut S,
    frame: &DecisionFrame<'_>,
    previous: StateId,
    t: TokenType,
) -> Option<DfaTarget> {
    sim.dfa(frame.decision).edge(previous, t)
}

pub fn compute_target_state<S: Simulator + ?Sized>(
    sim: &mut S,
    frame: &DecisionFrame<'_>,
    previous: StateId,
    t: TokenType,
) -> DfaTarget {
    let decision = frame.decision;
    let previous_configs = Arc::clone(&sim.dfa(decision).state(previous).configs);
    let reach = sim.compute_reach_set(frame, &previous_configs, t, false);

    if reach.is_empty() {
        sim.dfa_mut(decision).add_edge(previous, t, DfaTarget::Error);
        return DfaTarget::Error;
    }

    let mut state = DfaState::new(reach);
    if let Some(alt) = state.configs.unique_alt() {
        state.is_accept = true;
        state.prediction = Some(alt);
    } else if mode::has_sll_conflict_terminating_prediction(&state.configs) {
        let conflicting = state.configs.alts();
        state.is_accept = true;
        state.requires_full_context = true;
        state.prediction = conflicting.lowest();
        state.conflicting_alts = Some(conflicting);
    }

    if state.is_accept && state.configs.has_semantic_context() {
        let alts = match &state.conflicting_alts {
            Some(conflicting) => conflicting.clone(),
            None => state.prediction.into_iter().collect(),
        };
        state.predicates = predicates_for_alts(&alts, &state.configs);
        if state.predicates.is_some() {
            state.prediction = None;
        }
    }

    let dfa = sim.dfa_mut(decision);
    let id = dfa.add_state(state);
    dfa.add_edge(previous, t, DfaTarget::State(id));
    DfaTarget::State(id)
}

pub fn compute_reach_set<S: Simulator + ?Sized>(
    sim: &mut S,
    frame: &DecisionFrame<'_>,
    configs: &ConfigSet,
    t: TokenType,
    full_ctx: bool,
) -> ConfigSet {
    let atn = Arc::clone(sim.atn());
    let decision = atn.decision(frame.decision);
    let mut reach = ConfigSet::new(full_ctx);

    for config in configs.iter() {
        if config.is_stop() {
            // A finished alternative stays viable while longer ones keep matching.
            reach.add(config.clone());
        } else if atn.expected(decision, &config.state) == Some(t) {
            closure(&atn, decision, frame.outer, config.advanced(), &mut reach);
        }
    }

    reach
}

pub fn eval_semantic_context<S: Simulator + ?Sized>(
    sim: &mut S,
    frame: &DecisionFrame<'_>,
    pred: &SemanticContext,
    _alt: Alt,
    _full_ctx: bool,
) -> bool {
    let evaluator = sim.predicate_evaluator();
    match *pred {
        SemanticContext::None => true,
        SemanticContext::Predicate { rule_index, pred_index, .. } => evaluator.sempred(frame.outer, rule_index, pred_index),
        SemanticContext::Precedence { precedence } => evaluator.precpred(frame.outer, precedence),
    }
}

/// Start configurations for `frame.decision`.
///
/// SLL keeps guards on the configurations (deferring context-dependent ones
/// entirely); full-context prediction evaluates each guard now and drops the
/// productions whose guard fails.
pub fn compute_start_state<S: Simulator + ?Sized>(sim: &mut S, frame: &DecisionFrame<'_>, full_ctx: bool) -> ConfigSet {
    let atn = Arc::clone(sim.atn());
    let decision = atn.decision(frame.decision);
    let mut configs = ConfigSet::new(full_ctx);

    for (index, production) in decision.productions.iter().enumerate() {
        let semantic = if full_ctx {
            if !production.guard.is_none() && !sim.eval_semantic_context(frame, &production.guard, production.alt, true) {
                continue;
            }
            SemanticContext::None
        } else if production.guard.is_ctx_dependent() {
            SemanticContext::None
        } else {
            production.guard.clone()
        };
        let start = AtnConfig::new(production.alt, ConfigState::Body { production: index, offset: 0 }, semantic);
        closure(&atn, decision, frame.outer, start, &mut configs);
    }
    configs
}

/// Add `config` to `configs`, stepping over a completed production or follow
/// sequence first.
///
/// A completed production continues with the outer context's follow under
/// full context, and with every caller's follow otherwise.
fn closure(atn: &Atn, decision: &DecisionState, outer: &ParserContext, config: AtnConfig, configs: &mut ConfigSet) {
    match config.state {
        ConfigState::Body { production, offset } if offset >= decision.productions[production].symbols.len() => {
            let follows: Vec<Follow> = if configs.full_ctx() {
                vec![outer.innermost().map_or(Follow::Eof, Follow::Caller)]
            } else if decision.callers.is_empty() {
                vec![Follow::Eof]
            } else {
                decision.callers.iter().copied().map(Follow::Caller).collect()
            };
            for follow in follows {
                closure(atn, decision, outer, config.with_state(ConfigState::Follow { follow, offset: 0 }), configs);
            }
        }
        ConfigState::Follow { follow, offset } if offset >= atn.follow_symbols(follow).len() => {
            configs.add(config.with_state(ConfigState::Stop));
        }
        _ => {
            configs.add(config);
        }
    }
}

/// One entry per alternative: its guards, or an unguarded entry when any of
/// its configurations is unguarded. `None` when no alternative is guarded.
fn predicates_for_alts(alts: &AltSet, configs: &ConfigSet) -> Option<Vec<PredPrediction>> {
    let mut predictions = Vec::new();
    let mut any_guarded = false;

    for alt in alts.iter() {
        let guards: BTreeSet<&SemanticContext> = configs.iter().filter(|c| c.alt == alt).map(|c| &c.semantic).collect();
        if guards.is_empty() || guards.iter().any(|g| g.is_none()) {
            predictions.push(PredPrediction { pred: SemanticContext::None, alt });
        } else {
            any_guarded = true;
            predictions.extend(guards.into_iter().map(|pred| PredPrediction { pred: pred.clone(), alt }));
        }
    }

    any_guarded.then_some(predictions)
}

/// Alternatives whose predicates hold. Unguarded entries always hold.
fn eval_predicates<S: Simulator + ?Sized>(sim: &mut S, frame: &DecisionFrame<'_>, predictions: &[PredPrediction]) -> AltSet {
    let mut alts = AltSet::new();
    for p in predictions {
        if p.pred.is_none() || sim.eval_semantic_context(frame, &p.pred, p.alt, false) {
            alts.insert(p.alt);
        }
    }
    alts
}

fn exec_atn<S: Simulator + ?Sized>(
    sim: &mut S,
    input: &mut dyn TokenStream,
    decision: usize,
    outer: &ParserContext,
    s0: StateId,
    start_index: usize,
) -> Result<Alt, PredictionError> {
    let mut previous = s0;
    let mut t = input.la(1);

    loop {
        let target = {
            let frame = DecisionFrame::new(decision, start_index, &*input, outer);
            match sim.existing_target_state(&frame, previous, t) {
                Some(target) => target,
                None => sim.compute_target_state(&frame, previous, t),
            }
        };

        let id = match target {
            DfaTarget::State(id) => id,
            DfaTarget::Error => {
                let configs = Arc::clone(&sim.dfa(decision).state(previous).configs);
                return Err(no_viable_alt(decision, start_index, input.index(), configs));
            }
        };
        let (requires_full_context, is_accept, prediction) = {
            let state = sim.dfa(decision).state(id);
            (state.requires_full_context, state.is_accept, state.prediction)
        };

        if requires_full_context && sim.prediction_mode() != PredictionMode::Sll {
            let (mut conflicting, predicates, configs) = {
                let state = sim.dfa(decision).state(id);
                (state.conflicting_alts.clone(), state.predicates.clone(), Arc::clone(&state.configs))
            };
            if let Some(predicates) = &predicates {
                let conflict_index = input.index();
                input.seek(start_index);
                let alts = {
                    let frame = DecisionFrame::new(decision, start_index, &*input, outer);
                    eval_predicates(sim, &frame, predicates)
                };
                if let (1, Some(alt)) = (alts.len(), alts.lowest()) {
                    return Ok(alt);
                }
                conflicting = Some(alts);
                input.seek(conflict_index);
            }

            let stop_index = input.index();
            let s0_closure = {
                let frame = DecisionFrame::new(decision, start_index, &*input, outer);
                let s0_closure = compute_start_state(sim, &frame, true);
                sim.report_attempting_full_context(&frame, conflicting.as_ref(), &configs, start_index, stop_index);
                s0_closure
            };
            return exec_atn_with_full_context(sim, input, decision, outer, s0_closure, start_index);
        }

        if is_accept {
            let predicates = sim.dfa(decision).state(id).predicates.clone();
            let Some(predicates) = predicates else {
                if let Some(alt) = prediction {
                    return Ok(alt);
                }
                let configs = Arc::clone(&sim.dfa(decision).state(id).configs);
                return Err(no_viable_alt(decision, start_index, input.index(), configs));
            };
            let configs = Arc::clone(&sim.dfa(decision).state(id).configs);

            let stop_index = input.index();
            input.seek(start_index);
            let frame = DecisionFrame::new(decision, start_index, &*input, outer);
            let alts = eval_predicates(sim, &frame, &predicates);
            let Some(alt) = alts.lowest() else {
                return Err(no_viable_alt(decision, start_index, stop_index, configs));
            };
            if alts.len() > 1 {
                sim.report_ambiguity(&frame, Some(id), start_index, stop_index, false, Some(&alts), &configs);
            }
            return Ok(alt);
        }

        previous = id;
        if t != EOF {
            input.consume();
            t = input.la(1);
        }
    }
}

fn exec_atn_with_full_context<S: Simulator + ?Sized>(
    sim: &mut S,
    input: &mut dyn TokenStream,
    decision: usize,
    outer: &ParserContext,
    s0: ConfigSet,
    start_index: usize,
) -> Result<Alt, PredictionError> {
    let mode = sim.prediction_mode();
    let mut found_exact_ambig = false;
    let mut previous = s0;
    input.seek(start_index);
    let mut t = input.la(1);

    let (reach, predicted) = loop {
        let reach = {
            let frame = DecisionFrame::new(decision, start_index, &*input, outer);
            sim.compute_reach_set(&frame, &previous, t, true)
        };
        if reach.is_empty() {
            return Err(no_viable_alt(decision, start_index, input.index(), Arc::new(previous)));
        }
        if let Some(alt) = reach.unique_alt() {
            break (reach, alt);
        }

        let subsets = reach.conflicting_alt_subsets();
        if mode != PredictionMode::LlExactAmbigDetection {
            if let Some(alt) = mode::single_viable_alt(&subsets) {
                break (reach, alt);
            }
        } else if mode::all_subsets_conflict(&subsets) && mode::all_subsets_equal(&subsets) {
            if let Some(alt) = mode::single_viable_alt(&subsets) {
                found_exact_ambig = true;
                break (reach, alt);
            }
        }

        previous = reach;
        if t != EOF {
            input.consume();
            t = input.la(1);
        }
    };

    let stop_index = input.index();
    let frame = DecisionFrame::new(decision, start_index, &*input, outer);
    if reach.unique_alt().is_some() {
        sim.report_context_sensitivity(&frame, predicted, &reach, start_index, stop_index);
    } else {
        sim.report_ambiguity(&frame, None, start_index, stop_index, found_exact_ambig, Some(&reach.alts()), &reach);
    }
    Ok(predicted)
}

fn no_viable_alt(decision: usize, start_index: usize, offending_index: usize, configs: Arc<ConfigSet>) -> PredictionError {
    PredictionError::NoViableAlt { decision, start_index, offending_index, configs }
}
