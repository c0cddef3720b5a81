use super::*;
use crate::sample::{self, SampleParser, SamplePredicates, StatementOutcome};
use crate::{
    Alt, Atn, AtnBuilder, CommonTokenStream, DecisionBuilder, DecisionFrame, DfaTarget, ParserAtnSimulator, ParserContext,
    PredicateEvaluator, PredictionError, PredictionMode, SemanticContext, Simulator, TokenStream, TokenType,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const A: TokenType = 1;
const B: TokenType = 2;
const C: TokenType = 3;
const D: TokenType = 4;

struct Fixed(bool);

impl PredicateEvaluator for Fixed {
    fn sempred(&self, _ctx: &ParserContext, _rule_index: usize, _pred_index: usize) -> bool {
        self.0
    }
}

fn ctx_pred() -> SemanticContext {
    SemanticContext::Predicate { rule_index: 0, pred_index: 0, ctx_dependent: true }
}

fn profile(atn: Atn) -> ProfilingAtnSimulator {
    ProfilingAtnSimulator::new(ParserAtnSimulator::new(Arc::new(atn)))
}

fn predict<S: Simulator>(sim: &mut S, types: &[TokenType], outer: &ParserContext) -> Result<Alt, PredictionError> {
    let mut input = CommonTokenStream::from_types(types);
    let result = sim.adaptive_predict(&mut input, 0, outer);
    assert_eq!(input.index(), 0, "input must be rewound");
    result
}

/// alt 1 `A B C`, alt 2 `A B D`.
fn late_difference() -> Atn {
    let mut b = AtnBuilder::new();
    b.decision(DecisionBuilder::new("d").alt(1, [A, B, C]).alt(2, [A, B, D]));
    b.build().unwrap()
}

/// alt 1 `A` invoked from r1 (followed by `B C`) or r2 (followed by `C`),
/// alt 2 `A B`, and with `ambiguous` an identical alt 3 `A B`.
fn context_sensitive(ambiguous: bool) -> (Atn, ParserContext) {
    let mut b = AtnBuilder::new();
    let r1 = b.return_state("r1", [B, C]);
    let r2 = b.return_state("r2", [C]);
    let mut d = DecisionBuilder::new("d").alt(1, [A]).alt(2, [A, B]);
    if ambiguous {
        d = d.alt(3, [A, B]);
    }
    b.decision(d.called_from(r1).called_from(r2));
    (b.build().unwrap(), ParserContext::empty().invoked_from(r2))
}

#[test]
fn sll_only_prediction_records_lookahead_depth() {
    let mut profiler = profile(late_difference());
    assert_eq!(predict(&mut profiler, &[A, B, C], &ParserContext::empty()), Ok(1));

    let info = &profiler.decision_info()[0];
    assert_eq!(info.invocations, 1);
    assert_eq!((info.sll.min_look, info.sll.max_look, info.sll.total_look), (Some(3), Some(3), 3));
    assert!(!info.ll.is_set());
    assert_eq!(info.ll_fallback, 0);
    assert_eq!((info.sll_atn_transitions, info.sll_dfa_transitions), (3, 0));

    let event = info.sll.max_look_event.as_ref().unwrap();
    assert_eq!((event.base.start_index, event.base.stop_index, event.base.full_ctx), (0, 2, false));
    assert_eq!(event.predicted_alt, Some(1));
}

#[test]
fn replay_follows_cached_dfa_edges() {
    let mut profiler = profile(late_difference());
    predict(&mut profiler, &[A, B, C], &ParserContext::empty()).unwrap();
    predict(&mut profiler, &[A, B, C], &ParserContext::empty()).unwrap();

    let info = &profiler.decision_info()[0];
    assert_eq!(info.invocations, 2);
    assert_eq!((info.sll_atn_transitions, info.sll_dfa_transitions), (3, 3));
    assert_eq!(info.sll.total_look, 6);
    assert!(matches!(profiler.current_state(), Some(DfaTarget::State(_))));
}

#[test]
fn context_sensitivity_is_recorded_when_ll_disagrees_with_sll() {
    let (atn, outer) = context_sensitive(false);
    let mut profiler = profile(atn);
    assert_eq!(predict(&mut profiler, &[A, B, C], &outer), Ok(2));

    let info = &profiler.decision_info()[0];
    assert_eq!(info.ll_fallback, 1);
    assert_eq!(info.sll.max_look, Some(3));
    assert_eq!((info.ll.min_look, info.ll.max_look, info.ll.total_look), (Some(2), Some(2), 2));
    assert_eq!(info.ll_atn_transitions, 2);
    assert!(info.ambiguities.is_empty());

    assert_eq!(info.context_sensitivities.len(), 1);
    let cs = &info.context_sensitivities[0].base;
    assert_eq!((cs.decision, cs.start_index, cs.stop_index, cs.full_ctx), (0, 0, 1, true));
    assert!(cs.configs.as_ref().is_some_and(|c| c.full_ctx()));

    let ll_event = info.ll.max_look_event.as_ref().unwrap();
    assert_eq!((ll_event.base.stop_index, ll_event.base.full_ctx, ll_event.predicted_alt), (1, true, Some(2)));
}

#[test]
fn sll_mode_never_escalates() {
    let (atn, outer) = context_sensitive(false);
    let sim = ParserAtnSimulator::new(Arc::new(atn)).with_mode(PredictionMode::Sll);
    let mut profiler = ProfilingAtnSimulator::new(sim);
    assert_eq!(predict(&mut profiler, &[A, B, C], &outer), Ok(1));

    let info = &profiler.decision_info()[0];
    assert_eq!(info.ll_fallback, 0);
    assert!(!info.ll.is_set());
    assert!(info.context_sensitivities.is_empty());
}

#[test]
fn errors_are_recorded_once_per_position() {
    let mut b = AtnBuilder::new();
    b.decision(DecisionBuilder::new("d").alt(1, [A, B]).alt(2, [A, C]));
    let mut profiler = profile(b.build().unwrap());

    let first = predict(&mut profiler, &[A, D], &ParserContext::empty()).unwrap_err();
    assert_eq!(first.offending_index(), 1);
    let replay = predict(&mut profiler, &[A, D], &ParserContext::empty()).unwrap_err();
    assert_eq!(first, replay);

    let info = &profiler.decision_info()[0];
    assert_eq!(info.invocations, 2);
    assert_eq!(info.errors.len(), 1);
    let error = &info.errors.as_slice()[0].base;
    assert_eq!((error.start_index, error.stop_index, error.full_ctx), (0, 1, false));
    assert_eq!(error.configs.as_ref().map(|c| c.alts()), Some(alts![1, 2]));
    assert_eq!(info.sll_dfa_transitions, 2);
    assert_eq!(profiler.current_state(), Some(DfaTarget::Error));

    // Failed predictions still count toward lookahead, with no predicted alt.
    assert_eq!(info.sll.total_look, 4);
    assert_eq!(info.sll.max_look_event.as_ref().unwrap().predicted_alt, None);
}

#[test]
fn full_context_errors_use_the_ll_stop_index() {
    // SLL merges every caller's follow and conflicts on `A B C`; the real
    // caller r3 rejects `C` after both alternatives matched `A B`.
    let mut b = AtnBuilder::new();
    let r1 = b.return_state("r1", [B, C]);
    let r2 = b.return_state("r2", [C]);
    let r3 = b.return_state("r3", [B, D]);
    b.decision(DecisionBuilder::new("d").alt(1, [A]).alt(2, [A, B]).called_from(r1).called_from(r2).called_from(r3));
    let mut profiler = profile(b.build().unwrap());
    let outer = ParserContext::empty().invoked_from(r3);

    let err = predict(&mut profiler, &[A, B, C], &outer).unwrap_err();
    assert_eq!(err.offending_index(), 2);

    let info = &profiler.decision_info()[0];
    assert_eq!(info.ll_fallback, 1);
    assert_eq!(info.sll.max_look, Some(3));
    assert_eq!(info.ll.max_look, Some(3));
    assert!(info.context_sensitivities.is_empty());
    assert!(info.ambiguities.is_empty());

    assert_eq!(info.errors.len(), 1);
    let error = &info.errors.as_slice()[0].base;
    assert_eq!((error.start_index, error.stop_index, error.full_ctx), (0, 2, true));
    assert_eq!(error.configs.as_ref().map(|c| c.alts()), Some(alts![1, 2]));

    let ll_event = info.ll.max_look_event.as_ref().unwrap();
    assert_eq!((ll_event.base.stop_index, ll_event.base.full_ctx, ll_event.predicted_alt), (2, true, None));
}

#[test]
fn config_capture_can_be_disabled() {
    let mut b = AtnBuilder::new();
    b.decision(DecisionBuilder::new("d").alt(1, [A]).alt(2, [B]));
    let sim = ParserAtnSimulator::new(Arc::new(b.build().unwrap()));
    let mut profiler = ProfilingAtnSimulator::with_options(sim, ProfilerOptions { capture_configs: false });

    predict(&mut profiler, &[C], &ParserContext::empty()).unwrap_err();
    let info = &profiler.decision_info()[0];
    assert_eq!(info.errors.len(), 1);
    assert!(info.errors.as_slice()[0].base.configs.is_none());
}

#[test]
fn failing_context_dependent_guard_is_recorded_under_full_context() {
    let mut b = AtnBuilder::new();
    b.decision(DecisionBuilder::new("d").alt(1, [A, B]).guarded(2, ctx_pred(), [A, B]));
    let sim = ParserAtnSimulator::new(Arc::new(b.build().unwrap())).with_predicates(Fixed(false));
    let mut profiler = ProfilingAtnSimulator::new(sim);

    assert_eq!(predict(&mut profiler, &[A, B], &ParserContext::empty()), Ok(1));

    let info = &profiler.decision_info()[0];
    assert_eq!(info.ll_fallback, 1);
    assert!(info.context_sensitivities.is_empty());
    assert_eq!(info.predicate_evals.len(), 1);
    let eval = &info.predicate_evals.as_slice()[0];
    assert_eq!((eval.semctx.clone(), eval.predicted_alt, eval.eval_result), (ctx_pred(), 2, false));
    assert_eq!((eval.base.start_index, eval.base.stop_index, eval.base.full_ctx), (0, 1, true));
}

#[test]
fn precedence_predicates_are_not_recorded() {
    let mut b = AtnBuilder::new();
    let prec = SemanticContext::Precedence { precedence: 2 };
    b.decision(DecisionBuilder::new("d").guarded(1, prec, [A]).alt(2, [A]));
    let mut profiler = profile(b.build().unwrap());

    assert_eq!(predict(&mut profiler, &[A], &ParserContext::empty()), Ok(1));
    assert!(profiler.decision_info()[0].predicate_evals.is_empty());
}

#[test]
fn ambiguity_with_a_different_winner_also_records_context_sensitivity() {
    let (atn, outer) = context_sensitive(true);
    let mut profiler = profile(atn);
    assert_eq!(predict(&mut profiler, &[A, B, C], &outer), Ok(2));

    let info = &profiler.decision_info()[0];
    assert_eq!(info.ambiguities.len(), 1);
    assert_eq!(info.context_sensitivities.len(), 1);

    let ambiguity = &info.ambiguities[0];
    assert_eq!(ambiguity.ambig_alts, alts![2, 3]);
    assert!(ambiguity.base.full_ctx);
    let cs = &info.context_sensitivities[0].base;
    assert_eq!(
        (cs.decision, cs.start_index, cs.stop_index),
        (ambiguity.base.decision, ambiguity.base.start_index, ambiguity.base.stop_index)
    );
}

#[test]
fn sample_member_access_is_context_sensitive() {
    let sim = ParserAtnSimulator::new(sample::atn());
    let mut parser = SampleParser::new(ProfilingAtnSimulator::new(sim));
    let mut input = CommonTokenStream::new("<test>", sample::tokenize("x . ; x . ;").unwrap());

    let statements = parser.parse(&mut input);
    assert_eq!(statements.iter().map(|s| s.outcome.clone()).collect::<Vec<_>>(), vec![
        StatementOutcome::Parsed(2),
        StatementOutcome::Parsed(2)
    ]);

    let profiler = parser.simulator();
    let info = &profiler.decision_info()[sample::STAT];
    assert_eq!(info.ll_fallback, 2);
    assert_eq!(info.context_sensitivities.len(), 2);
    assert_eq!(info.context_sensitivities[1].to_string(), "decision 0 context sensitive on 'x .'");
    assert_eq!(profiler.parse_info().context_sensitive_decisions(), vec![sample::STAT]);
}

#[test]
fn sample_qualified_member_access_is_ambiguous() {
    let predicates = SamplePredicates { qualified: true, ..SamplePredicates::default() };
    let sim = ParserAtnSimulator::new(sample::atn()).with_predicates(predicates);
    let mut profiler = ProfilingAtnSimulator::new(sim);
    let mut input = CommonTokenStream::new("<test>", sample::tokenize("x . ;").unwrap());

    assert_eq!(profiler.adaptive_predict(&mut input, sample::STAT, &sample::statement_context()), Ok(2));

    let info = &profiler.decision_info()[sample::STAT];
    assert_eq!(info.ambiguities.len(), 1);
    assert_eq!(info.ambiguities[0].to_string(), "decision 0 ambiguous on 'x .' (alts {2, 3}) under LL");
    assert_eq!(info.context_sensitivities.len(), 1);
    // Both guards are evaluated while building the full-context start state.
    assert_eq!(info.predicate_evals.len(), 2);
    assert!(info.predicate_evals.iter().all(|e| e.base.full_ctx && e.eval_result));
}

#[test]
fn failed_accept_predicate_is_reported_to_the_caller() {
    let predicates = SamplePredicates { bare_ints: false, ..SamplePredicates::default() };
    let sim = ParserAtnSimulator::new(sample::atn()).with_predicates(predicates);
    let mut profiler = ProfilingAtnSimulator::new(sim);
    let mut input = CommonTokenStream::new("<test>", sample::tokenize("5 ;").unwrap());

    let err = profiler.adaptive_predict(&mut input, sample::STAT, &sample::statement_context()).unwrap_err();
    assert_eq!(err.decision(), sample::STAT);

    let info = &profiler.decision_info()[sample::STAT];
    assert_eq!(info.invocations, 1);
    let eval = &info.predicate_evals.as_slice()[0];
    assert_eq!((eval.predicted_alt, eval.eval_result, eval.base.full_ctx), (8, false, false));
}

#[test]
#[should_panic(expected = "out of range")]
fn unknown_decision_panics() {
    let mut profiler = profile(late_difference());
    let mut input = CommonTokenStream::from_types(&[A]);
    let _ = profiler.adaptive_predict(&mut input, 3, &ParserContext::empty());
}

#[test]
#[should_panic(expected = "outside adaptive_predict")]
fn hooks_require_an_active_decision_even_after_a_failure() {
    let mut profiler = profile(late_difference());
    predict(&mut profiler, &[D], &ParserContext::empty()).unwrap_err();

    let input = CommonTokenStream::from_types(&[A]);
    let outer = ParserContext::empty();
    let frame = DecisionFrame::new(0, 0, &input, &outer);
    profiler.eval_semantic_context(&frame, &SemanticContext::None, 1, false);
}

struct Exploding;

impl PredicateEvaluator for Exploding {
    fn sempred(&self, _ctx: &ParserContext, _rule_index: usize, _pred_index: usize) -> bool {
        panic!("predicate evaluator failed")
    }
}

#[test]
#[should_panic(expected = "outside adaptive_predict")]
fn active_decision_is_released_when_prediction_unwinds() {
    let sim = ParserAtnSimulator::new(sample::atn()).with_predicates(Exploding);
    let mut profiler = ProfilingAtnSimulator::new(sim);
    let mut input = CommonTokenStream::new("<test>", sample::tokenize("5 ;").unwrap());
    let outer = sample::statement_context();

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        profiler.adaptive_predict(&mut input, sample::STAT, &outer)
    }));
    assert!(unwound.is_err());
    assert!(profiler.decision_info()[sample::STAT].predicate_evals.is_empty());

    let frame = DecisionFrame::new(sample::STAT, 0, &input, &outer);
    profiler.eval_semantic_context(&frame, &SemanticContext::None, 1, false);
}

/// Everything but timing.
#[derive(Debug, PartialEq)]
struct Aggregates {
    invocations: u64,
    sll: (u64, Option<u64>, Option<u64>),
    ll: (u64, Option<u64>, Option<u64>),
    transitions: (u64, u64, u64),
    ll_fallback: u64,
    events: (usize, usize, usize, usize),
}

fn aggregates(info: &DecisionInfo) -> Aggregates {
    Aggregates {
        invocations: info.invocations,
        sll: (info.sll.total_look, info.sll.min_look, info.sll.max_look),
        ll: (info.ll.total_look, info.ll.min_look, info.ll.max_look),
        transitions: (info.sll_atn_transitions, info.sll_dfa_transitions, info.ll_atn_transitions),
        ll_fallback: info.ll_fallback,
        events: (
            info.context_sensitivities.len(),
            info.errors.len(),
            info.ambiguities.len(),
            info.predicate_evals.len(),
        ),
    }
}

fn run(inputs: &[Vec<TokenType>], mode: PredictionMode) -> (ProfilingAtnSimulator, Vec<Result<Alt, PredictionError>>) {
    let (atn, outer) = context_sensitive(true);
    let sim = ParserAtnSimulator::new(Arc::new(atn)).with_mode(mode);
    let mut profiler = ProfilingAtnSimulator::new(sim);
    let results = inputs.iter().map(|types| predict(&mut profiler, types, &outer)).collect();
    (profiler, results)
}

fn inputs() -> impl Strategy<Value = Vec<Vec<TokenType>>> {
    prop::collection::vec(prop::collection::vec(1..=4 as TokenType, 0..6), 1..8)
}

fn modes() -> impl Strategy<Value = PredictionMode> {
    prop_oneof![Just(PredictionMode::Sll), Just(PredictionMode::Ll), Just(PredictionMode::LlExactAmbigDetection)]
}

proptest! {
    #[test]
    fn lookahead_stats_are_ordered(inputs in inputs(), mode in modes()) {
        let (profiler, _) = run(&inputs, mode);
        let info = &profiler.decision_info()[0];
        prop_assert_eq!(info.invocations, inputs.len() as u64);

        let (min, max) = (info.sll.min_look.unwrap(), info.sll.max_look.unwrap());
        prop_assert!(min <= max && max <= info.sll.total_look);
        prop_assert_eq!(info.ll.is_set(), info.ll_fallback > 0);
        if let (Some(min), Some(max)) = (info.ll.min_look, info.ll.max_look) {
            prop_assert!(min <= max && max <= info.ll.total_look);
        }
    }

    #[test]
    fn errors_never_repeat_a_key(inputs in inputs(), mode in modes()) {
        let (profiler, _) = run(&inputs, mode);
        let keys: HashSet<_> = profiler.decision_info()[0].errors.iter().map(|e| e.key()).collect();
        prop_assert_eq!(keys.len(), profiler.decision_info()[0].errors.len());
    }

    #[test]
    fn profiling_is_deterministic_and_transparent(inputs in inputs(), mode in modes()) {
        let (first, first_results) = run(&inputs, mode);
        let (second, second_results) = run(&inputs, mode);
        prop_assert_eq!(aggregates(&first.decision_info()[0]), aggregates(&second.decision_info()[0]));
        prop_assert_eq!(&first_results, &second_results);

        let (atn, outer) = context_sensitive(true);
        let mut plain = ParserAtnSimulator::new(Arc::new(atn)).with_mode(mode);
        let plain_results: Vec<_> = inputs.iter().map(|types| predict(&mut plain, types, &outer)).collect();
        prop_assert_eq!(first_results, plain_results);
    }

    #[test]
    fn context_sensitivity_needs_a_fallback(inputs in inputs()) {
        let (profiler, _) = run(&inputs, PredictionMode::Ll);
        let info = &profiler.decision_info()[0];
        prop_assert!(info.context_sensitivities.len() as u64 <= info.ll_fallback);
        prop_assert!(info.context_sensitivities.iter().all(|cs| cs.base.full_ctx));
    }
}
