//! Decision event records.
//!
//! Every record embeds a [`DecisionEventInfo`] describing where it happened;
//! the specialisations add what is particular to the event. Records are
//! plain values: once built they never change.

use super::dedup::EventKey;
use crate::{Alt, AltSet, ConfigSet, InputHandle, SemanticContext};
use std::fmt;
use std::sync::Arc;

/// Where and how a decision event was observed.
#[derive(Debug, Clone)]
pub struct DecisionEventInfo {
    pub decision: usize,
    /// Configurations active at the event, when captured.
    pub configs: Option<Arc<ConfigSet>>,
    pub input: InputHandle,
    /// Token index where the prediction started.
    pub start_index: usize,
    /// Token index where the event occurred.
    pub stop_index: usize,
    /// Observed during full-context prediction.
    pub full_ctx: bool,
}

impl DecisionEventInfo {
    pub fn new(
        decision: usize,
        configs: Option<Arc<ConfigSet>>,
        input: InputHandle,
        start_index: usize,
        stop_index: usize,
        full_ctx: bool,
    ) -> Self {
        DecisionEventInfo { decision, configs, input, start_index, stop_index, full_ctx }
    }
}

/// Common accessors for every event record.
pub trait DecisionEvent {
    fn base(&self) -> &DecisionEventInfo;

    fn decision(&self) -> usize {
        self.base().decision
    }

    fn start_index(&self) -> usize {
        self.base().start_index
    }

    fn stop_index(&self) -> usize {
        self.base().stop_index
    }

    fn full_ctx(&self) -> bool {
        self.base().full_ctx
    }

    fn configs(&self) -> Option<&ConfigSet> {
        self.base().configs.as_deref()
    }

    /// Input text from `start_index` through `stop_index`.
    fn text(&self) -> String {
        let base = self.base();
        base.input.text(base.start_index, base.stop_index)
    }

    /// Identity used to deduplicate events of this kind.
    fn key(&self) -> EventKey {
        EventKey::of(self.base())
    }
}

impl DecisionEvent for DecisionEventInfo {
    fn base(&self) -> &DecisionEventInfo {
        self
    }
}

/// A new maximum lookahead depth for a decision.
#[derive(Debug, Clone)]
pub struct LookaheadEventInfo {
    pub base: DecisionEventInfo,
    /// `None` when the prediction failed.
    pub predicted_alt: Option<Alt>,
}

impl LookaheadEventInfo {
    /// Number of tokens examined.
    pub fn depth(&self) -> usize {
        self.base.stop_index.saturating_sub(self.base.start_index) + 1
    }
}

/// Several alternatives matched the same input.
#[derive(Debug, Clone)]
pub struct AmbiguityInfo {
    pub base: DecisionEventInfo,
    pub ambig_alts: AltSet,
}

/// Full-context prediction chose differently than SLL would have.
#[derive(Debug, Clone)]
pub struct ContextSensitivityInfo {
    pub base: DecisionEventInfo,
}

/// One semantic predicate evaluation during prediction.
#[derive(Debug, Clone)]
pub struct PredicateEvalInfo {
    pub base: DecisionEventInfo,
    pub semctx: SemanticContext,
    /// Alternative the predicate guards.
    pub predicted_alt: Alt,
    pub eval_result: bool,
}

/// No alternative could match the input.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub base: DecisionEventInfo,
}

decision_event!(LookaheadEventInfo, AmbiguityInfo, ContextSensitivityInfo, ErrorInfo);

impl DecisionEvent for PredicateEvalInfo {
    fn base(&self) -> &DecisionEventInfo {
        &self.base
    }

    fn key(&self) -> EventKey {
        EventKey::of(&self.base).with_predicate(self.semctx.clone(), self.predicted_alt)
    }
}

fn mode(full_ctx: bool) -> &'static str {
    if full_ctx { "LL" } else { "SLL" }
}

impl fmt::Display for LookaheadEventInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decision {} looked ahead {} tokens on '{}'", self.base.decision, self.depth(), self.text())?;
        match self.predicted_alt {
            Some(alt) => write!(f, " (predicted {alt})")?,
            None => f.write_str(" (failed)")?,
        }
        write!(f, " under {}", mode(self.base.full_ctx))
    }
}

impl fmt::Display for AmbiguityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "decision {} ambiguous on '{}' (alts {}) under {}",
            self.base.decision,
            self.text(),
            self.ambig_alts,
            mode(self.base.full_ctx)
        )
    }
}

impl fmt::Display for ContextSensitivityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decision {} context sensitive on '{}'", self.base.decision, self.text())
    }
}

impl fmt::Display for PredicateEvalInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "decision {} predicate {} for alt {} evaluated {} at '{}' under {}",
            self.base.decision,
            self.semctx,
            self.predicted_alt,
            self.eval_result,
            self.text(),
            mode(self.base.full_ctx)
        )
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "decision {} no viable alternative at '{}' under {}",
            self.base.decision,
            self.text(),
            mode(self.base.full_ctx)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommonTokenStream, Token, TokenStream};

    fn input() -> InputHandle {
        let tokens = vec![Token::new(1, "x"), Token::new(2, "."), Token::new(3, ";")];
        CommonTokenStream::new("<test>", tokens).handle()
    }

    #[test]
    fn events_render_their_input_span() {
        let base = DecisionEventInfo::new(0, None, input(), 0, 2, true);
        let ambiguity = AmbiguityInfo { base, ambig_alts: alts![2, 3] };
        assert_eq!(ambiguity.text(), "x . ;");
        assert_eq!(ambiguity.to_string(), "decision 0 ambiguous on 'x . ;' (alts {2, 3}) under LL");
    }

    #[test]
    fn lookahead_depth_counts_both_ends() {
        let event = LookaheadEventInfo {
            base: DecisionEventInfo::new(4, None, input(), 1, 2, false),
            predicted_alt: None,
        };
        assert_eq!(event.depth(), 2);
        assert_eq!(event.to_string(), "decision 4 looked ahead 2 tokens on '. ;' (failed) under SLL");
    }

    #[test]
    fn predicate_keys_include_predicate_and_alt() {
        let pred = |pred_index| SemanticContext::Predicate { rule_index: 0, pred_index, ctx_dependent: false };
        let eval = |pred_index, alt| PredicateEvalInfo {
            base: DecisionEventInfo::new(0, None, input(), 0, 0, false),
            semctx: pred(pred_index),
            predicted_alt: alt,
            eval_result: true,
        };
        assert_eq!(eval(0, 1).key(), eval(0, 1).key());
        assert_ne!(eval(0, 1).key(), eval(1, 1).key());
        assert_ne!(eval(0, 1).key(), eval(0, 2).key());

        let error = ErrorInfo { base: DecisionEventInfo::new(0, None, input(), 0, 0, false) };
        assert_eq!(error.key().detail, None);
    }
}
