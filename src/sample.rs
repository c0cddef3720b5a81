//! Built-in sample grammar.
//!
//! One statement decision over a tiny language, small enough to read but
//! rich enough to produce every kind of profiling event:
//!
//! ```text
//! stat : ID                   # 1
//!      | ID '.'               # 2  member access prefix
//!      | {qualified}? ID '.'  # 3  context-dependent guard
//!      | ID '=' INT           # 4
//!      | ID '(' ')'           # 5
//!      | INT '+' INT          # 6
//!      | INT '+' ID           # 7
//!      | {bare_ints}? INT     # 8
//!      ;
//!
//! invoked from:  statement : stat ';'
//!                member    : stat '.' ';'
//! ```
//!
//! `x . ;` is where SLL and LL disagree: ignoring the caller, `x` followed by
//! `. ;` also fits alternative 1 invoked from `member`. The parser always
//! invokes `stat` from `statement`, so full-context prediction picks 2.

use crate::error::{Error, PredictionError, Result};
use crate::{
    Alt, Atn, AtnBuilder, CommonTokenStream, DecisionBuilder, EOF, ParserContext, PredicateEvaluator, ReturnStateId,
    SemanticContext, Simulator, Token, TokenStream, TokenType,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const ID: TokenType = 1;
pub const INT: TokenType = 2;
pub const ASSIGN: TokenType = 3;
pub const DOT: TokenType = 4;
pub const SEMI: TokenType = 5;
pub const LPAREN: TokenType = 6;
pub const RPAREN: TokenType = 7;
pub const PLUS: TokenType = 8;

/// The statement decision.
pub const STAT: usize = 0;

pub const R_STATEMENT: ReturnStateId = 0;
pub const R_MEMBER: ReturnStateId = 1;

const RULE_STAT: usize = 0;
const PRED_QUALIFIED: usize = 0;
const PRED_BARE_INTS: usize = 1;

static ATN: Lazy<Arc<Atn>> = Lazy::new(|| match build() {
    Ok(atn) => Arc::new(atn),
    Err(e) => panic!("sample grammar is malformed: {e}"),
});

fn build() -> Result<Atn> {
    let qualified = SemanticContext::Predicate { rule_index: RULE_STAT, pred_index: PRED_QUALIFIED, ctx_dependent: true };
    let bare_ints = SemanticContext::Predicate { rule_index: RULE_STAT, pred_index: PRED_BARE_INTS, ctx_dependent: false };

    let mut b = AtnBuilder::new();
    let statement = b.return_state("statement", [SEMI]);
    let member = b.return_state("member", [DOT, SEMI]);
    debug_assert_eq!((statement, member), (R_STATEMENT, R_MEMBER));

    b.decision(
        DecisionBuilder::new("stat")
            .alt(1, [ID])
            .alt(2, [ID, DOT])
            .guarded(3, qualified, [ID, DOT])
            .alt(4, [ID, ASSIGN, INT])
            .alt(5, [ID, LPAREN, RPAREN])
            .alt(6, [INT, PLUS, INT])
            .alt(7, [INT, PLUS, ID])
            .guarded(8, bare_ints, [INT])
            .called_from(statement)
            .called_from(member),
    );
    b.build()
}

/// The sample ATN, built once.
pub fn atn() -> Arc<Atn> {
    Arc::clone(&ATN)
}

/// Outer context of a top-level statement.
pub fn statement_context() -> ParserContext {
    ParserContext::empty().invoked_from(R_STATEMENT)
}

/// Split `text` into sample-grammar tokens (EOF not included).
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let re = regex!(r"^(?:([A-Za-z_][A-Za-z0-9_]*)|([0-9]+)|([=.;()+]))");
    let mut tokens = Vec::new();
    let mut offset = 0;

    loop {
        let rest = &text[offset..];
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        if trimmed.is_empty() {
            return Ok(tokens);
        }

        let Some(caps) = re.captures(trimmed) else {
            return Err(Error::Lex { offset, snippet: trimmed.chars().take(12).collect() });
        };
        let lexeme = &caps[0];
        let token_type = if caps.get(1).is_some() {
            ID
        } else if caps.get(2).is_some() {
            INT
        } else {
            match lexeme {
                "=" => ASSIGN,
                "." => DOT,
                ";" => SEMI,
                "(" => LPAREN,
                ")" => RPAREN,
                _ => PLUS,
            }
        };
        tokens.push(Token::new(token_type, lexeme));
        offset += lexeme.len();
    }
}

/// Predicate switches for the sample grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePredicates {
    /// `{qualified}?`: identifiers followed by `.` name types.
    pub qualified: bool,
    /// `{bare_ints}?`: a lone integer is a statement.
    pub bare_ints: bool,
}

impl Default for SamplePredicates {
    fn default() -> Self {
        SamplePredicates { qualified: false, bare_ints: true }
    }
}

impl PredicateEvaluator for SamplePredicates {
    fn sempred(&self, _ctx: &ParserContext, rule_index: usize, pred_index: usize) -> bool {
        match (rule_index, pred_index) {
            (RULE_STAT, PRED_QUALIFIED) => self.qualified,
            (RULE_STAT, PRED_BARE_INTS) => self.bare_ints,
            _ => true,
        }
    }
}

/// What happened to one `;`-terminated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub start_index: usize,
    pub text: String,
    pub outcome: StatementOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementOutcome {
    Parsed(Alt),
    /// Prediction failed.
    NoViableAlt(PredictionError),
    /// Prediction succeeded but the statement did not end where expected.
    Mismatch { alt: Alt, index: usize },
}

/// Statement parser driving any [`Simulator`] over the sample grammar.
#[derive(Debug)]
pub struct SampleParser<S> {
    sim: S,
}

impl<S: Simulator> SampleParser<S> {
    pub fn new(sim: S) -> Self {
        SampleParser { sim }
    }

    pub fn simulator(&self) -> &S {
        &self.sim
    }

    pub fn into_simulator(self) -> S {
        self.sim
    }

    /// Parse every statement in `input`, recovering after each failure by
    /// skipping past the next `;`.
    pub fn parse(&mut self, input: &mut CommonTokenStream) -> Vec<Statement> {
        let outer = statement_context();
        let mut statements = Vec::new();

        while input.la(1) != EOF {
            let start_index = input.index();
            let outcome = match self.sim.adaptive_predict(input, STAT, &outer) {
                Ok(alt) => self.match_statement(input, alt),
                Err(e) => StatementOutcome::NoViableAlt(e),
            };
            if !matches!(outcome, StatementOutcome::Parsed(_)) {
                tracing::debug!(start_index, ?outcome, "recovering");
                recover(input);
            }
            let text = input.handle().text(start_index, input.index().saturating_sub(1));
            statements.push(Statement { start_index, text, outcome });
        }
        statements
    }

    fn match_statement(&self, input: &mut CommonTokenStream, alt: Alt) -> StatementOutcome {
        let atn = self.sim.atn();
        let decision = atn.decision(STAT);
        let symbols = decision.productions.iter().filter(|p| p.alt == alt).flat_map(|p| p.symbols.iter());

        for &symbol in symbols.chain(std::iter::once(&SEMI)) {
            if input.la(1) != symbol {
                return StatementOutcome::Mismatch { alt, index: input.index() };
            }
            input.consume();
        }
        StatementOutcome::Parsed(alt)
    }
}

fn recover(input: &mut CommonTokenStream) {
    loop {
        match input.la(1) {
            EOF => return,
            SEMI => {
                input.consume();
                return;
            }
            _ => input.consume(),
        }
    }
}
