//! Token streams consumed by prediction.
//!
//! Prediction only needs random access to token *types* plus the ability to
//! rewind to where a decision started. Event records additionally keep an
//! [`InputHandle`] so reporting can show the text a decision looked at
//! without borrowing the live stream.

use crate::{EOF, TokenType};
use std::fmt;
use std::sync::Arc;

/// A lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,
    /// Position of this token in its stream.
    pub index: usize,
}

impl Token {
    pub fn new(token_type: TokenType, text: impl Into<String>) -> Self {
        Token { token_type, text: text.into(), index: 0 }
    }

    pub fn eof() -> Self {
        Token { token_type: EOF, text: "<EOF>".to_string(), index: 0 }
    }
}

/// Random-access token source used by prediction.
pub trait TokenStream {
    /// Token type `i` positions ahead (`la(1)` is the current token).
    ///
    /// Returns [`EOF`] past the end of the stream.
    fn la(&self, i: usize) -> TokenType;

    /// Index of the current token.
    fn index(&self) -> usize;

    /// Move to an absolute token index.
    fn seek(&mut self, index: usize);

    /// Advance past the current token. Consuming EOF is a no-op.
    fn consume(&mut self);

    /// Number of tokens, including the trailing EOF.
    fn size(&self) -> usize;

    /// Cheap, owned handle to the underlying tokens.
    fn handle(&self) -> InputHandle;
}

/// Shared, immutable view of a token stream's contents.
#[derive(Clone)]
pub struct InputHandle {
    source_name: Arc<str>,
    tokens: Arc<[Token]>,
}

impl InputHandle {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Space-joined text of tokens `start..=stop`, clamped to the stream.
    pub fn text(&self, start: usize, stop: usize) -> String {
        if start >= self.tokens.len() || stop < start {
            return String::new();
        }
        let stop = stop.min(self.tokens.len() - 1);
        self.tokens[start..=stop]
            .iter()
            .filter(|t| t.token_type != EOF)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputHandle").field("source_name", &self.source_name).field("tokens", &self.tokens.len()).finish()
    }
}

/// Buffered token stream over a complete token list.
#[derive(Debug, Clone)]
pub struct CommonTokenStream {
    handle: InputHandle,
    index: usize,
}

impl CommonTokenStream {
    /// Create a stream from `tokens`, renumbering them and appending EOF when
    /// the list does not already end with it.
    pub fn new(source_name: impl Into<Arc<str>>, tokens: Vec<Token>) -> Self {
        let mut tokens = tokens;
        if tokens.last().map(|t| t.token_type) != Some(EOF) {
            tokens.push(Token::eof());
        }
        for (index, token) in tokens.iter_mut().enumerate() {
            token.index = index;
        }
        CommonTokenStream { handle: InputHandle { source_name: source_name.into(), tokens: tokens.into() }, index: 0 }
    }

    /// Convenience constructor from bare token types.
    pub fn from_types(types: &[TokenType]) -> Self {
        let tokens = types.iter().map(|&t| Token::new(t, format!("<{t}>"))).collect();
        Self::new("<types>", tokens)
    }

    /// The token `i` positions ahead, if any.
    pub fn lt(&self, i: usize) -> Option<&Token> {
        let at = (self.index + i).checked_sub(1)?;
        self.handle.tokens.get(at)
    }
}

impl TokenStream for CommonTokenStream {
    fn la(&self, i: usize) -> TokenType {
        self.lt(i).map(|t| t.token_type).unwrap_or(EOF)
    }

    fn index(&self) -> usize {
        self.index
    }

    fn seek(&mut self, index: usize) {
        self.index = index.min(self.handle.tokens.len().saturating_sub(1));
    }

    fn consume(&mut self) {
        if self.la(1) != EOF {
            self.index += 1;
        }
    }

    fn size(&self) -> usize {
        self.handle.tokens.len()
    }

    fn handle(&self) -> InputHandle {
        self.handle.clone()
    }
}
