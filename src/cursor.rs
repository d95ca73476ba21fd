use crate::common::Position;
use crate::lexer::Token;

/// Read position over a token slice with one-token lookahead and
/// mark/reset for backtracking over a single grammar choice.
pub struct TokenCursor<'t> {
    tokens: &'t [Token],
    current: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

impl<'t> TokenCursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.current)
    }

    pub fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.current)?;
        self.current += 1;
        Some(token)
    }

    pub fn next_if(&mut self, f: impl Fn(&Token) -> bool) -> Option<&'t Token> {
        match self.peek() {
            Some(token) if f(token) => self.advance(),
            _ => None,
        }
    }

    pub fn previous(&self) -> Option<&'t Token> {
        self.current.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    pub fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.current)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.current = mark.0;
    }

    /// Where a report about the next token should point; past the last
    /// token once the input is exhausted.
    pub fn position(&self) -> Position {
        match (self.peek(), self.tokens.last()) {
            (Some(token), _) => token.position,
            (None, Some(last)) => Position::new(
                last.position.line,
                last.position.column + last.source.len() as u32,
            ),
            (None, None) => Position::new(1, 1),
        }
    }
}
