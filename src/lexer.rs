use crate::error::{ParseError, PerfdataError};
use miette::NamedSource;
use std::collections::VecDeque;

/// A token with its kind and the byte span it was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<K> {
    pub kind: K,
    pub pos_start: usize,
    pub pos_end: usize,
}

impl<K> Token<K> {
    pub fn new(kind: K, pos_start: usize, pos_end: usize) -> Token<K> {
        Token {
            kind,
            pos_start,
            pos_end,
        }
    }
}

/// The production side of a [`Lexer`]: hands out one token per call.
pub trait Tokenize {
    type Kind: Clone;

    /// Produces the next token of the stream.
    ///
    /// # Errors
    /// Returns a `PerfdataError` when the input does not form a valid token here.
    fn next_token(&mut self) -> Result<Token<Self::Kind>, PerfdataError>;

    /// Whether `kind` marks the end of the stream.
    fn is_end(kind: &Self::Kind) -> bool;
}

/// A lookahead buffer over a [`Tokenize`] implementation.
///
/// Tokens are produced on demand, only as far ahead as a caller has peeked, and are
/// dropped from the front when advanced past. There is no rewind.
///
/// Once the tokenizer has produced its end token it is never called again: every
/// further request is answered with a copy of that end token.
pub struct Lexer<T: Tokenize> {
    tokenizer: T,
    queue: VecDeque<Token<T::Kind>>,
    end: Option<Token<T::Kind>>,
}

impl<T: Tokenize> Lexer<T> {
    pub fn new(tokenizer: T) -> Self {
        Self {
            tokenizer,
            queue: VecDeque::new(),
            end: None,
        }
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Returns the token `n` positions ahead of the next unconsumed one.
    ///
    /// # Errors
    /// Propagates tokenizer errors raised while filling the buffer.
    pub fn peek(&mut self, n: usize) -> Result<&Token<T::Kind>, PerfdataError> {
        self.fill(n)?;
        Ok(&self.queue[n])
    }

    /// Shorthand for `peek(0)`.
    ///
    /// # Errors
    /// Propagates tokenizer errors.
    pub fn current(&mut self) -> Result<&Token<T::Kind>, PerfdataError> {
        self.peek(0)
    }

    /// Discards the next token.
    ///
    /// # Errors
    /// Propagates tokenizer errors.
    pub fn advance(&mut self) -> Result<(), PerfdataError> {
        self.advance_by(1)
    }

    /// Discards the next `n` tokens, producing them first if needed.
    ///
    /// # Errors
    /// Propagates tokenizer errors.
    pub fn advance_by(&mut self, n: usize) -> Result<(), PerfdataError> {
        if n == 0 {
            return Ok(());
        }
        self.fill(n - 1)?;
        self.queue.drain(..n);
        Ok(())
    }

    /// Number of tokens produced but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    fn fill(&mut self, n: usize) -> Result<(), PerfdataError> {
        while self.queue.len() <= n {
            if let Some(end) = &self.end {
                self.queue.push_back(end.clone());
                continue;
            }
            let token = self.tokenizer.next_token()?;
            if T::is_end(&token.kind) {
                self.end = Some(token.clone());
            }
            self.queue.push_back(token);
        }
        Ok(())
    }
}

/// Field separating whitespace, the C `isspace` set: ASCII whitespace plus vertical tab.
pub fn is_space(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0b'
}

/// A forward-only cursor over the half-open byte range `pos..end` of a source text.
///
/// Positions are byte offsets into the whole text, so spans reported by tokenizers
/// working on a sub-range still point into the original string.
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'a> {
    source_name: &'a str,
    text: &'a str,
    pos: usize,
    end: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source_name: &'a str, text: &'a str) -> Self {
        Self::with_range(source_name, text, 0, text.len())
    }

    /// `start..end` must lie on char boundaries within `text`.
    pub(crate) fn with_range(
        source_name: &'a str,
        text: &'a str,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            source_name,
            text,
            pos: start,
            end,
        }
    }

    /// A scanner over `start..end` of the same source.
    pub(crate) fn sub_range(&self, start: usize, end: usize) -> Scanner<'a> {
        Self::with_range(self.source_name, self.text, start, end)
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[start..end]
    }

    pub fn peek(&self) -> Option<char> {
        self.text[self.pos..self.end].chars().next()
    }

    pub fn peek_is(&self, expected: char) -> bool {
        self.peek() == Some(expected)
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes whitespace and returns how many characters were skipped.
    pub fn eat_spaces(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(is_space) {
            self.advance();
            count += 1;
        }
        count
    }

    /// Consumes characters while `pred` holds and returns the consumed text.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        self.slice(start, self.pos)
    }

    /// Consumes one perfdata slot: everything up to `;`, whitespace or the end.
    pub fn eat_field(&mut self) -> &'a str {
        self.eat_while(|c| c != ';' && !is_space(c))
    }

    /// Scans `[+-]digits[.digits]` and returns its value.
    ///
    /// At least one digit is required. When no literal is present nothing is consumed.
    pub fn scan_number(&mut self) -> Option<f64> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut i = self.pos;
        if i < self.end && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let int_start = i;
        while i < self.end && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let mut digits = i - int_start;
        if i < self.end && bytes[i] == b'.' {
            let frac_start = i + 1;
            let mut j = frac_start;
            while j < self.end && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if digits + (j - frac_start) > 0 {
                digits += j - frac_start;
                i = j;
            }
        }
        if digits == 0 {
            return None;
        }
        let value = self.text[start..i].parse::<f64>().ok()?;
        self.pos = i;
        Some(value)
    }

    // === Error Builders ===

    fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.source_name, self.text.to_string())
    }

    pub fn err_unexpected_token(&self, start: usize, end: usize, expected: &str) -> PerfdataError {
        ParseError::UnexpectedToken {
            src: self.named_source(),
            span: (start, end - start).into(),
            expected: expected.to_string(),
        }
        .into()
    }

    pub fn err_unexpected_end(&self, at: usize, expected: &str) -> PerfdataError {
        ParseError::UnexpectedEnd {
            src: self.named_source(),
            span: (at, 0).into(),
            expected: expected.to_string(),
        }
        .into()
    }

    /// Reports the character under the cursor as unexpected.
    pub fn err_unexpected_char(&self, expected: &str) -> PerfdataError {
        let len = self.peek().map_or(0, char::len_utf8);
        ParseError::UnexpectedChar {
            src: self.named_source(),
            span: (self.pos, len).into(),
            expected: expected.to_string(),
        }
        .into()
    }

    pub fn err_unterminated_quote(&self, start: usize) -> PerfdataError {
        ParseError::UnterminatedQuote {
            src: self.named_source(),
            span: (start, self.pos - start).into(),
        }
        .into()
    }

    pub fn err_invalid_value(&self) -> PerfdataError {
        let rest = self.slice(self.pos, self.end);
        let len = rest
            .find(|c: char| c == ';' || is_space(c))
            .unwrap_or(rest.len());
        ParseError::InvalidValue {
            src: self.named_source(),
            span: (self.pos, len).into(),
        }
        .into()
    }

    pub fn err_invalid_range(&self, start: usize, end: usize, reason: &str) -> PerfdataError {
        ParseError::InvalidRange {
            src: self.named_source(),
            span: (start, end - start).into(),
            reason: reason.to_string(),
        }
        .into()
    }

    pub fn err_trailing_data(&self) -> PerfdataError {
        let rest = self.slice(self.pos, self.end);
        let len = rest.find(is_space).unwrap_or(rest.len());
        ParseError::TrailingData {
            src: self.named_source(),
            span: (self.pos, len).into(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields the characters of a string as tokens, `None` marking the end.
    struct CharTokenizer {
        chars: Vec<char>,
        pos: usize,
        produced: usize,
    }

    impl CharTokenizer {
        fn new(input: &str) -> Self {
            Self {
                chars: input.chars().collect(),
                pos: 0,
                produced: 0,
            }
        }
    }

    impl Tokenize for CharTokenizer {
        type Kind = Option<char>;

        fn next_token(&mut self) -> Result<Token<Option<char>>, PerfdataError> {
            self.produced += 1;
            let kind = self.chars.get(self.pos).copied();
            let start = self.pos;
            if kind.is_some() {
                self.pos += 1;
            }
            Ok(Token::new(kind, start, self.pos))
        }

        fn is_end(kind: &Option<char>) -> bool {
            kind.is_none()
        }
    }

    #[test]
    fn test_peek_produces_on_demand() {
        let mut lexer = Lexer::new(CharTokenizer::new("abc"));
        assert_eq!(lexer.tokenizer().produced, 0);
        assert_eq!(lexer.peek(1).unwrap().kind, Some('b'));
        assert_eq!(lexer.tokenizer().produced, 2);
        assert_eq!(lexer.buffered(), 2);
        assert_eq!(lexer.current().unwrap().kind, Some('a'));
        assert_eq!(lexer.tokenizer().produced, 2);
    }

    #[test]
    fn test_advance_consumes_in_order() {
        let mut lexer = Lexer::new(CharTokenizer::new("abcd"));
        lexer.advance().unwrap();
        assert_eq!(lexer.current().unwrap().kind, Some('b'));
        lexer.advance_by(2).unwrap();
        assert_eq!(lexer.current().unwrap().kind, Some('d'));
        lexer.advance_by(0).unwrap();
        assert_eq!(lexer.current().unwrap().kind, Some('d'));
    }

    #[test]
    fn test_advance_by_produces_unbuffered_tokens() {
        let mut lexer = Lexer::new(CharTokenizer::new("abc"));
        lexer.advance_by(2).unwrap();
        assert_eq!(lexer.buffered(), 0);
        assert_eq!(lexer.current().unwrap().kind, Some('c'));
    }

    #[test]
    fn test_end_is_replayed_without_calling_tokenizer() {
        let mut lexer = Lexer::new(CharTokenizer::new("a"));
        assert_eq!(lexer.peek(3).unwrap().kind, None);
        assert_eq!(lexer.tokenizer().produced, 2);
        lexer.advance_by(4).unwrap();
        assert_eq!(lexer.current().unwrap().kind, None);
        assert_eq!(lexer.tokenizer().produced, 2);
    }

    #[test]
    fn test_scan_number_forms() {
        let cases = [
            ("42", Some(42.0), 2),
            ("-3.5x", Some(-3.5), 4),
            ("+7", Some(7.0), 2),
            ("5.", Some(5.0), 2),
            (".25", Some(0.25), 3),
            ("1.5.3", Some(1.5), 3),
            ("-", None, 0),
            (".", None, 0),
            ("abc", None, 0),
            ("", None, 0),
        ];
        for (input, expected, consumed) in cases {
            let mut scanner = Scanner::new("test", input);
            assert_eq!(scanner.scan_number(), expected, "input {input:?}");
            assert_eq!(scanner.pos(), consumed, "input {input:?}");
        }
    }

    #[test]
    fn test_scan_number_respects_range_end() {
        let mut scanner = Scanner::with_range("test", "12345", 1, 3);
        assert_eq!(scanner.scan_number(), Some(23.0));
        assert!(scanner.is_at_end());
    }

    #[test]
    fn test_eat_field_and_spaces() {
        let mut scanner = Scanner::new("test", "abc;def  ghi");
        assert_eq!(scanner.eat_field(), "abc");
        assert!(scanner.peek_is(';'));
        scanner.advance();
        assert_eq!(scanner.eat_field(), "def");
        assert_eq!(scanner.eat_spaces(), 2);
        assert_eq!(scanner.eat_field(), "ghi");
        assert!(scanner.is_at_end());
        assert_eq!(scanner.eat_spaces(), 0);
    }

    #[test]
    fn test_vertical_tab_is_space() {
        assert!(is_space('\x0b'));
        assert!(is_space('\x0c'));
        assert!(!is_space('\u{a0}'));

        let mut scanner = Scanner::new("test", "a\x0bb");
        assert_eq!(scanner.eat_field(), "a");
        assert_eq!(scanner.eat_spaces(), 1);
        assert_eq!(scanner.eat_field(), "b");
    }
}
