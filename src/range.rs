use crate::error::PerfdataError;
use crate::lexer::{Lexer, Scanner, Token, Tokenize};
use std::fmt;

/// A nagios threshold range.
///
/// A value alarms when it lies strictly outside `[minimum, maximum]`, or, with
/// `inside` set, strictly inside it. Infinite bounds mean the side is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRange {
    pub minimum: f64,
    pub maximum: f64,
    pub inside: bool,
}

impl ThresholdRange {
    /// "No threshold configured".
    pub const EMPTY: ThresholdRange = ThresholdRange {
        minimum: f64::NEG_INFINITY,
        maximum: f64::INFINITY,
        inside: false,
    };

    pub fn new(minimum: f64, maximum: f64, inside: bool) -> Self {
        Self {
            minimum,
            maximum,
            inside,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.minimum.is_finite() || self.maximum.is_finite() || self.inside)
    }

    /// Whether `value` falls in the alarming part of this range. NaN never alarms.
    #[must_use]
    pub fn alerts(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        if self.inside {
            value > self.minimum && value < self.maximum
        } else {
            value < self.minimum || value > self.maximum
        }
    }
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Renders the range in nagios syntax.
///
/// Every range with `is_empty()` renders as the empty string, so `~:~`
/// (both bounds negative infinity) reads back as [`ThresholdRange::EMPTY`].
impl fmt::Display for ThresholdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        if self.inside {
            write!(f, "@")?;
        }
        if self.minimum == 0.0 && self.maximum.is_finite() {
            return write!(f, "{}", self.maximum);
        }
        if self.minimum == f64::NEG_INFINITY {
            write!(f, "~:")?;
        } else {
            write!(f, "{}:", self.minimum)?;
        }
        if self.maximum.is_finite() {
            write!(f, "{}", self.maximum)?;
        }
        Ok(())
    }
}

/// Tokens of the threshold range sub-language.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeToken {
    End,
    /// `:`
    Separator,
    /// `@`
    Inside,
    /// A numeric literal, or `~` for negative infinity.
    Number(f64),
}

pub struct RangeTokenizer<'a> {
    scanner: Scanner<'a>,
}

impl<'a> RangeTokenizer<'a> {
    pub fn new(scanner: Scanner<'a>) -> Self {
        Self { scanner }
    }

    pub fn scanner(&self) -> &Scanner<'a> {
        &self.scanner
    }
}

impl Tokenize for RangeTokenizer<'_> {
    type Kind = RangeToken;

    fn next_token(&mut self) -> Result<Token<RangeToken>, PerfdataError> {
        let start = self.scanner.pos();
        let kind = match self.scanner.peek() {
            None => RangeToken::End,
            Some(':') => {
                self.scanner.advance();
                RangeToken::Separator
            }
            Some('@') => {
                self.scanner.advance();
                RangeToken::Inside
            }
            Some('~') => {
                self.scanner.advance();
                RangeToken::Number(f64::NEG_INFINITY)
            }
            Some(_) => match self.scanner.scan_number() {
                Some(n) => RangeToken::Number(n),
                None => return Err(self.scanner.err_unexpected_char("a number, ':', '@' or '~'")),
            },
        };
        log::trace!("range token {:?} at {}", kind, start);
        Ok(Token::new(kind, start, self.scanner.pos()))
    }

    fn is_end(kind: &RangeToken) -> bool {
        matches!(kind, RangeToken::End)
    }
}

/// Single pass parser for one threshold range.
pub struct RangeParser<'a> {
    lexer: Lexer<RangeTokenizer<'a>>,
    pos_start: usize,
}

impl<'a> RangeParser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::from_scanner(Scanner::new("range", source_text))
    }

    /// Parses the scanner's range only. Used for threshold slots inside perfdata,
    /// where spans must stay relative to the whole perfdata string.
    pub fn from_scanner(scanner: Scanner<'a>) -> Self {
        Self {
            pos_start: scanner.pos(),
            lexer: Lexer::new(RangeTokenizer::new(scanner)),
        }
    }

    /// Range ::= [ "@" ] Number [ ":" [ Number ] ]
    ///
    /// Tokens after a complete range are left unread.
    pub fn parse_range(&mut self) -> Result<ThresholdRange, PerfdataError> {
        let inside = self.current()?.kind == RangeToken::Inside;
        if inside {
            self.lexer.advance()?;
        }

        let token = self.current()?;
        let first = match token.kind {
            RangeToken::Number(n) => n,
            _ => return self.err_unexpected(token, "a number"),
        };
        self.lexer.advance()?;

        let token = self.current()?;
        match token.kind {
            RangeToken::End => {
                if first < 0.0 {
                    return self.err_invalid(token, "a bound without ':' must not be negative");
                }
                return Ok(self.finish(ThresholdRange::new(0.0, first, inside)));
            }
            RangeToken::Separator => self.lexer.advance()?,
            _ => return self.err_unexpected(token, "':' or the end of the range"),
        }

        let token = self.current()?;
        let range = match token.kind {
            RangeToken::End => ThresholdRange::new(first, f64::INFINITY, inside),
            RangeToken::Number(second) if second >= first => {
                ThresholdRange::new(first, second, inside)
            }
            RangeToken::Number(_) => {
                return self.err_invalid(token, "maximum is below minimum");
            }
            _ => return self.err_unexpected(token, "a number or the end of the range"),
        };
        Ok(self.finish(range))
    }

    // === Helper Methods ===

    fn current(&mut self) -> Result<Token<RangeToken>, PerfdataError> {
        self.lexer.current().copied()
    }

    fn finish(&self, range: ThresholdRange) -> ThresholdRange {
        log::debug!("parsed threshold range {:?} at {}", range, self.pos_start);
        range
    }

    fn err_unexpected<T>(&self, token: Token<RangeToken>, expected: &str) -> Result<T, PerfdataError> {
        let scanner = self.lexer.tokenizer().scanner();
        if token.kind == RangeToken::End {
            Err(scanner.err_unexpected_end(token.pos_start, expected))
        } else {
            Err(scanner.err_unexpected_token(token.pos_start, token.pos_end, expected))
        }
    }

    fn err_invalid<T>(&self, token: Token<RangeToken>, reason: &str) -> Result<T, PerfdataError> {
        let scanner = self.lexer.tokenizer().scanner();
        Err(scanner.err_invalid_range(self.pos_start, token.pos_end, reason))
    }
}

/// Parses a threshold range such as `10`, `10:`, `~:10`, `10:20` or `@10:20`.
///
/// # Errors
/// Returns a `PerfdataError` when `text` is not a valid range.
pub fn parse_range(text: &str) -> Result<ThresholdRange, PerfdataError> {
    RangeParser::new(text).parse_range()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn tokens(input: &str) -> Vec<RangeToken> {
        let mut lexer = Lexer::new(RangeTokenizer::new(Scanner::new("test", input)));
        let mut out = Vec::new();
        loop {
            let kind = lexer.current().unwrap().kind;
            out.push(kind);
            if kind == RangeToken::End {
                break;
            }
            lexer.advance().unwrap();
        }
        out
    }

    #[test]
    fn test_tokenize_full_form() {
        assert_eq!(
            tokens("@-1.5:20"),
            vec![
                RangeToken::Inside,
                RangeToken::Number(-1.5),
                RangeToken::Separator,
                RangeToken::Number(20.0),
                RangeToken::End,
            ]
        );
    }

    #[test]
    fn test_tokenize_tilde() {
        assert_eq!(
            tokens("~:3"),
            vec![
                RangeToken::Number(f64::NEG_INFINITY),
                RangeToken::Separator,
                RangeToken::Number(3.0),
                RangeToken::End,
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_garbage() {
        let mut lexer = Lexer::new(RangeTokenizer::new(Scanner::new("test", "10%")));
        lexer.advance().unwrap();
        assert!(lexer.current().is_err());
    }

    #[test]
    fn test_shorthand() {
        assert_eq!(parse_range("10").unwrap(), ThresholdRange::new(0.0, 10.0, false));
        assert_eq!(parse_range("0").unwrap(), ThresholdRange::new(0.0, 0.0, false));
    }

    #[test]
    fn test_open_ended() {
        assert_eq!(
            parse_range("10:").unwrap(),
            ThresholdRange::new(10.0, f64::INFINITY, false)
        );
        assert_eq!(
            parse_range("-5:").unwrap(),
            ThresholdRange::new(-5.0, f64::INFINITY, false)
        );
        assert_eq!(
            parse_range("~:10").unwrap(),
            ThresholdRange::new(f64::NEG_INFINITY, 10.0, false)
        );
    }

    #[test]
    fn test_closed() {
        assert_eq!(parse_range("10:20").unwrap(), ThresholdRange::new(10.0, 20.0, false));
        assert_eq!(parse_range("5:5").unwrap(), ThresholdRange::new(5.0, 5.0, false));
    }

    #[test]
    fn test_inside_prefix() {
        assert_eq!(parse_range("@10").unwrap(), ThresholdRange::new(0.0, 10.0, true));
        assert_eq!(parse_range("@10:20").unwrap(), ThresholdRange::new(10.0, 20.0, true));
        assert_eq!(
            parse_range("@~:20").unwrap(),
            ThresholdRange::new(f64::NEG_INFINITY, 20.0, true)
        );
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = parse_range("5:2").unwrap_err();
        assert!(matches!(
            err,
            PerfdataError::Parse(ParseError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_shorthand() {
        assert!(parse_range("-3").is_err());
        assert!(parse_range("~").is_err());
    }

    #[test]
    fn test_rejects_empty_and_bare_separators() {
        let err = parse_range("").unwrap_err();
        assert!(matches!(
            err,
            PerfdataError::Parse(ParseError::UnexpectedEnd { .. })
        ));
        assert!(parse_range(":").is_err());
        assert!(parse_range("@").is_err());
        assert!(parse_range("1::").is_err());
        assert!(parse_range("1@").is_err());
    }

    #[test]
    fn test_empty_predicate() {
        assert!(ThresholdRange::EMPTY.is_empty());
        assert!(ThresholdRange::default().is_empty());
        assert!(parse_range("~:").unwrap().is_empty());
        assert!(!parse_range("@~:").unwrap().is_empty());
        assert!(!parse_range("0").unwrap().is_empty());
    }

    #[test]
    fn test_alerts() {
        let outside = ThresholdRange::new(10.0, 20.0, false);
        assert!(outside.alerts(9.0));
        assert!(outside.alerts(21.0));
        assert!(!outside.alerts(10.0));
        assert!(!outside.alerts(20.0));
        assert!(!outside.alerts(f64::NAN));

        let inside = ThresholdRange::new(10.0, 20.0, true);
        assert!(inside.alerts(15.0));
        assert!(!inside.alerts(10.0));
        assert!(!inside.alerts(25.0));

        assert!(!ThresholdRange::EMPTY.alerts(1e300));
    }

    #[test]
    fn test_display() {
        for text in ["10", "@10", "10:", "~:10", "10:20", "@-1.5:2.5", "~:"] {
            let range = parse_range(text).unwrap();
            let shown = range.to_string();
            if range.is_empty() {
                assert_eq!(shown, "");
            } else {
                assert_eq!(shown, text);
            }
        }
    }

    #[test]
    fn test_display_of_empty_lookalike() {
        let range = parse_range("~:~").unwrap();
        assert_eq!(range, ThresholdRange::new(f64::NEG_INFINITY, f64::NEG_INFINITY, false));
        assert!(range.is_empty());
        assert_eq!(range.to_string(), "");
    }

    #[test]
    fn test_trailing_tokens_are_left_unread() {
        assert_eq!(parse_range("1:2:3").unwrap(), ThresholdRange::new(1.0, 2.0, false));
        assert_eq!(parse_range("1:2x").unwrap(), ThresholdRange::new(1.0, 2.0, false));
        assert_eq!(parse_range("@1:").unwrap(), ThresholdRange::new(1.0, f64::INFINITY, true));

        let err = parse_range("2x").unwrap_err();
        assert!(matches!(
            err,
            PerfdataError::Parse(ParseError::UnexpectedChar { .. })
        ));
    }
}
