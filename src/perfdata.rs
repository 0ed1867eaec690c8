use crate::error::PerfdataError;
use crate::lexer::{is_space, Lexer, Scanner, Token, Tokenize};
use crate::range::{RangeParser, ThresholdRange};
use crate::status::CheckStatus;
use std::fmt;

/// One `label=value[uom][;warn[;crit[;min[;max]]]]` field of plugin output.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfdataRecord {
    pub label: String,
    /// NaN when the plugin reported `U`.
    pub value: f64,
    pub unit: Option<String>,
    pub warning: ThresholdRange,
    pub critical: ThresholdRange,
    pub minimum: f64,
    pub maximum: f64,
}

impl PerfdataRecord {
    /// A record with no unit, no thresholds and unbounded min/max.
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            unit: None,
            warning: ThresholdRange::EMPTY,
            critical: ThresholdRange::EMPTY,
            minimum: f64::NEG_INFINITY,
            maximum: f64::INFINITY,
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.value.is_nan()
    }

    /// Classifies the value against the critical, then the warning range.
    pub fn status(&self) -> CheckStatus {
        if self.is_unknown() {
            CheckStatus::Unknown
        } else if self.critical.alerts(self.value) {
            CheckStatus::Critical
        } else if self.warning.alerts(self.value) {
            CheckStatus::Warning
        } else {
            CheckStatus::Ok
        }
    }

    fn needs_quotes(&self) -> bool {
        self.label
            .chars()
            .any(|c| c == '=' || c == '\'' || is_space(c))
    }
}

/// Renders the record in perfdata syntax.
///
/// Parsing the output gives back an equal record, except for an infinite value
/// (rendered as `inf`, which is not a valid value) and a unit starting with a digit,
/// which the parser can never produce.
impl fmt::Display for PerfdataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_quotes() {
            write!(f, "'{}'", self.label.replace('\'', "''"))?;
        } else {
            write!(f, "{}", self.label)?;
        }
        if self.is_unknown() {
            write!(f, "=U")?;
        } else {
            let value = self.value.to_string();
            write!(f, "={value}")?;
            // `1` followed by unit `.5` must not read back as `1.5`
            let dotted_unit = self.unit.as_deref().is_some_and(|u| u.starts_with('.'));
            if dotted_unit && !value.contains('.') {
                write!(f, ".")?;
            }
        }
        if let Some(unit) = &self.unit {
            write!(f, "{unit}")?;
        }

        let bound = |b: f64| if b.is_finite() { b.to_string() } else { String::new() };
        let slots = [
            self.warning.to_string(),
            self.critical.to_string(),
            bound(self.minimum),
            bound(self.maximum),
        ];
        let used = slots.iter().rposition(|s| !s.is_empty()).map_or(0, |i| i + 1);
        for slot in &slots[..used] {
            write!(f, ";{slot}")?;
        }
        Ok(())
    }
}

/// Tokens of the performance data language.
#[derive(Debug, Clone, PartialEq)]
pub enum PerfdataToken {
    End,
    /// Whitespace between fields.
    Space,
    /// `=` or `;`
    Separator,
    Number(f64),
    /// A label or a unit of measurement.
    String(String),
    Range(ThresholdRange),
}

/// The grammar slot the tokenizer expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Label,
    Equal,
    Value,
    Uom,
    Sep1,
    Warn,
    Sep2,
    Crit,
    Sep3,
    Min,
    Sep4,
    Max,
    Extra,
}

/// Position sensitive tokenizer: the state decides how the next characters are read.
///
/// Whitespace always ends a field and resets the state to `Label`. Optional slots
/// that are empty produce no token at all.
pub struct PerfdataTokenizer<'a> {
    scanner: Scanner<'a>,
    state: State,
}

impl<'a> PerfdataTokenizer<'a> {
    pub fn new(scanner: Scanner<'a>) -> Self {
        Self {
            scanner,
            state: State::Label,
        }
    }

    pub fn scanner(&self) -> &Scanner<'a> {
        &self.scanner
    }

    /// `'quoted label'` with `''` as an escaped quote, or anything up to `=` or whitespace.
    fn read_label(&mut self) -> Result<String, PerfdataError> {
        if !self.scanner.peek_is('\'') {
            let label = self.scanner.eat_while(|c| c != '=' && !is_space(c));
            return Ok(label.to_string());
        }

        let start = self.scanner.pos();
        self.scanner.advance();
        let mut label = String::new();
        loop {
            match self.scanner.advance() {
                None => return Err(self.scanner.err_unterminated_quote(start)),
                Some('\'') => {
                    if self.scanner.peek_is('\'') {
                        self.scanner.advance();
                        label.push('\'');
                    } else {
                        break;
                    }
                }
                Some(c) => label.push(c),
            }
        }
        Ok(label.trim_matches(is_space).to_string())
    }

    fn read_value(&mut self) -> Result<f64, PerfdataError> {
        if self.scanner.peek_is('U') {
            self.scanner.advance();
            return Ok(f64::NAN);
        }
        match self.scanner.scan_number() {
            Some(value) => Ok(value),
            None => Err(self.scanner.err_invalid_value()),
        }
    }

    fn read_threshold(&mut self) -> Result<Option<ThresholdRange>, PerfdataError> {
        let start = self.scanner.pos();
        if self.scanner.eat_field().is_empty() {
            return Ok(None);
        }
        let scanner = self.scanner.sub_range(start, self.scanner.pos());
        RangeParser::from_scanner(scanner).parse_range().map(Some)
    }

    fn expect_char(&mut self, expected: char, description: &str) -> Result<(), PerfdataError> {
        if !self.scanner.peek_is(expected) {
            return Err(self.scanner.err_unexpected_char(description));
        }
        self.scanner.advance();
        Ok(())
    }
}

impl Tokenize for PerfdataTokenizer<'_> {
    type Kind = PerfdataToken;

    fn next_token(&mut self) -> Result<Token<PerfdataToken>, PerfdataError> {
        loop {
            let start = self.scanner.pos();
            if self.scanner.eat_spaces() > 0 {
                self.state = State::Label;
                return Ok(Token::new(PerfdataToken::Space, start, self.scanner.pos()));
            }
            if self.scanner.is_at_end() {
                return Ok(Token::new(PerfdataToken::End, start, start));
            }

            let state = self.state;
            let kind = match state {
                State::Label => {
                    self.state = State::Equal;
                    PerfdataToken::String(self.read_label()?)
                }
                State::Equal => {
                    self.expect_char('=', "'=' after the label")?;
                    self.state = State::Value;
                    PerfdataToken::Separator
                }
                State::Value => {
                    self.state = State::Uom;
                    PerfdataToken::Number(self.read_value()?)
                }
                State::Uom => {
                    self.state = State::Sep1;
                    let unit = self.scanner.eat_field();
                    if unit.is_empty() {
                        continue;
                    }
                    PerfdataToken::String(unit.to_string())
                }
                State::Sep1 | State::Sep2 | State::Sep3 | State::Sep4 => {
                    self.expect_char(';', "';' or whitespace")?;
                    self.state = match state {
                        State::Sep1 => State::Warn,
                        State::Sep2 => State::Crit,
                        State::Sep3 => State::Min,
                        _ => State::Max,
                    };
                    PerfdataToken::Separator
                }
                State::Warn | State::Crit => {
                    self.state = if state == State::Warn {
                        State::Sep2
                    } else {
                        State::Sep3
                    };
                    match self.read_threshold()? {
                        Some(range) => PerfdataToken::Range(range),
                        None => continue,
                    }
                }
                State::Min | State::Max => {
                    self.state = if state == State::Min {
                        State::Sep4
                    } else {
                        State::Extra
                    };
                    match self.scanner.scan_number() {
                        Some(n) => PerfdataToken::Number(n),
                        None => continue,
                    }
                }
                State::Extra => return Err(self.scanner.err_trailing_data()),
            };
            log::trace!("perfdata token {:?} in state {:?} at {}", kind, state, start);
            return Ok(Token::new(kind, start, self.scanner.pos()));
        }
    }

    fn is_end(kind: &PerfdataToken) -> bool {
        matches!(kind, PerfdataToken::End)
    }
}

/// Assembles [`PerfdataRecord`]s from the tokenizer's stream.
pub struct PerfdataParser<'a> {
    lexer: Lexer<PerfdataTokenizer<'a>>,
}

impl<'a> PerfdataParser<'a> {
    pub fn new(source_text: &'a str) -> Self {
        Self::new_with_name(source_text, "perfdata")
    }

    /// `name` is shown in diagnostics.
    pub fn new_with_name(source_text: &'a str, name: &'a str) -> Self {
        let scanner = Scanner::new(name, source_text);
        Self {
            lexer: Lexer::new(PerfdataTokenizer::new(scanner)),
        }
    }

    /// Perfdata ::= [ Space ] { Field [ Space ] }
    ///
    /// Records are appended to `out` as soon as they are complete, so on error `out`
    /// keeps every field before the failing one.
    ///
    /// # Errors
    /// Returns a `PerfdataError` at the first field that does not parse.
    pub fn parse_all(&mut self, out: &mut Vec<PerfdataRecord>) -> Result<(), PerfdataError> {
        self.match_space()?;
        while !self.check_end()? {
            let record = self.parse_record()?;
            log::debug!("parsed perfdata record {:?}", record);
            out.push(record);

            if !self.match_space()? && !self.check_end()? {
                let token = self.current()?;
                return self.err_unexpected(&token, "whitespace or the end of the input");
            }
        }
        Ok(())
    }

    /// Field ::= String "=" Number [ String ] [ ";" [ Range ] [ ";" [ Range ]
    ///           [ ";" [ Number ] [ ";" [ Number ] ] ] ] ]
    fn parse_record(&mut self) -> Result<PerfdataRecord, PerfdataError> {
        let token = self.current()?;
        let label = match &token.kind {
            PerfdataToken::String(label) => label.clone(),
            _ => return self.err_unexpected(&token, "a label"),
        };
        self.lexer.advance()?;

        let token = self.current()?;
        if token.kind != PerfdataToken::Separator {
            return self.err_unexpected(&token, "'='");
        }
        self.lexer.advance()?;

        let token = self.current()?;
        let value = match token.kind {
            PerfdataToken::Number(n) => n,
            _ => return self.err_unexpected(&token, "a value"),
        };
        self.lexer.advance()?;

        let mut record = PerfdataRecord::new(label, value);
        if let PerfdataToken::String(unit) = self.current()?.kind {
            record.unit = Some(unit);
            self.lexer.advance()?;
        }

        if self.match_separator()? {
            if let Some(warning) = self.match_range()? {
                record.warning = warning;
            }
            if self.match_separator()? {
                if let Some(critical) = self.match_range()? {
                    record.critical = critical;
                }
                if self.match_separator()? {
                    if let Some(minimum) = self.match_number()? {
                        record.minimum = minimum;
                    }
                    if self.match_separator()? {
                        if let Some(maximum) = self.match_number()? {
                            record.maximum = maximum;
                        }
                    }
                }
            }
        }
        Ok(record)
    }

    // === Token Helper Methods ===

    fn current(&mut self) -> Result<Token<PerfdataToken>, PerfdataError> {
        self.lexer.current().cloned()
    }

    fn check_end(&mut self) -> Result<bool, PerfdataError> {
        Ok(self.lexer.current()?.kind == PerfdataToken::End)
    }

    fn match_token(&mut self, kind: PerfdataToken) -> Result<bool, PerfdataError> {
        if self.lexer.current()?.kind == kind {
            self.lexer.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn match_space(&mut self) -> Result<bool, PerfdataError> {
        self.match_token(PerfdataToken::Space)
    }

    fn match_separator(&mut self) -> Result<bool, PerfdataError> {
        self.match_token(PerfdataToken::Separator)
    }

    fn match_range(&mut self) -> Result<Option<ThresholdRange>, PerfdataError> {
        if let PerfdataToken::Range(range) = self.lexer.current()?.kind {
            self.lexer.advance()?;
            return Ok(Some(range));
        }
        Ok(None)
    }

    fn match_number(&mut self) -> Result<Option<f64>, PerfdataError> {
        if let PerfdataToken::Number(n) = self.lexer.current()?.kind {
            self.lexer.advance()?;
            return Ok(Some(n));
        }
        Ok(None)
    }

    fn err_unexpected<T>(
        &self,
        token: &Token<PerfdataToken>,
        expected: &str,
    ) -> Result<T, PerfdataError> {
        let scanner = self.lexer.tokenizer().scanner();
        if token.kind == PerfdataToken::End {
            Err(scanner.err_unexpected_end(token.pos_start, expected))
        } else {
            Err(scanner.err_unexpected_token(token.pos_start, token.pos_end, expected))
        }
    }
}

/// Parses every field of a performance data string into `out`.
///
/// On failure `out` still holds the records parsed before the bad field.
///
/// # Errors
/// Returns a `PerfdataError` describing the first malformed field.
pub fn parse_perfdata(text: &str, out: &mut Vec<PerfdataRecord>) -> Result<(), PerfdataError> {
    PerfdataParser::new(text).parse_all(out)
}
