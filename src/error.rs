use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum PerfdataError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum ParseError {
    #[error("Unexpected token")]
    #[diagnostic(
        code(perfdata::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}, but found this")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unexpected end of input")]
    #[diagnostic(
        code(perfdata::unexpected_end),
        help("The performance data ended before the field was complete.")
    )]
    UnexpectedEnd {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected} here")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unexpected character")]
    #[diagnostic(
        code(perfdata::unexpected_char),
        help("Fields look like label=value[uom][;warn[;crit[;min[;max]]]].")
    )]
    UnexpectedChar {
        #[source_code]
        src: NamedSource<String>,
        #[label("Expected {expected}")]
        span: SourceSpan,
        expected: String,
    },

    #[error("Unterminated quoted label")]
    #[diagnostic(
        code(perfdata::unterminated_quote),
        help("Close the label with a single quote. A literal quote is written as ''.")
    )]
    UnterminatedQuote {
        #[source_code]
        src: NamedSource<String>,
        #[label("Label starts here")]
        span: SourceSpan,
    },

    #[error("Invalid value")]
    #[diagnostic(
        code(perfdata::invalid_value),
        help("The value must be a decimal number or the literal U.")
    )]
    InvalidValue {
        #[source_code]
        src: NamedSource<String>,
        #[label("Not a number")]
        span: SourceSpan,
    },

    #[error("Invalid threshold range: {reason}")]
    #[diagnostic(
        code(perfdata::invalid_range),
        help("Ranges are written n, n:, ~:n or n:m, optionally prefixed with @.")
    )]
    InvalidRange {
        #[source_code]
        src: NamedSource<String>,
        #[label("{reason}")]
        span: SourceSpan,
        reason: String,
    },

    #[error("Unexpected trailing data")]
    #[diagnostic(
        code(perfdata::trailing_data),
        help("A field holds at most value, warn, crit, min and max.")
    )]
    TrailingData {
        #[source_code]
        src: NamedSource<String>,
        #[label("Nothing may follow the max slot")]
        span: SourceSpan,
    },
}
