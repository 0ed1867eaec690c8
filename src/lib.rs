pub mod api;
pub mod error;
pub mod lexer;
pub mod perfdata;
pub mod range;
pub mod serialization;
pub mod status;

pub use api::{analyze, PerfdataReport};
pub use error::{ParseError, PerfdataError};
pub use perfdata::{parse_perfdata, PerfdataParser, PerfdataRecord};
pub use range::{parse_range, ThresholdRange};
pub use status::CheckStatus;
