use std::fmt;

/// Nagios-style service state derived from a metric and its thresholds.
///
/// Ordered by severity, `Unknown` being the least severe.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckStatus {
    Unknown,
    Ok,
    Warning,
    Critical,
}

impl CheckStatus {
    /// The plugin exit code for this state.
    pub fn exit_code(self) -> i32 {
        match self {
            CheckStatus::Ok => 0,
            CheckStatus::Warning => 1,
            CheckStatus::Critical => 2,
            CheckStatus::Unknown => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warning => "WARNING",
            CheckStatus::Critical => "CRITICAL",
            CheckStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(CheckStatus::Unknown < CheckStatus::Ok);
        assert!(CheckStatus::Ok < CheckStatus::Warning);
        assert_eq!(
            std::cmp::max(CheckStatus::Warning, CheckStatus::Critical),
            CheckStatus::Critical
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CheckStatus::Ok.exit_code(), 0);
        assert_eq!(CheckStatus::Warning.exit_code(), 1);
        assert_eq!(CheckStatus::Critical.exit_code(), 2);
        assert_eq!(CheckStatus::Unknown.exit_code(), 3);
        assert_eq!(CheckStatus::Critical.to_string(), "CRITICAL");
    }
}
