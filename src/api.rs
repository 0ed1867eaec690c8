use crate::error::PerfdataError;
use crate::perfdata::{PerfdataParser, PerfdataRecord};
use crate::serialization::{to_value, Value};
use crate::status::CheckStatus;
use serde::{Serialize, Serializer};

/// The records of one successfully parsed performance data string.
///
/// Serializes to a JSON array using the omission rules of
/// [`serialization`](crate::serialization): no NaN values, no open bounds and no
/// empty thresholds in the output.
#[derive(Debug, Clone, Default)]
pub struct PerfdataReport {
    pub records: Vec<PerfdataRecord>,
}

impl Serialize for PerfdataReport {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.to_value();
        value.serialize(serializer)
    }
}

impl PerfdataReport {
    /// Converts the records into a generic, serializable `Value`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(self.records.iter().map(to_value).collect())
    }

    /// Serializes the records into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the records into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }

    /// The most severe status over all records, `Ok` when there are none.
    pub fn worst_status(&self) -> CheckStatus {
        self.records
            .iter()
            .map(PerfdataRecord::status)
            .max()
            .unwrap_or(CheckStatus::Ok)
    }

    pub fn get(&self, label: &str) -> Option<&PerfdataRecord> {
        self.records.iter().find(|r| r.label == label)
    }
}

/// Parses a performance data string, naming it `source_name` in diagnostics.
///
/// This is the all-or-nothing entry point: unlike
/// [`parse_perfdata`](crate::perfdata::parse_perfdata), partial results are dropped
/// on error.
///
/// # Errors
///
/// Returns a `PerfdataError` if any field is malformed.
pub fn analyze(source: &str, source_name: &str) -> Result<PerfdataReport, PerfdataError> {
    let mut records = Vec::new();
    PerfdataParser::new_with_name(source, source_name).parse_all(&mut records)?;
    log::debug!("{}: parsed {} perfdata records", source_name, records.len());
    Ok(PerfdataReport { records })
}
