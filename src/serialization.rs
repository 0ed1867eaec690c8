use crate::perfdata::PerfdataRecord;
use crate::range::ThresholdRange;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

fn insert_finite(map: &mut BTreeMap<String, Value>, key: &str, n: f64) {
    if n.is_finite() {
        map.insert(key.to_string(), Value::Number(n));
    }
}

/// Open bounds are left out.
pub(crate) fn range_to_value(range: &ThresholdRange) -> Value {
    let mut map = BTreeMap::new();
    insert_finite(&mut map, "minimum", range.minimum);
    insert_finite(&mut map, "maximum", range.maximum);
    map.insert("inside".to_string(), Value::Boolean(range.inside));
    Value::Object(map)
}

/// Only the label is always present: unknown values, missing units, empty ranges
/// and open bounds are omitted.
pub(crate) fn to_value(record: &PerfdataRecord) -> Value {
    let mut map = BTreeMap::new();
    map.insert("label".to_string(), Value::String(record.label.clone()));
    if !record.value.is_nan() {
        map.insert("value".to_string(), Value::Number(record.value));
    }
    if let Some(unit) = record.unit.as_ref().filter(|u| !u.is_empty()) {
        map.insert("uom".to_string(), Value::String(unit.clone()));
    }
    if !record.warning.is_empty() {
        map.insert("warning".to_string(), range_to_value(&record.warning));
    }
    if !record.critical.is_empty() {
        map.insert("critical".to_string(), range_to_value(&record.critical));
    }
    insert_finite(&mut map, "minimum", record.minimum);
    insert_finite(&mut map, "maximum", record.maximum);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perfdata::parse_perfdata;

    fn first_value(input: &str) -> serde_json::Value {
        let mut out = Vec::new();
        parse_perfdata(input, &mut out).unwrap();
        serde_json::to_value(to_value(&out[0])).unwrap()
    }

    #[test]
    fn test_full_record_to_json() {
        let json = first_value("'load avg'=1.5;2;@3:;0;10");
        assert_eq!(
            json,
            serde_json::json!({
                "label": "load avg",
                "value": 1.5,
                "warning": { "minimum": 0.0, "maximum": 2.0, "inside": false },
                "critical": { "minimum": 3.0, "inside": true },
                "minimum": 0.0,
                "maximum": 10.0,
            })
        );
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        assert_eq!(first_value("x=U"), serde_json::json!({ "label": "x" }));
        assert_eq!(
            first_value("temp=20C;~:"),
            serde_json::json!({ "label": "temp", "value": 20.0, "uom": "C" })
        );
    }

    #[test]
    fn test_range_bounds() {
        let range = ThresholdRange::new(f64::NEG_INFINITY, 5.0, false);
        let json = serde_json::to_value(range_to_value(&range)).unwrap();
        assert_eq!(json, serde_json::json!({ "maximum": 5.0, "inside": false }));
    }
}
