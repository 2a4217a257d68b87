//! Parameter values exchanged between the UI snapshot, the schema and the modules.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SarovarError};

/// A single validated parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl ParamValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "number",
            ParamValue::Date(_) => "date",
            ParamValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

/// Validated parameters handed to an analysis module.
///
/// Only produced by a module's parameter schema, so every getter failing
/// indicates a mismatch between the schema and the module body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, ParamValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&ParamValue> {
        self.0.get(name).ok_or_else(|| SarovarError::validation(name, "parameter is missing"))
    }

    fn mismatch(name: &str, expected: &str, found: &ParamValue) -> SarovarError {
        SarovarError::validation(name, format!("expected {}, found {}", expected, found.kind_name()))
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(Self::mismatch(name, "number", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(name, "integer", other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            ParamValue::Text(v) => Ok(v),
            other => Err(Self::mismatch(name, "text", other)),
        }
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate> {
        match self.require(name)? {
            ParamValue::Date(v) => Ok(*v),
            other => Err(Self::mismatch(name, "date", other)),
        }
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(Self::mismatch(name, "bool", other)),
        }
    }
}

impl FromIterator<(String, ParamValue)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Unvalidated widget values captured from the current UI snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawParameters(BTreeMap<String, serde_json::Value>);

impl RawParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name=value` pairs as typed on a command line.
    ///
    /// Values that are valid JSON keep their JSON type, anything else is
    /// taken as a plain string.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut raw = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                SarovarError::validation(pair, "expected name=value".to_string())
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(SarovarError::validation(pair, "parameter name is empty"));
            }
            let value = value.trim();
            let value = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
            raw.insert(name, value);
        }
        Ok(raw)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut params = ParameterSet::new();
        params.insert("threshold", ParamValue::Float(1.25));
        params.insert("max_cloud_percent", ParamValue::Int(20));
        params.insert("orbit", ParamValue::Text("any".to_string()));

        assert_eq!(params.float("threshold").unwrap(), 1.25);
        assert_eq!(params.float("max_cloud_percent").unwrap(), 20.0);
        assert_eq!(params.int("max_cloud_percent").unwrap(), 20);
        assert_eq!(params.text("orbit").unwrap(), "any");
        assert!(params.date("orbit").is_err());
        assert!(matches!(params.flag("missing"), Err(SarovarError::Validation { .. })));
    }

    #[test]
    fn test_param_value_untagged() {
        let date: ParamValue = serde_json::from_str("\"2023-06-01\"").unwrap();
        assert_eq!(date, ParamValue::Date(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()));

        let text: ParamValue = serde_json::from_str("\"chirps\"").unwrap();
        assert_eq!(text, ParamValue::Text("chirps".to_string()));

        let int: ParamValue = serde_json::from_str("5").unwrap();
        assert_eq!(int, ParamValue::Int(5));
    }

    #[test]
    fn test_raw_from_pairs() {
        let raw =
            RawParameters::from_pairs(["threshold=1.3", "orbit=ascending", "timelapse=true"])
                .unwrap();
        assert_eq!(raw.get("threshold"), Some(&serde_json::json!(1.3)));
        assert_eq!(raw.get("orbit"), Some(&serde_json::json!("ascending")));
        assert_eq!(raw.get("timelapse"), Some(&serde_json::json!(true)));

        assert!(RawParameters::from_pairs(["novalue"]).is_err());
        assert!(RawParameters::from_pairs(["=1"]).is_err());
    }
}
