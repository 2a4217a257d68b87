//! Parameter schemas: declared widgets, defaults and validation.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use sarovar_core::error::{Result, SarovarError};
use sarovar_core::models::{ParamValue, ParameterSet, RawParameters, RegionTag};

use crate::terrain::Weights;

/// Kind, default and bounds of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    Float { default: f64, min: f64, max: f64, step: f64 },
    Int { default: i64, min: i64, max: i64 },
    Bool { default: bool },
    Choice { options: &'static [&'static str], default: &'static str },
    Date { default: NaiveDate },
}

impl ParamKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamKind::Float { .. } => "float",
            ParamKind::Int { .. } => "int",
            ParamKind::Bool { .. } => "bool",
            ParamKind::Choice { .. } => "choice",
            ParamKind::Date { .. } => "date",
        }
    }

    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamKind::Float { default, .. } => ParamValue::Float(*default),
            ParamKind::Int { default, .. } => ParamValue::Int(*default),
            ParamKind::Bool { default } => ParamValue::Bool(*default),
            ParamKind::Choice { default, .. } => ParamValue::Text(default.to_string()),
            ParamKind::Date { default } => ParamValue::Date(*default),
        }
    }
}

/// A declared parameter, one per UI widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDef {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: ParamKind,
}

impl ParamDef {
    pub fn float(
        name: &'static str,
        label: &'static str,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    ) -> Self {
        Self { name, label, kind: ParamKind::Float { default, min, max, step } }
    }

    pub fn int(name: &'static str, label: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self { name, label, kind: ParamKind::Int { default, min, max } }
    }

    pub fn flag(name: &'static str, label: &'static str, default: bool) -> Self {
        Self { name, label, kind: ParamKind::Bool { default } }
    }

    pub fn choice(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self { name, label, kind: ParamKind::Choice { options, default } }
    }

    pub fn date(name: &'static str, label: &'static str, default: NaiveDate) -> Self {
        Self { name, label, kind: ParamKind::Date { default } }
    }

    fn invalid(&self, reason: impl Into<String>) -> SarovarError {
        SarovarError::validation(self.name, reason)
    }

    /// Convert a raw widget value into a checked [`ParamValue`].
    ///
    /// Strings are accepted for every kind since command-line and form
    /// input arrive untyped.
    pub fn coerce(&self, raw: &Value) -> Result<ParamValue> {
        match &self.kind {
            ParamKind::Float { min, max, .. } => {
                let value = match raw {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }
                .filter(|v| v.is_finite())
                .ok_or_else(|| self.invalid(format!("expected a number, got {}", raw)))?;
                if value < *min || value > *max {
                    return Err(self.invalid(format!("{} is outside [{}, {}]", value, min, max)));
                }
                Ok(ParamValue::Float(value))
            }
            ParamKind::Int { min, max, .. } => {
                let value = match raw {
                    Value::Number(n) => n
                        .as_i64()
                        .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| self.invalid(format!("expected an integer, got {}", raw)))?;
                if value < *min || value > *max {
                    return Err(self.invalid(format!("{} is outside [{}, {}]", value, min, max)));
                }
                Ok(ParamValue::Int(value))
            }
            ParamKind::Bool { .. } => {
                let value = match raw {
                    Value::Bool(b) => Some(*b),
                    Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                        "true" | "yes" | "on" | "1" => Some(true),
                        "false" | "no" | "off" | "0" => Some(false),
                        _ => None,
                    },
                    _ => None,
                }
                .ok_or_else(|| self.invalid(format!("expected true or false, got {}", raw)))?;
                Ok(ParamValue::Bool(value))
            }
            ParamKind::Choice { options, .. } => {
                let text = raw.as_str().map(str::trim).unwrap_or_default();
                options
                    .iter()
                    .find(|o| o.eq_ignore_ascii_case(text))
                    .map(|o| ParamValue::Text(o.to_string()))
                    .ok_or_else(|| {
                        self.invalid(format!("expected one of {}, got {}", options.join(", "), raw))
                    })
            }
            ParamKind::Date { .. } => raw
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                .map(ParamValue::Date)
                .ok_or_else(|| self.invalid(format!("expected a YYYY-MM-DD date, got {}", raw))),
        }
    }
}

/// Weights that are normalized together to sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightGroup {
    pub names: [&'static str; 5],
    /// Used when every weight is zero.
    pub fallback: Weights,
}

impl WeightGroup {
    fn normalize(&self, params: &mut ParameterSet) {
        let values = self.names.map(|name| match params.get(name) {
            Some(ParamValue::Float(v)) => *v,
            Some(ParamValue::Int(v)) => *v as f64,
            _ => 0.0,
        });
        let total: f64 = values.iter().sum();

        let normalized = if total > 0.0 {
            values.map(|v| v / total)
        } else {
            tracing::debug!("All weights are zero, using profile defaults");
            self.fallback.to_array()
        };

        for (name, value) in self.names.iter().zip(normalized) {
            params.insert(*name, ParamValue::Float(value));
        }
    }
}

/// What a schema may depend on besides the module itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaContext {
    pub region: Option<RegionTag>,
    pub today: NaiveDate,
}

impl SchemaContext {
    pub fn new(region: Option<RegionTag>, today: NaiveDate) -> Self {
        Self { region, today }
    }

    pub fn for_today(region: Option<RegionTag>) -> Self {
        Self::new(region, chrono::Local::now().date_naive())
    }
}

/// The full parameter declaration of a module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSchema {
    pub params: Vec<ParamDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_group: Option<WeightGroup>,
    /// Context shown above the widgets, e.g. the detected terrain zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ParameterSchema {
    pub fn new(params: Vec<ParamDef>) -> Self {
        Self { params, weight_group: None, note: None }
    }

    pub fn with_weights(mut self, group: WeightGroup) -> Self {
        self.weight_group = Some(group);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Validate a widget snapshot into a complete parameter set.
    ///
    /// Missing or null values take their defaults. Unknown names are
    /// rejected. Cross-field relations (such as date order) are not
    /// checked here.
    pub fn validate(&self, raw: &RawParameters) -> Result<ParameterSet> {
        if let Some(unknown) = raw.names().find(|name| self.param(name).is_none()) {
            return Err(SarovarError::validation(unknown, "unknown parameter"));
        }

        let mut params = ParameterSet::new();
        for def in &self.params {
            let value = match raw.get(def.name) {
                None | Some(Value::Null) => def.kind.default_value(),
                Some(value) => def.coerce(value)?,
            };
            params.insert(def.name, value);
        }

        if let Some(group) = &self.weight_group {
            group.normalize(&mut params);
        }
        Ok(params)
    }

    /// Parameters as they are before the user touches any widget.
    pub fn defaults(&self) -> ParameterSet {
        let mut params: ParameterSet =
            self.params.iter().map(|def| (def.name.to_string(), def.kind.default_value())).collect();
        if let Some(group) = &self.weight_group {
            group.normalize(&mut params);
        }
        params
    }
}
