// Field normalization: flattened detail records -> canonical flat records.
pub mod flatten;

pub use flatten::flatten;

use serde_json::Value;

use crate::client::RIA_SITE_URL;
use crate::config;
use crate::model::{ConfigError, FlatRecord, ReferenceTable};

/// Sentinel for fields whose source path is absent or untranslatable.
pub const PLACEHOLDER: &str = "-";

/// Transform applied to a field's raw value. Chosen once, at
/// configuration-load time, by `FieldMapping::resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTransform {
    Verbatim,
    /// The source reports mileage in thousands of kilometers.
    Mileage,
    /// Fuel name, optionally combined with the engine displacement.
    Fuel,
    /// Internal body-style id, reverse-looked-up in the reference table.
    BodyStyle,
    /// Relative link, prefixed with the public site URL.
    Url,
    /// Free text; carriage returns and newlines stripped.
    Description,
}

/// One configured output column: where it comes from in the flattened
/// record and how its value is transformed.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub source: String,
    pub output: String,
    pub transform: FieldTransform,
}

/// The ordered set of output columns for a run. Built from configuration,
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    specs: Vec<FieldSpec>,
}

impl FieldMapping {
    /// Resolve configured canonical field names into source paths and
    /// transform kinds, preserving the configured order.
    pub fn resolve(fields: &[String]) -> Result<Self, ConfigError> {
        let mut specs = Vec::with_capacity(fields.len());
        for field in fields {
            let entry = config::FIELD_TABLE
                .iter()
                .find(|(_, canonical, _)| canonical == field)
                .ok_or_else(|| ConfigError::UnknownField(field.clone()))?;
            specs.push(FieldSpec {
                source: entry.0.to_string(),
                output: entry.1.to_string(),
                transform: entry.2,
            });
        }
        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }
}

/// Normalize one raw detail record into the canonical flat record.
///
/// Every configured field is present in the result, transformed or set to
/// the placeholder; the fuel field additionally derives a `displacement`
/// column right before it.
pub fn normalize(raw: &Value, bodies: &ReferenceTable, mapping: &FieldMapping) -> FlatRecord {
    let flat = flatten(raw);
    let mut record = FlatRecord::with_capacity(mapping.specs().len() + 1);

    for spec in mapping.specs() {
        let value = flat.get(spec.source.as_str());
        match spec.transform {
            FieldTransform::Verbatim => {
                record.push(&spec.output, value.cloned().unwrap_or_else(placeholder));
            }
            FieldTransform::Mileage => {
                record.push(
                    &spec.output,
                    value.map(transform_mileage).unwrap_or_else(placeholder),
                );
            }
            FieldTransform::Fuel => {
                let (displacement, fuel) = transform_fuel(value);
                record.push("displacement", displacement);
                record.push(&spec.output, fuel);
            }
            FieldTransform::BodyStyle => {
                record.push(
                    &spec.output,
                    value
                        .map(|v| transform_body(v, bodies))
                        .unwrap_or_else(placeholder),
                );
            }
            FieldTransform::Url => {
                record.push(
                    &spec.output,
                    value.map(transform_url).unwrap_or_else(placeholder),
                );
            }
            FieldTransform::Description => {
                record.push(
                    &spec.output,
                    value.map(transform_description).unwrap_or_else(placeholder),
                );
            }
        }
    }

    record
}

fn placeholder() -> Value {
    Value::String(PLACEHOLDER.to_string())
}

fn transform_mileage(value: &Value) -> Value {
    if let Some(n) = value.as_i64() {
        Value::from(n * 1000)
    } else if let Some(f) = value.as_f64() {
        Value::from(f * 1000.0)
    } else {
        value.clone()
    }
}

/// Split a combined "fuel, displacement" string. Returns
/// `(displacement, fuel)`, either of which may be the placeholder.
fn transform_fuel(value: Option<&Value>) -> (Value, Value) {
    let Some(raw) = value.and_then(Value::as_str) else {
        return (
            placeholder(),
            value.cloned().unwrap_or_else(placeholder),
        );
    };

    if raw.chars().any(|c| c.is_ascii_digit()) {
        if let Some((name, rest)) = raw.split_once(',') {
            let displacement = rest.split_whitespace().next().unwrap_or(PLACEHOLDER);
            (Value::from(displacement), Value::from(name))
        } else {
            // No fuel name at all, just the displacement.
            let displacement = raw.split_whitespace().next().unwrap_or(PLACEHOLDER);
            (Value::from(displacement), placeholder())
        }
    } else {
        (placeholder(), Value::from(raw))
    }
}

fn transform_body(value: &Value, bodies: &ReferenceTable) -> Value {
    let id = value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()));
    match id.and_then(|id| bodies.name_of(id)) {
        Some(name) => Value::from(name),
        None => placeholder(),
    }
}

fn transform_url(value: &Value) -> Value {
    match value.as_str() {
        Some(path) => Value::from(format!("{RIA_SITE_URL}{path}")),
        None => value.clone(),
    }
}

fn transform_description(value: &Value) -> Value {
    match value.as_str() {
        Some(text) => Value::from(text.replace(['\r', '\n'], "")),
        None => value.clone(),
    }
}
