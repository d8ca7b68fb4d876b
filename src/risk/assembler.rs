use crate::error::{AppError, Result};
use crate::risk::catalog::FeatureCatalog;
use crate::risk::models::FeatureRow;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Builds catalog-aligned feature rows from raw request payloads.
pub struct FeatureAssembler;

impl FeatureAssembler {
    /// Assemble one feature row from diagnosis codes and raw measurements.
    ///
    /// The result always has exactly the catalog's column set in the
    /// catalog's order, regardless of which fields the request supplied;
    /// every downstream model invocation depends on that alignment.
    ///
    /// Measurements absent from the payload, or explicitly null, become the
    /// NaN missing marker, never a coerced zero. Diagnosis codes that match
    /// no catalog feature are silently ignored. Pure: identical inputs
    /// produce identical rows.
    pub fn assemble(
        icd_codes: &[String],
        measurements: &serde_json::Map<String, Value>,
        catalog: &FeatureCatalog,
    ) -> Result<FeatureRow> {
        let codes: HashSet<&str> = icd_codes.iter().map(String::as_str).collect();

        let mut values = BTreeMap::new();
        for name in catalog.columns() {
            let value = match FeatureCatalog::diagnosis_code(name) {
                Some(code) => {
                    if codes.contains(code) {
                        1.0
                    } else {
                        0.0
                    }
                }
                None => match measurements.get(name) {
                    None | Some(Value::Null) => f64::NAN,
                    Some(raw) => coerce_numeric(name, raw)?,
                },
            };
            values.insert(name.clone(), value);
        }

        Ok(FeatureRow::new(values))
    }
}

/// Coerce a JSON measurement value to f64. Numbers pass through, numeric
/// strings parse, booleans map to 0/1; anything else names the offending
/// field in the error.
fn coerce_numeric(field: &str, value: &Value) -> Result<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    parsed.ok_or_else(|| AppError::TypeCoercion {
        field: field.to_string(),
        value: value.to_string(),
    })
}
