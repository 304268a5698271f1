use serde_json::Value;
use tracing::warn;

use crate::drivers::types::DriverRecord;
use crate::error::{FleetError, Result};

/// A document from an export that could not be turned into a driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportFailure {
    /// 1-based position in the export.
    pub position: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct DriverImport {
    pub drivers: Vec<DriverRecord>,
    pub failures: Vec<ImportFailure>,
}

/// Parse a driver export.
///
/// Accepts a JSON array of documents, a single document with an `id`, or a
/// collection export keyed by document id (`{"drv-1": {...}}`), in which
/// case the key fills in a missing `id`. Only an unreadable file fails the
/// whole export; a bad document is reported and the rest still load.
pub fn parse_driver_documents(input: &str) -> Result<DriverImport> {
    let value: Value = serde_json::from_str(input)?;

    let documents = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("id") => vec![Value::Object(map)],
        Value::Object(map) => map
            .into_iter()
            .map(|(key, mut doc)| {
                if let Value::Object(fields) = &mut doc {
                    fields.entry("id").or_insert(Value::String(key));
                }
                doc
            })
            .collect(),
        other => {
            return Err(FleetError::Other(anyhow::anyhow!(
                "expected an array or object of driver documents, got {}",
                type_name(&other)
            )))
        }
    };

    let mut import = DriverImport::default();
    for (idx, doc) in documents.into_iter().enumerate() {
        let id = doc.get("id").and_then(Value::as_str).map(str::to_string);
        match parse_document(doc) {
            Ok(driver) => import.drivers.push(driver),
            Err(reason) => {
                warn!("Skipping driver document #{}: {}", idx + 1, reason);
                import.failures.push(ImportFailure {
                    position: idx + 1,
                    id,
                    reason,
                });
            }
        }
    }
    Ok(import)
}

fn parse_document(doc: Value) -> std::result::Result<DriverRecord, String> {
    if !doc.is_object() {
        return Err(format!("expected an object, got {}", type_name(&doc)));
    }
    let driver: DriverRecord = serde_json::from_value(doc).map_err(|e| e.to_string())?;
    if driver.id.trim().is_empty() {
        return Err("document has no id".to_string());
    }
    Ok(driver)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
