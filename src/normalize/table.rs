// src/normalize/table.rs

// --- Imports ---
use crate::extractors::price::{HEADLINE_PRICE, PRICE_PER_M2, PROPERTY_PRICE};
use crate::extractors::{ColumnKind, FieldValue};
use crate::normalize::assembler::{feature_columns, NormalizedListing};
use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{ArrowError, Field as ArrowField, Schema};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Column type chosen for a pass-through key from the values the batch holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassthroughKind {
    Text,
    Boolean,
    Integer,
    Float,
    TextList,
    /// Mixed or nested values, stored as JSON text.
    Json,
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a Value>) -> PassthroughKind {
    let mut kind: Option<PassthroughKind> = None;
    for value in values {
        let this = match value {
            Value::String(_) => PassthroughKind::Text,
            Value::Bool(_) => PassthroughKind::Boolean,
            Value::Number(n) if n.is_i64() => PassthroughKind::Integer,
            Value::Number(_) => PassthroughKind::Float,
            Value::Array(items) if items.iter().all(Value::is_string) => PassthroughKind::TextList,
            _ => PassthroughKind::Json,
        };
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(PassthroughKind::Integer), PassthroughKind::Float)
            | (Some(PassthroughKind::Float), PassthroughKind::Integer) => PassthroughKind::Float,
            _ => PassthroughKind::Json,
        });
    }
    kind.unwrap_or(PassthroughKind::Text)
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn passthrough_column(records: &[NormalizedListing], key: &str) -> ArrayRef {
    let values: Vec<Option<&Value>> = records
        .iter()
        .map(|r| r.passthrough.get(key).filter(|v| !v.is_null()))
        .collect();

    match infer_kind(values.iter().flatten().copied()) {
        PassthroughKind::Text => Arc::new(StringArray::from(
            values.iter().map(|v| v.and_then(Value::as_str)).collect::<Vec<_>>(),
        )),
        PassthroughKind::Boolean => Arc::new(BooleanArray::from(
            values.iter().map(|v| v.and_then(Value::as_bool)).collect::<Vec<_>>(),
        )),
        PassthroughKind::Integer => Arc::new(Int64Array::from(
            values.iter().map(|v| v.and_then(Value::as_i64)).collect::<Vec<_>>(),
        )),
        PassthroughKind::Float => Arc::new(Float64Array::from(
            values.iter().map(|v| v.and_then(Value::as_f64)).collect::<Vec<_>>(),
        )),
        PassthroughKind::TextList => {
            let mut builder = ListBuilder::new(StringBuilder::new());
            for value in &values {
                match value {
                    Some(Value::Array(items)) => {
                        for item in items {
                            builder.values().append_option(item.as_str());
                        }
                        builder.append(true);
                    }
                    _ => builder.append(false),
                }
            }
            Arc::new(builder.finish())
        }
        PassthroughKind::Json => Arc::new(StringArray::from(
            values.iter().map(|v| v.map(json_text)).collect::<Vec<_>>(),
        )),
    }
}

fn feature_column(records: &[NormalizedListing], name: &str, kind: ColumnKind) -> ArrayRef {
    let cells = records.iter().map(|r| r.feature(name));
    match kind {
        ColumnKind::Integer => Arc::new(Int64Array::from(
            cells.map(|v| v.and_then(FieldValue::as_integer)).collect::<Vec<_>>(),
        )),
        ColumnKind::Text => Arc::new(StringArray::from(
            cells.map(|v| v.and_then(FieldValue::as_text)).collect::<Vec<_>>(),
        )),
        ColumnKind::Flag => Arc::new(BooleanArray::from(
            cells.map(|v| v.and_then(FieldValue::as_flag)).collect::<Vec<_>>(),
        )),
    }
}

/// Lays a normalized batch out as an Arrow record batch.
///
/// Pass-through columns are the union of keys across the batch; rows that
/// lack a key get null. Every column is nullable so later batches with a
/// different pass-through set can be merged into the same dataset.
pub fn to_record_batch(records: &[NormalizedListing]) -> Result<RecordBatch, ArrowError> {
    let mut columns: Vec<(String, ArrayRef)> = Vec::new();

    let keys: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.passthrough.keys().map(String::as_str))
        .collect();
    for key in keys {
        columns.push((key.to_string(), passthrough_column(records, key)));
    }

    columns.push((
        HEADLINE_PRICE.to_string(),
        Arc::new(Float64Array::from(records.iter().map(|r| r.prices.price).collect::<Vec<_>>())) as ArrayRef,
    ));
    columns.push((
        PROPERTY_PRICE.to_string(),
        Arc::new(Int64Array::from(records.iter().map(|r| r.prices.precio_inmueble).collect::<Vec<_>>())) as ArrayRef,
    ));
    columns.push((
        PRICE_PER_M2.to_string(),
        Arc::new(Float64Array::from(records.iter().map(|r| r.prices.precio_m2).collect::<Vec<_>>())) as ArrayRef,
    ));

    for (name, kind) in feature_columns() {
        columns.push((name.to_string(), feature_column(records, name, kind)));
    }

    let fields: Vec<ArrowField> = columns
        .iter()
        .map(|(name, array)| ArrowField::new(name.as_str(), array.data_type().clone(), true))
        .collect();
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, array)| array).collect();

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
}
