// src/normalize/assembler.rs

// --- Imports ---
use crate::extractors::price::{HEADLINE_PRICE, PRICE_PER_M2, PROPERTY_PRICE};
use crate::extractors::rules::find_field;
use crate::extractors::{
    entries_from_raw, extract_basic_features, extract_energy_certificate, extract_info_features,
    normalize_prices, ColumnKind, Field, FieldValue, Prices, BASIC_FEATURE_RULES, ENERGY_COLUMNS,
    INFO_FEATURE_RULES,
};
use crate::idealista::models::RawListing;
use crate::utils::error::ValueExtractionError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Price columns, named as they appear after renaming.
pub const PRICE_COLUMNS: [&str; 3] = [HEADLINE_PRICE, PROPERTY_PRICE, PRICE_PER_M2];

// --- Data Structures ---

/// A typed output row. Built once per raw row and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedListing {
    /// Columns the pipeline does not interpret (title, reference, location, ...).
    pub passthrough: BTreeMap<String, Value>,
    /// Extracted columns, in `feature_columns()` order.
    pub features: Vec<Field>,
    pub prices: Prices,
}

impl NormalizedListing {
    pub fn feature(&self, name: &str) -> Option<&FieldValue> {
        find_field(&self.features, name)
    }
}

/// A raw row whose mandatory price could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub index: usize,
    pub reference: Option<String>,
    pub error: ValueExtractionError,
}

/// Result of assembling a batch: good rows in input order plus the rejects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub records: Vec<NormalizedListing>,
    pub rejected: Vec<RejectedRow>,
}

/// Every extracted column with its type, in output order.
pub fn feature_columns() -> Vec<(&'static str, ColumnKind)> {
    INFO_FEATURE_RULES
        .iter()
        .map(|rule| (rule.field, rule.kind()))
        .chain(ENERGY_COLUMNS.iter().map(|name| (*name, ColumnKind::Text)))
        .chain(BASIC_FEATURE_RULES.iter().map(|rule| (rule.field, rule.kind())))
        .collect()
}

fn is_reserved(column: &str) -> bool {
    PRICE_COLUMNS.contains(&column) || feature_columns().iter().any(|(name, _)| *name == column)
}

/// Runs the three field extractors and the price normalizer over one row.
///
/// The composite columns are consumed; the page price labels come out as
/// `precio_inmueble` / `precio_m2`.
pub fn normalize_listing(raw: &RawListing) -> Result<NormalizedListing, ValueExtractionError> {
    let mut features = extract_info_features(raw.info_features.as_deref().unwrap_or(&[]));

    let entries = entries_from_raw(raw.certificado_energetico.as_deref().unwrap_or(&[]));
    features.extend(extract_energy_certificate(&entries));

    features.extend(extract_basic_features(raw.caracteristicas_basicas.as_deref().unwrap_or(&[])));

    let prices = normalize_prices(
        raw.precio_inmueble.as_deref(),
        raw.price.as_ref(),
        raw.precio_m2.as_deref(),
    )?;

    let mut passthrough = BTreeMap::new();
    for (key, value) in &raw.extra {
        if is_reserved(key) {
            tracing::warn!("Dropping pass-through column '{}': it clashes with an extracted column", key);
            continue;
        }
        passthrough.insert(key.clone(), value.clone());
    }

    tracing::trace!(
        "Listing {:?}: {} of {} extracted fields absent",
        raw.reference(),
        features.iter().filter(|f| f.value.is_absent()).count(),
        features.len()
    );
    Ok(NormalizedListing { passthrough, features, prices })
}

/// Normalizes a whole batch. A price failure rejects only its own row.
pub fn normalize_batch(raws: &[RawListing]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, raw) in raws.iter().enumerate() {
        match normalize_listing(raw) {
            Ok(record) => batch.records.push(record),
            Err(error) => {
                tracing::warn!("Rejecting row {} ({:?}): {}", index, raw.reference(), error);
                batch.rejected.push(RejectedRow {
                    index,
                    reference: raw.reference().map(str::to_string),
                    error,
                });
            }
        }
    }

    tracing::info!(
        "Normalized {} of {} listings ({} rejected)",
        batch.records.len(),
        raws.len(),
        batch.rejected.len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_raw() -> RawListing {
        serde_json::from_value(json!({
            "title": "Piso en venta en Calle Mayor",
            "referencia_anuncio": "98765",
            "price": "150.000",
            "ubicacion": ["Calle Mayor", "Madrid"],
            "info_features": ["90 m²", "3 hab.", "Planta 2 exterior sin ascensor"],
            "certificado_energetico": [{"Consumo:": ["A", "icon-a"]}, {"Otro:": ["X", "Y"]}],
            "caracteristicas_basicas": ["90 m² construidos", "2 baños", "Terraza"],
            "Precio del inmueble:": "150.000 €",
            "Precio por m²:": "1.666,67 €/m²"
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_a_complete_row() {
        let record = normalize_listing(&sample_raw()).unwrap();

        assert_eq!(record.prices, Prices { precio_inmueble: 150000, price: 150000.0, precio_m2: 1666.67 });
        assert_eq!(record.feature("superficie_m2"), Some(&FieldValue::Integer(Some(90))));
        assert_eq!(record.feature("ascensor"), Some(&FieldValue::Flag(Some(false))));
        assert_eq!(record.feature("consumo_energetico_valor"), Some(&FieldValue::Text(Some("A".into()))));
        assert_eq!(record.feature("emisiones_valor"), Some(&FieldValue::Text(None)));
        assert_eq!(record.feature("caracteristicas_basicas_banos"), Some(&FieldValue::Integer(Some(2))));
        assert_eq!(record.feature("terraza"), Some(&FieldValue::Flag(Some(true))));

        let keys: Vec<&str> = record.passthrough.keys().map(String::as_str).collect();
        assert_eq!(keys, ["referencia_anuncio", "title", "ubicacion"]);
    }

    #[test]
    fn every_row_carries_the_full_column_set() {
        let bare = RawListing {
            precio_inmueble: Some("80.000 €".into()),
            precio_m2: Some("1.000 €/m²".into()),
            price: Some(json!(80)),
            ..Default::default()
        };
        let full = normalize_listing(&sample_raw()).unwrap();
        let bare = normalize_listing(&bare).unwrap();

        let names = |r: &NormalizedListing| r.features.iter().map(|f| f.name).collect::<Vec<_>>();
        let expected: Vec<&str> = feature_columns().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names(&full), expected);
        assert_eq!(names(&bare), expected);
        assert_eq!(expected.len(), 5 + 4 + 17);
        assert_eq!(bare.feature("habitaciones"), Some(&FieldValue::Integer(None)));
        assert_eq!(bare.feature("garaje"), Some(&FieldValue::Flag(Some(false))));
    }

    #[test]
    fn price_failure_rejects_only_that_row() {
        let mut broken = sample_raw();
        broken.precio_inmueble = Some("A consultar".into());
        let raws = vec![sample_raw(), broken, sample_raw()];

        let batch = normalize_batch(&raws);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        let rejected = &batch.rejected[0];
        assert_eq!(rejected.index, 1);
        assert_eq!(rejected.reference.as_deref(), Some("98765"));
        assert_eq!(rejected.error.field, "precio_inmueble");
        assert_eq!(rejected.error.raw, "A consultar");
    }

    #[test]
    fn missing_price_is_an_error_not_absent() {
        let mut raw = sample_raw();
        raw.precio_m2 = None;
        let err = normalize_listing(&raw).unwrap_err();
        assert_eq!(err.field, "precio_m2");
    }

    #[test]
    fn clashing_passthrough_keys_are_dropped() {
        let mut raw = sample_raw();
        raw.extra.insert("garaje".into(), json!("sí"));
        raw.extra.insert("precio_m2".into(), json!("x"));
        let record = normalize_listing(&raw).unwrap();
        assert!(!record.passthrough.contains_key("garaje"));
        assert!(!record.passthrough.contains_key("precio_m2"));
        assert_eq!(record.feature("garaje"), Some(&FieldValue::Flag(Some(false))));
    }

    #[test]
    fn assembling_twice_gives_identical_output() {
        let raws = vec![sample_raw(), RawListing::default()];
        assert_eq!(normalize_batch(&raws), normalize_batch(&raws));
    }
}
