// src/extractors/energy.rs

// --- Imports ---
use crate::extractors::rules::{Field, FieldValue};
use crate::idealista::models::CertificateItem;
use serde_json::Value;

pub const CONSUMPTION_VALUE: &str = "consumo_energetico_valor";
pub const CONSUMPTION_ICON: &str = "consumo_energetico_icono";
pub const EMISSION_VALUE: &str = "emisiones_valor";
pub const EMISSION_ICON: &str = "emisiones_icono";

/// Output columns, in output order.
pub const ENERGY_COLUMNS: [&str; 4] = [CONSUMPTION_VALUE, CONSUMPTION_ICON, EMISSION_VALUE, EMISSION_ICON];

// --- Data Structures ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyLabel {
    Consumption,
    Emission,
}

impl EnergyLabel {
    /// Maps the label text shown on the page. Every other label is discarded.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Consumo:" => Some(EnergyLabel::Consumption),
            "Emisiones:" => Some(EnergyLabel::Emission),
            _ => None,
        }
    }
}

/// One certificate line: the rating value and the CSS class of its icon.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyEntry {
    pub label: EnergyLabel,
    pub value: Option<String>,
    pub icon: Option<String>,
}

impl EnergyEntry {
    /// Converts one raw `{label: [value, icon]}` item.
    ///
    /// Keys other than the two known labels, null values and anything that is
    /// not a two-element array are dropped. Pair elements keep their text when
    /// truthy; empty strings, zero, false and null become `None`.
    pub fn from_item(item: &CertificateItem) -> Vec<EnergyEntry> {
        item.iter()
            .filter_map(|(key, value)| {
                let label = EnergyLabel::from_key(key)?;
                match value {
                    Value::Array(pair) if pair.len() == 2 => Some(EnergyEntry {
                        label,
                        value: non_empty(&pair[0]),
                        icon: non_empty(&pair[1]),
                    }),
                    _ => {
                        tracing::debug!("Ignoring certificate entry '{}' with value {}", key, value);
                        None
                    }
                }
            })
            .collect()
    }
}

fn non_empty(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(items) if !items.is_empty() => Some(value.to_string()),
        Value::Object(map) if !map.is_empty() => Some(value.to_string()),
        _ => None,
    }
}

/// Filter step: flattens raw certificate items into typed entries.
pub fn entries_from_raw(items: &[CertificateItem]) -> Vec<EnergyEntry> {
    items.iter().flat_map(EnergyEntry::from_item).collect()
}

/// Fold step: later entries overwrite earlier ones, but only with present values.
/// The output always carries all four columns.
pub fn extract_energy_certificate(entries: &[EnergyEntry]) -> Vec<Field> {
    let mut consumption = (None, None);
    let mut emission = (None, None);

    for entry in entries {
        let slot = match entry.label {
            EnergyLabel::Consumption => &mut consumption,
            EnergyLabel::Emission => &mut emission,
        };
        if let Some(value) = &entry.value {
            slot.0 = Some(value.clone());
        }
        if let Some(icon) = &entry.icon {
            slot.1 = Some(icon.clone());
        }
    }

    vec![
        Field::new(CONSUMPTION_VALUE, FieldValue::Text(consumption.0)),
        Field::new(CONSUMPTION_ICON, FieldValue::Text(consumption.1)),
        Field::new(EMISSION_VALUE, FieldValue::Text(emission.0)),
        Field::new(EMISSION_ICON, FieldValue::Text(emission.1)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::rules::find_field;
    use serde_json::json;

    fn items(value: Value) -> Vec<CertificateItem> {
        serde_json::from_value(value).unwrap()
    }

    fn text<'a>(fields: &'a [Field], name: &str) -> Option<&'a str> {
        find_field(fields, name).and_then(FieldValue::as_text)
    }

    #[test]
    fn keeps_consumption_and_drops_unknown_labels() {
        let raw = items(json!([{"Consumo:": ["A", "icon-a"]}, {"Otro:": ["X", "Y"]}]));
        let fields = extract_energy_certificate(&entries_from_raw(&raw));
        assert_eq!(fields.len(), 4);
        assert_eq!(text(&fields, CONSUMPTION_VALUE), Some("A"));
        assert_eq!(text(&fields, CONSUMPTION_ICON), Some("icon-a"));
        assert!(find_field(&fields, EMISSION_VALUE).unwrap().is_absent());
        assert!(find_field(&fields, EMISSION_ICON).unwrap().is_absent());
    }

    #[test]
    fn later_entries_win_for_the_same_label() {
        let raw = items(json!([
            {"Emisiones:": ["E", "icon-e"]},
            {"Emisiones:": ["B", "icon-b"]},
        ]));
        let fields = extract_energy_certificate(&entries_from_raw(&raw));
        assert_eq!(text(&fields, EMISSION_VALUE), Some("B"));
        assert_eq!(text(&fields, EMISSION_ICON), Some("icon-b"));
    }

    #[test]
    fn empty_values_do_not_clear_earlier_ones() {
        let raw = items(json!([
            {"Consumo:": ["C", "icon-c"]},
            {"Consumo:": ["", "icon-d"]},
        ]));
        let fields = extract_energy_certificate(&entries_from_raw(&raw));
        assert_eq!(text(&fields, CONSUMPTION_VALUE), Some("C"));
        assert_eq!(text(&fields, CONSUMPTION_ICON), Some("icon-d"));
    }

    #[test]
    fn non_string_pair_elements_keep_their_text() {
        let raw = items(json!([
            {"Consumo:": [125, "icon-c"]},
            {"Emisiones:": ["D", 0]},
            {"Emisiones:": [false, true]},
        ]));
        let fields = extract_energy_certificate(&entries_from_raw(&raw));
        assert_eq!(text(&fields, CONSUMPTION_VALUE), Some("125"));
        assert_eq!(text(&fields, EMISSION_VALUE), Some("D"));
        assert_eq!(text(&fields, EMISSION_ICON), Some("true"));
    }

    #[test]
    fn null_and_malformed_values_are_filtered() {
        let raw = items(json!([
            {"Consumo:": null},
            {"Emisiones:": "en trámite"},
            {"Emisiones:": ["only-one"]},
        ]));
        assert!(entries_from_raw(&raw).is_empty());
        let fields = extract_energy_certificate(&[]);
        assert!(fields.iter().all(|f| f.value.is_absent()));
        let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ENERGY_COLUMNS);
    }

    #[test]
    fn label_mapping() {
        assert_eq!(EnergyLabel::from_key("Consumo:"), Some(EnergyLabel::Consumption));
        assert_eq!(EnergyLabel::from_key("Emisiones:"), Some(EnergyLabel::Emission));
        assert_eq!(EnergyLabel::from_key("Consumo"), None);
    }
}
