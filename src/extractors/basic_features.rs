// src/extractors/basic_features.rs

// --- Imports ---
use crate::extractors::rules::{apply_rules, Field, Rule, Transform};
use once_cell::sync::Lazy;
use regex::Regex;

// --- Rule Table (Lazy Static) ---
// "Características básicas" list items. Flags are presence-tested and default to false.
pub static BASIC_FEATURE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("caracteristicas_basicas_superficie_m2", r"(\d+)\s*m² construidos", Transform::Integer),
        Rule::new("superficie_util_m2", r"(\d+)\s*m² útiles", Transform::Integer),
        Rule::new("caracteristicas_basicas_habitaciones", r"(\d+)\s*habitaci?", Transform::Integer),
        Rule::new("caracteristicas_basicas_banos", r"(\d+)\s*baños?", Transform::Integer),
        Rule::new("parcela_m2", r"parcela de (\d+)\s*m²", Transform::Integer),
        Rule::new("terraza", r"terraza", Transform::Presence),
        Rule::new("balcon", r"balcón", Transform::Presence),
        Rule::new("garaje_incluido", r"plaza de garaje incluida en el precio", Transform::Presence),
        Rule::new("segunda_mano_buen_estado", r"segunda mano/buen estado", Transform::Presence),
        Rule::new("armarios_empotrados", r"armarios empotrados", Transform::Presence),
        Rule::new("orientacion", r"orientación (\w+(?:, \w+)*)", Transform::Text),
        Rule::new("cocina_equipada", r"cocina equipada", Transform::Presence),
        Rule::new(
            "amueblada",
            r"amueblad[oa]",
            Transform::PresenceUnless(Regex::new(r"sin amueblar").expect("Failed to compile unfurnished phrase")),
        ),
        Rule::new("calefaccion", r"calefacción\s*([\w\s:]+)", Transform::Text),
        Rule::new("trastero", r"trastero", Transform::Presence),
        Rule::new("construccion", r"construido en (\d{4})", Transform::Integer),
        Rule::new("plantas", r"(\d+)\s*plantas", Transform::Integer),
    ]
});

/// Extracts the 17 basic-characteristics columns.
pub fn extract_basic_features(fragments: &[String]) -> Vec<Field> {
    apply_rules(&BASIC_FEATURE_RULES, fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::rules::{find_field, ColumnKind, FieldValue};

    fn extract(parts: &[&str]) -> Vec<Field> {
        let owned: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
        extract_basic_features(&owned)
    }

    fn int(fields: &[Field], name: &str) -> Option<i64> {
        find_field(fields, name).and_then(FieldValue::as_integer)
    }

    fn flag(fields: &[Field], name: &str) -> Option<bool> {
        find_field(fields, name).and_then(FieldValue::as_flag)
    }

    #[test]
    fn extracts_full_house_listing() {
        let fields = extract(&[
            "Casa o chalet independiente",
            "3 plantas",
            "180 m² construidos, 150 m² útiles",
            "Parcela de 600 m²",
            "4 habitaciones",
            "2 baños",
            "Terraza y balcón",
            "Plaza de garaje incluida en el precio",
            "Segunda mano/buen estado",
            "Armarios empotrados",
            "Trastero",
            "Orientación sur, este",
            "Construido en 1998",
            "Cocina equipada y casa sin amueblar",
            "Calefacción individual: Gas natural",
        ]);
        assert_eq!(int(&fields, "caracteristicas_basicas_superficie_m2"), Some(180));
        assert_eq!(int(&fields, "superficie_util_m2"), Some(150));
        assert_eq!(int(&fields, "caracteristicas_basicas_habitaciones"), Some(4));
        assert_eq!(int(&fields, "caracteristicas_basicas_banos"), Some(2));
        assert_eq!(int(&fields, "parcela_m2"), Some(600));
        assert_eq!(int(&fields, "construccion"), Some(1998));
        assert_eq!(int(&fields, "plantas"), Some(3));
        assert_eq!(flag(&fields, "terraza"), Some(true));
        assert_eq!(flag(&fields, "balcon"), Some(true));
        assert_eq!(flag(&fields, "garaje_incluido"), Some(true));
        assert_eq!(flag(&fields, "segunda_mano_buen_estado"), Some(true));
        assert_eq!(flag(&fields, "armarios_empotrados"), Some(true));
        assert_eq!(flag(&fields, "trastero"), Some(true));
        assert_eq!(flag(&fields, "cocina_equipada"), Some(true));
        assert_eq!(flag(&fields, "amueblada"), Some(false));
        assert_eq!(
            find_field(&fields, "orientacion").and_then(FieldValue::as_text),
            Some("sur, este")
        );
        assert_eq!(
            find_field(&fields, "calefaccion").and_then(FieldValue::as_text),
            Some("individual: gas natural")
        );
    }

    #[test]
    fn every_flag_defaults_to_false() {
        let fields = extract(&["Piso", "Sin datos relevantes"]);
        let flags: Vec<&Rule> = BASIC_FEATURE_RULES
            .iter()
            .filter(|r| r.kind() == ColumnKind::Flag)
            .collect();
        assert_eq!(flags.len(), 8);
        for rule in flags {
            assert_eq!(flag(&fields, rule.field), Some(false), "{}", rule.field);
        }
    }

    #[test]
    fn numeric_and_text_fields_are_absent_without_match() {
        let fields = extract(&[]);
        assert_eq!(fields.len(), 17);
        for rule in BASIC_FEATURE_RULES.iter().filter(|r| r.kind() != ColumnKind::Flag) {
            assert!(find_field(&fields, rule.field).unwrap().is_absent(), "{}", rule.field);
        }
    }

    #[test]
    fn furnished_phrase_sets_flag() {
        assert_eq!(flag(&extract(&["Amueblado y cocina equipada"]), "amueblada"), Some(true));
        assert_eq!(flag(&extract(&["Cocina sin equipar y casa sin amueblar"]), "amueblada"), Some(false));
        assert_eq!(flag(&extract(&["Cocina sin equipar y casa sin amueblar"]), "cocina_equipada"), Some(false));
    }

    #[test]
    fn single_bathroom_and_orientation_word() {
        let fields = extract(&["1 baño", "Orientación norte"]);
        assert_eq!(int(&fields, "caracteristicas_basicas_banos"), Some(1));
        assert_eq!(find_field(&fields, "orientacion").and_then(FieldValue::as_text), Some("norte"));
    }

    #[test]
    fn construction_year_needs_four_digits() {
        assert_eq!(int(&extract(&["Construido en 98"]), "construccion"), None);
    }
}
