// src/extractors/info_features.rs

// --- Imports ---
use crate::extractors::rules::{apply_rules, Field, Rule, Transform};
use once_cell::sync::Lazy;
use regex::Regex;

// --- Rule Table (Lazy Static) ---
// Summary line under the listing price: "90 m²", "3 hab.", "Planta 2 exterior con ascensor"
pub static INFO_FEATURE_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new("superficie_m2", r"(\d+)\s*m²", Transform::Integer),
        Rule::new("habitaciones", r"(\d+)\s*hab", Transform::Integer),
        Rule::new("garaje", r"garaje incluido|con garaje", Transform::Presence),
        Rule::new("planta", r"planta (\d+)", Transform::Integer),
        Rule::new(
            "ascensor",
            r"con ascensor",
            Transform::TriState(Regex::new(r"sin ascensor").expect("Failed to compile elevator negation")),
        ),
    ]
});

/// Extracts surface, rooms, garage, floor and elevator from the info-feature spans.
pub fn extract_info_features(fragments: &[String]) -> Vec<Field> {
    apply_rules(&INFO_FEATURE_RULES, fragments)
}
