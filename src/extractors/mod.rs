// src/extractors/mod.rs
pub mod basic_features;
pub mod energy;
pub mod info_features;
pub mod price;
pub mod rules;

// Re-export key extraction types for convenience
pub use basic_features::{extract_basic_features, BASIC_FEATURE_RULES};
pub use energy::{entries_from_raw, extract_energy_certificate, ENERGY_COLUMNS};
pub use info_features::{extract_info_features, INFO_FEATURE_RULES};
pub use price::{normalize_prices, Prices};
pub use rules::{ColumnKind, Field, FieldValue};
