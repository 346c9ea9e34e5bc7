// src/idealista/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::utils::error::AppError;

/// One energy-certificate item as scraped: `{"Consumo:": ["A", "icon-a"]}`.
pub type CertificateItem = BTreeMap<String, Value>;

/// Pass-through column holding the page title.
pub const TITLE: &str = "title";
/// Pass-through column holding the portal's listing reference.
pub const REFERENCE: &str = "referencia_anuncio";
/// Pass-through column holding the location breadcrumbs.
pub const LOCATION: &str = "ubicacion";

/// A scraped announcement before field extraction.
///
/// The three composite columns and the price columns are typed; every other
/// key lands in `extra` and is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_features: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificado_energetico: Option<Vec<CertificateItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caracteristicas_basicas: Option<Vec<String>>,

    #[serde(rename = "Precio del inmueble:", default, skip_serializing_if = "Option::is_none")]
    pub precio_inmueble: Option<String>,

    #[serde(rename = "Precio por m²:", default, skip_serializing_if = "Option::is_none")]
    pub precio_m2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawListing {
    /// Best-effort identifier for log lines and rejected-row reports.
    pub fn reference(&self) -> Option<&str> {
        self.extra.get(REFERENCE).and_then(Value::as_str)
    }
}

/// Reads a JSON array of raw listings, as written by the debug dump.
pub async fn load_raw_batch<P: AsRef<Path>>(path: P) -> Result<Vec<RawListing>, AppError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let batch: Vec<RawListing> = serde_json::from_slice(&bytes)?;
    tracing::info!("Loaded {} raw listings from {}", batch.len(), path.display());
    Ok(batch)
}
