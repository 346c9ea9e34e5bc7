// src/extractors/price.rs

// --- Imports ---
use crate::utils::error::ValueExtractionError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const PROPERTY_PRICE: &str = "precio_inmueble";
pub const HEADLINE_PRICE: &str = "price";
pub const PRICE_PER_M2: &str = "precio_m2";

static LEADING_DIGITS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+").expect("Failed to compile LEADING_DIGITS_RE")
});

static DECIMAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:\.\d+)?").expect("Failed to compile DECIMAL_RE")
});

/// The three mandatory numeric price columns of a listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prices {
    pub precio_inmueble: i64,
    pub price: f64,
    pub precio_m2: f64,
}

fn failure(field: &'static str, raw: &str) -> ValueExtractionError {
    ValueExtractionError { field, raw: raw.to_string() }
}

/// "150.000 €" -> 150000. '.' groups thousands; the first digit run is the price.
pub fn parse_property_price(raw: Option<&str>) -> Result<i64, ValueExtractionError> {
    let raw = raw.ok_or_else(|| failure(PROPERTY_PRICE, ""))?;
    let compact = raw.replace('.', "");
    LEADING_DIGITS_RE
        .find(&compact)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| failure(PROPERTY_PRICE, raw))
}

/// Headline price, shown in thousands: 150.0 -> 150000.0.
/// Accepts a JSON number or a numeric string; "NaN" and "inf" are rejected.
pub fn parse_headline_price(raw: Option<&Value>) -> Result<f64, ValueExtractionError> {
    let thousands = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    thousands
        .map(|t| t * 1000.0)
        .filter(|p| p.is_finite())
        .ok_or_else(|| failure(HEADLINE_PRICE, &raw.map(Value::to_string).unwrap_or_default()))
}

/// "1.250,50 €/m²" -> 1250.5.
///
/// Thousands dots are removed before the decimal comma becomes a dot, so
/// "1.250 €/m²" reads as 1250 rather than 1.25.
pub fn parse_price_per_m2(raw: Option<&str>) -> Result<f64, ValueExtractionError> {
    let raw = raw.ok_or_else(|| failure(PRICE_PER_M2, ""))?;
    let normalized = raw.replace('.', "").replace(',', ".");
    DECIMAL_RE
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| failure(PRICE_PER_M2, raw))
}

/// Parses all three price columns; the first failure is returned.
pub fn normalize_prices(
    precio_inmueble: Option<&str>,
    price: Option<&Value>,
    precio_m2: Option<&str>,
) -> Result<Prices, ValueExtractionError> {
    Ok(Prices {
        precio_inmueble: parse_property_price(precio_inmueble)?,
        price: parse_headline_price(price)?,
        precio_m2: parse_price_per_m2(precio_m2)?,
    })
}
