// src/idealista/parser.rs

// --- Imports ---
use crate::idealista::models::{CertificateItem, RawListing, LOCATION, REFERENCE, TITLE};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

// --- CSS Selectors (Lazy Static) ---
fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("Failed to compile selector '{}': {:?}", css, e))
}

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("title"));
static REFERENCE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("p.txt-ref"));
static HEADLINE_PRICE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| selector("div.info-data span.info-data-price span.txt-bold"));
static INFO_FEATURES_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div.info-features"));
static SPAN_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span"));
static UL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("ul"));
static LI_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("li"));

// Detail blocks: "Características básicas" lives in feature-one, the certificate in feature-two
static FEATURE_ONE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div.details-property-feature-one"));
static FEATURE_TWO_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div.details-property-feature-two"));
static SECTION_HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("h2.details-property-h2"));
static FEATURE_LIST_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div.details-property_features"));

static PRICE_ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("article.price-feature"));
static PRICE_LINE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("p.flex-feature"));
static PRICE_LABEL_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("span.flex-feature-details"));
static PRICE_VALUE_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("strong.flex-feature-details"));

static LOCATION_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("div#headerMap"));
static LOCATION_ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| selector("li.header-map-list"));

const BASIC_FEATURES_HEADING: &str = "Características básicas";
const CERTIFICATE_HEADING: &str = "Certificado energético";
const PROPERTY_PRICE_LABEL: &str = "Precio del inmueble";
const PRICE_PER_M2_LABEL: &str = "Precio por m²";

// --- Text Helpers ---

/// Full text content, trimmed at both ends.
fn trimmed_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Every text node trimmed, then glued together.
fn stripped_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect()
}

/// Builds a raw row from a listing page. Missing sections leave fields absent.
pub fn parse_listing(html: &str) -> RawListing {
    let document = Html::parse_document(html);
    let mut listing = RawListing::default();

    if let Some(title) = document.select(&TITLE_SELECTOR).next() {
        listing.extra.insert(TITLE.to_string(), Value::String(trimmed_text(title)));
    }

    if let Some(reference) = document.select(&REFERENCE_SELECTOR).last() {
        listing.extra.insert(REFERENCE.to_string(), Value::String(trimmed_text(reference)));
    }

    if let Some(price) = document.select(&HEADLINE_PRICE_SELECTOR).last() {
        listing.price = Some(Value::String(trimmed_text(price)));
    }

    if let Some(features) = document.select(&INFO_FEATURES_SELECTOR).last() {
        listing.info_features = Some(features.select(&SPAN_SELECTOR).map(trimmed_text).collect());
    }

    listing.caracteristicas_basicas = parse_basic_features(&document);
    listing.certificado_energetico = parse_certificate(&document);
    parse_price_features(&document, &mut listing);

    if let Some(map) = document.select(&LOCATION_SELECTOR).next() {
        let parts: Vec<Value> = map
            .select(&LOCATION_ITEM_SELECTOR)
            .map(|li| Value::String(stripped_text(li)))
            .collect();
        listing.extra.insert(LOCATION.to_string(), Value::Array(parts));
    }

    tracing::debug!(
        "Parsed listing {:?}: {} info features, {} basic features, {} certificate items",
        listing.reference(),
        listing.info_features.as_ref().map_or(0, Vec::len),
        listing.caracteristicas_basicas.as_ref().map_or(0, Vec::len),
        listing.certificado_energetico.as_ref().map_or(0, Vec::len),
    );
    listing
}

/// Finds the features list that follows the heading containing `heading`.
fn feature_list_after<'a>(container: ElementRef<'a>, heading: &str) -> Option<ElementRef<'a>> {
    container
        .select(&SECTION_HEADING_SELECTOR)
        .filter(|h| h.text().collect::<String>().contains(heading))
        .find_map(|h| {
            h.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| FEATURE_LIST_SELECTOR.matches(sibling))
        })
}

fn parse_basic_features(document: &Html) -> Option<Vec<String>> {
    let container = document.select(&FEATURE_ONE_SELECTOR).next()?;
    let list = feature_list_after(container, BASIC_FEATURES_HEADING)?;
    // Later lists replace earlier ones
    list.select(&UL_SELECTOR)
        .last()
        .map(|ul| ul.select(&LI_SELECTOR).map(trimmed_text).collect())
}

fn parse_certificate(document: &Html) -> Option<Vec<CertificateItem>> {
    let container = document.select(&FEATURE_TWO_SELECTOR).next()?;
    let list = feature_list_after(container, CERTIFICATE_HEADING)?;
    let ul = list.select(&UL_SELECTOR).next()?;

    let items = ul
        .select(&LI_SELECTOR)
        .filter_map(|li| {
            let spans: Vec<ElementRef> = li.select(&SPAN_SELECTOR).collect();
            if spans.len() < 2 {
                tracing::warn!("Skipping certificate line without label/value spans: '{}'", trimmed_text(li));
                return None;
            }
            let label = trimmed_text(spans[0]);
            let value = trimmed_text(spans[1]);
            let icon = spans[1].value().classes().next().unwrap_or("").to_string();

            let mut item = CertificateItem::new();
            item.insert(label, Value::Array(vec![Value::String(value), Value::String(icon)]));
            Some(item)
        })
        .collect();
    Some(items)
}

fn parse_price_features(document: &Html, listing: &mut RawListing) {
    let Some(article) = document.select(&PRICE_ARTICLE_SELECTOR).next() else {
        return;
    };

    for line in article.select(&PRICE_LINE_SELECTOR) {
        let Some(label_span) = line.select(&PRICE_LABEL_SELECTOR).next() else {
            continue;
        };
        let label = stripped_text(label_span);
        let value = match line.select(&PRICE_VALUE_SELECTOR).next() {
            Some(strong) => stripped_text(strong),
            None => stripped_text(line).replace(&label, "").trim().to_string(),
        };

        if label.contains(PROPERTY_PRICE_LABEL) {
            listing.precio_inmueble = Some(value);
        } else if label.contains(PRICE_PER_M2_LABEL) {
            listing.precio_m2 = Some(value);
        }
    }
}
