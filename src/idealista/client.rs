// src/idealista/client.rs
use crate::idealista::models::RawListing;
use crate::idealista::parser::parse_listing;
use crate::utils::error::FetchError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;

// Browser-like headers; the portal answers bare clients with a 403.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Creates a reqwest client configured for listing pages.
fn build_listing_client() -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

/// Downloads the HTML of one listing page.
pub async fn fetch_listing_page(url: &str) -> Result<String, FetchError> {
    let client = build_listing_client()?;

    tracing::info!("Downloading listing from: {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Forbidden(url.to_string()));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        return Err(FetchError::Http(status));
    }

    let body = response.text().await?;
    tracing::debug!("Downloaded {} bytes from {}", body.len(), url);

    Ok(body)
}

/// Fetches a listing and turns its page into a raw row.
/// Returns the page HTML alongside so callers can keep it for debugging.
pub async fn scrape_listing(url: &str) -> Result<(RawListing, String), FetchError> {
    let html = fetch_listing_page(url).await?;
    let listing = parse_listing(&html);
    Ok((listing, html))
}
