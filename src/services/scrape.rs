// Product page scraping via a Firecrawl-compatible API
// One POST per scrape; structured extraction rides alongside the markdown

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::app_config::{ScrapeConfig, CONFIG};

// Shared HTTP client for all scrape calls
static SCRAPE_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(5)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(CONFIG.scrape.request_timeout))
        .user_agent("ProdShot-Backend/1.0")
        .build()
        .expect("Failed to create HTTP client for scraping")
});

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Scrape API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Scrape returned no usable product data")]
    EmptyResult,
}

/// Product data extracted from a scraped page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub name: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    /// Full provider payload, kept for later reprocessing
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct ScrapeApiResponse {
    #[serde(default)]
    success: bool,
    data: Option<Value>,
}

#[derive(Clone)]
pub struct FirecrawlClient {
    config: ScrapeConfig,
}

impl FirecrawlClient {
    pub fn new() -> Self {
        Self {
            config: CONFIG.scrape.clone(),
        }
    }

    pub fn with_config(config: ScrapeConfig) -> Self {
        Self { config }
    }

    /// Scrape a product page and extract structured product data
    #[instrument(skip(self))]
    pub async fn scrape_product_page(&self, url: &str) -> Result<ScrapedProduct, ScrapeError> {
        info!("Scraping product page: {}", url);

        let body = json!({
            "url": url,
            "formats": ["markdown", "extract"],
            "onlyMainContent": true,
            "waitFor": self.config.wait_for_ms,
            "extract": {
                "schema": product_extraction_schema(),
            },
        });

        let response = SCRAPE_HTTP_CLIENT
            .post(format!("{}/scrape", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Scrape request failed: {} {}", status, body);
            return Err(ScrapeError::Api { status, body });
        }

        let parsed: ScrapeApiResponse = response.json().await?;
        if !parsed.success {
            return Err(ScrapeError::EmptyResult);
        }

        let data = parsed.data.ok_or(ScrapeError::EmptyResult)?;
        let product = parse_scrape_response(&data).ok_or(ScrapeError::EmptyResult)?;

        info!(
            "Scraped product '{}' with {} images",
            product.name,
            product.images.len()
        );
        Ok(product)
    }
}

impl Default for FirecrawlClient {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON schema handed to the extraction endpoint
fn product_extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "Product title" },
            "description": { "type": "string", "description": "Product description" },
            "price": { "type": "string", "description": "Product price with currency" },
            "images": {
                "type": "array",
                "items": { "type": "string" },
                "description": "All product image URLs on the page"
            }
        },
        "required": ["title", "images"]
    })
}

/// Pull a ScrapedProduct out of the provider payload.
///
/// The extract block is authoritative; image URLs are deduplicated while
/// keeping first-seen order. Returns None when there is no title to anchor
/// a product record on.
pub fn parse_scrape_response(data: &Value) -> Option<ScrapedProduct> {
    let extract = data.get("extract")?;

    let name = extract
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let description = extract
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let mut seen = std::collections::HashSet::new();
    let images: Vec<String> = extract
        .get("images")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|url| url.starts_with("http"))
                .filter(|url| seen.insert(url.to_string()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(ScrapedProduct {
        name,
        description,
        images,
        raw: data.clone(),
    })
}
