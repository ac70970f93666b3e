// Product model: scraped product pages and their lifecycle

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::product_image::ProductImageResponse;
use crate::schema::products;

// =============================================================================
// STATUS
// =============================================================================

/// Product lifecycle: pending -> scraped -> analyzed -> ready
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Scraped,
    Analyzed,
    Ready,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Pending => "pending",
            ProductStatus::Scraped => "scraped",
            ProductStatus::Analyzed => "analyzed",
            ProductStatus::Ready => "ready",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProductStatus::Pending),
            "scraped" => Ok(ProductStatus::Scraped),
            "analyzed" => Ok(ProductStatus::Analyzed),
            "ready" => Ok(ProductStatus::Ready),
            other => Err(format!("Unknown product status: {}", other)),
        }
    }
}

// =============================================================================
// DATABASE MODELS
// =============================================================================

/// Product database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub source_url: String,
    pub name: String,
    pub description: Option<String>,
    pub original_images: serde_json::Value,
    pub scraped_data: serde_json::Value,
    pub product_analysis: Option<serde_json::Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New product for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub source_url: String,
    pub name: String,
    pub description: Option<String>,
    pub original_images: serde_json::Value,
    pub scraped_data: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn product_status(&self) -> ProductStatus {
        ProductStatus::from_str(&self.status).unwrap_or(ProductStatus::Pending)
    }

    pub fn original_image_urls(&self) -> Vec<String> {
        serde_json::from_value(self.original_images.clone()).unwrap_or_default()
    }

    pub fn has_analysis(&self) -> bool {
        self.product_analysis.is_some()
    }
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Request to scrape a product page
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"url": "https://shop.example.com/products/ceramic-mug"}))]
pub struct ScrapeProductRequest {
    #[validate(url(message = "Invalid URL format"))]
    #[validate(length(max = 2048, message = "URL must be less than 2048 characters"))]
    pub url: String,
}

impl ScrapeProductRequest {
    pub fn sanitize(&mut self) {
        self.url = self.url.trim().to_string();
    }
}

/// Request to select images for analysis
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"image_ids": ["123e4567-e89b-12d3-a456-426614174000"]}))]
pub struct SelectImagesRequest {
    #[validate(length(min = 1, max = 50, message = "Select between 1 and 50 images"))]
    pub image_ids: Vec<Uuid>,
}

/// Product response for API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub source_url: String,
    pub status: ProductStatus,
    pub images: Vec<ProductImageResponse>,
    pub created_at: DateTime<Utc>,
}

/// Pagination parameters for product listing
#[derive(Debug, Clone, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ProductPagination {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    20
}

impl Default for ProductPagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl ProductPagination {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, 100)
    }
}

/// Paginated product list response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

lazy_static! {
    /// Hosts that never make sense as product pages
    static ref BLOCKED_HOST_REGEX: Regex =
        Regex::new(r"^(localhost|127\.\d+\.\d+\.\d+|0\.0\.0\.0|\[::1\])$").unwrap();
}

/// Reject non-http(s) schemes and loopback hosts before handing the URL
/// to the scraping provider
pub fn validate_source_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("Invalid URL: {}", e))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("Unsupported URL scheme: {}", parsed.scheme()));
    }

    let host = parsed.host_str().ok_or_else(|| "URL has no host".to_string())?;
    if BLOCKED_HOST_REGEX.is_match(host) {
        return Err("Loopback hosts cannot be scraped".to_string());
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "scraped", "analyzed", "ready"] {
            assert_eq!(ProductStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(ProductStatus::from_str("deleted").is_err());
    }

    #[test]
    fn test_validate_source_url() {
        assert!(validate_source_url("https://shop.example.com/p/1").is_ok());
        assert!(validate_source_url("http://shop.example.com").is_ok());
        assert!(validate_source_url("ftp://shop.example.com").is_err());
        assert!(validate_source_url("https://localhost/admin").is_err());
        assert!(validate_source_url("https://127.0.0.1:8080/x").is_err());
        assert!(validate_source_url("not-a-url").is_err());
    }

    #[test]
    fn test_pagination_clamps() {
        let p = ProductPagination {
            page: 3,
            per_page: 20,
        };
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        let oversized = ProductPagination {
            page: 0,
            per_page: 500,
        };
        assert_eq!(oversized.limit(), 100);
        assert_eq!(oversized.offset(), 0);
    }
}
