// Product image model: one scraped image URL per row, in scrape order

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::product_images;

/// Product image database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = product_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub analysis: Option<String>,
    pub is_selected: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New product image for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = product_images)]
pub struct NewProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub is_selected: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewProductImage {
    /// Build insertion rows for scraped image URLs, preserving scrape order
    pub fn from_scraped_urls(product_id: Uuid, urls: &[String]) -> Vec<Self> {
        let now = Utc::now();
        urls.iter()
            .enumerate()
            .map(|(index, url)| Self {
                id: Uuid::new_v4(),
                product_id,
                url: url.clone(),
                is_selected: false,
                position: index as i32,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }
}

/// Product image response for API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductImageResponse {
    pub id: Uuid,
    pub url: String,
    pub analysis: Option<String>,
    pub is_selected: bool,
    pub position: i32,
}

impl ProductImage {
    pub fn to_response(&self) -> ProductImageResponse {
        ProductImageResponse {
            id: self.id,
            url: self.url.clone(),
            analysis: self.analysis.clone(),
            is_selected: self.is_selected,
            position: self.position,
        }
    }
}

/// One image analysis result returned by the analyze endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageAnalysisResult {
    pub image_id: Uuid,
    pub analysis: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_order_is_preserved() {
        let product_id = Uuid::new_v4();
        let urls = vec![
            "https://cdn.example.com/a.jpg".to_string(),
            "https://cdn.example.com/b.jpg".to_string(),
            "https://cdn.example.com/c.jpg".to_string(),
        ];

        let rows = NewProductImage::from_scraped_urls(product_id, &urls);
        assert_eq!(rows.len(), 3);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.position, i as i32);
            assert_eq!(row.url, urls[i]);
            assert!(!row.is_selected);
            assert_eq!(row.product_id, product_id);
        }
    }
}
