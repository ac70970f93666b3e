// Share service: public showcase links for a product's generated images
// Short codes resolve without authentication; validity is active + unexpired

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use once_cell::sync::Lazy;
use redis::AsyncCommands;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use zip::write::SimpleFileOptions;

use crate::app_config::CONFIG;
use crate::db::{DieselPool, RedisPool};
use crate::models::share_link::{CreateShareLinkRequest, ShareLinkResponse};
use crate::models::{GeneratedImage, NewShareLink, Organization, Product, ShareLink};
use crate::schema::{generated_images, products, share_links};
use crate::services::product::load_product_for_org;
use crate::services::share_code::ShareCodeGenerator;
use crate::utils::ServiceError;

/// Showcase payloads are cached briefly to absorb hot public traffic
const SHOWCASE_CACHE_TTL_SECS: u64 = 60;

// Shared HTTP client for fetching generated images into archives
static DOWNLOAD_HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .pool_max_idle_per_host(5)
        .timeout(Duration::from_secs(60))
        .user_agent("ProdShot-Backend/1.0")
        .build()
        .expect("Failed to create HTTP client for downloads")
});

/// Public showcase payload behind a share link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShowcaseResponse {
    pub short_code: String,
    pub product_name: String,
    pub product_description: Option<String>,
    pub views: i32,
    pub images: Vec<ShowcaseImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShowcaseImage {
    pub url: String,
    pub prompt: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub struct ShareService {
    pool: DieselPool,
    redis: RedisPool,
}

impl ShareService {
    pub fn new(pool: DieselPool, redis: RedisPool) -> Self {
        Self { pool, redis }
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Create a share link for a product, reusing an existing valid one.
    ///
    /// At most one valid link exists per product; creating again hands the
    /// caller the same code instead of minting a duplicate.
    pub async fn create_for_product(
        &self,
        organization: &Organization,
        user_id: Uuid,
        product_id: Uuid,
        request: CreateShareLinkRequest,
    ) -> Result<ShareLinkResponse, ServiceError> {
        request
            .validate_custom()
            .map_err(ServiceError::ValidationError)?;

        let mut conn = self.pool.get().await?;
        let product = load_product_for_org(&mut conn, organization.id, product_id).await?;

        let existing: Vec<ShareLink> = share_links::table
            .filter(share_links::product_id.eq(product.id))
            .filter(share_links::is_active.eq(true))
            .select(ShareLink::as_select())
            .load(&mut conn)
            .await?;

        if let Some(link) = existing.into_iter().find(|l| l.is_valid()) {
            info!("Reusing share link {} for product {}", link.short_code, product.id);
            return Ok(link.to_response(&CONFIG.share.base_url));
        }

        let short_code = ShareCodeGenerator::allocate_short_code(&mut conn).await?;
        let now = chrono::Utc::now();
        let new_link = NewShareLink {
            id: Uuid::new_v4(),
            product_id: Some(product.id),
            generated_image_id: None,
            created_by: user_id,
            token: ShareCodeGenerator::generate_token(),
            short_code,
            views: 0,
            expires_at: Some(request.expires_or_default(CONFIG.share.default_expiry_days)),
            is_active: true,
            metadata: None,
            created_at: now,
            updated_at: now,
        };

        let link: ShareLink = diesel::insert_into(share_links::table)
            .values(&new_link)
            .returning(ShareLink::as_returning())
            .get_result(&mut conn)
            .await?;

        info!("Created share link {} for product {}", link.short_code, product.id);
        Ok(link.to_response(&CONFIG.share.base_url))
    }

    // =========================================================================
    // PUBLIC RESOLUTION
    // =========================================================================

    /// Resolve a short code into the public showcase, counting the view
    pub async fn showcase(&self, short_code: &str) -> Result<ShowcaseResponse, ServiceError> {
        let mut conn = self.pool.get().await?;
        let link = load_valid_link_counting_view(&mut conn, short_code).await?;

        let cache_key = showcase_cache_key(short_code);
        if let Some(mut cached) = self.read_cached_showcase(&cache_key).await {
            cached.views = link.views;
            return Ok(cached);
        }

        let response = self.build_showcase(&mut conn, &link).await?;
        self.write_cached_showcase(&cache_key, &response).await;
        Ok(response)
    }

    /// Bundle the showcase's completed images into a zip archive.
    ///
    /// A download is a public access like the showcase, so it counts a view.
    /// Images that fail to fetch are skipped; the download errors only when
    /// nothing could be bundled.
    pub async fn download_archive(
        &self,
        short_code: &str,
    ) -> Result<(String, Vec<u8>), ServiceError> {
        let mut conn = self.pool.get().await?;
        let link = load_valid_link_counting_view(&mut conn, short_code).await?;
        let showcase = self.build_showcase(&mut conn, &link).await?;

        if showcase.images.is_empty() {
            return Err(ServiceError::NotFound(
                "No completed images to download".to_string(),
            ));
        }

        let mut fetched = Vec::new();
        for image in &showcase.images {
            match fetch_image_bytes(&image.url).await {
                Ok(bytes) => fetched.push(bytes),
                Err(e) => warn!("Skipping image {} in archive: {}", image.url, e),
            }
        }

        if fetched.is_empty() {
            return Err(ServiceError::ExternalApi(
                "Could not fetch any images for the archive".to_string(),
            ));
        }

        let archive = build_zip_archive(&fetched)
            .map_err(|e| ServiceError::Internal(format!("Archive build failed: {}", e)))?;

        Ok((format!("prodshot-{}.zip", short_code), archive))
    }

    // =========================================================================
    // DEACTIVATION
    // =========================================================================

    /// Deactivate a share link; only its creator may do so
    pub async fn deactivate(
        &self,
        user_id: Uuid,
        share_link_id: Uuid,
    ) -> Result<ShareLinkResponse, ServiceError> {
        let mut conn = self.pool.get().await?;

        let link: ShareLink = share_links::table
            .find(share_link_id)
            .select(ShareLink::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| ServiceError::NotFound("Share link not found".to_string()))?;

        if link.created_by != user_id {
            return Err(ServiceError::Forbidden(
                "Only the creator can deactivate a share link".to_string(),
            ));
        }

        let link: ShareLink = diesel::update(share_links::table.find(link.id))
            .set((
                share_links::is_active.eq(false),
                share_links::updated_at.eq(chrono::Utc::now()),
            ))
            .returning(ShareLink::as_returning())
            .get_result(&mut conn)
            .await?;

        self.evict_cached_showcase(&showcase_cache_key(&link.short_code))
            .await;

        info!("Deactivated share link {}", link.short_code);
        Ok(link.to_response(&CONFIG.share.base_url))
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn build_showcase(
        &self,
        conn: &mut AsyncPgConnection,
        link: &ShareLink,
    ) -> Result<ShowcaseResponse, ServiceError> {
        let product_id = link
            .product_id
            .ok_or_else(|| ServiceError::NotFound("Share link has no product".to_string()))?;

        let product: Product = products::table
            .find(product_id)
            .select(Product::as_select())
            .first(conn)
            .await?;

        let images: Vec<GeneratedImage> = generated_images::table
            .filter(generated_images::product_id.eq(product.id))
            .filter(generated_images::status.eq("completed"))
            .order(generated_images::created_at.desc())
            .select(GeneratedImage::as_select())
            .load(conn)
            .await?;

        let showcase_images = images
            .into_iter()
            .filter_map(|img| {
                img.image_url.map(|url| ShowcaseImage {
                    url,
                    prompt: img.prompt,
                    created_at: img.created_at,
                })
            })
            .collect();

        Ok(ShowcaseResponse {
            short_code: link.short_code.clone(),
            product_name: product.name,
            product_description: product.description,
            views: link.views,
            images: showcase_images,
        })
    }

    // Cache reads and writes are best effort; Redis being down never fails
    // a public request

    async fn read_cached_showcase(&self, key: &str) -> Option<ShowcaseResponse> {
        let mut conn = match self.redis.get_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Redis unavailable for showcase cache read: {}", e);
                return None;
            },
        };

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Showcase cache read failed: {}", e);
                None
            },
        }
    }

    async fn write_cached_showcase(&self, key: &str, response: &ShowcaseResponse) {
        let Ok(raw) = serde_json::to_string(response) else {
            return;
        };
        if let Ok(mut conn) = self.redis.get_connection().await {
            if let Err(e) = conn
                .set_ex::<_, _, ()>(key, raw, SHOWCASE_CACHE_TTL_SECS)
                .await
            {
                warn!("Showcase cache write failed: {}", e);
            }
        }
    }

    async fn evict_cached_showcase(&self, key: &str) {
        if let Ok(mut conn) = self.redis.get_connection().await {
            if let Err(e) = conn.del::<_, ()>(key).await {
                warn!("Showcase cache eviction failed: {}", e);
            }
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn showcase_cache_key(short_code: &str) -> String {
    format!("share:showcase:{}", short_code)
}

/// Load a share link by short code, distinguishing missing, inactive, and
/// expired for the error taxonomy
async fn load_valid_link(
    conn: &mut AsyncPgConnection,
    short_code: &str,
) -> Result<ShareLink, ServiceError> {
    let link: ShareLink = share_links::table
        .filter(share_links::short_code.eq(short_code))
        .select(ShareLink::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::NotFound("Share link not found".to_string()))?;

    if !link.is_active {
        return Err(ServiceError::ShareLinkInactive);
    }
    if !link.is_valid() {
        return Err(ServiceError::ShareLinkExpired);
    }
    Ok(link)
}

/// Resolve a valid link for public access and count the access as a view.
/// Both the showcase and the archive download go through here.
async fn load_valid_link_counting_view(
    conn: &mut AsyncPgConnection,
    short_code: &str,
) -> Result<ShareLink, ServiceError> {
    let link = load_valid_link(conn, short_code).await?;

    Ok(diesel::update(share_links::table.find(link.id))
        .set((
            share_links::views.eq(share_links::views + 1),
            share_links::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(ShareLink::as_returning())
        .get_result(conn)
        .await?)
}

async fn fetch_image_bytes(url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = DOWNLOAD_HTTP_CLIENT
        .get(url)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Write fetched images into an in-memory zip, one numbered file each
fn build_zip_archive(images: &[Vec<u8>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (index, bytes) in images.iter().enumerate() {
            writer.start_file(format!("image-{}.png", index + 1), options)?;
            writer.write_all(bytes)?;
        }
        writer.finish()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        assert_eq!(showcase_cache_key("aB3xK9mQ"), "share:showcase:aB3xK9mQ");
    }

    #[test]
    fn test_zip_archive_structure() {
        let images = vec![vec![1u8, 2, 3], vec![4u8, 5]];
        let archive = build_zip_archive(&images).unwrap();

        let mut reader = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.by_index(0).unwrap().name(), "image-1.png");
        assert_eq!(reader.by_index(1).unwrap().name(), "image-2.png");
    }

    // Needs a provisioned DATABASE_URL; skipped otherwise
    #[tokio::test]
    async fn test_public_resolution_counts_views() {
        use crate::schema::users;
        use diesel_async::AsyncConnection;

        dotenv::dotenv().ok();
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let Ok(mut conn) = AsyncPgConnection::establish(&url).await else {
            return;
        };

        let now = chrono::Utc::now();
        let user_id = Uuid::new_v4();
        let seeded = diesel::insert_into(users::table)
            .values((
                users::id.eq(user_id),
                users::email.eq(format!("share-views-{}@test.example", user_id.simple())),
                users::full_name.eq("Share Views Test"),
                users::is_active.eq(true),
                users::created_at.eq(now),
                users::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .await;
        if seeded.is_err() {
            return;
        }

        let link_id = Uuid::new_v4();
        let short_code = crate::utils::base62::random_code(8);
        diesel::insert_into(share_links::table)
            .values(&NewShareLink {
                id: link_id,
                product_id: None,
                generated_image_id: None,
                created_by: user_id,
                token: ShareCodeGenerator::generate_token(),
                short_code: short_code.clone(),
                views: 0,
                expires_at: None,
                is_active: true,
                metadata: None,
                created_at: now,
                updated_at: now,
            })
            .execute(&mut conn)
            .await
            .unwrap();

        let first = load_valid_link_counting_view(&mut conn, &short_code)
            .await
            .unwrap();
        assert_eq!(first.views, 1);

        let second = load_valid_link_counting_view(&mut conn, &short_code)
            .await
            .unwrap();
        assert_eq!(second.views, 2);

        diesel::delete(share_links::table.find(link_id))
            .execute(&mut conn)
            .await
            .unwrap();
        diesel::delete(users::table.find(user_id))
            .execute(&mut conn)
            .await
            .unwrap();
    }

    #[test]
    fn test_zip_round_trips_content() {
        use std::io::Read;

        let payload = vec![9u8; 128];
        let archive = build_zip_archive(std::slice::from_ref(&payload)).unwrap();

        let mut reader = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        let mut file = reader.by_index(0).unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }
}
