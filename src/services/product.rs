// Product service: scraping, image selection, analysis, recommendations

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::db::DieselPool;
use crate::models::product::{
    validate_source_url, ProductListResponse, ProductPagination, ProductResponse,
    ProductStatus, ScrapeProductRequest, SelectImagesRequest,
};
use crate::models::product_image::ImageAnalysisResult;
use crate::models::{
    NewProduct, NewProductImage, Organization, Product, ProductImage, UsageAction,
};
use crate::schema::{product_images, products};
use crate::services::ai::{ImageAnalysisAgent, OpenAiClient, RecommendationAgent};
use crate::services::scrape::FirecrawlClient;
use crate::services::usage::UsageService;
use crate::utils::ServiceError;

pub struct ProductService {
    pool: DieselPool,
    scrape_client: FirecrawlClient,
    openai_client: OpenAiClient,
}

impl ProductService {
    pub fn new(
        pool: DieselPool,
        scrape_client: FirecrawlClient,
        openai_client: OpenAiClient,
    ) -> Self {
        Self {
            pool,
            scrape_client,
            openai_client,
        }
    }

    // =========================================================================
    // SCRAPE
    // =========================================================================

    /// Scrape a product page into a new product with its image rows
    pub async fn scrape_product(
        &self,
        organization: &Organization,
        user_id: Uuid,
        mut request: ScrapeProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.sanitize();
        request.validate()?;
        validate_source_url(&request.url).map_err(ServiceError::ValidationError)?;
        UsageService::check_quota(organization)?;

        let scraped = self.scrape_client.scrape_product_page(&request.url).await?;

        let now = chrono::Utc::now();
        let new_product = NewProduct {
            id: Uuid::new_v4(),
            organization_id: organization.id,
            source_url: request.url.clone(),
            name: scraped.name.clone(),
            description: scraped.description.clone(),
            original_images: json!(scraped.images),
            scraped_data: scraped.raw.clone(),
            status: ProductStatus::Scraped.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut conn = self.pool.get().await?;
        let (product, images) = persist_scraped_product(
            &mut conn,
            organization.id,
            user_id,
            new_product,
            scraped.images.clone(),
        )
        .await?;

        info!(
            "Created product {} from {} with {} images",
            product.id,
            product.source_url,
            images.len()
        );
        Ok(to_product_response(product, images))
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Replace the product's image selection with the given set.
    ///
    /// Selection is a full replacement: everything is deselected first, so
    /// repeating the same request is idempotent.
    pub async fn select_images(
        &self,
        organization: &Organization,
        product_id: Uuid,
        request: SelectImagesRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        let mut conn = self.pool.get().await?;
        let product = load_product_for_org(&mut conn, organization.id, product_id).await?;

        // Every requested id must belong to this product
        let owned: i64 = product_images::table
            .filter(product_images::product_id.eq(product.id))
            .filter(product_images::id.eq_any(&request.image_ids))
            .count()
            .get_result(&mut conn)
            .await?;
        if owned != request.image_ids.len() as i64 {
            return Err(ServiceError::ValidationError(
                "One or more image ids do not belong to this product".to_string(),
            ));
        }

        apply_selection(&mut conn, product.id, request.image_ids).await?;

        let images = load_images(&mut conn, product.id).await?;
        Ok(to_product_response(product, images))
    }

    // =========================================================================
    // ANALYSIS
    // =========================================================================

    /// Analyze the currently selected images with the vision model.
    ///
    /// Per-image failures are skipped; the call errors only when nothing
    /// could be analyzed.
    pub async fn analyze_selected(
        &self,
        organization: &Organization,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<ImageAnalysisResult>, ServiceError> {
        UsageService::check_quota(organization)?;

        let mut conn = self.pool.get().await?;
        let product = load_product_for_org(&mut conn, organization.id, product_id).await?;

        let selected: Vec<ProductImage> = product_images::table
            .filter(product_images::product_id.eq(product.id))
            .filter(product_images::is_selected.eq(true))
            .order(product_images::position.asc())
            .select(ProductImage::as_select())
            .load(&mut conn)
            .await?;

        if selected.is_empty() {
            return Err(ServiceError::ValidationError(
                "No images selected for analysis".to_string(),
            ));
        }

        let context = json!({
            "title": product.name,
            "description": product.description,
        });

        let agent = ImageAnalysisAgent::new();
        let mut results = Vec::new();
        for image in &selected {
            match agent
                .analyze_image(&self.openai_client, &image.url, Some(context.clone()))
                .await
            {
                Ok(analysis) => {
                    diesel::update(product_images::table.find(image.id))
                        .set((
                            product_images::analysis.eq(&analysis),
                            product_images::updated_at.eq(chrono::Utc::now()),
                        ))
                        .execute(&mut conn)
                        .await?;
                    results.push(ImageAnalysisResult {
                        image_id: image.id,
                        analysis,
                    });
                },
                Err(e) => {
                    warn!("Analysis of image {} failed: {}", image.id, e);
                },
            }
        }

        if results.is_empty() {
            return Err(ServiceError::ExternalApi(
                "Image analysis failed for all selected images".to_string(),
            ));
        }

        diesel::update(products::table.find(product.id))
            .set((
                products::status.eq(ProductStatus::Analyzed.as_str()),
                products::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(&mut conn)
            .await?;

        UsageService::record(
            &mut conn,
            organization.id,
            user_id,
            UsageAction::ImageAnalysis,
            Some(product.id),
            None,
        )
        .await?;

        Ok(results)
    }

    // =========================================================================
    // RECOMMENDATIONS
    // =========================================================================

    /// Recommend additional shots based on the selected, analyzed images
    pub async fn recommend_shots(
        &self,
        organization: &Organization,
        product_id: Uuid,
    ) -> Result<Vec<String>, ServiceError> {
        let mut conn = self.pool.get().await?;
        let product = load_product_for_org(&mut conn, organization.id, product_id).await?;

        let selected: Vec<ProductImage> = product_images::table
            .filter(product_images::product_id.eq(product.id))
            .filter(product_images::is_selected.eq(true))
            .order(product_images::position.asc())
            .select(ProductImage::as_select())
            .load(&mut conn)
            .await?;

        if selected.is_empty() {
            return Err(ServiceError::ValidationError(
                "No images selected; select and analyze images first".to_string(),
            ));
        }

        let urls: Vec<String> = selected.iter().map(|img| img.url.clone()).collect();
        let analyses: Vec<&str> = selected
            .iter()
            .filter_map(|img| img.analysis.as_deref())
            .collect();

        let context = json!({
            "title": product.name,
            "description": product.description,
            "existing_analyses": analyses,
        });

        let agent = RecommendationAgent::new();
        let recommendations = agent
            .recommend_shots(&self.openai_client, &urls, Some(context))
            .await?;

        diesel::update(products::table.find(product.id))
            .set((
                products::product_analysis.eq(json!({ "recommendations": recommendations })),
                products::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(recommendations)
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub async fn get_product(
        &self,
        organization: &Organization,
        product_id: Uuid,
    ) -> Result<ProductResponse, ServiceError> {
        let mut conn = self.pool.get().await?;
        let product = load_product_for_org(&mut conn, organization.id, product_id).await?;
        let images = load_images(&mut conn, product.id).await?;
        Ok(to_product_response(product, images))
    }

    pub async fn list_products(
        &self,
        organization: &Organization,
        pagination: ProductPagination,
    ) -> Result<ProductListResponse, ServiceError> {
        let mut conn = self.pool.get().await?;

        let total: i64 = products::table
            .filter(products::organization_id.eq(organization.id))
            .count()
            .get_result(&mut conn)
            .await?;

        let page_products: Vec<Product> = products::table
            .filter(products::organization_id.eq(organization.id))
            .order(products::created_at.desc())
            .offset(pagination.offset())
            .limit(pagination.limit())
            .select(Product::as_select())
            .load(&mut conn)
            .await?;

        let mut responses = Vec::with_capacity(page_products.len());
        for product in page_products {
            let images = load_images(&mut conn, product.id).await?;
            responses.push(to_product_response(product, images));
        }

        Ok(ProductListResponse {
            products: responses,
            total,
            page: pagination.page.max(1),
            per_page: pagination.limit(),
        })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Persist a scraped product, its image rows, and the usage debit in one
/// transaction; a failure partway leaves nothing behind
pub(crate) async fn persist_scraped_product(
    conn: &mut AsyncPgConnection,
    organization_id: Uuid,
    user_id: Uuid,
    new_product: NewProduct,
    image_urls: Vec<String>,
) -> Result<(Product, Vec<ProductImage>), ServiceError> {
    conn.build_transaction()
        .run::<_, ServiceError, _>(|conn| {
            Box::pin(async move {
                let product: Product = diesel::insert_into(products::table)
                    .values(&new_product)
                    .returning(Product::as_returning())
                    .get_result(conn)
                    .await?;

                let image_rows = NewProductImage::from_scraped_urls(product.id, &image_urls);
                let images: Vec<ProductImage> = diesel::insert_into(product_images::table)
                    .values(&image_rows)
                    .returning(ProductImage::as_returning())
                    .get_results(conn)
                    .await?;

                UsageService::record(
                    conn,
                    organization_id,
                    user_id,
                    UsageAction::ProductScrape,
                    Some(product.id),
                    None,
                )
                .await?;

                Ok((product, images))
            })
        })
        .await
}

/// Replace the product's selection set in one transaction
pub(crate) async fn apply_selection(
    conn: &mut AsyncPgConnection,
    product_id: Uuid,
    image_ids: Vec<Uuid>,
) -> Result<(), ServiceError> {
    conn.build_transaction()
        .run::<_, ServiceError, _>(|conn| {
            Box::pin(async move {
                let now = chrono::Utc::now();
                diesel::update(
                    product_images::table.filter(product_images::product_id.eq(product_id)),
                )
                .set((
                    product_images::is_selected.eq(false),
                    product_images::updated_at.eq(now),
                ))
                .execute(conn)
                .await?;

                diesel::update(
                    product_images::table
                        .filter(product_images::product_id.eq(product_id))
                        .filter(product_images::id.eq_any(&image_ids)),
                )
                .set((
                    product_images::is_selected.eq(true),
                    product_images::updated_at.eq(now),
                ))
                .execute(conn)
                .await?;

                Ok(())
            })
        })
        .await
}

/// Load a product, treating other organizations' products as not found
pub async fn load_product_for_org(
    conn: &mut AsyncPgConnection,
    organization_id: Uuid,
    product_id: Uuid,
) -> Result<Product, ServiceError> {
    products::table
        .find(product_id)
        .filter(products::organization_id.eq(organization_id))
        .select(Product::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
}

async fn load_images(
    conn: &mut AsyncPgConnection,
    product_id: Uuid,
) -> Result<Vec<ProductImage>, ServiceError> {
    Ok(product_images::table
        .filter(product_images::product_id.eq(product_id))
        .order(product_images::position.asc())
        .select(ProductImage::as_select())
        .load(conn)
        .await?)
}

fn to_product_response(product: Product, images: Vec<ProductImage>) -> ProductResponse {
    ProductResponse {
        id: product.id,
        name: product.name.clone(),
        description: product.description.clone(),
        source_url: product.source_url.clone(),
        status: product.product_status(),
        images: images.iter().map(|img| img.to_response()).collect(),
        created_at: product.created_at,
    }
}
