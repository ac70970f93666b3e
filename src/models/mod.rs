// Database models and request/response DTOs

pub mod auth;
pub mod generated_image;
pub mod organization;
pub mod product;
pub mod product_image;
pub mod share_link;
pub mod studio_session;
pub mod usage_log;
pub mod user;

pub use auth::AccessTokenClaims;
pub use generated_image::{GeneratedImage, GenerationStatus, NewGeneratedImage};
pub use organization::Organization;
pub use product::{NewProduct, Product, ProductStatus};
pub use product_image::{NewProductImage, ProductImage};
pub use share_link::{NewShareLink, ShareLink};
pub use studio_session::{NewStudioSession, SessionStatus, StudioSession};
pub use usage_log::{NewUsageLog, UsageAction, UsageLog};
pub use user::User;
