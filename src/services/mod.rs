// Business logic layer; handlers stay thin and delegate here

pub mod ai;
pub mod jwt;
pub mod product;
pub mod scrape;
pub mod share;
pub mod share_code;
pub mod studio;
pub mod usage;

pub use jwt::JwtService;
pub use product::ProductService;
pub use scrape::FirecrawlClient;
pub use share::ShareService;
pub use studio::StudioService;
pub use usage::UsageService;
