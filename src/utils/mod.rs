// Shared utilities

pub mod base62;
pub mod service_error;

pub use service_error::ServiceError;
