// Share code allocation: short public codes and long opaque tokens

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::schema::share_links;
use crate::utils::base62::random_code;
use crate::utils::ServiceError;

/// Length of the public short code that appears in share URLs
pub const SHORT_CODE_LENGTH: usize = 8;

/// Length of the opaque token stored alongside the code
pub const TOKEN_LENGTH: usize = 32;

/// Allocation attempts before giving up on a unique short code
const MAX_ATTEMPTS: usize = 5;

/// Codes that read badly or collide with reserved routes
const RESERVED_CODES: [&str; 6] = ["api", "admin", "health", "docs", "static", "showcase"];

pub struct ShareCodeGenerator;

impl ShareCodeGenerator {
    /// Generate the opaque token for a new share link
    pub fn generate_token() -> String {
        random_code(TOKEN_LENGTH)
    }

    /// Candidate short code; callers must check uniqueness against the DB
    pub fn candidate_code() -> String {
        random_code(SHORT_CODE_LENGTH)
    }

    pub fn is_reserved(code: &str) -> bool {
        RESERVED_CODES.contains(&code.to_lowercase().as_str())
    }

    /// Allocate a short code not yet present in share_links.
    ///
    /// Retries a handful of times on collision; at 62^8 possible codes a
    /// retry storm means something else is wrong.
    pub async fn allocate_short_code(
        conn: &mut AsyncPgConnection,
    ) -> Result<String, ServiceError> {
        for _ in 0..MAX_ATTEMPTS {
            let candidate = Self::candidate_code();
            if Self::is_reserved(&candidate) {
                continue;
            }

            let exists: i64 = share_links::table
                .filter(share_links::short_code.eq(&candidate))
                .count()
                .get_result(conn)
                .await?;

            if exists == 0 {
                return Ok(candidate);
            }
        }

        Err(ServiceError::CodeCollision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_token_lengths() {
        assert_eq!(ShareCodeGenerator::candidate_code().len(), SHORT_CODE_LENGTH);
        assert_eq!(ShareCodeGenerator::generate_token().len(), TOKEN_LENGTH);
    }

    #[test]
    fn test_reserved_codes() {
        assert!(ShareCodeGenerator::is_reserved("admin"));
        assert!(ShareCodeGenerator::is_reserved("ADMIN"));
        assert!(!ShareCodeGenerator::is_reserved("aB3xK9mQ"));
    }
}
