// Redis configuration loaded from the central app config

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub redis_url: String,
    pub pool_size: u32,
    pub connection_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl RedisConfig {
    pub fn from_env() -> Self {
        let config = crate::app_config::config();
        Self {
            redis_url: config.redis_url.clone(),
            pool_size: config.redis_pool_size,
            connection_timeout: Duration::from_secs(config.redis_connection_timeout),
            retry_attempts: config.redis_retry_attempts,
            retry_delay: Duration::from_millis(config.redis_retry_delay_ms),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.redis_url.is_empty() {
            return Err("Redis URL must not be empty".to_string());
        }
        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            return Err(format!("Invalid Redis URL scheme: {}", self.redis_url));
        }
        if self.pool_size == 0 {
            return Err("Redis pool size must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> RedisConfig {
        RedisConfig {
            redis_url: "redis://localhost:6379".to_string(),
            pool_size: 4,
            connection_timeout: Duration::from_secs(5),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_validate_accepts_redis_schemes() {
        assert!(base_config().validate().is_ok());

        let mut tls = base_config();
        tls.redis_url = "rediss://localhost:6380".to_string();
        assert!(tls.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut cfg = base_config();
        cfg.redis_url = "http://localhost".to_string();
        assert!(cfg.validate().is_err());

        let mut cfg = base_config();
        cfg.pool_size = 0;
        assert!(cfg.validate().is_err());
    }
}
