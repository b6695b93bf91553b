use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub retention_secs: u64,
    pub gc_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional sends of the same request after a transient failure.
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                base_url: "http://localhost:8080/api".to_string(),
                timeout_secs: 30,
            },
            cache: CacheConfig {
                retention_secs: 300, // 5 minutes
                gc_interval_secs: 60,
            },
            retry: RetryConfig {
                max_attempts: 0,
                backoff_ms: 500,
            },
            logging: LoggingConfig {
                filter: "optimistic_sync=debug,info".to_string(),
            },
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("OPTIMISTIC_SYNC_API_BASE_URL") {
            let trimmed = v.trim().trim_end_matches('/');
            if !trimmed.is_empty() {
                cfg.http.base_url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("OPTIMISTIC_SYNC_HTTP_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.http.timeout_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("OPTIMISTIC_SYNC_CACHE_RETENTION_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.retention_secs = value;
            }
        }
        if let Ok(v) = std::env::var("OPTIMISTIC_SYNC_CACHE_GC_INTERVAL_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.cache.gc_interval_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("OPTIMISTIC_SYNC_RETRY_MAX_ATTEMPTS") {
            if let Some(value) = parse_u32(&v) {
                cfg.retry.max_attempts = value;
            }
        }
        if let Ok(v) = std::env::var("OPTIMISTIC_SYNC_RETRY_BACKOFF_MS") {
            if let Some(value) = parse_u64(&v) {
                cfg.retry.backoff_ms = value;
            }
        }
        if let Ok(v) = std::env::var("OPTIMISTIC_SYNC_LOG_FILTER") {
            if !v.trim().is_empty() {
                cfg.logging.filter = v.trim().to_string();
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.http.base_url.trim().is_empty() {
            return Err("HTTP base_url must not be empty".to_string());
        }
        if !self.http.base_url.starts_with("http://") && !self.http.base_url.starts_with("https://")
        {
            return Err("HTTP base_url must use http or https".to_string());
        }
        if self.http.timeout_secs == 0 {
            return Err("HTTP timeout_secs must be greater than 0".to_string());
        }
        if self.cache.gc_interval_secs == 0 {
            return Err("Cache gc_interval_secs must be greater than 0".to_string());
        }
        if self.retry.max_attempts > 10 {
            return Err("Retry max_attempts must be at most 10".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut cfg = EngineConfig::default();
        cfg.http.base_url = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = EngineConfig::default();
        cfg.http.timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }
}
