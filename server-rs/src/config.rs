use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub node_env: String,
    pub cors_origins: Vec<String>,
    pub db: DbConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub catalog: CatalogConfig,
    pub coins: CoinsConfig,
    pub razorpay: RazorpayConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
}

#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: u8,
    pub key_prefix: String,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_expiry_secs: i64,
    pub refresh_expiry_secs: i64,
}

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
    pub checkout_submit_max: u32,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub cache_seconds: u32,
    pub page_size: u32,
}

#[derive(Clone, Debug)]
pub struct CoinsConfig {
    pub welcome_bonus: i64,
    pub max_earn_per_request: i64,
}

#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
    pub currency: String,
    /// Allows the "demo" payment method that confirms a booking without
    /// touching the gateway.
    pub demo_enabled: bool,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env_or_parse("PORT", 3000),
            node_env: env_or("NODE_ENV", "development"),
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000,http://localhost:8080")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            db: DbConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or_parse("DB_PORT", 5432),
                database: env_or("DB_NAME", "bnb_travel"),
                user: env_or("DB_USER", "bnb_admin"),
                password: env_or("DB_PASSWORD", ""),
                pool_min: env_or_parse("DB_POOL_MIN", 5),
                pool_max: env_or_parse("DB_POOL_MAX", 50),
            },
            redis: RedisConfig {
                host: env_or("REDIS_HOST", "localhost"),
                port: env_or_parse("REDIS_PORT", 6379),
                password: env::var("REDIS_PASSWORD").ok().filter(|s| !s.is_empty()),
                db: env_or_parse("REDIS_DB", 0),
                key_prefix: "bnb:".to_string(),
            },
            jwt: JwtConfig {
                secret: env_or("JWT_SECRET", "change-me-to-a-secure-random-string"),
                access_expiry_secs: parse_duration_to_secs(&env_or("JWT_ACCESS_EXPIRY", "1h")),
                refresh_expiry_secs: parse_duration_to_secs(&env_or("JWT_REFRESH_EXPIRY", "30d")),
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: env_or_parse("RATE_LIMIT_MAX", 100),
                checkout_submit_max: env_or_parse("RATE_LIMIT_CHECKOUT", 10),
            },
            catalog: CatalogConfig {
                cache_seconds: env_or_parse("CATALOG_CACHE_SEC", 60),
                page_size: env_or_parse("CATALOG_PAGE_SIZE", 50),
            },
            coins: CoinsConfig {
                welcome_bonus: env_or_parse("COINS_WELCOME_BONUS", 50),
                max_earn_per_request: env_or_parse("COINS_MAX_EARN", 500),
            },
            razorpay: RazorpayConfig {
                key_id: env_or("RAZORPAY_KEY_ID", ""),
                key_secret: env_or("RAZORPAY_KEY_SECRET", ""),
                webhook_secret: env_or("RAZORPAY_WEBHOOK_SECRET", ""),
                currency: env_or("RAZORPAY_CURRENCY", "INR"),
                demo_enabled: env_or_parse("DEMO_PAYMENTS_ENABLED", true),
            },
        }
    }

    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db.user, self.db.password, self.db.host, self.db.port, self.db.database
        )
    }

    pub fn redis_url(&self) -> String {
        if let Ok(url) = env::var("REDIS_URL") {
            return url;
        }
        match &self.redis.password {
            Some(pw) if !pw.is_empty() => format!(
                "redis://:{}@{}:{}/{}",
                pw, self.redis.host, self.redis.port, self.redis.db
            ),
            _ => format!(
                "redis://{}:{}/{}",
                self.redis.host, self.redis.port, self.redis.db
            ),
        }
    }
}

fn parse_duration_to_secs(s: &str) -> i64 {
    let s = s.trim();
    if s.is_empty() {
        return 3600;
    }
    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: i64 = num_str.parse().unwrap_or(1);
    match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        "d" => num * 86400,
        _ => s.parse().unwrap_or(3600),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_duration_to_secs;

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration_to_secs("45s"), 45);
        assert_eq!(parse_duration_to_secs("2m"), 120);
        assert_eq!(parse_duration_to_secs("1h"), 3600);
        assert_eq!(parse_duration_to_secs("30d"), 30 * 86400);
    }

    #[test]
    fn falls_back_on_garbage() {
        assert_eq!(parse_duration_to_secs(""), 3600);
        assert_eq!(parse_duration_to_secs("soon"), 3600);
    }
}
