use rust_decimal::Decimal;

use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/brewhaul | Work directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | LOG_LEVEL | info | tracing filter level |
/// | LOG_DIR | (unset) | Daily-rotated log files when set |
/// | SHIPPING_FEE | 120 | Flat shipping fee, currency units |
/// | DELIVERY_FEE | 50 | Flat rider fee per delivery, currency units |
/// | CANCEL_WINDOW_MINUTES | 5 | Cancellation window after checkout |
/// | PAYMONGO_BASE_URL | https://api.paymongo.com/v1 | Payment gateway |
/// | PAYMONGO_SECRET_KEY | (unset) | Gateway secret key |
/// | IMAGE_CLOUD_NAME | (unset) | Image store cloud name |
/// | IMAGE_API_KEY | (unset) | Image store API key |
/// | IMAGE_API_SECRET | (unset) | Image store API secret |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/brewhaul HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory for the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Tracing filter level
    pub log_level: String,
    /// Log file directory (stdout only when unset)
    pub log_dir: Option<String>,

    // === Fulfillment policy ===
    /// Flat shipping fee charged per order
    pub shipping_fee: Decimal,
    /// Flat fee credited to a rider per completed delivery
    pub delivery_fee: Decimal,
    /// Minutes after checkout during which a customer may still cancel
    pub cancel_window_minutes: i64,

    // === Collaborators ===
    /// Payment gateway base URL
    pub paymongo_base_url: String,
    /// Payment gateway secret key (basic auth username)
    pub paymongo_secret_key: String,
    /// Image store cloud name
    pub image_cloud_name: String,
    /// Image store API key
    pub image_api_key: String,
    /// Image store API secret
    pub image_api_secret: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/brewhaul".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),

            shipping_fee: std::env::var("SHIPPING_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| Decimal::from(120)),
            delivery_fee: std::env::var("DELIVERY_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| Decimal::from(50)),
            cancel_window_minutes: std::env::var("CANCEL_WINDOW_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            paymongo_base_url: std::env::var("PAYMONGO_BASE_URL")
                .unwrap_or_else(|_| "https://api.paymongo.com/v1".into()),
            paymongo_secret_key: std::env::var("PAYMONGO_SECRET_KEY").unwrap_or_default(),
            image_cloud_name: std::env::var("IMAGE_CLOUD_NAME").unwrap_or_default(),
            image_api_key: std::env::var("IMAGE_API_KEY").unwrap_or_default(),
            image_api_secret: std::env::var("IMAGE_API_SECRET").unwrap_or_default(),
        }
    }

    /// Override the work directory and port, for tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Database directory under the work dir
    pub fn database_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("database")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
