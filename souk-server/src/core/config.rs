use crate::auth::JwtConfig;
use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// Every item can be overridden through environment variables:
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/souk | Working directory (database, receipts, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | Runtime environment |
/// | SHOP_NAME | Souk | Shop display name (receipts, emails) |
/// | SHIPPING_PRICE | 20.0 | Shipping price when checkout omits one |
/// | ADMIN_EMAIL | (unset) | Admin notification recipient |
/// | SMTP_HOST | (unset) | SMTP relay; email disabled when unset |
/// | SMTP_PORT | 587 | SMTP relay port |
/// | SMTP_USER | (unset) | SMTP credentials |
/// | SMTP_PASS | (unset) | SMTP credentials |
/// | EMAIL_FROM | shop@localhost | Sender address |
/// | FONT_DEFAULT | (unset) | TTF for Latin text; builtin fallback when unset |
/// | FONT_HEBREW | (unset) | TTF with Hebrew coverage |
/// | FONT_ARABIC | (unset) | TTF with Arabic presentation forms |
/// | IMAGE_FETCH_TIMEOUT_MS | 5000 | Per-image download timeout |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/souk HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database, receipts and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// JWT auth configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Shop display name used on receipts and in email subjects
    pub shop_name: String,
    /// Flat shipping price applied to every order
    pub shipping_price: f64,

    // === Email ===
    /// Admin notification recipient (also receives order confirmations)
    pub admin_email: Option<String>,
    /// SMTP relay host; notifications are disabled when unset
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    /// Sender address for outgoing mail
    pub email_from: String,

    // === Receipt rendering ===
    /// TTF for Latin text (builtin font fallback when unset)
    pub font_default: Option<String>,
    /// TTF with Hebrew coverage
    pub font_hebrew: Option<String>,
    /// TTF with Arabic presentation forms
    pub font_arabic: Option<String>,
    /// Per-image download timeout (milliseconds)
    pub image_fetch_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/souk".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            shop_name: std::env::var("SHOP_NAME").unwrap_or_else(|_| "Souk".into()),
            shipping_price: std::env::var("SHIPPING_PRICE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(20.0),

            admin_email: std::env::var("ADMIN_EMAIL").ok(),
            smtp_host: std::env::var("SMTP_HOST").ok(),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_pass: std::env::var("SMTP_PASS").ok(),
            email_from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| "shop@localhost".into()),

            font_default: std::env::var("FONT_DEFAULT").ok(),
            font_hebrew: std::env::var("FONT_HEBREW").ok(),
            font_arabic: std::env::var("FONT_ARABIC").ok(),
            image_fetch_timeout_ms: std::env::var("IMAGE_FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
        }
    }

    /// Override selected values, keeping the rest from the environment
    ///
    /// Mostly used in tests
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

    /// Directory holding the redb database file
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Directory receipts are written into
    pub fn receipts_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("receipts")
    }

    /// Directory for rolling log files
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// Create the work_dir subdirectory structure
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.receipts_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }

    /// Font configuration for the receipt renderer
    pub fn font_config(&self) -> souk_pdf::FontConfig {
        souk_pdf::FontConfig {
            default_path: self.font_default.as_ref().map(PathBuf::from),
            hebrew_path: self.font_hebrew.as_ref().map(PathBuf::from),
            arabic_path: self.font_arabic.as_ref().map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
