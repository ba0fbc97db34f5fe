//! Terminal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `KASIR_GATEWAY_URL` - Hosted backend base URL; when unset the terminal
//!   runs against an in-memory demo backend
//! - `KASIR_GATEWAY_ANON_KEY` - Backend anon key (required with `KASIR_GATEWAY_URL`)
//! - `KASIR_LOG_FORMAT` - `json` or `pretty` (default: json)
//! - `KASIR_VIEWPORT_WIDTH` - Screen width in pixels (default: 1280)
//! - `KASIR_UTC_OFFSET_HOURS` - Shop time zone offset from UTC (default: 7)
//! - `KASIR_SHOP_NAME`, `KASIR_SHOP_TAGLINE`, `KASIR_SHOP_ADDRESS`,
//!   `KASIR_SHOP_PHONE` - Receipt header lines

use chrono::FixedOffset;
use secrecy::SecretString;
use thiserror::Error;

use kasir_cart::Viewport;
use kasir_observability::LogFormat;
use kasir_sales::ShopInfo;

const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which backend the terminal talks to.
#[derive(Debug, Clone)]
pub enum GatewayConfig {
    InMemory,
    Rest { url: String, anon_key: SecretString },
}

#[derive(Debug, Clone)]
pub struct PosConfig {
    pub gateway: GatewayConfig,
    pub log_format: LogFormat,
    pub viewport_width: u32,
    pub utc_offset: FixedOffset,
    pub shop: ShopInfo,
}

impl PosConfig {
    /// Load configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gateway = match get("KASIR_GATEWAY_URL") {
            Some(url) => GatewayConfig::Rest {
                url,
                anon_key: get("KASIR_GATEWAY_ANON_KEY")
                    .map(SecretString::from)
                    .ok_or_else(|| ConfigError::MissingEnvVar("KASIR_GATEWAY_ANON_KEY".to_string()))?,
            },
            None => GatewayConfig::InMemory,
        };

        let log_format = match get("KASIR_LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| {
                ConfigError::InvalidEnvVar("KASIR_LOG_FORMAT".to_string(), e.to_string())
            })?,
            None => LogFormat::default(),
        };

        let viewport_width = match get("KASIR_VIEWPORT_WIDTH") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                ConfigError::InvalidEnvVar("KASIR_VIEWPORT_WIDTH".to_string(), e.to_string())
            })?,
            None => DEFAULT_VIEWPORT_WIDTH,
        };

        let offset_hours = match get("KASIR_UTC_OFFSET_HOURS") {
            Some(raw) => raw.trim().parse::<i32>().map_err(|e| {
                ConfigError::InvalidEnvVar("KASIR_UTC_OFFSET_HOURS".to_string(), e.to_string())
            })?,
            None => DEFAULT_UTC_OFFSET_HOURS,
        };
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "KASIR_UTC_OFFSET_HOURS".to_string(),
                format!("{offset_hours} is out of range"),
            )
        })?;

        let defaults = ShopInfo::default();
        let shop = ShopInfo {
            name: get("KASIR_SHOP_NAME").unwrap_or(defaults.name),
            tagline: get("KASIR_SHOP_TAGLINE").unwrap_or(defaults.tagline),
            address: get("KASIR_SHOP_ADDRESS").unwrap_or(defaults.address),
            phone: get("KASIR_SHOP_PHONE").unwrap_or(defaults.phone),
        };

        Ok(Self {
            gateway,
            log_format,
            viewport_width,
            utc_offset,
            shop,
        })
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::from_width(self.viewport_width)
    }
}
