use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    /// Azure Vision endpoint + key. Receipt extraction is disabled when
    /// either is absent; drafts then fail gracefully into their error state.
    pub ocr_endpoint: Option<String>,
    pub ocr_key: Option<String>,
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr_key", &self.ocr_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()),
            ocr_endpoint: env::var("AZURE_VISION_ENDPOINT").ok().filter(|v| !v.is_empty()),
            ocr_key: env::var("AZURE_VISION_KEY").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn ocr_configured(&self) -> bool {
        self.ocr_endpoint.is_some() && self.ocr_key.is_some()
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
