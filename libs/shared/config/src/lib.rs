use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub backend_api_key: String,
    pub session_file: Option<PathBuf>,
    pub server_port: u16,
    pub booking: BookingSettings,
}

/// Tunables for slot generation and the booking wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingSettings {
    pub slot_granularity_minutes: u32,
    pub min_reason_length: usize,
    pub success_display_delay: Duration,
    pub notification_ttl: Duration,
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            slot_granularity_minutes: 30,
            min_reason_length: 5,
            success_display_delay: Duration::from_millis(2000),
            notification_ttl: Duration::from_millis(4000),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = BookingSettings::default();

        let config = Self {
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| {
                    warn!("BACKEND_URL not set, using empty value");
                    String::new()
                }),
            backend_api_key: env::var("BACKEND_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("BACKEND_API_KEY not set, using empty value");
                    String::new()
                }),
            session_file: env::var("SESSION_FILE").ok().map(PathBuf::from),
            server_port: parse_var("SERVER_PORT", 3000),
            booking: BookingSettings {
                slot_granularity_minutes: parse_var(
                    "SLOT_GRANULARITY_MINUTES",
                    defaults.slot_granularity_minutes,
                ),
                min_reason_length: parse_var("MIN_REASON_LENGTH", defaults.min_reason_length),
                success_display_delay: Duration::from_millis(parse_var(
                    "SUCCESS_DISPLAY_DELAY_MS",
                    defaults.success_display_delay.as_millis() as u64,
                )),
                notification_ttl: Duration::from_millis(parse_var(
                    "NOTIFICATION_TTL_MS",
                    defaults.notification_ttl.as_millis() as u64,
                )),
            },
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Config pointing at a given backend with default booking settings.
    pub fn for_backend(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            backend_api_key: String::new(),
            session_file: None,
            server_port: 3000,
            booking: BookingSettings::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.backend_url.is_empty()
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
