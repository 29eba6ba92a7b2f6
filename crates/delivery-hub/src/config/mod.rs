use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Deployment stage, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Everything the service reads from its environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub billing: BillingConfig,
    pub wizard: WizardConfig,
}

impl AppConfig {
    /// Reads `.env` when present, then the `APP_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let vat_percent = parse_var("APP_VAT_PERCENT", BillingConfig::DEFAULT_VAT_PERCENT)
            .filter(|percent| *percent <= 100)
            .ok_or(ConfigError::InvalidVatRate)?;
        let ttl_minutes = parse_var("APP_WIZARD_TTL_MINUTES", WizardConfig::DEFAULT_TTL_MINUTES)
            .filter(|minutes| *minutes > 0)
            .ok_or(ConfigError::InvalidWizardTtl)?;

        Ok(Self {
            environment: AppEnvironment::from_str(&var_or("APP_ENV", "development")),
            server: ServerConfig {
                host: var_or("APP_HOST", "127.0.0.1"),
                port,
            },
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", "info"),
            },
            billing: BillingConfig { vat_percent },
            wizard: WizardConfig { ttl_minutes },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// `None` when the variable is set but does not parse.
fn parse_var(name: &str, default: u32) -> Option<u32> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().ok(),
        Err(_) => Some(default),
    }
}

/// Listen address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Invoice tax settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingConfig {
    pub vat_percent: u32,
}

impl BillingConfig {
    pub const DEFAULT_VAT_PERCENT: u32 = 19;
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            vat_percent: Self::DEFAULT_VAT_PERCENT,
        }
    }
}

/// Lifetime of idle shipment wizard sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardConfig {
    pub ttl_minutes: u32,
}

impl WizardConfig {
    pub const DEFAULT_TTL_MINUTES: u32 = 60;

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.ttl_minutes))
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: Self::DEFAULT_TTL_MINUTES,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidVatRate,
    InvalidWizardTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => f.write_str("APP_PORT is not a port number"),
            ConfigError::InvalidHost { .. } => f.write_str("APP_HOST is not an IP address"),
            ConfigError::InvalidVatRate => {
                write!(f, "APP_VAT_PERCENT must be an integer between 0 and 100")
            }
            ConfigError::InvalidWizardTtl => {
                write!(f, "APP_WIZARD_TTL_MINUTES must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidVatRate
            | ConfigError::InvalidWizardTtl => None,
        }
    }
}
