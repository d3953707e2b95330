mod file;

use crate::scoring::ScoringConfig;
use chrono_tz::Tz;
use file::{FileConfig, FileFormat};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted rolling window, one century.
pub const MAX_TESPIT_DAYS: u32 = 36_500;

/// Distinguishes runtime behavior for different stages of the service.
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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
    pub storage: StorageConfig,
    pub export: ExportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: AppEnvironment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                log_path: None,
            },
            scoring: ScoringConfig::default(),
            storage: StorageConfig {
                workbook_path: PathBuf::from("data/workbook"),
                employees_path: None,
                report_path: PathBuf::from("reports"),
                lock_timeout: Duration::from_secs(30),
            },
            export: ExportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the optional config file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Some(path) = path {
            config.apply_file(read_file(path)?)?;
        }
        config.apply_env()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<(), ConfigError> {
        if let Some(weights) = file.role_weights {
            self.scoring.role_weights = weights;
        }
        if let Some(weights) = file.category_weights {
            self.scoring.category_weights = weights;
        }
        if let Some(days) = file.tespit_days {
            if days > MAX_TESPIT_DAYS {
                return Err(ConfigError::InvalidTespitDays { value: days });
            }
            self.scoring.tespit_days = days;
        }
        if let Some(name) = file.timezone {
            self.scoring.timezone = parse_timezone(&name)?;
        }
        if file.missing_threshold.is_some() {
            self.scoring.missing_threshold = file.missing_threshold;
        }
        if let Some(path) = file.workbook_path {
            self.storage.workbook_path = path;
        }
        if file.employees_path.is_some() {
            self.storage.employees_path = file.employees_path;
        }
        if let Some(path) = file.report_path {
            self.storage.report_path = path;
        }
        if let Some(seconds) = file.lock_timeout {
            self.storage.lock_timeout = Duration::try_from_secs_f64(seconds)
                .map_err(|_| ConfigError::InvalidLockTimeout { value: seconds })?;
        }
        if file.log_path.is_some() {
            self.telemetry.log_path = file.log_path;
        }
        if let Some(level) = file.log_level {
            self.telemetry.log_level = level.to_ascii_lowercase();
        }
        if let Some(enabled) = file.csv_export {
            self.export.csv_export = enabled;
        }
        if let Some(enabled) = file.powerbi_export {
            self.export.powerbi_export = enabled;
        }
        if file.powerbi_output.is_some() {
            self.export.powerbi_output = file.powerbi_output;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var("APP_ENV") {
            self.environment = AppEnvironment::from_str(&value);
        }
        if let Ok(host) = env::var("APP_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("APP_PORT") {
            self.server.port = port.parse::<u16>().map_err(|_| ConfigError::InvalidPort)?;
        }
        if let Ok(level) = env::var("APP_LOG_LEVEL") {
            self.telemetry.log_level = level;
        }
        if let Ok(path) = env::var("PERSONELTAK_WORKBOOK") {
            self.storage.workbook_path = PathBuf::from(path);
        }
        if let Ok(name) = env::var("PERSONELTAK_TIMEZONE") {
            self.scoring.timezone = parse_timezone(&name)?;
        }
        Ok(())
    }

    /// Power BI datasets land next to the reports unless a dedicated folder is configured.
    pub fn powerbi_dir(&self) -> &Path {
        self.export
            .powerbi_output
            .as_deref()
            .unwrap_or(&self.storage.report_path)
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let format = FileFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    let parsed = match format {
        FileFormat::Yaml => serde_yaml::from_str(&text).map_err(|err| err.to_string()),
        FileFormat::Json => serde_json::from_str(&text).map_err(|err| err.to_string()),
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone {
            value: name.to_string(),
        })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_path: Option<PathBuf>,
}

/// Where the workbook lives and how long to wait for its lock.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub workbook_path: PathBuf,
    /// Alternative `Calisanlar.csv` read instead of the workbook's own table.
    pub employees_path: Option<PathBuf>,
    pub report_path: PathBuf,
    pub lock_timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub csv_export: bool,
    pub powerbi_export: bool,
    pub powerbi_output: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimezone { value: String },
    InvalidLockTimeout { value: f64 },
    InvalidTespitDays { value: u32 },
    UnsupportedFormat { path: PathBuf },
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimezone { value } => write!(f, "unknown timezone '{value}'"),
            ConfigError::InvalidLockTimeout { value } => {
                write!(f, "lock_timeout must be a non-negative number of seconds, got {value}")
            }
            ConfigError::InvalidTespitDays { value } => {
                write!(f, "tespit_days must be at most {MAX_TESPIT_DAYS}, got {value}")
            }
            ConfigError::UnsupportedFormat { path } => {
                write!(f, "unsupported config format: {}", path.display())
            }
            ConfigError::Read { path, .. } => {
                write!(f, "unable to read config file {}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config file {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimezone { .. }
            | ConfigError::InvalidLockTimeout { .. }
            | ConfigError::InvalidTespitDays { .. }
            | ConfigError::UnsupportedFormat { .. }
            | ConfigError::Parse { .. } => None,
        }
    }
}
