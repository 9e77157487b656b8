use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::placement::domain::ActorRole;
use crate::workflows::placement::eligibility::{EligibilityPolicy, DEFAULT_MINIMUM_PERCENT};
use crate::workflows::placement::projector::ProjectorConfig;
use crate::workflows::placement::service::PlacementSettings;

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
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let workflow = WorkflowConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow,
        })
    }
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
}

/// Placement workflow tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub eligibility_threshold_percent: u8,
    pub status_priority: Vec<ActorRole>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            eligibility_threshold_percent: DEFAULT_MINIMUM_PERCENT,
            status_priority: ProjectorConfig::DEFAULT_PRIORITY.to_vec(),
        }
    }
}

impl WorkflowConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var("PORTAL_ELIGIBILITY_THRESHOLD") {
            config.eligibility_threshold_percent = parse_threshold(&raw)?;
        }

        if let Ok(raw) = env::var("PORTAL_STATUS_PRIORITY") {
            config.status_priority = parse_priority(&raw)?;
        }

        Ok(config)
    }

    pub fn settings(&self) -> PlacementSettings {
        PlacementSettings {
            eligibility: EligibilityPolicy::new(self.eligibility_threshold_percent),
            projector: ProjectorConfig::new(self.status_priority.clone()),
        }
    }
}

fn parse_threshold(raw: &str) -> Result<u8, ConfigError> {
    let invalid = || ConfigError::InvalidThreshold {
        value: raw.to_string(),
    };
    let value = raw.trim().parse::<u8>().map_err(|_| invalid())?;
    if (1..=100).contains(&value) {
        Ok(value)
    } else {
        Err(invalid())
    }
}

fn parse_priority(raw: &str) -> Result<Vec<ActorRole>, ConfigError> {
    let mut roles = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        match ActorRole::parse(entry) {
            Some(ActorRole::Student) | None => {
                return Err(ConfigError::InvalidPriority {
                    value: entry.to_string(),
                })
            }
            Some(role) => roles.push(role),
        }
    }
    if roles.is_empty() {
        return Err(ConfigError::InvalidPriority {
            value: raw.to_string(),
        });
    }
    Ok(roles)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold { value: String },
    InvalidPriority { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold { value } => write!(
                f,
                "PORTAL_ELIGIBILITY_THRESHOLD must be a percentage between 1 and 100, got '{value}'"
            ),
            ConfigError::InvalidPriority { value } => write!(
                f,
                "PORTAL_STATUS_PRIORITY contains unknown reviewer role '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidThreshold { .. }
            | ConfigError::InvalidPriority { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("PORTAL_ELIGIBILITY_THRESHOLD");
        env::remove_var("PORTAL_STATUS_PRIORITY");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.workflow, WorkflowConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_workflow_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_ELIGIBILITY_THRESHOLD", "60");
        env::set_var("PORTAL_STATUS_PRIORITY", "staff, course-instructor, supervisor, committee");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.workflow.eligibility_threshold_percent, 60);
        assert_eq!(
            config.workflow.status_priority,
            vec![
                ActorRole::Staff,
                ActorRole::CourseInstructor,
                ActorRole::Supervisor,
                ActorRole::Committee,
            ]
        );
        let settings = config.workflow.settings();
        assert_eq!(settings.eligibility.minimum_percent(), 60);
        assert_eq!(settings.projector.priority[0], ActorRole::Staff);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_ELIGIBILITY_THRESHOLD", "140");
        let err = AppConfig::load().expect_err("threshold above 100 is refused");
        reset_env();
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));
    }

    #[test]
    fn rejects_student_in_priority() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_STATUS_PRIORITY", "committee,student");
        let err = AppConfig::load().expect_err("student never anchors a step");
        reset_env();
        match err {
            ConfigError::InvalidPriority { value } => assert_eq!(value, "student"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
