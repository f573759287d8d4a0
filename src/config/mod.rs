use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub tenancy: TenancyConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub migration: MigrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Stage of the tenancy rollout the running deployment is in.
///
/// `Expand` keeps the transitional access branches enabled so that users and
/// content created before tenancy existed stay reachable. Switching to
/// `Contract` removes them without a code change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloutPhase {
    Expand,
    Contract,
}

impl RolloutPhase {
    pub fn is_transitional(&self) -> bool {
        matches!(self, RolloutPhase::Expand)
    }
}

impl FromStr for RolloutPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expand" => Ok(RolloutPhase::Expand),
            "contract" => Ok(RolloutPhase::Contract),
            other => Err(format!("unknown rollout phase: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    pub rollout_phase: RolloutPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Signing secret for bearer tokens issued by the upstream auth layer
    pub auth_secret: Option<String>,
    pub token_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Domain used when the backfill has to synthesize the first website
    pub primary_domain: Option<String>,
    pub batch_size: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Tenancy overrides
        if let Ok(v) = env::var("TENANCY_ROLLOUT_PHASE") {
            match v.parse() {
                Ok(phase) => self.tenancy.rollout_phase = phase,
                Err(e) => tracing::warn!("Ignoring TENANCY_ROLLOUT_PHASE: {}", e),
            }
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Some(port) = env::var("CMS_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("AUTH_SECRET") {
            self.security.auth_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("AUTH_TOKEN_EXPIRY_HOURS") {
            self.security.token_expiry_hours = v.parse().unwrap_or(self.security.token_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        // Migration overrides
        if let Ok(v) = env::var("PRIMARY_DOMAIN") {
            self.migration.primary_domain = Some(v).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("MIGRATION_BATCH_SIZE") {
            self.migration.batch_size = v.parse().unwrap_or(self.migration.batch_size);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            tenancy: TenancyConfig {
                rollout_phase: RolloutPhase::Contract,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 10,
                max_page_size: 1000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                auth_secret: None,
                token_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                enable_audit_logging: false,
            },
            migration: MigrationConfig {
                primary_domain: None,
                batch_size: 100,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            tenancy: TenancyConfig {
                rollout_phase: RolloutPhase::Contract,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 10,
                max_page_size: 500,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                auth_secret: None,
                token_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                enable_audit_logging: true,
            },
            migration: MigrationConfig {
                primary_domain: None,
                batch_size: 250,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            tenancy: TenancyConfig {
                rollout_phase: RolloutPhase::Contract,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 10,
                max_page_size: 100,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                auth_secret: None,
                token_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                enable_audit_logging: true,
            },
            migration: MigrationConfig {
                primary_domain: None,
                batch_size: 500,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.tenancy.rollout_phase, RolloutPhase::Contract);
        assert_eq!(config.api.max_page_size, 1000);
        assert!(config.security.auth_secret.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.api.max_page_size, 100);
        assert!(config.security.enable_audit_logging);
    }

    #[test]
    fn test_rollout_phase_parsing() {
        assert_eq!("expand".parse::<RolloutPhase>(), Ok(RolloutPhase::Expand));
        assert_eq!(" CONTRACT ".parse::<RolloutPhase>(), Ok(RolloutPhase::Contract));
        assert!("migrate".parse::<RolloutPhase>().is_err());
        assert!(RolloutPhase::Expand.is_transitional());
        assert!(!RolloutPhase::Contract.is_transitional());
    }
}
