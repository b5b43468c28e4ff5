use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations when the server starts.
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Login token and password policy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Lifetime of issued login tokens; `0` disables expiry.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Maximum number of live tokens per user; unlimited when absent.
    #[serde(default)]
    pub token_limit_per_user: Option<usize>,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl(),
            token_limit_per_user: None,
            password_min_length: default_password_min_length(),
        }
    }
}

/// Upper bound for `auth.token_ttl_secs` (100 years).
pub const MAX_TOKEN_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

fn default_token_ttl() -> u64 { 10 * 60 * 60 }
fn default_password_min_length() -> usize { 8 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Build a configuration purely from environment variables
    /// (`SERVER_HOST`, `SERVER_PORT`, `DATABASE_URL`, `TOKEN_TTL_SECS`).
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        if let Some(ttl) = std::env::var("TOKEN_TTL_SECS").ok().and_then(|v| v.parse::<u64>().ok()) {
            cfg.auth.token_ttl_secs = ttl;
        }
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or via DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn validate(&self) -> Result<()> {
        if self.password_min_length == 0 {
            return Err(anyhow!("auth.password_min_length must be >= 1"));
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(anyhow!("auth.token_ttl_secs must be <= {} (100 years)", MAX_TOKEN_TTL_SECS));
        }
        if self.token_limit_per_user == Some(0) {
            return Err(anyhow!("auth.token_limit_per_user must be >= 1 when set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [database]
            url = "postgres://u:p@localhost:5432/users"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.auth.token_ttl_secs, 36_000);
        assert_eq!(cfg.auth.password_min_length, 8);
        assert!(cfg.auth.token_limit_per_user.is_none());
    }

    #[test]
    fn rejects_non_postgres_url() {
        let mut cfg = load_from_str(
            r#"
            [database]
            url = "mysql://localhost/users"
            "#,
        )
        .unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn zero_worker_threads_normalized() {
        let mut cfg = AppConfig::default();
        cfg.server.worker_threads = Some(0);
        cfg.database.url = "postgres://localhost/users".into();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn auth_settings_reject_zero_limits() {
        let settings = AuthSettings { token_limit_per_user: Some(0), ..AuthSettings::default() };
        assert!(settings.validate().is_err());
        let settings = AuthSettings { password_min_length: 0, ..AuthSettings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn auth_settings_bound_token_ttl() {
        let settings = AuthSettings { token_ttl_secs: MAX_TOKEN_TTL_SECS, ..AuthSettings::default() };
        assert!(settings.validate().is_ok());
        let settings = AuthSettings { token_ttl_secs: MAX_TOKEN_TTL_SECS + 1, ..AuthSettings::default() };
        assert!(settings.validate().is_err());
        let settings = AuthSettings { token_ttl_secs: u64::MAX, ..AuthSettings::default() };
        assert!(settings.validate().is_err());
    }
}
