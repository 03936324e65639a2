use crate::{AppConfig, BootstrapAdmin, Environment, StorageKind};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

/// Longest accepted session token lifetime (60 days)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 60;

/// Load configuration: TOML file (if present), then environment overrides
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) if path.exists() => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            from_toml_str(&contents)?
        }
        Some(path) => {
            info!(
                "Config file {} not found, using defaults and environment",
                path.display()
            );
            AppConfig::default()
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    finalize(config)
}

pub fn from_toml_str(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).context("Failed to parse configuration file")
}

/// Apply environment overrides. `lookup` abstracts `std::env::var` for tests.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(mode) = lookup("ENVIRONMENT_MODE") {
        config.environment = mode.parse::<Environment>().map_err(anyhow::Error::msg)?;
    }
    if let Some(host) = lookup("SERVER_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("SERVER_PORT") {
        config.server.port = port.parse().context("Invalid SERVER_PORT")?;
    }
    if let Some(origins) = lookup("ALLOWED_ORIGINS") {
        config.server.allowed_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(size) = lookup("MAX_BODY_SIZE") {
        config.server.max_body_size = size.parse().context("Invalid MAX_BODY_SIZE")?;
    }
    if let Some(backend) = lookup("STORAGE_BACKEND") {
        config.database.backend = backend.parse::<StorageKind>().map_err(anyhow::Error::msg)?;
    }
    if let Some(url) = lookup("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
        config.database.max_connections =
            max.parse().context("Invalid DATABASE_MAX_CONNECTIONS")?;
    }
    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(ttl) = lookup("TOKEN_TTL_MINUTES") {
        config.auth.token_ttl_minutes = ttl.parse().context("Invalid TOKEN_TTL_MINUTES")?;
    }
    if let Some(name) = lookup("CONGRESS_NAME") {
        config.congress.name = name;
    }
    if let Some(offset) = lookup("CONGRESS_UTC_OFFSET_MINUTES") {
        config.congress.utc_offset_minutes = offset
            .parse()
            .context("Invalid CONGRESS_UTC_OFFSET_MINUTES")?;
    }
    if let Some(fee) = lookup("REGISTRATION_FEE_CENTS") {
        config.congress.registration_fee_cents =
            fee.parse().context("Invalid REGISTRATION_FEE_CENTS")?;
    }
    if let (Some(email), Some(password)) = (
        lookup("BOOTSTRAP_ADMIN_EMAIL"),
        lookup("BOOTSTRAP_ADMIN_PASSWORD"),
    ) {
        config.bootstrap_admin = Some(BootstrapAdmin {
            email,
            password,
            full_name: lookup("BOOTSTRAP_ADMIN_NAME")
                .unwrap_or_else(|| "Congress Administrator".to_string()),
        });
    }
    Ok(())
}

/// Validate the merged configuration and fill in generated dev secrets
pub fn finalize(mut config: AppConfig) -> Result<AppConfig> {
    if config.auth.jwt_secret.is_empty() {
        if config.environment.is_production() {
            bail!("Security error: JWT_SECRET must be set in production");
        }
        use rand::RngCore;
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        config.auth.jwt_secret = hex::encode(key);
        info!("DEV MODE: Generated random JWT_SECRET");
    }
    if config.congress.offset().is_none() {
        bail!(
            "Invalid congress UTC offset: {} minutes",
            config.congress.utc_offset_minutes
        );
    }
    if config.congress.registration_fee_cents < 0 {
        bail!("Registration fee must not be negative");
    }
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&config.auth.token_ttl_minutes) {
        bail!(
            "Token lifetime must be between 1 and {} minutes, got {}",
            MAX_TOKEN_TTL_MINUTES,
            config.auth.token_ttl_minutes
        );
    }
    if config.auth.password_iterations == 0 {
        bail!("Password iteration count must be positive");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.backend, StorageKind::Postgres);
        assert_eq!(config.auth.min_password_length, 8);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config = from_toml_str(
            r#"
            environment = "prod"

            [server]
            port = 8080

            [congress]
            name = "CONTEC 2026"
            utc_offset_minutes = -360
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.congress.name, "CONTEC 2026");
        assert_eq!(config.congress.offset().unwrap().local_minus_utc(), -360 * 60);
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("SERVER_PORT", "9000"),
            ("STORAGE_BACKEND", "memory"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "changeme123"),
        ]);
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.backend, StorageKind::Memory);
        assert_eq!(config.server.allowed_origins.len(), 2);
        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.email, "root@example.com");
        assert_eq!(admin.full_name, "Congress Administrator");
    }

    #[test]
    fn test_invalid_env_value() {
        let vars = env(&[("SERVER_PORT", "not-a-port")]);
        let mut config = AppConfig::default();
        assert!(apply_env_overrides(&mut config, |k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_prod_requires_secret() {
        let mut config = AppConfig::default();
        config.environment = Environment::Prod;
        assert!(finalize(config.clone()).is_err());

        config.auth.jwt_secret = "s3cret".to_string();
        assert!(finalize(config).is_ok());
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = AppConfig::default();
        config.auth.token_ttl_minutes = 10_000_000_000_000;
        assert!(finalize(config.clone()).is_err());

        config.auth.token_ttl_minutes = 0;
        assert!(finalize(config.clone()).is_err());

        config.auth.token_ttl_minutes = MAX_TOKEN_TTL_MINUTES;
        assert!(finalize(config).is_ok());
    }

    #[test]
    fn test_dev_generates_secret() {
        let config = finalize(AppConfig::default()).unwrap();
        assert_eq!(config.auth.jwt_secret.len(), 64);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\ntoken_ttl_minutes = 60\njwt_secret = \"abc\"").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.auth.token_ttl_minutes, 60);
    }
}
