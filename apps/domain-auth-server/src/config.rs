//! Layered server configuration: defaults, then YAML, then `APP__*` env,
//! then CLI overrides.

use anyhow::{Context, Result};
use domain_auth::DomainAuthConfig;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Environment variable prefix; nesting uses `__`, e.g.
/// `APP__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub domain_auth: DomainAuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_owned(),
            port: 8087,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info` or `info,domain_auth=debug`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Self = figment.extract().context("failed to load configuration")?;
        config
            .domain_auth
            .validate()
            .context("invalid domain_auth configuration")?;
        Ok(config)
    }

    /// `-v` info, `-vv` debug, `-vvv` trace
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.port = port;
        }
        match verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.bind_addr, self.server.port);
        addr.parse()
            .with_context(|| format!("invalid bind address '{addr}'"))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 8087);
            assert_eq!(config.logging.level, "info");
            assert_eq!(config.domain_auth.tenant_path_param, "domain");
            assert!(config.domain_auth.tenants.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_yaml_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "domain-auth.yaml",
                r"
server:
  port: 9000
domain_auth:
  allow_superuser_admins: true
  tenants:
    - name: acme.com
    - name: acme.io
      primary: false
",
            )?;
            jail.set_env("APP__SERVER__BIND_ADDR", "0.0.0.0");
            jail.set_env("APP__DOMAIN_AUTH__ADMIN_CACHE__TTL_SECONDS", "30");

            let config =
                AppConfig::load(Some(Path::new("domain-auth.yaml"))).map_err(|e| e.to_string())?;

            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.bind_addr, "0.0.0.0");
            assert!(config.domain_auth.allow_superuser_admins);
            assert_eq!(config.domain_auth.admin_cache.ttl_seconds, 30);
            assert_eq!(config.domain_auth.tenants.len(), 2);
            assert!(!config.domain_auth.tenants[1].primary);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_domain_auth_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "domain-auth.yaml",
                r"
domain_auth:
  tenants:
    - name: acme.com
    - name: acme.com
",
            )?;

            let err = AppConfig::load(Some(Path::new("domain-auth.yaml"))).unwrap_err();
            assert!(format!("{err:#}").contains("duplicate tenant"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_is_an_error() {
        Jail::expect_with(|_jail| {
            assert!(AppConfig::load(Some(Path::new("absent.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        config.apply_cli_overrides(Some(3000), 2);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:3000".parse::<SocketAddr>().unwrap()
        );
    }
}
