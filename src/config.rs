use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Duration;

use crate::auth::AuthManager;
use crate::core::{Role, TenantId};
use crate::validation::rules::PatternRule;

/// Library-level settings shared by every engine component.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Roles granted allow-all rows on every newly declared entity.
    pub standard_roles: Vec<Role>,
    pub pattern_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            standard_roles: vec![Role::admin(), Role::from("user")],
            pattern_cache_size: PatternRule::DEFAULT_CACHE_SIZE,
        }
    }
}

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: Option<PathBuf>,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_tenant: TenantId,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_string("UNIVERA_BIND_ADDR", "127.0.0.1:8000")
            .parse::<SocketAddr>()
            .context("UNIVERA_BIND_ADDR must be a valid host:port")?;

        let data_dir = std::env::var("UNIVERA_DATA_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        // A UUID is taken as-is; any other value names the tenant.
        let admin_tenant = match std::env::var("UNIVERA_ADMIN_TENANT") {
            Ok(value) => value
                .parse::<TenantId>()
                .unwrap_or_else(|_| TenantId::from_name(&value)),
            Err(_) => TenantId::new(),
        };

        let token_ttl = parse_token_ttl(&env_string(
            "UNIVERA_TOKEN_TTL_MINUTES",
            &AuthManager::DEFAULT_TOKEN_TTL_MINUTES.to_string(),
        ))?;

        let bcrypt_cost = env_string("UNIVERA_BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())
            .parse::<u32>()
            .context("UNIVERA_BCRYPT_COST must be an integer")?;

        let standard_roles = parse_roles(&env_string("UNIVERA_STANDARD_ROLES", "admin,user"));

        Ok(Self {
            bind_addr,
            data_dir,
            admin_username: env_string("UNIVERA_ADMIN_USERNAME", "admin"),
            admin_password: env_string("UNIVERA_ADMIN_PASSWORD", "adminpass"),
            admin_tenant,
            token_ttl,
            bcrypt_cost,
            engine: EngineConfig {
                standard_roles,
                ..EngineConfig::default()
            },
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_token_ttl(raw: &str) -> Result<Duration> {
    let minutes = raw
        .trim()
        .parse::<i64>()
        .context("UNIVERA_TOKEN_TTL_MINUTES must be an integer")?;
    if minutes <= 0 {
        return Err(anyhow!("UNIVERA_TOKEN_TTL_MINUTES must be positive"));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| anyhow!("UNIVERA_TOKEN_TTL_MINUTES is out of range: {}", minutes))
}

fn parse_roles(raw: &str) -> Vec<Role> {
    raw.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(Role::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        let roles = parse_roles(" admin, user ,,viewer");
        let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
        assert_eq!(names, vec!["admin", "user", "viewer"]);
    }

    #[test]
    fn test_parse_token_ttl() {
        assert_eq!(parse_token_ttl(" 30 ").unwrap(), Duration::minutes(30));
        assert!(parse_token_ttl("soon").is_err());
        assert!(parse_token_ttl("0").is_err());
        assert!(parse_token_ttl("-5").is_err());
        assert!(parse_token_ttl(&i64::MAX.to_string()).is_err());
    }

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert!(config.standard_roles.iter().any(Role::is_admin));
        assert_eq!(config.pattern_cache_size, PatternRule::DEFAULT_CACHE_SIZE);
    }
}
