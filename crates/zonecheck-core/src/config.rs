//! Configuration types for the zonecheck suite
//!
//! Everything a run needs: where the service lives, which identities to act
//! as, how long to wait for convergence, and how to name scenario zones.
//! Values come from `ZONECHECK_*` environment variables via
//! [`ZonecheckConfig::from_env`], or are built directly in tests.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main zonecheck configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonecheckConfig {
    /// Remote service endpoint
    pub endpoint: EndpointConfig,

    /// Identities used by scenarios
    pub identities: IdentitiesConfig,

    /// Convergence polling settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Defaults for generated zones
    #[serde(default)]
    pub zones: ZoneDefaults,
}

impl ZonecheckConfig {
    /// Create a configuration for a single primary identity with defaults
    pub fn new(url: impl Into<String>, primary: IdentityConfig) -> Self {
        Self {
            endpoint: EndpointConfig::new(url),
            identities: IdentitiesConfig {
                primary,
                alt: None,
                admin: None,
            },
            poll: PollConfig::default(),
            zones: ZoneDefaults::default(),
        }
    }

    /// Load configuration from `ZONECHECK_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Unset variables fall back to defaults; set-but-unparsable values are
    /// reported as configuration errors rather than silently defaulted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get("ZONECHECK_ENDPOINT").ok_or_else(|| {
            Error::config(
                "ZONECHECK_ENDPOINT is required. \
                Set it via: export ZONECHECK_ENDPOINT=http://127.0.0.1:9001",
            )
        })?;

        let identity = |role: &str, admin: bool| -> Option<IdentityConfig> {
            let upper = role.to_ascii_uppercase();
            get(&format!("ZONECHECK_{}_TOKEN", upper)).map(|token| IdentityConfig {
                name: role.to_string(),
                auth_token: token,
                project_id: get(&format!("ZONECHECK_{}_PROJECT_ID", upper)),
                admin,
            })
        };

        let primary = identity("primary", false).ok_or_else(|| {
            Error::config(
                "ZONECHECK_PRIMARY_TOKEN is required. \
                Set it via: export ZONECHECK_PRIMARY_TOKEN=<keystone token>",
            )
        })?;

        let config = Self {
            endpoint: EndpointConfig {
                url,
                timeout_secs: parse_var(&get, "ZONECHECK_HTTP_TIMEOUT_SECS", default_timeout_secs())?,
            },
            identities: IdentitiesConfig {
                primary,
                alt: identity("alt", false),
                admin: identity("admin", true),
            },
            poll: PollConfig {
                max_attempts: parse_var(&get, "ZONECHECK_POLL_MAX_ATTEMPTS", default_max_attempts())?,
                interval_secs: parse_var(&get, "ZONECHECK_POLL_INTERVAL_SECS", default_interval_secs())?,
            },
            zones: ZoneDefaults {
                suffix: get("ZONECHECK_ZONE_SUFFIX").unwrap_or_else(default_suffix),
                name_prefix: get("ZONECHECK_ZONE_PREFIX").unwrap_or_else(default_name_prefix),
                email: get("ZONECHECK_ZONE_EMAIL").unwrap_or_else(default_email),
                ttl: parse_var(&get, "ZONECHECK_ZONE_TTL", default_ttl())?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.endpoint.validate()?;
        self.identities.validate()?;
        self.poll.validate()?;
        self.zones.validate()?;
        Ok(())
    }
}

fn parse_var<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("{} has invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

/// Remote service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the DNS API (without the `/v2` suffix)
    pub url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the endpoint configuration
    pub fn validate(&self) -> Result<()> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(Error::config(format!(
                "Endpoint URL must use HTTP or HTTPS scheme. Got: '{}'",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("HTTP timeout must be > 0"));
        }
        Ok(())
    }
}

/// The identities scenarios act as
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitiesConfig {
    /// Owner of the zones a scenario creates
    pub primary: IdentityConfig,

    /// A second, unrelated tenant (ownership scenarios)
    #[serde(default)]
    pub alt: Option<IdentityConfig>,

    /// A cloud admin (cross-tenant read scenarios)
    #[serde(default)]
    pub admin: Option<IdentityConfig>,
}

impl IdentitiesConfig {
    /// Validate the identities configuration
    pub fn validate(&self) -> Result<()> {
        self.primary.validate()?;
        if let Some(ref alt) = self.alt {
            alt.validate()?;
            if alt.auth_token == self.primary.auth_token {
                return Err(Error::config(
                    "Alternate identity must not reuse the primary token",
                ));
            }
        }
        if let Some(ref admin) = self.admin {
            admin.validate()?;
        }
        Ok(())
    }
}

/// Credentials for one identity
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Role name used in logs ("primary", "alt", "admin")
    pub name: String,

    /// Auth token sent with every request
    /// ⚠️ NEVER log this value
    pub auth_token: String,

    /// Project to act on behalf of (sudo), if any
    #[serde(default)]
    pub project_id: Option<String>,

    /// Whether this identity holds the admin role
    #[serde(default)]
    pub admin: bool,
}

// Custom Debug implementation that hides the auth token
impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("name", &self.name)
            .field("auth_token", &"<REDACTED>")
            .field("project_id", &self.project_id)
            .field("admin", &self.admin)
            .finish()
    }
}

impl IdentityConfig {
    pub fn new(name: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auth_token: auth_token.into(),
            project_id: None,
            admin: false,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Validate the identity configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("Identity name cannot be empty"));
        }
        if self.auth_token.is_empty() {
            return Err(Error::config(format!(
                "Auth token for identity '{}' cannot be empty",
                self.name
            )));
        }
        Ok(())
    }
}

/// Convergence polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of fetches before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between fetches (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the poll configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::config("Poll max_attempts must be >= 1"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

/// Largest TTL the service accepts (signed 32-bit)
pub const MAX_ZONE_TTL: u32 = 2_147_483_647;

/// Defaults applied to zones generated by scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDefaults {
    /// Domain under which random zone names are generated
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// First label prefix of generated names
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Zone contact email
    #[serde(default = "default_email")]
    pub email: String,

    /// Zone TTL (in seconds)
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl ZoneDefaults {
    /// Validate the zone defaults
    pub fn validate(&self) -> Result<()> {
        if self.suffix.trim_end_matches('.').is_empty() {
            return Err(Error::config("Zone suffix cannot be empty"));
        }
        if !self.email.contains('@') {
            return Err(Error::config(format!(
                "Zone email '{}' is not an email address",
                self.email
            )));
        }
        if self.ttl == 0 || self.ttl > MAX_ZONE_TTL {
            return Err(Error::config(format!(
                "Zone TTL must be between 1 and {}. Got: {}",
                MAX_ZONE_TTL, self.ttl
            )));
        }
        Ok(())
    }
}

impl Default for ZoneDefaults {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            name_prefix: default_name_prefix(),
            email: default_email(),
            ttl: default_ttl(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    360
}

fn default_interval_secs() -> u64 {
    1
}

fn default_suffix() -> String {
    "example.com.".to_string()
}

fn default_name_prefix() -> String {
    "zonecheck".to_string()
}

fn default_email() -> String {
    "admin@example.com".to_string()
}

fn default_ttl() -> u32 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ZonecheckConfig::from_lookup(lookup(&[
            ("ZONECHECK_ENDPOINT", "http://127.0.0.1:9001"),
            ("ZONECHECK_PRIMARY_TOKEN", "primary-token"),
        ]))
        .unwrap();

        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.poll.max_attempts, 360);
        assert_eq!(config.poll.interval(), Duration::from_secs(1));
        assert_eq!(config.endpoint.timeout(), Duration::from_secs(30));
        assert!(config.identities.alt.is_none());
        assert!(config.identities.admin.is_none());
        assert_eq!(config.zones.suffix, "example.com.");
    }

    #[test]
    fn test_from_lookup_all_identities() {
        let config = ZonecheckConfig::from_lookup(lookup(&[
            ("ZONECHECK_ENDPOINT", "https://dns.example.net"),
            ("ZONECHECK_PRIMARY_TOKEN", "p"),
            ("ZONECHECK_ALT_TOKEN", "a"),
            ("ZONECHECK_ALT_PROJECT_ID", "alt-project"),
            ("ZONECHECK_ADMIN_TOKEN", "x"),
            ("ZONECHECK_POLL_MAX_ATTEMPTS", "5"),
            ("ZONECHECK_POLL_INTERVAL_SECS", "2"),
        ]))
        .unwrap();

        let alt = config.identities.alt.unwrap();
        assert_eq!(alt.name, "alt");
        assert_eq!(alt.project_id.as_deref(), Some("alt-project"));
        assert!(!alt.admin);
        assert!(config.identities.admin.unwrap().admin);
        assert_eq!(config.poll.max_attempts, 5);
        assert_eq!(config.poll.interval_secs, 2);
    }

    #[test]
    fn test_missing_endpoint_is_config_error() {
        let err = ZonecheckConfig::from_lookup(lookup(&[("ZONECHECK_PRIMARY_TOKEN", "p")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let err = ZonecheckConfig::from_lookup(lookup(&[
            ("ZONECHECK_ENDPOINT", "http://127.0.0.1:9001"),
            ("ZONECHECK_PRIMARY_TOKEN", "p"),
            ("ZONECHECK_POLL_MAX_ATTEMPTS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("ZONECHECK_POLL_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let poll = PollConfig {
            max_attempts: 0,
            interval_secs: 1,
        };
        assert!(poll.validate().is_err());
    }

    #[test]
    fn test_zone_ttl_bounds() {
        let mut zones = ZoneDefaults::default();
        assert!(zones.validate().is_ok());

        zones.ttl = MAX_ZONE_TTL;
        assert!(zones.validate().is_ok());

        zones.ttl = u32::MAX;
        assert!(matches!(zones.validate(), Err(Error::Config(_))));

        zones.ttl = 0;
        assert!(zones.validate().is_err());
    }

    #[test]
    fn test_alt_must_differ_from_primary() {
        let mut config = ZonecheckConfig::new(
            "http://127.0.0.1:9001",
            IdentityConfig::new("primary", "same"),
        );
        config.identities.alt = Some(IdentityConfig::new("alt", "same"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_not_exposed_in_debug() {
        let identity = IdentityConfig::new("primary", "secret_token_12345");
        let debug_str = format!("{:?}", identity);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(debug_str.contains("IdentityConfig"));
    }
}
