//! Per-run test context
//!
//! Built once per run and handed to every scenario by reference. Holds one
//! client per identity plus the poll and naming settings.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::config::{PollConfig, ZoneDefaults, ZonecheckConfig};
use crate::error::{Error, Result};
use crate::names;
use crate::poller::StatePoller;
use crate::traits::{ZoneClient, ZoneClientFactory};
use crate::zone::ZoneAttributes;

/// The roles a scenario can act as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Owner of the zones under test
    Primary,
    /// Unrelated second tenant
    Alt,
    /// Cloud admin
    Admin,
}

impl Identity {
    pub fn as_str(self) -> &'static str {
        match self {
            Identity::Primary => "primary",
            Identity::Alt => "alt",
            Identity::Admin => "admin",
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clients and settings shared by every scenario in a run
#[derive(Clone)]
pub struct TestContext {
    primary: Arc<dyn ZoneClient>,
    alt: Option<Arc<dyn ZoneClient>>,
    admin: Option<Arc<dyn ZoneClient>>,
    poll: PollConfig,
    zones: ZoneDefaults,
}

impl TestContext {
    /// Create a context with only a primary identity
    pub fn new(primary: Arc<dyn ZoneClient>) -> Self {
        Self {
            primary,
            alt: None,
            admin: None,
            poll: PollConfig::default(),
            zones: ZoneDefaults::default(),
        }
    }

    /// Build every configured identity's client through `factory`
    pub fn from_config(config: &ZonecheckConfig, factory: &dyn ZoneClientFactory) -> Result<Self> {
        config.validate()?;

        let identities = &config.identities;
        let alt = identities
            .alt
            .as_ref()
            .map(|identity| factory.client_for(identity))
            .transpose()?;
        let admin = identities
            .admin
            .as_ref()
            .map(|identity| factory.client_for(identity))
            .transpose()?;

        let context = Self {
            primary: factory.client_for(&identities.primary)?,
            alt,
            admin,
            poll: config.poll,
            zones: config.zones.clone(),
        };

        info!(
            "Test context ready (alt: {}, admin: {})",
            context.alt.is_some(),
            context.admin.is_some()
        );
        Ok(context)
    }

    pub fn with_alt(mut self, client: Arc<dyn ZoneClient>) -> Self {
        self.alt = Some(client);
        self
    }

    pub fn with_admin(mut self, client: Arc<dyn ZoneClient>) -> Self {
        self.admin = Some(client);
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_zone_defaults(mut self, zones: ZoneDefaults) -> Self {
        self.zones = zones;
        self
    }

    /// Whether a client for `identity` is available
    pub fn has(&self, identity: Identity) -> bool {
        match identity {
            Identity::Primary => true,
            Identity::Alt => self.alt.is_some(),
            Identity::Admin => self.admin.is_some(),
        }
    }

    /// Client acting as `identity`
    pub fn client(&self, identity: Identity) -> Result<Arc<dyn ZoneClient>> {
        let client = match identity {
            Identity::Primary => Some(&self.primary),
            Identity::Alt => self.alt.as_ref(),
            Identity::Admin => self.admin.as_ref(),
        };

        client
            .cloned()
            .ok_or_else(|| Error::config(format!("No credentials configured for the {} identity", identity)))
    }

    pub fn primary(&self) -> Arc<dyn ZoneClient> {
        Arc::clone(&self.primary)
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// A poller using this run's budget
    pub fn poller(&self) -> StatePoller {
        StatePoller::new(&self.poll)
    }

    pub fn zone_defaults(&self) -> &ZoneDefaults {
        &self.zones
    }

    /// Attributes for a fresh, randomly named zone
    pub fn zone_attributes(&self) -> ZoneAttributes {
        let name = names::rand_zone_name(&self.zones.name_prefix, &self.zones.suffix);
        self.zone_attributes_named(name)
    }

    /// Attributes for a zone with a fixed name
    pub fn zone_attributes_named(&self, name: impl Into<String>) -> ZoneAttributes {
        let name = names::absolute(&name.into());
        let description = format!("zonecheck zone {}", name);
        ZoneAttributes::new(name)
            .with_email(self.zones.email.clone())
            .with_ttl(self.zones.ttl)
            .with_description(description)
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("primary", &self.primary.identity())
            .field("alt", &self.alt.as_ref().map(|c| c.identity().to_string()))
            .field("admin", &self.admin.as_ref().map(|c| c.identity().to_string()))
            .field("poll", &self.poll)
            .field("zones", &self.zones)
            .finish()
    }
}
