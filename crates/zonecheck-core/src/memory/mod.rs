// # Memory Zone Service
//
// In-process simulation of the remote zone service.
//
// ## Purpose
//
// Exercises the poller, cleanup stack and scenarios without a live
// deployment. It reproduces the parts of the service's behaviour the suite
// depends on:
//
// - Mutating calls return `<ACTION>` + `PENDING` immediately
// - Zones converge after a number of observations (`show` calls), so
//   pollers really have to poll
// - Deleted zones disappear (404) once the delete converges
// - Ownership policy: duplicate names are a Conflict; creating a sub- or
//   super-domain of another tenant's zone is Forbidden
// - Tenants only see their own zones; admins see everything with
//   `all_projects`
//
// ## Fault Injection
//
// - `fail_provisioning(name)`: the zone converges to ERROR instead of ACTIVE
// - `stall(id)`: the zone stays PENDING forever

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::IdentityConfig;
use crate::error::{Error, Result};
use crate::names;
use crate::traits::{ApiResponse, ListParams, ShowParams, ZoneClient, ZoneClientFactory};
use crate::zone::{Zone, ZoneAction, ZoneAttributes, ZoneList, ZoneStatus, ZoneType, ZoneUpdate, ListMetadata};

/// Pool every simulated zone is placed in
const DEFAULT_POOL_ID: &str = "794ccc2c-d751-44fe-b57f-8894c9f5c842";

/// Default number of PENDING observations before a zone converges
const DEFAULT_CONVERGENCE_POLLS: u32 = 2;

struct StoredZone {
    zone: Zone,
    owner: String,
    /// PENDING observations left before the in-flight action converges
    remaining: u32,
    fail: bool,
    stalled: bool,
}

#[derive(Default)]
struct ServiceState {
    zones: BTreeMap<String, StoredZone>,
    failing_names: HashSet<String>,
}

/// Simulated zone service shared by every client it hands out
///
/// # Example
///
/// ```rust,no_run
/// use zonecheck_core::memory::MemoryZoneService;
/// use zonecheck_core::{ShowParams, ZoneAttributes, ZoneClient};
///
/// #[tokio::main]
/// async fn main() -> zonecheck_core::Result<()> {
///     let service = MemoryZoneService::new();
///     let client = service.client("tenant-a");
///
///     let ack = client
///         .create_zone(&ZoneAttributes::new("example.com.").with_email("a@example.com"))
///         .await?;
///     assert_eq!(ack.status, 202);
///
///     let zone = client.show_zone(&ack.body.id, &ShowParams::default()).await?;
///     assert_eq!(zone.body.name, "example.com.");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct MemoryZoneService {
    inner: Arc<RwLock<ServiceState>>,
    convergence_polls: u32,
}

impl MemoryZoneService {
    /// Create an empty service with the default convergence delay
    pub fn new() -> Self {
        Self::with_convergence_polls(DEFAULT_CONVERGENCE_POLLS)
    }

    /// Create an empty service where zones report PENDING for `polls`
    /// observations before converging (0 = converge on first observation)
    pub fn with_convergence_polls(polls: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ServiceState::default())),
            convergence_polls: polls,
        }
    }

    /// A client acting as a regular member of `tenant`
    pub fn client(&self, tenant: impl Into<String>) -> Arc<dyn ZoneClient> {
        let tenant = tenant.into();
        Arc::new(MemoryZoneClient {
            service: self.clone(),
            identity: tenant.clone(),
            tenant,
            admin: false,
        })
    }

    /// A client acting as an admin of `tenant`
    pub fn admin_client(&self, tenant: impl Into<String>) -> Arc<dyn ZoneClient> {
        let tenant = tenant.into();
        Arc::new(MemoryZoneClient {
            service: self.clone(),
            identity: format!("{} (admin)", tenant),
            tenant,
            admin: true,
        })
    }

    /// Make zones with this name converge to ERROR
    pub async fn fail_provisioning(&self, name: &str) {
        let mut guard = self.inner.write().await;
        guard.failing_names.insert(names::absolute(&name.to_ascii_lowercase()));
    }

    /// Keep a zone PENDING forever
    pub async fn stall(&self, id: &str) -> Result<()> {
        let mut guard = self.inner.write().await;
        let stored = guard
            .zones
            .get_mut(id)
            .ok_or_else(|| Error::not_found(format!("Zone {} not found", id)))?;
        stored.stalled = true;
        Ok(())
    }

    /// Number of zones currently stored (any tenant, any status)
    pub async fn len(&self) -> usize {
        self.inner.read().await.zones.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.zones.is_empty()
    }

    /// Names of the zones owned by `tenant`, excluding deletes in flight
    pub async fn zone_names(&self, tenant: &str) -> Vec<String> {
        let guard = self.inner.read().await;
        guard
            .zones
            .values()
            .filter(|stored| stored.owner == tenant && stored.zone.action != ZoneAction::Delete)
            .map(|stored| stored.zone.name.clone())
            .collect()
    }

    async fn create(&self, tenant: &str, attrs: &ZoneAttributes) -> Result<Zone> {
        validate_name(&attrs.name)?;
        let zone_type = attrs.zone_type.unwrap_or_default();
        if zone_type == ZoneType::Primary && attrs.email.is_none() {
            return Err(Error::api(400, "email is required for PRIMARY zones"));
        }

        let name = names::absolute(&attrs.name.to_ascii_lowercase());
        let mut guard = self.inner.write().await;

        for existing in guard.zones.values() {
            if names::same_name(&existing.zone.name, &name) {
                return Err(Error::conflict("Duplicate Zone"));
            }
            if existing.owner == tenant {
                continue;
            }
            if names::is_subdomain_of(&name, &existing.zone.name) {
                return Err(Error::forbidden(
                    "Unable to create subzone in another tenants zone",
                ));
            }
            if names::is_subdomain_of(&existing.zone.name, &name) {
                return Err(Error::forbidden(
                    "Unable to create zone because another tenant owns a subzone of the zone",
                ));
            }
        }

        let id = rand_id();
        let now = Utc::now();
        let zone = Zone {
            id: id.clone(),
            name: name.clone(),
            email: attrs.email.clone(),
            ttl: attrs.ttl.or(Some(3600)),
            description: attrs.description.clone(),
            project_id: Some(tenant.to_string()),
            pool_id: Some(DEFAULT_POOL_ID.to_string()),
            zone_type,
            masters: attrs.masters.clone(),
            serial: Some(now.timestamp() as u64),
            status: ZoneStatus::Pending,
            action: ZoneAction::Create,
            version: Some(1),
            created_at: Some(now.naive_utc()),
            updated_at: None,
            links: BTreeMap::from([("self".to_string(), format!("memory://v2/zones/{}", id))]),
        };

        let fail = guard.failing_names.contains(&name);
        guard.zones.insert(
            id.clone(),
            StoredZone {
                zone: zone.clone(),
                owner: tenant.to_string(),
                remaining: self.convergence_polls,
                fail,
                stalled: false,
            },
        );

        debug!("[memory] {} created zone {} ({})", tenant, name, id);
        Ok(zone)
    }

    async fn show(&self, tenant: &str, admin: bool, id: &str, params: &ShowParams) -> Result<Zone> {
        if params.all_projects && !admin {
            return Err(Error::forbidden("all_projects requires the admin role"));
        }

        let mut guard = self.inner.write().await;
        let visible = guard
            .zones
            .get(id)
            .is_some_and(|stored| stored.owner == tenant || params.all_projects);
        if !visible {
            return Err(Error::not_found(format!("Could not find Zone {}", id)));
        }

        let Some(stored) = guard.zones.get_mut(id) else {
            return Err(Error::not_found(format!("Could not find Zone {}", id)));
        };

        if stored.zone.status == ZoneStatus::Pending && !stored.stalled {
            if stored.remaining > 0 {
                stored.remaining -= 1;
            } else {
                converge(stored);
            }
        }

        let snapshot = stored.zone.clone();
        if snapshot.status == ZoneStatus::Deleted {
            guard.zones.remove(id);
            debug!("[memory] zone {} deleted", id);
            return Err(Error::not_found(format!("Could not find Zone {}", id)));
        }

        Ok(snapshot)
    }

    async fn list(&self, tenant: &str, admin: bool, params: &ListParams) -> Result<ZoneList> {
        if params.all_projects && !admin {
            return Err(Error::forbidden("all_projects requires the admin role"));
        }

        let guard = self.inner.read().await;
        let mut zones: Vec<Zone> = guard
            .zones
            .values()
            .filter(|stored| stored.owner == tenant || params.all_projects)
            .filter(|stored| {
                params
                    .name
                    .as_ref()
                    .is_none_or(|name| names::same_name(name, &stored.zone.name))
            })
            .filter(|stored| params.status.is_none_or(|status| stored.zone.status == status))
            .map(|stored| stored.zone.clone())
            .collect();
        let total = zones.len() as u64;

        if let Some(limit) = params.limit {
            zones.truncate(limit as usize);
        }

        Ok(ZoneList {
            zones,
            links: BTreeMap::from([("self".to_string(), "memory://v2/zones".to_string())]),
            metadata: Some(ListMetadata {
                total_count: Some(total),
            }),
        })
    }

    async fn update(&self, tenant: &str, id: &str, update: &ZoneUpdate) -> Result<Zone> {
        if update.is_empty() {
            return Err(Error::api(400, "Update request carries no changes"));
        }

        let mut guard = self.inner.write().await;
        let stored = owned_zone(&mut guard, tenant, id)?;

        if stored.zone.action == ZoneAction::Delete {
            return Err(Error::api(400, "Zone is being deleted"));
        }

        if let Some(ref email) = update.email {
            stored.zone.email = Some(email.clone());
        }
        if let Some(ttl) = update.ttl {
            stored.zone.ttl = Some(ttl);
        }
        if let Some(ref description) = update.description {
            stored.zone.description = Some(description.clone());
        }

        stored.zone.action = ZoneAction::Update;
        stored.zone.status = ZoneStatus::Pending;
        stored.zone.version = stored.zone.version.map(|v| v + 1);
        stored.zone.serial = stored.zone.serial.map(|s| s + 1);
        stored.zone.updated_at = Some(Utc::now().naive_utc());
        stored.remaining = self.convergence_polls;

        debug!("[memory] {} updated zone {}", tenant, id);
        Ok(stored.zone.clone())
    }

    async fn delete(&self, tenant: &str, id: &str) -> Result<Zone> {
        let mut guard = self.inner.write().await;
        let stored = owned_zone(&mut guard, tenant, id)?;

        stored.zone.action = ZoneAction::Delete;
        stored.zone.status = ZoneStatus::Pending;
        stored.zone.version = stored.zone.version.map(|v| v + 1);
        stored.zone.updated_at = Some(Utc::now().naive_utc());
        stored.remaining = self.convergence_polls;
        stored.fail = false;

        debug!("[memory] {} deleting zone {}", tenant, id);
        Ok(stored.zone.clone())
    }
}

impl Default for MemoryZoneService {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneClientFactory for MemoryZoneService {
    /// Tenants are keyed by project id, falling back to the identity name
    fn client_for(&self, identity: &IdentityConfig) -> Result<Arc<dyn ZoneClient>> {
        identity.validate()?;
        let tenant = identity
            .project_id
            .clone()
            .unwrap_or_else(|| identity.name.clone());

        Ok(if identity.admin {
            self.admin_client(tenant)
        } else {
            self.client(tenant)
        })
    }
}

fn owned_zone<'a>(state: &'a mut ServiceState, tenant: &str, id: &str) -> Result<&'a mut StoredZone> {
    state
        .zones
        .get_mut(id)
        .filter(|stored| stored.owner == tenant)
        .ok_or_else(|| Error::not_found(format!("Could not find Zone {}", id)))
}

/// Apply the end state of the in-flight action
fn converge(stored: &mut StoredZone) {
    let zone = &mut stored.zone;
    match zone.action {
        ZoneAction::Delete => {
            zone.status = ZoneStatus::Deleted;
        }
        _ if stored.fail => {
            zone.status = ZoneStatus::Error;
        }
        _ => {
            zone.status = ZoneStatus::Active;
            zone.action = ZoneAction::None;
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if !name.ends_with('.') {
        return Err(Error::api(400, format!("Zone name '{}' is not fully qualified", name)));
    }

    let labels: Vec<&str> = name.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 {
        return Err(Error::api(400, format!("Zone name '{}' is a TLD", name)));
    }
    for label in labels {
        if label.is_empty() || label.len() > 63 {
            return Err(Error::api(400, format!("Zone name '{}' has an invalid label", name)));
        }
    }
    Ok(())
}

fn rand_id() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        rng.gen_range(0..=u32::MAX),
        rng.gen_range(0..=u16::MAX),
        rng.gen_range(0..0x1000u16),
        rng.gen_range(0x8000..=0xbfffu16),
        rng.gen_range(0..=0xffff_ffff_ffffu64),
    )
}

/// Client bound to one tenant of a [`MemoryZoneService`]
struct MemoryZoneClient {
    service: MemoryZoneService,
    identity: String,
    tenant: String,
    admin: bool,
}

#[async_trait]
impl ZoneClient for MemoryZoneClient {
    async fn create_zone(&self, attrs: &ZoneAttributes) -> Result<ApiResponse<Zone>> {
        let zone = self.service.create(&self.tenant, attrs).await?;
        Ok(ApiResponse::new(202, zone))
    }

    async fn show_zone(&self, id: &str, params: &ShowParams) -> Result<ApiResponse<Zone>> {
        let zone = self.service.show(&self.tenant, self.admin, id, params).await?;
        Ok(ApiResponse::new(200, zone))
    }

    async fn list_zones(&self, params: &ListParams) -> Result<ApiResponse<ZoneList>> {
        let list = self.service.list(&self.tenant, self.admin, params).await?;
        Ok(ApiResponse::new(200, list))
    }

    async fn update_zone(&self, id: &str, update: &ZoneUpdate) -> Result<ApiResponse<Zone>> {
        let zone = self.service.update(&self.tenant, id, update).await?;
        Ok(ApiResponse::new(202, zone))
    }

    async fn delete_zone(&self, id: &str) -> Result<ApiResponse<Zone>> {
        let zone = self.service.delete(&self.tenant, id).await?;
        Ok(ApiResponse::new(202, zone))
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}
