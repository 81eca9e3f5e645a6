// # Zone Client Trait
//
// Defines the request/response interface to the remote zone service.
//
// ## Implementations
//
// - Designate v2 over HTTP: `zonecheck-designate` crate
// - In-process simulation: `zonecheck_core::memory::MemoryZoneService`
//
// ## Usage
//
// ```rust,ignore
// use zonecheck_core::{ZoneClient, ZoneAttributes};
//
// let ack = client.create_zone(&ZoneAttributes::new("example.com.")).await?;
// assert_eq!(ack.status, 202);
// ```

use async_trait::async_trait;

use crate::config::IdentityConfig;
use crate::error::Result;
use crate::zone::{Zone, ZoneAttributes, ZoneList, ZoneStatus, ZoneUpdate};

/// A decoded response together with its HTTP status code
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// HTTP status code returned by the service
    pub status: u16,
    /// Decoded response body
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub fn new(status: u16, body: T) -> Self {
        Self { status, body }
    }

    pub fn into_body(self) -> T {
        self.body
    }
}

/// Query parameters for fetching a single zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowParams {
    /// Look across all tenants (admin only)
    pub all_projects: bool,
}

impl ShowParams {
    pub fn all_projects() -> Self {
        Self { all_projects: true }
    }
}

/// Query parameters for listing zones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub name: Option<String>,
    pub status: Option<ZoneStatus>,
    pub limit: Option<u32>,
    pub all_projects: bool,
}

impl ListParams {
    /// Render as query pairs in a stable order
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(ref name) = self.name {
            query.push(("name", name.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if self.all_projects {
            query.push(("all_projects", "True".to_string()));
        }
        query
    }
}

/// Client for the remote zone service, bound to one identity
///
/// Every call is a single request. Implementations must not retry or wait
/// for convergence; that belongs to [`crate::poller::StatePoller`].
///
/// Errors must be classified: a 404 becomes [`crate::Error::NotFound`],
/// 409 [`crate::Error::Conflict`], 403 [`crate::Error::Forbidden`].
#[async_trait]
pub trait ZoneClient: Send + Sync {
    /// Create a zone; the acknowledgment is expected to be CREATE + PENDING
    async fn create_zone(&self, attrs: &ZoneAttributes) -> Result<ApiResponse<Zone>>;

    /// Fetch a zone by id
    async fn show_zone(&self, id: &str, params: &ShowParams) -> Result<ApiResponse<Zone>>;

    /// List zones visible to this identity
    async fn list_zones(&self, params: &ListParams) -> Result<ApiResponse<ZoneList>>;

    /// Apply a partial update; the acknowledgment is expected to be UPDATE + PENDING
    async fn update_zone(&self, id: &str, update: &ZoneUpdate) -> Result<ApiResponse<Zone>>;

    /// Delete a zone; the acknowledgment is expected to be DELETE + PENDING
    async fn delete_zone(&self, id: &str) -> Result<ApiResponse<Zone>>;

    /// Name of the identity this client acts as (for logging)
    fn identity(&self) -> &str;
}

/// Produces clients bound to a configured identity
pub trait ZoneClientFactory: Send + Sync {
    /// Create a client acting as `identity`
    fn client_for(&self, identity: &IdentityConfig) -> Result<std::sync::Arc<dyn ZoneClient>>;
}
