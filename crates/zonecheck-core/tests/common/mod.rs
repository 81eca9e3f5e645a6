//! Test doubles and common utilities for contract tests
//!
//! `ScriptedZoneClient` replays a fixed sequence of show results so poller
//! behaviour can be checked call by call. Scenario-level tests use
//! `MemoryZoneService` instead.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zonecheck_core::{
    ApiResponse, Error, ListParams, MemoryZoneService, PollConfig, Result, ShowParams,
    TestContext, Zone, ZoneAction, ZoneAttributes, ZoneClient, ZoneList, ZoneStatus, ZoneUpdate,
};

pub const PRIMARY_TENANT: &str = "tenant-primary";
pub const ALT_TENANT: &str = "tenant-alt";
pub const ADMIN_TENANT: &str = "tenant-admin";

/// One scripted reply to `show_zone`
pub enum Step {
    Status(ZoneStatus),
    Fail(Error),
}

/// A zone client whose `show_zone` replays a script
///
/// Once the script is exhausted the last step repeats forever. Mutating
/// calls are counted but otherwise unsupported.
pub struct ScriptedZoneClient {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<ZoneStatus>>,
    show_params: Mutex<Vec<ShowParams>>,
    show_call_count: Arc<AtomicUsize>,
    delete_call_count: Arc<AtomicUsize>,
}

impl ScriptedZoneClient {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            show_params: Mutex::new(Vec::new()),
            show_call_count: Arc::new(AtomicUsize::new(0)),
            delete_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always report `status`
    pub fn constant(status: ZoneStatus) -> Self {
        Self::new(vec![Step::Status(status)])
    }

    pub fn show_call_count(&self) -> usize {
        self.show_call_count.load(Ordering::SeqCst)
    }

    /// Parameters of every `show_zone` call, in order
    pub fn show_params(&self) -> Vec<ShowParams> {
        self.show_params.lock().unwrap().clone()
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ZoneClient for ScriptedZoneClient {
    async fn create_zone(&self, _attrs: &ZoneAttributes) -> Result<ApiResponse<Zone>> {
        Err(Error::Other("create not scripted".to_string()))
    }

    async fn show_zone(&self, id: &str, params: &ShowParams) -> Result<ApiResponse<Zone>> {
        self.show_call_count.fetch_add(1, Ordering::SeqCst);
        self.show_params.lock().unwrap().push(*params);

        let step = self.steps.lock().unwrap().pop_front();
        let status = match step {
            Some(Step::Status(status)) => {
                *self.last.lock().unwrap() = Some(status);
                status
            }
            Some(Step::Fail(e)) => return Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .ok_or_else(|| Error::not_found(format!("Could not find Zone {}", id)))?,
        };

        Ok(ApiResponse::new(200, zone(id, status)))
    }

    async fn list_zones(&self, _params: &ListParams) -> Result<ApiResponse<ZoneList>> {
        Ok(ApiResponse::new(200, ZoneList::default()))
    }

    async fn update_zone(&self, _id: &str, _update: &ZoneUpdate) -> Result<ApiResponse<Zone>> {
        Err(Error::Other("update not scripted".to_string()))
    }

    async fn delete_zone(&self, id: &str) -> Result<ApiResponse<Zone>> {
        self.delete_call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::not_found(format!("Could not find Zone {}", id)))
    }

    fn identity(&self) -> &str {
        "scripted"
    }
}

/// A minimal zone snapshot with the given status
pub fn zone(id: &str, status: ZoneStatus) -> Zone {
    let action = match status {
        ZoneStatus::Active => ZoneAction::None,
        ZoneStatus::Deleted => ZoneAction::Delete,
        _ => ZoneAction::Create,
    };

    Zone {
        id: id.to_string(),
        name: "example.com.".to_string(),
        email: Some("admin@example.com".to_string()),
        ttl: Some(3600),
        description: None,
        project_id: Some(PRIMARY_TENANT.to_string()),
        pool_id: None,
        zone_type: Default::default(),
        masters: Vec::new(),
        serial: Some(1),
        status,
        action,
        version: Some(1),
        created_at: None,
        updated_at: None,
        links: BTreeMap::new(),
    }
}

/// Poll settings small enough for paused-clock tests
pub fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        interval_secs: 1,
    }
}

/// Context with primary, alt and admin identities on one memory service
pub fn full_context(service: &MemoryZoneService) -> TestContext {
    TestContext::new(service.client(PRIMARY_TENANT))
        .with_alt(service.client(ALT_TENANT))
        .with_admin(service.admin_client(ADMIN_TENANT))
        .with_poll(fast_poll(20))
}

/// Attributes for a primary zone with an email set
pub fn attrs(name: &str) -> ZoneAttributes {
    ZoneAttributes::new(name).with_email("admin@example.com")
}
