//! Zone lifecycle and ownership scenarios

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::assertions::{assert_ack, assert_expected, assert_status_code, ensure, expect_error};
use super::{Scenario, SMOKE};
use crate::cleanup::CleanupStack;
use crate::config::MAX_ZONE_TTL;
use crate::context::{Identity, TestContext};
use crate::error::{ErrorKind, Result};
use crate::names;
use crate::traits::{ListParams, ShowParams, ZoneClient};
use crate::zone::{Zone, ZoneAction, ZoneAttributes, ZoneStatus, ZoneUpdate};

/// Every zone scenario, in run order
pub fn all() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(CreateZone),
        Box::new(DeleteZone),
        Box::new(ListZones),
        Box::new(UpdateZone),
        Box::new(GetOtherTenantZone),
        Box::new(NoCreateDuplicateDomain),
        Box::new(NoCreateSubdomainByAltUser),
        Box::new(NoCreateSuperdomainByAltUser),
        Box::new(ListContainsCreatedZone),
    ]
}

const PRIMARY_AND_ALT: &[Identity] = &[Identity::Primary, Identity::Alt];

/// Create a zone and register its deletion
async fn create_zone(
    cleanup: &mut CleanupStack,
    client: &Arc<dyn ZoneClient>,
    attrs: &ZoneAttributes,
) -> Result<Zone> {
    let zone = client.create_zone(attrs).await?.into_body();
    cleanup.delete_zone(Arc::clone(client), zone.id.clone());
    Ok(zone)
}

/// Create a zone, check the CREATE+PENDING ack and wait for ACTIVE
async fn create_active_zone(
    ctx: &TestContext,
    cleanup: &mut CleanupStack,
    attrs: &ZoneAttributes,
) -> Result<Zone> {
    let client = ctx.primary();

    info!("Create a zone as a default user");
    let zone = create_zone(cleanup, &client, attrs).await?;

    info!("Ensure we respond with CREATE+PENDING");
    assert_ack(&zone, ZoneAction::Create)?;

    ctx.poller()
        .wait_for_status(client.as_ref(), &zone.id, ZoneStatus::Active)
        .await?;
    Ok(zone)
}

/// Attempt a create that the service must reject with `kind`
///
/// Nothing is left behind on rejection. If the call unexpectedly succeeds the
/// zone is registered for cleanup before the assertion fails.
async fn expect_create_rejected(
    cleanup: &mut CleanupStack,
    client: &Arc<dyn ZoneClient>,
    attrs: &ZoneAttributes,
    kind: ErrorKind,
) -> Result<()> {
    let result = client.create_zone(attrs).await;
    if let Ok(ref response) = result {
        cleanup.delete_zone(Arc::clone(client), response.body.id.clone());
    }
    expect_error(result.map(|r| r.into_body().name), kind)
}

/// A TTL different from `ttl` that stays within the accepted range
fn changed_ttl(ttl: u32) -> u32 {
    if ttl < MAX_ZONE_TTL { ttl + 1 } else { ttl - 1 }
}

pub struct CreateZone;

#[async_trait]
impl Scenario for CreateZone {
    fn name(&self) -> &'static str {
        "create_zone"
    }

    fn idempotent_id(&self) -> &'static str {
        "9d2e20fc-e56f-4a62-9c61-9752a9ec615c"
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SMOKE]
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let client = ctx.primary();

        info!("Create a zone");
        let zone = create_zone(cleanup, &client, &ctx.zone_attributes()).await?;

        info!("Ensure we respond with CREATE+PENDING");
        assert_ack(&zone, ZoneAction::Create)?;

        ctx.poller()
            .wait_for_status(client.as_ref(), &zone.id, ZoneStatus::Active)
            .await?;

        info!("Re-Fetch the zone");
        let body = client
            .show_zone(&zone.id, &ShowParams::default())
            .await?
            .into_body();

        info!("Ensure the fetched response matches the created zone");
        ensure(
            body.status == ZoneStatus::Active,
            format!("re-fetched zone is {}, expected ACTIVE", body.status),
        )?;
        assert_expected(&zone, &body)
    }
}

pub struct DeleteZone;

#[async_trait]
impl Scenario for DeleteZone {
    fn name(&self) -> &'static str {
        "delete_zone"
    }

    fn idempotent_id(&self) -> &'static str {
        "a4791906-6cd6-4d27-9f15-32273db8bb3d"
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SMOKE]
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let client = ctx.primary();

        info!("Create a zone");
        let zone = create_active_zone(ctx, cleanup, &ctx.zone_attributes()).await?;

        info!("Delete the zone");
        let body = client.delete_zone(&zone.id).await?.into_body();

        info!("Ensure we respond with DELETE+PENDING");
        assert_ack(&body, ZoneAction::Delete)?;

        ctx.poller().wait_for_absence(client.as_ref(), &zone.id).await?;

        info!("Ensure the zone is gone");
        expect_error(
            client.show_zone(&zone.id, &ShowParams::default()).await,
            ErrorKind::NotFound,
        )
    }
}

pub struct ListZones;

#[async_trait]
impl Scenario for ListZones {
    fn name(&self) -> &'static str {
        "list_zones"
    }

    fn idempotent_id(&self) -> &'static str {
        "5bfa3cfe-5bc8-443b-bf48-cfba44cbb247"
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SMOKE]
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let client = ctx.primary();
        let zone = create_active_zone(ctx, cleanup, &ctx.zone_attributes()).await?;

        info!("List zones");
        let body = client.list_zones(&ListParams::default()).await?.into_body();

        ensure(!body.zones.is_empty(), "zone list is empty")?;
        ensure(
            body.contains_id(&zone.id),
            format!("zone {} missing from list", zone.id),
        )
    }
}

pub struct UpdateZone;

#[async_trait]
impl Scenario for UpdateZone {
    fn name(&self) -> &'static str {
        "update_zone"
    }

    fn idempotent_id(&self) -> &'static str {
        "123f51cb-19d5-48a9-aacc-476742c02141"
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SMOKE]
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let client = ctx.primary();
        let zone = create_active_zone(ctx, cleanup, &ctx.zone_attributes()).await?;

        info!("Update the zone");
        let update = ZoneUpdate {
            description: Some(format!("updated zone {}", zone.name)),
            ttl: Some(changed_ttl(zone.ttl.unwrap_or(ctx.zone_defaults().ttl))),
            email: None,
        };
        let response = client.update_zone(&zone.id, &update).await?;

        assert_status_code(response.status, 202)?;
        assert_ack(&response.body, ZoneAction::Update)?;

        let updated = ctx
            .poller()
            .wait_for_status(client.as_ref(), &response.body.id, ZoneStatus::Active)
            .await?;

        ensure(
            updated.description == update.description,
            format!("description not applied: {:?}", updated.description),
        )?;
        ensure(
            updated.ttl == update.ttl,
            format!("ttl not applied: {:?}", updated.ttl),
        )
    }
}

pub struct GetOtherTenantZone;

#[async_trait]
impl Scenario for GetOtherTenantZone {
    fn name(&self) -> &'static str {
        "get_other_tenant_zone"
    }

    fn idempotent_id(&self) -> &'static str {
        "6477f92d-70ba-46eb-bd6c-fc50c405e222"
    }

    fn required_identities(&self) -> &'static [Identity] {
        &[Identity::Primary, Identity::Admin]
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let client = ctx.primary();
        let admin = ctx.client(Identity::Admin)?;

        info!("Create a zone as a user");
        let zone = create_zone(cleanup, &client, &ctx.zone_attributes()).await?;

        info!("Wait for the zone to become ACTIVE, watching as an admin");
        let active = ctx
            .poller()
            .with_show_params(ShowParams::all_projects())
            .wait_for_status(admin.as_ref(), &zone.id, ZoneStatus::Active)
            .await?;
        assert_expected(&zone, &active)?;

        info!("Fetch the zone as an admin");
        let body = admin
            .show_zone(&zone.id, &ShowParams::all_projects())
            .await?
            .into_body();

        info!("Ensure the fetched response matches the created zone");
        assert_expected(&zone, &body)
    }
}

pub struct NoCreateDuplicateDomain;

#[async_trait]
impl Scenario for NoCreateDuplicateDomain {
    fn name(&self) -> &'static str {
        "no_create_duplicate_domain"
    }

    fn idempotent_id(&self) -> &'static str {
        "5d28580a-a012-4b57-b211-e077b1a01340"
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SMOKE]
    }

    fn required_identities(&self) -> &'static [Identity] {
        PRIMARY_AND_ALT
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let alt = ctx.client(Identity::Alt)?;
        let zone = create_active_zone(ctx, cleanup, &ctx.zone_attributes()).await?;

        info!("Create a zone as an alt user with existing domain");
        let attrs = ctx.zone_attributes_named(zone.name.clone());
        expect_create_rejected(cleanup, &alt, &attrs, ErrorKind::Conflict).await
    }
}

pub struct NoCreateSubdomainByAltUser;

#[async_trait]
impl Scenario for NoCreateSubdomainByAltUser {
    fn name(&self) -> &'static str {
        "no_create_subdomain_by_alt_user"
    }

    fn idempotent_id(&self) -> &'static str {
        "a48776fd-b1aa-4a25-9f09-d1d34cfbb175"
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SMOKE]
    }

    fn required_identities(&self) -> &'static [Identity] {
        PRIMARY_AND_ALT
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let alt = ctx.client(Identity::Alt)?;
        let zone = create_active_zone(ctx, cleanup, &ctx.zone_attributes()).await?;

        info!("Create a zone as an alt user with existing subdomain");
        for prefix in ["sub.", "sub.sub."] {
            let attrs = ctx.zone_attributes_named(format!("{}{}", prefix, zone.name));
            expect_create_rejected(cleanup, &alt, &attrs, ErrorKind::Forbidden).await?;
        }
        Ok(())
    }
}

pub struct NoCreateSuperdomainByAltUser;

#[async_trait]
impl Scenario for NoCreateSuperdomainByAltUser {
    fn name(&self) -> &'static str {
        "no_create_superdomain_by_alt_user"
    }

    fn idempotent_id(&self) -> &'static str {
        "f1723d48-c082-43cd-94bf-ebeb5b8c9458"
    }

    fn tags(&self) -> &'static [&'static str] {
        &[SMOKE]
    }

    fn required_identities(&self) -> &'static [Identity] {
        PRIMARY_AND_ALT
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let alt = ctx.client(Identity::Alt)?;
        let defaults = ctx.zone_defaults();
        let base = names::rand_zone_name(&defaults.name_prefix, &defaults.suffix);

        let attrs = ctx.zone_attributes_named(format!("a.b.{}", base));
        create_active_zone(ctx, cleanup, &attrs).await?;

        info!("Create a zone as an alt user with existing superdomain");
        let attrs = ctx.zone_attributes_named(base);
        expect_create_rejected(cleanup, &alt, &attrs, ErrorKind::Forbidden).await
    }
}

pub struct ListContainsCreatedZone;

#[async_trait]
impl Scenario for ListContainsCreatedZone {
    fn name(&self) -> &'static str {
        "list_contains_created_zone"
    }

    fn idempotent_id(&self) -> &'static str {
        "0c8b6a0e-52a4-4a4e-9a6b-7f3f3c1d2e51"
    }

    async fn run(&self, ctx: &TestContext, cleanup: &mut CleanupStack) -> Result<()> {
        let client = ctx.primary();
        let attrs = ctx.zone_attributes_named(ctx.zone_defaults().suffix.clone());
        let zone = create_active_zone(ctx, cleanup, &attrs).await?;

        info!("List zones as the creator");
        let body = client.list_zones(&ListParams::default()).await?.into_body();

        ensure(
            body.contains_id(&zone.id),
            format!("zone {} ({}) missing from list", zone.id, zone.name),
        )
    }
}
