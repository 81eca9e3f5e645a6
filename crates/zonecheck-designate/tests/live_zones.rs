//! Live zone scenarios against a real Designate deployment
//!
//! Ignored by default. Run with:
//!
//! ```text
//! export ZONECHECK_ENDPOINT=http://127.0.0.1:9001
//! export ZONECHECK_PRIMARY_TOKEN=...
//! export ZONECHECK_ALT_TOKEN=...      # optional, enables ownership scenarios
//! export ZONECHECK_ADMIN_TOKEN=...    # optional, enables cross-tenant reads
//! cargo test -p zonecheck-designate --test live_zones -- --ignored
//! ```

use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use zonecheck_core::scenario::SMOKE;
use zonecheck_core::{ScenarioRunner, TestContext, ZonecheckConfig};
use zonecheck_designate::DesignateFactory;

fn init_tracing() {
    let level = std::env::var("ZONECHECK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_test_writer()
        .finish();

    // Another test in this binary may have installed it already
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn live_context() -> anyhow::Result<TestContext> {
    let config = ZonecheckConfig::from_env()?;
    let factory = DesignateFactory::new(config.endpoint.clone());
    Ok(TestContext::from_config(&config, &factory)?)
}

#[tokio::test]
#[ignore = "requires a live Designate endpoint (ZONECHECK_* variables)"]
async fn live_zone_scenarios() -> anyhow::Result<()> {
    init_tracing();
    let ctx = live_context()?;

    let report = ScenarioRunner::zones().run_all(&ctx).await;
    println!("{}", report);

    anyhow::ensure!(report.is_success(), "{} scenario(s) failed", report.failed());
    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Designate endpoint (ZONECHECK_* variables)"]
async fn live_smoke_scenarios() -> anyhow::Result<()> {
    init_tracing();
    let ctx = live_context()?;

    let report = ScenarioRunner::zones().with_tag(SMOKE).run_all(&ctx).await;
    println!("{}", report);

    anyhow::ensure!(report.is_success(), "{} smoke scenario(s) failed", report.failed());
    Ok(())
}
