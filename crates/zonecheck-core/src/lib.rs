// # zonecheck-core
//
// Core library for end-to-end checks of a multi-tenant DNS zone service.
//
// ## Architecture Overview
//
// - **ZoneClient**: Trait for the zone API (create/show/list/update/delete)
// - **StatePoller**: Waits for a zone to reach a status, or to disappear
// - **CleanupStack**: Undo actions registered by a scenario, run newest first
// - **TestContext**: Per-run clients (primary, alt, admin) and settings
// - **ScenarioRunner**: Runs scenarios, isolates their failures and always
//   drains their cleanup
// - **MemoryZoneService**: In-process service used by the contract tests
//
// ## Design Principles
//
// 1. **Eventual Consistency**: Mutations are acknowledged as PENDING; all
//    convergence waits go through the poller with a bounded budget
// 2. **No Leaks**: Every created resource is registered for teardown at the
//    moment it is created
// 3. **Explicit Context**: No global state; scenarios receive everything they
//    need through `TestContext`
// 4. **Library-First**: The HTTP client lives in its own crate behind
//    `ZoneClient`

pub mod traits;
pub mod zone;
pub mod names;
pub mod config;
pub mod error;
pub mod poller;
pub mod cleanup;
pub mod context;
pub mod scenario;
pub mod memory;

// Re-export core types for convenience
pub use traits::{ApiResponse, ListParams, ShowParams, ZoneClient, ZoneClientFactory};
pub use zone::{Zone, ZoneAction, ZoneAttributes, ZoneList, ZoneStatus, ZoneType, ZoneUpdate};
pub use config::{EndpointConfig, IdentityConfig, PollConfig, ZoneDefaults, ZonecheckConfig};
pub use error::{Error, ErrorKind, Result};
pub use poller::{ExpectedState, PollOutcome, StatePoller};
pub use cleanup::{CleanupFailure, CleanupStack};
pub use context::{Identity, TestContext};
pub use scenario::{RunReport, Scenario, ScenarioOutcome, ScenarioReport, ScenarioRunner};
pub use memory::MemoryZoneService;
