//! Core traits for the zonecheck suite
//!
//! - [`ZoneClient`]: Request/response access to the remote zone service
//! - [`ZoneClientFactory`]: Binds a client to a configured identity

pub mod zone_client;

pub use zone_client::{ApiResponse, ListParams, ShowParams, ZoneClient, ZoneClientFactory};
