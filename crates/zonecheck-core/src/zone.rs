//! Zone resource model
//!
//! Typed view of the zone resource exposed by the remote service. Fields are
//! split into *stable* fields, which must survive a create → converge →
//! re-fetch round trip unchanged, and *volatile* fields (`created_at`,
//! `updated_at`, `version`, `links`, `status`, `action`) that the service is
//! free to change between observations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Observable provisioning status of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneStatus {
    Pending,
    Active,
    Error,
    Deleted,
    /// Any status this suite does not know about
    #[serde(other)]
    Unknown,
}

impl ZoneStatus {
    /// Whether this status is terminal-bad; pollers stop on it
    pub fn is_error(self) -> bool {
        matches!(self, ZoneStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneStatus::Pending => "PENDING",
            ZoneStatus::Active => "ACTIVE",
            ZoneStatus::Error => "ERROR",
            ZoneStatus::Deleted => "DELETED",
            ZoneStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation currently in flight on a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneAction {
    Create,
    Update,
    Delete,
    None,
}

impl ZoneAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneAction::Create => "CREATE",
            ZoneAction::Update => "UPDATE",
            ZoneAction::Delete => "DELETE",
            ZoneAction::None => "NONE",
        }
    }
}

impl fmt::Display for ZoneAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zone type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    #[default]
    Primary,
    Secondary,
}

/// A zone as returned by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque identifier
    pub id: String,

    /// Fully qualified zone name (trailing dot)
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub ttl: Option<u32>,

    #[serde(default)]
    pub description: Option<String>,

    /// Owning tenant
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub pool_id: Option<String>,

    #[serde(rename = "type", default)]
    pub zone_type: ZoneType,

    #[serde(default)]
    pub masters: Vec<String>,

    #[serde(default)]
    pub serial: Option<u64>,

    pub status: ZoneStatus,

    pub action: ZoneAction,

    // Volatile fields below: excluded from snapshot comparison.
    #[serde(default)]
    pub version: Option<u64>,

    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

/// Field names excluded from [`Zone::stable_mismatch`]
pub const VOLATILE_FIELDS: &[&str] = &[
    "created_at",
    "updated_at",
    "version",
    "links",
    "status",
    "action",
];

/// A stable field whose value differs between two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

impl Zone {
    /// Compare the stable fields of two snapshots
    ///
    /// Returns the first field (in declaration order) whose value differs,
    /// or `None` when the snapshots agree on everything but volatile fields.
    pub fn stable_mismatch(&self, actual: &Zone) -> Option<FieldMismatch> {
        fn check<T: PartialEq + fmt::Debug>(
            field: &'static str,
            expected: &T,
            actual: &T,
        ) -> Option<FieldMismatch> {
            (expected != actual).then(|| FieldMismatch {
                field,
                expected: format!("{:?}", expected),
                actual: format!("{:?}", actual),
            })
        }

        check("id", &self.id, &actual.id)
            .or_else(|| check("name", &self.name, &actual.name))
            .or_else(|| check("email", &self.email, &actual.email))
            .or_else(|| check("ttl", &self.ttl, &actual.ttl))
            .or_else(|| check("description", &self.description, &actual.description))
            .or_else(|| check("project_id", &self.project_id, &actual.project_id))
            .or_else(|| check("pool_id", &self.pool_id, &actual.pool_id))
            .or_else(|| check("type", &self.zone_type, &actual.zone_type))
            .or_else(|| check("masters", &self.masters, &actual.masters))
            .or_else(|| check("serial", &self.serial, &actual.serial))
    }

    /// Whether the acknowledgment shape is `<action>` + PENDING
    pub fn is_pending(&self, action: ZoneAction) -> bool {
        self.action == action && self.status == ZoneStatus::Pending
    }
}

/// Attributes supplied when creating a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAttributes {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<ZoneType>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub masters: Vec<String>,
}

impl ZoneAttributes {
    /// Create attributes for a primary zone with only a name set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            ttl: None,
            description: None,
            zone_type: None,
            masters: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Turn this into a secondary zone pulling from `masters`
    pub fn secondary(mut self, masters: Vec<String>) -> Self {
        self.zone_type = Some(ZoneType::Secondary);
        self.masters = masters;
        self
    }
}

/// Partial update of a zone; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ZoneUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.ttl.is_none() && self.description.is_none()
    }
}

/// Collection returned by a list call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneList {
    pub zones: Vec<Zone>,

    #[serde(default)]
    pub links: BTreeMap<String, String>,

    #[serde(default)]
    pub metadata: Option<ListMetadata>,
}

impl ZoneList {
    /// Whether a zone with this id is in the collection
    pub fn contains_id(&self, id: &str) -> bool {
        self.zones.iter().any(|zone| zone.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListMetadata {
    #[serde(default)]
    pub total_count: Option<u64>,
}
