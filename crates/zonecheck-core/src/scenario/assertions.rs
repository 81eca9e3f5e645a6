//! Assertion helpers shared by scenarios
//!
//! Each helper returns `Err(Error::Assertion(..))` on mismatch so scenario
//! bodies can use `?` and the runner records the message.

use std::fmt::Debug;

use crate::error::{Error, ErrorKind, Result};
use crate::zone::{Zone, ZoneAction, ZoneStatus};

/// Fail with `msg` unless `condition` holds
pub fn ensure(condition: bool, msg: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::assertion(msg))
    }
}

/// The acknowledgment of a mutating call is `<action>` + PENDING
pub fn assert_ack(zone: &Zone, action: ZoneAction) -> Result<()> {
    ensure(
        zone.action == action,
        format!("zone {}: expected action {}, got {}", zone.id, action, zone.action),
    )?;
    ensure(
        zone.status == ZoneStatus::Pending,
        format!("zone {}: expected status PENDING, got {}", zone.id, zone.status),
    )
}

/// Two snapshots agree on every stable field
pub fn assert_expected(expected: &Zone, actual: &Zone) -> Result<()> {
    match expected.stable_mismatch(actual) {
        None => Ok(()),
        Some(mismatch) => Err(Error::assertion(format!(
            "zone {} differs from expected: {}",
            expected.id, mismatch
        ))),
    }
}

/// The response carries this HTTP status code
pub fn assert_status_code(actual: u16, expected: u16) -> Result<()> {
    ensure(
        actual == expected,
        format!("expected HTTP {}, got {}", expected, actual),
    )
}

/// The call failed with an error of classification `kind`
pub fn expect_error<T: Debug>(result: Result<T>, kind: ErrorKind) -> Result<()> {
    match result {
        Err(e) if e.kind() == kind => Ok(()),
        Err(e) => Err(Error::assertion(format!("expected {:?}, got: {}", kind, e))),
        Ok(value) => Err(Error::assertion(format!(
            "expected {:?}, but the call succeeded: {:?}",
            kind, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn zone(status: ZoneStatus, action: ZoneAction) -> Zone {
        Zone {
            id: "z1".to_string(),
            name: "example.com.".to_string(),
            email: Some("admin@example.com".to_string()),
            ttl: Some(3600),
            description: None,
            project_id: Some("p1".to_string()),
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

    #[test]
    fn test_assert_ack() {
        assert!(assert_ack(&zone(ZoneStatus::Pending, ZoneAction::Create), ZoneAction::Create).is_ok());

        let err = assert_ack(&zone(ZoneStatus::Active, ZoneAction::Create), ZoneAction::Create)
            .unwrap_err();
        assert!(err.to_string().contains("PENDING"));

        let err = assert_ack(&zone(ZoneStatus::Pending, ZoneAction::Update), ZoneAction::Create)
            .unwrap_err();
        assert!(err.to_string().contains("CREATE"));
    }

    #[test]
    fn test_assert_expected_ignores_status_and_version() {
        let created = zone(ZoneStatus::Pending, ZoneAction::Create);
        let mut fetched = zone(ZoneStatus::Active, ZoneAction::None);
        fetched.version = Some(2);
        assert!(assert_expected(&created, &fetched).is_ok());

        fetched.email = Some("other@example.com".to_string());
        let err = assert_expected(&created, &fetched).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_expect_error() {
        assert!(expect_error::<()>(Err(Error::conflict("dup")), ErrorKind::Conflict).is_ok());

        let err = expect_error::<()>(Err(Error::forbidden("no")), ErrorKind::Conflict).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Assertion);

        let err = expect_error(Ok(1), ErrorKind::Conflict).unwrap_err();
        assert!(err.to_string().contains("succeeded"));
    }
}
