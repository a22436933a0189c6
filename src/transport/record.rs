//! The published location document.

use serde::{Deserialize, Serialize};

use crate::tracking::ResolvedIdentifiers;
use crate::traits::Position;

/// Per-report metadata attached alongside the fix.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetadata {
    /// Whether this report came from the on-demand entry point rather than
    /// the periodic schedule.
    pub manual: bool,
    /// Device wall-clock time at report assembly, RFC 3339.
    pub device_time: String,
}

impl ReportMetadata {
    pub fn now(manual: bool) -> Self {
        Self {
            manual,
            device_time: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Wire shape of one published location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub driver_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// When the fix was sampled, epoch milliseconds.
    pub sampled_at: i64,
    pub device_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_update: Option<bool>,
    /// Set by the selector when the fallback transport carried the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl LocationRecord {
    pub fn new(ids: &ResolvedIdentifiers, position: &Position, metadata: &ReportMetadata) -> Self {
        Self {
            driver_id: ids.driver_id.clone(),
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: position.accuracy_m,
            sampled_at: position.sampled_at_ms,
            device_time: metadata.device_time.clone(),
            manual_update: metadata.manual.then_some(true),
            method: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> ResolvedIdentifiers {
        ResolvedIdentifiers {
            driver_id: "d1".into(),
            vendor_id: "v1".into(),
            tenant_id: "t1".into(),
        }
    }

    fn position() -> Position {
        Position {
            latitude: 12.97,
            longitude: 77.59,
            accuracy_m: Some(5.0),
            sampled_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_scheduled_record_omits_optional_fields() {
        let meta = ReportMetadata {
            manual: false,
            device_time: "2026-01-01T00:00:00Z".into(),
        };
        let record = LocationRecord::new(&ids(), &position(), &meta);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("manual_update").is_none());
        assert!(json.get("method").is_none());
        assert_eq!(json["driver_id"], "d1");
        assert_eq!(json["sampled_at"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_manual_record_is_flagged() {
        let meta = ReportMetadata {
            manual: true,
            device_time: "2026-01-01T00:00:00Z".into(),
        };
        let record = LocationRecord::new(&ids(), &position(), &meta);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["manual_update"], true);
    }

    #[test]
    fn test_metadata_now_is_rfc3339() {
        let meta = ReportMetadata::now(false);
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.device_time).is_ok());
    }
}
