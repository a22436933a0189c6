//! The try-primary-then-fallback publishing policy.
//!
//! One place decides when a fallback attempt is warranted, so the two
//! transport paths cannot drift apart. Publishes escalate only on a
//! transport-level failure (the structured unavailable signal or an
//! uninitialized-service message); business failures are final. Reads and
//! deletes use plain sequential fallback on structural failures.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::path;
use super::record::{LocationRecord, ReportMetadata};
use crate::tracking::ResolvedIdentifiers;
use crate::traits::{Position, RealtimeTransport, TransportError};

/// Marker written into the payload when the fallback transport carried it.
pub const FALLBACK_METHOD_MARKER: &str = "http_fallback";

pub struct TransportSelector {
    primary: Arc<dyn RealtimeTransport>,
    fallback: Arc<dyn RealtimeTransport>,
}

impl TransportSelector {
    pub fn new(
        primary: Arc<dyn RealtimeTransport>,
        fallback: Arc<dyn RealtimeTransport>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Publish one location report.
    ///
    /// The primary gets exactly one attempt; if it signals that it is
    /// unavailable, the fallback gets exactly one attempt with the payload
    /// tagged by [`FALLBACK_METHOD_MARKER`]. Any other failure - including
    /// the fallback's own - is returned as the final result.
    pub async fn publish(
        &self,
        ids: &ResolvedIdentifiers,
        position: &Position,
        metadata: &ReportMetadata,
    ) -> Result<(), TransportError> {
        let key = path::driver_path(&ids.tenant_id, &ids.vendor_id, &ids.driver_id);
        let record = LocationRecord::new(ids, position, metadata);
        let value = serde_json::to_value(&record)
            .map_err(|err| TransportError::Serialization(err.to_string()))?;

        match self.primary.write(&key, &value).await {
            Ok(()) => {
                debug!(transport = self.primary.name(), %key, "location published");
                Ok(())
            }
            Err(err) if err.warrants_fallback() => {
                info!(
                    "primary transport unavailable, retrying via {}: {}",
                    self.fallback.name(),
                    err
                );
                let mut tagged = value;
                tagged["method"] = Value::String(FALLBACK_METHOD_MARKER.to_string());
                self.fallback.write(&key, &tagged).await
            }
            Err(err) => {
                warn!(
                    transport = self.primary.name(),
                    code = err.error_code(),
                    "publish failed: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Read one driver's location document.
    pub async fn fetch(
        &self,
        tenant_id: &str,
        vendor_id: &str,
        driver_id: &str,
    ) -> Result<Option<Value>, TransportError> {
        let key = path::driver_path(tenant_id, vendor_id, driver_id);
        self.read_with_fallback(&key).await
    }

    /// Read every driver location under a vendor.
    pub async fn fetch_all(
        &self,
        tenant_id: &str,
        vendor_id: &str,
    ) -> Result<Option<Value>, TransportError> {
        let key = path::vendor_path(tenant_id, vendor_id);
        self.read_with_fallback(&key).await
    }

    /// Delete one driver's location document (used on logout).
    pub async fn remove(
        &self,
        tenant_id: &str,
        vendor_id: &str,
        driver_id: &str,
    ) -> Result<(), TransportError> {
        let key = path::driver_path(tenant_id, vendor_id, driver_id);
        match self.primary.delete(&key).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_structural() => {
                debug!("primary delete failed structurally, trying {}: {}", self.fallback.name(), err);
                self.fallback.delete(&key).await
            }
            Err(err) => Err(err),
        }
    }

    async fn read_with_fallback(&self, key: &str) -> Result<Option<Value>, TransportError> {
        match self.primary.read(key).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_structural() => {
                debug!("primary read failed structurally, trying {}: {}", self.fallback.name(), err);
                self.fallback.read(key).await
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockBehavior, MockTransport};

    fn ids() -> ResolvedIdentifiers {
        ResolvedIdentifiers {
            driver_id: "d1".into(),
            vendor_id: "v1".into(),
            tenant_id: "t1".into(),
        }
    }

    fn position() -> Position {
        Position {
            latitude: 1.0,
            longitude: 2.0,
            accuracy_m: Some(4.0),
            sampled_at_ms: 99,
        }
    }

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            manual: false,
            device_time: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn test_publish_primary_success_skips_fallback() {
        let primary = Arc::new(MockTransport::new("native"));
        let fallback = Arc::new(MockTransport::new("rest"));
        let selector = TransportSelector::new(primary.clone(), fallback.clone());

        selector.publish(&ids(), &position(), &metadata()).await.unwrap();

        assert_eq!(primary.write_count(), 1);
        assert_eq!(fallback.write_count(), 0);
        let writes = primary.writes();
        assert_eq!(writes[0].path, "drivers/t1/v1/d1");
        assert!(writes[0].value.get("method").is_none());
    }

    #[tokio::test]
    async fn test_publish_unavailable_escalates_once() {
        let primary = Arc::new(MockTransport::new("native"));
        primary.set_behavior(MockBehavior::Unavailable);
        let fallback = Arc::new(MockTransport::new("rest"));
        let selector = TransportSelector::new(primary.clone(), fallback.clone());

        selector.publish(&ids(), &position(), &metadata()).await.unwrap();

        assert_eq!(primary.write_count(), 1);
        assert_eq!(fallback.write_count(), 1);
        let writes = fallback.writes();
        assert_eq!(writes[0].value["method"], FALLBACK_METHOD_MARKER);
    }

    #[tokio::test]
    async fn test_publish_business_error_is_final() {
        let primary = Arc::new(MockTransport::new("native"));
        primary.set_behavior(MockBehavior::Reject("invalid data".into()));
        let fallback = Arc::new(MockTransport::new("rest"));
        let selector = TransportSelector::new(primary.clone(), fallback.clone());

        let err = selector
            .publish(&ids(), &position(), &metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Rejected(_)));
        assert_eq!(fallback.write_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_fallback_failure_is_final() {
        let primary = Arc::new(MockTransport::new("native"));
        primary.set_behavior(MockBehavior::Unavailable);
        let fallback = Arc::new(MockTransport::new("rest"));
        fallback.set_behavior(MockBehavior::NetworkFail("offline".into()));
        let selector = TransportSelector::new(primary.clone(), fallback.clone());

        let err = selector
            .publish(&ids(), &position(), &metadata())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert_eq!(primary.write_count(), 1);
        assert_eq!(fallback.write_count(), 1, "no second retry anywhere");
    }

    #[tokio::test]
    async fn test_fetch_falls_back_on_structural_failure() {
        let primary = Arc::new(MockTransport::new("native"));
        primary.set_behavior(MockBehavior::Unavailable);
        let fallback = Arc::new(MockTransport::new("rest"));
        fallback.set_read_result(Some(serde_json::json!({"latitude": 1.0})));
        let selector = TransportSelector::new(primary.clone(), fallback.clone());

        let value = selector.fetch("t1", "v1", "d1").await.unwrap().unwrap();
        assert_eq!(value["latitude"], 1.0);
        assert_eq!(fallback.read_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_falls_back_on_structural_failure() {
        let primary = Arc::new(MockTransport::new("native"));
        primary.set_behavior(MockBehavior::NetworkFail("down".into()));
        let fallback = Arc::new(MockTransport::new("rest"));
        let selector = TransportSelector::new(primary.clone(), fallback.clone());

        selector.remove("t1", "v1", "d1").await.unwrap();
        assert_eq!(primary.delete_count(), 1);
        assert_eq!(fallback.delete_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_uses_vendor_key() {
        let primary = Arc::new(MockTransport::new("native"));
        let selector =
            TransportSelector::new(primary.clone(), Arc::new(MockTransport::new("rest")));

        let _ = selector.fetch_all("t1", "v1").await;
        assert_eq!(primary.reads()[0], "drivers/t1/v1");
    }
}
