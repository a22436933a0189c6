//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{json, Value};

use ridebeacon::adapters::mock::{
    MemoryStore, MockLocationClient, MockTransport, RecordingNavigator,
};
use ridebeacon::config::RuntimeConfig;
use ridebeacon::coordinator::{Coordinator, CoordinatorDeps};

/// Build a bearer token whose payload carries the given claims.
pub fn make_token(claims: Value) -> String {
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("eyJhbGciOiJIUzI1NiJ9.{}.c2ln", body)
}

/// A token expiring `offset_ms` from now (negative for already expired).
pub fn token_expiring_in(offset_ms: i64) -> String {
    let exp_secs = (chrono::Utc::now().timestamp_millis() + offset_ms) / 1000;
    make_token(json!({"sub": "driver-1", "exp": exp_secs}))
}

/// A token with no expiry claim.
pub fn token_without_expiry() -> String {
    make_token(json!({"sub": "driver-1"}))
}

/// Profile with every identifier at the top level.
pub fn flat_profile() -> Value {
    json!({
        "driver_id": "d-1",
        "vendor_id": "v-1",
        "tenant_id": "t-1",
        "name": "Test Driver"
    })
}

/// Profile with identifiers scattered across nested shapes.
pub fn nested_profile() -> Value {
    json!({
        "id": 77,
        "account": {"vendor_id": 5, "tenant_id": "t-9"},
        "user": {"name": "Nested Driver"}
    })
}

/// Full coordinator wired against mocks, with handles kept for assertions.
pub struct Harness {
    pub storage: Arc<MemoryStore>,
    pub location: Arc<MockLocationClient>,
    pub navigator: Arc<RecordingNavigator>,
    pub primary: Arc<MockTransport>,
    pub fallback: Arc<MockTransport>,
    pub coordinator: Arc<Coordinator>,
}

pub fn harness() -> Harness {
    let storage = Arc::new(MemoryStore::new());
    let location = Arc::new(MockLocationClient::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let primary = Arc::new(MockTransport::new("native"));
    let fallback = Arc::new(MockTransport::new("rest"));

    let coordinator = Coordinator::new(CoordinatorDeps {
        storage: storage.clone(),
        location: location.clone(),
        navigator: navigator.clone(),
        primary_transport: primary.clone(),
        fallback_transport: fallback.clone(),
        config: RuntimeConfig::default(),
    });

    Harness {
        storage,
        location,
        navigator,
        primary,
        fallback,
        coordinator,
    }
}

impl Harness {
    /// Persist an authenticated session directly, bypassing the network.
    pub async fn seed_session(&self, token: &str, profile: Value) {
        self.coordinator
            .session
            .save_session(token, Some(profile))
            .await;
    }
}
