//! Defensive session-profile identifier resolution.
//!
//! Profile blobs are structurally heterogeneous across backends: the same
//! identifier may sit at the top level, under `user.driver`, under
//! `account`, and so on. Each identifier has one fixed, ordered list of
//! lookup paths; resolution takes the first defined, non-null value. The
//! shape-tolerance policy lives here and nowhere else.

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::TrackingError;

/// One dotted lookup path, pre-split into segments.
struct LookupPath {
    raw: &'static str,
    segments: Vec<&'static str>,
}

fn parse_paths(raw: &[&'static str]) -> Vec<LookupPath> {
    raw.iter()
        .map(|&raw| LookupPath {
            raw,
            segments: raw.split('.').collect(),
        })
        .collect()
}

/// Driver id lookup order: `driver_id`, `user.driver.driver_id`,
/// `user.driver_id`, `driver.driver_id`, `id`.
static DRIVER_ID_PATHS: Lazy<Vec<LookupPath>> = Lazy::new(|| {
    parse_paths(&[
        "driver_id",
        "user.driver.driver_id",
        "user.driver_id",
        "driver.driver_id",
        "id",
    ])
});

/// Vendor id lookup order: `vendor_id`, `account.vendor_id`,
/// `user.driver.vendor_id`, `vendor.id`.
static VENDOR_ID_PATHS: Lazy<Vec<LookupPath>> = Lazy::new(|| {
    parse_paths(&[
        "vendor_id",
        "account.vendor_id",
        "user.driver.vendor_id",
        "vendor.id",
    ])
});

/// Tenant id lookup order: `tenant_id`, `account.tenant_id`,
/// `user.tenant_id`, `user.driver.tenant_id`, `user.tenant.tenant_id`,
/// `tenant.id`.
static TENANT_ID_PATHS: Lazy<Vec<LookupPath>> = Lazy::new(|| {
    parse_paths(&[
        "tenant_id",
        "account.tenant_id",
        "user.tenant_id",
        "user.driver.tenant_id",
        "user.tenant.tenant_id",
        "tenant.id",
    ])
});

fn walk<'a>(profile: &'a Value, path: &LookupPath) -> Option<&'a Value> {
    let mut current = profile;
    for segment in &path.segments {
        current = current.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn first_match(profile: &Value, paths: &[LookupPath]) -> Option<(String, &'static str)> {
    for path in paths {
        if let Some(value) = walk(profile, path) {
            if let Some(id) = id_string(value) {
                return Some((id, path.raw));
            }
        }
    }
    None
}

/// Normalize an identifier value. Backends send strings and numbers
/// interchangeably; anything else is not an identifier.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn resolve_driver_id(profile: &Value) -> Option<String> {
    first_match(profile, &DRIVER_ID_PATHS).map(|(id, _)| id)
}

pub fn resolve_vendor_id(profile: &Value) -> Option<String> {
    first_match(profile, &VENDOR_ID_PATHS).map(|(id, _)| id)
}

pub fn resolve_tenant_id(profile: &Value) -> Option<String> {
    first_match(profile, &TENANT_ID_PATHS).map(|(id, _)| id)
}

/// The three identifiers a location report is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentifiers {
    pub driver_id: String,
    pub vendor_id: String,
    pub tenant_id: String,
}

/// Resolve all three identifiers or fail naming every missing one.
pub fn resolve_identifiers(profile: &Value) -> Result<ResolvedIdentifiers, TrackingError> {
    let driver_id = resolve_driver_id(profile);
    let vendor_id = resolve_vendor_id(profile);
    let tenant_id = resolve_tenant_id(profile);

    let mut missing = Vec::new();
    if driver_id.is_none() {
        missing.push("driver_id");
    }
    if vendor_id.is_none() {
        missing.push("vendor_id");
    }
    if tenant_id.is_none() {
        missing.push("tenant_id");
    }
    if !missing.is_empty() {
        return Err(TrackingError::IdentityUnresolved { missing });
    }

    Ok(ResolvedIdentifiers {
        driver_id: driver_id.unwrap(),
        vendor_id: vendor_id.unwrap(),
        tenant_id: tenant_id.unwrap(),
    })
}
