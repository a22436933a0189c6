//! Realtime database key construction.
//!
//! Driver locations live under `drivers/{tenant}/{vendor}/{driver}`.
//! Identifiers come from backend data, so segments are percent-encoded
//! before joining.

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Key for one driver's location document.
pub fn driver_path(tenant_id: &str, vendor_id: &str, driver_id: &str) -> String {
    format!(
        "drivers/{}/{}/{}",
        encode(tenant_id),
        encode(vendor_id),
        encode(driver_id)
    )
}

/// Key for all driver locations under one vendor.
pub fn vendor_path(tenant_id: &str, vendor_id: &str) -> String {
    format!("drivers/{}/{}", encode(tenant_id), encode(vendor_id))
}
