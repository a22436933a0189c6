//! Location publishing over two interchangeable realtime backends.
//!
//! [`TransportSelector`] owns the try-primary-then-fallback policy;
//! [`NativeTransport`] is the SDK-style primary that may fail to
//! initialize, [`RestTransport`] the always-constructible HTTP fallback.

pub mod native;
pub mod path;
pub mod record;
pub mod rest;
pub mod selector;

pub use native::NativeTransport;
pub use record::{LocationRecord, ReportMetadata};
pub use rest::RestTransport;
pub use selector::{TransportSelector, FALLBACK_METHOD_MARKER};
