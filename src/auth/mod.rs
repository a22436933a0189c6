//! Backend authentication flows.
//!
//! Thin layer over the booking backend's auth endpoints: direct login,
//! first-factor login producing a pending account selection, confirmation
//! of a selected account, and wholesale company switch. The coordinator
//! wires these into session persistence.

pub mod client;

pub use client::{AuthClient, AuthError, LoginOutcome, LoginSuccess};
