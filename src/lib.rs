//! ridebeacon - session lifecycle and location reporting for the driver client
//!
//! This library owns the authenticated session (persistence, decoded expiry,
//! forced logout) and the background location reporting loop (permission
//! monitoring, periodic position publishing with transport fallback). UI,
//! navigation and booking flows live in the host application and reach this
//! crate through [`coordinator::Coordinator`].

pub mod adapters;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod permission;
pub mod session;
pub mod tracking;
pub mod traits;
pub mod transport;
