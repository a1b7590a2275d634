//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session bookkeeping and container provisioning so
//! route handlers can stay focused on request parsing and status codes.

pub mod launch;
pub mod provision;
pub mod store;
