//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **graph**: reqwest-backed batch client for the external event provider
//! - **memory**: in-process candidate store (events, destinations, users)
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod graph;
pub mod memory;
