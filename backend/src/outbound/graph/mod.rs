//! Outbound adapter for the external event provider's batch API.

mod dto;
mod http_source;

pub use http_source::{DEFAULT_GRAPH_ENDPOINT, GraphHttpEventSource};
