//! Event catalogue backend: destination selection, event ingestion and the
//! domain error model they share.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
