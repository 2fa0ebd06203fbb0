//! HTTP inbound adapter.
//!
//! Only the error envelope lives here; routing belongs to the embedding
//! service.

pub mod error;

pub use error::{ApiResult, ErrorBody};
