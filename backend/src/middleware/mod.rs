//! Actix middleware shared by every inbound HTTP surface.

pub mod request_id;

pub use request_id::{RequestId, RequestTrace};
