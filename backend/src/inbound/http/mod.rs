//! HTTP inbound adapter: Actix handlers over the domain driving ports.

pub mod books;
pub mod error;
pub mod health;
pub mod reservations;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
