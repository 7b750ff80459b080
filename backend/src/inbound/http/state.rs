//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle via `actix_web::web::Data` so they depend on
//! domain ports only and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountLifecycle, Catalogue, ReservationAdmission};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountLifecycle>,
    pub catalogue: Arc<dyn Catalogue>,
    pub reservations: Arc<dyn ReservationAdmission>,
}

impl HttpState {
    /// Bundle the driving ports for handler registration.
    pub fn new(
        accounts: Arc<dyn AccountLifecycle>,
        catalogue: Arc<dyn Catalogue>,
        reservations: Arc<dyn ReservationAdmission>,
    ) -> Self {
        Self {
            accounts,
            catalogue,
            reservations,
        }
    }
}
