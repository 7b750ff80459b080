//! Shared helpers for HTTP handler tests.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use crate::domain::{AccountService, CatalogueService, ReservationService};
use crate::inbound::http::state::HttpState;
use crate::outbound::persistence::InMemoryStore;
use crate::outbound::security::Argon2PasswordHasher;

/// Wire an [`HttpState`] over a fresh in-memory store.
///
/// Returns the store too so tests can seed and inspect persisted state
/// through the repository ports.
pub fn state_with_memory_store() -> (web::Data<HttpState>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(DefaultClock);
    let accounts = AccountService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::new(Argon2PasswordHasher::new()),
        clock.clone(),
    );
    let catalogue = CatalogueService::new(Arc::clone(&store));
    let reservations = ReservationService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
        clock,
    );
    let state = HttpState::new(
        Arc::new(accounts),
        Arc::new(catalogue),
        Arc::new(reservations),
    );
    (web::Data::new(state), store)
}
