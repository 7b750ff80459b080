//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use mockable::DefaultClock;

#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::{
    seed_security_questions, AccountService, CatalogueService, ReservationService,
};
use crate::inbound::http::books::{
    add_or_update_book, delete_book, get_book, list_books, search_books,
};
use crate::inbound::http::health::{live, ready, HealthState};
use crate::inbound::http::reservations::reserve;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{
    activate, change_password, login, register, renew_password, unsubscribe, update_profile,
    verify_answer,
};
use crate::middleware::RequestTrace;
use crate::outbound::persistence::{
    DieselBookRepository, DieselPasswordHistoryRepository, DieselReservationRepository,
    DieselSecurityQuestionRepository, DieselUserRepository, InMemoryStore,
};
use crate::outbound::security::Argon2PasswordHasher;

/// Wire the driving ports against the configured persistence backend and
/// seed the security question table when it is empty.
async fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let clock = Arc::new(DefaultClock);
    let hasher = Arc::new(Argon2PasswordHasher::new());

    let state = match &config.db_pool {
        Some(pool) => {
            let users = Arc::new(DieselUserRepository::new(pool.clone()));
            let books = Arc::new(DieselBookRepository::new(pool.clone()));
            let questions = Arc::new(DieselSecurityQuestionRepository::new(pool.clone()));
            let history = Arc::new(DieselPasswordHistoryRepository::new(pool.clone()));
            let reservations = Arc::new(DieselReservationRepository::new(pool.clone()));

            seed_security_questions(questions.as_ref())
                .await
                .map_err(|e| std::io::Error::other(format!("question seeding: {e}")))?;

            HttpState::new(
                Arc::new(AccountService::new(
                    Arc::clone(&users),
                    questions,
                    history,
                    hasher,
                    clock.clone(),
                )),
                Arc::new(CatalogueService::new(Arc::clone(&books))),
                Arc::new(ReservationService::new(users, books, reservations, clock)),
            )
        }
        None => {
            let store = Arc::new(InMemoryStore::new());

            seed_security_questions(store.as_ref())
                .await
                .map_err(|e| std::io::Error::other(format!("question seeding: {e}")))?;

            HttpState::new(
                Arc::new(AccountService::new(
                    Arc::clone(&store),
                    Arc::clone(&store),
                    Arc::clone(&store),
                    hasher,
                    clock.clone(),
                )),
                Arc::new(CatalogueService::new(Arc::clone(&store))),
                Arc::new(ReservationService::new(
                    Arc::clone(&store),
                    Arc::clone(&store),
                    store,
                    clock,
                )),
            )
        }
    };

    Ok(web::Data::new(state))
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .service(register)
        .service(activate)
        .service(login)
        .service(verify_answer)
        .service(change_password)
        .service(renew_password)
        .service(update_profile)
        .service(unsubscribe)
        .service(add_or_update_book)
        .service(list_books)
        .service(search_books)
        .service(get_book)
        .service(delete_book)
        .service(reserve);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(RequestTrace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when state wiring, question seeding, or
/// binding the socket fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = build_http_state(&config).await?;
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SecurityQuestionRepository;
    use crate::domain::DEFAULT_QUESTION_LABELS;

    #[tokio::test]
    async fn memory_backend_is_seeded_on_startup() {
        let store = Arc::new(InMemoryStore::new());
        seed_security_questions(store.as_ref()).await.expect("seeded");
        assert_eq!(
            store.count().await.expect("count"),
            DEFAULT_QUESTION_LABELS.len() as i64
        );
    }

    #[tokio::test]
    async fn state_builds_without_a_database() {
        let config = ServerConfig::new("127.0.0.1:0".parse().expect("addr"));
        let state = build_http_state(&config).await.expect("state");
        assert!(state.catalogue.list().await.expect("list").is_empty());
    }
}
