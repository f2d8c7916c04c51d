//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: builds the domain services from configuration
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and mapping to domain inputs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use eduhub_core::DomainResult;
use eduhub_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> DomainResult<Router> {
    let services = Arc::new(services::build_services(config)?);
    Ok(router_with(services, &config.jwt_secret))
}

/// Build the router over already-constructed services.
pub fn router_with(services: Arc<services::AppServices>, jwt_secret: &str) -> Router {
    let jwt = Arc::new(eduhub_auth::Hs256JwtValidator::new(
        jwt_secret.as_bytes().to_vec(),
    ));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a valid bearer token.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}
