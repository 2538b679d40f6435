//! Router Assembly
//! Mission: Wire public auth routes and bearer-protected student routes

use crate::auth::{api as auth_api, require_auth, AuthState};
use crate::students::{api as students_api, StudentStore};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the full application router. Everything except the auth endpoints
/// and the health check sits behind the bearer guard.
pub fn build_router(auth_state: AuthState, students: Arc<StudentStore>) -> Router {
    let auth_routes = Router::new()
        .route("/token", post(auth_api::issue_token))
        .route("/login/", post(auth_api::login))
        .route("/usuarios/", post(auth_api::register_user))
        .with_state(auth_state.clone());

    let protected_routes = Router::new()
        .route(
            "/alunos/",
            get(students_api::list_alunos).post(students_api::create_aluno),
        )
        .route(
            "/alunos/inadimplentes/",
            get(students_api::list_inadimplentes),
        )
        .route("/alunos/:id/status", get(students_api::aluno_status))
        .route("/pagamentos/", post(students_api::register_pagamento))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(students);

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "🎓 Academia backend operational"
}
