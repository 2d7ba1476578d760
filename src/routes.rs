// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempt, auth, exercise, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, weeks, exercises, attempts, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, collaborators, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let week_routes = Router::new()
        .route("/{id}/exercises", get(exercise::list_week_exercises))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let exercise_routes = Router::new()
        .route("/{id}", get(exercise::get_exercise))
        .route(
            "/{id}/attempts",
            post(attempt::start_attempt).get(attempt::get_attempt),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let attempt_routes = Router::new()
        .route("/{id}/quiz", post(attempt::go_to_quiz).get(quiz::get_quiz))
        .route("/{id}/quiz/submissions", post(quiz::submit_quiz))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/weeks", post(admin::create_week))
        .route("/exercises", post(admin::create_exercise))
        .route("/registrations", put(admin::upsert_registration))
        .route("/users/{id}/accommodation", put(admin::set_accommodation))
        .route("/attempts/{id}/status", put(admin::set_attempt_status))
        .route("/attempts/{id}/logs", get(admin::get_attempt_logs))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/weeks", week_routes)
        .nest("/api/exercises", exercise_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
