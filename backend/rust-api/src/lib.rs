#![allow(dead_code)]

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS configuration for the browser client
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Word of the day is public: the widget renders before login
        .route(
            "/api/v1/word-of-day",
            get(handlers::word_of_day::get_word_of_day),
        )
        // Auth endpoints (mixed: some public, some protected)
        .nest("/api/v1/auth", auth_routes(app_state.clone()))
        // Protected endpoints (require JWT)
        .nest(
            "/api/v1",
            learning_routes()
                .layer(middleware::from_fn(middlewares::csrf::csrf_middleware))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::rate_limit::rate_limit_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::auth_middleware,
                )),
        )
        .nest(
            "/admin",
            admin_routes(app_state.clone())
                .layer(middleware::from_fn(middlewares::csrf::csrf_middleware))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::auth_middleware,
                )),
        )
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn learning_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        // Quizzes
        .route("/quizzes", post(handlers::quizzes::generate_quiz))
        .route(
            "/quizzes/{id}/submit",
            post(handlers::quizzes::submit_quiz),
        )
        // Study lessons
        .route("/lessons", post(handlers::lessons::generate_lesson))
        // History
        .route("/history/quizzes", get(handlers::history::quiz_history))
        .route("/history/lessons", get(handlers::history::lesson_history))
        // Leaderboard
        .route("/leaderboard", get(handlers::leaderboard::get_leaderboard))
        // Scheduled tests
        .route(
            "/scheduled-tests",
            get(handlers::notifications::list_scheduled_tests)
                .post(handlers::notifications::create_scheduled_test),
        )
        .route(
            "/scheduled-tests/{id}/cancel",
            post(handlers::notifications::cancel_scheduled_test),
        )
        // Certificates
        .route(
            "/certificates/{attempt_id}",
            get(handlers::certificates::download_certificate),
        )
}

fn admin_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        // Topic management
        .route(
            "/topics",
            get(handlers::admin::list_topics).post(handlers::admin::create_topic),
        )
        .route(
            "/topics/{id}",
            patch(handlers::admin::update_topic).delete(handlers::admin::archive_topic),
        )
        .route(
            "/topics/{id}/subtopics",
            post(handlers::admin::create_subtopic),
        )
        .route(
            "/subtopics/{id}",
            delete(handlers::admin::archive_subtopic),
        )
        // User management
        .route("/users", get(handlers::admin::list_users))
        .route("/users/{id}", patch(handlers::admin::update_user))
        .route("/users/{id}/block", post(handlers::admin::block_user))
        .route("/users/{id}/unblock", post(handlers::admin::unblock_user))
        // Analytics
        .route(
            "/analytics/overview",
            get(handlers::admin::analytics_overview),
        )
        .route(
            "/analytics/export",
            get(handlers::admin::export_analytics),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::rate_limit::admin_rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn(
            middlewares::auth::admin_guard_middleware,
        ))
}

fn auth_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    // Public routes with rate limiting
    let register_route = Router::new()
        .route("/register", post(handlers::auth::register))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::rate_limit::register_rate_limit_middleware,
        ));

    let login_route = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/social", post(handlers::auth::social_login))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::rate_limit::login_rate_limit_middleware,
        ));

    let refresh_route = Router::new().route("/refresh", post(handlers::auth::refresh_token));

    // CSRF token endpoint (public, no auth required)
    let csrf_route = Router::new().route("/csrf-token", get(handlers::auth::get_csrf_token));

    let public_routes = register_route
        .merge(login_route)
        .merge(refresh_route)
        .merge(csrf_route);

    // Protected routes (require JWT auth + CSRF protection)
    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::get_current_user))
        .route("/logout", post(handlers::auth::logout))
        .route_layer(middleware::from_fn(middlewares::csrf::csrf_middleware))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::auth::auth_middleware,
        ));

    // Merge public and protected routes
    public_routes.merge(protected_routes)
}
