use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::{JwtClaims, JwtService},
    middlewares::csrf::{generate_csrf_token, set_csrf_cookie},
    models::{
        refresh_token::RefreshTokenResponse,
        user::{
            AuthResponse, AuthResponseCookie, LoginRequest, RegisterRequest, SocialLoginRequest,
            UserProfile,
        },
    },
    services::{auth_service::AuthService, AppState},
};

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build(("refresh_token", token))
        .path("/api/v1/auth")
        .http_only(true)
        .secure(state.config.cookie.secure)
        .same_site(state.config.cookie.parse_same_site())
        .max_age(time::Duration::days(30))
        .build()
}

fn auth_service(state: &AppState) -> AuthService {
    let jwt_service = JwtService::new(&state.config.jwt_secret);
    AuthService::new(state.mongo.clone(), state.redis.clone(), jwt_service)
}

fn cookie_response(
    state: &AppState,
    jar: CookieJar,
    response: AuthResponse,
    status: StatusCode,
) -> impl IntoResponse {
    let jar = jar.add(refresh_cookie(state, response.refresh_token.clone()));

    // Return only access_token and user in JSON
    let response_body = AuthResponseCookie {
        access_token: response.access_token,
        user: response.user,
    };

    (status, jar, Json(response_body))
}

/// POST /api/v1/auth/register - Register a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    tracing::info!("Registering new user: {}", req.email);

    match auth_service(&state).register(req).await {
        Ok(response) => {
            tracing::info!("User registered successfully");
            Ok(cookie_response(&state, jar, response, StatusCode::CREATED))
        }
        Err(e) => {
            tracing::error!("Failed to register user: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// POST /api/v1/auth/login - Login with email and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    tracing::info!("Login attempt for user: {}", req.email);

    let service = auth_service(&state);
    let email = req.email.clone();

    // Check if account is locked due to failed login attempts
    let is_locked = service.check_failed_attempts(&email).await.unwrap_or(false); // Default to unlocked if Redis check fails

    if is_locked {
        tracing::warn!("Login blocked for {}: too many failed attempts", email);
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            "Too many failed login attempts. Please try again later.".to_string(),
        ));
    }

    match service.login(req).await {
        Ok(response) => {
            tracing::info!("User logged in successfully");
            let _ = service.clear_failed_attempts(&email).await;
            Ok(cookie_response(&state, jar, response, StatusCode::OK))
        }
        Err(e) => {
            tracing::warn!("Failed login for {}: {}", email, e);
            let _ = service.increment_failed_attempts(&email).await;
            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
    }
}

/// POST /api/v1/auth/social - Sign in with an external identity provider
pub async fn social_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<SocialLoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    tracing::info!("Social login attempt via {}", req.provider);

    match auth_service(&state)
        .social_login(req, &state.config.social.google_userinfo_url)
        .await
    {
        Ok(response) => Ok(cookie_response(&state, jar, response, StatusCode::OK)),
        Err(e) => {
            tracing::warn!("Social login failed: {}", e);
            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
    }
}

/// POST /api/v1/auth/refresh - Exchange the refresh cookie for a new access token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<RefreshTokenResponse>, (StatusCode, String)> {
    let token = jar
        .get("refresh_token")
        .map(|cookie| cookie.value().to_string())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing refresh token".to_string(),
        ))?;

    match auth_service(&state).refresh_token(&token).await {
        Ok(access_token) => Ok(Json(RefreshTokenResponse { access_token })),
        Err(e) => {
            tracing::warn!("Refresh token rejected: {}", e);
            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
    }
}

/// POST /api/v1/auth/logout - Revoke the refresh token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(cookie) = jar.get("refresh_token") {
        let token = cookie.value().to_string();
        if let Err(e) = auth_service(&state).logout(&token).await {
            tracing::warn!("Logout failed to revoke token: {}", e);
        }
    }

    // Removal cookie must match the path the token was set on
    let removal = Cookie::build(("refresh_token", "")).path("/api/v1/auth").build();
    let jar = jar.remove(removal);
    Ok((StatusCode::NO_CONTENT, jar))
}

/// GET /api/v1/auth/me - Current user profile
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<UserProfile>, (StatusCode, String)> {
    match auth_service(&state).get_user_by_id(&claims.sub).await {
        Ok(user) => Ok(Json(UserProfile::from(user))),
        Err(e) => Err((StatusCode::NOT_FOUND, e.to_string())),
    }
}

/// GET /api/v1/auth/csrf-token - Issue a CSRF token (double-submit cookie)
pub async fn get_csrf_token() -> impl IntoResponse {
    let token = generate_csrf_token();
    let response = Json(serde_json::json!({ "csrf_token": token })).into_response();
    set_csrf_cookie(response, &token)
}
