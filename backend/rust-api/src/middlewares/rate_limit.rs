use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::services::AppState;

const RATE_LIMIT_PER_USER: u32 = 100; // requests per minute
const RATE_LIMIT_PER_IP: u32 = 200; // requests per minute
const RATE_WINDOW_SECONDS: u64 = 60;

const ADMIN_RATE_LIMIT_PER_USER: u32 = 200;
const ADMIN_RATE_WINDOW_SECONDS: u64 = 60;

// Auth-specific rate limits
const LOGIN_RATE_LIMIT: u32 = 10; // 10 attempts per 5 minutes
const LOGIN_RATE_WINDOW_SECONDS: u64 = 300;
const REGISTER_RATE_LIMIT: u32 = 5; // 5 registrations per hour
const REGISTER_RATE_WINDOW_SECONDS: u64 = 3600;

fn extract_client_ip(headers: &HeaderMap, extensions: &axum::http::Extensions) -> String {
    // Preferred order: X-Forwarded-For, X-Real-IP, ConnectInfo
    if let Some(v) = headers.get("x-forwarded-for") {
        if let Ok(s) = v.to_str() {
            // x-forwarded-for can be a comma separated list; take first
            return s.split(',').next().unwrap_or(s).trim().to_string();
        }
    }

    if let Some(v) = headers.get("x-real-ip") {
        if let Ok(s) = v.to_str() {
            return s.trim().to_string();
        }
    }

    if let Some(ci) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return ci.0.ip().to_string();
    }

    "unknown".to_string()
}

/// Fixed-window counter in Redis. Requests are allowed when Redis is
/// unreachable.
async fn over_limit(state: &AppState, key: &str, limit: u32, window_seconds: u64) -> bool {
    let mut conn = state.redis.clone();

    let count: u32 = match redis::cmd("INCR").arg(key).query_async(&mut conn).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Rate limit INCR failed ({}), allowing request", e);
            return false;
        }
    };

    if count == 1 {
        // First hit opens the window
        let _: Result<(), _> = redis::cmd("EXPIRE")
            .arg(key)
            .arg(window_seconds)
            .query_async(&mut conn)
            .await;
    }

    count > limit
}

pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let client_ip = extract_client_ip(request.headers(), request.extensions());

    let user_id = request
        .extensions()
        .get::<super::auth::JwtClaims>()
        .map(|claims| claims.sub.clone());

    if let Some(uid) = &user_id {
        let key = format!("rate:user:{}", uid);
        if over_limit(&state, &key, RATE_LIMIT_PER_USER, RATE_WINDOW_SECONDS).await {
            tracing::warn!("Rate limit exceeded for user: {}", uid);
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    let key = format!("rate:ip:{}", client_ip);
    if over_limit(&state, &key, RATE_LIMIT_PER_IP, RATE_WINDOW_SECONDS).await {
        tracing::warn!("Rate limit exceeded for IP: {}", client_ip);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(request).await)
}

pub async fn admin_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = request
        .extensions()
        .get::<super::auth::JwtClaims>()
        .map(|claims| claims.sub.clone());

    if let Some(uid) = &user_id {
        let key = format!("rate:admin:{}", uid);
        if over_limit(
            &state,
            &key,
            ADMIN_RATE_LIMIT_PER_USER,
            ADMIN_RATE_WINDOW_SECONDS,
        )
        .await
        {
            tracing::warn!("Admin rate limit exceeded for user: {}", uid);
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(request).await)
}

pub async fn login_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let client_ip = extract_client_ip(request.headers(), request.extensions());

    let key = format!("rate:login:{}", client_ip);
    if over_limit(&state, &key, LOGIN_RATE_LIMIT, LOGIN_RATE_WINDOW_SECONDS).await {
        tracing::warn!("Login rate limit exceeded for IP: {}", client_ip);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(request).await)
}

pub async fn register_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let client_ip = extract_client_ip(request.headers(), request.extensions());

    let key = format!("rate:register:{}", client_ip);
    if over_limit(
        &state,
        &key,
        REGISTER_RATE_LIMIT,
        REGISTER_RATE_WINDOW_SECONDS,
    )
    .await
    {
        tracing::warn!("Register rate limit exceeded for IP: {}", client_ip);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Extensions;

    #[test]
    fn prefers_forwarded_header_over_connect_info() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "1.2.3.4, 10.0.0.1".parse().unwrap());
        let extensions = Extensions::new();

        assert_eq!(extract_client_ip(&headers, &extensions), "1.2.3.4");
    }

    #[test]
    fn falls_back_to_unknown_without_any_source() {
        let headers = HeaderMap::new();
        let extensions = Extensions::new();

        assert_eq!(extract_client_ip(&headers, &extensions), "unknown");
    }
}
