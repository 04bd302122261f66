use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose, Engine as _};
use rand::Rng;

const CSRF_COOKIE_NAME: &str = "csrf_token";
const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// CSRF middleware using the double-submit cookie pattern: state-changing
/// requests must carry matching tokens in the cookie and the
/// X-CSRF-Token header. Safe methods pass through.
pub async fn csrf_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let method = request.method();
    if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let cookie_token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(find_csrf_cookie);

    let header_token = request
        .headers()
        .get(CSRF_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match (cookie_token, header_token) {
        (Some(cookie), Some(header)) if cookie == header => {
            tracing::debug!("CSRF validation passed");
            Ok(next.run(request).await)
        }
        (None, _) => {
            tracing::warn!("CSRF validation failed: missing cookie token");
            Err(StatusCode::FORBIDDEN)
        }
        (_, None) => {
            tracing::warn!("CSRF validation failed: missing header token");
            Err(StatusCode::FORBIDDEN)
        }
        _ => {
            tracing::warn!("CSRF validation failed: token mismatch");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

fn find_csrf_cookie(cookies: &str) -> Option<String> {
    cookies.split(';').find_map(|cookie| {
        let mut parts = cookie.trim().splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(name), Some(value)) if name == CSRF_COOKIE_NAME => Some(value.to_string()),
            _ => None,
        }
    })
}

/// Generate a new CSRF token
pub fn generate_csrf_token() -> String {
    let random_bytes: [u8; 32] = rand::rng().random();
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Create a response with CSRF cookie set
pub fn set_csrf_cookie(mut response: Response, token: &str) -> Response {
    let cookie_value = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Secure",
        CSRF_COOKIE_NAME, token
    );

    if let Ok(value) = cookie_value.parse() {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_csrf_token() {
        let token1 = generate_csrf_token();
        let token2 = generate_csrf_token();

        assert!(!token1.is_empty());
        assert_ne!(token1, token2);
        assert!(general_purpose::URL_SAFE_NO_PAD.decode(&token1).is_ok());
    }

    #[test]
    fn test_find_csrf_cookie() {
        let cookies = "session=abc; csrf_token=xyz123; theme=dark";
        assert_eq!(find_csrf_cookie(cookies), Some("xyz123".to_string()));
        assert_eq!(find_csrf_cookie("session=abc"), None);
    }
}
