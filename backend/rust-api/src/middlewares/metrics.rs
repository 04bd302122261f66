use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency per normalized route
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Normalize URL path to avoid cardinality explosion. Dynamic segments
/// (UUID quiz ids, ObjectId attempt ids, numeric ids) become placeholders.
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized = Vec::new();

    for segment in segments {
        if is_uuid_like(segment) || is_object_id_like(segment) || is_numeric_id(segment) {
            normalized.push("{id}");
        } else {
            normalized.push(segment);
        }
    }

    normalized.join("/")
}

/// UUID format: 8-4-4-4-12 hex characters
fn is_uuid_like(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Mongo ObjectId: 24 hex characters
fn is_object_id_like(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/api/v1/quizzes/550e8400-e29b-41d4-a716-446655440000/submit"),
            "/api/v1/quizzes/{id}/submit"
        );
        assert_eq!(
            normalize_path("/api/v1/certificates/64f1b2c3d4e5f6a7b8c9d0e1"),
            "/api/v1/certificates/{id}"
        );
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/api/v1/word-of-day"), "/api/v1/word-of-day");
    }

    #[test]
    fn test_is_object_id_like() {
        assert!(is_object_id_like("64f1b2c3d4e5f6a7b8c9d0e1"));
        assert!(!is_object_id_like("not-an-object-id"));
        assert!(!is_object_id_like("64f1b2"));
    }

    #[test]
    fn test_is_numeric_id() {
        assert!(is_numeric_id("123"));
        assert!(!is_numeric_id("abc"));
        assert!(!is_numeric_id(""));
    }
}
