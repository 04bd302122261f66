use chrono::{TimeZone, Utc};
use sproutlearn_api::models::certificate::CertificateData;
use sproutlearn_api::services::certificate_service::render_certificate;

fn data() -> CertificateData {
    CertificateData {
        student_name: "Oliver P.".to_string(),
        subject: "Science".to_string(),
        subtopic: Some("The Solar System".to_string()),
        score_percentage: 95.0,
        correct_count: 19,
        total_questions: 20,
        awarded_on: Utc.with_ymd_and_hms(2025, 6, 20, 15, 0, 0).unwrap(),
    }
}

#[test]
fn renders_a_valid_pdf_document() {
    let bytes = render_certificate(&data());

    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 500);
}

#[test]
fn ends_with_pdf_trailer() {
    let bytes = render_certificate(&data());
    let tail = String::from_utf8_lossy(&bytes[bytes.len().saturating_sub(64)..]).to_string();
    assert!(tail.contains("%%EOF"));
}

#[test]
fn renders_without_a_subtopic() {
    let mut no_subtopic = data();
    no_subtopic.subtopic = None;

    let bytes = render_certificate(&no_subtopic);
    assert!(bytes.starts_with(b"%PDF"));
}
