use anyhow::{anyhow, Result};
use printpdf::{
    BuiltinFont, Color, Greyscale, Line, LinePoint, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions,
    Point, Pt, Rgb, TextItem,
};

use crate::metrics::CERTIFICATES_GENERATED_TOTAL;
use crate::models::certificate::CertificateData;
use crate::models::quiz::QuizAttempt;

/// Landscape A4
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;

pub struct CertificateService {
    min_score: f64,
}

impl CertificateService {
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }

    /// Renders a certificate for a qualifying attempt. Attempts below the
    /// achievement threshold are rejected, not rendered.
    pub fn render_for_attempt(&self, attempt: &QuizAttempt) -> Result<Vec<u8>> {
        if attempt.score_percentage < self.min_score {
            return Err(anyhow!(
                "Attempt scored {:.0}%, below the certificate threshold of {:.0}%",
                attempt.score_percentage,
                self.min_score
            ));
        }

        let data = CertificateData {
            student_name: attempt.user_name.clone(),
            subject: attempt.subject.clone(),
            subtopic: attempt.subtopic.clone(),
            score_percentage: attempt.score_percentage,
            correct_count: attempt.correct_count,
            total_questions: attempt.total_questions,
            awarded_on: attempt.submitted_at,
        };

        let bytes = render_certificate(&data);

        CERTIFICATES_GENERATED_TOTAL
            .with_label_values(&[attempt.subject.as_str()])
            .inc();

        Ok(bytes)
    }
}

/// Draws the certificate page: double border, title, recipient, subject
/// and score lines, award date.
pub fn render_certificate(data: &CertificateData) -> Vec<u8> {
    let mut document = PdfDocument::new("Certificate of Achievement");
    let mut ops = Vec::new();

    let accent_color = Color::Rgb(Rgb {
        r: 0.16,
        g: 0.4,
        b: 0.69,
        icc_profile: None,
    });
    let gold_color = Color::Rgb(Rgb {
        r: 0.85,
        g: 0.65,
        b: 0.13,
        icc_profile: None,
    });
    let text_color = Color::Greyscale(Greyscale::new(0.08, None));

    // Double border
    ops.push(Op::SetOutlineColor {
        col: accent_color.clone(),
    });
    ops.push(Op::SetOutlineThickness { pt: Pt(2.0) });
    push_border(&mut ops, 10.0);
    ops.push(Op::SetOutlineColor {
        col: gold_color.clone(),
    });
    ops.push(Op::SetOutlineThickness { pt: Pt(0.8) });
    push_border(&mut ops, 14.0);

    push_text(
        &mut ops,
        Point::new(Mm(88.0), Mm(170.0)),
        BuiltinFont::TimesBoldItalic,
        30.0,
        34.0,
        "Certificate of Achievement".to_string(),
        &accent_color,
    );
    push_text(
        &mut ops,
        Point::new(Mm(128.0), Mm(150.0)),
        BuiltinFont::Helvetica,
        12.0,
        14.0,
        "proudly presented to".to_string(),
        &text_color,
    );
    push_text(
        &mut ops,
        Point::new(Mm(100.0), Mm(130.0)),
        BuiltinFont::TimesBold,
        26.0,
        30.0,
        data.student_name.clone(),
        &gold_color,
    );

    let subject_line = match &data.subtopic {
        Some(subtopic) => format!(
            "for outstanding performance in {} ({})",
            data.subject, subtopic
        ),
        None => format!("for outstanding performance in {}", data.subject),
    };
    push_text(
        &mut ops,
        Point::new(Mm(80.0), Mm(110.0)),
        BuiltinFont::Helvetica,
        13.0,
        16.0,
        subject_line,
        &text_color,
    );
    push_text(
        &mut ops,
        Point::new(Mm(100.0), Mm(95.0)),
        BuiltinFont::HelveticaBold,
        15.0,
        18.0,
        format!(
            "Score: {:.0}%  ({} of {} correct)",
            data.score_percentage, data.correct_count, data.total_questions
        ),
        &text_color,
    );
    push_text(
        &mut ops,
        Point::new(Mm(110.0), Mm(55.0)),
        BuiltinFont::Helvetica,
        11.0,
        13.0,
        format!("Awarded on {}", data.awarded_on.format("%B %-d, %Y")),
        &text_color,
    );
    push_text(
        &mut ops,
        Point::new(Mm(122.0), Mm(30.0)),
        BuiltinFont::HelveticaOblique,
        10.0,
        12.0,
        "SproutLearn".to_string(),
        &accent_color,
    );

    let page = PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops);
    let mut warnings = Vec::new();
    document
        .with_pages(vec![page])
        .save(&PdfSaveOptions::default(), &mut warnings)
}

fn push_border(ops: &mut Vec<Op>, margin: f32) {
    let left = margin;
    let right = PAGE_WIDTH_MM - margin;
    let bottom = margin;
    let top = PAGE_HEIGHT_MM - margin;

    push_line(ops, (left, bottom), (right, bottom));
    push_line(ops, (right, bottom), (right, top));
    push_line(ops, (right, top), (left, top));
    push_line(ops, (left, top), (left, bottom));
}

fn push_line(ops: &mut Vec<Op>, from: (f32, f32), to: (f32, f32)) {
    ops.push(Op::DrawLine {
        line: Line {
            points: vec![
                LinePoint {
                    p: Point::new(Mm(from.0), Mm(from.1)),
                    bezier: false,
                },
                LinePoint {
                    p: Point::new(Mm(to.0), Mm(to.1)),
                    bezier: false,
                },
            ],
            is_closed: false,
        },
    });
}

fn push_text(
    ops: &mut Vec<Op>,
    pos: Point,
    font: BuiltinFont,
    font_size: f32,
    line_height: f32,
    text: String,
    color: &Color,
) {
    ops.extend([
        Op::StartTextSection,
        Op::SetTextCursor { pos },
        Op::SetFontSizeBuiltinFont {
            size: Pt(font_size),
            font,
        },
        Op::SetLineHeight {
            lh: Pt(line_height),
        },
        Op::SetFillColor { col: color.clone() },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text)],
            font,
        },
        Op::EndTextSection,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn attempt(score: f64) -> QuizAttempt {
        QuizAttempt {
            id: None,
            user_id: "u1".to_string(),
            user_name: "Mia".to_string(),
            subject: "Math".to_string(),
            subtopic: Some("Fractions".to_string()),
            correct_count: 9,
            total_questions: 10,
            time_taken_seconds: 120,
            score_percentage: score,
            submitted_at: Utc.with_ymd_and_hms(2025, 4, 2, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn qualifying_attempt_renders_a_pdf() {
        let service = CertificateService::new(80.0);
        let bytes = service.render_for_attempt(&attempt(90.0)).unwrap();

        assert!(bytes.len() > 500);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn below_threshold_attempt_is_rejected() {
        let service = CertificateService::new(80.0);
        let result = service.render_for_attempt(&attempt(70.0));
        assert!(result.is_err());
    }

    #[test]
    fn threshold_is_inclusive() {
        let service = CertificateService::new(80.0);
        assert!(service.render_for_attempt(&attempt(80.0)).is_ok());
    }
}
