//! End-to-end pipeline tests over the offline mock provider.
//!
//! Material generation, rendering, quiz extraction and grading are wired
//! together the same way the CLI does it, without spawning the binary.

use std::collections::HashMap;

use chrono::{Duration, TimeZone, Utc};

use uniquery_core::extract::Extractor;
use uniquery_core::model::ExtractionMode;
use uniquery_core::prompts::{material_quiz_label, material_quiz_prompt, MaterialKind, MaterialRequest};
use uniquery_core::review::PerformanceBand;
use uniquery_core::session::{AssessmentSession, SessionSnapshot};
use uniquery_core::time::Clock;
use uniquery_core::traits::{generate_text, GenerateRequest};
use uniquery_providers::mock::MockProvider;
use uniquery_render::writer::{document_file_name, render_text, write_document};
use uniquery_render::{DocumentRenderer, LineKind, OutputFormat, PageConfig};

const MATERIAL: &str = "# Cell Biology\n\n## Organelles\n- Mitochondria → energy\n- Ribosomes\n\n1. Read\n2. Review\n\nThe **nucleus** holds DNA.\n";

const PRACTICE_QUIZ: &str = r#"[
  {"question": "Which organelle produces energy?", "options": ["Ribosome", "Mitochondria", "Nucleus", "Golgi"], "answer": "Mitochondria"},
  {"question": "Where is DNA kept?", "options": ["Nucleus", "Membrane"], "answer": "Cytoplasm"},
  {"question": "What builds proteins?", "options": ["Ribosomes", "Lysosomes", "Vacuoles", "Centrioles"], "answer": "Ribosomes", "explanation": "Ribosomes translate mRNA."}
]"#;

fn provider() -> MockProvider {
    let mut responses = HashMap::new();
    responses.insert("multiple-choice questions".to_string(), PRACTICE_QUIZ.to_string());
    MockProvider::new(responses).with_default_response(MATERIAL)
}

#[tokio::test]
async fn study_material_to_graded_quiz() {
    let provider = provider();
    let topic = "Cell Biology";

    let request = MaterialRequest::new(topic, MaterialKind::KeyConcepts);
    let material = generate_text(&provider, &GenerateRequest::new("mock-model", request.prompt()))
        .await
        .unwrap();
    assert_eq!(material, MATERIAL);

    let document = DocumentRenderer::new(PageConfig::default())
        .render_material(&MaterialKind::KeyConcepts.to_string(), topic, &material);
    assert_eq!(document.pages.len(), 1);
    let kinds: Vec<LineKind> = document.pages[0].blocks.iter().map(|b| b.kind()).collect();
    assert_eq!(kinds[0], LineKind::Heading1);
    assert!(kinds.contains(&LineKind::Bullet));
    assert!(kinds.contains(&LineKind::NumberedItem));

    let text = render_text(&document);
    assert!(text.contains("- Mitochondria -> energy\n"));
    assert!(text.contains("The **nucleus** holds DNA."));

    let dir = tempfile::tempdir().unwrap();
    for format in OutputFormat::ALL {
        let path = dir.path().join(document_file_name(topic, "Key Concepts", format));
        write_document(&document, format, &path).unwrap();
        assert!(path.exists());
    }

    // The practice quiz tolerates one malformed element.
    let raw = generate_text(
        &provider,
        &GenerateRequest::new("mock-model", material_quiz_prompt(topic, &material)),
    )
    .await
    .unwrap();
    assert!(Extractor::new(ExtractionMode::Strict).extract(&raw).is_err());
    let questions = Extractor::new(ExtractionMode::Lenient).extract(&raw).unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(provider.call_count(), 2);

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let mut session = AssessmentSession::with_clock(Clock::fixed(start));
    session.start(questions, material_quiz_label(topic)).unwrap();
    session.select_answer(0, "Mitochondria").unwrap();
    session.select_answer(1, "Lysosomes").unwrap();
    session.clock_mut().advance(Duration::seconds(42));
    assert_eq!(session.submit().unwrap(), 1);

    let review = session.review().unwrap();
    assert_eq!(review.topic, "Cell Biology (from study material)");
    assert_eq!(review.percentage, 50.0);
    assert_eq!(review.band, PerformanceBand::NeedsPractice);
    assert_eq!(review.elapsed_seconds, 42.0);
    assert_eq!(review.entries[1].explanation(), "Ribosomes translate mRNA.");
}

#[tokio::test]
async fn exported_session_restores() {
    let provider = MockProvider::new(HashMap::new());
    let raw = generate_text(&provider, &GenerateRequest::new("mock-model", "quiz"))
        .await
        .unwrap();
    let questions = Extractor::new(ExtractionMode::Strict).extract(&raw).unwrap();

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let mut session = AssessmentSession::with_clock(Clock::fixed(start));
    session.start(questions, "Arithmetic").unwrap();
    session.select_answer(0, "4").unwrap();
    session.select_answer(1, "Venus").unwrap();
    session.submit().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    session.snapshot().save_json(&path).unwrap();

    let snapshot = SessionSnapshot::load_json(&path).unwrap();
    let restored = AssessmentSession::from_snapshot(snapshot, Clock::fixed(start)).unwrap();
    assert_eq!(restored.score(), Some(1));
    assert_eq!(restored.answer(1), Some("Venus"));
    assert_eq!(restored.topic_label(), "Arithmetic");

    let wrong = restored.wrong_answers().unwrap();
    assert_eq!(wrong.len(), 1);
    assert_eq!(wrong[0].0, 1);
}

#[tokio::test]
async fn offline_provider_produces_nothing() {
    let provider = MockProvider::failing();
    let request = GenerateRequest::new("mock-model", "quiz");
    assert!(generate_text(&provider, &request).await.is_none());
}
