mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{test_config, FakeAssessor, FakeGenerator, Fakes, Flaky, TestApp};
use interview_backend::database::Store;
use interview_backend::models::attempt::StageKind;
use interview_backend::models::candidate::Step;

#[tokio::test]
async fn upload_stores_video_and_extracted_audio() {
    let app = TestApp::new();
    let (candidate, token) = app.signed_in("asha@example.com").await;

    let (status, body) = app
        .upload("/api/video/upload", &token, "video", "answer.webm", "video/webm", b"webm-bytes")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let video_url = body["videoUrl"].as_str().unwrap();
    let audio_url = body["audioUrl"].as_str().unwrap();
    assert!(video_url.contains(&format!("videos/{}_", candidate.id)));
    assert!(video_url.ends_with(".webm"));
    assert!(audio_url.contains(&format!("audios/{}_", candidate.id)));
    assert!(audio_url.ends_with(".mp3"));

    let objects = app.fakes.storage.objects.lock().unwrap().clone();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1].1, "audio/mpeg");
}

#[tokio::test]
async fn upload_rejects_non_video_files() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("asha@example.com").await;

    let (status, body) = app
        .upload("/api/video/upload", &token, "video", "notes.txt", "text/plain", b"hello")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    let (status, body) = app
        .upload("/api/video/upload", &token, "clip", "answer.webm", "video/webm", b"webm")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert!(app.fakes.storage.objects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transcribe_returns_text_and_word_count() {
    let app = TestApp::new();
    let (_, token) = app.signed_in("asha@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/video/transcribe",
            Some(&token),
            Some(json!({"audioUrl": "https://storage.googleapis.com/interview-test/audios/a.mp3"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["transcription"]["text"].as_str().unwrap().contains("audios/a.mp3"));
    assert_eq!(body["transcription"]["wordCount"], 4);

    let (status, body) = app
        .send(Method::POST, "/api/video/transcribe", Some(&token), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn failed_question_generation_persists_nothing() {
    let fakes = Fakes {
        generator: Arc::new(FakeGenerator {
            behavioral: Flaky::failing(1),
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = TestApp::with(test_config(), fakes);
    let (candidate, token) = app.signed_in_at("asha@example.com", Step::Video).await;

    let (status, body) = app.send(Method::GET, "/api/video/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "upstream_failed");
    assert!(app.store.attempts_for(candidate.id, StageKind::Video).await.is_empty());

    let (status, body) = app.send(Method::GET, "/api/video/start", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["question"].as_str().is_some_and(|q| !q.is_empty()));
}

#[tokio::test]
async fn submit_retries_after_assessor_outage_and_completes_once() {
    let fakes = Fakes {
        assessor: Arc::new(FakeAssessor {
            answer: Flaky::failing(1),
            ..Default::default()
        }),
        ..Default::default()
    };
    let app = TestApp::with(test_config(), fakes);
    let (candidate, token) = app.signed_in_at("asha@example.com", Step::Video).await;

    let (_, started) = app.send(Method::GET, "/api/video/start", Some(&token), None).await;
    let (_, again) = app.send(Method::GET, "/api/video/start", Some(&token), None).await;
    assert_eq!(started["attemptId"], again["attemptId"]);

    let submit = json!({
        "attemptId": started["attemptId"],
        "videoUrl": "https://storage.googleapis.com/interview-test/videos/v.webm",
        "audioUrl": "https://storage.googleapis.com/interview-test/audios/a.mp3",
    });

    let (status, body) = app
        .send(Method::POST, "/api/video/submit", Some(&token), Some(submit.clone()))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "upstream_failed");
    let attempt_id = Uuid::parse_str(started["attemptId"].as_str().unwrap()).unwrap();
    assert!(!app.store.find_attempt(attempt_id).await.unwrap().unwrap().completed);

    let (status, body) = app
        .send(Method::POST, "/api/video/submit", Some(&token), Some(submit.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["score"], 78);
    assert_eq!(body["relevance"], 80);
    assert_eq!(body["currentStep"], "coding");

    let (status, body) = app
        .send(Method::POST, "/api/video/submit", Some(&token), Some(submit))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "attempt_completed");
    assert_eq!(app.fakes.assessor.answer.count(), 2);

    let candidate = app.store.find_candidate(candidate.id).await.unwrap().unwrap();
    assert_eq!(candidate.video_score, Some(78));
}

#[tokio::test]
async fn submit_requires_both_urls() {
    let app = TestApp::new();
    let (_, token) = app.signed_in_at("asha@example.com", Step::Video).await;
    let (_, started) = app.send(Method::GET, "/api/video/start", Some(&token), None).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/video/submit",
            Some(&token),
            Some(json!({"attemptId": started["attemptId"], "videoUrl": "https://x/v.webm"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(app.fakes.transcriber.calls.count(), 0);
}
