#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use interview_backend::{
    config::Config,
    database::{MemoryStore, Store},
    error::{Error, Result},
    models::{
        candidate::{Candidate, ExperienceEntry, NewCandidate, Role, Step},
        coding::{CaseResult, CodingProblem, ExecutionReport, SolutionAssessment, TestCase},
        mcq::McqQuestion,
        resume::ParsedResume,
        video::{AnswerAssessment, Transcription},
    },
    routes,
    services::{
        ai_service::{Assessor, QuestionGenerator},
        code_runner::{outputs_match, CodeExecutor},
        media_service::MediaTools,
        resume_service::ResumeParser,
        speech_service::Transcriber,
        storage_service::ObjectStorage,
    },
    utils::crypto::hash_password,
    Adapters, AppState,
};

pub const JWT_SECRET: &str = "integration-secret";
pub const PASSWORD: &str = "correct horse battery staple";

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        jwt_secret: JWT_SECRET.into(),
        jwt_ttl_hours: 24,
        llm_api_url: "http://llm.invalid".into(),
        llm_api_key: "llm-key".into(),
        llm_model: "test-model".into(),
        ner_api_url: "http://ner.invalid".into(),
        ner_api_token: "ner-token".into(),
        gcp_bucket: "interview-test".into(),
        gcp_access_token: "gcp-token".into(),
        speech_api_key: "speech-key".into(),
        cors_origins: vec!["http://localhost:5173".into()],
        auth_rate_limit: 1000,
        auth_rate_window_secs: 900,
        trust_proxy: false,
        external_timeout_secs: 5,
        code_run_timeout_ms: 1000,
        mcq_question_count: 3,
        node_binary: "node".into(),
        ffmpeg_binary: "ffmpeg".into(),
        pdftotext_binary: "pdftotext".into(),
    }
}

/// Fails the first `n` calls of a counter, then succeeds.
#[derive(Default)]
pub struct Flaky {
    failures_left: AtomicUsize,
    pub calls: AtomicUsize,
}

impl Flaky {
    pub fn failing(n: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(n),
            calls: AtomicUsize::new(0),
        }
    }

    fn hit(&self, service: &'static str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(Error::upstream(service, "simulated outage"));
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn sample_mcqs() -> Vec<McqQuestion> {
    [1u8, 0, 1]
        .into_iter()
        .enumerate()
        .map(|(i, correct)| McqQuestion {
            question: format!("Question {}", i + 1),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct,
        })
        .collect()
}

pub fn two_sum_problem() -> CodingProblem {
    CodingProblem {
        title: "Two Sum".into(),
        description: "Return the indices of the two numbers that add up to target.".into(),
        difficulty: "Medium".into(),
        language: "javascript".into(),
        starter_code: "function solution(nums, target) {\n}".into(),
        test_cases: vec![
            TestCase {
                input: "[2,7,11,15]\n9".into(),
                expected_output: "[0,1]".into(),
                hidden: false,
            },
            TestCase {
                input: "[3,3]\n6".into(),
                expected_output: "[0,1]".into(),
                hidden: true,
            },
        ],
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    pub mcq: Flaky,
    pub behavioral: Flaky,
    pub coding: Flaky,
}

#[async_trait]
impl QuestionGenerator for FakeGenerator {
    async fn generate_mcqs(&self, _candidate: &Candidate) -> Result<Vec<McqQuestion>> {
        self.mcq.hit("llm")?;
        Ok(sample_mcqs())
    }

    async fn generate_behavioral_question(&self, _candidate: &Candidate) -> Result<String> {
        self.behavioral.hit("llm")?;
        Ok("Tell me about a time you disagreed with a teammate.".into())
    }

    async fn generate_coding_problem(&self, _candidate: &Candidate) -> Result<CodingProblem> {
        self.coding.hit("llm")?;
        Ok(two_sum_problem())
    }
}

#[derive(Default)]
pub struct FakeAssessor {
    pub answer: Flaky,
    pub solution: Flaky,
    pub seen_counts: Mutex<Vec<(u32, u32)>>,
}

#[async_trait]
impl Assessor for FakeAssessor {
    async fn assess_answer(&self, _question: &str, transcript: &str) -> Result<AnswerAssessment> {
        self.answer.hit("llm")?;
        Ok(AnswerAssessment {
            score: if transcript.is_empty() { 0 } else { 78 },
            feedback: "Structured answer with a clear outcome.".into(),
            relevance: 80,
            clarity: 76,
            confidence: 72,
        })
    }

    async fn assess_solution(
        &self,
        _problem: &CodingProblem,
        _solution: &str,
        report: &ExecutionReport,
    ) -> Result<SolutionAssessment> {
        self.solution.hit("llm")?;
        if let Ok(mut seen) = self.seen_counts.lock() {
            seen.push((report.passed, report.total));
        }
        let score = if report.total == 0 {
            0
        } else {
            (report.passed * 100 / report.total) as i32
        };
        Ok(SolutionAssessment {
            score,
            feedback: format!("{}/{} tests passed", report.passed, report.total),
        })
    }
}

#[derive(Default)]
pub struct FakeTranscriber {
    pub calls: Flaky,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio_url: &str) -> Result<Transcription> {
        self.calls.hit("speech")?;
        let text = format!("Answer recorded at {}", audio_url);
        Ok(Transcription {
            word_count: text.split_whitespace().count(),
            text,
            language: "en-US".into(),
            confidence: 0.93,
        })
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub objects: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, object_name: &str, content_type: &str, data: Bytes) -> Result<String> {
        if let Ok(mut objects) = self.objects.lock() {
            objects.push((object_name.to_string(), content_type.to_string(), data.len()));
        }
        Ok(format!(
            "https://storage.googleapis.com/interview-test/{}",
            object_name
        ))
    }
}

pub struct FakeMedia;

#[async_trait]
impl MediaTools for FakeMedia {
    async fn pdf_to_text(&self, _pdf: Bytes) -> Result<String> {
        Ok("Asha Verma\nasha@example.com\nSkills: Rust, PostgreSQL\n".repeat(20))
    }

    async fn extract_audio(&self, video: Bytes) -> Result<Bytes> {
        Ok(Bytes::from(format!("mp3:{}", video.len())))
    }
}

pub struct FakeResumeParser;

#[async_trait]
impl ResumeParser for FakeResumeParser {
    async fn parse(&self, text: &str) -> Result<ParsedResume> {
        Ok(ParsedResume {
            name: text.lines().next().unwrap_or_default().to_string(),
            email: "asha@example.com".into(),
            skills: vec!["Rust".into(), "PostgreSQL".into()],
            experience_timeline: vec![ExperienceEntry {
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                duration: "2 years".into(),
            }],
            ..Default::default()
        })
    }
}

/// Passes a case when the solution source contains its expected output.
pub struct FakeExecutor;

#[async_trait]
impl CodeExecutor for FakeExecutor {
    async fn run(&self, code: &str, cases: &[TestCase]) -> Result<ExecutionReport> {
        let results = cases
            .iter()
            .map(|case| {
                let output = if code.contains(&case.expected_output) {
                    case.expected_output.clone()
                } else {
                    "undefined".to_string()
                };
                CaseResult {
                    passed: outputs_match(&output, &case.expected_output),
                    output,
                    expected: case.expected_output.clone(),
                    hidden: case.hidden,
                }
            })
            .collect();
        Ok(ExecutionReport::from_results(results))
    }
}

pub struct Fakes {
    pub generator: Arc<FakeGenerator>,
    pub assessor: Arc<FakeAssessor>,
    pub transcriber: Arc<FakeTranscriber>,
    pub storage: Arc<FakeStorage>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            generator: Arc::new(FakeGenerator::default()),
            assessor: Arc::new(FakeAssessor::default()),
            transcriber: Arc::new(FakeTranscriber::default()),
            storage: Arc::new(FakeStorage::default()),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub state: AppState,
    pub fakes: Fakes,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), Fakes::default())
    }

    pub fn with(config: Config, fakes: Fakes) -> Self {
        let store = MemoryStore::new();
        let adapters = Adapters {
            generator: fakes.generator.clone(),
            assessor: fakes.assessor.clone(),
            transcriber: fakes.transcriber.clone(),
            storage: fakes.storage.clone(),
            resume_parser: Arc::new(FakeResumeParser),
            executor: Arc::new(FakeExecutor),
            media: Arc::new(FakeMedia),
        };
        let state = AppState::new(config, Arc::new(store.clone()), adapters);
        Self {
            router: routes::router(state.clone()),
            store,
            state,
            fakes,
        }
    }

    pub async fn register(&self, email: &str, role: Role) -> Candidate {
        self.state
            .candidates()
            .register("Asha Verma", email, PASSWORD, role)
            .await
            .expect("register candidate")
    }

    /// Registers a candidate and returns a bearer token for it.
    pub async fn signed_in(&self, email: &str) -> (Candidate, String) {
        let candidate = self.register(email, Role::Candidate).await;
        let token = self.login(email).await;
        (candidate, token)
    }

    /// Like `signed_in`, with the candidate already placed at `step`.
    pub async fn signed_in_at(&self, email: &str, step: Step) -> (Candidate, String) {
        let mut candidate = Candidate::provision(NewCandidate {
            name: "Asha Verma".into(),
            email: email.into(),
            password_hash: hash_password(PASSWORD).expect("hash password"),
            role: Role::Candidate,
        });
        candidate.current_step = step;
        let candidate = self
            .store
            .insert_candidate(candidate)
            .await
            .expect("insert candidate");
        let token = self.login(email).await;
        (candidate, token)
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/user/login",
                None,
                Some(serde_json::json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.dispatch(request).await
    }

    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> (StatusCode, JsonValue) {
        let boundary = "----interview-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .expect("request");
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
        (status, json)
    }
}
