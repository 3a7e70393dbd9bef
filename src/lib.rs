pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::database::Store;
use crate::error::Result;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::{
    ai_service::{AIService, Assessor, LlmClient, QuestionGenerator},
    attempt_service::AttemptService,
    candidate_service::CandidateService,
    code_runner::{CodeExecutor, NodeRunner},
    coding_stage::CodingStage,
    mcq_stage::McqStage,
    media_service::{CliMediaTools, MediaTools},
    resume_service::{ResumeParser, ResumeService},
    speech_service::{SpeechService, Transcriber},
    storage_service::{GcsStorage, ObjectStorage},
    video_stage::VideoStage,
};

/// External collaborators, swappable for fakes in tests.
#[derive(Clone)]
pub struct Adapters {
    pub generator: Arc<dyn QuestionGenerator>,
    pub assessor: Arc<dyn Assessor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub storage: Arc<dyn ObjectStorage>,
    pub resume_parser: Arc<dyn ResumeParser>,
    pub executor: Arc<dyn CodeExecutor>,
    pub media: Arc<dyn MediaTools>,
}

impl Adapters {
    pub fn live(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.external_timeout_secs))
            .build()?;

        let llm = LlmClient::new(
            http_client.clone(),
            config.llm_api_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        );
        let ai_service = AIService::new(llm, config.mcq_question_count);
        let ai = Arc::new(ai_service.clone());

        Ok(Self {
            generator: ai.clone(),
            assessor: ai,
            transcriber: Arc::new(SpeechService::new(
                http_client.clone(),
                config.speech_api_key.clone(),
            )),
            storage: Arc::new(GcsStorage::new(
                http_client.clone(),
                config.gcp_bucket.clone(),
                config.gcp_access_token.clone(),
            )),
            resume_parser: Arc::new(ResumeService::new(
                http_client,
                config.ner_api_url.clone(),
                config.ner_api_token.clone(),
                ai_service,
            )),
            executor: Arc::new(NodeRunner::new(
                config.node_binary.clone(),
                Duration::from_millis(config.code_run_timeout_ms),
            )),
            media: Arc::new(CliMediaTools::new(
                config.pdftotext_binary.clone(),
                config.ffmpeg_binary.clone(),
            )),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub adapters: Adapters,
    pub auth_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, adapters: Adapters) -> Self {
        let auth_limiter = RateLimiter::new(
            config.auth_rate_limit,
            Duration::from_secs(config.auth_rate_window_secs),
        );
        Self {
            config: Arc::new(config),
            store,
            adapters,
            auth_limiter,
        }
    }

    pub fn candidates(&self) -> CandidateService {
        CandidateService::new(
            self.store.clone(),
            self.config.jwt_secret.clone(),
            self.config.jwt_ttl_hours,
        )
    }

    pub fn mcq(&self) -> AttemptService<McqStage> {
        AttemptService::new(
            self.store.clone(),
            McqStage::new(self.adapters.generator.clone()),
        )
    }

    pub fn video(&self) -> AttemptService<VideoStage> {
        AttemptService::new(
            self.store.clone(),
            VideoStage::new(
                self.adapters.generator.clone(),
                self.adapters.transcriber.clone(),
                self.adapters.assessor.clone(),
            ),
        )
    }

    pub fn coding(&self) -> AttemptService<CodingStage> {
        AttemptService::new(
            self.store.clone(),
            CodingStage::new(
                self.adapters.generator.clone(),
                self.adapters.executor.clone(),
                self.adapters.assessor.clone(),
            ),
        )
    }
}
