use std::time::Instant;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::video::Transcription;

const SERVICE: &str = "speech";
const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
const GCS_PUBLIC_PREFIX: &str = "https://storage.googleapis.com/";
const LANGUAGE: &str = "en-US";
pub const NO_SPEECH: &str = "(no speech detected)";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_url: &str) -> Result<Transcription>;
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

/// Google Cloud Speech-to-Text v1 client.
#[derive(Clone)]
pub struct SpeechService {
    client: Client,
    api_key: String,
}

impl SpeechService {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    async fn audio_source(&self, audio_url: &str) -> Result<serde_json::Value> {
        if let Some(uri) = gcs_uri(audio_url) {
            return Ok(json!({ "uri": uri }));
        }
        let res = self
            .client
            .get(audio_url)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("audio fetch failed: {}", e)))?;
        if !res.status().is_success() {
            return Err(Error::upstream(
                SERVICE,
                format!("audio fetch returned {}", res.status()),
            ));
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("audio fetch failed: {}", e)))?;
        Ok(json!({ "content": BASE64.encode(&bytes) }))
    }
}

#[async_trait]
impl Transcriber for SpeechService {
    async fn transcribe(&self, audio_url: &str) -> Result<Transcription> {
        let audio = self.audio_source(audio_url).await?;
        let payload = json!({
            "config": {
                "encoding": "MP3",
                "sampleRateHertz": 16000,
                "languageCode": LANGUAGE,
                "enableAutomaticPunctuation": true,
                "model": "latest_short",
            },
            "audio": audio,
        });

        let started = Instant::now();
        let res = self
            .client
            .post(RECOGNIZE_URL)
            .query(&[("key", &self.api_key)])
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;

        let status = res.status();
        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "speech recognize returned"
        );
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(Error::upstream(SERVICE, format!("status {}: {}", status, text)));
        }

        let body: RecognizeResponse = res
            .json()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("unreadable response: {}", e)))?;
        Ok(build_transcription(body))
    }
}

/// Rewrites a public GCS object URL into the `gs://` form the API reads directly.
pub fn gcs_uri(audio_url: &str) -> Option<String> {
    if let Some(rest) = audio_url.strip_prefix("gs://") {
        return Some(format!("gs://{}", rest));
    }
    audio_url
        .strip_prefix(GCS_PUBLIC_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(|rest| format!("gs://{}", rest))
}

fn build_transcription(body: RecognizeResponse) -> Transcription {
    let first: Vec<&Alternative> = body
        .results
        .iter()
        .filter_map(|r| r.alternatives.first())
        .collect();

    let text = first
        .iter()
        .map(|a| a.transcript.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let confidence = first.first().map(|a| a.confidence).unwrap_or(0.0);
    let word_count = text.split_whitespace().count();

    Transcription {
        text: if text.is_empty() { NO_SPEECH.to_string() } else { text },
        language: LANGUAGE.to_string(),
        confidence,
        word_count,
    }
}
