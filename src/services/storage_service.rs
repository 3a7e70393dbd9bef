use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client};
use url::Url;

use crate::error::{Error, Result};

const SERVICE: &str = "storage";
const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1/b";
const PUBLIC_BASE: &str = "https://storage.googleapis.com";

/// Object storage that hands back a publicly reachable URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, object_name: &str, content_type: &str, data: Bytes) -> Result<String>;
}

/// Google Cloud Storage JSON API, simple media upload.
#[derive(Clone)]
pub struct GcsStorage {
    client: Client,
    bucket: String,
    access_token: String,
}

impl GcsStorage {
    pub fn new(client: Client, bucket: String, access_token: String) -> Self {
        Self {
            client,
            bucket,
            access_token,
        }
    }

    fn upload_url(&self, object_name: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/{}/o", UPLOAD_BASE, self.bucket),
            &[("uploadType", "media"), ("name", object_name)],
        )
        .map_err(|e| Error::Internal(format!("invalid upload url: {}", e)))
    }
}

pub fn public_url(bucket: &str, object_name: &str) -> String {
    format!("{}/{}/{}", PUBLIC_BASE, bucket, object_name)
}

#[async_trait]
impl ObjectStorage for GcsStorage {
    async fn upload(&self, object_name: &str, content_type: &str, data: Bytes) -> Result<String> {
        let size = data.len();
        let started = Instant::now();
        let res = self
            .client
            .post(self.upload_url(object_name)?)
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;

        let status = res.status();
        tracing::info!(
            object = object_name,
            bytes = size,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "object upload returned"
        );
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(Error::upstream(SERVICE, format!("status {}: {}", status, text)));
        }

        Ok(public_url(&self.bucket, object_name))
    }
}
