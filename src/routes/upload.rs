use axum::extract::multipart::{Multipart, MultipartRejection};
use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct UploadedFile {
    pub content_type: String,
    pub data: Bytes,
}

/// Reads the named file field, rejecting anything over `max_bytes`.
pub async fn read_file_field(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    field_name: &str,
    max_bytes: usize,
) -> Result<UploadedFile> {
    let mut multipart = multipart.map_err(|e| Error::Validation(e.body_text()))?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > max_bytes {
                return Err(Error::Validation(format!(
                    "File exceeds the {} MB limit",
                    max_bytes / (1024 * 1024)
                )));
            }
            data.extend_from_slice(&chunk);
        }
        if data.is_empty() {
            return Err(Error::Validation("Uploaded file is empty".to_string()));
        }
        return Ok(UploadedFile {
            content_type,
            data: data.freeze(),
        });
    }

    Err(Error::Validation(format!("No '{}' file uploaded", field_name)))
}

pub fn object_name(folder: &str, owner: impl std::fmt::Display, extension: &str) -> String {
    format!(
        "{}/{}_{}.{}",
        folder,
        owner,
        chrono::Utc::now().timestamp_millis(),
        extension
    )
}
