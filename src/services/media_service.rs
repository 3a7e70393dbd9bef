use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Local media conversions backed by external binaries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Layout-preserving text of a PDF document.
    async fn pdf_to_text(&self, pdf: Bytes) -> Result<String>;

    /// Mono 16 kHz MP3 audio track of a recorded video.
    async fn extract_audio(&self, video: Bytes) -> Result<Bytes>;
}

#[derive(Clone)]
pub struct CliMediaTools {
    pdftotext_binary: String,
    ffmpeg_binary: String,
}

impl CliMediaTools {
    pub fn new(pdftotext_binary: String, ffmpeg_binary: String) -> Self {
        Self {
            pdftotext_binary,
            ffmpeg_binary,
        }
    }
}

async fn run_tool(service: &'static str, command: &mut Command) -> Result<()> {
    let output = command
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::upstream(service, format!("failed to start: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr.trim().lines().last().unwrap_or_default().to_string();
        tracing::error!(tool = service, status = ?output.status.code(), "media conversion failed");
        return Err(Error::upstream(service, tail));
    }
    Ok(())
}

#[async_trait]
impl MediaTools for CliMediaTools {
    async fn pdf_to_text(&self, pdf: Bytes) -> Result<String> {
        // removed with its contents on drop
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("resume.pdf");
        let output = dir.path().join("resume.txt");
        fs::write(&input, &pdf).await?;

        run_tool(
            "pdftotext",
            Command::new(&self.pdftotext_binary)
                .arg("-layout")
                .arg(&input)
                .arg(&output),
        )
        .await?;

        let text = fs::read_to_string(&output).await?;
        Ok(text.trim().to_string())
    }

    async fn extract_audio(&self, video: Bytes) -> Result<Bytes> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("recording.webm");
        let output = dir.path().join("recording.mp3");
        fs::write(&input, &video).await?;

        run_tool(
            "ffmpeg",
            Command::new(&self.ffmpeg_binary)
                .arg("-hide_banner")
                .args(["-loglevel", "error", "-y", "-i"])
                .arg(&input)
                .args(["-vn", "-ac", "1", "-ar", "16000", "-codec:a", "libmp3lame", "-b:a", "64k"])
                .arg(&output),
        )
        .await?;

        let audio = fs::read(&output).await?;
        if audio.is_empty() {
            return Err(Error::upstream("ffmpeg", "no audio track produced"));
        }
        Ok(Bytes::from(audio))
    }
}
