// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! HTTP implementation of [`TransformGateway`].
//!
//! Transforms are multipart uploads. The video part is streamed in chunks so
//! upload progress can be reported as bytes handed to the transport over the
//! total video size.

use super::{GatewayError, ProgressFn, TransformGateway, TransformInput, TransformOp};
use crate::models::source::{DownloadRequest, DownloadedFile, VideoInfo};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;

const UPLOAD_CHUNK: usize = 256 * 1024;
const DEFAULT_DOWNLOAD_NAME: &str = "video.mp4";

/// Gateway backed by the editing server's REST API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for `base_url` (e.g. `http://127.0.0.1:8000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/", self.base_url, name)
    }
}

#[async_trait]
impl TransformGateway for HttpGateway {
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, GatewayError> {
        log::info!("Requesting info for {}", url);
        let resp = self
            .client
            .post(self.endpoint("info"))
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(network_error)?;

        let resp = ensure_success(resp).await?;
        let body = resp.bytes().await.map_err(network_error)?;
        serde_json::from_slice(&body)
            .map_err(|e| GatewayError::MalformedResponse(format!("invalid info payload: {e}")))
    }

    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedFile, GatewayError> {
        log::info!(
            "Downloading format {} of {} (audio only: {})",
            request.format_id,
            request.url,
            request.audio_only
        );
        let resp = self
            .client
            .post(self.endpoint("download"))
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        let resp = ensure_success(resp).await?;
        let file_name = attachment_name(resp.headers())
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());
        let bytes = read_media(resp).await?;
        log::info!("Downloaded {} ({} bytes)", file_name, bytes.len());
        Ok(DownloadedFile { file_name, bytes })
    }

    async fn transform(
        &self,
        input: TransformInput,
        progress: ProgressFn,
    ) -> Result<Bytes, GatewayError> {
        let endpoint = self.endpoint(input.op.endpoint());
        log::info!(
            "Submitting {} of '{}' ({} bytes)",
            input.op.endpoint(),
            input.title,
            input.video.len()
        );

        let mut form = Form::new().part(
            "video",
            video_part(input.video, format!("{}.mp4", input.title), progress.clone()),
        );
        for (name, value) in text_fields(&input.op) {
            form = form.text(name, value);
        }

        let resp = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        progress(1.0);

        let resp = ensure_success(resp).await?;
        read_media(resp).await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, GatewayError> {
        let resp = self.client.get(url).send().await.map_err(network_error)?;
        let resp = ensure_success(resp).await?;
        resp.bytes().await.map_err(network_error)
    }
}

/// Text form fields for a transform, in the order the server reads them.
fn text_fields(op: &TransformOp) -> Vec<(&'static str, String)> {
    match op {
        TransformOp::Trim { start, end } => vec![
            ("start", format!("{start:.2}")),
            ("end", format!("{end:.2}")),
        ],
        TransformOp::Caption { subtitle_text } => vec![("captions", subtitle_text.clone())],
        TransformOp::Combined {
            start,
            end,
            subtitle_text,
        } => vec![
            ("captions", subtitle_text.clone()),
            ("start", format!("{start:.2}")),
            ("end", format!("{end:.2}")),
        ],
    }
}

fn video_part(video: Bytes, file_name: String, progress: ProgressFn) -> Part {
    let total = video.len() as u64;
    let mut sent = 0u64;
    let stream = futures_util::stream::iter(chunks(video).into_iter().map(move |chunk| {
        sent += chunk.len() as u64;
        progress(upload_fraction(sent, total));
        Ok::<Bytes, std::io::Error>(chunk)
    }));
    Part::stream_with_length(Body::wrap_stream(stream), total).file_name(file_name)
}

fn chunks(video: Bytes) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(video.len() / UPLOAD_CHUNK + 1);
    let mut offset = 0;
    while offset < video.len() {
        let end = (offset + UPLOAD_CHUNK).min(video.len());
        chunks.push(video.slice(offset..end));
        offset = end;
    }
    chunks
}

fn upload_fraction(sent: u64, total: u64) -> f32 {
    if total == 0 {
        1.0
    } else {
        (sent as f64 / total as f64).clamp(0.0, 1.0) as f32
    }
}

async fn ensure_success(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    let reason = status.canonical_reason().unwrap_or("request failed");
    Err(GatewayError::Server {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| reason.to_string()),
    })
}

/// Read a binary media body, rejecting empty or JSON payloads.
async fn read_media(resp: Response) -> Result<Bytes, GatewayError> {
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let bytes = resp.bytes().await.map_err(network_error)?;

    if is_json {
        let detail = error_message(&bytes).unwrap_or_else(|| "JSON body".to_string());
        return Err(GatewayError::MalformedResponse(format!(
            "expected video data, got {detail}"
        )));
    }
    if bytes.is_empty() {
        return Err(GatewayError::MalformedResponse(
            "server returned an empty body".to_string(),
        ));
    }
    Ok(bytes)
}

/// Pull `error` (plus `details` when present) out of a JSON error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error").and_then(|v| v.as_str())?;
    match value.get("details").and_then(|v| v.as_str()) {
        Some(details) if !details.is_empty() => Some(format!("{error}: {details}")),
        _ => Some(error.to_string()),
    }
}

fn attachment_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    parse_content_disposition(value)
}

/// Extract the file name from a `Content-Disposition` header value.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    static FILENAME: OnceLock<Option<Regex>> = OnceLock::new();
    let re = FILENAME
        .get_or_init(|| Regex::new(r#"filename="?([^";]+)"?"#).ok())
        .as_ref()?;
    let name = re.captures(value)?.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn network_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Network("request timed out".to_string())
    } else if err.is_decode() {
        GatewayError::MalformedResponse(err.to_string())
    } else {
        GatewayError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_fields() {
        let fields = text_fields(&TransformOp::Trim {
            start: 1.5,
            end: 10.0,
        });
        assert_eq!(
            fields,
            vec![("start", "1.50".to_string()), ("end", "10.00".to_string())]
        );
    }

    #[test]
    fn test_combined_fields() {
        let fields = text_fields(&TransformOp::Combined {
            start: 2.0,
            end: 5.0,
            subtitle_text: "1\n...".into(),
        });
        let names: Vec<_> = fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["captions", "start", "end"]);
    }

    #[test]
    fn test_chunks_cover_all_bytes() {
        let video = Bytes::from(vec![7u8; UPLOAD_CHUNK * 2 + 10]);
        let parts = chunks(video.clone());
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.iter().map(Bytes::len).sum::<usize>(), video.len());
        assert!(chunks(Bytes::new()).is_empty());
    }

    #[test]
    fn test_upload_fraction() {
        assert_eq!(upload_fraction(0, 0), 1.0);
        assert_eq!(upload_fraction(50, 200), 0.25);
        assert_eq!(upload_fraction(300, 200), 1.0);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(br#"{"error": "Failed to burn in captions", "details": "no font"}"#),
            Some("Failed to burn in captions: no font".to_string())
        );
        assert_eq!(
            error_message(br#"{"error": "End time must be after start time"}"#),
            Some("End time must be after start time".to_string())
        );
        assert_eq!(error_message(b"<html>oops</html>"), None);
    }

    #[test]
    fn test_parse_content_disposition() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="My Talk.mp4""#),
            Some("My Talk.mp4".to_string())
        );
        assert_eq!(
            parse_content_disposition("attachment; filename=clip.mp3"),
            Some("clip.mp3".to_string())
        );
        assert_eq!(parse_content_disposition("inline"), None);
    }

    #[test]
    fn test_endpoint_joins_base() {
        let gateway = HttpGateway::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(gateway.endpoint("trim"), "http://localhost:8000/api/trim/");
    }
}
