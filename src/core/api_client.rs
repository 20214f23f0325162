use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;

use crate::models::media::{
    DownloadRequest, ErrorBody, HealthStatus, ProxyRequest, VideoInfoRequest, VideoInfoResponse,
    VideoMetadata,
};

/// A binary response body plus what the headers told us about it.
pub struct MediaStream {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, anyhow::Result<Vec<u8>>>,
}

impl MediaStream {
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Self {
        let len = chunks.iter().map(|c| c.len() as u64).sum();
        Self {
            filename: None,
            content_type: Some("video/mp4".to_string()),
            content_length: Some(len),
            body: futures::stream::iter(chunks.into_iter().map(Ok)).boxed(),
        }
    }
}

#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn video_info(&self, url: &str) -> anyhow::Result<VideoMetadata>;
    async fn download(&self, request: &DownloadRequest) -> anyhow::Result<MediaStream>;
    async fn proxy_video(&self, video_url: &str) -> anyhow::Result<MediaStream>;
    /// Plain GET of a media URL, used when the proxy is unavailable.
    async fn fetch_direct(&self, video_url: &str) -> anyhow::Result<MediaStream>;
    async fn health(&self) -> anyhow::Result<HealthStatus>;
}

pub struct BackendClient {
    client: reqwest::Client,
    api_base: String,
    request_timeout: Duration,
}

impl BackendClient {
    pub fn new(client: reqwest::Client, api_base: &str, request_timeout: Duration) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            request_timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// `/health` lives beside the API root rather than under it.
    fn health_endpoint(&self) -> String {
        match self.api_base.strip_suffix("/api") {
            Some(root) => format!("{}/health", root),
            None => format!("{}/health", self.api_base),
        }
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> anyhow::Result<reqwest::Response> {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;
        tracing::debug!("POST {} -> {}", url, response.status());
        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let fallback = format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or(fallback);
    Err(anyhow!(message))
}

fn into_media_stream(response: reqwest::Response) -> MediaStream {
    let headers = response.headers();
    let filename = headers
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition);
    let content_type = headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_length = response.content_length();
    let body = response
        .bytes_stream()
        .map(|chunk| chunk.map(|b| b.to_vec()).map_err(anyhow::Error::from))
        .boxed();

    MediaStream {
        filename,
        content_type,
        content_length,
        body,
    }
}

pub fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let encoded = encoded.trim_matches('"');
            let raw = encoded
                .split_once("''")
                .map(|(_, v)| v)
                .unwrap_or(encoded);
            if let Ok(decoded) = urlencoding::decode(raw) {
                if !decoded.is_empty() {
                    return Some(decoded.into_owned());
                }
            }
        } else if let Some(name) = part.strip_prefix("filename=") {
            let name = name.trim_matches('"');
            if !name.is_empty() {
                plain = Some(name.to_string());
            }
        }
    }
    plain
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn video_info(&self, url: &str) -> anyhow::Result<VideoMetadata> {
        let body = VideoInfoRequest {
            url: url.to_string(),
        };
        let response = tokio::time::timeout(self.request_timeout, self.post_json("video-info", &body))
            .await
            .map_err(|_| anyhow!("Request timed out after {}s", self.request_timeout.as_secs()))??;

        let payload: VideoInfoResponse = response
            .json()
            .await
            .map_err(|_| anyhow!("Invalid response format from server"))?;

        match payload {
            VideoInfoResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            VideoInfoResponse {
                error: Some(error), ..
            } => Err(anyhow!(error)),
            _ => Err(anyhow!("Invalid response format from server")),
        }
    }

    async fn download(&self, request: &DownloadRequest) -> anyhow::Result<MediaStream> {
        let response = self.post_json("download", request).await?;
        Ok(into_media_stream(response))
    }

    async fn proxy_video(&self, video_url: &str) -> anyhow::Result<MediaStream> {
        let body = ProxyRequest {
            url: video_url.to_string(),
        };
        let response = self.post_json("proxy-video", &body).await?;
        Ok(into_media_stream(response))
    }

    async fn fetch_direct(&self, video_url: &str) -> anyhow::Result<MediaStream> {
        let response = self
            .client
            .get(video_url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", video_url))?;
        let response = ensure_success(response).await?;
        Ok(into_media_stream(response))
    }

    async fn health(&self) -> anyhow::Result<HealthStatus> {
        let url = self.health_endpoint();
        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::Platform;

    fn client_for(server: &mockito::Server) -> BackendClient {
        BackendClient::new(
            reqwest::Client::new(),
            &format!("{}/api/", server.url()),
            Duration::from_secs(5),
        )
    }

    async fn collect(stream: MediaStream) -> Vec<u8> {
        let mut body = stream.body;
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend(chunk.unwrap());
        }
        out
    }

    #[test]
    fn content_disposition_variants() {
        assert_eq!(
            parse_content_disposition("attachment; filename=tiktok_1_watermark.mp4").as_deref(),
            Some("tiktok_1_watermark.mp4")
        );
        assert_eq!(
            parse_content_disposition("attachment; filename=\"a b.mp4\"").as_deref(),
            Some("a b.mp4")
        );
        assert_eq!(
            parse_content_disposition("attachment; filename=x.mp4; filename*=UTF-8''caf%C3%A9.mp4")
                .as_deref(),
            Some("café.mp4")
        );
        assert_eq!(parse_content_disposition("inline"), None);
    }

    #[tokio::test]
    async fn video_info_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/video-info")
            .match_body(mockito::Matcher::Json(serde_json::json!({"url": "https://fb.watch/x"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true, "platform": "facebook", "data": {
                    "title": "t", "author": "a", "duration": "1:00", "thumbnail": "",
                    "urls": {"hd": null, "sd": "https://cdn/sd.mp4", "auto": "https://cdn/a.mp4", "preview": "https://cdn/a.mp4"},
                    "available_formats": {"hd": false, "sd": true, "auto": true}}}"#,
            )
            .create_async()
            .await;

        let meta = client_for(&server).video_info("https://fb.watch/x").await.unwrap();
        mock.assert_async().await;
        assert!(meta.is_available("sd"));
        assert_eq!(meta.url("hd"), None);
        assert_eq!(meta.thumbnail(), None);
    }

    #[tokio::test]
    async fn video_info_error_body_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/video-info")
            .with_status(400)
            .with_body(r#"{"error": "This video is private"}"#)
            .create_async()
            .await;

        let err = client_for(&server).video_info("https://fb.watch/x").await.unwrap_err();
        assert_eq!(err.to_string(), "This video is private");
    }

    #[tokio::test]
    async fn non_json_error_uses_status_line() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/video-info")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let err = client_for(&server).video_info("https://fb.watch/x").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[tokio::test]
    async fn video_info_without_success_flag_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/video-info")
            .with_status(200)
            .with_body(r#"{"success": false}"#)
            .create_async()
            .await;

        let err = client_for(&server).video_info("https://fb.watch/x").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid response format from server");
    }

    #[tokio::test]
    async fn download_streams_body_and_filename() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/download")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "url": "https://vm.tiktok.com/x",
                "quality": "no_watermark",
                "no_watermark": true
            })))
            .with_status(200)
            .with_header("content-type", "video/mp4")
            .with_header(
                "content-disposition",
                "attachment; filename=tiktok_7_no_watermark.mp4",
            )
            .with_body(b"\x00\x00\x00\x18ftypmp42")
            .create_async()
            .await;

        let req = DownloadRequest::new("https://vm.tiktok.com/x", Platform::TikTok, "no_watermark");
        let stream = client_for(&server).download(&req).await.unwrap();
        mock.assert_async().await;
        assert_eq!(stream.filename.as_deref(), Some("tiktok_7_no_watermark.mp4"));
        assert_eq!(stream.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(collect(stream).await.len(), 12);
    }

    #[tokio::test]
    async fn health_sits_beside_api_root() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status": "healthy", "version": "3.0.0", "supported_platforms": ["tiktok", "facebook"]}"#)
            .create_async()
            .await;

        let health = client_for(&server).health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.supported_platforms.len(), 2);
    }
}
