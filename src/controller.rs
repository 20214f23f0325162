//! Analyze/download flow.
//!
//! The controller owns the current [`Analysis`] and the presentation
//! [`Phase`]. Every failure is turned into an [`ErrorReport`] here; nothing
//! past this boundary sees a raw error.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::api_client::BackendApi;
use crate::core::capabilities;
use crate::core::direct_downloader::{self, Transfer};
use crate::core::events::{DownloadProgress, EventEmitter, Phase};
use crate::core::filename;
use crate::core::registry::HandlerRegistry;
use crate::models::media::{DownloadRequest, DownloadResult, VideoMetadata};
use crate::platforms::traits::{Activity, PlatformHandler, VideoSummary};
use crate::platforms::Platform;

/// Metadata and the platform it was analyzed under. Replaced as a whole,
/// so the two can never drift apart.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub url: String,
    pub platform: Platform,
    pub metadata: VideoMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub suggestions: Vec<String>,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorReport {}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    Proxied(PathBuf),
    Direct(PathBuf),
    /// Neither source produced a playable file in time.
    Thumbnail {
        thumbnail: Option<String>,
        reason: String,
    },
}

pub struct Controller<E: EventEmitter> {
    backend: Arc<dyn BackendApi>,
    registry: HandlerRegistry,
    emitter: E,
    phase: Phase,
    analysis: Option<Analysis>,
    last_error: Option<ErrorReport>,
    output_dir: PathBuf,
    preview_dir: PathBuf,
    preview_timeout: Duration,
    preferred_format: Option<String>,
}

impl<E: EventEmitter> Controller<E> {
    pub fn new(backend: Arc<dyn BackendApi>, emitter: E, output_dir: PathBuf) -> Self {
        Self {
            backend,
            registry: HandlerRegistry::with_defaults(),
            emitter,
            phase: Phase::Idle,
            analysis: None,
            last_error: None,
            output_dir,
            preview_dir: std::env::temp_dir().join("reelgrab"),
            preview_timeout: Duration::from_secs(15),
            preferred_format: None,
        }
    }

    pub fn with_preview(mut self, dir: PathBuf, timeout: Duration) -> Self {
        self.preview_dir = dir;
        self.preview_timeout = timeout;
        self
    }

    pub fn with_preferred_format(mut self, key: Option<String>) -> Self {
        self.preferred_format = key;
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn last_error(&self) -> Option<&ErrorReport> {
        self.last_error.as_ref()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn summary(&self) -> Option<VideoSummary> {
        let analysis = self.analysis.as_ref()?;
        let handler = self.registry.get(analysis.platform)?;
        Some(handler.summarize(&analysis.metadata, &analysis.url))
    }

    fn set_phase(&mut self, next: Phase) {
        if !self.phase.can_advance_to(&next) {
            tracing::warn!(
                "unexpected phase change {} -> {}",
                self.phase.name(),
                next.name()
            );
        }
        tracing::debug!("phase {} -> {}", self.phase.name(), next.name());
        self.phase = next;
        self.emitter.emit_phase(&self.phase);
    }

    fn fail(&mut self, message: String, suggestions: Vec<String>) -> ErrorReport {
        tracing::error!("{}", message);
        let report = ErrorReport {
            message: message.clone(),
            suggestions,
        };
        self.last_error = Some(report.clone());
        self.set_phase(Phase::Error { message });
        report
    }

    fn all_url_suggestions(&self) -> Vec<String> {
        Platform::SUPPORTED
            .iter()
            .filter_map(|p| self.registry.get(*p))
            .flat_map(|h| h.url_suggestions().iter().map(|s| s.to_string()))
            .collect()
    }

    pub async fn analyze(&mut self, raw_url: &str) -> Result<VideoSummary, ErrorReport> {
        let url = raw_url.trim().to_string();
        self.last_error = None;
        self.set_phase(Phase::Validating);

        if url.is_empty() {
            return Err(self.fail("Please enter a TikTok or Facebook URL".into(), Vec::new()));
        }

        let platform = Platform::classify(&url);
        let Some(handler) = self.registry.get(platform) else {
            let suggestions = self.all_url_suggestions();
            return Err(self.fail(
                "Unsupported platform. Please use TikTok or Facebook URLs".into(),
                suggestions,
            ));
        };

        if !handler.validate(&url) {
            return Err(self.fail(
                format!("Please enter a valid {} URL", handler.display_name()),
                to_owned(handler.url_suggestions()),
            ));
        }

        self.analysis = None;
        self.set_phase(Phase::Loading);
        handler.log_activity(
            "analyze",
            &Activity {
                url: &url,
                ..Default::default()
            },
        );

        match self.backend.video_info(&url).await {
            Ok(metadata) => {
                handler.log_activity(
                    "analyzed",
                    &Activity {
                        url: &url,
                        success: Some(true),
                        ..Default::default()
                    },
                );
                let summary = handler.summarize(&metadata, &url);
                self.analysis = Some(Analysis {
                    url,
                    platform,
                    metadata,
                });
                self.set_phase(Phase::Displaying);
                Ok(summary)
            }
            Err(e) => {
                let message = e.to_string();
                handler.log_activity(
                    "analyze",
                    &Activity {
                        url: &url,
                        success: Some(false),
                        error: Some(&message),
                        ..Default::default()
                    },
                );
                let suggestions = to_owned(&handler.error_suggestions(&message));
                Err(self.fail(message, suggestions))
            }
        }
    }

    /// Downloads `format_key`, or the preferred/best available format when `None`.
    pub async fn download(&mut self, format_key: Option<&str>) -> Result<DownloadResult, ErrorReport> {
        let Some(analysis) = self.analysis.clone() else {
            return Err(self.fail("Please analyze a video first".into(), Vec::new()));
        };
        let Some(handler) = self.registry.get(analysis.platform) else {
            return Err(self.fail("Unsupported platform".into(), Vec::new()));
        };

        let key = match format_key {
            Some(k) => k.to_string(),
            None => match self.pick_format(&analysis) {
                Some(k) => k,
                None => {
                    return Err(self.fail(
                        "No downloadable format is available for this video".into(),
                        Vec::new(),
                    ))
                }
            },
        };

        if !capabilities::is_available(analysis.platform, &analysis.metadata, &key) {
            let label = capabilities::spec(analysis.platform, &key)
                .map(|f| f.label)
                .unwrap_or(key.as_str());
            return Err(self.fail(
                format!("{} version is not available for this video", label),
                Vec::new(),
            ));
        }

        self.set_phase(Phase::Downloading {
            format: key.clone(),
        });
        handler.log_activity(
            "download",
            &Activity {
                url: &analysis.url,
                quality: Some(&key),
                ..Default::default()
            },
        );

        match self.fetch_and_save(&analysis, &key).await {
            Ok(result) => {
                handler.log_activity(
                    "download",
                    &Activity {
                        url: &analysis.url,
                        quality: Some(&key),
                        success: Some(true),
                        ..Default::default()
                    },
                );
                tracing::info!(
                    "Download completed: {} ({})",
                    result.file_path.display(),
                    filename::format_file_size(result.file_size_bytes)
                );
                self.set_phase(Phase::Success {
                    file_path: result.file_path.to_string_lossy().to_string(),
                });
                Ok(result)
            }
            Err(e) => {
                let message = e.to_string();
                handler.log_activity(
                    "download",
                    &Activity {
                        url: &analysis.url,
                        quality: Some(&key),
                        success: Some(false),
                        error: Some(&message),
                    },
                );
                let suggestions = to_owned(&handler.error_suggestions(&message));
                Err(self.fail(message, suggestions))
            }
        }
    }

    fn pick_format(&self, analysis: &Analysis) -> Option<String> {
        self.preferred_format
            .as_deref()
            .filter(|k| capabilities::is_available(analysis.platform, &analysis.metadata, k))
            .or_else(|| capabilities::best_available(analysis.platform, &analysis.metadata))
            .map(str::to_string)
    }

    async fn fetch_and_save(&self, analysis: &Analysis, key: &str) -> anyhow::Result<DownloadResult> {
        let request = DownloadRequest::new(&analysis.url, analysis.platform, key);
        let stream = self.backend.download(&request).await?;

        let name = match stream.filename.as_deref() {
            Some(n) => filename::sanitize_path_component(n),
            None => filename::download_filename(
                analysis.platform,
                analysis.metadata.video_id.as_deref(),
                key,
            ),
        };
        let output = self.output_dir.join(name);

        let (tx, mut rx) = mpsc::channel::<Transfer>(32);
        let emitter = self.emitter.clone();
        let platform = analysis.platform.to_string();
        let format = key.to_string();
        let progress_forwarder = tokio::spawn(async move {
            while let Some(t) = rx.recv().await {
                emitter.emit_progress(&DownloadProgress {
                    platform: platform.clone(),
                    format: format.clone(),
                    percent: t.percent(),
                    downloaded_bytes: t.downloaded,
                    total_bytes: t.total,
                });
            }
        });

        let saved = direct_downloader::save_stream(stream, &output, &tx).await;
        drop(tx);
        let _ = progress_forwarder.await;

        Ok(DownloadResult {
            file_path: output,
            file_size_bytes: saved?,
        })
    }

    /// Fetches the preview clip through the backend proxy, falling back to the
    /// CDN URL. Leaves the phase untouched.
    pub async fn load_preview(&mut self) -> Result<PreviewOutcome, ErrorReport> {
        let Some(analysis) = self.analysis.clone() else {
            return Err(report("Please analyze a video first"));
        };
        let Some(handler) = self.registry.get(analysis.platform) else {
            return Err(report("Video preview not available"));
        };
        let Some(preview_url) = handler.preview_url(&analysis.metadata).map(str::to_string) else {
            return Err(report("Video preview not available"));
        };

        let output = self.preview_dir.join(filename::preview_filename(
            analysis.platform,
            analysis.metadata.video_id.as_deref(),
        ));
        tracing::info!("Loading video preview: {}", preview_url);

        let attempt = tokio::time::timeout(
            self.preview_timeout,
            self.fetch_preview(&preview_url, output.clone()),
        )
        .await;

        let reason = match attempt {
            Ok(Ok(outcome)) => return Ok(outcome),
            Ok(Err(e)) => e.to_string(),
            Err(_) => {
                // The cancelled write never reached its own cleanup.
                let _ = tokio::fs::remove_file(direct_downloader::part_path_for(&output)).await;
                format!("preview did not load within {:?}", self.preview_timeout)
            }
        };
        tracing::warn!("Video preview failed, using thumbnail fallback: {}", reason);
        Ok(PreviewOutcome::Thumbnail {
            thumbnail: analysis.metadata.thumbnail().map(str::to_string),
            reason,
        })
    }

    async fn fetch_preview(&self, preview_url: &str, output: PathBuf) -> anyhow::Result<PreviewOutcome> {
        // Preview progress is not reported; a closed channel makes sends no-ops.
        let (tx, rx) = mpsc::channel::<Transfer>(1);
        drop(rx);

        let proxied = match self.backend.proxy_video(preview_url).await {
            Ok(stream) => direct_downloader::save_stream(stream, &output, &tx).await,
            Err(e) => Err(e),
        };
        match proxied {
            Ok(_) => return Ok(PreviewOutcome::Proxied(output)),
            Err(e) => tracing::warn!("Preview proxy failed, trying direct URL: {}", e),
        }

        let stream = self.backend.fetch_direct(preview_url).await?;
        direct_downloader::save_stream(stream, &output, &tx).await?;
        Ok(PreviewOutcome::Direct(output))
    }

    pub fn reset(&mut self) {
        tracing::debug!("Resetting session");
        self.analysis = None;
        self.last_error = None;
        self.set_phase(Phase::Idle);
    }
}

fn report(message: &str) -> ErrorReport {
    ErrorReport {
        message: message.to_string(),
        suggestions: Vec::new(),
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::api_client::MediaStream;
    use crate::models::media::HealthStatus;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        info: Mutex<Vec<Result<VideoMetadata, String>>>,
        download_body: Option<Vec<Vec<u8>>>,
        download_filename: Option<String>,
        proxy_body: Option<Vec<Vec<u8>>>,
        direct_body: Option<Vec<Vec<u8>>>,
        proxy_delay: Option<Duration>,
        proxy_stalls: bool,
        info_calls: AtomicUsize,
        requests: Mutex<Vec<DownloadRequest>>,
    }

    impl FakeBackend {
        fn with_info(results: Vec<Result<VideoMetadata, String>>) -> Self {
            Self {
                info: Mutex::new(results),
                ..Default::default()
            }
        }

        fn stream(body: &Option<Vec<Vec<u8>>>, what: &str) -> anyhow::Result<MediaStream> {
            body.clone()
                .map(MediaStream::from_chunks)
                .ok_or_else(|| anyhow!("{} failed", what))
        }
    }

    #[async_trait]
    impl BackendApi for FakeBackend {
        async fn video_info(&self, _url: &str) -> anyhow::Result<VideoMetadata> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);
            let mut queue = self.info.lock().unwrap();
            match queue.remove(0) {
                Ok(m) => Ok(m),
                Err(e) => Err(anyhow!(e)),
            }
        }

        async fn download(&self, request: &DownloadRequest) -> anyhow::Result<MediaStream> {
            self.requests.lock().unwrap().push(request.clone());
            let mut stream = Self::stream(&self.download_body, "download")?;
            stream.filename = self.download_filename.clone();
            Ok(stream)
        }

        async fn proxy_video(&self, _url: &str) -> anyhow::Result<MediaStream> {
            if let Some(delay) = self.proxy_delay {
                tokio::time::sleep(delay).await;
            }
            if self.proxy_stalls {
                let head = futures::stream::iter(vec![Ok(vec![0u8; 8])]);
                return Ok(MediaStream {
                    filename: None,
                    content_type: Some("video/mp4".into()),
                    content_length: Some(100),
                    body: head.chain(futures::stream::pending()).boxed(),
                });
            }
            Self::stream(&self.proxy_body, "proxy")
        }

        async fn fetch_direct(&self, _url: &str) -> anyhow::Result<MediaStream> {
            Self::stream(&self.direct_body, "direct")
        }

        async fn health(&self) -> anyhow::Result<HealthStatus> {
            Ok(HealthStatus::default())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingEmitter {
        phases: Arc<Mutex<Vec<String>>>,
        progress: Arc<AtomicUsize>,
    }

    impl EventEmitter for RecordingEmitter {
        fn emit_phase(&self, phase: &Phase) {
            self.phases.lock().unwrap().push(phase.name().to_string());
        }

        fn emit_progress(&self, _progress: &DownloadProgress) {
            self.progress.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RecordingEmitter {
        fn phases(&self) -> Vec<String> {
            self.phases.lock().unwrap().clone()
        }
    }

    const TIKTOK_URL: &str = "https://www.tiktok.com/@user/video/7301234567890123456";
    const FACEBOOK_URL: &str = "https://www.facebook.com/watch/?v=1234567890";

    fn tiktok_meta() -> VideoMetadata {
        VideoMetadata {
            title: Some("dance".into()),
            author: Some("user".into()),
            video_id: Some("7301234567890123456".into()),
            available_formats: [("no_watermark".to_string(), false), ("watermark".to_string(), true)]
                .into_iter()
                .collect(),
            urls: [
                ("watermark".to_string(), "https://cdn/w.mp4".to_string()),
                ("preview".to_string(), "https://cdn/p.mp4".to_string()),
            ]
            .into_iter()
            .collect(),
            thumbnail: Some("https://cdn/t.jpg".into()),
            ..Default::default()
        }
    }

    fn facebook_meta() -> VideoMetadata {
        VideoMetadata {
            available_formats: [
                ("hd".to_string(), false),
                ("sd".to_string(), true),
                ("auto".to_string(), true),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        }
    }

    fn controller(
        backend: FakeBackend,
        dir: &std::path::Path,
    ) -> (Controller<RecordingEmitter>, RecordingEmitter, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let emitter = RecordingEmitter::default();
        let c = Controller::new(backend.clone(), emitter.clone(), dir.join("out"))
            .with_preview(dir.join("preview"), Duration::from_secs(5));
        (c, emitter, backend)
    }

    #[tokio::test]
    async fn empty_url_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, emitter, backend) = controller(FakeBackend::default(), dir.path());

        let err = c.analyze("   ").await.unwrap_err();
        assert_eq!(err.message, "Please enter a TikTok or Facebook URL");
        assert_eq!(emitter.phases(), ["validating", "error"]);
        assert_eq!(backend.info_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_platform_lists_all_examples() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, _, _) = controller(FakeBackend::default(), dir.path());

        let err = c.analyze("https://vimeo.com/123").await.unwrap_err();
        assert_eq!(err.message, "Unsupported platform. Please use TikTok or Facebook URLs");
        assert_eq!(err.suggestions.len(), 9);
    }

    #[tokio::test]
    async fn invalid_url_gets_platform_examples() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, _, backend) = controller(FakeBackend::default(), dir.path());

        let err = c.analyze("https://www.tiktok.com/@someone").await.unwrap_err();
        assert_eq!(err.message, "Please enter a valid TikTok URL");
        assert_eq!(err.suggestions[0], "https://www.tiktok.com/@username/video/...");
        assert_eq!(backend.info_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(c.phase(), Phase::Error { .. }));
    }

    #[tokio::test]
    async fn analyze_success_displays_summary() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, emitter, _) =
            controller(FakeBackend::with_info(vec![Ok(tiktok_meta())]), dir.path());

        let summary = c.analyze(&format!("  {}  ", TIKTOK_URL)).await.unwrap();
        assert_eq!(emitter.phases(), ["validating", "loading", "displaying"]);
        assert_eq!(summary.platform, Platform::TikTok);
        assert_eq!(summary.best_format, Some("watermark"));
        assert_eq!(summary.author, "@user");
        let analysis = c.analysis().unwrap();
        assert_eq!(analysis.platform, Platform::TikTok);
        assert_eq!(analysis.url, TIKTOK_URL);
    }

    #[tokio::test]
    async fn backend_error_gets_suggestions_and_clears_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::with_info(vec![
            Ok(facebook_meta()),
            Err("This video is private".into()),
        ]);
        let (mut c, _, _) = controller(backend, dir.path());

        c.analyze(FACEBOOK_URL).await.unwrap();
        let err = c.analyze(FACEBOOK_URL).await.unwrap_err();
        assert_eq!(err.message, "This video is private");
        assert_eq!(err.suggestions.len(), 2);
        assert!(c.analysis().is_none());
        assert_eq!(c.last_error(), Some(&err));
    }

    #[tokio::test]
    async fn reanalysis_replaces_platform_pairing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::with_info(vec![Ok(tiktok_meta()), Ok(facebook_meta())]);
        let (mut c, _, _) = controller(backend, dir.path());

        c.analyze(TIKTOK_URL).await.unwrap();
        c.analyze(FACEBOOK_URL).await.unwrap();
        let analysis = c.analysis().unwrap();
        assert_eq!(analysis.platform, Platform::Facebook);
        assert!(analysis.metadata.is_available("sd"));
    }

    #[tokio::test]
    async fn download_requires_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, _, _) = controller(FakeBackend::default(), dir.path());

        let err = c.download(Some("hd")).await.unwrap_err();
        assert_eq!(err.message, "Please analyze a video first");
    }

    #[tokio::test]
    async fn download_rejects_unavailable_format() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, _, backend) =
            controller(FakeBackend::with_info(vec![Ok(tiktok_meta())]), dir.path());

        c.analyze(TIKTOK_URL).await.unwrap();
        let err = c.download(Some("no_watermark")).await.unwrap_err();
        assert_eq!(err.message, "No Watermark version is not available for this video");
        assert!(backend.requests.lock().unwrap().is_empty());
        assert!(c.analysis().is_some());
    }

    #[tokio::test]
    async fn download_best_format_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(facebook_meta())]);
        backend.download_body = Some(vec![vec![7; 10], vec![8; 6]]);
        let (mut c, emitter, backend) = controller(backend, dir.path());

        c.analyze(FACEBOOK_URL).await.unwrap();
        let result = c.download(None).await.unwrap();

        assert_eq!(result.file_size_bytes, 16);
        assert_eq!(result.file_path, dir.path().join("out").join("facebook_video_sd.mp4"));
        assert_eq!(std::fs::read(&result.file_path).unwrap().len(), 16);
        assert_eq!(
            emitter.phases(),
            ["validating", "loading", "displaying", "downloading", "success"]
        );
        assert_eq!(emitter.progress.load(Ordering::SeqCst), 2);

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].quality, "sd");
        assert_eq!(requests[0].no_watermark, None);
    }

    #[tokio::test]
    async fn second_format_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(facebook_meta())]);
        backend.download_body = Some(vec![vec![3; 5]]);
        let (mut c, emitter, backend) = controller(backend, dir.path());

        c.analyze(FACEBOOK_URL).await.unwrap();
        let first = c.download(Some("sd")).await.unwrap();
        let second = c.download(Some("auto")).await.unwrap();

        assert!(first.file_path.exists());
        assert!(second.file_path.exists());
        assert!(second.file_path.ends_with("facebook_video_auto.mp4"));
        assert_eq!(
            emitter.phases()[3..],
            ["downloading", "success", "downloading", "success"]
        );
        let qualities: Vec<_> = backend
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.quality.clone())
            .collect();
        assert_eq!(qualities, ["sd", "auto"]);
    }

    #[tokio::test]
    async fn preferred_format_wins_when_available() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(facebook_meta())]);
        backend.download_body = Some(vec![vec![1; 4]]);
        backend.download_filename = Some("facebook_99_auto.mp4".into());
        let (c, _, backend) = controller(backend, dir.path());
        let mut c = c.with_preferred_format(Some("auto".into()));

        c.analyze(FACEBOOK_URL).await.unwrap();
        let result = c.download(None).await.unwrap();
        assert!(result.file_path.ends_with("facebook_99_auto.mp4"));
        assert_eq!(backend.requests.lock().unwrap()[0].quality, "auto");
    }

    #[tokio::test]
    async fn empty_download_is_an_error_and_keeps_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(tiktok_meta())]);
        backend.download_body = Some(vec![]);
        let (mut c, emitter, _) = controller(backend, dir.path());

        c.analyze(TIKTOK_URL).await.unwrap();
        let err = c.download(Some("watermark")).await.unwrap_err();
        assert_eq!(err.message, "Downloaded file is empty");
        assert!(c.analysis().is_some());
        assert_eq!(emitter.phases().last().unwrap(), "error");
    }

    #[tokio::test]
    async fn preview_through_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(tiktok_meta())]);
        backend.proxy_body = Some(vec![vec![1; 3]]);
        let (mut c, emitter, _) = controller(backend, dir.path());

        c.analyze(TIKTOK_URL).await.unwrap();
        let outcome = c.load_preview().await.unwrap();
        let expected = dir
            .path()
            .join("preview")
            .join("tiktok_7301234567890123456_preview.mp4");
        assert_eq!(outcome, PreviewOutcome::Proxied(expected));
        assert_eq!(emitter.phases().last().unwrap(), "displaying");
    }

    #[tokio::test]
    async fn preview_falls_back_to_direct_then_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(tiktok_meta()), Ok(tiktok_meta())]);
        backend.direct_body = Some(vec![vec![1; 3]]);
        let (mut c, _, _) = controller(backend, dir.path());

        c.analyze(TIKTOK_URL).await.unwrap();
        assert!(matches!(c.load_preview().await.unwrap(), PreviewOutcome::Direct(_)));

        let (mut c, _, _) = controller(FakeBackend::with_info(vec![Ok(tiktok_meta())]), dir.path());
        c.analyze(TIKTOK_URL).await.unwrap();
        match c.load_preview().await.unwrap() {
            PreviewOutcome::Thumbnail { thumbnail, .. } => {
                assert_eq!(thumbnail.as_deref(), Some("https://cdn/t.jpg"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn preview_timeout_uses_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(tiktok_meta())]);
        backend.proxy_body = Some(vec![vec![1; 3]]);
        backend.proxy_delay = Some(Duration::from_secs(30));
        let (c, _, _) = controller(backend, dir.path());
        let mut c = c.with_preview(dir.path().join("preview"), Duration::from_millis(50));

        c.analyze(TIKTOK_URL).await.unwrap();
        match c.load_preview().await.unwrap() {
            PreviewOutcome::Thumbnail { reason, .. } => assert!(reason.contains("did not load")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn stalled_preview_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FakeBackend::with_info(vec![Ok(tiktok_meta())]);
        backend.proxy_stalls = true;
        let (c, _, _) = controller(backend, dir.path());
        let preview_dir = dir.path().join("preview");
        let mut c = c.with_preview(preview_dir.clone(), Duration::from_millis(100));

        c.analyze(TIKTOK_URL).await.unwrap();
        match c.load_preview().await.unwrap() {
            PreviewOutcome::Thumbnail { reason, .. } => {
                assert_eq!(reason, "preview did not load within 100ms")
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let left: Vec<_> = std::fs::read_dir(&preview_dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect())
            .unwrap_or_default();
        assert!(left.is_empty(), "left in preview dir: {:?}", left);
    }

    #[tokio::test]
    async fn preview_without_url_keeps_phase() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, _, _) = controller(FakeBackend::with_info(vec![Ok(facebook_meta())]), dir.path());

        c.analyze(FACEBOOK_URL).await.unwrap();
        let err = c.load_preview().await.unwrap_err();
        assert_eq!(err.message, "Video preview not available");
        assert_eq!(c.phase(), &Phase::Displaying);
    }

    #[tokio::test]
    async fn reset_returns_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let (mut c, _, _) = controller(FakeBackend::with_info(vec![Ok(tiktok_meta())]), dir.path());

        c.analyze(TIKTOK_URL).await.unwrap();
        c.reset();
        assert_eq!(c.phase(), &Phase::Idle);
        assert!(c.analysis().is_none());
        assert!(c.summary().is_none());
    }
}
