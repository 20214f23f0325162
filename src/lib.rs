use std::sync::Arc;
use std::time::Duration;

use reelgrab_core::fs_paths::{AppPaths, DesktopPaths};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::controller::{Controller, ErrorReport, PreviewOutcome};
use crate::core::api_client::{BackendApi, BackendClient};
use crate::core::events::ConsoleEventEmitter;
use crate::models::settings::AppSettings;

pub mod cli;
pub mod controller;
pub mod core;
pub mod models;
pub mod platforms;
pub mod storage;

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reelgrab=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_settings(cli: &Cli) -> AppSettings {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| DesktopPaths.settings_file());
    let mut settings = storage::config::load_settings(&path);
    cli.apply_overrides(&mut settings);
    settings
}

/// Runs one command. `Ok(false)` means the flow ended in the error phase.
pub async fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = load_settings(&cli);
    tracing::debug!("Using backend {}", settings.api_base);

    let client = core::http_client::build_client(&settings);
    let backend: Arc<dyn BackendApi> = Arc::new(BackendClient::new(
        client,
        &settings.api_base,
        Duration::from_secs(settings.network.request_timeout_secs),
    ));

    match cli.command {
        Command::Detect { url } => {
            detect(&url)?;
            Ok(true)
        }
        Command::Health => {
            let health = backend.health().await?;
            print_json(&health)?;
            Ok(true)
        }
        Command::Info { url } => {
            let mut controller = new_controller(backend, &settings);
            match controller.analyze(&url).await {
                Ok(summary) => {
                    print_json(&summary)?;
                    Ok(true)
                }
                Err(report) => {
                    print_report(&report);
                    Ok(false)
                }
            }
        }
        Command::Download { url, format, .. } => {
            let mut controller = new_controller(backend, &settings);
            let result = match controller.analyze(&url).await {
                Ok(_) => controller.download(format.as_deref()).await,
                Err(report) => Err(report),
            };
            match result {
                Ok(done) => {
                    println!("{}", done.file_path.display());
                    Ok(true)
                }
                Err(report) => {
                    print_report(&report);
                    Ok(false)
                }
            }
        }
        Command::Preview { url, output } => {
            let mut controller = new_controller(backend, &settings);
            if let Some(dir) = output {
                controller = controller.with_preview(
                    dir,
                    Duration::from_secs(settings.network.preview_timeout_secs),
                );
            }
            if let Err(report) = controller.analyze(&url).await {
                print_report(&report);
                return Ok(false);
            }
            match controller.load_preview().await {
                Ok(PreviewOutcome::Proxied(path)) | Ok(PreviewOutcome::Direct(path)) => {
                    println!("{}", path.display());
                    Ok(true)
                }
                Ok(PreviewOutcome::Thumbnail { thumbnail, reason }) => {
                    tracing::warn!("Preview unavailable: {}", reason);
                    match thumbnail {
                        Some(t) => println!("{}", t),
                        None => println!("No preview or thumbnail available"),
                    }
                    Ok(true)
                }
                Err(report) => {
                    print_report(&report);
                    Ok(true)
                }
            }
        }
    }
}

fn new_controller(
    backend: Arc<dyn BackendApi>,
    settings: &AppSettings,
) -> Controller<ConsoleEventEmitter> {
    Controller::new(
        backend,
        ConsoleEventEmitter::new(),
        settings.download.output_dir.clone(),
    )
    .with_preview(
        std::env::temp_dir().join("reelgrab"),
        Duration::from_secs(settings.network.preview_timeout_secs),
    )
    .with_preferred_format(settings.download.preferred_format.clone())
}

fn detect(url: &str) -> anyhow::Result<()> {
    match core::url_parser::parse_url(url) {
        Some(parsed) => {
            let valid = core::url_parser::validate(&parsed.url, parsed.platform);
            print_json(&serde_json::json!({
                "platform": parsed.platform,
                "valid": valid,
                "content_id": parsed.content_id,
                "content_type": parsed.content_type,
            }))
        }
        None => print_json(&serde_json::json!({
            "platform": core::url_parser::classify(url),
            "valid": false,
        })),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &ErrorReport) {
    eprintln!("Error: {}", report.message);
    for hint in &report.suggestions {
        eprintln!("  - {}", hint);
    }
}
