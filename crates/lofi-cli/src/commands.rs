//! CLI command implementations

use crate::output::{format_output, ParseReport, SessionLine, TimeReport};
use anyhow::Context;
use lofi_core::{
    extract_video_id, format_time, thumbnail_url, AdapterConfig, NotificationRecord,
    PlaybackSnapshot, PlayerAdapter, PlayerContext, SimulatedApi, VideoId, VideoMetadata,
    VideoMetadataStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

/// How long the simulated API may take to come up
const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Videos the simulated player knows about. Zero duration means a live stream.
const CATALOG: &[(&str, &str, &str, f64)] = &[
    ("jfKfPfyJRdk", "lofi hip hop radio - beats to relax/study to", "Lofi Girl", 0.0),
    ("4xDzrJKXOOY", "synthwave radio - beats to chill/game to", "Lofi Girl", 0.0),
    ("dQw4w9WgXcQ", "Never Gonna Give You Up", "Rick Astley", 213.0),
    ("jNQXAC9IVRw", "Me at the zoo", "jawed", 19.0),
];

/// Videos that refuse to play in an embed
const BLOCKED: &[(&str, i32)] = &[("blockedvid0", 150), ("removedvid0", 100)];

/// Inspect a URL
pub fn parse(url: &str, format: &str) -> anyhow::Result<()> {
    let video_id = extract_video_id(url);
    let report = ParseReport {
        url: url.to_string(),
        valid: video_id.is_some(),
        thumbnail: video_id.as_ref().map(thumbnail_url),
        video_id: video_id.map(|id| id.to_string()),
    };

    println!("{}", format_output(&report, format));
    Ok(())
}

/// Format a position
pub fn time(seconds: f64, format: &str) -> anyhow::Result<()> {
    let report = TimeReport {
        seconds,
        formatted: format_time(seconds),
    };

    println!("{}", format_output(&report, format));
    Ok(())
}

/// Options for a play session
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    pub url: Option<String>,
    pub seconds: u64,
    pub repeat: bool,
    pub skip: Option<f64>,
}

fn catalog_id(raw: &str) -> anyhow::Result<VideoId> {
    VideoId::new(raw).with_context(|| format!("bad catalog video id '{}'", raw))
}

/// Scripted player API stocked with the demo catalog
pub fn demo_api() -> anyhow::Result<SimulatedApi> {
    let mut api = SimulatedApi::scripted();
    for &(id, title, author, duration) in CATALOG {
        api = api.with_video(catalog_id(id)?, VideoMetadata::new(title, author), duration);
    }
    for &(id, code) in BLOCKED {
        api = api.with_broken_video(catalog_id(id)?, code);
    }
    Ok(api)
}

fn print_notifications(notifications: &mut UnboundedReceiver<NotificationRecord>, format: &str) {
    while let Ok(record) = notifications.try_recv() {
        println!(
            "{}",
            format_output(&SessionLine::Notification(record.notification), format)
        );
    }
}

/// Run a simulated session and return the last snapshot seen
pub async fn play(
    config: AdapterConfig,
    options: PlayOptions,
    format: &str,
) -> anyhow::Result<PlaybackSnapshot> {
    let api = demo_api()?;
    let metadata = VideoMetadataStore::global();
    let (adapter, mut notifications) = PlayerAdapter::with_notifications(
        config,
        Arc::new(api),
        Arc::new(PlayerContext::new()),
        Arc::clone(&metadata),
    )?;

    adapter.activate();

    let mut snapshots = adapter.subscribe();
    tokio::time::timeout(READY_TIMEOUT, snapshots.wait_for(|s| s.is_ready))
        .await
        .context("player did not become ready in time")?
        .context("player went away before becoming ready")?;

    let loaded = match options.url.as_deref() {
        Some(url) => adapter.submit_url(url),
        None => adapter.play_default(),
    };
    print_notifications(&mut notifications, format);
    let video_id = loaded?;

    // Loading clears repeat, so apply it afterwards
    adapter.set_repeat(options.repeat);
    info!(video_id = %video_id, seconds = options.seconds, repeat = options.repeat, "Session started");

    let skip_at = options.seconds / 2;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    for second in 0..=options.seconds {
        ticker.tick().await;

        if second == skip_at {
            if let Some(delta) = options.skip {
                if !adapter.skip(delta) {
                    warn!(delta, "Skip ignored, player not ready");
                }
            }
        }

        print_notifications(&mut notifications, format);
        let line = SessionLine::Status {
            second,
            snapshot: adapter.snapshot(),
            metadata: metadata.current(),
        };
        println!("{}", format_output(&line, format));
    }

    let last = adapter.snapshot();
    adapter.teardown();
    info!(video_url = %adapter.video_url(), "Session finished");

    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofi_core::PlayerPhase;

    #[tokio::test]
    async fn test_play_rejects_invalid_config() {
        let config = AdapterConfig {
            poll_interval_ms: 0,
            ..AdapterConfig::default()
        };
        assert!(play(config, PlayOptions::default(), "text").await.is_err());
    }

    #[test]
    fn test_demo_api_builds() {
        assert!(demo_api().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_short_video_to_end() {
        let options = PlayOptions {
            url: Some("https://youtu.be/jNQXAC9IVRw".into()),
            seconds: 25,
            ..PlayOptions::default()
        };

        let last = play(AdapterConfig::default(), options, "json").await.unwrap();
        assert_eq!(last.phase, PlayerPhase::Paused);
        assert_eq!(last.current_time, 0.0);
        assert_eq!(last.duration, 19.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_rejects_invalid_url() {
        let options = PlayOptions {
            url: Some("https://example.com/video".into()),
            seconds: 1,
            ..PlayOptions::default()
        };

        assert!(play(AdapterConfig::default(), options, "text").await.is_err());
    }
}
