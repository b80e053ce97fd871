//! In-memory player backend
//!
//! Stands in for the embedded YouTube player in tests and in the CLI.
//! Two behaviours:
//! - manual: the player only records calls; tests push events themselves
//! - scripted: the player answers commands with the events a real player
//!   would send, and its clock advances while playing

use crate::{
    backend::{EventSink, PlayerApi, PlayerEvent, PlayerHandle},
    types::{EmbedOptions, ExternalState, VideoId, VideoMetadata},
    Error, Result,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Length given to videos missing from the catalog
const DEFAULT_DURATION: f64 = 180.0;

/// Everything a simulated player was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Duration,
    CurrentTime,
    VideoData,
    Play,
    Pause,
    SeekTo { seconds: f64, allow_seek_ahead: bool },
    LoadVideoById(VideoId),
    Mute,
    Unmute,
    SetVolume(u8),
    Destroy,
}

impl PlayerCall {
    /// Queries leave the player untouched
    pub fn is_query(&self) -> bool {
        matches!(self, PlayerCall::Duration | PlayerCall::CurrentTime | PlayerCall::VideoData)
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    metadata: VideoMetadata,
    duration: f64,
    error: Option<i32>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated player API
#[derive(Clone)]
pub struct SimulatedApi {
    ready: Arc<watch::Sender<bool>>,
    load_delay: Option<Duration>,
    scripted: bool,
    fail_create: bool,
    catalog: Arc<Mutex<HashMap<VideoId, CatalogEntry>>>,
    players: Arc<Mutex<Vec<SimulatedPlayer>>>,
}

impl SimulatedApi {
    fn with_state(loaded: bool, scripted: bool) -> Self {
        let (ready, _) = watch::channel(loaded);
        Self {
            ready: Arc::new(ready),
            load_delay: None,
            scripted,
            fail_create: false,
            catalog: Arc::new(Mutex::new(HashMap::new())),
            players: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// API already present; players only record calls
    pub fn loaded() -> Self {
        Self::with_state(true, false)
    }

    /// API absent until [`signal_ready`](Self::signal_ready); players only record calls
    pub fn unloaded() -> Self {
        Self::with_state(false, false)
    }

    /// Players behave like a real embed: events and a running clock
    pub fn scripted() -> Self {
        Self::with_state(false, true).with_load_delay(Duration::from_millis(200))
    }

    /// Make `load()` signal readiness by itself after `delay`
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    /// Make `create_player` fail
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn with_video(self, video_id: VideoId, metadata: VideoMetadata, duration: f64) -> Self {
        lock(&self.catalog).insert(
            video_id,
            CatalogEntry {
                metadata,
                duration,
                error: None,
            },
        );
        self
    }

    /// Scripted players report `code` whenever this video is loaded
    pub fn with_broken_video(self, video_id: VideoId, code: i32) -> Self {
        lock(&self.catalog).insert(
            video_id,
            CatalogEntry {
                metadata: VideoMetadata::default(),
                duration: 0.0,
                error: Some(code),
            },
        );
        self
    }

    /// The host page finished loading the API
    pub fn signal_ready(&self) {
        self.ready.send_replace(true);
    }

    pub fn players_created(&self) -> usize {
        lock(&self.players).len()
    }

    pub fn player(&self, index: usize) -> Option<SimulatedPlayer> {
        lock(&self.players).get(index).cloned()
    }

    pub fn last_player(&self) -> Option<SimulatedPlayer> {
        lock(&self.players).last().cloned()
    }
}

#[async_trait]
impl PlayerApi for SimulatedApi {
    fn is_loaded(&self) -> bool {
        *self.ready.borrow()
    }

    async fn load(&self) -> Result<()> {
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
            self.signal_ready();
        }

        let mut rx = self.ready.subscribe();
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|e| Error::ApiLoad(e.to_string()))
    }

    fn create_player(
        &self,
        mount_point: &str,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<Box<dyn PlayerHandle>> {
        if self.fail_create {
            return Err(Error::PlayerCreate(format!("no element with id '{}'", mount_point)));
        }

        let player = SimulatedPlayer::new(
            mount_point,
            options.clone(),
            events,
            self.scripted,
            Arc::clone(&self.catalog),
        );
        lock(&self.players).push(player.clone());

        if self.scripted {
            player.emit(PlayerEvent::Ready);
            if options.video_id.is_some() {
                player.emit(PlayerEvent::StateChange(ExternalState::Cued.code()));
            }
        }

        Ok(Box::new(player))
    }
}

#[derive(Debug)]
struct SimState {
    mount_point: String,
    options: EmbedOptions,
    video_id: Option<VideoId>,
    metadata: VideoMetadata,
    duration: f64,
    /// Position when the clock was last anchored
    position: f64,
    /// Set while the scripted clock runs
    playing_since: Option<Instant>,
    muted: bool,
    volume: u8,
    calls: Vec<PlayerCall>,
    destroyed: usize,
}

impl SimState {
    fn position_now(&self) -> f64 {
        match self.playing_since {
            Some(since) => self.position + since.elapsed().as_secs_f64(),
            None => self.position,
        }
    }

    /// Freeze the clock at the current position
    fn anchor(&mut self) {
        self.position = self.position_now();
        self.playing_since = None;
    }
}

/// One simulated player; clones share state
#[derive(Clone)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<SimState>>,
    events: EventSink,
    scripted: bool,
    catalog: Arc<Mutex<HashMap<VideoId, CatalogEntry>>>,
}

impl SimulatedPlayer {
    fn new(
        mount_point: &str,
        options: EmbedOptions,
        events: EventSink,
        scripted: bool,
        catalog: Arc<Mutex<HashMap<VideoId, CatalogEntry>>>,
    ) -> Self {
        let player = Self {
            state: Arc::new(Mutex::new(SimState {
                mount_point: mount_point.to_string(),
                video_id: None,
                options: options.clone(),
                metadata: VideoMetadata::default(),
                duration: 0.0,
                position: 0.0,
                playing_since: None,
                muted: false,
                volume: 100,
                calls: Vec::new(),
                destroyed: 0,
            })),
            events,
            scripted,
            catalog,
        };

        if let Some(video_id) = options.video_id {
            player.cue(&mut lock(&player.state), video_id);
        }
        player
    }

    fn cue(&self, state: &mut SimState, video_id: VideoId) {
        let entry = lock(&self.catalog).get(&video_id).cloned();
        let (metadata, duration) = match entry {
            Some(entry) => (entry.metadata, entry.duration),
            None => (
                VideoMetadata::new(format!("Video {}", video_id), "Unknown artist"),
                DEFAULT_DURATION,
            ),
        };

        state.video_id = Some(video_id);
        state.metadata = metadata;
        state.duration = duration;
        state.position = 0.0;
        state.playing_since = None;
    }

    fn broken_code(&self, video_id: &VideoId) -> Option<i32> {
        lock(&self.catalog).get(video_id).and_then(|entry| entry.error)
    }

    fn record(&self, call: PlayerCall) -> MutexGuard<'_, SimState> {
        let mut state = lock(&self.state);
        state.calls.push(call);
        state
    }

    /// Deliver an event as the real player would
    pub fn emit(&self, event: PlayerEvent) {
        debug!(?event, "Simulated player event");
        let _ = self.events.send(event);
    }

    pub fn emit_state(&self, state: ExternalState) {
        self.emit(PlayerEvent::StateChange(state.code()));
    }

    pub fn set_current_time(&self, seconds: f64) {
        let mut state = lock(&self.state);
        state.position = seconds;
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
    }

    pub fn set_duration(&self, seconds: f64) {
        lock(&self.state).duration = seconds;
    }

    pub fn set_video_data(&self, title: &str, author: &str) {
        lock(&self.state).metadata = VideoMetadata::new(title, author);
    }

    pub fn mount_point(&self) -> String {
        lock(&self.state).mount_point.clone()
    }

    pub fn options(&self) -> EmbedOptions {
        lock(&self.state).options.clone()
    }

    pub fn video_id(&self) -> Option<VideoId> {
        lock(&self.state).video_id.clone()
    }

    pub fn is_muted(&self) -> bool {
        lock(&self.state).muted
    }

    pub fn volume(&self) -> u8 {
        lock(&self.state).volume
    }

    /// Every call, queries included
    pub fn calls(&self) -> Vec<PlayerCall> {
        lock(&self.state).calls.clone()
    }

    /// Calls that change the player
    pub fn commands(&self) -> Vec<PlayerCall> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| !call.is_query())
            .cloned()
            .collect()
    }

    pub fn count(&self, call: &PlayerCall) -> usize {
        lock(&self.state).calls.iter().filter(|c| *c == call).count()
    }

    pub fn destroy_count(&self) -> usize {
        lock(&self.state).destroyed
    }
}

impl PlayerHandle for SimulatedPlayer {
    fn duration(&self) -> f64 {
        self.record(PlayerCall::Duration).duration
    }

    fn current_time(&self) -> f64 {
        let mut state = self.record(PlayerCall::CurrentTime);
        let position = state.position_now();

        if self.scripted && state.playing_since.is_some() && state.duration > 0.0 && position >= state.duration {
            state.position = state.duration;
            state.playing_since = None;
            drop(state);
            self.emit_state(ExternalState::Ended);
            return position;
        }

        position
    }

    fn video_data(&self) -> VideoMetadata {
        self.record(PlayerCall::VideoData).metadata.clone()
    }

    fn play_video(&mut self) {
        let mut state = self.record(PlayerCall::Play);
        if self.scripted {
            if state.playing_since.is_none() {
                state.playing_since = Some(Instant::now());
            }
            drop(state);
            self.emit_state(ExternalState::Playing);
        }
    }

    fn pause_video(&mut self) {
        let mut state = self.record(PlayerCall::Pause);
        if self.scripted {
            state.anchor();
            drop(state);
            self.emit_state(ExternalState::Paused);
        }
    }

    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) {
        let mut state = self.record(PlayerCall::SeekTo {
            seconds,
            allow_seek_ahead,
        });
        let upper = if state.duration > 0.0 { state.duration } else { f64::MAX };
        state.position = seconds.clamp(0.0, upper);
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
    }

    fn load_video_by_id(&mut self, video_id: &VideoId) {
        let mut state = self.record(PlayerCall::LoadVideoById(video_id.clone()));
        self.cue(&mut state, video_id.clone());

        if !self.scripted {
            return;
        }

        if let Some(code) = self.broken_code(video_id) {
            drop(state);
            self.emit(PlayerEvent::Error(code));
            return;
        }

        state.playing_since = Some(Instant::now());
        drop(state);
        self.emit_state(ExternalState::Buffering);
        self.emit_state(ExternalState::Playing);
    }

    fn mute(&mut self) {
        self.record(PlayerCall::Mute).muted = true;
    }

    fn unmute(&mut self) {
        self.record(PlayerCall::Unmute).muted = false;
    }

    fn set_volume(&mut self, volume: u8) {
        self.record(PlayerCall::SetVolume(volume)).volume = volume;
    }

    fn destroy(&mut self) {
        let mut state = self.record(PlayerCall::Destroy);
        state.destroyed += 1;
        state.playing_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn video(raw: &str) -> VideoId {
        VideoId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_unloaded_api_waits_for_signal() {
        let api = SimulatedApi::unloaded();
        assert!(!api.is_loaded());

        let loader = {
            let api = api.clone();
            tokio::spawn(async move { api.load().await })
        };
        tokio::task::yield_now().await;
        assert!(!loader.is_finished());

        api.signal_ready();
        assert!(loader.await.unwrap().is_ok());
        assert!(api.is_loaded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_clock_and_end() {
        let api = SimulatedApi::scripted().with_video(
            video("dQw4w9WgXcQ"),
            VideoMetadata::new("Never Gonna Give You Up", "Rick Astley"),
            3.0,
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = api.create_player("player", &EmbedOptions::default(), tx).unwrap();
        assert_eq!(rx.recv().await, Some(PlayerEvent::Ready));

        handle.load_video_by_id(&video("dQw4w9WgXcQ"));
        assert_eq!(rx.recv().await, Some(PlayerEvent::StateChange(3)));
        assert_eq!(rx.recv().await, Some(PlayerEvent::StateChange(1)));
        assert_eq!(handle.video_data().author, "Rick Astley");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!((handle.current_time() - 2.0).abs() < 0.01);

        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.current_time();
        assert_eq!(rx.recv().await, Some(PlayerEvent::StateChange(0)));
    }

    #[tokio::test]
    async fn test_broken_video_reports_error() {
        let api = SimulatedApi::scripted().with_broken_video(video("AAAAAAAAAAA"), 150);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = api.create_player("player", &EmbedOptions::default(), tx).unwrap();
        assert_eq!(rx.recv().await, Some(PlayerEvent::Ready));

        handle.load_video_by_id(&video("AAAAAAAAAAA"));
        assert_eq!(rx.recv().await, Some(PlayerEvent::Error(150)));
    }

    #[test]
    fn test_manual_player_records_calls() {
        let api = SimulatedApi::loaded();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut handle = api.create_player("player", &EmbedOptions::default(), tx).unwrap();

        handle.mute();
        handle.set_volume(30);
        handle.seek_to(12.5, true);
        let _ = handle.current_time();
        handle.destroy();

        let player = api.last_player().unwrap();
        assert!(player.is_muted());
        assert_eq!(player.volume(), 30);
        assert_eq!(player.destroy_count(), 1);
        assert_eq!(player.count(&PlayerCall::CurrentTime), 1);
        assert_eq!(
            player.commands(),
            vec![
                PlayerCall::Mute,
                PlayerCall::SetVolume(30),
                PlayerCall::SeekTo { seconds: 12.5, allow_seek_ahead: true },
                PlayerCall::Destroy,
            ]
        );
    }
}
