//! Player Adapter - drives one embedded player
//!
//! Coordinates:
//! - One-time bootstrap of the player API and the player handle
//! - Player events (ready, state changes, errors) applied to the snapshot
//! - Imperative controls with optimistic snapshot updates
//! - Position polling while playing
//! - Teardown of the handle
//!
//! Every mutation happens under one lock and ends with a whole new snapshot
//! being published. Event and poll data always overwrite optimistic values
//! written by controls.

use crate::{
    backend::{EventSink, PlayerApi, PlayerEvent, PlayerHandle},
    context::PlayerContext,
    metadata::VideoMetadataStore,
    notify::{ErrorCategory, Notification, NotificationRecord, Notifier},
    types::*,
    youtube, Error, Result,
};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// Adapter between the widget and one embedded player
pub struct PlayerAdapter {
    shared: Arc<Shared>,
}

struct Shared {
    /// Unique adapter ID
    id: AdapterId,
    config: AdapterConfig,
    api: Arc<dyn PlayerApi>,
    context: Arc<PlayerContext>,
    metadata: Arc<VideoMetadataStore>,
    notifier: Notifier,
    /// Current snapshot, only written while `core` is locked
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
    core: Mutex<Core>,
}

#[derive(Default)]
struct Core {
    /// The one player this adapter owns
    handle: Option<Box<dyn PlayerHandle>>,
    /// URL string of the current video as the user gave it
    video_url: String,
    /// Requested after the handle was created but before it was ready
    pending: Option<VideoId>,
    /// Last video that reached playing
    last_good: Option<Track>,
    /// A fallback reload is in flight
    recovering: bool,
    tasks: Tasks,
}

#[derive(Debug, Clone)]
struct Track {
    id: VideoId,
    url: String,
}

#[derive(Default)]
struct Tasks {
    bootstrap: Option<JoinHandle<()>>,
    events: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(&mut self) {
        for task in [self.bootstrap.take(), self.events.take(), self.poller.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

impl PlayerAdapter {
    /// Create an adapter. Nothing is loaded until [`activate`](Self::activate).
    ///
    /// Fails with [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(
        config: AdapterConfig,
        api: Arc<dyn PlayerApi>,
        context: Arc<PlayerContext>,
        metadata: Arc<VideoMetadataStore>,
    ) -> Result<Self> {
        Self::build(config, api, context, metadata, Notifier::silent)
    }

    /// Create an adapter whose notifications are delivered to the returned receiver
    pub fn with_notifications(
        config: AdapterConfig,
        api: Arc<dyn PlayerApi>,
        context: Arc<PlayerContext>,
        metadata: Arc<VideoMetadataStore>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<NotificationRecord>)> {
        let mut receiver = None;
        let adapter = Self::build(config, api, context, metadata, |id| {
            let (notifier, rx) = Notifier::channel(id);
            receiver = Some(rx);
            notifier
        })?;
        let rx = receiver.unwrap_or_else(|| mpsc::unbounded_channel().1);
        Ok((adapter, rx))
    }

    fn build(
        config: AdapterConfig,
        api: Arc<dyn PlayerApi>,
        context: Arc<PlayerContext>,
        metadata: Arc<VideoMetadataStore>,
        notifier: impl FnOnce(AdapterId) -> Notifier,
    ) -> Result<Self> {
        config.validate()?;

        let id = AdapterId::new();
        let initial_url = config.initial_url.clone().unwrap_or_default();
        let snapshot = PlaybackSnapshot::initial(youtube::extract_video_id(&initial_url));
        let (snapshot_tx, _) = watch::channel(snapshot);

        debug!(adapter_id = %id, initial_url = %initial_url, "Adapter created");

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                notifier: notifier(id),
                config,
                api,
                context,
                metadata,
                snapshot_tx,
                core: Mutex::new(Core {
                    video_url: initial_url,
                    ..Core::default()
                }),
            }),
        })
    }

    /// Get adapter ID
    pub fn id(&self) -> AdapterId {
        self.shared.id
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.shared.config
    }

    /// Current snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.snapshot_tx.borrow().clone()
    }

    /// Subscribe to snapshot replacements
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    pub fn phase(&self) -> PlayerPhase {
        self.shared.snapshot_tx.borrow().phase
    }

    /// URL of the current video as it was entered
    pub fn video_url(&self) -> String {
        self.shared.lock().video_url.clone()
    }

    pub fn metadata(&self) -> Arc<VideoMetadataStore> {
        Arc::clone(&self.shared.metadata)
    }

    pub fn context(&self) -> Arc<PlayerContext> {
        Arc::clone(&self.shared.context)
    }

    /// Whether a polling task is currently alive
    pub fn is_polling(&self) -> bool {
        self.shared
            .lock()
            .tasks
            .poller
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Load the player API if needed and create the player. Idempotent.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn activate(&self) {
        self.shared.activate();
    }

    /// Apply one player event
    pub fn dispatch(&self, event: PlayerEvent) {
        self.shared.dispatch(event);
    }

    /// Switch to the video in `url`
    pub fn load_video(&self, url: &str) -> Result<VideoId> {
        self.shared.load_video(url)
    }

    /// URL form submission: validates, loads, and reports the outcome
    pub fn submit_url(&self, input: &str) -> Result<VideoId> {
        let input = input.trim();
        if input.is_empty() {
            self.shared.notifier.emit(Notification::EmptyUrl);
            return Err(Error::EmptyUrl);
        }

        let video_id = self.load_video(input)?;
        self.shared.notifier.emit(Notification::VideoLoaded);
        Ok(video_id)
    }

    /// Load the configured default video
    pub fn play_default(&self) -> Result<VideoId> {
        let url = self.shared.config.default_url.clone();
        self.load_video(&url)
    }

    pub fn play(&self) -> bool {
        self.shared.control("play", |handle, snap| {
            handle.play_video();
            snap.with_phase(PlayerPhase::Playing)
        })
    }

    pub fn pause(&self) -> bool {
        self.shared.control("pause", |handle, snap| {
            handle.pause_video();
            snap.with_phase(PlayerPhase::Paused)
        })
    }

    pub fn toggle_play(&self) -> bool {
        self.shared.control("toggle_play", |handle, snap| {
            if snap.is_playing {
                handle.pause_video();
                snap.with_phase(PlayerPhase::Paused)
            } else {
                handle.play_video();
                snap.with_phase(PlayerPhase::Playing)
            }
        })
    }

    /// Seek relative to the player's position. The target is not clamped.
    pub fn skip(&self, delta_seconds: f64) -> bool {
        self.shared.control("skip", |handle, snap| {
            let target = handle.current_time() + delta_seconds;
            handle.seek_to(target, true);
            PlaybackSnapshot {
                current_time: target,
                ..snap.clone()
            }
        })
    }

    pub fn seek_to(&self, seconds: f64) -> bool {
        self.shared.control("seek_to", |handle, snap| {
            handle.seek_to(seconds, true);
            PlaybackSnapshot {
                current_time: seconds,
                ..snap.clone()
            }
        })
    }

    pub fn mute(&self) -> bool {
        self.shared.control("mute", |handle, snap| {
            handle.mute();
            PlaybackSnapshot {
                is_muted: true,
                ..snap.clone()
            }
        })
    }

    pub fn unmute(&self) -> bool {
        self.shared.control("unmute", |handle, snap| {
            handle.unmute();
            PlaybackSnapshot {
                is_muted: false,
                ..snap.clone()
            }
        })
    }

    /// Set volume, capped at 100
    pub fn set_volume(&self, volume: u8) -> bool {
        let volume = volume.min(100);
        self.shared.control("set_volume", |handle, snap| {
            handle.set_volume(volume);
            PlaybackSnapshot {
                volume,
                ..snap.clone()
            }
        })
    }

    /// Consulted the next time a video ends
    pub fn set_repeat(&self, repeat: bool) {
        self.shared.context.set_repeat(repeat);
    }

    pub fn repeat(&self) -> bool {
        self.shared.context.repeat()
    }

    /// Release the player. Safe to call more than once.
    pub fn teardown(&self) {
        self.shared.teardown();
    }
}

impl Drop for PlayerAdapter {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl std::fmt::Debug for PlayerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerAdapter")
            .field("id", &self.shared.id)
            .field("phase", &self.phase())
            .finish()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> PlaybackSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Move `snap` to `phase`, rejecting moves the state machine does not allow
    fn transition(&self, snap: &PlaybackSnapshot, phase: PlayerPhase) -> Result<PlaybackSnapshot> {
        if snap.phase != phase && !snap.phase.can_transition_to(phase) {
            return Err(Error::InvalidStateTransition {
                from: snap.phase.to_string(),
                to: phase.to_string(),
            });
        }
        Ok(snap.with_phase(phase))
    }

    /// Publish a new snapshot and bring the poller in line with it
    fn commit(self: &Arc<Self>, core: &mut Core, next: PlaybackSnapshot) {
        let from = self.snapshot_tx.borrow().phase;
        if from != next.phase {
            info!(adapter_id = %self.id, from = %from, to = %next.phase, "Phase transition");
        }

        self.snapshot_tx.send_replace(next);
        self.sync_poller(core);
    }

    fn spawn<F>(&self, task: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match RuntimeHandle::try_current() {
            Ok(runtime) => Some(runtime.spawn(task)),
            Err(_) => {
                warn!(adapter_id = %self.id, "No Tokio runtime, background task not started");
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Bootstrap
    // ------------------------------------------------------------------

    #[instrument(skip(self), fields(adapter_id = %self.id))]
    fn activate(self: &Arc<Self>) {
        let mut core = self.lock();
        let snap = self.current();

        if snap.phase != PlayerPhase::Uninitialized {
            debug!(phase = %snap.phase, "Already activated");
            return;
        }

        self.commit(&mut core, snap.with_phase(PlayerPhase::Initializing));

        if self.api.is_loaded() {
            self.construct(&mut core);
            return;
        }

        info!("Loading player API");
        let api = Arc::clone(&self.api);
        let weak = Arc::downgrade(self);
        core.tasks.bootstrap = self.spawn(async move {
            let loaded = api.load().await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match loaded {
                Ok(()) => shared.finish_bootstrap(),
                Err(err) => {
                    error!(adapter_id = %shared.id, error = %err, "Player API failed to load");
                    shared.abandon_bootstrap();
                }
            }
        });

        if core.tasks.bootstrap.is_none() {
            let snap = self.current();
            self.commit(&mut core, snap.with_phase(PlayerPhase::Uninitialized));
        }
    }

    fn finish_bootstrap(self: &Arc<Self>) {
        let mut core = self.lock();
        core.tasks.bootstrap = None;

        if self.current().phase != PlayerPhase::Initializing || core.handle.is_some() {
            debug!(adapter_id = %self.id, "Bootstrap continuation no longer needed");
            return;
        }

        self.construct(&mut core);
    }

    fn abandon_bootstrap(self: &Arc<Self>) {
        let mut core = self.lock();
        core.tasks.bootstrap = None;

        let snap = self.current();
        if snap.phase == PlayerPhase::Initializing && core.handle.is_none() {
            self.commit(&mut core, snap.with_phase(PlayerPhase::Uninitialized));
        }
    }

    /// Create the one player handle. Caller holds the lock.
    fn construct(self: &Arc<Self>, core: &mut Core) {
        if core.handle.is_some() {
            return;
        }

        let snap = self.current();

        // Without a runtime no event pump can run, so a handle would never become ready
        if RuntimeHandle::try_current().is_err() {
            warn!(adapter_id = %self.id, "No Tokio runtime, player not created");
            self.commit(core, snap.with_phase(PlayerPhase::Uninitialized));
            return;
        }

        let mut options = self.config.embed.clone();
        options.video_id = snap.video_id.clone();
        core.pending = None;

        let (events_tx, events_rx): (EventSink, _) = mpsc::unbounded_channel();

        match self.api.create_player(&self.config.mount_point, &options, events_tx) {
            Ok(handle) => {
                info!(
                    adapter_id = %self.id,
                    mount_point = %self.config.mount_point,
                    video_id = ?options.video_id,
                    "Player created"
                );
                core.handle = Some(handle);
                core.tasks.events = self.spawn(pump_events(Arc::downgrade(self), events_rx));
            }
            Err(err) => {
                error!(adapter_id = %self.id, error = %err, "Failed to create player");
                self.commit(core, snap.with_phase(PlayerPhase::Uninitialized));
            }
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn dispatch(self: &Arc<Self>, event: PlayerEvent) {
        let mut core = self.lock();

        if core.handle.is_none() {
            debug!(adapter_id = %self.id, ?event, "Event without a player ignored");
            return;
        }

        match event {
            PlayerEvent::Ready => self.on_ready(&mut core),
            PlayerEvent::StateChange(code) => match ExternalState::from_code(code) {
                Some(state) => self.on_state_change(&mut core, state),
                None => warn!(adapter_id = %self.id, code, "Unknown player state"),
            },
            PlayerEvent::Error(code) => self.on_error(&mut core, code),
        }
    }

    fn on_ready(self: &Arc<Self>, core: &mut Core) {
        let Some(handle) = core.handle.as_mut() else {
            return;
        };

        let snap = self.current();
        let mut next = if snap.phase == PlayerPhase::Initializing {
            snap.with_phase(PlayerPhase::Ready)
        } else {
            snap.clone()
        };
        next.is_ready = true;
        next.duration = handle.duration();

        let data = handle.video_data();
        self.metadata.set_title(data.title);
        self.metadata.set_author(data.author);

        if let Some(video_id) = core.pending.take() {
            info!(adapter_id = %self.id, video_id = %video_id, "Loading video requested before ready");
            handle.load_video_by_id(&video_id);
            next = next.with_phase(PlayerPhase::Playing);
            next.video_id = Some(video_id);
            next.current_time = 0.0;
        }

        info!(adapter_id = %self.id, duration = next.duration, "Player ready");
        self.commit(core, next);
    }

    fn on_state_change(self: &Arc<Self>, core: &mut Core, state: ExternalState) {
        let snap = self.current();
        let phase = match state {
            ExternalState::Playing => PlayerPhase::Playing,
            ExternalState::Paused => PlayerPhase::Paused,
            ExternalState::Buffering => PlayerPhase::Buffering,
            ExternalState::Ended => PlayerPhase::Ended,
            ExternalState::Unstarted | ExternalState::Cued => PlayerPhase::Ready,
        };

        let mut next = match self.transition(&snap, phase) {
            Ok(next) => next,
            Err(err) => {
                warn!(adapter_id = %self.id, code = state.code(), error = %err, "State change ignored");
                return;
            }
        };

        let Some(handle) = core.handle.as_mut() else {
            return;
        };

        // Duration is often unknown until the video starts buffering
        if matches!(state, ExternalState::Playing | ExternalState::Cued) {
            next.duration = handle.duration();
        }

        match state {
            ExternalState::Playing => {
                if let Some(id) = next.video_id.clone() {
                    core.last_good = Some(Track {
                        id,
                        url: core.video_url.clone(),
                    });
                }
                core.recovering = false;
            }
            ExternalState::Ended => {
                next.current_time = 0.0;
                if self.context.repeat() {
                    info!(adapter_id = %self.id, "Video ended, repeating");
                    handle.seek_to(0.0, true);
                    handle.play_video();
                    next = next.with_phase(PlayerPhase::Playing);
                } else {
                    info!(adapter_id = %self.id, "Video ended");
                    next = next.with_phase(PlayerPhase::Paused);
                }
            }
            _ => {}
        }

        self.commit(core, next);
    }

    fn on_error(self: &Arc<Self>, core: &mut Core, code: i32) {
        let snap = self.current();
        let category = ErrorCategory::from_code(code);
        warn!(
            adapter_id = %self.id,
            error = %Error::playback(code),
            category = %category,
            video_id = ?snap.video_id,
            "Player reported an error"
        );
        self.notifier.emit(Notification::playback_error(code));

        let failing = snap.video_id.as_ref();
        let fallback = core
            .last_good
            .clone()
            .filter(|track| Some(&track.id) != failing)
            .or_else(|| {
                let url = self.config.default_url.clone();
                youtube::extract_video_id(&url)
                    .filter(|id| Some(id) != failing)
                    .map(|id| Track { id, url })
            });

        match fallback {
            Some(track) if !core.recovering => {
                info!(adapter_id = %self.id, video_id = %track.id, "Falling back after playback error");
                core.recovering = true;
                self.start_video(core, track.id, track.url);
            }
            _ => {
                warn!(adapter_id = %self.id, "No fallback left, stopping playback");
                core.recovering = false;
                let next = if snap.phase.is_active() {
                    snap.with_phase(PlayerPhase::Paused)
                } else {
                    PlaybackSnapshot {
                        is_playing: false,
                        is_buffering: false,
                        ..snap
                    }
                };
                self.commit(core, next);
            }
        }
    }

    // ------------------------------------------------------------------
    // Controls
    // ------------------------------------------------------------------

    #[instrument(skip(self), fields(adapter_id = %self.id))]
    fn load_video(self: &Arc<Self>, url: &str) -> Result<VideoId> {
        let Some(video_id) = youtube::extract_video_id(url) else {
            warn!("Rejected invalid URL");
            self.notifier.emit(Notification::InvalidUrl);
            return Err(Error::InvalidUrl(url.to_string()));
        };

        let mut core = self.lock();
        if self.current().phase == PlayerPhase::Destroyed {
            return Err(Error::Destroyed);
        }

        info!(video_id = %video_id, "Loading video");
        core.recovering = false;
        self.start_video(&mut core, video_id.clone(), url.to_string());
        self.context.set_repeat(false);

        Ok(video_id)
    }

    /// Point the player at `video_id`, or remember it until the player is ready
    fn start_video(self: &Arc<Self>, core: &mut Core, video_id: VideoId, url: String) {
        let snap = self.current();
        core.video_url = url;

        let mut next = PlaybackSnapshot {
            video_id: Some(video_id.clone()),
            ..snap.clone()
        };

        match core.handle.as_mut() {
            Some(handle) if snap.is_ready => {
                handle.load_video_by_id(&video_id);
                next = next.with_phase(PlayerPhase::Playing);
                next.current_time = 0.0;
                core.pending = None;
            }
            // Created but not ready: applied by the ready event
            Some(_) => core.pending = Some(video_id),
            // Not created yet: cued at construction
            None => {}
        }

        self.commit(core, next);
    }

    /// Run a command against a ready handle; false if there is none
    fn control<F>(self: &Arc<Self>, name: &'static str, command: F) -> bool
    where
        F: FnOnce(&mut dyn PlayerHandle, &PlaybackSnapshot) -> PlaybackSnapshot,
    {
        let mut core = self.lock();
        let snap = self.current();

        let handle = match core.handle.as_mut() {
            Some(handle) if snap.is_ready => handle,
            _ => {
                debug!(
                    adapter_id = %self.id,
                    control = name,
                    reason = %Error::PlayerUnavailable,
                    "Control ignored"
                );
                return false;
            }
        };

        let next = command(&mut **handle, &snap);
        debug!(adapter_id = %self.id, control = name, "Control applied");
        self.commit(&mut core, next);
        true
    }

    // ------------------------------------------------------------------
    // Polling
    // ------------------------------------------------------------------

    /// Poller runs exactly while the snapshot says playing
    fn sync_poller(self: &Arc<Self>, core: &mut Core) {
        let should_poll = self.snapshot_tx.borrow().is_playing && core.handle.is_some();
        let polling = core
            .tasks
            .poller
            .as_ref()
            .is_some_and(|task| !task.is_finished());

        if should_poll && !polling {
            let period = self.config.poll_interval();
            core.tasks.poller = self.spawn(poll_position(Arc::downgrade(self), period));
            debug!(adapter_id = %self.id, period_ms = period.as_millis() as u64, "Polling started");
        } else if !should_poll {
            if let Some(task) = core.tasks.poller.take() {
                task.abort();
                debug!(adapter_id = %self.id, "Polling stopped");
            }
        }
    }

    /// One poll tick. Returns false when polling should stop.
    fn poll_tick(&self) -> bool {
        let core = self.lock();
        let snap = self.current();

        let Some(handle) = core.handle.as_ref() else {
            return false;
        };
        if !snap.is_playing {
            return false;
        }

        let current_time = handle.current_time();
        let data = handle.video_data();
        debug!(adapter_id = %self.id, current_time, "Position polled");

        self.snapshot_tx.send_replace(PlaybackSnapshot {
            current_time,
            ..snap
        });

        if !data.title.is_empty() && self.metadata.set(data) {
            debug!(adapter_id = %self.id, "Video metadata refreshed");
        }

        true
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    fn teardown(&self) {
        let mut core = self.lock();
        let snap = self.current();

        if snap.phase == PlayerPhase::Destroyed {
            return;
        }

        core.tasks.abort_all();
        core.pending = None;

        if let Some(mut handle) = core.handle.take() {
            handle.destroy();
            info!(adapter_id = %self.id, "Player destroyed");
        }

        info!(adapter_id = %self.id, from = %snap.phase, to = %PlayerPhase::Destroyed, "Phase transition");
        self.snapshot_tx.send_replace(PlaybackSnapshot {
            is_ready: false,
            is_playing: false,
            is_buffering: false,
            phase: PlayerPhase::Destroyed,
            ..snap
        });
    }
}

async fn pump_events(shared: Weak<Shared>, mut events: mpsc::UnboundedReceiver<PlayerEvent>) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.dispatch(event);
    }
}

async fn poll_position(shared: Weak<Shared>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.poll_tick() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{PlayerCall, SimulatedApi};

    fn adapter_with(api: &SimulatedApi) -> PlayerAdapter {
        PlayerAdapter::new(
            AdapterConfig::default(),
            Arc::new(api.clone()),
            Arc::new(PlayerContext::new()),
            Arc::new(VideoMetadataStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AdapterConfig {
            poll_interval_ms: 0,
            ..AdapterConfig::default()
        };
        let result = PlayerAdapter::new(
            config,
            Arc::new(SimulatedApi::loaded()),
            Arc::new(PlayerContext::new()),
            Arc::new(VideoMetadataStore::new()),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_activate_without_runtime_can_retry() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);

        adapter.activate();
        assert_eq!(api.players_created(), 0);
        assert_eq!(adapter.phase(), PlayerPhase::Uninitialized);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            adapter.activate();
            assert_eq!(api.players_created(), 1);

            api.last_player().unwrap().emit(PlayerEvent::Ready);
            let mut snapshots = adapter.subscribe();
            assert!(snapshots.wait_for(|s| s.is_ready).await.is_ok());
            adapter.teardown();
        });
    }

    #[tokio::test]
    async fn test_adapter_creation() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);

        let snap = adapter.snapshot();
        assert_eq!(snap.phase, PlayerPhase::Uninitialized);
        assert_eq!(snap.volume, 100);
        assert_eq!(snap.video_id.as_ref().map(|v| v.as_str()), Some("jfKfPfyJRdk"));
        assert_eq!(api.players_created(), 0);
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);

        adapter.activate();
        adapter.activate();
        adapter.activate();

        assert_eq!(api.players_created(), 1);
        assert_eq!(adapter.phase(), PlayerPhase::Initializing);

        let player = api.last_player().unwrap();
        assert_eq!(player.mount_point(), "youtube-player");
        assert_eq!(player.options().controls, 0);
        assert_eq!(
            player.options().video_id.map(|v| v.to_string()).as_deref(),
            Some("jfKfPfyJRdk")
        );
    }

    #[tokio::test]
    async fn test_controls_ignored_before_ready() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);
        adapter.activate();

        let before = adapter.snapshot();
        assert!(!adapter.play());
        assert!(!adapter.skip(10.0));
        assert!(!adapter.set_volume(20));
        assert_eq!(adapter.snapshot(), before);
        assert!(api.last_player().unwrap().commands().is_empty());
    }

    #[tokio::test]
    async fn test_ready_publishes_duration_and_metadata() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);
        adapter.activate();

        let player = api.last_player().unwrap();
        player.set_duration(212.0);
        player.set_video_data("Never Gonna Give You Up", "Rick Astley");

        adapter.dispatch(PlayerEvent::Ready);

        let snap = adapter.snapshot();
        assert!(snap.is_ready);
        assert_eq!(snap.phase, PlayerPhase::Ready);
        assert_eq!(snap.duration, 212.0);
        assert_eq!(adapter.metadata().title(), "Never Gonna Give You Up");
        assert_eq!(adapter.metadata().author(), "Rick Astley");
    }

    #[tokio::test]
    async fn test_unknown_state_code_ignored() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);
        adapter.activate();
        adapter.dispatch(PlayerEvent::Ready);

        let before = adapter.snapshot();
        adapter.dispatch(PlayerEvent::StateChange(42));
        assert_eq!(adapter.snapshot(), before);
    }

    #[tokio::test]
    async fn test_state_change_before_ready_rejected() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);
        adapter.activate();

        adapter.dispatch(PlayerEvent::StateChange(3));
        let snap = adapter.snapshot();
        assert_eq!(snap.phase, PlayerPhase::Initializing);
        assert!(!snap.is_buffering);
    }

    #[tokio::test]
    async fn test_toggle_play() {
        let api = SimulatedApi::loaded();
        let adapter = adapter_with(&api);
        adapter.activate();
        adapter.dispatch(PlayerEvent::Ready);

        assert!(adapter.toggle_play());
        assert!(adapter.snapshot().is_playing);
        assert!(adapter.toggle_play());
        assert!(!adapter.snapshot().is_playing);

        let player = api.last_player().unwrap();
        assert_eq!(player.commands(), vec![PlayerCall::Play, PlayerCall::Pause]);
    }
}
