//! Contract with the embedded player
//!
//! The adapter never plays media itself. It talks to two collaborators:
//! - [`PlayerApi`]: the capability that must be loaded before any player exists
//! - [`PlayerHandle`]: one embedded player instance
//!
//! Players report back by sending [`PlayerEvent`]s into the [`EventSink`]
//! they were constructed with.

use crate::{
    types::{EmbedOptions, VideoId, VideoMetadata},
    Result,
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Callbacks from the embedded player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Player finished constructing and accepts commands
    Ready,
    /// Numeric player state (see [`crate::ExternalState`])
    StateChange(i32),
    /// Numeric error code
    Error(i32),
}

/// Where a player delivers its events
pub type EventSink = mpsc::UnboundedSender<PlayerEvent>;

/// The player API that must be loaded into the host before players exist
#[async_trait]
pub trait PlayerApi: Send + Sync {
    /// Whether the API is already available
    fn is_loaded(&self) -> bool;

    /// Load the API, resolving once it signals readiness
    async fn load(&self) -> Result<()>;

    /// Construct a player bound to `mount_point`
    fn create_player(
        &self,
        mount_point: &str,
        options: &EmbedOptions,
        events: EventSink,
    ) -> Result<Box<dyn PlayerHandle>>;
}

/// One embedded player instance
pub trait PlayerHandle: Send {
    fn duration(&self) -> f64;

    fn current_time(&self) -> f64;

    fn video_data(&self) -> VideoMetadata;

    fn play_video(&mut self);

    fn pause_video(&mut self);

    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool);

    fn load_video_by_id(&mut self, video_id: &VideoId);

    fn mute(&mut self);

    fn unmute(&mut self);

    fn set_volume(&mut self, volume: u8);

    fn destroy(&mut self);
}
