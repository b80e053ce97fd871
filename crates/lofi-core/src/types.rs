//! Core types for Lofi

use crate::{youtube, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Unique identifier for a player adapter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdapterId(pub Uuid);

impl AdapterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AdapterId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Length of every YouTube video identifier
    pub const LEN: usize = 11;

    /// Wrap a raw identifier, rejecting anything that could not come out of a URL
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let well_formed = raw.chars().count() == Self::LEN
            && !raw.chars().any(|c| matches!(c, '#' | '&' | '?'));
        well_formed.then_some(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VideoId {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        match VideoId::new(raw.as_str()) {
            Some(id) => Ok(id),
            None => Err(Error::InvalidConfig(format!("'{}' is not a video id", raw))),
        }
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Adapter state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerPhase {
    /// No player requested yet
    Uninitialized,
    /// Waiting for the player API and the player's ready event
    Initializing,
    /// Player ready, nothing playing
    Ready,
    /// Content is playing
    Playing,
    /// Playback paused
    Paused,
    /// Player is buffering
    Buffering,
    /// Playback reached the end of the video
    Ended,
    /// Player handle released
    Destroyed,
}

impl PlayerPhase {
    /// Check if transition to target phase is valid
    pub fn can_transition_to(&self, target: PlayerPhase) -> bool {
        use PlayerPhase::*;
        matches!(
            (self, target),
            // Bootstrap
            (Uninitialized, Initializing) |
            (Initializing, Ready) | (Initializing, Uninitialized) |
            // Playback
            (Ready | Playing | Paused | Buffering | Ended, Ready | Playing | Paused | Buffering | Ended) |
            // Teardown
            (Uninitialized | Initializing | Ready | Playing | Paused | Buffering | Ended, Destroyed)
        )
    }

    /// Whether a ready handle exists in this phase
    pub fn is_active(&self) -> bool {
        use PlayerPhase::*;
        matches!(self, Ready | Playing | Paused | Buffering | Ended)
    }
}

impl std::fmt::Display for PlayerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerPhase::Uninitialized => write!(f, "uninitialized"),
            PlayerPhase::Initializing => write!(f, "initializing"),
            PlayerPhase::Ready => write!(f, "ready"),
            PlayerPhase::Playing => write!(f, "playing"),
            PlayerPhase::Paused => write!(f, "paused"),
            PlayerPhase::Buffering => write!(f, "buffering"),
            PlayerPhase::Ended => write!(f, "ended"),
            PlayerPhase::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Numeric player states reported by the embedded YouTube player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl ExternalState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(ExternalState::Unstarted),
            0 => Some(ExternalState::Ended),
            1 => Some(ExternalState::Playing),
            2 => Some(ExternalState::Paused),
            3 => Some(ExternalState::Buffering),
            5 => Some(ExternalState::Cued),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ExternalState::Unstarted => -1,
            ExternalState::Ended => 0,
            ExternalState::Playing => 1,
            ExternalState::Paused => 2,
            ExternalState::Buffering => 3,
            ExternalState::Cued => 5,
        }
    }
}

/// Title and author of the current video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub author: String,
}

impl VideoMetadata {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

/// The adapter's view of playback, replaced wholesale on every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub video_id: Option<VideoId>,
    pub is_ready: bool,
    pub is_playing: bool,
    pub is_buffering: bool,
    /// Seconds
    pub current_time: f64,
    /// Seconds, 0 until the player knows
    pub duration: f64,
    pub is_muted: bool,
    /// 0-100
    pub volume: u8,
    pub phase: PlayerPhase,
}

impl PlaybackSnapshot {
    /// Initial snapshot for a player that will start on `video_id`
    pub fn initial(video_id: Option<VideoId>) -> Self {
        Self {
            video_id,
            ..Self::default()
        }
    }

    /// Copy of this snapshot moved to `phase`, with the play flags derived from it
    pub fn with_phase(&self, phase: PlayerPhase) -> Self {
        Self {
            phase,
            is_playing: phase == PlayerPhase::Playing,
            is_buffering: phase == PlayerPhase::Buffering,
            ..self.clone()
        }
    }

    /// The equalizer animates only while audio is actually coming out
    pub fn shows_equalizer(&self) -> bool {
        self.is_playing && !self.is_buffering
    }

    pub fn thumbnail_url(&self) -> Option<String> {
        self.video_id.as_ref().map(youtube::thumbnail_url)
    }

    pub fn elapsed_label(&self) -> String {
        youtube::format_time(self.current_time)
    }

    pub fn duration_label(&self) -> String {
        youtube::format_time(self.duration)
    }
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            video_id: None,
            is_ready: false,
            is_playing: false,
            is_buffering: false,
            current_time: 0.0,
            duration: 0.0,
            is_muted: false,
            volume: 100,
            phase: PlayerPhase::Uninitialized,
        }
    }
}

/// Options handed to the external player at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedOptions {
    /// Video to cue; filled in by the adapter
    pub video_id: Option<VideoId>,
    pub width: u32,
    pub height: u32,
    pub autoplay: u8,
    /// Native controls; the widget drives everything itself
    pub controls: u8,
    pub keyboard_disabled: u8,
    pub fullscreen_disabled: u8,
    pub related_videos: u8,
    pub modest_branding: u8,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            video_id: None,
            width: 1,
            height: 1,
            autoplay: 0,
            controls: 0,
            keyboard_disabled: 1,
            fullscreen_disabled: 0,
            related_videos: 0,
            modest_branding: 1,
        }
    }
}

/// Adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Element id the player mounts into
    pub mount_point: String,
    /// URL cued when the player is first created
    pub initial_url: Option<String>,
    /// URL for "play default" and the error fallback
    pub default_url: String,
    /// Position polling period while playing (milliseconds)
    pub poll_interval_ms: u64,
    /// Player construction options
    pub embed: EmbedOptions,
}

impl AdapterConfig {
    /// Lofi hip hop radio
    pub const DEFAULT_URL: &'static str = "https://www.youtube.com/watch?v=jfKfPfyJRdk";

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mount_point.trim().is_empty() {
            return Err(Error::InvalidConfig("mount_point must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig("poll_interval_ms must be positive".into()));
        }
        if !youtube::is_valid_url(&self.default_url) {
            return Err(Error::InvalidConfig(format!(
                "default_url is not a YouTube video URL: {}",
                self.default_url
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mount_point: "youtube-player".to_string(),
            initial_url: Some(Self::DEFAULT_URL.to_string()),
            default_url: Self::DEFAULT_URL.to_string(),
            poll_interval_ms: 1000,
            embed: EmbedOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_rejects_wrong_shapes() {
        assert!(VideoId::new("dQw4w9WgXcQ").is_some());
        assert!(VideoId::new("short").is_none());
        assert!(VideoId::new("dQw4w9WgXc?").is_none());
        // Only the length and URL delimiters matter
        assert!(VideoId::new("dQw4w9 gXcQ").is_some());
    }

    #[test]
    fn test_video_id_deserialize_validates() {
        let id: VideoId = serde_json::from_str(r#""jfKfPfyJRdk""#).unwrap();
        assert_eq!(id.as_str(), "jfKfPfyJRdk");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""jfKfPfyJRdk""#);

        assert!(serde_json::from_str::<VideoId>(r#""x""#).is_err());
        assert!(AdapterConfig::from_json(r#"{ "embed": { "video_id": "x" } }"#).is_err());
    }

    #[test]
    fn test_phase_transitions() {
        use PlayerPhase::*;
        assert!(Uninitialized.can_transition_to(Initializing));
        assert!(Initializing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Playing));
        assert!(Ended.can_transition_to(Playing));
        assert!(Ended.can_transition_to(Paused));
        assert!(Playing.can_transition_to(Destroyed));

        assert!(!Uninitialized.can_transition_to(Playing));
        assert!(!Initializing.can_transition_to(Buffering));
        assert!(!Destroyed.can_transition_to(Ready));
        assert!(!Playing.can_transition_to(Initializing));
    }

    #[test]
    fn test_with_phase_never_plays_and_buffers() {
        let snap = PlaybackSnapshot::default();
        for phase in [PlayerPhase::Playing, PlayerPhase::Buffering, PlayerPhase::Paused] {
            let next = snap.with_phase(phase);
            assert!(!(next.is_playing && next.is_buffering));
        }
        assert!(snap.with_phase(PlayerPhase::Playing).shows_equalizer());
        assert!(!snap.with_phase(PlayerPhase::Buffering).shows_equalizer());
    }

    #[test]
    fn test_external_state_codes() {
        for code in [-1, 0, 1, 2, 3, 5] {
            assert_eq!(ExternalState::from_code(code).map(|s| s.code()), Some(code));
        }
        assert_eq!(ExternalState::from_code(4), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.embed.controls, 0);
        assert_eq!(config.embed.keyboard_disabled, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config = AdapterConfig::from_json(r#"{ "poll_interval_ms": 250 }"#).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.mount_point, "youtube-player");

        assert!(AdapterConfig::from_json(r#"{ "poll_interval_ms": 0 }"#).is_err());
        assert!(AdapterConfig::from_json(r#"{ "default_url": "https://example.com" }"#).is_err());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(PlaybackSnapshot::default()).unwrap();
        assert_eq!(json["isPlaying"], false);
        assert_eq!(json["volume"], 100);
        assert_eq!(json["phase"], "uninitialized");
    }
}
