//! User-facing notifications
//!
//! Short messages the widget shows as toasts:
//! - Empty or invalid URL submitted
//! - Video loaded
//! - Playback errors reported by the embedded player
//!
//! Emission is fire-and-forget and never touches adapter state.

use crate::types::AdapterId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Category of an error reported by the embedded player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Removed, private, or never existed (code 100)
    VideoUnavailable,
    /// Owner disallows embedded playback (codes 101, 150)
    EmbeddingBlocked,
    /// Anything else
    Playback,
}

impl ErrorCategory {
    pub fn from_code(code: i32) -> Self {
        match code {
            100 => ErrorCategory::VideoUnavailable,
            101 | 150 => ErrorCategory::EmbeddingBlocked,
            _ => ErrorCategory::Playback,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::VideoUnavailable => write!(f, "video unavailable"),
            ErrorCategory::EmbeddingBlocked => write!(f, "embedding blocked"),
            ErrorCategory::Playback => write!(f, "playback error"),
        }
    }
}

/// Notification kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    EmptyUrl,
    InvalidUrl,
    VideoLoaded,
    PlaybackError { code: i32, category: ErrorCategory },
}

impl Notification {
    pub fn playback_error(code: i32) -> Self {
        Notification::PlaybackError {
            code,
            category: ErrorCategory::from_code(code),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Notification::VideoLoaded)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notification::EmptyUrl => "Empty URL",
            Notification::InvalidUrl => "Invalid YouTube URL",
            Notification::VideoLoaded => "Video loaded",
            Notification::PlaybackError { category, .. } => match category {
                ErrorCategory::VideoUnavailable => "Video unavailable",
                ErrorCategory::EmbeddingBlocked => "Video can't be embedded",
                ErrorCategory::Playback => "Error playing video",
            },
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Notification::EmptyUrl => "Please enter a YouTube URL.",
            Notification::InvalidUrl => "Please enter a valid YouTube video URL.",
            Notification::VideoLoaded => "Your music is now playing.",
            Notification::PlaybackError { category, .. } => match category {
                ErrorCategory::VideoUnavailable => {
                    "The requested video was not found or has been removed."
                }
                ErrorCategory::EmbeddingBlocked => {
                    "The owner of this video does not allow playback in embedded players."
                }
                ErrorCategory::Playback => "There was an issue with the YouTube video.",
            },
        }
    }
}

/// Notification with delivery metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub adapter_id: AdapterId,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
    #[serde(flatten)]
    pub notification: Notification,
}

/// Fire-and-forget notification sender
#[derive(Debug)]
pub struct Notifier {
    adapter_id: AdapterId,
    sequence: AtomicU64,
    tx: Option<mpsc::UnboundedSender<NotificationRecord>>,
}

impl Notifier {
    /// Notifier that only logs
    pub fn silent(adapter_id: AdapterId) -> Self {
        Self {
            adapter_id,
            sequence: AtomicU64::new(0),
            tx: None,
        }
    }

    /// Notifier delivering records to the returned receiver
    pub fn channel(adapter_id: AdapterId) -> (Self, mpsc::UnboundedReceiver<NotificationRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Self {
            adapter_id,
            sequence: AtomicU64::new(0),
            tx: Some(tx),
        };
        (notifier, rx)
    }

    pub fn emit(&self, notification: Notification) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        if notification.is_error() {
            warn!(
                adapter_id = %self.adapter_id,
                title = notification.title(),
                description = notification.description(),
                "Notification"
            );
        } else {
            info!(
                adapter_id = %self.adapter_id,
                title = notification.title(),
                "Notification"
            );
        }

        let Some(tx) = &self.tx else {
            return;
        };

        let record = NotificationRecord {
            id: Uuid::new_v4(),
            adapter_id: self.adapter_id,
            timestamp: Utc::now(),
            sequence,
            notification,
        };

        // Nobody listening is fine
        let _ = tx.send(record);
    }

    pub fn emitted(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(ErrorCategory::from_code(100), ErrorCategory::VideoUnavailable);
        assert_eq!(ErrorCategory::from_code(101), ErrorCategory::EmbeddingBlocked);
        assert_eq!(ErrorCategory::from_code(150), ErrorCategory::EmbeddingBlocked);
        assert_eq!(ErrorCategory::from_code(2), ErrorCategory::Playback);
        assert_eq!(ErrorCategory::from_code(5), ErrorCategory::Playback);
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (notifier, mut rx) = Notifier::channel(AdapterId::new());
        notifier.emit(Notification::InvalidUrl);
        notifier.emit(Notification::VideoLoaded);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.notification, Notification::InvalidUrl);
        assert_eq!(second.sequence, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_without_receiver_is_harmless() {
        let (notifier, rx) = Notifier::channel(AdapterId::new());
        drop(rx);
        notifier.emit(Notification::EmptyUrl);

        let silent = Notifier::silent(AdapterId::new());
        silent.emit(Notification::playback_error(100));
        assert_eq!(silent.emitted(), 1);
    }

    #[test]
    fn test_record_json_shape() {
        let (notifier, mut rx) = Notifier::channel(AdapterId::new());
        notifier.emit(Notification::playback_error(150));
        let json = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(json["kind"], "playback_error");
        assert_eq!(json["category"], "embedding_blocked");
        assert_eq!(json["code"], 150);
    }
}
