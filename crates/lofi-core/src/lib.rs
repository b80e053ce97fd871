//! Lofi Core - Background Music Player Library
//!
//! This crate provides the logic behind the Lofi widget:
//! - YouTube URL parsing, thumbnails and time formatting
//! - A video metadata store shared with display code
//! - The player adapter: bootstrap, event handling, controls, polling
//! - User-facing notifications
//!
//! The embedded player itself is a collaborator reached through the
//! [`PlayerApi`] and [`PlayerHandle`] traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Lofi Core                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   YouTube    │  │   Player     │  │   Notifier   │           │
//! │  │   URL utils  │  │   Context    │  │              │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Player    │──── snapshot (watch)         │
//! │                    │   Adapter   │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │   Metadata   │  │    Event    │  │  PlayerApi / │            │
//! │  │    Store     │  │    Queue    │  │ PlayerHandle │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod youtube;
pub mod metadata;
pub mod notify;
pub mod backend;
pub mod context;
pub mod adapter;
pub mod simulated;

pub use error::{Error, Result};
pub use types::*;
pub use youtube::{extract_video_id, format_time, is_valid_url, thumbnail_url};
pub use metadata::VideoMetadataStore;
pub use notify::{ErrorCategory, Notification, NotificationRecord, Notifier};
pub use backend::{EventSink, PlayerApi, PlayerEvent, PlayerHandle};
pub use context::PlayerContext;
pub use adapter::PlayerAdapter;
pub use simulated::{PlayerCall, SimulatedApi, SimulatedPlayer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library startup
pub fn init() {
    tracing::info!(version = VERSION, "Lofi Core initialized");
}
