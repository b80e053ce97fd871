//! Video metadata store
//!
//! Holds the current video's title and author. The adapter writes it when the
//! player reports ready and whenever polling sees new data; display code reads
//! or subscribes.

use crate::types::VideoMetadata;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

static GLOBAL: Lazy<Arc<VideoMetadataStore>> = Lazy::new(|| Arc::new(VideoMetadataStore::new()));

/// Title/author store with change notification
#[derive(Debug)]
pub struct VideoMetadataStore {
    tx: watch::Sender<VideoMetadata>,
}

impl VideoMetadataStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(VideoMetadata::default());
        Self { tx }
    }

    /// Process-wide store for hosts that render a single player
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        debug!(title = %title, "Video title updated");
        self.tx.send_modify(|meta| meta.title = title);
    }

    pub fn set_author(&self, author: impl Into<String>) {
        let author = author.into();
        debug!(author = %author, "Video author updated");
        self.tx.send_modify(|meta| meta.author = author);
    }

    /// Replace both fields, notifying subscribers only if something changed
    pub fn set(&self, metadata: VideoMetadata) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == metadata {
                return false;
            }
            *current = metadata;
            true
        })
    }

    pub fn title(&self) -> String {
        self.tx.borrow().title.clone()
    }

    pub fn author(&self) -> String {
        self.tx.borrow().author.clone()
    }

    pub fn current(&self) -> VideoMetadata {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VideoMetadata> {
        self.tx.subscribe()
    }
}

impl Default for VideoMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}
