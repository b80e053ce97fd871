//! Settings shared between the widget and its player adapter
//!
//! Each adapter normally gets its own context. Handing the same
//! `Arc<PlayerContext>` to several adapters makes the repeat flag shared
//! between all of them.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Per-widget playback settings
#[derive(Debug, Default)]
pub struct PlayerContext {
    repeat: AtomicBool,
}

impl PlayerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repeat(repeat: bool) -> Self {
        Self {
            repeat: AtomicBool::new(repeat),
        }
    }

    /// Whether an ended video restarts
    pub fn repeat(&self) -> bool {
        self.repeat.load(Ordering::SeqCst)
    }

    pub fn set_repeat(&self, repeat: bool) {
        debug!(repeat, "Repeat toggled");
        self.repeat.store(repeat, Ordering::SeqCst);
    }
}
