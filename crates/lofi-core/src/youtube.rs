//! YouTube URL helpers
//!
//! Pure functions used by the adapter and the display layer: pulling the
//! video id out of the URL shapes people paste, building thumbnail URLs and
//! rendering playback times.

use crate::types::VideoId;
use once_cell::sync::Lazy;
use regex::Regex;

/// Any known marker followed by the id. The leading `.*` is greedy, so the
/// last marker in the string wins.
static VIDEO_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*(youtu.be/|v/|u/[A-Za-z0-9_]/|embed/|watch\?v=|&v=)([^#&?]*).*")
        .expect("video id pattern compiles")
});

/// Second chance for short links whose last marker yielded a bad id
static SHORT_LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*(youtu.be/)([^#&?]*).*").expect("short link pattern compiles"));

const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

/// Extract the 11-character video id from a YouTube URL
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    if url.is_empty() {
        return None;
    }

    capture_id(&VIDEO_ID_PATTERN, url).or_else(|| capture_id(&SHORT_LINK_PATTERN, url))
}

fn capture_id(pattern: &Regex, url: &str) -> Option<VideoId> {
    let captures = pattern.captures(url)?;
    VideoId::new(captures.get(2)?.as_str())
}

/// True when `url` contains a usable video id
pub fn is_valid_url(url: &str) -> bool {
    extract_video_id(url).is_some()
}

/// Medium-quality thumbnail for a video. No request is made.
pub fn thumbnail_url(video_id: &VideoId) -> String {
    format!("{}/{}/mqdefault.jpg", THUMBNAIL_BASE, video_id)
}

/// Render seconds as `M:SS`, flooring partial seconds
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
