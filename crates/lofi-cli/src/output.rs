//! Output formatting for CLI

use lofi_core::{Notification, PlaybackSnapshot, VideoMetadata};
use serde::Serialize;
use std::fmt;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Format output based on selected format
pub fn format_output<T: Serialize + fmt::Display>(data: &T, format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Text => data.to_string(),
    }
}

/// Result of `lofi parse`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub url: String,
    pub valid: bool,
    pub video_id: Option<String>,
    pub thumbnail: Option<String>,
}

impl fmt::Display for ParseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "URL: {}", self.url)?;
        match (&self.video_id, &self.thumbnail) {
            (Some(id), Some(thumbnail)) => {
                writeln!(f, "  Video ID: {}", id)?;
                write!(f, "  Thumbnail: {}", thumbnail)
            }
            _ => write!(f, "  Not a YouTube video URL"),
        }
    }
}

/// Result of `lofi time`
#[derive(Debug, Serialize)]
pub struct TimeReport {
    pub seconds: f64,
    pub formatted: String,
}

impl fmt::Display for TimeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted)
    }
}

/// One line of a play session
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionLine {
    Status {
        second: u64,
        snapshot: PlaybackSnapshot,
        metadata: VideoMetadata,
    },
    Notification(Notification),
}

impl fmt::Display for SessionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionLine::Status {
                second,
                snapshot,
                metadata,
            } => {
                let marker = if snapshot.shows_equalizer() {
                    "♪"
                } else if snapshot.is_buffering {
                    "…"
                } else {
                    " "
                };
                write!(
                    f,
                    "[{:>3}s] {} {:<13} {} / {}",
                    second,
                    marker,
                    snapshot.phase.to_string(),
                    snapshot.elapsed_label(),
                    snapshot.duration_label(),
                )?;
                if !metadata.title.is_empty() {
                    write!(f, "  {} - {}", metadata.title, metadata.author)?;
                }
                Ok(())
            }
            SessionLine::Notification(notification) => write!(
                f,
                "  ! {}: {}",
                notification.title(),
                notification.description()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Text);
    }

    #[test]
    fn test_time_report_output() {
        let report = TimeReport {
            seconds: 65.0,
            formatted: "1:05".into(),
        };
        assert_eq!(format_output(&report, "text"), "1:05");
        assert_eq!(
            format_output(&report, "json"),
            r#"{"seconds":65.0,"formatted":"1:05"}"#
        );
    }

    #[test]
    fn test_notification_line() {
        let line = SessionLine::Notification(Notification::InvalidUrl);
        let json: serde_json::Value =
            serde_json::from_str(&format_output(&line, "json")).unwrap();
        assert_eq!(json["type"], "notification");
    }
}
