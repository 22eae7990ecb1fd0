//! Stream data model — the records the scheduler versions and drives.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{CastDeckError, Result};

/// Target platform of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    YouTube,
    Facebook,
    Twitch,
    TikTok,
    Instagram,
    #[serde(rename = "Custom RTMP")]
    CustomRtmp,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::YouTube => write!(f, "YouTube"),
            Platform::Facebook => write!(f, "Facebook"),
            Platform::Twitch => write!(f, "Twitch"),
            Platform::TikTok => write!(f, "TikTok"),
            Platform::Instagram => write!(f, "Instagram"),
            Platform::CustomRtmp => write!(f, "Custom RTMP"),
        }
    }
}

/// Where the broadcast video comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoSourceKind {
    /// A file uploaded to the video library.
    Upload,
    /// An external share link.
    #[serde(rename = "Google Drive")]
    GoogleDrive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    pub kind: VideoSourceKind,
    /// File name for uploads, URL for external links.
    pub path: String,
}

impl VideoSource {
    pub fn upload(path: &str) -> Self {
        Self {
            kind: VideoSourceKind::Upload,
            path: path.to_string(),
        }
    }

    pub fn link(url: &str) -> Self {
        Self {
            kind: VideoSourceKind::GoogleDrive,
            path: url.to_string(),
        }
    }
}

/// A platform a stream is multicast to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    /// Platform + secret stream key typed in by the user.
    Manual {
        id: String,
        platform: Platform,
        stream_key: String,
    },
    /// Platform bound to an externally managed connected account.
    Integrated {
        id: String,
        platform: Platform,
        account_id: String,
        account_name: String,
    },
}

impl Destination {
    pub fn manual(id: &str, platform: Platform, stream_key: &str) -> Self {
        Self::Manual {
            id: id.to_string(),
            platform,
            stream_key: stream_key.to_string(),
        }
    }

    pub fn integrated(id: &str, account: &ConnectedAccount) -> Self {
        Self::Integrated {
            id: id.to_string(),
            platform: account.platform,
            account_id: account.id.clone(),
            account_name: account.name.clone(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Manual { id, .. } | Self::Integrated { id, .. } => id,
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Self::Manual { platform, .. } | Self::Integrated { platform, .. } => *platform,
        }
    }
}

/// An account on a streaming platform that the user has connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: String,
    pub platform: Platform,
    pub name: String,
}

impl ConnectedAccount {
    pub fn new(id: &str, platform: Platform, name: &str) -> Self {
        Self {
            id: id.to_string(),
            platform,
            name: name.to_string(),
        }
    }
}

/// Repetition mode of a schedule. Each variant carries exactly the fields it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "recurrence", rename_all = "snake_case")]
pub enum Recurrence {
    /// One-time broadcast at an absolute instant.
    Once { datetime: DateTime<Utc> },
    /// Every day at a time of day.
    Daily { time: NaiveTime },
    /// On the listed weekdays at a time of day.
    Weekly { time: NaiveTime, days: Vec<Weekday> },
}

/// Automatic Live → Ended after a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoStop {
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(flatten)]
    pub recurrence: Recurrence,
    /// `Some` when auto-stop is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_stop: Option<AutoStop>,
}

impl Schedule {
    pub fn once(datetime: DateTime<Utc>) -> Self {
        Self {
            recurrence: Recurrence::Once { datetime },
            auto_stop: None,
        }
    }

    pub fn daily(time: NaiveTime) -> Self {
        Self {
            recurrence: Recurrence::Daily { time },
            auto_stop: None,
        }
    }

    pub fn weekly(time: NaiveTime, days: Vec<Weekday>) -> Self {
        Self {
            recurrence: Recurrence::Weekly { time, days },
            auto_stop: None,
        }
    }

    pub fn with_auto_stop(mut self, duration_minutes: u32) -> Self {
        self.auto_stop = Some(AutoStop { duration_minutes });
        self
    }

    /// Absolute start instant; only one-time schedules have one.
    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        match &self.recurrence {
            Recurrence::Once { datetime } => Some(*datetime),
            _ => None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self.recurrence, Recurrence::Once { .. })
    }

    /// Configured broadcast length, if auto-stop is enabled.
    pub fn auto_stop_duration(&self) -> Option<chrono::Duration> {
        self.auto_stop
            .map(|a| chrono::Duration::minutes(a.duration_minutes as i64))
    }

    pub fn validate(&self) -> Result<()> {
        if let Recurrence::Weekly { days, .. } = &self.recurrence {
            if days.is_empty() {
                return Err(CastDeckError::InvalidStream(
                    "weekly schedule needs at least one weekday".into(),
                ));
            }
            let mut seen = Vec::with_capacity(days.len());
            for day in days {
                if seen.contains(day) {
                    return Err(CastDeckError::InvalidStream(format!(
                        "weekday {day} listed twice"
                    )));
                }
                seen.push(*day);
            }
        }
        if let Some(AutoStop { duration_minutes: 0 }) = self.auto_stop {
            return Err(CastDeckError::InvalidStream(
                "auto-stop duration must be at least one minute".into(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle status of a stream. `Ended` and `Error` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamStatus {
    #[default]
    Scheduled,
    Live,
    Ended,
    Error,
}

impl StreamStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamStatus::Ended | StreamStatus::Error)
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamStatus::Scheduled => write!(f, "scheduled"),
            StreamStatus::Live => write!(f, "live"),
            StreamStatus::Ended => write!(f, "ended"),
            StreamStatus::Error => write!(f, "error"),
        }
    }
}

/// Output bitrate in kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Bitrate {
    Kbps2500,
    Kbps4000,
    Kbps6000,
}

impl From<Bitrate> for u32 {
    fn from(b: Bitrate) -> u32 {
        match b {
            Bitrate::Kbps2500 => 2500,
            Bitrate::Kbps4000 => 4000,
            Bitrate::Kbps6000 => 6000,
        }
    }
}

impl TryFrom<u32> for Bitrate {
    type Error = String;

    fn try_from(kbps: u32) -> std::result::Result<Self, String> {
        match kbps {
            2500 => Ok(Bitrate::Kbps2500),
            4000 => Ok(Bitrate::Kbps4000),
            6000 => Ok(Bitrate::Kbps6000),
            other => Err(format!("unsupported bitrate {other} kbps")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "1440p")]
    Qhd1440,
    #[serde(rename = "2160p")]
    Uhd2160,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FrameRate {
    Fps30,
    Fps60,
}

impl From<FrameRate> for u32 {
    fn from(f: FrameRate) -> u32 {
        match f {
            FrameRate::Fps30 => 30,
            FrameRate::Fps60 => 60,
        }
    }
}

impl TryFrom<u32> for FrameRate {
    type Error = String;

    fn try_from(fps: u32) -> std::result::Result<Self, String> {
        match fps {
            30 => Ok(FrameRate::Fps30),
            60 => Ok(FrameRate::Fps60),
            other => Err(format!("unsupported frame rate {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Optional encode settings. Carried along, never interpreted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    pub bitrate: Bitrate,
    pub resolution: Resolution,
    pub fps: FrameRate,
    pub orientation: Orientation,
    #[serde(default)]
    pub follow_input: bool,
    #[serde(default)]
    pub loop_video: bool,
    #[serde(default)]
    pub smooth_transition: bool,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            bitrate: Bitrate::Kbps4000,
            resolution: Resolution::Hd1080,
            fps: FrameRate::Fps30,
            orientation: Orientation::Landscape,
            follow_input: false,
            loop_video: false,
            smooth_transition: false,
        }
    }
}

/// A stream's full definition. Values are replaced, never edited in place,
/// once they are part of a history snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub video_source: VideoSource,
    #[serde(default)]
    pub destinations: Vec<Destination>,
    pub schedule: Schedule,
    #[serde(default)]
    pub status: StreamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced: Option<AdvancedSettings>,
}

impl StreamRecord {
    /// Create a new scheduled stream.
    pub fn new(id: &str, title: &str, video_source: VideoSource, schedule: Schedule) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            thumbnail: None,
            video_source,
            destinations: Vec::new(),
            schedule,
            status: StreamStatus::Scheduled,
            advanced: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: &str) -> Self {
        self.thumbnail = Some(thumbnail.to_string());
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destinations.push(destination);
        self
    }

    pub fn with_advanced(mut self, advanced: AdvancedSettings) -> Self {
        self.advanced = Some(advanced);
        self
    }

    /// Copy of this record carrying a different status.
    pub fn with_status(&self, status: StreamStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Structural checks the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CastDeckError::InvalidStream("stream id is empty".into()));
        }
        if self.title.trim().is_empty() {
            return Err(CastDeckError::InvalidStream(format!(
                "stream '{}' has an empty title",
                self.id
            )));
        }
        for (i, dest) in self.destinations.iter().enumerate() {
            if self.destinations[..i].iter().any(|d| d.id() == dest.id()) {
                return Err(CastDeckError::InvalidStream(format!(
                    "destination '{}' appears twice in stream '{}'",
                    dest.id(),
                    self.id
                )));
            }
        }
        self.schedule.validate()
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A typed event emitted by the scheduler for the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub kind: NotificationKind,
    pub message: String,
    pub stream_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A stored notification, as kept by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub stream_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_stream_from_json() {
        let json = r#"{
            "id": "stream-1",
            "title": "Weekly Gaming Highlights",
            "video_source": {"kind": "Google Drive", "path": "https://drive.example/v1"},
            "destinations": [
                {"type": "integrated", "id": "dest-1a", "platform": "YouTube",
                 "account_id": "yt-gaming", "account_name": "My Gaming Channel"},
                {"type": "manual", "id": "dest-1b", "platform": "Custom RTMP", "stream_key": "abcd"}
            ],
            "schedule": {"recurrence": "weekly", "time": "20:00:00", "days": ["Fri", "Sat"],
                         "auto_stop": {"duration_minutes": 120}},
            "advanced": {"bitrate": 6000, "resolution": "1080p", "fps": 60, "orientation": "landscape"}
        }"#;

        let stream: StreamRecord = serde_json::from_str(json).unwrap();
        assert_eq!(stream.status, StreamStatus::Scheduled);
        assert_eq!(stream.destinations.len(), 2);
        assert_eq!(stream.destinations[1].platform(), Platform::CustomRtmp);
        assert!(stream.schedule.is_recurring());
        assert_eq!(
            stream.schedule.auto_stop_duration(),
            Some(chrono::Duration::minutes(120))
        );
        let advanced = stream.advanced.as_ref().unwrap();
        assert_eq!(advanced.bitrate, Bitrate::Kbps6000);
        assert_eq!(advanced.fps, FrameRate::Fps60);
        assert!(stream.validate().is_ok());
    }

    #[test]
    fn test_unsupported_bitrate_is_rejected() {
        let json = r#"{"bitrate": 3000, "resolution": "720p", "fps": 30, "orientation": "portrait"}"#;
        assert!(serde_json::from_str::<AdvancedSettings>(json).is_err());
    }

    #[test]
    fn test_once_schedule_has_start() {
        let start = Utc::now();
        let schedule = Schedule::once(start);
        assert_eq!(schedule.start_at(), Some(start));
        assert!(!schedule.is_recurring());
        assert!(Schedule::daily(at(9, 0)).start_at().is_none());
    }

    #[test]
    fn test_weekly_schedule_needs_days() {
        assert!(Schedule::weekly(at(20, 0), vec![]).validate().is_err());
        assert!(
            Schedule::weekly(at(20, 0), vec![Weekday::Fri, Weekday::Fri])
                .validate()
                .is_err()
        );
        assert!(Schedule::weekly(at(20, 0), vec![Weekday::Fri]).validate().is_ok());
    }

    #[test]
    fn test_zero_auto_stop_is_invalid() {
        let schedule = Schedule::daily(at(8, 30)).with_auto_stop(0);
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_title_and_duplicate_destinations() {
        let source = VideoSource::upload("demo.mp4");
        let blank = StreamRecord::new("s1", "  ", source.clone(), Schedule::daily(at(9, 0)));
        assert!(blank.validate().is_err());

        let dup = StreamRecord::new("s2", "Demo", source, Schedule::daily(at(9, 0)))
            .with_destination(Destination::manual("d1", Platform::Twitch, "k1"))
            .with_destination(Destination::manual("d1", Platform::YouTube, "k2"));
        assert!(dup.validate().is_err());
    }

    #[test]
    fn test_with_status_leaves_original_untouched() {
        let record = StreamRecord::new(
            "s1",
            "Demo",
            VideoSource::upload("demo.mp4"),
            Schedule::once(Utc::now()),
        );
        let live = record.with_status(StreamStatus::Live);
        assert_eq!(record.status, StreamStatus::Scheduled);
        assert_eq!(live.status, StreamStatus::Live);
        assert_eq!(live.title, record.title);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(StreamStatus::Ended.is_terminal());
        assert!(StreamStatus::Error.is_terminal());
        assert!(!StreamStatus::Scheduled.is_terminal());
        assert!(!StreamStatus::Live.is_terminal());
    }
}
