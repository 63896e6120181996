use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionTag {
    Goal,
    Assist,
    Save,
    Tackle,
    Skill,
    Pass,
    Shot,
    Other,
}

impl ActionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTag::Goal => "goal",
            ActionTag::Assist => "assist",
            ActionTag::Save => "save",
            ActionTag::Tackle => "tackle",
            ActionTag::Skill => "skill",
            ActionTag::Pass => "pass",
            ActionTag::Shot => "shot",
            ActionTag::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct VideoClip {
    pub id: Uuid,
    pub match_session_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_key: Option<String>,
    pub thumbnail_key: Option<String>,
    /// Seconds
    pub duration: i32,
    pub recorded_at: DateTime<Utc>,
    pub game_minute: i32,
    pub period: i32,
    pub action_tag: String,
    pub is_highlight: bool,
    pub created_by: Option<Uuid>,
}

pub fn period_name(period: i32) -> String {
    match period {
        1 => "1st half".to_string(),
        2 => "2nd half".to_string(),
        3 => "3rd period".to_string(),
        4 => "4th period".to_string(),
        5 => "Extra time 1".to_string(),
        6 => "Extra time 2".to_string(),
        7 => "Penalties".to_string(),
        n => format!("Period {}", n),
    }
}

impl VideoClip {
    /// e.g. `1st half 23'`
    pub fn formatted_game_time(&self) -> String {
        format!("{} {}'", period_name(self.period), self.game_minute)
    }
}

#[derive(Debug, Serialize)]
pub struct ClipView {
    #[serde(flatten)]
    pub clip: VideoClip,
    pub formatted_game_time: String,
    pub player_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ClipRequest {
    pub match_session_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub duration: i32,
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub game_minute: i32,
    #[serde(default = "default_period")]
    pub period: i32,
    #[serde(default = "default_action_tag")]
    pub action_tag: ActionTag,
    #[serde(default)]
    pub is_highlight: bool,
    #[serde(default)]
    pub player_ids: Vec<Uuid>,
}

fn default_period() -> i32 {
    1
}

fn default_action_tag() -> ActionTag {
    ActionTag::Other
}

impl ClipRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        if self.duration < 0 {
            return Err("Duration cannot be negative".into());
        }
        if self.game_minute < 0 {
            return Err("Game minute cannot be negative".into());
        }
        if self.period < 1 {
            return Err("Period must be at least 1".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ClipQuery {
    pub match_session_id: Option<Uuid>,
    pub player_id: Option<Uuid>,
    pub action_tag: Option<ActionTag>,
    pub highlight: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Thumbnail,
}

#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    #[serde(default = "default_media_kind")]
    pub kind: MediaKind,
    /// Extension including the dot, e.g. `.mp4`
    pub file_extension: Option<String>,
    pub content_type: Option<String>,
}

fn default_media_kind() -> MediaKind {
    MediaKind::Video
}

#[derive(Debug, Serialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub object_key: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmUploadRequest {
    pub object_key: String,
    /// Hex SHA-256 of the uploaded bytes
    pub expected_hash: String,
    #[serde(default = "default_media_kind")]
    pub kind: MediaKind,
}

#[derive(Debug, Serialize)]
pub struct DownloadUrlResponse {
    pub download_url: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct HighlightReel {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_key: Option<String>,
    pub thumbnail_key: Option<String>,
    pub is_published: bool,
    pub match_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ReelClip {
    pub position: i32,
    pub clip_id: Uuid,
    pub title: String,
    pub duration: i32,
    pub game_minute: i32,
    pub period: i32,
    pub action_tag: String,
}

#[derive(Debug, Serialize)]
pub struct ReelDetail {
    #[serde(flatten)]
    pub reel: HighlightReel,
    pub clips: Vec<ReelClip>,
    pub total_duration: i64,
}

impl ReelDetail {
    pub fn new(reel: HighlightReel, clips: Vec<ReelClip>) -> Self {
        let total_duration = clips.iter().map(|c| i64::from(c.duration)).sum();
        Self { reel, clips, total_duration }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReelRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    pub match_id: Option<Uuid>,
    pub video_key: Option<String>,
    pub thumbnail_key: Option<String>,
}

impl ReelRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

#[derive(Debug, Deserialize)]
pub struct ReelClipsRequest {
    pub clip_ids: Vec<Uuid>,
}

impl ReelClipsRequest {
    pub fn validate(&self) -> Result<(), String> {
        for (i, id) in self.clip_ids.iter().enumerate() {
            if self.clip_ids[..i].contains(id) {
                return Err(format!("Clip {} appears more than once", id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct AppendClipRequest {
    pub clip_id: Uuid,
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() || title.chars().count() > 100 {
        return Err("Title must be between 1 and 100 characters".into());
    }
    Ok(())
}
