#![forbid(unsafe_code)]

//! Download strategies. A plan is a fixed, ordered fallback chain of profiles
//! plus the settings every attempt shares.

use crate::quality::{AudioQuality, VideoQuality};

/// Client identity yt-dlp impersonates when talking to YouTube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerClient {
    Default,
    Android,
}

impl PlayerClient {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Android => "android",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProfile {
    pub label: &'static str,
    pub format: String,
    pub player_client: PlayerClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    None,
    ExtractMp3 { kbps: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub profiles: Vec<DownloadProfile>,
    pub allow_playlist: bool,
    pub merge_output_format: Option<&'static str>,
    pub post_process: PostProcess,
}

impl DownloadPlan {
    /// MP4 download capped at the requested height, merged into an mp4
    /// container. Playlists are followed.
    pub fn video(quality: VideoQuality) -> Self {
        Self {
            profiles: video_profiles(quality),
            allow_playlist: true,
            merge_output_format: Some("mp4"),
            post_process: PostProcess::None,
        }
    }

    /// Best audio stream re-encoded to MP3. Only the single item is fetched.
    pub fn audio(quality: AudioQuality) -> Self {
        Self {
            profiles: audio_profiles(),
            allow_playlist: false,
            merge_output_format: None,
            post_process: PostProcess::ExtractMp3 {
                kbps: quality.kbps(),
            },
        }
    }
}

pub fn video_profiles(quality: VideoQuality) -> Vec<DownloadProfile> {
    let (primary, fallback) = match quality.max_height() {
        None => (
            "bv*[ext=mp4][protocol!=m3u8]+ba[ext=m4a][protocol!=m3u8]/b[ext=mp4]/b".to_string(),
            "best[ext=mp4]/best".to_string(),
        ),
        Some(height) => (
            format!(
                "bv*[ext=mp4][height<={height}][protocol!=m3u8]+ba[ext=m4a][protocol!=m3u8]/b[ext=mp4][height<={height}]/b[height<={height}]"
            ),
            format!("best[ext=mp4][height<={height}]/best[height<={height}]/best"),
        ),
    };

    vec![
        DownloadProfile {
            label: "mp4+m4a",
            format: primary,
            player_client: PlayerClient::Default,
        },
        DownloadProfile {
            label: "best-mp4",
            format: fallback,
            player_client: PlayerClient::Android,
        },
    ]
}

pub fn audio_profiles() -> Vec<DownloadProfile> {
    vec![
        DownloadProfile {
            label: "bestaudio-direct",
            format: "bestaudio[protocol!=m3u8]/bestaudio/best".to_string(),
            player_client: PlayerClient::Default,
        },
        DownloadProfile {
            label: "bestaudio",
            format: "bestaudio/best".to_string(),
            player_client: PlayerClient::Android,
        },
    ]
}
