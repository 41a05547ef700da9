use regex::Regex;
use std::sync::LazyLock;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"video/(\d+)").expect("valid video id regex"));

/// Pulls the numeric post id out of a share link such as
/// `https://www.tiktok.com/@someone/video/7420545151229136174?is_from_webapp=1`.
pub fn extract_video_id(url: &str) -> Option<&str> {
    VIDEO_ID
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}
