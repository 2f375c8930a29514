use once_cell::sync::Lazy;
use regex::Regex;

use super::VideoId;

/// `youtube.com/watch?v=<id>&...` - the identifier runs until the next `&`
pub(crate) static WATCH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v=([^&]+)").expect("static regex"));

/// `youtu.be/<id>?...` - the identifier runs until the query string
pub(crate) static SHORT_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtu\.be/([^?]+)").expect("static regex"));

/// Canonical watch page for a video
pub fn watch_url(video_id: &VideoId) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract_video_id;

    #[test]
    fn test_watch_url_round_trips_through_extraction() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let url = watch_url(&id);
        assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(extract_video_id(&url), Some(id));
    }
}
