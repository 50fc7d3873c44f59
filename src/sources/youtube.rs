use async_trait::async_trait;
use url::Url;

use super::{OriginKind, PreparedSource, ReadinessState, SourcePreparer};
use crate::config::VideoSource;
use crate::{ExtractorError, Result};

/// YouTube videos are read by Gemini straight from their URL
const YOUTUBE_MIME_TYPE: &str = "video/mp4";

/// Preparer for YouTube URLs; nothing is transferred
pub struct YoutubePreparer;

impl YoutubePreparer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YoutubePreparer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_video_id(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Check if the given string is a YouTube watch, short or embed URL.
///
/// The scheme may be omitted; `www.` is optional.
pub fn is_youtube_url(input: &str) -> bool {
    let input = input.trim();
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let parsed = match Url::parse(&candidate) {
        Ok(url) => url,
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let host = match parsed.host_str() {
        Some(host) => host.to_lowercase(),
        None => return false,
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match (host, segments.as_slice()) {
        ("youtu.be", [id]) => is_video_id(id),
        ("youtube.com", ["watch"]) => parsed
            .query_pairs()
            .any(|(key, value)| key == "v" && is_video_id(&value)),
        ("youtube.com", ["embed", id]) => is_video_id(id),
        _ => false,
    }
}

#[async_trait]
impl SourcePreparer for YoutubePreparer {
    async fn prepare(&self, source: &VideoSource, display_name: Option<&str>) -> Result<PreparedSource> {
        let url = match source {
            VideoSource::Remote(url) => url,
            VideoSource::Local(path) => {
                return Err(ExtractorError::UnsupportedSource(format!(
                    "{} is a local file, not a YouTube URL",
                    path.display()
                )))
            }
        };

        if !is_youtube_url(url) {
            return Err(ExtractorError::UnsupportedSource(format!(
                "not a recognised YouTube URL: {}",
                url
            )));
        }

        tracing::info!("Using YouTube URL: {}", url);

        Ok(PreparedSource {
            uri: url.clone(),
            mime_type: YOUTUBE_MIME_TYPE.to_string(),
            display_name: display_name.unwrap_or(url).to_string(),
            origin_kind: OriginKind::Remote,
            readiness: ReadinessState::Ready,
            remote_name: None,
        })
    }

    fn origin_kind(&self) -> OriginKind {
        OriginKind::Remote
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}
