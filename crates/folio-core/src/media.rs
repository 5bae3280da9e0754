//! YouTube embedding and upload descriptors for the portfolio admin.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

const VIDEO_ID_LEN: usize = 11;
const EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed";

/// Reference to a YouTube video, optionally starting at an offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoutubeVideo {
    id: String,
    start_seconds: Option<u32>,
}

impl YoutubeVideo {
    /// Parse any of the usual share, watch, embed or shorts URLs.
    ///
    /// A missing scheme is tolerated (`youtu.be/abc...`, `youtube.com:443/watch?v=...`).
    ///
    /// # Errors
    ///
    /// Returns [`MediaError`] when the input is not a URL, is not hosted on a
    /// YouTube domain, or carries no valid 11-character video id.
    pub fn parse(input: &str) -> MediaResult<Self> {
        let trimmed = input.trim();
        let url = Url::parse(trimmed)
            .ok()
            .filter(|url| url.has_host())
            .map_or_else(|| Url::parse(&format!("https://{trimmed}")), Ok)
            .map_err(|_| MediaError::InvalidUrl {
                value: input.to_string(),
            })?;

        let host = url
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| MediaError::InvalidUrl {
                value: input.to_string(),
            })?;
        let bare_host = host
            .strip_prefix("www.")
            .or_else(|| host.strip_prefix("m."))
            .unwrap_or(&host);

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        let candidate = match bare_host {
            "youtu.be" => segments.first().map(|id| (*id).to_string()),
            "youtube.com" | "youtube-nocookie.com" => match segments.as_slice() {
                ["watch"] => query_value(&url, &["v"]),
                ["embed" | "shorts" | "live", id, ..] => Some((*id).to_string()),
                _ => None,
            },
            _ => return Err(MediaError::UnsupportedHost { host: host.clone() }),
        };

        let id = candidate
            .filter(|id| is_valid_video_id(id))
            .ok_or_else(|| MediaError::InvalidVideoId {
                value: input.to_string(),
            })?;
        let start_seconds =
            query_value(&url, &["t", "start"]).and_then(|raw| parse_timestamp(&raw));

        Ok(Self { id, start_seconds })
    }

    /// Eleven-character video id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Playback offset, if any.
    #[must_use]
    pub const fn start_seconds(&self) -> Option<u32> {
        self.start_seconds
    }

    /// Privacy-enhanced embed URL for an iframe.
    #[must_use]
    pub fn embed_url(&self) -> String {
        match self.start_seconds {
            Some(start) => format!("{EMBED_BASE}/{}?start={start}", self.id),
            None => format!("{EMBED_BASE}/{}", self.id),
        }
    }

    /// Canonical watch page URL.
    #[must_use]
    pub fn watch_url(&self) -> String {
        match self.start_seconds {
            Some(start) => format!("https://www.youtube.com/watch?v={}&t={start}s", self.id),
            None => format!("https://www.youtube.com/watch?v={}", self.id),
        }
    }

    /// High-quality thumbnail image.
    #[must_use]
    pub fn thumbnail_url(&self) -> String {
        format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", self.id)
    }
}

fn query_value(url: &Url, keys: &[&str]) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| keys.contains(&key.as_ref()))
        .map(|(_, value)| value.into_owned())
}

fn is_valid_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// Parse `90`, `90s`, `1m30s` or `1h2m3s` into seconds. Zero means "no offset".
fn parse_timestamp(raw: &str) -> Option<u32> {
    let mut total: u32 = 0;
    let mut digits: Option<u32> = None;
    for ch in raw.trim().chars() {
        if let Some(digit) = ch.to_digit(10) {
            digits = Some(digits.unwrap_or(0).checked_mul(10)?.checked_add(digit)?);
            continue;
        }
        let unit = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total = total.checked_add(digits.take()?.checked_mul(unit)?)?;
    }
    if let Some(seconds) = digits {
        total = total.checked_add(seconds)?;
    }
    (total > 0).then_some(total)
}

/// Broad category of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// Raster or vector image.
    Image,
    /// Video file.
    Video,
    /// PDF, plain text or office document.
    Document,
}

impl UploadKind {
    /// Classify a MIME type; parameters such as `; charset=` are ignored.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if essence.starts_with("image/") {
            return Some(Self::Image);
        }
        if essence.starts_with("video/") {
            return Some(Self::Video);
        }
        match essence.as_str() {
            "application/pdf"
            | "text/plain"
            | "text/markdown"
            | "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Document)
            }
            _ => None,
        }
    }
}

/// File selected for upload to the storage bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Public URL once stored.
    #[serde(default)]
    pub public_url: Option<String>,
}

/// Limits applied before an upload is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    /// Largest accepted file.
    pub max_bytes: u64,
    /// Accepted categories.
    pub allowed: Vec<UploadKind>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
            allowed: vec![UploadKind::Image, UploadKind::Video, UploadKind::Document],
        }
    }
}

impl UploadPolicy {
    /// Check `file` against the policy and return its category.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError`] for empty files, files above `max_bytes`, and
    /// content types outside `allowed`.
    pub fn validate(&self, file: &UploadedFile) -> MediaResult<UploadKind> {
        if file.size_bytes == 0 {
            return Err(MediaError::EmptyUpload {
                name: file.name.clone(),
            });
        }
        if file.size_bytes > self.max_bytes {
            return Err(MediaError::UploadTooLarge {
                name: file.name.clone(),
                size_bytes: file.size_bytes,
                max_bytes: self.max_bytes,
            });
        }
        UploadKind::from_content_type(&file.content_type)
            .filter(|kind| self.allowed.contains(kind))
            .ok_or_else(|| MediaError::UploadTypeNotAllowed {
                name: file.name.clone(),
                content_type: file.content_type.clone(),
            })
    }
}

/// Object key for a stored upload: `<prefix>/<id>-<sanitized name>`.
#[must_use]
pub fn storage_object_path(prefix: &str, file_name: &str, id: Uuid) -> String {
    let mut sanitized = String::with_capacity(file_name.len());
    for ch in file_name.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_') {
            ch.to_ascii_lowercase()
        } else {
            '-'
        };
        if mapped == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(mapped);
    }
    let sanitized = sanitized.trim_matches(|ch| ch == '-' || ch == '.');
    let name = if sanitized.is_empty() { "file" } else { sanitized };

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{id}-{name}")
    } else {
        format!("{prefix}/{id}-{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_common_youtube_url_shapes() {
        let shapes = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
        ];
        for shape in shapes {
            let video = YoutubeVideo::parse(shape).expect(shape);
            assert_eq!(video.id(), "dQw4w9WgXcQ", "{shape}");
            assert_eq!(video.start_seconds(), None, "{shape}");
        }
    }

    #[test]
    fn host_with_port_and_no_scheme_is_not_read_as_a_scheme() {
        let video = YoutubeVideo::parse("youtube.com:443/watch?v=dQw4w9WgXcQ")
            .expect("host with port");
        assert_eq!(video.id(), "dQw4w9WgXcQ");
        assert!(matches!(
            YoutubeVideo::parse("urn:isbn:0451450523"),
            Err(MediaError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn start_offsets_feed_the_embed_url() {
        let video = YoutubeVideo::parse("https://youtu.be/dQw4w9WgXcQ?t=1m30s").expect("parse");
        assert_eq!(video.start_seconds(), Some(90));
        assert_eq!(
            video.embed_url(),
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ?start=90"
        );
        assert_eq!(parse_timestamp("90"), Some(90));
        assert_eq!(parse_timestamp("90s"), Some(90));
        assert_eq!(parse_timestamp("1h0m5s"), Some(3605));
        assert_eq!(parse_timestamp("0"), None);
        assert_eq!(parse_timestamp("abc"), None);
    }

    #[test]
    fn rejects_foreign_hosts_and_bad_ids() {
        assert!(matches!(
            YoutubeVideo::parse("https://vimeo.com/12345"),
            Err(MediaError::UnsupportedHost { host }) if host == "vimeo.com"
        ));
        assert!(matches!(
            YoutubeVideo::parse("https://www.youtube.com/watch?v=short"),
            Err(MediaError::InvalidVideoId { .. })
        ));
        assert!(matches!(
            YoutubeVideo::parse("https://www.youtube.com/channel/UC123"),
            Err(MediaError::InvalidVideoId { .. })
        ));
        assert!(matches!(
            YoutubeVideo::parse(""),
            Err(MediaError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn upload_policy_enforces_size_and_kind() {
        let policy = UploadPolicy {
            max_bytes: 1024,
            allowed: vec![UploadKind::Image],
        };
        let file = |content_type: &str, size_bytes| UploadedFile {
            name: "hero.png".into(),
            content_type: content_type.into(),
            size_bytes,
            public_url: None,
        };

        assert_eq!(policy.validate(&file("image/png", 512)), Ok(UploadKind::Image));
        assert!(matches!(
            policy.validate(&file("image/png", 0)),
            Err(MediaError::EmptyUpload { .. })
        ));
        assert!(matches!(
            policy.validate(&file("image/png", 2048)),
            Err(MediaError::UploadTooLarge { max_bytes: 1024, .. })
        ));
        assert!(matches!(
            policy.validate(&file("application/pdf", 10)),
            Err(MediaError::UploadTypeNotAllowed { .. })
        ));
        assert_eq!(
            UploadKind::from_content_type("Text/Plain; charset=utf-8"),
            Some(UploadKind::Document)
        );
    }

    #[test]
    fn object_paths_are_sanitized() {
        let id = Uuid::nil();
        assert_eq!(
            storage_object_path("/portfolio/", "My Photo (1).PNG", id),
            format!("portfolio/{id}-my-photo-1-.png")
        );
        assert_eq!(storage_object_path("", "???", id), format!("{id}-file"));
    }
}
