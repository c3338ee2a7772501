//! Media-type sniffing for `sendMedia`.

use std::fmt;

/// Wire value used when no type is given and nothing can be sniffed.
pub const DEFAULT_MEDIA_TYPE: &str = "image";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "3gp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav", "aac", "m4a", "opus", "flac"];

/// `mediatype` values accepted by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    /// Classify by file extension; anything unrecognized is a document.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else {
            Self::Document
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension of the last path segment, ignoring query and fragment.
fn extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// Sniff the media type of `url` from its extension.
pub fn media_type_for(url: &str) -> MediaType {
    extension(url).map_or(MediaType::Document, MediaType::from_extension)
}

/// Wire `mediatype`: the explicit value when given, else the sniffed one.
pub fn resolve_media_type(url: &str, explicit: Option<&str>) -> String {
    match explicit.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_string(),
        None if url.trim().is_empty() => DEFAULT_MEDIA_TYPE.to_string(),
        None => media_type_for(url).as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_extensions() {
        assert_eq!(media_type_for("http://example.com/image.png"), MediaType::Image);
        assert_eq!(media_type_for("http://example.com/image.JPG"), MediaType::Image);
        assert_eq!(media_type_for("http://example.com/video.mp4"), MediaType::Video);
        assert_eq!(media_type_for("http://example.com/audio.mp3"), MediaType::Audio);
        assert_eq!(media_type_for("http://example.com/file.pdf"), MediaType::Document);
        assert_eq!(media_type_for("http://example.com/unknown"), MediaType::Document);
    }

    #[test]
    fn ignores_query_and_fragment() {
        assert_eq!(
            media_type_for("https://cdn.example.com/v/clip.mp4?sig=abc.png#t=1"),
            MediaType::Video
        );
    }

    #[test]
    fn explicit_type_wins() {
        assert_eq!(resolve_media_type("http://site.com/img.jpg", Some("document")), "document");
        assert_eq!(resolve_media_type("http://site.com/img.jpg", None), "image");
        assert_eq!(resolve_media_type("http://site.com/song.mp3", Some(" ")), "audio");
        assert_eq!(resolve_media_type("", None), DEFAULT_MEDIA_TYPE);
    }
}
