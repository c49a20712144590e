use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];
const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];

/// Classifies a file by its extension, ignoring case.
/// Anything unknown, including files without extension, is a document.
pub fn media_kind(path: &Path) -> MediaKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return MediaKind::Document;
    };
    let ext = ext.to_ascii_lowercase();

    match ext.as_str() {
        x if IMAGE_EXTENSIONS.contains(&x) => MediaKind::Image,
        x if VIDEO_EXTENSIONS.contains(&x) => MediaKind::Video,
        x if AUDIO_EXTENSIONS.contains(&x) => MediaKind::Audio,
        _ => MediaKind::Document,
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
        };
        write!(f, "{}", name)
    }
}
