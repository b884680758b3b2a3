//! File-type classification for vault entries.
//!
//! Every file listed in a vault index is shown with an icon and previewed with
//! a viewer chosen from its extension. The mapping is a constant table: the
//! extension is the lower-cased text after the last `.` of the file name.
//!
//! | Extensions | Icon | View |
//! |------------|------|------|
//! | `jpg jpeg png gif bmp webp svg` | 📸 | [`ViewType::Image`] |
//! | `mp4 mov avi mkv webm` | 🎬 | [`ViewType::Video`] |
//! | `mp3 wav ogg flac` | 🔊 | [`ViewType::Audio`] |
//! | `txt json html` | 📄 | [`ViewType::Code`] |
//!
//! Anything else falls back to [`ViewType::Unknown`] with the generic 📄 icon.
//! Unknown extensions are never an error.

/// Icon for a sub-vault entry.
pub const FOLDER_ICON: &str = "📁";
/// Icon for the synthetic "go up one level" entry.
pub const UP_ICON: &str = "🔙";
/// Icon for files whose extension is not in the table.
pub const DEFAULT_ICON: &str = "📄";

/// How an assembled file should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    Image,
    Video,
    Audio,
    /// Text-like content shown verbatim in a code block.
    Code,
    /// No dedicated viewer; shown as lossy text with a notice.
    Unknown,
}

impl ViewType {
    pub fn name(self) -> &'static str {
        match self {
            ViewType::Image => "image",
            ViewType::Video => "video",
            ViewType::Audio => "audio",
            ViewType::Code => "code",
            ViewType::Unknown => "unknown",
        }
    }

    /// MIME type handed to the browser for media elements.
    pub fn mime(self) -> &'static str {
        match self {
            ViewType::Image => "image/*",
            ViewType::Video => "video/*",
            ViewType::Audio => "audio/*",
            ViewType::Code => "text/plain",
            ViewType::Unknown => "application/octet-stream",
        }
    }
}

const FILE_TYPES: &[(&str, &str, ViewType)] = &[
    ("jpg", "📸", ViewType::Image),
    ("jpeg", "📸", ViewType::Image),
    ("png", "📸", ViewType::Image),
    ("gif", "📸", ViewType::Image),
    ("bmp", "📸", ViewType::Image),
    ("webp", "📸", ViewType::Image),
    ("svg", "📸", ViewType::Image),
    ("mp4", "🎬", ViewType::Video),
    ("mov", "🎬", ViewType::Video),
    ("avi", "🎬", ViewType::Video),
    ("mkv", "🎬", ViewType::Video),
    ("webm", "🎬", ViewType::Video),
    ("mp3", "🔊", ViewType::Audio),
    ("wav", "🔊", ViewType::Audio),
    ("ogg", "🔊", ViewType::Audio),
    ("flac", "🔊", ViewType::Audio),
    ("txt", "📄", ViewType::Code),
    ("json", "📄", ViewType::Code),
    ("html", "📄", ViewType::Code),
];

/// Extension of a file name: lower-cased text after the last `.`.
///
/// A name without a dot yields the whole (lower-cased) name, which simply
/// won't match any table entry.
pub fn extension(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    match lower.rsplit_once('.') {
        Some((_, ext)) => ext.to_string(),
        None => lower,
    }
}

fn lookup(file_name: &str) -> Option<(&'static str, ViewType)> {
    let ext = extension(file_name);
    FILE_TYPES
        .iter()
        .find(|(e, _, _)| *e == ext)
        .map(|(_, icon, view)| (*icon, *view))
}

/// Viewer for a file name.
pub fn view_type(file_name: &str) -> ViewType {
    lookup(file_name).map_or(ViewType::Unknown, |(_, view)| view)
}

/// Listing icon for a file name.
pub fn icon(file_name: &str) -> &'static str {
    lookup(file_name).map_or(DEFAULT_ICON, |(icon, _)| icon)
}
