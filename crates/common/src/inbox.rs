// Inbox layout: folder name and timestamp-derived note file names.
//
// Notes are named `<YYYYmmddHHMM>_from_bot.<ext>`. Minute granularity means
// two messages in the same minute share a stem; callers disambiguate with
// `candidate_file_name(.., attempt)`, which appends `-2`, `-3`, ...

use chrono::NaiveDateTime;

use crate::path::sanitize_extension;
use crate::types::{Attachment, AttachmentKind};

/// Default folder (relative to the working-copy root) receiving new notes.
pub const DEFAULT_INBOX_DIR: &str = "Inbox";

/// Fixed suffix after the timestamp.
pub const NOTE_SUFFIX: &str = "_from_bot";

/// Extension for plain text notes.
pub const NOTE_EXTENSION: &str = "md";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

/// `202401010000_from_bot` for 2024-01-01 00:00.
pub fn note_stem(timestamp: NaiveDateTime) -> String {
    format!("{}{NOTE_SUFFIX}", timestamp.format(TIMESTAMP_FORMAT))
}

/// File name for the `attempt`-th candidate (1-based) of a stem.
pub fn candidate_file_name(stem: &str, extension: &str, attempt: u32) -> String {
    if attempt <= 1 {
        format!("{stem}.{extension}")
    } else {
        format!("{stem}-{attempt}.{extension}")
    }
}

/// Pick the extension an attachment is stored under.
///
/// Order: the original file name's extension, then the MIME type, then a
/// per-kind fallback (`jpg` for photos, `bin` for documents).
pub fn attachment_extension(attachment: &Attachment) -> String {
    attachment
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
        .and_then(sanitize_extension)
        .or_else(|| attachment.mime_type.as_deref().and_then(extension_for_mime))
        .unwrap_or_else(|| match attachment.kind {
            AttachmentKind::Photo => "jpg".to_string(),
            AttachmentKind::Document => "bin".to_string(),
        })
}

fn extension_for_mime(mime: &str) -> Option<String> {
    let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    let ext = match essence.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "application/pdf" => "pdf",
        "text/plain" => "txt",
        "text/markdown" => "md",
        "application/zip" => "zip",
        "audio/ogg" => "ogg",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        _ => return None,
    };
    Some(ext.to_string())
}
