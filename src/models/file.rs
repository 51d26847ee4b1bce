//! Remote file records and the extension → type-bucket table.

use serde::{Deserialize, Deserializer, Serialize};

/// A single record from `GET /api/files`.
///
/// Immutable snapshot: the catalog replaces the whole list on refresh and
/// never patches individual entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Opaque identifier, normalised to a string whether the server sent a
    /// JSON string or number.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    /// Human-readable size such as `"12.4 MB"`. Parse with
    /// [`crate::services::catalog::parse_size`].
    #[serde(rename = "size", default)]
    pub size_display: String,
    #[serde(default)]
    pub views: u64,
    /// Per-entry token required by `GET /delete/{id}`.
    #[serde(rename = "owner_key", default)]
    pub owner_key: String,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "file id must be a string or number, got {}",
            other
        ))),
    }
}

/// Coarse content category derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeBucket {
    Image,
    Video,
    Audio,
    Document,
    Code,
    Archive,
    Data,
    Other,
}

const BUCKETS: &[(TypeBucket, &[&str])] = &[
    (TypeBucket::Image, &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"]),
    (TypeBucket::Video, &["mp4", "avi", "mkv", "mov", "webm"]),
    (TypeBucket::Audio, &["mp3", "wav", "ogg", "flac"]),
    (TypeBucket::Document, &["pdf", "doc", "docx", "txt", "md", "rtf"]),
    (
        TypeBucket::Code,
        &["lua", "js", "py", "json", "html", "css", "jsx", "ts", "tsx"],
    ),
    (TypeBucket::Archive, &["zip", "rar", "7z", "tar", "gz"]),
    (TypeBucket::Data, &["csv", "xml", "sql"]),
];

impl TypeBucket {
    /// Bucket for a file name. The text after the last `.` is the extension;
    /// a name without a dot is treated as its own extension.
    pub fn from_name(name: &str) -> Self {
        let ext = name.rsplit('.').next().unwrap_or_default().to_lowercase();
        BUCKETS
            .iter()
            .find(|(_, exts)| exts.contains(&ext.as_str()))
            .map(|(bucket, _)| *bucket)
            .unwrap_or(TypeBucket::Other)
    }

    /// MIME type sent with multipart uploads.
    pub fn mime_for_name(name: &str) -> &'static str {
        let ext = name.rsplit('.').next().unwrap_or_default().to_lowercase();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "ogg" => "audio/ogg",
            "flac" => "audio/flac",
            "pdf" => "application/pdf",
            "txt" | "md" | "lua" | "py" => "text/plain",
            "json" => "application/json",
            "html" => "text/html",
            "css" => "text/css",
            "js" | "jsx" => "text/javascript",
            "zip" => "application/zip",
            "gz" => "application/gzip",
            "csv" => "text/csv",
            "xml" => "application/xml",
            _ => "application/octet-stream",
        }
    }
}
