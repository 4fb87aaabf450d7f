use std::fmt;

use bytes::Bytes;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{error::AppError, state::AppState};

/// The two attachment slots a registration can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    NationalId,
    UserLogo,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 2] = [AttachmentKind::NationalId, AttachmentKind::UserLogo];

    /// Multipart part name.
    pub fn field_name(&self) -> &'static str {
        match self {
            AttachmentKind::NationalId => "nationalIdCopy",
            AttachmentKind::UserLogo => "userLogo",
        }
    }

    /// Storage sub-directory, also the second segment of the public path.
    pub fn dir(&self) -> &'static str {
        match self {
            AttachmentKind::NationalId => "nationalIdPath",
            AttachmentKind::UserLogo => "userLogo",
        }
    }

    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.field_name() == name)
    }

    pub fn from_dir(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.dir() == dir)
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A file part read from the request, not yet validated or stored.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

/// Paths of the stored attachments; `None` for slots that were not submitted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoredAttachments {
    pub national_id_path: Option<String>,
    pub user_logo: Option<String>,
}

impl StoredAttachments {
    fn set(&mut self, kind: AttachmentKind, path: String) {
        match kind {
            AttachmentKind::NationalId => self.national_id_path = Some(path),
            AttachmentKind::UserLogo => self.user_logo = Some(path),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.national_id_path
            .as_deref()
            .into_iter()
            .chain(self.user_logo.as_deref())
    }
}

pub const PUBLIC_PREFIX: &str = "/uploads/";

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// Type and size gate for a single attachment.
pub fn validate_upload(item: &UploadItem, max_bytes: usize) -> Result<(), AppError> {
    if ext_from_mime(&item.content_type).is_none() {
        warn!(kind = %item.kind, content_type = %item.content_type, "unsupported upload type");
        return Err(AppError::UnsupportedMediaType);
    }
    if item.body.len() > max_bytes {
        warn!(kind = %item.kind, size = item.body.len(), max_bytes, "upload too large");
        return Err(AppError::PayloadTooLarge);
    }
    Ok(())
}

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    static ref UNSAFE_RE: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

fn sanitize(part: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(part, "_");
    UNSAFE_RE.replace_all(&collapsed, "").into_owned()
}

/// `<unix millis>-<8 hex>_<sanitized base>.<ext>`. The extension always comes
/// from the validated content type; the client's own extension is dropped.
pub fn generate_file_name(original: &str, content_type: &str) -> String {
    // only the last path segment of whatever the client sent
    let original = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let base = match original.rfind('.') {
        Some(i) if i > 0 => &original[..i],
        _ => original,
    };
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let mut base = sanitize(base);
    if base.is_empty() {
        base = "file".into();
    }

    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let nonce: u32 = rand::thread_rng().gen();
    format!("{millis}-{nonce:08x}_{base}.{ext}")
}

/// Storage key for a public `/uploads/<kind>/<name>` path.
pub fn key_from_public_path(path: &str) -> Option<&str> {
    path.strip_prefix(PUBLIC_PREFIX)
}

/// Validates every item, then writes them. Nothing is written unless all items
/// pass validation; a failed write removes the objects written before it.
#[instrument(skip(st, items), fields(count = items.len()))]
pub async fn store_attachments(
    st: &AppState,
    items: Vec<UploadItem>,
) -> Result<StoredAttachments, AppError> {
    let max = st.config.uploads.max_file_bytes;
    for item in &items {
        validate_upload(item, max)?;
    }

    let mut stored = StoredAttachments::default();
    for item in items {
        let name = generate_file_name(&item.file_name, &item.content_type);
        let key = format!("{}/{}", item.kind.dir(), name);
        let size = item.body.len();
        let put = st
            .bounded("storage put", st.storage.put_object(&key, item.body, &item.content_type))
            .await
            .and_then(|r| r.map_err(AppError::Io));
        if let Err(e) = put {
            remove_attachments(st, stored.paths()).await;
            return Err(e);
        }
        info!(kind = %item.kind, %key, size, "attachment stored");
        stored.set(item.kind, format!("{PUBLIC_PREFIX}{key}"));
    }
    Ok(stored)
}

/// Best-effort removal of previously stored attachments.
pub async fn remove_attachments<'a>(st: &AppState, paths: impl IntoIterator<Item = &'a str>) {
    for path in paths {
        let Some(key) = key_from_public_path(path) else {
            continue;
        };
        match st.bounded("storage delete", st.storage.delete_object(key)).await {
            Ok(Ok(())) => info!(key, "attachment removed"),
            Ok(Err(e)) => warn!(error = %e, key, "failed to remove attachment"),
            Err(e) => warn!(error = %e, key, "failed to remove attachment"),
        }
    }
}
