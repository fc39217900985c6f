//! Image file capture and validation

use crate::error::CaptureError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;

/// Default upload ceiling, 5 MiB
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// A user-selected file with its declared MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime.trim().to_ascii_lowercase().starts_with("image/")
    }
}

/// An accepted image plus a displayable preview
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub file: ImageFile,
    /// `data:` URL of the file contents, for local preview only
    pub preview: String,
}

/// Validates image uploads against type and size limits
#[derive(Debug, Clone)]
pub struct ImageCapture {
    max_bytes: u64,
}

impl ImageCapture {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Reject `file` unless it is an image within the size limit
    pub fn validate(&self, file: &ImageFile) -> Result<(), CaptureError> {
        if !file.is_image() {
            return Err(CaptureError::NotAnImage(file.mime.clone()));
        }
        self.check_size(file.size())
    }

    /// Accept or reject `file`, building its preview
    pub fn capture(&self, file: ImageFile) -> Result<CapturedImage, CaptureError> {
        self.validate(&file)?;
        let preview = format!("data:{};base64,{}", file.mime, STANDARD.encode(&file.bytes));
        Ok(CapturedImage { file, preview })
    }

    /// Read an image from disk, declaring its type from the extension.
    ///
    /// Type and size are checked before the contents are read.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<ImageFile, CaptureError> {
        let path = path.as_ref();
        let mime = mime_from_extension(path);
        if !mime.starts_with("image/") {
            return Err(CaptureError::NotAnImage(mime));
        }
        self.check_size(tokio::fs::metadata(path).await?.len())?;

        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let file = ImageFile::new(name, mime, bytes);
        // The file may have grown since the metadata call
        self.check_size(file.size())?;
        Ok(file)
    }

    fn check_size(&self, size: u64) -> Result<(), CaptureError> {
        if size > self.max_bytes {
            return Err(CaptureError::ImageTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for ImageCapture {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

fn mime_from_extension(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
    .to_string()
}
