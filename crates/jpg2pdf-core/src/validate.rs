//! Upload validation: extension allow-list, content sniffing and size cap.

use std::path::Path;

use image::ImageFormat;

use crate::error::ValidationError;

pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".pdf"];

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "application/pdf",
];

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Default size cap: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Content type detected from the leading bytes of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniffedType {
    Image(ImageFormat),
    Pdf,
}

impl SniffedType {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PDF_MAGIC) {
            return Some(SniffedType::Pdf);
        }
        image::guess_format(bytes).ok().map(SniffedType::Image)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            SniffedType::Pdf => "application/pdf",
            SniffedType::Image(format) => format.to_mime_type(),
        }
    }
}

/// What an upload must satisfy before a job is created for it.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    /// When `false`, only the extension is checked.
    pub sniff_content: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            sniff_content: true,
        }
    }
}

impl UploadPolicy {
    /// Size cap in whole MiB, for user-facing messages.
    pub fn max_mb(&self) -> u64 {
        self.max_bytes / (1024 * 1024)
    }

    /// Checked while the upload is still streaming in.
    pub fn check_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit_mb: self.max_mb(),
            });
        }
        Ok(())
    }

    /// Validate a complete upload. Returns the lowercased extension
    /// (with the leading dot) to use for the stored copy.
    pub fn validate(&self, file_name: &str, bytes: &[u8]) -> Result<String, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::Missing);
        }
        self.check_size(bytes.len() as u64)?;

        let extension = extension_of(file_name);
        match extension.as_deref() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext) => {}
            _ => return Err(ValidationError::Extension { extension }),
        }

        if self.sniff_content {
            let detected = SniffedType::sniff(bytes).map(SniffedType::mime_type);
            match detected {
                Some(mime) if ALLOWED_MIME_TYPES.contains(&mime) => {}
                _ => return Err(ValidationError::Content { detected }),
            }
        }

        Ok(extension.unwrap_or_default())
    }
}

/// Lowercased final extension with its dot, e.g. `".jpg"`.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn accepts_every_allowed_extension_without_sniffing() {
        let policy = UploadPolicy {
            sniff_content: false,
            ..UploadPolicy::default()
        };
        for ext in ALLOWED_EXTENSIONS {
            let name = format!("upload{}", ext.to_uppercase());
            assert_eq!(policy.validate(&name, b"data").as_deref(), Ok(*ext));
        }
    }

    #[test]
    fn rejects_unknown_extensions() {
        let policy = UploadPolicy::default();
        for name in ["virus.exe", "notes.txt", "noext", "image.tiff"] {
            assert!(matches!(
                policy.validate(name, &png_bytes()),
                Err(ValidationError::Extension { .. })
            ));
        }
    }

    #[test]
    fn sniffing_rejects_disguised_content() {
        let policy = UploadPolicy::default();
        let err = policy.validate("photo.jpg", b"MZ\x90\x00 not an image").unwrap_err();
        assert_eq!(err, ValidationError::Content { detected: None });
    }

    #[test]
    fn sniffing_accepts_real_images_and_pdfs() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.validate("a.png", &png_bytes()).as_deref(), Ok(".png"));
        // The extension and the content need not agree, only both be allowed.
        assert_eq!(policy.validate("a.jpg", &png_bytes()).as_deref(), Ok(".jpg"));
        assert_eq!(
            policy.validate("doc.pdf", b"%PDF-1.7\n%...").as_deref(),
            Ok(".pdf")
        );
    }

    #[test]
    fn size_cap_is_inclusive() {
        let policy = UploadPolicy {
            max_bytes: 8,
            sniff_content: false,
        };
        assert!(policy.check_size(8).is_ok());
        assert!(matches!(
            policy.validate("a.png", &[0u8; 9]),
            Err(ValidationError::TooLarge { size: 9, .. })
        ));
    }

    #[test]
    fn empty_upload_is_missing() {
        assert_eq!(
            UploadPolicy::default().validate("a.png", &[]),
            Err(ValidationError::Missing)
        );
    }

    #[test]
    fn sniffed_mime_types() {
        assert_eq!(SniffedType::sniff(&png_bytes()).map(SniffedType::mime_type), Some("image/png"));
        assert_eq!(SniffedType::sniff(b"%PDF-1.4"), Some(SniffedType::Pdf));
        assert_eq!(SniffedType::sniff(b"hello"), None);
    }
}
