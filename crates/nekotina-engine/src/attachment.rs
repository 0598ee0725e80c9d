use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use nekotina_contracts::conversation::Attachment;
use sha2::{Digest, Sha256};

/// The selected file could not be turned into an attachment.
#[derive(Debug)]
pub struct AttachmentReadError {
    path: Option<PathBuf>,
    message: String,
    source: Option<io::Error>,
}

impl AttachmentReadError {
    fn new(path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            message: message.into(),
            source: None,
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            message: format!("failed reading {}", path.display()),
            source: Some(source),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for AttachmentReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AttachmentReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}

/// Reads an image file into a transport-ready attachment.
pub fn encode_file(path: &Path) -> Result<Attachment, AttachmentReadError> {
    let bytes = fs::read(path).map_err(|err| AttachmentReadError::io(path, err))?;
    let declared = mime_for_path(path);
    build_attachment(Some(path), bytes, declared)
}

/// Same as [`encode_file`] for bytes already in memory, e.g. from a file
/// picker that reports its own media type.
pub fn encode_bytes(
    bytes: Vec<u8>,
    declared_type: Option<&str>,
) -> Result<Attachment, AttachmentReadError> {
    build_attachment(None, bytes, declared_type)
}

fn build_attachment(
    path: Option<&Path>,
    bytes: Vec<u8>,
    declared_type: Option<&str>,
) -> Result<Attachment, AttachmentReadError> {
    if bytes.is_empty() {
        return Err(AttachmentReadError::new(path, "attachment is empty"));
    }
    let media_type = declared_type
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_ascii_lowercase)
        .or_else(|| sniff_media_type(&bytes).map(str::to_string))
        .unwrap_or_else(|| "application/octet-stream".to_string());
    if !media_type.starts_with("image/") {
        return Err(AttachmentReadError::new(
            path,
            format!("unsupported attachment type '{media_type}'; expected an image"),
        ));
    }
    Ok(Attachment::new(media_type, bytes))
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// Short content digest used in event logs instead of the image itself.
pub fn attachment_fingerprint(attachment: &Attachment) -> String {
    let mut hasher = Sha256::new();
    hasher.update(attachment.preview().bytes());
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use image::{ImageFormat, Rgb, RgbImage};
    use nekotina_contracts::conversation::ImageRef;

    use super::*;

    fn write_fixture(path: &Path, format: ImageFormat) -> anyhow::Result<Vec<u8>> {
        let mut image = RgbImage::new(8, 6);
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 30) as u8, (y * 40) as u8, 200]);
        }
        image.save_with_format(path, format)?;
        Ok(fs::read(path)?)
    }

    #[test]
    fn png_and_jpeg_previews_round_trip_byte_identical() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        for (name, format, mime) in [
            ("fixture.png", ImageFormat::Png, "image/png"),
            ("fixture.jpg", ImageFormat::Jpeg, "image/jpeg"),
        ] {
            let path = temp.path().join(name);
            let original = write_fixture(&path, format)?;

            let attachment = encode_file(&path)?;
            assert_eq!(attachment.media_type(), mime);
            assert!(!attachment.transport_data().starts_with("data:"));

            let decoded = ImageRef::from_data_uri(&attachment.preview().data_uri())
                .expect("preview renders as a data uri");
            assert_eq!(decoded.bytes(), original.as_slice());
            assert_eq!(decoded.media_type(), mime);
            let reloaded = image::load_from_memory(decoded.bytes())?;
            assert_eq!((reloaded.width(), reloaded.height()), (8, 6));
        }
        Ok(())
    }

    #[test]
    fn unknown_extension_is_sniffed_from_content() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("upload.bin");
        write_fixture(&path, ImageFormat::Png)?;
        assert_eq!(encode_file(&path)?.media_type(), "image/png");
        Ok(())
    }

    #[test]
    fn declared_type_wins_over_sniffing() -> anyhow::Result<()> {
        let attachment = encode_bytes(b"\x89PNG\r\n\x1a\nrest".to_vec(), Some(" Image/WEBP "))?;
        assert_eq!(attachment.media_type(), "image/webp");
        Ok(())
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let path = Path::new("/definitely/not/here.png");
        let err = encode_file(path).err().expect("missing file must fail");
        assert_eq!(err.path(), Some(path));
        assert!(err.to_string().contains("failed reading"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn empty_and_non_image_inputs_are_rejected() {
        assert!(encode_bytes(Vec::new(), Some("image/png")).is_err());
        let err = encode_bytes(b"just text".to_vec(), None)
            .err()
            .expect("text is not an image");
        assert!(err.to_string().contains("application/octet-stream"));
        assert!(encode_bytes(b"%PDF-1.7".to_vec(), Some("application/pdf")).is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let first = Attachment::new("image/png", vec![1, 2, 3]);
        let second = Attachment::new("image/jpeg", vec![1, 2, 3]);
        assert_eq!(attachment_fingerprint(&first), attachment_fingerprint(&second));
        assert_eq!(attachment_fingerprint(&first).len(), 16);
    }
}
