use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Decoded image content ready for display.
///
/// The bytes are kept as-is; `data_uri` renders them in the form a web view or
/// markdown renderer can show directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    media_type: String,
    bytes: Vec<u8>,
}

impl ImageRef {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn from_base64(
        media_type: impl Into<String>,
        encoded: &str,
    ) -> Result<Self, base64::DecodeError> {
        let bytes = BASE64.decode(encoded.trim().as_bytes())?;
        Ok(Self::new(media_type, bytes))
    }

    /// Parses `data:<media type>;base64,<payload>`. Non-base64 URIs are rejected.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.trim().strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;
        let media_type = if media_type.is_empty() {
            "application/octet-stream"
        } else {
            media_type
        };
        Self::from_base64(media_type, payload).ok()
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::ImageRef;

    #[test]
    fn data_uri_round_trips_bytes_and_media_type() {
        let original = ImageRef::new("image/png", vec![0x89, b'P', b'N', b'G', 0, 1, 2, 255]);
        let uri = original.data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));

        let parsed = ImageRef::from_data_uri(&uri).expect("valid data uri");
        assert_eq!(parsed, original);
    }

    #[test]
    fn from_data_uri_rejects_non_base64_payloads() {
        assert!(ImageRef::from_data_uri("data:text/plain,hello").is_none());
        assert!(ImageRef::from_data_uri("https://example.com/cat.png").is_none());
        assert!(ImageRef::from_data_uri("data:image/png;base64,%%%").is_none());
    }

    #[test]
    fn from_base64_tolerates_surrounding_whitespace() -> anyhow::Result<()> {
        let image = ImageRef::from_base64("image/jpeg", "  AAEC\n")?;
        assert_eq!(image.bytes(), &[0, 1, 2]);
        assert_eq!(image.media_type(), "image/jpeg");
        Ok(())
    }
}
