use super::image_ref::ImageRef;
use crate::wire::gemini::Part;

/// An image the user picked but has not sent yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    transport_data: String,
    preview: ImageRef,
}

impl Attachment {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let preview = ImageRef::new(media_type, bytes);
        Self {
            transport_data: preview.to_base64(),
            preview,
        }
    }

    /// Base64 payload without any `data:` header.
    pub fn transport_data(&self) -> &str {
        &self.transport_data
    }

    pub fn preview(&self) -> &ImageRef {
        &self.preview
    }

    pub fn media_type(&self) -> &str {
        self.preview.media_type()
    }

    pub fn byte_len(&self) -> usize {
        self.preview.len()
    }

    pub fn inline_part(&self) -> Part {
        Part::inline(self.media_type(), self.transport_data.clone())
    }
}
