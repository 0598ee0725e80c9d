use serde::{Deserialize, Serialize};

use super::non_null_entries;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub sample_count: u32,
}

/// Body for `models/<model>:predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    #[serde(default, alias = "bytesBase64Encoded")]
    pub image_bytes: Option<String>,
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default, alias = "bytes_base64_encoded")]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default, alias = "generatedImage")]
    pub image: Option<GeneratedImage>,
}

/// Encoded image bytes and the media type the backend reported, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedImage<'a> {
    pub data: &'a str,
    pub mime_type: Option<&'a str>,
}

impl Prediction {
    pub fn encoded_image(&self) -> Option<EncodedImage<'_>> {
        if let Some(data) = self
            .bytes_base64_encoded
            .as_deref()
            .filter(|value| !value.is_empty())
        {
            return Some(EncodedImage {
                data,
                mime_type: self.mime_type.as_deref(),
            });
        }
        let generated = self.image.as_ref()?;
        let data = generated
            .image_bytes
            .as_deref()
            .filter(|value| !value.is_empty())?;
        Some(EncodedImage {
            data,
            mime_type: generated.mime_type.as_deref(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PredictResponse {
    #[serde(default, deserialize_with = "non_null_entries")]
    pub predictions: Vec<Prediction>,
}

impl PredictResponse {
    pub fn first_image(&self) -> Option<EncodedImage<'_>> {
        self.predictions.first().and_then(Prediction::encoded_image)
    }
}
