//! Image upload, shared by proposal and story creation.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::Photo;
use crate::client::{ApiClient, ApiError};

/// Stored image as returned by the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub filename: String,
}

impl UploadedImage {
    /// Upload raw image bytes as multipart form data. Creation flows call
    /// this before submitting the entity; a failure here aborts the flow.
    pub async fn upload(
        api: &ApiClient,
        filename: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, ApiError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| ApiError::Shape(format!("bad mime type {mime}: {e}")))?;
        let form = Form::new().part("image", part);
        api.post_multipart("/document/images", form).await
    }
}

impl From<UploadedImage> for Photo {
    fn from(image: UploadedImage) -> Self {
        Photo {
            url: image.url,
            filename: image.filename,
        }
    }
}
