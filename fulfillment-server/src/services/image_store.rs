//! Image store client
//!
//! Uploads delivery proof photos and returns a durable URL. The HTTP
//! implementation follows the Cloudinary signed-upload API.

use async_trait::async_trait;
use serde::Deserialize;
use shared::{AppError, AppResult};

/// Image store contract
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload an image, returning its secure URL
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        folder: &str,
        public_id: &str,
    ) -> AppResult<String>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// HTTP image store client (Cloudinary-style signed uploads)
#[derive(Clone)]
pub struct CloudImageStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudImageStore {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }

    /// SHA-1 signature over the alphabetically ordered parameters, as the
    /// upload API requires
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let digest = ring::digest::digest(
            &ring::digest::SHA1_FOR_LEGACY_USE_ONLY,
            format!("{joined}{}", self.api_secret).as_bytes(),
        );
        hex::encode(digest)
    }
}

#[async_trait]
impl ImageStore for CloudImageStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        folder: &str,
        public_id: &str,
    ) -> AppResult<String> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", folder),
            ("public_id", public_id),
            ("timestamp", &timestamp),
        ]);

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(public_id.to_string())
            .mime_str(mime)
            .map_err(|e| AppError::invalid(format!("Unsupported image type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("public_id", public_id.to_string())
            .text("signature", signature);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::upstream("image_store", format!("Upload failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Image store rejected upload");
            return Err(AppError::upstream(
                "image_store",
                format!("Image store returned {status}"),
            ));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream("image_store", format!("Malformed response: {e}")))?;
        Ok(parsed.secure_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_order_independent() {
        let store = CloudImageStore::new("demo", "key", "secret");
        let a = store.sign(&[("timestamp", "100"), ("folder", "proofs")]);
        let b = store.sign(&[("folder", "proofs"), ("timestamp", "100")]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40); // SHA-1 hex
    }
}
