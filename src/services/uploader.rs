use crate::config::CloudinaryConfig;
use crate::models::HostedAsset;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to read staged file: {0}")]
    ReadFile(#[from] std::io::Error),

    #[error("Upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Provider returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Client for the external media-hosting API.
///
/// One call is one attempt; implementations never retry.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<HostedAsset, ProviderError>;
}

#[derive(Deserialize)]
struct CloudinaryUploadResponse {
    url: Option<String>,
    secure_url: Option<String>,
    public_id: Option<String>,
}

#[derive(Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

/// Signed uploads against Cloudinary's `auto` resource endpoint.
pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/auto/upload",
            self.config.api_base, self.config.cloud_name
        )
    }

    /// Sign the given parameters: sorted `k=v` pairs joined by `&`, secret appended.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<_> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, path: &Path) -> Result<HostedAsset, ProviderError> {
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut params = vec![("timestamp", Utc::now().timestamp().to_string())];
        if let Some(folder) = &self.config.folder {
            params.push(("folder", folder.clone()));
        }
        let signature = self.sign(&params);

        let mut form = Form::new()
            .part("file", Part::bytes(data).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<CloudinaryErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CloudinaryUploadResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        match (parsed.url, parsed.secure_url, parsed.public_id) {
            (Some(url), Some(secure_url), Some(public_id)) => Ok(HostedAsset {
                url,
                secure_url,
                public_id,
            }),
            _ => Err(ProviderError::InvalidResponse(
                "missing url, secure_url or public_id".to_string(),
            )),
        }
    }
}
