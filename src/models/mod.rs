use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;

/// A single file part read from an upload request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub buffer: Bytes,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, buffer: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            buffer: buffer.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.buffer.len()
    }
}

/// Asset as stored by the media-hosting provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedAsset {
    pub url: String,
    pub secure_url: String,
    pub public_id: String,
}

/// Terminal outcome of one file's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResult {
    Success {
        original_name: String,
        asset: HostedAsset,
    },
    Failure {
        original_name: String,
        error: String,
    },
}

impl UploadResult {
    pub fn original_name(&self) -> &str {
        match self {
            UploadResult::Success { original_name, .. } => original_name,
            UploadResult::Failure { original_name, .. } => original_name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Success { .. })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuccessfulUpload {
    pub originalname: String,
    #[serde(rename = "cloudinaryUrl")]
    pub cloudinary_url: String,
    #[serde(rename = "publicId")]
    pub public_id: String,
    #[serde(rename = "secureUrl")]
    pub secure_url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FailedUpload {
    pub originalname: String,
    pub error: String,
}

/// Aggregate of every file in one request, in completion order.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub successful: Vec<SuccessfulUpload>,
    pub failed: Vec<FailedUpload>,
    pub total_processed: usize,
    pub successful_uploads: usize,
    pub failed_uploads: usize,
}

impl BatchResponse {
    pub fn from_results(results: Vec<UploadResult>) -> Self {
        let total_processed = results.len();
        let mut successful = Vec::new();
        let mut failed = Vec::new();

        for result in results {
            match result {
                UploadResult::Success {
                    original_name,
                    asset,
                } => successful.push(SuccessfulUpload {
                    originalname: original_name,
                    cloudinary_url: asset.url,
                    public_id: asset.public_id,
                    secure_url: asset.secure_url,
                }),
                UploadResult::Failure {
                    original_name,
                    error,
                } => failed.push(FailedUpload {
                    originalname: original_name,
                    error,
                }),
            }
        }

        Self {
            successful_uploads: successful.len(),
            failed_uploads: failed.len(),
            successful,
            failed,
            total_processed,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed {} file(s): {} uploaded, {} failed",
            self.total_processed, self.successful_uploads, self.failed_uploads
        )
    }
}

/// Envelope shared by every JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}
