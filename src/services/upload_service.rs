use crate::models::{BatchResponse, UploadResult, UploadedFile};
use crate::services::temp_store::TempStore;
use crate::services::uploader::MediaUploader;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Runs the stage → submit → clean up pipeline for every file in a batch.
pub struct UploadService {
    store: TempStore,
    uploader: Arc<dyn MediaUploader>,
}

impl UploadService {
    pub fn new(store: TempStore, uploader: Arc<dyn MediaUploader>) -> Self {
        Self { store, uploader }
    }

    /// Process all files concurrently and wait for every one to finish.
    ///
    /// Results are collected in completion order. A failing or panicking
    /// file never affects its siblings.
    pub async fn process_batch(self: &Arc<Self>, files: Vec<UploadedFile>) -> BatchResponse {
        let mut tasks = JoinSet::new();
        let mut names = HashMap::with_capacity(files.len());

        for file in files {
            let name = file.original_name.clone();
            let service = Arc::clone(self);
            let handle = tasks.spawn(async move { service.process_file(file).await });
            names.insert(handle.id(), name);
        }

        let mut results = Vec::with_capacity(names.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                Err(e) => {
                    let original_name = names.remove(&e.id()).unwrap_or_default();
                    tracing::error!("Upload task for '{}' aborted: {}", original_name, e);
                    UploadResult::Failure {
                        original_name,
                        error: "Upload task terminated unexpectedly".to_string(),
                    }
                }
            };
            results.push(result);
        }

        BatchResponse::from_results(results)
    }

    /// Pipeline for a single file. The staged copy is deleted on every path.
    pub async fn process_file(&self, file: UploadedFile) -> UploadResult {
        tracing::debug!("Received '{}' ({} bytes)", file.original_name, file.size_bytes());
        let original_name = file.original_name;

        let staged = match self.store.write_to_temp(&file.buffer, &original_name).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!("Staging '{}' failed: {}", original_name, e);
                return UploadResult::Failure {
                    original_name,
                    error: e.to_string(),
                };
            }
        };

        let outcome = self.uploader.upload(staged.path()).await;

        if let Err(e) = self.store.delete(staged).await {
            tracing::warn!("Cleanup after '{}' failed: {}", original_name, e);
        }

        match outcome {
            Ok(asset) => {
                tracing::info!("Uploaded '{}' as {}", original_name, asset.public_id);
                UploadResult::Success {
                    original_name,
                    asset,
                }
            }
            Err(e) => {
                tracing::warn!("Provider upload of '{}' failed: {}", original_name, e);
                UploadResult::Failure {
                    original_name,
                    error: e.to_string(),
                }
            }
        }
    }
}
