//! Image uploads through presigned storage URLs.
//!
//! An upload is two requests: the API issues an [`UploadDescriptor`] for the
//! file, then the file goes straight to object storage as a multipart POST
//! carrying the descriptor's form fields. The storage request never carries
//! the bearer token.

use std::collections::BTreeMap;
use std::path::Path;

use futures::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use srisri_core::MAX_PRODUCT_IMAGES;
use tracing::{debug, error, info, instrument};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Largest accepted file, 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Accepted image extensions and their MIME types.
const IMAGE_TYPES: [(&str, &str); 4] = [
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// Presigned upload target issued by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadDescriptor {
    pub upload_url: String,
    /// Form fields that must precede the file part.
    #[serde(default)]
    pub upload_fields: Option<BTreeMap<String, String>>,
    /// Public URL of the object once uploaded.
    pub file_url: String,
    /// Storage key of the object.
    pub key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresignRequest<'a> {
    file_name: &'a str,
    file_type: &'a str,
}

/// A file ready to upload.
#[derive(Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnsupportedFile`] for anything but JPG, PNG or
    /// WEBP, and [`ClientError::Io`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::UnsupportedFile(path.display().to_string()))?;
        let content_type =
            mime_for(&file_name).ok_or_else(|| ClientError::UnsupportedFile(file_name.clone()))?;

        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, content_type, bytes))
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check type and size before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnsupportedFile`] or
    /// [`ClientError::FileTooLarge`].
    pub fn validate(&self) -> Result<(), ClientError> {
        if mime_for(&self.file_name).is_none() {
            return Err(ClientError::UnsupportedFile(self.file_name.clone()));
        }
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(ClientError::FileTooLarge {
                file: self.file_name.clone(),
                size: self.size(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// MIME type for an accepted image file name, matched case-insensitively.
#[must_use]
pub fn mime_for(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    IMAGE_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
}

/// Reject adding `adding` images to a product that already has `existing`.
///
/// # Errors
///
/// Returns [`ClientError::TooManyImages`] if the total would exceed
/// [`MAX_PRODUCT_IMAGES`].
pub const fn ensure_image_capacity(existing: usize, adding: usize) -> Result<(), ClientError> {
    if existing.saturating_add(adding) > MAX_PRODUCT_IMAGES {
        return Err(ClientError::TooManyImages {
            max: MAX_PRODUCT_IMAGES,
        });
    }
    Ok(())
}

// =============================================================================
// Batch results
// =============================================================================

/// Result of uploading one file in a batch.
#[derive(Debug)]
pub struct UploadOutcome {
    pub file_name: String,
    /// Public URL on success.
    pub result: Result<String, ClientError>,
}

/// Per-file results of [`Uploader::upload_many`], in input order.
#[derive(Debug, Default)]
pub struct UploadBatch {
    outcomes: Vec<UploadOutcome>,
}

impl UploadBatch {
    #[must_use]
    pub fn outcomes(&self) -> &[UploadOutcome] {
        &self.outcomes
    }

    /// URLs of the files that uploaded.
    #[must_use]
    pub fn urls(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_deref().ok())
            .collect()
    }

    /// Files that failed, with their errors.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &ClientError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.file_name.as_str(), e)))
            .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// All URLs, or an error if any file failed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::PartialUpload`] carrying both the uploaded URLs
    /// and the failures.
    pub fn into_urls(self) -> Result<Vec<String>, ClientError> {
        let mut uploaded = Vec::with_capacity(self.outcomes.len());
        let mut failed = Vec::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(url) => uploaded.push(url),
                Err(e) => failed.push((outcome.file_name, e.to_string())),
            }
        }

        if failed.is_empty() {
            Ok(uploaded)
        } else {
            Err(ClientError::PartialUpload { uploaded, failed })
        }
    }
}

// =============================================================================
// Uploader
// =============================================================================

/// Runs the presign-then-POST flow.
#[derive(Debug, Clone)]
pub struct Uploader {
    api: ApiClient,
    storage: reqwest::Client,
    concurrency: usize,
}

impl Uploader {
    /// # Errors
    ///
    /// Returns an error if the storage HTTP client cannot be built.
    pub fn new(api: ApiClient, config: &ClientConfig) -> Result<Self, ClientError> {
        let storage = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            api,
            storage,
            concurrency: config.upload_concurrency.max(1),
        })
    }

    /// Ask the API for an upload target.
    ///
    /// # Errors
    ///
    /// Returns the API failure.
    #[instrument(skip(self, file), fields(file = %file.file_name))]
    pub async fn presign(&self, file: &UploadFile) -> Result<UploadDescriptor, ClientError> {
        let request = PresignRequest {
            file_name: &file.file_name,
            file_type: &file.content_type,
        };
        self.api
            .post::<UploadDescriptor, _>(&["api", "upload", "presigned-url"], &request)
            .await
            .into_result()
    }

    /// Upload one file and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request, the presign failure,
    /// [`ClientError::Transport`] if storage is unreachable, or
    /// [`ClientError::Storage`] if storage rejects the upload.
    #[instrument(skip(self, file), fields(file = %file.file_name, size = file.bytes.len()))]
    pub async fn upload(&self, file: &UploadFile) -> Result<String, ClientError> {
        file.validate()?;
        let descriptor = self.presign(file).await?;
        debug!(key = %descriptor.key, "Received upload target");

        let mut form = Form::new();
        for (name, value) in descriptor.upload_fields.unwrap_or_default() {
            form = form.text(name, value);
        }
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        form = form.part("file", part);

        let response = self
            .storage
            .post(&descriptor.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Storage rejected upload"
            );
            return Err(ClientError::Storage {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        info!(url = %descriptor.file_url, "Uploaded file");
        Ok(descriptor.file_url)
    }

    /// Upload files concurrently, at most `upload_concurrency` at a time.
    ///
    /// Every file is attempted; one failure does not stop the others.
    pub async fn upload_many(&self, files: Vec<UploadFile>) -> UploadBatch {
        let outcomes: Vec<UploadOutcome> = stream::iter(files)
            .map(|file| async move {
                let result = self.upload(&file).await;
                UploadOutcome {
                    file_name: file.file_name,
                    result,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        UploadBatch { outcomes }
    }

    /// Upload images for a product that already has `existing` images.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TooManyImages`] before any request if the
    /// product would end up with too many images.
    pub async fn upload_product_images(
        &self,
        existing: usize,
        files: Vec<UploadFile>,
    ) -> Result<UploadBatch, ClientError> {
        ensure_image_capacity(existing, files.len())?;
        Ok(self.upload_many(files).await)
    }
}
