//! Error types for the catalog client.

use srisri_core::{EmailError, ValidationError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionError;

/// Errors returned by catalog client operations.
///
/// Every failure is local to the one operation that produced it; none of
/// these leave the client in an unusable state.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API rejected the bearer token, or none was sent.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Login was refused.
    #[error("{0}")]
    LoginFailed(String),

    /// A successful envelope carried no `data`.
    #[error("Response from {0} contained no data")]
    MissingData(String),

    /// The storage endpoint refused a direct upload.
    #[error("Upload failed: {status} {message}")]
    Storage { status: u16, message: String },

    /// The file type is not an accepted image type.
    #[error("Unsupported file type for {0}: only JPG, PNG and WEBP images are accepted")]
    UnsupportedFile(String),

    /// The file exceeds the upload size limit.
    #[error("{file} is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge { file: String, size: u64, limit: u64 },

    /// Adding the files would exceed the per-product image limit.
    #[error("Maximum {max} images allowed")]
    TooManyImages { max: usize },

    /// Some files in a batch failed to upload.
    #[error("{}", describe_partial_upload(.uploaded, .failed))]
    PartialUpload {
        /// Public URLs of the files that did upload, in input order.
        uploaded: Vec<String>,
        /// `(file name, error message)` for each failed file.
        failed: Vec<(String, String)>,
    },

    /// A payload failed client-side validation.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The login email is malformed.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// The session store could not be read or written.
    #[error("Session storage error: {0}")]
    Session(#[from] SessionError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be built or a request could not be encoded.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// HTTP status associated with the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Storage { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            _ => None,
        }
    }
}

fn describe_partial_upload(uploaded: &[String], failed: &[(String, String)]) -> String {
    let details = failed
        .iter()
        .map(|(file, message)| format!("{file} ({message})"))
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "{} of {} uploads failed: {details}",
        failed.len(),
        failed.len() + uploaded.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_upload_display() {
        let err = ClientError::PartialUpload {
            uploaded: vec!["https://cdn/a.jpg".to_string()],
            failed: vec![("b.png".to_string(), "Upload failed: 403 Forbidden".to_string())],
        };
        assert_eq!(
            err.to_string(),
            "1 of 2 uploads failed: b.png (Upload failed: 403 Forbidden)"
        );
    }

    #[test]
    fn test_status() {
        assert_eq!(ClientError::Unauthorized("x".into()).status(), Some(401));
        assert_eq!(
            ClientError::Api {
                status: 404,
                message: "Product not found".into()
            }
            .status(),
            Some(404)
        );
        assert_eq!(ClientError::Transport("reset".into()).status(), None);
    }

    #[test]
    fn test_validation_display() {
        let err = ClientError::from(ValidationError::NoImages);
        assert_eq!(err.to_string(), "Invalid input: please upload at least one image");
    }
}
