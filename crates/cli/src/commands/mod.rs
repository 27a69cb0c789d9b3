//! Command implementations.
//!
//! Every command prints a single JSON document on stdout. Progress and
//! diagnostics go through `tracing` on stderr.

pub mod auth;
pub mod categories;
pub mod contact;
pub mod products;
pub mod upload;

use std::path::PathBuf;

use serde::Serialize;
use srisri_client::{ClientError, UploadFile};
use thiserror::Error;

/// Errors raised by the CLI itself, before or around client calls.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Nothing to update: pass at least one field")]
    NothingToUpdate,

    #[error("--replace-images needs at least one --image or --image-url")]
    ReplaceWithoutImages,

    #[error("Unknown price range {0}: choose 1 to {1}")]
    UnknownPriceRange(usize, usize),

    #[error("Invalid slug: {0}")]
    InvalidSlug(#[from] srisri_core::SlugError),

    #[error("Invalid input: {0}")]
    Validation(#[from] srisri_core::ValidationError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Pretty-print `value` as JSON on stdout.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read image files from disk.
pub async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>, ClientError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(UploadFile::from_path(path).await?);
    }
    Ok(files)
}
