//! Standalone image upload.

use std::path::PathBuf;

use serde::Serialize;
use srisri_client::CatalogClient;

use super::{CommandError, print_json, read_files};

#[derive(Serialize)]
struct Failure<'a> {
    file: &'a str,
    error: String,
}

#[derive(Serialize)]
struct Report<'a> {
    uploaded: Vec<&'a str>,
    failed: Vec<Failure<'a>>,
}

/// Upload files and print their public URLs.
///
/// The report is printed even when some files fail; the command then exits
/// with the partial-upload error.
pub async fn run(client: &CatalogClient, paths: &[PathBuf]) -> Result<(), CommandError> {
    let files = read_files(paths).await?;
    let batch = client.uploader().upload_many(files).await;

    let report = Report {
        uploaded: batch.urls(),
        failed: batch
            .failures()
            .into_iter()
            .map(|(file, error)| Failure {
                file,
                error: error.to_string(),
            })
            .collect(),
    };
    print_json(&report)?;

    batch.into_urls()?;
    Ok(())
}
