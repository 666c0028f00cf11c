use axum::extract::multipart::{Field, Multipart};
use gitcms::{UploadStager, UploadedFile};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::ApiError;

/// A fully received upload request: the staged file and the requested
/// destination directory.
#[derive(Debug)]
pub struct UploadForm {
    pub file: UploadedFile,
    pub directory: String,
}

/// Read the multipart body of an upload.
///
/// Exactly one `file` field is accepted; `directory` defaults to the content
/// root. Unknown fields are skipped.
///
/// # Errors
/// Returns a 400 [`ApiError`] for a missing or repeated `file` field or a
/// malformed body. On any error nothing is left in the staging directory.
pub async fn read_upload(
    stager: &UploadStager,
    multipart: &mut Multipart,
) -> Result<UploadForm, ApiError> {
    let mut directory = String::new();
    let mut file: Option<UploadedFile> = None;

    let outcome = async {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("directory") => directory = field.text().await?,
                Some("file") if file.is_some() => {
                    return Err(ApiError::bad_request("more than one 'file' field"));
                }
                Some("file") => file = Some(receive_file(stager, field).await?),
                other => tracing::debug!(field = ?other, "ignoring multipart field"),
            }
        }
        Ok::<(), ApiError>(())
    }
    .await;

    match (outcome, file) {
        (Ok(()), Some(file)) => Ok(UploadForm { file, directory }),
        (Ok(()), None) => Err(ApiError::bad_request("missing 'file' field")),
        (Err(e), staged) => {
            if let Some(staged) = staged {
                discard(&staged).await;
            }
            Err(e)
        }
    }
}

/// Stream a multipart `file` field into the staging directory under a fresh
/// name. The original file name is kept for relocation. A partly written
/// file is removed again on failure.
pub async fn receive_file(
    stager: &UploadStager,
    mut field: Field<'_>,
) -> Result<UploadedFile, ApiError> {
    let original_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("upload has no file name"))?
        .to_string();
    let content_type = field.content_type().map(str::to_string);

    let staged_name = Uuid::new_v4().simple().to_string();
    let temp_path = stager
        .stage_path(&staged_name)
        .map_err(ApiError::mutation)?;

    let io_error = |e: std::io::Error| ApiError::internal(format!("{}: {}", temp_path.display(), e));
    let mut out = tokio::fs::File::create(&temp_path).await.map_err(io_error)?;

    let written = async {
        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            out.write_all(&chunk).await.map_err(io_error)?;
        }
        out.flush().await.map_err(io_error)?;
        Ok::<u64, ApiError>(size)
    }
    .await;
    drop(out);

    let upload = UploadedFile {
        original_name,
        staged_name,
        temp_path,
        size: 0,
        content_type,
    };
    match written {
        Ok(size) => {
            tracing::debug!(name = %upload.original_name, staged = %upload.staged_name, size, "upload received");
            Ok(UploadedFile { size, ..upload })
        }
        Err(e) => {
            discard(&upload).await;
            Err(e)
        }
    }
}

/// Remove a staged upload that will not be relocated.
pub async fn discard(upload: &UploadedFile) {
    if let Err(e) = tokio::fs::remove_file(&upload.temp_path).await {
        tracing::warn!(staged = %upload.staged_name, error = %e, "failed to remove staged upload");
    }
}
