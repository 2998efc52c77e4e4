//! Multipart helpers for upload handlers

use axum::extract::Multipart;
use inkwell_core::AppError;

/// Extract file data, filename, and content type from a multipart form.
/// Exactly one field named "file" is accepted; other fields are ignored.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
) -> Result<(Vec<u8>, String, String), AppError> {
    let mut file: Option<(Vec<u8>, Option<String>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if file.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        file = Some((data.to_vec(), filename, content_type));
    }

    let (data, filename, content_type) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok((
        data,
        filename.unwrap_or_else(|| "unknown".to_string()),
        content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
    ))
}
