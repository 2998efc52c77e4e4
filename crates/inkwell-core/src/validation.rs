//! Image upload validation
//!
//! Everything here runs synchronously on the submitting side, before a job
//! is created. A file that fails any check never reaches the upload queue.

use std::path::Path;

use crate::config::UploadConfig;

/// Fallback content type for extensions outside the image table.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Map a file extension to the content type sent to object storage.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => OCTET_STREAM,
    }
}

/// Lowercased extension of `filename`, if it has one.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Image validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Content type {content_type} does not match extension '{extension}'")]
    ExtensionContentTypeMismatch {
        extension: String,
        content_type: String,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File is empty")]
    EmptyFile,
}

/// Validator for submitted images.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl ImageValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_extensions.clone(),
            config.allowed_content_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Reject empty and oversized files.
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the extension and return it lowercased.
    pub fn validate_extension(&self, filename: &str) -> Result<String, ValidationError> {
        let extension = file_extension(filename)
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }

    /// Validate content type against the allowlist. Parameters
    /// (`; charset=...`) are stripped before comparing.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_mime_type(content_type);

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct.eq_ignore_ascii_case(&normalized))
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// The declared content type must be the one the extension maps to.
    pub fn validate_extension_content_type_match(
        &self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let expected = content_type_for_extension(extension);
        if expected == OCTET_STREAM {
            // Extension allowlist already decided; nothing to cross-check.
            return Ok(());
        }

        if normalize_mime_type(content_type) != expected {
            return Err(ValidationError::ExtensionContentTypeMismatch {
                extension: extension.to_string(),
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Run every check; returns the normalized extension on success.
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<String, ValidationError> {
        self.validate_file_size(file_size)?;
        let extension = self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(&extension, content_type)?;
        Ok(extension)
    }
}

fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Reduce an uploaded filename to a safe basename.
///
/// Path components are dropped, anything outside `[A-Za-z0-9._-]` becomes `_`,
/// and names containing `..` are rejected outright.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(ValidationError::InvalidFilename(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return Err(ValidationError::InvalidFilename(filename.to_string()));
    }

    Ok(sanitized)
}
