use std::path::PathBuf;

use crate::constants::ALLOWED_EXTENSIONS;

/// File read from a multipart request, validated but not yet stored.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub extension: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// File upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    /// Directory the serve endpoint reads from.
    pub upload_dir: PathBuf,
}

impl UploadConfig {
    pub fn new(upload_dir: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            max_file_size,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            upload_dir: upload_dir.into(),
        }
    }
}
