use std::path::Path;
use uuid::Uuid;

use crate::api::error;
use crate::modules::file_upload::{
    model::{IncomingFile, UploadConfig},
    schema::{MediaType, UploadedFile},
    storage::FileStorage,
};

#[derive(Clone)]
pub struct FileUploadService {
    storage: FileStorage,
    config: UploadConfig,
}

impl FileUploadService {
    pub fn new(storage: FileStorage, config: UploadConfig) -> Self {
        log::info!("FileUploadService initialized with {} storage", storage.backend());
        Self { storage, config }
    }

    /// Lower-cased extension of an allowed filename.
    pub fn validate_extension(&self, filename: &str) -> Result<String, error::Error> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| self.config.allowed_extensions.iter().any(|allowed| allowed == ext))
            .ok_or_else(|| error::Error::file_save_failure("Please upload a Image or Video"))?;
        Ok(extension)
    }

    pub fn validate_size(&self, file_size: usize) -> Result<(), error::Error> {
        if file_size > self.config.max_file_size {
            return Err(error::Error::file_save_failure(format!(
                "File too large, maximum allowed size is {} bytes",
                self.config.max_file_size
            )));
        }
        Ok(())
    }

    /// Time-ordered unique name keeping the original extension.
    fn generate_locator(extension: &str) -> String {
        format!("{}.{}", Uuid::now_v7(), extension)
    }

    pub async fn save_file(&self, file: IncomingFile) -> Result<UploadedFile, error::Error> {
        self.validate_size(file.bytes.len())?;

        let locator = Self::generate_locator(&file.extension);
        let media_type = MediaType::from_mime(&file.mime_type);
        let url = self
            .storage
            .store(&locator, file.bytes, &file.mime_type)
            .await
            .map_err(|e| e.collapse(error::Error::file_save_failure("Error saving file")))?;

        log::info!("Stored {} on {} storage", locator, self.storage.backend());
        Ok(UploadedFile { url, media_type })
    }

    pub async fn save_files(
        &self,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<UploadedFile>, error::Error> {
        for file in &files {
            self.validate_size(file.bytes.len())?;
        }

        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            saved.push(self.save_file(file).await?);
        }
        Ok(saved)
    }

    /// Reads a stored file from the local upload directory together with a
    /// content type guessed from its name.
    pub async fn read_file(&self, filename: &str) -> Result<(Vec<u8>, String), error::Error> {
        let failed = || error::Error::file_serve_failure("Error serving file");

        // Stored locators never start with a dot.
        let is_plain_name = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains(['/', '\\']);
        if !is_plain_name {
            return Err(failed());
        }

        let path = self.config.upload_dir.join(filename);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| error::SystemError::from(e).collapse(failed()))?;
        let mime_type = mime_guess::from_path(&path).first_or_octet_stream().to_string();

        Ok((bytes, mime_type))
    }
}
