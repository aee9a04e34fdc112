use opendal::{services, Operator};

use crate::{api::error, constants::StorageSettings};

/// Object storage chosen at startup: local disk or an S3-compatible bucket.
#[derive(Clone)]
pub struct FileStorage {
    operator: Operator,
    public_url: String,
    backend: &'static str,
}

impl FileStorage {
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, error::SystemError> {
        let operator = match settings {
            StorageSettings::R2(r2) => {
                let builder = services::S3::default()
                    .endpoint(&r2.endpoint())
                    .bucket(&r2.bucket_name)
                    .access_key_id(&r2.account_key)
                    .secret_access_key(&r2.account_secret)
                    .region("auto");

                Operator::new(builder)?.finish()
            }
            StorageSettings::Local { upload_dir, .. } => {
                std::fs::create_dir_all(upload_dir)?;
                let root = std::fs::canonicalize(upload_dir)?;
                let root = root.to_str().ok_or_else(|| {
                    error::SystemError::bad_request("Upload directory is not UTF-8")
                })?;
                let builder = services::Fs::default().root(root);

                Operator::new(builder)?.finish()
            }
        };

        let public_url = match settings {
            StorageSettings::R2(r2) => r2.public_url.as_str(),
            StorageSettings::Local { public_url, .. } => public_url.as_str(),
        };

        Ok(Self {
            operator,
            public_url: public_url.trim_end_matches('/').to_string(),
            backend: settings.name(),
        })
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn url_for(&self, locator: &str) -> String {
        format!("{}/{}", self.public_url, locator)
    }

    /// Writes `bytes` under `locator` and returns the public URL.
    pub async fn store(
        &self,
        locator: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, error::SystemError> {
        self.operator.write_with(locator, bytes).content_type(content_type).await?;
        Ok(self.url_for(locator))
    }
}
