use std::path::PathBuf;

pub const POST_COLLECTION: &str = "post";
pub const USER_COLLECTION: &str = "user";

pub const DEFAULT_PAGE_LIMIT: u64 = 5;
pub const DEFAULT_MAX_FILE_SIZE: usize = 1_000_000_000;
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "mp4"];

pub const SINGLE_FILE_FIELD: &str = "file";
pub const MULTIPLE_FILE_FIELD: &str = "file[]";
pub const SERVE_PATH: &str = "/api/save/serve";

pub struct Env {
    pub jwt_secret: String,
    pub database_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub max_file_size: usize,
    pub upload_dir: PathBuf,
    pub storage: StorageSettings,
}

impl Env {
    fn new() -> Self {
        let jwt_secret = std::env::var("SECRET_KEY")
            .expect("SECRET_KEY must be set in .env file or environment variable");

        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16 integer");
        let max_file_size = std::env::var("UPLOAD_MAX_FILE_SIZE")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE.to_string())
            .parse::<usize>()
            .expect("UPLOAD_MAX_FILE_SIZE must be a valid usize integer");

        let lookup = |key: &str| std::env::var(key).ok();
        let upload_dir = upload_dir_from_lookup(&lookup);
        let storage = StorageSettings::from_lookup(lookup);

        Env { jwt_secret, database_url, frontend_url, ip, port, max_file_size, upload_dir, storage }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Local upload directory. Blank or unset `UPLOAD_DIR` means `uploads`.
pub fn upload_dir_from_lookup<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(non_blank(lookup, "UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string()))
}

/// Cloudflare R2 credentials. Only built when every field is present.
#[derive(Debug, Clone, PartialEq)]
pub struct R2Config {
    pub account_id: String,
    pub account_key: String,
    pub account_secret: String,
    pub bucket_name: String,
    pub public_url: String,
}

impl R2Config {
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

/// Where uploaded files go, decided once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageSettings {
    R2(R2Config),
    Local { upload_dir: PathBuf, public_url: String },
}

impl StorageSettings {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_blank(&lookup, key);

        let r2 = (|| {
            Some(R2Config {
                account_id: var("R2_ACCOUNT_ID")?,
                account_key: var("R2_ACCOUNT_KEY")?,
                account_secret: var("R2_ACCOUNT_SECRET")?,
                bucket_name: var("R2_BUCKET_NAME")?,
                public_url: var("R2_PUBLIC_URL")?,
            })
        })();

        match r2 {
            Some(config) => StorageSettings::R2(config),
            None => {
                let base =
                    var("LOCAL_PUBLIC_URL").unwrap_or_else(|| "http://localhost:8080".to_string());
                StorageSettings::Local {
                    upload_dir: upload_dir_from_lookup(&lookup),
                    public_url: format!("{}{}", base.trim_end_matches('/'), SERVE_PATH),
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageSettings::R2(_) => "r2",
            StorageSettings::Local { .. } => "local",
        }
    }
}
