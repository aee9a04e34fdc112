use serde::Serialize;

/// `0` for images, `1` for video and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum MediaType {
    Image,
    Other,
}

impl MediaType {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            MediaType::Image
        } else {
            MediaType::Other
        }
    }
}

impl From<MediaType> for u8 {
    fn from(value: MediaType) -> Self {
        match value {
            MediaType::Image => 0,
            MediaType::Other => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

#[derive(Debug, Serialize)]
pub struct FileUploadResponse<T: Serialize> {
    pub file: T,
}
