use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use futures_util::TryStreamExt;

use crate::api::{error, success};
use crate::constants::{MULTIPLE_FILE_FIELD, SINGLE_FILE_FIELD};
use crate::middlewares::Principal;
use crate::modules::file_upload::{
    model::IncomingFile,
    schema::{FileUploadResponse, UploadedFile},
    service::FileUploadService,
};

/// Buffers every file part of the request. Parts without a filename are
/// form fields and are skipped. Extension and size are checked while
/// reading, so a rejected file never reaches storage.
async fn read_files(
    payload: &mut Multipart,
    field_name: &str,
    max_count: Option<usize>,
    service: &FileUploadService,
) -> Result<Vec<IncomingFile>, error::Error> {
    let read_failed = || error::Error::file_save_failure("Error saving file");
    let mut files = Vec::new();

    while let Some(mut field) = payload.try_next().await.map_err(|_| read_failed())? {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => continue,
        };
        let Some(filename) = filename else {
            continue;
        };

        if name != field_name || max_count.is_some_and(|max| files.len() >= max) {
            return Err(error::Error::file_save_failure("Unexpected field"));
        }

        let extension = service.validate_extension(&filename)?;
        let mime_type = field.content_type().map(|m| m.to_string()).unwrap_or_else(|| {
            mime_guess::from_ext(&extension).first_or_octet_stream().to_string()
        });

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|_| read_failed())? {
            service.validate_size(bytes.len() + chunk.len())?;
            bytes.extend_from_slice(&chunk);
        }

        files.push(IncomingFile { extension, mime_type, bytes });
    }

    Ok(files)
}

#[post("/one")]
pub async fn upload_one(
    _principal: Principal,
    mut payload: Multipart,
    service: web::Data<FileUploadService>,
) -> Result<success::Success<FileUploadResponse<UploadedFile>>, error::Error> {
    let file = read_files(&mut payload, SINGLE_FILE_FIELD, Some(1), &service)
        .await?
        .pop()
        .ok_or_else(|| error::Error::file_save_failure("File not found"))?;

    let saved = service.save_file(file).await?;
    Ok(success::Success::ok(FileUploadResponse { file: saved }))
}

#[post("/multiple")]
pub async fn upload_multiple(
    _principal: Principal,
    mut payload: Multipart,
    service: web::Data<FileUploadService>,
) -> Result<success::Success<FileUploadResponse<Vec<UploadedFile>>>, error::Error> {
    let files = read_files(&mut payload, MULTIPLE_FILE_FIELD, None, &service).await?;
    let saved = service.save_files(files).await?;
    Ok(success::Success::ok(FileUploadResponse { file: saved }))
}

#[get("/serve/{filename}")]
pub async fn serve_file(
    filename: web::Path<String>,
    service: web::Data<FileUploadService>,
) -> Result<HttpResponse, error::Error> {
    let (bytes, mime_type) = service.read_file(&filename).await?;
    Ok(HttpResponse::Ok().content_type(mime_type).body(bytes))
}
