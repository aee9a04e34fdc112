use crate::modules::file_upload::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/save").service(upload_one).service(upload_multiple).service(serve_file));
}
