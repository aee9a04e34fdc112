use actix_cors::Cors;
use actix_web::{self, middleware::Logger, web, App, HttpServer};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{connect_database, run_migrations},
    middlewares::AuthConfig,
    modules::{
        document::repository_pg::DocumentStorePg,
        file_upload::{model::UploadConfig, service::FileUploadService, storage::FileStorage},
        post::service::PostService,
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;
    run_migrations(&db_pool).await.map_err(|e| std::io::Error::other(e.to_string()))?;

    let document_store = DocumentStorePg::new(db_pool.clone());
    let post_service = PostService::with_dependencies(Arc::new(document_store));

    let storage = FileStorage::from_settings(&ENV.storage)
        .map_err(|e| std::io::Error::other(format!("Storage setup error: {e}")))?;
    let upload_service = FileUploadService::new(
        storage,
        UploadConfig::new(ENV.upload_dir.clone(), ENV.max_file_size),
    );

    let auth_config = AuthConfig::new(ENV.jwt_secret.clone());

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&ENV.frontend_url)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_config.clone()))
            .app_data(web::Data::new(post_service.clone()))
            .app_data(web::Data::new(upload_service.clone()))
            .service(health_check)
            .service(
                web::scope("/api")
                    .configure(modules::post::route::configure)
                    .configure(modules::file_upload::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
