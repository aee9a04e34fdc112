use crate::modules::post::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/post")
            .service(get_posts_by_username)
            .service(get_posts_by_page)
            .service(get_post)
            .service(create_post)
            .service(update_post)
            .service(delete_post),
    );
}
