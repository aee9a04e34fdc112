use actix_web::{delete, get, post, put, web};
use serde_json::Value;

use crate::{
    api::{error, success},
    middlewares::Principal,
    modules::post::{
        model::{CreatedPosts, PageQuery},
        schema::PostEntity,
        service::PostService,
    },
    utils::ValidatedQuery,
};

fn payload(body: Option<web::Json<Value>>) -> Value {
    body.map(web::Json::into_inner).unwrap_or(Value::Null)
}

#[get("/username/{username}")]
pub async fn get_posts_by_username(
    post_service: web::Data<PostService>,
    username: web::Path<String>,
) -> Result<success::Success<Vec<PostEntity>>, error::Error> {
    let posts = post_service.get_by_username(&username).await?;
    Ok(success::Success::ok(posts))
}

#[get("/page/{page}")]
pub async fn get_posts_by_page(
    post_service: web::Data<PostService>,
    page: web::Path<String>,
    query: ValidatedQuery<PageQuery>,
) -> Result<success::Success<Vec<PostEntity>>, error::Error> {
    let posts = post_service.get_page(&page, &query.0).await?;
    Ok(success::Success::ok(posts))
}

#[get("/{id}")]
pub async fn get_post(
    post_service: web::Data<PostService>,
    id: web::Path<String>,
) -> Result<success::Success<PostEntity>, error::Error> {
    let post = post_service.get_by_id(&id).await?;
    Ok(success::Success::ok(post))
}

#[post("")]
pub async fn create_post(
    post_service: web::Data<PostService>,
    principal: Principal,
    body: Option<web::Json<Value>>,
) -> Result<success::Success<CreatedPosts>, error::Error> {
    let created = post_service.create(principal.username(), payload(body)).await?;
    Ok(success::Success::ok(created))
}

#[put("/{id}")]
pub async fn update_post(
    post_service: web::Data<PostService>,
    principal: Principal,
    id: web::Path<String>,
    body: Option<web::Json<Value>>,
) -> Result<success::Success<PostEntity>, error::Error> {
    let post = post_service.update(principal.username(), &id, payload(body)).await?;
    Ok(success::Success::ok(post))
}

#[delete("/{id}")]
pub async fn delete_post(
    post_service: web::Data<PostService>,
    principal: Principal,
    id: web::Path<String>,
) -> Result<success::Success<PostEntity>, error::Error> {
    let post = post_service.delete(principal.username(), &id).await?;
    Ok(success::Success::ok(post))
}
