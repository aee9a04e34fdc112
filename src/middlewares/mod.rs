use actix_web::{dev::Payload, web, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{api::error, utils::Claims};

/// Secret used to verify bearer tokens.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into() }
    }
}

pub fn authenticate(req: &HttpRequest) -> Result<Claims, error::Error> {
    if let Some(claims) = req.extensions().get::<Claims>() {
        return Ok(claims.clone());
    }

    let config = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
        log::error!("AuthConfig missing from app data");
        error::Error::InternalServer
    })?;

    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let token = match auth.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(t) => t,
        None => {
            return Err(error::Error::unauthorized("Token Invalid or Expired"));
        }
    };

    let claims = Claims::decode(token, config.jwt_secret.as_bytes())
        .map_err(|_| error::Error::forbidden("Token Invalid or Expired"))?;

    req.extensions_mut().insert(claims.clone());

    Ok(claims)
}

/// Extractor for routes that require a verified principal.
pub struct Principal(pub Claims);

impl Principal {
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequest for Principal {
    type Error = error::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(Principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    const SECRET: &str = "middleware-secret";

    async fn whoami(principal: Principal) -> HttpResponse {
        HttpResponse::Ok().body(principal.username().to_string())
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AuthConfig::new(SECRET)))
                    .route("/me", web::get().to(whoami)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let app = app!();
        let resp = test::call_service(&app, test::TestRequest::get().uri("/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn bad_token_is_forbidden() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn valid_token_yields_principal() {
        let app = app!();
        let token = Claims::new("alice", 900).encode(SECRET.as_bytes()).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, web::Bytes::from_static(b"alice"));
    }
}
