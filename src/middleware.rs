use std::rc::Rc;
use std::sync::Arc;

use actix_service::{forward_ready, Service};
use actix_web::body::EitherBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures::future::{ok, ready, LocalBoxFuture, Ready};

use crate::errors::ApiError;
use crate::token::TokenService;

/// Identity resolved by [`AuthMiddleware`], handed to every protected handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller(pub String);

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(req.extensions().get::<Caller>().cloned().ok_or(ApiError::Unauthorized))
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        None
    } else {
        Some(token)
    }
}

// Middleware factory
pub struct AuthMiddleware {
    tokens: Arc<TokenService>,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        AuthMiddleware { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();

    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
}

impl<S> AuthMiddlewareService<S> {
    fn resolve(&self, req: &ServiceRequest) -> Result<Caller, &'static str> {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .ok_or("authorization header missing")?;
        let value = header.to_str().map_err(|_| "authorization header is not valid text")?;
        let token = bearer_token(value).ok_or("authorization scheme is not Bearer")?;

        self.tokens.verify(token).map(Caller).map_err(|e| {
            log::debug!("Token rejected: {}", e);
            "token rejected"
        })
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.resolve(&req) {
            Ok(caller) => {
                req.extensions_mut().insert(caller);
                let service = self.service.clone();
                Box::pin(async move {
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                })
            }
            Err(reason) => {
                log::debug!("Rejecting {} {}: {}", req.method(), req.path(), reason);
                let response = ApiError::Unauthorized.error_response().map_into_right_body();
                let (request, _payload) = req.into_parts();
                Box::pin(async move { Ok(ServiceResponse::new(request, response)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body, read_body_json, TestRequest};
    use actix_web::{web, App, HttpResponse};
    use chrono::{Duration, Utc};

    async fn whoami(caller: Caller) -> HttpResponse {
        HttpResponse::Ok().body(caller.0)
    }

    #[test]
    fn bearer_scheme_is_required() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token("Bearer  abc.def.ghi"), None);
        assert_eq!(bearer_token("Bearer abc.def.ghi "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[actix_web::test]
    async fn valid_token_reaches_handler_with_identity() {
        let tokens = Arc::new(TokenService::new("secret"));
        let token = tokens.issue("alice").unwrap();
        let app = init_service(
            App::new().service(
                web::scope("")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_body(resp).await, web::Bytes::from_static(b"alice"));
    }

    #[actix_web::test]
    async fn every_rejection_looks_the_same() {
        let tokens = Arc::new(TokenService::new("secret"));
        let forged = TokenService::new("other-secret").issue("alice").unwrap();
        let expired = tokens
            .issue_at("alice", Utc::now() - Duration::hours(2))
            .unwrap();
        let app = init_service(
            App::new().service(
                web::scope("")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let headers = vec![
            None,
            Some("Token abc".to_string()),
            Some("Bearer".to_string()),
            Some(format!("Bearer  {}", tokens.issue("alice").unwrap())),
            Some("Bearer not-a-jwt".to_string()),
            Some(format!("Bearer {}", forged)),
            Some(format!("Bearer {}", expired)),
        ];

        for header in headers {
            let mut req = TestRequest::get().uri("/me");
            if let Some(value) = header {
                req = req.insert_header((AUTHORIZATION, value));
            }
            let resp = call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: serde_json::Value = read_body_json(resp).await;
            assert_eq!(body, serde_json::json!({ "error": "Authorization required" }));
        }
    }
}
