#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse},
    http::header,
    test, web, App, Error,
};
use serde_json::json;
use std::sync::Arc;

use tasknest::{
    auth::{AuthResponse, AuthService, TokenService},
    routes,
    store::{InMemoryCredentialStore, InMemoryTaskStore},
    tasks::TaskService,
};

pub const JWT_SECRET: &[u8] = b"integration-test-secret";
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 7;

/// Services over fresh in-memory stores. bcrypt runs at its minimum cost to keep tests fast.
#[derive(Clone)]
pub struct TestState {
    pub auth: web::Data<AuthService>,
    pub tasks: web::Data<TaskService>,
}

impl TestState {
    pub fn new() -> Self {
        let auth = AuthService::new(
            Arc::new(InMemoryCredentialStore::new()),
            TokenService::new(JWT_SECRET, TOKEN_TTL_SECS),
            4,
        )
        .expect("auth service");
        let tasks = TaskService::new(Arc::new(InMemoryTaskStore::new()));

        Self {
            auth: web::Data::new(auth),
            tasks: web::Data::new(tasks),
        }
    }
}

/// The production route table and CORS policy over `state`.
pub fn build_app(
    state: &TestState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(routes::cors())
        .app_data(state.auth.clone())
        .app_data(state.tasks.clone())
        .app_data(routes::json_config(10 * 1024 * 1024))
        .app_data(routes::path_config())
        .configure(routes::config)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Registers `email` and returns the token plus public user view.
pub async fn register_user<S, B>(app: &S, email: &str, password: &str) -> AuthResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    test::call_and_read_body_json(app, req).await
}

