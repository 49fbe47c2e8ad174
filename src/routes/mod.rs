pub mod auth;
pub mod health;
pub mod tasks;

use actix_cors::Cors;
use actix_web::{error::JsonPayloadError, web};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers every route of the API.
///
/// Handlers expect `web::Data<AuthService>` and `web::Data<TaskService>` to be present as app data.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::reset_password)
                .service(auth::me),
        )
        .service(
            web::scope("/todos")
                .wrap(AuthMiddleware)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task_status)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// JSON extractor settings: bodies over `limit` are answered 413, malformed payloads 400.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| json_error(err).into())
}

fn json_error(err: JsonPayloadError) -> AppError {
    match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            AppError::PayloadTooLarge(err.to_string())
        }
        other => AppError::BadRequest(other.to_string()),
    }
}

/// Any origin, method and header; the browser client is served from another origin.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

/// Path ids that are not UUIDs cannot name an existing task.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Todo not found".into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_rt::test]
    async fn test_oversized_body_is_payload_too_large() {
        let app = test::init_service(
            App::new()
                .app_data(json_config(64))
                .route(
                    "/echo",
                    web::post().to(|body: web::Json<serde_json::Value>| async move {
                        actix_web::HttpResponse::Ok().json(body.into_inner())
                    }),
                ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/echo")
            .set_json(json!({ "image": "a".repeat(200) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let req = test::TestRequest::post()
            .uri("/echo")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
