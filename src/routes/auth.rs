use crate::{
    auth::{
        AuthMiddleware, AuthService, AuthenticatedUserId, LoginRequest, RegisterRequest,
        ResetPasswordRequest,
    },
    error::AppError,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates the identity and returns `201` with a token and the public user view.
/// An address that is already registered yields `409`.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let response = auth.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Login user
///
/// Unknown email and wrong password both yield the same `401`.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let response = auth.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/reset-password")]
pub async fn reset_password(
    auth: web::Data<AuthService>,
    reset_data: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    reset_data.validate()?;

    let response = auth.reset_password(reset_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Profile of the bearer of the token.
#[get("/me", wrap = "AuthMiddleware")]
pub async fn me(
    auth: web::Data<AuthService>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = auth.current_user(user_id.0).await?;
    Ok(HttpResponse::Ok().json(user))
}
