use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{CreateTaskInput, UpdateStatusInput, UpdateTaskInput},
    tasks::TaskService,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated user's todos.
///
/// Tasks are ordered by creation date in descending order.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects, possibly empty.
/// - `401 Unauthorized`: If the request lacks a valid bearer token.
#[get("")]
pub async fn list_tasks(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let owned = tasks.list_owned(user_id.0).await?;
    Ok(HttpResponse::Ok().json(owned))
}

/// Creates a todo owned by the authenticated user.
///
/// ## Request Body:
/// - `title` (required): 1 to 255 characters.
/// - `description`, `image`, `endDatetime` (optional).
/// - `status` (optional): defaults to `PENDING`.
///
/// ## Responses:
/// - `201 Created`: The created `Task`.
/// - `400 Bad Request`: Malformed JSON or missing `title`.
/// - `422 Unprocessable Entity`: Field validation failed.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_data: web::Json<CreateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks.create(user_id.0, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one todo.
///
/// ## Responses:
/// - `200 OK`: The `Task`.
/// - `403 Forbidden`: The todo belongs to someone else.
/// - `404 Not Found`: No todo has this id.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get_one(task_id.into_inner(), user_id.0).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a todo. Only the fields present in the body change;
/// `null` clears `description`, `image` or `endDatetime`.
///
/// Same error responses as `get_task`, plus `422` when validation fails.
#[patch("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks
        .update(task_id.into_inner(), user_id.0, task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[patch("/{id}/status")]
pub async fn update_task_status(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
    status_data: web::Json<UpdateStatusInput>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update_status(task_id.into_inner(), user_id.0, status_data.status)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a todo permanently.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `403 Forbidden` / `404 Not Found`: As for `get_task`.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks.delete(task_id.into_inner(), user_id.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

