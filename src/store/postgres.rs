//! PostgreSQL adapters for the store ports.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, TaskStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, User};

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at, updated_at";

const TASK_COLUMNS: &str = "id, title, description, status, creator_id, image, end_datetime, \
                            create_datetime, created_at, updated_at";

/// Identity records in the `users` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
                other => other,
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(password_hash)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}

/// Task records in the `todos` table.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO todos (id, title, description, status, creator_id, image, end_datetime, create_datetime) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {TASK_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.creator_id)
            .bind(task.image)
            .bind(task.end_datetime)
            .bind(task.create_datetime)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM todos WHERE id = $1");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM todos WHERE creator_id = $1 ORDER BY created_at DESC"
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn save(&self, task: &Task) -> Result<Task, AppError> {
        // creator_id is not in the SET list: ownership is immutable.
        let sql = format!(
            "UPDATE todos \
             SET title = $2, description = $3, status = $4, image = $5, end_datetime = $6, updated_at = now() \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(&task.image)
            .bind(task.end_datetime)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Todo not found".into()))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Todo not found".into()));
        }
        Ok(())
    }
}
