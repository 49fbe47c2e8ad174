//! In-memory adapters for the store ports.
//!
//! Same contracts as the PostgreSQL adapters (unique emails, newest-first listing,
//! immutable ownership), but nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, TaskStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, User};

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }

        let now = Utc::now();
        let user = User {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

/// Tasks kept in insertion order.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let now = Utc::now();
        let task = Task {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            creator_id: task.creator_id,
            image: task.image,
            end_datetime: task.end_datetime,
            create_datetime: task.create_datetime,
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        // Reverse first so equal timestamps still come out newest-inserted first.
        let mut owned: Vec<Task> = tasks
            .iter()
            .rev()
            .filter(|task| task.creator_id == creator_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn save(&self, task: &Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        let stored = tasks
            .iter_mut()
            .find(|stored| stored.id == task.id)
            .ok_or_else(|| AppError::NotFound("Todo not found".into()))?;

        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.image = task.image.clone();
        stored.end_datetime = task.end_datetime;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Err(AppError::NotFound("Todo not found".into()));
        }
        Ok(())
    }
}
