//! Persistence ports for identities and tasks.
//!
//! Services hold these as `Arc<dyn ...>` handles passed in at construction; nothing
//! reaches for a global pool. `postgres` is the production adapter, `memory` backs
//! local runs without a database and the test suite.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, User};

pub use memory::{InMemoryCredentialStore, InMemoryTaskStore};
pub use postgres::{PgCredentialStore, PgTaskStore};

/// Storage of identity records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists a new identity. Fails with `AppError::Conflict` if the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Replaces the stored password hash. Fails with `AppError::NotFound` if the identity is gone.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<User, AppError>;
}

/// Storage of task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: NewTask) -> Result<Task, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// All tasks created by `creator_id`, most recently created first.
    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Task>, AppError>;

    /// Writes every mutable field of `task` in one statement and refreshes `updated_at`.
    /// Fails with `AppError::NotFound` if the task no longer exists.
    async fn save(&self, task: &Task) -> Result<Task, AppError>;

    /// Removes the task permanently. Fails with `AppError::NotFound` if nothing was removed.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}
